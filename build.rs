use std::{
    env,
    fmt::Write as _,
    fs,
    path::{Path, PathBuf},
};


/// Directory containing the generator runtime that gets embedded into the
/// binary. Has to contain a `manifest.json`.
const RUNTIME_DIR: &str = "assets/codegen-runtime";

fn main() {
    built::write_built_file().expect("failed to acquire build-time information");
    embed_runtime();
}

/// Writes `runtime_assets.rs` to `OUT_DIR`, which contains the manifest and
/// one `include_bytes!` entry for every file below `RUNTIME_DIR`.
fn embed_runtime() {
    let manifest_dir = PathBuf::from(env::var_os("CARGO_MANIFEST_DIR").unwrap());
    let root = manifest_dir.join(RUNTIME_DIR);
    println!("cargo:rerun-if-changed={RUNTIME_DIR}");

    let manifest = root.join("manifest.json");
    assert!(manifest.is_file(), "'{}' is missing", manifest.display());

    let mut files = Vec::new();
    collect_files(&root, &root, &mut files);
    files.sort();

    let mut out = String::new();
    writeln!(out, "pub(crate) const MANIFEST: &str = include_str!({:?});", manifest.display().to_string()).unwrap();
    writeln!(out, "pub(crate) static FILES: &[(&str, &[u8])] = &[").unwrap();
    for relative in &files {
        if relative == "manifest.json" {
            continue;
        }
        let absolute = root.join(relative);
        println!("cargo:rerun-if-changed={}", absolute.display());
        writeln!(out, "    ({relative:?}, include_bytes!({:?})),", absolute.display().to_string()).unwrap();
    }
    writeln!(out, "];").unwrap();

    let out_dir = PathBuf::from(env::var_os("OUT_DIR").unwrap());
    fs::write(out_dir.join("runtime_assets.rs"), out).unwrap();
}

fn collect_files(root: &Path, dir: &Path, out: &mut Vec<String>) {
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            collect_files(root, &path, out);
        } else if path.is_file() {
            // Embedded paths always use forward slashes.
            let relative = path.strip_prefix(root).unwrap()
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            out.push(relative);
        }
    }
}
