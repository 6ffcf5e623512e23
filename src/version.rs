//! Build-time information, collected by `built` in the build script.

mod build_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

/// Returns the main version identifier, e.g. `v1.4`.
pub fn identifier() -> String {
    let version = build_info::PKG_VERSION;
    format!("v{}", version.strip_suffix(".0").unwrap_or(version))
}

/// Returns an RFC 2822 formatted date of the build time in UTC.
pub fn build_time_utc() -> &'static str {
    build_info::BUILT_TIME_UTC
}

/// Returns the commit hash this was built from, if it was built from a git
/// checkout.
pub fn git_commit_hash() -> Option<&'static str> {
    build_info::GIT_COMMIT_HASH
}

/// Returns whether the git working directory was dirty when this was built.
pub fn git_was_dirty() -> bool {
    // `None` occurs when not built from a git checkout.
    build_info::GIT_DIRTY == Some(true)
}

/// Returns a string containing all version-related information.
pub fn full() -> String {
    let commit = match git_commit_hash() {
        Some(hash) => format!(" ({hash}{})", if git_was_dirty() { ", dirty" } else { "" }),
        None => String::new(),
    };

    format!("{}{commit}, built {}", identifier(), build_time_utc())
}
