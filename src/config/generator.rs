use std::path::PathBuf;

use super::GeneratorMode;


#[derive(Debug, confique::Config)]
pub struct GeneratorConfig {
    /// How the generator is invoked:
    ///
    /// - "process": the generator CLI is run by `interpreter` as separate
    ///   process. Its output is printed to this process' stdout/stderr.
    /// - "in-process": a native generator is called directly. Only available
    ///   when using this tool as library.
    #[config(default = "process")]
    pub mode: GeneratorMode,

    /// Name of the interpreter binary running the generator script. Searched
    /// for in `search_path`.
    #[config(default = "node")]
    pub interpreter: String,

    /// Path to the generator's CLI script. If not set, the generator runtime
    /// embedded into this binary is extracted into the build directory and
    /// used.
    pub script: Option<PathBuf>,

    /// Where to search for `interpreter`, in the same format as `PATH`.
    /// Default: the `PATH` environment variable.
    pub search_path: Option<String>,
}
