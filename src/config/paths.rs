use std::path::PathBuf;


#[derive(Debug, confique::Config)]
pub struct PathsConfig {
    /// The schema description (introspection result as JSON). Used as input
    /// unless `introspection.enabled` is set, in which case the fetched
    /// schema is written here.
    #[config(default = "src/main/graphql/schema.json")]
    pub schema_file: PathBuf,

    /// Directory that is searched recursively for `*.graphql` query
    /// documents. The sub-directory structure becomes part of the package
    /// name of the generated code.
    #[config(default = "src/main/graphql")]
    pub query_dir: PathBuf,

    /// Base directory for everything this tool writes: staged queries, the
    /// extracted generator runtime and (by default) the generated sources.
    #[config(default = "target")]
    pub build_dir: PathBuf,

    /// Destination of the generated sources. Default:
    /// "<build_dir>/generated-sources/graphql-client".
    pub output_dir: Option<PathBuf>,

    /// Destination of transformed queries, only used if
    /// `codegen.generate_transformed_queries` is set. Default:
    /// "<output_dir>/transformed".
    pub transformed_queries_dir: Option<PathBuf>,
}
