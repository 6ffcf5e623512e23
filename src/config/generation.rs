use std::{
    collections::BTreeMap,
    ffi::OsString,
    fmt,
    path::{Path, PathBuf},
};
use hyper::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use url::Url;

use crate::prelude::*;
use super::Config;


pub const DEFAULT_SCHEMA_FILE: &str = "src/main/graphql/schema.json";
pub const DEFAULT_QUERY_DIR: &str = "src/main/graphql";
pub const DEFAULT_BUILD_DIR: &str = "target";
pub const DEFAULT_ROOT_PACKAGE: &str = "com.example.graphql.client";
pub const DEFAULT_SCHEMA_PACKAGE: &str = "schema";
pub const DEFAULT_ENDPOINT: &str = "http://localhost/graphql";
pub const DEFAULT_INTERPRETER: &str = "node";

/// Output directory, relative to the build directory.
const OUTPUT_SUBDIR: &str = "generated-sources/graphql-client";
const STAGING_SUBDIR: &str = "graphql-schema";
const RUNTIME_SUBDIR: &str = "graphql-codegen-runtime";


/// How the generated code represents values that may be absent or `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NullableValueType {
    /// `java.util.Optional`-style wrapper.
    #[default]
    Optional,
    GuavaOptional,
    ApolloOptional,
    InputType,
    /// Plain values with nullability annotations.
    Annotated,
}

impl fmt::Display for NullableValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Optional => "optional",
            Self::GuavaOptional => "guava-optional",
            Self::ApolloOptional => "apollo-optional",
            Self::InputType => "input-type",
            Self::Annotated => "annotated",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GeneratorMode {
    /// Spawn the external generator CLI via its interpreter.
    #[default]
    Process,
    /// Hand the parsed input to a native generator.
    InProcess,
}

impl fmt::Display for GeneratorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Process => "process",
            Self::InProcess => "in-process",
        })
    }
}

/// Settings of the introspection strategy. Only present if introspection is
/// enabled.
#[derive(Debug, Clone)]
pub struct IntrospectionSettings {
    pub endpoint: Url,
    /// Accept self-signed and otherwise untrusted certificates and skip the
    /// hostname check.
    pub accept_invalid_certs: bool,
    /// Sent after the fixed headers, replacing them on name collision.
    pub headers: HeaderMap,
    /// Whether to write the fetched schema to `GenerationConfig::schema_file`.
    pub persist: bool,
}

#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    pub mode: GeneratorMode,
    pub interpreter: String,
    /// Entry script of the generator. If `None`, the embedded runtime is
    /// extracted to `GenerationConfig::runtime_dir` and its entry is used.
    pub script: Option<PathBuf>,
    /// Search path for the interpreter. `None` means `PATH`.
    pub search_path: Option<OsString>,
}

/// The validated, immutable configuration of one generation run. All paths
/// are absolute (if the project directory is) and all defaults are resolved.
///
/// Can only be created through [`GenerationConfig::builder`] or
/// [`GenerationConfig::from_config`].
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct GenerationConfig {
    pub project_dir: PathBuf,
    pub schema_file: PathBuf,
    pub query_dir: PathBuf,
    pub build_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Where query documents are copied to before the external generator runs.
    pub staging_dir: PathBuf,
    /// Where the embedded generator runtime is extracted to.
    pub runtime_dir: PathBuf,
    /// `Some` iff transformed queries should be written.
    pub transformed_queries_dir: Option<PathBuf>,

    pub root_package_name: String,
    pub schema_package_name: String,
    pub custom_type_map: BTreeMap<String, String>,
    pub nullable_value_type: NullableValueType,
    pub use_semantic_naming: bool,
    pub generate_model_builder: bool,
    pub use_java_beans_semantic_naming: bool,
    pub suppress_raw_types_warning: bool,
    pub generate_kotlin_models: bool,
    pub generate_visitor_for_polymorphic_datatypes: bool,

    /// `Some` iff the schema is fetched via introspection.
    pub introspection: Option<IntrospectionSettings>,
    pub generator: GeneratorSettings,

    pub skip: bool,
    pub add_source_root: bool,
}

impl GenerationConfig {
    /// Starts building a config for the project in `project_dir`. Relative
    /// paths given to the builder are resolved against that directory.
    pub fn builder(project_dir: impl Into<PathBuf>) -> GenerationConfigBuilder {
        GenerationConfigBuilder::new(project_dir.into())
    }

    /// Validates the file-facing configuration. `project_dir` is usually the
    /// directory containing the configuration file.
    pub fn from_config(config: &Config, project_dir: impl Into<PathBuf>) -> Result<Self> {
        let paths = &config.paths;
        let codegen = &config.codegen;
        let introspection = &config.introspection;
        let generator = &config.generator;

        let mut builder = Self::builder(project_dir)
            .schema_file(&paths.schema_file)
            .query_dir(&paths.query_dir)
            .build_dir(&paths.build_dir)
            .root_package_name(&codegen.root_package_name)
            .schema_package_name(&codegen.schema_package_name)
            .nullable_value_type(codegen.nullable_value_type)
            .use_semantic_naming(codegen.use_semantic_naming)
            .generate_model_builder(codegen.generate_model_builder)
            .use_java_beans_semantic_naming(codegen.use_java_beans_semantic_naming)
            .suppress_raw_types_warning(codegen.suppress_raw_types_warning)
            .generate_kotlin_models(codegen.generate_kotlin_models)
            .generate_visitor_for_polymorphic_datatypes(
                codegen.generate_visitor_for_polymorphic_datatypes,
            )
            .generate_transformed_queries(codegen.generate_transformed_queries)
            .introspection(introspection.enabled)
            .endpoint(&introspection.endpoint)
            .accept_invalid_certs(introspection.accept_invalid_certs)
            .persist_introspection(introspection.persist)
            .generator_mode(generator.mode)
            .interpreter(&generator.interpreter)
            .skip(config.skip)
            .add_source_root(config.add_source_root);

        if let Some(dir) = &paths.output_dir {
            builder = builder.output_dir(dir);
        }
        if let Some(dir) = &paths.transformed_queries_dir {
            builder = builder.transformed_queries_dir(dir);
        }
        if let Some(script) = &generator.script {
            builder = builder.generator_script(script);
        }
        if let Some(search_path) = &generator.search_path {
            builder = builder.search_path(search_path);
        }
        for (scalar, runtime_type) in codegen.custom_type_map.iter().flatten() {
            builder = builder.custom_type(scalar, runtime_type);
        }
        for (name, value) in introspection.headers.iter().flatten() {
            builder = builder.header(name, value);
        }

        builder.build()
    }

    /// The root package as relative directory path, e.g. `com/example/client`.
    pub fn package_dir(&self) -> PathBuf {
        self.root_package_name.split('.').collect()
    }

    /// Package that types derived from the schema are placed in.
    pub fn schema_package(&self) -> String {
        format!("{}.{}", self.root_package_name, self.schema_package_name)
    }
}


/// Builder for [`GenerationConfig`]. All setters are optional; `build`
/// fills in defaults and validates the combination.
#[derive(Debug, Clone)]
pub struct GenerationConfigBuilder {
    project_dir: PathBuf,
    schema_file: PathBuf,
    query_dir: PathBuf,
    build_dir: PathBuf,
    output_dir: Option<PathBuf>,
    transformed_queries_dir: Option<PathBuf>,
    generate_transformed_queries: bool,
    root_package_name: String,
    schema_package_name: String,
    custom_type_map: BTreeMap<String, String>,
    nullable_value_type: NullableValueType,
    use_semantic_naming: bool,
    generate_model_builder: bool,
    use_java_beans_semantic_naming: bool,
    suppress_raw_types_warning: bool,
    generate_kotlin_models: bool,
    generate_visitor_for_polymorphic_datatypes: bool,
    introspection: bool,
    endpoint: String,
    accept_invalid_certs: bool,
    headers: Vec<(String, String)>,
    persist_introspection: bool,
    generator_mode: GeneratorMode,
    interpreter: String,
    generator_script: Option<PathBuf>,
    search_path: Option<OsString>,
    skip: bool,
    add_source_root: bool,
}

macro_rules! setters {
    ($( $(#[$attr:meta])* $name:ident: $ty:ty ),* $(,)?) => {
        $(
            $(#[$attr])*
            pub fn $name(mut self, value: $ty) -> Self {
                self.$name = value;
                self
            }
        )*
    };
}

impl GenerationConfigBuilder {
    fn new(project_dir: PathBuf) -> Self {
        Self {
            project_dir,
            schema_file: DEFAULT_SCHEMA_FILE.into(),
            query_dir: DEFAULT_QUERY_DIR.into(),
            build_dir: DEFAULT_BUILD_DIR.into(),
            output_dir: None,
            transformed_queries_dir: None,
            generate_transformed_queries: false,
            root_package_name: DEFAULT_ROOT_PACKAGE.into(),
            schema_package_name: DEFAULT_SCHEMA_PACKAGE.into(),
            custom_type_map: BTreeMap::new(),
            nullable_value_type: NullableValueType::default(),
            use_semantic_naming: true,
            generate_model_builder: true,
            use_java_beans_semantic_naming: true,
            suppress_raw_types_warning: false,
            generate_kotlin_models: false,
            generate_visitor_for_polymorphic_datatypes: true,
            introspection: false,
            endpoint: DEFAULT_ENDPOINT.into(),
            accept_invalid_certs: false,
            headers: Vec::new(),
            persist_introspection: true,
            generator_mode: GeneratorMode::default(),
            interpreter: DEFAULT_INTERPRETER.into(),
            generator_script: None,
            search_path: None,
            skip: false,
            add_source_root: true,
        }
    }

    pub fn schema_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.schema_file = path.into();
        self
    }

    pub fn query_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.query_dir = path.into();
        self
    }

    pub fn build_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.build_dir = path.into();
        self
    }

    /// Defaults to `<build_dir>/generated-sources/graphql-client`.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Defaults to `<output_dir>/transformed`. Only used if
    /// `generate_transformed_queries` is set.
    pub fn transformed_queries_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.transformed_queries_dir = Some(path.into());
        self
    }

    pub fn root_package_name(mut self, name: impl Into<String>) -> Self {
        self.root_package_name = name.into();
        self
    }

    pub fn schema_package_name(mut self, name: impl Into<String>) -> Self {
        self.schema_package_name = name.into();
        self
    }

    /// Maps the GraphQL scalar `scalar` to the runtime type `runtime_type`.
    pub fn custom_type(mut self, scalar: impl Into<String>, runtime_type: impl Into<String>) -> Self {
        self.custom_type_map.insert(scalar.into(), runtime_type.into());
        self
    }

    /// Enables or disables the introspection strategy.
    pub fn introspection(mut self, enabled: bool) -> Self {
        self.introspection = enabled;
        self
    }

    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = url.into();
        self
    }

    /// Adds a custom header to the introspection request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn interpreter(mut self, name: impl Into<String>) -> Self {
        self.interpreter = name.into();
        self
    }

    pub fn generator_script(mut self, path: impl Into<PathBuf>) -> Self {
        self.generator_script = Some(path.into());
        self
    }

    pub fn search_path(mut self, path: impl Into<OsString>) -> Self {
        self.search_path = Some(path.into());
        self
    }

    setters! {
        nullable_value_type: NullableValueType,
        use_semantic_naming: bool,
        generate_model_builder: bool,
        use_java_beans_semantic_naming: bool,
        suppress_raw_types_warning: bool,
        generate_kotlin_models: bool,
        generate_visitor_for_polymorphic_datatypes: bool,
        generate_transformed_queries: bool,
        /// Opt-in: accept untrusted TLS certificates during introspection.
        accept_invalid_certs: bool,
        persist_introspection: bool,
        generator_mode: GeneratorMode,
        skip: bool,
        add_source_root: bool,
    }

    /// Resolves defaults and validates everything.
    pub fn build(self) -> Result<GenerationConfig> {
        // The external generator runs in a different working directory, so
        // every derived path has to be absolute.
        let project_dir = std::path::absolute(&self.project_dir)
            .map_err(|e| Error::io("failed to resolve project directory", &self.project_dir, e))?;
        let resolve = |p: &Path| if p.is_relative() { project_dir.join(p) } else { p.to_owned() };

        validate_package_name(&self.root_package_name, "root package name")?;
        validate_package_name(&self.schema_package_name, "schema package name")?;
        for (scalar, runtime_type) in &self.custom_type_map {
            if !is_graphql_name(scalar) {
                return Err(invalid(format!(
                    "custom type map: '{scalar}' is not a valid GraphQL scalar name",
                )));
            }
            if runtime_type.trim().is_empty() {
                return Err(invalid(format!(
                    "custom type map: scalar '{scalar}' has no runtime type registered",
                )));
            }
        }

        let introspection = if self.introspection {
            Some(IntrospectionSettings {
                endpoint: parse_endpoint(&self.endpoint)?,
                accept_invalid_certs: self.accept_invalid_certs,
                headers: parse_headers(&self.headers)?,
                persist: self.persist_introspection,
            })
        } else {
            None
        };

        if self.interpreter.trim().is_empty() {
            return Err(invalid("generator interpreter name must not be empty"));
        }

        let schema_file = resolve(&self.schema_file);
        let query_dir = resolve(&self.query_dir);
        let build_dir = resolve(&self.build_dir);
        let output_dir = match &self.output_dir {
            Some(dir) => resolve(dir),
            None => build_dir.join(OUTPUT_SUBDIR),
        };
        let transformed_queries_dir = self.generate_transformed_queries.then(|| {
            match &self.transformed_queries_dir {
                Some(dir) => resolve(dir),
                None => output_dir.join("transformed"),
            }
        });

        // Mirrors the query directory and the package layout, e.g.
        // `target/graphql-schema/src/main/graphql/com/example/graphql/client`.
        let query_dir_in_project = query_dir.strip_prefix(&project_dir)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| query_dir.file_name().map(PathBuf::from).unwrap_or_default());
        let package_dir: PathBuf = self.root_package_name.split('.').collect();
        let staging_dir = build_dir.join(STAGING_SUBDIR)
            .join(query_dir_in_project)
            .join(package_dir);

        Ok(GenerationConfig {
            schema_file,
            query_dir,
            runtime_dir: build_dir.join(RUNTIME_SUBDIR),
            staging_dir,
            output_dir,
            build_dir,
            transformed_queries_dir,
            root_package_name: self.root_package_name,
            schema_package_name: self.schema_package_name,
            custom_type_map: self.custom_type_map,
            nullable_value_type: self.nullable_value_type,
            use_semantic_naming: self.use_semantic_naming,
            generate_model_builder: self.generate_model_builder,
            use_java_beans_semantic_naming: self.use_java_beans_semantic_naming,
            suppress_raw_types_warning: self.suppress_raw_types_warning,
            generate_kotlin_models: self.generate_kotlin_models,
            generate_visitor_for_polymorphic_datatypes:
                self.generate_visitor_for_polymorphic_datatypes,
            introspection,
            generator: GeneratorSettings {
                mode: self.generator_mode,
                interpreter: self.interpreter,
                script: self.generator_script.as_deref().map(resolve),
                search_path: self.search_path,
            },
            skip: self.skip,
            add_source_root: self.add_source_root,
            project_dir,
        })
    }
}

fn invalid(msg: impl Into<String>) -> Error {
    Error::InvalidConfiguration(msg.into())
}

/// Checks the GraphQL name grammar `[_A-Za-z][_0-9A-Za-z]*`.
pub(crate) fn is_graphql_name(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(|c| c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

fn validate_package_name(name: &str, what: &str) -> Result<()> {
    let valid_segment = |segment: &str| {
        let mut chars = segment.chars();
        chars.next().is_some_and(|c| c == '_' || c.is_alphabetic())
            && chars.all(|c| c == '_' || c.is_alphanumeric())
    };

    if name.is_empty() || !name.split('.').all(valid_segment) {
        return Err(invalid(format!("{what} '{name}' is not a valid dot-separated package name")));
    }
    Ok(())
}

fn parse_endpoint(src: &str) -> Result<Url> {
    if src.trim().is_empty() {
        return Err(invalid("introspection is enabled, but no schema endpoint is configured"));
    }

    let url = Url::parse(src)
        .map_err(|e| invalid(format!("invalid schema endpoint '{src}': {e}")))?;
    if !["http", "https"].contains(&url.scheme()) {
        return Err(invalid(format!("schema endpoint '{src}' must use 'http' or 'https'")));
    }
    if url.host_str().is_none() {
        return Err(invalid(format!("schema endpoint '{src}' has no host")));
    }

    Ok(url)
}

fn parse_headers(headers: &[(String, String)]) -> Result<HeaderMap> {
    let mut out = HeaderMap::new();
    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| invalid(format!("invalid custom header name '{name}'")))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|_| invalid(format!("invalid value for custom header '{name}'")))?;
        out.insert(header_name, header_value);
    }
    Ok(out)
}
