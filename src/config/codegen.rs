use std::collections::BTreeMap;

use super::NullableValueType;


/// Options passed through to the code generator.
#[derive(Debug, confique::Config)]
pub struct CodegenConfig {
    /// Package that all generated types are placed in. Query documents in
    /// sub-directories of `paths.query_dir` end up in sub-packages.
    #[config(default = "com.example.graphql.client")]
    pub root_package_name: String,

    /// Sub-package (of `root_package_name`) for types derived from the
    /// schema, like enums and input types.
    #[config(default = "schema")]
    pub schema_package_name: String,

    /// Maps custom GraphQL scalars to runtime types, e.g.:
    ///
    /// ```toml
    /// custom_type_map.Long = "java.lang.Long"
    /// custom_type_map.DateTime = "java.time.ZonedDateTime"
    /// ```
    pub custom_type_map: Option<BTreeMap<String, String>>,

    /// How nullable values are represented. One of "optional",
    /// "guava-optional", "apollo-optional", "input-type" or "annotated".
    #[config(default = "optional")]
    pub nullable_value_type: NullableValueType,

    #[config(default = true)]
    pub use_semantic_naming: bool,

    /// Whether builder-style constructors are generated for models.
    #[config(default = true)]
    pub generate_model_builder: bool,

    #[config(default = true)]
    pub use_java_beans_semantic_naming: bool,

    #[config(default = false)]
    pub suppress_raw_types_warning: bool,

    #[config(default = false)]
    pub generate_kotlin_models: bool,

    #[config(default = true)]
    pub generate_visitor_for_polymorphic_datatypes: bool,

    /// If set, the queries as they are sent to the server (with added
    /// `__typename` fields) are written to `paths.transformed_queries_dir`.
    #[config(default = false)]
    pub generate_transformed_queries: bool,
}
