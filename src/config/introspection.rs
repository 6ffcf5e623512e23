use std::collections::BTreeMap;


#[derive(Debug, confique::Config)]
pub struct IntrospectionConfig {
    /// If `true`, the schema is fetched from `endpoint` instead of read from
    /// `paths.schema_file`.
    #[config(default = false)]
    pub enabled: bool,

    /// GraphQL endpoint that the introspection query is sent to.
    #[config(default = "http://localhost/graphql")]
    pub endpoint: String,

    /// Accept self-signed or otherwise untrusted server certificates and do
    /// not check the hostname. Allows MITM attacks! Only use this for local
    /// development servers.
    #[config(default = false)]
    pub accept_invalid_certs: bool,

    /// Additional HTTP headers for the introspection request. These replace
    /// the default headers with the same name. Example:
    ///
    /// ```toml
    /// headers.Authorization = "Bearer abc123"
    /// ```
    pub headers: Option<BTreeMap<String, String>>,

    /// Whether to write the fetched schema to `paths.schema_file`, so that
    /// later runs can work without the endpoint.
    #[config(default = true)]
    pub persist: bool,
}
