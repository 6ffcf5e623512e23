use std::fs;

use hyper::{header, Method};

use crate::{
    error::Error,
    testutil::{schema_json, MockEndpoint, MockResponse, Project},
};
use super::{introspection::USER_AGENT, resolve, schema_root, SchemaDescriptor};


#[test]
fn file_strategy_uses_existing_file() -> anyhow::Result<()> {
    let project = Project::books();
    let config = project.builder().build()?;

    let schema = resolve(&config)?;
    assert_eq!(schema, SchemaDescriptor::File(project.path("src/main/graphql/schema.json")));
    assert_eq!(schema.text()?, schema_json());
    Ok(())
}

#[test]
fn file_strategy_missing_file() -> anyhow::Result<()> {
    let project = Project::empty();
    let config = project.builder().schema_file("nope/schema.json").build()?;

    match resolve(&config) {
        Err(Error::SchemaUnavailable { path }) => assert_eq!(path, project.path("nope/schema.json")),
        other => panic!("expected SchemaUnavailable, got {other:?}"),
    }
    Ok(())
}

#[test]
fn file_strategy_rejects_directory() -> anyhow::Result<()> {
    let project = Project::books();
    let config = project.builder().schema_file("src/main/graphql").build()?;
    assert!(matches!(resolve(&config), Err(Error::SchemaUnavailable { .. })));
    Ok(())
}

#[test]
fn introspection_fetches_and_persists() -> anyhow::Result<()> {
    let server = MockEndpoint::start(MockResponse::ok(schema_json()));
    let project = Project::empty();
    let config = project.builder()
        .introspection(true)
        .endpoint(server.url())
        .schema_file("build/schema/schema.json")
        .build()?;

    let schema = resolve(&config)?;
    let persisted = project.path("build/schema/schema.json");
    assert_eq!(schema, SchemaDescriptor::Introspected {
        payload: schema_json(),
        persisted_to: Some(persisted.clone()),
    });
    assert_eq!(fs::read_to_string(persisted)?, schema_json());

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, Method::POST);
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body)?;
    assert_eq!(body["operationName"], "IntrospectionQuery");
    assert!(body["query"].as_str().unwrap().contains("__schema"));
    Ok(())
}

#[test]
fn introspection_without_persisting() -> anyhow::Result<()> {
    let server = MockEndpoint::start(MockResponse::ok(schema_json()));
    let project = Project::empty();
    let config = project.builder()
        .introspection(true)
        .endpoint(server.url())
        .persist_introspection(false)
        .build()?;

    let schema = resolve(&config)?;
    assert_eq!(schema.path(), None);
    assert!(!config.schema_file.exists());
    assert_eq!(schema.text()?, schema_json());
    Ok(())
}

#[test]
fn introspection_sends_fixed_and_custom_headers() -> anyhow::Result<()> {
    let server = MockEndpoint::start(MockResponse::ok(schema_json()));
    let project = Project::empty();
    let config = project.builder()
        .introspection(true)
        .endpoint(server.url())
        .header("Authorization", "Bearer abc123")
        .header("Accept", "application/graphql-response+json")
        .build()?;
    resolve(&config)?;

    let headers = &server.requests()[0].headers;
    assert_eq!(headers[header::CONTENT_TYPE], "application/json");
    assert_eq!(headers[header::ACCEPT_ENCODING], "gzip, identity");
    assert_eq!(headers[header::ACCEPT_CHARSET], "utf-8");
    assert_eq!(headers[header::USER_AGENT], USER_AGENT);
    assert_eq!(headers[header::AUTHORIZATION], "Bearer abc123");

    // Custom headers replace the fixed ones.
    let accept = headers.get_all(header::ACCEPT).iter().collect::<Vec<_>>();
    assert_eq!(accept, ["application/graphql-response+json"]);
    Ok(())
}

#[test]
fn introspection_decompresses_gzip() -> anyhow::Result<()> {
    let server = MockEndpoint::start(MockResponse::gzipped(&schema_json()));
    let project = Project::empty();
    let config = project.builder()
        .introspection(true)
        .endpoint(server.url())
        .persist_introspection(false)
        .build()?;

    assert_eq!(resolve(&config)?.text()?, schema_json());
    Ok(())
}

fn expect_introspection_failure(response: MockResponse) -> anyhow::Result<()> {
    let server = MockEndpoint::start(response);
    let project = Project::empty();
    let config = project.builder()
        .introspection(true)
        .endpoint(server.url())
        .build()?;

    match resolve(&config) {
        Err(Error::IntrospectionFailed { endpoint, .. }) => assert_eq!(endpoint, server.url()),
        other => panic!("expected IntrospectionFailed, got {other:?}"),
    }
    assert!(!config.schema_file.exists(), "failed introspection must not write a schema");
    Ok(())
}

#[test]
fn introspection_server_error() -> anyhow::Result<()> {
    expect_introspection_failure(MockResponse::status(500, schema_json()))
}

#[test]
fn introspection_not_found() -> anyhow::Result<()> {
    expect_introspection_failure(MockResponse::status(404, ""))
}

#[test]
fn introspection_empty_body() -> anyhow::Result<()> {
    expect_introspection_failure(MockResponse::ok(""))
}

#[test]
fn introspection_body_without_schema() -> anyhow::Result<()> {
    expect_introspection_failure(MockResponse::ok(r#"{"errors":[{"message":"nope"}]}"#))
}

#[test]
fn introspection_unreachable_endpoint() -> anyhow::Result<()> {
    // Bind and immediately drop a listener to get a port nobody listens on.
    let port = std::net::TcpListener::bind("127.0.0.1:0")?.local_addr()?.port();
    let project = Project::empty();
    let config = project.builder()
        .introspection(true)
        .endpoint(format!("http://127.0.0.1:{port}/graphql"))
        .build()?;

    assert!(matches!(resolve(&config), Err(Error::IntrospectionFailed { .. })));
    Ok(())
}

#[test]
fn self_signed_certificate_rejected_by_default() -> anyhow::Result<()> {
    let server = MockEndpoint::start_tls(MockResponse::ok(schema_json()));
    let project = Project::empty();
    let config = project.builder()
        .introspection(true)
        .endpoint(server.url())
        .build()?;

    assert!(matches!(resolve(&config), Err(Error::IntrospectionFailed { .. })));
    assert!(server.requests().is_empty());
    Ok(())
}

#[test]
fn self_signed_certificate_accepted_when_relaxed() -> anyhow::Result<()> {
    let server = MockEndpoint::start_tls(MockResponse::ok(schema_json()));
    let project = Project::empty();
    let config = project.builder()
        .introspection(true)
        .endpoint(server.url())
        .accept_invalid_certs(true)
        .build()?;

    assert_eq!(resolve(&config)?.text()?, schema_json());
    assert_eq!(server.requests().len(), 1);
    Ok(())
}

#[test]
fn schema_root_accepts_both_shapes() {
    let wrapped: serde_json::Value = serde_json::from_str(&schema_json()).unwrap();
    assert!(schema_root(&wrapped).is_some());

    let bare = wrapped["data"].clone();
    assert_eq!(schema_root(&bare), schema_root(&wrapped));

    assert_eq!(schema_root(&serde_json::json!({ "__schema": 3 })), None);
    assert_eq!(schema_root(&serde_json::json!({ "data": null })), None);
}

#[test]
fn materialize_writes_in_memory_schema() -> anyhow::Result<()> {
    let project = Project::empty();
    let schema = SchemaDescriptor::Introspected { payload: schema_json(), persisted_to: None };

    let path = schema.materialize(&project.path("staging"))?;
    assert_eq!(path, project.path("staging/introspection.json"));
    assert_eq!(fs::read_to_string(path)?, schema_json());

    let on_disk = SchemaDescriptor::File(project.path("schema.json"));
    assert_eq!(on_disk.materialize(&project.path("staging"))?, project.path("schema.json"));
    Ok(())
}
