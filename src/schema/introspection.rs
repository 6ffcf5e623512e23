//! Fetching a schema by sending the standard introspection query to an
//! endpoint.

use std::{io::Read, time::Instant};

use hyper::{
    header::{self, HeaderMap, HeaderValue},
    Method, Request, StatusCode, Uri,
};
use serde_json::json;

use crate::{
    config::IntrospectionSettings,
    error::BoxError,
    prelude::*,
    util::{download_body, http_client, RequestBody},
};


/// Sent as `User-Agent` with every introspection request.
pub const USER_AGENT: &str = concat!("graphql-clientgen/", env!("CARGO_PKG_VERSION"));

/// The introspection query. Asks for the full type graph; `TypeRef` follows
/// `ofType` seven levels deep to capture wrapped list and non-null types.
pub const INTROSPECTION_QUERY: &str = "
    query IntrospectionQuery {
      __schema {
        queryType { name }
        mutationType { name }
        subscriptionType { name }
        types {
          ...FullType
        }
        directives {
          name
          description
          locations
          args {
            ...InputValue
          }
        }
      }
    }

    fragment FullType on __Type {
      kind
      name
      description
      fields(includeDeprecated: true) {
        name
        description
        args {
          ...InputValue
        }
        type {
          ...TypeRef
        }
        isDeprecated
        deprecationReason
      }
      inputFields {
        ...InputValue
      }
      interfaces {
        ...TypeRef
      }
      enumValues(includeDeprecated: true) {
        name
        description
        isDeprecated
        deprecationReason
      }
      possibleTypes {
        ...TypeRef
      }
    }

    fragment InputValue on __InputValue {
      name
      description
      type { ...TypeRef }
      defaultValue
    }

    fragment TypeRef on __Type {
      kind
      name
      ofType {
        kind
        name
        ofType {
          kind
          name
          ofType {
            kind
            name
            ofType {
              kind
              name
              ofType {
                kind
                name
                ofType {
                  kind
                  name
                  ofType {
                    kind
                    name
                  }
                }
              }
            }
          }
        }
      }
    }
  ";

/// The JSON request body.
pub fn request_body() -> String {
    json!({
        "query": INTROSPECTION_QUERY,
        "variables": {},
        "operationName": "IntrospectionQuery",
    }).to_string()
}

/// Like [`fetch`], but blocks the current thread. Must not be called from
/// within an async runtime.
pub fn fetch_blocking(settings: &IntrospectionSettings) -> Result<String> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| failed(settings, "could not start async runtime", e))?;
    runtime.block_on(fetch(settings))
}

/// Sends the introspection query to the configured endpoint and returns the
/// response body as string. Only a 200 response with a non-empty JSON body
/// containing a `__schema` object counts as success.
pub async fn fetch(settings: &IntrospectionSettings) -> Result<String> {
    let before = Instant::now();
    let uri: Uri = settings.endpoint.as_str().parse()
        .map_err(|e| failed(settings, "invalid endpoint URI", e))?;

    let client = http_client(settings.accept_invalid_certs)
        .map_err(|e| failed(settings, "could not create HTTP client", e))?;

    let mut req = Request::builder()
        .method(Method::POST)
        .uri(&uri)
        .header(header::ACCEPT, "application/json")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::ACCEPT_ENCODING, "gzip, identity")
        .header(header::ACCEPT_CHARSET, "utf-8")
        .header(header::USER_AGENT, USER_AGENT)
        .body(RequestBody::from(request_body()))
        .expect("bug: failed to build request");
    for (name, value) in &settings.headers {
        req.headers_mut().insert(name.clone(), value.clone());
    }

    trace!("Sending introspection request: POST {uri}");
    let response = client.request(req).await
        .map_err(|e| failed(settings, "HTTP request failed", e))?;

    let (parts, body) = response.into_parts();
    if parts.status != StatusCode::OK {
        trace!("HTTP response: {:#?}", parts);
        return Err(Error::introspection(
            &settings.endpoint,
            format!("server responded with unexpected HTTP status {}", parts.status),
        ));
    }

    let body = download_body(body).await
        .map_err(|e| failed(settings, "failed to download response body", e))?;
    drop(client);

    let body = if is_gzip(&parts.headers) {
        trace!("Decompressing gzip response body ({} bytes)", body.len());
        gunzip(&body).map_err(|e| failed(settings, "failed to decompress gzip body", e))?
    } else {
        body.to_vec()
    };

    let payload = String::from_utf8(body)
        .map_err(|e| failed(settings, "response body is not valid UTF-8", e))?;
    check_payload(&payload).map_err(|reason| Error::introspection(&settings.endpoint, reason))?;

    debug!(
        "Received {} KiB schema from '{}' (in {:.2?})",
        payload.len() / 1024,
        settings.endpoint,
        before.elapsed(),
    );
    Ok(payload)
}

fn failed(
    settings: &IntrospectionSettings,
    reason: &str,
    source: impl Into<BoxError>,
) -> Error {
    Error::IntrospectionFailed {
        endpoint: settings.endpoint.to_string(),
        reason: reason.to_owned(),
        source: Some(source.into()),
    }
}

/// Whether the `Content-Encoding` header lists `gzip`.
fn is_gzip(headers: &HeaderMap) -> bool {
    headers.get_all(header::CONTENT_ENCODING)
        .iter()
        .filter_map(|value: &HeaderValue| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .any(|coding| coding.trim().eq_ignore_ascii_case("gzip"))
}

fn gunzip(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    flate2::read::GzDecoder::new(data).read_to_end(&mut out)?;
    Ok(out)
}

fn check_payload(payload: &str) -> Result<(), String> {
    if payload.trim().is_empty() {
        return Err("server returned an empty body".into());
    }

    let json: serde_json::Value = serde_json::from_str(payload)
        .map_err(|e| format!("response is not valid JSON: {e}"))?;
    if super::schema_root(&json).is_none() {
        return Err("response does not contain a `__schema` object".into());
    }

    Ok(())
}
