//! Helpers shared by the tests of different modules: a temporary project
//! with a schema and query documents, a mock GraphQL endpoint, a fake code
//! generator and a fake interpreter.

use std::{
    convert::Infallible,
    env,
    fs,
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{
    body::Incoming, header::HeaderMap, server::conn::http1, service::service_fn, Request, Response,
};
use hyper_util::rt::TokioIo;
use serde_json::json;
use tempfile::TempDir;

use crate::{
    config::{GenerationConfig, GenerationConfigBuilder},
    error::BoxError,
    generate::IntermediateRepresentation,
};


pub(crate) const GET_BOOKS: &str = "query GetBooks {\n  books {\n    id\n    title\n  }\n}\n";
pub(crate) const GET_AUTHORS: &str = "query GetAuthors {\n  books {\n    author {\n      name\n    }\n  }\n}\n";

/// A small introspection result: `Query { books: [Book!]! }`,
/// `Book { id, title, author }` and `Author { name }`.
pub(crate) fn schema_json() -> String {
    let named = |kind: &str, name: &str| json!({ "kind": kind, "name": name, "ofType": null });
    let non_null = |inner: serde_json::Value| json!({ "kind": "NON_NULL", "name": null, "ofType": inner });
    let field = |name: &str, ty: serde_json::Value| json!({
        "name": name,
        "description": null,
        "args": [],
        "type": ty,
        "isDeprecated": false,
        "deprecationReason": null,
    });
    let object = |name: &str, fields: Vec<serde_json::Value>| json!({
        "kind": "OBJECT",
        "name": name,
        "description": null,
        "fields": fields,
        "inputFields": null,
        "interfaces": [],
        "enumValues": null,
        "possibleTypes": null,
    });
    let scalar = |name: &str| json!({
        "kind": "SCALAR",
        "name": name,
        "description": null,
        "fields": null,
        "inputFields": null,
        "interfaces": null,
        "enumValues": null,
        "possibleTypes": null,
    });

    let schema = json!({
        "data": {
            "__schema": {
                "queryType": { "name": "Query" },
                "mutationType": null,
                "subscriptionType": null,
                "types": [
                    object("Query", vec![
                        field("books", non_null(json!({
                            "kind": "LIST",
                            "name": null,
                            "ofType": non_null(named("OBJECT", "Book")),
                        }))),
                    ]),
                    object("Book", vec![
                        field("id", non_null(named("SCALAR", "ID"))),
                        field("title", named("SCALAR", "String")),
                        field("author", named("OBJECT", "Author")),
                    ]),
                    object("Author", vec![field("name", named("SCALAR", "String"))]),
                    scalar("ID"),
                    scalar("String"),
                    scalar("Boolean"),
                ],
                "directives": [],
            }
        }
    });

    serde_json::to_string_pretty(&schema).unwrap()
}


/// A project in a temporary directory, laid out with the default paths.
pub(crate) struct Project {
    dir: TempDir,
}

impl Project {
    /// Empty project, no schema, no queries.
    pub(crate) fn empty() -> Self {
        Self { dir: tempfile::tempdir().unwrap() }
    }

    /// Project with the schema at the default location and `GetBooks` plus
    /// `GetAuthors` in the default query directory.
    pub(crate) fn books() -> Self {
        let project = Self::empty();
        project.write("src/main/graphql/schema.json", &schema_json());
        project.write("src/main/graphql/GetBooks.graphql", GET_BOOKS);
        project.write("src/main/graphql/GetAuthors.graphql", GET_AUTHORS);
        project
    }

    pub(crate) fn root(&self) -> &Path {
        self.dir.path()
    }

    pub(crate) fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    pub(crate) fn write(&self, relative: &str, contents: &str) {
        let path = self.path(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    pub(crate) fn builder(&self) -> GenerationConfigBuilder {
        GenerationConfig::builder(self.root())
    }
}

/// Expresses the absolute `path` relative to the current working directory,
/// by walking up to the file system root first.
#[cfg(unix)]
pub(crate) fn relative_to_cwd(path: &Path) -> PathBuf {
    let cwd = env::current_dir().unwrap();
    let mut relative = cwd.components().skip(1).map(|_| "..").collect::<PathBuf>();
    relative.push(path.strip_prefix("/").unwrap());
    assert!(relative.is_relative());
    relative
}

/// Returns all files below `dir` with their contents, sorted by path.
pub(crate) fn snapshot(dir: &Path) -> Vec<(PathBuf, Vec<u8>)> {
    fn walk(root: &Path, dir: &Path, out: &mut Vec<(PathBuf, Vec<u8>)>) {
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(root, &path, out);
            } else {
                let contents = fs::read(&path).unwrap();
                out.push((path.strip_prefix(root).unwrap().to_owned(), contents));
            }
        }
    }

    let mut out = Vec::new();
    walk(dir, dir, &mut out);
    out.sort();
    out
}


/// Deterministic stand-in for a real code generator. Writes one file per
/// operation into the operation's package directory, plus one file listing
/// the object types into the schema package.
pub(crate) fn fake_generator(
    ir: &IntermediateRepresentation,
    config: &GenerationConfig,
) -> Result<(), BoxError> {
    for op in &ir.operations {
        let dir = config.output_dir.join(op.package_name.replace('.', "/"));
        fs::create_dir_all(&dir)?;
        let stem = op.relative_path.file_stem().ok_or("operation without file name")?;
        let contents = format!("package {};\n\n{}", op.package_name, op.source);
        fs::write(dir.join(stem).with_extension("generated"), contents)?;
    }

    let mut types = ir.schema["types"].as_array()
        .ok_or("schema without types")?
        .iter()
        .filter(|ty| ty["kind"] == "OBJECT")
        .filter_map(|ty| ty["name"].as_str())
        .collect::<Vec<_>>();
    types.sort();

    let dir = config.output_dir.join(config.schema_package().replace('.', "/"));
    fs::create_dir_all(&dir)?;
    fs::write(dir.join("Types.generated"), types.join("\n"))?;

    Ok(())
}


#[derive(Clone)]
pub(crate) struct MockResponse {
    pub(crate) status: u16,
    pub(crate) headers: Vec<(&'static str, String)>,
    pub(crate) body: Vec<u8>,
}

impl MockResponse {
    pub(crate) fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            headers: vec![("content-type", "application/json".into())],
            body: body.into(),
        }
    }

    pub(crate) fn status(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self { status, ..Self::ok(body) }
    }

    pub(crate) fn gzipped(body: &str) -> Self {
        use std::io::Write;

        let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(body.as_bytes()).unwrap();
        let mut response = Self::ok(encoder.finish().unwrap());
        response.headers.push(("content-encoding", "gzip".into()));
        response
    }
}

#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub(crate) method: hyper::Method,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Bytes,
}

/// An HTTP(S) server on a random local port that answers every request with
/// the same response and records all requests. Runs on its own thread with
/// its own runtime, so that it can be used from blocking code.
pub(crate) struct MockEndpoint {
    addr: SocketAddr,
    tls: bool,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockEndpoint {
    pub(crate) fn start(response: MockResponse) -> Self {
        Self::spawn(response, None)
    }

    /// Like `start`, but speaks HTTPS with a freshly generated self-signed
    /// certificate.
    pub(crate) fn start_tls(response: MockResponse) -> Self {
        let rcgen::CertifiedKey { cert, key_pair } = rcgen::generate_simple_self_signed(
            vec!["localhost".to_owned(), "127.0.0.1".to_owned()],
        ).unwrap();
        let key = rustls::pki_types::PrivateKeyDer::Pkcs8(key_pair.serialize_der().into());

        let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
        let config = rustls::ServerConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .unwrap()
            .with_no_client_auth()
            .with_single_cert(vec![cert.der().clone()], key)
            .unwrap();

        Self::spawn(response, Some(tokio_rustls::TlsAcceptor::from(Arc::new(config))))
    }

    fn spawn(response: MockResponse, tls: Option<tokio_rustls::TlsAcceptor>) -> Self {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let is_tls = tls.is_some();

        let recorded = requests.clone();
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener).unwrap();
                loop {
                    let Ok((stream, _)) = listener.accept().await else { continue };
                    let response = response.clone();
                    let recorded = recorded.clone();
                    let tls = tls.clone();
                    tokio::spawn(async move {
                        let service = service_fn(move |req| {
                            handle(req, response.clone(), recorded.clone())
                        });
                        let http = http1::Builder::new();
                        // Failed handshakes are expected in some tests.
                        let _ = match tls {
                            Some(acceptor) => match acceptor.accept(stream).await {
                                Ok(stream) => http.serve_connection(TokioIo::new(stream), service).await,
                                Err(_) => return,
                            },
                            None => http.serve_connection(TokioIo::new(stream), service).await,
                        };
                    });
                }
            });
        });

        Self { addr, tls: is_tls, requests }
    }

    pub(crate) fn url(&self) -> String {
        let scheme = if self.tls { "https" } else { "http" };
        format!("{scheme}://{}/graphql", self.addr)
    }

    pub(crate) fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

async fn handle(
    req: Request<Incoming>,
    response: MockResponse,
    recorded: Arc<Mutex<Vec<RecordedRequest>>>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();
    let body = body.collect().await.map(|b| b.to_bytes()).unwrap_or_default();
    recorded.lock().unwrap().push(RecordedRequest {
        method: parts.method,
        headers: parts.headers,
        body,
    });

    let mut builder = Response::builder().status(response.status);
    for (name, value) in &response.headers {
        builder = builder.header(*name, value);
    }
    Ok(builder.body(Full::new(Bytes::from(response.body))).unwrap())
}


/// A shell script posing as the interpreter of the external generator. It
/// records its arguments and writes a compiled IR listing every query
/// document it was given, then exits with the configured code.
#[cfg(unix)]
pub(crate) struct FakeInterpreter {
    pub(crate) bin_dir: PathBuf,
    pub(crate) script: PathBuf,
    log: PathBuf,
}

#[cfg(unix)]
impl FakeInterpreter {
    pub(crate) fn install(dir: &Path, exit_code: i32) -> Self {
        use std::os::unix::fs::PermissionsExt;

        let bin_dir = dir.join("bin");
        let log = dir.join("interpreter-args.log");
        let script = dir.join("generator/cli.js");
        fs::create_dir_all(&bin_dir).unwrap();
        fs::create_dir_all(script.parent().unwrap()).unwrap();
        fs::write(&script, "// generator entry\n").unwrap();

        let interpreter = bin_dir.join("node");
        fs::write(&interpreter, format!(r#"#!/bin/sh
log='{log}'
: > "$log"
for arg in "$@"; do printf '%s\n' "$arg" >> "$log"; done
shift 2
out=''
ops=''
sep=''
while [ $# -gt 0 ]; do
    case "$1" in
        --target|--schema) shift 2 ;;
        --output) out="$2"; shift 2 ;;
        *) ops="$ops$sep{{\"filePath\":\"$1\"}}"; sep=','; shift ;;
    esac
done
if [ {exit_code} -ne 0 ]; then
    echo "compilation failed" >&2
    exit {exit_code}
fi
printf '{{"operations":[%s]}}\n' "$ops" > "$out"
"#, log = log.display())).unwrap();
        fs::set_permissions(&interpreter, fs::Permissions::from_mode(0o755)).unwrap();

        Self { bin_dir, script, log }
    }

    /// Arguments of the last invocation, including the script path.
    pub(crate) fn recorded_args(&self) -> Vec<String> {
        fs::read_to_string(&self.log)
            .unwrap_or_default()
            .lines()
            .map(str::to_owned)
            .collect()
    }

    pub(crate) fn was_called(&self) -> bool {
        self.log.exists()
    }
}
