use std::sync::Arc;

use anyhow::Context as _;
use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use rustls::{
    client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier},
    crypto::CryptoProvider,
    pki_types::{CertificateDer, ServerName, UnixTime},
    DigitallySignedStruct, SignatureScheme,
};

use crate::prelude::*;


pub(crate) type RequestBody = http_body_util::Full<Bytes>;
pub(crate) type HttpClient = Client<HttpsConnector<HttpConnector>, RequestBody>;

/// Returns an HTTP client that can also speak HTTPS. HTTPS is _not_ enforced!
///
/// The client does not keep idle connections around, so every request uses a
/// fresh connection which is closed afterwards. If `accept_invalid_certs` is
/// set, server certificates are not checked at all.
pub(crate) fn http_client(accept_invalid_certs: bool) -> anyhow::Result<HttpClient> {
    let https = HttpsConnectorBuilder::new()
        .with_tls_config(tls_config(accept_invalid_certs)?)
        .https_or_http()
        .enable_http1()
        .enable_http2()
        .build();

    Ok(Client::builder(TokioExecutor::new())
        .pool_max_idle_per_host(0)
        .build(https))
}

fn tls_config(accept_invalid_certs: bool) -> anyhow::Result<rustls::ClientConfig> {
    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
    let builder = rustls::ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .context("failed to configure TLS protocol versions")?;

    if accept_invalid_certs {
        warn!("TLS certificate verification is disabled for this connection!");
        return Ok(builder.dangerous()
            .with_custom_certificate_verifier(Arc::new(DangerousAlwaysAcceptCerts(provider)))
            .with_no_client_auth());
    }

    let native = rustls_native_certs::load_native_certs();
    for e in &native.errors {
        warn!("Failed to load a system-wide certificate: {e}");
    }
    let mut root_certs = rustls::RootCertStore::empty();
    let (added, ignored) = root_certs.add_parsable_certificates(native.certs);
    debug!("Loaded {added} system-wide certificates ({ignored} ignored)");

    Ok(builder.with_root_certificates(root_certs).with_no_client_auth())
}

/// Downloads the whole body of a response.
pub(crate) async fn download_body(body: Incoming) -> Result<Bytes, hyper::Error> {
    body.collect().await.map(|collected| collected.to_bytes())
}

/// Certificate verifier that blindly says "it's valid" for every certificate
/// and every server name. Handshake signatures are still checked, so that the
/// connection is at least encrypted for whoever presented the certificate.
#[derive(Debug)]
pub(crate) struct DangerousAlwaysAcceptCerts(Arc<CryptoProvider>);

impl ServerCertVerifier for DangerousAlwaysAcceptCerts {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.0.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.0.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}
