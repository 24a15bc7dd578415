//! Purpose: Execute formatted requests against an etcd endpoint over HTTP(S).
//! Exports: `Transport`, `Response`, `HttpTransport`, `probe_endpoint`.
//! Role: Blocking I/O seam under the client; swappable for tests or custom stacks.
//! Invariants: Every HTTP status comes back as a `Response`; only transport failures are `Err`.
//! Invariants: Base URLs are normalized to scheme + authority with path `/`.
//! Invariants: Timeouts and TLS settings are fixed when the transport is built.
#![allow(clippy::result_large_err)]

use super::config::{ClientConfig, TlsMode};
use crate::core::error::{ApiResult, Error, ErrorKind};
use crate::core::request::{Body, Request};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use ureq::rustls::client::danger::{
    HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier,
};
use ureq::rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use ureq::rustls::{DigitallySignedStruct, Error as TlsError, SignatureScheme};
use url::Url;

/// Status and raw body of one HTTP exchange.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub trait Transport: Send + Sync {
    fn execute(&self, request: &Request) -> ApiResult<Response>;
}

#[derive(Clone)]
pub struct HttpTransport {
    base_url: Url,
    authorization: Option<String>,
    agent: ureq::Agent,
}

#[derive(Debug)]
struct AcceptAllServerCertVerifier;

impl ServerCertVerifier for AcceptAllServerCertVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, TlsError> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, TlsError> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, TlsError> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        ureq::rustls::crypto::aws_lc_rs::default_provider()
            .signature_verification_algorithms
            .supported_schemes()
    }
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        let base_url = normalize_base_url(&config.endpoint)?;
        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = config.connect_timeout {
            builder = builder.timeout_connect(timeout);
        }
        if let Some(timeout) = config.read_timeout {
            builder = builder.timeout_read(timeout);
        }
        builder = match &config.tls {
            TlsMode::WebPki => builder,
            TlsMode::CaFile(path) => builder.tls_config(Arc::new(ca_file_tls_config(path)?)),
            TlsMode::SkipVerify => builder.tls_config(Arc::new(skip_verify_tls_config())),
        };
        Ok(Self {
            base_url,
            authorization: config
                .credentials
                .as_ref()
                .map(|credentials| credentials.authorization_header()),
            agent: builder.build(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

impl Transport for HttpTransport {
    fn execute(&self, request: &Request) -> ApiResult<Response> {
        let url = request.url(&self.base_url)?;
        let mut call = self
            .agent
            .request(request.method().as_str(), url.as_str())
            .set("Accept", "application/json");
        if let Some(authorization) = &self.authorization {
            call = call.set("Authorization", authorization);
        }

        let result = match request.body() {
            Body::Empty => call.call(),
            Body::Form(pairs) => {
                let pairs: Vec<(&str, &str)> = pairs
                    .iter()
                    .map(|(name, value)| (name.as_str(), value.as_str()))
                    .collect();
                call.send_form(&pairs)
            }
            Body::Json(value) => call
                .set("Content-Type", "application/json")
                .send_string(&value.to_string()),
        };

        match result {
            Ok(resp) => read_response(resp),
            Err(ureq::Error::Status(_, resp)) => read_response(resp),
            Err(ureq::Error::Transport(err)) => Err(Error::new(ErrorKind::Io)
                .with_message("request failed")
                .with_source(err)),
        }
    }
}

/// `true` when `GET {endpoint}/version` answers with a 2xx/3xx status within `timeout`.
pub fn probe_endpoint(endpoint: &str, timeout: Duration) -> bool {
    let Ok(base_url) = normalize_base_url(endpoint) else {
        return false;
    };
    let Ok(url) = base_url.join("version") else {
        return false;
    };
    let agent = ureq::AgentBuilder::new()
        .timeout_connect(timeout)
        .timeout_read(timeout)
        .build();
    match agent.get(url.as_str()).call() {
        Ok(resp) => (200..400).contains(&resp.status()),
        Err(_) => false,
    }
}

pub(crate) fn normalize_base_url(raw: &str) -> ApiResult<Url> {
    let mut url = Url::parse(raw.trim()).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("invalid etcd endpoint url")
            .with_source(err)
    })?;
    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("etcd endpoint must use http or https scheme"));
    }
    if url.path() != "/" && !url.path().is_empty() {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("etcd endpoint must not include a path")
            .with_hint("Pass the scheme and authority only, e.g. http://127.0.0.1:2379"));
    }
    url.set_path("/");
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

fn read_response(response: ureq::Response) -> ApiResult<Response> {
    let status = response.status();
    let body = response.into_string().map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to read response body")
            .with_status(status)
            .with_source(err)
    })?;
    Ok(Response { status, body })
}

fn ca_file_tls_config(path: &Path) -> ApiResult<ureq::rustls::ClientConfig> {
    let cert_bytes = std::fs::read(path).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message(format!(
                "failed to read TLS CA/certificate file {}",
                path.display()
            ))
            .with_source(err)
    })?;
    let mut cert_reader = Cursor::new(cert_bytes);
    let certs = rustls_pemfile::certs(&mut cert_reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| {
            Error::new(ErrorKind::Usage)
                .with_message("failed to parse TLS CA/certificate file")
                .with_source(err)
        })?;
    if certs.is_empty() {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("TLS CA/certificate file contains no certificates"));
    }

    let _ = ureq::rustls::crypto::aws_lc_rs::default_provider().install_default();
    let mut root_store = ureq::rustls::RootCertStore::empty();
    let (added, _) = root_store.add_parsable_certificates(certs);
    if added == 0 {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("TLS CA/certificate file contains no parsable certificates"));
    }

    Ok(ureq::rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth())
}

fn skip_verify_tls_config() -> ureq::rustls::ClientConfig {
    let _ = ureq::rustls::crypto::aws_lc_rs::default_provider().install_default();
    ureq::rustls::ClientConfig::builder()
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(AcceptAllServerCertVerifier))
        .with_no_client_auth()
}
