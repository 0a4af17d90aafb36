use crate::config::ClientConfig;
use crate::transport::{ApiReply, ApiRequest, Method, Transport, TransportError};
use crate::{Error, ErrorContext, Result};
use reqwest::blocking::Client;
use reqwest::{Certificate, Identity};
use std::fs;
use std::path::{Path, PathBuf};

/// Blocking HTTP transport with optional mutual TLS.
///
/// Timeouts and connection reuse are left at reqwest's defaults.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = Client::builder();

        if let Some(ca) = &config.ca_file {
            for cert in load_ca_bundle(ca)? {
                builder = builder.add_root_certificate(cert);
            }
        }

        match (&config.cert_file, &config.key_file) {
            (Some(cert), Some(key)) => {
                builder = builder.identity(load_identity(cert, key)?);
            }
            (None, None) => {}
            (cert, _) => {
                return Err(Error::configuration_with_context(
                    "client certificate and key must be set together",
                    ErrorContext::new()
                        .with_field_path(if cert.is_some() { "key_file" } else { "cert_file" })
                        .with_source("http_transport"),
                ));
            }
        }

        let client = builder
            .build()
            .map_err(|e| Error::Transport(TransportError::Http(e)))?;

        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &ApiRequest) -> Result<ApiReply> {
        let mut req = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };

        for (name, value) in &request.headers {
            req = req.header(name.as_str(), value.as_str());
        }

        if let Some(body) = &request.body {
            req = req.body(body.clone());
        }

        let resp = req.send().map_err(TransportError::Http)?;
        let status = resp.status();
        let reason = status.canonical_reason().unwrap_or("").to_string();
        let text = resp.text().map_err(TransportError::Http)?;

        Ok(ApiReply {
            status: status.as_u16(),
            reason,
            text,
        })
    }
}

/// Load one PEM file, or every `.pem`/`.crt`/`.cer` file of a directory.
fn load_ca_bundle(path: &Path) -> Result<Vec<Certificate>> {
    let files: Vec<PathBuf> = if path.is_dir() {
        let mut files: Vec<PathBuf> = fs::read_dir(path)?
            .flatten()
            .map(|entry| entry.path())
            .filter(|p| {
                matches!(
                    p.extension().and_then(|e| e.to_str()),
                    Some("pem") | Some("crt") | Some("cer")
                )
            })
            .collect();
        files.sort();
        files
    } else {
        vec![path.to_path_buf()]
    };

    if files.is_empty() {
        return Err(Error::configuration_with_context(
            "no certificates found in CA bundle directory",
            ErrorContext::new()
                .with_field_path("ca_file")
                .with_details(path.display().to_string())
                .with_source("http_transport"),
        ));
    }

    files
        .iter()
        .map(|file| {
            let pem = fs::read(file)?;
            Certificate::from_pem(&pem).map_err(|e| {
                Error::configuration_with_context(
                    format!("invalid CA certificate: {}", e),
                    ErrorContext::new()
                        .with_field_path("ca_file")
                        .with_details(file.display().to_string())
                        .with_source("http_transport"),
                )
            })
        })
        .collect()
}

/// The TLS layer expects the certificate and private key in one PEM buffer.
fn load_identity(cert: &Path, key: &Path) -> Result<Identity> {
    let mut pem = fs::read(cert)?;
    pem.push(b'\n');
    pem.extend(fs::read(key)?);
    Identity::from_pem(&pem).map_err(|e| {
        Error::configuration_with_context(
            format!("invalid client certificate or key: {}", e),
            ErrorContext::new()
                .with_field_path("cert_file")
                .with_details(cert.display().to_string())
                .with_source("http_transport"),
        )
    })
}
