//! HTTP transport seam.
//!
//! The client speaks to the API through the [`Transport`] trait so that the
//! session and polling logic can run against a scripted transport in tests.
//! [`HttpTransport`] is the production implementation on top of the blocking
//! reqwest client.

pub mod http;

pub use http::HttpTransport;

use crate::Result;

/// HTTP method used by the AntiNex API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// A fully prepared request: absolute URL, headers and optional JSON body text.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl ApiRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            headers: Vec::new(),
            body: Some(body.into()),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// First header value with the given name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Raw reply: status code, reason phrase and body text.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiReply {
    pub status: u16,
    pub reason: String,
    pub text: String,
}

impl ApiReply {
    /// Build a reply using the canonical reason phrase for `status`.
    pub fn new(status: u16, text: impl Into<String>) -> Self {
        let reason = reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("")
            .to_string();
        Self {
            status,
            reason,
            text: text.into(),
        }
    }

    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        Self::new(status, body.to_string())
    }

    /// `text=<body> reason=<reason>` summary attached to envelope errors.
    pub fn summary(&self) -> String {
        format!("text={} reason={}", self.text, self.reason)
    }
}

/// Sends one request and returns the raw reply.
///
/// Implementations must not interpret status codes; a 401 or 500 is a normal
/// reply. Only failures to obtain a reply at all are errors.
pub trait Transport: Send {
    fn send(&self, request: &ApiRequest) -> Result<ApiReply>;
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}
