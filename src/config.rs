//! Client configuration.
//!
//! Settings are read once, when a config is built, and passed to the client as a
//! typed struct. Two environment layouts are supported: the `API_*` variables
//! used by the command line programs and the `ANTINEX_*` variables used by
//! long-running publishers.

use crate::{Error, ErrorContext, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_URL: &str = "http://localhost:8080";
pub const USER_NOT_SET: &str = "user-not-set";
pub const PASSWORD_NOT_SET: &str = "password-not-set";
pub const EMAIL_NOT_SET: &str = "email-not-set";

/// Connection, credential and retry settings for an [`crate::AiClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub email: String,
    /// CA bundle used to verify the server: a PEM file or a directory of PEM files.
    pub ca_file: Option<PathBuf>,
    /// Client certificate (PEM) presented for mutual TLS.
    pub cert_file: Option<PathBuf>,
    /// Private key (PEM) matching `cert_file`.
    pub key_file: Option<PathBuf>,
    pub verbose: bool,
    pub debug: bool,
    /// Login attempts allowed by `retry_login` beyond the first.
    pub max_retries: u32,
    /// Fixed pause between failed login attempts.
    pub login_retry_wait: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_URL.to_string(),
            username: USER_NOT_SET.to_string(),
            password: PASSWORD_NOT_SET.to_string(),
            email: EMAIL_NOT_SET.to_string(),
            ca_file: None,
            cert_file: None,
            key_file: None,
            verbose: true,
            debug: false,
            max_retries: 10,
            login_retry_wait: Duration::from_millis(100),
        }
    }
}

impl ClientConfig {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            username: username.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    /// Build from the `API_*` variables of the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from the `API_*` variables returned by `lookup`.
    ///
    /// - `API_USER`, `API_PASSWORD`, `API_EMAIL`, `API_URL`
    /// - `API_CA_BUNDLE_DIR`, `API_CERT_FILE`, `API_KEY_FILE`
    /// - `API_VERBOSE` (default `true`), `API_DEBUG` (default `false`)
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let path = |key: &str| lookup(key).filter(|s| !s.is_empty()).map(PathBuf::from);

        let debug = var("API_DEBUG", "false").to_lowercase() == "true";
        let verbose = var("API_VERBOSE", "true").to_lowercase() == "true";

        Self {
            base_url: var("API_URL", DEFAULT_URL),
            username: var("API_USER", USER_NOT_SET),
            password: var("API_PASSWORD", PASSWORD_NOT_SET),
            email: var("API_EMAIL", EMAIL_NOT_SET),
            ca_file: path("API_CA_BUNDLE_DIR"),
            cert_file: path("API_CERT_FILE"),
            key_file: path("API_KEY_FILE"),
            verbose: verbose || debug,
            debug,
            ..Self::default()
        }
    }

    /// Build from the `ANTINEX_*` variables of the process environment.
    ///
    /// Returns `None` when publishing is disabled (`ANTINEX_PUBLISH_ENABLED` is not `1`).
    pub fn from_antinex_env() -> Option<Self> {
        Self::from_antinex_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_antinex_lookup<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let path = |key: &str| lookup(key).filter(|s| !s.is_empty()).map(PathBuf::from);

        if var("ANTINEX_PUBLISH_ENABLED", "1") != "1" {
            tracing::info!("publish disabled ANTINEX_PUBLISH_ENABLED=0");
            return None;
        }

        let debug = var("ANTINEX_CLIENT_DEBUG", "0") == "1";
        let verbose = var("ANTINEX_CLIENT_VERBOSE", "1") == "1";

        Some(Self {
            base_url: var("ANTINEX_URL", DEFAULT_URL),
            username: var("ANTINEX_USER", "root"),
            password: var("ANTINEX_PASSWORD", "123321"),
            email: var("ANTINEX_EMAIL", "notreal@test.com"),
            ca_file: path("ANTINEX_CA_FILE"),
            cert_file: path("ANTINEX_CERT_FILE"),
            key_file: path("ANTINEX_KEY_FILE"),
            verbose: verbose || debug,
            debug,
            ..Self::default()
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn with_ca_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_file = Some(path.into());
        self
    }

    pub fn with_client_cert(mut self, cert: impl Into<PathBuf>, key: impl Into<PathBuf>) -> Self {
        self.cert_file = Some(cert.into());
        self.key_file = Some(key.into());
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose || self.debug;
        self
    }

    /// Enable request/response dumps. Debug implies verbose.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        if debug {
            self.verbose = true;
        }
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_login_retry_wait(mut self, wait: Duration) -> Self {
        self.login_retry_wait = wait;
        self
    }

    /// Whether any TLS material is configured.
    pub fn is_secure(&self) -> bool {
        self.ca_file.is_some() || self.cert_file.is_some() || self.key_file.is_some()
    }

    /// Base URL without a trailing slash, ready for path concatenation.
    pub fn api_root(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Check the settings before any connection is attempted.
    pub fn validate(&self) -> Result<()> {
        let parsed = url::Url::parse(&self.base_url).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid base url: {}", e),
                ErrorContext::new()
                    .with_field_path("base_url")
                    .with_details(self.base_url.clone())
                    .with_source("client_config"),
            )
        })?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(Error::configuration_with_context(
                format!("unsupported url scheme '{}'", parsed.scheme()),
                ErrorContext::new()
                    .with_field_path("base_url")
                    .with_details(self.base_url.clone())
                    .with_source("client_config"),
            ));
        }
        if self.cert_file.is_some() != self.key_file.is_some() {
            return Err(Error::configuration_with_context(
                "client certificate and key must be set together",
                ErrorContext::new()
                    .with_field_path(if self.cert_file.is_some() {
                        "key_file"
                    } else {
                        "cert_file"
                    })
                    .with_source("client_config"),
            ));
        }
        Ok(())
    }
}
