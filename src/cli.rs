//! Shared plumbing for the bundled command line programs.
//!
//! Each program flattens [`ConnectionArgs`] into its own clap parser, merges
//! the flags over the `API_*` environment, logs in, and then runs a single
//! client operation.

use crate::config::{ClientConfig, PASSWORD_NOT_SET, USER_NOT_SET};
use crate::types::{Response, Status};
use crate::AiClient;
use anyhow::{bail, Context, Result};
use clap::Args;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, Dispatch};
use tracing_subscriber::EnvFilter;

/// Connection flags shared by every program. Unset flags fall back to the environment.
#[derive(Debug, Clone, Default, Args)]
pub struct ConnectionArgs {
    /// Username (API_USER)
    #[arg(short = 'u')]
    pub user: Option<String>,

    /// User password (API_PASSWORD)
    #[arg(short = 'p')]
    pub password: Option<String>,

    /// User email (API_EMAIL)
    #[arg(short = 'e')]
    pub email: Option<String>,

    /// API url, default http://localhost:8080 (API_URL)
    #[arg(short = 'a')]
    pub url: Option<String>,

    /// Optional CA bundle file or directory (API_CA_BUNDLE_DIR)
    #[arg(short = 'b')]
    pub ca_dir: Option<PathBuf>,

    /// Optional x509 client certificate (API_CERT_FILE)
    #[arg(short = 'c')]
    pub cert_file: Option<PathBuf>,

    /// Optional x509 client key (API_KEY_FILE)
    #[arg(short = 'k')]
    pub key_file: Option<PathBuf>,

    /// Silent
    #[arg(short = 's')]
    pub silent: bool,

    /// Debug
    #[arg(short = 'd')]
    pub debug: bool,
}

impl ConnectionArgs {
    /// Merge the flags over the `API_*` environment.
    pub fn config(&self) -> ClientConfig {
        self.apply(ClientConfig::from_env())
    }

    /// Merge the flags over `base`.
    pub fn apply(&self, mut config: ClientConfig) -> ClientConfig {
        if let Some(user) = non_empty(&self.user) {
            config.username = user.to_string();
        }
        if let Some(password) = non_empty(&self.password) {
            config.password = password.to_string();
        }
        if let Some(email) = non_empty(&self.email) {
            config.email = email.to_string();
        }
        if let Some(url) = non_empty(&self.url) {
            config.base_url = url.to_string();
        }
        if let Some(ca) = &self.ca_dir {
            config.ca_file = Some(ca.clone());
        }
        if let Some(cert) = &self.cert_file {
            config.cert_file = Some(cert.clone());
        }
        if let Some(key) = &self.key_file {
            config.key_file = Some(key.clone());
        }
        if self.silent {
            config.verbose = false;
        }
        let debug = config.debug || self.debug;
        config.with_debug(debug)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Console logger handed to the client. `RUST_LOG` overrides the level picked
/// from the verbose and debug flags.
pub fn init_logging(verbose: bool, debug: bool) -> Dispatch {
    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    Dispatch::new(subscriber)
}

/// Reject the placeholder credentials left by an unset environment.
pub fn require_credentials(config: &ClientConfig) -> Result<()> {
    let mut missing = Vec::new();
    if config.username.is_empty() || config.username == USER_NOT_SET {
        missing.push("user (-u)");
    }
    if config.password.is_empty() || config.password == PASSWORD_NOT_SET {
        missing.push("password (-p)");
    }
    if !missing.is_empty() {
        bail!("missing {}", missing.join(", "));
    }
    Ok(())
}

/// Parse a positive database id taken from a flag or an environment variable.
pub fn parse_id(flag: Option<&str>, env_key: &str, name: &str) -> Result<i64> {
    let raw = match flag.filter(|s| !s.is_empty()) {
        Some(raw) => raw.to_string(),
        None => std::env::var(env_key)
            .ok()
            .filter(|s| !s.is_empty())
            .with_context(|| format!("missing {} (-i or {})", name, env_key))?,
    };
    let id: i64 = raw
        .trim()
        .parse()
        .with_context(|| format!("please use -i <{} with an integer>", name))?;
    if id <= 0 {
        bail!("{} must be positive, got {}", name, id);
    }
    Ok(id)
}

/// Resolve a file flag with an environment fallback and check that it exists.
pub fn require_file(flag: Option<&Path>, env_key: &str, name: &str) -> Result<PathBuf> {
    let path = match flag {
        Some(path) => path.to_path_buf(),
        None => std::env::var_os(env_key)
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .with_context(|| format!("missing {} (-f or {})", name, env_key))?,
    };
    if !path.exists() {
        bail!("did not find {}={} on disk", name, path.display());
    }
    Ok(path)
}

pub fn read_json(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed parsing {}", path.display()))
}

/// Build the client and log in. Fails unless the login succeeds.
pub fn connect(config: ClientConfig, logger: Dispatch) -> Result<AiClient> {
    let mut client = AiClient::builder()
        .config(config)
        .logger(logger)
        .build()
        .context("failed creating client")?;
    let login = client.retry_login()?;
    check(&login, "login")?;
    Ok(client)
}

/// Run a client call, and run it once more when it returns the data-less
/// success left behind by a re-login after a 401.
pub fn call_with_relogin<F>(mut call: F) -> Result<Response>
where
    F: FnMut() -> crate::Result<Response>,
{
    let res = call()?;
    if res.is_success() && res.data.is_none() {
        info!("logged in again, re-issuing the request");
        return Ok(call()?);
    }
    Ok(res)
}

/// Turn a non-success envelope into an error naming the operation.
pub fn check(res: &Response, what: &str) -> Result<()> {
    match res.status {
        Status::Success => Ok(()),
        Status::LoginFailed => bail!(
            "{} reported user was not able to log in with an error='{}'",
            what,
            res.error
        ),
        status => bail!(
            "{} {} with error='{}' data={}",
            what,
            status.as_str().to_lowercase(),
            res.error,
            res.data.as_ref().map(Value::to_string).unwrap_or_default()
        ),
    }
}

/// Pretty-print a record on stdout.
pub fn print_json(label: &str, value: &Value) -> Result<()> {
    let pretty = serde_json::to_string_pretty(value)?;
    info!("printing {}", label);
    println!("{}", pretty);
    Ok(())
}

/// Run a program body under `logger`, mapping a failure to exit code 1.
pub fn run(logger: &Dispatch, body: impl FnOnce() -> Result<()>) -> ExitCode {
    tracing::dispatcher::with_default(logger, || match body() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    })
}
