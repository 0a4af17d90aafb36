use crate::client::cache::EntityCache;
use crate::config::ClientConfig;
use crate::poll::Sleeper;
use crate::transport::{ApiReply, ApiRequest, Transport};
use crate::types::{EntityKind, LoginStatus, Response, Status};
use crate::Result;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, Dispatch};

/// Token held before the first successful login.
pub const NO_TOKEN: &str = "not-logged-in-no-token";

const LOGIN_PATH: &str = "/api-token-auth/";

/// Stateful client for the AntiNex REST API.
///
/// Holds the bearer token and the session-local entity cache. Every operation
/// returns a [`Response`] envelope; only transport, I/O and decoding failures
/// surface as [`crate::Error`].
///
/// Methods take `&mut self`: a single client never has two requests in
/// flight, and it is not meant to be shared across threads without external
/// locking.
pub struct AiClient {
    pub(crate) config: ClientConfig,
    pub(crate) transport: Box<dyn Transport>,
    pub(crate) sleeper: Arc<dyn Sleeper>,
    pub(crate) dispatch: Dispatch,
    pub(crate) token: String,
    pub(crate) login_status: LoginStatus,
    pub(crate) cache: EntityCache,
}

impl AiClient {
    /// Create a client over HTTP with default collaborators.
    pub fn new(config: ClientConfig) -> Result<Self> {
        crate::client::builder::AiClientBuilder::new()
            .config(config)
            .build()
    }

    pub fn builder() -> crate::client::builder::AiClientBuilder {
        crate::client::builder::AiClientBuilder::new()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn get_token(&self) -> &str {
        &self.token
    }

    pub fn login_status(&self) -> LoginStatus {
        self.login_status
    }

    pub fn is_logged_in(&self) -> bool {
        self.login_status == LoginStatus::Success
    }

    pub fn cache(&self) -> &EntityCache {
        &self.cache
    }

    pub fn all_jobs(&self) -> &HashMap<String, Value> {
        self.cache.entries(EntityKind::Job)
    }

    pub fn all_results(&self) -> &HashMap<String, Value> {
        self.cache.entries(EntityKind::Result)
    }

    pub fn all_prepares(&self) -> &HashMap<String, Value> {
        self.cache.entries(EntityKind::Prepare)
    }

    /// Exchange the configured credentials for a bearer token.
    ///
    /// A non-200 reply or a reply without a token marks the session as failed;
    /// it is not an error.
    pub fn login(&mut self) -> Result<LoginStatus> {
        self.with_logger(|c| c.login_once())
    }

    /// Log in unless already logged in, retrying failed attempts with a fixed
    /// pause until `max_retries` is exceeded.
    pub fn retry_login(&mut self) -> Result<Response> {
        self.with_logger(|c| c.retry_login_inner())
    }

    /// Run `f` with the injected logger as the current dispatcher.
    pub(crate) fn with_logger<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let dispatch = self.dispatch.clone();
        tracing::dispatcher::with_default(&dispatch, || f(self))
    }

    pub(crate) fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_root(), path)
    }

    /// Attach the JSON content type and the `JWT` authorization header.
    pub(crate) fn authorized(&self, request: ApiRequest) -> ApiRequest {
        request
            .with_header("Content-type", "application/json")
            .with_header("Authorization", format!("JWT {}", self.token))
    }

    fn login_once(&mut self) -> Result<LoginStatus> {
        let auth_url = self.api_url(LOGIN_PATH);
        if self.config.verbose {
            info!(user = %self.config.username, url = %auth_url, "log in");
        }

        let body = json!({
            "username": self.config.username,
            "password": self.config.password,
        });
        let request = ApiRequest::post(&auth_url, body.to_string())
            .with_header("Content-type", "application/json");

        if self.config.debug {
            debug!(user = %self.config.username, url = %auth_url, "LOGIN request");
        }

        let reply = self.transport.send(&request)?;
        self.log_reply("LOGIN", &reply);

        let token = if reply.status == 200 {
            serde_json::from_str::<Value>(&reply.text)
                .ok()
                .and_then(|v| v.get("token").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_default()
        } else {
            String::new()
        };

        if token.is_empty() {
            error!(
                user = %self.config.username,
                url = %auth_url,
                text = %reply.text,
                "failed to login"
            );
            self.login_status = LoginStatus::Failed;
        } else {
            self.token = token;
            self.login_status = LoginStatus::Success;
            if self.config.verbose {
                debug!("login success");
            }
        }

        Ok(self.login_status)
    }

    pub(crate) fn retry_login_inner(&mut self) -> Result<Response> {
        if self.config.username.is_empty() || self.config.password.is_empty() {
            return Ok(Response::error("please set the user and password"));
        }

        let mut retry: u32 = 0;
        loop {
            if self.is_logged_in() {
                return Ok(Response::success_empty());
            }
            if self.config.verbose {
                debug!(attempt = retry, max = self.config.max_retries, "login attempt");
            }
            if self.login_once()? == LoginStatus::Success {
                return Ok(Response::success_empty());
            }
            self.sleeper.sleep(self.config.login_retry_wait);

            retry += 1;
            if retry > self.config.max_retries {
                return Ok(Response::error(format!(
                    "failed logging in user={} retries={}",
                    self.config.username, self.config.max_retries
                )));
            }
        }
    }

    /// React to a 401: the token is treated as expired and one `retry_login`
    /// runs. The rejected request is not re-sent; on success the caller gets
    /// the re-login envelope (no data) and is expected to call again.
    pub(crate) fn reauthenticate(&mut self) -> Result<Response> {
        self.login_status = LoginStatus::NotAttempted;
        let login = self.retry_login_inner()?;
        if login.is_success() {
            return Ok(login);
        }
        if self.config.verbose {
            error!(error = %login.error, "retry login attempts failed");
        }
        Ok(Response::new(Status::LoginFailed, login.error, login.data))
    }

    pub(crate) fn unexpected_status(&self, reply: &ApiReply) -> Response {
        let err_msg = format!(
            "failed with status_code={} text={} reason={}",
            reply.status, reply.text, reply.reason
        );
        if self.config.verbose {
            error!("{}", err_msg);
        }
        Response::error(err_msg)
    }

    pub(crate) fn log_reply(&self, tag: &str, reply: &ApiReply) {
        if self.config.debug {
            debug!(
                status_code = reply.status,
                text = %reply.text,
                reason = %reply.reason,
                "{} response",
                tag
            );
        }
    }
}
