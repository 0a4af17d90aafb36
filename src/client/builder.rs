use crate::client::cache::EntityCache;
use crate::client::core::{AiClient, NO_TOKEN};
use crate::config::ClientConfig;
use crate::poll::{Sleeper, ThreadSleeper};
use crate::transport::{HttpTransport, Transport};
use crate::types::LoginStatus;
use crate::Result;
use std::sync::Arc;
use tracing::Dispatch;

/// Builder for creating clients with custom collaborators.
///
/// Keep this surface area small and predictable: a config plus three optional
/// injections (transport, sleeper, logger).
pub struct AiClientBuilder {
    config: ClientConfig,
    transport: Option<Box<dyn Transport>>,
    sleeper: Arc<dyn Sleeper>,
    dispatch: Dispatch,
}

impl AiClientBuilder {
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            transport: None,
            sleeper: Arc::new(ThreadSleeper),
            dispatch: Dispatch::none(),
        }
    }

    /// Connection, credential and retry settings.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the HTTP transport. The default is [`HttpTransport`] built from the config.
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    /// Replace the sleeper used between login attempts and polls.
    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Inject the logger. Default is a no-op dispatcher, so nothing is emitted
    /// unless the caller passes one in.
    pub fn logger(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = dispatch;
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<AiClient> {
        let config = self.config;
        config.validate()?;

        let transport = match self.transport {
            Some(t) => t,
            None => Box::new(HttpTransport::new(&config)?),
        };

        tracing::dispatcher::with_default(&self.dispatch, || {
            if config.is_secure() {
                tracing::info!(
                    user = %config.username,
                    url = %config.base_url,
                    ca = ?config.ca_file,
                    cert = ?config.cert_file,
                    key = ?config.key_file,
                    "creating secure client"
                );
            } else if config.verbose {
                tracing::info!(
                    user = %config.username,
                    url = %config.base_url,
                    "creating non-secure client"
                );
            }
        });

        Ok(AiClient {
            config,
            transport,
            sleeper: self.sleeper,
            dispatch: self.dispatch,
            token: NO_TOKEN.to_string(),
            login_status: LoginStatus::NotAttempted,
            cache: EntityCache::default(),
        })
    }
}

impl Default for AiClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
