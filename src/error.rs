use thiserror::Error;

/// Where a setup failure came from: which setting, what value, which component.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// `ClientConfig` field or environment variable, such as `base_url` or `key_file`.
    pub field_path: Option<String>,
    /// The rejected URL or the path of the certificate file that failed to load.
    pub details: Option<String>,
    /// `client_config` or `http_transport`.
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field_path(mut self, field: impl Into<String>) -> Self {
        self.field_path = Some(field.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Failures that escape the response envelope.
///
/// Server-side problems (bad status codes, missing fields) are reported through
/// [`crate::Response`]; this type only carries collaborator failures such as a
/// refused connection, an unreadable TLS file or an undecodable body.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Network transport error: {0}")]
    Transport(#[from] crate::transport::TransportError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn format_context(ctx: &ErrorContext) -> String {
    let parts: Vec<String> = [
        ("field", &ctx.field_path),
        ("details", &ctx.details),
        ("source", &ctx.source),
    ]
    .iter()
    .filter_map(|(label, value)| value.as_ref().map(|v| format!("{}: {}", label, v)))
    .collect();
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    /// Configuration error pointing at the offending setting.
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// Context of a configuration error.
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. } => Some(context),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_display_includes_context() {
        let err = Error::configuration_with_context(
            "invalid base url",
            ErrorContext::new()
                .with_field_path("API_URL")
                .with_details("ftp://nowhere")
                .with_source("client_config"),
        );
        assert_eq!(
            err.to_string(),
            "Configuration error: invalid base url (field: API_URL, details: ftp://nowhere, source: client_config)"
        );
        assert_eq!(
            err.context().and_then(|c| c.field_path.as_deref()),
            Some("API_URL")
        );
    }

    #[test]
    fn test_error_without_context() {
        let err = Error::configuration_with_context("bad", ErrorContext::default());
        assert_eq!(err.to_string(), "Configuration error: bad");

        let io = Error::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(io.context().is_none());
        assert!(io.to_string().starts_with("I/O error"));
    }
}
