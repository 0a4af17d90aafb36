//! Response envelope shared by every client operation.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Status carried by a [`Response`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Success,
    /// Request generation could not produce a body.
    Failed,
    /// Missing input, malformed server payload or unexpected HTTP status.
    Error,
    #[default]
    NotSet,
    /// Publishing is switched off in the environment.
    Disabled,
    /// A 401 that re-authentication could not resolve.
    LoginFailed,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Success => "SUCCESS",
            Status::Failed => "FAILED",
            Status::Error => "ERROR",
            Status::NotSet => "NOT_SET",
            Status::Disabled => "DISABLED",
            Status::LoginFailed => "LOGIN_FAILED",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of the most recent `login()` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginStatus {
    Success,
    #[default]
    NotAttempted,
    Failed,
}

/// Uniform `{status, error, data}` envelope.
///
/// `data` holds the decoded server record on success and, for some errors,
/// a `text=<body> reason=<reason>` string describing the raw reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Response {
    pub status: Status,
    pub error: String,
    pub data: Option<Value>,
}

impl Response {
    pub fn new(status: Status, error: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            status,
            error: error.into(),
            data,
        }
    }

    pub fn success(data: Value) -> Self {
        Self::new(Status::Success, "", Some(data))
    }

    /// Success without a payload (e.g. a completed re-login).
    pub fn success_empty() -> Self {
        Self::new(Status::Success, "", None)
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self::new(Status::Error, error, None)
    }

    pub fn error_with_data(error: impl Into<String>, data: Value) -> Self {
        Self::new(Status::Error, error, Some(data))
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self::new(Status::Failed, error, None)
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    /// Borrow the payload when the envelope is a success with data.
    pub fn success_data(&self) -> Option<&Value> {
        if self.is_success() {
            self.data.as_ref()
        } else {
            None
        }
    }

    pub fn into_data(self) -> Option<Value> {
        self.data
    }
}
