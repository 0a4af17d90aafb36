//! # Types Module
//!
//! Core data types shared by the client, the polling loops and the CLI programs.
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Response`] | Uniform `{status, error, data}` envelope returned by every client operation |
//! | [`Status`] | Envelope status (success, failed, error, not set, disabled, login failed) |
//! | [`LoginStatus`] | Outcome of the most recent login attempt |
//! | [`EntityKind`] | Server-side resource (job, result, prepare) with its path and cache name |
//! | [`JobOutcome`] | Final `{job, result}` pair produced by a finished job wait |
//!
//! ## Example
//!
//! ```rust
//! use antinex_client::types::{Response, Status};
//! use serde_json::json;
//!
//! let ok = Response::success(json!({"id": 7, "status": "finished"}));
//! assert!(ok.is_success());
//!
//! let err = Response::error("missing job.id");
//! assert_eq!(err.status, Status::Error);
//! ```

pub mod entity;
pub mod response;

pub use entity::{id_key, is_falsy, status_of, EntityKind, JobOutcome};
pub use response::{LoginStatus, Response, Status};
