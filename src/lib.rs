//! # antinex-client
//!
//! Blocking client for the AntiNex REST API: log in with a username and
//! password, submit training/prediction jobs and dataset preparations, look up
//! jobs, results and preparations by id, and poll them until they finish.
//!
//! ## Overview
//!
//! Every operation returns a [`Response`] envelope (`status`, `error`, `data`).
//! Server-side problems such as unexpected status codes or missing fields are
//! reported through the envelope; only collaborator failures (a refused
//! connection, an unreadable certificate, an undecodable body) surface as
//! [`Error`].
//!
//! ## Key Features
//!
//! - **Session handling**: bearer-token login with bounded retries and a single
//!   re-login when the server answers 401
//! - **Entity cache**: every fetched or created record is kept per session
//! - **Polling**: bounded waits driven by [`PollPolicy`] and an injected [`Sleeper`]
//! - **Request generation**: [`request::generate_ai_request`] shapes predict rows
//! - **Mutual TLS**: optional CA bundle and client certificate
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use antinex_client::{AiClient, ClientConfig};
//!
//! fn main() -> antinex_client::Result<()> {
//!     let config = ClientConfig::new("http://localhost:8080", "root", "123321");
//!     let mut client = AiClient::new(config)?;
//!
//!     let login = client.retry_login()?;
//!     assert!(login.is_success());
//!
//!     let job = client.get_job_by_id(1)?;
//!     println!("{:?}", job.data);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Client, builder and session cache |
//! | [`config`] | Connection and credential settings |
//! | [`poll`] | Polling state machine and sleepers |
//! | [`request`] | Prediction request generation |
//! | [`transport`] | HTTP transport seam |
//! | [`types`] | Response envelope and entity helpers |

pub mod client;
pub mod config;
pub mod poll;
pub mod request;
pub mod transport;
pub mod types;

#[cfg(feature = "cli")]
pub mod cli;

pub use client::{AiClient, AiClientBuilder, EntityCache};
pub use config::ClientConfig;
pub use poll::{PollPolicy, Sleeper, ThreadSleeper};
pub use request::{generate_ai_request, RequestSettings};
pub use transport::{ApiReply, ApiRequest, HttpTransport, Transport};
pub use types::{EntityKind, JobOutcome, LoginStatus, Response, Status};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
