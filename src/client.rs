//! Authenticated AntiNex API client.
//!
//! Implementation details are split into submodules under `src/client/`:
//! session handling lives in `core`, the generic entity fetch in `fetch`,
//! job/prepare submission in `submit` and the polling loops in `wait`.

pub mod builder;
pub mod cache;
pub mod core;
mod fetch;
mod submit;
mod wait;

pub use builder::AiClientBuilder;
pub use cache::EntityCache;
pub use core::{AiClient, NO_TOKEN};
pub use wait::{JOB_TERMINAL_STATUSES, PREPARE_TERMINAL_STATUSES};
