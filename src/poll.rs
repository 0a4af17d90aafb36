//! Bounded polling.
//!
//! Waiting on an asynchronous server-side job is modelled as a small state
//! machine: [`PollState::advance`] is a pure transition from the current state
//! and one [`Observation`] of the remote entity, and [`drive`] runs it, sleeping
//! through an injected [`Sleeper`] between polls.

use crate::types::Response;
use crate::Result;
use std::time::Duration;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_MAX_POLLS: u64 = 100_000;

/// A progress line is logged every this many polls.
pub const PROGRESS_EVERY: u64 = 100;

/// Interval and budget of a polling loop.
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// Pending observations tolerated before giving up.
    pub max_retries: u64,
    /// Keep polling a finished job until its result reports `finished` too.
    pub wait_for_result: bool,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_retries: DEFAULT_MAX_POLLS,
            wait_for_result: false,
        }
    }
}

impl PollPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u64) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_wait_for_result(mut self, enable: bool) -> Self {
        self.wait_for_result = enable;
        self
    }
}

/// What one poll saw.
#[derive(Debug, Clone, PartialEq)]
pub enum Observation<T> {
    /// The entity reached a terminal status.
    Terminal(T),
    /// Not there yet.
    Pending,
    /// Fetching failed; stop with this envelope.
    Error(Response),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollState<T> {
    Polling { attempts: u64 },
    Succeeded(T),
    Failed(Response),
}

impl<T> PollState<T> {
    pub fn start() -> Self {
        PollState::Polling { attempts: 0 }
    }

    /// Apply one observation. Terminal states absorb further observations.
    pub fn advance(self, observation: Observation<T>, max_retries: u64, subject: &str) -> Self {
        let attempts = match self {
            PollState::Polling { attempts } => attempts,
            done => return done,
        };
        match observation {
            Observation::Terminal(value) => PollState::Succeeded(value),
            Observation::Error(response) => PollState::Failed(response),
            Observation::Pending => {
                let attempts = attempts + 1;
                if attempts > max_retries {
                    PollState::Failed(Response::error(format!(
                        "failed waiting for {} to finish",
                        subject
                    )))
                } else {
                    PollState::Polling { attempts }
                }
            }
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollState::Polling { .. })
    }
}

/// Pauses between polls and login attempts.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Blocks the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Poll until a terminal state: `Ok(value)` on success, `Err(envelope)` on failure.
///
/// Errors returned by `observe` itself (transport failures) abort the loop.
pub fn drive<T, F>(
    policy: &PollPolicy,
    sleeper: &dyn Sleeper,
    subject: &str,
    verbose: bool,
    mut observe: F,
) -> Result<std::result::Result<T, Response>>
where
    F: FnMut() -> Result<Observation<T>>,
{
    let mut state = PollState::start();
    loop {
        let observation = observe()?;
        state = match state.advance(observation, policy.max_retries, subject) {
            PollState::Succeeded(value) => return Ok(Ok(value)),
            PollState::Failed(response) => {
                tracing::error!(subject, error = %response.error, "polling stopped");
                return Ok(Err(response));
            }
            PollState::Polling { attempts } => {
                if verbose && attempts % PROGRESS_EVERY == 0 {
                    tracing::info!(subject, retry = attempts, "waiting");
                }
                sleeper.sleep(policy.interval);
                PollState::Polling { attempts }
            }
        };
    }
}
