use crate::client::core::AiClient;
use crate::poll::{self, Observation, PollPolicy};
use crate::types::entity::result_id_of;
use crate::types::{status_of, EntityKind, JobOutcome, Response, Status};
use crate::Result;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

/// Job statuses after which the result can be fetched.
pub const JOB_TERMINAL_STATUSES: &[&str] = &["finished", "completed", "launched"];

/// Prepare statuses after which the record no longer changes.
pub const PREPARE_TERMINAL_STATUSES: &[&str] = &["finished", "completed"];

impl AiClient {
    /// Poll a job with the default [`PollPolicy`] until it is done, then fetch
    /// its result. Success data is a serialized [`JobOutcome`].
    pub fn wait_for_job_to_finish(&mut self, job_id: i64) -> Result<Response> {
        self.wait_for_job_with(job_id, &PollPolicy::default())
    }

    /// Poll a job with an explicit interval and budget.
    ///
    /// With `policy.wait_for_result` the job and its result are both re-fetched
    /// every cycle until the result reports `finished`.
    pub fn wait_for_job_with(&mut self, job_id: i64, policy: &PollPolicy) -> Result<Response> {
        self.with_logger(|c| {
            let subject = format!("job.id={}", job_id);
            let sleeper = Arc::clone(&c.sleeper);
            let verbose = c.config.verbose;
            let settled = poll::drive(policy, sleeper.as_ref(), &subject, verbose, || {
                c.observe_job(job_id, policy.wait_for_result)
            })?;
            match settled {
                Ok(outcome) => Ok(Response::success(serde_json::to_value(&outcome)?)),
                Err(response) => Ok(response),
            }
        })
    }

    /// Poll a dataset preparation with the default [`PollPolicy`].
    pub fn wait_for_prepare_to_finish(&mut self, prepare_id: i64) -> Result<Response> {
        self.wait_for_prepare_with(prepare_id, &PollPolicy::default())
    }

    pub fn wait_for_prepare_with(
        &mut self,
        prepare_id: i64,
        policy: &PollPolicy,
    ) -> Result<Response> {
        self.with_logger(|c| {
            let subject = format!("prepare.id={}", prepare_id);
            let sleeper = Arc::clone(&c.sleeper);
            let verbose = c.config.verbose;
            let settled = poll::drive(policy, sleeper.as_ref(), &subject, verbose, || {
                c.observe_prepare(prepare_id)
            })?;
            Ok(match settled {
                Ok(prepare) => Response::success(prepare),
                Err(response) => response,
            })
        })
    }

    fn observe_job(&mut self, job_id: i64, wait_for_result: bool) -> Result<Observation<JobOutcome>> {
        if self.config.verbose {
            info!(job_id, "JOBSTATUS getting job details");
        }
        let job = match self.observe_entity(EntityKind::Job, Some(job_id))? {
            Ok(Some(job)) => job,
            Ok(None) => return Ok(Observation::Pending),
            Err(response) => return Ok(Observation::Error(response)),
        };

        let job_status = status_of(&job).unwrap_or_default().to_string();
        if !JOB_TERMINAL_STATUSES.contains(&job_status.as_str()) {
            return Ok(Observation::Pending);
        }
        info!(job_id, status = %job_status, "job is done");

        let result_id = result_id_of(&job);
        if self.config.verbose {
            info!(result_id = ?result_id, "JOBRESULT getting result details");
        }
        let result = match self.observe_entity(EntityKind::Result, result_id)? {
            Ok(Some(result)) => result,
            Ok(None) => return Ok(Observation::Pending),
            Err(response) => return Ok(Observation::Error(response)),
        };

        if wait_for_result && status_of(&result) != Some("finished") {
            return Ok(Observation::Pending);
        }
        Ok(Observation::Terminal(JobOutcome { job, result }))
    }

    fn observe_prepare(&mut self, prepare_id: i64) -> Result<Observation<Value>> {
        if self.config.verbose {
            info!(prepare_id, "PREPSTATUS getting prepare details");
        }
        let prepare = match self.observe_entity(EntityKind::Prepare, Some(prepare_id))? {
            Ok(Some(prepare)) => prepare,
            Ok(None) => return Ok(Observation::Pending),
            Err(response) => return Ok(Observation::Error(response)),
        };

        let status = status_of(&prepare).unwrap_or_default();
        if PREPARE_TERMINAL_STATUSES.contains(&status) {
            info!(prepare_id, status, "prepare is done");
            return Ok(Observation::Terminal(prepare));
        }
        Ok(Observation::Pending)
    }

    /// Fetch one record for a polling loop.
    ///
    /// `Ok(None)` means the fetch hit a 401 and re-authenticated without
    /// returning a record; the loop polls again. Any other non-success becomes
    /// a terminal `Error` envelope.
    fn observe_entity(
        &mut self,
        kind: EntityKind,
        id: Option<i64>,
    ) -> Result<std::result::Result<Option<Value>, Response>> {
        let response = self.fetch_entity_inner(kind, id)?;
        if !response.is_success() {
            error!(
                entity = kind.name(),
                id = ?id,
                error = %response.error,
                "failed to get details"
            );
            return Ok(Err(Response::new(
                Status::Error,
                response.error,
                response.data,
            )));
        }
        Ok(Ok(response.data))
    }
}
