use crate::client::core::AiClient;
use crate::transport::{ApiReply, ApiRequest};
use crate::types::{id_key, is_falsy, EntityKind, Response};
use crate::Result;
use serde_json::Value;
use tracing::{debug, error, info};

/// Reply to a submission: the 201 to decode, or an envelope that already settles the call.
enum Posted {
    Created(ApiReply),
    Settled(Response),
}

impl AiClient {
    /// Start a training or prediction job (`POST /ml/`).
    ///
    /// On 201 the reply must contain `job.id` and `results.id`; both records are
    /// cached and the whole decoded reply is returned as data.
    pub fn run_job(&mut self, body: &Value) -> Result<Response> {
        self.with_logger(|c| c.run_job_inner(body))
    }

    /// Start a dataset preparation (`POST /mlprepare/`).
    ///
    /// On 201 the reply is the prepare record itself; it is cached and returned.
    pub fn run_prepare(&mut self, body: &Value) -> Result<Response> {
        self.with_logger(|c| c.run_prepare_inner(body))
    }

    fn run_job_inner(&mut self, body: &Value) -> Result<Response> {
        let reply = match self.post_collection(EntityKind::Job, body)? {
            Posted::Created(reply) => reply,
            Posted::Settled(response) => return Ok(response),
        };

        let res: Value = serde_json::from_str(&reply.text)?;
        let summary = || Value::String(reply.summary());

        let job = match res.get("job").filter(|j| !is_falsy(j)) {
            Some(job) => job,
            None => return Ok(Response::error_with_data("job failed", summary())),
        };
        let Some(job_id) = id_key(job) else {
            return Ok(Response::error_with_data("missing job.id", summary()));
        };
        let results = res.get("results");
        let Some(result_id) = results.and_then(id_key) else {
            return Ok(Response::error_with_data("missing result.id", summary()));
        };

        self.cache.insert(EntityKind::Job, job_id.clone(), job.clone());
        self.cache.insert(
            EntityKind::Result,
            result_id.clone(),
            results.cloned().unwrap_or(Value::Null),
        );

        if self.config.verbose {
            info!(
                job = %job_id,
                result = %result_id,
                all_jobs = self.cache.len(EntityKind::Job),
                all_results = self.cache.len(EntityKind::Result),
                "added"
            );
        }
        Ok(Response::success(res))
    }

    fn run_prepare_inner(&mut self, body: &Value) -> Result<Response> {
        let reply = match self.post_collection(EntityKind::Prepare, body)? {
            Posted::Created(reply) => reply,
            Posted::Settled(response) => return Ok(response),
        };

        let prepare: Value = serde_json::from_str(&reply.text)?;
        if is_falsy(&prepare) {
            return Ok(Response::error_with_data(
                "prepare failed",
                Value::String(reply.summary()),
            ));
        }
        let Some(prepare_id) = id_key(&prepare) else {
            return Ok(Response::error_with_data(
                "missing prepare.id",
                Value::String(reply.summary()),
            ));
        };

        self.cache
            .insert(EntityKind::Prepare, prepare_id.clone(), prepare.clone());
        if self.config.verbose {
            info!(
                prepare = %prepare_id,
                all_prepares = self.cache.len(EntityKind::Prepare),
                "added"
            );
        }
        Ok(Response::success(prepare))
    }

    /// POST `body` to the collection of `kind` and sort out everything but a 201.
    fn post_collection(&mut self, kind: EntityKind, body: &Value) -> Result<Posted> {
        if body.is_null() {
            let msg = format!("missing body for run_{}", kind.name());
            error!("{}", msg);
            return Ok(Posted::Settled(Response::error(msg)));
        }

        let payload = body.to_string();
        if self.config.verbose {
            let preview: String = payload.chars().take(32).collect();
            info!(user = %self.config.username, entity = kind.name(), body = %preview, "starting");
        }

        let url = self.api_url(kind.path());
        if self.config.debug {
            debug!(url = %url, body = %payload, "{} attempting to post", kind.tag());
        }

        let reply = self
            .transport
            .send(&self.authorized(ApiRequest::post(&url, payload)))?;
        self.log_reply(kind.tag(), &reply);

        Ok(match reply.status {
            401 => Posted::Settled(self.reauthenticate()?),
            201 => {
                if self.config.verbose {
                    debug!("deserializing");
                }
                Posted::Created(reply)
            }
            _ => Posted::Settled(self.unexpected_status(&reply)),
        })
    }
}
