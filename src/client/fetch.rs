use crate::client::core::AiClient;
use crate::transport::ApiRequest;
use crate::types::{id_key, EntityKind, Response};
use crate::Result;
use serde_json::Value;
use tracing::{debug, error, info};

impl AiClient {
    /// Fetch a job (`GET /ml/{id}`).
    pub fn get_job_by_id(&mut self, job_id: impl Into<Option<i64>>) -> Result<Response> {
        self.fetch_entity(EntityKind::Job, job_id.into())
    }

    /// Fetch a job result (`GET /mlresults/{id}`).
    pub fn get_result_by_id(&mut self, result_id: impl Into<Option<i64>>) -> Result<Response> {
        self.fetch_entity(EntityKind::Result, result_id.into())
    }

    /// Fetch a dataset preparation (`GET /mlprepare/{id}`).
    pub fn get_prepare_by_id(&mut self, prepare_id: impl Into<Option<i64>>) -> Result<Response> {
        self.fetch_entity(EntityKind::Prepare, prepare_id.into())
    }

    /// Fetch one record of `kind` and cache it.
    ///
    /// - missing or non-positive id: `Error`, nothing is sent
    /// - 401: one re-login, see [`AiClient::retry_login`]; the GET is not repeated
    /// - 200: the record, which must carry an `id`
    /// - anything else: `Error` with status code, body and reason
    pub fn fetch_entity(&mut self, kind: EntityKind, id: Option<i64>) -> Result<Response> {
        self.with_logger(|c| c.fetch_entity_inner(kind, id))
    }

    pub(crate) fn fetch_entity_inner(
        &mut self,
        kind: EntityKind,
        id: Option<i64>,
    ) -> Result<Response> {
        let id = match id.filter(|id| *id > 0) {
            Some(id) => id,
            None => {
                let msg = format!("missing {}_id for {}", kind.name(), kind.getter());
                error!("{}", msg);
                return Ok(Response::error(msg));
            }
        };

        if self.config.verbose {
            info!(user = %self.config.username, entity = kind.name(), id, "getting");
        }

        let url = format!("{}{}", self.api_url(kind.path()), id);
        if self.config.debug {
            debug!(id, url = %url, "{} attempting to get", kind.tag());
        }

        let reply = self.transport.send(&self.authorized(ApiRequest::get(&url)))?;
        self.log_reply(kind.tag(), &reply);

        match reply.status {
            401 => self.reauthenticate(),
            200 => {
                if self.config.verbose {
                    debug!("deserializing");
                }
                let record: Value = serde_json::from_str(&reply.text)?;
                let Some(key) = id_key(&record) else {
                    return Ok(Response::error_with_data(
                        format!("missing {}.id", kind.name()),
                        Value::String(reply.summary()),
                    ));
                };

                self.cache.insert(kind, key.clone(), record.clone());
                if self.config.verbose {
                    info!(
                        entity = kind.name(),
                        id = %key,
                        cached = self.cache.len(kind),
                        "added"
                    );
                }
                Ok(Response::success(record))
            }
            _ => Ok(self.unexpected_status(&reply)),
        }
    }
}
