//! Server-side resources and the few JSON fields the client reads from them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Resource managed by the AntiNex API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Job,
    Result,
    Prepare,
}

impl EntityKind {
    /// Lowercase entity name used in messages (`job.id`, `missing job_id ...`).
    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Job => "job",
            EntityKind::Result => "result",
            EntityKind::Prepare => "prepare",
        }
    }

    /// Collection path relative to the base URL; the id is appended for a single record.
    pub fn path(&self) -> &'static str {
        match self {
            EntityKind::Job => "/ml/",
            EntityKind::Result => "/mlresults/",
            EntityKind::Prepare => "/mlprepare/",
        }
    }

    pub(crate) fn getter(&self) -> &'static str {
        match self {
            EntityKind::Job => "get_job_by_id",
            EntityKind::Result => "get_result_by_id",
            EntityKind::Prepare => "get_prepare_by_id",
        }
    }

    pub(crate) fn tag(&self) -> &'static str {
        match self {
            EntityKind::Job => "JOB",
            EntityKind::Result => "RESULT",
            EntityKind::Prepare => "PREPARE",
        }
    }
}

/// Truthiness of a JSON value: null, false, zero, and empty strings/arrays/objects are falsy.
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().map(|f| f == 0.0).unwrap_or(false),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// Cache key for a record: its truthy `id` field rendered as a string.
pub fn id_key(record: &Value) -> Option<String> {
    let id = record.get("id")?;
    if is_falsy(id) {
        return None;
    }
    match id {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

/// The record's `status` field, if it is a string.
pub fn status_of(record: &Value) -> Option<&str> {
    record.get("status").and_then(Value::as_str)
}

/// Integer id stored at `field`, accepting numbers and numeric strings.
pub(crate) fn id_field(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// The job's `predict_manifest.result_id`.
pub(crate) fn result_id_of(job: &Value) -> Option<i64> {
    id_field(job.get("predict_manifest").and_then(|m| m.get("result_id")))
}

/// Final state of a finished job wait.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobOutcome {
    pub job: Value,
    pub result: Value,
}

impl JobOutcome {
    /// `result.predictions_json.predictions`, empty when absent.
    pub fn predictions(&self) -> &[Value] {
        self.result
            .get("predictions_json")
            .and_then(|p| p.get("predictions"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// `result.acc_data.accuracy`
    pub fn accuracy(&self) -> Option<f64> {
        self.result
            .get("acc_data")
            .and_then(|a| a.get("accuracy"))
            .and_then(Value::as_f64)
    }
}
