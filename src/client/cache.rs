//! Session-local copies of the most recently fetched records.

use crate::types::EntityKind;
use serde_json::Value;
use std::collections::HashMap;

/// Jobs, results and prepares keyed by the string form of their server id.
///
/// A stored record is only ever replaced whole by a newer fetch of the same id.
#[derive(Debug, Clone, Default)]
pub struct EntityCache {
    jobs: HashMap<String, Value>,
    results: HashMap<String, Value>,
    prepares: HashMap<String, Value>,
}

impl EntityCache {
    pub fn get(&self, kind: EntityKind, id: &str) -> Option<&Value> {
        self.entries(kind).get(id)
    }

    /// Store `record`, returning the copy it replaced.
    pub fn insert(&mut self, kind: EntityKind, id: String, record: Value) -> Option<Value> {
        self.entries_mut(kind).insert(id, record)
    }

    pub fn len(&self, kind: EntityKind) -> usize {
        self.entries(kind).len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty() && self.results.is_empty() && self.prepares.is_empty()
    }

    pub fn entries(&self, kind: EntityKind) -> &HashMap<String, Value> {
        match kind {
            EntityKind::Job => &self.jobs,
            EntityKind::Result => &self.results,
            EntityKind::Prepare => &self.prepares,
        }
    }

    fn entries_mut(&mut self, kind: EntityKind) -> &mut HashMap<String, Value> {
        match kind {
            EntityKind::Job => &mut self.jobs,
            EntityKind::Result => &mut self.results,
            EntityKind::Prepare => &mut self.prepares,
        }
    }
}
