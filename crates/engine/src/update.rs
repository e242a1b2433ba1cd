//! Entity update batches and the external update sink.
//!
//! Producers (paste, edit commit, inherit) build an [`UpdateBatch`], which
//! coalesces repeated writes to the same entity field. The finished batch is
//! handed to an [`UpdateSink`] in a single call.

use std::cell::RefCell;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::entity::{EntityKind, FieldValue};

/// One field write on one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityUpdate {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EntityKind,
    /// Direct field name (`status`, `folderType`, ...) or attribute name.
    pub field: String,
    pub value: FieldValue,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_attrib: bool,
}

impl EntityUpdate {
    pub fn direct(id: impl Into<String>, kind: EntityKind, field: impl Into<String>, value: FieldValue) -> Self {
        Self {
            id: id.into(),
            kind,
            field: field.into(),
            value,
            is_attrib: false,
        }
    }

    pub fn attrib(id: impl Into<String>, kind: EntityKind, field: impl Into<String>, value: FieldValue) -> Self {
        Self {
            is_attrib: true,
            ..Self::direct(id, kind, field, value)
        }
    }
}

/// Coalescing batch builder: one update per (entity, field), last value
/// wins, first-seen order kept.
#[derive(Debug, Clone, Default)]
pub struct UpdateBatch {
    updates: Vec<EntityUpdate>,
    index: FxHashMap<(String, String, bool), usize>,
}

impl UpdateBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, update: EntityUpdate) {
        let key = (update.id.clone(), update.field.clone(), update.is_attrib);
        match self.index.get(&key) {
            Some(&i) => self.updates[i] = update,
            None => {
                self.index.insert(key, self.updates.len());
                self.updates.push(update);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    pub fn updates(&self) -> &[EntityUpdate] {
        &self.updates
    }

    pub fn into_vec(self) -> Vec<EntityUpdate> {
        self.updates
    }
}

impl FromIterator<EntityUpdate> for UpdateBatch {
    fn from_iter<I: IntoIterator<Item = EntityUpdate>>(iter: I) -> Self {
        let mut batch = Self::new();
        for update in iter {
            batch.push(update);
        }
        batch
    }
}

/// Number of distinct entities touched by a batch.
pub fn entity_count(updates: &[EntityUpdate]) -> usize {
    let mut ids: Vec<&str> = updates.iter().map(|u| u.id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    ids.len()
}

/// The only place entity state is mutated for real. Resolves on success,
/// rejects with a human-readable message.
#[allow(async_fn_in_trait)]
pub trait UpdateSink {
    async fn update_entities(&self, updates: Vec<EntityUpdate>) -> Result<(), String>;
}

/// Which step of a commit pipeline refused the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectStage {
    /// Refused before the sink was called.
    Validation,
    /// The sink rejected the batch.
    Sink,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    pub updates: Vec<EntityUpdate>,
}

impl Applied {
    pub fn none() -> Self {
        Self { updates: Vec::new() }
    }

    pub fn is_noop(&self) -> bool {
        self.updates.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rejected {
    pub stage: RejectStage,
    pub reason: String,
}

pub type CommitResult = Result<Applied, Rejected>;

/// Sink that records every batch instead of sending it anywhere.
/// Used for dry runs and tests.
#[derive(Debug, Default)]
pub struct RecordingSink {
    calls: RefCell<Vec<Vec<EntityUpdate>>>,
    fail_with: Option<String>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that records and then rejects every batch.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            fail_with: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Vec<EntityUpdate>> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl UpdateSink for RecordingSink {
    async fn update_entities(&self, updates: Vec<EntityUpdate>) -> Result<(), String> {
        self.calls.borrow_mut().push(updates);
        match &self.fail_with {
            Some(reason) => Err(reason.clone()),
            None => Ok(()),
        }
    }
}
