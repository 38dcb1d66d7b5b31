use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use super::{fold, Revision, RevisionError};
use crate::json_patch::{diff, to_json_patch};
use crate::storage::RevisionLog;
use crate::value::empty_object;

/// State of `document_id` as of `at` read through any revision log handle.
pub fn reconstruct<L: RevisionLog + ?Sized>(
    log: &L,
    document_id: Uuid,
    at: Option<DateTime<Utc>>,
) -> Result<Value, RevisionError> {
    let history = log.load_revisions(document_id)?;
    fold(&history, at)
}

/// Records and replays the revision history of documents through one
/// storage transaction.
///
/// Every read-diff-append sequence goes through the same `log` handle, so
/// the reconstructed "current" state and the appended diff belong to one
/// transaction and a concurrent writer surfaces as a storage conflict.
pub struct RevisionStore<'t, L: RevisionLog + ?Sized> {
    log: &'t mut L,
}

impl<'t, L: RevisionLog + ?Sized> RevisionStore<'t, L> {
    pub fn new(log: &'t mut L) -> Self {
        Self { log }
    }

    /// State of `document_id` as of `at`, or its latest state for `None`.
    pub fn reconstruct(
        &self,
        document_id: Uuid,
        at: Option<DateTime<Utc>>,
    ) -> Result<Value, RevisionError> {
        reconstruct(&*self.log, document_id, at)
    }

    /// Record the values a document was created with.
    ///
    /// Returns `None` when `initial_values` is the empty object.
    pub fn record_initial(
        &mut self,
        document_id: Uuid,
        initial_values: &Value,
        at: DateTime<Utc>,
    ) -> Result<Option<Revision>, RevisionError> {
        self.append_diff(document_id, &empty_object(), initial_values, at)
    }

    /// Record a full desired state for `document_id`.
    ///
    /// Returns `None` when the state equals the current one. The commit time
    /// is raised to the latest stored revision time if the clock is behind it.
    pub fn record_mutation(
        &mut self,
        document_id: Uuid,
        new_values: &Value,
        at: DateTime<Utc>,
    ) -> Result<Option<Revision>, RevisionError> {
        let history = self.log.load_revisions(document_id)?;
        let current = fold(&history, None)?;
        let at = match history.last() {
            Some(latest) if latest.timestamp > at => latest.timestamp,
            _ => at,
        };
        self.append_diff(document_id, &current, new_values, at)
    }

    fn append_diff(
        &mut self,
        document_id: Uuid,
        old: &Value,
        new: &Value,
        at: DateTime<Utc>,
    ) -> Result<Option<Revision>, RevisionError> {
        let ops = diff(old, new);
        if ops.is_empty() {
            debug!(%document_id, "no changes, revision suppressed");
            return Ok(None);
        }
        let revision = self
            .log
            .append_revision(document_id, at, to_json_patch(&ops))?;
        debug!(
            %document_id,
            revision_id = %revision.id,
            ops = ops.len(),
            "revision appended"
        );
        Ok(Some(revision))
    }

    /// Start the history of a freshly created document.
    pub fn create(&mut self, document_id: Uuid, initial_values: &Value) -> Result<(), RevisionError> {
        self.record_initial(document_id, initial_values, Utc::now())
            .map(drop)
    }

    /// Record `new_values` now; `true` if a revision was written.
    pub fn mutate(&mut self, document_id: Uuid, new_values: &Value) -> Result<bool, RevisionError> {
        self.record_mutation(document_id, new_values, Utc::now())
            .map(|rev| rev.is_some())
    }

    pub fn view(
        &self,
        document_id: Uuid,
        at: Option<DateTime<Utc>>,
    ) -> Result<Value, RevisionError> {
        self.reconstruct(document_id, at)
    }

    /// Drop the whole history of `document_id`; returns how many revisions
    /// were removed.
    pub fn delete(&mut self, document_id: Uuid) -> Result<usize, RevisionError> {
        Ok(self.log.delete_revisions(document_id)?)
    }
}
