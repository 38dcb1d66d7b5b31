use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use super::{Revision, RevisionError};
use crate::json_patch::apply_in_place;
use crate::storage::StorageError;
use crate::value::empty_object;

/// Rebuild a document from its history.
///
/// `revisions` must be sorted by `(timestamp, seq)`, which is what storage
/// returns. Only revisions with `timestamp <= at` are applied; `None` applies
/// all of them. Any revision that fails to decode or apply aborts the fold.
pub fn fold(revisions: &[Revision], at: Option<DateTime<Utc>>) -> Result<Value, RevisionError> {
    let upto = revisions
        .iter()
        .take_while(|rev| at.map_or(true, |at| rev.timestamp <= at))
        .count();
    replay(&revisions[..upto])
}

/// Rebuild a document as of (and including) the revision `revision_id`.
pub fn fold_through(revisions: &[Revision], revision_id: Uuid) -> Result<Value, RevisionError> {
    let pos = revisions
        .iter()
        .position(|rev| rev.id == revision_id)
        .ok_or(StorageError::RevisionNotFound(revision_id))?;
    replay(&revisions[..=pos])
}

fn replay(revisions: &[Revision]) -> Result<Value, RevisionError> {
    let mut state = empty_object();
    for rev in revisions {
        let ops = rev.ops()?;
        apply_in_place(&mut state, &ops).map_err(|source| RevisionError::ApplyFailed {
            revision: rev.id,
            source,
        })?;
    }
    Ok(state)
}
