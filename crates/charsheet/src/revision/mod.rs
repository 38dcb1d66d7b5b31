//! Revision log: append-only diffs per document and point-in-time
//! reconstruction by folding them from an empty object.

mod fold;
mod store;

pub use fold::{fold, fold_through};
pub use store::{reconstruct, RevisionStore};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::json_patch::{from_json_patch, Patch, PatchError};
use crate::storage::StorageError;

/// One immutable diff record of a document.
///
/// `diff` is kept in the JSON Patch wire form so raw history stays readable
/// by external tooling. Within a document, revisions are ordered by
/// `timestamp` and then by `seq`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revision {
    pub id: Uuid,
    pub document_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub seq: u64,
    pub diff: Value,
}

impl Revision {
    /// Decodes the stored diff.
    pub fn ops(&self) -> Result<Patch, RevisionError> {
        from_json_patch(&self.diff).map_err(|source| RevisionError::ApplyFailed {
            revision: self.id,
            source,
        })
    }
}

#[derive(Debug, Error)]
pub enum RevisionError {
    /// Stored history does not replay; the document's history is corrupt.
    #[error("revision {revision} does not apply to the reconstructed state")]
    ApplyFailed {
        revision: Uuid,
        #[source]
        source: PatchError,
    },
    #[error(transparent)]
    Storage(#[from] StorageError),
}
