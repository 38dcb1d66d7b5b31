//! Storage boundary.
//!
//! The revision store only needs [`RevisionLog`]; the directory needs the
//! wider [`DirectoryTx`]. Both are implemented by transaction handles handed
//! out by a [`Store`]. Dropping a handle without committing discards its
//! writes.

pub mod memory;

pub use memory::{MemoryStore, MemoryTx};

use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::directory::{DocumentInstance, SheetType};
use crate::revision::Revision;

/// Which kind of record a unique name belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    SheetType,
    Document,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            RecordKind::SheetType => "sheet type",
            RecordKind::Document => "document",
        })
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("document not found: {0}")]
    DocumentNotFound(Uuid),
    #[error("sheet type not found: {0}")]
    SheetTypeNotFound(Uuid),
    #[error("revision not found: {0}")]
    RevisionNotFound(Uuid),
    #[error("{kind} name {name:?} is already used by {existing}")]
    NameTaken {
        kind: RecordKind,
        name: String,
        existing: Uuid,
    },
    /// Another transaction changed the document first; retry from scratch.
    #[error("concurrent update of document {0}")]
    Conflict(Uuid),
    #[error("revision at {timestamp} predates the history of document {document}")]
    OutOfOrder {
        document: Uuid,
        timestamp: DateTime<Utc>,
    },
}

impl StorageError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, StorageError::Conflict(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StorageError::DocumentNotFound(_)
                | StorageError::SheetTypeNotFound(_)
                | StorageError::RevisionNotFound(_)
        )
    }
}

/// Ordered, append-only revision storage, scoped to one transaction.
pub trait RevisionLog {
    /// All revisions of `document`, ascending by `(timestamp, seq)`.
    fn load_revisions(&self, document: Uuid) -> Result<Vec<Revision>, StorageError>;

    /// Append a diff. `timestamp` must not be older than the latest revision
    /// already stored for `document`.
    fn append_revision(
        &mut self,
        document: Uuid,
        timestamp: DateTime<Utc>,
        diff: Value,
    ) -> Result<Revision, StorageError>;

    /// Remove every revision of `document`, returning how many there were.
    fn delete_revisions(&mut self, document: Uuid) -> Result<usize, StorageError>;
}

/// Record-level access the directory needs on top of the revision log.
pub trait DirectoryTx: RevisionLog {
    fn insert_sheet_type(&mut self, sheet_type: SheetType) -> Result<(), StorageError>;
    fn sheet_type(&self, id: Uuid) -> Result<SheetType, StorageError>;
    fn sheet_types(&self) -> Result<Vec<SheetType>, StorageError>;

    /// Inserts a document, or replaces the stored one with the same id.
    fn insert_document(&mut self, document: DocumentInstance) -> Result<(), StorageError>;
    fn document(&self, id: Uuid) -> Result<DocumentInstance, StorageError>;
    fn documents(&self) -> Result<Vec<DocumentInstance>, StorageError>;
    /// Removes only the instance row; callers delete its revisions first.
    fn delete_document(&mut self, id: Uuid) -> Result<(), StorageError>;

    fn revision(&self, id: Uuid) -> Result<Revision, StorageError>;
    /// The newest revisions across all documents, newest first.
    fn recent_revisions(&self, limit: usize) -> Result<Vec<Revision>, StorageError>;
}

/// Hands out transactions and commits them.
pub trait Store: Send + Sync {
    type Tx: DirectoryTx;

    fn begin(&self) -> Self::Tx;

    /// Publish `tx`'s writes atomically, or fail without publishing any.
    fn commit(&self, tx: Self::Tx) -> Result<(), StorageError>;
}
