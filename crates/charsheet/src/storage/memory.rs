//! In-memory store with optimistic transactions.
//!
//! A transaction works on a private snapshot and keeps a log of its writes.
//! Commit replays the log onto the live tables under the lock, after
//! checking that no document it wrote was changed by someone else since the
//! snapshot was taken. Constraint violations found during replay abort the
//! commit with nothing published.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::Value;
use tracing::trace;
use uuid::Uuid;

use super::{DirectoryTx, RecordKind, RevisionLog, Store, StorageError};
use crate::directory::{DocumentInstance, SheetType};
use crate::revision::Revision;

#[derive(Debug, Clone, Default)]
struct Tables {
    sheet_types: BTreeMap<Uuid, SheetType>,
    documents: BTreeMap<Uuid, DocumentInstance>,
    revisions: BTreeMap<Uuid, Vec<Revision>>,
    /// Bumped on every write touching a document.
    versions: HashMap<Uuid, u64>,
}

#[derive(Debug, Clone)]
enum Write {
    SheetType(SheetType),
    Document(DocumentInstance),
    DeleteDocument(Uuid),
    Revision(Revision),
    DeleteRevisions(Uuid),
}

impl Write {
    fn document(&self) -> Option<Uuid> {
        match self {
            Write::SheetType(_) => None,
            Write::Document(doc) => Some(doc.id),
            Write::DeleteDocument(id) | Write::DeleteRevisions(id) => Some(*id),
            Write::Revision(rev) => Some(rev.document_id),
        }
    }
}

impl Tables {
    fn version(&self, document: Uuid) -> u64 {
        self.versions.get(&document).copied().unwrap_or(0)
    }

    fn apply(&mut self, write: &Write) -> Result<(), StorageError> {
        match write {
            Write::SheetType(sheet_type) => {
                if let Some(existing) = self
                    .sheet_types
                    .values()
                    .find(|t| t.name == sheet_type.name && t.id != sheet_type.id)
                {
                    return Err(StorageError::NameTaken {
                        kind: RecordKind::SheetType,
                        name: sheet_type.name.clone(),
                        existing: existing.id,
                    });
                }
                self.sheet_types.insert(sheet_type.id, sheet_type.clone());
            }
            Write::Document(doc) => {
                if !self.sheet_types.contains_key(&doc.sheet_type_id) {
                    return Err(StorageError::SheetTypeNotFound(doc.sheet_type_id));
                }
                if let Some(existing) = self.find_document(&doc.name).filter(|d| d.id != doc.id) {
                    return Err(StorageError::NameTaken {
                        kind: RecordKind::Document,
                        name: doc.name.clone(),
                        existing: existing.id,
                    });
                }
                self.documents.insert(doc.id, doc.clone());
            }
            Write::DeleteDocument(id) => {
                self.documents
                    .remove(id)
                    .ok_or(StorageError::DocumentNotFound(*id))?;
                // An absent version reads as 0, which still differs from any
                // base a concurrent writer captured.
                self.versions.remove(id);
                return Ok(());
            }
            Write::Revision(rev) => {
                if !self.documents.contains_key(&rev.document_id) {
                    return Err(StorageError::DocumentNotFound(rev.document_id));
                }
                let history = self.revisions.entry(rev.document_id).or_default();
                if history.last().is_some_and(|last| last.timestamp > rev.timestamp) {
                    return Err(StorageError::OutOfOrder {
                        document: rev.document_id,
                        timestamp: rev.timestamp,
                    });
                }
                history.push(rev.clone());
            }
            Write::DeleteRevisions(id) => {
                self.revisions.remove(id);
            }
        }
        if let Some(doc) = write.document() {
            *self.versions.entry(doc).or_insert(0) += 1;
        }
        Ok(())
    }

    fn find_document(&self, name: &str) -> Option<&DocumentInstance> {
        self.documents.values().find(|d| d.name == name)
    }
}

/// Thread-safe in-memory [`Store`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    type Tx = MemoryTx;

    fn begin(&self) -> MemoryTx {
        MemoryTx {
            tables: self.tables.lock().clone(),
            writes: Vec::new(),
            base_versions: HashMap::new(),
        }
    }

    fn commit(&self, tx: MemoryTx) -> Result<(), StorageError> {
        if tx.writes.is_empty() {
            return Ok(());
        }
        let mut live = self.tables.lock();
        for (&doc, &base) in &tx.base_versions {
            if live.version(doc) != base {
                return Err(StorageError::Conflict(doc));
            }
        }
        let mut next = live.clone();
        for write in &tx.writes {
            next.apply(write)?;
        }
        *live = next;
        trace!(writes = tx.writes.len(), "transaction committed");
        Ok(())
    }
}

/// A transaction on a [`MemoryStore`].
#[derive(Debug)]
pub struct MemoryTx {
    tables: Tables,
    writes: Vec<Write>,
    /// Version of each written document as of the snapshot.
    base_versions: HashMap<Uuid, u64>,
}

impl MemoryTx {
    fn write(&mut self, write: Write) -> Result<(), StorageError> {
        if let Some(doc) = write.document() {
            let base = self.tables.version(doc);
            self.base_versions.entry(doc).or_insert(base);
        }
        self.tables.apply(&write)?;
        self.writes.push(write);
        Ok(())
    }
}

impl RevisionLog for MemoryTx {
    fn load_revisions(&self, document: Uuid) -> Result<Vec<Revision>, StorageError> {
        if !self.tables.documents.contains_key(&document) {
            return Err(StorageError::DocumentNotFound(document));
        }
        Ok(self
            .tables
            .revisions
            .get(&document)
            .cloned()
            .unwrap_or_default())
    }

    fn append_revision(
        &mut self,
        document: Uuid,
        timestamp: DateTime<Utc>,
        diff: Value,
    ) -> Result<Revision, StorageError> {
        let seq = self
            .tables
            .revisions
            .get(&document)
            .and_then(|h| h.last())
            .map_or(0, |last| last.seq + 1);
        let revision = Revision {
            id: Uuid::new_v4(),
            document_id: document,
            timestamp,
            seq,
            diff,
        };
        self.write(Write::Revision(revision.clone()))?;
        Ok(revision)
    }

    fn delete_revisions(&mut self, document: Uuid) -> Result<usize, StorageError> {
        let count = self.tables.revisions.get(&document).map_or(0, Vec::len);
        self.write(Write::DeleteRevisions(document))?;
        Ok(count)
    }
}

impl DirectoryTx for MemoryTx {
    fn insert_sheet_type(&mut self, sheet_type: SheetType) -> Result<(), StorageError> {
        self.write(Write::SheetType(sheet_type))
    }

    fn sheet_type(&self, id: Uuid) -> Result<SheetType, StorageError> {
        self.tables
            .sheet_types
            .get(&id)
            .cloned()
            .ok_or(StorageError::SheetTypeNotFound(id))
    }

    fn sheet_types(&self) -> Result<Vec<SheetType>, StorageError> {
        let mut all: Vec<_> = self.tables.sheet_types.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    fn insert_document(&mut self, document: DocumentInstance) -> Result<(), StorageError> {
        self.write(Write::Document(document))
    }

    fn document(&self, id: Uuid) -> Result<DocumentInstance, StorageError> {
        self.tables
            .documents
            .get(&id)
            .cloned()
            .ok_or(StorageError::DocumentNotFound(id))
    }

    fn documents(&self) -> Result<Vec<DocumentInstance>, StorageError> {
        let mut all: Vec<_> = self.tables.documents.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.name.cmp(&b.name)));
        Ok(all)
    }

    fn delete_document(&mut self, id: Uuid) -> Result<(), StorageError> {
        self.write(Write::DeleteDocument(id))
    }

    fn revision(&self, id: Uuid) -> Result<Revision, StorageError> {
        self.tables
            .revisions
            .values()
            .flatten()
            .find(|rev| rev.id == id)
            .cloned()
            .ok_or(StorageError::RevisionNotFound(id))
    }

    fn recent_revisions(&self, limit: usize) -> Result<Vec<Revision>, StorageError> {
        let mut all: Vec<_> = self.tables.revisions.values().flatten().collect();
        all.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| b.seq.cmp(&a.seq))
        });
        Ok(all.into_iter().take(limit).cloned().collect())
    }
}
