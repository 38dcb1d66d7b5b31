//! Document directory: sheet types and documents on top of a [`Store`].
//!
//! Every operation runs in one store transaction. Field values are never
//! written directly; creation and saves go through [`RevisionStore`].

mod model;

pub use model::{
    canonical_address, form_values, validate_name, DocumentInstance, Lookup, NewDocument,
    NewSheetType, RevisionSummary, RevisionView, SaveAsNew, SheetType, SheetTypeSummary,
    ValidationError,
};

use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::DirectoryConfig;
use crate::revision::{fold_through, reconstruct, RevisionError, RevisionStore};
use crate::schema::{validate_form_parts, SchemaError};
use crate::storage::{DirectoryTx, MemoryStore, RevisionLog, StorageError, Store};

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// The name already belongs to `existing`.
    #[error("name {name:?} is already used by {existing}")]
    Conflict { name: String, existing: Uuid },
    #[error("encoding form values: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Revision(RevisionError),
    #[error(transparent)]
    Storage(StorageError),
}

impl DirectoryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, DirectoryError::Storage(err) if err.is_not_found())
    }
}

impl From<StorageError> for DirectoryError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NameTaken { name, existing, .. } => {
                DirectoryError::Conflict { name, existing }
            }
            other => DirectoryError::Storage(other),
        }
    }
}

impl From<RevisionError> for DirectoryError {
    fn from(err: RevisionError) -> Self {
        match err {
            RevisionError::Storage(err) => err.into(),
            other => DirectoryError::Revision(other),
        }
    }
}

pub struct Directory<S: Store = MemoryStore> {
    store: S,
    config: DirectoryConfig,
}

impl Default for Directory<MemoryStore> {
    fn default() -> Self {
        Self::new(MemoryStore::new(), DirectoryConfig::default())
    }
}

impl<S: Store> Directory<S> {
    pub fn new(store: S, config: DirectoryConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &DirectoryConfig {
        &self.config
    }

    /// Run `f` in a transaction and commit it, retrying on write conflicts.
    fn transact<T>(
        &self,
        mut f: impl FnMut(&mut S::Tx) -> Result<T, DirectoryError>,
    ) -> Result<T, DirectoryError> {
        let mut attempt = 0;
        loop {
            let mut tx = self.store.begin();
            let out = f(&mut tx)?;
            match self.store.commit(tx) {
                Ok(()) => return Ok(out),
                Err(err) if err.is_retryable() && attempt < self.config.conflict_retries => {
                    attempt += 1;
                    warn!(%err, attempt, "transaction conflict, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Run a read-only `f` against a fresh snapshot.
    fn read<T>(&self, f: impl FnOnce(&S::Tx) -> Result<T, DirectoryError>) -> Result<T, DirectoryError> {
        f(&self.store.begin())
    }

    // ── Sheet types ───────────────────────────────────────────────────────

    pub fn create_sheet_type(&self, new: NewSheetType) -> Result<SheetType, DirectoryError> {
        let name = validate_name(&new.name)?;
        validate_form_parts(&new.form_parts)?;
        let sheet_type = SheetType {
            id: Uuid::new_v4(),
            name,
            form_parts: new.form_parts,
            image: new.image,
        };
        self.transact(|tx| {
            tx.insert_sheet_type(sheet_type.clone())?;
            Ok(())
        })?;
        info!(id = %sheet_type.id, name = %sheet_type.name, "sheet type created");
        Ok(sheet_type)
    }

    pub fn sheet_type(&self, id: Uuid) -> Result<SheetType, DirectoryError> {
        self.read(|tx| Ok(tx.sheet_type(id)?))
    }

    /// All sheet types, by name.
    pub fn sheet_types(&self) -> Result<Vec<SheetTypeSummary>, DirectoryError> {
        self.read(|tx| {
            Ok(tx
                .sheet_types()?
                .into_iter()
                .map(|t| SheetTypeSummary {
                    id: t.id,
                    name: t.name,
                })
                .collect())
        })
    }

    // ── Documents ─────────────────────────────────────────────────────────

    /// Create a document and record its initial values.
    ///
    /// A taken name fails with [`DirectoryError::Conflict`] naming the
    /// document that owns it.
    pub fn create_document(&self, new: NewDocument) -> Result<DocumentInstance, DirectoryError> {
        let name = validate_name(&new.name)?;
        let creation_ip = canonical_address(&new.creation_ip)?;
        let initial_values = form_values(&new.initial_values)?;
        self.check_payload(&initial_values)?;
        let document = self.transact(|tx| {
            tx.sheet_type(new.sheet_type_id)?;
            let document = DocumentInstance {
                id: Uuid::new_v4(),
                name: name.clone(),
                sheet_type_id: new.sheet_type_id,
                deleted: false,
                created_at: Utc::now(),
                creation_ip: creation_ip.clone(),
            };
            tx.insert_document(document.clone())?;
            RevisionStore::new(tx).record_initial(
                document.id,
                &initial_values,
                document.created_at,
            )?;
            Ok(document)
        })?;
        info!(id = %document.id, name = %document.name, "document created");
        Ok(document)
    }

    pub fn document(&self, id: Uuid) -> Result<DocumentInstance, DirectoryError> {
        self.read(|tx| Ok(tx.document(id)?))
    }

    /// Field values of `id` as of `at`, or the latest values for `None`.
    pub fn view(&self, id: Uuid, at: Option<DateTime<Utc>>) -> Result<Value, DirectoryError> {
        self.read(|tx| Ok(reconstruct(tx, id, at)?))
    }

    /// The document a revision belongs to, with its values right after it.
    pub fn view_revision(&self, rev_id: Uuid) -> Result<RevisionView, DirectoryError> {
        self.read(|tx| {
            let revision = tx.revision(rev_id)?;
            let document = tx.document(revision.document_id)?;
            let sheet_type = tx.sheet_type(document.sheet_type_id)?;
            let history = tx.load_revisions(document.id)?;
            let form_values = fold_through(&history, rev_id)?;
            Ok(RevisionView {
                document,
                sheet_type,
                revision_id: rev_id,
                form_values,
            })
        })
    }

    /// Save a full new state of `id`; `false` if nothing changed.
    pub fn save(&self, id: Uuid, values: &Value) -> Result<bool, DirectoryError> {
        let values = form_values(values)?;
        self.check_payload(&values)?;
        self.transact(|tx| Ok(RevisionStore::new(tx).mutate(id, &values)?))
    }

    /// Copy `source_id` into a new document named `new.name`.
    pub fn save_as_new(
        &self,
        source_id: Uuid,
        new: SaveAsNew,
    ) -> Result<DocumentInstance, DirectoryError> {
        let (sheet_type_id, initial_values) = self.read(|tx| {
            let source = tx.document(source_id)?;
            let values = match &new.form_values {
                Some(values) => values.clone(),
                None => reconstruct(tx, source_id, None)?,
            };
            Ok((source.sheet_type_id, values))
        })?;
        self.create_document(NewDocument {
            name: new.name,
            sheet_type_id,
            creation_ip: new.creation_ip,
            initial_values,
        })
    }

    /// Delete a document with its whole history; returns the number of
    /// revisions removed.
    pub fn delete_document(&self, id: Uuid) -> Result<usize, DirectoryError> {
        let removed = self.transact(|tx| {
            tx.document(id)?;
            let removed = RevisionStore::new(tx).delete(id)?;
            tx.delete_document(id)?;
            Ok(removed)
        })?;
        info!(%id, revisions = removed, "document deleted");
        Ok(removed)
    }

    /// Set or clear the deleted flag of a document, keeping its history.
    ///
    /// Flagged documents drop out of name search but stay reachable by id.
    pub fn set_deleted(&self, id: Uuid, deleted: bool) -> Result<DocumentInstance, DirectoryError> {
        let document = self.transact(|tx| {
            let mut document = tx.document(id)?;
            document.deleted = deleted;
            tx.insert_document(document.clone())?;
            Ok(document)
        })?;
        info!(%id, deleted, "document deleted flag updated");
        Ok(document)
    }

    /// Resolve a document or revision id, or search document names.
    ///
    /// Name search is a case-insensitive substring match that skips
    /// documents flagged as deleted.
    pub fn lookup(&self, query: &str) -> Result<Lookup, DirectoryError> {
        let query = query.trim();
        self.read(|tx| {
            if let Ok(id) = Uuid::parse_str(query) {
                if tx.document(id).is_ok() {
                    return Ok(Lookup::Document(id));
                }
                if tx.revision(id).is_ok() {
                    return Ok(Lookup::Revision(id));
                }
            }
            let needle = query.to_lowercase();
            let matches = tx
                .documents()?
                .into_iter()
                .filter(|d| !d.deleted && d.name.to_lowercase().contains(&needle))
                .collect();
            Ok(Lookup::Matches(matches))
        })
    }

    /// Revision summaries of one document, oldest first.
    pub fn revisions(&self, id: Uuid) -> Result<Vec<RevisionSummary>, DirectoryError> {
        self.read(|tx| {
            let document = tx.document(id)?;
            let sheet_type = tx.sheet_type(document.sheet_type_id)?;
            Ok(tx
                .load_revisions(id)?
                .into_iter()
                .map(|rev| RevisionSummary {
                    rev_id: rev.id,
                    document_id: rev.document_id,
                    timestamp: rev.timestamp,
                    document_name: document.name.clone(),
                    sheet_type_name: sheet_type.name.clone(),
                })
                .collect())
        })
    }

    /// The newest revisions across all documents.
    pub fn recent_revisions(&self) -> Result<Vec<RevisionSummary>, DirectoryError> {
        self.read(|tx| {
            tx.recent_revisions(self.config.recent_revisions_limit)?
                .into_iter()
                .map(|rev| -> Result<RevisionSummary, DirectoryError> {
                    let document = tx.document(rev.document_id)?;
                    let sheet_type = tx.sheet_type(document.sheet_type_id)?;
                    Ok(RevisionSummary {
                        rev_id: rev.id,
                        document_id: rev.document_id,
                        timestamp: rev.timestamp,
                        document_name: document.name,
                        sheet_type_name: sheet_type.name,
                    })
                })
                .collect()
        })
    }

    fn check_payload(&self, values: &Value) -> Result<(), DirectoryError> {
        let size = serde_json::to_vec(values)?.len();
        let limit = self.config.max_payload_bytes;
        if size > limit {
            return Err(ValidationError::PayloadTooLarge { size, limit }.into());
        }
        Ok(())
    }
}
