//! charsheet - versioned character sheets.
//!
//! A sheet's field values are never stored in place. Each save is diffed
//! against the reconstructed current state and the diff is appended to the
//! sheet's revision log; any past state is a fold of that log.
//!
//! - [`value`]: JSON value helpers with copy-on-write `get`/`set`/`remove`.
//! - [`json_patch`]: add/remove/replace diff, apply, and wire codec.
//! - [`schema`]: sheet type layout validation.
//! - [`revision`]: revision records, fold, and [`revision::RevisionStore`].
//! - [`storage`]: the transactional storage boundary and an in-memory store.
//! - [`directory`]: sheet types and documents built on the above.

pub mod config;
pub mod directory;
pub mod json_patch;
pub mod logging;
pub mod revision;
pub mod schema;
pub mod storage;
pub mod value;

pub use config::DirectoryConfig;
pub use directory::{Directory, DirectoryError};
pub use json_patch::{apply, diff, make_patch, Op, PatchError};
pub use revision::{Revision, RevisionError, RevisionStore};
pub use schema::{validate_form_parts, SchemaError};
pub use storage::{MemoryStore, StorageError};
