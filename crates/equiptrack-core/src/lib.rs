//! Core records, expiry status and persistence for equiptrack.
//!
//! This crate holds everything a front end needs: the [`EquipmentStore`],
//! the [`StatusEvaluator`] it uses to derive each record's status, and the
//! file and SQLite repositories it persists to.

pub mod error;
pub mod models;
pub mod policy;
pub mod repository;
pub mod status;
pub mod store;

pub use error::{MalformedRow, StoreError};
pub use models::{DisplayColor, EquipmentRecord, RecordDraft, RecordId, Status, StoredRecord};
pub use policy::MaterialPolicy;
pub use repository::{BackendKind, CsvRepository, RecordRepository, SaveOutcome, SqliteRepository};
pub use status::{Evaluation, StatusEvaluator};
pub use store::{EquipmentStore, LoadReport, MalformedPolicy};
