//! Error taxonomy for store and repository operations.

use crate::models::RecordId;
use thiserror::Error;

/// Errors surfaced by [`EquipmentStore`](crate::EquipmentStore) and the
/// repositories behind it.
///
/// None of these are fatal: the store is left exactly as it was before the
/// failing call.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A required field is missing or not parseable.
    #[error("{0}")]
    Validation(String),

    /// No record with this id exists.
    #[error("no record with id {0}")]
    NotFound(RecordId),

    /// The backing file or database could not be read or written.
    #[error("{context}: {source}")]
    Persistence {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A stored row could not be turned into a record.
    #[error(transparent)]
    Malformed(#[from] MalformedRow),
}

impl StoreError {
    pub(crate) fn persistence(
        context: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Persistence {
            context: context.into(),
            source: source.into(),
        }
    }
}

/// A row that was skipped (or rejected) while loading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed row {row}: {reason}")]
pub struct MalformedRow {
    /// 1-based row number in the source (data rows, header excluded).
    pub row: usize,
    pub reason: String,
}

pub type Result<T> = std::result::Result<T, StoreError>;
