//! Shared data types for the application.

use crate::error::{Result, StoreError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable handle of one equipment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(pub i64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Derived classification of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Good,
    NotGood,
}

impl Status {
    /// Label shown in tables and written to files.
    pub fn label(self) -> &'static str {
        match self {
            Status::Good => "Good",
            Status::NotGood => "Not Good",
        }
    }

    pub fn color(self) -> DisplayColor {
        match self {
            Status::Good => DisplayColor::Green,
            Status::NotGood => DisplayColor::Red,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Color a front end should use for a status cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayColor {
    Red,
    Green,
}

impl DisplayColor {
    /// RGB triple of the color.
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            DisplayColor::Red => (255, 59, 48),
            DisplayColor::Green => (40, 205, 65),
        }
    }
}

/// One piece of equipment issued to a person.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquipmentRecord {
    pub id: RecordId,
    pub name: String,
    pub material: String,
    pub quantity: u32,
    pub first_issue_date: NaiveDate,
    pub last_issue_date: NaiveDate,
    /// Derived from material and dates; recomputed on every write.
    pub status: Status,
}

/// Field values submitted by a front end for add or update.
///
/// `quantity` is kept as typed so that empty and non-numeric input can be
/// reported as validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDraft {
    pub name: String,
    pub material: String,
    pub quantity: String,
    pub first_issue_date: NaiveDate,
    pub last_issue_date: NaiveDate,
}

/// Validated fields of a draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecordFields {
    pub name: String,
    pub material: String,
    pub quantity: u32,
    pub first_issue_date: NaiveDate,
    pub last_issue_date: NaiveDate,
}

impl RecordDraft {
    pub fn new(
        name: impl Into<String>,
        material: impl Into<String>,
        quantity: impl Into<String>,
        first_issue_date: NaiveDate,
        last_issue_date: NaiveDate,
    ) -> Self {
        Self {
            name: name.into(),
            material: material.into(),
            quantity: quantity.into(),
            first_issue_date,
            last_issue_date,
        }
    }

    pub(crate) fn validate(&self) -> Result<RecordFields> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(StoreError::Validation("name is required".into()));
        }

        let quantity = self.quantity.trim();
        if quantity.is_empty() {
            return Err(StoreError::Validation("quantity is required".into()));
        }
        let quantity = parse_quantity(quantity).ok_or_else(|| {
            StoreError::Validation(format!("quantity must be a positive whole number, got '{quantity}'"))
        })?;

        Ok(RecordFields {
            name: name.to_string(),
            material: self.material.trim().to_string(),
            quantity,
            first_issue_date: self.first_issue_date,
            last_issue_date: self.last_issue_date,
        })
    }
}

impl From<&EquipmentRecord> for RecordDraft {
    fn from(record: &EquipmentRecord) -> Self {
        Self {
            name: record.name.clone(),
            material: record.material.clone(),
            quantity: record.quantity.to_string(),
            first_issue_date: record.first_issue_date,
            last_issue_date: record.last_issue_date,
        }
    }
}

/// Parse a positive quantity. Digits only, no sign.
pub(crate) fn parse_quantity(text: &str) -> Option<u32> {
    if !text.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    text.parse::<u32>().ok().filter(|&q| q > 0)
}

/// A row as it comes out of a repository, before status is derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    /// `None` when the backend has no identity column (flat files).
    pub id: Option<RecordId>,
    pub name: String,
    pub material: String,
    pub quantity: u32,
    pub first_issue_date: NaiveDate,
    pub last_issue_date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str, quantity: &str) -> RecordDraft {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        RecordDraft::new(name, "Vest", quantity, date, date)
    }

    #[test]
    fn validate_trims_and_parses() {
        let fields = draft("  Maria  ", " 3 ").validate().unwrap();
        assert_eq!(fields.name, "Maria");
        assert_eq!(fields.quantity, 3);
    }

    #[test]
    fn validate_rejects_missing_fields() {
        assert!(matches!(draft("", "1").validate(), Err(StoreError::Validation(_))));
        assert!(matches!(draft("   ", "1").validate(), Err(StoreError::Validation(_))));
        assert!(matches!(draft("Ana", "").validate(), Err(StoreError::Validation(_))));
    }

    #[test]
    fn validate_rejects_bad_quantity() {
        for bad in ["abc", "-2", "+2", "1.5", "0", "99999999999"] {
            assert!(
                matches!(draft("Ana", bad).validate(), Err(StoreError::Validation(_))),
                "accepted {bad}"
            );
        }
    }

    #[test]
    fn status_labels_and_colors() {
        assert_eq!(Status::Good.to_string(), "Good");
        assert_eq!(Status::NotGood.to_string(), "Not Good");
        assert_eq!(Status::NotGood.color(), DisplayColor::Red);
        assert_eq!(Status::Good.color().rgb(), (40, 205, 65));
    }
}
