//! Flat CSV file backend.
//!
//! ```csv
//! Name,First,Last,Mat,Qty,Status
//! Maria Silva,2024-01-15,2024-08-01,Hard Hat,2,Good
//! ```
//!
//! The status column is informational; it is recomputed on load.

use super::{format_date, parse_date, BackendKind, LoadedRows, RecordRepository, SaveOutcome};
use crate::error::{MalformedRow, Result, StoreError};
use crate::models::{parse_quantity, EquipmentRecord, RecordId, StoredRecord};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const HEADER: [&str; 6] = ["Name", "First", "Last", "Mat", "Qty", "Status"];

/// Keeps records in memory and writes the whole file on save.
#[derive(Debug, Clone)]
pub struct CsvRepository {
    path: PathBuf,
}

impl CsvRepository {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse_row(row: usize, fields: &StringRecord) -> std::result::Result<StoredRecord, MalformedRow> {
        let malformed = |reason: String| MalformedRow { row, reason };

        if fields.len() < HEADER.len() {
            return Err(malformed(format!(
                "expected {} fields, found {}",
                HEADER.len(),
                fields.len()
            )));
        }

        let name = fields[0].trim();
        if name.is_empty() {
            return Err(malformed("empty name".into()));
        }
        let first_issue_date = parse_date(&fields[1])
            .ok_or_else(|| malformed(format!("invalid first date '{}'", &fields[1])))?;
        let last_issue_date = parse_date(&fields[2])
            .ok_or_else(|| malformed(format!("invalid last date '{}'", &fields[2])))?;
        let quantity = parse_quantity(fields[4].trim())
            .ok_or_else(|| malformed(format!("invalid quantity '{}'", &fields[4])))?;

        Ok(StoredRecord {
            id: None,
            name: name.to_string(),
            material: fields[3].trim().to_string(),
            quantity,
            first_issue_date,
            last_issue_date,
        })
    }
}

impl RecordRepository for CsvRepository {
    fn kind(&self) -> BackendKind {
        BackendKind::File
    }

    fn load(&mut self) -> Result<LoadedRows> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)
            .map_err(|e| StoreError::persistence(format!("Failed to open {}", self.path.display()), e))?;

        let mut loaded = LoadedRows::default();
        for (index, result) in reader.records().enumerate() {
            let row = index + 1;
            match result {
                Ok(fields) => match Self::parse_row(row, &fields) {
                    Ok(record) => loaded.rows.push(record),
                    Err(bad) => loaded.malformed.push(bad),
                },
                Err(e) if e.is_io_error() => {
                    return Err(StoreError::persistence(
                        format!("Failed to read {}", self.path.display()),
                        e,
                    ));
                }
                Err(e) => loaded.malformed.push(MalformedRow {
                    row,
                    reason: e.to_string(),
                }),
            }
        }

        tracing::debug!(
            "Read {} rows ({} malformed) from {}",
            loaded.rows.len(),
            loaded.malformed.len(),
            self.path.display()
        );
        Ok(loaded)
    }

    fn insert(&mut self, record: &EquipmentRecord) -> Result<RecordId> {
        Ok(record.id)
    }

    fn update(&mut self, _record: &EquipmentRecord) -> Result<()> {
        Ok(())
    }

    fn delete(&mut self, _id: RecordId) -> Result<()> {
        Ok(())
    }

    fn save_all(&mut self, records: &[&EquipmentRecord]) -> Result<SaveOutcome> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let write_err = |e: Box<dyn std::error::Error + Send + Sync>| {
            StoreError::persistence(format!("Failed to write {}", self.path.display()), e)
        };

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| write_err(e.into()))?;
        {
            let mut writer = WriterBuilder::new().from_writer(tmp.as_file_mut());
            writer.write_record(HEADER).map_err(|e| write_err(e.into()))?;
            for record in records {
                let first = format_date(record.first_issue_date);
                let last = format_date(record.last_issue_date);
                let quantity = record.quantity.to_string();
                writer
                    .write_record([
                        record.name.as_str(),
                        first.as_str(),
                        last.as_str(),
                        record.material.as_str(),
                        quantity.as_str(),
                        record.status.label(),
                    ])
                    .map_err(|e| write_err(e.into()))?;
            }
            writer.flush().map_err(|e| write_err(e.into()))?;
        }
        tmp.persist(&self.path).map_err(|e| write_err(e.into()))?;

        tracing::info!("Wrote {} records to {}", records.len(), self.path.display());
        Ok(SaveOutcome::Written(records.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Status;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::tempdir;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn loads_legacy_file_and_collects_bad_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("safety_data.csv");
        fs::write(
            &path,
            "Name,First,Last,Mat,Qty,Status\n\
             Joao,15/01/2024,01/08/2024,Hard Hat,2,Good\n\
             short,row\n\
             Ana,2024-02-30,2024-03-01,Vest,1,Good\n\
             Rui,2024-01-01,2024-02-01,Vest,1,Not Good,extra\n",
        )
        .unwrap();

        let loaded = CsvRepository::new(&path).load().unwrap();
        assert_eq!(loaded.rows.len(), 2);
        assert_eq!(loaded.rows[0].name, "Joao");
        assert_eq!(loaded.rows[0].first_issue_date, d(2024, 1, 15));
        assert_eq!(loaded.rows[0].id, None);
        assert_eq!(loaded.rows[1].name, "Rui");

        let rows: Vec<usize> = loaded.malformed.iter().map(|m| m.row).collect();
        assert_eq!(rows, vec![2, 3]);
    }

    #[test]
    fn missing_file_is_a_persistence_error() {
        let dir = tempdir().unwrap();
        let err = CsvRepository::new(dir.path().join("nope.csv")).load().unwrap_err();
        assert!(matches!(err, StoreError::Persistence { .. }));
    }

    #[test]
    fn save_writes_header_and_quotes_commas() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let record = EquipmentRecord {
            id: RecordId(1),
            name: "Silva, Maria".into(),
            material: "Vest".into(),
            quantity: 4,
            first_issue_date: d(2024, 1, 15),
            last_issue_date: d(2024, 2, 1),
            status: Status::NotGood,
        };

        let mut repo = CsvRepository::new(&path);
        assert_eq!(repo.save_all(&[&record]).unwrap(), SaveOutcome::Written(1));

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "Name,First,Last,Mat,Qty,Status\n\"Silva, Maria\",2024-01-15,2024-02-01,Vest,4,Not Good\n"
        );

        let loaded = repo.load().unwrap();
        assert_eq!(loaded.rows[0].name, "Silva, Maria");
    }

    #[test]
    fn quote_characters_follow_csv_rules() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("quotes.csv");
        // A leading quote in an unquoted legacy name opens a quoted field.
        fs::write(
            &path,
            "Name,First,Last,Mat,Qty,Status\n\"Big\" Joe,2024-01-15,2024-02-01,Vest,1,Good\n",
        )
        .unwrap();
        let mut repo = CsvRepository::new(&path);
        let loaded = repo.load().unwrap();
        assert_eq!(loaded.rows[0].name, "Big Joe");
        assert!(loaded.malformed.is_empty());

        // Names saved by this tool keep their quotes.
        let record = EquipmentRecord {
            id: RecordId(1),
            name: "\"Big\" Joe".into(),
            material: "Vest".into(),
            quantity: 1,
            first_issue_date: d(2024, 1, 15),
            last_issue_date: d(2024, 2, 1),
            status: Status::NotGood,
        };
        repo.save_all(&[&record]).unwrap();
        assert_eq!(repo.load().unwrap().rows[0].name, "\"Big\" Joe");
    }

    #[test]
    fn save_into_missing_directory_fails_without_touching_anything() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("out.csv");
        let err = CsvRepository::new(&path).save_all(&[]).unwrap_err();
        assert!(matches!(err, StoreError::Persistence { .. }));
        assert!(!path.exists());
    }
}
