//! In-memory record set kept in sync with a repository.

use crate::error::{MalformedRow, Result, StoreError};
use crate::models::{EquipmentRecord, RecordDraft, RecordFields, RecordId, StoredRecord};
use crate::repository::{BackendKind, LoadedRows, RecordRepository, SaveOutcome};
use crate::status::StatusEvaluator;
use serde::{Deserialize, Serialize};

/// What to do with rows that cannot be parsed during a load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
    /// Drop the row, log it and report it in the [`LoadReport`].
    #[default]
    Skip,
    /// Abort the load on the first bad row.
    Fail,
}

/// Summary of a successful load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: Vec<MalformedRow>,
}

/// Owns the equipment records and routes every change through the
/// repository before touching memory.
pub struct EquipmentStore {
    repository: Box<dyn RecordRepository>,
    evaluator: StatusEvaluator,
    malformed_policy: MalformedPolicy,
    records: Vec<EquipmentRecord>,
    next_id: i64,
    filter: Option<String>,
}

impl EquipmentStore {
    /// Create an empty store. Call [`load_all`](Self::load_all) to read
    /// existing data.
    pub fn new(repository: Box<dyn RecordRepository>, evaluator: StatusEvaluator) -> Self {
        Self {
            repository,
            evaluator,
            malformed_policy: MalformedPolicy::default(),
            records: Vec::new(),
            next_id: 1,
            filter: None,
        }
    }

    pub fn with_malformed_policy(mut self, policy: MalformedPolicy) -> Self {
        self.malformed_policy = policy;
        self
    }

    pub fn backend(&self) -> BackendKind {
        self.repository.kind()
    }

    pub fn evaluator(&self) -> &StatusEvaluator {
        &self.evaluator
    }

    /// All records in insertion/load order, ignoring the filter.
    pub fn records(&self) -> &[EquipmentRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: RecordId) -> Option<&EquipmentRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    fn position(&self, id: RecordId) -> Result<usize> {
        self.records
            .iter()
            .position(|r| r.id == id)
            .ok_or(StoreError::NotFound(id))
    }

    fn allocate_id(&mut self) -> RecordId {
        let id = RecordId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Keep the counter ahead of any id already handed out.
    fn observe_id(&mut self, id: RecordId) {
        if id.0 >= self.next_id {
            self.next_id = id.0 + 1;
        }
    }

    fn build(&self, id: RecordId, fields: RecordFields) -> EquipmentRecord {
        let evaluation = self.evaluator.evaluate(
            &fields.material,
            fields.first_issue_date,
            fields.last_issue_date,
        );
        EquipmentRecord {
            id,
            name: fields.name,
            material: fields.material,
            quantity: fields.quantity,
            first_issue_date: fields.first_issue_date,
            last_issue_date: fields.last_issue_date,
            status: evaluation.status,
        }
    }

    /// Validate and append a new record.
    pub fn add(&mut self, draft: &RecordDraft) -> Result<&EquipmentRecord> {
        let fields = draft.validate()?;
        let proposed = self.allocate_id();
        let mut record = self.build(proposed, fields);

        record.id = self.repository.insert(&record)?;
        self.observe_id(record.id);

        tracing::debug!("Added record {} ({}, {})", record.id, record.name, record.status);
        self.records.push(record);
        Ok(&self.records[self.records.len() - 1])
    }

    /// Replace the fields of an existing record, keeping its id.
    pub fn update(&mut self, id: RecordId, draft: &RecordDraft) -> Result<&EquipmentRecord> {
        let index = self.position(id)?;
        let fields = draft.validate()?;
        let record = self.build(id, fields);

        self.repository.update(&record)?;

        tracing::debug!("Updated record {} ({})", record.id, record.status);
        self.records[index] = record;
        Ok(&self.records[index])
    }

    /// Remove a record and return it.
    pub fn delete(&mut self, id: RecordId) -> Result<EquipmentRecord> {
        let index = self.position(id)?;
        self.repository.delete(id)?;

        let removed = self.records.remove(index);
        tracing::debug!("Deleted record {} ({})", removed.id, removed.name);
        Ok(removed)
    }

    /// Replace the in-memory set with everything the repository holds.
    ///
    /// Nothing changes unless the whole load succeeds.
    pub fn load_all(&mut self) -> Result<LoadReport> {
        let LoadedRows { rows, malformed } = self.repository.load()?;

        let skipped = match self.malformed_policy {
            MalformedPolicy::Fail => {
                if let Some(first) = malformed.into_iter().next() {
                    return Err(first.into());
                }
                Vec::new()
            }
            MalformedPolicy::Skip => {
                for bad in &malformed {
                    tracing::warn!("Skipping {}", bad);
                }
                malformed
            }
        };

        let mut next_id = self.next_id;
        let records: Vec<EquipmentRecord> = rows
            .into_iter()
            .map(|row| self.record_from_stored(row, &mut next_id))
            .collect();

        self.next_id = next_id;
        self.records = records;

        let report = LoadReport {
            loaded: self.records.len(),
            skipped,
        };
        tracing::info!(
            "Loaded {} records from {} backend ({} skipped)",
            report.loaded,
            self.backend(),
            report.skipped.len()
        );
        Ok(report)
    }

    /// Switch to `repository` and load from it. On failure the previous
    /// repository and records stay in place.
    pub fn load_from(&mut self, repository: Box<dyn RecordRepository>) -> Result<LoadReport> {
        let previous = std::mem::replace(&mut self.repository, repository);
        match self.load_all() {
            Ok(report) => Ok(report),
            Err(e) => {
                self.repository = previous;
                Err(e)
            }
        }
    }

    /// Turn a stored row into a record, assigning a fresh id when the
    /// backend has none and recomputing the status.
    fn record_from_stored(&self, row: StoredRecord, next_id: &mut i64) -> EquipmentRecord {
        let id = match row.id {
            Some(id) => {
                if id.0 >= *next_id {
                    *next_id = id.0 + 1;
                }
                id
            }
            None => {
                let id = RecordId(*next_id);
                *next_id += 1;
                id
            }
        };
        self.build(
            id,
            RecordFields {
                name: row.name,
                material: row.material,
                quantity: row.quantity,
                first_issue_date: row.first_issue_date,
                last_issue_date: row.last_issue_date,
            },
        )
    }

    /// Persist the records matching the active filter.
    pub fn save_all(&mut self) -> Result<SaveOutcome> {
        let visible: Vec<&EquipmentRecord> = search_in(&self.records, self.filter.as_deref());
        self.repository.save_all(&visible)
    }

    /// Records whose name or material contains `term`, ignoring case.
    /// An empty or missing term matches everything.
    pub fn search(&self, term: Option<&str>) -> Vec<&EquipmentRecord> {
        search_in(&self.records, term)
    }

    /// Set the search term that defines the visible set.
    pub fn set_filter(&mut self, term: Option<&str>) {
        self.filter = term.filter(|t| !t.is_empty()).map(str::to_string);
    }

    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    /// Records matching the active filter.
    pub fn visible(&self) -> Vec<&EquipmentRecord> {
        self.search(self.filter.as_deref())
    }
}

fn search_in<'a>(records: &'a [EquipmentRecord], term: Option<&str>) -> Vec<&'a EquipmentRecord> {
    let needle = match term {
        Some(t) if !t.is_empty() => t.to_lowercase(),
        _ => return records.iter().collect(),
    };
    records
        .iter()
        .filter(|r| {
            r.name.to_lowercase().contains(&needle) || r.material.to_lowercase().contains(&needle)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::CsvRepository;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    /// Repository that fails every write, for checking that memory is
    /// untouched on persistence errors.
    struct BrokenRepository;

    impl RecordRepository for BrokenRepository {
        fn kind(&self) -> BackendKind {
            BackendKind::Database
        }
        fn load(&mut self) -> Result<LoadedRows> {
            Err(StoreError::persistence("load", "disk gone"))
        }
        fn insert(&mut self, _record: &EquipmentRecord) -> Result<RecordId> {
            Err(StoreError::persistence("insert", "disk gone"))
        }
        fn update(&mut self, _record: &EquipmentRecord) -> Result<()> {
            Err(StoreError::persistence("update", "disk gone"))
        }
        fn delete(&mut self, _id: RecordId) -> Result<()> {
            Err(StoreError::persistence("delete", "disk gone"))
        }
        fn save_all(&mut self, _records: &[&EquipmentRecord]) -> Result<SaveOutcome> {
            Err(StoreError::persistence("save", "disk gone"))
        }
    }

    fn memory_store() -> EquipmentStore {
        // The file backend does not touch disk until save or load.
        EquipmentStore::new(
            Box::new(CsvRepository::new("unused.csv")),
            StatusEvaluator::default(),
        )
    }

    fn draft(name: &str, material: &str) -> RecordDraft {
        RecordDraft::new(name, material, "1", d(2024, 1, 15), d(2024, 6, 1))
    }

    #[test]
    fn add_assigns_sequential_ids_and_status() {
        let mut store = memory_store();
        let first = store.add(&draft("Ana", "Hard Hat")).unwrap().id;
        let second = store.add(&draft("Rui", "Vest")).unwrap().id;
        assert_eq!(first, RecordId(1));
        assert_eq!(second, RecordId(2));
        assert_eq!(store.records()[0].status.label(), "Not Good");
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let mut store = memory_store();
        store.add(&draft("Ana", "Vest")).unwrap();
        let id = store.add(&draft("Rui", "Vest")).unwrap().id;
        store.delete(id).unwrap();
        let next = store.add(&draft("Eva", "Vest")).unwrap().id;
        assert_eq!(next, RecordId(3));
    }

    #[test]
    fn update_recomputes_status_and_keeps_id() {
        let mut store = memory_store();
        let id = store.add(&draft("Ana", "Hard Hat")).unwrap().id;

        let mut changed = draft("Ana Lima", "Hard Hat");
        changed.last_issue_date = d(2024, 8, 1);
        let updated = store.update(id, &changed).unwrap();

        assert_eq!(updated.id, id);
        assert_eq!(updated.name, "Ana Lima");
        assert_eq!(updated.status.label(), "Good");
    }

    #[test]
    fn invalid_update_changes_nothing() {
        let mut store = memory_store();
        let id = store.add(&draft("Ana", "Vest")).unwrap().id;
        let before = store.records().to_vec();

        let mut bad = draft("Ana", "Vest");
        bad.quantity = "many".into();
        assert!(matches!(store.update(id, &bad), Err(StoreError::Validation(_))));
        assert!(matches!(
            store.update(RecordId(99), &draft("X", "Vest")),
            Err(StoreError::NotFound(RecordId(99)))
        ));
        assert_eq!(store.records(), before.as_slice());
    }

    #[test]
    fn search_matches_name_or_material_case_insensitively() {
        let mut store = memory_store();
        store.add(&draft("Ana", "Hard Hat")).unwrap();
        store.add(&draft("Hattie", "Vest")).unwrap();
        store.add(&draft("Rui", "Raincoat")).unwrap();

        let names = |term| -> Vec<String> {
            store.search(term).iter().map(|r| r.name.clone()).collect()
        };
        assert_eq!(names(Some("HAT")), vec!["Ana", "Hattie"]);
        assert_eq!(names(Some("rain")), vec!["Rui"]);
        assert_eq!(names(Some("")), vec!["Ana", "Hattie", "Rui"]);
        assert_eq!(names(None), vec!["Ana", "Hattie", "Rui"]);
        assert!(names(Some("gloves")).is_empty());
    }

    #[test]
    fn empty_filter_is_cleared() {
        let mut store = memory_store();
        store.set_filter(Some("vest"));
        assert_eq!(store.filter(), Some("vest"));
        store.set_filter(Some(""));
        assert_eq!(store.filter(), None);
    }

    #[test]
    fn persistence_failures_leave_memory_unchanged() {
        let mut store = memory_store();
        store.add(&draft("Ana", "Vest")).unwrap();
        let records = store.records().to_vec();

        // Swap in a broken backend while keeping the loaded records.
        store.repository = Box::new(BrokenRepository);
        assert!(matches!(store.add(&draft("Rui", "Vest")), Err(StoreError::Persistence { .. })));
        assert!(store.update(RecordId(1), &draft("Eva", "Vest")).is_err());
        assert!(store.delete(RecordId(1)).is_err());
        assert!(store.load_all().is_err());
        assert!(store.save_all().is_err());
        assert_eq!(store.records(), records.as_slice());
    }

    #[test]
    fn failed_load_from_keeps_previous_repository() {
        let mut store = EquipmentStore::new(
            Box::new(crate::repository::SqliteRepository::open_in_memory().unwrap()),
            StatusEvaluator::default(),
        );
        store.add(&draft("Ana", "Vest")).unwrap();

        assert!(store.load_from(Box::new(BrokenRepository)).is_err());
        assert_eq!(store.len(), 1);
        // Still writing to the in-memory database.
        store.add(&draft("Rui", "Vest")).unwrap();
        assert_eq!(store.load_all().unwrap().loaded, 2);
    }
}
