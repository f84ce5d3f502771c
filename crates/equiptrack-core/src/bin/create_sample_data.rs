use chrono::NaiveDate;
use equiptrack_core::{
    CsvRepository, EquipmentStore, RecordDraft, SqliteRepository, StatusEvaluator,
};

fn date(y: i32, m: u32, d: u32) -> Result<NaiveDate, Box<dyn std::error::Error>> {
    NaiveDate::from_ymd_opt(y, m, d).ok_or_else(|| format!("invalid date {y}-{m}-{d}").into())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let samples = [
        ("Maria Silva", "Hard Hat", "1", date(2024, 1, 15)?, date(2024, 8, 1)?),
        ("Maria Silva", "Safety Shoes", "1", date(2024, 7, 31)?, date(2024, 12, 2)?),
        ("Joao Costa", "Vest", "2", date(2024, 3, 1)?, date(2024, 4, 10)?),
        ("Joao Costa", "Eye Wear", "1", date(2024, 5, 5)?, date(2024, 6, 5)?),
        ("Ana Lima", "Uniform", "3", date(2023, 9, 12)?, date(2024, 9, 12)?),
        ("Ana Lima", "Raincoat", "1", date(2024, 2, 20)?, date(2024, 2, 20)?),
    ];

    let mut file_store = EquipmentStore::new(
        Box::new(CsvRepository::new("sample_data.csv")),
        StatusEvaluator::default(),
    );
    let mut db_store = EquipmentStore::new(
        Box::new(SqliteRepository::open("sample.db")?),
        StatusEvaluator::default(),
    );

    for (name, material, quantity, first, last) in samples {
        let draft = RecordDraft::new(name, material, quantity, first, last);
        file_store.add(&draft)?;
        db_store.add(&draft)?;
    }
    file_store.save_all()?;

    println!(
        "Created sample_data.csv and sample.db with {} records each",
        file_store.len()
    );
    Ok(())
}
