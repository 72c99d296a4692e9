#![allow(dead_code)]

use mareero::config::hash_secret;
use mareero::{AppConfig, LogRecord, MemoryStore, NewEntry, SheetStore, StoreError, Table};

pub const PASSWORD: &str = "test-secret";

/// Default configuration with a known manager password
pub fn config() -> AppConfig {
    AppConfig::with_password_hash(hash_secret(PASSWORD).expect("hash"))
}

pub fn record(branch: &str, category: &str, item: &str) -> LogRecord {
    NewEntry {
        branch: branch.to_string(),
        employee: "Ali".to_string(),
        category: category.to_string(),
        item: item.to_string(),
        note: format!("note for {item}"),
    }
    .into_record("2025-03-01 09:30:00".to_string())
}

/// A few records spread over branches and categories
pub fn sample_records() -> Vec<LogRecord> {
    vec![
        record("Main", "Missing", "Brake pad"),
        record("Branch 2", "New Request", "Oil filter"),
        record("Main", "Damaged", "Headlight"),
        record("Branch 3", "Missing", "Spark plug"),
        record("Main", "High Demand", "Timing belt"),
    ]
}

pub fn seeded_store(config: &AppConfig, records: Vec<LogRecord>) -> MemoryStore {
    MemoryStore::with_records(&config.sheet_id, &config.worksheet, records)
}

pub fn read(store: &dyn SheetStore, config: &AppConfig) -> Table {
    store
        .read(&config.sheet_id, &config.worksheet)
        .expect("read table")
}

/// A store that refuses every operation, like a sheet without permissions
pub struct DownStore;

impl SheetStore for DownStore {
    fn read(&self, _sheet: &str, _worksheet: &str) -> Result<Table, StoreError> {
        Err(StoreError::Unavailable("permission denied".to_string()))
    }

    fn update(
        &self,
        _sheet: &str,
        _worksheet: &str,
        _records: Vec<LogRecord>,
        _expected_version: Option<u64>,
    ) -> Result<u64, StoreError> {
        Err(StoreError::Unavailable("permission denied".to_string()))
    }
}
