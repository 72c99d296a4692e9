//! Backing store interface
//!
//! The dashboard only ever reads a whole worksheet and writes a whole
//! worksheet back. Writers pass the version they read so a write based on a
//! stale snapshot is refused instead of silently discarding someone else's
//! change.

use crate::record::{LogRecord, Table};
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored data could not be decoded: {0}")]
    Codec(String),

    #[error("the sheet was changed by someone else (loaded version {expected}, current version {found}); reload and try again")]
    Conflict { expected: u64, found: u64 },

    #[error("backing store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}

/// Whole-worksheet read/replace access to a spreadsheet-like store
pub trait SheetStore: Send + Sync {
    /// Read every record of a worksheet
    ///
    /// A worksheet that was never written reads as an empty table at version 0.
    fn read(&self, sheet: &str, worksheet: &str) -> Result<Table, StoreError>;

    /// Replace every record of a worksheet
    ///
    /// With `expected_version` set, the write only happens if the stored
    /// version still matches; otherwise `StoreError::Conflict` is returned and
    /// nothing changes. `None` overwrites unconditionally.
    ///
    /// # Returns
    /// * `Result<u64, StoreError>` - The new version of the worksheet
    fn update(
        &self,
        sheet: &str,
        worksheet: &str,
        records: Vec<LogRecord>,
        expected_version: Option<u64>,
    ) -> Result<u64, StoreError>;
}

/// Check a compare-and-swap precondition against the stored version
pub(crate) fn check_version(expected: Option<u64>, found: u64) -> Result<(), StoreError> {
    match expected {
        Some(expected) if expected != found => Err(StoreError::Conflict { expected, found }),
        _ => Ok(()),
    }
}

/// Process-local store, used for tests and throwaway instances
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<(String, String), Table>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose worksheet already holds `records` at version 1
    pub fn with_records(sheet: &str, worksheet: &str, records: Vec<LogRecord>) -> Self {
        let store = Self::new();
        if let Ok(mut tables) = store.tables.lock() {
            tables.insert(
                (sheet.to_string(), worksheet.to_string()),
                Table {
                    version: 1,
                    records,
                },
            );
        }
        store
    }
}

impl SheetStore for MemoryStore {
    fn read(&self, sheet: &str, worksheet: &str) -> Result<Table, StoreError> {
        let tables = self
            .tables
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(tables
            .get(&(sheet.to_string(), worksheet.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    fn update(
        &self,
        sheet: &str,
        worksheet: &str,
        records: Vec<LogRecord>,
        expected_version: Option<u64>,
    ) -> Result<u64, StoreError> {
        let mut tables = self
            .tables
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let table = tables
            .entry((sheet.to_string(), worksheet.to_string()))
            .or_default();

        check_version(expected_version, table.version)?;

        table.version += 1;
        table.records = records;
        Ok(table.version)
    }
}
