//! Row Editor: the manager's editable grid over the whole worksheet
//!
//! The grid carries a synthetic delete flag per row. It exists only between
//! the browser and this module and is stripped before anything is written.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::record::{LogRecord, Table};
use crate::store::{SheetStore, StoreError};

#[derive(Debug, Error)]
pub enum EditError {
    #[error("invalid grid submission: {0}")]
    InvalidRows(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EditError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, EditError::Store(e) if e.is_conflict())
    }
}

/// One row of the editable grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridRow {
    pub id: Uuid,
    pub date: String,
    pub branch: String,
    pub employee: String,
    pub category: String,
    pub item: String,
    pub note: String,
    pub delete: bool,
}

impl GridRow {
    pub fn from_record(record: &LogRecord) -> Self {
        GridRow {
            id: record.id,
            date: record.date.clone(),
            branch: record.branch.clone(),
            employee: record.employee.clone(),
            category: record.category.clone(),
            item: record.item.clone(),
            note: record.note.clone(),
            delete: false,
        }
    }

    pub fn into_record(self) -> LogRecord {
        LogRecord {
            id: self.id,
            date: self.date,
            branch: self.branch,
            employee: self.employee,
            category: self.category,
            item: self.item,
            note: self.note,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditAction {
    /// Persist every cell edit made in the grid
    Save,
    /// Drop flagged rows, persist the rest including their edits
    DeleteSelected,
}

/// Grid rows for a table, every delete flag cleared
pub fn grid_for(table: &Table) -> Vec<GridRow> {
    table.records.iter().map(GridRow::from_record).collect()
}

/// Turn a submitted grid into the records to store
///
/// Row order is kept as submitted.
pub fn apply_grid(rows: Vec<GridRow>, action: EditAction) -> Vec<LogRecord> {
    rows.into_iter()
        .filter(|row| action == EditAction::Save || !row.delete)
        .map(GridRow::into_record)
        .collect()
}

/// The grid must cover exactly the stored rows, each once
fn check_same_rows(rows: &[GridRow], current: &Table) -> Result<(), EditError> {
    let mut seen = HashSet::with_capacity(rows.len());
    for row in rows {
        if !seen.insert(row.id) {
            return Err(EditError::InvalidRows(format!("row {} appears twice", row.id)));
        }
    }

    let stored: HashSet<Uuid> = current.records.iter().map(|r| r.id).collect();
    if seen != stored {
        return Err(EditError::InvalidRows(format!(
            "grid has {} rows but the sheet has {} different ones",
            seen.len(),
            stored.len()
        )));
    }

    Ok(())
}

/// Write an edited grid back to the store
///
/// The grid must have been loaded from `loaded_version`. If the worksheet has
/// moved on since then the write is refused with a conflict and nothing is
/// changed.
///
/// # Returns
/// * `Result<Table, EditError>` - The table as now stored
pub fn commit_grid(
    store: &dyn SheetStore,
    config: &AppConfig,
    rows: Vec<GridRow>,
    loaded_version: u64,
    action: EditAction,
) -> Result<Table, EditError> {
    let current = store.read(&config.sheet_id, &config.worksheet)?;
    if current.version != loaded_version {
        log::warn!(
            "rejected stale {:?}: grid version {}, sheet version {}",
            action,
            loaded_version,
            current.version
        );
        return Err(StoreError::Conflict {
            expected: loaded_version,
            found: current.version,
        }
        .into());
    }
    check_same_rows(&rows, &current)?;

    let records = apply_grid(rows, action);
    let version = store.update(
        &config.sheet_id,
        &config.worksheet,
        records.clone(),
        Some(loaded_version),
    )?;

    log::info!(
        "{:?} stored {} of {} rows, sheet version {}",
        action,
        records.len(),
        current.records.len(),
        version
    );
    Ok(Table { version, records })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::NewEntry;

    fn record(item: &str) -> LogRecord {
        NewEntry {
            employee: "Ali".into(),
            item: item.into(),
            ..Default::default()
        }
        .into_record("2025-01-01 09:00:00".into())
    }

    #[test]
    fn apply_grid_save_keeps_flagged_rows() {
        let table = Table {
            version: 1,
            records: vec![record("a"), record("b")],
        };
        let mut rows = grid_for(&table);
        rows[0].delete = true;
        rows[1].item = "B".into();

        let saved = apply_grid(rows.clone(), EditAction::Save);
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[1].item, "B");

        let kept = apply_grid(rows, EditAction::DeleteSelected);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, table.records[1].id);
        assert_eq!(kept[0].item, "B");
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let table = Table {
            version: 1,
            records: vec![record("a"), record("b")],
        };
        let mut rows = grid_for(&table);
        rows[1].id = rows[0].id;
        assert!(matches!(
            check_same_rows(&rows, &table),
            Err(EditError::InvalidRows(_))
        ));
    }
}
