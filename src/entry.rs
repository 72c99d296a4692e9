//! Staff Entry Form submission

use chrono::Local;
use thiserror::Error;

use crate::config::AppConfig;
use crate::record::{DATE_FORMAT, LogRecord, NewEntry};
use crate::store::{SheetStore, StoreError};

#[derive(Debug, Error)]
pub enum EntryError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Append a new record to the shared worksheet
///
/// The entry is validated before the store is touched. The record is stamped
/// with the current local time and appended to the table that was just read;
/// the write carries that table's version, so an append that raced with a
/// manager edit fails instead of resurrecting deleted rows.
///
/// # Arguments
/// * `store` - Backing store
/// * `config` - Sheet and worksheet to write to
/// * `entry` - Raw form input
///
/// # Returns
/// * `Result<LogRecord, EntryError>` - The stored record
pub fn submit_entry(
    store: &dyn SheetStore,
    config: &AppConfig,
    entry: NewEntry,
) -> Result<LogRecord, EntryError> {
    entry.validate().map_err(EntryError::Validation)?;

    let mut table = store.read(&config.sheet_id, &config.worksheet)?;
    let record = entry.into_record(Local::now().format(DATE_FORMAT).to_string());

    table.records.push(record.clone());
    let version = store.update(
        &config.sheet_id,
        &config.worksheet,
        table.records,
        Some(table.version),
    )?;

    log::info!(
        "entry {} stored by {} ({} / {}), sheet version {}",
        record.id,
        record.employee,
        record.branch,
        record.category,
        version
    );
    Ok(record)
}
