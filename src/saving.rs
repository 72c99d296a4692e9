use bincode::{deserialize_from, serialize_into};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use lazy_static::lazy_static;
use regex::Regex;
use std::fs::{File, create_dir_all};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;

use crate::record::{LogRecord, Table};
use crate::store::{SheetStore, StoreError, check_version};

lazy_static! {
    static ref UNSAFE_NAME_CHARS: Regex = Regex::new(r"[^A-Za-z0-9_.-]+").unwrap();
}

/// Worksheet store kept as gzip-compressed bincode snapshots on disk
///
/// Each worksheet lives in `<root>/<sheet>/<worksheet>.bin.gz`. Writes go to a
/// temporary file in the same directory that is renamed over the old
/// snapshot, so a reader never sees a half-written table. The version check
/// and the replace happen under one lock, which makes the compare-and-swap
/// atomic for everything sharing this store.
pub struct FileStore {
    root: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lock: Mutex::new(()),
        }
    }

    /// Snapshot path of a worksheet
    ///
    /// Sheet identifiers are often full URLs, so anything that is not safe in
    /// a file name is collapsed to `_`.
    pub fn table_path(&self, sheet: &str, worksheet: &str) -> PathBuf {
        self.root
            .join(file_safe(sheet))
            .join(format!("{}.bin.gz", file_safe(worksheet)))
    }
}

fn file_safe(name: &str) -> String {
    let cleaned = UNSAFE_NAME_CHARS.replace_all(name.trim(), "_");
    let cleaned = cleaned.trim_matches('.');
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned.to_string()
    }
}

pub fn save_table(table: &Table, path: &Path) -> Result<(), StoreError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let encoder = GzEncoder::new(tmp.as_file_mut(), Compression::default());
        let mut writer = BufWriter::new(encoder);

        serialize_into(&mut writer, table).map_err(|e| StoreError::Codec(e.to_string()))?;

        let encoder = writer.into_inner().map_err(|e| e.into_error())?;
        encoder.finish()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;

    Ok(())
}

pub fn load_table(path: &Path) -> Result<Table, StoreError> {
    if !path.exists() {
        return Ok(Table::default());
    }

    let file = File::open(path)?;
    let decoder = GzDecoder::new(file);
    let mut reader = BufReader::new(decoder);

    let table: Table =
        deserialize_from(&mut reader).map_err(|e| StoreError::Codec(e.to_string()))?;

    Ok(table)
}

impl SheetStore for FileStore {
    fn read(&self, sheet: &str, worksheet: &str) -> Result<Table, StoreError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        load_table(&self.table_path(sheet, worksheet))
    }

    fn update(
        &self,
        sheet: &str,
        worksheet: &str,
        records: Vec<LogRecord>,
        expected_version: Option<u64>,
    ) -> Result<u64, StoreError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let path = self.table_path(sheet, worksheet);
        let current = load_table(&path)?;
        check_version(expected_version, current.version)?;

        let table = Table {
            version: current.version + 1,
            records,
        };
        save_table(&table, &path)?;

        log::debug!(
            "wrote {} records to {} (version {})",
            table.records.len(),
            path.display(),
            table.version
        );
        Ok(table.version)
    }
}
