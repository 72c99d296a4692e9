//! Manager dashboard figures

use serde::Serialize;
use std::collections::HashMap;

use crate::config::{AppConfig, CategoryRole, Vocabulary};
use crate::record::{LogRecord, Table};
use crate::store::SheetStore;

/// Headline counts shown at the top of the manager view and the PDF report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Metrics {
    pub total: usize,
    pub missing: usize,
    pub new_requests: usize,
}

impl Metrics {
    pub fn compute(records: &[LogRecord], vocabulary: &Vocabulary) -> Self {
        let mut metrics = Metrics {
            total: records.len(),
            ..Default::default()
        };

        for record in records {
            match vocabulary.role_of(&record.category) {
                Some(CategoryRole::Missing) => metrics.missing += 1,
                Some(CategoryRole::NewRequest) => metrics.new_requests += 1,
                None => {}
            }
        }

        metrics
    }
}

/// Load the worksheet for display
///
/// The dashboard fails open: a read error is logged and shown as an empty
/// table rather than an error page.
pub fn load_or_empty(store: &dyn SheetStore, config: &AppConfig) -> Table {
    match store.read(&config.sheet_id, &config.worksheet) {
        Ok(table) => table,
        Err(e) => {
            log::warn!("could not load {}/{}: {}", config.sheet_id, config.worksheet, e);
            Table::default()
        }
    }
}

/// Count values of one column, most frequent first
///
/// Ties are broken alphabetically so the order is stable between renders.
/// Blank values are counted under `(blank)`.
pub fn value_counts<'a, F>(records: &'a [LogRecord], column: F) -> Vec<(String, usize)>
where
    F: Fn(&'a LogRecord) -> &'a str,
{
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in records {
        let value = column(record).trim();
        let key = if value.is_empty() { "(blank)" } else { value };
        *counts.entry(key).or_insert(0) += 1;
    }

    let mut counts: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}

pub fn category_counts(records: &[LogRecord]) -> Vec<(String, usize)> {
    value_counts(records, |r| r.category.as_str())
}

pub fn branch_counts(records: &[LogRecord]) -> Vec<(String, usize)> {
    value_counts(records, |r| r.branch.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::NewEntry;

    fn record(branch: &str, category: &str) -> LogRecord {
        NewEntry {
            branch: branch.into(),
            employee: "Ali".into(),
            category: category.into(),
            item: "Bolt".into(),
            note: String::new(),
        }
        .into_record("2025-01-01 09:00:00".into())
    }

    #[test]
    fn counts_follow_vocabulary_roles() {
        let records = vec![
            record("Main", "Missing"),
            record("Main", "Missing"),
            record("Branch 2", "New Request"),
            record("Branch 2", "Damaged"),
            record("Branch 3", "Maqan"),
        ];

        let english = Metrics::compute(&records, &Vocabulary::english());
        assert_eq!(
            english,
            Metrics {
                total: 5,
                missing: 2,
                new_requests: 1
            }
        );

        let somali = Metrics::compute(&records, &Vocabulary::somali());
        assert_eq!(somali.missing, 1);
        assert_eq!(somali.new_requests, 0);
    }

    #[test]
    fn empty_table_counts_zero() {
        assert_eq!(Metrics::compute(&[], &Vocabulary::english()), Metrics::default());
    }

    #[test]
    fn value_counts_are_ordered() {
        let records = vec![
            record("B", "x"),
            record("A", "x"),
            record("B", "y"),
            record("", "y"),
        ];
        assert_eq!(
            branch_counts(&records),
            vec![
                ("B".to_string(), 2),
                ("(blank)".to_string(), 1),
                ("A".to_string(), 1)
            ]
        );
        assert_eq!(
            category_counts(&records),
            vec![("x".to_string(), 2), ("y".to_string(), 2)]
        );
    }
}
