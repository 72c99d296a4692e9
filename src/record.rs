use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Column headers of the backing worksheet, in storage order
pub const HEADERS: [&str; 6] = ["Date", "Branch", "Employee", "Category", "Item", "Note"];

/// Timestamp format used for the `Date` column
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One staff-submitted inventory event
///
/// The `id` is assigned once when the record is created and survives every
/// edit, so rows can be matched up again after the grid has been reordered
/// or partially deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub id: Uuid,
    pub date: String,
    pub branch: String,
    pub employee: String,
    pub category: String,
    pub item: String,
    pub note: String,
}

impl LogRecord {
    /// Business columns in `HEADERS` order
    pub fn to_row(&self) -> [&str; 6] {
        [
            self.date.as_str(),
            self.branch.as_str(),
            self.employee.as_str(),
            self.category.as_str(),
            self.item.as_str(),
            self.note.as_str(),
        ]
    }
}

/// A worksheet snapshot as read from the backing store
///
/// `version` is bumped by the store on every successful write and is what
/// writers hand back to detect that someone else got there first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub version: u64,
    pub records: Vec<LogRecord>,
}

impl Table {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

/// Raw Entry Form input
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewEntry {
    #[serde(default)]
    pub branch: String,
    #[serde(default)]
    pub employee: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub item: String,
    #[serde(default)]
    pub note: String,
}

impl NewEntry {
    /// Check the required fields
    ///
    /// `employee` and `item` must contain something other than whitespace.
    /// Nothing else is validated.
    ///
    /// # Returns
    /// * `Result<(), String>` - The user-facing message on failure
    pub fn validate(&self) -> Result<(), String> {
        let missing: Vec<&str> = [("Employee", &self.employee), ("Item", &self.item)]
            .into_iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(format!("{} must not be empty", missing.join(" and ")))
        }
    }

    /// Turn validated input into a stored record with a fresh id
    pub fn into_record(self, date: String) -> LogRecord {
        LogRecord {
            id: Uuid::new_v4(),
            date,
            branch: self.branch.trim().to_string(),
            employee: self.employee.trim().to_string(),
            category: self.category.trim().to_string(),
            item: self.item.trim().to_string(),
            note: self.note.trim().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(employee: &str, item: &str) -> NewEntry {
        NewEntry {
            branch: "Main".into(),
            employee: employee.into(),
            category: "Missing".into(),
            item: item.into(),
            note: String::new(),
        }
    }

    #[test]
    fn validate_requires_employee_and_item() {
        assert!(entry("Ali", "Brake pad").validate().is_ok());
        assert_eq!(
            entry("", "Brake pad").validate().unwrap_err(),
            "Employee must not be empty"
        );
        assert_eq!(
            entry("Ali", "   ").validate().unwrap_err(),
            "Item must not be empty"
        );
        assert_eq!(
            entry(" ", "").validate().unwrap_err(),
            "Employee and Item must not be empty"
        );
    }

    #[test]
    fn into_record_trims_and_assigns_id() {
        let a = entry("  Ali ", " Oil filter ").into_record("2025-01-01 10:00:00".into());
        let b = entry("Ali", "Oil filter").into_record("2025-01-01 10:00:00".into());
        assert_eq!(a.employee, "Ali");
        assert_eq!(a.item, "Oil filter");
        assert_ne!(a.id, b.id);
        assert_eq!(a.to_row()[0], "2025-01-01 10:00:00");
    }
}
