//! Process configuration
//!
//! Everything here is resolved once at start-up and handed to the rest of the
//! application by reference. The manager secret is only ever held as an
//! Argon2 hash.

use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_SHEET_ID: &str = "mareero";
const DEFAULT_WORKSHEET: &str = "Sheet1";
const DEFAULT_DATA_DIR: &str = "database";
const DEFAULT_BIND: &str = "127.0.0.1:3000";
const DEFAULT_SESSION_HOURS: u64 = 8;
const DEFAULT_REPORT_ROWS: usize = 15;
const DEFAULT_BRAND: &str = "Mareero";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("manager secret missing: set MAREERO_MANAGER_PASSWORD_HASH or MAREERO_MANAGER_PASSWORD")]
    MissingSecret,

    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: String, value: String },

    #[error("failed to hash manager secret: {0}")]
    Hash(String),

    #[error("failed to read vocabulary file {path}: {source}")]
    VocabularyIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse vocabulary file {path}: {source}")]
    VocabularyParse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Special meaning a category label can carry for the dashboard counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryRole {
    Missing,
    NewRequest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryLabel {
    pub label: String,
    #[serde(default)]
    pub role: Option<CategoryRole>,
}

/// Branch names and category labels offered by the forms
///
/// Different deployments have used different label sets for the same
/// categories, so the mapping from stored label to counter lives here rather
/// than in code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    pub branches: Vec<String>,
    pub categories: Vec<CategoryLabel>,
}

impl Vocabulary {
    pub fn english() -> Self {
        Self {
            branches: vec!["Main".into(), "Branch 2".into(), "Branch 3".into()],
            categories: vec![
                CategoryLabel {
                    label: "Missing".into(),
                    role: Some(CategoryRole::Missing),
                },
                CategoryLabel {
                    label: "New Request".into(),
                    role: Some(CategoryRole::NewRequest),
                },
                CategoryLabel {
                    label: "High Demand".into(),
                    role: None,
                },
                CategoryLabel {
                    label: "Damaged".into(),
                    role: None,
                },
            ],
        }
    }

    pub fn somali() -> Self {
        Self {
            branches: vec!["Main".into(), "Branch 2".into(), "Branch 3".into()],
            categories: vec![
                CategoryLabel {
                    label: "Maqan".into(),
                    role: Some(CategoryRole::Missing),
                },
                CategoryLabel {
                    label: "Dalab Cusub".into(),
                    role: Some(CategoryRole::NewRequest),
                },
            ],
        }
    }

    /// Load a vocabulary from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::VocabularyIo {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&data).map_err(|source| ConfigError::VocabularyParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolve `english`, `somali`, or a path to a JSON file
    pub fn resolve(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_lowercase().as_str() {
            "" | "english" => Ok(Self::english()),
            "somali" => Ok(Self::somali()),
            _ => Self::from_file(Path::new(value.trim())),
        }
    }

    /// Role carried by a stored category label, if any
    pub fn role_of(&self, category: &str) -> Option<CategoryRole> {
        self.categories
            .iter()
            .find(|c| c.label == category)
            .and_then(|c| c.role)
    }

    pub fn category_labels(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.label.as_str()).collect()
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::english()
    }
}

/// Runtime configuration of the dashboard
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub sheet_id: String,
    pub worksheet: String,
    pub data_dir: PathBuf,
    pub bind: String,
    /// Argon2 PHC string of the manager secret
    pub manager_password_hash: String,
    pub session_ttl: Duration,
    pub vocabulary: Vocabulary,
    pub report_row_limit: usize,
    pub brand: String,
}

impl AppConfig {
    /// Build a configuration around an already hashed secret, all other
    /// settings at their defaults
    pub fn with_password_hash(hash: impl Into<String>) -> Self {
        Self {
            sheet_id: DEFAULT_SHEET_ID.to_string(),
            worksheet: DEFAULT_WORKSHEET.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            bind: DEFAULT_BIND.to_string(),
            manager_password_hash: hash.into(),
            session_ttl: Duration::from_secs(DEFAULT_SESSION_HOURS * 60 * 60),
            vocabulary: Vocabulary::default(),
            report_row_limit: DEFAULT_REPORT_ROWS,
            brand: DEFAULT_BRAND.to_string(),
        }
    }

    /// Read the configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&std::env::vars().collect())
    }

    /// Read the configuration from an explicit variable map
    ///
    /// # Errors
    /// * `ConfigError::MissingSecret` if neither secret variable is set
    /// * `ConfigError::InvalidValue` for unparseable numbers
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |name: &str| vars.get(name).map(|v| v.trim()).filter(|v| !v.is_empty());

        let manager_password_hash = match (
            get("MAREERO_MANAGER_PASSWORD_HASH"),
            get("MAREERO_MANAGER_PASSWORD"),
        ) {
            (Some(hash), _) => hash.to_string(),
            (None, Some(plain)) => hash_secret(plain)?,
            (None, None) => return Err(ConfigError::MissingSecret),
        };

        let mut config = Self::with_password_hash(manager_password_hash);

        if let Some(v) = get("MAREERO_SHEET_ID") {
            config.sheet_id = v.to_string();
        }
        if let Some(v) = get("MAREERO_WORKSHEET") {
            config.worksheet = v.to_string();
        }
        if let Some(v) = get("MAREERO_DATA_DIR") {
            config.data_dir = PathBuf::from(v);
        }
        if let Some(v) = get("MAREERO_BIND") {
            config.bind = v.to_string();
        }
        if let Some(v) = get("MAREERO_SESSION_HOURS") {
            let hours: u64 = parse_var("MAREERO_SESSION_HOURS", v)?;
            config.session_ttl = Duration::from_secs(hours * 60 * 60);
        }
        if let Some(v) = get("MAREERO_VOCABULARY") {
            config.vocabulary = Vocabulary::resolve(v)?;
        }
        if let Some(v) = get("MAREERO_REPORT_ROWS") {
            config.report_row_limit = parse_var("MAREERO_REPORT_ROWS", v)?;
        }
        if let Some(v) = get("MAREERO_BRAND") {
            config.brand = v.to_string();
        }

        Ok(config)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        name: name.to_string(),
        value: value.to_string(),
    })
}

/// Hash a plaintext secret with Argon2id and a random salt
pub fn hash_secret(secret: &str) -> Result<String, ConfigError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ConfigError::Hash(e.to_string()))
}
