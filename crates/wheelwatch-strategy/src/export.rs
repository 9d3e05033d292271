use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::StrategyRecord;

/// Format version written by [`ExportDocument::new`] and the only one accepted
/// on import.
pub const EXPORT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ImportError {
    #[error("import is not valid JSON: {0}")]
    Json(String),
    #[error("unsupported export version {0:?}, expected {EXPORT_VERSION}")]
    UnsupportedVersion(Option<u64>),
    #[error("import field `{0}` is missing or not a list")]
    NotAList(&'static str),
    #[error("import is malformed: {0}")]
    Malformed(String),
}

/// Full backup of a session: spins plus strategies with their performance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub version: u32,
    /// Informational only; not checked on import.
    #[serde(default)]
    pub exported_at: Option<DateTime<Utc>>,
    /// Spin values, newest first.
    pub results: Vec<i64>,
    pub strategies: Vec<StrategyRecord>,
}

impl ExportDocument {
    pub fn new(results: Vec<i64>, strategies: Vec<StrategyRecord>) -> Self {
        Self {
            version: EXPORT_VERSION,
            exported_at: Some(Utc::now()),
            results,
            strategies,
        }
    }

    pub fn to_json(&self) -> Result<String, ImportError> {
        serde_json::to_string_pretty(self).map_err(|e| ImportError::Malformed(e.to_string()))
    }

    /// Parse and validate an export. Nothing partial is ever returned.
    ///
    /// Out-of-range spin values are kept here; they are dropped when the
    /// results replace the stream.
    pub fn parse(json: &str) -> Result<Self, ImportError> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| ImportError::Json(e.to_string()))?;

        let version = value.get("version").and_then(serde_json::Value::as_u64);
        if version != Some(u64::from(EXPORT_VERSION)) {
            return Err(ImportError::UnsupportedVersion(version));
        }
        for field in ["results", "strategies"] {
            if !value.get(field).is_some_and(serde_json::Value::is_array) {
                return Err(ImportError::NotAList(field));
            }
        }

        serde_json::from_value(value).map_err(|e| ImportError::Malformed(e.to_string()))
    }
}
