//! Master code store module
//!
//! Persists the keypad master code as a single JSON record and keeps an
//! in-memory copy that is authoritative at runtime. The record file is
//! loaded once at startup and overwritten on every successful change.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

use crate::logger;

/// Persisted record - serialized to the code file as JSON
#[derive(Debug, Serialize, Deserialize)]
struct CodeRecord {
    code: String,
}

/// Errors reported by [`CodeStore::change`]
#[derive(Debug, PartialEq, Eq)]
pub enum ChangeError {
    /// The supplied current code does not match the stored one
    CurrentMismatch,
    /// The record could not be serialized or written
    Persist(String),
}

/// Master code store
///
/// An empty code means "not set". The current-code check and the write
/// share one lock, so the file and the in-memory copy stay consistent.
pub struct CodeStore {
    /// Path of the JSON record file
    path: PathBuf,
    /// Current master code
    code: RwLock<String>,
}

impl CodeStore {
    /// Open the store, loading the record file if present
    ///
    /// A missing or malformed record leaves the code unset; the device
    /// then starts in first-time setup mode.
    pub fn open(path: &str) -> Self {
        let path = PathBuf::from(path);
        let code = Self::load_record(&path).unwrap_or_default();

        if code.is_empty() {
            logger::log_code_not_set();
        } else {
            logger::log_code_loaded(code.len());
        }

        Self {
            path,
            code: RwLock::new(code),
        }
    }

    /// Load the master code from the record file
    fn load_record(path: &Path) -> Option<String> {
        if !path.exists() {
            return None;
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                logger::log_error(&format!(
                    "Failed to read code file {}: {}",
                    path.display(),
                    e
                ));
                return None;
            }
        };

        match serde_json::from_str::<CodeRecord>(&content) {
            Ok(record) => Some(record.code),
            Err(e) => {
                logger::log_error(&format!(
                    "Failed to parse code file {}: {}",
                    path.display(),
                    e
                ));
                None
            }
        }
    }

    /// Whether a master code is set, and its digit count
    pub async fn status(&self) -> (bool, usize) {
        let code = self.code.read().await;
        (!code.is_empty(), code.len())
    }

    /// Replace the master code after verifying the current one
    ///
    /// The current-code check is skipped while no code is set
    /// (first-time setup). The record file is written before the
    /// in-memory copy is updated; on any failure memory is untouched.
    pub async fn change(&self, current: &str, new_code: &str) -> Result<(), ChangeError> {
        let mut code = self.code.write().await;

        if !code.is_empty() && current != code.as_str() {
            return Err(ChangeError::CurrentMismatch);
        }

        let record = CodeRecord {
            code: new_code.to_string(),
        };
        let content = serde_json::to_string(&record)
            .map_err(|e| ChangeError::Persist(format!("Failed to serialize code record: {e}")))?;

        fs::write(&self.path, content).map_err(|e| {
            ChangeError::Persist(format!(
                "Failed to write code file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        *code = new_code.to_string();
        Ok(())
    }

    /// Path of the record file
    pub fn path(&self) -> &Path {
        &self.path
    }
}
