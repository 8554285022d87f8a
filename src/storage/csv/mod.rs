//! CSV-directory store.
//!
//! A store directory holds four files:
//!
//! - `data.csv` with columns `data_id,a,b,c,d`
//! - `formulas.csv` with columns `formula_id,expression,condition,false_expression`
//! - `results.csv` with columns `row_id,formula_id,method,value`
//! - `log.csv` with columns `formula_id,method,elapsed_secs`
//!
//! File names and the field delimiter are configurable through
//! [`CsvStoreConfig`].

mod parser;
mod store;

pub use parser::CsvParser;
pub use store::CsvStore;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VecformError};

/// Configuration for a CSV-directory store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvStoreConfig {
    /// Directory holding all four files (default: `.`).
    pub directory: PathBuf,
    /// Dataset file name (default: `data.csv`).
    pub data_file: String,
    /// Formula file name (default: `formulas.csv`).
    pub formulas_file: String,
    /// Result file name (default: `results.csv`).
    pub results_file: String,
    /// Log file name (default: `log.csv`).
    pub log_file: String,
    /// Field separator (default: ',').
    pub delimiter: char,
}

impl Default for CsvStoreConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            data_file: "data.csv".to_string(),
            formulas_file: "formulas.csv".to_string(),
            results_file: "results.csv".to_string(),
            log_file: "log.csv".to_string(),
            delimiter: ',',
        }
    }
}

impl CsvStoreConfig {
    /// Creates a config rooted at `directory` with default file names.
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            ..Self::default()
        }
    }

    /// Sets the dataset file name.
    #[must_use]
    pub fn with_data_file(mut self, name: impl Into<String>) -> Self {
        self.data_file = name.into();
        self
    }

    /// Sets the formula file name.
    #[must_use]
    pub fn with_formulas_file(mut self, name: impl Into<String>) -> Self {
        self.formulas_file = name.into();
        self
    }

    /// Sets the result file name.
    #[must_use]
    pub fn with_results_file(mut self, name: impl Into<String>) -> Self {
        self.results_file = name.into();
        self
    }

    /// Sets the log file name.
    #[must_use]
    pub fn with_log_file(mut self, name: impl Into<String>) -> Self {
        self.log_file = name.into();
        self
    }

    /// Sets the field delimiter.
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Path of the dataset file.
    #[must_use]
    pub fn data_path(&self) -> PathBuf {
        self.directory.join(&self.data_file)
    }

    /// Path of the formula file.
    #[must_use]
    pub fn formulas_path(&self) -> PathBuf {
        self.directory.join(&self.formulas_file)
    }

    /// Path of the result file.
    #[must_use]
    pub fn results_path(&self) -> PathBuf {
        self.directory.join(&self.results_file)
    }

    /// Path of the log file.
    #[must_use]
    pub fn log_path(&self) -> PathBuf {
        self.directory.join(&self.log_file)
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `delimiter` is not a single-byte ASCII character, or is a quote or newline
    /// - any file name is empty
    /// - two files share a name
    pub fn validate(&self) -> Result<()> {
        if !self.delimiter.is_ascii() || matches!(self.delimiter, '"' | '\n' | '\r') {
            return Err(VecformError::ConfigError(format!(
                "delimiter must be an ASCII character other than a quote or newline, got {:?}",
                self.delimiter
            )));
        }

        let names = [
            ("data_file", &self.data_file),
            ("formulas_file", &self.formulas_file),
            ("results_file", &self.results_file),
            ("log_file", &self.log_file),
        ];

        for (field, name) in names {
            if name.trim().is_empty() {
                return Err(VecformError::ConfigError(format!(
                    "{field} must not be empty"
                )));
            }
        }

        for (i, (field, name)) in names.iter().enumerate() {
            if let Some((other, _)) = names[i + 1..].iter().find(|(_, n)| n == name) {
                return Err(VecformError::ConfigError(format!(
                    "{field} and {other} both name {name}"
                )));
            }
        }

        Ok(())
    }
}
