//! `RecordSource` and `RecordSink` over a directory of CSV files.

use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::Path;

use log::debug;
use serde::Deserialize;

use crate::error::{Result, VecformError};
use crate::storage::csv::{CsvParser, CsvStoreConfig};
use crate::storage::{RecordSink, RecordSource};
use crate::types::{DataRow, Formula, LogRecord, ResultRecord, RowId};

/// Row layout of the dataset file. Unparseable numbers read as missing.
#[derive(Debug, Deserialize)]
struct DataLine {
    data_id: RowId,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    a: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    b: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    c: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    d: Option<f64>,
}

impl From<DataLine> for DataRow {
    fn from(line: DataLine) -> Self {
        DataRow {
            id: line.data_id,
            fields: [line.a, line.b, line.c, line.d],
        }
    }
}

/// Store backed by the CSV files of one directory.
#[derive(Debug, Clone)]
pub struct CsvStore {
    config: CsvStoreConfig,
    parser: CsvParser,
    /// Result file length when the open transaction began.
    pending_results: Option<u64>,
}

impl CsvStore {
    /// Opens a store over the configured directory.
    ///
    /// Files are only touched when the store is used.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the configuration is invalid.
    pub fn new(config: CsvStoreConfig) -> Result<Self> {
        config.validate()?;
        let parser = CsvParser::new(config.delimiter);
        Ok(Self {
            config,
            parser,
            pending_results: None,
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &CsvStoreConfig {
        &self.config
    }

    /// Reads back all result records.
    ///
    /// # Errors
    ///
    /// Returns an error if the result file exists but cannot be parsed.
    pub fn read_results(&self) -> Result<Vec<ResultRecord>> {
        self.parser
            .read_records_if_exists(&self.config.results_path())
    }

    /// Reads back all log records.
    ///
    /// # Errors
    ///
    /// Returns an error if the log file exists but cannot be parsed.
    pub fn read_logs(&self) -> Result<Vec<LogRecord>> {
        self.parser.read_records_if_exists(&self.config.log_path())
    }

    fn take_pending(&mut self) -> Result<u64> {
        self.pending_results
            .take()
            .ok_or_else(|| VecformError::StorageError("No result transaction open".to_string()))
    }
}

/// Length of the file at `path`, or 0 if it does not exist.
fn file_len(path: &Path) -> Result<u64> {
    match fs::metadata(path) {
        Ok(meta) => Ok(meta.len()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(0),
        Err(e) => Err(e.into()),
    }
}

impl RecordSource for CsvStore {
    fn load_dataset(&self) -> Result<Vec<DataRow>> {
        let lines: Vec<DataLine> = self.parser.read_records(&self.config.data_path())?;
        Ok(lines.into_iter().map(DataRow::from).collect())
    }

    fn load_formulas(&self) -> Result<Vec<Formula>> {
        self.parser.read_records(&self.config.formulas_path())
    }
}

impl RecordSink for CsvStore {
    fn purge(&mut self, method: &str) -> Result<usize> {
        let mut removed = 0;

        let results_path = self.config.results_path();
        if results_path.exists() {
            let mut results = self.read_results()?;
            let before = results.len();
            results.retain(|r| r.method != method);
            removed += before - results.len();
            self.parser.rewrite_records(&results_path, &results)?;
        }

        let log_path = self.config.log_path();
        if log_path.exists() {
            let mut logs = self.read_logs()?;
            let before = logs.len();
            logs.retain(|l| l.method != method);
            removed += before - logs.len();
            self.parser.rewrite_records(&log_path, &logs)?;
        }

        debug!("Purged {removed} records tagged {method}");
        Ok(removed)
    }

    fn begin_results(&mut self) -> Result<()> {
        if self.pending_results.is_some() {
            return Err(VecformError::StorageError(
                "Result transaction already open".to_string(),
            ));
        }
        self.pending_results = Some(file_len(&self.config.results_path())?);
        Ok(())
    }

    fn append_results(&mut self, records: &[ResultRecord]) -> Result<()> {
        self.parser
            .append_records(&self.config.results_path(), records)
    }

    fn commit_results(&mut self) -> Result<()> {
        self.take_pending()?;
        let path = self.config.results_path();
        if path.exists() {
            OpenOptions::new().append(true).open(&path)?.sync_data()?;
        }
        Ok(())
    }

    fn rollback_results(&mut self) -> Result<()> {
        let len = self.take_pending()?;
        let path = self.config.results_path();
        if path.exists() {
            OpenOptions::new().write(true).open(&path)?.set_len(len)?;
            debug!("Results file truncated back to {len} bytes");
        }
        Ok(())
    }

    fn append_logs(&mut self, records: &[LogRecord]) -> Result<()> {
        self.parser.append_records(&self.config.log_path(), records)
    }
}
