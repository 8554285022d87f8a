//! In-memory store backed by shared tables.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{Result, VecformError};
use crate::storage::{RecordSink, RecordSource};
use crate::types::{DataRow, Formula, LogRecord, ResultRecord};

#[derive(Debug, Default)]
struct MemoryTables {
    rows: Vec<DataRow>,
    formulas: Vec<Formula>,
    results: Vec<ResultRecord>,
    logs: Vec<LogRecord>,
    result_calls: usize,
    /// Length of `results` when the open transaction began.
    result_mark: Option<usize>,
}

/// Dataset, formulas and output tables held in memory.
///
/// Clones share the same tables, so a test can hand one handle to the
/// runner and inspect the output through another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<MemoryTables>>,
    /// Rejects result batches larger than this many rows.
    max_rows_per_call: Option<usize>,
    /// Makes every purge fail.
    fail_purge: bool,
}

impl MemoryStore {
    /// Creates a store holding the given dataset and formulas.
    #[must_use]
    pub fn new(rows: Vec<DataRow>, formulas: Vec<Formula>) -> Self {
        let tables = MemoryTables {
            rows,
            formulas,
            ..MemoryTables::default()
        };
        Self {
            tables: Arc::new(Mutex::new(tables)),
            max_rows_per_call: None,
            fail_purge: false,
        }
    }

    /// Limits the number of rows accepted per `append_results` call.
    #[must_use]
    pub fn with_max_rows_per_call(mut self, limit: usize) -> Self {
        self.max_rows_per_call = Some(limit);
        self
    }

    /// Makes `purge` fail on this handle.
    #[must_use]
    pub fn with_failing_purge(mut self) -> Self {
        self.fail_purge = true;
        self
    }

    /// Appends result records directly, bypassing batch limits.
    pub fn insert_results(&self, records: impl IntoIterator<Item = ResultRecord>) {
        self.tables.lock().results.extend(records);
    }

    /// Returns a copy of the stored result records.
    #[must_use]
    pub fn results(&self) -> Vec<ResultRecord> {
        self.tables.lock().results.clone()
    }

    /// Returns a copy of the stored log records.
    #[must_use]
    pub fn logs(&self) -> Vec<LogRecord> {
        self.tables.lock().logs.clone()
    }

    /// Returns the number of accepted `append_results` calls.
    #[must_use]
    pub fn result_calls(&self) -> usize {
        self.tables.lock().result_calls
    }
}

impl RecordSource for MemoryStore {
    fn load_dataset(&self) -> Result<Vec<DataRow>> {
        Ok(self.tables.lock().rows.clone())
    }

    fn load_formulas(&self) -> Result<Vec<Formula>> {
        Ok(self.tables.lock().formulas.clone())
    }
}

impl RecordSink for MemoryStore {
    fn purge(&mut self, method: &str) -> Result<usize> {
        if self.fail_purge {
            return Err(VecformError::StorageError(format!(
                "Purge of method {method} rejected"
            )));
        }

        let mut tables = self.tables.lock();
        let before = tables.results.len() + tables.logs.len();
        tables.results.retain(|r| r.method != method);
        tables.logs.retain(|l| l.method != method);
        Ok(before - tables.results.len() - tables.logs.len())
    }

    fn begin_results(&mut self) -> Result<()> {
        let mut tables = self.tables.lock();
        if tables.result_mark.is_some() {
            return Err(VecformError::StorageError(
                "Result transaction already open".to_string(),
            ));
        }
        tables.result_mark = Some(tables.results.len());
        Ok(())
    }

    fn append_results(&mut self, records: &[ResultRecord]) -> Result<()> {
        if let Some(limit) = self.max_rows_per_call {
            if records.len() > limit {
                return Err(VecformError::BatchTooLarge {
                    rows: records.len(),
                    limit,
                });
            }
        }

        let mut tables = self.tables.lock();
        tables.results.extend_from_slice(records);
        tables.result_calls += 1;
        Ok(())
    }

    fn commit_results(&mut self) -> Result<()> {
        self.tables
            .lock()
            .result_mark
            .take()
            .map(|_| ())
            .ok_or_else(|| VecformError::StorageError("No result transaction open".to_string()))
    }

    fn rollback_results(&mut self) -> Result<()> {
        let mut tables = self.tables.lock();
        let mark = tables
            .result_mark
            .take()
            .ok_or_else(|| VecformError::StorageError("No result transaction open".to_string()))?;
        tables.results.truncate(mark);
        Ok(())
    }

    fn append_logs(&mut self, records: &[LogRecord]) -> Result<()> {
        self.tables.lock().logs.extend_from_slice(records);
        Ok(())
    }
}
