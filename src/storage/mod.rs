//! Storage module for formula sources and result sinks.
//!
//! The runner only talks to the two traits defined here:
//! - [`RecordSource`] supplies the dataset rows and the formula set
//! - [`RecordSink`] accepts result and log records and purges earlier runs
//!
//! Two implementations are provided:
//! - In-memory tables shared between handles ([`MemoryStore`])
//! - A directory of CSV files ([`csv::CsvStore`])

mod memory;

pub mod csv;

pub use self::csv::{CsvStore, CsvStoreConfig};
pub use memory::MemoryStore;

use crate::error::Result;
use crate::types::{DataRow, Formula, LogRecord, ResultRecord};

/// Read-only source of the dataset and the formula set.
pub trait RecordSource {
    /// Returns every dataset row, in source order.
    ///
    /// # Errors
    ///
    /// Returns an error if the rows cannot be read.
    fn load_dataset(&self) -> Result<Vec<DataRow>>;

    /// Returns every formula, in source order.
    ///
    /// # Errors
    ///
    /// Returns an error if the formulas cannot be read.
    fn load_formulas(&self) -> Result<Vec<Formula>>;
}

/// Append-only destination for result and log records.
///
/// Result batches are written inside a transaction so a failed flush
/// leaves no partial result set behind.
pub trait RecordSink {
    /// Deletes all result and log records tagged with `method`.
    ///
    /// Returns the number of records removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the purge could not be carried out.
    fn purge(&mut self, method: &str) -> Result<usize>;

    /// Opens a result transaction.
    ///
    /// Result batches appended until [`commit_results`](Self::commit_results)
    /// are undone together by [`rollback_results`](Self::rollback_results).
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction could not be opened.
    fn begin_results(&mut self) -> Result<()>;

    /// Appends one batch of result records.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch was rejected or could not be written.
    fn append_results(&mut self, records: &[ResultRecord]) -> Result<()>;

    /// Keeps every result batch appended since `begin_results`.
    ///
    /// # Errors
    ///
    /// Returns an error if the batches could not be made durable.
    fn commit_results(&mut self) -> Result<()>;

    /// Removes every result batch appended since `begin_results`.
    ///
    /// # Errors
    ///
    /// Returns an error if the earlier state could not be restored.
    fn rollback_results(&mut self) -> Result<()>;

    /// Appends log records.
    ///
    /// # Errors
    ///
    /// Returns an error if the records could not be written.
    fn append_logs(&mut self, records: &[LogRecord]) -> Result<()>;
}
