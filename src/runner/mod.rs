//! Batch runner: evaluates every formula against the dataset and writes
//! the outcome to a sink.
//!
//! A run goes through four phases:
//!
//! 1. Load the dataset and the formulas from a [`RecordSource`]
//! 2. Purge earlier records carrying the same method tag
//! 3. Evaluate the formulas one at a time, timing each
//! 4. Flush result records in bounded batches inside one sink transaction,
//!    then the log records
//!
//! A formula that fails to evaluate is skipped and reported in the
//! [`RunSummary`]; it never aborts the run.

use std::time::Instant;

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Result, VecformError};
use crate::executor::vectorized::ColumnBatch;
use crate::executor::FormulaEvaluator;
use crate::storage::{RecordSink, RecordSource};
use crate::translate::translate_formula;
use crate::types::{Formula, FormulaId, LogRecord, ResultRecord};

/// Default number of result records per sink call.
pub const DEFAULT_RESULT_BATCH_SIZE: usize = 500;

/// Default method tag.
pub const DEFAULT_METHOD: &str = "vecform_arrow";

/// Configuration of a batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Tag attached to every written record and used as the purge key.
    pub method: String,
    /// Maximum number of result records per `append_results` call.
    pub result_batch_size: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            method: DEFAULT_METHOD.to_string(),
            result_batch_size: DEFAULT_RESULT_BATCH_SIZE,
        }
    }
}

impl RunnerConfig {
    /// Creates a new runner configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the method tag.
    #[must_use]
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    /// Sets the result batch size.
    #[must_use]
    pub fn with_result_batch_size(mut self, size: usize) -> Self {
        self.result_batch_size = size;
        self
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `method` is blank
    /// - `result_batch_size` is 0
    pub fn validate(&self) -> Result<()> {
        if self.method.trim().is_empty() {
            return Err(VecformError::ConfigError(
                "method must not be empty".to_string(),
            ));
        }

        if self.result_batch_size == 0 {
            return Err(VecformError::ConfigError(
                "result_batch_size must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// A formula skipped during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormulaFailure {
    pub formula_id: FormulaId,
    pub message: String,
}

/// Outcome of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of dataset rows.
    pub rows: usize,
    /// Formulas evaluated successfully, in source order.
    pub evaluated: Vec<FormulaId>,
    /// Formulas skipped, in source order.
    pub failed: Vec<FormulaFailure>,
    /// Records removed by the purge, or `None` if it failed.
    pub purged: Option<usize>,
    /// Result records committed by the sink.
    pub results_written: usize,
    /// Log records accepted by the sink.
    pub logs_written: usize,
    /// Messages of rejected sink writes.
    pub write_errors: Vec<String>,
}

impl RunSummary {
    /// Returns true if every formula evaluated and every write succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.write_errors.is_empty()
    }
}

/// Records produced by the evaluation phase, waiting to be flushed.
#[derive(Debug, Default)]
struct Accumulator {
    results: Vec<ResultRecord>,
    logs: Vec<LogRecord>,
}

/// Runs every formula of a source against its dataset.
#[derive(Debug, Clone)]
pub struct BatchRunner {
    config: RunnerConfig,
}

impl BatchRunner {
    /// Creates a runner with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the configuration is invalid.
    pub fn new(config: RunnerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Performs one full run.
    ///
    /// # Errors
    ///
    /// Returns an error only if the dataset or the formulas cannot be
    /// loaded. Formula failures and sink failures are reported in the
    /// returned summary.
    pub fn run<S, K>(&self, source: &S, sink: &mut K) -> Result<RunSummary>
    where
        S: RecordSource + ?Sized,
        K: RecordSink + ?Sized,
    {
        let rows = source.load_dataset()?;
        let batch = ColumnBatch::from_rows(&rows)?;
        drop(rows);
        let formulas = source.load_formulas()?;
        info!(
            "Loaded {} rows and {} formulas",
            batch.num_rows(),
            formulas.len()
        );

        let mut summary = RunSummary {
            rows: batch.num_rows(),
            ..RunSummary::default()
        };

        match sink.purge(&self.config.method) {
            Ok(removed) => {
                debug!("Purged {removed} records for method {}", self.config.method);
                summary.purged = Some(removed);
            }
            Err(e) => warn!("Could not purge method {}: {e}", self.config.method),
        }

        let accumulated = self.evaluate_all(&batch, &formulas, &mut summary);
        self.flush(sink, &accumulated, &mut summary);

        Ok(summary)
    }

    fn evaluate_all(
        &self,
        batch: &ColumnBatch,
        formulas: &[Formula],
        summary: &mut RunSummary,
    ) -> Accumulator {
        let evaluator = FormulaEvaluator::new(batch);
        let mut acc = Accumulator {
            results: Vec::with_capacity(batch.num_rows() * formulas.len()),
            logs: Vec::with_capacity(formulas.len()),
        };

        for formula in formulas {
            let translated = translate_formula(formula);
            debug!("Formula {} translated to {translated:?}", formula.id);

            let start = Instant::now();
            let values = match evaluator.evaluate(&translated) {
                Ok(values) => values,
                Err(e) => {
                    warn!("Skipping formula {}: {e}", formula.id);
                    summary.failed.push(FormulaFailure {
                        formula_id: formula.id,
                        message: e.to_string(),
                    });
                    continue;
                }
            };
            let elapsed = start.elapsed().as_secs_f64();
            info!(
                "Formula {} evaluated over {} rows in {elapsed:.6}s",
                formula.id,
                values.len()
            );

            acc.results.extend(
                batch
                    .row_ids()
                    .values()
                    .iter()
                    .zip(values.values().iter())
                    .map(|(&row_id, &value)| ResultRecord {
                        row_id,
                        formula_id: formula.id,
                        method: self.config.method.clone(),
                        value,
                    }),
            );
            acc.logs.push(LogRecord {
                formula_id: formula.id,
                method: self.config.method.clone(),
                elapsed_secs: elapsed,
            });
            summary.evaluated.push(formula.id);
        }

        acc
    }

    fn flush<K>(&self, sink: &mut K, acc: &Accumulator, summary: &mut RunSummary)
    where
        K: RecordSink + ?Sized,
    {
        if !acc.results.is_empty() {
            match self.write_results(sink, &acc.results) {
                Ok(()) => summary.results_written = acc.results.len(),
                Err(e) => {
                    error!(
                        "Result write of {} records failed, nothing kept: {e}",
                        acc.results.len()
                    );
                    summary.write_errors.push(e.to_string());
                }
            }
        }

        if acc.logs.is_empty() {
            return;
        }
        match sink.append_logs(&acc.logs) {
            Ok(()) => summary.logs_written = acc.logs.len(),
            Err(e) => {
                error!("Log write failed: {e}");
                summary.write_errors.push(e.to_string());
            }
        }
    }

    /// Writes all results in bounded batches inside one sink transaction.
    fn write_results<K>(&self, sink: &mut K, results: &[ResultRecord]) -> Result<()>
    where
        K: RecordSink + ?Sized,
    {
        sink.begin_results()?;
        for chunk in results.chunks(self.config.result_batch_size) {
            if let Err(e) = sink.append_results(chunk) {
                if let Err(rollback) = sink.rollback_results() {
                    error!("Result rollback failed: {rollback}");
                }
                return Err(e);
            }
        }
        sink.commit_results()
    }
}
