//! vecform - vectorized batch evaluation of stored formulas
//!
//! Formulas written in a small SQL-flavored dialect are translated into a
//! vectorized dialect, parsed into an expression tree and evaluated over
//! whole Arrow columns at once. Results are sanitized to finite values and
//! written to a sink together with per-formula timings.
//!
//! # Example
//!
//! ```
//! use vecform::{BatchRunner, DataRow, Formula, MemoryStore, RunnerConfig};
//!
//! let rows = vec![
//!     DataRow::new(1, 1.0, 10.0, 0.0, 5.0),
//!     DataRow::new(2, 2.0, 20.0, 1.0, 7.0),
//! ];
//! let formulas = vec![Formula::new(1, "a")
//!     .with_condition("c = 0")
//!     .with_false_expression("b")];
//!
//! let store = MemoryStore::new(rows, formulas);
//! let runner = BatchRunner::new(RunnerConfig::new().with_method("doc")).unwrap();
//! let summary = runner.run(&store, &mut store.clone()).unwrap();
//!
//! assert_eq!(summary.results_written, 2);
//! let values: Vec<f64> = store.results().iter().map(|r| r.value).collect();
//! assert_eq!(values, vec![1.0, 20.0]);
//! ```

pub mod error;
pub mod executor;
pub mod parser;
pub mod runner;
pub mod storage;
pub mod translate;
pub mod types;

pub use error::{Result, VecformError};
pub use executor::FormulaEvaluator;
pub use runner::{BatchRunner, FormulaFailure, RunSummary, RunnerConfig};
pub use storage::{CsvStore, CsvStoreConfig, MemoryStore, RecordSink, RecordSource};
pub use translate::{translate_formula, TranslatedFormula};
pub use types::{DataRow, Formula, LogRecord, ResultRecord};
