//! Command-line runner over a CSV store directory.
//!
//! # Usage
//!
//! ```bash
//! vecform --dir ./run --method vecform_arrow --batch-size 500
//! ```
//!
//! Set `RUST_LOG=debug` to see the translated text of every formula.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;
use log::{error, info, warn};

use vecform::runner::{DEFAULT_METHOD, DEFAULT_RESULT_BATCH_SIZE};
use vecform::{BatchRunner, CsvStore, CsvStoreConfig, RunnerConfig};

#[derive(Parser)]
#[command(name = "vecform")]
#[command(about = "Evaluate stored formulas over a dataset with vectorized kernels")]
#[command(version)]
struct Cli {
    /// Directory holding the dataset, formula, result and log files
    #[arg(long)]
    dir: PathBuf,

    /// Method tag attached to every written record
    #[arg(long, default_value = DEFAULT_METHOD)]
    method: String,

    /// Result records per sink call
    #[arg(long, default_value_t = DEFAULT_RESULT_BATCH_SIZE)]
    batch_size: usize,

    /// Dataset file name
    #[arg(long, default_value = "data.csv")]
    data: String,

    /// Formula file name
    #[arg(long, default_value = "formulas.csv")]
    formulas: String,

    /// Result file name
    #[arg(long, default_value = "results.csv")]
    results: String,

    /// Log file name
    #[arg(long, default_value = "log.csv")]
    log: String,

    /// Field delimiter
    #[arg(long, default_value_t = ',')]
    delimiter: char,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let store_config = CsvStoreConfig::new(cli.dir)
        .with_data_file(cli.data)
        .with_formulas_file(cli.formulas)
        .with_results_file(cli.results)
        .with_log_file(cli.log)
        .with_delimiter(cli.delimiter);
    let runner_config = RunnerConfig::new()
        .with_method(cli.method)
        .with_result_batch_size(cli.batch_size);

    let outcome = CsvStore::new(store_config).and_then(|store| {
        let runner = BatchRunner::new(runner_config)?;
        info!(
            "Running method {} over {} in batches of {}",
            runner.config().method,
            store.config().directory.display(),
            runner.config().result_batch_size
        );
        let mut sink = store.clone();
        runner.run(&store, &mut sink)
    });

    match outcome {
        Ok(summary) => {
            info!(
                "Evaluated {} of {} formulas over {} rows, wrote {} results and {} log records",
                summary.evaluated.len(),
                summary.evaluated.len() + summary.failed.len(),
                summary.rows,
                summary.results_written,
                summary.logs_written
            );
            for failure in &summary.failed {
                warn!("Formula {} skipped: {}", failure.formula_id, failure.message);
            }
            for message in &summary.write_errors {
                warn!("Write error: {message}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Run aborted: {e}");
            ExitCode::FAILURE
        }
    }
}
