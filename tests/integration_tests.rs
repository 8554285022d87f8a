//! Integration tests for full evaluation runs.

use std::collections::BTreeSet;

use vecform::{
    BatchRunner, DataRow, Formula, LogRecord, MemoryStore, RecordSink, ResultRecord, Result,
    RunnerConfig, VecformError,
};

fn dataset(n: i64) -> Vec<DataRow> {
    (1..=n)
        .map(|i| {
            let x = i as f64;
            DataRow::new(i, x, x * 0.5, (i % 3) as f64, -x)
        })
        .collect()
}

fn log_keys(logs: &[LogRecord]) -> BTreeSet<(i64, String)> {
    logs.iter()
        .map(|l| (l.formula_id, l.method.clone()))
        .collect()
}

fn values_for(results: &[ResultRecord], formula_id: i64) -> Vec<f64> {
    results
        .iter()
        .filter(|r| r.formula_id == formula_id)
        .map(|r| r.value)
        .collect()
}

// =============================================================================
// Memory Store Runs
// =============================================================================

mod memory_runs {
    use super::*;

    #[test]
    fn test_failure_isolation() {
        let formulas = vec![
            Formula::new(1, "a + b"),
            Formula::new(2, "a + * b"),
            Formula::new(3, "POWER(b, 2)")
                .with_condition("c = 0")
                .with_false_expression("d"),
        ];
        let store = MemoryStore::new(dataset(4), formulas);
        let runner = BatchRunner::new(RunnerConfig::default()).expect("runner");

        let summary = runner.run(&store, &mut store.clone()).expect("run");

        assert_eq!(summary.evaluated, vec![1, 3]);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].formula_id, 2);

        let results = store.results();
        assert_eq!(results.len(), 8);
        assert!(values_for(&results, 2).is_empty());
        assert_eq!(values_for(&results, 1), vec![1.5, 3.0, 4.5, 6.0]);
        // c = i % 3, so only row 3 has c == 0.
        assert_eq!(values_for(&results, 3), vec![-1.0, -2.0, 2.25, -4.0]);

        let logged: Vec<i64> = store.logs().iter().map(|l| l.formula_id).collect();
        assert_eq!(logged, vec![1, 3]);
    }

    #[test]
    fn test_row_cardinality() {
        let formulas = vec![Formula::new(1, "a"), Formula::new(2, "SQRT(ABS(d))")];
        let store = MemoryStore::new(dataset(37), formulas);
        let runner = BatchRunner::new(RunnerConfig::default()).expect("runner");

        runner.run(&store, &mut store.clone()).expect("run");

        let results = store.results();
        for formula_id in [1, 2] {
            let row_ids: Vec<i64> = results
                .iter()
                .filter(|r| r.formula_id == formula_id)
                .map(|r| r.row_id)
                .collect();
            assert_eq!(row_ids, (1..=37).collect::<Vec<_>>());
        }
        assert!(results.iter().all(|r| r.value.is_finite()));
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let formulas = vec![
            Formula::new(1, "EXP(a) / b"),
            Formula::new(2, "ROUND(a / 3, 2)").with_condition("a > 2 OR c <> 1"),
            Formula::new(3, "LN(c)"),
        ];
        let store = MemoryStore::new(dataset(12), formulas);
        let runner = BatchRunner::new(RunnerConfig::new().with_method("rerun")).expect("runner");

        let first = runner.run(&store, &mut store.clone()).expect("first run");
        let results_after_first = store.results();
        let logs_after_first = store.logs();

        let second = runner.run(&store, &mut store.clone()).expect("second run");

        assert_eq!(second.purged, Some(results_after_first.len() + logs_after_first.len()));
        assert_eq!(first.results_written, second.results_written);
        assert_eq!(store.results(), results_after_first);
        assert_eq!(log_keys(&store.logs()), log_keys(&logs_after_first));
        assert_eq!(store.logs().len(), 3);
    }

    #[test]
    fn test_other_methods_survive_purge() {
        let store = MemoryStore::new(dataset(2), vec![Formula::new(1, "a")]);
        let foreign = ResultRecord {
            row_id: 1,
            formula_id: 1,
            method: "sql_engine".into(),
            value: 99.0,
        };
        store.insert_results(vec![foreign.clone()]);
        let runner = BatchRunner::new(RunnerConfig::new().with_method("vec")).expect("runner");

        runner.run(&store, &mut store.clone()).expect("run");
        runner.run(&store, &mut store.clone()).expect("rerun");

        let results = store.results();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0], foreign);
    }

    #[test]
    fn test_batches_respect_sink_row_ceiling() {
        let store = MemoryStore::new(dataset(601), vec![Formula::new(1, "a"), Formula::new(2, "b")])
            .with_max_rows_per_call(500);
        let runner = BatchRunner::new(RunnerConfig::default()).expect("runner");

        let summary = runner.run(&store, &mut store.clone()).expect("run");

        assert!(summary.write_errors.is_empty());
        assert_eq!(summary.results_written, 1202);
        assert_eq!(store.result_calls(), 3);
    }

    #[test]
    fn test_oversized_batches_are_reported() {
        let store =
            MemoryStore::new(dataset(10), vec![Formula::new(1, "a")]).with_max_rows_per_call(5);
        let runner =
            BatchRunner::new(RunnerConfig::new().with_result_batch_size(8)).expect("runner");

        let summary = runner.run(&store, &mut store.clone()).expect("run");

        assert_eq!(summary.write_errors.len(), 1);
        assert!(summary.write_errors[0].contains("exceeds"));
        assert_eq!(summary.logs_written, 1);
        assert!(store.results().is_empty());
    }

    #[test]
    fn test_purge_failure_does_not_abort() {
        let store = MemoryStore::new(dataset(3), vec![Formula::new(1, "a")]);
        let mut sink = store.clone().with_failing_purge();
        let runner = BatchRunner::new(RunnerConfig::default()).expect("runner");

        let summary = runner.run(&store, &mut sink).expect("run");

        assert_eq!(summary.purged, None);
        assert_eq!(summary.results_written, 3);
        assert_eq!(store.results().len(), 3);
    }
}

/// Sink that accepts the first result batch and rejects every later one.
struct RejectSecondBatch<K> {
    inner: K,
    batches: usize,
}

impl<K> RejectSecondBatch<K> {
    fn new(inner: K) -> Self {
        Self { inner, batches: 0 }
    }
}

impl<K: RecordSink> RecordSink for RejectSecondBatch<K> {
    fn purge(&mut self, method: &str) -> Result<usize> {
        self.inner.purge(method)
    }

    fn begin_results(&mut self) -> Result<()> {
        self.inner.begin_results()
    }

    fn append_results(&mut self, records: &[ResultRecord]) -> Result<()> {
        self.batches += 1;
        if self.batches >= 2 {
            return Err(VecformError::StorageError("connection lost".into()));
        }
        self.inner.append_results(records)
    }

    fn commit_results(&mut self) -> Result<()> {
        self.inner.commit_results()
    }

    fn rollback_results(&mut self) -> Result<()> {
        self.inner.rollback_results()
    }

    fn append_logs(&mut self, records: &[LogRecord]) -> Result<()> {
        self.inner.append_logs(records)
    }
}

// =============================================================================
// Partial Flush Rollback
// =============================================================================

mod partial_flush {
    use super::*;

    #[test]
    fn test_rejected_second_batch_leaves_no_results() {
        let formulas = vec![Formula::new(1, "a"), Formula::new(2, "b * 2")];
        let store = MemoryStore::new(dataset(4), formulas);
        store.insert_results(vec![ResultRecord {
            row_id: 1,
            formula_id: 1,
            method: "other".into(),
            value: 7.0,
        }]);
        let runner =
            BatchRunner::new(RunnerConfig::new().with_result_batch_size(3)).expect("runner");

        let mut sink = RejectSecondBatch::new(store.clone());
        let summary = runner.run(&store, &mut sink).expect("run");

        assert_eq!(sink.batches, 2);
        assert_eq!(summary.evaluated, vec![1, 2]);
        assert_eq!(summary.results_written, 0);
        assert_eq!(summary.write_errors.len(), 1);
        assert!(summary.write_errors[0].contains("connection lost"));
        assert_eq!(summary.logs_written, 2);

        let results = store.results();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].method, "other");
        assert_eq!(store.logs().len(), 2);
    }

    #[test]
    fn test_rerun_after_rollback_writes_full_set() {
        let store = MemoryStore::new(dataset(4), vec![Formula::new(1, "a"), Formula::new(2, "b")]);
        let runner =
            BatchRunner::new(RunnerConfig::new().with_result_batch_size(3)).expect("runner");

        runner
            .run(&store, &mut RejectSecondBatch::new(store.clone()))
            .expect("failed run");
        let summary = runner.run(&store, &mut store.clone()).expect("run");

        assert!(summary.is_clean());
        assert_eq!(store.results().len(), 8);
        assert_eq!(store.logs().len(), 2);
    }
}

// =============================================================================
// CSV Store Runs
// =============================================================================

mod csv_runs {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;
    use vecform::{CsvStore, CsvStoreConfig};

    fn write_inputs(dir: &Path) {
        std::fs::write(
            dir.join("data.csv"),
            "data_id,a,b,c,d\n\
             1,4,2,0,-1\n\
             2,9,3,1,2.5\n\
             3,n/a,0,2,\n",
        )
        .expect("write data");
        std::fs::write(
            dir.join("formulas.csv"),
            "formula_id,expression,condition,false_expression\n\
             10,SQRT(a) + b,,\n\
             11,a / b,c = 0 OR c = 2,-1\n\
             12,FLOOR(a),,\n\
             13,EXP(a * 1000),c <> 1,\n",
        )
        .expect("write formulas");
    }

    #[test]
    fn test_end_to_end_run() {
        let temp = TempDir::new().expect("temp dir");
        write_inputs(temp.path());

        let store = CsvStore::new(CsvStoreConfig::new(temp.path())).expect("store");
        let runner = BatchRunner::new(RunnerConfig::new().with_method("csv")).expect("runner");
        let summary = runner.run(&store, &mut store.clone()).expect("run");

        assert_eq!(summary.rows, 3);
        assert_eq!(summary.evaluated, vec![10, 11, 13]);
        assert_eq!(summary.failed[0].formula_id, 12);

        let results = store.read_results().expect("read results");
        assert_eq!(results.len(), 9);
        assert_eq!(values_for(&results, 10), vec![4.0, 6.0, 0.0]);
        // Row 3: a is missing so 0 / 0 is NaN, sanitized to 0.
        assert_eq!(values_for(&results, 11), vec![2.0, -1.0, 0.0]);
        assert_eq!(values_for(&results, 13), vec![700f64.exp(), 0.0, 1.0]);

        let logs = store.read_logs().expect("read logs");
        assert_eq!(logs.len(), 3);
        assert!(logs.iter().all(|l| l.method == "csv"));
    }

    #[test]
    fn test_rerun_replaces_previous_output() {
        let temp = TempDir::new().expect("temp dir");
        write_inputs(temp.path());

        let store = CsvStore::new(CsvStoreConfig::new(temp.path())).expect("store");
        let runner = BatchRunner::new(RunnerConfig::new().with_result_batch_size(2))
            .expect("runner");

        runner.run(&store, &mut store.clone()).expect("first run");
        let first = store.read_results().expect("read results");
        let first_logs = store.read_logs().expect("read logs");

        runner.run(&store, &mut store.clone()).expect("second run");
        assert_eq!(store.read_results().expect("read results"), first);
        assert_eq!(
            log_keys(&store.read_logs().expect("read logs")),
            log_keys(&first_logs)
        );
    }

    #[test]
    fn test_rejected_batch_truncates_results_file() {
        let temp = TempDir::new().expect("temp dir");
        write_inputs(temp.path());

        let store = CsvStore::new(CsvStoreConfig::new(temp.path())).expect("store");
        let runner = BatchRunner::new(RunnerConfig::new().with_result_batch_size(2))
            .expect("runner");

        runner.run(&store, &mut store.clone()).expect("first run");
        let committed = store.read_results().expect("read results");
        assert_eq!(committed.len(), 9);

        let mut sink = RejectSecondBatch::new(store.clone());
        let summary = runner.run(&store, &mut sink).expect("second run");

        assert_eq!(summary.results_written, 0);
        assert_eq!(summary.write_errors.len(), 1);
        // The purge removed the first run's rows and the rollback removed the new ones.
        assert!(store.read_results().expect("read results").is_empty());
        assert_eq!(store.read_logs().expect("read logs").len(), 3);
    }

    #[test]
    fn test_missing_dataset_aborts_run() {
        let temp = TempDir::new().expect("temp dir");
        let store = CsvStore::new(CsvStoreConfig::new(temp.path())).expect("store");
        let runner = BatchRunner::new(RunnerConfig::default()).expect("runner");

        assert!(runner.run(&store, &mut store.clone()).is_err());
        assert!(!temp.path().join("results.csv").exists());
    }
}
