//! Directory-wide conversion batches: a shared-cursor work queue drained by
//! a bounded pool of cooperative workers.
//!
//! Every worker pulls from the same atomic cursor, so each task is claimed
//! exactly once no matter how the pool is sized. A task's failure is
//! recorded and never aborts its siblings; the batch is best-effort with
//! error collection, not fail-fast.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Result, UsdError};
use crate::format;
use crate::invoker::Converter;

/// One single-file conversion unit derived from one discovered input path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionTask {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl ConversionTask {
    /// Task whose output sits beside the input with the counterpart
    /// extension.
    pub fn sibling(input: impl Into<PathBuf>) -> Result<Self> {
        let input = input.into();
        let output = format::counterpart_path(&input)?;
        Ok(Self { input, output })
    }

    /// Task whose output lands under `dir` instead of beside the input
    /// (preview mode).
    pub fn into_dir(input: impl Into<PathBuf>, dir: &Path) -> Result<Self> {
        let input = input.into();
        let output = format::preview_path(&input, dir)?;
        Ok(Self { input, output })
    }
}

/// Result of one completed task, successful or not.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionOutcome {
    pub input: PathBuf,
    pub output: PathBuf,
    /// `None` on success, the tool's diagnostic otherwise.
    pub error: Option<String>,
    pub duration: Duration,
}

impl ConversionOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate over a whole batch; every task is accounted for exactly once:
/// `succeeded + failed + not_attempted == total`.
#[derive(Debug, Serialize)]
pub struct BatchResult {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Tasks never claimed because cancellation was requested first.
    pub not_attempted: usize,
    pub elapsed: Duration,
    pub failures: Vec<ConversionOutcome>,
}

impl BatchResult {
    fn empty() -> Self {
        Self {
            total: 0,
            succeeded: 0,
            failed: 0,
            not_attempted: 0,
            elapsed: Duration::ZERO,
            failures: Vec::new(),
        }
    }
}

/// Cooperative cancellation handle shared between the batch driver and its
/// host.
///
/// Workers observe the flag at the claim point: in-flight conversions are
/// allowed to finish, nothing new is claimed after `cancel()`.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// One completion notification. `completed` counts every finished task
/// regardless of outcome, so the increments sum to `total` over an
/// uncancelled batch.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub completed: usize,
    pub total: usize,
    /// The finished task's output path; hosts typically render it relative
    /// to the batch root.
    pub output: PathBuf,
}

/// Observer seam for progress. The host projects events onto whatever UI
/// exists (progress bar, log lines, nothing); the scheduler does not care.
pub trait ProgressSink: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn report(&self, event: ProgressEvent) {
        self(event)
    }
}

/// Drain `tasks` with up to `workers` concurrent converter invocations.
///
/// Each worker loops: observe the cancel token, atomically claim the next
/// index, convert, record the outcome, report progress exactly once. The
/// call resolves only after every worker has exhausted the queue (or seen
/// the cancel flag). Surplus workers beyond `tasks.len()` would find the
/// queue empty immediately, so the pool is clamped to the task count.
pub async fn run_batch(
    converter: &dyn Converter,
    tasks: &[ConversionTask],
    workers: usize,
    cancel: &CancelToken,
    progress: &dyn ProgressSink,
) -> Result<BatchResult> {
    if workers == 0 {
        return Err(UsdError::config("worker count must be at least 1"));
    }

    let total = tasks.len();
    if total == 0 {
        return Ok(BatchResult::empty());
    }

    let started = Instant::now();
    let cursor = AtomicUsize::new(0);
    let completed = AtomicUsize::new(0);
    let outcomes: Mutex<Vec<ConversionOutcome>> = Mutex::new(Vec::with_capacity(total));

    let pool = workers.min(total);
    info!(total, workers = pool, "starting conversion batch");

    let futures: Vec<_> = (0..pool)
        .map(|id| {
            let cursor = &cursor;
            let completed = &completed;
            let outcomes = &outcomes;
            async move {
                loop {
                    // The claim point doubles as the cancellation check:
                    // in-flight conversions finish, nothing new starts.
                    if cancel.is_cancelled() {
                        debug!(worker = id, "cancellation observed, stopping");
                        break;
                    }
                    let index = cursor.fetch_add(1, Ordering::SeqCst);
                    if index >= total {
                        break;
                    }

                    let task = &tasks[index];
                    let attempt = Instant::now();
                    let result = converter.convert(&task.input, &task.output).await;
                    let outcome = ConversionOutcome {
                        input: task.input.clone(),
                        output: task.output.clone(),
                        error: result.err().map(|err| err.to_string()),
                        duration: attempt.elapsed(),
                    };
                    if let Some(diagnostic) = &outcome.error {
                        warn!(input = %task.input.display(), %diagnostic, "conversion failed");
                    }

                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    progress.report(ProgressEvent {
                        completed: done,
                        total,
                        output: task.output.clone(),
                    });
                    outcomes.lock().unwrap().push(outcome);
                }
            }
        })
        .collect();
    join_all(futures).await;

    let outcomes = outcomes.into_inner().unwrap();
    let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
    let failed = outcomes.len() - succeeded;
    let result = BatchResult {
        total,
        succeeded,
        failed,
        not_attempted: total - succeeded - failed,
        elapsed: started.elapsed(),
        failures: outcomes.into_iter().filter(|o| !o.is_success()).collect(),
    };

    info!(
        total = result.total,
        succeeded = result.succeeded,
        failed = result.failed,
        not_attempted = result.not_attempted,
        "conversion batch finished"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoker::ScriptedConverter;

    fn tree_with_inputs(names: &[&str]) -> (tempfile::TempDir, Vec<ConversionTask>) {
        let dir = tempfile::tempdir().unwrap();
        let tasks = names
            .iter()
            .map(|name| {
                let input = dir.path().join(name);
                std::fs::write(&input, name.as_bytes()).unwrap();
                ConversionTask::sibling(input).unwrap()
            })
            .collect();
        (dir, tasks)
    }

    fn collecting_sink(events: Arc<Mutex<Vec<ProgressEvent>>>) -> impl Fn(ProgressEvent) + Send + Sync {
        move |event| events.lock().unwrap().push(event)
    }

    #[tokio::test]
    async fn zero_workers_is_a_configuration_error() {
        let converter = ScriptedConverter::new();
        let err = run_batch(&converter, &[], 0, &CancelToken::new(), &|_: ProgressEvent| {})
            .await
            .unwrap_err();
        assert!(matches!(err, UsdError::Config { .. }));
    }

    #[tokio::test]
    async fn zero_tasks_returns_the_empty_result() {
        let converter = ScriptedConverter::new();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = collecting_sink(events.clone());

        let result = run_batch(&converter, &[], 4, &CancelToken::new(), &sink)
            .await
            .unwrap();

        assert_eq!(result.total, 0);
        assert_eq!(result.succeeded, 0);
        assert_eq!(result.failed, 0);
        assert!(result.failures.is_empty());
        assert!(events.lock().unwrap().is_empty());
        assert_eq!(converter.calls(), 0);
    }

    #[tokio::test]
    async fn every_task_reports_exactly_once() {
        let (_dir, tasks) = tree_with_inputs(&["a.usdc", "b.usdc", "c.usdc", "d.usdc", "e.usdc"]);
        let converter = ScriptedConverter::new();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = collecting_sink(events.clone());

        let result = run_batch(&converter, &tasks, 2, &CancelToken::new(), &sink)
            .await
            .unwrap();

        assert_eq!(result.total, 5);
        assert_eq!(result.succeeded + result.failed, 5);
        assert_eq!(converter.calls(), 5);

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 5);
        // Completion counts are each emitted once and reach the total.
        let mut counts: Vec<usize> = events.iter().map(|e| e.completed).collect();
        counts.sort_unstable();
        assert_eq!(counts, vec![1, 2, 3, 4, 5]);
        assert!(events.iter().all(|e| e.total == 5));
    }

    #[tokio::test]
    async fn surplus_workers_behave_like_a_matched_pool() {
        let (_dir, tasks) = tree_with_inputs(&["a.usdc", "b.usdc"]);
        let converter = ScriptedConverter::new();

        let result = run_batch(&converter, &tasks, 16, &CancelToken::new(), &|_: ProgressEvent| {})
            .await
            .unwrap();

        assert_eq!(result.total, 2);
        assert_eq!(result.succeeded, 2);
        assert_eq!(converter.calls(), 2);
    }

    #[tokio::test]
    async fn one_failure_does_not_abort_the_batch() {
        let (dir, tasks) = tree_with_inputs(&["a.usdc", "b.usdc", "c.usdc"]);
        let converter = ScriptedConverter::new().fail_on("b.usdc");

        let result = run_batch(&converter, &tasks, 2, &CancelToken::new(), &|_: ProgressEvent| {})
            .await
            .unwrap();

        assert_eq!(result.succeeded, 2);
        assert_eq!(result.failed, 1);
        assert_eq!(result.failures.len(), 1);
        assert!(result.failures[0].input.ends_with("b.usdc"));
        assert!(!result.failures[0].error.as_deref().unwrap().is_empty());

        // The siblings' outputs made it to disk.
        assert!(dir.path().join("a.usda").is_file());
        assert!(!dir.path().join("b.usda").exists());
        assert!(dir.path().join("c.usda").is_file());
    }

    #[tokio::test]
    async fn rerunning_a_batch_is_idempotent() {
        let (dir, tasks) = tree_with_inputs(&["a.usdc", "b.usdc"]);
        let converter = ScriptedConverter::new();

        let first = run_batch(&converter, &tasks, 2, &CancelToken::new(), &|_: ProgressEvent| {})
            .await
            .unwrap();
        let second = run_batch(&converter, &tasks, 2, &CancelToken::new(), &|_: ProgressEvent| {})
            .await
            .unwrap();

        assert_eq!(first.succeeded, second.succeeded);
        assert_eq!(first.failed, second.failed);
        // Inputs are never mutated by conversion.
        assert_eq!(std::fs::read(dir.path().join("a.usdc")).unwrap(), b"a.usdc");
    }

    #[tokio::test]
    async fn cancellation_gates_new_claims() {
        let (_dir, tasks) = tree_with_inputs(&["a.usdc", "b.usdc", "c.usdc"]);
        let converter = ScriptedConverter::new();
        let cancel = CancelToken::new();

        // Cancel as soon as the first completion is reported; with a single
        // worker nothing further may be claimed.
        let sink = {
            let cancel = cancel.clone();
            move |_event: ProgressEvent| cancel.cancel()
        };

        let result = run_batch(&converter, &tasks, 1, &cancel, &sink)
            .await
            .unwrap();

        assert_eq!(result.succeeded + result.failed, 1);
        assert_eq!(result.not_attempted, 2);
        assert_eq!(result.total, 3);
        assert_eq!(converter.calls(), 1);
    }
}
