//! Step guard: at-most-once execution of named pipeline steps.
//!
//! Epistemic foundation:
//! - K_i: A step name is `<label>-<call counter>`; the counter is per-run
//! - K_i: A recorded name is never re-executed and never mutated
//! - B_i: A step may fail → nothing recorded, same name retried next run
//! - I^B: Names are position-derived. If the guarded-call sequence changes
//!   between runs (e.g. the transcript re-chunks to a different count), a
//!   stale store misaligns silently: false skips or redundant recompute.
//!   Accepted tradeoff; resuming assumes an identical call sequence.

use std::future::Future;
use std::path::Path;
use tracing::{debug, error};

use crate::checkpoint::{CheckpointEntry, CheckpointStore};
use crate::models::Result;

/// Outcome of a guarded step.
///
/// `Skipped` is distinct from any value the wrapped operation can produce:
/// the caller must reconstruct the step's result from its persisted
/// artifact instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome<T> {
    /// The operation ran to completion in this invocation.
    Completed(T),
    /// A checkpoint for this name already existed; the operation did not run.
    Skipped,
}

impl<T> StepOutcome<T> {
    /// The completed value, if the step actually ran.
    pub fn into_completed(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            Self::Skipped => None,
        }
    }

    pub fn was_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }
}

/// Per-job context threading the store and the call counter through the
/// pipeline. Constructing a fresh context at job start resets the counter,
/// so the Nth guarded call of every run derives the same name.
pub struct JobContext {
    store: CheckpointStore,
    counter: u32,
}

impl JobContext {
    /// Open a context over a working directory.
    pub fn open(dir: &Path) -> Result<Self> {
        Ok(Self {
            store: CheckpointStore::open(dir)?,
            counter: 0,
        })
    }

    /// Run `op` at most once for the name derived from `label` and the
    /// current call position.
    ///
    /// The counter increments on every attempt, skipped or not, so call
    /// positions stay aligned across runs. `recorded_inputs` is stored for
    /// audit only and never compared.
    pub async fn run_step<T, F, Fut>(
        &mut self,
        label: &str,
        recorded_inputs: Vec<String>,
        op: F,
    ) -> Result<StepOutcome<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.counter += 1;
        let name = format!("{label}-{}", self.counter);

        let mut entries = self.store.load()?;
        if entries.contains_key(&name) {
            debug!(step = %name, "Checkpoint exists, skipping");
            return Ok(StepOutcome::Skipped);
        }

        match op().await {
            Ok(value) => {
                entries.insert(name, CheckpointEntry::new(recorded_inputs));
                self.store.save(&entries)?;
                Ok(StepOutcome::Completed(value))
            }
            Err(e) => {
                error!(step = %name, error = %e, "Step failed");
                Err(e)
            }
        }
    }

    /// The store this context records into.
    pub fn store(&self) -> &CheckpointStore {
        &self.store
    }

    /// Number of guarded calls attempted so far in this run.
    pub fn calls_attempted(&self) -> u32 {
        self.counter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PodbriefError;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_step_runs_once_then_skips() {
        let temp_dir = TempDir::new().unwrap();
        let runs = AtomicUsize::new(0);
        let runs = &runs;

        // First run executes.
        let mut ctx = JobContext::open(temp_dir.path()).unwrap();
        let outcome = ctx
            .run_step("summarize", vec!["chunk 1".to_string()], || async move {
                runs.fetch_add(1, Ordering::SeqCst);
                Ok(42u32)
            })
            .await
            .unwrap();
        assert_eq!(outcome, StepOutcome::Completed(42));

        let store_bytes = fs::read(ctx.store().path()).unwrap();

        // Identical label and call order in a fresh run skips without
        // invoking the operation or touching the store.
        let mut ctx = JobContext::open(temp_dir.path()).unwrap();
        let outcome = ctx
            .run_step("summarize", vec!["chunk 1".to_string()], || async move {
                runs.fetch_add(1, Ordering::SeqCst);
                Ok(42u32)
            })
            .await
            .unwrap();
        assert!(outcome.was_skipped());
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(fs::read(ctx.store().path()).unwrap(), store_bytes);
    }

    #[tokio::test]
    async fn test_failure_records_nothing_and_retry_reattempts() {
        let temp_dir = TempDir::new().unwrap();

        let mut ctx = JobContext::open(temp_dir.path()).unwrap();
        let result: Result<StepOutcome<()>> = ctx
            .run_step("flaky", vec![], || async move {
                Err(PodbriefError::Fetch("transient".to_string()))
            })
            .await;
        assert!(result.is_err());
        assert!(ctx.store().load().unwrap().is_empty());

        // Same call position in a new run re-attempts the same name.
        let mut ctx = JobContext::open(temp_dir.path()).unwrap();
        let outcome = ctx
            .run_step("flaky", vec![], || async move { Ok("ok") })
            .await
            .unwrap();
        assert_eq!(outcome, StepOutcome::Completed("ok"));
        assert!(ctx.store().load().unwrap().contains_key("flaky-1"));
    }

    #[tokio::test]
    async fn test_names_follow_call_order() {
        let temp_dir = TempDir::new().unwrap();
        let mut ctx = JobContext::open(temp_dir.path()).unwrap();

        ctx.run_step("fetch", vec![], || async move { Ok(()) })
            .await
            .unwrap();
        ctx.run_step("summarize", vec![], || async move { Ok(()) })
            .await
            .unwrap();
        ctx.run_step("summarize", vec![], || async move { Ok(()) })
            .await
            .unwrap();

        let entries = ctx.store().load().unwrap();
        let names: Vec<&str> = entries.keys().map(String::as_str).collect();
        assert!(names.contains(&"fetch-1"));
        assert!(names.contains(&"summarize-2"));
        assert!(names.contains(&"summarize-3"));
        assert_eq!(ctx.calls_attempted(), 3);
    }

    #[tokio::test]
    async fn test_skipped_attempts_still_advance_the_counter() {
        let temp_dir = TempDir::new().unwrap();

        let mut ctx = JobContext::open(temp_dir.path()).unwrap();
        ctx.run_step("a", vec![], || async move { Ok(()) }).await.unwrap();
        ctx.run_step("b", vec![], || async move { Ok(()) }).await.unwrap();

        // Rerun: first call skips but the second still derives "b-2".
        let mut ctx = JobContext::open(temp_dir.path()).unwrap();
        let first = ctx.run_step("a", vec![], || async move { Ok(()) }).await.unwrap();
        assert!(first.was_skipped());
        let second = ctx.run_step("b", vec![], || async move { Ok(()) }).await.unwrap();
        assert!(second.was_skipped());
    }
}
