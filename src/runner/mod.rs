//! Bounded-concurrency task runner
//!
//! Drives one asynchronous operation per work item with at most
//! `concurrency` operations in flight, and reports each item's outcome
//! through a callback as soon as that item settles.
//!
//! A free slot is refilled the moment any in-flight operation settles, so a
//! slow item never holds back the items queued behind it. Failures (returned
//! errors and panics alike) are contained per item and never abort the run.
//!
//! ```no_run
//! use bulkenrich::runner::{BoundedRunner, Outcome, RunnerConfig};
//!
//! # async fn demo() -> Result<(), bulkenrich::runner::RunnerError> {
//! let runner = BoundedRunner::new(RunnerConfig::new(3)?);
//! runner
//!     .run(
//!         vec!["a", "b", "c"],
//!         |item| async move { Ok::<_, String>(item.len()) },
//!         |item, outcome| match outcome {
//!             Outcome::Success(len) => println!("{item}: {len}"),
//!             Outcome::Failure(err) => println!("{item} failed: {err}"),
//!         },
//!     )
//!     .await
//! # }
//! ```

mod outcome;

pub use outcome::{OperationFailure, Outcome};

use crate::observability::RunMetrics;
use futures_util::FutureExt;
use std::fmt;
use std::future::{self, Future};
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Concurrency used by the bulk enrichment flow when nothing is configured
pub const DEFAULT_CONCURRENCY: usize = 3;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("concurrency must be at least 1 (got {0})")]
    InvalidConcurrency(usize),

    /// A driving task was cancelled outside the runner's control
    #[error("in-flight task failed to join: {0}")]
    Join(#[from] JoinError),
}

/// Per-invocation runner settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerConfig {
    concurrency: NonZeroUsize,
}

impl RunnerConfig {
    pub fn new(concurrency: usize) -> Result<Self, RunnerError> {
        NonZeroUsize::new(concurrency)
            .map(|concurrency| Self { concurrency })
            .ok_or(RunnerError::InvalidConcurrency(concurrency))
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency.get()
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            concurrency: NonZeroUsize::new(DEFAULT_CONCURRENCY).unwrap_or(NonZeroUsize::MIN),
        }
    }
}

/// Runs operations over a list of items with a fixed in-flight cap
#[derive(Debug, Clone, Default)]
pub struct BoundedRunner {
    config: RunnerConfig,
    metrics: Option<Arc<RunMetrics>>,
}

impl BoundedRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self {
            config,
            metrics: None,
        }
    }

    /// Record dispatch/settlement counters into `metrics`
    pub fn with_metrics(mut self, metrics: Arc<RunMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> RunnerConfig {
        self.config
    }

    /// Execute `operation` once per item and report every outcome to `on_settled`.
    ///
    /// Items are dispatched in input order: `operation` is called on the task
    /// awaiting this future, and only the future it returns is spawned.
    /// `on_settled` is called exactly once per item, from that same task, in
    /// completion order. Operation errors and panics become
    /// [`Outcome::Failure`]; they never make this call fail.
    ///
    /// Dropping the returned future cancels the run: operations still in
    /// flight are aborted and no further callbacks fire.
    ///
    /// # Errors
    ///
    /// Only [`RunnerError::Join`], when an in-flight task is cancelled from the
    /// outside (e.g. runtime shutdown).
    #[instrument(
        skip_all,
        fields(
            run_id = %Uuid::now_v7(),
            items = items.len(),
            concurrency = self.config.concurrency(),
        )
    )]
    pub async fn run<I, T, E, F, Fut, C>(
        &self,
        items: Vec<I>,
        operation: F,
        mut on_settled: C,
    ) -> Result<(), RunnerError>
    where
        I: Clone + Send + 'static,
        T: Send + 'static,
        E: fmt::Display + Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        C: FnMut(I, Outcome<T>),
    {
        let limit = self.config.concurrency();
        let total = items.len();
        let mut pending = items.into_iter().enumerate();
        let mut in_flight = JoinSet::new();
        let mut succeeded = 0usize;
        let mut failed = 0usize;

        loop {
            while in_flight.len() < limit {
                let Some((index, item)) = pending.next() else {
                    break;
                };

                // Calling the operation here keeps dispatch in input order on any
                // runtime flavor; only the returned future is spawned.
                let input = item.clone();
                match panic::catch_unwind(AssertUnwindSafe(|| operation(input))) {
                    Ok(running) => {
                        in_flight.spawn(settle(running, index, item));
                    }
                    Err(payload) => {
                        let failure = OperationFailure::from_panic(payload);
                        in_flight.spawn(future::ready((index, item, Outcome::Failure(failure))));
                    }
                }
                debug!(index, in_flight = in_flight.len(), "Dispatched item");

                if let Some(metrics) = &self.metrics {
                    metrics.item_dispatched(in_flight.len());
                }
            }

            let Some(joined) = in_flight.join_next().await else {
                break;
            };

            let (index, item, outcome) = joined.map_err(|e| {
                warn!(error = %e, "In-flight task did not complete");
                RunnerError::Join(e)
            })?;

            match &outcome {
                Outcome::Success(_) => {
                    succeeded += 1;
                    debug!(index, "Item succeeded");
                }
                Outcome::Failure(failure) => {
                    failed += 1;
                    debug!(index, error = %failure, "Item failed");
                }
            }

            if let Some(metrics) = &self.metrics {
                metrics.item_settled(outcome.is_success());
            }

            on_settled(item, outcome);
        }

        info!(total, succeeded, failed, "Run completed");

        Ok(())
    }
}

/// Drive one operation future, turning errors and panics into an [`Outcome`]
async fn settle<I, T, E, Fut>(running: Fut, index: usize, item: I) -> (usize, I, Outcome<T>)
where
    E: fmt::Display,
    Fut: Future<Output = Result<T, E>>,
{
    let outcome = match AssertUnwindSafe(running).catch_unwind().await {
        Ok(result) => Outcome::from_result(result),
        Err(payload) => Outcome::Failure(OperationFailure::from_panic(payload)),
    };

    (index, item, outcome)
}

/// One-shot helper: validate `concurrency` and run once.
pub async fn run_bounded<I, T, E, F, Fut, C>(
    items: Vec<I>,
    concurrency: usize,
    operation: F,
    on_settled: C,
) -> Result<(), RunnerError>
where
    I: Clone + Send + 'static,
    T: Send + 'static,
    E: fmt::Display + Send + 'static,
    F: Fn(I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    C: FnMut(I, Outcome<T>),
{
    let config = RunnerConfig::new(concurrency)?;
    BoundedRunner::new(config)
        .run(items, operation, on_settled)
        .await
}
