//! Partitioned batch execution.
//!
//! Runs one OS thread per contiguous partition of the input, each walking its
//! slice sequentially into a private output list. All threads are joined
//! before returning; outputs are concatenated in worker order, which equals
//! input order.

use anyhow::{anyhow, Context, Result};
use std::any::Any;
use std::thread;

use crate::partition::plan_partitions;

/// Position of the current item inside its worker's partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerCtx {
    /// Worker index in `[0, workers)`.
    pub worker: usize,
    /// Zero-based position of the item within this worker's slice.
    pub position: usize,
    /// Number of items assigned to this worker.
    pub total: usize,
}

impl WorkerCtx {
    /// Percentage of this worker's slice finished once the current item completes.
    pub fn percent_done(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        ((self.position + 1) as f64 / self.total as f64 * 1000.0).round() / 10.0
    }
}

/// Applies `op` to every item using `workers` threads over static contiguous partitions.
///
/// `workers` is clamped to at least 1. A worker stops at its first error while
/// the others run to completion; after everything is joined, the error of the
/// lowest failing worker index is returned and the remaining ones are logged.
/// A panicking worker is reported as an error.
pub fn run_partitioned<T, R, F>(items: &[T], workers: usize, op: F) -> Result<Vec<R>>
where
    T: Sync,
    R: Send,
    F: Fn(WorkerCtx, &T) -> Result<R> + Sync,
{
    let workers = workers.max(1);
    let plan = plan_partitions(items.len(), workers);
    tracing::debug!("batch: {} items over {} workers", items.len(), workers);

    let op = &op;
    let outcomes: Vec<Result<Vec<R>>> = thread::scope(|s| {
        let handles: Vec<_> = plan
            .iter()
            .enumerate()
            .map(|(worker, range)| {
                let slice = &items[range.as_range()];
                thread::Builder::new()
                    .name(format!("worker-{}", worker))
                    .spawn_scoped(s, move || run_worker(worker, slice, op))
            })
            .collect();

        handles
            .into_iter()
            .enumerate()
            .map(|(worker, handle)| {
                let outcome = match handle {
                    Ok(h) => h.join().unwrap_or_else(|payload| {
                        Err(anyhow!("worker panicked: {}", panic_message(&*payload)))
                    }),
                    Err(e) => Err(anyhow::Error::new(e).context("failed to spawn worker thread")),
                };
                outcome.with_context(|| format!("worker {}", worker))
            })
            .collect()
    });

    let mut merged = Vec::with_capacity(items.len());
    let mut first_error: Option<anyhow::Error> = None;
    for outcome in outcomes {
        match outcome {
            Ok(out) => merged.extend(out),
            Err(e) if first_error.is_none() => first_error = Some(e),
            Err(e) => tracing::error!("{:#}", e),
        }
    }
    if let Some(e) = first_error {
        return Err(e);
    }
    Ok(merged)
}

fn run_worker<T, R, F>(worker: usize, slice: &[T], op: &F) -> Result<Vec<R>>
where
    F: Fn(WorkerCtx, &T) -> Result<R>,
{
    let total = slice.len();
    let mut out = Vec::with_capacity(total);
    for (position, item) in slice.iter().enumerate() {
        let ctx = WorkerCtx {
            worker,
            position,
            total,
        };
        out.push(op(ctx, item)?);
    }
    tracing::debug!("worker {} finished {} items", worker, out.len());
    Ok(out)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
