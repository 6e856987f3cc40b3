//! Batch scheduler: the infinite outer loop.
//!
//! Each cycle partitions the account list into consecutive batches of
//! at most `max_threads` accounts, runs every account of a batch as an
//! isolated spawned unit, and waits for the whole batch to drain
//! before advancing.  Per-unit errors are logged and discarded at
//! batch end -- they never alter scheduling.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use uxuy_core::config::{Settings, INTER_BATCH_DELAY};

use crate::accounts::Account;
use crate::error::RunError;
use crate::runner;

/// Run one full pass over `total` units in batches of `batch_size`,
/// spawning each unit through `run_unit` and draining every batch
/// before the next one starts.  Returns the number of failed units.
pub async fn run_batches<F, Fut>(
    total: usize,
    batch_size: usize,
    inter_batch_delay: Duration,
    run_unit: F,
) -> usize
where
    F: Fn(usize) -> Fut,
    Fut: Future<Output = Result<(), RunError>> + Send + 'static,
{
    let mut failed = 0usize;
    let mut next = 0usize;

    while next < total {
        let end = (next + batch_size).min(total);
        let indices: Vec<usize> = (next..end).collect();
        let handles: Vec<_> = indices
            .iter()
            .map(|&index| tokio::spawn(run_unit(index)))
            .collect();
        let outcomes = join_all(handles).await;

        // Diagnostic only: collected, logged, and dropped at batch end.
        let mut batch_errors: Vec<(usize, RunError)> = Vec::new();
        for (index, outcome) in indices.into_iter().zip(outcomes) {
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!(account = index + 1, error = %e, "Account run failed");
                    batch_errors.push((index, e));
                }
                Err(join_err) => {
                    tracing::error!(account = index + 1, error = %join_err, "Account unit aborted");
                    batch_errors.push((index, RunError::Aborted(join_err.to_string())));
                }
            }
        }
        failed += batch_errors.len();

        next = end;
        if next < total {
            tokio::time::sleep(inter_batch_delay).await;
        }
    }

    failed
}

/// The engine's outer loop: cycle over all accounts forever, sleeping
/// `TIME_SLEEP` minutes between passes.  Never returns.
pub async fn run_forever(
    accounts: Arc<Vec<Account>>,
    settings: Arc<Settings>,
    agents: Arc<HashMap<String, String>>,
) {
    loop {
        let total = accounts.len();
        tracing::info!(
            accounts = total,
            batch_size = settings.max_threads,
            "Starting cycle",
        );

        let failed = run_batches(total, settings.max_threads, INTER_BATCH_DELAY, |index| {
            let accounts = Arc::clone(&accounts);
            let settings = Arc::clone(&settings);
            let agents = Arc::clone(&agents);
            async move { runner::run_with_deadline(&accounts[index], &settings, &agents).await }
        })
        .await;

        tracing::info!(
            failed,
            minutes = settings.time_sleep_mins,
            "All accounts processed, sleeping until next cycle",
        );
        tokio::time::sleep(Duration::from_secs(settings.time_sleep_mins * 60)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Shared per-test observer for unit starts/finishes.
    #[derive(Default)]
    struct Tracker {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        finished: Mutex<HashSet<usize>>,
        /// For each unit, the set of units already finished when it started.
        finished_at_start: Mutex<Vec<(usize, HashSet<usize>)>>,
    }

    impl Tracker {
        fn enter(&self, index: usize) {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            let done = self.finished.lock().unwrap().clone();
            self.finished_at_start.lock().unwrap().push((index, done));
        }

        fn exit(&self, index: usize) {
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.finished.lock().unwrap().insert(index);
        }
    }

    async fn tracked_unit(tracker: Arc<Tracker>, index: usize) -> Result<(), RunError> {
        tracker.enter(index);
        tokio::time::sleep(Duration::from_millis(20)).await;
        tracker.exit(index);
        Ok(())
    }

    #[tokio::test]
    async fn never_exceeds_batch_size_in_flight() {
        let tracker = Arc::new(Tracker::default());
        let t = Arc::clone(&tracker);
        let failed = run_batches(5, 2, Duration::ZERO, move |i| {
            tracked_unit(Arc::clone(&t), i)
        })
        .await;

        assert_eq!(failed, 0);
        assert!(tracker.max_in_flight.load(Ordering::SeqCst) <= 2);
        assert_eq!(tracker.finished.lock().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn later_batches_wait_for_earlier_ones() {
        // 5 accounts, batch size 2 => batches [0,1], [2,3], [4].
        let tracker = Arc::new(Tracker::default());
        let t = Arc::clone(&tracker);
        run_batches(5, 2, Duration::ZERO, move |i| {
            tracked_unit(Arc::clone(&t), i)
        })
        .await;

        let starts = tracker.finished_at_start.lock().unwrap().clone();
        let at_start = |index: usize| -> HashSet<usize> {
            starts
                .iter()
                .find(|(i, _)| *i == index)
                .map(|(_, done)| done.clone())
                .expect("unit ran")
        };

        // Batch 2 units saw all of batch 1 finished.
        for index in [2, 3] {
            let done = at_start(index);
            assert!(done.contains(&0) && done.contains(&1), "unit {index} started early");
        }
        // The final single-unit batch saw everything before it.
        let done = at_start(4);
        assert_eq!(done, HashSet::from([0, 1, 2, 3]));
    }

    #[tokio::test]
    async fn unit_failures_do_not_stop_the_pass() {
        let ran = Arc::new(AtomicUsize::new(0));
        let r = Arc::clone(&ran);
        let failed = run_batches(4, 2, Duration::ZERO, move |i| {
            let ran = Arc::clone(&r);
            async move {
                ran.fetch_add(1, Ordering::SeqCst);
                if i % 2 == 0 {
                    Err(RunError::AuthExpired)
                } else {
                    Ok(())
                }
            }
        })
        .await;

        assert_eq!(ran.load(Ordering::SeqCst), 4);
        assert_eq!(failed, 2);
    }

    #[tokio::test]
    async fn single_short_batch_runs_everything() {
        let ran = Arc::new(AtomicUsize::new(0));
        let r = Arc::clone(&ran);
        let failed = run_batches(3, 10, Duration::ZERO, move |_| {
            let ran = Arc::clone(&r);
            async move {
                ran.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .await;

        assert_eq!(ran.load(Ordering::SeqCst), 3);
        assert_eq!(failed, 0);
    }

    #[tokio::test]
    async fn empty_account_list_is_a_noop() {
        let failed = run_batches(0, 2, Duration::ZERO, |_| async { Ok(()) }).await;
        assert_eq!(failed, 0);
    }
}
