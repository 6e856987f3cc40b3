//! Task workflow: click, verify, claim.
//!
//! Tasks are processed strictly sequentially per account, each one
//! isolated: a failed click abandons that task only, a failed claim
//! never blocks the other claim candidates, and entries still pending
//! server-side verification are recognized but left alone.

use std::time::Duration;

use uxuy_client::{RpcError, TaskOps};
use uxuy_core::task;

/// Run the task workflow once for one account.
///
/// Only the initial list fetch can fail the workflow as a whole; every
/// later failure is contained to the task being processed.
pub async fn run<S: TaskOps + Sync>(
    ops: &S,
    skip: &[String],
    step_delay: Duration,
) -> Result<(), RpcError> {
    let list = ops.tasks().await?;
    let todo = task::actionable(&list, skip);

    if todo.is_empty() {
        tracing::info!("No tasks to do");
        return Ok(());
    }

    for item in todo {
        if !item.clicked {
            tracing::info!(task = %item.name, "Completing task");
            if let Err(e) = ops.click_task(&item.id).await {
                tracing::warn!(task = %item.name, error = %e, "Unable to complete task");
                continue;
            }
            tokio::time::sleep(step_delay * 2).await;
        }

        // Fresh full verification fetch, not just this task.
        let verification = match ops.verify_tasks().await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(task = %item.name, error = %e, "Unable to verify task");
                continue;
            }
        };

        for candidate in task::claimable(&verification) {
            match ops.claim_task(&candidate.id).await {
                Ok(_) => {
                    tracing::info!(
                        task = %candidate.name,
                        reward = %candidate.award_amount,
                        "Task reward claimed",
                    );
                    tokio::time::sleep(step_delay).await;
                }
                Err(e) => {
                    tracing::warn!(task = %candidate.name, error = %e, "Unable to claim task");
                }
            }
        }

        let pending = task::pending(&verification);
        if !pending.is_empty() {
            tracing::debug!(count = pending.len(), "Tasks still awaiting verification");
        }
    }

    Ok(())
}
