//! Farm workflow: one fresh record read, one derived action.
//!
//! The claim and start calls are each preceded by a short delay to
//! avoid bursting the service.  A failed claim never gates the start
//! attempt -- the service decides what it accepts.

use std::time::Duration;

use uxuy_client::{FarmOps, RpcError};
use uxuy_core::farm::{self, FarmState};

/// Run the farm workflow once for one account.
pub async fn run<S: FarmOps + Sync>(ops: &S, step_delay: Duration) -> Result<(), RpcError> {
    let record = ops.farm_info().await?;

    match farm::evaluate(&record) {
        FarmState::Cooling { remaining_secs } => {
            tracing::info!(
                remaining_mins = remaining_secs / 60,
                remaining_secs = remaining_secs % 60,
                "Farm still cooling, nothing to claim",
            );
        }
        FarmState::ClaimThenStart => {
            tokio::time::sleep(step_delay).await;
            match ops.claim_farm(&record.group_id, &record.id).await {
                Ok(_) => {
                    tracing::info!(reward = %record.award_amount, "Farm claimed");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Farm claim failed, attempting start anyway");
                }
            }
            tokio::time::sleep(step_delay).await;
            match ops.start_farm(&record.group_id, &record.id).await {
                Ok(_) => tracing::info!("Farming started"),
                Err(e) => tracing::warn!(error = %e, "Farm start failed"),
            }
        }
        FarmState::StartOnly => match ops.start_farm(&record.group_id, &record.id).await {
            Ok(_) => tracing::info!("Farming started"),
            Err(e) => tracing::warn!(error = %e, "Farm start failed"),
        },
        FarmState::Idle => {
            tracing::debug!("Farm already running");
        }
    }

    Ok(())
}
