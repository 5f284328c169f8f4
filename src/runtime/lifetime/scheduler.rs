//! 定时对账
//!
//! 固定间隔触发一轮对账；停机令牌取消后不再触发新的一轮，
//! 进行中的一轮会在当前条目完成后自行停止。

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info, warn};

use crate::models::reconcile::entities::PassOutcome;
use crate::services::AssignmentTracker;

pub async fn run_scheduler(tracker: Arc<AssignmentTracker>, every: Duration) {
    let shutdown = tracker.shutdown_token();
    let mut ticker = interval(every);
    // 一轮跑得比间隔还久时不补跑
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(interval_secs = every.as_secs(), "Reconcile scheduler started");
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {}
        }

        match tracker.run_scheduled_pass().await {
            Ok(report) => match &report.outcome {
                PassOutcome::Completed => {}
                PassOutcome::Skipped => warn!(pass_id = %report.pass_id, "Pass skipped"),
                PassOutcome::Aborted { reason } => {
                    warn!(pass_id = %report.pass_id, phase = ?report.phase, "Pass aborted: {}", reason)
                }
            },
            Err(e) if e.is_fatal() => {
                error!("Credentials rejected, re-authentication required: {}", e)
            }
            Err(e) => warn!("Reconciliation pass failed: {}", e),
        }
    }
    info!("Reconcile scheduler stopped");
}
