//! services/api/src/web/training_task.rs
//!
//! This module contains the asynchronous "worker" function that watches a
//! model-training job on the backend.

use smartstock_core::domain::{TrainingSnapshot, TrainingStatus};
use smartstock_core::ports::TrainingService;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How a polling run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Finished(TrainingStatus),
    Cancelled,
}

/// Polls the training status until the job finishes or the token is cancelled.
///
/// Every successful poll replaces `latest`. Failed polls are logged and the
/// loop keeps going. The first poll happens immediately.
pub async fn training_poll_process(
    training: Arc<dyn TrainingService>,
    latest: Arc<Mutex<Option<TrainingSnapshot>>>,
    period: Duration,
    cancellation_token: CancellationToken,
) -> PollOutcome {
    info!(?period, "Training poller started.");
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancellation_token.cancelled() => {
                info!("Training poller cancelled.");
                return PollOutcome::Cancelled;
            }
            _ = ticker.tick() => {}
        }

        let snapshot = tokio::select! {
            _ = cancellation_token.cancelled() => {
                info!("Training poller cancelled.");
                return PollOutcome::Cancelled;
            }
            result = training.training_status() => result,
        };

        match snapshot {
            Ok(snapshot) => {
                let status = snapshot.status;
                debug!(status = status.as_str(), lines = snapshot.logs.len(), "Training status polled");
                *latest.lock().await = Some(snapshot);
                if status.is_terminal() {
                    info!(status = status.as_str(), "Training job finished.");
                    return PollOutcome::Finished(status);
                }
            }
            Err(e) => warn!("Failed to poll training status: {}", e),
        }
    }
}
