use anyhow::Result;
use tokio::sync::watch;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::core::shutdown;
use crate::core::state::AppState;
use crate::tasks::reconcile;

pub(crate) async fn run(state: AppState) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = shutdown::shutdown_channel();

    let every = Duration::from_secs(state.settings().worker().reconcile_interval_seconds.max(1));
    let handle = tokio::spawn(reconcile_loop(state, every, shutdown_rx));

    shutdown::shutdown_signal().await;
    if shutdown_tx.send(true).is_err() {
        tracing::warn!("Failed to broadcast shutdown signal to background tasks");
    }

    if let Err(err) = handle.await {
        tracing::error!(error = %err, "Background task join failed");
    }

    Ok(())
}

async fn reconcile_loop(state: AppState, every: Duration, mut shutdown: watch::Receiver<bool>) {
    tracing::info!(interval_seconds = every.as_secs(), "Counter reconciliation started");

    let mut tick = interval(every);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = tick.tick() => {
                if let Err(err) = reconcile::reconcile_counters(state.db()).await {
                    tracing::error!(error = %err, "reconcile_counters failed");
                }
            }
        }
    }

    tracing::info!("Counter reconciliation stopped");
}
