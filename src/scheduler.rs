// src/scheduler.rs
use anyhow::Result;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

use crate::orchestrator::{Orchestrator, RunOutcome};

/// Log line for a finished run.
pub fn report(outcome: &RunOutcome) {
    match outcome {
        RunOutcome::Published { link, image, provider } => tracing::info!(
            %link,
            image = image.as_deref().unwrap_or("-"),
            %provider,
            "run finished: published"
        ),
        RunOutcome::NoCandidate => tracing::info!("run finished: no news found"),
        RunOutcome::GaveUp { cycles } => {
            tracing::warn!(cycles, "run finished: no acceptable post generated")
        }
        RunOutcome::PublishFailed { link, error } => {
            tracing::error!(%link, %error, "run finished: publish failed")
        }
    }
}

/// Runs forever, one run per tick. Runs are strictly sequential: a slow run
/// delays the next tick instead of overlapping it. Store errors end the loop.
pub async fn run_every(orchestrator: &mut Orchestrator, period: Duration) -> Result<()> {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let outcome = orchestrator.run_once().await?;
        report(&outcome);
    }
}
