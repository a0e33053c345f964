//! newsroom-bot binary entrypoint.
//! One run per invocation (cron/systemd timer), or a sequential loop when
//! `BOT_INTERVAL_SECS` is set.

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use newsroom_bot::{bootstrap, scheduler, Config};

/// `RUST_LOG` wins; `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("newsroom_bot=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env when present; no-op otherwise.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = Config::from_env().context("invalid configuration")?;
    cfg.log_summary();

    let mut orchestrator =
        bootstrap::build_orchestrator(&cfg).context("startup checks failed")?;

    match cfg.interval {
        Some(period) => {
            tracing::info!(every_secs = period.as_secs(), "scheduler started");
            scheduler::run_every(&mut orchestrator, period).await
        }
        None => {
            let outcome = orchestrator.run_once().await?;
            scheduler::report(&outcome);
            Ok(())
        }
    }
}
