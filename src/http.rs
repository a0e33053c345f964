// src/http.rs
use anyhow::{Context, Result};
use std::time::Duration;

/// Outbound client used by every provider: user agent, a short connect
/// timeout and an overall request timeout.
pub fn client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("newsroom-bot/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(5).min(timeout))
        .timeout(timeout)
        .build()
        .context("building http client")
}
