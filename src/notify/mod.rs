// src/notify/mod.rs
pub mod console;
pub mod telegram;

use anyhow::Result;

pub use console::ConsolePublisher;
pub use telegram::TelegramPublisher;

/// Outbound channel for composed posts. One call, no retries.
#[async_trait::async_trait]
pub trait Publisher: Send + Sync {
    /// Photo with caption when `image` is set, text-only otherwise.
    async fn publish(&self, text: &str, image: Option<&str>) -> Result<()>;
    fn name(&self) -> &str;
}
