use anyhow::Result;

use super::Publisher;

/// Dry-run publisher: logs the post instead of sending it.
#[derive(Debug, Default, Clone)]
pub struct ConsolePublisher;

#[async_trait::async_trait]
impl Publisher for ConsolePublisher {
    async fn publish(&self, text: &str, image: Option<&str>) -> Result<()> {
        tracing::info!(image = image.unwrap_or("-"), "dry run, post not sent:\n{text}");
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}
