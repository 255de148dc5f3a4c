//! Prints batches to standard output.

use std::io::Write;
use std::sync::Arc;

use jobwatch_core::JobRecord;

use crate::templating::{BatchContext, TemplateRenderer, CONSOLE_TEMPLATE};
use crate::traits::{DeliveryError, Notifier};

const RULE_WIDTH: usize = 80;

/// Writes a framed, timestamped block per batch to stdout.
#[derive(Debug)]
pub struct ConsoleNotifier {
    snippet_max_length: usize,
    renderer: Arc<TemplateRenderer>,
}

impl ConsoleNotifier {
    pub fn new(snippet_max_length: usize, renderer: Arc<TemplateRenderer>) -> Self {
        Self {
            snippet_max_length,
            renderer,
        }
    }

    /// Render the full block printed for `batch`.
    pub fn render_block(&self, batch: &[JobRecord]) -> Result<String, DeliveryError> {
        let ctx = BatchContext::new(batch).with_snippet_max(self.snippet_max_length);
        let body = if batch.is_empty() {
            "No new jobs".to_string()
        } else {
            self.renderer.render(CONSOLE_TEMPLATE, &ctx)?
        };

        let rule = "=".repeat(RULE_WIDTH);
        Ok(format!(
            "\n{rule}\nNEW JOB POSTINGS - {}\n{rule}\n{}\n{rule}\n",
            ctx.now,
            body.trim_end()
        ))
    }
}

#[async_trait::async_trait]
impl Notifier for ConsoleNotifier {
    async fn deliver(&self, batch: &[JobRecord]) -> Result<(), DeliveryError> {
        let block = self.render_block(batch)?;
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(block.as_bytes())?;
        stdout.flush()?;
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "console"
    }
}
