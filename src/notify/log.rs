//! Log-only delivery, used when no chat transport is configured.

use async_trait::async_trait;
use chrono::Utc;

use crate::error::Result;
use crate::models::ChangeSet;
use crate::notify::{MessageRenderer, Notifier, SourceContext};

/// Writes the rendered message to the log.
pub struct LogNotifier {
    renderer: MessageRenderer,
}

impl LogNotifier {
    pub fn new(renderer: MessageRenderer) -> Self {
        Self { renderer }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, changes: &ChangeSet, source: &SourceContext) -> Result<()> {
        let message = self.renderer.render(changes, source, Utc::now());
        for line in message.lines().filter(|l| !l.trim().is_empty()) {
            ::log::info!("[notify] {}", line);
        }
        Ok(())
    }
}
