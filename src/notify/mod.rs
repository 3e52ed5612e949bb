//! Change notification sinks.
//!
//! The engine calls [`Notifier::send`] at most once per run, and only with a
//! non-empty change set. Delivery failures are logged by the engine and do
//! not stop the snapshot from being saved.

mod log;
mod message;
mod telegram;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ChangeSet, NotifyConfig, SourceConfig};

pub use self::log::LogNotifier;
pub use message::MessageRenderer;
pub use telegram::TelegramNotifier;

/// Source identity needed to render a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceContext {
    pub name: String,
    pub display_name: String,
    pub base_url: String,
}

impl SourceContext {
    pub fn from_config(source: &SourceConfig) -> Self {
        Self {
            name: source.name.clone(),
            display_name: source.label().to_string(),
            base_url: source.base_url.clone(),
        }
    }
}

/// Delivers a change set somewhere a human will see it.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, changes: &ChangeSet, source: &SourceContext) -> Result<()>;
}

/// Telegram when credentials are configured, the log otherwise.
pub fn notifier_from_config(config: &NotifyConfig) -> Result<Arc<dyn Notifier>> {
    let renderer = MessageRenderer::new(config.max_items_per_section);
    match &config.telegram {
        Some(telegram) if !telegram.bot_token.is_empty() && !telegram.chat_id.is_empty() => Ok(
            Arc::new(TelegramNotifier::new(telegram, renderer)?),
        ),
        _ => Ok(Arc::new(LogNotifier::new(renderer))),
    }
}
