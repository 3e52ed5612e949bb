//! Telegram Bot API delivery.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;

use crate::error::{AppError, Result};
use crate::models::{ChangeSet, TelegramConfig};
use crate::notify::{MessageRenderer, Notifier, SourceContext};

const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Sends rendered change sets with `sendMessage`.
pub struct TelegramNotifier {
    client: reqwest::Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
    renderer: MessageRenderer,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig, renderer: MessageRenderer) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            api_base: DEFAULT_API_BASE.to_string(),
            bot_token: config.bot_token.clone(),
            chat_id: config.chat_id.clone(),
            renderer,
        })
    }

    /// Point at a different Bot API server.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn payload(&self, text: &str) -> serde_json::Value {
        json!({
            "chat_id": self.chat_id,
            "text": text,
            "parse_mode": "Markdown",
            "disable_web_page_preview": true,
        })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, changes: &ChangeSet, source: &SourceContext) -> Result<()> {
        let text = self.renderer.render(changes, source, Utc::now());
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.bot_token);

        // The token is part of the URL; keep it out of error messages.
        let response = self
            .client
            .post(&url)
            .json(&self.payload(&text))
            .send()
            .await
            .map_err(|e| AppError::notify(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::notify(format!("Telegram returned {status}: {body}")));
        }

        log::info!("Telegram notification sent for {}", source.display_name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContentUnit, Fingerprint, UnitDescriptor};

    fn notifier() -> TelegramNotifier {
        let config = TelegramConfig {
            bot_token: "123:abc".into(),
            chat_id: "-100200".into(),
        };
        TelegramNotifier::new(&config, MessageRenderer::new(10)).unwrap()
    }

    #[test]
    fn test_payload_shape() {
        let payload = notifier().payload("hello");
        assert_eq!(payload["chat_id"], "-100200");
        assert_eq!(payload["text"], "hello");
        assert_eq!(payload["parse_mode"], "Markdown");
        assert_eq!(payload["disable_web_page_preview"], true);
    }

    #[tokio::test]
    async fn test_unreachable_api_is_notify_error() {
        let notifier = notifier().with_api_base("http://127.0.0.1:1");
        let changes = ChangeSet {
            new_units: vec![ContentUnit::from_descriptor(
                UnitDescriptor::new("a", "A", "https://docs.example.com/a"),
                Fingerprint::from_hex("00"),
                Utc::now(),
                None,
            )],
            ..ChangeSet::default()
        };
        let source = SourceContext {
            name: "example".into(),
            display_name: "Example".into(),
            base_url: "https://docs.example.com".into(),
        };

        let err = notifier.send(&changes, &source).await.unwrap_err();
        assert!(matches!(err, AppError::Notify(_)));
        assert!(!err.to_string().contains("123:abc"));
    }
}
