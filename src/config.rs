// src/config.rs

//! Configuration loading and per-run overrides.

use std::path::Path;

use crate::error::{AppError, Result};
use crate::models::{AdapterConfig, Config, TelegramConfig};

/// Configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "docwatch.toml";

/// Load configuration from `path`, or from `docwatch.toml` when present,
/// or the built-in defaults. The result is validated.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    load_config_with(path, Path::new(DEFAULT_CONFIG_FILE))
}

/// A file that exists but does not load is an error, never the defaults.
fn load_config_with(path: Option<&Path>, fallback: &Path) -> Result<Config> {
    let path = match path {
        Some(path) => Some(path),
        None if fallback.exists() => Some(fallback),
        None => None,
    };
    let config = match path {
        Some(path) => Config::load(path)
            .map_err(|e| AppError::config(format!("{}: {}", path.display(), e)))?,
        None => {
            log::debug!("No {} found, using built-in sources", fallback.display());
            Config::default()
        }
    };
    config.validate()?;
    Ok(config)
}

/// Values a caller may override for a single invocation.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub state_dir: Option<String>,
    /// Only valid when exactly one source is selected
    pub storage_file: Option<String>,
    pub max_pages: Option<usize>,
    pub save_content: bool,
    pub no_notify: bool,
    pub telegram_token: Option<String>,
    pub telegram_chat_id: Option<String>,
}

impl Overrides {
    /// Apply to `config` for a run over `selected` sources (all when empty).
    pub fn apply(&self, config: &mut Config, selected: &[String]) -> Result<()> {
        if let Some(dir) = &self.state_dir {
            config.storage.state_dir = dir.clone();
        }
        if self.save_content {
            config.storage.save_content = true;
        }
        if self.no_notify {
            config.notify.enabled = false;
        }

        match (&self.telegram_token, &self.telegram_chat_id) {
            (Some(token), Some(chat_id)) => {
                config.notify.telegram = Some(TelegramConfig {
                    bot_token: token.clone(),
                    chat_id: chat_id.clone(),
                });
            }
            (None, None) => {}
            _ => {
                return Err(AppError::config(
                    "Telegram token and chat id must be given together",
                ));
            }
        }

        if let Some(file) = &self.storage_file {
            let name = match selected {
                [name] => name.clone(),
                [] if config.sources.len() == 1 => config.sources[0].name.clone(),
                _ => {
                    return Err(AppError::config(
                        "--storage-file requires exactly one source",
                    ));
                }
            };
            let source = config
                .sources
                .iter_mut()
                .find(|s| s.name == name)
                .ok_or_else(|| AppError::UnknownSource(name.clone()))?;
            source.storage_file = Some(file.clone());
        }

        if let Some(max_pages) = self.max_pages {
            if max_pages == 0 {
                return Err(AppError::validation("max pages must be > 0"));
            }
            for source in &mut config.sources {
                if let AdapterConfig::Crawled(crawled) = &mut source.adapter {
                    if crawled.follow_links {
                        crawled.max_pages = max_pages;
                    }
                }
            }
        }
        Ok(())
    }
}
