//! Application configuration structures.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::pipeline::CircuitBreakerConfig;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP and crawling behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Snapshot persistence settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Notification delivery settings
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Optional guard against sudden unit-count drops
    #[serde(default)]
    pub guard: CircuitBreakerConfig,

    /// Watched documentation sources
    #[serde(default = "defaults::default_sources")]
    pub sources: Vec<SourceConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.max_concurrent == 0 {
            return Err(AppError::validation("crawler.max_concurrent must be > 0"));
        }
        if self.notify.max_items_per_section == 0 {
            return Err(AppError::validation(
                "notify.max_items_per_section must be > 0",
            ));
        }
        if self.guard.max_drop_percent > 100 {
            return Err(AppError::validation("guard.max_drop_percent must be <= 100"));
        }
        if self.sources.is_empty() {
            return Err(AppError::validation("No sources defined"));
        }

        let mut names = HashSet::new();
        for source in &self.sources {
            if !names.insert(source.name.as_str()) {
                return Err(AppError::validation(format!(
                    "Duplicate source name '{}'",
                    source.name
                )));
            }
            source.validate()?;
        }
        Ok(())
    }

    /// Look up a source by name.
    pub fn source(&self, name: &str) -> Result<&SourceConfig> {
        self.sources
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| AppError::UnknownSource(name.to_string()))
    }

    /// Path of the snapshot file for a source.
    pub fn state_path(&self, source: &SourceConfig) -> PathBuf {
        match &source.storage_file {
            Some(file) => PathBuf::from(file),
            None => Path::new(&self.storage.state_dir)
                .join(format!("{}_docs_state.json", source.name)),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            crawler: CrawlerConfig::default(),
            storage: StorageConfig::default(),
            notify: NotifyConfig::default(),
            guard: CircuitBreakerConfig::default(),
            sources: defaults::default_sources(),
        }
    }
}

/// HTTP client and crawling behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Minimum spacing between requests to one source, in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Maximum concurrent unit fetches per source
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: defaults::request_delay(),
            max_concurrent: defaults::max_concurrent(),
        }
    }
}

/// Snapshot persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one state file per source
    #[serde(default = "defaults::state_dir")]
    pub state_dir: String,

    /// Keep extracted text in the snapshot for line diffs
    #[serde(default)]
    pub save_content: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_dir: defaults::state_dir(),
            save_content: false,
        }
    }
}

/// Which change categories are delivered to the notifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyPolicy {
    #[serde(default = "defaults::enabled")]
    pub on_additions: bool,

    #[serde(default = "defaults::enabled")]
    pub on_modifications: bool,

    #[serde(default)]
    pub on_deletions: bool,
}

impl Default for NotifyPolicy {
    fn default() -> Self {
        Self {
            on_additions: true,
            on_modifications: true,
            on_deletions: false,
        }
    }
}

/// Notification delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Master switch for notifications
    #[serde(default = "defaults::enabled")]
    pub enabled: bool,

    /// Default category filter, overridable per source
    #[serde(flatten)]
    pub policy: NotifyPolicy,

    /// Maximum units listed per category in one message
    #[serde(default = "defaults::max_items_per_section")]
    pub max_items_per_section: usize,

    /// Telegram Bot API credentials; log-only delivery when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram: Option<TelegramConfig>,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            policy: NotifyPolicy::default(),
            max_items_per_section: defaults::max_items_per_section(),
            telegram: None,
        }
    }
}

/// Telegram Bot API credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
}

/// One watched documentation source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Registry key, also used for the default state file name
    pub name: String,

    /// Name shown in notifications
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Documentation landing page linked from notifications
    pub base_url: String,

    /// Explicit snapshot path, overriding `{state_dir}/{name}_docs_state.json`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_file: Option<String>,

    /// Regexes for time-varying fragments dropped before hashing
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volatile_patterns: Vec<String>,

    /// Per-source category filter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notify: Option<NotifyPolicy>,

    /// How units are discovered and fetched
    pub adapter: AdapterConfig,
}

impl SourceConfig {
    /// Display name, falling back to the registry key.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    /// Effective notification policy for this source.
    pub fn notify_policy(&self, global: &NotifyConfig) -> NotifyPolicy {
        self.notify.unwrap_or(global.policy)
    }

    /// Compile the volatile patterns.
    pub fn compiled_volatile_patterns(&self) -> Result<Vec<Regex>> {
        self.volatile_patterns
            .iter()
            .map(|p| Regex::new(p).map_err(AppError::from))
            .collect()
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation("Source name is empty"));
        }
        url::Url::parse(&self.base_url).map_err(|e| {
            AppError::validation(format!("{}: invalid base_url: {e}", self.name))
        })?;
        self.compiled_volatile_patterns()?;

        match &self.adapter {
            AdapterConfig::Enumerated(cfg) => {
                if cfg.documents.is_empty() {
                    return Err(AppError::validation(format!(
                        "{}: enumerated adapter needs at least one document",
                        self.name
                    )));
                }
                for doc in &cfg.documents {
                    url::Url::parse(&doc.url)?;
                }
                parse_selector(&cfg.heading_selector)?;
            }
            AdapterConfig::Crawled(cfg) => {
                if cfg.roots.is_empty() {
                    return Err(AppError::validation(format!(
                        "{}: crawled adapter needs at least one root",
                        self.name
                    )));
                }
                if cfg.max_pages == 0 {
                    return Err(AppError::validation(format!(
                        "{}: max_pages must be > 0",
                        self.name
                    )));
                }
                for root in &cfg.roots {
                    url::Url::parse(root)?;
                }
                for selector in &cfg.content_selectors {
                    parse_selector(selector)?;
                }
            }
        }
        Ok(())
    }
}

/// Adapter variant and its settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdapterConfig {
    /// Single-page sources split into sections by anchored headings
    Enumerated(EnumeratedConfig),
    /// Multi-page sources discovered by a bounded same-origin crawl
    Crawled(CrawledConfig),
}

/// Settings for section-anchored sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumeratedConfig {
    /// Documents to split into sections
    pub documents: Vec<DocumentConfig>,

    /// Headings that start a section; they must carry an `id`
    #[serde(default = "defaults::heading_selector")]
    pub heading_selector: String,

    /// Only track sub-headings nested under the heading with this id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope_id: Option<String>,
}

/// A single document of an enumerated source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentConfig {
    /// Prefix for unit ids (`key:anchor`); empty for single-document sources
    #[serde(default)]
    pub key: String,

    pub url: String,
}

/// Settings for crawled multi-page sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawledConfig {
    /// Start pages; an unreachable root fails discovery
    pub roots: Vec<String>,

    /// URL path prefixes worth tracking; empty means the whole origin
    #[serde(default)]
    pub path_prefixes: Vec<String>,

    /// Upper bound on discovered pages
    #[serde(default = "defaults::max_pages")]
    pub max_pages: usize,

    /// Follow links beyond the roots
    #[serde(default = "defaults::enabled")]
    pub follow_links: bool,

    /// Content containers tried in order before falling back to the whole page
    #[serde(default = "defaults::content_selectors")]
    pub content_selectors: Vec<String>,
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

mod defaults {
    use super::{
        AdapterConfig, CrawledConfig, DocumentConfig, EnumeratedConfig, NotifyPolicy, SourceConfig,
    };

    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; docwatch/0.1)".into()
    }
    pub fn timeout() -> u64 {
        15
    }
    pub fn request_delay() -> u64 {
        300
    }
    pub fn max_concurrent() -> usize {
        4
    }

    // Storage defaults
    pub fn state_dir() -> String {
        "state".into()
    }

    // Notify defaults
    pub fn enabled() -> bool {
        true
    }
    pub fn max_items_per_section() -> usize {
        10
    }

    // Adapter defaults
    pub fn heading_selector() -> String {
        "h1[id], h2[id], h3[id]".into()
    }
    pub fn max_pages() -> usize {
        500
    }
    pub fn content_selectors() -> Vec<String> {
        vec![
            "main".into(),
            "article".into(),
            "div[class*=\"markdown\"]".into(),
            "div[class*=\"content\"]".into(),
        ]
    }

    fn last_updated_pattern() -> String {
        r"(?i)Last updated\s+\d+\s+(second|minute|hour|day|week|month|year)s?\s+ago".into()
    }

    fn crawled(roots: &[&str], prefixes: &[&str], max_pages: usize) -> CrawledConfig {
        CrawledConfig {
            roots: roots.iter().map(|s| s.to_string()).collect(),
            path_prefixes: prefixes.iter().map(|s| s.to_string()).collect(),
            max_pages,
            follow_links: true,
            content_selectors: content_selectors(),
        }
    }

    fn pinned(pages: &[&str]) -> CrawledConfig {
        CrawledConfig {
            max_pages: pages.len(),
            follow_links: false,
            ..crawled(pages, &[], pages.len())
        }
    }

    fn source(name: &str, display: &str, base_url: &str, adapter: AdapterConfig) -> SourceConfig {
        SourceConfig {
            name: name.to_string(),
            display_name: Some(display.to_string()),
            base_url: base_url.to_string(),
            storage_file: None,
            volatile_patterns: Vec::new(),
            notify: None,
            adapter,
        }
    }

    // Source defaults
    pub fn default_sources() -> Vec<SourceConfig> {
        let mut hyperliquid = source(
            "hyperliquid",
            "Hyperliquid",
            "https://hyperliquid.gitbook.io/hyperliquid-docs",
            AdapterConfig::Crawled(crawled(
                &[
                    "https://hyperliquid.gitbook.io/hyperliquid-docs",
                    "https://hyperliquid.gitbook.io/hyperliquid-docs/for-developers/api",
                    "https://hyperliquid.gitbook.io/hyperliquid-docs/trading",
                    "https://hyperliquid.gitbook.io/hyperliquid-docs/hypercore",
                    "https://hyperliquid.gitbook.io/hyperliquid-docs/hyperliquid-improvement-proposals-hips",
                ],
                &[
                    "/hyperliquid-docs/for-developers/api",
                    "/hyperliquid-docs/trading",
                    "/hyperliquid-docs/hypercore",
                    "/hyperliquid-docs/hyperliquid-improvement-proposals-hips",
                ],
                500,
            )),
        );
        hyperliquid.volatile_patterns = vec![last_updated_pattern()];

        let mut deribit = source(
            "deribit",
            "Deribit",
            "https://docs.deribit.com",
            AdapterConfig::Crawled(crawled(
                &[
                    "https://docs.deribit.com/articles/",
                    "https://docs.deribit.com/api-reference/",
                    "https://docs.deribit.com/subscriptions/",
                ],
                &["/articles/", "/api-reference/", "/subscriptions/"],
                1000,
            )),
        );
        deribit.notify = Some(NotifyPolicy {
            on_additions: true,
            on_modifications: false,
            on_deletions: false,
        });

        vec![
            source(
                "binance",
                "Binance",
                "https://developers.binance.com/docs",
                AdapterConfig::Enumerated(EnumeratedConfig {
                    documents: vec![
                        DocumentConfig {
                            key: "spot".into(),
                            url: "https://developers.binance.com/docs/binance-spot-api-docs"
                                .into(),
                        },
                        DocumentConfig {
                            key: "derivatives".into(),
                            url: "https://developers.binance.com/docs/derivatives/change-log"
                                .into(),
                        },
                    ],
                    heading_selector: heading_selector(),
                    scope_id: None,
                }),
            ),
            source(
                "bybit",
                "Bybit",
                "https://bybit-exchange.github.io/docs/v5/intro",
                AdapterConfig::Crawled(crawled(
                    &["https://bybit-exchange.github.io/docs/v5/intro"],
                    &["/docs/v5/"],
                    500,
                )),
            ),
            source(
                "coinbase",
                "Coinbase",
                "https://docs.cdp.coinbase.com",
                AdapterConfig::Crawled(pinned(&[
                    "https://docs.cdp.coinbase.com/exchange/changes/upcoming-changes",
                    "https://docs.cdp.coinbase.com/international-exchange/changes/upcoming-changes",
                    "https://docs.cdp.coinbase.com/prime/changes/upcoming-changes",
                    "https://docs.cdp.coinbase.com/derivatives/changes/changelog",
                ])),
            ),
            deribit,
            hyperliquid,
            source(
                "kraken",
                "Kraken",
                "https://docs.kraken.com/api/docs/change-log",
                AdapterConfig::Crawled(pinned(&["https://docs.kraken.com/api/docs/change-log"])),
            ),
            source(
                "okx",
                "OKX",
                "https://www.okx.com/docs-v5/log_en/",
                AdapterConfig::Enumerated(EnumeratedConfig {
                    documents: vec![DocumentConfig {
                        key: String::new(),
                        url: "https://www.okx.com/docs-v5/log_en/".into(),
                    }],
                    heading_selector: "h1[id], h2[id], h3[id], h4[id]".into(),
                    scope_id: Some("upcoming-changes".into()),
                }),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.crawler.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_concurrency() {
        let mut config = Config::default();
        config.crawler.max_concurrent = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_duplicate_sources() {
        let mut config = Config::default();
        let first = config.sources[0].clone();
        config.sources.push(first);
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_volatile_pattern() {
        let mut config = Config::default();
        config.sources[0].volatile_patterns = vec!["(unclosed".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_toml_with_nested_adapter() {
        let toml_str = r#"
            [crawler]
            request_delay_ms = 500

            [notify]
            enabled = false
            on_modifications = false

            [[sources]]
            name = "example"
            base_url = "https://docs.example.com"

            [sources.adapter]
            kind = "crawled"
            roots = ["https://docs.example.com/guide/"]
            path_prefixes = ["/guide/"]
            max_pages = 20

            [[sources]]
            name = "changelog"
            base_url = "https://docs.example.com/changelog"
            volatile_patterns = ["Generated at .*"]

            [sources.notify]
            on_deletions = true

            [sources.adapter]
            kind = "enumerated"
            scope_id = "upcoming"

            [[sources.adapter.documents]]
            url = "https://docs.example.com/changelog"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.crawler.request_delay_ms, 500);
        assert_eq!(config.crawler.max_concurrent, 4);
        assert!(!config.notify.enabled);
        assert!(!config.notify.policy.on_modifications);
        assert!(config.notify.policy.on_additions);
        assert_eq!(config.sources.len(), 2);

        match &config.sources[0].adapter {
            AdapterConfig::Crawled(cfg) => {
                assert_eq!(cfg.max_pages, 20);
                assert!(cfg.follow_links);
                assert!(!cfg.content_selectors.is_empty());
            }
            other => panic!("expected crawled adapter, got {other:?}"),
        }

        let changelog = config.source("changelog").unwrap();
        let policy = changelog.notify_policy(&config.notify);
        assert!(policy.on_additions);
        assert!(policy.on_modifications);
        assert!(policy.on_deletions);
        match &changelog.adapter {
            AdapterConfig::Enumerated(cfg) => {
                assert_eq!(cfg.scope_id.as_deref(), Some("upcoming"));
                assert_eq!(cfg.heading_selector, "h1[id], h2[id], h3[id]");
                assert!(cfg.documents[0].key.is_empty());
            }
            other => panic!("expected enumerated adapter, got {other:?}"),
        }
    }

    #[test]
    fn state_path_defaults_to_state_dir() {
        let config = Config::default();
        let bybit = config.source("bybit").unwrap();
        assert_eq!(
            config.state_path(bybit),
            PathBuf::from("state/bybit_docs_state.json")
        );
    }

    #[test]
    fn unknown_source_is_an_error() {
        let config = Config::default();
        assert!(matches!(
            config.source("nope"),
            Err(AppError::UnknownSource(_))
        ));
    }
}
