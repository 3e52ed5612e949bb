// src/models/mod.rs

//! Domain models for the monitor.
//!
//! Units, snapshots and change sets describe what was observed; the config
//! types describe what to watch and how.

mod change_set;
mod config;
mod snapshot;
mod unit;

// Re-export all public types
pub use change_set::{ChangeSet, ModifiedUnit};
pub use config::{
    AdapterConfig, Config, CrawledConfig, CrawlerConfig, DocumentConfig, EnumeratedConfig,
    NotifyConfig, NotifyPolicy, SourceConfig, StorageConfig, TelegramConfig,
};
pub use snapshot::Snapshot;
pub use unit::{ContentUnit, Fingerprint, UnitDescriptor};
