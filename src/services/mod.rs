//! Service layer: how units are discovered and fetched.
//!
//! - `SourceAdapter`: the contract the engine drives
//! - `EnumeratedAdapter`: anchored sections of a few documents
//! - `CrawledAdapter`: whole pages found by a `BoundedCrawler`
//! - `AdapterRegistry`: source name → adapter

mod adapter;
mod crawled;
mod enumerated;
pub mod extract;
mod registry;

pub use adapter::SourceAdapter;
pub use crawled::{BoundedCrawler, CrawledAdapter};
pub use enumerated::{EnumeratedAdapter, section_text};
pub use registry::{AdapterRegistry, build_adapter};
