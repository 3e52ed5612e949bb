//! Source adapter contract.

use async_trait::async_trait;
use regex::Regex;

use crate::error::Result;
use crate::models::UnitDescriptor;
use crate::utils::http::FetchContext;

/// Discovers and fetches the content units of one documentation source.
///
/// `discover` must report the same ids for the same live content, though not
/// necessarily in the same order. `fetch` must fail rather than return empty
/// text when a unit cannot be retrieved.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Registry key of the source.
    fn name(&self) -> &str;

    /// Enumerate the units currently published. Failure is fatal for the run.
    async fn discover(&self, ctx: &FetchContext) -> Result<Vec<UnitDescriptor>>;

    /// Extracted text of a single unit.
    async fn fetch(&self, ctx: &FetchContext, unit: &UnitDescriptor) -> Result<String>;

    /// Deep link for a unit id, used for snapshot entries stored without one.
    fn locate(&self, id: &str) -> String;

    /// Time-varying fragments removed before hashing.
    fn volatile_patterns(&self) -> &[Regex] {
        &[]
    }
}
