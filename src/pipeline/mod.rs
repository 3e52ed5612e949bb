//! Change-detection pipeline.
//!
//! - `Normalizer` / `fingerprint`: canonical text and its SHA-256
//! - `Differ`: new / modified / deleted / unchanged classification
//! - `CircuitBreaker`: optional guard against unit-count collapses
//! - `Monitor`: one run for one source
//! - `run_sources`: several sources concurrently

mod circuit_breaker;
mod diff;
mod hash;
mod line_diff;
mod monitor;
mod normalize;
mod run_all;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerResult};
pub use diff::Differ;
pub use hash::fingerprint;
pub use line_diff::{DiffLine, diff_lines, render_diff};
pub use monitor::{FailedFetch, Monitor, RunOptions, RunReport};
pub use normalize::Normalizer;
pub use run_all::{
    SourceOutcome, print_final_summary, print_report, run_source, run_sources,
};
