//! # Meridian Analytics Engine
//!
//! This crate turns raw price or return series into a frozen set of named
//! performance metrics. It acts as the "unbiased judge" of the system.
//!
//! ## Architectural Principles
//!
//! - **Layer 2 Logic:** A pure aggregation crate. It composes the transforms
//!   crate and has no knowledge of external systems.
//! - **Stateless Calculation:** The `StatsEngine` is a stateless calculator. It
//!   takes an immutable series as input and produces a `PerformanceStats`
//!   snapshot as output, which makes it reliable, easy to test, and safe for
//!   callers to run over many series in parallel.
//! - **Graceful Degradation:** A metric that cannot be computed is stored as
//!   missing rather than aborting the snapshot, and a series that fails inside
//!   a group is reported with an error marker rather than dropped.
//!
//! ## Public API
//!
//! - `StatsEngine`: the main struct containing the calculation pipeline.
//! - `PerformanceStats` / `GroupStats`: the standardized result snapshots.
//! - `AnalyticsError`: the specific error types returned from this crate.

pub mod engine;
pub mod error;
pub mod report;

// Re-export the key components to create a clean, public-facing API.
pub use engine::{SeriesKind, StatsConfig, StatsEngine};
pub use error::AnalyticsError;
pub use report::{GroupOutcome, GroupStats, PerformanceStats};
