//! # Meridian Transforms
//!
//! Pure transformation functions over `TimeSeries` values: price-to-return
//! conversion, drawdown derivation, and calendar resampling. These are the
//! building blocks the statistics aggregator is composed from.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of
//!   external systems and depends only on `core-types` (Layer 0).
//! - **Immutability:** Every function takes a borrowed series and returns a
//!   freshly constructed one. Nothing here holds state between calls, which is
//!   what makes group aggregation trivially parallel-safe for callers.
//!
//! ## Public API
//!
//! - `returns`: `to_returns` / `to_price_index` under a `CompoundMethod`.
//! - `drawdown`: drawdown series, max drawdown, and episode extraction.
//! - `resample`: frequency inference and calendar-bucketed compounding.
//! - `TransformError`: the specific error types returned from this crate.

pub mod drawdown;
pub mod error;
pub mod resample;
pub mod returns;

// Re-export the key components to create a clean, public-facing API.
pub use drawdown::{DrawdownDetail, DrawdownEpisode};
pub use error::TransformError;
pub use resample::{FrequencyRule, MonthYearRow, MonthYearTable};
