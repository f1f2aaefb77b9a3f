use chrono::{DateTime, Utc};
use core_types::Frequency;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("Not enough data: {needed} observations required, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("Invalid price {value} at {timestamp}: prices must be strictly positive")]
    InvalidPrice {
        timestamp: DateTime<Utc>,
        value: f64,
    },

    #[error("Cannot resample {native} data to the finer {target} frequency")]
    UnsupportedResample {
        native: Frequency,
        target: Frequency,
    },

    #[error("Cannot infer a native frequency: {0}")]
    AmbiguousFrequency(String),

    #[error(transparent)]
    Core(#[from] core_types::CoreError),
}
