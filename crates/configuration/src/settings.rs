use core_types::{CompoundMethod, Frequency};
use serde::Deserialize;

/// The root configuration structure for the application.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    pub analytics: AnalyticsSettings,
}

/// Options for the statistics pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyticsSettings {
    /// Return compounding convention: "simple" or "log".
    #[serde(default)]
    pub method: CompoundMethod,
    /// Annualized risk-free rate used by the Sharpe and Sortino ratios.
    #[serde(default)]
    pub risk_free_rate: f64,
    /// Optional coarser frequency to resample inputs to before aggregation.
    #[serde(default)]
    pub target_frequency: Option<Frequency>,
    /// Starting level when rebuilding a price index from returns.
    #[serde(default = "default_base_index_value")]
    pub base_index_value: f64,
}

fn default_base_index_value() -> f64 {
    100.0
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            method: CompoundMethod::default(),
            risk_free_rate: 0.0,
            target_frequency: None,
            base_index_value: default_base_index_value(),
        }
    }
}
