use serde::{Deserialize, Serialize};

/// The compounding convention used when converting between prices and returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompoundMethod {
    /// Period-over-period percentage change: `(p1 / p0) - 1`.
    Simple,
    /// Continuously compounded change: `ln(p1 / p0)`.
    Log,
}

impl Default for CompoundMethod {
    fn default() -> Self {
        CompoundMethod::Simple
    }
}

/// The fixed set of observation frequencies, ordered from finest to coarsest.
///
/// The derived `Ord` follows declaration order, so `Frequency::Daily <
/// Frequency::Monthly` reads as "daily is finer than monthly".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl Frequency {
    /// The annualization factor conventionally associated with this frequency.
    ///
    /// Daily uses the 252 trading-day convention rather than calendar days.
    pub fn periods_per_year(&self) -> f64 {
        match self {
            Frequency::Daily => 252.0,
            Frequency::Weekly => 52.0,
            Frequency::Monthly => 12.0,
            Frequency::Quarterly => 4.0,
            Frequency::Yearly => 1.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Quarterly => "quarterly",
            Frequency::Yearly => "yearly",
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
