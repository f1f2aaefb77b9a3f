use chrono::{DateTime, Utc};
use core_types::Frequency;
use serde::{Deserialize, Serialize};
use transforms::MonthYearTable;

/// A comprehensive, standardized snapshot of one series' performance.
///
/// This struct is the final output of the `StatsEngine` and serves as the data
/// transfer object for results throughout the entire system. The field set is
/// fixed: every snapshot carries the same metric vocabulary regardless of
/// input, with `None` marking a metric that was not well-defined for that
/// series. Ratios are annualized using the inferred native frequency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceStats {
    // I. Identity
    pub name: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Native frequency inferred from median timestamp spacing; yearly when the
    /// spacing was too irregular to classify.
    pub frequency: Frequency,
    pub periods_per_year: f64,
    /// The annualized risk-free rate the ratios were computed against.
    pub risk_free_rate: f64,

    // II. Growth
    pub total_return: Option<f64>,
    pub cagr: Option<f64>,

    // III. Risk and Ratios
    pub annual_volatility: Option<f64>,
    pub sharpe: Option<f64>,
    pub sortino: Option<f64>,
    pub calmar: Option<f64>,

    // IV. Drawdown
    pub max_drawdown: Option<f64>,
    pub avg_drawdown: Option<f64>,
    /// Mean drawdown duration in observation counts; open episodes measure to
    /// the series end.
    pub avg_drawdown_duration: Option<f64>,
    pub longest_drawdown_duration: Option<usize>,

    // V. Periodic Returns
    pub best_period: Option<f64>,
    pub worst_period: Option<f64>,
    /// Count of positive periods over count of negative periods.
    pub win_loss_ratio: Option<f64>,

    // VI. Calendar Tables
    /// Missing when the native frequency is coarser than monthly.
    pub monthly_returns: Option<MonthYearTable>,
    /// Compounded return per calendar year, keyed on the year's last observed
    /// date.
    pub yearly_returns: Option<Vec<(i32, Option<f64>)>>,
}

/// Outcome of the single-series pipeline inside a group run.
///
/// A failed series stays in the group with its error attached; it is never
/// silently omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum GroupOutcome {
    Ok { stats: Box<PerformanceStats> },
    Failed { error: String },
}

/// Per-series statistics for a group of series, in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    pub entries: Vec<(String, GroupOutcome)>,
}

impl GroupStats {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&GroupOutcome> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, outcome)| outcome)
    }

    /// Iterates successful snapshots in input order.
    pub fn stats(&self) -> impl Iterator<Item = &PerformanceStats> {
        self.entries.iter().filter_map(|(_, outcome)| match outcome {
            GroupOutcome::Ok { stats } => Some(stats.as_ref()),
            GroupOutcome::Failed { .. } => None,
        })
    }
}
