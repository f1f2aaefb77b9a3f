use crate::error::AnalyticsError;
use crate::report::{GroupOutcome, GroupStats, PerformanceStats};
use chrono::Datelike;
use core_types::{CompoundMethod, Frequency, TimeSeries};
use statrs::statistics::Statistics;
use tracing::{debug, warn};
use transforms::error::TransformError;
use transforms::{drawdown, resample, returns};

const DAYS_PER_YEAR: f64 = 365.25;

/// Options recognized by the statistics pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatsConfig {
    /// Compounding convention for deriving and aggregating periodic returns.
    pub method: CompoundMethod,
    /// Annualized risk-free rate used by the Sharpe and Sortino numerators.
    pub risk_free_rate: f64,
    /// Starting level when a return series has to be rebuilt into an index.
    pub base_index_value: f64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            method: CompoundMethod::Simple,
            risk_free_rate: 0.0,
            base_index_value: 100.0,
        }
    }
}

/// Whether an input series holds price levels or periodic returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesKind {
    Prices,
    Returns,
}

/// A stateless calculator deriving performance metrics from a time series.
#[derive(Debug, Default)]
pub struct StatsEngine {
    config: StatsConfig,
}

impl StatsEngine {
    pub fn new(config: StatsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StatsConfig {
        &self.config
    }

    /// The single-series entry point.
    ///
    /// Pipeline: normalize the input to a price index, derive native-frequency
    /// returns, infer the annualization frequency, derive drawdowns and
    /// calendar tables, and fill the fixed metric set.
    ///
    /// Malformed input (empty, too short, non-positive prices) fails loudly.
    /// Past that point no metric failure aborts the snapshot: anything
    /// ill-defined for this series is stored as `None`.
    pub fn calc_stats(
        &self,
        series: &TimeSeries,
        kind: SeriesKind,
    ) -> Result<PerformanceStats, AnalyticsError> {
        if series.is_empty() {
            return Err(AnalyticsError::EmptyInput);
        }
        let method = self.config.method;

        let prices = match kind {
            SeriesKind::Prices => series.clone(),
            SeriesKind::Returns => {
                returns::to_price_index(series, method, self.config.base_index_value)?
            }
        };
        let periodic = returns::to_returns(&prices, method)?;

        // The full-aggregation path never hard-fails on an unclassifiable
        // calendar; it degrades to the yearly convention.
        let frequency = match resample::infer_frequency(&periodic) {
            Ok(frequency) => frequency,
            Err(TransformError::AmbiguousFrequency(reason)) => {
                warn!(
                    series = %prices.name(),
                    %reason,
                    "falling back to yearly annualization"
                );
                Frequency::Yearly
            }
            Err(other) => return Err(other.into()),
        };
        let periods_per_year = frequency.periods_per_year();
        debug!(series = %prices.name(), %frequency, "aggregating statistics");

        let first = prices.first_observed();
        let last = prices.last_observed();

        let total_return = match (first, last) {
            (Some((_, first_price)), Some((_, last_price))) => {
                Some(last_price / first_price - 1.0)
            }
            _ => None,
        };

        let elapsed_years = match (first, last) {
            (Some((start, _)), Some((end, _))) => {
                (end - start).num_seconds() as f64 / (DAYS_PER_YEAR * 86_400.0)
            }
            _ => 0.0,
        };
        let cagr = total_return.and_then(|tr| {
            (elapsed_years > 0.0 && tr > -1.0)
                .then(|| (1.0 + tr).powf(1.0 / elapsed_years) - 1.0)
        });

        let observed: Vec<f64> = periodic.observed().map(|(_, r)| r).collect();

        let annual_volatility = (observed.len() >= 2)
            .then(|| observed.iter().copied().std_dev() * periods_per_year.sqrt());

        // De-annualize the configured rate to the series' own period length.
        let rf_period = (1.0 + self.config.risk_free_rate).powf(1.0 / periods_per_year) - 1.0;
        let excess: Vec<f64> = observed.iter().map(|r| r - rf_period).collect();

        let sharpe = (excess.len() >= 2)
            .then(|| {
                let std = excess.iter().copied().std_dev();
                (std > 0.0)
                    .then(|| excess.iter().copied().mean() / std * periods_per_year.sqrt())
            })
            .flatten();

        let sortino = (excess.len() >= 2)
            .then(|| {
                let downside_sq: f64 = excess
                    .iter()
                    .filter(|r| **r < 0.0)
                    .map(|r| r * r)
                    .sum();
                let downside_dev = (downside_sq / excess.len() as f64).sqrt();
                (downside_dev > 0.0).then(|| {
                    excess.iter().copied().mean() / downside_dev * periods_per_year.sqrt()
                })
            })
            .flatten();

        let max_dd = drawdown::max_drawdown(&prices).ok();
        let details = drawdown::drawdown_details(&prices).unwrap_or_default();

        let calmar = match (cagr, max_dd) {
            (Some(cagr), Some(max_dd)) if max_dd < 0.0 => Some(cagr / max_dd.abs()),
            _ => None,
        };

        let avg_drawdown = (!details.is_empty()).then(|| {
            details.iter().map(|d| d.episode.depth).sum::<f64>() / details.len() as f64
        });

        // Episode durations in observation counts; an open episode measures to
        // the series end.
        let last_idx = prices.len() - 1;
        let durations: Vec<usize> = details
            .iter()
            .map(|d| match d.length_to_recovery {
                Some(length) => length,
                None => {
                    let start_idx = prices
                        .index()
                        .binary_search(&d.episode.start)
                        .unwrap_or(0);
                    last_idx - start_idx
                }
            })
            .collect();
        let avg_drawdown_duration = (!durations.is_empty())
            .then(|| durations.iter().sum::<usize>() as f64 / durations.len() as f64);
        let longest_drawdown_duration = durations.iter().copied().max();

        let best_period = observed.iter().copied().fold(None, |acc: Option<f64>, r| {
            Some(acc.map_or(r, |a| a.max(r)))
        });
        let worst_period = observed.iter().copied().fold(None, |acc: Option<f64>, r| {
            Some(acc.map_or(r, |a| a.min(r)))
        });

        let wins = observed.iter().filter(|r| **r > 0.0).count();
        let losses = observed.iter().filter(|r| **r < 0.0).count();
        let win_loss_ratio = (losses > 0).then(|| wins as f64 / losses as f64);

        // Calendar tables are part of the fixed vocabulary but undefined for
        // series coarser than their grid; those degrade to missing.
        let monthly_returns = resample::to_month_year_table(&periodic, method).ok();
        let yearly_returns = resample::resample_returns(&periodic, Frequency::Yearly, method)
            .ok()
            .map(|yearly| {
                yearly
                    .iter()
                    .map(|(ts, value)| (ts.year(), value))
                    .collect()
            });

        Ok(PerformanceStats {
            name: prices.name().to_string(),
            start: prices.index()[0],
            end: prices.index()[last_idx],
            frequency,
            periods_per_year,
            risk_free_rate: self.config.risk_free_rate,
            total_return,
            cagr,
            annual_volatility,
            sharpe,
            sortino,
            calmar,
            max_drawdown: max_dd,
            avg_drawdown,
            avg_drawdown_duration,
            longest_drawdown_duration,
            best_period,
            worst_period,
            win_loss_ratio,
            monthly_returns,
            yearly_returns,
        })
    }

    /// Runs the single-series pipeline independently over a group of series.
    ///
    /// The group call never fails as a whole: a failing series is recorded as
    /// a `Failed` entry in input order and the rest proceed.
    pub fn calc_group_stats(&self, series: &[TimeSeries], kind: SeriesKind) -> GroupStats {
        let entries = series
            .iter()
            .map(|s| {
                let outcome = match self.calc_stats(s, kind) {
                    Ok(stats) => GroupOutcome::Ok {
                        stats: Box::new(stats),
                    },
                    Err(error) => {
                        warn!(series = %s.name(), %error, "series failed in group aggregation");
                        GroupOutcome::Failed {
                            error: error.to_string(),
                        }
                    }
                };
                (s.name().to_string(), outcome)
            })
            .collect();
        GroupStats { entries }
    }
}
