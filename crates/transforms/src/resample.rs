use crate::error::TransformError;
use chrono::{DateTime, Datelike, Duration, Utc};
use core_types::{CompoundMethod, Frequency, TimeSeries};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Thresholds (in days of median timestamp spacing) used to classify a series'
/// native frequency.
///
/// The classification is a heuristic over irregular calendars, so the bands are
/// deliberately wide: daily data with weekend gaps has a median spacing of one
/// to three days, monthly data lands near thirty. Spacing beyond `yearly_max_days`
/// is not classified at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyRule {
    pub daily_max_days: f64,
    pub weekly_max_days: f64,
    pub monthly_max_days: f64,
    pub quarterly_max_days: f64,
    pub yearly_max_days: f64,
}

impl Default for FrequencyRule {
    fn default() -> Self {
        Self {
            daily_max_days: 4.0,
            weekly_max_days: 17.5,
            monthly_max_days: 45.0,
            quarterly_max_days: 182.0,
            yearly_max_days: 500.0,
        }
    }
}

impl FrequencyRule {
    /// Classifies a median spacing, in days, into the nearest frequency.
    pub fn classify(&self, spacing_days: f64) -> Result<Frequency, TransformError> {
        if spacing_days <= 0.0 {
            return Err(TransformError::AmbiguousFrequency(format!(
                "non-positive median spacing of {spacing_days} days"
            )));
        }
        if spacing_days <= self.daily_max_days {
            Ok(Frequency::Daily)
        } else if spacing_days <= self.weekly_max_days {
            Ok(Frequency::Weekly)
        } else if spacing_days <= self.monthly_max_days {
            Ok(Frequency::Monthly)
        } else if spacing_days <= self.quarterly_max_days {
            Ok(Frequency::Quarterly)
        } else if spacing_days <= self.yearly_max_days {
            Ok(Frequency::Yearly)
        } else {
            Err(TransformError::AmbiguousFrequency(format!(
                "median spacing of {spacing_days:.1} days is coarser than yearly"
            )))
        }
    }
}

/// Median gap between consecutive timestamps, `None` for fewer than two.
pub(crate) fn median_spacing(index: &[DateTime<Utc>]) -> Option<Duration> {
    if index.len() < 2 {
        return None;
    }
    let mut gaps: Vec<i64> = index
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).num_seconds())
        .collect();
    gaps.sort_unstable();
    Some(Duration::seconds(gaps[gaps.len() / 2]))
}

/// Infers the native frequency of a series from its median timestamp spacing,
/// using the default classification thresholds.
pub fn infer_frequency(series: &TimeSeries) -> Result<Frequency, TransformError> {
    infer_frequency_with(series, &FrequencyRule::default())
}

/// Like [`infer_frequency`], with caller-supplied thresholds.
pub fn infer_frequency_with(
    series: &TimeSeries,
    rule: &FrequencyRule,
) -> Result<Frequency, TransformError> {
    let spacing = median_spacing(series.index()).ok_or_else(|| {
        TransformError::AmbiguousFrequency(format!(
            "need at least two observations, got {}",
            series.len()
        ))
    })?;
    rule.classify(spacing.num_seconds() as f64 / 86_400.0)
}

/// Calendar bucket identity for a timestamp at a given frequency. Buckets are
/// contiguous under a sorted index, which lets resampling run in one pass.
fn bucket_key(ts: DateTime<Utc>, frequency: Frequency) -> (i32, u32) {
    match frequency {
        Frequency::Daily => (ts.year(), ts.ordinal()),
        Frequency::Weekly => (ts.iso_week().year(), ts.iso_week().week()),
        Frequency::Monthly => (ts.year(), ts.month()),
        Frequency::Quarterly => (ts.year(), (ts.month() - 1) / 3),
        Frequency::Yearly => (ts.year(), 0),
    }
}

/// Ensures the requested target is not finer than the series' native frequency.
///
/// When the native frequency cannot be inferred the check is skipped with a
/// warning; the aggregation path must stay total.
fn check_target(series: &TimeSeries, target: Frequency) -> Result<(), TransformError> {
    match infer_frequency(series) {
        Ok(native) if target < native => {
            Err(TransformError::UnsupportedResample { native, target })
        }
        Ok(_) => Ok(()),
        Err(TransformError::AmbiguousFrequency(reason)) => {
            warn!(%reason, "skipping resample frequency check");
            Ok(())
        }
        Err(other) => Err(other),
    }
}

/// Aggregates a return series to a coarser frequency by compounding the
/// constituent returns of each calendar bucket.
///
/// Simple returns compound as `prod(1 + r) - 1`, log returns as `sum(r)`; a
/// bucket is never averaged. Each bucket is keyed on its last constituent
/// timestamp, so a monthly figure lands on the month's final observed date.
/// Partial head/tail buckets are included as computed from whatever
/// constituents exist; callers needing strictly complete periods must filter
/// explicitly.
pub fn resample_returns(
    returns: &TimeSeries,
    target: Frequency,
    method: CompoundMethod,
) -> Result<TimeSeries, TransformError> {
    if returns.is_empty() {
        return Err(TransformError::InsufficientData { needed: 1, got: 0 });
    }
    check_target(returns, target)?;

    let mut index = Vec::new();
    let mut values = Vec::new();
    let mut current: Option<((i32, u32), DateTime<Utc>, Option<f64>)> = None;

    let flush = |acc: Option<f64>| -> Option<f64> {
        acc.map(|a| match method {
            CompoundMethod::Simple => a - 1.0,
            CompoundMethod::Log => a,
        })
    };

    for (ts, value) in returns.iter() {
        let key = bucket_key(ts, target);
        match current.take() {
            Some((current_key, _, acc)) if current_key == key => {
                let acc = match value {
                    Some(r) => Some(match method {
                        CompoundMethod::Simple => acc.unwrap_or(1.0) * (1.0 + r),
                        CompoundMethod::Log => acc.unwrap_or(0.0) + r,
                    }),
                    None => acc,
                };
                current = Some((key, ts, acc));
            }
            previous => {
                if let Some((_, last_ts, acc)) = previous {
                    index.push(last_ts);
                    values.push(flush(acc));
                }
                let acc = value.map(|r| match method {
                    CompoundMethod::Simple => 1.0 + r,
                    CompoundMethod::Log => r,
                });
                current = Some((key, ts, acc));
            }
        }
    }
    if let Some((_, last_ts, acc)) = current {
        index.push(last_ts);
        values.push(flush(acc));
    }

    Ok(TimeSeries::new(returns.name(), index, values)?)
}

/// Aggregates a price series to a coarser frequency by taking the last present
/// observation of each calendar bucket.
pub fn resample_prices(
    prices: &TimeSeries,
    target: Frequency,
) -> Result<TimeSeries, TransformError> {
    if prices.is_empty() {
        return Err(TransformError::InsufficientData { needed: 1, got: 0 });
    }
    check_target(prices, target)?;

    let mut index = Vec::new();
    let mut values = Vec::new();
    let mut current: Option<((i32, u32), DateTime<Utc>, Option<f64>)> = None;

    for (ts, value) in prices.iter() {
        let key = bucket_key(ts, target);
        match current.take() {
            Some((current_key, _, last_value)) if current_key == key => {
                current = Some((key, ts, value.or(last_value)));
            }
            previous => {
                if let Some((_, last_ts, last_value)) = previous {
                    index.push(last_ts);
                    values.push(last_value);
                }
                current = Some((key, ts, value));
            }
        }
    }
    if let Some((_, last_ts, last_value)) = current {
        index.push(last_ts);
        values.push(last_value);
    }

    Ok(TimeSeries::new(prices.name(), index, values)?)
}

/// One calendar year of monthly returns plus the compounded yearly total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthYearRow {
    pub year: i32,
    pub months: [Option<f64>; 12],
    pub total: Option<f64>,
}

/// A year-by-month grid of compounded returns.
///
/// Cells without data stay missing, never zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthYearTable {
    pub rows: Vec<MonthYearRow>,
}

/// Builds the month x year return grid by resampling to monthly and placing
/// each compounded return at its calendar cell. The yearly total column
/// compounds the year's present months.
pub fn to_month_year_table(
    returns: &TimeSeries,
    method: CompoundMethod,
) -> Result<MonthYearTable, TransformError> {
    let monthly = resample_returns(returns, Frequency::Monthly, method)?;

    let mut years: BTreeMap<i32, [Option<f64>; 12]> = BTreeMap::new();
    for (ts, value) in monthly.iter() {
        let cell = &mut years.entry(ts.year()).or_insert([None; 12])[ts.month0() as usize];
        *cell = value;
    }

    let rows = years
        .into_iter()
        .map(|(year, months)| {
            let total = months
                .iter()
                .flatten()
                .fold(None, |acc: Option<f64>, r| {
                    Some(match method {
                        CompoundMethod::Simple => acc.unwrap_or(1.0) * (1.0 + r),
                        CompoundMethod::Log => acc.unwrap_or(0.0) + r,
                    })
                })
                .map(|a| match method {
                    CompoundMethod::Simple => a - 1.0,
                    CompoundMethod::Log => a,
                });
            MonthYearRow {
                year,
                months,
                total,
            }
        })
        .collect();

    Ok(MonthYearTable { rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    fn day(i: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap() + Duration::days(i)
    }

    /// Deterministic daily return series spanning several months.
    fn daily_returns(n: usize) -> TimeSeries {
        let index: Vec<DateTime<Utc>> = (0..n).map(|i| day(i as i64)).collect();
        let values: Vec<Option<f64>> = (0..n)
            .map(|i| Some(0.002 * ((i as f64) * 0.7).sin()))
            .collect();
        TimeSeries::new("r", index, values).unwrap()
    }

    #[test]
    fn classifies_common_spacings() {
        let rule = FrequencyRule::default();
        assert_eq!(rule.classify(1.0).unwrap(), Frequency::Daily);
        assert_eq!(rule.classify(3.0).unwrap(), Frequency::Daily);
        assert_eq!(rule.classify(7.0).unwrap(), Frequency::Weekly);
        assert_eq!(rule.classify(30.4).unwrap(), Frequency::Monthly);
        assert_eq!(rule.classify(91.0).unwrap(), Frequency::Quarterly);
        assert_eq!(rule.classify(365.25).unwrap(), Frequency::Yearly);
        assert!(matches!(
            rule.classify(600.0),
            Err(TransformError::AmbiguousFrequency(_))
        ));
    }

    #[test]
    fn infers_daily_through_weekend_gaps() {
        // Mon-Fri observations: median gap is one day despite weekend jumps.
        let index: Vec<DateTime<Utc>> = (0..20)
            .map(|i| day(i + (i / 5) * 2))
            .collect();
        let values = vec![Some(0.0); 20];
        let series = TimeSeries::new("r", index, values).unwrap();
        assert_eq!(infer_frequency(&series).unwrap(), Frequency::Daily);
    }

    #[test]
    fn single_observation_is_ambiguous() {
        let series = TimeSeries::new("r", vec![day(0)], vec![Some(0.01)]).unwrap();
        assert!(matches!(
            infer_frequency(&series),
            Err(TransformError::AmbiguousFrequency(_))
        ));
    }

    #[test]
    fn finer_target_is_unsupported() {
        let index: Vec<DateTime<Utc>> = (0..6)
            .map(|i| Utc.with_ymd_and_hms(2023, 1 + 2 * i, 28, 0, 0, 0).unwrap())
            .collect();
        let series = TimeSeries::new("r", index, vec![Some(0.01); 6]).unwrap();
        let result = resample_returns(&series, Frequency::Daily, CompoundMethod::Simple);
        assert!(matches!(
            result,
            Err(TransformError::UnsupportedResample {
                target: Frequency::Daily,
                ..
            })
        ));
    }

    #[test]
    fn resampling_to_native_frequency_is_identity() {
        let returns = daily_returns(30);
        let resampled =
            resample_returns(&returns, Frequency::Daily, CompoundMethod::Simple).unwrap();
        assert_eq!(resampled.index(), returns.index());
        for (a, b) in resampled.values().iter().zip(returns.values()) {
            assert_relative_eq!(a.unwrap(), b.unwrap(), epsilon = 1e-15);
        }
    }

    #[test]
    fn buckets_compound_rather_than_average() {
        // Two half-month returns of 10% compound to 21%, not 10%.
        let index = vec![
            Utc.with_ymd_and_hms(2023, 3, 10, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2023, 3, 24, 0, 0, 0).unwrap(),
        ];
        let series = TimeSeries::new("r", index.clone(), vec![Some(0.10), Some(0.10)]).unwrap();
        let monthly =
            resample_returns(&series, Frequency::Monthly, CompoundMethod::Simple).unwrap();
        assert_eq!(monthly.len(), 1);
        assert_eq!(monthly.index()[0], index[1]);
        assert_relative_eq!(monthly.values()[0].unwrap(), 0.21, max_relative = 1e-12);
    }

    #[test]
    fn compounding_is_associative_across_frequencies() {
        let returns = daily_returns(420);
        for method in [CompoundMethod::Simple, CompoundMethod::Log] {
            let monthly = resample_returns(&returns, Frequency::Monthly, method).unwrap();
            let via_monthly =
                resample_returns(&monthly, Frequency::Yearly, method).unwrap();
            let direct = resample_returns(&returns, Frequency::Yearly, method).unwrap();
            assert_eq!(via_monthly.len(), direct.len());
            for (a, b) in via_monthly.values().iter().zip(direct.values()) {
                assert_relative_eq!(a.unwrap(), b.unwrap(), max_relative = 1e-9);
            }
        }
    }

    #[test]
    fn log_buckets_sum() {
        let index = vec![
            Utc.with_ymd_and_hms(2023, 3, 10, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2023, 3, 24, 0, 0, 0).unwrap(),
        ];
        let series = TimeSeries::new("r", index, vec![Some(0.05), Some(0.03)]).unwrap();
        let monthly = resample_returns(&series, Frequency::Monthly, CompoundMethod::Log).unwrap();
        assert_relative_eq!(monthly.values()[0].unwrap(), 0.08, max_relative = 1e-12);
    }

    #[test]
    fn all_missing_bucket_stays_missing() {
        let index = vec![
            Utc.with_ymd_and_hms(2023, 3, 10, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2023, 3, 24, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2023, 4, 14, 0, 0, 0).unwrap(),
        ];
        let series =
            TimeSeries::new("r", index, vec![None, None, Some(0.02)]).unwrap();
        let monthly =
            resample_returns(&series, Frequency::Monthly, CompoundMethod::Simple).unwrap();
        assert_eq!(monthly.values()[0], None);
        assert_relative_eq!(monthly.values()[1].unwrap(), 0.02, max_relative = 1e-12);
    }

    #[test]
    fn prices_resample_to_last_observation() {
        let index = vec![
            Utc.with_ymd_and_hms(2023, 3, 10, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2023, 3, 24, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2023, 4, 28, 0, 0, 0).unwrap(),
        ];
        let series = TimeSeries::new(
            "p",
            index.clone(),
            vec![Some(100.0), Some(104.0), Some(110.0)],
        )
        .unwrap();
        let monthly = resample_prices(&series, Frequency::Monthly).unwrap();
        assert_eq!(monthly.len(), 2);
        assert_eq!(monthly.index()[0], index[1]);
        assert_eq!(monthly.values()[0], Some(104.0));
        assert_eq!(monthly.values()[1], Some(110.0));
    }

    #[test]
    fn month_year_table_places_cells() {
        // Daily returns from 2023-01-02 onwards; 420 days reach into 2024.
        let returns = daily_returns(420);
        let table = to_month_year_table(&returns, CompoundMethod::Simple).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].year, 2023);
        assert_eq!(table.rows[1].year, 2024);
        // 2023 is fully populated.
        assert!(table.rows[0].months.iter().all(|m| m.is_some()));
        assert!(table.rows[0].total.is_some());
        // 2024 stops mid-year; later months stay missing, not zero.
        assert!(table.rows[1].months[0].is_some());
        assert!(table.rows[1].months[11].is_none());

        // Yearly total agrees with a direct yearly resample.
        let yearly =
            resample_returns(&returns, Frequency::Yearly, CompoundMethod::Simple).unwrap();
        assert_relative_eq!(
            table.rows[0].total.unwrap(),
            yearly.values()[0].unwrap(),
            max_relative = 1e-9
        );
    }
}
