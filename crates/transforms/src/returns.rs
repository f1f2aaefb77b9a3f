use crate::error::TransformError;
use crate::resample::median_spacing;
use chrono::Duration;
use core_types::{CompoundMethod, TimeSeries};

/// Converts a price series into a period-over-period return series.
///
/// The output is one element shorter than the input: no return is defined for
/// the first observation. A return is missing whenever either of its endpoint
/// prices is missing; gaps are never interpolated.
///
/// Both methods require strictly positive prices. A zero or negative price is a
/// hard error, never silently clamped.
pub fn to_returns(
    prices: &TimeSeries,
    method: CompoundMethod,
) -> Result<TimeSeries, TransformError> {
    if prices.len() < 2 {
        return Err(TransformError::InsufficientData {
            needed: 2,
            got: prices.len(),
        });
    }
    for (timestamp, value) in prices.iter() {
        if let Some(value) = value {
            if value <= 0.0 {
                return Err(TransformError::InvalidPrice { timestamp, value });
            }
        }
    }

    let index = prices.index()[1..].to_vec();
    let values = prices
        .values()
        .windows(2)
        .map(|pair| match (pair[0], pair[1]) {
            (Some(p0), Some(p1)) => Some(match method {
                CompoundMethod::Simple => p1 / p0 - 1.0,
                CompoundMethod::Log => (p1 / p0).ln(),
            }),
            _ => None,
        })
        .collect();

    Ok(TimeSeries::new(prices.name(), index, values)?)
}

/// Rebuilds a cumulative price/index series from a return series.
///
/// The inverse of [`to_returns`]: the output is one element longer than the
/// input and starts at `base`. Simple returns compound multiplicatively; log
/// returns accumulate in log space and are exponentiated back out.
///
/// The return series does not carry the timestamp of the original first price,
/// so the base observation is keyed one median spacing before the first return.
/// A missing return leaves the index level unchanged and emits missing at that
/// position.
pub fn to_price_index(
    returns: &TimeSeries,
    method: CompoundMethod,
    base: f64,
) -> Result<TimeSeries, TransformError> {
    if returns.is_empty() {
        return Err(TransformError::InsufficientData { needed: 1, got: 0 });
    }
    let first_ts = returns.index()[0];
    if !base.is_finite() || base <= 0.0 {
        return Err(TransformError::InvalidPrice {
            timestamp: first_ts,
            value: base,
        });
    }

    let spacing = median_spacing(returns.index()).unwrap_or_else(|| Duration::days(1));
    let mut index = Vec::with_capacity(returns.len() + 1);
    let mut values = Vec::with_capacity(returns.len() + 1);
    index.push(first_ts - spacing);
    values.push(Some(base));

    let mut level = base;
    for (timestamp, value) in returns.iter() {
        index.push(timestamp);
        match value {
            Some(r) => {
                level = match method {
                    CompoundMethod::Simple => level * (1.0 + r),
                    CompoundMethod::Log => level * r.exp(),
                };
                values.push(Some(level));
            }
            None => values.push(None),
        }
    }

    Ok(TimeSeries::new(returns.name(), index, values)?)
}
