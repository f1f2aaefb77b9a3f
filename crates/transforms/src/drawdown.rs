use crate::error::TransformError;
use chrono::{DateTime, Utc};
use core_types::TimeSeries;
use serde::{Deserialize, Serialize};

/// One contiguous decline below a running peak.
///
/// `start` is the last peak before the decline, `trough` the minimum point,
/// and `recovery` the first time the series re-exceeds the prior peak (`None`
/// if the episode is still open at series end). `depth` is the drawdown value
/// at the trough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawdownEpisode {
    pub start: DateTime<Utc>,
    pub trough: DateTime<Utc>,
    pub recovery: Option<DateTime<Utc>>,
    pub depth: f64,
}

/// A [`DrawdownEpisode`] augmented with durations in observation counts, used
/// for average/longest drawdown duration statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawdownDetail {
    pub episode: DrawdownEpisode,
    pub length_to_trough: usize,
    pub length_to_recovery: Option<usize>,
}

/// Derives the running-maximum-relative drawdown series from a price series.
///
/// Single pass: value at time t is `price[t] / running_max(price[0..=t]) - 1`,
/// always <= 0, with the running maximum seeded at the first present
/// observation. Missing prices carry the last known running maximum forward and
/// emit missing at that position.
pub fn to_drawdown_series(prices: &TimeSeries) -> Result<TimeSeries, TransformError> {
    if prices.is_empty() {
        return Err(TransformError::InsufficientData { needed: 1, got: 0 });
    }
    for (timestamp, value) in prices.iter() {
        if let Some(value) = value {
            if value <= 0.0 {
                return Err(TransformError::InvalidPrice { timestamp, value });
            }
        }
    }

    let mut running_max: Option<f64> = None;
    let values = prices
        .values()
        .iter()
        .map(|value| {
            value.map(|price| {
                let peak = running_max.map_or(price, |m| m.max(price));
                running_max = Some(peak);
                price / peak - 1.0
            })
        })
        .collect();

    Ok(TimeSeries::new(prices.name(), prices.index().to_vec(), values)?)
}

/// The most negative value of the drawdown series.
///
/// Returns 0 for a monotonically non-decreasing series.
pub fn max_drawdown(prices: &TimeSeries) -> Result<f64, TransformError> {
    let drawdown = to_drawdown_series(prices)?;
    Ok(drawdown.observed().map(|(_, v)| v).fold(0.0, f64::min))
}

struct OpenEpisode {
    start_idx: usize,
    trough_idx: usize,
    depth: f64,
}

/// Extracts the time-ordered, non-overlapping drawdown episodes of a series.
pub fn drawdown_episodes(prices: &TimeSeries) -> Result<Vec<DrawdownEpisode>, TransformError> {
    Ok(drawdown_details(prices)?
        .into_iter()
        .map(|detail| detail.episode)
        .collect())
}

/// Episodes with durations in observation counts.
///
/// `length_to_trough` counts observations from the peak to the trough;
/// `length_to_recovery` from the peak to the recovery point, `None` while the
/// episode remains open.
pub fn drawdown_details(prices: &TimeSeries) -> Result<Vec<DrawdownDetail>, TransformError> {
    let drawdown = to_drawdown_series(prices)?;
    let index = drawdown.index();

    let mut details = Vec::new();
    let mut open: Option<OpenEpisode> = None;
    // The first present observation is at its own peak, so a peak index always
    // precedes any negative drawdown.
    let mut last_peak_idx = 0;

    for (i, value) in drawdown.values().iter().enumerate() {
        let Some(value) = *value else { continue };
        if value < 0.0 {
            match open.as_mut() {
                None => {
                    open = Some(OpenEpisode {
                        start_idx: last_peak_idx,
                        trough_idx: i,
                        depth: value,
                    });
                }
                Some(episode) => {
                    if value < episode.depth {
                        episode.depth = value;
                        episode.trough_idx = i;
                    }
                }
            }
        } else {
            if let Some(episode) = open.take() {
                details.push(DrawdownDetail {
                    episode: DrawdownEpisode {
                        start: index[episode.start_idx],
                        trough: index[episode.trough_idx],
                        recovery: Some(index[i]),
                        depth: episode.depth,
                    },
                    length_to_trough: episode.trough_idx - episode.start_idx,
                    length_to_recovery: Some(i - episode.start_idx),
                });
            }
            last_peak_idx = i;
        }
    }

    if let Some(episode) = open {
        details.push(DrawdownDetail {
            episode: DrawdownEpisode {
                start: index[episode.start_idx],
                trough: index[episode.trough_idx],
                recovery: None,
                depth: episode.depth,
            },
            length_to_trough: episode.trough_idx - episode.start_idx,
            length_to_recovery: None,
        });
    }

    Ok(details)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    fn daily(prices: &[Option<f64>]) -> TimeSeries {
        let index: Vec<DateTime<Utc>> = (0..prices.len())
            .map(|i| {
                Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
                    + chrono::Duration::days(i as i64)
            })
            .collect();
        TimeSeries::new("p", index, prices.to_vec()).unwrap()
    }

    #[test]
    fn drawdown_matches_worked_example() {
        let prices = daily(&[Some(100.0), Some(110.0), Some(99.0), Some(121.0)]);
        let drawdown = to_drawdown_series(&prices).unwrap();
        let values: Vec<f64> = drawdown.values().iter().map(|v| v.unwrap()).collect();
        assert_relative_eq!(values[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(values[1], 0.0, epsilon = 1e-12);
        assert_relative_eq!(values[2], -0.10, max_relative = 1e-12);
        assert_relative_eq!(values[3], 0.0, epsilon = 1e-12);
        assert_relative_eq!(
            max_drawdown(&prices).unwrap(),
            -0.10,
            max_relative = 1e-12
        );
    }

    #[test]
    fn drawdown_is_never_positive() {
        let prices = daily(&[Some(100.0), Some(95.0), Some(105.0), Some(90.0), Some(120.0)]);
        let drawdown = to_drawdown_series(&prices).unwrap();
        for (_, value) in drawdown.observed() {
            assert!(value <= 0.0);
        }
    }

    #[test]
    fn monotonic_series_has_zero_drawdown() {
        let prices = daily(&[Some(100.0), Some(100.0), Some(101.0), Some(105.0)]);
        assert_eq!(max_drawdown(&prices).unwrap(), 0.0);
    }

    #[test]
    fn empty_series_is_an_error() {
        let prices = daily(&[]);
        assert!(matches!(
            max_drawdown(&prices),
            Err(TransformError::InsufficientData { .. })
        ));
    }

    #[test]
    fn missing_prices_carry_the_running_max() {
        let prices = daily(&[Some(100.0), None, Some(90.0)]);
        let drawdown = to_drawdown_series(&prices).unwrap();
        assert_eq!(drawdown.values()[1], None);
        assert_relative_eq!(
            drawdown.values()[2].unwrap(),
            -0.10,
            max_relative = 1e-12
        );
    }

    #[test]
    fn episode_matches_worked_example() {
        let prices = daily(&[Some(100.0), Some(110.0), Some(99.0), Some(121.0)]);
        let episodes = drawdown_episodes(&prices).unwrap();
        assert_eq!(episodes.len(), 1);
        let episode = &episodes[0];
        assert_eq!(episode.start, prices.index()[1]);
        assert_eq!(episode.trough, prices.index()[2]);
        assert_eq!(episode.recovery, Some(prices.index()[3]));
        assert_relative_eq!(episode.depth, -0.10, max_relative = 1e-12);
    }

    #[test]
    fn open_episode_has_no_recovery() {
        let prices = daily(&[Some(100.0), Some(90.0), Some(95.0)]);
        let details = drawdown_details(&prices).unwrap();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].episode.recovery, None);
        assert_eq!(details[0].length_to_trough, 1);
        assert_eq!(details[0].length_to_recovery, None);
    }

    #[test]
    fn episodes_partition_negative_timestamps() {
        let prices = daily(&[
            Some(100.0),
            Some(90.0),
            Some(101.0),
            Some(95.0),
            Some(102.0),
            Some(80.0),
        ]);
        let drawdown = to_drawdown_series(&prices).unwrap();
        let details = drawdown_details(&prices).unwrap();
        assert_eq!(details.len(), 3);

        // Ordered and non-overlapping.
        for pair in details.windows(2) {
            let end = pair[0].episode.recovery.unwrap();
            assert!(end <= pair[1].episode.start);
        }

        // Every negative timestamp falls inside exactly one episode.
        for (ts, value) in drawdown.observed() {
            if value < 0.0 {
                let containing = details
                    .iter()
                    .filter(|d| {
                        d.episode.start < ts
                            && match d.episode.recovery {
                                Some(recovery) => ts <= recovery,
                                None => true,
                            }
                    })
                    .count();
                assert_eq!(containing, 1, "timestamp {ts} not covered exactly once");
            }
        }

        assert_eq!(details[2].episode.recovery, None);
    }

    #[test]
    fn durations_count_observations() {
        let prices = daily(&[
            Some(100.0),
            Some(98.0),
            Some(95.0),
            Some(99.0),
            Some(101.0),
        ]);
        let details = drawdown_details(&prices).unwrap();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].length_to_trough, 2);
        assert_eq!(details[0].length_to_recovery, Some(4));
    }
}
