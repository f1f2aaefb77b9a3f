use crate::error::CoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named, time-indexed sequence of numeric observations.
///
/// Timestamps are strictly increasing and immutable once constructed. Values may
/// be missing (`None`); a missing observation is always explicit, never a NaN
/// sentinel, and non-finite values are rejected at construction. Every
/// transformation produces a new `TimeSeries` rather than mutating in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    name: String,
    index: Vec<DateTime<Utc>>,
    values: Vec<Option<f64>>,
}

impl TimeSeries {
    /// Constructs a series from parallel index and value vectors.
    ///
    /// Fails if the vectors differ in length, if the index is not strictly
    /// increasing, or if any present value is NaN or infinite.
    pub fn new(
        name: impl Into<String>,
        index: Vec<DateTime<Utc>>,
        values: Vec<Option<f64>>,
    ) -> Result<Self, CoreError> {
        if index.len() != values.len() {
            return Err(CoreError::LengthMismatch {
                index: index.len(),
                values: values.len(),
            });
        }
        for (i, pair) in index.windows(2).enumerate() {
            if pair[1] <= pair[0] {
                return Err(CoreError::UnorderedIndex(i + 1));
            }
        }
        for (i, value) in values.iter().enumerate() {
            if let Some(v) = value {
                if !v.is_finite() {
                    return Err(CoreError::NonFiniteValue(i));
                }
            }
        }
        Ok(Self {
            name: name.into(),
            index,
            values,
        })
    }

    /// Convenience constructor from `(timestamp, value)` pairs.
    pub fn from_points(
        name: impl Into<String>,
        points: Vec<(DateTime<Utc>, Option<f64>)>,
    ) -> Result<Self, CoreError> {
        let (index, values) = points.into_iter().unzip();
        Self::new(name, index, values)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn index(&self) -> &[DateTime<Utc>] {
        &self.index
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    /// Iterates over all `(timestamp, value)` pairs, including missing ones.
    pub fn iter(&self) -> impl Iterator<Item = (DateTime<Utc>, Option<f64>)> + '_ {
        self.index.iter().copied().zip(self.values.iter().copied())
    }

    /// Iterates over present observations only.
    pub fn observed(&self) -> impl Iterator<Item = (DateTime<Utc>, f64)> + '_ {
        self.iter().filter_map(|(ts, v)| v.map(|v| (ts, v)))
    }

    /// The first present observation, if any.
    pub fn first_observed(&self) -> Option<(DateTime<Utc>, f64)> {
        self.observed().next()
    }

    /// The last present observation, if any.
    pub fn last_observed(&self) -> Option<(DateTime<Utc>, f64)> {
        self.observed().last()
    }

    /// Returns a copy of this series under a different name.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            index: self.index.clone(),
            values: self.values.clone(),
        }
    }
}

/// A collection of named value columns sharing one timestamp axis.
///
/// Column insertion order is preserved; it determines the ordering of group
/// statistics downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    index: Vec<DateTime<Utc>>,
    columns: Vec<(String, Vec<Option<f64>>)>,
}

impl Frame {
    /// Constructs a frame, validating the shared index once and every column
    /// against it.
    pub fn new(
        index: Vec<DateTime<Utc>>,
        columns: Vec<(String, Vec<Option<f64>>)>,
    ) -> Result<Self, CoreError> {
        for (i, pair) in index.windows(2).enumerate() {
            if pair[1] <= pair[0] {
                return Err(CoreError::UnorderedIndex(i + 1));
            }
        }
        for (_, values) in &columns {
            if values.len() != index.len() {
                return Err(CoreError::LengthMismatch {
                    index: index.len(),
                    values: values.len(),
                });
            }
            for (i, value) in values.iter().enumerate() {
                if let Some(v) = value {
                    if !v.is_finite() {
                        return Err(CoreError::NonFiniteValue(i));
                    }
                }
            }
        }
        Ok(Self { index, columns })
    }

    pub fn index(&self) -> &[DateTime<Utc>] {
        &self.index
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// Extracts a single column as an owned `TimeSeries`.
    pub fn column(&self, name: &str) -> Result<TimeSeries, CoreError> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(n, values)| TimeSeries {
                name: n.clone(),
                index: self.index.clone(),
                values: values.clone(),
            })
            .ok_or_else(|| CoreError::UnknownColumn(name.to_string()))
    }

    /// Splits the frame into per-column series, preserving insertion order.
    pub fn into_series(self) -> Vec<TimeSeries> {
        let index = self.index;
        self.columns
            .into_iter()
            .map(|(name, values)| TimeSeries {
                name,
                index: index.clone(),
                values,
            })
            .collect()
    }
}
