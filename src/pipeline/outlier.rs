//! Forward-fill outlier filter.
//!
//! One filter per (station, metric) stream. Values must be fed in increasing
//! time order; the normalizer guarantees that.

use tracing::debug;

use crate::models::MetricKind;

/// Inclusive physical plausibility bounds for a metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidRange {
    pub min: f64,
    pub max: f64,
}

impl ValidRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Bounds used for each metric kind.
    pub fn for_metric(kind: MetricKind) -> Self {
        match kind {
            MetricKind::ExternalTemperature | MetricKind::InternalTemperature => {
                ValidRange::new(-40.0, 45.0)
            }
            MetricKind::Humidity => ValidRange::new(0.0, 100.0),
            MetricKind::Pressure => ValidRange::new(800.0, 1100.0),
            MetricKind::SolarRadiation => ValidRange::new(0.0, 2000.0),
            MetricKind::WindSpeed => ValidRange::new(0.0, 200.0),
            MetricKind::WindDirection => ValidRange::new(0.0, 360.0),
            MetricKind::DayRain => ValidRange::new(0.0, 500.0),
            MetricKind::TotalRain => ValidRange::new(0.0, 10_000.0),
        }
    }
}

/// Stateful filter that replaces implausible readings with the last accepted
/// one.
#[derive(Debug, Clone)]
pub struct OutlierFilter {
    metric: MetricKind,
    range: ValidRange,
    last_valid: Option<f64>,
}

impl OutlierFilter {
    pub fn new(metric: MetricKind) -> Self {
        Self::with_range(metric, ValidRange::for_metric(metric))
    }

    pub fn with_range(metric: MetricKind, range: ValidRange) -> Self {
        Self {
            metric,
            range,
            last_valid: None,
        }
    }

    #[cfg(test)]
    pub fn last_valid(&self) -> Option<f64> {
        self.last_valid
    }

    /// Accept a reading, or fall back to the last accepted one.
    ///
    /// Missing, NaN and out-of-range inputs leave the state untouched.
    pub fn accept(&mut self, raw: Option<f64>) -> Option<f64> {
        // ---
        match raw {
            Some(value) if !value.is_nan() && self.range.contains(value) => {
                self.last_valid = Some(value);
                Some(value)
            }
            Some(value) => {
                debug!(
                    metric = %self.metric,
                    rejected = value,
                    fill = ?self.last_valid,
                    "reading outside valid range, forward-filling"
                );
                self.last_valid
            }
            None => self.last_valid,
        }
    }
}
