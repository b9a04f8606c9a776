//! Short-term trend indicators.
//!
//! Each metric has its own bucket thresholds and its own comparison order.
//! The order matters: values that miss every explicit branch fall through to
//! the weak-down bucket, and the humidity branches are checked strong before
//! weak with the strong bound being the smaller one. Both behaviours are
//! kept exactly as the dashboard has always shown them.

use chrono::Duration;
use serde::Serialize;

use crate::models::{CanonicalSample, MetricKind};
use crate::pipeline::closest::find_closest;

/// Discrete trend bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendCategory {
    StrongUp,
    Up,
    Flat,
    Down,
    StrongDown,
}

/// Metrics that carry a trend indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendMetric {
    Temperature,
    Humidity,
    Pressure,
}

impl TrendMetric {
    pub const ALL: [TrendMetric; 3] = [
        TrendMetric::Temperature,
        TrendMetric::Humidity,
        TrendMetric::Pressure,
    ];

    pub fn metric_kind(self) -> MetricKind {
        match self {
            TrendMetric::Temperature => MetricKind::ExternalTemperature,
            TrendMetric::Humidity => MetricKind::Humidity,
            TrendMetric::Pressure => MetricKind::Pressure,
        }
    }
}

/// Look-back window of a trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendWindow {
    FifteenMinutes,
    OneHour,
    OneDay,
}

impl TrendWindow {
    pub const ALL: [TrendWindow; 3] = [
        TrendWindow::FifteenMinutes,
        TrendWindow::OneHour,
        TrendWindow::OneDay,
    ];

    pub fn minutes(self) -> i64 {
        match self {
            TrendWindow::FifteenMinutes => 15,
            TrendWindow::OneHour => 60,
            TrendWindow::OneDay => 1440,
        }
    }
}

/// Bucket a signed delta for a metric.
pub fn classify(delta: f64, metric: TrendMetric) -> TrendCategory {
    match metric {
        TrendMetric::Temperature => classify_temperature(delta),
        TrendMetric::Humidity => classify_humidity(delta),
        TrendMetric::Pressure => classify_pressure(delta),
    }
}

fn classify_temperature(delta: f64) -> TrendCategory {
    if delta.abs() < 0.2 {
        TrendCategory::Flat
    } else if delta > 0.5 {
        TrendCategory::StrongUp
    } else if delta > 0.2 {
        TrendCategory::Up
    } else if delta < -0.5 {
        TrendCategory::StrongDown
    } else {
        TrendCategory::Down
    }
}

fn classify_humidity(delta: f64) -> TrendCategory {
    if delta.abs() < 1.0 {
        TrendCategory::Flat
    } else if delta > 1.0 {
        TrendCategory::StrongUp
    } else if delta > 3.0 {
        // unreachable after the branch above, kept for parity with the display
        TrendCategory::Up
    } else if delta < -3.0 {
        TrendCategory::StrongDown
    } else {
        TrendCategory::Down
    }
}

fn classify_pressure(delta: f64) -> TrendCategory {
    if delta == 0.0 {
        TrendCategory::Flat
    } else if delta > 0.2 {
        TrendCategory::StrongUp
    } else if delta > 0.0 {
        TrendCategory::Up
    } else if delta < -0.2 {
        TrendCategory::StrongDown
    } else {
        TrendCategory::Down
    }
}

/// A computed trend. Ephemeral, rebuilt every poll cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendResult {
    pub metric: TrendMetric,
    pub window_minutes: i64,
    pub delta: f64,
    pub category: TrendCategory,
}

/// Trend of `metric` between the newest sample and the one closest to
/// `window` earlier.
///
/// Only samples carrying a value for the metric take part. `None` when that
/// leaves fewer than two distinct samples.
pub fn compute_trend(
    series: &[CanonicalSample],
    metric: TrendMetric,
    window: TrendWindow,
) -> Option<TrendResult> {
    // ---
    let kind = metric.metric_kind();
    let usable: Vec<&CanonicalSample> = series
        .iter()
        .filter(|s| s.value(kind).is_some())
        .collect();

    let current = usable.iter().copied().max_by_key(|s| s.instant_utc)?;
    let target = current.instant_utc - Duration::minutes(window.minutes());
    let reference = find_closest(&usable, target)?;
    if reference.instant_utc == current.instant_utc {
        return None;
    }

    let delta = current.value(kind)? - reference.value(kind)?;
    let delta = (delta * 100.0).round() / 100.0;

    Some(TrendResult {
        metric,
        window_minutes: window.minutes(),
        delta,
        category: classify(delta, metric),
    })
}

/// Every metric/window combination that can be computed.
pub fn compute_all_trends(series: &[CanonicalSample]) -> Vec<TrendResult> {
    // ---
    TrendMetric::ALL
        .iter()
        .flat_map(|metric| {
            TrendWindow::ALL
                .iter()
                .filter_map(move |window| compute_trend(series, *metric, *window))
        })
        .collect()
}
