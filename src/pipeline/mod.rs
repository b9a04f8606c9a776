//! Normalization pipeline gateway.
//!
//! Raw backend records go through timestamp parsing, ordering, outlier
//! filtering and Madrid localization here. Trend, derived-metric and extremes
//! helpers are re-exported so callers only depend on this module.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::PipelineError;
use crate::models::{CanonicalSample, MetricKind, RawSample, Station};

mod closest;
mod derived;
mod extremes;
mod outlier;
mod timestamp;
mod timezone;
mod trend;

pub use derived::{feels_like, FeelsLike};
pub use extremes::{backend_extremes, daily_extremes, merge_extremes, DailyExtremes};
pub use timezone::to_madrid;
pub use trend::{compute_all_trends, TrendMetric, TrendResult};
#[cfg(test)]
pub use trend::TrendCategory;

use outlier::OutlierFilter;
use timestamp::parse_raw_timestamp;

// ---

/// Normalizer for one station's stream.
///
/// Owns one outlier filter per metric kind, so no filter state is ever shared
/// between metrics or stations.
#[derive(Debug)]
pub struct SeriesNormalizer {
    station: Station,
    filters: BTreeMap<MetricKind, OutlierFilter>,
    last_instant: Option<DateTime<Utc>>,
}

impl SeriesNormalizer {
    pub fn new(station: Station) -> Self {
        let filters = MetricKind::ALL
            .iter()
            .map(|kind| (*kind, OutlierFilter::new(*kind)))
            .collect();
        Self {
            station,
            filters,
            last_instant: None,
        }
    }

    pub fn station(&self) -> Station {
        self.station
    }

    /// Turn raw records into canonical samples, oldest first.
    ///
    /// Records with a missing or unparseable timestamp are logged and dropped.
    /// Records not newer than anything this normalizer already processed are
    /// skipped so forward-fill only ever moves forward in time.
    pub fn ingest(&mut self, records: &[RawSample]) -> Vec<CanonicalSample> {
        // ---
        let mut timed: Vec<(DateTime<Utc>, &RawSample)> = records
            .iter()
            .filter_map(|record| match instant_of(record) {
                Ok(instant) => Some((instant, record)),
                Err(e) => {
                    warn!(station = %self.station, "dropping sample: {}", e);
                    None
                }
            })
            .collect();
        timed.sort_by_key(|(instant, _)| *instant);

        let mut out = Vec::with_capacity(timed.len());
        for (instant, record) in timed {
            if self.last_instant.is_some_and(|last| instant <= last) {
                debug!(station = %self.station, %instant, "skipping sample not newer than last processed");
                continue;
            }
            self.last_instant = Some(instant);

            let values = self
                .filters
                .iter_mut()
                .map(|(kind, filter)| (*kind, filter.accept(record.metric(*kind))))
                .collect();

            out.push(CanonicalSample {
                instant_utc: instant,
                local_time: to_madrid(instant),
                values,
            });
        }
        out
    }
}

fn instant_of(record: &RawSample) -> Result<DateTime<Utc>, PipelineError> {
    let raw = record.timestamp().ok_or(PipelineError::MissingTimestamp)?;
    parse_raw_timestamp(raw)
}

#[cfg(test)]
mod tests {
    // ---
    use super::outlier::ValidRange;
    use super::trend::{compute_trend, TrendWindow};
    use super::*;
    use chrono::TimeZone;
    use serde_json::{json, Value};

    fn records(values: Vec<Value>) -> Vec<RawSample> {
        values.into_iter().filter_map(RawSample::from_value).collect()
    }

    #[test]
    fn test_burgos_fifteen_minute_scenario() {
        // ---
        let raws = records(vec![
            json!({ "currentTime": "2025-05-10T08:00:00Z",
                    "temperature": { "degrees": 18.0 }, "relativeHumidity": 50 }),
            json!({ "currentTime": "2025-05-10T08:15:00Z",
                    "temperature": { "degrees": 18.0 }, "relativeHumidity": 50 }),
            json!({ "currentTime": "2025-05-10T08:30:00Z",
                    "temperature": { "degrees": 19.0 }, "relativeHumidity": 55 }),
        ]);

        let series = SeriesNormalizer::new(Station::Burgos).ingest(&raws);
        assert_eq!(series.len(), 3);

        let trend = compute_trend(&series, TrendMetric::Temperature, TrendWindow::FifteenMinutes)
            .unwrap();
        assert_eq!(trend.delta, 1.0);
        assert_eq!(trend.category, TrendCategory::StrongUp);
    }

    #[test]
    fn test_mixed_formats_sorted_and_localized() {
        // ---
        let raws = records(vec![
            json!({ "timestamp": "2025-08-24T10:00:00Z", "external_temperature": 25.0 }),
            json!({ "timestamp": "24-08-2025 11:50", "external_temperature": 24.5 }),
            json!({ "timestamp": "2025-08-24T09:40:00", "external_temperature": 24.0 }),
        ]);

        let series = SeriesNormalizer::new(Station::Sarria).ingest(&raws);
        let instants: Vec<_> = series.iter().map(|s| s.instant_utc).collect();
        assert_eq!(
            instants,
            vec![
                Utc.with_ymd_and_hms(2025, 8, 24, 9, 40, 0).unwrap(),
                Utc.with_ymd_and_hms(2025, 8, 24, 9, 50, 0).unwrap(),
                Utc.with_ymd_and_hms(2025, 8, 24, 10, 0, 0).unwrap(),
            ]
        );
        assert_eq!(series[1].local_time.hour, 11);
        assert_eq!(series[1].local_time.minute, 50);
    }

    #[test]
    fn test_bad_timestamps_dropped_without_stopping() {
        // ---
        let raws = records(vec![
            json!({ "timestamp": "garbage", "external_temperature": 20.0 }),
            json!({ "external_temperature": 20.0 }),
            json!({ "timestamp": "2025-02-01T12:00:00Z", "external_temperature": 9.5 }),
        ]);

        let series = SeriesNormalizer::new(Station::Sarria).ingest(&raws);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].value(MetricKind::ExternalTemperature), Some(9.5));
    }

    #[test]
    fn test_outliers_forward_filled_in_time_order() {
        // ---
        // Delivered newest first; filtering must still run oldest first.
        let raws = records(vec![
            json!({ "timestamp": "2025-02-01T12:10:00Z", "external_temperature": 21.0, "humidity": 1050 }),
            json!({ "timestamp": "2025-02-01T12:05:00Z", "external_temperature": 9999, "humidity": 60 }),
            json!({ "timestamp": "2025-02-01T12:00:00Z", "external_temperature": 20.1, "humidity": 58 }),
        ]);

        let series = SeriesNormalizer::new(Station::Sarria).ingest(&raws);
        let temps: Vec<_> = series
            .iter()
            .map(|s| s.value(MetricKind::ExternalTemperature))
            .collect();
        let hums: Vec<_> = series.iter().map(|s| s.value(MetricKind::Humidity)).collect();
        assert_eq!(temps, vec![Some(20.1), Some(20.1), Some(21.0)]);
        assert_eq!(hums, vec![Some(58.0), Some(60.0), Some(60.0)]);
    }

    #[test]
    fn test_state_carries_across_ingests() {
        // ---
        let mut normalizer = SeriesNormalizer::new(Station::Sarria);
        let first = records(vec![
            json!({ "timestamp": "2025-02-01T12:00:00Z", "pressure": 1015.2 }),
        ]);
        let second = records(vec![
            json!({ "timestamp": "2025-02-01T12:00:00Z", "pressure": 1015.2 }),
            json!({ "timestamp": "2025-02-01T12:00:30Z", "pressure": 0 }),
        ]);

        assert_eq!(normalizer.ingest(&first).len(), 1);
        let next = normalizer.ingest(&second);
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].value(MetricKind::Pressure), Some(1015.2));
    }

    #[test]
    fn test_every_value_within_range() {
        // ---
        let raws = records(vec![
            json!({ "timestamp": "2025-02-01T12:00:00Z", "solar_radiation": 2500, "wind_speed": -3,
                    "wind_direction": 720, "day_rain": 1.2 }),
        ]);
        let series = SeriesNormalizer::new(Station::Sarria).ingest(&raws);
        for (kind, value) in &series[0].values {
            if let Some(v) = value {
                assert!(ValidRange::for_metric(*kind).contains(*v), "{kind} = {v}");
            }
        }
        assert_eq!(series[0].value(MetricKind::DayRain), Some(1.2));
        assert_eq!(series[0].value(MetricKind::SolarRadiation), None);
    }
}
