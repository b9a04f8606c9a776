//! Daily maximum/minimum per metric.
//!
//! Computed from the canonical series as a fallback; days the backend reports
//! itself (Burgos daily-extremes endpoint) replace the computed ones.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::models::{CanonicalSample, MetricKind, RawSample};
use crate::pipeline::timestamp::parse_timestamp;

/// Extremes of one metric over one Madrid calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyExtremes {
    pub date: NaiveDate,
    pub metric: MetricKind,
    pub max_value: f64,
    pub max_time: Option<DateTime<Utc>>,
    pub min_value: f64,
    pub min_time: Option<DateTime<Utc>>,
}

/// Scan a series and report per-day extremes of `metric`, oldest day first.
/// Ties keep the earliest instant.
pub fn daily_extremes(series: &[CanonicalSample], metric: MetricKind) -> Vec<DailyExtremes> {
    // ---
    let mut ordered: Vec<&CanonicalSample> = series.iter().collect();
    ordered.sort_by_key(|s| s.instant_utc);

    let mut days: BTreeMap<NaiveDate, DailyExtremes> = BTreeMap::new();
    for sample in ordered {
        let (Some(value), Some(date)) = (sample.value(metric), sample.local_time.date()) else {
            continue;
        };

        let entry = days.entry(date).or_insert_with(|| DailyExtremes {
            date,
            metric,
            max_value: value,
            max_time: Some(sample.instant_utc),
            min_value: value,
            min_time: Some(sample.instant_utc),
        });
        if value > entry.max_value {
            entry.max_value = value;
            entry.max_time = Some(sample.instant_utc);
        }
        if value < entry.min_value {
            entry.min_value = value;
            entry.min_time = Some(sample.instant_utc);
        }
    }

    days.into_values().collect()
}

fn first_number(record: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| match record.get(*key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn first_instant(record: &Value, keys: &[&str]) -> Option<DateTime<Utc>> {
    keys.iter()
        .find_map(|key| record.get(*key)?.as_str())
        .and_then(|s| parse_timestamp(s).ok())
}

/// Parse one record of the Burgos daily-extremes payload.
///
/// Records without a date or without both bounds are skipped.
pub fn backend_extremes(record: &RawSample) -> Option<DailyExtremes> {
    // ---
    let value = record.as_value();
    let date = value
        .get("date")?
        .as_str()
        .and_then(|s| NaiveDate::parse_from_str(s.get(..10)?, "%Y-%m-%d").ok())?;

    let max_value = first_number(value, &["max_temp", "maxTemp"])?;
    let min_value = first_number(value, &["min_temp", "minTemp"])?;
    if max_value.is_nan() || min_value.is_nan() {
        return None;
    }

    Some(DailyExtremes {
        date,
        metric: MetricKind::ExternalTemperature,
        max_value,
        max_time: first_instant(value, &["max_temp_time", "maxTempTime"]),
        min_value,
        min_time: first_instant(value, &["min_temp_time", "minTempTime"]),
    })
}

/// Backend days replace computed days with the same date and metric.
pub fn merge_extremes(
    computed: Vec<DailyExtremes>,
    backend: Vec<DailyExtremes>,
) -> Vec<DailyExtremes> {
    // ---
    let mut merged: BTreeMap<(NaiveDate, MetricKind), DailyExtremes> = computed
        .into_iter()
        .map(|e| ((e.date, e.metric), e))
        .collect();
    for extremes in backend {
        merged.insert((extremes.date, extremes.metric), extremes);
    }
    merged.into_values().collect()
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::pipeline::timezone::to_madrid;
    use chrono::TimeZone;
    use serde_json::json;

    fn sample(instant: DateTime<Utc>, temp: Option<f64>) -> CanonicalSample {
        let mut values = BTreeMap::new();
        values.insert(MetricKind::ExternalTemperature, temp);
        CanonicalSample {
            instant_utc: instant,
            local_time: to_madrid(instant),
            values,
        }
    }

    fn utc(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_extremes_per_local_day() {
        // ---
        let series = vec![
            sample(utc(1, 4), Some(17.0)),
            sample(utc(1, 13), Some(31.5)),
            sample(utc(1, 18), None),
            // 23:00 UTC on the 1st is already the 2nd in Madrid.
            sample(utc(1, 23), Some(16.0)),
            sample(utc(2, 12), Some(29.0)),
        ];

        let days = daily_extremes(&series, MetricKind::ExternalTemperature);
        assert_eq!(days.len(), 2);

        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2025, 7, 1).unwrap());
        assert_eq!(days[0].max_value, 31.5);
        assert_eq!(days[0].max_time, Some(utc(1, 13)));
        assert_eq!(days[0].min_value, 17.0);

        assert_eq!(days[1].date, NaiveDate::from_ymd_opt(2025, 7, 2).unwrap());
        assert_eq!(days[1].min_value, 16.0);
        assert_eq!(days[1].min_time, Some(utc(1, 23)));
        assert_eq!(days[1].max_value, 29.0);
    }

    #[test]
    fn test_ties_keep_earliest_instant() {
        // ---
        let series = vec![sample(utc(3, 15), Some(20.0)), sample(utc(3, 10), Some(20.0))];
        let days = daily_extremes(&series, MetricKind::ExternalTemperature);
        assert_eq!(days[0].max_time, Some(utc(3, 10)));
        assert_eq!(days[0].min_time, Some(utc(3, 10)));
    }

    #[test]
    fn test_backend_record_parsing() {
        // ---
        let record = RawSample::from_value(json!({
            "date": "2025-07-01",
            "maxTemp": 33.2,
            "maxTempTime": "2025-07-01T14:10:00Z",
            "min_temp": "14.8"
        }))
        .unwrap();

        let extremes = backend_extremes(&record).unwrap();
        assert_eq!(extremes.max_value, 33.2);
        assert_eq!(extremes.min_value, 14.8);
        assert_eq!(extremes.max_time, Some(Utc.with_ymd_and_hms(2025, 7, 1, 14, 10, 0).unwrap()));
        assert_eq!(extremes.min_time, None);

        let partial = RawSample::from_value(json!({ "date": "2025-07-01", "max_temp": 30 })).unwrap();
        assert!(backend_extremes(&partial).is_none());
    }

    #[test]
    fn test_backend_days_supersede_computed() {
        // ---
        let computed = daily_extremes(
            &[sample(utc(1, 12), Some(30.0)), sample(utc(2, 12), Some(28.0))],
            MetricKind::ExternalTemperature,
        );
        let backend = vec![DailyExtremes {
            date: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
            metric: MetricKind::ExternalTemperature,
            max_value: 31.0,
            max_time: None,
            min_value: 15.0,
            min_time: None,
        }];

        let merged = merge_extremes(computed, backend);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].max_value, 31.0);
        assert_eq!(merged[1].max_value, 28.0);
    }
}
