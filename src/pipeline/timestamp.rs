//! Timestamp parsing.
//!
//! Accepts RFC 3339 strings, ISO-8601 strings without an offset (read as
//! UTC), the legacy `DD-MM-YYYY HH:MM` format (read as Europe/Madrid wall
//! clock), and numeric epochs in seconds or milliseconds.

use chrono::{DateTime, Duration, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Europe::Madrid;

use crate::error::PipelineError;
use crate::models::RawTimestamp;

const ISO_NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const LEGACY_FORMATS: [&str; 2] = ["%d-%m-%Y %H:%M", "%d-%m-%Y %H:%M:%S"];

/// Epoch values above this are milliseconds (year 2286 in seconds).
const EPOCH_MILLIS_THRESHOLD: f64 = 10_000_000_000.0;

// ---

/// Parse a timestamp string into a UTC instant.
pub fn parse_timestamp(input: &str) -> Result<DateTime<Utc>, PipelineError> {
    // ---
    let text = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }

    for fmt in ISO_NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    for fmt in LEGACY_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return Ok(madrid_wall_clock_to_utc(naive));
        }
    }

    Err(PipelineError::UnparseableTimestamp(input.to_string()))
}

/// Parse whatever a raw record carries in its timestamp slot.
pub fn parse_raw_timestamp(raw: RawTimestamp<'_>) -> Result<DateTime<Utc>, PipelineError> {
    // ---
    match raw {
        RawTimestamp::Text(text) => parse_timestamp(text),
        RawTimestamp::Epoch(value) => {
            let millis = if value.abs() >= EPOCH_MILLIS_THRESHOLD {
                value
            } else {
                value * 1000.0
            };
            if !millis.is_finite() {
                return Err(PipelineError::UnparseableTimestamp(value.to_string()));
            }
            DateTime::from_timestamp_millis(millis.round() as i64)
                .ok_or_else(|| PipelineError::UnparseableTimestamp(value.to_string()))
        }
    }
}

/// Resolve a Madrid wall-clock reading to an instant.
///
/// Repeated hour at the autumn change: the first occurrence (summer time).
/// Skipped hour at the spring change: read with the winter offset, which
/// lands the instant just after the jump.
fn madrid_wall_clock_to_utc(naive: NaiveDateTime) -> DateTime<Utc> {
    // ---
    if let Some(local) = Madrid.from_local_datetime(&naive).earliest() {
        return local.with_timezone(&Utc);
    }

    let before_gap = naive - Duration::hours(3);
    let offset = Madrid.offset_from_utc_datetime(&before_gap).fix();
    Utc.from_utc_datetime(&(naive - Duration::seconds(i64::from(offset.local_minus_utc()))))
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn test_legacy_summer_matches_iso() {
        // ---
        let legacy = parse_timestamp("24-08-2025 11:50").unwrap();
        let iso = parse_timestamp("2025-08-24T09:50:00Z").unwrap();
        assert_eq!(legacy, iso);
        assert_eq!(legacy, utc(2025, 8, 24, 9, 50));
    }

    #[test]
    fn test_legacy_winter_uses_plus_one() {
        // ---
        let parsed = parse_timestamp("15-01-2025 08:00").unwrap();
        assert_eq!(parsed, utc(2025, 1, 15, 7, 0));
    }

    #[test]
    fn test_iso_without_suffix_is_utc() {
        // ---
        assert_eq!(
            parse_timestamp("2025-08-24T09:50:00").unwrap(),
            utc(2025, 8, 24, 9, 50)
        );
        assert_eq!(
            parse_timestamp("2025-08-24T09:50:00.000").unwrap(),
            utc(2025, 8, 24, 9, 50)
        );
        assert_eq!(
            parse_timestamp("2025-08-24 09:50:00").unwrap(),
            utc(2025, 8, 24, 9, 50)
        );
    }

    #[test]
    fn test_iso_with_offset() {
        // ---
        assert_eq!(
            parse_timestamp("2025-08-24T11:50:00+02:00").unwrap(),
            utc(2025, 8, 24, 9, 50)
        );
    }

    #[test]
    fn test_parsing_is_idempotent() {
        // ---
        for input in ["24-08-2025 11:50", "2025-03-30T01:30:00Z", "2025-08-24T09:50"] {
            assert_eq!(parse_timestamp(input), parse_timestamp(input));
        }
    }

    #[test]
    fn test_unparseable_is_an_error() {
        // ---
        assert_eq!(
            parse_timestamp("yesterday"),
            Err(PipelineError::UnparseableTimestamp("yesterday".to_string()))
        );
        assert!(parse_timestamp("").is_err());
        assert!(parse_timestamp("32-13-2025 25:61").is_err());
    }

    #[test]
    fn test_autumn_repeated_hour_takes_first_occurrence() {
        // ---
        // 2025-10-26 02:30 happens twice in Madrid; first time is still CEST.
        let parsed = parse_timestamp("26-10-2025 02:30").unwrap();
        assert_eq!(parsed, utc(2025, 10, 26, 0, 30));
    }

    #[test]
    fn test_spring_skipped_hour_moves_forward() {
        // ---
        // 2025-03-30 02:30 does not exist in Madrid; read with +01:00.
        let parsed = parse_timestamp("30-03-2025 02:30").unwrap();
        assert_eq!(parsed, utc(2025, 3, 30, 1, 30));
    }

    #[test]
    fn test_epoch_seconds_and_millis() {
        // ---
        let expected = utc(2025, 8, 24, 9, 50);
        let secs = expected.timestamp() as f64;
        assert_eq!(parse_raw_timestamp(RawTimestamp::Epoch(secs)).unwrap(), expected);
        assert_eq!(
            parse_raw_timestamp(RawTimestamp::Epoch(secs * 1000.0)).unwrap(),
            expected
        );
        assert!(parse_raw_timestamp(RawTimestamp::Epoch(f64::NAN)).is_err());
    }
}
