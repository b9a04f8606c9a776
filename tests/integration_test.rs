//! End-to-end checks against a running dashboard instance.
//!
//! Set `BASE_URL` (e.g. `http://localhost:8080`) to run them; without it they
//! return early.

use anyhow::Result;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
struct LocalTime {
    hour: u32,
    utc_offset_minutes: i32,
}

#[derive(Debug, Deserialize)]
struct CanonicalSample {
    instant_utc: DateTime<Utc>,
    local_time: LocalTime,
    values: BTreeMap<String, Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct TrendResult {
    metric: String,
    window_minutes: i64,
    category: String,
}

fn base_url() -> Option<String> {
    std::env::var("BASE_URL").ok()
}

#[tokio::test]
async fn series_is_clean_and_localized() -> Result<()> {
    // ---
    let Some(base) = base_url() else {
        eprintln!("BASE_URL not set, skipping");
        return Ok(());
    };

    let client = Client::new();
    for station in ["sarria", "burgos"] {
        let url = format!("{}/stations/{}/series", base, station);
        let series: Vec<CanonicalSample> = client.get(&url).send().await?.json().await?;

        // 1) Chronological order
        for pair in series.windows(2) {
            assert!(
                pair[0].instant_utc < pair[1].instant_utc,
                "series from {} is not strictly increasing",
                url
            );
        }

        for s in series.iter().take(50) {
            // ---
            // 2) Madrid offset is +1h or +2h and consistent with the UTC hour
            assert!(
                s.local_time.utc_offset_minutes == 60 || s.local_time.utc_offset_minutes == 120,
                "unexpected offset {}",
                s.local_time.utc_offset_minutes
            );
            let expected_hour = (s.instant_utc + chrono::Duration::minutes(
                i64::from(s.local_time.utc_offset_minutes),
            ))
            .format("%H")
            .to_string()
            .parse::<u32>()?;
            assert_eq!(s.local_time.hour, expected_hour);

            // 3) Values inside their physical range
            if let Some(Some(t)) = s.values.get("external_temperature") {
                assert!((-40.0..=45.0).contains(t), "temperature {} out of range", t);
            }
            if let Some(Some(h)) = s.values.get("humidity") {
                assert!((0.0..=100.0).contains(h), "humidity {} out of range", h);
            }
            if let Some(Some(p)) = s.values.get("pressure") {
                assert!((800.0..=1100.0).contains(p), "pressure {} out of range", p);
            }
        }
    }

    Ok(())
}

#[tokio::test]
async fn trends_use_known_buckets() -> Result<()> {
    // ---
    let Some(base) = base_url() else {
        eprintln!("BASE_URL not set, skipping");
        return Ok(());
    };

    let client = Client::new();
    let url = format!("{}/stations/sarria/trends", base);
    let trends: Vec<TrendResult> = client.get(&url).send().await?.json().await?;

    for t in &trends {
        assert!(["temperature", "humidity", "pressure"].contains(&t.metric.as_str()));
        assert!([15, 60, 1440].contains(&t.window_minutes));
        assert!(
            ["strong_up", "up", "flat", "down", "strong_down"].contains(&t.category.as_str()),
            "unknown category {}",
            t.category
        );
    }

    Ok(())
}
