//! Data models shared by the pipeline, the poll loops and the routes.

use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---

/// Weather station served by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Station {
    Sarria,
    Burgos,
}

impl Station {
    pub const ALL: [Station; 2] = [Station::Sarria, Station::Burgos];

    /// Human readable name.
    pub fn label(self) -> &'static str {
        match self {
            Station::Sarria => "Sarrià",
            Station::Burgos => "Burgos",
        }
    }
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Station::Sarria => f.write_str("sarria"),
            Station::Burgos => f.write_str("burgos"),
        }
    }
}

/// Measured quantity carried by a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    ExternalTemperature,
    InternalTemperature,
    Humidity,
    Pressure,
    SolarRadiation,
    WindSpeed,
    WindDirection,
    DayRain,
    TotalRain,
}

impl MetricKind {
    pub const ALL: [MetricKind; 9] = [
        MetricKind::ExternalTemperature,
        MetricKind::InternalTemperature,
        MetricKind::Humidity,
        MetricKind::Pressure,
        MetricKind::SolarRadiation,
        MetricKind::WindSpeed,
        MetricKind::WindDirection,
        MetricKind::DayRain,
        MetricKind::TotalRain,
    ];

    /// JSON paths tried in order when reading this metric from a raw record.
    /// Flat Sarrià keys come first, nested Burgos shapes after.
    fn candidate_paths(self) -> &'static [&'static [&'static str]] {
        match self {
            MetricKind::ExternalTemperature => &[
                &["external_temperature"],
                &["temperature", "degrees"],
                &["temperature"],
            ],
            MetricKind::InternalTemperature => &[&["internal_temperature"]],
            MetricKind::Humidity => &[&["humidity"], &["relativeHumidity"]],
            MetricKind::Pressure => &[&["pressure"], &["airPressure", "meanSeaLevelMillibars"]],
            MetricKind::SolarRadiation => &[&["solar_radiation"]],
            MetricKind::WindSpeed => &[&["wind_speed"], &["wind", "speed", "value"]],
            MetricKind::WindDirection => &[&["wind_direction"], &["wind", "direction", "degrees"]],
            MetricKind::DayRain => &[&["day_rain"], &["precipitation", "qpf", "quantity"]],
            MetricKind::TotalRain => &[&["total_rain"]],
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetricKind::ExternalTemperature => "external_temperature",
            MetricKind::InternalTemperature => "internal_temperature",
            MetricKind::Humidity => "humidity",
            MetricKind::Pressure => "pressure",
            MetricKind::SolarRadiation => "solar_radiation",
            MetricKind::WindSpeed => "wind_speed",
            MetricKind::WindDirection => "wind_direction",
            MetricKind::DayRain => "day_rain",
            MetricKind::TotalRain => "total_rain",
        };
        f.write_str(name)
    }
}

// ---

/// Timestamp as found in a raw record, before parsing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawTimestamp<'a> {
    Text(&'a str),
    /// Numeric epoch, seconds or milliseconds.
    Epoch(f64),
}

const TIMESTAMP_KEYS: [&str; 4] = ["timestamp", "currentTime", "time", "date"];

/// One record exactly as the backend delivered it.
///
/// Field access is always optional: a missing, null or oddly typed field reads
/// as absent instead of failing the whole record.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSample(Value);

impl RawSample {
    // ---
    /// Wrap a JSON record. Non-object values are not records.
    pub fn from_value(value: Value) -> Option<Self> {
        value.is_object().then_some(RawSample(value))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    pub fn timestamp(&self) -> Option<RawTimestamp<'_>> {
        TIMESTAMP_KEYS.iter().find_map(|key| match self.0.get(*key)? {
            Value::String(s) => Some(RawTimestamp::Text(s.as_str())),
            Value::Number(n) => n.as_f64().map(RawTimestamp::Epoch),
            _ => None,
        })
    }

    pub fn metric(&self, kind: MetricKind) -> Option<f64> {
        kind.candidate_paths()
            .iter()
            .find_map(|path| number_at(&self.0, path))
    }
}

fn number_at(root: &Value, path: &[&str]) -> Option<f64> {
    // ---
    let leaf = path.iter().try_fold(root, |node, key| node.get(*key))?;
    match leaf {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

// ---

/// Europe/Madrid wall-clock fields of an instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LocalTime {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    /// Offset from UTC in effect at that instant (60 in winter, 120 in summer).
    pub utc_offset_minutes: i32,
}

impl LocalTime {
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
    }
}

/// A reading after timestamp normalization, outlier filtering and timezone
/// conversion. Every present value lies inside its metric's valid range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalSample {
    pub instant_utc: DateTime<Utc>,
    pub local_time: LocalTime,
    pub values: BTreeMap<MetricKind, Option<f64>>,
}

impl CanonicalSample {
    pub fn value(&self, kind: MetricKind) -> Option<f64> {
        self.values.get(&kind).copied().flatten()
    }
}
