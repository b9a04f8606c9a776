//! "Feels-like" temperatures: AEMET heat index and wind chill.
//!
//! The two regimes never overlap: heat index needs at least 26 °C and wind
//! chill at most 10 °C.

use serde::Serialize;

const HEAT_INDEX_MIN_TEMP_C: f64 = 26.0;
const HEAT_INDEX_MIN_HUMIDITY: f64 = 40.0;

const WIND_CHILL_MAX_TEMP_C: f64 = 10.0;
const WIND_CHILL_MIN_WIND_KMH: f64 = 4.8;

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// AEMET apparent temperature for warm, humid conditions.
///
/// `None` below 26 °C or below 40 % relative humidity.
pub fn heat_index_aemet(temp_c: f64, rel_humidity_pct: f64) -> Option<f64> {
    // ---
    if !(temp_c >= HEAT_INDEX_MIN_TEMP_C && rel_humidity_pct >= HEAT_INDEX_MIN_HUMIDITY) {
        return None;
    }

    let t = temp_c;
    let rh = rel_humidity_pct;
    let value = -8.78469476 + 1.61139411 * t + 2.338548839 * rh
        - 0.14611605 * t * rh
        - 0.012308094 * t * t
        - 0.016424828 * rh * rh
        + 0.002211732 * t * t * rh
        + 0.00072546 * t * rh * rh
        - 0.000003582 * t * t * rh * rh;

    Some(round1(value))
}

/// Environment Canada / NWS wind chill, metric form.
///
/// `None` above 10 °C or below 4.8 km/h of wind.
pub fn wind_chill(temp_c: f64, wind_speed_kmh: f64) -> Option<f64> {
    // ---
    if !(temp_c <= WIND_CHILL_MAX_TEMP_C && wind_speed_kmh >= WIND_CHILL_MIN_WIND_KMH) {
        return None;
    }

    let v = wind_speed_kmh.powf(0.16);
    Some(round1(13.12 + 0.6215 * temp_c - 11.37 * v + 0.3965 * temp_c * v))
}

/// Which "feels-like" value applies to a reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FeelsLike {
    HeatIndex(f64),
    WindChill(f64),
    None,
}

/// Heat index when it applies, wind chill otherwise.
pub fn feels_like(temp_c: Option<f64>, rel_humidity_pct: Option<f64>, wind_kmh: Option<f64>) -> FeelsLike {
    // ---
    let Some(temp) = temp_c else {
        return FeelsLike::None;
    };

    if let Some(hi) = rel_humidity_pct.and_then(|rh| heat_index_aemet(temp, rh)) {
        return FeelsLike::HeatIndex(hi);
    }

    match wind_kmh.and_then(|w| wind_chill(temp, w)) {
        Some(wc) => FeelsLike::WindChill(wc),
        None => FeelsLike::None,
    }
}
