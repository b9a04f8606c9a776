//! UTC → Europe/Madrid wall clock, backed by the IANA tz database.

use chrono::{DateTime, Datelike, Offset, Timelike, Utc};
use chrono_tz::Europe::Madrid;

use crate::models::LocalTime;

/// Express an instant as Madrid local wall-clock fields.
pub fn to_madrid(instant: DateTime<Utc>) -> LocalTime {
    // ---
    let local = instant.with_timezone(&Madrid);
    LocalTime {
        year: local.year(),
        month: local.month(),
        day: local.day(),
        hour: local.hour(),
        minute: local.minute(),
        utc_offset_minutes: local.offset().fix().local_minus_utc() / 60,
    }
}
