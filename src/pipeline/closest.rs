//! Nearest-instant lookup used for trend deltas.

use chrono::{DateTime, Utc};

use crate::models::CanonicalSample;

/// Anything positioned on the time axis.
pub trait Timestamped {
    fn instant(&self) -> DateTime<Utc>;
}

impl Timestamped for CanonicalSample {
    fn instant(&self) -> DateTime<Utc> {
        self.instant_utc
    }
}

impl<T: Timestamped> Timestamped for &T {
    fn instant(&self) -> DateTime<Utc> {
        (**self).instant()
    }
}

/// Element whose instant is nearest to `target`.
///
/// Linear scan, any input order. Ties keep the first element seen.
pub fn find_closest<T: Timestamped>(series: &[T], target: DateTime<Utc>) -> Option<&T> {
    // ---
    let mut best: Option<(&T, i64)> = None;
    for sample in series {
        let distance = (sample.instant() - target).num_milliseconds().abs();
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((sample, distance)),
        }
    }
    best.map(|(sample, _)| sample)
}
