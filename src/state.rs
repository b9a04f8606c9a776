//! In-memory dashboard state written by the poll loops and read by the routes.

use std::{collections::BTreeMap, sync::Arc};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::models::{CanonicalSample, Station};
use crate::pipeline::{merge_extremes, DailyExtremes, FeelsLike, TrendResult};

pub type SharedState = Arc<RwLock<DashboardState>>;

/// Latest reading of a station and its "feels-like" value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveReading {
    pub sample: CanonicalSample,
    pub feels_like: FeelsLike,
}

/// Historical-statistics dashboard payloads (records, decade comparisons,
/// monthly breakdowns). Kept as the backend shaped them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatisticsView {
    /// Year and month the `period` entries belong to.
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub period: Vec<Value>,
    /// Whole-history yearly series.
    pub yearly: Vec<Value>,
}

/// Everything the dashboard shows for one station.
///
/// Each poll job only touches its own fields; a failed cycle leaves them as
/// they were and only records an error flag.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StationView {
    pub live: Option<LiveReading>,
    pub series: Vec<CanonicalSample>,
    pub trends: Vec<TrendResult>,
    pub extremes: Vec<DailyExtremes>,
    /// Whether the backend supplied any of the extremes.
    pub backend_extremes: bool,
    pub statistics: StatisticsView,
    pub updated_at: Option<DateTime<Utc>>,
    /// Last error per job name, cleared by the job's next successful cycle.
    pub errors: BTreeMap<String, String>,
    #[serde(skip)]
    computed_extremes: Vec<DailyExtremes>,
    #[serde(skip)]
    reported_extremes: Vec<DailyExtremes>,
}

impl StationView {
    /// Record client-side extremes computed from the latest series.
    pub fn set_computed_extremes(&mut self, computed: Vec<DailyExtremes>) {
        self.computed_extremes = computed;
        self.refresh_extremes();
    }

    /// Record extremes reported by the backend; they win over computed ones.
    pub fn set_backend_extremes(&mut self, reported: Vec<DailyExtremes>) {
        self.reported_extremes = reported;
        self.refresh_extremes();
    }

    fn refresh_extremes(&mut self) {
        self.backend_extremes = !self.reported_extremes.is_empty();
        self.extremes = merge_extremes(
            self.computed_extremes.clone(),
            self.reported_extremes.clone(),
        );
    }

    /// The job fetched and changed what the station shows.
    pub fn mark_ok(&mut self, job: &str) {
        self.errors.remove(job);
        self.updated_at = Some(Utc::now());
    }

    /// The job reached the backend but had nothing usable to show.
    pub fn clear_error(&mut self, job: &str) {
        self.errors.remove(job);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn mark_error(&mut self, job: &str, message: String) {
        self.errors.insert(job.to_string(), message);
    }
}

#[derive(Debug, Default)]
pub struct DashboardState {
    stations: BTreeMap<Station, StationView>,
}

impl DashboardState {
    pub fn new() -> Self {
        let stations = Station::ALL
            .iter()
            .map(|s| (*s, StationView::default()))
            .collect();
        Self { stations }
    }

    pub fn shared() -> SharedState {
        Arc::new(RwLock::new(Self::new()))
    }

    pub fn station(&self, station: Station) -> Option<&StationView> {
        self.stations.get(&station)
    }

    pub fn station_mut(&mut self, station: Station) -> &mut StationView {
        self.stations.entry(station).or_default()
    }

    pub fn stations(&self) -> impl Iterator<Item = (Station, &StationView)> {
        self.stations.iter().map(|(station, view)| (*station, view))
    }
}
