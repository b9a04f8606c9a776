//! Independent poll loops.
//!
//! Each job fetches one backend endpoint for one station on its own timer,
//! runs the pipeline over the records and writes its slice of the station
//! view. Loops never coordinate: a failing loop records an error flag, keeps
//! the last good data on display and tries again on its next tick.

use std::time::Duration;

use chrono::Utc;
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::models::{MetricKind, RawSample, Station};
use crate::pipeline::{
    backend_extremes, compute_all_trends, daily_extremes, feels_like, to_madrid,
    SeriesNormalizer, TrendMetric,
};
use crate::state::{LiveReading, SharedState, StationView};
use crate::upstream::{ApiClient, Endpoint};

// ---

/// One dataset refreshed on a timer.
pub trait PollJob: Send + 'static {
    /// Short job name, also the key of its error flag.
    fn name(&self) -> &'static str;

    fn station(&self) -> Station;

    fn endpoint(&self) -> Endpoint;

    /// Fold a non-empty batch of records into the station view.
    ///
    /// Returns `false` when nothing in the batch was usable; the view must
    /// then be left exactly as it was.
    fn apply(&mut self, records: Vec<RawSample>, view: &mut StationView) -> bool;
}

/// Latest reading. Keeps its normalizer across cycles so forward-fill
/// survives between single-record fetches.
pub struct LiveJob {
    endpoint: Endpoint,
    normalizer: SeriesNormalizer,
}

impl LiveJob {
    pub fn new(station: Station, endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            normalizer: SeriesNormalizer::new(station),
        }
    }
}

impl PollJob for LiveJob {
    fn name(&self) -> &'static str {
        "live"
    }

    fn station(&self) -> Station {
        self.normalizer.station()
    }

    fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    fn apply(&mut self, records: Vec<RawSample>, view: &mut StationView) -> bool {
        let Some(latest) = self.normalizer.ingest(&records).pop() else {
            debug!(station = %self.station(), "no new live sample");
            return false;
        };
        let feels = feels_like(
            latest.value(MetricKind::ExternalTemperature),
            latest.value(MetricKind::Humidity),
            latest.value(MetricKind::WindSpeed),
        );
        view.live = Some(LiveReading {
            sample: latest,
            feels_like: feels,
        });
        true
    }
}

/// Chart series plus client-side daily extremes. Every fetch is a complete
/// window, so each cycle starts from a fresh normalizer.
pub struct SeriesJob {
    station: Station,
    endpoint: Endpoint,
}

impl SeriesJob {
    pub fn new(station: Station, endpoint: Endpoint) -> Self {
        Self { station, endpoint }
    }
}

impl PollJob for SeriesJob {
    fn name(&self) -> &'static str {
        "series"
    }

    fn station(&self) -> Station {
        self.station
    }

    fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    fn apply(&mut self, records: Vec<RawSample>, view: &mut StationView) -> bool {
        let series = SeriesNormalizer::new(self.station).ingest(&records);
        if series.is_empty() {
            return false;
        }
        let computed = TrendMetric::ALL
            .iter()
            .flat_map(|metric| daily_extremes(&series, metric.metric_kind()))
            .collect();
        view.set_computed_extremes(computed);
        view.series = series;
        true
    }
}

/// 15 min / 1 h / 24 h trend indicators.
pub struct TrendJob {
    station: Station,
    endpoint: Endpoint,
}

impl TrendJob {
    pub fn new(station: Station, endpoint: Endpoint) -> Self {
        Self { station, endpoint }
    }
}

impl PollJob for TrendJob {
    fn name(&self) -> &'static str {
        "trends"
    }

    fn station(&self) -> Station {
        self.station
    }

    fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    fn apply(&mut self, records: Vec<RawSample>, view: &mut StationView) -> bool {
        let series = SeriesNormalizer::new(self.station).ingest(&records);
        let trends = compute_all_trends(&series);
        if trends.is_empty() {
            return false;
        }
        view.trends = trends;
        true
    }
}

/// Daily extremes reported by the backend.
pub struct ExtremesJob {
    station: Station,
    endpoint: Endpoint,
}

impl ExtremesJob {
    pub fn new(station: Station, endpoint: Endpoint) -> Self {
        Self { station, endpoint }
    }
}

impl PollJob for ExtremesJob {
    fn name(&self) -> &'static str {
        "extremes"
    }

    fn station(&self) -> Station {
        self.station
    }

    fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    fn apply(&mut self, records: Vec<RawSample>, view: &mut StationView) -> bool {
        let reported: Vec<_> = records.iter().filter_map(backend_extremes).collect();
        if reported.is_empty() {
            return false;
        }
        view.set_backend_extremes(reported);
        true
    }
}

/// Historical statistics of one month, for the records and comparison
/// panels. Follows the Madrid calendar unless pinned to a period.
pub struct StatisticsJob {
    station: Station,
    pinned: Option<(i32, u32)>,
}

impl StatisticsJob {
    pub fn new(station: Station) -> Self {
        Self {
            station,
            pinned: None,
        }
    }

    pub fn for_month(station: Station, year: i32, month: u32) -> Self {
        Self {
            station,
            pinned: Some((year, month)),
        }
    }

    fn period(&self) -> (i32, u32) {
        self.pinned.unwrap_or_else(|| {
            let now = to_madrid(Utc::now());
            (now.year, now.month)
        })
    }
}

impl PollJob for StatisticsJob {
    fn name(&self) -> &'static str {
        "statistics"
    }

    fn station(&self) -> Station {
        self.station
    }

    fn endpoint(&self) -> Endpoint {
        let (year, month) = self.period();
        Endpoint::Statistics {
            station: self.station,
            year,
            month: Some(month),
        }
    }

    fn apply(&mut self, records: Vec<RawSample>, view: &mut StationView) -> bool {
        let (year, month) = self.period();
        view.statistics.year = Some(year);
        view.statistics.month = Some(month);
        view.statistics.period = records.into_iter().map(RawSample::into_value).collect();
        true
    }
}

/// Whole-history yearly summaries.
pub struct YearlyJob {
    station: Station,
}

impl YearlyJob {
    pub fn new(station: Station) -> Self {
        Self { station }
    }
}

impl PollJob for YearlyJob {
    fn name(&self) -> &'static str {
        "yearly"
    }

    fn station(&self) -> Station {
        self.station
    }

    fn endpoint(&self) -> Endpoint {
        Endpoint::YearlyData
    }

    fn apply(&mut self, records: Vec<RawSample>, view: &mut StationView) -> bool {
        view.statistics.yearly = records.into_iter().map(RawSample::into_value).collect();
        true
    }
}

// ---

/// Owner of a running poll loop. Cancelling or dropping it stops the timer.
#[derive(Debug)]
pub struct PollHandle {
    name: String,
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cancel(self) {
        debug!("cancelling poll loop {}", self.name);
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Run one fetch/apply cycle of a job.
pub async fn run_cycle<J: PollJob>(job: &mut J, client: &ApiClient, state: &SharedState) {
    // ---
    let station = job.station();
    let name = job.name();

    match client.fetch(&job.endpoint()).await {
        Ok(records) if records.is_empty() => {
            debug!(%station, job = name, "empty payload, no update this cycle");
            state.write().await.station_mut(station).clear_error(name);
        }
        Ok(records) => {
            let mut guard = state.write().await;
            let view = guard.station_mut(station);
            if job.apply(records, view) {
                view.mark_ok(name);
            } else {
                debug!(%station, job = name, "no usable records, no update this cycle");
                view.clear_error(name);
            }
        }
        Err(e) => {
            warn!(%station, job = name, "fetch failed: {}", e);
            state
                .write()
                .await
                .station_mut(station)
                .mark_error(name, e.to_string());
        }
    }
}

/// Start a job on its own timer. The first cycle runs immediately.
pub fn spawn_poll_loop<J: PollJob>(
    mut job: J,
    client: ApiClient,
    state: SharedState,
    every: Duration,
) -> PollHandle {
    // ---
    let name = format!("{}:{}", job.station(), job.name());
    info!(
        "starting poll loop {} ({}) every {:?}",
        name,
        job.station().label(),
        every
    );

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            run_cycle(&mut job, &client, &state).await;
        }
    });

    PollHandle { name, task }
}

/// Start every dashboard loop for both stations.
pub fn spawn_dashboard(config: &Config, client: &ApiClient, state: &SharedState) -> Vec<PollHandle> {
    // ---
    let every = config.intervals;
    let history = Endpoint::History {
        limit: config.history_limit,
    };

    vec![
        spawn_poll_loop(
            LiveJob::new(Station::Sarria, Endpoint::Live),
            client.clone(),
            state.clone(),
            every.live,
        ),
        spawn_poll_loop(
            LiveJob::new(Station::Burgos, Endpoint::BurgosWeather),
            client.clone(),
            state.clone(),
            every.live,
        ),
        spawn_poll_loop(
            TrendJob::new(Station::Sarria, history),
            client.clone(),
            state.clone(),
            every.trend,
        ),
        spawn_poll_loop(
            TrendJob::new(Station::Burgos, Endpoint::BurgosWeather),
            client.clone(),
            state.clone(),
            every.trend,
        ),
        spawn_poll_loop(
            SeriesJob::new(Station::Sarria, Endpoint::MeteoData(config.series_range)),
            client.clone(),
            state.clone(),
            every.series,
        ),
        spawn_poll_loop(
            SeriesJob::new(Station::Burgos, Endpoint::BurgosWeather),
            client.clone(),
            state.clone(),
            every.series,
        ),
        spawn_poll_loop(
            ExtremesJob::new(Station::Burgos, Endpoint::BurgosDailyExtremes),
            client.clone(),
            state.clone(),
            every.extremes,
        ),
        spawn_poll_loop(
            StatisticsJob::new(Station::Sarria),
            client.clone(),
            state.clone(),
            every.extremes,
        ),
        spawn_poll_loop(
            StatisticsJob::new(Station::Burgos),
            client.clone(),
            state.clone(),
            every.extremes,
        ),
        spawn_poll_loop(
            YearlyJob::new(Station::Sarria),
            client.clone(),
            state.clone(),
            every.extremes,
        ),
    ]
}
