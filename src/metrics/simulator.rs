//! Scheduled mutation of the dashboard's metrics
//!
//! The simulator owns every [`MetricSeries`], the fraud counter and the
//! fraud-breakdown categories. Each entry point is synchronous and total;
//! the runtime calls them from its own interval tasks.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::{ActivityEntry, DEGREES, INSTITUTIONS};
use crate::infra::{
    ActivityFeed, ChartSink, DashboardError, NotificationCenter, RandomSource, Result,
};

use super::{default_series, Cadence, MetricSample, MetricSeries, SeriesConfig, SeriesPolicy};

/// Fraud breakdown categories and their starting totals
pub const DEFAULT_BREAKDOWN: &[(&str, u64)] = &[
    ("Fake Degrees", 68),
    ("Grade Manipulation", 34),
    ("Institution Forgery", 25),
];

/// Simulator tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    pub series: Vec<SeriesConfig>,
    pub fraud_alert_probability: f64,
    pub activity_probability: f64,
    pub notification_probability: f64,
    pub breakdown_probability: f64,
    pub breakdown: Vec<(String, u64)>,
}

impl SimulatorConfig {
    /// Override the history length of every series
    pub fn with_series_capacity(mut self, capacity: usize) -> Self {
        for series in &mut self.series {
            series.capacity = capacity;
        }
        self
    }

    /// Reject series or probabilities the simulator cannot run with
    pub fn validate(&self) -> Result<()> {
        for (name, p) in [
            ("fraud_alert_probability", self.fraud_alert_probability),
            ("activity_probability", self.activity_probability),
            ("notification_probability", self.notification_probability),
            ("breakdown_probability", self.breakdown_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(DashboardError::Configuration(format!(
                    "{name} must be within [0, 1], got {p}"
                )));
            }
        }

        for series in &self.series {
            series.validate()?;
            if let SeriesPolicy::Ratio { source, .. } = &series.policy {
                if !self.series.iter().any(|s| &s.name == source) {
                    return Err(DashboardError::Configuration(format!(
                        "series {}: unknown source series {source}",
                        series.name
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            series: default_series(),
            fraud_alert_probability: 0.4,
            activity_probability: 0.6,
            notification_probability: 0.3,
            breakdown_probability: 0.3,
            breakdown: DEFAULT_BREAKDOWN
                .iter()
                .map(|(name, total)| (name.to_string(), *total))
                .collect(),
        }
    }
}

/// What a full [`MetricsSimulator::tick`] changed
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TickReport {
    pub series_updated: Vec<String>,
    pub fraud_alert: bool,
    pub activity: Option<ActivityEntry>,
    pub notification: bool,
    pub breakdown_bumped: Option<String>,
}

/// Drives every simulated number on the dashboard
pub struct MetricsSimulator {
    config: SimulatorConfig,
    rng: Mutex<Box<dyn RandomSource>>,
    /// Same order as `config.series`
    series: RwLock<Vec<MetricSeries>>,
    breakdown: RwLock<Vec<(String, u64)>>,
    fraud_alerts: AtomicU64,
    ticks: AtomicU64,
    feed: Arc<ActivityFeed>,
    notifications: Arc<NotificationCenter>,
    sinks: RwLock<Vec<Arc<dyn ChartSink>>>,
    start_time: Instant,
}

impl MetricsSimulator {
    /// Build a simulator, failing on an invalid configuration
    pub fn new(
        config: SimulatorConfig,
        rng: Box<dyn RandomSource>,
        feed: Arc<ActivityFeed>,
        notifications: Arc<NotificationCenter>,
    ) -> Result<Self> {
        config.validate()?;
        let series = config.series.iter().map(SeriesConfig::build).collect();
        let breakdown = config.breakdown.clone();
        Ok(Self {
            config,
            rng: Mutex::new(rng),
            series: RwLock::new(series),
            breakdown: RwLock::new(breakdown),
            fraud_alerts: AtomicU64::new(0),
            ticks: AtomicU64::new(0),
            feed,
            notifications,
            sinks: RwLock::new(Vec::new()),
            start_time: Instant::now(),
        })
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Register a chart collaborator
    pub fn add_sink(&self, sink: Arc<dyn ChartSink>) {
        self.sinks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sink);
    }

    /// Advance every series and roll every event once
    pub fn tick(&self) -> TickReport {
        let mut series_updated = self.tick_cadence(Cadence::Live);
        series_updated.extend(self.tick_cadence(Cadence::Chart));

        let report = TickReport {
            series_updated,
            fraud_alert: self.roll_fraud_alert(),
            activity: self.roll_activity(),
            notification: self.roll_notification(),
            breakdown_bumped: self.roll_fraud_breakdown(),
        };
        let tick = self.ticks.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(tick, updated = report.series_updated.len(), "Simulator tick");
        report
    }

    /// Advance the series on `cadence`, returning the names that changed.
    ///
    /// Grouped series roll once per tick, with the probability of the
    /// group's first member, and then all move together.
    pub fn tick_cadence(&self, cadence: Cadence) -> Vec<String> {
        let updated = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            let mut series = self.series.write().unwrap_or_else(PoisonError::into_inner);
            let mut group_rolls: HashMap<&str, bool> = HashMap::new();
            let mut updated = Vec::new();

            for (index, config) in self.config.series.iter().enumerate() {
                if config.cadence != cadence {
                    continue;
                }
                let selected = match config.group.as_deref() {
                    Some(group) => *group_rolls
                        .entry(group)
                        .or_insert_with(|| rolls(&mut **rng, config.update_probability)),
                    None => rolls(&mut **rng, config.update_probability),
                };
                if !selected {
                    continue;
                }

                let next = match &config.policy {
                    SeriesPolicy::Counter { .. } | SeriesPolicy::RandomWalk { .. } => {
                        let current = series[index].latest().unwrap_or(0.0);
                        let delta = config.policy.draw_delta(&mut **rng);
                        config.policy.apply(current, delta)
                    }
                    SeriesPolicy::Sampled { low, high } => {
                        rng.range_inclusive(*low as i64, *high as i64) as f64
                    }
                    SeriesPolicy::Ratio { source, factor } => {
                        let source_value = series
                            .iter()
                            .find(|s| s.name() == source)
                            .and_then(MetricSeries::latest)
                            .unwrap_or(0.0);
                        (source_value * factor).floor()
                    }
                };

                series[index].push(next);
                updated.push((config.name.clone(), series[index].samples()));
            }
            updated
        };

        self.publish_series(&updated);
        updated.into_iter().map(|(name, _)| name).collect()
    }

    /// Apply an explicit delta to a stepping series.
    ///
    /// Returns the stored value, or `None` for unknown or non-stepping
    /// series.
    pub fn apply_delta(&self, name: &str, delta: f64) -> Option<f64> {
        let (index, config) = self
            .config
            .series
            .iter()
            .enumerate()
            .find(|(_, c)| c.name == name)?;
        if !matches!(
            config.policy,
            SeriesPolicy::Counter { .. } | SeriesPolicy::RandomWalk { .. }
        ) {
            return None;
        }

        let (value, samples) = {
            let mut series = self.series.write().unwrap_or_else(PoisonError::into_inner);
            let current = series[index].latest().unwrap_or(0.0);
            let sample = series[index].push(config.policy.apply(current, delta));
            (sample.value, series[index].samples())
        };
        self.publish_series(&[(name.to_string(), samples)]);
        Some(value)
    }

    /// Maybe raise a fraud alert: counter, feed entry and notification
    pub fn roll_fraud_alert(&self) -> bool {
        if !self.with_rng(|rng| rng.chance(self.config.fraud_alert_probability)) {
            return false;
        }

        let total = self.fraud_alerts.fetch_add(1, Ordering::SeqCst) + 1;
        self.feed
            .append(ActivityEntry::fraud_alert("Suspicious certificate flagged"));
        self.notifications.increment();
        info!(fraud_alerts = total, "Fraud alert triggered");
        true
    }

    /// Maybe append a random verification, analysis or ledger entry
    pub fn roll_activity(&self) -> Option<ActivityEntry> {
        let entry = self.with_rng(|rng| {
            if !rng.chance(self.config.activity_probability) {
                return None;
            }
            let entry = match rng.pick_index(3) {
                0 => ActivityEntry::certificate_verified(random_credential(rng)),
                1 => ActivityEntry::analysis_in_progress(random_credential(rng)),
                _ => ActivityEntry::ledger_entry(rng.range_inclusive(100_000, 999_999) as u64),
            };
            Some(entry)
        })?;

        self.feed.append(entry.clone());
        Some(entry)
    }

    /// Maybe count an incoming notification
    pub fn roll_notification(&self) -> bool {
        if !self.with_rng(|rng| rng.chance(self.config.notification_probability)) {
            return false;
        }
        self.notifications.increment();
        true
    }

    /// Maybe add 1..=3 cases to a random breakdown category
    pub fn roll_fraud_breakdown(&self) -> Option<String> {
        let (index, bump) = self.with_rng(|rng| {
            if !rng.chance(self.config.breakdown_probability) {
                return None;
            }
            let len = self.config.breakdown.len();
            if len == 0 {
                return None;
            }
            Some((rng.pick_index(len), rng.range_inclusive(1, 3) as u64))
        })?;

        let (category, snapshot) = {
            let mut breakdown = self.breakdown.write().unwrap_or_else(PoisonError::into_inner);
            let (name, total) = breakdown.get_mut(index)?;
            *total += bump;
            debug!(category = %name, total = *total, "Fraud breakdown updated");
            (name.clone(), breakdown.clone())
        };

        for sink in self.sinks_snapshot() {
            sink.breakdown_updated(&snapshot);
        }
        Some(category)
    }

    /// Copy of a series by name
    pub fn series(&self, name: &str) -> Option<MetricSeries> {
        self.series
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|s| s.name() == name)
            .cloned()
    }

    pub fn latest(&self, name: &str) -> Option<f64> {
        self.series(name).and_then(|s| s.latest())
    }

    pub fn series_names(&self) -> Vec<String> {
        self.config.series.iter().map(|c| c.name.clone()).collect()
    }

    /// Breakdown categories with their totals
    pub fn breakdown(&self) -> Vec<(String, u64)> {
        self.breakdown
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn fraud_alerts(&self) -> u64 {
        self.fraud_alerts.load(Ordering::SeqCst)
    }

    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Current state as JSON
    pub fn to_json(&self) -> serde_json::Value {
        let series: HashMap<String, Vec<f64>> = self
            .series
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|s| (s.name().to_string(), s.values()))
            .collect();
        let breakdown: HashMap<String, u64> = self.breakdown().into_iter().collect();

        serde_json::json!({
            "uptime_seconds": self.uptime_seconds(),
            "ticks": self.ticks(),
            "fraud_alerts": self.fraud_alerts(),
            "unread_notifications": self.notifications.unread(),
            "series": series,
            "fraud_breakdown": breakdown,
        })
    }

    /// Latest values in Prometheus text format
    pub fn to_prometheus(&self) -> String {
        let mut output = String::new();

        output.push_str("# TYPE truecred_fraud_alerts counter\n");
        output.push_str(&format!("truecred_fraud_alerts {}\n", self.fraud_alerts()));

        for series in self
            .series
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
        {
            let Some(value) = series.latest() else {
                continue;
            };
            let prometheus_name = format!("truecred_{}", series.name().replace(['.', '-'], "_"));
            output.push_str(&format!("# TYPE {} gauge\n", prometheus_name));
            output.push_str(&format!("{} {}\n", prometheus_name, value));
        }

        output
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut dyn RandomSource) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut **rng)
    }

    fn sinks_snapshot(&self) -> Vec<Arc<dyn ChartSink>> {
        self.sinks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn publish_series(&self, updated: &[(String, Vec<MetricSample>)]) {
        if updated.is_empty() {
            return;
        }
        for sink in self.sinks_snapshot() {
            for (name, samples) in updated {
                sink.series_updated(name, samples);
            }
        }
    }
}

fn rolls(rng: &mut dyn RandomSource, probability: f64) -> bool {
    probability >= 1.0 || rng.chance(probability)
}

fn random_credential(rng: &mut dyn RandomSource) -> String {
    let degree = DEGREES[rng.pick_index(DEGREES.len())];
    let institution = INSTITUTIONS[rng.pick_index(INSTITUTIONS.len())];
    format!("{degree} - {institution}")
}
