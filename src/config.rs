//! Dashboard configuration
//!
//! Every tunable of the simulation comes from `TRUECRED_*` environment
//! variables, falling back to the values the portal ships with. Values
//! that fail to parse or fall outside their valid range are rejected with
//! [`DashboardError::Configuration`].

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::auth::DEFAULT_ATTEMPTS_PER_MINUTE;
use crate::domain::{DemoSample, DEFAULT_MAX_UPLOAD_BYTES};
use crate::infra::{
    DashboardError, FlowConfig, Result, DEFAULT_ALERT_HISTORY, DEFAULT_FEED_CAPACITY,
};
use crate::metrics::{
    SeriesPolicy, SimulatorConfig, DEFAULT_HEALTH_ALERT_THRESHOLD, DEFAULT_SERIES_CAPACITY,
};

/// How often each scheduled job runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    pub activity: Duration,
    pub live_counters: Duration,
    pub notifications: Duration,
    pub fraud_alerts: Duration,
    pub charts: Duration,
    pub health: Duration,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            activity: Duration::from_secs(3),
            live_counters: Duration::from_secs(5),
            notifications: Duration::from_secs(8),
            fraud_alerts: Duration::from_secs(15),
            charts: Duration::from_secs(30),
            health: Duration::from_secs(60),
        }
    }
}

impl Schedule {
    fn entries(&self) -> [(&'static str, Duration); 6] {
        [
            ("activity", self.activity),
            ("live_counters", self.live_counters),
            ("notifications", self.notifications),
            ("fraud_alerts", self.fraud_alerts),
            ("charts", self.charts),
            ("health", self.health),
        ]
    }
}

/// Dashboard configuration.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Seed for every random source; entropy when unset.
    pub seed: Option<u64>,
    pub feed_capacity: usize,
    pub alert_history: usize,
    pub series_capacity: usize,
    pub flow: FlowConfig,
    pub fraud_alert_probability: f64,
    pub activity_probability: f64,
    pub notification_probability: f64,
    pub breakdown_probability: f64,
    /// Chance the performance radar moves on a chart tick
    pub performance_probability: f64,
    pub schedule: Schedule,
    pub health_alert_threshold: u8,
    pub login_attempts_per_minute: u32,
    /// JSON file for the session store; in-memory when unset.
    pub session_file: Option<PathBuf>,
    /// Demo verification started once at boot
    pub demo_sample: Option<DemoSample>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            seed: None,
            feed_capacity: DEFAULT_FEED_CAPACITY,
            alert_history: DEFAULT_ALERT_HISTORY,
            series_capacity: DEFAULT_SERIES_CAPACITY,
            flow: FlowConfig::default(),
            fraud_alert_probability: 0.4,
            activity_probability: 0.6,
            notification_probability: 0.3,
            breakdown_probability: 0.3,
            performance_probability: 0.2,
            schedule: Schedule::default(),
            health_alert_threshold: DEFAULT_HEALTH_ALERT_THRESHOLD,
            login_attempts_per_minute: DEFAULT_ATTEMPTS_PER_MINUTE,
            session_file: None,
            demo_sample: None,
        }
    }
}

impl DashboardConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);
        let defaults = Self::default();

        let config = Self {
            seed: env.parse("TRUECRED_SEED")?,
            feed_capacity: env
                .parse("TRUECRED_FEED_CAPACITY")?
                .unwrap_or(defaults.feed_capacity),
            alert_history: env
                .parse("TRUECRED_ALERT_HISTORY")?
                .unwrap_or(defaults.alert_history),
            series_capacity: env
                .parse("TRUECRED_SERIES_CAPACITY")?
                .unwrap_or(defaults.series_capacity),
            flow: FlowConfig {
                dwell: env
                    .millis("TRUECRED_FLOW_DWELL_MS")?
                    .unwrap_or(defaults.flow.dwell),
                settle: env
                    .millis("TRUECRED_FLOW_SETTLE_MS")?
                    .unwrap_or(defaults.flow.settle),
                max_upload_bytes: env
                    .parse("TRUECRED_MAX_UPLOAD_BYTES")?
                    .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            },
            fraud_alert_probability: env
                .parse("TRUECRED_FRAUD_ALERT_PROBABILITY")?
                .unwrap_or(defaults.fraud_alert_probability),
            activity_probability: env
                .parse("TRUECRED_ACTIVITY_PROBABILITY")?
                .unwrap_or(defaults.activity_probability),
            notification_probability: env
                .parse("TRUECRED_NOTIFICATION_PROBABILITY")?
                .unwrap_or(defaults.notification_probability),
            breakdown_probability: env
                .parse("TRUECRED_BREAKDOWN_PROBABILITY")?
                .unwrap_or(defaults.breakdown_probability),
            performance_probability: env
                .parse("TRUECRED_PERFORMANCE_PROBABILITY")?
                .unwrap_or(defaults.performance_probability),
            schedule: Schedule {
                activity: env
                    .secs("TRUECRED_ACTIVITY_INTERVAL_SECS")?
                    .unwrap_or(defaults.schedule.activity),
                live_counters: env
                    .secs("TRUECRED_LIVE_INTERVAL_SECS")?
                    .unwrap_or(defaults.schedule.live_counters),
                notifications: env
                    .secs("TRUECRED_NOTIFICATION_INTERVAL_SECS")?
                    .unwrap_or(defaults.schedule.notifications),
                fraud_alerts: env
                    .secs("TRUECRED_FRAUD_INTERVAL_SECS")?
                    .unwrap_or(defaults.schedule.fraud_alerts),
                charts: env
                    .secs("TRUECRED_CHART_INTERVAL_SECS")?
                    .unwrap_or(defaults.schedule.charts),
                health: env
                    .secs("TRUECRED_HEALTH_INTERVAL_SECS")?
                    .unwrap_or(defaults.schedule.health),
            },
            health_alert_threshold: env
                .parse("TRUECRED_HEALTH_THRESHOLD")?
                .unwrap_or(defaults.health_alert_threshold),
            login_attempts_per_minute: env
                .parse("TRUECRED_LOGIN_ATTEMPTS_PER_MINUTE")?
                .unwrap_or(defaults.login_attempts_per_minute),
            session_file: env.get("TRUECRED_SESSION_FILE").map(PathBuf::from),
            demo_sample: env.parse("TRUECRED_DEMO_SAMPLE")?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("feed_capacity", self.feed_capacity),
            ("alert_history", self.alert_history),
            ("series_capacity", self.series_capacity),
        ] {
            if value == 0 {
                return Err(invalid(format!("{name} must be at least 1")));
            }
        }

        for (name, p) in [
            ("fraud_alert_probability", self.fraud_alert_probability),
            ("activity_probability", self.activity_probability),
            ("notification_probability", self.notification_probability),
            ("breakdown_probability", self.breakdown_probability),
            ("performance_probability", self.performance_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(invalid(format!("{name} must be within [0, 1], got {p}")));
            }
        }

        for (name, interval) in self.schedule.entries() {
            if interval.is_zero() {
                return Err(invalid(format!("{name} interval must be positive")));
            }
        }

        if self.flow.max_upload_bytes == 0 {
            return Err(invalid("max_upload_bytes must be positive".to_string()));
        }
        if self.health_alert_threshold > 100 {
            return Err(invalid(format!(
                "health_alert_threshold must be at most 100, got {}",
                self.health_alert_threshold
            )));
        }
        if self.login_attempts_per_minute == 0 {
            return Err(invalid(
                "login_attempts_per_minute must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Simulator tuning derived from this configuration
    pub fn simulator_config(&self) -> SimulatorConfig {
        let mut simulator = SimulatorConfig {
            fraud_alert_probability: self.fraud_alert_probability,
            activity_probability: self.activity_probability,
            notification_probability: self.notification_probability,
            breakdown_probability: self.breakdown_probability,
            ..SimulatorConfig::default()
        }
        .with_series_capacity(self.series_capacity);

        for series in &mut simulator.series {
            if matches!(series.policy, SeriesPolicy::RandomWalk { .. }) {
                series.update_probability = self.performance_probability;
            }
        }
        simulator
    }

    /// Seed for an independent random stream, if seeded
    pub fn stream_seed(&self, stream: u64) -> Option<u64> {
        self.seed.map(|seed| seed.wrapping_add(stream))
    }
}

fn invalid(message: String) -> DashboardError {
    DashboardError::Configuration(message)
}

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(key)
            .map(|raw| {
                raw.parse::<T>()
                    .map_err(|e| invalid(format!("{key}={raw:?}: {e}")))
            })
            .transpose()
    }

    fn millis(&self, key: &str) -> Result<Option<Duration>> {
        Ok(self.parse::<u64>(key)?.map(Duration::from_millis))
    }

    fn secs(&self, key: &str) -> Result<Option<Duration>> {
        Ok(self.parse::<u64>(key)?.map(Duration::from_secs))
    }
}
