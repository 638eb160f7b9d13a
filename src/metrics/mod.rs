//! Dashboard metric series
//!
//! Every number on the analytics dashboard is a [`MetricSeries`]: a named
//! ring buffer of samples whose next value is produced by a
//! [`SeriesPolicy`]. The [`MetricsSimulator`] advances them on a schedule.

mod health;
mod simulator;

pub use health::*;
pub use simulator::*;

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::infra::{DashboardError, RandomSource, Result};

/// Default number of samples a chart keeps
pub const DEFAULT_SERIES_CAPACITY: usize = 10;

/// Update group shared by the performance radar series
pub const PERFORMANCE_GROUP: &str = "performance";

/// One recorded value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub value: f64,
    pub recorded_at: DateTime<Utc>,
}

impl MetricSample {
    /// Axis label for the chart, `HH:MM`
    pub fn label(&self) -> String {
        self.recorded_at.format("%H:%M").to_string()
    }
}

/// Fixed-capacity, oldest-evicting sequence of non-negative samples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSeries {
    name: String,
    capacity: usize,
    samples: VecDeque<MetricSample>,
}

impl MetricSeries {
    /// Create an empty series. A capacity of zero is raised to one.
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            name: name.into(),
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a value stamped now; negative values are stored as 0
    pub fn push(&mut self, value: f64) -> MetricSample {
        self.push_at(value, Utc::now())
    }

    pub fn push_at(&mut self, value: f64, recorded_at: DateTime<Utc>) -> MetricSample {
        let sample = MetricSample {
            value: if value.is_finite() { value.max(0.0) } else { 0.0 },
            recorded_at,
        };
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
        sample
    }

    pub fn latest(&self) -> Option<f64> {
        self.samples.back().map(|s| s.value)
    }

    /// Samples, oldest first
    pub fn samples(&self) -> Vec<MetricSample> {
        self.samples.iter().copied().collect()
    }

    /// Values, oldest first
    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.value).collect()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Rule producing a series' next value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SeriesPolicy {
    /// Monotonic: add an integer in `min_step..=max_step`
    Counter { min_step: u64, max_step: u64 },
    /// Add a uniform delta in `±max_variation`, clamped to `[min, max]`
    RandomWalk {
        max_variation: f64,
        min: f64,
        max: f64,
    },
    /// Fresh integer in `low..=high` each time
    Sampled { low: u64, high: u64 },
    /// `floor(latest(source) * factor)`
    Ratio { source: String, factor: f64 },
}

impl SeriesPolicy {
    /// Random delta for policies that step from the current value
    pub fn draw_delta(&self, rng: &mut dyn RandomSource) -> f64 {
        match self {
            SeriesPolicy::Counter { min_step, max_step } => {
                rng.range_inclusive(*min_step as i64, *max_step as i64) as f64
            }
            SeriesPolicy::RandomWalk { max_variation, .. } => {
                rng.uniform(-max_variation, *max_variation)
            }
            SeriesPolicy::Sampled { .. } | SeriesPolicy::Ratio { .. } => 0.0,
        }
    }

    /// Apply a delta to `current`, honouring the policy's bounds
    pub fn apply(&self, current: f64, delta: f64) -> f64 {
        match self {
            SeriesPolicy::Counter { .. } => current + delta.max(0.0),
            SeriesPolicy::RandomWalk { min, max, .. } => (current + delta).clamp(*min, *max),
            SeriesPolicy::Sampled { .. } | SeriesPolicy::Ratio { .. } => current + delta,
        }
    }

    /// Reject bounds that cannot produce a value
    pub fn validate(&self) -> std::result::Result<(), String> {
        match self {
            SeriesPolicy::Counter { min_step, max_step } if min_step > max_step => Err(format!(
                "min_step {min_step} is greater than max_step {max_step}"
            )),
            SeriesPolicy::RandomWalk {
                max_variation,
                min,
                max,
            } => {
                if !min.is_finite() || !max.is_finite() {
                    Err(format!("bounds must be finite, got [{min}, {max}]"))
                } else if min > max {
                    Err(format!("min {min} is greater than max {max}"))
                } else if !max_variation.is_finite() || *max_variation < 0.0 {
                    Err(format!(
                        "max_variation must be finite and non-negative, got {max_variation}"
                    ))
                } else {
                    Ok(())
                }
            }
            SeriesPolicy::Sampled { low, high } if low > high => {
                Err(format!("low {low} is greater than high {high}"))
            }
            SeriesPolicy::Ratio { factor, .. } if !factor.is_finite() => {
                Err(format!("factor must be finite, got {factor}"))
            }
            _ => Ok(()),
        }
    }
}

/// How often a series is advanced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cadence {
    /// Headline counters (every few seconds)
    Live,
    /// Chart data (every half minute)
    Chart,
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cadence::Live => write!(f, "live"),
            Cadence::Chart => write!(f, "chart"),
        }
    }
}

/// Declaration of one simulated series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesConfig {
    pub name: String,
    pub capacity: usize,
    pub initial: Vec<f64>,
    pub policy: SeriesPolicy,
    pub cadence: Cadence,
    /// Chance the series changes on a given tick (1.0 = always)
    pub update_probability: f64,
    /// Series in the same group share one roll per tick and move together
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

impl SeriesConfig {
    pub fn new(name: impl Into<String>, policy: SeriesPolicy, cadence: Cadence) -> Self {
        Self {
            name: name.into(),
            capacity: DEFAULT_SERIES_CAPACITY,
            initial: Vec::new(),
            policy,
            cadence,
            update_probability: 1.0,
            group: None,
        }
    }

    pub fn with_initial(mut self, initial: impl Into<Vec<f64>>) -> Self {
        self.initial = initial.into();
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_update_probability(mut self, probability: f64) -> Self {
        self.update_probability = probability.clamp(0.0, 1.0);
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Check the policy bounds and the update probability
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| {
            DashboardError::Configuration(format!("series {}: {reason}", self.name))
        };
        if !(0.0..=1.0).contains(&self.update_probability) {
            return Err(invalid(format!(
                "update_probability must be within [0, 1], got {}",
                self.update_probability
            )));
        }
        self.policy.validate().map_err(invalid)
    }

    /// Series seeded with the initial values as given.
    ///
    /// Seeds are not clamped; the policy bounds apply from the first update.
    pub fn build(&self) -> MetricSeries {
        let mut series = MetricSeries::new(&self.name, self.capacity);
        for value in &self.initial {
            series.push(*value);
        }
        series
    }
}

/// Predefined series names
pub mod metric_names {
    // Headline counters
    pub const VERIFICATIONS_TOTAL: &str = "verifications.total";
    pub const VERIFICATIONS_PROCESSING: &str = "verifications.processing";

    // Live verification chart
    pub const CHART_VERIFICATIONS: &str = "chart.verifications";
    pub const CHART_FRAUD_CASES: &str = "chart.fraud_cases";
    pub const CHART_AI_PROCESSING: &str = "chart.ai_processing";

    // Performance radar
    pub const PERF_OCR_ENGINE: &str = "performance.ocr_engine";
    pub const PERF_AI_DETECTION: &str = "performance.ai_detection";
    pub const PERF_BLOCKCHAIN: &str = "performance.blockchain";
    pub const PERF_DATABASE: &str = "performance.database";
    pub const PERF_NETWORK: &str = "performance.network";
    pub const PERF_SECURITY: &str = "performance.security";
}

/// The series the government dashboard draws
pub fn default_series() -> Vec<SeriesConfig> {
    use metric_names::*;

    let performance = |name: &str, initial: f64| {
        SeriesConfig::new(
            name,
            SeriesPolicy::RandomWalk {
                max_variation: 2.0,
                min: 80.0,
                max: 100.0,
            },
            Cadence::Chart,
        )
        .with_initial(vec![initial])
        .with_update_probability(0.2)
        .with_group(PERFORMANCE_GROUP)
    };

    vec![
        SeriesConfig::new(
            VERIFICATIONS_TOTAL,
            SeriesPolicy::Counter {
                min_step: 1,
                max_step: 10,
            },
            Cadence::Live,
        )
        .with_initial(vec![0.0]),
        SeriesConfig::new(
            VERIFICATIONS_PROCESSING,
            SeriesPolicy::Counter {
                min_step: 5,
                max_step: 24,
            },
            Cadence::Live,
        )
        .with_initial(vec![0.0]),
        SeriesConfig::new(
            CHART_VERIFICATIONS,
            SeriesPolicy::Sampled {
                low: 200,
                high: 299,
            },
            Cadence::Chart,
        )
        .with_initial(vec![120.0, 89.0, 340.0, 580.0, 620.0, 450.0, 280.0]),
        SeriesConfig::new(
            CHART_FRAUD_CASES,
            SeriesPolicy::Sampled { low: 1, high: 5 },
            Cadence::Chart,
        )
        .with_initial(vec![2.0, 1.0, 8.0, 12.0, 15.0, 9.0, 5.0]),
        SeriesConfig::new(
            CHART_AI_PROCESSING,
            SeriesPolicy::Ratio {
                source: CHART_VERIFICATIONS.to_string(),
                factor: 0.95,
            },
            Cadence::Chart,
        )
        .with_initial(vec![115.0, 87.0, 325.0, 555.0, 590.0, 430.0, 270.0]),
        performance(PERF_OCR_ENGINE, 94.0),
        performance(PERF_AI_DETECTION, 98.0),
        performance(PERF_BLOCKCHAIN, 100.0),
        performance(PERF_DATABASE, 76.0),
        performance(PERF_NETWORK, 89.0),
        performance(PERF_SECURITY, 95.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::ScriptedRandom;

    #[test]
    fn test_series_evicts_oldest() {
        let mut series = MetricSeries::new("s", 3);
        for v in 1..=5 {
            series.push(v as f64);
        }
        assert_eq!(series.values(), vec![3.0, 4.0, 5.0]);
        assert_eq!(series.latest(), Some(5.0));
    }

    #[test]
    fn test_series_rejects_negative() {
        let mut series = MetricSeries::new("s", 3);
        series.push(-4.0);
        series.push(f64::NAN);
        assert_eq!(series.values(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_clamp_scenario() {
        let policy = SeriesPolicy::RandomWalk {
            max_variation: 2.0,
            min: 80.0,
            max: 100.0,
        };
        let mut value = 98.0;
        let mut seen = Vec::new();
        for delta in [5.0, 5.0] {
            value = policy.apply(value, delta);
            seen.push(value);
        }
        assert_eq!(seen, vec![100.0, 100.0]);
    }

    #[test]
    fn test_counter_never_decreases() {
        let policy = SeriesPolicy::Counter {
            min_step: 1,
            max_step: 10,
        };
        assert_eq!(policy.apply(10.0, -3.0), 10.0);

        let mut rng = ScriptedRandom::new([0.0, 0.999]);
        assert_eq!(policy.draw_delta(&mut rng), 1.0);
        assert_eq!(policy.draw_delta(&mut rng), 10.0);
    }

    #[test]
    fn test_random_walk_delta_is_symmetric() {
        let policy = SeriesPolicy::RandomWalk {
            max_variation: 2.0,
            min: 80.0,
            max: 100.0,
        };
        let mut rng = ScriptedRandom::new([0.0, 0.5]);
        assert_eq!(policy.draw_delta(&mut rng), -2.0);
        assert_eq!(policy.draw_delta(&mut rng), 0.0);
    }

    #[test]
    fn test_build_keeps_seed_below_clamp_range() {
        let database = default_series()
            .into_iter()
            .find(|c| c.name == metric_names::PERF_DATABASE)
            .unwrap();
        let series = database.build();
        assert_eq!(series.latest(), Some(76.0));

        // The clamp applies from the first update
        assert_eq!(database.policy.apply(76.0, 1.0), 80.0);
    }

    #[test]
    fn test_default_series_are_valid() {
        for config in default_series() {
            assert!(config.validate().is_ok(), "{} is invalid", config.name);
        }
    }

    #[test]
    fn test_inverted_bounds_are_rejected() {
        let config = SeriesConfig::new(
            "inverted",
            SeriesPolicy::RandomWalk {
                max_variation: 1.0,
                min: 100.0,
                max: 80.0,
            },
            Cadence::Chart,
        );
        let err = config.validate().unwrap_err();
        assert!(matches!(err, DashboardError::Configuration(_)));
        assert!(err.to_string().contains("series inverted"));
    }

    #[test]
    fn test_degenerate_policies_are_rejected() {
        let cases = [
            SeriesPolicy::RandomWalk {
                max_variation: 1.0,
                min: f64::NAN,
                max: 100.0,
            },
            SeriesPolicy::RandomWalk {
                max_variation: -1.0,
                min: 0.0,
                max: 100.0,
            },
            SeriesPolicy::Counter {
                min_step: 5,
                max_step: 1,
            },
            SeriesPolicy::Sampled { low: 9, high: 3 },
            SeriesPolicy::Ratio {
                source: "s".to_string(),
                factor: f64::INFINITY,
            },
        ];
        for policy in cases {
            assert!(policy.validate().is_err(), "{policy:?} accepted");
        }

        let mut config =
            SeriesConfig::new("p", SeriesPolicy::Sampled { low: 1, high: 2 }, Cadence::Live);
        config.update_probability = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sample_label() {
        let at = DateTime::parse_from_rfc3339("2024-06-15T09:05:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let mut series = MetricSeries::new("s", 2);
        let sample = series.push_at(1.0, at);
        assert_eq!(sample.label(), "09:05");
    }
}
