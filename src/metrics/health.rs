//! Synthetic component health

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::infra::{AlertLevel, NotificationCenter, RandomSource};

/// Readings below this raise a warning
pub const DEFAULT_HEALTH_ALERT_THRESHOLD: u8 = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HealthComponent {
    OcrEngine,
    AiDetection,
    Blockchain,
    Database,
    Network,
    Security,
}

impl HealthComponent {
    pub const ALL: [HealthComponent; 6] = [
        HealthComponent::OcrEngine,
        HealthComponent::AiDetection,
        HealthComponent::Blockchain,
        HealthComponent::Database,
        HealthComponent::Network,
        HealthComponent::Security,
    ];

    /// Inclusive range a reading is drawn from
    pub fn range(&self) -> (u8, u8) {
        match self {
            HealthComponent::OcrEngine => (90, 99),
            HealthComponent::AiDetection => (95, 99),
            HealthComponent::Blockchain => (100, 100),
            HealthComponent::Database => (70, 89),
            HealthComponent::Network => (85, 99),
            HealthComponent::Security => (92, 99),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthComponent::OcrEngine => "ocrEngine",
            HealthComponent::AiDetection => "aiDetection",
            HealthComponent::Blockchain => "blockchain",
            HealthComponent::Database => "database",
            HealthComponent::Network => "network",
            HealthComponent::Security => "security",
        }
    }
}

impl fmt::Display for HealthComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status bucket of a reading; ordered from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthLevel {
    Healthy,
    Degraded,
    Critical,
}

impl HealthLevel {
    pub fn from_value(value: u8) -> Self {
        if value >= 90 {
            HealthLevel::Healthy
        } else if value >= 75 {
            HealthLevel::Degraded
        } else {
            HealthLevel::Critical
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReading {
    pub component: HealthComponent,
    pub value: u8,
    pub level: HealthLevel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub readings: Vec<HealthReading>,
    pub sampled_at: DateTime<Utc>,
}

impl HealthReport {
    pub fn reading(&self, component: HealthComponent) -> Option<&HealthReading> {
        self.readings.iter().find(|r| r.component == component)
    }

    /// Worst level across all components
    pub fn overall(&self) -> HealthLevel {
        self.readings
            .iter()
            .map(|r| r.level)
            .max()
            .unwrap_or(HealthLevel::Healthy)
    }
}

/// Samples component health and raises warnings for low readings
pub struct HealthMonitor {
    threshold: u8,
    rng: Mutex<Box<dyn RandomSource>>,
    notifications: Arc<NotificationCenter>,
    last: RwLock<Option<HealthReport>>,
}

impl HealthMonitor {
    pub fn new(rng: Box<dyn RandomSource>, notifications: Arc<NotificationCenter>) -> Self {
        Self {
            threshold: DEFAULT_HEALTH_ALERT_THRESHOLD,
            rng: Mutex::new(rng),
            notifications,
            last: RwLock::new(None),
        }
    }

    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Draw one reading per component
    pub fn sample(&self) -> HealthReport {
        let readings: Vec<HealthReading> = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            HealthComponent::ALL
                .iter()
                .map(|component| {
                    let (low, high) = component.range();
                    let value = rng.range_inclusive(low as i64, high as i64) as u8;
                    HealthReading {
                        component: *component,
                        value,
                        level: HealthLevel::from_value(value),
                    }
                })
                .collect()
        };

        for reading in readings.iter().filter(|r| r.value < self.threshold) {
            warn!(
                component = %reading.component,
                value = reading.value,
                "Component health below threshold"
            );
            self.notifications.raise(
                AlertLevel::Warning,
                format!(
                    "{} performance is at {}% - attention required",
                    reading.component, reading.value
                ),
            );
        }

        let report = HealthReport {
            readings,
            sampled_at: Utc::now(),
        };
        debug!(overall = ?report.overall(), "Health sampled");

        *self.last.write().unwrap_or_else(PoisonError::into_inner) = Some(report.clone());
        report
    }

    /// Most recent report, if any sample has been taken
    pub fn last_report(&self) -> Option<HealthReport> {
        self.last
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
