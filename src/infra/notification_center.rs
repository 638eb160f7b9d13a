//! Unread notification counter and recent alerts

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Default number of alerts retained
pub const DEFAULT_ALERT_HISTORY: usize = 50;

/// Severity of an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertLevel::Info => write!(f, "info"),
            AlertLevel::Success => write!(f, "success"),
            AlertLevel::Warning => write!(f, "warning"),
            AlertLevel::Error => write!(f, "error"),
        }
    }
}

/// A raised alert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub level: AlertLevel,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

type CountObserver = Arc<dyn Fn(u64) + Send + Sync>;

/// Counts unread alerts
pub struct NotificationCenter {
    unread: AtomicU64,
    history_limit: usize,
    alerts: RwLock<VecDeque<Alert>>,
    observers: RwLock<Vec<CountObserver>>,
}

impl NotificationCenter {
    pub fn new(history_limit: usize) -> Self {
        Self {
            unread: AtomicU64::new(0),
            history_limit,
            alerts: RwLock::new(VecDeque::new()),
            observers: RwLock::new(Vec::new()),
        }
    }

    /// Register a callback receiving the unread count after each change
    pub fn subscribe<F>(&self, observer: F)
    where
        F: Fn(u64) + Send + Sync + 'static,
    {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(observer));
    }

    /// Add one unread notification, returning the new count
    pub fn increment(&self) -> u64 {
        let count = self.unread.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(unread = count, "Notification received");
        self.notify(count);
        count
    }

    /// Record an alert and count it as unread
    pub fn raise(&self, level: AlertLevel, message: impl Into<String>) -> u64 {
        let alert = Alert {
            level,
            message: message.into(),
            raised_at: Utc::now(),
        };
        {
            let mut alerts = self.alerts.write().unwrap_or_else(PoisonError::into_inner);
            alerts.push_front(alert);
            alerts.truncate(self.history_limit);
        }
        self.increment()
    }

    /// Reset the counter, returning the count it held
    pub fn mark_all_read(&self) -> u64 {
        let previous = self.unread.swap(0, Ordering::SeqCst);
        info!(cleared = previous, "All notifications marked as read");
        self.notify(0);
        previous
    }

    pub fn unread(&self) -> u64 {
        self.unread.load(Ordering::SeqCst)
    }

    /// Recent alerts, newest first
    pub fn recent_alerts(&self) -> Vec<Alert> {
        self.alerts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    fn notify(&self, count: u64) {
        let observers = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for observer in observers {
            observer(count);
        }
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(DEFAULT_ALERT_HISTORY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_all_read_returns_prior() {
        let center = NotificationCenter::default();
        center.increment();
        center.increment();
        center.increment();

        assert_eq!(center.mark_all_read(), 3);
        assert_eq!(center.unread(), 0);
        assert_eq!(center.mark_all_read(), 0);
    }

    #[test]
    fn test_raise_counts_and_bounds_history() {
        let center = NotificationCenter::new(2);
        center.raise(AlertLevel::Warning, "first");
        center.raise(AlertLevel::Error, "second");
        center.raise(AlertLevel::Info, "third");

        assert_eq!(center.unread(), 3);
        let alerts = center.recent_alerts();
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].message, "third");
        assert_eq!(alerts[1].level, AlertLevel::Error);
    }

    #[test]
    fn test_observer_sees_counts() {
        let center = NotificationCenter::default();
        let seen = Arc::new(RwLock::new(Vec::new()));
        let seen_clone = seen.clone();
        center.subscribe(move |count| seen_clone.write().unwrap().push(count));

        center.increment();
        center.increment();
        center.mark_all_read();

        assert_eq!(*seen.read().unwrap(), vec![1, 2, 0]);
    }
}
