//! Activity feed entries
//!
//! One entry is one line in the dashboard's live activity stream. Entries
//! are immutable; the "N seconds ago" label is computed on demand.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a feed entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Verified,
    Processing,
    Fraud,
    Blockchain,
}

impl ActivityKind {
    /// Icon rendered in front of the entry
    pub fn icon(&self) -> &'static str {
        match self {
            ActivityKind::Verified => "✅",
            ActivityKind::Processing => "⏳",
            ActivityKind::Fraud => "⚠️",
            ActivityKind::Blockchain => "⛓️",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Verified => "verified",
            ActivityKind::Processing => "processing",
            ActivityKind::Fraud => "fraud",
            ActivityKind::Blockchain => "blockchain",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single feed entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub kind: ActivityKind,
    pub icon: String,
    pub title: String,
    pub details: String,
    pub occurred_at: DateTime<Utc>,
}

impl ActivityEntry {
    /// Create an entry stamped with the current time
    pub fn new(kind: ActivityKind, title: impl Into<String>, details: impl Into<String>) -> Self {
        Self::at(kind, title, details, Utc::now())
    }

    /// Create an entry with an explicit timestamp
    pub fn at(
        kind: ActivityKind,
        title: impl Into<String>,
        details: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            kind,
            icon: kind.icon().to_string(),
            title: title.into(),
            details: details.into(),
            occurred_at,
        }
    }

    pub fn certificate_verified(details: impl Into<String>) -> Self {
        Self::new(ActivityKind::Verified, "Certificate Verified", details)
    }

    pub fn analysis_in_progress(details: impl Into<String>) -> Self {
        Self::new(ActivityKind::Processing, "AI Analysis in Progress", details)
    }

    pub fn fraud_alert(details: impl Into<String>) -> Self {
        Self::new(ActivityKind::Fraud, "Fraud Alert Triggered", details)
    }

    pub fn ledger_entry(block_number: u64) -> Self {
        Self::new(
            ActivityKind::Blockchain,
            "Blockchain Entry Created",
            format!("Block #{block_number} confirmed"),
        )
    }

    /// Display age relative to `now`.
    ///
    /// Under five seconds reads "Just now"; anything in the future is
    /// treated the same way.
    pub fn relative_age(&self, now: DateTime<Utc>) -> String {
        let seconds = (now - self.occurred_at).num_seconds();
        if seconds < 5 {
            "Just now".to_string()
        } else if seconds < 60 {
            format!("{seconds} seconds ago")
        } else if seconds < 3600 {
            let minutes = seconds / 60;
            if minutes == 1 {
                "1 minute ago".to_string()
            } else {
                format!("{minutes} minutes ago")
            }
        } else {
            let hours = seconds / 3600;
            if hours == 1 {
                "1 hour ago".to_string()
            } else {
                format!("{hours} hours ago")
            }
        }
    }
}

/// Degree names used when generating synthetic activity
pub const DEGREES: &[&str] = &[
    "B.Tech", "MBA", "M.Tech", "B.Com", "M.Com", "BCA", "MCA", "B.Sc", "M.Sc", "BA", "MA",
];

/// Institutions used when generating synthetic activity
pub const INSTITUTIONS: &[&str] = &[
    "NIT Jamshedpur",
    "Ranchi University",
    "BIT Mesra",
    "XLRI Jamshedpur",
    "Dhanbad Technical College",
    "Bokaro Engineering College",
    "Hazaribagh University",
    "Kolhan University",
    "Central University Jharkhand",
    "ISM Dhanbad",
];

/// Entries the dashboard shows before the first simulated event
pub fn initial_activity(now: DateTime<Utc>) -> Vec<ActivityEntry> {
    let ago = |secs: i64| now - chrono::Duration::seconds(secs);
    vec![
        ActivityEntry::at(
            ActivityKind::Verified,
            "Certificate Verified",
            "B.Tech - NIT Jamshedpur",
            ago(2),
        ),
        ActivityEntry::at(
            ActivityKind::Processing,
            "AI Analysis in Progress",
            "MBA - Ranchi University",
            ago(5),
        ),
        ActivityEntry::at(
            ActivityKind::Fraud,
            "Fraud Alert Triggered",
            "Fake signature detected",
            ago(12),
        ),
        ActivityEntry::at(
            ActivityKind::Blockchain,
            "Blockchain Entry Created",
            "Block #847592 confirmed",
            ago(18),
        ),
        ActivityEntry::at(
            ActivityKind::Verified,
            "Batch Verification Complete",
            "45 certificates processed",
            ago(32),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_icon_follows_kind() {
        let entry = ActivityEntry::ledger_entry(123456);
        assert_eq!(entry.icon, "⛓️");
        assert_eq!(entry.details, "Block #123456 confirmed");
    }

    #[test]
    fn test_relative_age() {
        let now = Utc::now();
        let entry = |secs| ActivityEntry::at(ActivityKind::Fraud, "t", "d", now - chrono::Duration::seconds(secs));

        assert_eq!(entry(0).relative_age(now), "Just now");
        assert_eq!(entry(12).relative_age(now), "12 seconds ago");
        assert_eq!(entry(60).relative_age(now), "1 minute ago");
        assert_eq!(entry(150).relative_age(now), "2 minutes ago");
        assert_eq!(entry(7300).relative_age(now), "2 hours ago");
    }

    #[test]
    fn test_initial_activity_is_newest_first() {
        let now = Utc::now();
        let entries = initial_activity(now);
        assert_eq!(entries.len(), 5);
        assert!(entries
            .windows(2)
            .all(|pair| pair[0].occurred_at > pair[1].occurred_at));
    }
}
