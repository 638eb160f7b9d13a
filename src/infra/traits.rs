//! Trait seams for the dashboard core
//!
//! Randomness, rendering and identity are all injected through these
//! traits so state transitions can be driven and observed without a
//! browser, a chart library or a live identity provider.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use uuid::Uuid;

use crate::auth::AuthError;
use crate::domain::{ActivityEntry, FlowState, SessionRecord, UserRecord};
use crate::metrics::MetricSample;

use super::{FlowReport, Result};

/// Source of uniform random draws.
///
/// Implementors only supply [`RandomSource::next_f64`]; every other draw
/// is derived from it so a scripted source fully determines behaviour.
pub trait RandomSource: Send {
    /// Uniform float in `[0, 1)`
    fn next_f64(&mut self) -> f64;

    /// Uniform integer in `low..=high`
    fn range_inclusive(&mut self, low: i64, high: i64) -> i64 {
        if high <= low {
            return low;
        }
        let span = (high - low + 1) as f64;
        let offset = (self.next_f64() * span).floor() as i64;
        low + offset.clamp(0, high - low)
    }

    /// Uniform float in `[low, high)`
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        low + self.next_f64() * (high - low)
    }

    /// True with probability `p`
    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Uniform index into a collection of `len` items (0 when empty)
    fn pick_index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        self.range_inclusive(0, len as i64 - 1) as usize
    }
}

/// Receives the feed after every mutation
pub trait FeedObserver: Send + Sync {
    fn feed_changed(&self, snapshot: &[ActivityEntry]);
}

impl<F> FeedObserver for F
where
    F: Fn(&[ActivityEntry]) + Send + Sync,
{
    fn feed_changed(&self, snapshot: &[ActivityEntry]) {
        self(snapshot)
    }
}

/// Charting collaborator: replaces a series' data and redraws
pub trait ChartSink: Send + Sync {
    fn series_updated(&self, name: &str, samples: &[MetricSample]);

    /// Category totals of the fraud breakdown chart changed
    fn breakdown_updated(&self, _categories: &[(String, u64)]) {}
}

impl<F> ChartSink for F
where
    F: Fn(&str, &[MetricSample]) + Send + Sync,
{
    fn series_updated(&self, name: &str, samples: &[MetricSample]) {
        self(name, samples)
    }
}

/// Receives verification run progress
pub trait FlowObserver: Send + Sync {
    /// The run entered `state`
    fn transition(&self, run_id: Uuid, state: FlowState);

    /// The run finished with a report
    fn completed(&self, _report: &FlowReport) {}
}

/// External identity provider (email/password and OAuth popup sign-in)
#[cfg_attr(test, automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Sign in with email and password
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> std::result::Result<UserRecord, AuthError>;

    /// Sign in through an OAuth popup for the named provider
    async fn sign_in_with_popup(&self, provider: &str)
        -> std::result::Result<UserRecord, AuthError>;

    /// Register a new email/password account
    async fn create_user(
        &self,
        email: &str,
        password: &str,
    ) -> std::result::Result<UserRecord, AuthError>;

    /// End the provider-side session
    async fn sign_out(&self) -> std::result::Result<(), AuthError>;
}

/// Client-side persistence for the session record
#[cfg_attr(test, automock)]
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Option<SessionRecord>>;

    fn save(&self, record: &SessionRecord) -> Result<()>;

    fn clear(&self) -> Result<()>;
}
