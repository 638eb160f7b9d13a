//! Common test utilities and fixtures for integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use uuid::Uuid;

use truecred_dashboard::auth::InMemoryIdentityProvider;
use truecred_dashboard::domain::FlowState;
use truecred_dashboard::infra::{ChartSink, FeedObserver, FlowConfig, FlowObserver};
use truecred_dashboard::metrics::MetricSample;
use truecred_dashboard::{ActivityEntry, ActivityKind, DashboardConfig, DocumentRef, FlowReport};

/// Seed shared by the deterministic fixtures
pub const TEST_SEED: u64 = 42;

/// Registered account used by the login tests
pub const TEST_EMAIL: &str = "registrar@university.edu";
pub const TEST_PASSWORD: &str = "correct-horse";

/// Seeded configuration with the stock timings
pub fn seeded_config() -> DashboardConfig {
    DashboardConfig {
        seed: Some(TEST_SEED),
        ..DashboardConfig::default()
    }
}

/// Flow timings matching the portal: 2s per state, 1s settle
pub fn portal_flow_config() -> FlowConfig {
    FlowConfig {
        dwell: Duration::from_secs(2),
        settle: Duration::from_secs(1),
        ..FlowConfig::default()
    }
}

/// Identity provider with one registered account
pub fn provider_with_account() -> InMemoryIdentityProvider {
    InMemoryIdentityProvider::new().with_account(TEST_EMAIL, TEST_PASSWORD, Some("Registrar"))
}

/// Numbered entry, handy for ordering assertions
pub fn numbered_entry(n: usize) -> ActivityEntry {
    ActivityEntry::new(ActivityKind::Processing, format!("Entry {n}"), format!("details {n}"))
}

pub fn pdf(name: &str) -> DocumentRef {
    DocumentRef::new(name, "application/pdf", 256 * 1024)
}

pub fn png(name: &str) -> DocumentRef {
    DocumentRef::new(name, "image/png", 128 * 1024)
}

/// Flow observer that keeps every callback
#[derive(Default)]
pub struct RecordingFlowObserver {
    pub transitions: Mutex<Vec<(Uuid, FlowState)>>,
    pub reports: Mutex<Vec<FlowReport>>,
}

impl RecordingFlowObserver {
    pub fn states(&self) -> Vec<FlowState> {
        self.transitions
            .lock()
            .unwrap()
            .iter()
            .map(|(_, state)| *state)
            .collect()
    }

    pub fn report_count(&self) -> usize {
        self.reports.lock().unwrap().len()
    }
}

impl FlowObserver for RecordingFlowObserver {
    fn transition(&self, run_id: Uuid, state: FlowState) {
        self.transitions.lock().unwrap().push((run_id, state));
    }

    fn completed(&self, report: &FlowReport) {
        self.reports.lock().unwrap().push(report.clone());
    }
}

/// Chart sink that records every redraw
#[derive(Default)]
pub struct RecordingChartSink {
    pub redraws: Mutex<Vec<(String, usize)>>,
    pub breakdowns: Mutex<Vec<Vec<(String, u64)>>>,
}

impl RecordingChartSink {
    pub fn redraws_of(&self, name: &str) -> usize {
        self.redraws
            .lock()
            .unwrap()
            .iter()
            .filter(|(series, _)| series == name)
            .count()
    }
}

impl ChartSink for RecordingChartSink {
    fn series_updated(&self, name: &str, samples: &[MetricSample]) {
        self.redraws
            .lock()
            .unwrap()
            .push((name.to_string(), samples.len()));
    }

    fn breakdown_updated(&self, categories: &[(String, u64)]) {
        self.breakdowns.lock().unwrap().push(categories.to_vec());
    }
}

/// Feed observer counting renders and remembering the last snapshot
#[derive(Default)]
pub struct RecordingFeedObserver {
    pub renders: Mutex<Vec<Vec<ActivityEntry>>>,
}

impl RecordingFeedObserver {
    pub fn render_count(&self) -> usize {
        self.renders.lock().unwrap().len()
    }

    pub fn last(&self) -> Option<Vec<ActivityEntry>> {
        self.renders.lock().unwrap().last().cloned()
    }
}

impl FeedObserver for RecordingFeedObserver {
    fn feed_changed(&self, snapshot: &[ActivityEntry]) {
        self.renders.lock().unwrap().push(snapshot.to_vec());
    }
}

pub fn shared<T>(value: T) -> Arc<T> {
    Arc::new(value)
}
