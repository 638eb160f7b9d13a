//! Headless dashboard runtime.
//!
//! This module wires together:
//! - configuration and logging
//! - the shared components (feed, notifications, simulator, flow, health, auth)
//! - the interval tasks that drive them
//! - logging render sinks standing in for the browser views

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::{FileSessionStore, InMemoryIdentityProvider, InMemorySessionStore, LoginRateLimiter, LoginService};
use crate::config::DashboardConfig;
use crate::domain::{initial_activity, ActivityEntry, FlowState};
use crate::infra::{
    shutdown_signal, source_from_seed, spawn_until_shutdown, ActivityFeed, ChartSink,
    FeedObserver, FlowObserver, FlowReport, FlowRequest, IdentityProvider, NotificationCenter,
    Result, SessionStore, ShutdownCoordinator, ShutdownSignal, VerificationFlow,
};
use crate::metrics::{Cadence, HealthMonitor, MetricSample, MetricsSimulator};
use crate::telemetry::{init_telemetry, TelemetryConfig};

// Independent random streams derived from the configured seed
const SIMULATOR_STREAM: u64 = 0;
const FLOW_STREAM: u64 = 1;
const HEALTH_STREAM: u64 = 2;

/// Every shared component of a running dashboard
pub struct DashboardContext {
    pub config: DashboardConfig,
    pub feed: Arc<ActivityFeed>,
    pub notifications: Arc<NotificationCenter>,
    pub simulator: Arc<MetricsSimulator>,
    pub flow: Arc<VerificationFlow>,
    pub health: Arc<HealthMonitor>,
    pub auth: Arc<LoginService>,
}

impl DashboardContext {
    /// Build with the in-memory identity provider and the configured store
    pub fn new(config: DashboardConfig) -> Result<Self> {
        let provider: Arc<dyn IdentityProvider> = Arc::new(InMemoryIdentityProvider::new());
        let store: Arc<dyn SessionStore> = match &config.session_file {
            Some(path) => Arc::new(FileSessionStore::new(path)),
            None => Arc::new(InMemorySessionStore::new()),
        };
        Self::with_identity(config, provider, store)
    }

    pub fn with_identity(
        config: DashboardConfig,
        provider: Arc<dyn IdentityProvider>,
        store: Arc<dyn SessionStore>,
    ) -> Result<Self> {
        config.validate()?;

        let feed = Arc::new(ActivityFeed::new(config.feed_capacity));
        let notifications = Arc::new(NotificationCenter::new(config.alert_history));

        let simulator = Arc::new(MetricsSimulator::new(
            config.simulator_config(),
            source_from_seed(config.stream_seed(SIMULATOR_STREAM)),
            feed.clone(),
            notifications.clone(),
        )?);

        let flow = Arc::new(
            VerificationFlow::new(
                config.flow.clone(),
                source_from_seed(config.stream_seed(FLOW_STREAM)),
            )
            .with_feed(feed.clone()),
        );

        let health = Arc::new(
            HealthMonitor::new(
                source_from_seed(config.stream_seed(HEALTH_STREAM)),
                notifications.clone(),
            )
            .with_threshold(config.health_alert_threshold),
        );

        let auth = Arc::new(
            LoginService::new(provider, store)
                .with_rate_limiter(LoginRateLimiter::new(config.login_attempts_per_minute)),
        );

        Ok(Self {
            config,
            feed,
            notifications,
            simulator,
            flow,
            health,
            auth,
        })
    }

    /// Fill the feed with the entries shown before the first event
    pub fn seed_feed(&self, now: DateTime<Utc>) -> Vec<ActivityEntry> {
        self.feed.seed(initial_activity(now))
    }

    /// Route every render callback to the log
    pub fn attach_logging_sinks(&self) {
        let renderer = Arc::new(LogRenderer);
        self.feed.subscribe(renderer.clone());
        self.simulator.add_sink(renderer.clone());
        self.flow.subscribe(renderer);
        self.notifications
            .subscribe(|unread| debug!(unread, "Notification badge updated"));
    }

    /// Spawn one interval task per scheduled job
    pub fn spawn_scheduler(&self, signal: ShutdownSignal) -> Vec<JoinHandle<()>> {
        let schedule = &self.config.schedule;
        let mut handles = Vec::with_capacity(6);

        let simulator = self.simulator.clone();
        handles.push(spawn_job("activity", schedule.activity, signal.clone(), move || {
            simulator.roll_activity();
        }));

        let simulator = self.simulator.clone();
        handles.push(spawn_job(
            "live_counters",
            schedule.live_counters,
            signal.clone(),
            move || {
                simulator.tick_cadence(Cadence::Live);
            },
        ));

        let simulator = self.simulator.clone();
        handles.push(spawn_job(
            "notifications",
            schedule.notifications,
            signal.clone(),
            move || {
                simulator.roll_notification();
            },
        ));

        let simulator = self.simulator.clone();
        handles.push(spawn_job(
            "fraud_alerts",
            schedule.fraud_alerts,
            signal.clone(),
            move || {
                simulator.roll_fraud_alert();
            },
        ));

        let simulator = self.simulator.clone();
        handles.push(spawn_job("charts", schedule.charts, signal.clone(), move || {
            simulator.tick_cadence(Cadence::Chart);
            simulator.roll_fraud_breakdown();
        }));

        let health = self.health.clone();
        handles.push(spawn_job("health", schedule.health, signal, move || {
            health.sample();
        }));

        info!(jobs = handles.len(), "Scheduler started");
        handles
    }

    /// Current dashboard state as JSON
    pub fn snapshot(&self) -> serde_json::Value {
        serde_json::json!({
            "metrics": self.simulator.to_json(),
            "feed": self.feed.snapshot(),
            "unread_notifications": self.notifications.unread(),
            "alerts": self.notifications.recent_alerts(),
            "health": self.health.last_report(),
            "flow_state": self.flow.current_state(),
        })
    }
}

/// Run `job` every `period`, first after one full period, until shutdown
fn spawn_job<F>(
    name: &'static str,
    period: Duration,
    signal: ShutdownSignal,
    mut job: F,
) -> JoinHandle<()>
where
    F: FnMut() + Send + 'static,
{
    spawn_until_shutdown(name, signal, async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval.tick().await;
        loop {
            interval.tick().await;
            job();
        }
    })
}

/// Render sink that writes dashboard updates to the log
pub struct LogRenderer;

impl FeedObserver for LogRenderer {
    fn feed_changed(&self, snapshot: &[ActivityEntry]) {
        if let Some(latest) = snapshot.first() {
            info!(
                kind = %latest.kind,
                title = %latest.title,
                details = %latest.details,
                entries = snapshot.len(),
                "{} {}",
                latest.icon,
                latest.title
            );
        }
    }
}

impl ChartSink for LogRenderer {
    fn series_updated(&self, name: &str, samples: &[MetricSample]) {
        if let Some(last) = samples.last() {
            debug!(
                series = name,
                value = last.value,
                label = %last.label(),
                points = samples.len(),
                "Chart updated"
            );
        }
    }

    fn breakdown_updated(&self, categories: &[(String, u64)]) {
        debug!(?categories, "Fraud breakdown updated");
    }
}

impl FlowObserver for LogRenderer {
    fn transition(&self, run_id: Uuid, state: FlowState) {
        info!(
            %run_id,
            state = %state,
            progress = state.progress_percent(),
            "{}",
            state.status_text()
        );
    }

    fn completed(&self, report: &FlowReport) {
        for verdict in &report.verdicts {
            info!(
                run_id = %report.run_id,
                document = %verdict.document.name,
                outcome = %verdict.result.outcome,
                confidence = verdict.result.confidence,
                "{} {}",
                verdict.result.outcome.icon(),
                verdict.result.outcome.status_text()
            );
        }
    }
}

/// Start the headless dashboard and block until Ctrl+C / SIGTERM.
pub async fn run() -> anyhow::Result<()> {
    let telemetry = TelemetryConfig::from_env();
    init_telemetry(&telemetry).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    info!(
        "Starting {} v{}",
        telemetry.service_name, telemetry.service_version
    );

    let config = DashboardConfig::from_env()?;
    info!("Configuration loaded");
    info!("  Seed: {:?}", config.seed);
    info!("  Feed capacity: {}", config.feed_capacity);
    info!("  Flow dwell: {:?}", config.flow.dwell);

    let context = DashboardContext::new(config)?;
    context.attach_logging_sinks();
    context.seed_feed(Utc::now());

    let coordinator = ShutdownCoordinator::new();
    let flow = context.flow.clone();
    coordinator.register_hook(move || {
        flow.cancel_active();
    });

    let mut handles = context.spawn_scheduler(coordinator.signal());

    if let Some(sample) = context.config.demo_sample {
        let run = context.flow.start(FlowRequest::demo(sample))?;
        info!(run_id = %run.run_id(), sample = sample.as_str(), "Demo verification started");
        handles.push(spawn_until_shutdown(
            "demo_verification",
            coordinator.signal(),
            log_outcome(run.wait()),
        ));
    }

    shutdown_signal().await?;
    coordinator.shutdown();

    for handle in handles {
        if let Err(e) = handle.await {
            warn!(error = %e, "Scheduler task ended abnormally");
        }
    }

    info!(snapshot = %context.snapshot(), "Dashboard stopped");
    Ok(())
}

async fn log_outcome(run: impl Future<Output = Result<FlowReport>>) {
    match run.await {
        Ok(report) => info!(
            run_id = %report.run_id,
            states = report.visited.len(),
            "Demo verification finished"
        ),
        Err(e) => warn!(error = %e, "Demo verification did not complete"),
    }
}
