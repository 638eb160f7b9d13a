//! Integration tests for the wired dashboard: feed, simulator, health,
//! notifications and the interval scheduler.

mod common;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use common::*;
use truecred_dashboard::infra::{ActivityFeed, AlertLevel, ShutdownCoordinator};
use truecred_dashboard::metrics::{metric_names, Cadence, HealthComponent, HealthLevel};
use truecred_dashboard::{ActivityKind, DashboardConfig, DashboardContext};

fn context(config: DashboardConfig) -> DashboardContext {
    DashboardContext::new(config).unwrap()
}

// ============================================================================
// Activity Feed
// ============================================================================

#[test]
fn test_twenty_first_append_evicts_oldest() {
    let feed = ActivityFeed::new(20);
    let observer = Arc::new(RecordingFeedObserver::default());
    feed.subscribe(observer.clone());

    for n in 1..=21 {
        feed.append(numbered_entry(n));
    }

    let snapshot = feed.snapshot();
    assert_eq!(snapshot.len(), 20);
    assert_eq!(snapshot[0].title, "Entry 21");
    assert_eq!(snapshot[19].title, "Entry 2");
    assert!(!snapshot.iter().any(|e| e.title == "Entry 1"));

    assert_eq!(observer.render_count(), 21);
    assert_eq!(observer.last().unwrap(), snapshot);
    assert_eq!(feed.stats().evicted(), 1);
}

#[tokio::test]
async fn test_seeded_feed_then_live_entries() {
    let context = context(DashboardConfig {
        activity_probability: 1.0,
        ..seeded_config()
    });
    let seeded = context.seed_feed(Utc::now());
    assert_eq!(seeded.len(), 5);

    let entry = context.simulator.roll_activity().unwrap();
    let snapshot = context.feed.snapshot();
    assert_eq!(snapshot.len(), 6);
    assert_eq!(snapshot[0], entry);
    assert_eq!(snapshot[1], seeded[0]);
}

// ============================================================================
// Simulator
// ============================================================================

#[tokio::test]
async fn test_fraud_alert_reaches_feed_and_badge() {
    let context = context(DashboardConfig {
        fraud_alert_probability: 1.0,
        ..seeded_config()
    });

    assert!(context.simulator.roll_fraud_alert());

    let latest = context.feed.latest().unwrap();
    assert_eq!(latest.kind, ActivityKind::Fraud);
    assert_eq!(latest.title, "Fraud Alert Triggered");
    assert_eq!(context.notifications.unread(), 1);
    assert_eq!(context.simulator.fraud_alerts(), 1);
}

#[tokio::test]
async fn test_zero_probabilities_leave_state_untouched() {
    let context = context(DashboardConfig {
        fraud_alert_probability: 0.0,
        activity_probability: 0.0,
        notification_probability: 0.0,
        breakdown_probability: 0.0,
        ..seeded_config()
    });
    let breakdown = context.simulator.breakdown();

    for _ in 0..50 {
        assert!(!context.simulator.roll_fraud_alert());
        assert!(context.simulator.roll_activity().is_none());
        assert!(!context.simulator.roll_notification());
        assert!(context.simulator.roll_fraud_breakdown().is_none());
    }

    assert!(context.feed.is_empty());
    assert_eq!(context.notifications.unread(), 0);
    assert_eq!(context.simulator.breakdown(), breakdown);
}

#[tokio::test]
async fn test_radar_delta_is_clamped() {
    let context = context(seeded_config());
    let name = metric_names::PERF_OCR_ENGINE;

    assert_eq!(context.simulator.apply_delta(name, 50.0), Some(100.0));
    assert_eq!(context.simulator.apply_delta(name, 5.0), Some(100.0));
    assert_eq!(context.simulator.apply_delta(name, -50.0), Some(80.0));

    let values = context.simulator.series(name).unwrap().values();
    assert!(values.iter().all(|v| (80.0..=100.0).contains(v)));
}

#[tokio::test]
async fn test_chart_series_respect_capacity() {
    let context = context(DashboardConfig {
        performance_probability: 1.0,
        ..seeded_config()
    });
    let sink = Arc::new(RecordingChartSink::default());
    context.simulator.add_sink(sink.clone());

    for _ in 0..20 {
        context.simulator.tick_cadence(Cadence::Chart);
    }

    for name in context.simulator.series_names() {
        let series = context.simulator.series(&name).unwrap();
        assert!(series.len() <= 10, "{name} holds {} samples", series.len());
    }
    assert_eq!(
        context
            .simulator
            .series(metric_names::CHART_VERIFICATIONS)
            .unwrap()
            .len(),
        10
    );
    assert_eq!(sink.redraws_of(metric_names::CHART_VERIFICATIONS), 20);
    assert_eq!(sink.redraws_of(metric_names::PERF_DATABASE), 20);
    assert_eq!(sink.redraws_of(metric_names::VERIFICATIONS_TOTAL), 0);
}

#[tokio::test]
async fn test_radar_series_move_together() {
    let context = context(DashboardConfig {
        performance_probability: 0.2,
        ..seeded_config()
    });

    for _ in 0..50 {
        let radar: Vec<String> = context
            .simulator
            .tick_cadence(Cadence::Chart)
            .into_iter()
            .filter(|name| name.starts_with("performance."))
            .collect();
        assert!(
            radar.is_empty() || radar.len() == 6,
            "partial radar update: {radar:?}"
        );
    }
}

#[tokio::test]
async fn test_database_seed_shown_until_first_update() {
    let context = context(seeded_config());
    assert_eq!(context.simulator.latest(metric_names::PERF_DATABASE), Some(76.0));

    let stored = context
        .simulator
        .apply_delta(metric_names::PERF_DATABASE, 1.0)
        .unwrap();
    assert_eq!(stored, 80.0);
}

#[tokio::test]
async fn test_live_counters_never_decrease() {
    let context = context(seeded_config());

    for _ in 0..30 {
        context.simulator.tick_cadence(Cadence::Live);
    }

    let values = context
        .simulator
        .series(metric_names::VERIFICATIONS_TOTAL)
        .unwrap()
        .values();
    assert!(values.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[tokio::test]
async fn test_breakdown_bump_notifies_sink() {
    let context = context(DashboardConfig {
        breakdown_probability: 1.0,
        ..seeded_config()
    });
    let sink = Arc::new(RecordingChartSink::default());
    context.simulator.add_sink(sink.clone());
    let before: u64 = context.simulator.breakdown().iter().map(|(_, n)| n).sum();

    let category = context.simulator.roll_fraud_breakdown().unwrap();

    let after: u64 = context.simulator.breakdown().iter().map(|(_, n)| n).sum();
    assert!((1..=3).contains(&(after - before)));
    let breakdowns = sink.breakdowns.lock().unwrap();
    assert_eq!(breakdowns.len(), 1);
    assert!(breakdowns[0].iter().any(|(name, _)| *name == category));
}

#[tokio::test]
async fn test_metrics_exports() {
    let context = context(seeded_config());
    context.simulator.tick();

    let json = context.simulator.to_json();
    assert_eq!(json["ticks"], 1);
    assert!(json["series"][metric_names::VERIFICATIONS_TOTAL].is_array());

    let text = context.simulator.to_prometheus();
    assert!(text.contains("truecred_fraud_alerts "));
    assert!(text.contains("truecred_verifications_total "));
    assert!(text.contains("truecred_performance_database "));
}

// ============================================================================
// Health and Notifications
// ============================================================================

#[tokio::test]
async fn test_strict_threshold_warns_for_each_component_below_it() {
    let context = context(DashboardConfig {
        health_alert_threshold: 100,
        ..seeded_config()
    });

    let report = context.health.sample();
    let below = report.readings.iter().filter(|r| r.value < 100).count();

    // Blockchain always reads 100
    assert_eq!(report.reading(HealthComponent::Blockchain).unwrap().value, 100);
    assert_eq!(context.notifications.recent_alerts().len(), below);
    assert_eq!(context.notifications.unread(), below as u64);
    assert!(context
        .notifications
        .recent_alerts()
        .iter()
        .all(|a| a.level == AlertLevel::Warning && a.message.ends_with("attention required")));
}

#[tokio::test]
async fn test_health_readings_stay_in_range() {
    let context = context(seeded_config());

    for _ in 0..25 {
        let report = context.health.sample();
        assert_eq!(report.readings.len(), HealthComponent::ALL.len());
        for reading in &report.readings {
            let (low, high) = reading.component.range();
            assert!((low..=high).contains(&reading.value));
            assert_eq!(reading.level, HealthLevel::from_value(reading.value));
        }
    }
}

#[tokio::test]
async fn test_mark_all_read_returns_prior_count() {
    let context = context(DashboardConfig {
        notification_probability: 1.0,
        ..seeded_config()
    });

    for _ in 0..4 {
        context.simulator.roll_notification();
    }
    assert_eq!(context.notifications.mark_all_read(), 4);
    assert_eq!(context.notifications.unread(), 0);
    assert_eq!(context.notifications.mark_all_read(), 0);
}

// ============================================================================
// Scheduler
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_scheduler_cadences() {
    let context = context(seeded_config());
    let coordinator = ShutdownCoordinator::new();
    let handles = context.spawn_scheduler(coordinator.signal());

    tokio::time::sleep(Duration::from_millis(29_500)).await;
    assert_eq!(
        context
            .simulator
            .series(metric_names::CHART_VERIFICATIONS)
            .unwrap()
            .len(),
        7
    );
    assert!(context.health.last_report().is_none());

    // Chart redraw at 30s
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(
        context
            .simulator
            .series(metric_names::CHART_VERIFICATIONS)
            .unwrap()
            .len(),
        8
    );

    // Health sample at 60s
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert!(context.health.last_report().is_some());

    coordinator.shutdown();
    for handle in handles {
        handle.await.unwrap();
    }
}

#[tokio::test(start_paused = true)]
async fn test_nothing_runs_after_shutdown() {
    let context = context(DashboardConfig {
        activity_probability: 1.0,
        ..seeded_config()
    });
    let coordinator = ShutdownCoordinator::new();
    let handles = context.spawn_scheduler(coordinator.signal());

    tokio::time::sleep(Duration::from_millis(3_500)).await;
    coordinator.shutdown();
    for handle in handles {
        handle.await.unwrap();
    }
    let len = context.feed.len();
    let total = context
        .simulator
        .series(metric_names::VERIFICATIONS_TOTAL)
        .unwrap()
        .len();

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(context.feed.len(), len);
    assert_eq!(
        context
            .simulator
            .series(metric_names::VERIFICATIONS_TOTAL)
            .unwrap()
            .len(),
        total
    );
}
