//! TrueCred Dashboard Library
//!
//! Simulation core behind the TrueCred credential verification portals:
//! the live activity feed, the analytics counters and charts, the
//! certificate verification pipeline, notifications and sign-in.
//!
//! ## Modules
//!
//! - [`domain`] - Core domain types (feed entries, verification results, sessions)
//! - [`infra`] - Shared components (feed, notifications, verification flow, shutdown)
//! - [`metrics`] - Metric series, the metrics simulator and health monitoring
//! - [`auth`] - Credential validation, login and session persistence
//! - [`config`] - Environment-driven configuration
//! - [`telemetry`] - Logging setup
//! - [`runtime`] - Component wiring and the interval scheduler

pub mod auth;
pub mod config;
pub mod domain;
pub mod infra;
pub mod metrics;
pub mod runtime;
pub mod telemetry;

// Re-export commonly used types
pub use config::DashboardConfig;
pub use domain::{
    ActivityEntry, ActivityKind, DemoSample, DocumentRef, FlowState, SessionRecord, UserType,
    VerificationOutcome, VerificationResult,
};
pub use infra::{
    ActivityFeed, DashboardError, FlowReport, FlowRequest, NotificationCenter, RandomSource,
    Result, VerificationFlow,
};
pub use metrics::{HealthMonitor, MetricSeries, MetricsSimulator};
pub use runtime::DashboardContext;
