//! Infrastructure layer for the TrueCred dashboard
//!
//! Contains trait definitions and the shared components behind them:
//! - Random sources (seeded, entropy, scripted)
//! - Activity feed (bounded, newest first)
//! - Notification center (unread counter and alerts)
//! - Verification flow (single-run pipeline with cancellation)
//! - Graceful shutdown (signal handling, task cleanup)

mod activity_feed;
mod cancellation;
mod error;
mod graceful_shutdown;
mod notification_center;
mod random;
mod traits;
mod verification_flow;

pub use activity_feed::{ActivityFeed, FeedStats, DEFAULT_FEED_CAPACITY};
pub use cancellation::CancelToken;
pub use error::*;
pub use graceful_shutdown::{
    shutdown_signal, spawn_until_shutdown, ShutdownCoordinator, ShutdownSignal,
};
pub use notification_center::{Alert, AlertLevel, NotificationCenter, DEFAULT_ALERT_HISTORY};
pub use random::{source_from_seed, RngSource, ScriptedRandom};
pub use traits::*;
pub use verification_flow::*;
