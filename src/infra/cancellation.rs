//! Cancellation tokens for verification runs
//!
//! A run checks its token before every state transition and races each
//! dwell sleep against [`CancelToken::cancelled`], so cancelling never
//! leaves a timer pending.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    notify: Notify,
}

/// Shared, cloneable cancellation signal
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        if !self.inner.cancelled.swap(true, Ordering::SeqCst) {
            self.inner.notify.notify_waiters();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Completes once cancellation has been requested
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }

    /// Sleep for `duration` unless cancelled first.
    ///
    /// Returns `true` if the full duration elapsed.
    pub async fn sleep(&self, duration: Duration) -> bool {
        if self.is_cancelled() {
            return false;
        }
        tokio::select! {
            _ = tokio::time::sleep(duration) => true,
            _ = self.cancelled() => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cancel_is_shared_between_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());

        token.cancel();
        token.cancel();
        assert!(clone.is_cancelled());
        clone.cancelled().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_completes_without_cancel() {
        let token = CancelToken::new();
        assert!(token.sleep(Duration::from_secs(2)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_interrupted_by_cancel() {
        let token = CancelToken::new();
        let sleeper = token.clone();
        let task = tokio::spawn(async move { sleeper.sleep(Duration::from_secs(60)).await });

        tokio::time::sleep(Duration::from_secs(1)).await;
        token.cancel();

        assert!(!task.await.unwrap());
    }

    #[tokio::test]
    async fn test_sleep_after_cancel_returns_immediately() {
        let token = CancelToken::new();
        token.cancel();
        assert!(!token.sleep(Duration::from_secs(3600)).await);
    }
}
