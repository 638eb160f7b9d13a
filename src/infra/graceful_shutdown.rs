//! Graceful shutdown handling
//!
//! - Signal handling (SIGTERM, SIGINT)
//! - Stopping the scheduler's interval tasks
//! - Shutdown hooks (cancelling an active verification run)

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::signal;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info};

type ShutdownHook = Box<dyn FnOnce() + Send + 'static>;

/// Shutdown signal that can be cloned into tasks
#[derive(Clone)]
pub struct ShutdownSignal {
    shutdown: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl ShutdownSignal {
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Wait for shutdown
    pub async fn wait(&self) {
        loop {
            let notified = self.notify.notified();
            if self.is_shutdown() {
                return;
            }
            notified.await;
        }
    }
}

/// Owns the shutdown flag and the hooks run when it flips
pub struct ShutdownCoordinator {
    shutdown: Arc<AtomicBool>,
    notify: Arc<Notify>,
    hooks: Mutex<Vec<ShutdownHook>>,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self {
            shutdown: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
            hooks: Mutex::new(Vec::new()),
        }
    }

    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            shutdown: self.shutdown.clone(),
            notify: self.notify.clone(),
        }
    }

    /// Register a hook run once at shutdown
    pub fn register_hook<F>(&self, hook: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.hooks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(hook));
    }

    /// Initiate shutdown. Hooks run on the first call only.
    pub fn shutdown(&self) {
        if self.shutdown.swap(true, Ordering::SeqCst) {
            return;
        }

        info!("Initiating graceful shutdown...");

        self.notify.notify_waiters();

        let hooks: Vec<ShutdownHook> = self
            .hooks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for hook in hooks {
            hook();
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Completes on Ctrl+C or SIGTERM
pub async fn shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())?;
        tokio::select! {
            result = signal::ctrl_c() => {
                result?;
                info!("Received Ctrl+C, initiating shutdown...");
            }
            _ = terminate.recv() => {
                info!("Received SIGTERM, initiating shutdown...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await?;
        info!("Received Ctrl+C, initiating shutdown...");
    }

    Ok(())
}

/// Spawn a task that is dropped as soon as shutdown is signalled
pub fn spawn_until_shutdown<F>(
    name: &'static str,
    signal: ShutdownSignal,
    task: F,
) -> JoinHandle<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        tokio::select! {
            _ = signal.wait() => {
                debug!(task = name, "Task stopped due to shutdown signal");
            }
            _ = task => {
                debug!(task = name, "Task finished");
            }
        }
    })
}
