//! Bounded-grace-window shutdown coordination across listener threads.
//!
//! Grounded on `router-core/src/main.rs` and `system/server.rs`: the
//! teacher runs one thread per listener group and lets `ctrlc`/pingora's
//! own `Server::run` own the shutdown signal. Here we expose the
//! grace-window wait as a standalone primitive so `main.rs` can await a
//! SIGINT/SIGTERM, then give in-flight requests a bounded window to
//! finish before the process exits (spec.md §6's "Lifecycle").

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Barrier;

use crate::config::DEFAULT_SHUTDOWN_GRACE_SECONDS;

/// Waits for SIGINT or SIGTERM, then returns. `main.rs` uses this to
/// decide when to stop accepting new connections.
pub async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
        tokio::select! {
            _ = sigterm.recv() => {}
            _ = sigint.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

/// Coordinates a bounded grace window across `n` independently-running
/// listeners: every listener calls [`GraceWindow::listener_stopped`]
/// once it has stopped accepting new connections, and the process waits
/// at most `grace` for all of them before returning, so one slow
/// listener can't hang the shutdown indefinitely.
pub struct GraceWindow {
    barrier: Arc<Barrier>,
    grace: Duration,
}

impl GraceWindow {
    pub fn new(listener_count: usize, grace_seconds: Option<u64>) -> Self {
        GraceWindow {
            barrier: Arc::new(Barrier::new(listener_count.max(1))),
            grace: Duration::from_secs(grace_seconds.unwrap_or(DEFAULT_SHUTDOWN_GRACE_SECONDS)),
        }
    }

    pub fn listener_handle(&self) -> Arc<Barrier> {
        Arc::clone(&self.barrier)
    }

    /// Wait for every listener to report stopped, or for the grace
    /// window to elapse — whichever comes first.
    pub async fn wait(&self) {
        let barrier = Arc::clone(&self.barrier);
        let _ = tokio::time::timeout(self.grace, async move {
            barrier.wait().await;
        })
        .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn grace_window_returns_once_every_listener_reports_in() {
        let window = GraceWindow::new(2, Some(5));
        let a = window.listener_handle();
        let b = window.listener_handle();

        let waiter = tokio::spawn(async move {
            a.wait().await;
        });
        b.wait().await;
        waiter.await.unwrap();

        window.wait().await;
    }

    #[tokio::test(start_paused = true)]
    async fn grace_window_times_out_if_a_listener_never_reports() {
        let window = GraceWindow::new(2, Some(1));
        let start = tokio::time::Instant::now();
        window.wait().await;
        assert!(start.elapsed() >= Duration::from_secs(1));
    }
}
