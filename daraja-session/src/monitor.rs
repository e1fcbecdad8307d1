//! Background expiry monitor

use crate::manager::{ExpiryCheck, SessionManager};
use std::sync::Weak;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Periodically runs [`SessionManager::check_expiry`].
///
/// Holds only a weak reference, so it never keeps the manager alive. The
/// task is aborted when the monitor is stopped or dropped.
#[derive(Debug)]
pub struct ExpiryMonitor {
    handle: JoinHandle<()>,
}

impl ExpiryMonitor {
    pub fn spawn(manager: Weak<SessionManager>, period: Duration) -> Self {
        let period = period.max(Duration::from_millis(1));
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;

                let Some(manager) = manager.upgrade() else {
                    debug!("Session manager dropped, stopping expiry monitor");
                    break;
                };

                if manager.check_expiry().await == ExpiryCheck::Expired {
                    debug!("Expiry monitor ended the session");
                }
            }
        });

        debug!(period_ms = period.as_millis() as u64, "Expiry monitor started");
        Self { handle }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for ExpiryMonitor {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
