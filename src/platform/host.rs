//! Host platform signals.
//!
//! The [`HostMonitor`] turns sleep, wake and display topology notifications
//! into calls on the [`RecoveryGuard`] and the [`AlertEngine`].

use std::time::Duration;

use log::{debug, info};
use tokio::sync::mpsc;

use crate::alerts::{AlertEngine, RecoveryGuard};

/// Notification sent by the host platform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostSignal {
    /// The host is about to sleep.
    WillSleep,
    /// The host woke up.
    DidWake,
    /// A display was connected, disconnected or moved.
    DisplaysChanged,
}

/// Applies host signals to the recovery flag and the engine.
///
/// Waking up does not end recovery right away: alerts stay suppressed for a
/// grace period so the displays have time to come back.
pub struct HostMonitor {
    engine: AlertEngine,
    recovery: RecoveryGuard,
    /// Delay between the wake signal and the end of recovery.
    grace: Duration,
}

impl HostMonitor {
    /// Creates a monitor.
    ///
    /// # Arguments
    ///
    /// * `engine` - Engine notified of display topology changes
    /// * `recovery` - Flag shared with the engine
    /// * `grace` - Delay between the wake signal and the end of recovery
    pub fn new(engine: AlertEngine, recovery: RecoveryGuard, grace: Duration) -> Self {
        HostMonitor {
            engine,
            recovery,
            grace,
        }
    }

    /// Applies one signal. Must be called from within a Tokio runtime.
    pub fn handle(&self, signal: HostSignal) {
        debug!("host signal {:?}", signal);
        match signal {
            HostSignal::WillSleep => self.recovery.begin_recovery(),
            HostSignal::DidWake => self.recovery.end_recovery_after(self.grace),
            HostSignal::DisplaysChanged => self.engine.displays_changed(),
        }
    }

    /// Applies signals until every sender is dropped.
    pub async fn run(self, mut signals: mpsc::Receiver<HostSignal>) {
        while let Some(signal) = signals.recv().await {
            self.handle(signal);
        }
        info!("host signal channel closed");
    }
}
