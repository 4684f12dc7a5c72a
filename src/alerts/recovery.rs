//! Suppression of alerts around host sleep and wake.
//!
//! While the host is asleep or has just woken, the display stack is not
//! settled and windows may land on the wrong screen or not at all. The
//! [`RecoveryGuard`] flag is raised on the sleep signal and lowered a grace
//! period after the wake signal; the engine refuses to present while it is up.

use std::{
    sync::{
        Arc, Mutex, PoisonError, Weak,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use log::{debug, info};

use crate::scheduler::{Scheduler, TimerToken};

/// Default delay between the wake signal and the end of recovery.
pub const DEFAULT_RECOVERY_GRACE: Duration = Duration::from_secs(5);

struct RecoveryState {
    recovering: AtomicBool,
    /// Bumped by every sleep and wake signal, a scheduled end only applies to
    /// the generation it was scheduled in.
    generation: AtomicU64,
    pending_end: Mutex<Option<TimerToken>>,
    scheduler: Scheduler,
}

/// Process-wide "system recovering" flag.
///
/// Cloning the guard shares the flag: the composition root creates one guard
/// and hands clones to the engine and the host signal handler.
#[derive(Clone)]
pub struct RecoveryGuard {
    state: Arc<RecoveryState>,
}

impl Default for RecoveryGuard {
    fn default() -> Self {
        RecoveryGuard::new()
    }
}

impl RecoveryGuard {
    /// Creates a guard that is not recovering.
    pub fn new() -> Self {
        RecoveryGuard {
            state: Arc::new(RecoveryState {
                recovering: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                pending_end: Mutex::new(None),
                scheduler: Scheduler::new(),
            }),
        }
    }

    /// Returns `true` while presentations must be suppressed.
    pub fn is_recovering(&self) -> bool {
        self.state.recovering.load(Ordering::SeqCst)
    }

    /// Raises the flag. A scheduled end of recovery is cancelled.
    pub fn begin_recovery(&self) {
        self.state.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(token) = self.take_pending_end() {
            token.cancel();
        }
        if !self.state.recovering.swap(true, Ordering::SeqCst) {
            info!("system recovery started, alerts suppressed");
        }
    }

    /// Lowers the flag immediately.
    pub fn end_recovery(&self) {
        self.state.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(token) = self.take_pending_end() {
            token.cancel();
        }
        self.clear();
    }

    /// Lowers the flag after `grace`.
    ///
    /// Replaces any previously scheduled end. A [`Self::begin_recovery`] call
    /// before the grace period elapses cancels it. Must be called from within a
    /// Tokio runtime.
    pub fn end_recovery_after(&self, grace: Duration) {
        let weak: Weak<RecoveryState> = Arc::downgrade(&self.state);
        let mut pending_end = self
            .state
            .pending_end
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(token) = pending_end.take() {
            token.cancel();
        }
        let generation = self.state.generation.fetch_add(1, Ordering::SeqCst) + 1;

        debug!("system recovery ends in {:?}", grace);
        let token = self.state.scheduler.schedule_after(grace, async move {
            let Some(state) = weak.upgrade() else {
                return;
            };
            if state.generation.load(Ordering::SeqCst) != generation {
                return;
            }
            let guard = RecoveryGuard { state };
            guard.take_pending_end();
            guard.clear();
        });
        *pending_end = Some(token);
    }

    /// Returns `true` if an end of recovery is scheduled.
    pub fn has_pending_end(&self) -> bool {
        self.state
            .pending_end
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|token| !token.is_finished())
    }

    fn take_pending_end(&self) -> Option<TimerToken> {
        self.state
            .pending_end
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    fn clear(&self) {
        if self.state.recovering.swap(false, Ordering::SeqCst) {
            info!("system recovery ended, alerts allowed");
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::sleep;

    use super::*;

    #[test]
    fn test_begin_and_end() {
        let guard = RecoveryGuard::new();
        assert!(!guard.is_recovering());

        guard.begin_recovery();
        assert!(guard.is_recovering());

        guard.end_recovery();
        assert!(!guard.is_recovering());
    }

    #[test]
    fn test_clones_share_the_flag() {
        let guard = RecoveryGuard::new();
        let clone = guard.clone();

        guard.begin_recovery();
        assert!(clone.is_recovering());
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_after_grace() {
        let guard = RecoveryGuard::new();
        guard.begin_recovery();
        guard.end_recovery_after(DEFAULT_RECOVERY_GRACE);
        assert!(guard.has_pending_end());

        sleep(Duration::from_secs(4)).await;
        assert!(guard.is_recovering());

        sleep(Duration::from_secs(2)).await;
        assert!(!guard.is_recovering());
        assert!(!guard.has_pending_end());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_during_grace_cancels_end() {
        let guard = RecoveryGuard::new();
        guard.begin_recovery();
        guard.end_recovery_after(Duration::from_secs(5));

        sleep(Duration::from_secs(3)).await;
        guard.begin_recovery();

        sleep(Duration::from_secs(10)).await;
        assert!(guard.is_recovering());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_wake_restarts_grace() {
        let guard = RecoveryGuard::new();
        guard.begin_recovery();
        guard.end_recovery_after(Duration::from_secs(5));

        sleep(Duration::from_secs(3)).await;
        guard.end_recovery_after(Duration::from_secs(5));

        sleep(Duration::from_secs(3)).await;
        assert!(guard.is_recovering());

        sleep(Duration::from_secs(3)).await;
        assert!(!guard.is_recovering());
    }
}
