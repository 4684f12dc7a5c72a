//! Timer scheduling with explicit cancellation.
//!
//! Every timer is a Tokio task. Scheduling returns a [`TimerToken`] that
//! identifies the timer and cancels it. Owners keep the token next to the
//! state the timer belongs to, and a firing timer checks that its token id is
//! still the one on record before touching that state.

use std::{
    future::Future,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use log::debug;
use tokio::{task::AbortHandle, time};

/// Handle on a scheduled timer.
#[derive(Debug)]
pub struct TimerToken {
    id: u64,
    handle: AbortHandle,
}

impl TimerToken {
    /// Unique id of the timer within its [`Scheduler`].
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Cancels the timer. Calling it on a fired or cancelled timer does nothing.
    pub fn cancel(&self) {
        debug!("cancel timer {}", self.id);
        self.handle.abort();
    }

    /// Returns `true` once the timer task completed or was cancelled.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Creates one-shot and periodic timers on the current Tokio runtime.
///
/// All methods must be called from within a Tokio runtime.
#[derive(Debug, Default)]
pub struct Scheduler {
    next_id: AtomicU64,
}

impl Scheduler {
    /// Creates a scheduler. Timers are spawned on the current Tokio runtime.
    pub fn new() -> Self {
        Scheduler::default()
    }

    /// Runs `task` once after `delay`.
    ///
    /// The task never runs synchronously inside this call, even for a zero
    /// delay: it runs on the next turn of the runtime at the earliest.
    pub fn schedule_after<F>(&self, delay: Duration, task: F) -> TimerToken
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.schedule_after_with(delay, |_| task)
    }

    /// Like [`Scheduler::schedule_after`], building the task from the id of
    /// its own token so the task can check it is still the timer on record.
    pub fn schedule_after_with<F, M>(&self, delay: Duration, make_task: M) -> TimerToken
    where
        M: FnOnce(u64) -> F,
        F: Future<Output = ()> + Send + 'static,
    {
        let id = self.next_id();
        let task = make_task(id);
        debug!("schedule timer {} in {:?}", id, delay);

        let handle = tokio::spawn(async move {
            time::sleep(delay).await;
            task.await;
        });

        TimerToken {
            id,
            handle: handle.abort_handle(),
        }
    }

    /// Calls `tick` every `period`, the first call happening one period from now.
    pub fn schedule_every<F>(&self, period: Duration, mut tick: F) -> TimerToken
    where
        F: FnMut() + Send + 'static,
    {
        let id = self.next_id();
        debug!("schedule periodic timer {} every {:?}", id, period);

        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                tick();
            }
        });

        TimerToken {
            id,
            handle: handle.abort_handle(),
        }
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use tokio::time::sleep;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_schedule_after_fires_once() {
        let scheduler = Scheduler::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = Arc::clone(&counter);

        let token = scheduler.schedule_after(Duration::from_secs(60), async move {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        sleep(Duration::from_secs(59)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        sleep(Duration::from_secs(2)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(token.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_delay_is_not_synchronous() {
        let scheduler = Scheduler::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = Arc::clone(&counter);

        scheduler.schedule_after(Duration::ZERO, async move {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        sleep(Duration::from_millis(1)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_firing() {
        let scheduler = Scheduler::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = Arc::clone(&counter);

        let token = scheduler.schedule_after(Duration::from_secs(10), async move {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });
        token.cancel();
        token.cancel();

        sleep(Duration::from_secs(20)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedule_every_ticks_until_cancelled() {
        let scheduler = Scheduler::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = Arc::clone(&counter);

        let token = scheduler.schedule_every(Duration::from_secs(1), move || {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        sleep(Duration::from_millis(3500)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);

        token.cancel();
        sleep(Duration::from_secs(5)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_task_receives_its_token_id() {
        let scheduler = Scheduler::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = Arc::clone(&seen);

        let token = scheduler.schedule_after_with(Duration::from_secs(1), move |id| async move {
            seen_clone.store(id as usize, Ordering::SeqCst);
        });

        sleep(Duration::from_secs(2)).await;
        assert_eq!(seen.load(Ordering::SeqCst) as u64, token.id());
    }

    #[tokio::test]
    async fn test_token_ids_are_unique() {
        let scheduler = Scheduler::new();
        let first = scheduler.schedule_after(Duration::from_secs(1), async {});
        let second = scheduler.schedule_after(Duration::from_secs(1), async {});

        assert_ne!(first.id(), second.id());
        first.cancel();
        second.cancel();
    }
}
