//! Per item snooze bookkeeping.
//!
//! This module provides the [`SnoozeScheduler`], which counts how many times
//! each item was snoozed, enforces the maximum number of attempts and owns
//! the timer that brings a snoozed item back.

use std::{collections::HashMap, future::Future, time::Duration};

use log::{debug, info};

use crate::{
    alerts::AlertItem,
    scheduler::{Scheduler, TimerToken},
};

/// Result of a snooze request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SnoozeOutcome {
    /// The item comes back after the requested duration.
    Scheduled { count: u32 },
    /// The item ran out of attempts, nothing was scheduled.
    LimitReached { count: u32 },
}

impl SnoozeOutcome {
    /// Number of times the item has been snoozed, this request included.
    pub fn count(&self) -> u32 {
        match self {
            SnoozeOutcome::Scheduled { count } | SnoozeOutcome::LimitReached { count } => *count,
        }
    }
}

struct SnoozeRecord {
    /// Latest snapshot of the item, presented when the timer fires.
    item: AlertItem,
    count: u32,
    pending: Option<TimerToken>,
}

/// Snooze state of every item, keyed by item id.
///
/// A record is created on the first snooze of an item and destroyed when the
/// item reaches its snooze limit or is cancelled (action or dismissal). When
/// a snooze timer fires only its pending slot is cleared: the count keeps
/// growing across re-presentations until the limit is reached.
///
/// # Invariants
///
/// - at most one record per item id
/// - at most one pending timer per record, a new snooze cancels the previous
///   timer
pub struct SnoozeScheduler {
    records: HashMap<String, SnoozeRecord>,
    max_attempts: u32,
}

impl SnoozeScheduler {
    /// Creates a scheduler allowing `max_attempts` snoozes per item.
    ///
    /// The snooze bringing the count to `max_attempts` is refused.
    pub fn new(max_attempts: u32) -> Self {
        SnoozeScheduler {
            records: HashMap::new(),
            max_attempts,
        }
    }

    /// Snoozes an item.
    ///
    /// Any pending timer of the item is cancelled first. Unless the limit is
    /// reached, a timer is scheduled on `scheduler` to run the future built
    /// by `on_expiry` after `duration`. `on_expiry` receives the id of the
    /// timer, to be handed back to [`SnoozeScheduler::take_pending_if`].
    ///
    /// # Arguments
    ///
    /// * `item` - The snoozed item, replacing the stored snapshot
    /// * `duration` - Delay before the item comes back
    /// * `scheduler` - Timer facility used for the re-presentation
    /// * `on_expiry` - Builds the task run when the timer fires
    pub fn snooze<M, F>(
        &mut self,
        item: &AlertItem,
        duration: Duration,
        scheduler: &Scheduler,
        on_expiry: M,
    ) -> SnoozeOutcome
    where
        M: FnOnce(u64) -> F,
        F: Future<Output = ()> + Send + 'static,
    {
        let record = self
            .records
            .entry(item.id.clone())
            .or_insert_with(|| SnoozeRecord {
                item: item.clone(),
                count: 0,
                pending: None,
            });

        if let Some(token) = record.pending.take() {
            debug!("alert {} snoozed again, previous timer cancelled", item.id);
            token.cancel();
        }
        record.item = item.clone();
        record.count += 1;
        let count = record.count;

        if count >= self.max_attempts {
            info!(
                "alert {} reached its snooze limit ({} of {})",
                item.id, count, self.max_attempts
            );
            self.records.remove(&item.id);
            return SnoozeOutcome::LimitReached { count };
        }

        let token = scheduler.schedule_after_with(duration, on_expiry);
        if let Some(record) = self.records.get_mut(&item.id) {
            record.pending = Some(token);
        }
        info!(
            "alert {} snoozed for {}s ({} of {})",
            item.id,
            duration.as_secs(),
            count,
            self.max_attempts
        );

        SnoozeOutcome::Scheduled { count }
    }

    /// Clears the pending slot of an item if `timer_id` is the timer on record.
    ///
    /// Called by the firing timer itself. Returns the item snapshot to
    /// present, or `None` when the timer was superseded or cancelled.
    pub fn take_pending_if(&mut self, id: &str, timer_id: u64) -> Option<AlertItem> {
        let record = self.records.get_mut(id)?;
        if record.pending.as_ref().map(TimerToken::id) != Some(timer_id) {
            debug!("timer {} of alert {} is not on record anymore", timer_id, id);
            return None;
        }

        record.pending = None;
        Some(record.item.clone())
    }

    /// Cancels the pending timer of an item but keeps its count.
    ///
    /// Returns `true` if a timer was pending.
    pub fn cancel_pending(&mut self, id: &str) -> bool {
        let Some(token) = self
            .records
            .get_mut(id)
            .and_then(|record| record.pending.take())
        else {
            return false;
        };

        debug!("pending snooze of alert {} cancelled", id);
        token.cancel();
        true
    }

    /// Forgets an item: its pending timer is cancelled and its count reset.
    ///
    /// Returns `true` if the item had a record.
    pub fn cancel(&mut self, id: &str) -> bool {
        let Some(record) = self.records.remove(id) else {
            return false;
        };

        if let Some(token) = record.pending {
            token.cancel();
        }
        debug!("snooze state of alert {} cleared", id);
        true
    }

    /// Snoozes recorded for the item, 0 when it has no record.
    pub fn count(&self, id: &str) -> u32 {
        self.records.get(id).map_or(0, |record| record.count)
    }

    /// Whether a timer is waiting to bring the item back.
    pub fn has_pending(&self, id: &str) -> bool {
        self.records
            .get(id)
            .is_some_and(|record| record.pending.is_some())
    }

    /// Whether the item has snooze state, pending or not.
    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }
}

impl Drop for SnoozeScheduler {
    fn drop(&mut self) {
        for record in self.records.values() {
            if let Some(token) = &record.pending {
                token.cancel();
            }
        }
    }
}
