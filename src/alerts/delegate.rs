//! Delegate hooks notified of the alert lifecycle.
//!
//! The surrounding application implements [`AlertDelegate`] to observe
//! presentations, record statistics and veto snoozed alerts that became
//! irrelevant. Every method has a default implementation, and the engine
//! works without any delegate at all.

use std::{
    panic::{self, AssertUnwindSafe},
    sync::{Arc, PoisonError, RwLock, Weak},
    time::Duration,
};

use futures::future::{self, BoxFuture, FutureExt};
use log::warn;
use serde_json::{Map, Value};

use crate::{alerts::AlertItem, error::AlertError};

/// Properties attached to a tracking event.
pub type StatProperties = Map<String, Value>;

/// Tracking event emitted when an alert is shown.
pub const STAT_ALERT_SHOWN: &str = "alert_shown";
/// Tracking event emitted when the action button is used.
pub const STAT_ALERT_ACTION_TAKEN: &str = "alert_action_taken";
/// Tracking event emitted when an alert is closed.
pub const STAT_ALERT_DISMISSED: &str = "alert_dismissed";
/// Tracking event emitted on every snooze.
pub const STAT_ALERT_SNOOZED: &str = "alert_snoozed";
/// Tracking event emitted when an item exceeds its snooze attempts.
pub const STAT_SNOOZE_LIMIT_REACHED: &str = "snooze_limit_reached";
/// Tracking event emitted when the alert sound could not be played.
pub const STAT_AUDIO_PLAYBACK_FAILED: &str = "audio_playback_failed";
/// Tracking event emitted when a delegate hook panicked.
pub const STAT_DELEGATE_HOOK_FAILED: &str = "delegate_hook_failed";

/// Why a presentation ended.
///
/// Exactly one reason accompanies every terminal transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DismissalReason {
    /// The user closed the alert.
    UserDismissed,
    /// The user used the action button.
    ActionTaken,
    /// The item was snoozed more than the configured attempts.
    SnoozeLimitReached,
    /// The host is going to sleep or just woke up.
    SystemRecovering,
    /// Every display showing the alert was disconnected.
    DisplayLost,
}

impl DismissalReason {
    /// Name used in logs and in the `reason` property of tracking events.
    pub fn as_str(&self) -> &'static str {
        match self {
            DismissalReason::UserDismissed => "user_dismissed",
            DismissalReason::ActionTaken => "action_taken",
            DismissalReason::SnoozeLimitReached => "snooze_limit_reached",
            DismissalReason::SystemRecovering => "system_recovering",
            DismissalReason::DisplayLost => "display_lost",
        }
    }
}

/// Hooks called by the engine along the alert lifecycle.
///
/// For one presentation the engine calls `on_will_show`, `on_did_show`, then
/// exactly one terminal hook (`on_action_tapped` + `on_did_dismiss`,
/// `on_did_dismiss`, or `on_snoozed`). Hooks run outside of the engine lock
/// and may call back into the engine. A panicking hook is caught and logged.
pub trait AlertDelegate: Send + Sync {
    fn on_will_show(&self, _item: &AlertItem) {}

    fn on_did_show(&self, _item: &AlertItem) {}

    fn on_did_dismiss(&self, _item: &AlertItem, _reason: DismissalReason) {}

    fn on_action_tapped(&self, _item: &AlertItem) {}

    fn on_snoozed(&self, _item: &AlertItem, _duration: Duration) {}

    /// Whether tracking events should be emitted at all.
    fn should_track_stats(&self) -> bool {
        true
    }

    fn on_track_stat(&self, _event: &str, _properties: &StatProperties) {}

    /// Whether a snoozed item is still relevant when its snooze expires.
    fn should_show(&self, _item: &AlertItem) -> BoxFuture<'static, bool> {
        future::ready(true).boxed()
    }
}

/// Non-owning, replaceable reference to the delegate.
///
/// Hooks are invoked through [`DelegateSlot::notify`], which isolates panics.
#[derive(Clone, Default)]
pub struct DelegateSlot {
    delegate: Arc<RwLock<Option<Weak<dyn AlertDelegate>>>>,
}

impl DelegateSlot {
    /// Creates an empty slot.
    pub fn new() -> Self {
        DelegateSlot::default()
    }

    /// Replaces the delegate. The slot does not keep it alive.
    pub fn set(&self, delegate: Option<&Arc<dyn AlertDelegate>>) {
        *self
            .delegate
            .write()
            .unwrap_or_else(PoisonError::into_inner) = delegate.map(Arc::downgrade);
    }

    /// Returns the delegate if one is set and still alive.
    pub fn get(&self) -> Option<Arc<dyn AlertDelegate>> {
        self.delegate
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(Weak::upgrade)
    }

    /// Calls a hook on the delegate, if any.
    ///
    /// A panic inside the hook is caught, logged and reported as a
    /// [`STAT_DELEGATE_HOOK_FAILED`] tracking event.
    pub fn notify<F>(&self, hook: &'static str, call: F)
    where
        F: FnOnce(&dyn AlertDelegate),
    {
        let Some(delegate) = self.get() else {
            return;
        };

        let result = panic::catch_unwind(AssertUnwindSafe(|| call(delegate.as_ref())));
        if result.is_err() {
            warn!("{}", AlertError::DelegateHookFailed { hook });
            if hook != "on_track_stat" {
                let mut properties = StatProperties::new();
                properties.insert("hook".to_string(), Value::from(hook));
                self.track(STAT_DELEGATE_HOOK_FAILED, properties);
            }
        }
    }

    /// Emits a tracking event if the delegate wants statistics.
    pub fn track(&self, event: &'static str, properties: StatProperties) {
        let Some(delegate) = self.get() else {
            return;
        };

        let should_track =
            panic::catch_unwind(AssertUnwindSafe(|| delegate.should_track_stats()))
                .unwrap_or(false);
        if should_track {
            self.notify("on_track_stat", |delegate| {
                delegate.on_track_stat(event, &properties)
            });
        }
    }
}
