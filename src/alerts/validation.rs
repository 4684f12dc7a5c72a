//! Relevance check run before a snoozed alert comes back.

use std::panic::{self, AssertUnwindSafe};

use futures::FutureExt;
use log::{debug, warn};
use serde_json::Value;

use crate::{
    alerts::{
        AlertItem,
        delegate::{DelegateSlot, STAT_DELEGATE_HOOK_FAILED, StatProperties},
    },
    error::AlertError,
};

const HOOK: &str = "should_show";

/// Asks the delegate whether a snoozed item should still be shown.
///
/// The answer is `true` when there is no delegate, when the delegate was
/// dropped, or when its check panics: an urgent alert is never silently lost
/// because of a broken check.
#[derive(Clone)]
pub struct ValidationGate {
    delegate: DelegateSlot,
}

impl ValidationGate {
    /// Creates a gate asking the delegate held by `delegate`.
    pub fn new(delegate: DelegateSlot) -> Self {
        ValidationGate { delegate }
    }

    /// Returns whether `item` is still relevant.
    ///
    /// A panicking check is logged, tracked as a failed hook and answers
    /// `true`.
    pub async fn should_show(&self, item: &AlertItem) -> bool {
        let check = {
            let Some(delegate) = self.delegate.get() else {
                return true;
            };
            panic::catch_unwind(AssertUnwindSafe(|| delegate.should_show(item)))
        };

        let answer = match check {
            Ok(check) => AssertUnwindSafe(check).catch_unwind().await,
            Err(e) => Err(e),
        };

        match answer {
            Ok(should_show) => {
                debug!("validation of alert {} -> {}", item.id, should_show);
                should_show
            }
            Err(_) => {
                warn!("{}", AlertError::DelegateHookFailed { hook: HOOK });
                let mut properties = StatProperties::new();
                properties.insert("hook".to_string(), Value::from(HOOK));
                self.delegate.track(STAT_DELEGATE_HOOK_FAILED, properties);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use futures::future::{BoxFuture, FutureExt};

    use super::*;
    use crate::alerts::AlertDelegate;

    struct Veto;

    impl AlertDelegate for Veto {
        fn should_show(&self, item: &AlertItem) -> BoxFuture<'static, bool> {
            let keep = item.id != "cancelled";
            async move {
                tokio::task::yield_now().await;
                keep
            }
            .boxed()
        }
    }

    struct Broken;

    async fn calendar_unavailable() -> bool {
        panic!("calendar unavailable")
    }

    impl AlertDelegate for Broken {
        fn should_show(&self, _item: &AlertItem) -> BoxFuture<'static, bool> {
            calendar_unavailable().boxed()
        }
    }

    #[tokio::test]
    async fn test_no_delegate_defaults_to_true() {
        let gate = ValidationGate::new(DelegateSlot::new());
        let item = AlertItem::new("m1", "Standup", Utc::now());

        assert!(gate.should_show(&item).await);
    }

    #[tokio::test]
    async fn test_delegate_answer_is_used() {
        let slot = DelegateSlot::new();
        let delegate: Arc<dyn AlertDelegate> = Arc::new(Veto);
        slot.set(Some(&delegate));
        let gate = ValidationGate::new(slot);

        assert!(gate.should_show(&AlertItem::new("m1", "Standup", Utc::now())).await);
        assert!(
            !gate
                .should_show(&AlertItem::new("cancelled", "Standup", Utc::now()))
                .await
        );
    }

    #[tokio::test]
    async fn test_panicking_check_defaults_to_true() {
        let slot = DelegateSlot::new();
        let delegate: Arc<dyn AlertDelegate> = Arc::new(Broken);
        slot.set(Some(&delegate));
        let gate = ValidationGate::new(slot);

        assert!(gate.should_show(&AlertItem::new("m1", "Standup", Utc::now())).await);
    }
}
