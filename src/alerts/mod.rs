//! Alert lifecycle and snooze scheduling.
//!
//! This module holds the engine that presents urgent alerts and manages their
//! lifecycle, and the pieces it is built from:
//!
//! - [`AlertItem`]: a time-bound item that can be presented
//! - [`AlertEngine`]: presents items and routes user input, the single source
//!   of truth for what is on screen and what is snoozed
//! - [`AlertDelegate`]: hooks notified along the lifecycle
//! - [`RecoveryGuard`]: suppresses alerts around host sleep and wake
//! - [`ValidationGate`]: asks the delegate whether a snoozed item still matters
//! - [`ItemLoader`]: reads items from a JSON file
//!
//! # Lifecycle
//!
//! ```text
//! present(item) -> recovery check -> on_will_show -> display selection
//!               -> session opened -> on_did_show -> alert_shown
//!
//! action  -> on_action_tapped -> on_did_dismiss(ActionTaken)
//! dismiss -> on_did_dismiss(UserDismissed)
//! snooze  -> on_snoozed -> timer -> should_show -> present(item)
//!                       \-> on_did_dismiss(SnoozeLimitReached) at the limit
//! ```
//!
//! # Example Usage
//!
//! ```no_run
//! use std::{sync::Arc, time::Duration};
//!
//! use chrono::Utc;
//! use vigil::{
//!     alerts::{AlertEngine, AlertItem, EngineConfig, RecoveryGuard},
//!     displays::{Display, Rect, StaticDisplays},
//!     platform::{ConsoleRenderer, ConsoleSoundPlayer},
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let engine = AlertEngine::new(
//!     EngineConfig::default(),
//!     Arc::new(ConsoleRenderer::new()),
//!     Arc::new(ConsoleSoundPlayer),
//!     Arc::new(StaticDisplays::new(vec![Display::new(
//!         1,
//!         Rect::new(0.0, 0.0, 1920.0, 1080.0),
//!         true,
//!     )])),
//!     RecoveryGuard::new(),
//! );
//!
//! let item = AlertItem::new("m1", "Standup", Utc::now());
//! engine.present(item.clone()).ok();
//! engine.handle_snooze(&item, Duration::from_secs(120));
//! # }
//! ```

mod delegate;
mod engine;
mod item;
mod item_loader;
mod recovery;
mod session;
mod snooze;
mod style;
mod validation;

pub use crate::alerts::delegate::{
    AlertDelegate, DelegateSlot, DismissalReason, STAT_ALERT_ACTION_TAKEN, STAT_ALERT_DISMISSED,
    STAT_ALERT_SHOWN, STAT_ALERT_SNOOZED, STAT_AUDIO_PLAYBACK_FAILED, STAT_DELEGATE_HOOK_FAILED,
    STAT_SNOOZE_LIMIT_REACHED, StatProperties,
};
pub use crate::alerts::engine::{AlertEngine, EngineConfig};
pub use crate::alerts::item::{
    AlertItem, AlertType, CustomStyle, DEFAULT_ACTION_LABEL, Priority, Rgba,
};
pub use crate::alerts::item_loader::ItemLoader;
pub use crate::alerts::recovery::{DEFAULT_RECOVERY_GRACE, RecoveryGuard};
pub use crate::alerts::session::PresentationSession;
pub use crate::alerts::snooze::{SnoozeOutcome, SnoozeScheduler};
pub use crate::alerts::style::AlertStyle;
pub use crate::alerts::validation::ValidationGate;
