//! Orchestration of the alert lifecycle.
//!
//! This module provides the [`AlertEngine`], the single source of truth for
//! which item is on screen and which items are snoozed. It sequences
//! presentation, user input, snooze expiry and delegate notification.

use std::{
    sync::{
        Arc, Mutex, MutexGuard, PoisonError, Weak,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use chrono::Utc;
use log::{debug, info, warn};
use serde_json::Value;

use crate::{
    alerts::{
        AlertDelegate, AlertItem, DelegateSlot, DismissalReason, RecoveryGuard, StatProperties,
        ValidationGate,
        delegate::{
            STAT_ALERT_ACTION_TAKEN, STAT_ALERT_DISMISSED, STAT_ALERT_SHOWN, STAT_ALERT_SNOOZED,
            STAT_AUDIO_PLAYBACK_FAILED, STAT_SNOOZE_LIMIT_REACHED,
        },
        session::PresentationSession,
        snooze::{SnoozeOutcome, SnoozeScheduler},
    },
    displays::{DisplayProvider, MonitorPreference, select_displays},
    error::AlertError,
    platform::{Renderer, SoundPlayer, SurfaceCallbacks},
    scheduler::{Scheduler, TimerToken},
};

/// Values read by the engine, owned by the configuration layer.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    /// Snoozes allowed per item, the snooze reaching it dismisses the alert.
    pub max_snooze_attempts: u32,
    /// Duration used when a surface asks for a snooze without a duration.
    pub default_snooze: Duration,
    pub monitor_preference: MonitorPreference,
    /// Period of the countdown refresh, zero disables it.
    pub clock_refresh: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_snooze_attempts: 3,
            default_snooze: Duration::from_secs(300),
            monitor_preference: MonitorPreference::AllMonitors,
            clock_refresh: Duration::from_secs(1),
        }
    }
}

/// State mutated under the engine lock.
struct EngineState {
    session: Option<PresentationSession>,
    snoozes: SnoozeScheduler,
    /// Epoch of the latest session created.
    epoch: u64,
}

struct EngineInner {
    config: EngineConfig,
    renderer: Arc<dyn Renderer>,
    audio: Arc<dyn SoundPlayer>,
    displays: Arc<dyn DisplayProvider>,
    recovery: RecoveryGuard,
    delegate: DelegateSlot,
    validation: ValidationGate,
    scheduler: Scheduler,
    /// Set while a presentation is being constructed.
    presenting: AtomicBool,
    state: Mutex<EngineState>,
}

/// Releases the presentation guard when dropped.
struct PresentingGuard<'a>(&'a AtomicBool);

impl<'a> PresentingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| PresentingGuard(flag))
    }
}

impl Drop for PresentingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Presents alert items and manages their lifecycle.
///
/// The engine shows at most one item at a time, on the displays chosen by
/// the configured [`MonitorPreference`]. User input from the surfaces comes
/// back as an action, a dismissal or a snooze. Snoozed items come back after
/// their delay, once the delegate confirmed they are still relevant.
///
/// # Thread Safety
///
/// The engine is cheap to clone, every clone drives the same state. All state
/// lives behind one lock; delegate hooks and surface teardown run after the
/// lock is released, so hooks may call back into the engine. Timers and
/// surface callbacks only hold weak references to the engine.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
///
/// use chrono::Utc;
/// use vigil::{
///     alerts::{AlertEngine, AlertItem, EngineConfig, RecoveryGuard},
///     displays::{Display, Rect, StaticDisplays},
///     platform::{ConsoleRenderer, ConsoleSoundPlayer},
/// };
///
/// # #[tokio::main]
/// # async fn main() {
/// let displays = vec![Display::new(1, Rect::new(0.0, 0.0, 1920.0, 1080.0), true)];
/// let engine = AlertEngine::new(
///     EngineConfig::default(),
///     Arc::new(ConsoleRenderer::new()),
///     Arc::new(ConsoleSoundPlayer),
///     Arc::new(StaticDisplays::new(displays)),
///     RecoveryGuard::new(),
/// );
///
/// engine.present(AlertItem::new("m1", "Standup", Utc::now())).ok();
/// # }
/// ```
#[derive(Clone)]
pub struct AlertEngine {
    inner: Arc<EngineInner>,
}

impl AlertEngine {
    /// Creates an engine without delegate.
    ///
    /// # Arguments
    ///
    /// * `config` - Snooze limits, default snooze and monitor preference
    /// * `renderer` - Opens the alert surfaces
    /// * `audio` - Plays the alert sounds
    /// * `displays` - Live display topology
    /// * `recovery` - Sleep and wake suppression flag, shared with the host monitor
    pub fn new(
        config: EngineConfig,
        renderer: Arc<dyn Renderer>,
        audio: Arc<dyn SoundPlayer>,
        displays: Arc<dyn DisplayProvider>,
        recovery: RecoveryGuard,
    ) -> Self {
        let delegate = DelegateSlot::new();
        let snoozes = SnoozeScheduler::new(config.max_snooze_attempts);

        AlertEngine {
            inner: Arc::new(EngineInner {
                config,
                renderer,
                audio,
                displays,
                recovery,
                validation: ValidationGate::new(delegate.clone()),
                delegate,
                scheduler: Scheduler::new(),
                presenting: AtomicBool::new(false),
                state: Mutex::new(EngineState {
                    session: None,
                    snoozes,
                    epoch: 0,
                }),
            }),
        }
    }

    /// Replaces the delegate. The engine does not keep it alive.
    pub fn set_delegate(&self, delegate: Option<&Arc<dyn AlertDelegate>>) {
        self.inner.delegate.set(delegate);
    }

    /// Configuration the engine was created with.
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Presents an item on the selected displays.
    ///
    /// Any session already on screen is torn down first. Presenting an item
    /// also cancels its own pending snooze, its snooze count is kept.
    ///
    /// # Errors
    ///
    /// - [`AlertError::SystemRecovering`] if the host is sleeping or just
    ///   woke up; the dismissal hook is called with
    ///   [`DismissalReason::SystemRecovering`]
    /// - [`AlertError::ConcurrentPresentationSuppressed`] if another
    ///   presentation is being constructed, the call has no effect
    /// - [`AlertError::NoDisplaysAvailable`] if no surface could be opened
    pub fn present(&self, item: AlertItem) -> Result<(), AlertError> {
        let inner = &self.inner;

        if inner.recovery.is_recovering() {
            let error = AlertError::SystemRecovering {
                id: item.id.clone(),
            };
            info!("{}", error);
            inner.delegate.notify("on_did_dismiss", |delegate| {
                delegate.on_did_dismiss(&item, DismissalReason::SystemRecovering)
            });
            return Err(error);
        }

        let Some(_guard) = PresentingGuard::acquire(&inner.presenting) else {
            let error = AlertError::ConcurrentPresentationSuppressed {
                id: item.id.clone(),
            };
            debug!("{}", error);
            return Err(error);
        };

        inner
            .delegate
            .notify("on_will_show", |delegate| delegate.on_will_show(&item));

        let displays = select_displays(
            &inner.displays.displays(),
            inner.config.monitor_preference,
            inner.displays.pointer_location(),
        );
        if displays.is_empty() {
            let error = AlertError::NoDisplaysAvailable {
                id: item.id.clone(),
            };
            warn!("{}", error);
            return Err(error);
        }

        let (previous, epoch) = {
            let mut state = self.lock();
            state.epoch += 1;
            (state.session.take(), state.epoch)
        };
        if let Some(previous) = previous {
            debug!(
                "alert {} replaced by alert {}",
                previous.item().id,
                item.id
            );
        }

        let mut session = PresentationSession::open(
            epoch,
            item.clone(),
            &displays,
            inner.renderer.as_ref(),
            self.callbacks_for(epoch),
        );
        if session.is_empty() {
            let error = AlertError::NoDisplaysAvailable {
                id: item.id.clone(),
            };
            warn!("{}", error);
            return Err(error);
        }
        if !inner.config.clock_refresh.is_zero() {
            session.attach_clock(self.start_clock(epoch));
        }

        {
            let mut state = self.lock();
            state.snoozes.cancel_pending(&item.id);
            state.session = Some(session);
        }

        inner
            .delegate
            .notify("on_did_show", |delegate| delegate.on_did_show(&item));

        let mut properties = StatProperties::new();
        properties.insert("id".to_string(), Value::from(item.id.as_str()));
        properties.insert("title".to_string(), Value::from(item.title.as_str()));
        properties.insert("type".to_string(), Value::from(item.alert_type.as_str()));
        properties.insert("priority".to_string(), Value::from(item.priority.as_str()));
        inner.delegate.track(STAT_ALERT_SHOWN, properties);

        self.play_sound(&item);

        Ok(())
    }

    /// Presents several items at once.
    ///
    /// Only the first item is presented, the others are logged and dropped.
    /// Does nothing for an empty slice.
    pub fn show_combined(&self, items: &[AlertItem]) -> Result<(), AlertError> {
        let Some((first, rest)) = items.split_first() else {
            return Ok(());
        };

        if !rest.is_empty() {
            let ignored: Vec<&str> = rest.iter().map(|item| item.id.as_str()).collect();
            info!(
                "{} simultaneous alerts, presenting {} only, ignoring {}",
                items.len(),
                first.id,
                ignored.join(", ")
            );
        }
        self.present(first.clone())
    }

    /// Tears down the session on screen, if any.
    ///
    /// Calls no hook: the callers classify the dismissal.
    pub fn dismiss(&self) {
        let session = self.lock().session.take();
        if let Some(session) = session {
            info!("dismissed alert {}", session.item().id);
        }
    }

    /// The user used the action button of an item.
    pub fn handle_action(&self, item: &AlertItem) {
        self.close_item(item);

        self.inner
            .delegate
            .notify("on_action_tapped", |delegate| delegate.on_action_tapped(item));
        self.inner.delegate.notify("on_did_dismiss", |delegate| {
            delegate.on_did_dismiss(item, DismissalReason::ActionTaken)
        });

        let mut properties = StatProperties::new();
        properties.insert("id".to_string(), Value::from(item.id.as_str()));
        properties.insert("action_label".to_string(), Value::from(item.action_label()));
        self.inner.delegate.track(STAT_ALERT_ACTION_TAKEN, properties);

        info!("action taken on alert {}", item.id);
    }

    /// The user closed an item.
    pub fn handle_dismiss(&self, item: &AlertItem) {
        self.close_item(item);

        self.inner.delegate.notify("on_did_dismiss", |delegate| {
            delegate.on_did_dismiss(item, DismissalReason::UserDismissed)
        });
        self.track_dismissed(item, DismissalReason::UserDismissed);

        info!("alert {} dismissed by the user", item.id);
    }

    /// The user snoozed an item.
    ///
    /// The item's session is hidden right away. The snooze hook and stat fire
    /// for every snooze; when the item reaches its snooze limit the dismissal
    /// hook follows with [`DismissalReason::SnoozeLimitReached`].
    pub fn handle_snooze(&self, item: &AlertItem, duration: Duration) -> SnoozeOutcome {
        let weak = Arc::downgrade(&self.inner);
        let (session, outcome) = {
            let mut state = self.lock();
            let session = take_session_of(&mut state, &item.id);
            let id = item.id.clone();
            let outcome = state.snoozes.snooze(
                item,
                duration,
                &self.inner.scheduler,
                move |timer_id| async move {
                    let Some(inner) = weak.upgrade() else {
                        return;
                    };
                    AlertEngine { inner }.snooze_expired(&id, timer_id).await;
                },
            );
            (session, outcome)
        };
        drop(session);

        self.inner
            .delegate
            .notify("on_snoozed", |delegate| delegate.on_snoozed(item, duration));

        let mut properties = StatProperties::new();
        properties.insert("id".to_string(), Value::from(item.id.as_str()));
        properties.insert("duration".to_string(), Value::from(duration.as_secs()));
        properties.insert("snooze_count".to_string(), Value::from(outcome.count()));
        self.inner.delegate.track(STAT_ALERT_SNOOZED, properties);

        if let SnoozeOutcome::LimitReached { count } = outcome {
            self.inner.delegate.notify("on_did_dismiss", |delegate| {
                delegate.on_did_dismiss(item, DismissalReason::SnoozeLimitReached)
            });

            let mut properties = StatProperties::new();
            properties.insert("id".to_string(), Value::from(item.id.as_str()));
            properties.insert("snooze_count".to_string(), Value::from(count));
            self.inner.delegate.track(STAT_SNOOZE_LIMIT_REACHED, properties);
        }

        outcome
    }

    /// Re-evaluates the session after a display topology change.
    ///
    /// Surfaces on vanished displays are closed once the engine lock is
    /// released. If none is left, the session is torn down and the dismissal hook is called with
    /// [`DismissalReason::DisplayLost`].
    pub fn displays_changed(&self) {
        let live: Vec<_> = self
            .inner
            .displays
            .displays()
            .iter()
            .filter(|display| !display.bounds.is_degenerate())
            .map(|display| display.id)
            .collect();

        let (detached, lost) = {
            let mut state = self.lock();
            let Some(session) = state.session.as_mut() else {
                return;
            };
            let detached = session.retain_displays(&live);
            let lost = if session.is_empty() {
                state.session.take()
            } else {
                None
            };
            (detached, lost)
        };

        for surface in &detached {
            surface.close();
        }

        if let Some(session) = lost {
            let item = session.item().clone();
            drop(session);
            info!("alert {} lost all its displays", item.id);

            self.inner.delegate.notify("on_did_dismiss", |delegate| {
                delegate.on_did_dismiss(&item, DismissalReason::DisplayLost)
            });
            self.track_dismissed(&item, DismissalReason::DisplayLost);
        }
    }

    /// Forgets the snooze state of an item, cancelling its pending timer.
    ///
    /// Returns `true` if the item had snooze state.
    pub fn cancel_snooze(&self, id: &str) -> bool {
        self.lock().snoozes.cancel(id)
    }

    /// Whether a session is on screen.
    pub fn is_presenting(&self) -> bool {
        self.lock().session.is_some()
    }

    /// Item currently on screen.
    pub fn current_item(&self) -> Option<AlertItem> {
        self.lock()
            .session
            .as_ref()
            .map(|session| session.item().clone())
    }

    /// Number of surfaces currently open.
    pub fn surface_count(&self) -> usize {
        self.lock()
            .session
            .as_ref()
            .map_or(0, PresentationSession::surface_count)
    }

    /// Snoozes recorded for an item, 0 once its snooze state is gone.
    pub fn snooze_count(&self, id: &str) -> u32 {
        self.lock().snoozes.count(id)
    }

    /// Whether a snooze timer is waiting to bring the item back.
    pub fn has_pending_snooze(&self, id: &str) -> bool {
        self.lock().snoozes.has_pending(id)
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Clears the snooze state of an item and closes its session.
    fn close_item(&self, item: &AlertItem) {
        let session = {
            let mut state = self.lock();
            state.snoozes.cancel(&item.id);
            take_session_of(&mut state, &item.id)
        };
        drop(session);
    }

    fn track_dismissed(&self, item: &AlertItem, reason: DismissalReason) {
        let mut properties = StatProperties::new();
        properties.insert("id".to_string(), Value::from(item.id.as_str()));
        properties.insert("reason".to_string(), Value::from(reason.as_str()));
        self.inner.delegate.track(STAT_ALERT_DISMISSED, properties);
    }

    fn play_sound(&self, item: &AlertItem) {
        let Err(source) = self.inner.audio.play(item.priority) else {
            return;
        };

        let error = AlertError::AudioPlaybackFailed {
            id: item.id.clone(),
            source,
        };
        warn!("{}, playing the fallback sound", error);
        self.inner.audio.play_fallback();

        let mut properties = StatProperties::new();
        properties.insert("id".to_string(), Value::from(item.id.as_str()));
        properties.insert("error".to_string(), Value::from(error.to_string()));
        self.inner.delegate.track(STAT_AUDIO_PLAYBACK_FAILED, properties);
    }

    /// Callbacks bound to one session, ignored once that session is gone.
    fn callbacks_for(&self, epoch: u64) -> SurfaceCallbacks {
        let on_action = Arc::downgrade(&self.inner);
        let on_dismiss = Arc::downgrade(&self.inner);
        let on_snooze = Arc::downgrade(&self.inner);

        SurfaceCallbacks::new(
            move || {
                if let Some(engine) = AlertEngine::upgrade(&on_action)
                    && let Some(item) = engine.session_item(epoch)
                {
                    engine.handle_action(&item);
                }
            },
            move || {
                if let Some(engine) = AlertEngine::upgrade(&on_dismiss)
                    && let Some(item) = engine.session_item(epoch)
                {
                    engine.handle_dismiss(&item);
                }
            },
            move |duration| {
                if let Some(engine) = AlertEngine::upgrade(&on_snooze)
                    && let Some(item) = engine.session_item(epoch)
                {
                    let duration = duration.unwrap_or(engine.inner.config.default_snooze);
                    engine.handle_snooze(&item, duration);
                }
            },
        )
    }

    fn upgrade(weak: &Weak<EngineInner>) -> Option<AlertEngine> {
        weak.upgrade().map(|inner| AlertEngine { inner })
    }

    /// Item of the session with this epoch, if it is still on screen.
    fn session_item(&self, epoch: u64) -> Option<AlertItem> {
        let state = self.lock();
        match state.session.as_ref() {
            Some(session) if session.epoch() == epoch => Some(session.item().clone()),
            _ => {
                debug!("input from closed session {} ignored", epoch);
                None
            }
        }
    }

    fn start_clock(&self, epoch: u64) -> TimerToken {
        let weak = Arc::downgrade(&self.inner);
        self.inner
            .scheduler
            .schedule_every(self.inner.config.clock_refresh, move || {
                let Some(engine) = AlertEngine::upgrade(&weak) else {
                    return;
                };
                let surfaces = match engine.lock().session.as_ref() {
                    Some(session) if session.epoch() == epoch => session.surfaces(),
                    _ => return,
                };
                let now = Utc::now();
                for surface in &surfaces {
                    surface.refresh(now);
                }
            })
    }

    /// Brings a snoozed item back once its timer fired.
    async fn snooze_expired(&self, id: &str, timer_id: u64) {
        let (item, epoch) = {
            let mut state = self.lock();
            let Some(item) = state.snoozes.take_pending_if(id, timer_id) else {
                return;
            };
            (item, state.epoch)
        };

        debug!("snooze of alert {} expired, validating", id);
        if !self.inner.validation.should_show(&item).await {
            info!("alert {} is not relevant anymore, not presenting it again", id);
            return;
        }

        let stale = {
            let state = self.lock();
            state.epoch != epoch || !state.snoozes.contains(id) || state.snoozes.has_pending(id)
        };
        if stale {
            debug!("{}", AlertError::StaleValidationResult { id: id.to_string() });
            return;
        }

        if let Err(e) = self.present(item) {
            info!("snoozed alert {} not presented again: {}", id, e);
        }
    }
}

/// Takes the session out of the state if it shows the item `id`.
fn take_session_of(state: &mut EngineState, id: &str) -> Option<PresentationSession> {
    if state
        .session
        .as_ref()
        .is_some_and(|session| session.item().id == id)
    {
        state.session.take()
    } else {
        None
    }
}
