//! Rendering boundary: surfaces showing an alert on one display.
//!
//! The engine never looks inside a surface. It opens one per selected display
//! through a [`Renderer`], refreshes them while the alert is visible and
//! closes them on teardown. User input comes back through the
//! [`SurfaceCallbacks`] handed to the renderer.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};

use crate::{
    alerts::{AlertItem, AlertStyle},
    displays::{Display, DisplayId},
    error::RenderError,
};

type Callback = Arc<dyn Fn() + Send + Sync>;
type SnoozeCallback = Arc<dyn Fn(Option<Duration>) + Send + Sync>;

/// User input routed from a surface back into the engine.
///
/// Every surface of a presentation shares the same callbacks.
#[derive(Clone)]
pub struct SurfaceCallbacks {
    on_action: Callback,
    on_dismiss: Callback,
    on_snooze: SnoozeCallback,
}

impl SurfaceCallbacks {
    /// Bundles the action, dismiss and snooze handlers of a presentation.
    pub fn new(
        on_action: impl Fn() + Send + Sync + 'static,
        on_dismiss: impl Fn() + Send + Sync + 'static,
        on_snooze: impl Fn(Option<Duration>) + Send + Sync + 'static,
    ) -> Self {
        SurfaceCallbacks {
            on_action: Arc::new(on_action),
            on_dismiss: Arc::new(on_dismiss),
            on_snooze: Arc::new(on_snooze),
        }
    }

    /// The user pressed the action button.
    pub fn action(&self) {
        (self.on_action)();
    }

    /// The user closed the alert.
    pub fn dismiss(&self) {
        (self.on_dismiss)();
    }

    /// The user snoozed the alert, `None` meaning the default duration.
    pub fn snooze(&self, duration: Option<Duration>) {
        (self.on_snooze)(duration);
    }
}

/// One open alert window on one display.
///
/// The engine never holds its lock while calling a surface, so a surface may
/// route its own close or refresh events back through its
/// [`SurfaceCallbacks`].
pub trait Surface: Send + Sync {
    /// Display this surface is shown on.
    fn display_id(&self) -> DisplayId;
    /// Redraws time dependent content such as the countdown. Ignored once the
    /// surface is closed.
    fn refresh(&self, now: DateTime<Utc>);
    /// Closes the window. May be called more than once.
    fn close(&self);
}

/// Creates surfaces for alert items.
pub trait Renderer: Send + Sync {
    /// Opens a surface showing `item` on `display`.
    ///
    /// # Arguments
    ///
    /// * `style` - Colors, icon and pulse resolved from the item type
    /// * `callbacks` - User input of the surface, shared by every surface of
    ///   the presentation
    ///
    /// # Errors
    ///
    /// Returns a [`RenderError`] if the window cannot be created on this
    /// display; the engine then skips the display.
    fn open_surface(
        &self,
        item: &AlertItem,
        display: &Display,
        style: &AlertStyle,
        callbacks: SurfaceCallbacks,
    ) -> Result<Box<dyn Surface>, RenderError>;
}
