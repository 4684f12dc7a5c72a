//! Terminal implementations of the rendering and audio boundaries.
//!
//! Used by the `vigil` binary: surfaces are log lines and sounds are the
//! terminal bell. The renderer keeps the callbacks of the latest presentation
//! so typed commands can act like clicks on the alert window.

use std::{
    io::{self, Write},
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
};

use chrono::{DateTime, Utc};
use log::{debug, info};

use crate::{
    alerts::{AlertItem, AlertStyle, Priority},
    displays::{Display, DisplayId},
    error::{AudioError, RenderError},
    platform::{Renderer, SoundPlayer, Surface, SurfaceCallbacks},
};

/// Renderer writing alerts to the log.
#[derive(Clone, Default)]
pub struct ConsoleRenderer {
    last_callbacks: Arc<Mutex<Option<SurfaceCallbacks>>>,
}

impl ConsoleRenderer {
    /// Creates a renderer that has shown nothing yet.
    pub fn new() -> Self {
        ConsoleRenderer::default()
    }

    /// Callbacks of the most recently opened surface, if any.
    pub fn last_callbacks(&self) -> Option<SurfaceCallbacks> {
        self.last_callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Renderer for ConsoleRenderer {
    fn open_surface(
        &self,
        item: &AlertItem,
        display: &Display,
        style: &AlertStyle,
        callbacks: SurfaceCallbacks,
    ) -> Result<Box<dyn Surface>, RenderError> {
        *self
            .last_callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(callbacks);

        let marker = if style.pulse { "!!" } else { "--" };
        info!(
            "{} [{}] {} | {} | {} [{}]",
            marker,
            display.name,
            style.icon,
            item.title,
            item.countdown(Utc::now()),
            item.action_label()
        );

        Ok(Box::new(ConsoleSurface {
            display_id: display.id,
            display_name: display.name.clone(),
            item: item.clone(),
            closed: AtomicBool::new(false),
        }))
    }
}

struct ConsoleSurface {
    display_id: DisplayId,
    display_name: String,
    item: AlertItem,
    closed: AtomicBool,
}

impl Surface for ConsoleSurface {
    fn display_id(&self) -> DisplayId {
        self.display_id
    }

    fn refresh(&self, now: DateTime<Utc>) {
        if !self.closed.load(Ordering::SeqCst) {
            debug!(
                "[{}] {} {}",
                self.display_name,
                self.item.title,
                self.item.countdown(now)
            );
        }
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            info!("[{}] closed alert {}", self.display_name, self.item.id);
        }
    }
}

/// Sound player ringing the terminal bell.
///
/// Low priority alerts are silent, high priority alerts ring twice.
#[derive(Clone, Copy, Default)]
pub struct ConsoleSoundPlayer;

impl ConsoleSoundPlayer {
    fn ring(times: usize) -> io::Result<()> {
        let mut stderr = io::stderr();
        stderr.write_all("\x07".repeat(times).as_bytes())?;
        stderr.flush()
    }
}

impl SoundPlayer for ConsoleSoundPlayer {
    fn play(&self, priority: Priority) -> Result<(), AudioError> {
        let times = match priority {
            Priority::Low => return Ok(()),
            Priority::Normal => 1,
            Priority::High => 2,
        };
        Self::ring(times).map_err(|e| AudioError::DeviceUnavailable(e.to_string()))
    }

    fn play_fallback(&self) {
        let _ = Self::ring(1);
    }
}
