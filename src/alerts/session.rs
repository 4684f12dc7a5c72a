//! The on-screen presentation of one alert item.
//!
//! A [`PresentationSession`] owns one surface per selected display, all
//! showing the same item. It is created by the engine when an item is
//! presented and torn down when the user acts on it, snoozes it, dismisses it,
//! or when its displays disappear.

use std::sync::Arc;

use log::{debug, info, warn};

use crate::{
    alerts::{AlertItem, AlertStyle},
    displays::{Display, DisplayId},
    platform::{Renderer, Surface, SurfaceCallbacks},
    scheduler::TimerToken,
};

/// Surfaces currently showing one alert item.
///
/// # Teardown
///
/// [`PresentationSession::tear_down`] closes every surface and stops the
/// clock refresh. It is idempotent, and dropping a session tears it down.
/// The engine drops sessions only after releasing its lock, since closing a
/// surface may call back into the engine.
pub struct PresentationSession {
    /// Identifies the session within the engine, increases with every session.
    epoch: u64,
    item: AlertItem,
    surfaces: Vec<Arc<dyn Surface>>,
    clock: Option<TimerToken>,
    torn_down: bool,
}

impl PresentationSession {
    /// Opens one surface per display.
    ///
    /// Displays on which the renderer fails are skipped and logged; the
    /// resulting session may therefore hold fewer surfaces than displays, or
    /// none at all.
    pub fn open(
        epoch: u64,
        item: AlertItem,
        displays: &[Display],
        renderer: &dyn Renderer,
        callbacks: SurfaceCallbacks,
    ) -> Self {
        let style = AlertStyle::for_item(&item);
        let mut surfaces = Vec::with_capacity(displays.len());

        for display in displays {
            match renderer.open_surface(&item, display, &style, callbacks.clone()) {
                Ok(surface) => surfaces.push(Arc::from(surface)),
                Err(e) => warn!(
                    "failed to open alert {} on display {}: {}",
                    item.id, display.id, e
                ),
            }
        }

        info!(
            "presenting alert {} on {} of {} displays",
            item.id,
            surfaces.len(),
            displays.len()
        );

        PresentationSession {
            epoch,
            item,
            surfaces,
            clock: None,
            torn_down: false,
        }
    }

    /// Epoch the engine assigned to this session.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn item(&self) -> &AlertItem {
        &self.item
    }

    /// Number of surfaces still open.
    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    /// Whether no surface is open.
    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    /// Displays of the open surfaces, in opening order.
    pub fn display_ids(&self) -> Vec<DisplayId> {
        self.surfaces.iter().map(|surface| surface.display_id()).collect()
    }

    /// Attaches the periodic refresh timer, cancelled on teardown.
    pub fn attach_clock(&mut self, token: TimerToken) {
        if self.torn_down {
            token.cancel();
            return;
        }
        if let Some(previous) = self.clock.replace(token) {
            previous.cancel();
        }
    }

    /// Handles on the open surfaces, used to refresh them without holding
    /// the engine lock.
    pub fn surfaces(&self) -> Vec<Arc<dyn Surface>> {
        self.surfaces.clone()
    }

    /// Detaches the surfaces whose display is not in `live` anymore.
    ///
    /// # Returns
    ///
    /// The detached surfaces, still open. The caller closes them.
    pub fn retain_displays(&mut self, live: &[DisplayId]) -> Vec<Arc<dyn Surface>> {
        let (kept, lost): (Vec<_>, Vec<_>) = self
            .surfaces
            .drain(..)
            .partition(|surface| live.contains(&surface.display_id()));
        self.surfaces = kept;

        for surface in &lost {
            info!(
                "display {} lost, alert {} leaves it",
                surface.display_id(),
                self.item.id
            );
        }
        lost
    }

    /// Closes every surface. Calling it again does nothing.
    pub fn tear_down(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;

        if let Some(clock) = self.clock.take() {
            clock.cancel();
        }
        for surface in self.surfaces.drain(..) {
            surface.close();
        }

        debug!("tore down session {} of alert {}", self.epoch, self.item.id);
    }
}

impl Drop for PresentationSession {
    fn drop(&mut self) {
        self.tear_down();
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::test_support::{
        Event, RecordingRenderer, external_display, item, primary_display,
    };

    fn callbacks() -> SurfaceCallbacks {
        SurfaceCallbacks::new(|| {}, || {}, |_| {})
    }

    #[test]
    fn test_open_one_surface_per_display() {
        let renderer = RecordingRenderer::default();
        let session = PresentationSession::open(
            1,
            item("m1"),
            &[primary_display(), external_display()],
            &renderer,
            callbacks(),
        );

        assert_eq!(session.surface_count(), 2);
        assert_eq!(session.display_ids(), vec![1, 2]);
        assert_eq!(
            renderer.open_surfaces(),
            vec![("m1".to_string(), 1), ("m1".to_string(), 2)]
        );
    }

    #[test]
    fn test_open_skips_failing_display() {
        let renderer = RecordingRenderer::default();
        renderer.failing.lock().unwrap().insert(2);

        let session = PresentationSession::open(
            1,
            item("m1"),
            &[primary_display(), external_display()],
            &renderer,
            callbacks(),
        );

        assert_eq!(session.display_ids(), vec![1]);
    }

    #[test]
    fn test_tear_down_is_idempotent() {
        let renderer = RecordingRenderer::default();
        let mut session = PresentationSession::open(
            1,
            item("m1"),
            &[primary_display(), external_display()],
            &renderer,
            callbacks(),
        );

        session.tear_down();
        session.tear_down();
        drop(session);

        let closed = renderer
            .events()
            .iter()
            .filter(|event| matches!(event, Event::SurfaceClosed(..)))
            .count();
        assert_eq!(closed, 2);
        assert!(renderer.open_surfaces().is_empty());
    }

    #[test]
    fn test_drop_tears_down() {
        let renderer = RecordingRenderer::default();
        let session =
            PresentationSession::open(1, item("m1"), &[primary_display()], &renderer, callbacks());

        drop(session);
        assert!(renderer.open_surfaces().is_empty());
    }

    #[test]
    fn test_retain_displays_detaches_lost_surfaces() {
        let renderer = RecordingRenderer::default();
        let mut session = PresentationSession::open(
            1,
            item("m1"),
            &[primary_display(), external_display()],
            &renderer,
            callbacks(),
        );

        let lost = session.retain_displays(&[1]);
        assert_eq!(lost.len(), 1);
        assert_eq!(lost[0].display_id(), 2);
        assert_eq!(session.display_ids(), vec![1]);
        assert_eq!(renderer.open_surfaces().len(), 2);

        lost[0].close();
        assert_eq!(renderer.open_surfaces(), vec![("m1".to_string(), 1)]);

        let lost = session.retain_displays(&[]);
        assert_eq!(lost.len(), 1);
        assert!(session.is_empty());

        session.tear_down();
        assert_eq!(renderer.open_surfaces(), vec![("m1".to_string(), 1)]);
    }

    #[test]
    fn test_refresh_reaches_every_surface() {
        let renderer = RecordingRenderer::default();
        let session = PresentationSession::open(
            1,
            item("m1"),
            &[primary_display(), external_display()],
            &renderer,
            callbacks(),
        );

        let now = Utc::now();
        for surface in session.surfaces() {
            surface.refresh(now);
        }
        assert_eq!(renderer.refresh_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tear_down_cancels_clock() {
        use std::sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        };
        use std::time::Duration;

        let renderer = RecordingRenderer::default();
        let scheduler = crate::scheduler::Scheduler::new();
        let mut session =
            PresentationSession::open(1, item("m1"), &[primary_display()], &renderer, callbacks());

        let ticks = Arc::new(AtomicUsize::new(0));
        let ticks_clone = Arc::clone(&ticks);
        session.attach_clock(scheduler.schedule_every(Duration::from_secs(1), move || {
            ticks_clone.fetch_add(1, Ordering::SeqCst);
        }));

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 2);

        session.tear_down();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 2);
    }
}
