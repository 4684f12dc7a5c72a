//! Recording fakes shared by the unit tests.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
    time::Duration,
};

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt};

use crate::{
    alerts::{AlertDelegate, AlertItem, AlertStyle, DismissalReason, StatProperties},
    displays::{Display, DisplayId, Rect},
    error::RenderError,
    platform::{Renderer, Surface, SurfaceCallbacks},
};

/// Something observed by a fake.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    WillShow(String),
    DidShow(String),
    DidDismiss(String, DismissalReason),
    ActionTapped(String),
    Snoozed(String, Duration),
    Stat(String, StatProperties),
    SurfaceOpened(String, DisplayId),
    SurfaceClosed(String, DisplayId),
}

pub fn item(id: &str) -> AlertItem {
    AlertItem::new(id, &format!("Item {}", id), Utc::now() + chrono::Duration::minutes(5))
}

pub fn primary_display() -> Display {
    Display::new(1, Rect::new(0.0, 0.0, 1920.0, 1080.0), true)
}

pub fn external_display() -> Display {
    Display::new(2, Rect::new(1920.0, 0.0, 2560.0, 1440.0), false)
}

/// Delegate recording every hook in order.
#[derive(Default)]
pub struct RecordingDelegate {
    pub events: Mutex<Vec<Event>>,
    pub track_stats: bool,
    /// Item ids refused by `should_show`.
    pub vetoed: Mutex<HashSet<String>>,
    /// Delay applied by `should_show` before answering.
    pub validation_delay: Option<Duration>,
}

impl RecordingDelegate {
    pub fn tracking() -> Self {
        RecordingDelegate {
            track_stats: true,
            ..Default::default()
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn hooks(&self) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|event| !matches!(event, Event::Stat(..)))
            .collect()
    }

    pub fn stats(&self) -> Vec<(String, StatProperties)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Stat(name, properties) => Some((name, properties)),
                _ => None,
            })
            .collect()
    }

    pub fn stat_names(&self) -> Vec<String> {
        self.stats().into_iter().map(|(name, _)| name).collect()
    }

    pub fn dismissals(&self) -> Vec<(String, DismissalReason)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::DidDismiss(id, reason) => Some((id, reason)),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, wanted: impl Fn(&Event) -> bool) -> usize {
        self.events().iter().filter(|event| wanted(event)).count()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl AlertDelegate for RecordingDelegate {
    fn on_will_show(&self, item: &AlertItem) {
        self.push(Event::WillShow(item.id.clone()));
    }

    fn on_did_show(&self, item: &AlertItem) {
        self.push(Event::DidShow(item.id.clone()));
    }

    fn on_did_dismiss(&self, item: &AlertItem, reason: DismissalReason) {
        self.push(Event::DidDismiss(item.id.clone(), reason));
    }

    fn on_action_tapped(&self, item: &AlertItem) {
        self.push(Event::ActionTapped(item.id.clone()));
    }

    fn on_snoozed(&self, item: &AlertItem, duration: Duration) {
        self.push(Event::Snoozed(item.id.clone(), duration));
    }

    fn should_track_stats(&self) -> bool {
        self.track_stats
    }

    fn on_track_stat(&self, event: &str, properties: &StatProperties) {
        self.push(Event::Stat(event.to_string(), properties.clone()));
    }

    fn should_show(&self, item: &AlertItem) -> BoxFuture<'static, bool> {
        let keep = !self.vetoed.lock().unwrap().contains(&item.id);
        let delay = self.validation_delay;
        async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            keep
        }
        .boxed()
    }
}

/// Renderer recording opened and closed surfaces.
#[derive(Clone, Default)]
pub struct RecordingRenderer {
    pub events: Arc<Mutex<Vec<Event>>>,
    pub callbacks: Arc<Mutex<Vec<SurfaceCallbacks>>>,
    pub refreshes: Arc<Mutex<usize>>,
    /// Displays on which opening a surface fails.
    pub failing: Arc<Mutex<HashSet<DisplayId>>>,
}

impl RecordingRenderer {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    /// Surfaces currently open, as (item id, display id).
    pub fn open_surfaces(&self) -> Vec<(String, DisplayId)> {
        let mut open = Vec::new();
        for event in self.events() {
            match event {
                Event::SurfaceOpened(id, display) => open.push((id, display)),
                Event::SurfaceClosed(id, display) => {
                    open.retain(|surface| *surface != (id.clone(), display))
                }
                _ => {}
            }
        }
        open
    }

    pub fn opened_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, Event::SurfaceOpened(..)))
            .count()
    }

    /// Callbacks handed to the most recently opened surface.
    pub fn last_callbacks(&self) -> SurfaceCallbacks {
        self.callbacks
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no surface was opened")
    }

    pub fn refresh_count(&self) -> usize {
        *self.refreshes.lock().unwrap()
    }
}

impl Renderer for RecordingRenderer {
    fn open_surface(
        &self,
        item: &AlertItem,
        display: &Display,
        _style: &AlertStyle,
        callbacks: SurfaceCallbacks,
    ) -> Result<Box<dyn Surface>, RenderError> {
        if self.failing.lock().unwrap().contains(&display.id) {
            return Err(RenderError::DisplayUnavailable(display.id));
        }

        self.events
            .lock()
            .unwrap()
            .push(Event::SurfaceOpened(item.id.clone(), display.id));
        self.callbacks.lock().unwrap().push(callbacks);

        Ok(Box::new(RecordingSurface {
            item_id: item.id.clone(),
            display_id: display.id,
            events: Arc::clone(&self.events),
            refreshes: Arc::clone(&self.refreshes),
        }))
    }
}

struct RecordingSurface {
    item_id: String,
    display_id: DisplayId,
    events: Arc<Mutex<Vec<Event>>>,
    refreshes: Arc<Mutex<usize>>,
}

impl Surface for RecordingSurface {
    fn display_id(&self) -> DisplayId {
        self.display_id
    }

    fn refresh(&self, _now: DateTime<Utc>) {
        *self.refreshes.lock().unwrap() += 1;
    }

    /// Records every call so tests can check that owners close only once.
    fn close(&self) {
        self.events
            .lock()
            .unwrap()
            .push(Event::SurfaceClosed(self.item_id.clone(), self.display_id));
    }
}
