//! Source of the live display topology.

use std::sync::{Mutex, PoisonError};

use log::info;
use mockall::automock;

use crate::displays::display::{Display, DisplayId, Point};

/// Trait giving the engine access to the host's display topology.
///
/// This trait abstracts the platform so the engine can be tested with mocks.
#[automock]
pub trait DisplayProvider: Send + Sync {
    /// Currently connected displays, in host order.
    fn displays(&self) -> Vec<Display>;
    /// Current mouse pointer position, if known.
    fn pointer_location(&self) -> Option<Point>;
}

/// A display topology held in memory.
///
/// Used by the console binary, where the topology comes from the
/// configuration file and is changed by `unplug` commands.
pub struct StaticDisplays {
    displays: Mutex<Vec<Display>>,
    pointer: Mutex<Option<Point>>,
}

impl StaticDisplays {
    /// Creates a topology with these displays and no known pointer.
    pub fn new(displays: Vec<Display>) -> Self {
        StaticDisplays {
            displays: Mutex::new(displays),
            pointer: Mutex::new(None),
        }
    }

    /// Removes a display from the topology.
    ///
    /// Returns `false` if no display has this id.
    pub fn remove_display(&self, id: DisplayId) -> bool {
        let mut displays = self.displays.lock().unwrap_or_else(PoisonError::into_inner);
        let before = displays.len();
        displays.retain(|display| display.id != id);

        let removed = displays.len() != before;
        if removed {
            info!("display {} disconnected, {} left", id, displays.len());
        }
        removed
    }

    /// Moves the simulated mouse pointer.
    pub fn set_pointer(&self, pointer: Option<Point>) {
        *self.pointer.lock().unwrap_or_else(PoisonError::into_inner) = pointer;
    }
}

impl DisplayProvider for StaticDisplays {
    fn displays(&self) -> Vec<Display> {
        self.displays
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn pointer_location(&self) -> Option<Point> {
        *self.pointer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
