//! Display topology and monitor selection.
//!
//! - [`Display`], [`Rect`], [`Point`]: geometry reported by the host
//! - [`DisplayProvider`]: live access to the topology and pointer position
//! - [`select_displays`]: applies a [`MonitorPreference`] to a topology

mod display;
mod provider;
mod selector;

pub use crate::displays::display::{Display, DisplayId, Point, Rect};
#[cfg(test)]
pub use crate::displays::provider::MockDisplayProvider;
pub use crate::displays::provider::{DisplayProvider, StaticDisplays};
pub use crate::displays::selector::{MonitorPreference, select_displays};
