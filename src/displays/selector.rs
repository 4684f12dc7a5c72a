//! Selection of the displays an alert appears on.
//!
//! [`select_displays`] applies a [`MonitorPreference`] to the live display
//! topology. It never returns an empty set while at least one usable display
//! exists.

use serde::{Deserialize, Serialize};

use crate::displays::display::{Display, Point};

/// Policy selecting which displays receive a presentation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorPreference {
    /// Every display, in topology order.
    #[default]
    AllMonitors,
    /// The primary display only.
    PrimaryOnly,
    /// Every display except the primary one.
    ExternalOnly,
    /// The display under the mouse pointer.
    MouseLocation,
}

/// Returns the displays an alert should be presented on.
///
/// Degenerate displays (zero width or height) are ignored whatever the
/// preference. Fallbacks:
///
/// - `PrimaryOnly`: the first display when none is designated primary
/// - `ExternalOnly`: the primary display when there is no external one
/// - `MouseLocation`: the primary display when the pointer is on no display
///   or unknown
///
/// An empty result means there is nothing to present on; the caller must skip
/// the presentation.
///
/// # Examples
///
/// ```
/// use vigil::displays::{Display, MonitorPreference, Rect, select_displays};
///
/// let displays = vec![Display::new(1, Rect::new(0.0, 0.0, 1920.0, 1080.0), true)];
/// let selected = select_displays(&displays, MonitorPreference::ExternalOnly, None);
/// assert_eq!(selected.len(), 1);
/// ```
pub fn select_displays(
    displays: &[Display],
    preference: MonitorPreference,
    pointer: Option<Point>,
) -> Vec<Display> {
    let usable: Vec<&Display> = displays
        .iter()
        .filter(|display| !display.bounds.is_degenerate())
        .collect();

    let selected: Vec<&Display> = match preference {
        MonitorPreference::AllMonitors => usable,
        MonitorPreference::PrimaryOnly => primary(&usable).into_iter().collect(),
        MonitorPreference::ExternalOnly => {
            let external: Vec<&Display> = usable
                .iter()
                .copied()
                .filter(|display| !display.is_primary)
                .collect();
            if external.is_empty() {
                primary(&usable).into_iter().collect()
            } else {
                external
            }
        }
        MonitorPreference::MouseLocation => pointer
            .and_then(|point| {
                usable
                    .iter()
                    .copied()
                    .find(|display| display.bounds.contains(point))
            })
            .or_else(|| primary(&usable))
            .into_iter()
            .collect(),
    };

    selected.into_iter().cloned().collect()
}

fn primary<'a>(displays: &[&'a Display]) -> Option<&'a Display> {
    displays
        .iter()
        .copied()
        .find(|display| display.is_primary)
        .or_else(|| displays.first().copied())
}
