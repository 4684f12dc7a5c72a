//! Alert items presented by the engine.
//!
//! This module provides the [`AlertItem`] struct describing a time-bound event
//! (meeting, reminder, task, ...) together with its [`Priority`] and
//! [`AlertType`].

use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Label used for the action button when the item does not provide one.
pub const DEFAULT_ACTION_LABEL: &str = "Open";

/// Urgency of an alert item.
///
/// The priority selects the sound played when the alert is shown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

impl Priority {
    /// Name used in tracking events.
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
        }
    }
}

/// An RGBA colour used by custom alert styles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    #[serde(default = "opaque")]
    pub a: u8,
}

fn opaque() -> u8 {
    255
}

impl Rgba {
    /// Opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Rgba { r, g, b, a: 255 }
    }
}

/// Style data carried by [`AlertType::Custom`].
///
/// Two custom styles are equal only if every gradient stop and the icon are
/// equal. Gradients of the same length with different colours are different
/// styles.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomStyle {
    /// Gradient stops, from top to bottom.
    pub gradient: Vec<Rgba>,
    /// Optional icon name understood by the renderer.
    #[serde(default)]
    pub icon: Option<String>,
}

/// Kind of an alert item.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlertType {
    #[default]
    Meeting,
    Reminder,
    Task,
    Custom(CustomStyle),
}

impl AlertType {
    /// Name used in tracking events.
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::Meeting => "meeting",
            AlertType::Reminder => "reminder",
            AlertType::Task => "task",
            AlertType::Custom(_) => "custom",
        }
    }
}

/// A time-sensitive item that can be presented as an alert.
///
/// Items are supplied by the surrounding application and never modified by
/// the engine.
///
/// # Equality and Hashing
///
/// Two items are equal if they share the same `id`, regardless of every other
/// field. A refreshed payload for the same logical item (new title, moved
/// start time, ...) therefore correlates with the existing snooze and session
/// state.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, Utc};
/// use vigil::alerts::{AlertItem, AlertType, Priority};
///
/// let item = AlertItem::new("m1", "Standup", Utc::now() + Duration::minutes(5))
///     .with_priority(Priority::High)
///     .with_type(AlertType::Meeting);
/// assert_eq!(item.action_label(), "Open");
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AlertItem {
    /// Stable identifier, the correlation key for all engine state.
    pub id: String,
    /// Title displayed in large text.
    pub title: String,
    /// When the event starts.
    pub start_time: DateTime<Utc>,
    /// When the event ends.
    pub end_time: DateTime<Utc>,
    /// Free-form notes.
    #[serde(default)]
    pub notes: Option<String>,
    /// URL opened by the action button (meeting link, task page, ...).
    #[serde(default)]
    pub action_url: Option<String>,
    /// Text of the action button.
    #[serde(default)]
    pub action_label: Option<String>,
    /// Ordered attendee names.
    #[serde(default)]
    pub attendees: Vec<String>,
    /// Whether the event repeats.
    #[serde(default)]
    pub is_recurring: bool,
    /// Human readable recurrence, e.g. "every weekday".
    #[serde(default)]
    pub recurrence_description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, rename = "type")]
    pub alert_type: AlertType,
}

impl AlertItem {
    /// Creates a normal priority meeting item lasting 30 minutes.
    pub fn new(id: &str, title: &str, start_time: DateTime<Utc>) -> Self {
        AlertItem {
            id: id.to_string(),
            title: title.to_string(),
            start_time,
            end_time: start_time + chrono::Duration::minutes(30),
            notes: None,
            action_url: None,
            action_label: None,
            attendees: Vec::new(),
            is_recurring: false,
            recurrence_description: None,
            priority: Priority::default(),
            alert_type: AlertType::default(),
        }
    }

    /// Sets the priority.
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the alert type.
    pub fn with_type(mut self, alert_type: AlertType) -> Self {
        self.alert_type = alert_type;
        self
    }

    /// Sets the action url and, optionally, the label of its button.
    pub fn with_action(mut self, url: &str, label: Option<&str>) -> Self {
        self.action_url = Some(url.to_string());
        self.action_label = label.map(str::to_string);
        self
    }

    /// Returns the action label, falling back to [`DEFAULT_ACTION_LABEL`].
    pub fn action_label(&self) -> &str {
        self.action_label
            .as_deref()
            .filter(|label| !label.trim().is_empty())
            .unwrap_or(DEFAULT_ACTION_LABEL)
    }

    /// Human readable countdown relative to `now`, e.g. "starts in 5 min".
    pub fn countdown(&self, now: DateTime<Utc>) -> String {
        if now >= self.end_time {
            return "ended".to_string();
        }
        if now >= self.start_time {
            return "in progress".to_string();
        }
        let minutes = ((self.start_time - now).num_seconds() + 59) / 60;
        match minutes {
            0 | 1 => "starts in 1 min".to_string(),
            m if m < 60 => format!("starts in {} min", m),
            m => format!("starts in {}h{:02}", m / 60, m % 60),
        }
    }
}

impl PartialEq for AlertItem {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for AlertItem {}

impl Hash for AlertItem {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
