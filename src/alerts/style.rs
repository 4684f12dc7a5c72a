//! Visual style resolution for alert items.
//!
//! The renderer never looks at the item type itself, it receives an
//! [`AlertStyle`] resolved from it.

use crate::alerts::item::{AlertItem, AlertType, Priority, Rgba};

/// Resolved style handed to the renderer with every surface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlertStyle {
    /// Background gradient stops, from top to bottom.
    pub gradient: Vec<Rgba>,
    /// Icon name understood by the renderer.
    pub icon: String,
    /// Whether the border pulses to draw attention.
    pub pulse: bool,
}

impl AlertStyle {
    /// Resolves the style of an item from its type.
    pub fn for_item(item: &AlertItem) -> Self {
        let (gradient, icon) = match &item.alert_type {
            AlertType::Meeting => (
                vec![Rgba::rgb(37, 99, 235), Rgba::rgb(30, 64, 175)],
                "calendar".to_string(),
            ),
            AlertType::Reminder => (
                vec![Rgba::rgb(245, 158, 11), Rgba::rgb(180, 83, 9)],
                "bell".to_string(),
            ),
            AlertType::Task => (
                vec![Rgba::rgb(16, 185, 129), Rgba::rgb(4, 120, 87)],
                "checklist".to_string(),
            ),
            AlertType::Custom(style) => (
                style.gradient.clone(),
                style.icon.clone().unwrap_or_else(|| "bell".to_string()),
            ),
        };

        AlertStyle {
            gradient,
            icon,
            pulse: item.priority == Priority::High,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::alerts::item::CustomStyle;

    #[test]
    fn test_builtin_types_have_distinct_icons() {
        let item = AlertItem::new("m1", "Standup", Utc::now());
        let meeting = AlertStyle::for_item(&item);
        let task = AlertStyle::for_item(&item.clone().with_type(AlertType::Task));

        assert_eq!(meeting.icon, "calendar");
        assert_eq!(task.icon, "checklist");
        assert_ne!(meeting.gradient, task.gradient);
    }

    #[test]
    fn test_custom_style_passes_through() {
        let item = AlertItem::new("c1", "Launch", Utc::now())
            .with_priority(Priority::High)
            .with_type(AlertType::Custom(CustomStyle {
                gradient: vec![Rgba::rgb(1, 2, 3)],
                icon: None,
            }));

        let style = AlertStyle::for_item(&item);
        assert_eq!(style.gradient, vec![Rgba::rgb(1, 2, 3)]);
        assert_eq!(style.icon, "bell");
        assert!(style.pulse);
    }
}
