//! Vigil - hard-to-miss alerts for time-sensitive items.
//!
//! Vigil presents urgent alerts (meetings, reminders, tasks) across one or
//! more displays and manages their lifecycle: display, user action,
//! snooze-and-reschedule and dismissal.
//!
//! # Architecture
//!
//! - [`alerts`] - Alert items, the lifecycle engine and its snooze bookkeeping
//! - [`config`] - YAML configuration with environment variable overrides
//! - [`displays`] - Display topology and monitor selection
//! - [`error`] - Error types shared by the engine and its collaborators
//! - [`platform`] - Rendering, audio and host signal boundaries
//! - [`scheduler`] - Cancellable one-shot and periodic timers

pub mod alerts;
pub mod config;
pub mod displays;
pub mod error;
pub mod platform;
pub mod scheduler;

#[cfg(test)]
mod test_support;
