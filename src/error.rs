//! Error types shared by the alert engine and its collaborators.
//!
//! None of these errors is fatal. The worst outcome of any of them is an
//! alert that is not shown, which is always paired with a dismissal hook,
//! a tracking event or at least a log line.

use thiserror::Error;

/// Outcomes of the alert engine that prevented or disturbed a presentation.
///
/// Only [`AlertError::NoDisplaysAvailable`],
/// [`AlertError::ConcurrentPresentationSuppressed`] and
/// [`AlertError::SystemRecovering`] are returned by
/// [`AlertEngine::present`](crate::alerts::AlertEngine::present). The other
/// variants are logged and tracked where they happen.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlertError {
    /// No usable display was found, the presentation was skipped.
    #[error("no displays available to present alert {id}")]
    NoDisplaysAvailable { id: String },

    /// Another presentation was already being constructed.
    #[error("presentation of alert {id} suppressed, another presentation is in progress")]
    ConcurrentPresentationSuppressed { id: String },

    /// The host is going to sleep or just woke up.
    #[error("alert {id} not presented, system is recovering from sleep")]
    SystemRecovering { id: String },

    /// The sound for an alert could not be played.
    #[error("audio playback failed for alert {id}: {source}")]
    AudioPlaybackFailed { id: String, source: AudioError },

    /// A delegate hook panicked.
    #[error("delegate hook {hook} failed")]
    DelegateHookFailed { hook: &'static str },

    /// A snooze validation resolved after a newer session was started.
    #[error("stale validation result for alert {id} discarded")]
    StaleValidationResult { id: String },
}

/// Errors raised by a [`Renderer`](crate::platform::Renderer) while opening a surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// The display refused the surface (disconnected, asleep, ...).
    #[error("display {0} is unavailable")]
    DisplayUnavailable(u32),
    /// Any other rendering backend failure.
    #[error("renderer failure: {0}")]
    Backend(String),
}

/// Errors raised by a [`SoundPlayer`](crate::platform::SoundPlayer).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AudioError {
    /// The sound asset for the priority could not be found.
    #[error("sound asset {0} not found")]
    MissingAsset(String),
    /// The output device could not be opened.
    #[error("audio device unavailable: {0}")]
    DeviceUnavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_include_item_id() {
        let err = AlertError::NoDisplaysAvailable {
            id: "m1".to_string(),
        };
        assert_eq!(err.to_string(), "no displays available to present alert m1");

        let err = AlertError::AudioPlaybackFailed {
            id: "m1".to_string(),
            source: AudioError::MissingAsset("high.wav".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "audio playback failed for alert m1: sound asset high.wav not found"
        );
    }
}
