//! Audio boundary: alert sounds keyed by priority.

use mockall::automock;

use crate::{alerts::Priority, error::AudioError};

/// Trait for playing alert sounds.
///
/// Playback is best effort. The engine falls back to
/// [`SoundPlayer::play_fallback`] when [`SoundPlayer::play`] fails and never
/// lets a failure affect the presentation.
#[automock]
pub trait SoundPlayer: Send + Sync {
    /// Plays the sound associated with a priority.
    fn play(&self, priority: Priority) -> Result<(), AudioError>;
    /// Plays the platform's generic alert sound.
    fn play_fallback(&self);
}
