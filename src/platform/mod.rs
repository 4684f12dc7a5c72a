//! Boundaries between the engine and the host platform.
//!
//! - [`Renderer`] and [`Surface`]: alert windows
//! - [`SoundPlayer`]: alert sounds
//! - [`HostMonitor`]: sleep, wake and display topology signals
//! - [`ConsoleRenderer`] and [`ConsoleSoundPlayer`]: terminal implementations
//!   used by the binary

mod audio;
mod console;
mod host;
mod renderer;

#[cfg(test)]
pub use crate::platform::audio::MockSoundPlayer;
pub use crate::platform::audio::SoundPlayer;
pub use crate::platform::console::{ConsoleRenderer, ConsoleSoundPlayer};
pub use crate::platform::host::{HostMonitor, HostSignal};
pub use crate::platform::renderer::{Renderer, Surface, SurfaceCallbacks};
