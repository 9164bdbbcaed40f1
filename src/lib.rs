//! Waveform generator with pause/resume playback
//!
//! Generates sine, square, triangle and sawtooth tones or a built-in melody,
//! hands them to a `Player` and keeps playback state consistent across UI
//! commands and asynchronous device completion.

pub mod app;
pub mod buffer;
pub mod config;
pub mod display;
pub mod error;
pub mod gen;
pub mod playback;
pub mod utils;

// Platform abstraction layer
pub mod platform;

pub use buffer::{BufferKind, NoteSegment, WaveformBuffer};
pub use error::{GenerateError, PlaybackError};
pub use playback::{PlaybackController, PlaybackEvent, PlaybackStatus, Player};
