//! Playback coordination between the UI context, the audio device and the
//! background completion wait.
//!
//! The controller is the single writer of playback state. Device completion
//! arrives on a monitor thread and is validated against a token before it
//! may change anything; accepted completions are posted to the UI context as
//! `PlaybackEvent`s over a channel.

use std::sync::Mutex;
use std::time::{Duration, Instant};

pub mod controller;
pub mod monitor;
pub mod tracker;

pub use controller::{PlaybackController, PlaybackSnapshot};
pub use monitor::CompletionMonitor;
pub use tracker::{current_segment, MelodyTracker, NoteChange};

/// Audio output capability driven by the controller
///
/// `play` must not block until playback ends. `stop` must be idempotent and
/// must release any thread blocked in `wait_until_done`.
pub trait Player: Send + Sync {
    /// Begin playing mono samples at the given rate
    fn play(&self, samples: &[f32], sample_rate: u32) -> Result<(), anyhow::Error>;

    /// Stop output immediately
    fn stop(&self) -> Result<(), anyhow::Error>;

    /// Block until the current output finishes or is stopped
    fn wait_until_done(&self) -> Result<(), anyhow::Error>;
}

/// Monotonic time source
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock backed by `Instant::now`
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    Stopped,
    Playing,
    Paused,
}

/// Notifications posted from the controller to the UI context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// Playback reached the end of the buffer on its own
    Finished,
}

/// Identifies one playback attempt
///
/// `generation` changes on every load and explicit stop; `attempt` changes on
/// every successful start, so a pause/resume cycle gets a fresh token too.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackToken {
    pub generation: u64,
    pub attempt: u64,
}
