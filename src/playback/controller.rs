use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Instant;

use super::{Clock, CompletionMonitor, PlaybackEvent, PlaybackStatus, PlaybackToken, Player};
use crate::buffer::WaveformBuffer;
use crate::error::PlaybackError;

/// The monitor of the current attempt plus whether its wake is expected
struct InFlight {
    monitor: CompletionMonitor,
    expected_stop: bool,
}

struct PlaybackState {
    status: PlaybackStatus,
    position: usize,
    play_epoch: Option<Instant>,
    active_buffer: Option<Arc<WaveformBuffer>>,
    generation: u64,
    attempts: u64,
    in_flight: Option<InFlight>,
}

impl PlaybackState {
    fn new() -> Self {
        Self {
            status: PlaybackStatus::Stopped,
            position: 0,
            play_epoch: None,
            active_buffer: None,
            generation: 0,
            attempts: 0,
            in_flight: None,
        }
    }

    fn buffer_len(&self) -> usize {
        self.active_buffer.as_ref().map_or(0, |b| b.len())
    }

    /// Position including time played since `play_epoch`, clamped to the buffer
    fn estimate_position(&self, now: Instant) -> usize {
        let len = self.buffer_len();
        match (self.status, self.play_epoch, &self.active_buffer) {
            (PlaybackStatus::Playing, Some(epoch), Some(buffer)) => {
                let elapsed = now.saturating_duration_since(epoch).as_secs_f64();
                let advanced = (elapsed * buffer.sample_rate() as f64).floor() as usize;
                self.position.saturating_add(advanced).min(len)
            }
            _ => self.position.min(len),
        }
    }

    fn flag_expected_stop(&mut self) {
        if let Some(in_flight) = self.in_flight.as_mut() {
            in_flight.expected_stop = true;
        }
    }

    fn monitor_active(&self) -> bool {
        self.in_flight.as_ref().map_or(false, |f| f.monitor.is_active())
    }

    fn rest(&mut self) {
        self.position = 0;
        self.status = PlaybackStatus::Stopped;
        self.play_epoch = None;
    }
}

/// Consistent view of the playback state taken under one lock
#[derive(Debug, Clone)]
pub struct PlaybackSnapshot {
    pub status: PlaybackStatus,
    pub position: usize,
    pub buffer: Option<Arc<WaveformBuffer>>,
}

impl PlaybackSnapshot {
    /// Seconds into the buffer at the snapshot position
    pub fn elapsed_seconds(&self) -> f64 {
        self.buffer
            .as_ref()
            .map_or(0.0, |b| self.position as f64 / b.sample_rate() as f64)
    }
}

struct Shared {
    state: Mutex<PlaybackState>,
    player: Arc<dyn Player>,
    clock: Arc<dyn Clock>,
    events: Sender<PlaybackEvent>,
}

/// Owner of playback state: what is loaded, where playback is and which
/// device attempt is in flight.
///
/// Every operation runs under one lock, so commands from the UI and
/// completion signals from monitor threads are atomic with respect to each
/// other. Cloning yields another handle to the same controller.
#[derive(Clone)]
pub struct PlaybackController {
    shared: Arc<Shared>,
}

impl PlaybackController {
    /// Create a controller and the receiving end of its event channel,
    /// which belongs to the UI context.
    pub fn new(player: Arc<dyn Player>, clock: Arc<dyn Clock>) -> (Self, Receiver<PlaybackEvent>) {
        let (events, receiver) = mpsc::channel();
        let controller = Self {
            shared: Arc::new(Shared {
                state: Mutex::new(PlaybackState::new()),
                player,
                clock,
                events,
            }),
        };
        (controller, receiver)
    }

    fn state(&self) -> MutexGuard<'_, PlaybackState> {
        self.shared.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Best-effort device stop; failures never block the state transition
    fn stop_device(&self, context: &str) {
        if let Err(err) = self.shared.player.stop() {
            log::warn!("Error {} playback: {:#}", context, err);
        }
    }

    /// Make `buffer` the active buffer, rewound and stopped. Loading while
    /// playing stops the current output first.
    pub fn load(&self, buffer: Arc<WaveformBuffer>) {
        let mut state = self.state();

        if state.status == PlaybackStatus::Playing {
            log::info!("Stopping playback before loading a new buffer");
            state.flag_expected_stop();
            self.stop_device("stopping");
        }

        state.rest();
        state.generation += 1;
        log::debug!(
            "Loaded buffer of {} samples at {} Hz (generation {})",
            buffer.len(),
            buffer.sample_rate(),
            state.generation
        );
        state.active_buffer = Some(buffer);
    }

    /// Start or resume from the stored position. A buffer paused at its end
    /// restarts from the beginning. Already playing is a no-op.
    pub fn start(&self) -> Result<(), PlaybackError> {
        let mut state = self.state();

        if state.status == PlaybackStatus::Playing {
            return Ok(());
        }

        let buffer = state.active_buffer.clone().ok_or(PlaybackError::NothingLoaded)?;
        if buffer.is_empty() {
            return Err(PlaybackError::EmptyBuffer);
        }
        if state.position >= buffer.len() {
            state.position = 0;
        }

        let remaining = &buffer.samples()[state.position..];
        if let Err(err) = self.shared.player.play(remaining, buffer.sample_rate()) {
            log::error!("Error starting playback: {:#}", err);
            return Err(PlaybackError::DeviceStart(format!("{:#}", err)));
        }

        state.attempts += 1;
        let token = PlaybackToken {
            generation: state.generation,
            attempt: state.attempts,
        };

        let weak: Weak<Shared> = Arc::downgrade(&self.shared);
        let spawned = CompletionMonitor::spawn(self.shared.player.clone(), token, move |token| {
            if let Some(shared) = weak.upgrade() {
                PlaybackController { shared }.on_natural_completion(token);
            }
        });

        let monitor = match spawned {
            Ok(monitor) => monitor,
            Err(err) => {
                log::error!("Could not spawn playback monitor: {}", err);
                self.stop_device("rolling back");
                return Err(PlaybackError::DeviceStart(err.to_string()));
            }
        };

        // A previous attempt's monitor may still be waking up; it was flagged by
        // the pause or stop that ended it and no longer matches the token anyway.
        state.in_flight = Some(InFlight {
            monitor,
            expected_stop: false,
        });
        state.status = PlaybackStatus::Playing;
        state.play_epoch = Some(self.shared.clock.now());

        log::info!(
            "Playback started at sample {} of {} (attempt {})",
            state.position,
            buffer.len(),
            token.attempt
        );
        Ok(())
    }

    /// Freeze the position and silence the device. No-op unless playing.
    pub fn pause(&self) {
        let mut state = self.state();

        if state.status != PlaybackStatus::Playing {
            return;
        }

        let now = self.shared.clock.now();
        state.position = state.estimate_position(now);
        state.status = PlaybackStatus::Paused;
        state.play_epoch = None;
        state.flag_expected_stop();

        self.stop_device("pausing");
        log::info!("Playback paused at sample {}", state.position);
    }

    /// Stop and rewind. Safe to call in any state, including with nothing loaded.
    pub fn stop(&self) {
        let mut state = self.state();

        let should_stop = matches!(state.status, PlaybackStatus::Playing | PlaybackStatus::Paused)
            || state.monitor_active();

        if should_stop {
            state.flag_expected_stop();
            self.stop_device("stopping");
            state.generation += 1;
            log::info!("Playback stopped");
        }

        state.rest();
    }

    /// Current sample offset, extrapolated from the clock while playing
    pub fn current_position_estimate(&self) -> usize {
        let state = self.state();
        state.estimate_position(self.shared.clock.now())
    }

    pub fn status(&self) -> PlaybackStatus {
        self.state().status
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        let state = self.state();
        PlaybackSnapshot {
            status: state.status,
            position: state.estimate_position(self.shared.clock.now()),
            buffer: state.active_buffer.clone(),
        }
    }

    pub fn active_buffer(&self) -> Option<Arc<WaveformBuffer>> {
        self.state().active_buffer.clone()
    }

    /// Token of the attempt whose monitor is currently registered
    pub fn current_token(&self) -> Option<PlaybackToken> {
        self.state().in_flight.as_ref().map(|f| f.monitor.token())
    }

    /// Whether the registered monitor thread is still waiting on the device
    pub fn is_monitor_active(&self) -> bool {
        self.state().monitor_active()
    }

    /// Called by a monitor once the device reports the end of output.
    ///
    /// Signals from superseded generations or attempts, and from attempts
    /// that were paused or stopped on purpose, are dropped.
    pub fn on_natural_completion(&self, token: PlaybackToken) {
        let mut state = self.state();

        let current = state.in_flight.as_ref().map(|f| (f.monitor.token(), f.expected_stop));
        match current {
            Some((registered, _)) if registered != token => {
                log::debug!("Ignoring completion of superseded attempt {}", token.attempt);
                return;
            }
            None => {
                log::debug!("Ignoring completion of attempt {} with no monitor registered", token.attempt);
                return;
            }
            Some((_, true)) => {
                log::debug!("Attempt {} ended by request", token.attempt);
                state.in_flight = None;
                return;
            }
            Some((_, false)) => {}
        }

        state.in_flight = None;
        if token.generation != state.generation || state.status != PlaybackStatus::Playing {
            log::debug!("Ignoring completion from stale generation {}", token.generation);
            return;
        }

        state.rest();
        log::info!("Playback finished");

        if self.shared.events.send(PlaybackEvent::Finished).is_err() {
            log::debug!("No UI listening for playback events");
        }
    }
}
