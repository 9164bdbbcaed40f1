//! UI-side coordination: turns user commands into controller calls, drains
//! playback events on the UI context and decides what to redraw.

use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

use crate::buffer::WaveformBuffer;
use crate::config::{AppConfig, ToneSettings};
use crate::display::{buffer_title, note_title, Presentation, RenderRequest};
use crate::error::GenerateError;
use crate::playback::{
    Clock, MelodyTracker, NoteChange, PlaybackController, PlaybackEvent, PlaybackStatus, Player,
};

/// Label and enabled state of the transport buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Buttons {
    pub play_label: &'static str,
    pub play_enabled: bool,
    pub stop_enabled: bool,
}

pub struct ToneApp<P: Presentation> {
    controller: PlaybackController,
    events: Receiver<PlaybackEvent>,
    tracker: MelodyTracker,
    presentation: P,
    settings: ToneSettings,
    current_note: Option<NoteChange>,
    status_message: Option<String>,
    finished_runs: usize,
}

impl<P: Presentation> ToneApp<P> {
    pub fn new(player: Arc<dyn Player>, clock: Arc<dyn Clock>, presentation: P, config: &AppConfig) -> Self {
        let (controller, events) = PlaybackController::new(player, clock);
        Self {
            controller,
            events,
            tracker: MelodyTracker::new(config.poll_interval),
            presentation,
            settings: config.tone,
            current_note: None,
            status_message: None,
            finished_runs: 0,
        }
    }

    pub fn controller(&self) -> &PlaybackController {
        &self.controller
    }

    pub fn presentation(&self) -> &P {
        &self.presentation
    }

    pub fn presentation_mut(&mut self) -> &mut P {
        &mut self.presentation
    }

    pub fn settings(&self) -> &ToneSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut ToneSettings {
        &mut self.settings
    }

    /// How often `pump` should run while playing
    pub fn poll_interval(&self) -> Duration {
        self.tracker.interval()
    }

    pub fn current_note(&self) -> Option<&NoteChange> {
        self.current_note.as_ref()
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    /// Number of playbacks that ran to their natural end
    pub fn finished_runs(&self) -> usize {
        self.finished_runs
    }

    /// Generate a tone from the current settings and make it the active buffer
    pub fn generate(&mut self) -> Result<(), GenerateError> {
        let result = self.settings.generate();
        self.install(result)
    }

    /// Generate the built-in melody and make it the active buffer
    pub fn generate_melody(&mut self) -> Result<(), GenerateError> {
        let result = self.settings.generate_melody();
        self.install(result)
    }

    fn install(&mut self, result: Result<WaveformBuffer, GenerateError>) -> Result<(), GenerateError> {
        let buffer = match result {
            Ok(buffer) => Arc::new(buffer),
            Err(err) => {
                log::warn!("Generation rejected: {}", err);
                self.status_message = Some(format!("Error: {}", err));
                return Err(err);
            }
        };

        self.controller.stop();
        self.controller.load(buffer.clone());
        self.tracker.reset();
        self.current_note = None;
        self.status_message = None;
        self.render_full(&buffer);
        Ok(())
    }

    fn render_full(&mut self, buffer: &WaveformBuffer) {
        let title = buffer_title(buffer);
        self.presentation.render(&RenderRequest {
            time_axis: buffer.time_axis(),
            samples: buffer.samples(),
            title: &title,
            frequency: buffer.frequency(),
            sample_rate: buffer.sample_rate(),
        });
    }

    fn render_note(&mut self, buffer: &WaveformBuffer, change: &NoteChange) {
        let title = note_title(buffer, &change.segment);
        self.presentation.render(&RenderRequest {
            time_axis: buffer.segment_time_axis(&change.segment),
            samples: buffer.segment_samples(&change.segment),
            title: &title,
            frequency: change.segment.frequency,
            sample_rate: buffer.sample_rate(),
        });
    }

    /// Play when stopped or paused, pause when playing
    pub fn toggle_play_pause(&mut self) {
        let has_wave = self.controller.active_buffer().map_or(false, |b| !b.is_empty());
        if !has_wave {
            return;
        }

        if self.controller.status() == PlaybackStatus::Playing {
            self.controller.pause();
        } else {
            match self.controller.start() {
                Ok(()) => self.status_message = None,
                Err(err) => self.status_message = Some(err.to_string()),
            }
        }
    }

    /// Stop and rewind; a melody goes back to its full view
    pub fn stop(&mut self) {
        self.controller.stop();
        self.restore_full_view();
    }

    fn restore_full_view(&mut self) {
        self.tracker.reset();
        if self.current_note.take().is_some() {
            if let Some(buffer) = self.controller.active_buffer() {
                self.render_full(&buffer);
            }
        }
    }

    /// Handle pending playback events and follow the melody. Returns whether
    /// anything visible changed.
    pub fn pump(&mut self) -> bool {
        let mut changed = false;

        loop {
            match self.events.try_recv() {
                Ok(PlaybackEvent::Finished) => {
                    self.finished_runs += 1;
                    self.restore_full_view();
                    changed = true;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }

        let snapshot = self.controller.snapshot();
        if let Some(change) = self.tracker.poll(&snapshot) {
            if let Some(buffer) = snapshot.buffer.as_deref() {
                self.render_note(buffer, &change);
            }
            self.current_note = Some(change);
            changed = true;
        }

        changed
    }

    pub fn buttons(&self) -> Buttons {
        let has_wave = self.controller.active_buffer().map_or(false, |b| !b.is_empty());
        match self.controller.status() {
            PlaybackStatus::Playing => Buttons {
                play_label: "Pause",
                play_enabled: true,
                stop_enabled: true,
            },
            PlaybackStatus::Paused => Buttons {
                play_label: "Play",
                play_enabled: true,
                stop_enabled: true,
            },
            PlaybackStatus::Stopped => Buttons {
                play_label: "Play",
                play_enabled: has_wave,
                stop_enabled: false,
            },
        }
    }
}
