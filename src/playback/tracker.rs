use std::time::Duration;

use super::{PlaybackSnapshot, PlaybackStatus};
use crate::buffer::{NoteSegment, WaveformBuffer};

/// Default poll interval for the "now playing" display
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// The note sounding at `elapsed` seconds, with its index in the buffer's
/// note list. `None` for buffers without notes or times outside the melody.
pub fn current_segment(buffer: &WaveformBuffer, elapsed: f64) -> Option<(usize, &NoteSegment)> {
    let segments = buffer.note_segments()?;
    let index = segments.partition_point(|segment| segment.end_time <= elapsed);
    segments
        .get(index)
        .filter(|segment| segment.contains_time(elapsed))
        .map(|segment| (index, segment))
}

/// A different note became current
#[derive(Debug, Clone, PartialEq)]
pub struct NoteChange {
    pub index: usize,
    pub segment: NoteSegment,
}

/// Follows playback through a melody for display. Has no say over playback.
#[derive(Debug)]
pub struct MelodyTracker {
    interval: Duration,
    last_index: Option<usize>,
}

impl MelodyTracker {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_index: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Index reported by the last change, if any
    pub fn last_index(&self) -> Option<usize> {
        self.last_index
    }

    pub fn reset(&mut self) {
        self.last_index = None;
    }

    /// Resolve the note for a snapshot; only reports when the index moved.
    /// Anything but `Playing` clears the tracker so a resume reports again.
    pub fn poll(&mut self, snapshot: &PlaybackSnapshot) -> Option<NoteChange> {
        if snapshot.status != PlaybackStatus::Playing {
            self.reset();
            return None;
        }

        let buffer = snapshot.buffer.as_deref()?;
        let (index, segment) = current_segment(buffer, snapshot.elapsed_seconds())?;
        if self.last_index == Some(index) {
            return None;
        }

        self.last_index = Some(index);
        Some(NoteChange {
            index,
            segment: segment.clone(),
        })
    }
}

impl Default for MelodyTracker {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}
