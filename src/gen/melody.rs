//! Built-in melody: "Happy Birthday" rendered note by note with a note index

use crate::buffer::{BufferKind, NoteSegment, WaveformBuffer};
use crate::error::GenerateError;
use crate::gen::tone::render_tone;
use crate::gen::waveform::Waveform;

pub const MELODY_NAME: &str = "Happy Birthday";

/// Seconds per beat (120 BPM)
pub const BEAT_DURATION: f64 = 0.5;

/// 4th-octave note frequencies in Hz
pub const NOTE_FREQUENCIES: [(&str, f64); 8] = [
    ("C4", 261.63),
    ("D4", 293.66),
    ("E4", 329.63),
    ("F4", 349.23),
    ("G4", 392.00),
    ("A4", 440.00),
    ("B4", 493.88),
    ("C5", 523.25),
];

/// (note, beats)
pub const HAPPY_BIRTHDAY: [(&str, f64); 25] = [
    ("G4", 0.75), ("G4", 0.25), ("A4", 1.0), ("G4", 1.0), ("C5", 1.0), ("B4", 2.0),
    ("G4", 0.75), ("G4", 0.25), ("A4", 1.0), ("G4", 1.0), ("D4", 1.0), ("C5", 2.0),
    ("G4", 0.75), ("G4", 0.25), ("G4", 1.0), ("E4", 1.0), ("C5", 1.0), ("B4", 1.0), ("A4", 2.0),
    ("F4", 0.75), ("F4", 0.25), ("E4", 1.0), ("C5", 1.0), ("D4", 1.0), ("C5", 2.0),
];

pub fn note_frequency(note: &str) -> Option<f64> {
    NOTE_FREQUENCIES
        .iter()
        .find(|(name, _)| *name == note)
        .map(|(_, freq)| *freq)
}

/// Summary of the built-in melody
#[derive(Debug, Clone, PartialEq)]
pub struct MelodyInfo {
    pub name: &'static str,
    pub duration: f64,
    pub note_count: usize,
    pub tempo: String,
}

pub fn melody_info() -> MelodyInfo {
    let beats: f64 = HAPPY_BIRTHDAY.iter().map(|(_, beats)| beats).sum();
    MelodyInfo {
        name: MELODY_NAME,
        duration: beats * BEAT_DURATION,
        note_count: HAPPY_BIRTHDAY.len(),
        tempo: format!("{:.0} BPM (moderate)", 60.0 / BEAT_DURATION),
    }
}

/// Render the melody into one buffer. Every note becomes a segment whose
/// times are derived from its sample bounds, so the time index and the
/// sample index partition the buffer identically.
pub fn generate_melody(
    waveform: Waveform,
    amplitude: f64,
    sample_rate: u32,
) -> Result<WaveformBuffer, GenerateError> {
    if sample_rate == 0 {
        return Err(GenerateError::InvalidSampleRate);
    }
    if !amplitude.is_finite() || !(0.0..=1.0).contains(&amplitude) {
        return Err(GenerateError::InvalidAmplitude(amplitude));
    }

    let rate = sample_rate as f64;
    let mut samples: Vec<f32> = Vec::new();
    let mut time_axis: Vec<f64> = Vec::new();
    let mut segments = Vec::with_capacity(HAPPY_BIRTHDAY.len());

    for (note, beats) in HAPPY_BIRTHDAY {
        let frequency = note_frequency(note)
            .ok_or_else(|| GenerateError::UnknownNote(note.to_string()))?;
        let duration = beats * BEAT_DURATION;

        let (note_times, note_samples) = render_tone(waveform, frequency, duration, amplitude, sample_rate);

        let start_index = samples.len();
        let offset = start_index as f64 / rate;
        time_axis.extend(note_times.iter().map(|t| t + offset));
        samples.extend_from_slice(&note_samples);
        let end_index = samples.len();

        segments.push(NoteSegment {
            label: note.to_string(),
            frequency,
            start_time: start_index as f64 / rate,
            end_time: end_index as f64 / rate,
            start_index,
            end_index,
        });
    }

    log::debug!(
        "Generated melody '{}': {} notes, {} samples",
        MELODY_NAME,
        segments.len(),
        samples.len()
    );

    WaveformBuffer::new(
        BufferKind::Melody { name: MELODY_NAME.to_string() },
        samples,
        time_axis,
        sample_rate,
    )?
    .with_segments(segments)
}
