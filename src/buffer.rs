//! Immutable sample buffers produced by one generation

use crate::error::GenerateError;
use crate::gen::waveform::Waveform;

/// What a buffer was generated from, used for titles
#[derive(Debug, Clone, PartialEq)]
pub enum BufferKind {
    Tone { waveform: Waveform, frequency: f64 },
    Melody { name: String },
}

/// A labeled sub-range of a melody buffer
#[derive(Debug, Clone, PartialEq)]
pub struct NoteSegment {
    pub label: String,
    pub frequency: f64,
    pub start_time: f64,
    pub end_time: f64,
    pub start_index: usize,
    pub end_index: usize,
}

impl NoteSegment {
    pub fn len(&self) -> usize {
        self.end_index - self.start_index
    }

    pub fn is_empty(&self) -> bool {
        self.start_index == self.end_index
    }

    pub fn contains_time(&self, time: f64) -> bool {
        self.start_time <= time && time < self.end_time
    }
}

#[derive(Debug, Clone)]
pub struct WaveformBuffer {
    kind: BufferKind,
    samples: Vec<f32>,
    time_axis: Vec<f64>,
    sample_rate: u32,
    note_segments: Option<Vec<NoteSegment>>,
}

impl WaveformBuffer {
    pub fn new(
        kind: BufferKind,
        samples: Vec<f32>,
        time_axis: Vec<f64>,
        sample_rate: u32,
    ) -> Result<Self, GenerateError> {
        if sample_rate == 0 {
            return Err(GenerateError::InvalidSampleRate);
        }
        if samples.len() != time_axis.len() {
            return Err(GenerateError::AxisLengthMismatch {
                samples: samples.len(),
                time_axis: time_axis.len(),
            });
        }

        Ok(Self {
            kind,
            samples,
            time_axis,
            sample_rate,
            note_segments: None,
        })
    }

    /// Attach a note index; the segments must partition the whole buffer
    pub fn with_segments(mut self, segments: Vec<NoteSegment>) -> Result<Self, GenerateError> {
        let rate = self.sample_rate as f64;
        let mut expected_index = 0;

        for (index, segment) in segments.iter().enumerate() {
            let broken = |message: String| GenerateError::BrokenSegments { index, message };

            if segment.start_index != expected_index {
                return Err(broken(format!(
                    "starts at sample {} instead of {}",
                    segment.start_index, expected_index
                )));
            }
            if segment.end_index < segment.start_index || segment.end_index > self.samples.len() {
                return Err(broken(format!("ends at invalid sample {}", segment.end_index)));
            }
            // Times must sit exactly on the sample bounds
            let start_time = segment.start_index as f64 / rate;
            let end_time = segment.end_index as f64 / rate;
            if segment.start_time != start_time || segment.end_time != end_time {
                return Err(broken(format!(
                    "covers {}s..{}s but its samples span {}s..{}s",
                    segment.start_time, segment.end_time, start_time, end_time
                )));
            }

            expected_index = segment.end_index;
        }

        if expected_index != self.samples.len() {
            return Err(GenerateError::BrokenSegments {
                index: segments.len(),
                message: format!(
                    "segments stop at sample {} of {}",
                    expected_index,
                    self.samples.len()
                ),
            });
        }

        let end_time = segments.last().map_or(0.0, |segment| segment.end_time);
        if end_time != self.duration() {
            return Err(GenerateError::BrokenSegments {
                index: segments.len(),
                message: format!("segments stop at {}s of {}s", end_time, self.duration()),
            });
        }

        self.note_segments = Some(segments);
        Ok(self)
    }

    pub fn kind(&self) -> &BufferKind {
        &self.kind
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn time_axis(&self) -> &[f64] {
        &self.time_axis
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn note_segments(&self) -> Option<&[NoteSegment]> {
        self.note_segments.as_deref()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Total duration in seconds
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Headline frequency for titles, 0 for melodies
    pub fn frequency(&self) -> f64 {
        match &self.kind {
            BufferKind::Tone { frequency, .. } => *frequency,
            BufferKind::Melody { .. } => 0.0,
        }
    }

    pub fn segment_samples(&self, segment: &NoteSegment) -> &[f32] {
        &self.samples[segment.start_index..segment.end_index]
    }

    pub fn segment_time_axis(&self, segment: &NoteSegment) -> &[f64] {
        &self.time_axis[segment.start_index..segment.end_index]
    }

    /// 16-bit PCM view of the samples
    pub fn to_pcm16(&self) -> Vec<i16> {
        to_pcm16(&self.samples)
    }
}

pub fn to_pcm16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
        .collect()
}
