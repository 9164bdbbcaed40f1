use std::time::Duration;

use crate::buffer::WaveformBuffer;
use crate::error::GenerateError;
use crate::gen::melody::generate_melody;
use crate::gen::tone::{check_tone_params, generate_tone, sample_rate_for, MIN_SAMPLE_RATE};
use crate::gen::waveform::Waveform;
use crate::playback::tracker::DEFAULT_POLL_INTERVAL;

/// Parameters of one tone generation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneSettings {
    pub waveform: Waveform,
    pub frequency: f64,
    pub duration: f64,
    pub amplitude: f64,
}

impl Default for ToneSettings {
    fn default() -> Self {
        Self {
            waveform: Waveform::Sine,
            frequency: 440.0,
            duration: 2.0,
            amplitude: 0.5,
        }
    }
}

impl ToneSettings {
    pub fn validate(&self) -> Result<(), GenerateError> {
        check_tone_params(self.frequency, self.duration, self.amplitude)
    }

    pub fn sample_rate(&self) -> u32 {
        sample_rate_for(self.frequency)
    }

    pub fn generate(&self) -> Result<WaveformBuffer, GenerateError> {
        self.validate()?;
        generate_tone(
            self.waveform,
            self.frequency,
            self.duration,
            self.amplitude,
            self.sample_rate(),
        )
    }

    /// The built-in melody with this waveform and amplitude
    pub fn generate_melody(&self) -> Result<WaveformBuffer, GenerateError> {
        generate_melody(self.waveform, self.amplitude, MIN_SAMPLE_RATE)
    }
}

/// Application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub tone: ToneSettings,
    /// Start with the melody instead of a single tone
    pub melody: bool,
    pub poll_interval: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tone: ToneSettings::default(),
            melody: false,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}
