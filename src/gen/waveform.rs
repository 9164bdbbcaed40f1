use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use crate::error::GenerateError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

impl Waveform {
    pub const ALL: [Waveform; 4] = [
        Waveform::Sine,
        Waveform::Square,
        Waveform::Triangle,
        Waveform::Sawtooth,
    ];

    /// Lowercase name, also accepted by `FromStr`
    pub fn name(&self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Square => "square",
            Waveform::Triangle => "triangle",
            Waveform::Sawtooth => "sawtooth",
        }
    }

    /// Next waveform in selection order, wrapping around
    pub fn cycle(&self) -> Waveform {
        let index = Self::ALL.iter().position(|w| w == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }

    /// Unit-amplitude value at time `t` (seconds) for the given frequency
    pub fn sample_at(&self, frequency: f64, t: f64) -> f64 {
        let phase = 2.0 * PI * frequency * t;
        match self {
            Waveform::Sine => phase.sin(),
            Waveform::Square => {
                let s = phase.sin();
                if s > 0.0 {
                    1.0
                } else if s < 0.0 {
                    -1.0
                } else {
                    0.0
                }
            }
            Waveform::Triangle => 2.0 * phase.sin().asin() / PI,
            Waveform::Sawtooth => {
                let cycles = t * frequency;
                2.0 * (cycles - (0.5 + cycles).floor())
            }
        }
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Waveform {
    type Err = GenerateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sine" => Ok(Waveform::Sine),
            "square" => Ok(Waveform::Square),
            "triangle" => Ok(Waveform::Triangle),
            "sawtooth" | "saw" => Ok(Waveform::Sawtooth),
            other => Err(GenerateError::UnknownWaveform(other.to_string())),
        }
    }
}
