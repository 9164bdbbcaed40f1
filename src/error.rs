use thiserror::Error;

/// Rejected generation parameters or a malformed buffer
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerateError {
    #[error("Unknown wave type '{0}' (expected sine, square, triangle or sawtooth)")]
    UnknownWaveform(String),

    #[error("Unknown note '{0}'")]
    UnknownNote(String),

    #[error("Frequency must be a positive number of Hz, got {0}")]
    InvalidFrequency(f64),

    #[error("Duration must be a positive number of seconds, got {0}")]
    InvalidDuration(f64),

    #[error("Amplitude must be within 0-1, got {0}")]
    InvalidAmplitude(f64),

    #[error("Sample rate must be positive")]
    InvalidSampleRate,

    #[error("Time axis has {time_axis} entries but there are {samples} samples")]
    AxisLengthMismatch { samples: usize, time_axis: usize },

    #[error("Note segment {index} does not continue the previous segment: {message}")]
    BrokenSegments { index: usize, message: String },
}

/// Failures surfaced to the UI by the playback controller
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("Nothing loaded: generate a waveform first")]
    NothingLoaded,

    #[error("Loaded buffer has no samples")]
    EmptyBuffer,

    #[error("Error starting playback: {0}")]
    DeviceStart(String),
}
