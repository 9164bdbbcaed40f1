use crate::buffer::{BufferKind, WaveformBuffer};
use crate::error::GenerateError;
use crate::gen::waveform::Waveform;

/// Lowest sample rate used for generated tones
pub const MIN_SAMPLE_RATE: u32 = 44100;

/// Sample rate for a tone: at least four samples per cycle, never below 44.1 kHz
pub fn sample_rate_for(frequency: f64) -> u32 {
    let oversampled = (4.0 * frequency).floor();
    if oversampled > MIN_SAMPLE_RATE as f64 {
        oversampled.min(u32::MAX as f64) as u32
    } else {
        MIN_SAMPLE_RATE
    }
}

pub(crate) fn check_tone_params(frequency: f64, duration: f64, amplitude: f64) -> Result<(), GenerateError> {
    if !frequency.is_finite() || frequency <= 0.0 {
        return Err(GenerateError::InvalidFrequency(frequency));
    }
    if !duration.is_finite() || duration <= 0.0 {
        return Err(GenerateError::InvalidDuration(duration));
    }
    if !amplitude.is_finite() || !(0.0..=1.0).contains(&amplitude) {
        return Err(GenerateError::InvalidAmplitude(amplitude));
    }
    Ok(())
}

/// Raw samples of one tone: `floor(sample_rate * duration)` points over
/// `[0, duration)`, scaled by amplitude and clipped to the unit range.
pub(crate) fn render_tone(
    waveform: Waveform,
    frequency: f64,
    duration: f64,
    amplitude: f64,
    sample_rate: u32,
) -> (Vec<f64>, Vec<f32>) {
    let count = (sample_rate as f64 * duration) as usize;
    let mut time_axis = Vec::with_capacity(count);
    let mut samples = Vec::with_capacity(count);

    for i in 0..count {
        let t = duration * i as f64 / count as f64;
        let value = (waveform.sample_at(frequency, t) * amplitude).clamp(-1.0, 1.0);
        time_axis.push(t);
        samples.push(value as f32);
    }

    (time_axis, samples)
}

/// Generate a single-frequency tone buffer
pub fn generate_tone(
    waveform: Waveform,
    frequency: f64,
    duration: f64,
    amplitude: f64,
    sample_rate: u32,
) -> Result<WaveformBuffer, GenerateError> {
    check_tone_params(frequency, duration, amplitude)?;
    if sample_rate == 0 {
        return Err(GenerateError::InvalidSampleRate);
    }

    let (time_axis, samples) = render_tone(waveform, frequency, duration, amplitude, sample_rate);
    log::debug!(
        "Generated {} {} Hz tone: {} samples at {} Hz",
        waveform,
        frequency,
        samples.len(),
        sample_rate
    );

    WaveformBuffer::new(
        BufferKind::Tone { waveform, frequency },
        samples,
        time_axis,
        sample_rate,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_rate_floor() {
        assert_eq!(sample_rate_for(440.0), 44100);
        assert_eq!(sample_rate_for(11025.0), 44100);
        assert_eq!(sample_rate_for(12000.0), 48000);
        assert_eq!(sample_rate_for(12000.3), 48001);
    }

    #[test]
    fn test_sine_length_and_amplitude() {
        let buffer = generate_tone(Waveform::Sine, 440.0, 2.0, 0.5, 44100).unwrap();
        assert_eq!(buffer.len(), 88200);
        assert_eq!(buffer.time_axis().len(), 88200);
        assert_eq!(buffer.time_axis()[0], 0.0);
        assert!(buffer.time_axis()[88199] < 2.0);

        let peak = buffer.samples().iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(peak <= 0.5 && peak > 0.49, "peak was {}", peak);
    }

    #[test]
    fn test_rejects_bad_params() {
        assert!(matches!(
            generate_tone(Waveform::Sine, 0.0, 1.0, 0.5, 44100),
            Err(GenerateError::InvalidFrequency(_))
        ));
        assert!(matches!(
            generate_tone(Waveform::Sine, 440.0, -1.0, 0.5, 44100),
            Err(GenerateError::InvalidDuration(_))
        ));
        assert!(matches!(
            generate_tone(Waveform::Sine, 440.0, 1.0, 1.5, 44100),
            Err(GenerateError::InvalidAmplitude(_))
        ));
        assert!(matches!(
            generate_tone(Waveform::Sine, 440.0, 1.0, 0.5, 0),
            Err(GenerateError::InvalidSampleRate)
        ));
    }

    #[test]
    fn test_tiny_duration_yields_empty_buffer() {
        let buffer = generate_tone(Waveform::Square, 440.0, 0.00001, 0.5, 44100).unwrap();
        assert!(buffer.is_empty());
    }
}
