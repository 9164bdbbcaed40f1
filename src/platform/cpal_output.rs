#[cfg(feature = "native")]
use cpal::{
    traits::{DeviceTrait, HostTrait, StreamTrait},
    Device, FromSample, Sample, SampleFormat, SampleRate, SizedSample, Stream, StreamConfig,
    SupportedStreamConfig, SupportedStreamConfigRange,
};
use super::DeviceProgress;
use crate::playback::Player;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

enum DeviceCommand {
    Play {
        samples: Arc<Vec<f32>>,
        sample_rate: u32,
        reply: Sender<Result<(), anyhow::Error>>,
    },
    Stop,
}

/// `Player` on the default CPAL output device
///
/// `cpal::Stream` cannot leave the thread that built it, so a device thread
/// owns the stream and takes commands over a channel. Completion and stream
/// faults are published through `DeviceProgress`.
#[cfg(feature = "native")]
pub struct CpalPlayer {
    commands: Mutex<Option<Sender<DeviceCommand>>>,
    progress: Arc<DeviceProgress>,
    device_thread: Option<JoinHandle<()>>,
}

#[cfg(feature = "native")]
impl CpalPlayer {
    pub fn new() -> Result<Self, anyhow::Error> {
        let (commands, receiver) = mpsc::channel();
        let progress = Arc::new(DeviceProgress::new());

        let thread_progress = progress.clone();
        let device_thread = thread::Builder::new()
            .name("audio-device".to_string())
            .spawn(move || Self::run_device(receiver, thread_progress))?;

        Ok(Self {
            commands: Mutex::new(Some(commands)),
            progress,
            device_thread: Some(device_thread),
        })
    }

    fn send(&self, command: DeviceCommand) -> Result<(), anyhow::Error> {
        let commands = self.commands.lock().unwrap_or_else(|e| e.into_inner());
        commands
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Audio device is shut down"))?
            .send(command)
            .map_err(|_| anyhow::anyhow!("Audio device thread has exited"))
    }

    /// Device thread: owns the current stream until told to replace or drop it
    fn run_device(commands: Receiver<DeviceCommand>, progress: Arc<DeviceProgress>) {
        let mut stream: Option<Stream> = None;

        while let Ok(command) = commands.recv() {
            match command {
                DeviceCommand::Play { samples, sample_rate, reply } => {
                    // No callback of the old stream can run once it is dropped
                    stream = None;
                    let epoch = progress.begin();
                    let result = Self::open_stream(samples, sample_rate, progress.clone(), epoch);
                    let reply_result = match result {
                        Ok(new_stream) => {
                            stream = Some(new_stream);
                            Ok(())
                        }
                        Err(err) => {
                            progress.finish();
                            Err(err)
                        }
                    };
                    let _ = reply.send(reply_result);
                }
                DeviceCommand::Stop => {
                    if stream.take().is_some() {
                        log::debug!("Audio stream dropped");
                    }
                }
            }
        }

        log::debug!("Audio device thread exiting");
    }

    /// Build and start a stream on the default device for the given buffer
    fn open_stream(
        samples: Arc<Vec<f32>>,
        sample_rate: u32,
        progress: Arc<DeviceProgress>,
        epoch: u64,
    ) -> Result<Stream, anyhow::Error> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or_else(|| anyhow::anyhow!("Default output device is not available"))?;

        log::debug!("Output device: {}", device.name()?);

        let ranges: Vec<SupportedStreamConfigRange> = device.supported_output_configs()?.collect();
        let (supported_config, samples) = match Self::choose_config(&ranges, sample_rate) {
            Some(supported_config) => (supported_config, samples),
            None => {
                let fallback = device.default_output_config()?;
                let device_rate = fallback.sample_rate().0;
                log::warn!(
                    "Output device doesn't support {} Hz, resampling to {} Hz",
                    sample_rate,
                    device_rate
                );
                let resampled = resample_linear(&samples, sample_rate, device_rate);
                (fallback, Arc::new(resampled))
            }
        };
        let config: StreamConfig = supported_config.config();

        let stream = match supported_config.sample_format() {
            cpal::SampleFormat::I8 => Self::make_stream::<i8>(&device, &config, samples, progress, epoch)?,
            cpal::SampleFormat::I16 => Self::make_stream::<i16>(&device, &config, samples, progress, epoch)?,
            cpal::SampleFormat::I32 => Self::make_stream::<i32>(&device, &config, samples, progress, epoch)?,
            cpal::SampleFormat::I64 => Self::make_stream::<i64>(&device, &config, samples, progress, epoch)?,
            cpal::SampleFormat::U8 => Self::make_stream::<u8>(&device, &config, samples, progress, epoch)?,
            cpal::SampleFormat::U16 => Self::make_stream::<u16>(&device, &config, samples, progress, epoch)?,
            cpal::SampleFormat::U32 => Self::make_stream::<u32>(&device, &config, samples, progress, epoch)?,
            cpal::SampleFormat::U64 => Self::make_stream::<u64>(&device, &config, samples, progress, epoch)?,
            cpal::SampleFormat::F32 => Self::make_stream::<f32>(&device, &config, samples, progress, epoch)?,
            cpal::SampleFormat::F64 => Self::make_stream::<f64>(&device, &config, samples, progress, epoch)?,
            sample_format => return Err(anyhow::anyhow!("Unsupported sample format '{}'", sample_format)),
        };

        stream.play()?;
        log::debug!("Audio stream started at sample rate: {}", config.sample_rate.0);
        Ok(stream)
    }

    /// First config whose rate range holds `sample_rate`, preferring f32 output
    fn choose_config(ranges: &[SupportedStreamConfigRange], sample_rate: u32) -> Option<SupportedStreamConfig> {
        let holds_rate = |range: &&SupportedStreamConfigRange| {
            range.min_sample_rate().0 <= sample_rate && sample_rate <= range.max_sample_rate().0
        };

        ranges
            .iter()
            .filter(holds_rate)
            .find(|range| range.sample_format() == SampleFormat::F32)
            .or_else(|| ranges.iter().find(holds_rate))
            .map(|range| range.clone().with_sample_rate(SampleRate(sample_rate)))
    }

    /// Create a typed stream for the given sample format
    fn make_stream<T>(
        device: &Device,
        config: &StreamConfig,
        samples: Arc<Vec<f32>>,
        progress: Arc<DeviceProgress>,
        epoch: u64,
    ) -> Result<Stream, anyhow::Error>
    where
        T: SizedSample + FromSample<f32>,
    {
        let num_channels = config.channels as usize;
        let mut cursor = 0usize;
        let mut finished = false;

        let error_progress = progress.clone();
        let err_fn = move |err: cpal::StreamError| {
            log::error!("Output stream error: {}", err);
            error_progress.fail(epoch, err.to_string());
        };

        let stream = device.build_output_stream(
            config,
            move |output: &mut [T], _: &cpal::OutputCallbackInfo| {
                cursor = Self::process_frame(output, &samples, cursor, num_channels);
                if cursor >= samples.len() && !finished {
                    finished = true;
                    progress.complete(epoch);
                }
            },
            err_fn,
            None,
        )?;

        Ok(stream)
    }

    /// Copy the next frames of the buffer into `output`, padding with silence.
    /// Returns the advanced cursor.
    fn process_frame<SampleType>(
        output: &mut [SampleType],
        samples: &[f32],
        cursor: usize,
        num_channels: usize,
    ) -> usize
    where
        SampleType: Sample + FromSample<f32>,
    {
        let mut position = cursor;

        for frame in output.chunks_mut(num_channels) {
            let value = samples.get(position).copied().unwrap_or(0.0);
            let value: SampleType = SampleType::from_sample(value);

            // Copy the same value to all channels
            for sample in frame.iter_mut() {
                *sample = value;
            }

            if position < samples.len() {
                position += 1;
            }
        }

        position
    }
}

/// Linear interpolation from one rate to another, keeping the duration
fn resample_linear(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() || from_rate == 0 {
        return samples.to_vec();
    }

    let out_len = ((samples.len() as u64 * to_rate as u64) / from_rate as u64).max(1) as usize;
    let step = from_rate as f64 / to_rate as f64;

    (0..out_len)
        .map(|i| {
            let position = i as f64 * step;
            let index = position.floor() as usize;
            let t = (position - index as f64) as f32;
            let s0 = samples[index.min(samples.len() - 1)];
            let s1 = samples.get(index + 1).copied().unwrap_or(s0);
            s0 + (s1 - s0) * t
        })
        .collect()
}

#[cfg(feature = "native")]
impl Player for CpalPlayer {
    fn play(&self, samples: &[f32], sample_rate: u32) -> Result<(), anyhow::Error> {
        let (reply, response) = mpsc::channel();
        self.send(DeviceCommand::Play {
            samples: Arc::new(samples.to_vec()),
            sample_rate,
            reply,
        })?;

        response
            .recv()
            .map_err(|_| anyhow::anyhow!("Audio device thread did not answer"))?
    }

    fn stop(&self) -> Result<(), anyhow::Error> {
        // Release waiters even if the device thread is gone
        self.progress.finish();
        self.send(DeviceCommand::Stop)
    }

    fn wait_until_done(&self) -> Result<(), anyhow::Error> {
        self.progress.wait()
    }
}

#[cfg(feature = "native")]
impl Drop for CpalPlayer {
    fn drop(&mut self) {
        self.progress.finish();
        // Closing the channel ends the device thread's loop
        self.commands.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(handle) = self.device_thread.take() {
            let _ = handle.join();
        }
    }
}
