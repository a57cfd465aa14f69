use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use ringbuf::traits::Producer;
use tracing::{error, info};

use crate::error::CoreError;

/// Live microphone capture into a ring-buffer producer.
///
/// The stream handle is the one exclusive hardware resource in the system.
/// Dropping `MicCapture` stops the stream and releases the device, so the
/// owning thread releases exactly once per acquisition, on every exit path.
pub struct MicCapture {
    _stream: cpal::Stream,
    pub sample_rate: u32,
}

impl MicCapture {
    pub fn new<P>(mut producer: P) -> Result<Self, CoreError>
    where
        P: Producer<Item = f32> + Send + 'static,
    {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| CoreError::Permission("no input device available".to_string()))?;

        info!("Audio Input Device: {}", device.name().unwrap_or_default());

        // Capability negotiation, not a hard requirement: prefer common rates,
        // fall back to whatever the device offers.
        let target_rates = [48000, 44100, 32000, 16000];
        let mut selected = None;

        for &rate in &target_rates {
            let configs = device
                .supported_input_configs()
                .map_err(|e| CoreError::Permission(e.to_string()))?;
            for range in configs {
                if range.min_sample_rate().0 <= rate && range.max_sample_rate().0 >= rate {
                    selected = Some(range.with_sample_rate(cpal::SampleRate(rate)));
                    break;
                }
            }
            if selected.is_some() {
                break;
            }
        }

        let config = match selected {
            Some(c) => c,
            None => device
                .default_input_config()
                .map_err(|e| CoreError::Permission(e.to_string()))?,
        };
        let sample_rate = config.sample_rate().0;
        let channels = config.channels() as usize;

        info!(
            "Audio Config Selected: Rate={}Hz, Channels={}",
            sample_rate, channels
        );

        let err_fn = |err| error!("an error occurred on stream: {}", err);

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => device
                .build_input_stream(
                    &config.into(),
                    move |data: &[f32], _: &_| write_input_data(data, channels, &mut producer),
                    err_fn,
                    None,
                )
                .map_err(|e| CoreError::Permission(e.to_string()))?,
            cpal::SampleFormat::I16 => device
                .build_input_stream(
                    &config.into(),
                    move |data: &[i16], _: &_| {
                        write_input_data_i16(data, channels, &mut producer)
                    },
                    err_fn,
                    None,
                )
                .map_err(|e| CoreError::Permission(e.to_string()))?,
            other => {
                return Err(CoreError::Permission(format!(
                    "unsupported sample format: {:?}",
                    other
                )))
            }
        };

        stream
            .play()
            .map_err(|e| CoreError::Permission(e.to_string()))?;

        Ok(Self {
            _stream: stream,
            sample_rate,
        })
    }
}

// Downmix to mono by taking the first channel of each frame. If the producer
// is full we drop samples (lossy).
fn write_input_data<P>(input: &[f32], channels: usize, producer: &mut P)
where
    P: Producer<Item = f32>,
{
    for frame in input.chunks(channels.max(1)) {
        let _ = producer.try_push(frame[0]);
    }
}

fn write_input_data_i16<P>(input: &[i16], channels: usize, producer: &mut P)
where
    P: Producer<Item = f32>,
{
    for frame in input.chunks(channels.max(1)) {
        let sample = frame[0] as f32 / i16::MAX as f32;
        let _ = producer.try_push(sample);
    }
}
