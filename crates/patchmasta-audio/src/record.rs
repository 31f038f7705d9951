//! Audio capture from an input device.
//!
//! Recording blocks for the requested duration, so it must only run on a
//! worker thread. The stream callback appends into a shared buffer; the
//! recorder thread sleeps until enough samples have arrived.

use std::sync::Arc;
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Names of all devices with input channels.
pub fn list_input_devices() -> Vec<String> {
    let host = cpal::default_host();
    match host.input_devices() {
        Ok(devices) => devices.filter_map(|d| d.name().ok()).collect(),
        Err(e) => {
            warn!("failed to enumerate audio inputs: {e}");
            Vec::new()
        }
    }
}

/// Records mono f32 audio from a configured input device.
pub struct AudioRecorder {
    /// Substring-matched device name; `None` uses the host default.
    device: Option<String>,
    sample_rate: u32,
}

impl AudioRecorder {
    pub fn new(device: Option<String>, sample_rate: u32) -> Self {
        Self { device, sample_rate }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn open_device(&self) -> Result<cpal::Device> {
        let host = cpal::default_host();
        match &self.device {
            None => host
                .default_input_device()
                .ok_or_else(|| Error::NoInputDevice("no default input device".into())),
            Some(name) => {
                let mut devices = host
                    .input_devices()
                    .map_err(|e| Error::NoInputDevice(e.to_string()))?;
                devices
                    .find(|d| {
                        d.name()
                            .map(|n| n.to_lowercase().contains(&name.to_lowercase()))
                            .unwrap_or(false)
                    })
                    .ok_or_else(|| Error::NoInputDevice(format!("no input matching '{name}'")))
            }
        }
    }

    /// Record `duration_s` seconds of mono audio. Blocking.
    pub fn record(&self, duration_s: f32) -> Result<Vec<f32>> {
        let device = self.open_device()?;
        let config = device.default_input_config()?;
        let channels = config.channels() as usize;
        let stream_rate = config.sample_rate().0;
        let target = (self.sample_rate as f32 * duration_s) as usize;

        debug!(
            "recording {duration_s}s from '{}' ({} ch @ {stream_rate} Hz)",
            device.name().unwrap_or_default(),
            channels
        );

        let captured = Arc::new(Mutex::new(Vec::<f32>::with_capacity(target)));
        let sink = Arc::clone(&captured);
        let stream = device.build_input_stream(
            &config.into(),
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let mut buf = sink.lock();
                for frame in data.chunks(channels) {
                    buf.push(frame.iter().sum::<f32>() / frame.len() as f32);
                }
            },
            |err| warn!("input stream error: {err}"),
            None,
        )?;
        stream.play()?;

        let stream_target = (stream_rate as f32 * duration_s) as usize;
        let deadline = Instant::now() + Duration::from_secs_f32(duration_s + 1.0);
        loop {
            std::thread::sleep(Duration::from_millis(20));
            if captured.lock().len() >= stream_target || Instant::now() >= deadline {
                break;
            }
        }
        drop(stream);

        let mut samples = captured.lock().clone();
        samples.truncate(stream_target);

        if stream_rate != self.sample_rate {
            samples = resample(&samples, stream_rate, self.sample_rate);
        }
        Ok(samples)
    }
}

/// Linear-interpolation resampler; capture quality is sufficient for
/// spectral comparison.
fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if samples.is_empty() || from_rate == to_rate {
        return samples.to_vec();
    }
    let ratio = from_rate as f64 / to_rate as f64;
    let out_len = (samples.len() as f64 / ratio) as usize;
    (0..out_len)
        .map(|i| {
            let pos = i as f64 * ratio;
            let idx = pos as usize;
            let frac = (pos - idx as f64) as f32;
            let a = samples[idx.min(samples.len() - 1)];
            let b = samples[(idx + 1).min(samples.len() - 1)];
            a + (b - a) * frac
        })
        .collect()
}
