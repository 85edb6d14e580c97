//! # Audio Capture Module
//!
//! Live input for the detector using CPAL (Cross-Platform Audio Library).
//! Captured audio is chunked into fixed-size hops and streamed over a channel
//! to whichever thread runs the analysis.
//!
//! Every failure to acquire the input is reported as
//! [`DetectorError::UpstreamUnavailable`]; retrying is left to the caller.

use cpal::SupportedStreamConfigRange;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::Sender;

use crate::error::{DetectorError, Result};

/// Preferred capture rate in Hz.
pub const TARGET_SAMPLE_RATE: u32 = 44100;

fn unavailable(context: &str, err: impl std::fmt::Display) -> DetectorError {
    DetectorError::UpstreamUnavailable(format!("{}: {}", context, err))
}

/// Starts audio capture from the default input device.
///
/// Samples are sent in chunks of exactly `hop_size`; chunks are dropped
/// rather than queued when the receiver falls behind.
///
/// # Returns
/// * `Ok((stream, sample_rate))` - Stream handle (capture stops when it is
///   dropped) and the negotiated sample rate
/// * `Err(DetectorError::UpstreamUnavailable)` - No usable input
pub fn start_audio_capture(hop_size: usize, sender: Sender<Vec<f32>>) -> Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| DetectorError::UpstreamUnavailable("no input device available".into()))?;

    let device_name = device.name().unwrap_or_else(|_| "<unnamed>".to_string());
    log::info!("[AUDIO] Using audio input device: {}", device_name);

    let configs = device
        .supported_input_configs()
        .map_err(|e| unavailable("cannot query input configs", e))?
        .collect::<Vec<_>>();
    let supported_config = find_supported_config(configs, TARGET_SAMPLE_RATE)
        .ok_or_else(|| DetectorError::UpstreamUnavailable("no suitable mono f32 input format".into()))?;

    let sample_rate = cpal::SampleRate(
        TARGET_SAMPLE_RATE.clamp(supported_config.min_sample_rate().0, supported_config.max_sample_rate().0),
    );
    let config = supported_config.with_sample_rate(sample_rate);
    let sample_rate_val = config.sample_rate().0;
    let config: cpal::StreamConfig = config.into();

    log::info!("[AUDIO] Selected sample rate: {} Hz", sample_rate_val);

    let err_fn = |err| log::warn!("[AUDIO] An error occurred on the audio stream: {}", err);

    let mut audio_buffer = Vec::with_capacity(hop_size * 2);

    let stream = device
        .build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                audio_buffer.extend_from_slice(data);

                while audio_buffer.len() >= hop_size {
                    let hop = audio_buffer[..hop_size].to_vec();
                    if sender.try_send(hop).is_err() {
                        log::trace!("[AUDIO] Dropped a hop, analysis is behind");
                    }
                    audio_buffer.drain(..hop_size);
                }
            },
            err_fn,
            None,
        )
        .map_err(|e| unavailable("cannot open input stream", e))?;

    stream.play().map_err(|e| unavailable("cannot start input stream", e))?;

    Ok((stream, sample_rate_val))
}

/// Picks the mono f32 configuration whose rate range is closest to
/// `target_rate`.
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.channels() == 1 && c.sample_format() == cpal::SampleFormat::F32)
        .min_by_key(|c| {
            let min = c.min_sample_rate().0;
            let max = c.max_sample_rate().0;
            if (min..=max).contains(&target_rate) {
                0
            } else {
                min.abs_diff(target_rate).min(max.abs_diff(target_rate))
            }
        })
}
