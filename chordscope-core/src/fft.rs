//! # Spectrum Analyser Module
//!
//! Turns raw audio into the byte-scale magnitude spectrum the detector
//! consumes, the way a browser analyser node does:
//!
//! - Sliding window over the most recent `fft_size` samples
//! - DC offset removal and Blackman windowing
//! - Forward FFT using RustFFT, magnitudes normalised by the FFT length
//! - Exponential smoothing between successive frames
//! - Decibel conversion mapped linearly onto `[0, magnitude_ceiling]`

use std::collections::VecDeque;
use std::sync::Arc;

use rustfft::{Fft, FftPlanner, num_complex::Complex};

use crate::config::DetectorConfig;

/// Removes the DC offset from a signal by making its average value zero.
fn remove_dc_offset(signal: &mut [f32]) {
    let len = signal.len();
    if len == 0 { return; }
    let avg = signal.iter().sum::<f32>() / len as f32;
    if avg.abs() > 1e-6 {
        for sample in signal.iter_mut() {
            *sample -= avg;
        }
    }
}

/// Blackman window coefficients (alpha = 0.16).
fn blackman_window(n: usize) -> Vec<f32> {
    let alpha = 0.16_f32;
    let a0 = (1.0 - alpha) / 2.0;
    let a1 = 0.5;
    let a2 = alpha / 2.0;
    (0..n)
        .map(|i| {
            let x = 2.0 * std::f32::consts::PI * i as f32 / n as f32;
            a0 - a1 * x.cos() + a2 * (2.0 * x).cos()
        })
        .collect()
}

/// Stateful FFT front-end producing one magnitude spectrum per call.
pub struct SpectrumAnalyser {
    fft: Arc<dyn Fft<f32>>,
    fft_size: usize,
    window: Vec<f32>,
    samples: VecDeque<f32>,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
    spectrum: Vec<f32>,
    smoothing: f32,
    min_decibels: f32,
    max_decibels: f32,
    ceiling: f32,
}

impl SpectrumAnalyser {
    pub fn new(config: &DetectorConfig) -> Self {
        let fft_size = config.fft_size;
        let bins = config.bin_count();
        let fft = FftPlanner::<f32>::new().plan_fft_forward(fft_size);
        let scratch = vec![Complex::default(); fft.get_inplace_scratch_len()];

        Self {
            fft,
            fft_size,
            window: blackman_window(fft_size),
            samples: VecDeque::from(vec![0.0; fft_size]),
            buffer: vec![Complex::default(); fft_size],
            scratch,
            smoothed: vec![0.0; bins],
            spectrum: vec![0.0; bins],
            smoothing: config.smoothing,
            min_decibels: config.min_decibels,
            max_decibels: config.max_decibels,
            ceiling: config.magnitude_ceiling,
        }
    }

    /// Appends new audio, keeping only the latest `fft_size` samples.
    pub fn push_samples(&mut self, samples: &[f32]) {
        let skip = samples.len().saturating_sub(self.fft_size);
        for &sample in &samples[skip..] {
            if self.samples.len() == self.fft_size {
                self.samples.pop_front();
            }
            self.samples.push_back(sample);
        }
    }

    /// Analyses the current window and returns its byte-scale spectrum.
    ///
    /// The returned slice has `fft_size / 2` bins and is overwritten by the
    /// next call.
    pub fn analyse(&mut self) -> &[f32] {
        let mut signal: Vec<f32> = self.samples.iter().copied().collect();
        remove_dc_offset(&mut signal);

        for ((slot, sample), w) in self.buffer.iter_mut().zip(signal).zip(&self.window) {
            *slot = Complex { re: sample * w, im: 0.0 };
        }
        self.fft.process_with_scratch(&mut self.buffer, &mut self.scratch);

        let norm = 1.0 / self.fft_size as f32;
        let range = self.max_decibels - self.min_decibels;
        for (i, c) in self.buffer.iter().take(self.spectrum.len()).enumerate() {
            let magnitude = c.norm() * norm;
            let smoothed = self.smoothing * self.smoothed[i] + (1.0 - self.smoothing) * magnitude;
            self.smoothed[i] = smoothed;

            let db = 20.0 * smoothed.log10();
            let scaled = self.ceiling * (db - self.min_decibels) / range;
            self.spectrum[i] = if scaled.is_finite() {
                scaled.clamp(0.0, self.ceiling)
            } else {
                0.0
            };
        }

        &self.spectrum
    }

    /// Clears the sample history and smoothing state.
    pub fn reset(&mut self) {
        self.samples.iter_mut().for_each(|s| *s = 0.0);
        self.smoothed.iter_mut().for_each(|s| *s = 0.0);
        self.spectrum.iter_mut().for_each(|s| *s = 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 44100.0;

    fn config() -> DetectorConfig {
        DetectorConfig { fft_size: 2048, smoothing: 0.0, ..Default::default() }
    }

    fn sine(hz: f32, amplitude: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| amplitude * (2.0 * std::f32::consts::PI * hz * i as f32 / SAMPLE_RATE).sin())
            .collect()
    }

    #[test]
    fn dc_offset_is_removed() {
        let mut signal = vec![1.0, 2.0, 3.0];
        remove_dc_offset(&mut signal);
        assert!(signal.iter().sum::<f32>().abs() < 1e-6);
    }

    #[test]
    fn blackman_window_is_zero_at_the_edge() {
        let window = blackman_window(64);
        assert!(window[0].abs() < 1e-6);
        assert!((window[32] - 1.0).abs() < 1e-4);
    }

    #[test]
    fn silence_maps_to_zero() {
        let mut analyser = SpectrumAnalyser::new(&config());
        analyser.push_samples(&vec![0.0; 2048]);
        assert!(analyser.analyse().iter().all(|&m| m == 0.0));
    }

    #[test]
    fn sine_peaks_at_its_bin() {
        let config = config();
        let mut analyser = SpectrumAnalyser::new(&config);
        let hz = 440.0;
        // quiet enough that neighbouring bins stay below the ceiling
        analyser.push_samples(&sine(hz, 0.01, 2048));

        let spectrum = analyser.analyse();
        assert_eq!(spectrum.len(), 1024);
        let (loudest, &level) = spectrum
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .unwrap();
        let expected = hz / config.hz_per_bin(SAMPLE_RATE as u32);
        assert!((loudest as f32 - expected).abs() <= 1.0, "loudest bin {}", loudest);
        assert!(level > 0.0 && level < 255.0);
    }

    #[test]
    fn only_latest_window_is_kept() {
        let mut analyser = SpectrumAnalyser::new(&config());
        analyser.push_samples(&sine(440.0, 0.5, 4096));
        analyser.push_samples(&vec![0.0; 2048]);
        assert!(analyser.analyse().iter().all(|&m| m == 0.0));
    }

    #[test]
    fn smoothing_decays_towards_new_input() {
        let config = DetectorConfig { fft_size: 2048, smoothing: 0.5, ..Default::default() };
        let mut analyser = SpectrumAnalyser::new(&config);
        analyser.push_samples(&sine(1000.0, 0.5, 2048));
        let first: f32 = analyser.analyse().iter().sum();
        analyser.push_samples(&vec![0.0; 2048]);
        let second: f32 = analyser.analyse().iter().sum();
        assert!(second > 0.0 && second < first);
    }
}
