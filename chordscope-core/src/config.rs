//! # Detector Configuration
//!
//! Session-wide parameters for the detection pipeline and the spectrum
//! analyser feeding it. Every field has a default so partial TOML tables
//! deserialize cleanly.

use serde::{Deserialize, Serialize};

use crate::error::{DetectorError, Result};

/// Parameters fixed for the lifetime of a detector session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// FFT length in samples. The spectrum has `fft_size / 2` bins.
    pub fft_size: usize,
    /// Number of consecutive identical pitch-class sets required before a
    /// frame counts as stable.
    pub stability_frames: usize,
    /// Capacity of the per-frame peak buffer.
    pub max_peaks: usize,
    /// Capacity of the per-frame fundamental buffer.
    pub max_fundamentals: usize,
    /// Highest harmonic order the sieve considers.
    pub num_harmonics: usize,
    /// Top of the magnitude scale. 255 matches 8-bit analyser output; the
    /// adaptive threshold is capped here.
    pub magnitude_ceiling: f32,
    /// Decibel level mapped to magnitude 0.
    pub min_decibels: f32,
    /// Decibel level mapped to `magnitude_ceiling`.
    pub max_decibels: f32,
    /// Temporal smoothing between successive analyser frames, in [0, 1).
    pub smoothing: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            fft_size: 8192,
            stability_frames: 4,
            max_peaks: 64,
            max_fundamentals: 6,
            num_harmonics: 6,
            magnitude_ceiling: 255.0,
            min_decibels: -100.0,
            max_decibels: -30.0,
            smoothing: 0.8,
        }
    }
}

impl DetectorConfig {
    /// Number of magnitude bins per spectrum.
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Frequency width of one bin at the given sample rate.
    pub fn hz_per_bin(&self, sample_rate: u32) -> f32 {
        sample_rate as f32 / self.fft_size as f32
    }

    /// Rejects configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.fft_size < 32 || !self.fft_size.is_power_of_two() {
            return Err(invalid(format!(
                "fft_size must be a power of two >= 32, got {}",
                self.fft_size
            )));
        }
        if self.stability_frames == 0 {
            return Err(invalid("stability_frames must be at least 1"));
        }
        if self.max_peaks == 0 {
            return Err(invalid("max_peaks must be at least 1"));
        }
        if self.max_fundamentals == 0 {
            return Err(invalid("max_fundamentals must be at least 1"));
        }
        if self.num_harmonics == 0 {
            return Err(invalid("num_harmonics must be at least 1"));
        }
        if !(self.magnitude_ceiling > 0.0) {
            return Err(invalid("magnitude_ceiling must be positive"));
        }
        if !(self.min_decibels < self.max_decibels) {
            return Err(invalid(format!(
                "min_decibels ({}) must be below max_decibels ({})",
                self.min_decibels, self.max_decibels
            )));
        }
        if !(0.0..1.0).contains(&self.smoothing) {
            return Err(invalid(format!(
                "smoothing must be in [0, 1), got {}",
                self.smoothing
            )));
        }
        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> DetectorError {
    DetectorError::InvalidConfig(msg.into())
}
