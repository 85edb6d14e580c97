//! # Chord Detector Pipeline
//!
//! One synchronous pass per spectrum snapshot:
//!
//! 1. Update the adaptive noise floor and derive the peak threshold
//! 2. Extract interpolated spectral peaks
//! 3. Collapse peaks into fundamentals with the harmonic sieve
//! 4. Reduce fundamentals to a pitch-class set
//! 5. Push the set through the stability window
//! 6. Match stable sets of two or more classes against the chord catalog
//!
//! All rolling state lives in [`ChordDetector`]; independent detectors share
//! nothing, and the peak/fundamental buffers are reused across frames.

use crate::chords::{ChordMatch, match_pitch_classes};
use crate::config::DetectorConfig;
use crate::error::{DetectorError, Result};
use crate::peaks::{NoiseFloor, Peak, extract_peaks};
use crate::pitch_class::PitchClassSet;
use crate::sieve::{Fundamental, HarmonicSieve};
use crate::stability::StabilityWindow;

/// Everything the pipeline learned from one frame.
#[derive(Debug, Clone)]
pub struct FrameAnalysis<'a> {
    /// The input spectrum, passed through.
    pub spectrum: &'a [f32],
    pub peaks: &'a [Peak],
    pub fundamentals: &'a [Fundamental],
    pub pitch_classes: PitchClassSet,
    /// The pitch-class set has been unchanged for the whole window.
    pub stable: bool,
    /// Best chord for a stable frame, if any.
    pub chord: Option<ChordMatch>,
    /// `chord` differs from the last chord reported as a change.
    pub chord_changed: bool,
    /// Frames currently held by the stability window.
    pub window_len: usize,
    /// Frames the window needs before it can be stable.
    pub window_capacity: usize,
    pub frame_max_energy: f32,
    pub active_threshold: f32,
}

impl FrameAnalysis<'_> {
    /// The chord, only on frames where it changed.
    pub fn chord_change(&self) -> Option<&ChordMatch> {
        self.chord.as_ref().filter(|_| self.chord_changed)
    }
}

/// Owns the rolling state of one detection session.
#[derive(Debug, Clone)]
pub struct ChordDetector {
    config: DetectorConfig,
    hz_per_bin: f32,
    noise_floor: NoiseFloor,
    sieve: HarmonicSieve,
    stability: StabilityWindow,
    peaks: Vec<Peak>,
    fundamentals: Vec<Fundamental>,
    last_emitted: Option<String>,
}

impl ChordDetector {
    /// Creates a detector for spectra of `config.bin_count()` bins, each
    /// `hz_per_bin` wide.
    pub fn new(config: DetectorConfig, hz_per_bin: f32) -> Result<Self> {
        config.validate()?;
        if !(hz_per_bin > 0.0 && hz_per_bin.is_finite()) {
            return Err(DetectorError::InvalidConfig(format!(
                "hz_per_bin must be positive, got {}",
                hz_per_bin
            )));
        }

        log::debug!(
            "[DETECTOR] {} bins at {:.3} Hz/bin, window of {} frames",
            config.bin_count(),
            hz_per_bin,
            config.stability_frames
        );

        Ok(Self {
            noise_floor: NoiseFloor::new(config.magnitude_ceiling),
            sieve: HarmonicSieve::new(),
            stability: StabilityWindow::new(config.stability_frames),
            peaks: Vec::with_capacity(config.max_peaks),
            fundamentals: Vec::with_capacity(config.max_fundamentals),
            last_emitted: None,
            hz_per_bin,
            config,
        })
    }

    /// Convenience constructor deriving the bin width from a sample rate.
    pub fn for_sample_rate(config: DetectorConfig, sample_rate: u32) -> Result<Self> {
        let hz_per_bin = config.hz_per_bin(sample_rate);
        Self::new(config, hz_per_bin)
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn hz_per_bin(&self) -> f32 {
        self.hz_per_bin
    }

    /// The last chord reported as a change.
    pub fn last_chord(&self) -> Option<&str> {
        self.last_emitted.as_deref()
    }

    /// Runs the full pipeline over one spectrum.
    ///
    /// Fails only if the spectrum does not have the configured bin count.
    pub fn process_frame<'a>(&'a mut self, spectrum: &'a [f32]) -> Result<FrameAnalysis<'a>> {
        let expected = self.config.bin_count();
        if spectrum.len() != expected {
            return Err(DetectorError::SpectrumLength {
                expected,
                actual: spectrum.len(),
            });
        }

        let noise = self.noise_floor.update(spectrum);
        extract_peaks(spectrum, noise.threshold, self.config.max_peaks, &mut self.peaks);
        self.sieve.select(
            &self.peaks,
            self.hz_per_bin,
            self.config.num_harmonics,
            self.config.max_fundamentals,
            &mut self.fundamentals,
        );

        let pitch_classes = PitchClassSet::from_midi(self.fundamentals.iter().map(|f| f.midi));
        let stable = self.stability.push(pitch_classes);

        let chord = if stable && pitch_classes.len() >= 2 {
            match_pitch_classes(pitch_classes)
        } else {
            None
        };

        let chord_changed = match &chord {
            Some(m) if self.last_emitted.as_deref() != Some(m.full.as_str()) => {
                log::debug!("[DETECTOR] chord change: {} ({})", m.full, pitch_classes);
                self.last_emitted = Some(m.full.clone());
                true
            }
            _ => false,
        };

        Ok(FrameAnalysis {
            spectrum,
            peaks: &self.peaks,
            fundamentals: &self.fundamentals,
            pitch_classes,
            stable,
            chord,
            chord_changed,
            window_len: self.stability.len(),
            window_capacity: self.stability.capacity(),
            frame_max_energy: noise.frame_max,
            active_threshold: noise.threshold,
        })
    }

    /// Forgets all rolling state, as if the session had just started.
    pub fn reset(&mut self) {
        self.noise_floor.reset();
        self.stability.clear();
        self.peaks.clear();
        self.fundamentals.clear();
        self.last_emitted = None;
    }
}
