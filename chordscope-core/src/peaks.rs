//! # Peak Extraction Module
//!
//! Finds local maxima in a magnitude spectrum and refines each one to a
//! fractional bin with parabolic interpolation. Also tracks the adaptive
//! noise floor that decides which maxima are loud enough to count.

use serde::Serialize;

/// Below this the parabola is treated as flat and no offset is applied.
const FLAT_PARABOLA_EPSILON: f32 = 1e-4;

/// Bins quieter than this fraction of the frame maximum feed the noise estimate.
const QUIET_BIN_RATIO: f32 = 0.3;

/// Only every n-th bin is sampled for the noise estimate.
const NOISE_SAMPLE_STRIDE: usize = 10;

/// Weight of the previous noise floor in the moving average.
const NOISE_FLOOR_DECAY: f32 = 0.95;

/// Threshold = noise floor times this, capped at the magnitude ceiling.
const THRESHOLD_FACTOR: f32 = 3.0;

/// A spectral peak.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Peak {
    /// Interpolated position in bins.
    pub bin: f32,
    /// Magnitude at the integer bin (not interpolated).
    pub energy: f32,
}

/// Collects the local maxima of `spectrum` above `threshold` into `out`.
///
/// `out` is cleared first and never grows past `max_peaks`. Scanning runs from
/// low to high frequency and stops at the cap, so the lowest peaks are kept.
pub fn extract_peaks(spectrum: &[f32], threshold: f32, max_peaks: usize, out: &mut Vec<Peak>) {
    out.clear();
    if spectrum.len() < 3 {
        return;
    }

    for i in 1..spectrum.len() - 1 {
        if out.len() >= max_peaks {
            break;
        }

        let (left, center, right) = (spectrum[i - 1], spectrum[i], spectrum[i + 1]);
        if center <= threshold || center <= left || center <= right {
            continue;
        }

        out.push(Peak {
            bin: i as f32 + parabolic_offset(left, center, right),
            energy: center,
        });
    }
}

/// Allocating form of [`extract_peaks`].
pub fn find_peaks(spectrum: &[f32], threshold: f32, max_peaks: usize) -> Vec<Peak> {
    let mut peaks = Vec::with_capacity(max_peaks.min(spectrum.len()));
    extract_peaks(spectrum, threshold, max_peaks, &mut peaks);
    peaks
}

/// Vertex of the parabola through three neighbouring bins, relative to the
/// middle one, clamped to half a bin either way.
fn parabolic_offset(left: f32, center: f32, right: f32) -> f32 {
    let denominator = 2.0 * (left - 2.0 * center + right);
    if denominator.abs() > FLAT_PARABOLA_EPSILON {
        ((left - right) / denominator).clamp(-0.5, 0.5)
    } else {
        0.0
    }
}

/// Result of feeding one frame to the [`NoiseFloor`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseEstimate {
    /// Loudest bin of the frame.
    pub frame_max: f32,
    /// Peak threshold to apply to the frame.
    pub threshold: f32,
}

/// Exponentially smoothed estimate of the spectrum's background level.
#[derive(Debug, Clone)]
pub struct NoiseFloor {
    level: f32,
    ceiling: f32,
}

impl NoiseFloor {
    /// `ceiling` is the top of the magnitude scale (255 for 8-bit spectra).
    pub fn new(ceiling: f32) -> Self {
        Self { level: 0.0, ceiling }
    }

    /// Current smoothed floor. Starts at zero and rises over the first
    /// frames as estimates are folded in.
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Peak threshold for the current floor, capped at the ceiling.
    pub fn threshold(&self) -> f32 {
        (self.level() * THRESHOLD_FACTOR).min(self.ceiling)
    }

    /// Folds one frame into the floor and returns the threshold for it.
    ///
    /// The frame estimate is the mean of the quiet bins among every
    /// tenth bin, blended in as `floor * 0.95 + estimate * 0.05` on every
    /// frame, including the first. A frame with no quiet samples (all
    /// silence, say) leaves the floor unchanged.
    pub fn update(&mut self, spectrum: &[f32]) -> NoiseEstimate {
        let frame_max = spectrum.iter().copied().fold(0.0_f32, f32::max);
        let cutoff = frame_max * QUIET_BIN_RATIO;

        let (sum, count) = spectrum
            .iter()
            .step_by(NOISE_SAMPLE_STRIDE)
            .filter(|&&m| m < cutoff)
            .fold((0.0_f32, 0usize), |(sum, count), &m| (sum + m, count + 1));

        if count > 0 {
            let estimate = sum / count as f32;
            self.level = self.level * NOISE_FLOOR_DECAY + estimate * (1.0 - NOISE_FLOOR_DECAY);
        }

        NoiseEstimate {
            frame_max,
            threshold: self.threshold(),
        }
    }

    pub fn reset(&mut self) {
        self.level = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangular_bump_interpolates_between_flanking_bins() {
        // true peak sits at 10.3: bin 10 is the maximum, bin 11 is louder than bin 9
        let mut spectrum = vec![0.0; 32];
        for (i, value) in spectrum.iter_mut().enumerate() {
            *value = (100.0 - 40.0 * (i as f32 - 10.3).abs()).max(0.0);
        }

        let peaks = find_peaks(&spectrum, 5.0, 16);
        assert_eq!(peaks.len(), 1);
        let peak = peaks[0];
        assert!(peak.bin > 10.0 && peak.bin < 11.0, "bin = {}", peak.bin);
        assert_eq!(peak.energy, spectrum[10]);
    }

    #[test]
    fn symmetric_peak_has_no_offset() {
        let spectrum = [0.0, 10.0, 50.0, 10.0, 0.0];
        let peaks = find_peaks(&spectrum, 1.0, 4);
        assert_eq!(peaks, vec![Peak { bin: 2.0, energy: 50.0 }]);
    }

    #[test]
    fn offset_is_clamped_to_half_a_bin() {
        // not a maximum, so the raw vertex would land outside the bin
        assert_eq!(parabolic_offset(0.0, 1.0, 5.0), -0.5);
        assert_eq!(parabolic_offset(5.0, 1.0, 0.0), 0.5);

        // louder right neighbour pulls the vertex right
        let offset = parabolic_offset(1.0, 10.0, 9.5);
        assert!(offset > 0.0 && offset < 0.5);
    }

    #[test]
    fn flat_parabola_falls_back_to_zero() {
        assert_eq!(parabolic_offset(5.0, 5.00001, 5.0), 0.0);
    }

    #[test]
    fn plateaus_and_edges_are_not_peaks() {
        let spectrum = [90.0, 10.0, 40.0, 40.0, 10.0, 90.0];
        assert!(find_peaks(&spectrum, 1.0, 8).is_empty());
    }

    #[test]
    fn threshold_is_exclusive() {
        let spectrum = [0.0, 20.0, 0.0, 21.0, 0.0];
        let peaks = find_peaks(&spectrum, 20.0, 8);
        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks[0].bin, 3.0);
    }

    #[test]
    fn cap_keeps_lowest_frequency_peaks() {
        let spectrum = [0.0, 5.0, 0.0, 50.0, 0.0, 80.0, 0.0, 99.0, 0.0];
        let peaks = find_peaks(&spectrum, 1.0, 2);
        let bins: Vec<f32> = peaks.iter().map(|p| p.bin).collect();
        assert_eq!(bins, vec![1.0, 3.0]);
    }

    #[test]
    fn buffer_is_reused_and_cleared() {
        let mut out = vec![Peak { bin: 99.0, energy: 1.0 }];
        extract_peaks(&[0.0, 1.0, 0.0], 0.5, 4, &mut out);
        assert_eq!(out, vec![Peak { bin: 1.0, energy: 1.0 }]);
        extract_peaks(&[0.0, 0.0], 0.5, 4, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn noise_floor_starts_at_zero_and_is_smoothed() {
        let mut floor = NoiseFloor::new(255.0);
        assert_eq!(floor.level(), 0.0);

        let mut frame = vec![10.0_f32; 100];
        frame[55] = 200.0;

        // 0 * 0.95 + 10 * 0.05
        let first = floor.update(&frame);
        assert_eq!(first.frame_max, 200.0);
        assert!((floor.level() - 0.5).abs() < 1e-4);
        assert!((first.threshold - 1.5).abs() < 1e-4);

        let mut louder_noise = vec![30.0_f32; 100];
        louder_noise[55] = 200.0;
        floor.update(&louder_noise);
        // 0.5 * 0.95 + 30 * 0.05
        assert!((floor.level() - 1.975).abs() < 1e-4);
    }

    #[test]
    fn noise_floor_converges_to_the_quiet_level() {
        let mut floor = NoiseFloor::new(255.0);
        let mut frame = vec![10.0_f32; 100];
        frame[55] = 200.0;
        for _ in 0..300 {
            floor.update(&frame);
        }
        assert!((floor.level() - 10.0).abs() < 1e-2);
        assert!((floor.threshold() - 30.0).abs() < 5e-2);
    }

    #[test]
    fn silent_frames_leave_the_floor_alone() {
        let mut floor = NoiseFloor::new(255.0);
        let mut frame = vec![4.0_f32; 50];
        frame[5] = 100.0;
        floor.update(&frame);
        let before = floor.level();

        let estimate = floor.update(&vec![0.0; 50]);
        assert_eq!(estimate.frame_max, 0.0);
        assert_eq!(floor.level(), before);
    }

    #[test]
    fn threshold_is_capped_at_ceiling() {
        let mut floor = NoiseFloor::new(10.0);
        let mut frame = vec![100.0_f32; 40];
        frame[3] = 1000.0;
        // floor 5, uncapped threshold 15
        let estimate = floor.update(&frame);
        assert_eq!(estimate.threshold, 10.0);

        floor.reset();
        assert_eq!(floor.threshold(), 0.0);
    }
}
