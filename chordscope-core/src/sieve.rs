//! # Harmonic Sieve Module
//!
//! A single played note shows up as a whole series of spectral peaks: the
//! fundamental plus overtones at integer multiples of its frequency. The sieve
//! collapses those series back into the fundamentals a listener would hear.
//!
//! Each peak in a plausible musical range is scored by its own energy plus the
//! energy of peaks sitting on its harmonic series, so a low note with strong
//! overtones outranks the overtones themselves. Fundamentals are then picked
//! greedily, and everything on a chosen fundamental's series is retired.
//!
//! Harmonic positions are compared in semitones with a half-semitone
//! tolerance, which absorbs string inharmonicity and bin quantisation.

use serde::Serialize;

use crate::music::bin_to_midi;
use crate::peaks::Peak;

/// Lowest MIDI pitch a fundamental may have (C1).
const MIN_FUNDAMENTAL_MIDI: f32 = 24.0;

/// Highest MIDI pitch a fundamental may have (C7).
const MAX_FUNDAMENTAL_MIDI: f32 = 96.0;

/// How far (in semitones) a peak may sit from an ideal harmonic.
const HARMONIC_TOLERANCE: f32 = 0.5;

/// Normalised score a peak must exceed to be picked.
const MIN_SELECTION_SCORE: f32 = 0.3;

/// A detected note.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Fundamental {
    /// Fractional MIDI pitch.
    pub midi: f32,
}

/// Semitone distance from a fundamental to its n-th harmonic.
fn harmonic_interval(n: usize) -> f32 {
    12.0 * (n as f32).log2()
}

/// Reusable scratch space for the sieve.
#[derive(Debug, Default, Clone)]
pub struct HarmonicSieve {
    midis: Vec<f32>,
    scores: Vec<f32>,
    used: Vec<bool>,
}

impl HarmonicSieve {
    pub fn new() -> Self {
        Self::default()
    }

    /// Picks fundamentals from `peaks` into `out` (cleared first, capped at
    /// `max_fundamentals`), strongest first.
    pub fn select(
        &mut self,
        peaks: &[Peak],
        hz_per_bin: f32,
        num_harmonics: usize,
        max_fundamentals: usize,
        out: &mut Vec<Fundamental>,
    ) {
        out.clear();

        self.midis.clear();
        self.midis.extend(peaks.iter().map(|p| bin_to_midi(p.bin, hz_per_bin)));

        self.score(peaks, num_harmonics);

        self.used.clear();
        self.used.resize(peaks.len(), false);

        while out.len() < max_fundamentals {
            let Some(best) = self.strongest_unused() else {
                break;
            };

            let midi = self.midis[best];
            self.used[best] = true;
            for n in 2..=num_harmonics {
                let target = midi + harmonic_interval(n);
                for (j, &other) in self.midis.iter().enumerate() {
                    if (other - target).abs() < HARMONIC_TOLERANCE {
                        self.used[j] = true;
                    }
                }
            }

            out.push(Fundamental { midi });
        }
    }

    /// Fills `scores` with normalised harmonic-support scores.
    fn score(&mut self, peaks: &[Peak], num_harmonics: usize) {
        self.scores.clear();

        for (i, peak) in peaks.iter().enumerate() {
            let midi = self.midis[i];
            if !(MIN_FUNDAMENTAL_MIDI..=MAX_FUNDAMENTAL_MIDI).contains(&midi) {
                self.scores.push(0.0);
                continue;
            }

            let mut score = peak.energy;
            let mut harmonic_count = 1usize;
            for n in 2..=num_harmonics {
                let target = midi + harmonic_interval(n);
                let supporting = self
                    .midis
                    .iter()
                    .enumerate()
                    .find(|&(j, &other)| j != i && (other - target).abs() < HARMONIC_TOLERANCE);
                if let Some((j, _)) = supporting {
                    score += peaks[j].energy / n as f32;
                    harmonic_count += 1;
                }
            }

            self.scores.push(score * (harmonic_count as f32).sqrt());
        }

        let max = self.scores.iter().copied().fold(0.0_f32, f32::max);
        if max > 0.0 {
            for score in &mut self.scores {
                *score /= max;
            }
        }
    }

    /// Index of the highest unused score above the selection floor; the
    /// lowest index wins ties.
    fn strongest_unused(&self) -> Option<usize> {
        let mut best: Option<(usize, f32)> = None;
        for (i, &score) in self.scores.iter().enumerate() {
            if self.used[i] || score <= MIN_SELECTION_SCORE {
                continue;
            }
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((i, score));
            }
        }
        best.map(|(i, _)| i)
    }
}

/// Allocating convenience wrapper around [`HarmonicSieve::select`].
pub fn find_fundamentals(
    peaks: &[Peak],
    hz_per_bin: f32,
    num_harmonics: usize,
    max_fundamentals: usize,
) -> Vec<Fundamental> {
    let mut out = Vec::with_capacity(max_fundamentals);
    HarmonicSieve::new().select(peaks, hz_per_bin, num_harmonics, max_fundamentals, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::music::{frequency_to_midi, midi_to_frequency};

    const HZ_PER_BIN: f32 = 1.0;

    fn peak_at_hz(hz: f32, energy: f32) -> Peak {
        Peak { bin: hz / HZ_PER_BIN, energy }
    }

    fn series(f0: f32, energies: &[f32]) -> Vec<Peak> {
        energies
            .iter()
            .enumerate()
            .map(|(k, &e)| peak_at_hz(f0 * (k + 1) as f32, e))
            .collect()
    }

    #[test]
    fn harmonic_series_collapses_to_its_base() {
        let peaks = series(220.0, &[100.0, 80.0, 60.0, 40.0]);
        let fundamentals = find_fundamentals(&peaks, HZ_PER_BIN, 6, 6);
        assert_eq!(fundamentals.len(), 1);
        assert!((fundamentals[0].midi - 57.0).abs() < 0.01);
    }

    #[test]
    fn detuned_overtones_are_still_absorbed() {
        // stretched partials, about 20 cents sharp
        let f0 = 110.0;
        let stretch = 2.0_f32.powf(0.2 / 12.0);
        let peaks = vec![
            peak_at_hz(f0, 90.0),
            peak_at_hz(f0 * 2.0 * stretch, 70.0),
            peak_at_hz(f0 * 3.0 * stretch, 50.0),
        ];
        let fundamentals = find_fundamentals(&peaks, HZ_PER_BIN, 6, 6);
        assert_eq!(fundamentals.len(), 1);
        assert!((fundamentals[0].midi - frequency_to_midi(f0)).abs() < 1e-3);
    }

    #[test]
    fn two_unrelated_notes_are_both_found() {
        // C4 and E4 each with a second harmonic
        let c4 = midi_to_frequency(60.0);
        let e4 = midi_to_frequency(64.0);
        let mut peaks = vec![
            peak_at_hz(c4, 100.0),
            peak_at_hz(e4, 90.0),
            peak_at_hz(c4 * 2.0, 50.0),
            peak_at_hz(e4 * 2.0, 45.0),
        ];
        peaks.sort_by(|a, b| a.bin.total_cmp(&b.bin));

        let fundamentals = find_fundamentals(&peaks, HZ_PER_BIN, 6, 6);
        let mut pitches: Vec<i32> = fundamentals.iter().map(|f| f.midi.round() as i32).collect();
        pitches.sort();
        assert_eq!(pitches, vec![60, 64]);
    }

    #[test]
    fn strongest_fundamental_comes_first() {
        let c4 = midi_to_frequency(60.0);
        let g4 = midi_to_frequency(67.0);
        let peaks = vec![peak_at_hz(c4, 50.0), peak_at_hz(g4, 100.0)];
        let fundamentals = find_fundamentals(&peaks, HZ_PER_BIN, 6, 6);
        assert_eq!(fundamentals.len(), 2);
        assert!((fundamentals[0].midi - 67.0).abs() < 0.01);
    }

    #[test]
    fn out_of_range_peaks_are_never_fundamentals() {
        // ~20 Hz and ~5 kHz are outside MIDI 24..=96
        let peaks = vec![peak_at_hz(20.0, 200.0), peak_at_hz(5000.0, 200.0)];
        assert!(find_fundamentals(&peaks, HZ_PER_BIN, 6, 6).is_empty());
    }

    #[test]
    fn weak_peaks_fall_below_selection_floor() {
        let peaks = vec![
            peak_at_hz(midi_to_frequency(60.0), 100.0),
            peak_at_hz(midi_to_frequency(63.0), 20.0),
        ];
        let fundamentals = find_fundamentals(&peaks, HZ_PER_BIN, 6, 6);
        assert_eq!(fundamentals.len(), 1);
    }

    #[test]
    fn respects_fundamental_cap() {
        let peaks: Vec<Peak> = [60.0, 61.0, 62.0, 63.0]
            .iter()
            .map(|&m| peak_at_hz(midi_to_frequency(m), 100.0))
            .collect();
        assert_eq!(find_fundamentals(&peaks, HZ_PER_BIN, 6, 2).len(), 2);
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(find_fundamentals(&[], HZ_PER_BIN, 6, 6).is_empty());
    }

    #[test]
    fn scratch_is_reused_between_frames() {
        let mut sieve = HarmonicSieve::new();
        let mut out = Vec::new();
        sieve.select(&series(220.0, &[100.0, 80.0]), HZ_PER_BIN, 6, 6, &mut out);
        assert_eq!(out.len(), 1);
        sieve.select(&[], HZ_PER_BIN, 6, 6, &mut out);
        assert!(out.is_empty());
    }
}
