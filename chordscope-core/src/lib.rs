// chordscope-core/src/lib.rs

//! The core logic for the chordscope live chord detector.
//! This crate turns magnitude spectra into detected notes and chord names:
//! peak extraction, the harmonic sieve, the stability gate and the chord
//! matcher, plus the FFT front-end and audio capture that feed them.
//! It is completely headless.

pub mod audio;
pub mod chords;
pub mod color;
pub mod config;
pub mod detector;
pub mod error;
pub mod fft;
pub mod music;
pub mod peaks;
pub mod pitch_class;
pub mod sieve;
pub mod stability;

pub use chords::{CHORD_TEMPLATES, ChordMatch, ChordTemplate, match_chord, match_pitch_classes};
pub use color::{Hsla, pitch_class_color};
pub use config::DetectorConfig;
pub use detector::{ChordDetector, FrameAnalysis};
pub use error::{DetectorError, Result};
pub use music::{
    NOTE_NAMES, bin_to_midi, frequency_to_midi, midi_to_frequency, midi_to_note_name,
    midi_to_pitch_class,
};
pub use peaks::Peak;
pub use pitch_class::PitchClassSet;
pub use sieve::Fundamental;
