//! # Music Math Module
//!
//! Conversions between frequency, MIDI pitch number, pitch class and note
//! name, based on twelve-tone equal temperament with A4 = 440 Hz.
//!
//! Octaves follow the MIDI convention: MIDI 60 is "C4" and MIDI 0 is "C-1".
//! Every conversion rounds through [`round_midi`] so note names and pitch
//! classes always agree for the same MIDI value.

/// Frequency of MIDI note 0 (C-1), ≈ 8.1758 Hz.
pub const MIDI_ZERO_HZ: f32 = 8.175_799;

/// Returned by [`frequency_to_midi`] for non-positive frequencies.
///
/// Negative, so it can never be mistaken for a pitch in [0, 127].
pub const NO_PITCH: f32 = -1.0;

/// Chromatic note names indexed by pitch class (0 = C).
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Converts a frequency in Hz to a fractional MIDI pitch.
///
/// Returns [`NO_PITCH`] when `hz` is zero, negative or NaN.
pub fn frequency_to_midi(hz: f32) -> f32 {
    if hz > 0.0 {
        12.0 * (hz / MIDI_ZERO_HZ).log2()
    } else {
        NO_PITCH
    }
}

/// Converts a fractional MIDI pitch back to Hz.
pub fn midi_to_frequency(midi: f32) -> f32 {
    MIDI_ZERO_HZ * 2.0_f32.powf(midi / 12.0)
}

/// MIDI pitch of a (possibly fractional) FFT bin.
pub fn bin_to_midi(bin: f32, hz_per_bin: f32) -> f32 {
    frequency_to_midi(bin * hz_per_bin)
}

/// Nearest integer pitch. Halves round away from zero.
pub fn round_midi(midi: f32) -> i32 {
    midi.round() as i32
}

/// Pitch class (0..=11) of the nearest integer pitch.
pub fn midi_to_pitch_class(midi: f32) -> u8 {
    round_midi(midi).rem_euclid(12) as u8
}

/// Note name of the nearest integer pitch, e.g. `"C#"` or `"C#4"`.
///
/// Returns an empty string for pitches that round below zero, which covers
/// [`NO_PITCH`].
pub fn midi_to_note_name(midi: f32, with_octave: bool) -> String {
    let rounded = round_midi(midi);
    if rounded < 0 {
        return String::new();
    }
    let name = NOTE_NAMES[(rounded % 12) as usize];
    if with_octave {
        format!("{}{}", name, rounded / 12 - 1)
    } else {
        name.to_string()
    }
}

/// Name of a pitch class; values outside 0..=11 wrap.
pub fn pitch_class_name(pitch_class: u8) -> &'static str {
    NOTE_NAMES[(pitch_class % 12) as usize]
}

/// Signed distance in cents from the nearest equal-tempered pitch.
pub fn cents_offset(midi: f32) -> f32 {
    (midi - midi.round()) * 100.0
}
