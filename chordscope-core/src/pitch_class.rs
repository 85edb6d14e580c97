//! Deduplicated, ordered sets of pitch classes.
//!
//! Stored as a 12-bit mask: iteration is always ascending and equality is
//! structural, so two frames hearing the same notes compare equal no matter
//! what order the notes were found in.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::music::{midi_to_pitch_class, pitch_class_name};

const ALL_CLASSES: u16 = 0x0fff;

/// A set of pitch classes (0 = C .. 11 = B).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PitchClassSet(u16);

impl PitchClassSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Builds a set from a raw 12-bit mask (bit n = pitch class n).
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits & ALL_CLASSES)
    }

    /// Builds a set from the rounded pitch classes of MIDI values.
    pub fn from_midi<I: IntoIterator<Item = f32>>(midis: I) -> Self {
        midis.into_iter().map(midi_to_pitch_class).collect()
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Adds a pitch class; values outside 0..=11 wrap.
    pub fn insert(&mut self, pitch_class: u8) {
        self.0 |= 1 << (pitch_class % 12);
    }

    pub fn contains(self, pitch_class: u8) -> bool {
        pitch_class < 12 && self.0 & (1 << pitch_class) != 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Pitch classes in ascending order.
    pub fn iter(self) -> impl Iterator<Item = u8> {
        (0..12u8).filter(move |&pc| self.contains(pc))
    }

    /// Rotates the set so that `root` lands on 0, i.e. the intervals of
    /// every member above `root`.
    pub fn transpose_down(self, root: u8) -> Self {
        self.iter().map(|pc| (pc + 12 - root % 12) % 12).collect()
    }
}

impl FromIterator<u8> for PitchClassSet {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        let mut set = Self::empty();
        for pc in iter {
            set.insert(pc);
        }
        set
    }
}

impl fmt::Display for PitchClassSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(pitch_class_name).collect();
        write!(f, "{}", names.join(" "))
    }
}

impl Serialize for PitchClassSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}
