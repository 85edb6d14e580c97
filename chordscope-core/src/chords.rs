//! # Chord Matching Module
//!
//! Classifies a set of pitch classes against a fixed catalog of chord
//! templates. Every member of the set is tried as the root; each template is
//! scored by how much of it the set covers, minus a penalty for notes the
//! template does not explain.
//!
//! Catalog order matters: the first candidate to reach a score keeps it, so
//! ambiguous voicings (C6 / Am7, the four roots of a diminished seventh)
//! resolve by root order first and catalog order second.

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::music::NOTE_NAMES;
use crate::pitch_class::PitchClassSet;

/// A candidate must score strictly above this to be reported.
const MIN_MATCH_SCORE: f32 = 0.5;

/// Penalty per input note the template does not account for.
const EXTRA_NOTE_PENALTY: f32 = 0.1;

/// A named reference chord: semitone offsets from the root, root excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChordTemplate {
    pub display_name: &'static str,
    pub abbreviation: &'static str,
    pub intervals: &'static [u8],
}

impl ChordTemplate {
    const fn new(display_name: &'static str, abbreviation: &'static str, intervals: &'static [u8]) -> Self {
        Self { display_name, abbreviation, intervals }
    }

    /// The template's intervals as a pitch-class set relative to the root.
    pub fn interval_set(&self) -> PitchClassSet {
        self.intervals.iter().copied().collect()
    }
}

/// The chord catalog, in tie-break order.
pub const CHORD_TEMPLATES: &[ChordTemplate] = &[
    // Triads
    ChordTemplate::new("Major", "", &[4, 7]),
    ChordTemplate::new("Minor", "m", &[3, 7]),
    ChordTemplate::new("Diminished", "dim", &[3, 6]),
    ChordTemplate::new("Augmented", "aug", &[4, 8]),
    ChordTemplate::new("Suspended 2nd", "sus2", &[2, 7]),
    ChordTemplate::new("Suspended 4th", "sus4", &[5, 7]),
    ChordTemplate::new("Power", "5", &[7]),
    // Sevenths
    ChordTemplate::new("Dominant 7th", "7", &[4, 7, 10]),
    ChordTemplate::new("Major 7th", "maj7", &[4, 7, 11]),
    ChordTemplate::new("Minor 7th", "m7", &[3, 7, 10]),
    ChordTemplate::new("Minor Major 7th", "mMaj7", &[3, 7, 11]),
    ChordTemplate::new("Half-Diminished 7th", "m7b5", &[3, 6, 10]),
    ChordTemplate::new("Diminished 7th", "dim7", &[3, 6, 9]),
    ChordTemplate::new("Augmented 7th", "aug7", &[4, 8, 10]),
    ChordTemplate::new("Dominant 7th sus4", "7sus4", &[5, 7, 10]),
    // Sixths
    ChordTemplate::new("Major 6th", "6", &[4, 7, 9]),
    ChordTemplate::new("Minor 6th", "m6", &[3, 7, 9]),
    // Added tones and extensions
    ChordTemplate::new("Added 9th", "add9", &[2, 4, 7]),
    ChordTemplate::new("Minor added 9th", "madd9", &[2, 3, 7]),
    ChordTemplate::new("Dominant 9th", "9", &[2, 4, 7, 10]),
    ChordTemplate::new("Major 9th", "maj9", &[2, 4, 7, 11]),
    ChordTemplate::new("Minor 9th", "m9", &[2, 3, 7, 10]),
];

/// Interval masks for `CHORD_TEMPLATES`, computed once.
static TEMPLATE_MASKS: Lazy<Vec<(PitchClassSet, &'static ChordTemplate)>> = Lazy::new(|| {
    CHORD_TEMPLATES
        .iter()
        .map(|template| (template.interval_set(), template))
        .collect()
});

/// The best-fitting chord for a pitch-class set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChordMatch {
    /// Root note name, e.g. `"A"`.
    pub root: &'static str,
    pub root_pitch_class: u8,
    pub display_name: &'static str,
    pub abbreviation: &'static str,
    /// Root name followed by the abbreviation, e.g. `"Am"`.
    pub full: String,
}

impl ChordMatch {
    fn new(root_pitch_class: u8, template: &ChordTemplate) -> Self {
        let root = NOTE_NAMES[root_pitch_class as usize];
        Self {
            root,
            root_pitch_class,
            display_name: template.display_name,
            abbreviation: template.abbreviation,
            full: format!("{}{}", root, template.abbreviation),
        }
    }

    /// The notes of the matched chord itself: root plus template intervals.
    pub fn pitch_classes(&self) -> PitchClassSet {
        let mut set = PitchClassSet::empty();
        set.insert(self.root_pitch_class);
        if let Some(template) = CHORD_TEMPLATES
            .iter()
            .find(|t| t.abbreviation == self.abbreviation)
        {
            for interval in template.intervals {
                set.insert(self.root_pitch_class + interval);
            }
        }
        set
    }
}

/// Matches an arbitrary list of pitch classes.
///
/// Order and duplicates are irrelevant; values wrap modulo 12 (so negative
/// classes are accepted). Fewer than two distinct classes never match.
pub fn match_chord(pitch_classes: &[i32]) -> Option<ChordMatch> {
    let set: PitchClassSet = pitch_classes
        .iter()
        .map(|pc| pc.rem_euclid(12) as u8)
        .collect();
    match_pitch_classes(set)
}

/// Matches a canonical pitch-class set against the catalog.
pub fn match_pitch_classes(set: PitchClassSet) -> Option<ChordMatch> {
    if set.len() < 2 {
        return None;
    }

    let mut best: Option<(u8, &ChordTemplate)> = None;
    let mut best_score = MIN_MATCH_SCORE;

    for root in set.iter() {
        let intervals = PitchClassSet::from_bits(set.transpose_down(root).bits() & !1);
        let interval_count = intervals.len() as f32;

        for (mask, template) in TEMPLATE_MASKS.iter() {
            let matches = PitchClassSet::from_bits(mask.bits() & intervals.bits()).len() as f32;
            let score = matches / template.intervals.len() as f32
                - (interval_count - matches) * EXTRA_NOTE_PENALTY;
            if score > best_score {
                best_score = score;
                best = Some((root, *template));
            }
        }
    }

    best.map(|(root, template)| ChordMatch::new(root, template))
}
