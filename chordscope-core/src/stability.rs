//! # Stability Gate
//!
//! Debounces detections: a pitch-class set only counts once it has been heard
//! unchanged for a full window of consecutive frames.

use std::collections::VecDeque;

use crate::pitch_class::PitchClassSet;

/// Sliding window over the most recent pitch-class sets, newest first.
#[derive(Debug, Clone)]
pub struct StabilityWindow {
    frames: VecDeque<PitchClassSet>,
    capacity: usize,
}

impl StabilityWindow {
    /// A window needing `capacity` identical frames; zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            frames: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Records a frame and reports whether the window is now stable.
    pub fn push(&mut self, set: PitchClassSet) -> bool {
        self.frames.push_front(set);
        self.frames.truncate(self.capacity);
        self.is_stable()
    }

    /// Full, and every frame equal to the newest one.
    pub fn is_stable(&self) -> bool {
        match self.frames.front() {
            Some(first) if self.frames.len() == self.capacity => {
                self.frames.iter().all(|set| set == first)
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Identical frames required before the window is stable.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(pcs: &[u8]) -> PitchClassSet {
        pcs.iter().copied().collect()
    }

    #[test]
    fn not_stable_until_full() {
        let mut window = StabilityWindow::new(4);
        let c_major = set(&[0, 4, 7]);
        for _ in 0..3 {
            assert!(!window.push(c_major));
        }
        assert!(window.push(c_major));
        assert_eq!(window.len(), 4);
    }

    #[test]
    fn stays_stable_while_unchanged() {
        let mut window = StabilityWindow::new(3);
        let c_major = set(&[0, 4, 7]);
        for _ in 0..3 {
            window.push(c_major);
        }
        for _ in 0..10 {
            assert!(window.push(c_major));
            assert_eq!(window.len(), 3);
        }
    }

    #[test]
    fn a_differing_frame_resets_the_streak() {
        let mut window = StabilityWindow::new(3);
        let c_major = set(&[0, 4, 7]);
        let a_minor = set(&[9, 0, 4]);
        for _ in 0..3 {
            window.push(c_major);
        }
        assert!(!window.push(a_minor));
        assert!(!window.push(c_major));
        assert!(!window.push(c_major));
        assert!(window.push(c_major));
    }

    #[test]
    fn equality_is_on_the_set_not_the_order() {
        let mut window = StabilityWindow::new(2);
        window.push(set(&[7, 0, 4]));
        assert!(window.push(set(&[0, 4, 7, 7])));
    }

    #[test]
    fn single_frame_window_is_always_stable() {
        let mut window = StabilityWindow::new(1);
        assert!(window.push(set(&[2])));
        assert!(window.push(set(&[5, 9])));
    }

    #[test]
    fn clear_empties_the_window() {
        let mut window = StabilityWindow::new(2);
        window.push(set(&[1]));
        window.push(set(&[1]));
        window.clear();
        assert!(window.is_empty());
        assert!(!window.is_stable());
        assert_eq!(window.capacity(), 2);
    }
}
