//! # Alive Ring — O(1) Particle Recycling
//!
//! The particle pool never moves particles around. Instead, two cursors walk
//! a fixed array of slots in circles:
//!
//! ```text
//!   slots:  [ 0 ][ 1 ][ 2 ][ 3 ][ 4 ]
//!                  ▲              ▲
//!             first_dead     first_alive
//!
//!   alive region  = [first_alive, first_dead)  (mod capacity) → slots 4, 0
//!   free region   = everything else                           → slots 1, 2, 3
//! ```
//!
//! - **Spawn** writes `first_dead` and advances it.
//! - **Retire** advances `first_alive`. Particles share a lifetime and are
//!   spawned in order, so the oldest particle is always at the front.
//!
//! `living` is stored explicitly because `first_alive == first_dead` means
//! either "empty" or "full" and the cursors alone cannot tell which.
//!
//! ## Comparison
//!
//! - **Unity (Shuriken)**: swap-remove compaction, O(1) per death but the
//!   pool order changes every frame.
//! - **Our approach**: no compaction at all. The cost is that the alive region
//!   can wrap, so iteration and drawing must split it in two.

use std::ops::Range;

/// Cursor pair plus count over a fixed number of slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AliveRing {
    capacity: usize,
    first_alive: usize,
    first_dead: usize,
    living: usize,
}

impl AliveRing {
    /// An empty ring over `capacity` slots.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            first_alive: 0,
            first_dead: 0,
            living: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn first_alive(&self) -> usize {
        self.first_alive
    }

    pub fn first_dead(&self) -> usize {
        self.first_dead
    }

    /// Number of slots in the alive region.
    pub fn living(&self) -> usize {
        self.living
    }

    pub fn is_empty(&self) -> bool {
        self.living == 0
    }

    pub fn is_full(&self) -> bool {
        self.living == self.capacity
    }

    /// The alive region wraps past the end of the slot array.
    ///
    /// A full ring whose cursors sit at 0 is not wrapped: it is the single
    /// range `0..capacity`.
    pub fn is_wrapped(&self) -> bool {
        self.living > 0 && self.first_alive >= self.first_dead && self.first_dead != 0
    }

    /// Claim the slot at `first_dead`. Returns `None` (and changes nothing)
    /// when the ring is full.
    pub fn claim(&mut self) -> Option<usize> {
        if self.is_full() {
            return None;
        }
        let slot = self.first_dead;
        self.first_dead = (self.first_dead + 1) % self.capacity;
        self.living += 1;
        Some(slot)
    }

    /// Retire the oldest slot by advancing `first_alive`. No-op when empty.
    pub fn retire_front(&mut self) {
        if self.is_empty() {
            return;
        }
        self.first_alive = (self.first_alive + 1) % self.capacity;
        self.living -= 1;
    }

    /// The alive region as one or two slot ranges, oldest first.
    ///
    /// The second range is only present when the region wraps, and it always
    /// starts at slot 0.
    pub fn segments(&self) -> (Range<usize>, Option<Range<usize>>) {
        if self.living == 0 {
            return (self.first_alive..self.first_alive, None);
        }
        let end = self.first_alive + self.living;
        if end <= self.capacity {
            (self.first_alive..end, None)
        } else {
            (self.first_alive..self.capacity, Some(0..end - self.capacity))
        }
    }

    /// Iterate alive slots from oldest to newest.
    pub fn slots(&self) -> std::iter::Chain<Range<usize>, Range<usize>> {
        let (head, tail) = self.segments();
        head.chain(tail.unwrap_or(0..0))
    }

    /// Index ranges that draw the alive region, `per_slot` indices per slot.
    ///
    /// Index buffers cannot express a circular range, so a wrapped region
    /// comes back as two ranges: slots `[0, first_dead)` first, then
    /// `[first_alive, capacity)`. Empty ranges are never returned.
    pub fn index_ranges(&self, per_slot: u32) -> [Option<Range<u32>>; 2] {
        if self.living == 0 {
            return [None, None];
        }
        let per_slot = per_slot as usize;
        if self.is_wrapped() {
            let low = (self.first_dead > 0).then(|| 0..(self.first_dead * per_slot) as u32);
            let high = (self.first_alive * per_slot) as u32..(self.capacity * per_slot) as u32;
            [low, Some(high)]
        } else {
            let start = self.first_alive * per_slot;
            let end = start + self.living * per_slot;
            [Some(start as u32..end as u32), None]
        }
    }

    /// Test helper: place the cursors directly.
    #[cfg(test)]
    pub(crate) fn with_cursors(capacity: usize, first_alive: usize, first_dead: usize, living: usize) -> Self {
        Self {
            capacity,
            first_alive,
            first_dead,
            living,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ring_is_empty() {
        let ring = AliveRing::new(4);
        assert!(ring.is_empty());
        assert!(!ring.is_full());
        assert_eq!(ring.slots().count(), 0);
    }

    #[test]
    fn claim_advances_first_dead() {
        let mut ring = AliveRing::new(3);
        assert_eq!(ring.claim(), Some(0));
        assert_eq!(ring.claim(), Some(1));
        assert_eq!(ring.first_dead(), 2);
        assert_eq!(ring.living(), 2);
    }

    #[test]
    fn claim_when_full_changes_nothing() {
        let mut ring = AliveRing::new(2);
        ring.claim();
        ring.claim();
        let before = ring;
        assert_eq!(ring.claim(), None);
        assert_eq!(ring, before, "a refused claim must not move the cursors");
        assert_eq!(ring.living(), 2);
    }

    #[test]
    fn retire_on_empty_is_noop() {
        let mut ring = AliveRing::new(2);
        ring.retire_front();
        assert_eq!(ring.living(), 0);
        assert_eq!(ring.first_alive(), 0);
    }

    #[test]
    fn wrapped_segments_split_at_capacity() {
        // slots 3, 4, 0 alive
        let ring = AliveRing::with_cursors(5, 3, 1, 3);
        assert!(ring.is_wrapped());
        let (head, tail) = ring.segments();
        assert_eq!(head, 3..5);
        assert_eq!(tail, Some(0..1));
        assert_eq!(ring.slots().collect::<Vec<_>>(), vec![3, 4, 0]);
    }

    #[test]
    fn wrapped_region_draws_low_slots_then_high_slots() {
        let ring = AliveRing::with_cursors(5, 3, 1, 3);
        assert_eq!(ring.index_ranges(6), [Some(0..6), Some(18..30)]);
    }

    #[test]
    fn contiguous_region_draws_once() {
        let ring = AliveRing::with_cursors(8, 2, 5, 3);
        assert_eq!(ring.index_ranges(6), [Some(12..30), None]);
    }

    #[test]
    fn region_ending_at_capacity_is_one_range() {
        let ring = AliveRing::with_cursors(5, 3, 0, 2);
        assert!(!ring.is_wrapped());
        assert_eq!(ring.index_ranges(6), [Some(18..30), None]);
    }

    #[test]
    fn empty_region_draws_nothing() {
        assert_eq!(AliveRing::new(5).index_ranges(6), [None, None]);
    }

    #[test]
    fn full_ring_from_zero_is_one_segment() {
        let mut ring = AliveRing::new(4);
        for _ in 0..4 {
            ring.claim();
        }
        assert!(ring.is_full());
        assert!(!ring.is_wrapped());
        assert_eq!(ring.segments(), (0..4, None));
    }

    #[test]
    fn full_ring_off_zero_wraps() {
        let mut ring = AliveRing::new(4);
        ring.claim();
        ring.retire_front();
        for _ in 0..4 {
            ring.claim();
        }
        assert!(ring.is_full());
        assert_eq!(ring.first_alive(), 1);
        assert_eq!(ring.first_dead(), 1);
        assert_eq!(ring.slots().collect::<Vec<_>>(), vec![1, 2, 3, 0]);
    }

    #[test]
    fn cursors_cycle_through_every_slot() {
        let mut ring = AliveRing::new(3);
        for expected in [0, 1, 2, 0, 1, 2, 0] {
            assert_eq!(ring.claim(), Some(expected));
            ring.retire_front();
        }
        assert!(ring.is_empty());
    }
}
