//! Visit-sequence numbers for de-duplicating graph walks.
//!
//! A walk begins by drawing a fresh sequence number; an element has been
//! visited in the current walk iff its stamp equals that number. This avoids
//! clearing a "visited" set before every walk.

use crate::ElementIndex;

/// A monotonically increasing visit sequence number.
///
/// The zero value is never handed out, so freshly allocated stamps never
/// compare equal to a live walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SequenceNumber(u32);

impl SequenceNumber {
    /// The stamp of an element that was never visited.
    pub const NONE: Self = Self(0);

    /// Returns the number following this one, or `None` on wrap-around.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(n) => Some(Self(n)),
            None => None,
        }
    }

    /// Returns the raw value of the sequence number.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

/// A sequence counter paired with one stamp per element.
#[derive(Debug, Clone, Default)]
pub struct VisitTracker {
    /// The number of the current walk.
    current: SequenceNumber,
    /// The number of the walk that last visited each element.
    stamps: Vec<SequenceNumber>,
}

impl VisitTracker {
    /// Creates a tracker for `len` elements, none of them visited.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            current: SequenceNumber::NONE,
            stamps: vec![SequenceNumber::NONE; len],
        }
    }

    /// The number of elements tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    /// Whether the tracker covers no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }

    /// The number of the current walk.
    #[must_use]
    pub const fn current(&self) -> SequenceNumber {
        self.current
    }

    /// Starts a new walk and returns its number.
    ///
    /// When the counter wraps around all stamps are reset, so stale stamps can
    /// never alias the new walk.
    pub fn begin(&mut self) -> SequenceNumber {
        self.current = if let Some(next) = self.current.next() {
            next
        } else {
            self.stamps.fill(SequenceNumber::NONE);
            SequenceNumber(1)
        };
        self.current
    }

    /// Stamps `i` with the current walk.
    ///
    /// # Returns
    ///
    /// * `true` if `i` had not been visited in the current walk.
    /// * `false` if it had.
    pub fn visit(&mut self, i: ElementIndex) -> bool {
        let stamp = &mut self.stamps[i as usize];
        if *stamp == self.current {
            false
        } else {
            *stamp = self.current;
            true
        }
    }

    /// Whether `i` was visited in the current walk.
    #[must_use]
    pub fn is_visited(&self, i: ElementIndex) -> bool {
        self.stamps[i as usize] == self.current
    }

    /// The number of the walk that last visited `i`.
    #[must_use]
    pub fn last_visit(&self, i: ElementIndex) -> SequenceNumber {
        self.stamps[i as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::{SequenceNumber, VisitTracker};

    #[test]
    fn walks_are_independent() {
        let mut tracker = VisitTracker::new(4);
        let first = tracker.begin();
        assert!(tracker.visit(1), "First visit should be new");
        assert!(!tracker.visit(1), "Second visit should be a repeat");
        assert!(tracker.is_visited(1));
        assert!(!tracker.is_visited(2));

        let second = tracker.begin();
        assert!(second > first);
        assert!(!tracker.is_visited(1), "A new walk should forget old stamps");
        assert_eq!(tracker.last_visit(1), first);
    }

    #[test]
    fn wrap_around_resets_stamps() {
        let mut tracker = VisitTracker {
            current: SequenceNumber(u32::MAX - 1),
            stamps: vec![SequenceNumber::NONE; 2],
        };
        tracker.begin();
        assert!(tracker.visit(0));
        assert_eq!(tracker.current(), SequenceNumber(u32::MAX));

        let wrapped = tracker.begin();
        assert_eq!(wrapped.value(), 1);
        assert!(!tracker.is_visited(0), "Wrapped walk should not see stale stamps");
        assert_eq!(tracker.last_visit(0), SequenceNumber::NONE);
    }
}
