//! Birth/survival predicates.
//!
//! A predicate decides whether a dead cell is born, or a live cell survives,
//! from its neighbourhood. Range-parameterized families use a [`CountSet`]
//! indexed by neighbour count; fixed small neighbourhoods (MAP rules,
//! non-totalistic letters) use a [`PatternSet`] keyed by the packed
//! neighbour-bit pattern.

use serde::{Deserialize, Serialize};

/// A set of admissible neighbour counts over `0..=max`.
///
/// Backed by a bitset sized exactly `max + 1`; inserting or querying a count
/// above `max` never succeeds, which is how the compiler enforces the
/// "no count above `max_neighbours`" invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountSet {
    bits: Vec<u64>,
    max: u32,
}

impl CountSet {
    /// Creates an empty set admitting counts in `0..=max`.
    #[must_use]
    pub fn new(max: u32) -> Self {
        let words = (max as usize + 64) / 64;
        Self {
            bits: vec![0; words.max(1)],
            max,
        }
    }

    /// Largest admissible count.
    #[must_use]
    pub fn max(&self) -> u32 {
        self.max
    }

    /// Inserts `count`, returning false when it is above the maximum.
    pub fn try_insert(&mut self, count: u32) -> bool {
        if count > self.max {
            return false;
        }
        self.bits[(count / 64) as usize] |= 1u64 << (count % 64);
        true
    }

    /// Inserts the inclusive span `lo..=hi`, returning false if `hi` is
    /// above the maximum.
    pub fn try_insert_span(&mut self, lo: u32, hi: u32) -> bool {
        if hi > self.max || lo > hi {
            return false;
        }
        for c in lo..=hi {
            self.try_insert(c);
        }
        true
    }

    /// Whether `count` is admitted.
    #[must_use]
    pub fn contains(&self, count: u32) -> bool {
        if count > self.max {
            return false;
        }
        self.bits[(count / 64) as usize] & (1u64 << (count % 64)) != 0
    }

    /// Number of admitted counts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// True when no count is admitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|w| *w == 0)
    }

    /// Iterates the admitted counts in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        (0..=self.max).filter(|c| self.contains(*c))
    }

    /// Collapses the set into maximal contiguous `(lo, hi)` spans.
    #[must_use]
    pub fn spans(&self) -> Vec<(u32, u32)> {
        let mut spans = Vec::new();
        let mut current: Option<(u32, u32)> = None;
        for c in self.iter() {
            match current {
                Some((lo, hi)) if c == hi + 1 => current = Some((lo, c)),
                Some(span) => {
                    spans.push(span);
                    current = Some((c, c));
                }
                None => current = Some((c, c)),
            }
        }
        if let Some(span) = current {
            spans.push(span);
        }
        spans
    }

    /// True when the set is a single contiguous span (or empty).
    #[must_use]
    pub fn is_contiguous(&self) -> bool {
        self.spans().len() <= 1
    }
}

/// Membership table over packed neighbour-bit patterns.
///
/// For the Moore range-1 neighbourhood the pattern is an 8-bit ring mask
/// (see [`crate::orbits`]); hexagonal and von Neumann MAP rules use 6- and
/// 4-bit patterns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternSet {
    bits: Vec<u64>,
    pattern_bits: u32,
}

impl PatternSet {
    /// Creates an empty set over `2^pattern_bits` patterns.
    #[must_use]
    pub fn new(pattern_bits: u32) -> Self {
        let entries = 1usize << pattern_bits;
        Self {
            bits: vec![0; entries.div_ceil(64)],
            pattern_bits,
        }
    }

    /// Number of neighbour bits per pattern.
    #[must_use]
    pub fn pattern_bits(&self) -> u32 {
        self.pattern_bits
    }

    /// Marks `pattern` as admitted.
    pub fn insert(&mut self, pattern: u16) {
        let p = pattern as usize;
        self.bits[p / 64] |= 1u64 << (p % 64);
    }

    /// Whether `pattern` is admitted.
    #[must_use]
    pub fn contains(&self, pattern: u16) -> bool {
        let p = pattern as usize;
        self.bits[p / 64] & (1u64 << (p % 64)) != 0
    }

    /// Number of admitted patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// True when no pattern is admitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|w| *w == 0)
    }
}

/// Compiled form of one birth or survival predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RulePredicate {
    /// Boolean array indexed by neighbour count.
    Counts(CountSet),
    /// Membership table over packed neighbour-bit patterns.
    Patterns(PatternSet),
}

impl RulePredicate {
    /// Whether the predicate admits a zero-neighbour birth/survival.
    ///
    /// Alternating rule pairs reject any half for which this holds on the
    /// birth side.
    #[must_use]
    pub fn admits_zero(&self) -> bool {
        match self {
            RulePredicate::Counts(set) => set.contains(0),
            RulePredicate::Patterns(set) => set.contains(0),
        }
    }
}
