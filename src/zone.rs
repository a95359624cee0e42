//! Zone keys: which ellipses a region of the plane lies inside.
//!
//! A zone is identified by a bitmask over ellipse indices. Ellipses are
//! indexed in global contour order, so iterating set bits from low to high
//! yields labels in the canonical display order.

use std::fmt;

/// Maximum number of ellipses a `ZoneKey` can describe.
pub const MAX_ELLIPSES: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ZoneKey(u64);

impl ZoneKey {
    /// The zone outside every ellipse.
    pub const EMPTY: ZoneKey = ZoneKey(0);

    pub fn from_bits(bits: u64) -> Self {
        ZoneKey(bits)
    }

    pub fn from_indices<I: IntoIterator<Item = usize>>(indices: I) -> Self {
        let mut key = ZoneKey::EMPTY;
        for i in indices {
            key.insert(i);
        }
        key
    }

    pub fn single(index: usize) -> Self {
        ZoneKey(1 << index)
    }

    pub fn bits(self) -> u64 {
        self.0
    }

    pub fn insert(&mut self, index: usize) {
        debug_assert!(index < MAX_ELLIPSES);
        self.0 |= 1 << index;
    }

    pub fn contains(self, index: usize) -> bool {
        index < MAX_ELLIPSES && self.0 & (1 << index) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn union(self, other: ZoneKey) -> ZoneKey {
        ZoneKey(self.0 | other.0)
    }

    pub fn intersection(self, other: ZoneKey) -> ZoneKey {
        ZoneKey(self.0 & other.0)
    }

    /// Labels in `self` that are not in `other`.
    pub fn difference(self, other: ZoneKey) -> ZoneKey {
        ZoneKey(self.0 & !other.0)
    }

    pub fn is_subset_of(self, other: ZoneKey) -> bool {
        self.0 & !other.0 == 0
    }

    /// Ellipse indices in ascending order.
    pub fn indices(self) -> Indices {
        Indices(self.0)
    }

    /// Comma-joined labels, e.g. `"a,c"`. Labels are looked up by index.
    pub fn display<'a>(self, labels: &'a [String]) -> ZoneDisplay<'a> {
        ZoneDisplay { key: self, labels }
    }
}

pub struct Indices(u64);

impl Iterator for Indices {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.0 == 0 {
            return None;
        }
        let i = self.0.trailing_zeros() as usize;
        self.0 &= self.0 - 1;
        Some(i)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.0.count_ones() as usize;
        (n, Some(n))
    }
}

pub struct ZoneDisplay<'a> {
    key: ZoneKey,
    labels: &'a [String],
}

impl fmt::Display for ZoneDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (n, i) in self.key.indices().enumerate() {
            if n > 0 {
                f.write_str(",")?;
            }
            match self.labels.get(i) {
                Some(label) => f.write_str(label)?,
                None => write!(f, "#{i}")?,
            }
        }
        Ok(())
    }
}
