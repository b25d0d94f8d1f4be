//! Segmented hash tables of terms.
//!
//! A [`TermTable`] maps monomial keys to coefficients. The table is split into
//! `2^bits` segments, and the segment of a key is determined by a hash of the
//! key that is independent of the hash used inside the segment. Products are
//! computed in parallel by filling every segment on its own worker.
//!
//! All hashers use fixed seeds, so that the iteration order of a table only
//! depends on the sequence of operations that built it.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::hash::Hash;

use ahash::RandomState;

use crate::domains::Ring;

const TERM_SEEDS: [u64; 4] = [
    0x243f_6a88_85a3_08d3,
    0x1319_8a2e_0370_7344,
    0xa409_3822_299f_31d0,
    0x082e_fa98_ec4e_6c89,
];
const SEGMENT_SEEDS: [u64; 4] = [
    0x4528_21e6_38d0_1377,
    0xbe54_66cf_34e9_0c6c,
    0xc0ac_29b7_c97c_50dd,
    0x3f84_d5b5_b547_0917,
];

#[inline]
fn term_state() -> RandomState {
    RandomState::with_seeds(TERM_SEEDS[0], TERM_SEEDS[1], TERM_SEEDS[2], TERM_SEEDS[3])
}

#[inline]
fn segment_state() -> RandomState {
    RandomState::with_seeds(
        SEGMENT_SEEDS[0],
        SEGMENT_SEEDS[1],
        SEGMENT_SEEDS[2],
        SEGMENT_SEEDS[3],
    )
}

/// A single segment of a [`TermTable`].
pub type Segment<K, C> = HashMap<K, C, RandomState>;

/// Create an empty segment with the fixed term hasher.
#[inline]
pub fn new_segment<K, C>() -> Segment<K, C> {
    HashMap::with_hasher(term_state())
}

/// Get the segment of `key` in a table with `2^bits` segments.
#[inline]
pub fn segment_index<K: Hash>(key: &K, bits: u32) -> usize {
    if bits == 0 {
        0
    } else {
        (segment_state().hash_one(key) >> (64 - bits)) as usize
    }
}

/// A segmented table mapping keys to non-zero coefficients.
#[derive(Clone, Debug)]
pub struct TermTable<K, C> {
    segments: Vec<Segment<K, C>>,
    bits: u32,
}

impl<K: Hash + Eq, C> Default for TermTable<K, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq, C> TermTable<K, C> {
    /// Create an empty table with a single segment.
    pub fn new() -> Self {
        Self::with_segment_bits(0)
    }

    /// Create an empty table with `2^bits` segments.
    pub fn with_segment_bits(bits: u32) -> Self {
        TermTable {
            segments: (0..1usize << bits).map(|_| new_segment()).collect(),
            bits,
        }
    }

    /// Create a table from segments that were filled according to [`segment_index`].
    pub(crate) fn from_segments(segments: Vec<Segment<K, C>>, bits: u32) -> Self {
        debug_assert_eq!(segments.len(), 1 << bits);
        TermTable { segments, bits }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.segments.iter().map(|s| s.len()).sum()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.iter().all(|s| s.is_empty())
    }

    #[inline]
    pub fn segment_bits(&self) -> u32 {
        self.bits
    }

    #[inline]
    pub fn nsegments(&self) -> usize {
        self.segments.len()
    }

    pub fn segments(&self) -> &[Segment<K, C>] {
        &self.segments
    }

    /// The total number of slots allocated by all segments.
    pub fn capacity(&self) -> usize {
        self.segments.iter().map(|s| s.capacity()).sum()
    }

    #[inline]
    fn segment(&self, key: &K) -> &Segment<K, C> {
        &self.segments[segment_index(key, self.bits)]
    }

    #[inline]
    fn segment_mut(&mut self, key: &K) -> &mut Segment<K, C> {
        let i = segment_index(key, self.bits);
        &mut self.segments[i]
    }

    #[inline]
    pub fn get(&self, key: &K) -> Option<&C> {
        self.segment(key).get(key)
    }

    #[inline]
    pub fn contains_key(&self, key: &K) -> bool {
        self.segment(key).contains_key(key)
    }

    /// Insert a term, overwriting an existing coefficient.
    /// The caller must make sure that `coeff` is not zero.
    #[inline]
    pub fn insert(&mut self, key: K, coeff: C) -> Option<C> {
        self.segment_mut(&key).insert(key, coeff)
    }

    #[inline]
    pub fn remove(&mut self, key: &K) -> Option<C> {
        self.segment_mut(key).remove(key)
    }

    /// Add a term to the table, merging it with an existing term with the
    /// same key. Terms whose coefficient becomes zero are removed.
    pub fn add_term<R: Ring<Element = C>>(&mut self, ring: &R, key: K, coeff: C) {
        if R::is_zero(&coeff) {
            return;
        }

        add_to_segment(self.segment_mut(&key), ring, key, coeff);
    }

    /// Subtract a term from the table.
    pub fn sub_term<R: Ring<Element = C>>(&mut self, ring: &R, key: K, coeff: &C) {
        if R::is_zero(coeff) {
            return;
        }

        let seg = self.segment_mut(&key);
        match seg.get_mut(&key) {
            Some(c) => {
                ring.sub_assign(c, coeff);
                if R::is_zero(c) {
                    seg.remove(&key);
                }
            }
            None => {
                seg.insert(key, ring.neg(coeff));
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &C)> {
        self.segments.iter().flat_map(|s| s.iter())
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.segments.iter().flat_map(|s| s.keys())
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut C> {
        self.segments.iter_mut().flat_map(|s| s.values_mut())
    }

    /// Keep only the terms for which `f` returns `true`.
    pub fn retain<F: FnMut(&K, &mut C) -> bool>(&mut self, mut f: F) {
        for s in &mut self.segments {
            s.retain(|k, c| f(k, c));
        }
    }

    pub fn clear(&mut self) {
        for s in &mut self.segments {
            s.clear();
        }
    }

    /// Get the terms sorted in descending key order.
    pub fn sorted_desc(&self) -> Vec<(&K, &C)>
    where
        K: Ord,
    {
        let mut terms: Vec<_> = self.iter().collect();
        terms.sort_unstable_by(|a, b| b.0.cmp(a.0));
        terms
    }

    /// Compute the occupancy statistics of the table.
    pub fn stats(&self) -> TableStats {
        let sizes = self.segments.iter().map(|s| s.len());
        TableStats {
            terms: self.len(),
            segments: self.nsegments(),
            capacity: self.capacity(),
            min_segment: sizes.clone().min().unwrap_or(0),
            max_segment: sizes.max().unwrap_or(0),
        }
    }
}

impl<K: Hash + Eq, C> IntoIterator for TermTable<K, C> {
    type Item = (K, C);
    type IntoIter = std::iter::Flatten<std::vec::IntoIter<Segment<K, C>>>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.into_iter().flatten()
    }
}

impl<K: Hash + Eq, C: PartialEq> PartialEq for TermTable<K, C> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, c)| other.get(k) == Some(c))
    }
}

/// Add `coeff` to the coefficient of `key` in a single segment.
#[inline]
pub(crate) fn add_to_segment<K: Hash + Eq, R: Ring>(
    seg: &mut Segment<K, R::Element>,
    ring: &R,
    key: K,
    coeff: R::Element,
) {
    match seg.get_mut(&key) {
        Some(c) => {
            ring.add_assign(c, &coeff);
            if R::is_zero(c) {
                seg.remove(&key);
            }
        }
        None => {
            seg.insert(key, coeff);
        }
    }
}

/// Add `a * b` to the coefficient of `key` in a single segment.
#[inline]
pub(crate) fn add_mul_to_segment<K: Hash + Eq, R: Ring>(
    seg: &mut Segment<K, R::Element>,
    ring: &R,
    key: K,
    a: &R::Element,
    b: &R::Element,
) {
    match seg.get_mut(&key) {
        Some(c) => {
            ring.add_mul_assign(c, a, b);
            if R::is_zero(c) {
                seg.remove(&key);
            }
        }
        None => {
            let c = ring.mul(a, b);
            if !R::is_zero(&c) {
                seg.insert(key, c);
            }
        }
    }
}

/// Occupancy statistics of a [`TermTable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TableStats {
    pub terms: usize,
    pub segments: usize,
    pub capacity: usize,
    pub min_segment: usize,
    pub max_segment: usize,
}

impl TableStats {
    /// The ratio of the number of terms to the number of allocated slots.
    pub fn load_factor(&self) -> f64 {
        if self.capacity == 0 {
            0.
        } else {
            self.terms as f64 / self.capacity as f64
        }
    }
}

impl Display for TableStats {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Number of terms : {}", self.terms)?;
        writeln!(f, "Table segments  : {}", self.segments)?;
        writeln!(f, "Total capacity  : {}", self.capacity)?;
        writeln!(f, "Load factor     : {:.4}", self.load_factor())?;
        writeln!(f, "Smallest segment: {}", self.min_segment)?;
        write!(f, "Largest segment : {}", self.max_segment)
    }
}

#[cfg(test)]
mod test {
    use rug::Integer;

    use super::{segment_index, TermTable};
    use crate::domains::integer::Z;

    #[test]
    fn merge_and_cancel() {
        let mut t = TermTable::new();
        t.add_term(&Z, 1u64, Integer::from(3));
        t.add_term(&Z, 2u64, Integer::from(1));
        t.add_term(&Z, 1u64, Integer::from(-3));
        t.add_term(&Z, 5u64, Integer::from(0));

        assert_eq!(t.len(), 1);
        assert_eq!(t.get(&2), Some(&Integer::from(1)));
        assert!(!t.contains_key(&5));

        t.sub_term(&Z, 2u64, &Integer::from(1));
        assert!(t.is_empty());
    }

    #[test]
    fn segments() {
        let mut t = TermTable::with_segment_bits(3);
        for k in 0..100u64 {
            t.add_term(&Z, k, Integer::from(k + 1));
        }

        assert_eq!(t.nsegments(), 8);
        assert_eq!(t.len(), 100);
        for (i, s) in t.segments().iter().enumerate() {
            assert!(s.keys().all(|k| segment_index(k, 3) == i));
        }

        let stats = t.stats();
        assert_eq!(stats.terms, 100);
        assert!(stats.min_segment <= stats.max_segment);
        assert!(stats.load_factor() > 0. && stats.load_factor() <= 1.);
        assert!(stats.to_string().contains("Number of terms : 100"));

        let sorted = t.sorted_desc();
        assert_eq!(*sorted[0].0, 99);
        assert_eq!(*sorted[99].0, 0);
    }

    #[test]
    fn deterministic_order() {
        let build = || {
            let mut t = TermTable::new();
            for k in [17u64, 3, 99, 42, 8] {
                t.add_term(&Z, k, Integer::from(1));
            }
            t.keys().copied().collect::<Vec<_>>()
        };

        assert_eq!(build(), build());
    }
}
