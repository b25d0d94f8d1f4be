//! Symbol sets: the ordered variable universe of a polynomial.

use std::collections::{BTreeSet, HashSet};
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};
use smartstring::alias::String as SmartString;

use crate::error::PolyError;
use crate::poly::{MonomialKey, INLINED_EXPONENTS};

/// An ordered set of unique symbol names.
///
/// The symbols are always sorted lexicographically, so that the position of a
/// symbol is the position of its exponent in a monomial key. The names are
/// shared by reference and never mutated: operations that change the set
/// return a new one. Sets are serialized as a list of names and deserialized
/// through [`SymbolSet::new`].
#[derive(Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct SymbolSet {
    symbols: Arc<Vec<SmartString>>,
}

impl From<Vec<String>> for SymbolSet {
    fn from(names: Vec<String>) -> Self {
        SymbolSet::new(names)
    }
}

impl From<SymbolSet> for Vec<String> {
    fn from(set: SymbolSet) -> Self {
        set.to_vec()
    }
}

impl SymbolSet {
    /// Create a symbol set from a collection of names, sorting them and
    /// removing duplicates.
    pub fn new<I, S>(names: I) -> SymbolSet
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut symbols: Vec<SmartString> = names.into_iter().map(|s| s.as_ref().into()).collect();
        symbols.sort_unstable();
        symbols.dedup();
        SymbolSet {
            symbols: Arc::new(symbols),
        }
    }

    /// The empty symbol set.
    pub fn empty() -> SymbolSet {
        SymbolSet::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Get the position of `name` in the set.
    #[inline]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.symbols.binary_search_by(|s| s.as_str().cmp(name)).ok()
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// Get the name at position `index`.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.symbols.get(index).map(|s| s.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.symbols.iter().map(|s| s.as_str())
    }

    /// Copy the names into a list.
    pub fn to_vec(&self) -> Vec<String> {
        self.iter().map(|s| s.to_owned()).collect()
    }

    /// Returns `true` if both sets share the same storage or have the same names.
    #[inline]
    pub fn same_as(&self, other: &SymbolSet) -> bool {
        Arc::ptr_eq(&self.symbols, &other.symbols) || self.symbols == other.symbols
    }

    /// The union of two symbol sets.
    pub fn union(&self, other: &SymbolSet) -> SymbolSet {
        self.merge(other).0
    }

    /// Compute the union of two symbol sets, together with the position of
    /// every symbol of `self` and `other` in the union.
    pub fn merge(&self, other: &SymbolSet) -> (SymbolSet, Vec<usize>, Vec<usize>) {
        if self.same_as(other) {
            let pos: Vec<usize> = (0..self.len()).collect();
            return (self.clone(), pos.clone(), pos);
        }

        let mut merged = Vec::with_capacity(self.len() + other.len());
        let mut pos_a = Vec::with_capacity(self.len());
        let mut pos_b = Vec::with_capacity(other.len());

        let (mut i, mut j) = (0, 0);
        while i < self.len() || j < other.len() {
            let next = match (self.symbols.get(i), other.symbols.get(j)) {
                (Some(a), Some(b)) => a.cmp(b),
                (Some(_), None) => std::cmp::Ordering::Less,
                _ => std::cmp::Ordering::Greater,
            };

            match next {
                std::cmp::Ordering::Less => {
                    pos_a.push(merged.len());
                    merged.push(self.symbols[i].clone());
                    i += 1;
                }
                std::cmp::Ordering::Greater => {
                    pos_b.push(merged.len());
                    merged.push(other.symbols[j].clone());
                    j += 1;
                }
                std::cmp::Ordering::Equal => {
                    pos_a.push(merged.len());
                    pos_b.push(merged.len());
                    merged.push(self.symbols[i].clone());
                    i += 1;
                    j += 1;
                }
            }
        }

        (
            SymbolSet {
                symbols: Arc::new(merged),
            },
            pos_a,
            pos_b,
        )
    }

    /// The symbols of `self` that are not in `other`.
    pub fn difference(&self, other: &SymbolSet) -> SymbolSet {
        SymbolSet {
            symbols: Arc::new(
                self.symbols
                    .iter()
                    .filter(|s| !other.contains(s))
                    .cloned()
                    .collect(),
            ),
        }
    }

    /// The symbols present in both sets.
    pub fn intersection(&self, other: &SymbolSet) -> SymbolSet {
        SymbolSet {
            symbols: Arc::new(
                self.symbols
                    .iter()
                    .filter(|s| other.contains(s))
                    .cloned()
                    .collect(),
            ),
        }
    }

    /// Get the positions in `new_set` of every symbol of `self`.
    pub fn positions_in(&self, new_set: &SymbolSet) -> Result<Vec<usize>, PolyError> {
        self.iter()
            .map(|s| {
                new_set.index_of(s).ok_or_else(|| {
                    PolyError::Value(format!(
                        "the symbol '{}' is not in the target symbol set {}",
                        s, new_set
                    ))
                })
            })
            .collect()
    }

    /// A mask over `self` that is `true` for every symbol in `selection`.
    pub fn mask(&self, selection: &SymbolSet) -> SmallVec<[bool; INLINED_EXPONENTS]> {
        self.iter().map(|s| selection.contains(s)).collect()
    }

    /// Remap a key from the symbol set `old_set` to `new_set`, which must contain
    /// every symbol of `old_set`. The exponents of new symbols are zero.
    pub fn extend_key<K: MonomialKey>(
        key: &K,
        old_set: &SymbolSet,
        new_set: &SymbolSet,
    ) -> Result<K, PolyError> {
        let positions = old_set.positions_in(new_set)?;
        remap_key(key, old_set.len(), &positions, new_set.len())
    }
}

/// Place exponent `i` of `key` at position `positions[i]` of a new key with
/// `new_nvars` exponents.
pub(crate) fn remap_key<K: MonomialKey>(
    key: &K,
    nvars: usize,
    positions: &[usize],
    new_nvars: usize,
) -> Result<K, PolyError> {
    debug_assert_eq!(nvars, positions.len());

    let old = key.exponents(nvars);
    let mut new: SmallVec<[i64; INLINED_EXPONENTS]> = smallvec![0; new_nvars];
    for (e, p) in old.iter().zip(positions) {
        new[*p] = *e;
    }

    K::from_exponents(&new)
}

impl Display for SymbolSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("{")?;
        for (i, s) in self.symbols.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "'{}'", s)?;
        }
        f.write_str("}")
    }
}

impl std::fmt::Debug for SymbolSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

/// Conversion of the various shapes in which a collection of symbols can be
/// given into a [`SymbolSet`]. A single string is one symbol.
pub trait IntoSymbolSet {
    fn into_symbol_set(self) -> SymbolSet;
}

impl IntoSymbolSet for SymbolSet {
    fn into_symbol_set(self) -> SymbolSet {
        self
    }
}

impl IntoSymbolSet for &SymbolSet {
    fn into_symbol_set(self) -> SymbolSet {
        self.clone()
    }
}

impl IntoSymbolSet for &str {
    fn into_symbol_set(self) -> SymbolSet {
        SymbolSet::new([self])
    }
}

impl IntoSymbolSet for String {
    fn into_symbol_set(self) -> SymbolSet {
        SymbolSet::new([self])
    }
}

impl<S: AsRef<str>> IntoSymbolSet for &[S] {
    fn into_symbol_set(self) -> SymbolSet {
        SymbolSet::new(self)
    }
}

impl<S: AsRef<str>, const N: usize> IntoSymbolSet for [S; N] {
    fn into_symbol_set(self) -> SymbolSet {
        SymbolSet::new(self)
    }
}

impl<S: AsRef<str>> IntoSymbolSet for Vec<S> {
    fn into_symbol_set(self) -> SymbolSet {
        SymbolSet::new(self)
    }
}

impl<S: AsRef<str>, H> IntoSymbolSet for HashSet<S, H> {
    fn into_symbol_set(self) -> SymbolSet {
        SymbolSet::new(self)
    }
}

impl<S: AsRef<str>, H> IntoSymbolSet for &HashSet<S, H> {
    fn into_symbol_set(self) -> SymbolSet {
        SymbolSet::new(self)
    }
}

impl<S: AsRef<str>> IntoSymbolSet for BTreeSet<S> {
    fn into_symbol_set(self) -> SymbolSet {
        SymbolSet::new(self)
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use serde::de::value::{Error, SeqDeserializer};
    use serde::Deserialize;

    use super::{IntoSymbolSet, SymbolSet};
    use crate::poly::{monomial::DPackedMonomial, MonomialKey};

    #[test]
    fn sorted_and_unique() {
        let s = SymbolSet::new(["z", "x", "y", "x"]);
        assert_eq!(s.to_vec(), vec!["x", "y", "z"]);
        assert_eq!(s.index_of("y"), Some(1));
        assert_eq!(s.index_of("w"), None);

        let h: HashSet<&str> = ["y", "x"].into_iter().collect();
        assert_eq!(h.into_symbol_set().to_vec(), vec!["x", "y"]);
        assert_eq!("x".into_symbol_set().to_vec(), vec!["x"]);
    }

    #[test]
    fn deserialize_sorts() {
        let names = vec!["z", "a", "z"];
        let s = SymbolSet::deserialize(SeqDeserializer::<_, Error>::new(names.into_iter())).unwrap();
        assert_eq!(s.len(), 2);
        assert_eq!(s.to_vec(), vec!["a", "z"]);
        assert_eq!(s.index_of("a"), Some(0));
        assert_eq!(s.index_of("z"), Some(1));

        let (u, pa, pb) = s.merge(&SymbolSet::new(["b", "z"]));
        assert_eq!(u.to_vec(), vec!["a", "b", "z"]);
        assert_eq!(pa, vec![0, 2]);
        assert_eq!(pb, vec![1, 2]);

        let names: Vec<String> = s.clone().into();
        assert_eq!(SymbolSet::from(names), s);
    }

    #[test]
    fn merge_positions() {
        let a = SymbolSet::new(["b", "d"]);
        let b = SymbolSet::new(["a", "b", "c"]);
        let (u, pa, pb) = a.merge(&b);
        assert_eq!(u.to_vec(), vec!["a", "b", "c", "d"]);
        assert_eq!(pa, vec![1, 3]);
        assert_eq!(pb, vec![0, 1, 2]);
    }

    #[test]
    fn extend() {
        let old = SymbolSet::new(["x", "z"]);
        let new = SymbolSet::new(["x", "y", "z"]);
        let k = DPackedMonomial::from_exponents(&[2, -1]).unwrap();
        let e = SymbolSet::extend_key(&k, &old, &new).unwrap();
        assert_eq!(e.exponents(3).as_slice(), &[2, 0, -1]);

        assert!(SymbolSet::extend_key(&e, &new, &old).is_err());
    }
}
