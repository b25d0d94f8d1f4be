//! Sparse multivariate Laurent polynomials and truncated power series.
//!
//! A polynomial is a table of terms that maps a [monomial key](MonomialKey)
//! to a coefficient of a [ring](crate::domains::Ring), together with the
//! [symbol set](crate::symbols::SymbolSet) that gives a name to every exponent
//! in the keys.

pub mod derivative;
pub mod evaluate;
pub mod monomial;
pub mod polynomial;
pub mod series;
pub mod table;

use std::fmt::Debug;
use std::hash::Hash;

use smallvec::{smallvec, SmallVec};

use crate::error::PolyError;

/// The number of exponents that are stored on the stack when a key is unpacked.
pub const INLINED_EXPONENTS: usize = 6;

/// A monomial: a list of signed exponents, one per symbol, packed into an
/// integer representation.
///
/// The number of symbols is not stored in the key, it is always provided by
/// the caller. Keys of the same length are ordered lexicographically by their
/// exponents. The default key is the key without symbols.
pub trait MonomialKey:
    Clone + Default + PartialEq + Eq + Hash + Ord + Debug + Send + Sync + 'static
{
    /// The name of the key type.
    const NAME: &'static str;
    /// The tag that identifies the key type in serialized polynomials.
    const TAG: u8;

    /// Returns `true` if keys of this type can hold `nvars` exponents.
    fn is_compatible(nvars: usize) -> bool;

    /// Pack a list of exponents. Fails with [`PolyError::Overflow`] if an
    /// exponent does not fit in the encoding.
    fn from_exponents(exponents: &[i64]) -> Result<Self, PolyError>;

    /// Write the `nvars` exponents of the key into `out`.
    fn unpack(&self, nvars: usize, out: &mut [i64]);

    /// An estimate of the number of bytes used by the key.
    fn byte_size(&self) -> usize;

    /// The key with all `nvars` exponents set to zero.
    fn unit(nvars: usize) -> Result<Self, PolyError> {
        let zeros: SmallVec<[i64; INLINED_EXPONENTS]> = smallvec![0; nvars];
        Self::from_exponents(&zeros)
    }

    #[inline]
    fn exponents(&self, nvars: usize) -> SmallVec<[i64; INLINED_EXPONENTS]> {
        let mut e = smallvec![0; nvars];
        self.unpack(nvars, &mut e);
        e
    }

    /// Multiply two monomials by adding their exponents.
    fn multiply(&self, other: &Self, nvars: usize) -> Result<Self, PolyError> {
        let mut a = self.exponents(nvars);
        let b = other.exponents(nvars);
        for (x, y) in a.iter_mut().zip(&b) {
            *x = x.checked_add(*y).ok_or_else(|| {
                PolyError::Overflow("the sum of two exponents does not fit in 64 bits".into())
            })?;
        }
        Self::from_exponents(&a)
    }

    /// Raise the monomial to the power `n` by multiplying every exponent by `n`.
    fn scale(&self, n: i64, nvars: usize) -> Result<Self, PolyError> {
        let mut a = self.exponents(nvars);
        for x in &mut a {
            let old = *x;
            *x = old.checked_mul(n).ok_or_else(|| {
                PolyError::Overflow(format!(
                    "the exponent {} times {} does not fit in 64 bits",
                    old, n
                ))
            })?;
        }
        Self::from_exponents(&a)
    }

    /// The sum of the exponents.
    fn degree(&self, nvars: usize) -> i64 {
        self.exponents(nvars).iter().sum()
    }

    /// The sum of the exponents for which `mask` is `true`.
    fn partial_degree(&self, mask: &[bool], nvars: usize) -> i64 {
        if !mask.iter().any(|m| *m) {
            return 0;
        }

        self.exponents(nvars)
            .iter()
            .zip(mask)
            .filter_map(|(e, m)| if *m { Some(*e) } else { None })
            .sum()
    }

    /// Returns `true` if every exponent is zero.
    fn is_unitary(&self, nvars: usize) -> bool {
        self.exponents(nvars).iter().all(|e| *e == 0)
    }

    /// Differentiate with respect to the symbol at position `var`, returning
    /// the multiplier (the original exponent) and the new key.
    fn differentiate(&self, var: usize, nvars: usize) -> Result<(i64, Self), PolyError> {
        let mut e = self.exponents(nvars);
        let m = e[var];
        e[var] = m
            .checked_sub(1)
            .ok_or_else(|| PolyError::Overflow(format!("the exponent {} cannot be lowered", m)))?;
        Ok((m, Self::from_exponents(&e)?))
    }

    /// Integrate with respect to the symbol at position `var`, returning the
    /// divisor (the new exponent) and the new key.
    ///
    /// Fails with [`PolyError::InvalidOperation`] if the exponent is `-1`,
    /// whose antiderivative is not a monomial.
    fn integrate(&self, var: usize, nvars: usize) -> Result<(i64, Self), PolyError> {
        let mut e = self.exponents(nvars);
        if e[var] == -1 {
            return Err(PolyError::InvalidOperation(
                "cannot integrate a monomial with an exponent of -1".into(),
            ));
        }

        let m = e[var];
        e[var] = m
            .checked_add(1)
            .ok_or_else(|| PolyError::Overflow(format!("the exponent {} cannot be raised", m)))?;
        Ok((e[var], Self::from_exponents(&e)?))
    }
}
