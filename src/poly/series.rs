//! Truncated multivariate power series.
//!
//! A [`PowerSeries`] is a polynomial together with a truncation level. Every
//! operation drops the terms above the truncation level, and products never
//! compute them in the first place.

use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};
use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::coefficient::Scalar;
use crate::domains::{CoefficientRing, Ring};
use crate::error::PolyError;
use crate::printer::PrintOptions;
use crate::symbols::{IntoSymbolSet, SymbolSet};

use super::polynomial::Polynomial;
use super::{MonomialKey, INLINED_EXPONENTS};

/// The truncation level of a power series.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Truncation {
    /// No truncation.
    #[default]
    None,
    /// Drop the terms with a total degree above the level.
    Total(i64),
    /// Drop the terms with a partial degree in the symbols above the level.
    Partial(i64, SymbolSet),
}

impl Truncation {
    /// Get the truncation of the result of a binary operation.
    ///
    /// A series without truncation adopts the truncation of the other operand.
    /// Truncations of the same kind keep the lowest level. Partial truncations
    /// can only be combined if they have the same symbols.
    pub fn combine(&self, other: &Truncation) -> Result<Truncation, PolyError> {
        match (self, other) {
            (Truncation::None, t) | (t, Truncation::None) => Ok(t.clone()),
            (Truncation::Total(a), Truncation::Total(b)) => Ok(Truncation::Total(*a.min(b))),
            (Truncation::Partial(a, s1), Truncation::Partial(b, s2)) if s1 == s2 => {
                Ok(Truncation::Partial(*a.min(b), s1.clone()))
            }
            _ => Err(PolyError::InvalidOperation(format!(
                "incompatible truncation levels {} and {}",
                self, other
            ))),
        }
    }
}

impl Display for Truncation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Truncation::None => f.write_str("none"),
            Truncation::Total(d) => write!(f, "{}", d),
            Truncation::Partial(d, s) => write!(f, "{}, {}", d, s),
        }
    }
}

/// Decides which monomials survive a truncation, for a fixed symbol set.
struct DegreeFilter {
    degree: i64,
    mask: Option<SmallVec<[bool; INLINED_EXPONENTS]>>,
    nvars: usize,
}

impl DegreeFilter {
    fn new(trunc: &Truncation, symbols: &SymbolSet) -> Option<DegreeFilter> {
        match trunc {
            Truncation::None => None,
            Truncation::Total(d) => Some(DegreeFilter {
                degree: *d,
                mask: None,
                nvars: symbols.len(),
            }),
            Truncation::Partial(d, s) => Some(DegreeFilter {
                degree: *d,
                mask: Some(symbols.mask(s)),
                nvars: symbols.len(),
            }),
        }
    }

    #[inline]
    fn keeps<K: MonomialKey>(&self, key: &K) -> bool {
        match &self.mask {
            None => key.degree(self.nvars) <= self.degree,
            Some(m) => key.partial_degree(m, self.nvars) <= self.degree,
        }
    }
}

/// A multivariate Laurent polynomial truncated at a total or partial degree.
#[derive(Clone)]
pub struct PowerSeries<R: Ring, K: MonomialKey> {
    poly: Polynomial<R, K>,
    trunc: Truncation,
}

impl<R: Ring, K: MonomialKey> PowerSeries<R, K> {
    /// Create the zero series without truncation.
    pub fn new(ring: &R) -> Self {
        PowerSeries {
            poly: Polynomial::new(ring),
            trunc: Truncation::None,
        }
    }

    /// Create a series from a polynomial, dropping the terms above `trunc`.
    pub fn from_polynomial(poly: Polynomial<R, K>, trunc: Truncation) -> Self {
        let mut s = PowerSeries { poly, trunc };
        s.apply_truncation();
        s
    }

    /// Create a constant series in the symbol set `symbols`.
    pub fn constant_in<S: IntoSymbolSet>(
        ring: &R,
        coeff: R::Element,
        symbols: S,
        trunc: Truncation,
    ) -> Result<Self, PolyError> {
        Ok(Self::from_polynomial(
            Polynomial::constant_in(ring, coeff, symbols)?,
            trunc,
        ))
    }

    /// Create one generator series per name, all sharing the symbol set of
    /// the names and the truncation `trunc`.
    pub fn make_series<I, S>(ring: &R, names: I, trunc: Truncation) -> Result<Vec<Self>, PolyError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<S> = names.into_iter().collect();
        let symbols = SymbolSet::new(names.iter().map(|n| n.as_ref()));
        Ok(Polynomial::make_polynomials_in(ring, symbols, names)?
            .into_iter()
            .map(|p| Self::from_polynomial(p, trunc.clone()))
            .collect())
    }

    #[inline]
    pub fn truncation(&self) -> &Truncation {
        &self.trunc
    }

    /// Change the truncation level, dropping the terms above it.
    pub fn set_truncation(&mut self, trunc: Truncation) {
        self.trunc = trunc;
        self.apply_truncation();
    }

    fn apply_truncation(&mut self) {
        match &self.trunc {
            Truncation::None => {}
            Truncation::Total(d) => self.poly.truncate_degree_in_place(*d),
            Truncation::Partial(d, s) => self.poly.truncate_p_degree_in_place(*d, s),
        }
    }

    #[inline]
    pub fn polynomial(&self) -> &Polynomial<R, K> {
        &self.poly
    }

    #[inline]
    pub fn into_polynomial(self) -> Polynomial<R, K> {
        self.poly
    }

    #[inline]
    pub fn nterms(&self) -> usize {
        self.poly.nterms()
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.poly.is_zero()
    }

    #[inline]
    pub fn symbol_set(&self) -> &SymbolSet {
        self.poly.symbol_set()
    }

    pub fn degree(&self) -> i64 {
        self.poly.degree()
    }

    pub fn p_degree<S: IntoSymbolSet>(&self, symbols: S) -> i64 {
        self.poly.p_degree(symbols)
    }

    pub fn table_stats(&self) -> String {
        self.poly.table_stats()
    }

    pub fn checked_add(&self, other: &Self) -> Result<Self, PolyError> {
        let trunc = self.trunc.combine(&other.trunc)?;
        Ok(Self::from_polynomial(
            self.poly.checked_add(&other.poly)?,
            trunc,
        ))
    }

    pub fn checked_sub(&self, other: &Self) -> Result<Self, PolyError> {
        let trunc = self.trunc.combine(&other.trunc)?;
        Ok(Self::from_polynomial(
            self.poly.checked_sub(&other.poly)?,
            trunc,
        ))
    }

    /// Multiply two series. The products of terms above the truncation level
    /// are skipped.
    pub fn checked_mul(&self, other: &Self) -> Result<Self, PolyError> {
        let trunc = self.trunc.combine(&other.trunc)?;
        let (a, b) = self.poly.reconcile(&other.poly)?;

        let poly = match DegreeFilter::new(&trunc, a.symbol_set()) {
            Some(f) => a.mul_filtered(&b, &|k| f.keeps(k))?,
            None => a.checked_mul(&b)?,
        };

        Ok(PowerSeries { poly, trunc })
    }

    /// Compute `self^n`, truncating after every multiplication.
    pub fn pow(&self, n: u64) -> Result<Self, PolyError> {
        let poly = match DegreeFilter::new(&self.trunc, self.poly.symbol_set()) {
            Some(f) => self.poly.pow_filtered(n, &|k| f.keeps(k))?,
            None => self.poly.pow(n)?,
        };

        Ok(PowerSeries {
            poly,
            trunc: self.trunc.clone(),
        })
    }

    /// Differentiate with respect to `symbol`.
    pub fn diff(&self, symbol: &str) -> Result<Self, PolyError> {
        Ok(Self::from_polynomial(
            self.poly.diff(symbol)?,
            self.trunc.clone(),
        ))
    }

    /// Integrate with respect to `symbol`.
    pub fn integrate(&self, symbol: &str) -> Result<Self, PolyError> {
        Ok(Self::from_polynomial(
            self.poly.integrate(symbol)?,
            self.trunc.clone(),
        ))
    }

    pub fn evaluate(&self, map: &HashMap<String, R::Element>) -> Result<R::Element, PolyError> {
        self.poly.evaluate(map)
    }

    fn map_poly<F: FnOnce(&Polynomial<R, K>) -> Result<Polynomial<R, K>, PolyError>>(
        &self,
        f: F,
    ) -> Result<Self, PolyError> {
        Ok(Self::from_polynomial(f(&self.poly)?, self.trunc.clone()))
    }
}

impl<R: CoefficientRing, K: MonomialKey> PowerSeries<R, K> {
    pub fn add_scalar(&self, s: &Scalar) -> Result<Self, PolyError> {
        self.map_poly(|p| p.add_scalar(s))
    }

    pub fn sub_scalar(&self, s: &Scalar) -> Result<Self, PolyError> {
        self.map_poly(|p| p.sub_scalar(s))
    }

    pub fn mul_scalar(&self, s: &Scalar) -> Result<Self, PolyError> {
        self.map_poly(|p| p.mul_scalar(s))
    }

    pub fn div_scalar(&self, s: &Scalar) -> Result<Self, PolyError> {
        self.map_poly(|p| p.div_scalar(s))
    }

    /// Replace symbols by elements of `ring`, keeping the truncation level.
    pub fn subs_with<R2: CoefficientRing>(
        &self,
        map: &HashMap<String, R2::Element>,
        ring: &R2,
    ) -> Result<PowerSeries<R2, K>, PolyError> {
        Ok(PowerSeries::from_polynomial(
            self.poly.subs_with(map, ring)?,
            self.trunc.clone(),
        ))
    }

    pub fn byte_size(&self) -> usize {
        self.poly.byte_size() + std::mem::size_of::<Truncation>()
    }
}

impl<R: Ring, K: MonomialKey> PowerSeries<R, K> {
    /// Format the series, ending with the truncation level.
    pub fn format<W: std::fmt::Write>(&self, opts: &PrintOptions, f: &mut W) -> fmt::Result {
        let suffix = match &self.trunc {
            Truncation::None => return self.poly.format(opts, f),
            Truncation::Total(d) => format!("O({})", d),
            Truncation::Partial(d, s) => format!("O({}, {})", d, s),
        };

        if !self.poly.is_zero() {
            self.poly.format(opts, f)?;
            f.write_char('+')?;
        }
        f.write_str(&suffix)
    }
}

impl<R: Ring, K: MonomialKey> Display for PowerSeries<R, K> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.format(&PrintOptions::from_fmt(f), f)
    }
}

impl<R: Ring, K: MonomialKey> fmt::Debug for PowerSeries<R, K> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.poly, f)?;
        write!(f, "\nTruncation: {}", self.trunc)
    }
}

impl<R: Ring, K: MonomialKey> PartialEq for PowerSeries<R, K> {
    fn eq(&self, other: &Self) -> bool {
        self.trunc == other.trunc && self.poly == other.poly
    }
}

impl<R: Ring, K: MonomialKey> Neg for PowerSeries<R, K> {
    type Output = Self;

    fn neg(self) -> Self::Output {
        PowerSeries {
            poly: -self.poly,
            trunc: self.trunc,
        }
    }
}

impl<'a, R: Ring, K: MonomialKey> Neg for &'a PowerSeries<R, K> {
    type Output = PowerSeries<R, K>;

    fn neg(self) -> Self::Output {
        self.clone().neg()
    }
}

macro_rules! impl_series_op {
    ($tr: ident, $method: ident, $tr_assign: ident, $method_assign: ident, $checked: ident) => {
        impl<'a, 'b, R: Ring, K: MonomialKey> $tr<&'a PowerSeries<R, K>> for &'b PowerSeries<R, K> {
            type Output = PowerSeries<R, K>;

            /// # Panics
            ///
            /// Panics if the truncation levels are incompatible, or if an
            /// exponent of the result does not fit in the key.
            fn $method(self, other: &'a PowerSeries<R, K>) -> Self::Output {
                self.$checked(other).unwrap_or_else(|e| panic!("{}", e))
            }
        }

        impl<'a, R: Ring, K: MonomialKey> $tr<&'a PowerSeries<R, K>> for PowerSeries<R, K> {
            type Output = PowerSeries<R, K>;

            fn $method(self, other: &'a PowerSeries<R, K>) -> Self::Output {
                (&self).$method(other)
            }
        }

        impl<R: Ring, K: MonomialKey> $tr for PowerSeries<R, K> {
            type Output = PowerSeries<R, K>;

            fn $method(self, other: PowerSeries<R, K>) -> Self::Output {
                (&self).$method(&other)
            }
        }

        impl<'a, R: Ring, K: MonomialKey> $tr_assign<&'a PowerSeries<R, K>> for PowerSeries<R, K> {
            fn $method_assign(&mut self, other: &'a PowerSeries<R, K>) {
                *self = (&*self).$method(other);
            }
        }
    };
}

impl_series_op!(Add, add, AddAssign, add_assign, checked_add);
impl_series_op!(Sub, sub, SubAssign, sub_assign, checked_sub);
impl_series_op!(Mul, mul, MulAssign, mul_assign, checked_mul);
