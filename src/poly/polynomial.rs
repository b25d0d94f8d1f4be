use std::borrow::Cow;
use std::io::{Read, Write};
use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use rayon::prelude::*;
use smallvec::{smallvec, SmallVec};
use tracing::{debug, instrument, trace};

use crate::coefficient::Scalar;
use crate::domains::{invalid_data, read_str, write_str, CoefficientRing, Ring};
use crate::error::PolyError;
use crate::settings::{Settings, MAX_SEGMENT_BITS};
use crate::symbols::{remap_key, IntoSymbolSet, SymbolSet};

use super::table::{add_mul_to_segment, add_to_segment, new_segment, segment_index, TermTable};
use super::{MonomialKey, INLINED_EXPONENTS};

/// The first byte of a serialized polynomial.
const MAGIC: u8 = 0xa7;

/// A sparse multivariate Laurent polynomial with coefficients in `R` and
/// monomials encoded as `K`.
///
/// The terms are stored in a hash table, so the polynomial has no intrinsic
/// term order. The symbol set is shared between copies and never mutated in
/// place.
#[derive(Clone)]
pub struct Polynomial<R: Ring, K: MonomialKey> {
    pub(crate) terms: TermTable<K, R::Element>,
    pub(crate) symbols: SymbolSet,
    pub ring: R,
}

impl<R: Ring, K: MonomialKey> Polynomial<R, K> {
    /// Create the zero polynomial with an empty symbol set.
    pub fn new(ring: &R) -> Self {
        Polynomial {
            terms: TermTable::new(),
            symbols: SymbolSet::empty(),
            ring: ring.clone(),
        }
    }

    /// Create the zero polynomial in the symbol set `symbols`.
    pub fn with_symbols<S: IntoSymbolSet>(ring: &R, symbols: S) -> Result<Self, PolyError> {
        let symbols = symbols.into_symbol_set();
        check_compatible::<K>(symbols.len())?;

        Ok(Polynomial {
            terms: TermTable::new(),
            symbols,
            ring: ring.clone(),
        })
    }

    /// Create a constant polynomial with an empty symbol set.
    pub fn constant(ring: &R, coeff: R::Element) -> Self {
        let mut p = Self::new(ring);
        if !R::is_zero(&coeff) {
            p.terms.insert(K::default(), coeff);
        }
        p
    }

    /// Create a constant polynomial in the symbol set `symbols`.
    pub fn constant_in<S: IntoSymbolSet>(
        ring: &R,
        coeff: R::Element,
        symbols: S,
    ) -> Result<Self, PolyError> {
        let mut p = Self::with_symbols(ring, symbols)?;
        if !R::is_zero(&coeff) {
            p.terms.insert(K::unit(p.nvars())?, coeff);
        }
        Ok(p)
    }

    /// Create a polynomial with a single term `coeff * s_1^e_1 * ... * s_n^e_n`,
    /// where `s_i` is the `i`th symbol of `symbols`.
    pub fn monomial<S: IntoSymbolSet>(
        ring: &R,
        coeff: R::Element,
        exponents: &[i64],
        symbols: S,
    ) -> Result<Self, PolyError> {
        let mut p = Self::with_symbols(ring, symbols)?;
        if exponents.len() != p.nvars() {
            return Err(PolyError::Value(format!(
                "expected {} exponents for the symbol set {}, got {}",
                p.nvars(),
                p.symbols,
                exponents.len()
            )));
        }

        if !R::is_zero(&coeff) {
            p.terms.insert(K::from_exponents(exponents)?, coeff);
        }
        Ok(p)
    }

    /// Create one generator polynomial per name. Every generator has a
    /// single term and a symbol set that only contains its own name.
    pub fn make_polynomials<I, S>(ring: &R, names: I) -> Result<Vec<Self>, PolyError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .map(|n| Self::monomial(ring, ring.one(), &[1], n.as_ref()))
            .collect()
    }

    /// Create one generator polynomial per name, all sharing the symbol set
    /// `symbols`, which must contain every name.
    pub fn make_polynomials_in<S, I, N>(
        ring: &R,
        symbols: S,
        names: I,
    ) -> Result<Vec<Self>, PolyError>
    where
        S: IntoSymbolSet,
        I: IntoIterator<Item = N>,
        N: AsRef<str>,
    {
        let symbols = symbols.into_symbol_set();
        check_compatible::<K>(symbols.len())?;

        let mut exponents: SmallVec<[i64; INLINED_EXPONENTS]> = smallvec![0; symbols.len()];
        names
            .into_iter()
            .map(|n| {
                let n = n.as_ref();
                let i = symbols.index_of(n).ok_or_else(|| {
                    PolyError::Value(format!(
                        "the generator '{}' is not in the symbol set {}",
                        n, symbols
                    ))
                })?;

                exponents[i] = 1;
                let p = Self::monomial(ring, ring.one(), &exponents, &symbols);
                exponents[i] = 0;
                p
            })
            .collect()
    }

    #[inline]
    pub fn nterms(&self) -> usize {
        self.terms.len()
    }

    #[inline]
    pub fn nvars(&self) -> usize {
        self.symbols.len()
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    /// Returns `true` if the polynomial is zero or a single term without symbols.
    pub fn is_constant(&self) -> bool {
        match self.nterms() {
            0 => true,
            1 => self.terms.keys().all(|k| k.is_unitary(self.nvars())),
            _ => false,
        }
    }

    #[inline]
    pub fn symbol_set(&self) -> &SymbolSet {
        &self.symbols
    }

    #[inline]
    pub fn table(&self) -> &TermTable<K, R::Element> {
        &self.terms
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &R::Element)> {
        self.terms.iter()
    }

    /// Get the terms as exponent lists and coefficients, in descending order.
    pub fn sorted_terms(&self) -> Vec<(SmallVec<[i64; INLINED_EXPONENTS]>, &R::Element)> {
        let nvars = self.nvars();
        self.terms
            .sorted_desc()
            .into_iter()
            .map(|(k, c)| (k.exponents(nvars), c))
            .collect()
    }

    /// Get the coefficient of the monomial with the given exponents.
    pub fn coefficient(&self, exponents: &[i64]) -> Option<&R::Element> {
        if exponents.len() != self.nvars() {
            return None;
        }

        K::from_exponents(exponents)
            .ok()
            .and_then(|k| self.terms.get(&k))
    }

    /// Get the constant term, or zero.
    pub fn constant_term(&self) -> R::Element {
        K::unit(self.nvars())
            .ok()
            .and_then(|k| self.terms.get(&k).cloned())
            .unwrap_or_else(|| self.ring.zero())
    }

    /// Get the zero polynomial with the same ring and symbol set.
    #[inline]
    pub fn zero(&self) -> Self {
        Polynomial {
            terms: TermTable::new(),
            symbols: self.symbols.clone(),
            ring: self.ring.clone(),
        }
    }

    /// Get the constant polynomial `coeff` with the same ring and symbol set.
    pub fn constant_like(&self, coeff: R::Element) -> Result<Self, PolyError> {
        let mut p = self.zero();
        if !R::is_zero(&coeff) {
            p.terms.insert(K::unit(self.nvars())?, coeff);
        }
        Ok(p)
    }

    /// Express the polynomial in the symbol set `new_set`, which must contain
    /// all symbols of the polynomial.
    pub fn extend_symbols(&self, new_set: &SymbolSet) -> Result<Self, PolyError> {
        if self.symbols.same_as(new_set) {
            return Ok(self.clone());
        }

        let positions = self.symbols.positions_in(new_set)?;
        self.remap(new_set, &positions)
    }

    /// Move exponent `i` of every key to position `positions[i]` in `new_set`.
    fn remap(&self, new_set: &SymbolSet, positions: &[usize]) -> Result<Self, PolyError> {
        check_compatible::<K>(new_set.len())?;

        let mut terms = TermTable::with_segment_bits(self.terms.segment_bits());
        for (k, c) in self.terms.iter() {
            let k = remap_key(k, self.nvars(), positions, new_set.len())?;
            terms.insert(k, c.clone());
        }

        Ok(Polynomial {
            terms,
            symbols: new_set.clone(),
            ring: self.ring.clone(),
        })
    }

    /// Express both polynomials in the union of their symbol sets.
    pub(crate) fn reconcile<'a>(
        &'a self,
        other: &'a Self,
    ) -> Result<(Cow<'a, Self>, Cow<'a, Self>), PolyError> {
        if self.symbols.same_as(&other.symbols) {
            return Ok((Cow::Borrowed(self), Cow::Borrowed(other)));
        }

        let (set, pos_a, pos_b) = self.symbols.merge(&other.symbols);
        check_compatible::<K>(set.len())?;

        let a = if set.len() == self.nvars() {
            Cow::Borrowed(self)
        } else {
            Cow::Owned(self.remap(&set, &pos_a)?)
        };
        let b = if set.len() == other.nvars() {
            Cow::Borrowed(other)
        } else {
            Cow::Owned(other.remap(&set, &pos_b)?)
        };

        Ok((a, b))
    }

    /// Compute `self + other`.
    pub fn checked_add(&self, other: &Self) -> Result<Self, PolyError> {
        let (a, b) = self.reconcile(other)?;

        let (mut res, rest) = if a.nterms() >= b.nterms() {
            (a.into_owned(), b)
        } else {
            (b.into_owned(), a)
        };

        for (k, c) in rest.terms.iter() {
            res.terms.add_term(&res.ring, k.clone(), c.clone());
        }
        Ok(res)
    }

    /// Compute `self - other`.
    pub fn checked_sub(&self, other: &Self) -> Result<Self, PolyError> {
        let (a, b) = self.reconcile(other)?;

        let mut res = a.into_owned();
        for (k, c) in b.terms.iter() {
            res.terms.sub_term(&res.ring, k.clone(), c);
        }
        Ok(res)
    }

    /// Compute `self * other`.
    ///
    /// Large products are computed in parallel, as configured by [`Settings`].
    pub fn checked_mul(&self, other: &Self) -> Result<Self, PolyError> {
        self.mul_filtered(other, &|_| true)
    }

    /// Compute `self * other` in parallel on `2^segment_bits` table segments,
    /// regardless of the size of the operands.
    #[instrument(level = "debug", skip(self, other), fields(lhs = self.nterms(), rhs = other.nterms()))]
    pub fn checked_mul_parallel(&self, other: &Self, segment_bits: u32) -> Result<Self, PolyError> {
        let (a, b) = self.reconcile(other)?;
        let terms = Self::mul_segmented(&a, &b, segment_bits.min(MAX_SEGMENT_BITS), &|_| true)?;
        Ok(Polynomial {
            terms,
            symbols: a.symbols.clone(),
            ring: a.ring.clone(),
        })
    }

    /// Compute `self * other`, dropping every product monomial for which
    /// `keep` returns `false`. The monomials passed to `keep` are expressed in
    /// the union of the symbol sets.
    pub(crate) fn mul_filtered(
        &self,
        other: &Self,
        keep: &(dyn Fn(&K) -> bool + Sync),
    ) -> Result<Self, PolyError> {
        let (a, b) = self.reconcile(other)?;

        let mut res = a.zero();
        if a.is_zero() || b.is_zero() {
            return Ok(res);
        }

        if a.nterms() == 1 || b.nterms() == 1 {
            let (single, many) = if b.nterms() == 1 { (&b, &a) } else { (&a, &b) };
            if let Some((k, c)) = single.terms.iter().next() {
                res.terms = many.mul_term(k, c, keep)?;
            }
            return Ok(res);
        }

        let settings = Settings::get();
        let pairs = a.nterms().saturating_mul(b.nterms());
        res.terms = if settings.segment_bits > 0 && pairs >= settings.parallel_threshold {
            debug!(
                lhs = a.nterms(),
                rhs = b.nterms(),
                segment_bits = settings.segment_bits,
                "parallel multiplication"
            );
            Self::mul_segmented(&a, &b, settings.segment_bits, keep)?
        } else {
            trace!(lhs = a.nterms(), rhs = b.nterms(), "sequential multiplication");
            Self::mul_segmented(&a, &b, 0, keep)?
        };

        Ok(res)
    }

    /// Multiply every term by the monomial `key` with coefficient `coeff`.
    fn mul_term(
        &self,
        key: &K,
        coeff: &R::Element,
        keep: &(dyn Fn(&K) -> bool + Sync),
    ) -> Result<TermTable<K, R::Element>, PolyError> {
        let nvars = self.nvars();
        let mut terms = TermTable::with_segment_bits(self.terms.segment_bits());
        for (k, c) in self.terms.iter() {
            let k = k.multiply(key, nvars)?;
            if !keep(&k) {
                continue;
            }

            let c = self.ring.mul(c, coeff);
            if !R::is_zero(&c) {
                terms.insert(k, c);
            }
        }
        Ok(terms)
    }

    /// Convolve the terms of `a` and `b`, which must have the same symbol
    /// set, into a table with `2^bits` segments.
    ///
    /// In parallel, the terms of `a` are split into chunks and every product
    /// is computed once and scattered into a bucket per segment. The buckets
    /// of each segment are then accumulated by one worker, in chunk order.
    fn mul_segmented(
        a: &Self,
        b: &Self,
        bits: u32,
        keep: &(dyn Fn(&K) -> bool + Sync),
    ) -> Result<TermTable<K, R::Element>, PolyError> {
        let nvars = a.nvars();
        let ring = &a.ring;

        if bits == 0 {
            let mut seg = new_segment();
            for (ka, ca) in a.terms.iter() {
                for (kb, cb) in b.terms.iter() {
                    let k = ka.multiply(kb, nvars)?;
                    if keep(&k) {
                        add_mul_to_segment(&mut seg, ring, k, ca, cb);
                    }
                }
            }
            return Ok(TermTable::from_segments(vec![seg], 0));
        }

        let nsegments = 1usize << bits;
        let a_terms: Vec<_> = a.terms.iter().collect();
        let b_terms: Vec<_> = b.terms.iter().collect();

        let segments = Settings::thread_pool().install(|| {
            let chunk_size = (a_terms.len() / (4 * rayon::current_num_threads())).max(1);
            debug!(
                chunks = a_terms.len().div_ceil(chunk_size),
                segments = nsegments,
                "parallel multiplication"
            );

            let scattered = a_terms
                .par_chunks(chunk_size)
                .map(|chunk| -> Result<_, PolyError> {
                    let mut buckets: Vec<Vec<(K, R::Element)>> =
                        (0..nsegments).map(|_| vec![]).collect();
                    for (ka, ca) in chunk {
                        for (kb, cb) in &b_terms {
                            let k = ka.multiply(kb, nvars)?;
                            if !keep(&k) {
                                continue;
                            }

                            let c = ring.mul(ca, cb);
                            if !R::is_zero(&c) {
                                buckets[segment_index(&k, bits)].push((k, c));
                            }
                        }
                    }
                    Ok(buckets)
                })
                .collect::<Result<Vec<_>, _>>()?;

            let mut per_segment: Vec<Vec<Vec<(K, R::Element)>>> = (0..nsegments)
                .map(|_| Vec::with_capacity(scattered.len()))
                .collect();
            for buckets in scattered {
                for (s, bucket) in buckets.into_iter().enumerate() {
                    per_segment[s].push(bucket);
                }
            }

            Ok::<_, PolyError>(
                per_segment
                    .into_par_iter()
                    .map(|buckets| {
                        let mut seg = new_segment();
                        for (k, c) in buckets.into_iter().flatten() {
                            add_to_segment(&mut seg, ring, k, c);
                        }
                        seg
                    })
                    .collect::<Vec<_>>(),
            )
        })?;

        Ok(TermTable::from_segments(segments, bits))
    }

    /// Replace `self` by `self + other`. On error `self` is unchanged.
    pub fn checked_add_assign(&mut self, other: &Self) -> Result<(), PolyError> {
        *self = self.checked_add(other)?;
        Ok(())
    }

    /// Replace `self` by `self - other`. On error `self` is unchanged.
    pub fn checked_sub_assign(&mut self, other: &Self) -> Result<(), PolyError> {
        *self = self.checked_sub(other)?;
        Ok(())
    }

    /// Replace `self` by `self * other`. On error `self` is unchanged.
    pub fn checked_mul_assign(&mut self, other: &Self) -> Result<(), PolyError> {
        *self = self.checked_mul(other)?;
        Ok(())
    }

    /// Add a constant.
    pub fn add_element(&self, coeff: &R::Element) -> Result<Self, PolyError> {
        let mut res = self.clone();
        res.terms
            .add_term(&self.ring, K::unit(self.nvars())?, coeff.clone());
        Ok(res)
    }

    /// Subtract a constant.
    pub fn sub_element(&self, coeff: &R::Element) -> Result<Self, PolyError> {
        let mut res = self.clone();
        res.terms.sub_term(&self.ring, K::unit(self.nvars())?, coeff);
        Ok(res)
    }

    /// Multiply every coefficient by `coeff`.
    pub fn mul_element(&self, coeff: &R::Element) -> Self {
        let mut res = self.clone();
        if R::is_zero(coeff) {
            res.terms.clear();
            return res;
        }

        for c in res.terms.values_mut() {
            self.ring.mul_assign(c, coeff);
        }
        res.terms.retain(|_, c| !R::is_zero(c));
        res
    }

    /// Divide every coefficient by `coeff`. For integer coefficients the
    /// quotients are truncated.
    pub fn div_element(&self, coeff: &R::Element) -> Result<Self, PolyError> {
        if R::is_zero(coeff) {
            return Err(PolyError::DivisionByZero);
        }

        let mut res = self.clone();
        for c in res.terms.values_mut() {
            *c = self.ring.quot(c, coeff).ok_or(PolyError::DivisionByZero)?;
        }
        res.terms.retain(|_, c| !R::is_zero(c));
        Ok(res)
    }

    /// Compute `self / other`, where `other` must consist of a single term.
    pub fn checked_div(&self, other: &Self) -> Result<Self, PolyError> {
        if other.is_zero() {
            return Err(PolyError::DivisionByZero);
        }

        if other.nterms() != 1 {
            return Err(PolyError::InvalidOperation(format!(
                "cannot divide by a polynomial with {} terms, only division by a monomial is supported",
                other.nterms()
            )));
        }

        let (a, b) = self.reconcile(other)?;
        let nvars = a.nvars();

        let mut res = a.zero();
        if let Some((k, c)) = b.terms.iter().next() {
            let inv_key = k.scale(-1, nvars)?;
            for (ka, ca) in a.terms.iter() {
                let q = a.ring.quot(ca, c).ok_or(PolyError::DivisionByZero)?;
                res.terms.add_term(&a.ring, ka.multiply(&inv_key, nvars)?, q);
            }
        }
        Ok(res)
    }

    /// Compute `self^n`.
    pub fn pow(&self, n: u64) -> Result<Self, PolyError> {
        self.pow_filtered(n, &|_| true)
    }

    /// Compute `self^n`, dropping the monomials rejected by `keep` after every
    /// multiplication.
    pub(crate) fn pow_filtered(
        &self,
        mut n: u64,
        keep: &(dyn Fn(&K) -> bool + Sync),
    ) -> Result<Self, PolyError> {
        if n == 0 {
            let one = K::unit(self.nvars())?;
            let mut res = self.zero();
            if keep(&one) {
                res.terms.insert(one, self.ring.one());
            }
            return Ok(res);
        }

        if self.is_zero() {
            return Ok(self.clone());
        }

        if self.nterms() == 1 {
            let e = i64::try_from(n)
                .map_err(|_| PolyError::Overflow(format!("the exponent {} is too large", n)))?;

            let mut res = self.zero();
            for (k, c) in self.terms.iter() {
                let k = k.scale(e, self.nvars())?;
                let c = self.ring.pow(c, n);
                if keep(&k) && !R::is_zero(&c) {
                    res.terms.insert(k, c);
                }
            }
            return Ok(res);
        }

        let mut x = self.clone();
        let mut y: Option<Self> = None;
        while n != 1 {
            if n % 2 == 1 {
                y = Some(match y {
                    Some(y) => y.mul_filtered(&x, keep)?,
                    None => x.clone(),
                });
                n -= 1;
            }

            x = x.mul_filtered(&x, keep)?;
            n /= 2;
        }

        match y {
            Some(y) => x.mul_filtered(&y, keep),
            None => Ok(x),
        }
    }

    /// Compute `self^n` for a signed exponent. Negative powers are only
    /// defined for a single term with an invertible coefficient.
    pub fn pow_signed(&self, n: i64) -> Result<Self, PolyError> {
        if n >= 0 {
            return self.pow(n as u64);
        }

        if self.is_zero() {
            return Err(PolyError::DivisionByZero);
        }

        if self.nterms() != 1 {
            return Err(PolyError::InvalidOperation(format!(
                "cannot raise a polynomial with {} terms to the negative power {}",
                self.nterms(),
                n
            )));
        }

        let mut res = self.zero();
        for (k, c) in self.terms.iter() {
            res.terms
                .insert(k.scale(n, self.nvars())?, self.ring.pow_signed(c, n)?);
        }
        Ok(res)
    }

    /// Get the maximum total degree of the terms, or 0 for the zero polynomial.
    pub fn degree(&self) -> i64 {
        let nvars = self.nvars();
        self.terms.keys().map(|k| k.degree(nvars)).max().unwrap_or(0)
    }

    /// Get the maximum partial degree in `symbols` of the terms. Symbols that
    /// are not in the polynomial do not contribute.
    pub fn p_degree<S: IntoSymbolSet>(&self, symbols: S) -> i64 {
        let mask = self.symbols.mask(&symbols.into_symbol_set());
        self.p_degree_mask(&mask)
    }

    pub(crate) fn p_degree_mask(&self, mask: &[bool]) -> i64 {
        let nvars = self.nvars();
        self.terms
            .keys()
            .map(|k| k.partial_degree(mask, nvars))
            .max()
            .unwrap_or(0)
    }

    /// Remove the symbols that do not appear in any term.
    pub fn trim(&self) -> Result<Self, PolyError> {
        let nvars = self.nvars();
        let mut used: SmallVec<[bool; INLINED_EXPONENTS]> = smallvec![false; nvars];
        for k in self.terms.keys() {
            for (u, e) in used.iter_mut().zip(k.exponents(nvars)) {
                *u |= e != 0;
            }
        }

        if used.iter().all(|u| *u) {
            return Ok(self.clone());
        }

        let kept: Vec<usize> = (0..nvars).filter(|i| used[*i]).collect();
        let new_set = SymbolSet::new(kept.iter().filter_map(|i| self.symbols.get(*i)));

        let mut terms = TermTable::with_segment_bits(self.terms.segment_bits());
        let mut new_exp: SmallVec<[i64; INLINED_EXPONENTS]> = smallvec![0; kept.len()];
        for (k, c) in self.terms.iter() {
            let e = k.exponents(nvars);
            for (n, i) in new_exp.iter_mut().zip(&kept) {
                *n = e[*i];
            }
            terms.insert(K::from_exponents(&new_exp)?, c.clone());
        }

        Ok(Polynomial {
            terms,
            symbols: new_set,
            ring: self.ring.clone(),
        })
    }

    /// Drop the terms whose total degree exceeds `d`.
    pub fn truncate_degree(&self, d: i64) -> Self {
        let mut res = self.clone();
        res.truncate_degree_in_place(d);
        res
    }

    pub fn truncate_degree_in_place(&mut self, d: i64) {
        let nvars = self.nvars();
        self.terms.retain(|k, _| k.degree(nvars) <= d);
    }

    /// Drop the terms whose partial degree in `symbols` exceeds `d`.
    pub fn truncate_p_degree<S: IntoSymbolSet>(&self, d: i64, symbols: S) -> Self {
        let mut res = self.clone();
        res.truncate_p_degree_in_place(d, symbols);
        res
    }

    pub fn truncate_p_degree_in_place<S: IntoSymbolSet>(&mut self, d: i64, symbols: S) {
        let mask = self.symbols.mask(&symbols.into_symbol_set());
        let nvars = self.nvars();
        self.terms.retain(|k, _| k.partial_degree(&mask, nvars) <= d);
    }

    /// Get the occupancy statistics of the term table as text.
    pub fn table_stats(&self) -> String {
        self.terms.stats().to_string()
    }

    /// Convert the polynomial to another key type.
    pub fn rekey<K2: MonomialKey>(&self) -> Result<Polynomial<R, K2>, PolyError> {
        check_compatible::<K2>(self.nvars())?;

        let nvars = self.nvars();
        let mut terms = TermTable::with_segment_bits(self.terms.segment_bits());
        for (k, c) in self.terms.iter() {
            terms.insert(K2::from_exponents(&k.exponents(nvars))?, c.clone());
        }

        Ok(Polynomial {
            terms,
            symbols: self.symbols.clone(),
            ring: self.ring.clone(),
        })
    }

    /// Map every coefficient into the ring `ring`, dropping the terms that
    /// become zero.
    pub fn map_coeff<R2: Ring, F: Fn(&R::Element) -> Result<R2::Element, PolyError>>(
        &self,
        ring: &R2,
        f: F,
    ) -> Result<Polynomial<R2, K>, PolyError> {
        let mut terms = TermTable::with_segment_bits(self.terms.segment_bits());
        for (k, c) in self.terms.iter() {
            terms.add_term(ring, k.clone(), f(c)?);
        }

        Ok(Polynomial {
            terms,
            symbols: self.symbols.clone(),
            ring: ring.clone(),
        })
    }
}

impl<R: CoefficientRing, K: MonomialKey> Polynomial<R, K> {
    /// Create a constant polynomial from a scalar of any kind, promoting it
    /// into the ring.
    pub fn from_scalar(ring: &R, s: &Scalar) -> Result<Self, PolyError> {
        Ok(Self::constant(ring, ring.element_from_scalar(s)?))
    }

    /// Convert the coefficients into the ring `ring`.
    pub fn convert<R2: CoefficientRing>(&self, ring: &R2) -> Result<Polynomial<R2, K>, PolyError> {
        self.map_coeff(ring, |c| {
            ring.element_from_scalar(&self.ring.element_to_scalar(c))
        })
    }

    /// Returns `true` if the polynomial equals the constant `s`.
    pub fn eq_scalar(&self, s: &Scalar) -> bool {
        match self.ring.element_from_scalar(s) {
            Ok(c) => {
                if R::is_zero(&c) {
                    self.is_zero()
                } else {
                    self.is_constant() && !self.is_zero() && self.constant_term() == c
                }
            }
            Err(_) => false,
        }
    }

    pub fn add_scalar(&self, s: &Scalar) -> Result<Self, PolyError> {
        self.add_element(&self.ring.element_from_scalar(s)?)
    }

    pub fn sub_scalar(&self, s: &Scalar) -> Result<Self, PolyError> {
        self.sub_element(&self.ring.element_from_scalar(s)?)
    }

    pub fn mul_scalar(&self, s: &Scalar) -> Result<Self, PolyError> {
        Ok(self.mul_element(&self.ring.element_from_scalar(s)?))
    }

    pub fn div_scalar(&self, s: &Scalar) -> Result<Self, PolyError> {
        self.div_element(&self.ring.element_from_scalar(s)?)
    }

    /// Raise the polynomial to a scalar power.
    ///
    /// Integral exponents follow [`Polynomial::pow_signed`]. Other exponents
    /// are only supported for constants, and are delegated to the ring.
    pub fn pow_scalar(&self, e: &Scalar) -> Result<Self, PolyError> {
        if let Some(n) = e.to_exact_integer() {
            let n = n
                .to_i64()
                .ok_or_else(|| PolyError::Overflow(format!("the exponent {} is too large", n)))?;
            return self.pow_signed(n);
        }

        if !self.is_constant() {
            return Err(PolyError::InvalidOperation(format!(
                "cannot raise a non-constant polynomial to the power {}",
                e
            )));
        }

        if self.is_zero() {
            return if e.to_f64() > 0. {
                Ok(self.clone())
            } else {
                Err(PolyError::DivisionByZero)
            };
        }

        self.constant_like(self.ring.pow_scalar(&self.constant_term(), e)?)
    }

    /// An estimate of the number of bytes used by the polynomial.
    pub fn byte_size(&self) -> usize {
        let terms: usize = self
            .terms
            .iter()
            .map(|(k, c)| k.byte_size() + self.ring.element_byte_size(c))
            .sum();
        let slack = (self.terms.capacity() - self.terms.len())
            * (std::mem::size_of::<K>() + std::mem::size_of::<R::Element>());
        let symbols: usize = self
            .symbols
            .iter()
            .map(|s| s.len() + std::mem::size_of::<smartstring::alias::String>())
            .sum();

        std::mem::size_of::<Self>() + terms + slack + symbols
    }

    /// Write the polynomial in a binary format. The terms are written in
    /// descending order.
    pub fn write<W: Write>(&self, mut dest: W) -> Result<(), PolyError> {
        dest.write_u8(MAGIC)?;
        dest.write_u8(K::TAG)?;
        dest.write_u8(self.ring.kind() as u8)?;

        dest.write_u64::<LittleEndian>(self.nvars() as u64)?;
        for s in self.symbols.iter() {
            write_str(s, &mut dest)?;
        }

        let nvars = self.nvars();
        dest.write_u64::<LittleEndian>(self.nterms() as u64)?;
        for (k, c) in self.terms.sorted_desc() {
            for e in k.exponents(nvars) {
                dest.write_i64::<LittleEndian>(e)?;
            }
            self.ring.write_element(c, &mut dest)?;
        }

        Ok(())
    }

    /// Read a polynomial written with [`Polynomial::write`].
    pub fn read<Rd: Read>(ring: &R, mut source: Rd) -> Result<Self, PolyError> {
        if source.read_u8()? != MAGIC {
            return Err(invalid_data("the data does not start with a serialized polynomial").into());
        }

        let tag = source.read_u8()?;
        if tag != K::TAG {
            return Err(PolyError::TypeMismatch(format!(
                "the serialized polynomial has key tag {}, expected {} ({})",
                tag,
                K::TAG,
                K::NAME
            )));
        }

        let kind = source.read_u8()?;
        if kind != ring.kind() as u8 {
            return Err(PolyError::TypeMismatch(format!(
                "the serialized polynomial does not have {} coefficients",
                ring.kind()
            )));
        }

        let nvars = source.read_u64::<LittleEndian>()? as usize;
        let mut names = vec![];
        for _ in 0..nvars {
            names.push(read_str(&mut source)?);
        }

        let symbols = SymbolSet::new(&names);
        if symbols.len() != nvars {
            return Err(invalid_data("the serialized symbol set contains duplicates").into());
        }

        let mut p = Self::with_symbols(ring, symbols)?;
        let nterms = source.read_u64::<LittleEndian>()?;
        let mut exponents: SmallVec<[i64; INLINED_EXPONENTS]> = smallvec![0; nvars];
        for _ in 0..nterms {
            for e in exponents.iter_mut() {
                *e = source.read_i64::<LittleEndian>()?;
            }

            let k = K::from_exponents(&exponents)?;
            let c = ring.read_element(&mut source)?;
            p.terms.add_term(ring, k, c);
        }

        Ok(p)
    }
}

/// Fail if keys of type `K` cannot hold `nvars` exponents.
pub(crate) fn check_compatible<K: MonomialKey>(nvars: usize) -> Result<(), PolyError> {
    if K::is_compatible(nvars) {
        Ok(())
    } else {
        Err(PolyError::Overflow(format!(
            "the key type {} cannot hold {} symbols",
            K::NAME,
            nvars
        )))
    }
}

impl<R: Ring, K: MonomialKey> PartialEq for Polynomial<R, K> {
    /// Two polynomials are equal if they have the same terms after both are
    /// expressed in the union of their symbol sets.
    fn eq(&self, other: &Self) -> bool {
        match self.reconcile(other) {
            Ok((a, b)) => a.terms == b.terms,
            Err(_) => false,
        }
    }
}

impl<R: Ring, K: MonomialKey> Neg for Polynomial<R, K> {
    type Output = Self;

    fn neg(mut self) -> Self::Output {
        for c in self.terms.values_mut() {
            *c = self.ring.neg(c);
        }
        self
    }
}

impl<'a, R: Ring, K: MonomialKey> Neg for &'a Polynomial<R, K> {
    type Output = Polynomial<R, K>;

    fn neg(self) -> Self::Output {
        self.clone().neg()
    }
}

macro_rules! impl_binary_op {
    ($tr: ident, $method: ident, $tr_assign: ident, $method_assign: ident, $checked: ident) => {
        impl<'a, 'b, R: Ring, K: MonomialKey> $tr<&'a Polynomial<R, K>> for &'b Polynomial<R, K> {
            type Output = Polynomial<R, K>;

            /// # Panics
            ///
            /// Panics if an exponent of the result does not fit in the key.
            fn $method(self, other: &'a Polynomial<R, K>) -> Self::Output {
                self.$checked(other).unwrap_or_else(|e| panic!("{}", e))
            }
        }

        impl<'a, R: Ring, K: MonomialKey> $tr<&'a Polynomial<R, K>> for Polynomial<R, K> {
            type Output = Polynomial<R, K>;

            fn $method(self, other: &'a Polynomial<R, K>) -> Self::Output {
                (&self).$method(other)
            }
        }

        impl<'b, R: Ring, K: MonomialKey> $tr<Polynomial<R, K>> for &'b Polynomial<R, K> {
            type Output = Polynomial<R, K>;

            fn $method(self, other: Polynomial<R, K>) -> Self::Output {
                self.$method(&other)
            }
        }

        impl<R: Ring, K: MonomialKey> $tr for Polynomial<R, K> {
            type Output = Polynomial<R, K>;

            fn $method(self, other: Polynomial<R, K>) -> Self::Output {
                (&self).$method(&other)
            }
        }

        impl<'a, R: Ring, K: MonomialKey> $tr_assign<&'a Polynomial<R, K>> for Polynomial<R, K> {
            fn $method_assign(&mut self, other: &'a Polynomial<R, K>) {
                *self = (&*self).$method(other);
            }
        }

        impl<R: Ring, K: MonomialKey> $tr_assign for Polynomial<R, K> {
            fn $method_assign(&mut self, other: Polynomial<R, K>) {
                *self = (&*self).$method(&other);
            }
        }
    };
}

impl_binary_op!(Add, add, AddAssign, add_assign, checked_add);
impl_binary_op!(Sub, sub, SubAssign, sub_assign, checked_sub);
impl_binary_op!(Mul, mul, MulAssign, mul_assign, checked_mul);
