//! Substitution of symbols by polynomials or ring elements, and evaluation.

use std::collections::HashMap;

use smallvec::{smallvec, SmallVec};
use tracing::instrument;

use crate::domains::{CoefficientRing, Ring};
use crate::error::PolyError;
use crate::symbols::SymbolSet;

use super::polynomial::Polynomial;
use super::table::TermTable;
use super::{MonomialKey, INLINED_EXPONENTS};

/// The symbols of a polynomial that are replaced by a substitution map.
struct Replacement<'a, T> {
    /// Position of every replaced symbol and its value.
    replaced: Vec<(usize, &'a T)>,
    /// Positions of the symbols that are kept.
    kept: Vec<usize>,
    /// The symbols that are kept.
    kept_set: SymbolSet,
}

impl<'a, T> Replacement<'a, T> {
    fn new(symbols: &SymbolSet, map: &'a HashMap<String, T>) -> Result<Self, PolyError> {
        if map.is_empty() {
            return Err(PolyError::Value(
                "the substitution map must not be empty".into(),
            ));
        }

        let mut replaced = vec![];
        let mut kept = vec![];
        for (i, s) in symbols.iter().enumerate() {
            match map.get(s) {
                Some(v) => replaced.push((i, v)),
                None => kept.push(i),
            }
        }

        let kept_set = SymbolSet::new(kept.iter().filter_map(|i| symbols.get(*i)));
        Ok(Replacement {
            replaced,
            kept,
            kept_set,
        })
    }

    /// Split the exponents of a key into the kept and the replaced exponents.
    fn split_key<K: MonomialKey>(
        &self,
        key: &K,
        nvars: usize,
    ) -> Result<(K, SmallVec<[i64; INLINED_EXPONENTS]>), PolyError> {
        let e = key.exponents(nvars);
        let kept: SmallVec<[i64; INLINED_EXPONENTS]> = self.kept.iter().map(|i| e[*i]).collect();
        let replaced = self.replaced.iter().map(|(i, _)| e[*i]).collect();
        Ok((K::from_exponents(&kept)?, replaced))
    }
}

impl<R: Ring, K: MonomialKey> Polynomial<R, K> {
    /// Replace symbols by polynomials with the same coefficient ring.
    ///
    /// The replaced symbols are removed from the symbol set and the symbols of
    /// the replacements are added to it. Symbols in `map` that are not in the
    /// polynomial are ignored. Negative exponents require replacements that
    /// consist of a single term with an invertible coefficient.
    #[instrument(level = "debug", skip_all, fields(nterms = self.nterms(), nsubs = map.len()))]
    pub fn subs(&self, map: &HashMap<String, Polynomial<R, K>>) -> Result<Self, PolyError> {
        let rep = Replacement::new(&self.symbols, map)?;
        if rep.replaced.is_empty() {
            return Ok(self.clone());
        }

        let mut new_set = rep.kept_set.clone();
        for (_, v) in &rep.replaced {
            new_set = new_set.union(&v.symbols);
        }
        let kept_positions = rep.kept_set.positions_in(&new_set)?;

        let values = rep
            .replaced
            .iter()
            .map(|(_, v)| v.extend_symbols(&new_set))
            .collect::<Result<Vec<_>, _>>()?;

        let nvars = self.nvars();
        let mut powers: HashMap<(usize, i64), Self> = HashMap::new();
        let mut res = Self::with_symbols(&self.ring, &new_set)?;

        for (k, c) in self.terms.iter() {
            let (kept_key, exps) = rep.split_key(k, nvars)?;
            let kept_key = crate::symbols::remap_key(
                &kept_key,
                rep.kept.len(),
                &kept_positions,
                new_set.len(),
            )?;

            let mut term = res.zero();
            term.terms.insert(kept_key, c.clone());

            for (vi, e) in exps.iter().enumerate() {
                if *e == 0 {
                    continue;
                }

                if !powers.contains_key(&(vi, *e)) {
                    powers.insert((vi, *e), values[vi].pow_signed(*e)?);
                }
                if let Some(p) = powers.get(&(vi, *e)) {
                    term = term.checked_mul(p)?;
                }
            }

            res = res.checked_add(&term)?;
        }

        Ok(res)
    }

    /// Evaluate the polynomial with a value for every symbol.
    pub fn evaluate(&self, map: &HashMap<String, R::Element>) -> Result<R::Element, PolyError> {
        self.evaluate_impl(map, &self.ring, |c| Ok(c.clone()))
    }

    fn evaluate_impl<R2: Ring, F: Fn(&R::Element) -> Result<R2::Element, PolyError>>(
        &self,
        map: &HashMap<String, R2::Element>,
        ring: &R2,
        convert: F,
    ) -> Result<R2::Element, PolyError> {
        if map.is_empty() {
            return Err(PolyError::Value("the evaluation map must not be empty".into()));
        }

        let missing: Vec<String> = self
            .symbols
            .iter()
            .filter(|s| !map.contains_key(*s))
            .map(|s| s.to_owned())
            .collect();
        if !missing.is_empty() {
            return Err(PolyError::MissingSymbols(missing));
        }

        let nvars = self.nvars();
        let values: SmallVec<[&R2::Element; INLINED_EXPONENTS]> =
            self.symbols.iter().filter_map(|s| map.get(s)).collect();

        let mut res = ring.zero();
        let mut e: SmallVec<[i64; INLINED_EXPONENTS]> = smallvec![0; nvars];
        for (k, c) in self.terms.iter() {
            k.unpack(nvars, &mut e);

            let mut t = convert(c)?;
            for (v, e) in values.iter().zip(&e) {
                if *e != 0 {
                    ring.mul_assign(&mut t, &ring.pow_signed(v, *e)?);
                }
            }
            ring.add_assign(&mut res, &t);
        }

        Ok(res)
    }
}

impl<R: CoefficientRing, K: MonomialKey> Polynomial<R, K> {
    /// Replace symbols by elements of the ring `ring`. The result has
    /// coefficients in `ring`, into which the coefficients of the polynomial
    /// are promoted.
    #[instrument(level = "debug", skip_all, fields(nterms = self.nterms(), nsubs = map.len(), ring = %ring))]
    pub fn subs_with<R2: CoefficientRing>(
        &self,
        map: &HashMap<String, R2::Element>,
        ring: &R2,
    ) -> Result<Polynomial<R2, K>, PolyError> {
        let rep = Replacement::new(&self.symbols, map)?;

        let nvars = self.nvars();
        let mut terms = TermTable::with_segment_bits(self.terms.segment_bits());
        for (k, c) in self.terms.iter() {
            let (kept_key, exps) = rep.split_key(k, nvars)?;

            let mut t = ring.element_from_scalar(&self.ring.element_to_scalar(c))?;
            for ((_, v), e) in rep.replaced.iter().zip(&exps) {
                if *e != 0 {
                    ring.mul_assign(&mut t, &ring.pow_signed(v, *e)?);
                }
            }
            terms.add_term(ring, kept_key, t);
        }

        Ok(Polynomial {
            terms,
            symbols: rep.kept_set,
            ring: ring.clone(),
        })
    }

    /// Evaluate the polynomial with a value in `ring` for every symbol.
    pub fn evaluate_with<R2: CoefficientRing>(
        &self,
        map: &HashMap<String, R2::Element>,
        ring: &R2,
    ) -> Result<R2::Element, PolyError> {
        self.evaluate_impl(map, ring, |c| {
            ring.element_from_scalar(&self.ring.element_to_scalar(c))
        })
    }
}
