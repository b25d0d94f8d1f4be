use crate::domains::Ring;
use crate::error::PolyError;
use crate::symbols::SymbolSet;

use super::polynomial::Polynomial;
use super::table::TermTable;
use super::MonomialKey;

impl<R: Ring, K: MonomialKey> Polynomial<R, K> {
    /// Differentiate with respect to `symbol`. If the symbol does not appear
    /// in the symbol set, the result is zero.
    pub fn diff(&self, symbol: &str) -> Result<Self, PolyError> {
        let Some(var) = self.symbols.index_of(symbol) else {
            return Ok(self.zero());
        };

        let nvars = self.nvars();
        let mut res = self.zero();
        for (k, c) in self.terms.iter() {
            if k.exponents(nvars)[var] == 0 {
                continue;
            }

            let (m, k) = k.differentiate(var, nvars)?;
            res.terms
                .add_term(&self.ring, k, self.ring.mul(c, &self.ring.nth(m)));
        }

        Ok(res)
    }

    /// Integrate with respect to `symbol`, adding it to the symbol set if it
    /// is missing. Integer coefficients are divided with truncation.
    ///
    /// Fails with [`PolyError::InvalidOperation`] if `symbol` has an exponent
    /// of `-1` in any term.
    pub fn integrate(&self, symbol: &str) -> Result<Self, PolyError> {
        let base = if self.symbols.contains(symbol) {
            self.clone()
        } else {
            self.extend_symbols(&self.symbols.union(&SymbolSet::new([symbol])))?
        };

        let var = base.symbols.index_of(symbol).ok_or_else(|| {
            PolyError::Value(format!("the symbol '{}' could not be added", symbol))
        })?;

        let nvars = base.nvars();
        let mut terms = TermTable::with_segment_bits(base.terms.segment_bits());
        for (k, c) in base.terms.iter() {
            let (d, k) = k.integrate(var, nvars)?;
            let c = base
                .ring
                .quot(c, &base.ring.nth(d))
                .ok_or(PolyError::DivisionByZero)?;
            terms.add_term(&base.ring, k, c);
        }

        Ok(Polynomial { terms, ..base })
    }
}

#[cfg(test)]
mod test {
    use rug::{Integer, Rational};

    use crate::coefficient::Scalar;
    use crate::domains::integer::Z;
    use crate::domains::rational::Q;
    use crate::poly::monomial::DPackedMonomial;
    use crate::poly::polynomial::Polynomial;

    #[test]
    fn derivative() {
        let g = Polynomial::<_, DPackedMonomial>::make_polynomials_in(&Z, ["x", "y"], ["x", "y"])
            .unwrap();
        let (x, y) = (&g[0], &g[1]);

        let p = x * x + y.clone();
        assert_eq!(p.diff("x").unwrap(), x.mul_scalar(&Scalar::from(2)).unwrap());
        assert!(p.diff("z").unwrap().is_zero());
        assert_eq!(p.diff("z").unwrap().symbol_set(), p.symbol_set());

        let q = x.pow_signed(-2).unwrap();
        assert_eq!(
            q.diff("x").unwrap(),
            x.pow_signed(-3).unwrap().mul_scalar(&Scalar::from(-2)).unwrap()
        );
    }

    #[test]
    fn integral() {
        let g = Polynomial::<_, DPackedMonomial>::make_polynomials_in(&Z, ["x", "y"], ["x", "y"])
            .unwrap();
        let (x, y) = (&g[0], &g[1]);

        let p = (x * x).mul_scalar(&Scalar::from(3)).unwrap() + y.clone();
        assert_eq!(p.integrate("x").unwrap(), x * x * x + x * y);

        assert!(x
            .pow_signed(-1)
            .unwrap()
            .integrate("x")
            .unwrap_err()
            .is_invalid_operation());

        // integer coefficients are truncated
        assert!(x.integrate("x").unwrap().is_zero());

        let xq = x.convert(&Q).unwrap();
        let i = xq.integrate("z").unwrap();
        assert_eq!(i.symbol_set().to_vec(), vec!["x", "y", "z"]);
        assert_eq!(i.coefficient(&[1, 0, 1]), Some(&Rational::from(1)));

        let half = xq.integrate("x").unwrap();
        assert_eq!(half.coefficient(&[2, 0]), Some(&Rational::from((1, 2))));
        assert_eq!(
            half.diff("x").unwrap().convert(&Z).unwrap().coefficient(&[1, 0]),
            Some(&Integer::from(1))
        );
    }
}
