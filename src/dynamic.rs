//! Polynomials whose coefficient kind is only known at runtime.
//!
//! [`AnyPolynomial`] wraps a [`Polynomial`] of every supported coefficient
//! kind. Operations between polynomials of different kinds fail with
//! [`PolyError::TypeMismatch`]. Substitution maps hold [`Scalar`]s, whose
//! kind determines the kind of the result.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::coefficient::{Scalar, ScalarKind};
use crate::domains::float::{DoubleField, RR64};
use crate::domains::integer::{IntegerRing, Z};
use crate::domains::rational::{RationalField, Q};
use crate::domains::{CoefficientRing, Ring};
use crate::error::PolyError;
use crate::poly::polynomial::Polynomial;
use crate::poly::MonomialKey;
use crate::symbols::SymbolSet;

#[cfg(feature = "real")]
use crate::domains::float::FloatField;

/// The precision in bits of real coefficients that are not created from a
/// real scalar.
pub const DEFAULT_REAL_PREC: u32 = 53;

/// Check that a substitution map is not empty and that all its values have
/// the same kind, and return that kind.
pub fn validate_map(map: &HashMap<String, Scalar>) -> Result<ScalarKind, PolyError> {
    let kinds: BTreeSet<ScalarKind> = map.values().map(|v| v.kind()).collect();

    let mut it = kinds.iter();
    match (it.next(), it.next()) {
        (None, _) => Err(PolyError::Value(
            "the substitution map must not be empty".into(),
        )),
        (Some(k), None) => Ok(*k),
        _ => Err(PolyError::TypeMismatch(format!(
            "all values of a substitution map must have the same kind, found {}",
            kinds
                .iter()
                .map(|k| k.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ))),
    }
}

/// Convert the values of a map into elements of `ring`.
fn convert_map<R: CoefficientRing>(
    map: &HashMap<String, Scalar>,
    ring: &R,
) -> Result<HashMap<String, R::Element>, PolyError> {
    map.iter()
        .map(|(k, v)| -> Result<_, PolyError> { Ok((k.clone(), ring.element_from_scalar(v)?)) })
        .collect()
}

#[cfg(not(feature = "real"))]
fn missing_real(kind: ScalarKind) -> PolyError {
    PolyError::TypeMismatch(format!(
        "{} coefficients require the 'real' feature",
        kind
    ))
}

/// The highest precision of the real scalars in `values`.
fn real_precision<'a, I: IntoIterator<Item = &'a Scalar>>(values: I) -> u32 {
    values
        .into_iter()
        .filter_map(|v| match v {
            #[cfg(feature = "real")]
            Scalar::Real(f) => Some(f.prec()),
            _ => None,
        })
        .max()
        .unwrap_or(DEFAULT_REAL_PREC)
}

/// A polynomial with a coefficient kind that is selected at runtime.
#[derive(Clone)]
pub enum AnyPolynomial<K: MonomialKey> {
    Double(Polynomial<DoubleField, K>),
    Integer(Polynomial<IntegerRing, K>),
    Rational(Polynomial<RationalField, K>),
    #[cfg(feature = "real")]
    Real128(Polynomial<FloatField, K>),
    #[cfg(feature = "real")]
    Real(Polynomial<FloatField, K>),
}

macro_rules! dispatch {
    ($s: expr, $p: ident => $e: expr) => {
        match $s {
            AnyPolynomial::Double($p) => $e,
            AnyPolynomial::Integer($p) => $e,
            AnyPolynomial::Rational($p) => $e,
            #[cfg(feature = "real")]
            AnyPolynomial::Real128($p) => $e,
            #[cfg(feature = "real")]
            AnyPolynomial::Real($p) => $e,
        }
    };
}

macro_rules! binary_op {
    ($a: expr, $b: expr, $op: ident) => {
        match ($a, $b) {
            (AnyPolynomial::Double(a), AnyPolynomial::Double(b)) => {
                Ok(AnyPolynomial::Double(a.$op(b)?))
            }
            (AnyPolynomial::Integer(a), AnyPolynomial::Integer(b)) => {
                Ok(AnyPolynomial::Integer(a.$op(b)?))
            }
            (AnyPolynomial::Rational(a), AnyPolynomial::Rational(b)) => {
                Ok(AnyPolynomial::Rational(a.$op(b)?))
            }
            #[cfg(feature = "real")]
            (AnyPolynomial::Real128(a), AnyPolynomial::Real128(b)) => {
                Ok(AnyPolynomial::Real128(a.$op(b)?))
            }
            #[cfg(feature = "real")]
            (AnyPolynomial::Real(a), AnyPolynomial::Real(b)) => Ok(AnyPolynomial::Real(a.$op(b)?)),
            (a, b) => Err(PolyError::TypeMismatch(format!(
                "cannot combine a polynomial with {} coefficients and a polynomial with {} coefficients",
                a.kind(),
                b.kind()
            ))),
        }
    };
}

/// Build the variant of `kind` from `$e`, with `$ring` bound to the ring of that kind.
macro_rules! with_ring {
    ($kind: expr, $prec: expr, $ring: ident => $e: expr) => {
        match $kind {
            ScalarKind::Double => {
                let $ring = &RR64;
                AnyPolynomial::Double($e)
            }
            ScalarKind::Integer => {
                let $ring = &Z;
                AnyPolynomial::Integer($e)
            }
            ScalarKind::Rational => {
                let $ring = &Q;
                AnyPolynomial::Rational($e)
            }
            #[cfg(feature = "real")]
            ScalarKind::Real128 => {
                let $ring = &FloatField::real128();
                AnyPolynomial::Real128($e)
            }
            #[cfg(feature = "real")]
            ScalarKind::Real => {
                let $ring = &FloatField::new($prec);
                AnyPolynomial::Real($e)
            }
            #[cfg(not(feature = "real"))]
            k => return Err(missing_real(k)),
        }
    };
}

impl<K: MonomialKey> AnyPolynomial<K> {
    pub fn kind(&self) -> ScalarKind {
        match self {
            AnyPolynomial::Double(_) => ScalarKind::Double,
            AnyPolynomial::Integer(_) => ScalarKind::Integer,
            AnyPolynomial::Rational(_) => ScalarKind::Rational,
            #[cfg(feature = "real")]
            AnyPolynomial::Real128(_) => ScalarKind::Real128,
            #[cfg(feature = "real")]
            AnyPolynomial::Real(_) => ScalarKind::Real,
        }
    }

    /// Create a constant polynomial of kind `kind` from a scalar, which must
    /// be promotable to that kind.
    pub fn from_scalar(kind: ScalarKind, s: &Scalar) -> Result<Self, PolyError> {
        let prec = real_precision([s]);
        Ok(with_ring!(kind, prec, ring => Polynomial::from_scalar(ring, s)?))
    }

    /// Create one generator of kind `kind` per name, each in its own symbol set.
    pub fn make_polynomials<I, S>(kind: ScalarKind, names: I) -> Result<Vec<Self>, PolyError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .map(|n| -> Result<Self, PolyError> {
                Ok(with_ring!(kind, DEFAULT_REAL_PREC, ring => {
                    Polynomial::monomial(ring, ring.one(), &[1], n.as_ref())?
                }))
            })
            .collect()
    }

    pub fn checked_add(&self, other: &Self) -> Result<Self, PolyError> {
        binary_op!(self, other, checked_add)
    }

    pub fn checked_sub(&self, other: &Self) -> Result<Self, PolyError> {
        binary_op!(self, other, checked_sub)
    }

    pub fn checked_mul(&self, other: &Self) -> Result<Self, PolyError> {
        binary_op!(self, other, checked_mul)
    }

    pub fn pow(&self, n: u64) -> Result<Self, PolyError> {
        Ok(match self {
            AnyPolynomial::Double(p) => AnyPolynomial::Double(p.pow(n)?),
            AnyPolynomial::Integer(p) => AnyPolynomial::Integer(p.pow(n)?),
            AnyPolynomial::Rational(p) => AnyPolynomial::Rational(p.pow(n)?),
            #[cfg(feature = "real")]
            AnyPolynomial::Real128(p) => AnyPolynomial::Real128(p.pow(n)?),
            #[cfg(feature = "real")]
            AnyPolynomial::Real(p) => AnyPolynomial::Real(p.pow(n)?),
        })
    }

    pub fn degree(&self) -> i64 {
        dispatch!(self, p => p.degree())
    }

    pub fn nterms(&self) -> usize {
        dispatch!(self, p => p.nterms())
    }

    pub fn is_zero(&self) -> bool {
        dispatch!(self, p => p.is_zero())
    }

    pub fn symbol_set(&self) -> &SymbolSet {
        dispatch!(self, p => p.symbol_set())
    }

    pub fn byte_size(&self) -> usize {
        dispatch!(self, p => p.byte_size())
    }

    /// Replace symbols by scalars. The coefficients are promoted to the kind
    /// of the values, which is the kind of the result.
    pub fn subs_scalars(&self, map: &HashMap<String, Scalar>) -> Result<Self, PolyError> {
        let kind = validate_map(map)?;
        let prec = real_precision(map.values());

        Ok(with_ring!(kind, prec, ring => {
            let values = convert_map(map, ring)?;
            dispatch!(self, p => p.subs_with(&values, ring)?)
        }))
    }

    /// Evaluate the polynomial in the kind of the values.
    pub fn evaluate_scalars(&self, map: &HashMap<String, Scalar>) -> Result<Scalar, PolyError> {
        let kind = validate_map(map)?;
        let prec = real_precision(map.values());

        macro_rules! eval_in {
            ($ring: expr) => {{
                let ring = $ring;
                let values = convert_map(map, ring)?;
                let r = dispatch!(self, p => p.evaluate_with(&values, ring)?);
                Ok(ring.element_to_scalar(&r))
            }};
        }

        match kind {
            ScalarKind::Double => eval_in!(&RR64),
            ScalarKind::Integer => eval_in!(&Z),
            ScalarKind::Rational => eval_in!(&Q),
            #[cfg(feature = "real")]
            ScalarKind::Real128 => eval_in!(&FloatField::real128()),
            #[cfg(feature = "real")]
            ScalarKind::Real => eval_in!(&FloatField::new(prec)),
            #[cfg(not(feature = "real"))]
            k => Err(missing_real(k)),
        }
    }
}

impl<K: MonomialKey> From<Polynomial<DoubleField, K>> for AnyPolynomial<K> {
    fn from(p: Polynomial<DoubleField, K>) -> Self {
        AnyPolynomial::Double(p)
    }
}

impl<K: MonomialKey> From<Polynomial<IntegerRing, K>> for AnyPolynomial<K> {
    fn from(p: Polynomial<IntegerRing, K>) -> Self {
        AnyPolynomial::Integer(p)
    }
}

impl<K: MonomialKey> From<Polynomial<RationalField, K>> for AnyPolynomial<K> {
    fn from(p: Polynomial<RationalField, K>) -> Self {
        AnyPolynomial::Rational(p)
    }
}

#[cfg(feature = "real")]
impl<K: MonomialKey> From<Polynomial<FloatField, K>> for AnyPolynomial<K> {
    fn from(p: Polynomial<FloatField, K>) -> Self {
        match p.ring.kind() {
            ScalarKind::Real128 => AnyPolynomial::Real128(p),
            _ => AnyPolynomial::Real(p),
        }
    }
}

impl<K: MonomialKey> PartialEq for AnyPolynomial<K> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (AnyPolynomial::Double(a), AnyPolynomial::Double(b)) => a == b,
            (AnyPolynomial::Integer(a), AnyPolynomial::Integer(b)) => a == b,
            (AnyPolynomial::Rational(a), AnyPolynomial::Rational(b)) => a == b,
            #[cfg(feature = "real")]
            (AnyPolynomial::Real128(a), AnyPolynomial::Real128(b)) => a == b,
            #[cfg(feature = "real")]
            (AnyPolynomial::Real(a), AnyPolynomial::Real(b)) => a == b,
            _ => false,
        }
    }
}

impl<K: MonomialKey> fmt::Display for AnyPolynomial<K> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        dispatch!(self, p => fmt::Display::fmt(p, f))
    }
}

impl<K: MonomialKey> fmt::Debug for AnyPolynomial<K> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        dispatch!(self, p => fmt::Debug::fmt(p, f))
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use rug::{Integer, Rational};

    use super::{validate_map, AnyPolynomial};
    use crate::coefficient::{Scalar, ScalarKind};
    use crate::poly::monomial::PackedMonomial;

    type P = AnyPolynomial<PackedMonomial>;

    #[test]
    fn map_validation() {
        let empty = HashMap::new();
        assert!(validate_map(&empty).unwrap_err().is_value_error());

        let map = HashMap::from([
            ("x".to_owned(), Scalar::from(1)),
            ("y".to_owned(), Scalar::from(2.5)),
        ]);
        let err = validate_map(&map).unwrap_err();
        assert!(err.is_type_error());
        assert!(err.to_string().contains("double, integer"));

        let map = HashMap::from([("x".to_owned(), Scalar::from((1, 3)))]);
        assert_eq!(validate_map(&map).unwrap(), ScalarKind::Rational);
    }

    #[test]
    fn kind_mismatch() {
        let x = P::make_polynomials(ScalarKind::Integer, ["x"]).unwrap();
        let y = P::make_polynomials(ScalarKind::Double, ["y"]).unwrap();

        assert!(x[0].checked_add(&y[0]).unwrap_err().is_type_error());
        assert!(x[0].checked_mul(&y[0]).unwrap_err().is_type_error());

        let s = x[0].checked_mul(&x[0]).unwrap();
        assert_eq!(s.kind(), ScalarKind::Integer);
        assert_eq!(s.degree(), 2);
        assert_eq!(s.symbol_set().to_vec(), vec!["x"]);

        let c = P::from_scalar(ScalarKind::Rational, &Scalar::from(3)).unwrap();
        assert_eq!(c.nterms(), 1);
        assert!(P::from_scalar(ScalarKind::Integer, &Scalar::from((1, 2)))
            .unwrap_err()
            .is_type_error());
    }

    #[test]
    fn substitution_follows_values() {
        let g = P::make_polynomials(ScalarKind::Integer, ["x", "y"]).unwrap();
        let p = g[0].checked_mul(&g[1]).unwrap().checked_add(&g[0]).unwrap();

        let map = HashMap::from([("x".to_owned(), Scalar::from((1, 2)))]);
        let r = p.subs_scalars(&map).unwrap();
        assert_eq!(r.kind(), ScalarKind::Rational);
        assert_eq!(r.symbol_set().to_vec(), vec!["y"]);
        assert_eq!(r.nterms(), 2);

        let map = HashMap::from([
            ("x".to_owned(), Scalar::from(2)),
            ("y".to_owned(), Scalar::from(3)),
        ]);
        assert_eq!(
            p.evaluate_scalars(&map).unwrap(),
            Scalar::Integer(Integer::from(8))
        );

        let map = HashMap::from([
            ("x".to_owned(), Scalar::from((1, 2))),
            ("y".to_owned(), Scalar::from(1)),
        ]);
        assert!(p.evaluate_scalars(&map).unwrap_err().is_type_error());

        let map = HashMap::from([
            ("x".to_owned(), Scalar::from((1, 2))),
            ("y".to_owned(), Scalar::from((1, 1))),
        ]);
        assert_eq!(
            p.evaluate_scalars(&map).unwrap(),
            Scalar::Rational(Rational::from(1))
        );
    }

    #[cfg(feature = "real")]
    #[test]
    fn real_values() {
        let g = P::make_polynomials(ScalarKind::Rational, ["x"]).unwrap();
        let map = HashMap::from([("x".to_owned(), Scalar::real(0.5, 200))]);

        let r = g[0].pow(2).unwrap().subs_scalars(&map).unwrap();
        assert_eq!(r.kind(), ScalarKind::Real);
        assert!(r.symbol_set().is_empty());

        let v = g[0].evaluate_scalars(&map).unwrap();
        match v {
            Scalar::Real(f) => {
                assert_eq!(f.prec(), 200);
                assert_eq!(f.to_f64(), 0.5);
            }
            _ => panic!("expected a real scalar"),
        }
    }
}
