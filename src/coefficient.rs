//! Raw scalars of any of the supported coefficient kinds.
//!
//! A [`Scalar`] is what a caller hands to the engine when the coefficient kind
//! is only known at runtime. It is converted into the element type of a ring
//! with [`CoefficientRing::element_from_scalar`](crate::domains::CoefficientRing::element_from_scalar).

use std::fmt::{Display, Formatter};

use rug::{Integer, Rational};
use serde::{Deserialize, Serialize};

#[cfg(feature = "real")]
use rug::Float;

/// The kind of a scalar or of the coefficients of a polynomial.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ScalarKind {
    Double,
    Integer,
    Rational,
    Real128,
    Real,
}

impl Display for ScalarKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ScalarKind::Double => "double",
            ScalarKind::Integer => "integer",
            ScalarKind::Rational => "rational",
            ScalarKind::Real128 => "real128",
            ScalarKind::Real => "real",
        })
    }
}

/// A number of one of the supported coefficient kinds.
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    Integer(Integer),
    Rational(Rational),
    Double(f64),
    /// A float with a 113-bit significand.
    #[cfg(feature = "real")]
    Real128(Float),
    /// A float with an arbitrary precision.
    #[cfg(feature = "real")]
    Real(Float),
}

impl Scalar {
    pub fn kind(&self) -> ScalarKind {
        match self {
            Scalar::Integer(_) => ScalarKind::Integer,
            Scalar::Rational(_) => ScalarKind::Rational,
            Scalar::Double(_) => ScalarKind::Double,
            #[cfg(feature = "real")]
            Scalar::Real128(_) => ScalarKind::Real128,
            #[cfg(feature = "real")]
            Scalar::Real(_) => ScalarKind::Real,
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Scalar::Integer(i) => *i == 0,
            Scalar::Rational(r) => *r == 0,
            Scalar::Double(d) => *d == 0.,
            #[cfg(feature = "real")]
            Scalar::Real128(f) | Scalar::Real(f) => f.is_zero(),
        }
    }

    /// Get the value as an integer, if it is an exact integer.
    pub fn to_exact_integer(&self) -> Option<Integer> {
        match self {
            Scalar::Integer(i) => Some(i.clone()),
            Scalar::Rational(r) => {
                if *r.denom() == 1 {
                    Some(r.numer().clone())
                } else {
                    None
                }
            }
            Scalar::Double(d) => {
                if d.is_finite() && d.fract() == 0. {
                    Integer::from_f64(*d)
                } else {
                    None
                }
            }
            #[cfg(feature = "real")]
            Scalar::Real128(f) | Scalar::Real(f) => {
                if f.is_integer() {
                    f.to_integer()
                } else {
                    None
                }
            }
        }
    }

    /// Get the value as a rational number, if it is finite.
    pub fn to_rational(&self) -> Option<Rational> {
        match self {
            Scalar::Integer(i) => Some(Rational::from(i.clone())),
            Scalar::Rational(r) => Some(r.clone()),
            Scalar::Double(d) => Rational::from_f64(*d),
            #[cfg(feature = "real")]
            Scalar::Real128(f) | Scalar::Real(f) => f.to_rational(),
        }
    }

    /// Get the value as the nearest double.
    pub fn to_f64(&self) -> f64 {
        match self {
            Scalar::Integer(i) => i.to_f64(),
            Scalar::Rational(r) => r.to_f64(),
            Scalar::Double(d) => *d,
            #[cfg(feature = "real")]
            Scalar::Real128(f) | Scalar::Real(f) => f.to_f64(),
        }
    }

    /// Create a quadruple-precision scalar.
    #[cfg(feature = "real")]
    pub fn real128(value: f64) -> Scalar {
        Scalar::Real128(Float::with_val(crate::domains::float::REAL128_PREC, value))
    }

    /// Create a multiple-precision scalar with `prec` bits of precision.
    #[cfg(feature = "real")]
    pub fn real(value: f64, prec: u32) -> Scalar {
        Scalar::Real(Float::with_val(prec, value))
    }
}

impl Display for Scalar {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Scalar::Integer(i) => Display::fmt(i, f),
            Scalar::Rational(r) => Display::fmt(r, f),
            Scalar::Double(d) => Display::fmt(d, f),
            #[cfg(feature = "real")]
            Scalar::Real128(r) | Scalar::Real(r) => Display::fmt(r, f),
        }
    }
}

macro_rules! from_integer {
    ($($base: ty),*) => {
        $(
            impl From<$base> for Scalar {
                #[inline]
                fn from(value: $base) -> Self {
                    Scalar::Integer(Integer::from(value))
                }
            }
        )*
    };
}

from_integer!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

impl From<f64> for Scalar {
    #[inline]
    fn from(value: f64) -> Self {
        Scalar::Double(value)
    }
}

impl From<Integer> for Scalar {
    #[inline]
    fn from(value: Integer) -> Self {
        Scalar::Integer(value)
    }
}

impl From<Rational> for Scalar {
    #[inline]
    fn from(value: Rational) -> Self {
        Scalar::Rational(value)
    }
}

impl From<(i64, i64)> for Scalar {
    /// Create a rational scalar from a numerator and a denominator.
    ///
    /// # Panics
    ///
    /// Panics if the denominator is zero.
    #[inline]
    fn from(value: (i64, i64)) -> Self {
        Scalar::Rational(Rational::from(value))
    }
}

#[cfg(feature = "real")]
impl From<Float> for Scalar {
    #[inline]
    fn from(value: Float) -> Self {
        Scalar::Real(value)
    }
}

#[cfg(test)]
mod test {
    use rug::Rational;

    use super::{Scalar, ScalarKind};

    #[test]
    fn exactness() {
        assert_eq!(Scalar::from(4).to_exact_integer(), Some(4.into()));
        assert_eq!(Scalar::from((4, 2)).to_exact_integer(), Some(2.into()));
        assert_eq!(Scalar::from((1, 2)).to_exact_integer(), None);
        assert_eq!(Scalar::from(2.5).to_exact_integer(), None);
        assert_eq!(Scalar::from(2.5).to_rational(), Some(Rational::from((5, 2))));
        assert_eq!(Scalar::from(f64::NAN).to_rational(), None);
        assert_eq!(Scalar::from(3u8).kind(), ScalarKind::Integer);
        assert!(Scalar::from((0, 5)).is_zero());
    }
}
