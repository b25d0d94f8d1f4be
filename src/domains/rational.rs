use std::fmt::{Display, Error, Formatter};
use std::io::{Read, Write};

use rug::Rational;
use serde::{Deserialize, Serialize};

use crate::coefficient::{Scalar, ScalarKind};
use crate::error::PolyError;
use crate::printer::PrintOptions;

use super::{invalid_data, read_str, write_str, CoefficientRing, Ring};

/// The field of rational numbers.
pub type Q = RationalField;
/// The field of rational numbers.
pub const Q: RationalField = RationalField::new();

/// The field of exact rational numbers.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct RationalField;

impl Default for RationalField {
    fn default() -> Self {
        Self::new()
    }
}

impl RationalField {
    pub const fn new() -> RationalField {
        RationalField
    }
}

impl Display for RationalField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("Q")
    }
}

impl Ring for RationalField {
    type Element = Rational;

    #[inline]
    fn add(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        a.clone() + b
    }

    #[inline]
    fn sub(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        a.clone() - b
    }

    #[inline]
    fn mul(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        a.clone() * b
    }

    #[inline]
    fn add_assign(&self, a: &mut Self::Element, b: &Self::Element) {
        *a += b;
    }

    #[inline]
    fn sub_assign(&self, a: &mut Self::Element, b: &Self::Element) {
        *a -= b;
    }

    #[inline]
    fn mul_assign(&self, a: &mut Self::Element, b: &Self::Element) {
        *a *= b;
    }

    #[inline]
    fn add_mul_assign(&self, a: &mut Self::Element, b: &Self::Element, c: &Self::Element) {
        *a += b.clone() * c;
    }

    #[inline]
    fn neg(&self, a: &Self::Element) -> Self::Element {
        -a.clone()
    }

    #[inline]
    fn zero(&self) -> Self::Element {
        Rational::new()
    }

    #[inline]
    fn one(&self) -> Self::Element {
        Rational::from(1)
    }

    #[inline]
    fn nth(&self, n: i64) -> Self::Element {
        Rational::from(n)
    }

    #[inline]
    fn is_zero(a: &Self::Element) -> bool {
        *a == 0
    }

    #[inline]
    fn is_one(&self, a: &Self::Element) -> bool {
        *a == 1
    }

    fn inv(&self, a: &Self::Element) -> Option<Self::Element> {
        if *a == 0 {
            None
        } else {
            Some(a.clone().recip())
        }
    }

    fn quot(&self, a: &Self::Element, b: &Self::Element) -> Option<Self::Element> {
        if *b == 0 {
            None
        } else {
            Some(a.clone() / b)
        }
    }

    fn format<W: std::fmt::Write>(
        &self,
        element: &Self::Element,
        opts: &PrintOptions,
        in_sum: bool,
        f: &mut W,
    ) -> Result<(), Error> {
        if in_sum && *element >= 0 {
            f.write_char('+')?;
        }

        if opts.latex && *element.denom() != 1 {
            if *element < 0 {
                f.write_char('-')?;
            }
            write!(
                f,
                "\\frac{{{}}}{{{}}}",
                element.numer().clone().abs(),
                element.denom()
            )
        } else {
            write!(f, "{}", element)
        }
    }
}

impl CoefficientRing for RationalField {
    fn name(&self) -> &'static str {
        "rational"
    }

    fn kind(&self) -> ScalarKind {
        ScalarKind::Rational
    }

    fn element_from_scalar(&self, s: &Scalar) -> Result<Self::Element, PolyError> {
        s.to_rational().ok_or_else(|| {
            PolyError::TypeMismatch(format!(
                "the {} scalar {} cannot be converted to a rational coefficient",
                s.kind(),
                s
            ))
        })
    }

    fn element_to_scalar(&self, e: &Self::Element) -> Scalar {
        Scalar::Rational(e.clone())
    }

    fn element_byte_size(&self, e: &Self::Element) -> usize {
        std::mem::size_of::<Rational>() + (e.numer().capacity() + e.denom().capacity()) / 8
    }

    fn write_element<W: Write>(&self, e: &Self::Element, dest: W) -> Result<(), std::io::Error> {
        write_str(&e.to_string_radix(16), dest)
    }

    fn read_element<R: Read>(&self, source: R) -> Result<Self::Element, std::io::Error> {
        let s = read_str(source)?;
        Rational::from_str_radix(&s, 16).map_err(invalid_data)
    }
}
