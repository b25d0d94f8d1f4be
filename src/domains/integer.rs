use std::fmt::{Display, Error, Formatter, Write as _};
use std::io::{Read, Write};

use rug::Integer;
use serde::{Deserialize, Serialize};

use crate::coefficient::{Scalar, ScalarKind};
use crate::error::PolyError;
use crate::printer::PrintOptions;

use super::{invalid_data, read_str, write_str, CoefficientRing, Ring};

/// The integer ring.
pub type Z = IntegerRing;
/// The integer ring.
pub const Z: IntegerRing = IntegerRing::new();

/// The ring of arbitrary-precision integers.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct IntegerRing;

impl Default for IntegerRing {
    fn default() -> Self {
        Self::new()
    }
}

impl IntegerRing {
    pub const fn new() -> IntegerRing {
        IntegerRing
    }
}

impl Display for IntegerRing {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("Z")
    }
}

impl Ring for IntegerRing {
    type Element = Integer;

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
        *a += b * c;
    }

    #[inline]
    fn neg(&self, a: &Self::Element) -> Self::Element {
        -a.clone()
    }

    #[inline]
    fn zero(&self) -> Self::Element {
        Integer::new()
    }

    #[inline]
    fn one(&self) -> Self::Element {
        Integer::from(1)
    }

    #[inline]
    fn nth(&self, n: i64) -> Self::Element {
        Integer::from(n)
    }

    fn pow(&self, b: &Self::Element, e: u64) -> Self::Element {
        if e <= u32::MAX as u64 {
            use rug::ops::Pow;
            b.clone().pow(e as u32)
        } else if *b == 0 || *b == 1 {
            b.clone()
        } else if *b == -1 {
            if e % 2 == 0 {
                Integer::from(1)
            } else {
                Integer::from(-1)
            }
        } else {
            panic!("The power {}^{} does not fit in memory", b, e);
        }
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
        if *a == 1 || *a == -1 {
            Some(a.clone())
        } else {
            None
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
        _opts: &PrintOptions,
        in_sum: bool,
        f: &mut W,
    ) -> Result<(), Error> {
        if in_sum && *element >= 0 {
            f.write_char('+')?;
        }
        write!(f, "{}", element)
    }
}

impl CoefficientRing for IntegerRing {
    fn name(&self) -> &'static str {
        "integer"
    }

    fn kind(&self) -> ScalarKind {
        ScalarKind::Integer
    }

    fn element_from_scalar(&self, s: &Scalar) -> Result<Self::Element, PolyError> {
        s.to_exact_integer().ok_or_else(|| {
            PolyError::TypeMismatch(format!(
                "the {} scalar {} cannot be converted to an integer coefficient",
                s.kind(),
                s
            ))
        })
    }

    fn element_to_scalar(&self, e: &Self::Element) -> Scalar {
        Scalar::Integer(e.clone())
    }

    fn element_byte_size(&self, e: &Self::Element) -> usize {
        std::mem::size_of::<Integer>() + e.capacity() / 8
    }

    fn write_element<W: Write>(&self, e: &Self::Element, dest: W) -> Result<(), std::io::Error> {
        write_str(&e.to_string_radix(16), dest)
    }

    fn read_element<R: Read>(&self, source: R) -> Result<Self::Element, std::io::Error> {
        let s = read_str(source)?;
        Integer::from_str_radix(&s, 16).map_err(invalid_data)
    }
}

#[cfg(test)]
mod test {
    use rug::Integer;

    use super::Z;
    use crate::coefficient::Scalar;
    use crate::domains::{CoefficientRing, Ring};

    #[test]
    fn ring_ops() {
        let a = Integer::from(7);
        let b = Integer::from(-2);

        assert_eq!(Z.add(&a, &b), 5);
        assert_eq!(Z.mul(&a, &b), -14);
        assert_eq!(Z.quot(&a, &b), Some(Integer::from(-3)));
        assert_eq!(Z.quot(&a, &Z.zero()), None);
        assert_eq!(Z.pow(&b, 5), -32);
        assert_eq!(Z.inv(&a), None);
        assert_eq!(Z.inv(&Integer::from(-1)), Some(Integer::from(-1)));
        assert!(Z.pow_signed(&a, -1).unwrap_err().is_invalid_operation());

        let mut c = Z.one();
        Z.add_mul_assign(&mut c, &a, &b);
        assert_eq!(c, -13);
    }

    #[test]
    fn promotion() {
        assert_eq!(Z.element_from_scalar(&Scalar::from((4, 2))).unwrap(), 2);
        assert_eq!(Z.element_from_scalar(&Scalar::from(3.)).unwrap(), 3);
        assert!(Z
            .element_from_scalar(&Scalar::from(0.5))
            .unwrap_err()
            .is_type_error());
    }

    #[test]
    fn binary_round_trip() {
        let a = Integer::from(-12345678901234567890i128);
        let mut buf = vec![];
        Z.write_element(&a, &mut buf).unwrap();
        assert_eq!(Z.read_element(buf.as_slice()).unwrap(), a);
    }
}
