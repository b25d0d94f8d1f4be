//! Defines the coefficient rings of polynomials.
//!
//! The core trait is [Ring], which has two binary operations, addition and multiplication.
//! Each ring has an associated element type, that should not be confused with the ring type itself.
//! For example:
//! - The ring of integers [Z](type@integer::Z) has elements of type [rug::Integer].
//! - The ring of rational numbers [Q](type@rational::Q) has elements of type [rug::Rational].
//! - The field of doubles [RR64](type@float::RR64) has elements of type [F64](float::F64).
//!
//! The ring elements do not implement operations such as addition or multiplication,
//! but rather the ring itself does. All polynomial structures are generic over the ring type.
//!
//! The extension [`CoefficientRing`] connects a ring to the closed set of
//! [`Scalar`] kinds, which is used for promotion of raw scalars, powers with
//! non-integer exponents, and binary serialization.
pub mod float;
pub mod integer;
pub mod rational;

use std::fmt::{Debug, Display, Error};
use std::hash::Hash;
use std::io::{Read, Write};

use crate::coefficient::{Scalar, ScalarKind};
use crate::error::PolyError;
use crate::printer::PrintOptions;

/// A ring is a set with two binary operations, addition and multiplication.
///
/// Each ring has an element type, that should not be confused with the ring type itself.
pub trait Ring: Clone + PartialEq + Eq + Hash + Debug + Display + Send + Sync {
    /// The element of a ring. For example, the elements of the ring of integers [Z](type@integer::Z), `Z::Element`, are [rug::Integer].
    type Element: Clone + PartialEq + Debug + Send + Sync;

    fn add(&self, a: &Self::Element, b: &Self::Element) -> Self::Element;
    fn sub(&self, a: &Self::Element, b: &Self::Element) -> Self::Element;
    fn mul(&self, a: &Self::Element, b: &Self::Element) -> Self::Element;
    fn add_assign(&self, a: &mut Self::Element, b: &Self::Element);
    fn sub_assign(&self, a: &mut Self::Element, b: &Self::Element);
    fn mul_assign(&self, a: &mut Self::Element, b: &Self::Element);
    /// Compute `a += b * c`.
    fn add_mul_assign(&self, a: &mut Self::Element, b: &Self::Element, c: &Self::Element);
    fn neg(&self, a: &Self::Element) -> Self::Element;
    fn zero(&self) -> Self::Element;
    fn one(&self) -> Self::Element;
    /// Return the nth element by computing `n * 1`.
    fn nth(&self, n: i64) -> Self::Element;
    fn is_zero(a: &Self::Element) -> bool;
    fn is_one(&self, a: &Self::Element) -> bool;

    /// Compute `b^e` by repeated squaring.
    fn pow(&self, b: &Self::Element, mut e: u64) -> Self::Element {
        if e == 0 {
            return self.one();
        }

        let mut x = b.clone();
        let mut y = self.one();
        while e != 1 {
            if e % 2 == 1 {
                self.mul_assign(&mut y, &x);
                e -= 1;
            }

            x = self.mul(&x, &x);
            e /= 2;
        }

        self.mul(&x, &y)
    }

    /// Compute the multiplicative inverse of `a`, if it exists in the ring.
    fn inv(&self, a: &Self::Element) -> Option<Self::Element>;

    /// Divide `a` by `b`. For fields this is exact division, for the integers
    /// the quotient is truncated towards zero. Returns `None` if `b` is zero.
    fn quot(&self, a: &Self::Element, b: &Self::Element) -> Option<Self::Element>;

    /// Format a ring element. If `in_sum` is set, an explicit sign is printed.
    fn format<W: std::fmt::Write>(
        &self,
        element: &Self::Element,
        opts: &PrintOptions,
        in_sum: bool,
        f: &mut W,
    ) -> Result<(), Error>;

    /// Compute `b^e` for a signed exponent, inverting `b` for negative `e`.
    fn pow_signed(&self, b: &Self::Element, e: i64) -> Result<Self::Element, PolyError> {
        if e >= 0 {
            return Ok(self.pow(b, e as u64));
        }

        let inv = self.inv(b).ok_or_else(|| {
            if Self::is_zero(b) {
                PolyError::DivisionByZero
            } else {
                PolyError::InvalidOperation(format!(
                    "cannot raise {:?} to the negative power {} in {}",
                    b, e, self
                ))
            }
        })?;
        Ok(self.pow(&inv, e.unsigned_abs()))
    }
}

/// A ring whose elements can be converted from and to [`Scalar`]s.
pub trait CoefficientRing: Ring {
    /// The name of the coefficient type.
    fn name(&self) -> &'static str;

    /// The scalar kind of the elements of this ring.
    fn kind(&self) -> ScalarKind;

    /// Convert a scalar of any kind into an element of this ring.
    ///
    /// Fails with [`PolyError::TypeMismatch`] if there is no promotion
    /// from the scalar to this ring.
    fn element_from_scalar(&self, s: &Scalar) -> Result<Self::Element, PolyError>;

    /// Convert an element of this ring into a scalar.
    fn element_to_scalar(&self, e: &Self::Element) -> Scalar;

    /// Raise `b` to a scalar power. Fractional exponents are only supported
    /// by floating-point rings.
    fn pow_scalar(&self, b: &Self::Element, e: &Scalar) -> Result<Self::Element, PolyError> {
        match e.to_exact_integer() {
            Some(n) => {
                let n = n.to_i64().ok_or_else(|| {
                    PolyError::Overflow(format!("the exponent {} is too large", n))
                })?;
                self.pow_signed(b, n)
            }
            None => Err(PolyError::InvalidOperation(format!(
                "cannot raise a {} coefficient to the non-integral power {}",
                self.name(),
                e
            ))),
        }
    }

    /// An estimate of the number of bytes used by an element.
    fn element_byte_size(&self, e: &Self::Element) -> usize;

    fn write_element<W: Write>(&self, e: &Self::Element, dest: W) -> Result<(), std::io::Error>;

    fn read_element<R: Read>(&self, source: R) -> Result<Self::Element, std::io::Error>;
}

/// Write a length-prefixed string.
pub(crate) fn write_str<W: Write>(s: &str, mut dest: W) -> Result<(), std::io::Error> {
    use byteorder::{LittleEndian, WriteBytesExt};

    dest.write_u64::<LittleEndian>(s.len() as u64)?;
    dest.write_all(s.as_bytes())
}

/// Read a length-prefixed string.
pub(crate) fn read_str<R: Read>(mut source: R) -> Result<String, std::io::Error> {
    use byteorder::{LittleEndian, ReadBytesExt};

    let len = source.read_u64::<LittleEndian>()? as usize;
    let mut buf = vec![0; len];
    source.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

/// Create an I/O error for malformed input.
pub(crate) fn invalid_data<E: Display>(e: E) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
}
