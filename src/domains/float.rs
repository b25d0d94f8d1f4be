//! Floating-point coefficient fields.

use std::fmt::{self, Display, Error, Formatter, LowerExp};
use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};

use crate::coefficient::{Scalar, ScalarKind};
use crate::error::PolyError;
use crate::printer::PrintOptions;

use super::{CoefficientRing, Ring};

#[cfg(feature = "real")]
use super::{invalid_data, read_str, write_str};
#[cfg(feature = "real")]
use rug::{ops::Pow, Float};

/// The number of bits in the significand of a quadruple-precision float.
pub const REAL128_PREC: u32 = 113;

/// The field of double-precision floats.
pub type RR64 = DoubleField;
/// The field of double-precision floats.
pub const RR64: DoubleField = DoubleField::new();

/// A wrapper around `f64` that implements `Eq`.
/// All `NaN` values are considered equal, and `-0` is considered equal to `0`.
#[derive(Debug, Copy, Clone, Default)]
pub struct F64(f64);

impl F64 {
    #[inline]
    pub fn into_inner(self) -> f64 {
        self.0
    }
}

impl From<f64> for F64 {
    #[inline(always)]
    fn from(value: f64) -> Self {
        F64(value)
    }
}

impl PartialEq for F64 {
    fn eq(&self, other: &Self) -> bool {
        if self.0.is_nan() && other.0.is_nan() {
            true
        } else {
            self.0 == other.0
        }
    }
}

impl Eq for F64 {}

impl PartialEq<f64> for F64 {
    fn eq(&self, other: &f64) -> bool {
        *self == F64(*other)
    }
}

impl PartialOrd for F64 {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.0.partial_cmp(&other.0)
    }
}

impl Display for F64 {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl LowerExp for F64 {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        LowerExp::fmt(&self.0, f)
    }
}

/// The field of double-precision floats, with elements [`F64`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DoubleField;

impl Default for DoubleField {
    fn default() -> Self {
        Self::new()
    }
}

impl DoubleField {
    pub const fn new() -> DoubleField {
        DoubleField
    }
}

impl Display for DoubleField {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("RR64")
    }
}

impl Ring for DoubleField {
    type Element = F64;

    #[inline(always)]
    fn add(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        F64(a.0 + b.0)
    }

    #[inline(always)]
    fn sub(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        F64(a.0 - b.0)
    }

    #[inline(always)]
    fn mul(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        F64(a.0 * b.0)
    }

    #[inline(always)]
    fn add_assign(&self, a: &mut Self::Element, b: &Self::Element) {
        a.0 += b.0;
    }

    #[inline(always)]
    fn sub_assign(&self, a: &mut Self::Element, b: &Self::Element) {
        a.0 -= b.0;
    }

    #[inline(always)]
    fn mul_assign(&self, a: &mut Self::Element, b: &Self::Element) {
        a.0 *= b.0;
    }

    #[inline(always)]
    fn add_mul_assign(&self, a: &mut Self::Element, b: &Self::Element, c: &Self::Element) {
        a.0 = b.0.mul_add(c.0, a.0);
    }

    #[inline(always)]
    fn neg(&self, a: &Self::Element) -> Self::Element {
        F64(-a.0)
    }

    #[inline(always)]
    fn zero(&self) -> Self::Element {
        F64(0.)
    }

    #[inline(always)]
    fn one(&self) -> Self::Element {
        F64(1.)
    }

    #[inline(always)]
    fn nth(&self, n: i64) -> Self::Element {
        F64(n as f64)
    }

    fn pow(&self, b: &Self::Element, e: u64) -> Self::Element {
        if e <= i32::MAX as u64 {
            F64(b.0.powi(e as i32))
        } else {
            F64(b.0.powf(e as f64))
        }
    }

    #[inline(always)]
    fn is_zero(a: &Self::Element) -> bool {
        a.0 == 0.
    }

    #[inline(always)]
    fn is_one(&self, a: &Self::Element) -> bool {
        a.0 == 1.
    }

    fn inv(&self, a: &Self::Element) -> Option<Self::Element> {
        if a.0 == 0. {
            None
        } else {
            Some(F64(a.0.recip()))
        }
    }

    fn quot(&self, a: &Self::Element, b: &Self::Element) -> Option<Self::Element> {
        if b.0 == 0. {
            None
        } else {
            Some(F64(a.0 / b.0))
        }
    }

    fn format<W: std::fmt::Write>(
        &self,
        element: &Self::Element,
        opts: &PrintOptions,
        in_sum: bool,
        f: &mut W,
    ) -> Result<(), Error> {
        if in_sum && !element.0.is_sign_negative() {
            f.write_char('+')?;
        }

        if let Some(p) = opts.precision {
            write!(f, "{:.*}", p, element.0)
        } else {
            write!(f, "{}", element.0)
        }
    }
}

impl CoefficientRing for DoubleField {
    fn name(&self) -> &'static str {
        "double"
    }

    fn kind(&self) -> ScalarKind {
        ScalarKind::Double
    }

    fn element_from_scalar(&self, s: &Scalar) -> Result<Self::Element, PolyError> {
        Ok(F64(s.to_f64()))
    }

    fn element_to_scalar(&self, e: &Self::Element) -> Scalar {
        Scalar::Double(e.0)
    }

    fn pow_scalar(&self, b: &Self::Element, e: &Scalar) -> Result<Self::Element, PolyError> {
        if let Some(n) = e.to_exact_integer().and_then(|n| n.to_i32()) {
            return Ok(F64(b.0.powi(n)));
        }

        Ok(F64(b.0.powf(e.to_f64())))
    }

    fn element_byte_size(&self, _e: &Self::Element) -> usize {
        std::mem::size_of::<F64>()
    }

    fn write_element<W: Write>(&self, e: &Self::Element, mut dest: W) -> Result<(), std::io::Error> {
        dest.write_f64::<LittleEndian>(e.0)
    }

    fn read_element<R: Read>(&self, mut source: R) -> Result<Self::Element, std::io::Error> {
        Ok(F64(source.read_f64::<LittleEndian>()?))
    }
}

/// The field of multiple-precision floats with a fixed number of bits in the
/// significand.
///
/// Two flavours exist: the quadruple-precision field created with
/// [`FloatField::real128`], whose elements are of kind [`ScalarKind::Real128`],
/// and fields of arbitrary precision created with [`FloatField::new`], whose
/// elements are of kind [`ScalarKind::Real`].
#[cfg(feature = "real")]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FloatField {
    prec: u32,
    kind: ScalarKind,
}

#[cfg(feature = "real")]
impl FloatField {
    /// Create a field of floats with `prec` bits of precision.
    ///
    /// # Panics
    ///
    /// Panics if `prec` is outside the range supported by MPFR.
    pub fn new(prec: u32) -> FloatField {
        assert!(
            (rug::float::prec_min()..=rug::float::prec_max()).contains(&prec),
            "unsupported float precision {}",
            prec
        );
        FloatField {
            prec,
            kind: ScalarKind::Real,
        }
    }

    /// Create the field of quadruple-precision floats.
    pub const fn real128() -> FloatField {
        FloatField {
            prec: REAL128_PREC,
            kind: ScalarKind::Real128,
        }
    }

    #[inline]
    pub fn precision(&self) -> u32 {
        self.prec
    }
}

#[cfg(feature = "real")]
impl Display for FloatField {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.kind {
            ScalarKind::Real128 => f.write_str("RR128"),
            _ => write!(f, "RR[{}]", self.prec),
        }
    }
}

#[cfg(feature = "real")]
impl Ring for FloatField {
    type Element = Float;

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
        Float::new(self.prec)
    }

    #[inline]
    fn one(&self) -> Self::Element {
        Float::with_val(self.prec, 1)
    }

    #[inline]
    fn nth(&self, n: i64) -> Self::Element {
        Float::with_val(self.prec, n)
    }

    fn pow(&self, b: &Self::Element, e: u64) -> Self::Element {
        if e <= u32::MAX as u64 {
            b.clone().pow(e as u32)
        } else {
            b.clone().pow(&Float::with_val(self.prec, e))
        }
    }

    #[inline]
    fn is_zero(a: &Self::Element) -> bool {
        a.is_zero()
    }

    #[inline]
    fn is_one(&self, a: &Self::Element) -> bool {
        *a == 1
    }

    fn inv(&self, a: &Self::Element) -> Option<Self::Element> {
        if a.is_zero() {
            None
        } else {
            Some(a.clone().recip())
        }
    }

    fn quot(&self, a: &Self::Element, b: &Self::Element) -> Option<Self::Element> {
        if b.is_zero() {
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
        if in_sum && !element.is_sign_negative() {
            f.write_char('+')?;
        }

        if let Some(p) = opts.precision {
            write!(f, "{:.*}", p, element)
        } else {
            write!(f, "{}", element)
        }
    }
}

#[cfg(feature = "real")]
impl CoefficientRing for FloatField {
    fn name(&self) -> &'static str {
        match self.kind {
            ScalarKind::Real128 => "real128",
            _ => "real",
        }
    }

    fn kind(&self) -> ScalarKind {
        self.kind
    }

    fn element_from_scalar(&self, s: &Scalar) -> Result<Self::Element, PolyError> {
        let f = match s {
            Scalar::Integer(i) => Float::with_val(self.prec, i),
            Scalar::Rational(r) => Float::with_val(self.prec, r),
            Scalar::Double(d) => Float::with_val(self.prec, *d),
            Scalar::Real128(f) | Scalar::Real(f) => Float::with_val(self.prec, f),
        };

        if f.is_finite() {
            Ok(f)
        } else {
            Err(PolyError::TypeMismatch(format!(
                "the non-finite {} scalar {} cannot be converted to a {} coefficient",
                s.kind(),
                s,
                self.name()
            )))
        }
    }

    fn element_to_scalar(&self, e: &Self::Element) -> Scalar {
        match self.kind {
            ScalarKind::Real128 => Scalar::Real128(e.clone()),
            _ => Scalar::Real(e.clone()),
        }
    }

    fn pow_scalar(&self, b: &Self::Element, e: &Scalar) -> Result<Self::Element, PolyError> {
        if let Some(n) = e.to_exact_integer().and_then(|n| n.to_i32()) {
            return Ok(b.clone().pow(n));
        }

        let e = self.element_from_scalar(e)?;
        Ok(b.clone().pow(&e))
    }

    fn element_byte_size(&self, e: &Self::Element) -> usize {
        std::mem::size_of::<Float>() + (e.prec() as usize + 7) / 8
    }

    fn write_element<W: Write>(&self, e: &Self::Element, dest: W) -> Result<(), std::io::Error> {
        write_str(&e.to_string_radix(16, None), dest)
    }

    fn read_element<R: Read>(&self, source: R) -> Result<Self::Element, std::io::Error> {
        let s = read_str(source)?;
        let parsed = Float::parse_radix(&s, 16).map_err(invalid_data)?;
        Ok(Float::with_val(self.prec, parsed))
    }
}

#[cfg(test)]
mod test {
    use super::{F64, RR64};
    use crate::coefficient::Scalar;
    use crate::domains::{CoefficientRing, Ring};

    #[test]
    fn nan_is_equal() {
        assert_eq!(F64::from(f64::NAN), F64::from(f64::NAN));
        assert_eq!(F64::from(-0.), F64::from(0.));
    }

    #[test]
    fn double_ops() {
        let a = F64::from(2.);
        assert_eq!(RR64.mul(&a, &a), 4.);
        assert_eq!(RR64.pow_signed(&a, -2).unwrap(), 0.25);
        assert!(RR64.pow_signed(&RR64.zero(), -1).is_err());
        assert_eq!(
            RR64.pow_scalar(&F64::from(4.), &Scalar::from((1, 2))).unwrap(),
            2.
        );
        assert_eq!(
            RR64.element_from_scalar(&Scalar::from((1, 4))).unwrap(),
            0.25
        );
    }

    #[cfg(feature = "real")]
    #[test]
    fn quadruple_precision() {
        use super::{FloatField, REAL128_PREC};
        use crate::coefficient::ScalarKind;

        let f = FloatField::real128();
        assert_eq!(f.kind(), ScalarKind::Real128);

        let third = f.element_from_scalar(&Scalar::from((1, 3))).unwrap();
        assert_eq!(third.prec(), REAL128_PREC);

        let sq = f.pow_scalar(&f.nth(9), &Scalar::real128(0.5)).unwrap();
        assert_eq!(sq, 3);

        assert!(f
            .element_from_scalar(&Scalar::from(f64::NAN))
            .unwrap_err()
            .is_type_error());

        let mut buf = vec![];
        f.write_element(&third, &mut buf).unwrap();
        assert_eq!(f.read_element(buf.as_slice()).unwrap(), third);
    }

    #[cfg(feature = "real")]
    #[test]
    fn arbitrary_precision() {
        use super::FloatField;
        use crate::coefficient::ScalarKind;

        let f = FloatField::new(256);
        assert_eq!(f.kind(), ScalarKind::Real);
        assert_eq!(f.one().prec(), 256);
        assert_eq!(f.inv(&f.zero()), None);
        assert_eq!(f.quot(&f.nth(1), &f.nth(4)).unwrap(), 0.25);
    }
}
