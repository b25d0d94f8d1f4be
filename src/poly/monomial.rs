//! Packed monomial keys.

use smallvec::SmallVec;

use crate::error::PolyError;

use super::MonomialKey;

/// A monomial that packs all exponents into a single `u64`.
///
/// With `n` symbols, every exponent gets `64 / n` bits. An exponent `e` is
/// stored as `e + 2^(b - 1)` in a lane of `b` bits, and the first exponent
/// occupies the most significant lane, so that comparing the words compares
/// the exponents lexicographically.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
pub struct PackedMonomial(u64);

/// The maximum number of symbols of a [`PackedMonomial`]. Every lane has at
/// least two bits, so that all keys admit the exponents `-1`, `0` and `1`.
pub const MAX_PACKED_SYMBOLS: usize = 32;

impl PackedMonomial {
    /// Get the packed representation.
    #[inline]
    pub fn into_inner(self) -> u64 {
        self.0
    }

    #[inline]
    fn lane_bits(nvars: usize) -> u32 {
        (64 / nvars) as u32
    }

    /// The range `[min, max]` of the exponents of a key with `nvars` symbols.
    pub fn exponent_range(nvars: usize) -> (i64, i64) {
        if nvars == 0 {
            return (0, 0);
        }

        let b = Self::lane_bits(nvars);
        let bias = 1i128 << (b - 1);
        (-bias as i64, (bias - 1) as i64)
    }
}

impl MonomialKey for PackedMonomial {
    const NAME: &'static str = "packed_monomial<i64>";
    const TAG: u8 = 1;

    #[inline]
    fn is_compatible(nvars: usize) -> bool {
        nvars <= MAX_PACKED_SYMBOLS
    }

    fn from_exponents(exponents: &[i64]) -> Result<Self, PolyError> {
        let n = exponents.len();
        if n == 0 {
            return Ok(PackedMonomial(0));
        }

        if !Self::is_compatible(n) {
            return Err(PolyError::Overflow(format!(
                "a packed monomial holds at most {} symbols, got {}",
                MAX_PACKED_SYMBOLS, n
            )));
        }

        let b = Self::lane_bits(n);
        let bias = 1i128 << (b - 1);
        let limit = 1i128 << b;

        let mut num: u64 = 0;
        for (i, e) in exponents.iter().enumerate() {
            let v = *e as i128 + bias;
            if v < 0 || v >= limit {
                return Err(PolyError::Overflow(format!(
                    "the exponent {} does not fit in a {}-bit lane of a packed monomial with {} symbols",
                    e, b, n
                )));
            }

            num |= (v as u64) << (b as usize * (n - 1 - i));
        }

        Ok(PackedMonomial(num))
    }

    fn unpack(&self, nvars: usize, out: &mut [i64]) {
        if nvars == 0 {
            return;
        }

        let b = Self::lane_bits(nvars);
        let bias = 1i128 << (b - 1);
        let mask = if b == 64 { u64::MAX } else { (1u64 << b) - 1 };

        for (i, o) in out.iter_mut().take(nvars).enumerate() {
            let v = (self.0 >> (b as usize * (nvars - 1 - i))) & mask;
            *o = (v as i128 - bias) as i64;
        }
    }

    #[inline]
    fn byte_size(&self) -> usize {
        std::mem::size_of::<Self>()
    }
}

/// A monomial that packs its exponents into 16-bit lanes, four per `u64` word.
///
/// Every exponent must lie in `[-32768, 32767]`. Unused lanes of the last word
/// hold a zero exponent. The number of symbols is unbounded.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
pub struct DPackedMonomial(SmallVec<[u64; 2]>);

const LANES: usize = 4;
const LANE_BIAS: i64 = 1 << 15;

impl DPackedMonomial {
    /// Get the packed words.
    pub fn words(&self) -> &[u64] {
        &self.0
    }
}

impl MonomialKey for DPackedMonomial {
    const NAME: &'static str = "d_packed_monomial<i64, 16>";
    const TAG: u8 = 2;

    #[inline]
    fn is_compatible(_nvars: usize) -> bool {
        true
    }

    fn from_exponents(exponents: &[i64]) -> Result<Self, PolyError> {
        let mut words = SmallVec::with_capacity((exponents.len() + LANES - 1) / LANES);

        for chunk in exponents.chunks(LANES) {
            let mut num: u64 = 0;
            for j in 0..LANES {
                let e = chunk.get(j).copied().unwrap_or(0);
                let v = e.checked_add(LANE_BIAS).unwrap_or(-1);
                if !(0..=u16::MAX as i64).contains(&v) {
                    return Err(PolyError::Overflow(format!(
                        "the exponent {} does not fit in a 16-bit lane of a dynamic packed monomial",
                        e
                    )));
                }

                num = (num << 16) | v as u64;
            }
            words.push(num);
        }

        Ok(DPackedMonomial(words))
    }

    fn unpack(&self, nvars: usize, out: &mut [i64]) {
        for (i, o) in out.iter_mut().take(nvars).enumerate() {
            let word = self.0.get(i / LANES).copied().unwrap_or(0x8000_8000_8000_8000);
            let v = (word >> (16 * (LANES - 1 - i % LANES))) & 0xffff;
            *o = v as i64 - LANE_BIAS;
        }
    }

    fn byte_size(&self) -> usize {
        let heap = if self.0.spilled() {
            self.0.capacity() * std::mem::size_of::<u64>()
        } else {
            0
        };
        std::mem::size_of::<Self>() + heap
    }
}

#[cfg(test)]
mod test {
    use super::{DPackedMonomial, PackedMonomial};
    use crate::poly::MonomialKey;

    #[test]
    fn packed_round_trip() {
        let e = [3, -2, 0, 7];
        let k = PackedMonomial::from_exponents(&e).unwrap();
        assert_eq!(k.exponents(4).as_slice(), &e);

        let one = PackedMonomial::from_exponents(&[i64::MIN]).unwrap();
        assert_eq!(one.exponents(1).as_slice(), &[i64::MIN]);
        assert_eq!(PackedMonomial::exponent_range(8), (-128, 127));
    }

    #[test]
    fn packed_order_is_lexicographic() {
        let a = PackedMonomial::from_exponents(&[1, -5]).unwrap();
        let b = PackedMonomial::from_exponents(&[2, -9]).unwrap();
        let c = PackedMonomial::from_exponents(&[2, 3]).unwrap();
        assert!(a < b && b < c);
    }

    #[test]
    fn packed_overflow() {
        let e = [0i64; 8];
        assert!(PackedMonomial::from_exponents(&e).is_ok());

        let mut e = [0i64; 8];
        e[3] = 128;
        assert!(PackedMonomial::from_exponents(&e)
            .unwrap_err()
            .is_invalid_operation());

        assert!(PackedMonomial::from_exponents(&[0; 33]).is_err());
        assert!(!PackedMonomial::is_compatible(33));

        let mut e = [0i64; 32];
        e[31] = 1;
        e[0] = -2;
        let k = PackedMonomial::from_exponents(&e).unwrap();
        assert_eq!(k.exponents(32).as_slice(), &e);
        assert_eq!(PackedMonomial::exponent_range(32), (-2, 1));

        let x = PackedMonomial::from_exponents(&[100, 0, 0, 0, 0, 0, 0, 0]).unwrap();
        assert!(x.multiply(&x, 8).is_err());
    }

    #[test]
    fn dynamic_packing() {
        let e = [1, -1, 32767, -32768, 5, 0];
        let k = DPackedMonomial::from_exponents(&e).unwrap();
        assert_eq!(k.words().len(), 2);
        assert_eq!(k.exponents(6).as_slice(), &e);
        assert!(DPackedMonomial::from_exponents(&[32768]).is_err());

        let a = DPackedMonomial::from_exponents(&[0, 0, 0, 0, 1]).unwrap();
        let b = DPackedMonomial::from_exponents(&[0, 0, 0, 1, -3]).unwrap();
        assert!(a < b);
    }

    #[test]
    fn calculus_on_keys() {
        let k = DPackedMonomial::from_exponents(&[3, -1]).unwrap();

        let (m, d) = k.differentiate(0, 2).unwrap();
        assert_eq!(m, 3);
        assert_eq!(d.exponents(2).as_slice(), &[2, -1]);

        let (q, i) = k.integrate(0, 2).unwrap();
        assert_eq!(q, 4);
        assert_eq!(i.exponents(2).as_slice(), &[4, -1]);

        assert!(k.integrate(1, 2).unwrap_err().is_invalid_operation());
        assert_eq!(k.degree(2), 2);
        assert_eq!(k.partial_degree(&[false, true], 2), -1);
        assert_eq!(k.partial_degree(&[false, false], 2), 0);
        assert!(DPackedMonomial::unit(3).unwrap().is_unitary(3));
    }
}
