use std::collections::HashMap;
use std::io::Cursor;

use proptest::prelude::*;
use rug::Integer;

use polyseries::{
    coefficient::Scalar,
    domains::{
        float::RR64,
        integer::{IntegerRing, Z},
        rational::Q,
        CoefficientRing,
    },
    poly::{
        monomial::{DPackedMonomial, PackedMonomial},
        polynomial::Polynomial,
        MonomialKey,
    },
    settings::Settings,
};

#[cfg(feature = "real")]
use polyseries::domains::float::FloatField;

fn s(v: i64) -> Scalar {
    Scalar::from(v)
}

fn check_construction<R: CoefficientRing, K: MonomialKey>(ring: &R) {
    let p = Polynomial::<R, K>::new(ring);
    assert_eq!(p.nterms(), 0);
    assert!(p.eq_scalar(&s(0)));
    assert!(p.symbol_set().is_empty());

    let c = Polynomial::<R, K>::from_scalar(ring, &s(3)).unwrap();
    assert_eq!(c.nterms(), 1);
    assert!(c.eq_scalar(&s(3)));

    let own = Polynomial::<R, K>::make_polynomials(ring, ["x", "y", "z"]).unwrap();
    for (p, n) in own.iter().zip(["x", "y", "z"]) {
        assert_eq!(p.nterms(), 1);
        assert_eq!(p.symbol_set().to_vec(), vec![n]);
    }

    let full =
        Polynomial::<R, K>::make_polynomials_in(ring, ["x", "y", "z"], ["x", "y", "z"]).unwrap();
    for p in &full {
        assert_eq!(p.nterms(), 1);
        assert_eq!(p.symbol_set().to_vec(), vec!["x", "y", "z"]);
    }
}

fn check_arithmetic<R: CoefficientRing, K: MonomialKey>(ring: &R) {
    let g = Polynomial::<R, K>::make_polynomials(ring, ["x", "y"]).unwrap();
    let (x, y) = (&g[0], &g[1]);

    assert_eq!(x + y, y + x);
    assert_eq!(x * y, y * x);
    assert_eq!(-x, x.mul_scalar(&s(-1)).unwrap());

    let mut a = x.clone();
    a += y;
    assert_eq!(a, x + y);
    let mut a = x.clone();
    a *= y;
    assert_eq!(a, x * y);
    let mut a = x.clone();
    a -= x;
    assert!(a.is_zero());

    let lhs = x.mul_scalar(&s(2)).unwrap().pow(3).unwrap();
    let rhs = (x * x * x).mul_scalar(&s(8)).unwrap();
    assert_eq!(lhs, rhs);

    let orig = x + y;
    let mut copy = orig.clone();
    copy *= x;
    copy += y;
    assert_eq!(orig, x + y);
    assert_ne!(orig, copy);
}

fn check_degrees<R: CoefficientRing, K: MonomialKey>(ring: &R) {
    let g =
        Polynomial::<R, K>::make_polynomials_in(ring, ["x", "y", "z"], ["x", "y", "z"]).unwrap();
    let (x, y, z) = (&g[0], &g[1], &g[2]);

    assert_eq!((x * y * z).degree(), 3);
    assert_eq!(x.pow_signed(-1).unwrap().degree(), -1);
    assert_eq!((x * y * z).p_degree(["x", "y"]), 2);
    assert_eq!(x.trim().unwrap().symbol_set().to_vec(), vec!["x"]);

    let p = (x - y) * (x + y);
    assert_eq!(p.truncate_degree(2), x * x - y * y);
    assert!((p + x.clone()).truncate_degree(0).is_zero());
}

fn check_substitution<R: CoefficientRing, K: MonomialKey>(ring: &R) {
    let g = Polynomial::<R, K>::make_polynomials(ring, ["x", "y"]).unwrap();
    let (x, y) = (&g[0], &g[1]);

    let map = HashMap::from([("x".to_owned(), y.clone())]);
    assert_eq!(x.subs(&map).unwrap(), *y);

    let two = ring.element_from_scalar(&s(2)).unwrap();
    let map = HashMap::from([("x".to_owned(), two.clone())]);
    let r = x.subs_with(&map, ring).unwrap();
    assert!(r.eq_scalar(&s(2)));

    let map = HashMap::from([
        ("x".to_owned(), two),
        ("y".to_owned(), ring.element_from_scalar(&s(3)).unwrap()),
    ]);
    let v = (x + y).evaluate(&map).unwrap();
    assert_eq!(ring.element_to_scalar(&v).to_f64(), 5.);

    let map = HashMap::from([("x".to_owned(), ring.element_from_scalar(&s(1)).unwrap())]);
    assert!((x + y).evaluate(&map).unwrap_err().is_value_error());
}

fn check_calculus<R: CoefficientRing, K: MonomialKey>(ring: &R) {
    let g = Polynomial::<R, K>::make_polynomials_in(ring, ["x", "y"], ["x", "y"]).unwrap();
    let (x, y) = (&g[0], &g[1]);

    assert_eq!((x * x + y.clone()).diff("x").unwrap(), x.mul_scalar(&s(2)).unwrap());

    let p = (x * x).mul_scalar(&s(3)).unwrap() + y.clone();
    assert_eq!(p.integrate("x").unwrap(), x * x * x + x * y);

    assert!(x
        .pow_signed(-1)
        .unwrap()
        .integrate("x")
        .unwrap_err()
        .is_invalid_operation());
}

fn check_serialization<R: CoefficientRing, K: MonomialKey>(ring: &R) {
    let g = Polynomial::<R, K>::make_polynomials(ring, ["x", "y"]).unwrap();
    let p = (&g[0] - &g[1]).pow(3).unwrap() + g[0].pow_signed(-2).unwrap();

    let mut buf = vec![];
    p.write(&mut buf).unwrap();
    assert_eq!(Polynomial::<R, K>::read(ring, Cursor::new(&buf)).unwrap(), p);
}

macro_rules! ring_key_tests {
    ($name: ident, $ring: expr, $key: ty) => {
        mod $name {
            use super::*;

            #[test]
            fn construction() {
                check_construction::<_, $key>(&$ring);
            }

            #[test]
            fn arithmetic() {
                check_arithmetic::<_, $key>(&$ring);
            }

            #[test]
            fn degrees() {
                check_degrees::<_, $key>(&$ring);
            }

            #[test]
            fn substitution() {
                check_substitution::<_, $key>(&$ring);
            }

            #[test]
            fn calculus() {
                check_calculus::<_, $key>(&$ring);
            }

            #[test]
            fn serialization() {
                check_serialization::<_, $key>(&$ring);
            }
        }
    };
}

ring_key_tests!(integer_packed, Z, PackedMonomial);
ring_key_tests!(integer_dpacked, Z, DPackedMonomial);
ring_key_tests!(rational_packed, Q, PackedMonomial);
ring_key_tests!(rational_dpacked, Q, DPackedMonomial);
ring_key_tests!(double_packed, RR64, PackedMonomial);
ring_key_tests!(double_dpacked, RR64, DPackedMonomial);
#[cfg(feature = "real")]
ring_key_tests!(real128_packed, FloatField::real128(), PackedMonomial);
#[cfg(feature = "real")]
ring_key_tests!(real128_dpacked, FloatField::real128(), DPackedMonomial);
#[cfg(feature = "real")]
ring_key_tests!(real_packed, FloatField::new(200), PackedMonomial);
#[cfg(feature = "real")]
ring_key_tests!(real_dpacked, FloatField::new(200), DPackedMonomial);

#[test]
fn packed_exponent_overflow() {
    let names: Vec<String> = (0..16).map(|i| format!("x{:02}", i)).collect();
    let g = Polynomial::<_, PackedMonomial>::make_polynomials_in(&Z, &names[..], ["x00"]).unwrap();

    // four bits per symbol
    assert!(g[0].pow(7).is_ok());
    assert!(g[0].pow(8).unwrap_err().is_invalid_operation());
    assert!(g[0].pow_signed(-9).unwrap_err().is_invalid_operation());

    let d = g[0].rekey::<DPackedMonomial>().unwrap();
    assert_eq!(d.pow(1000).unwrap().degree(), 1000);
}

#[test]
fn packed_symbol_limit() {
    let names: Vec<String> = (0..33).map(|i| format!("x{:02}", i)).collect();
    let err = Polynomial::<_, PackedMonomial>::make_polynomials_in(&Z, &names[..], &names[..])
        .unwrap_err();
    assert!(err.is_invalid_operation());

    let g = Polynomial::<_, PackedMonomial>::make_polynomials_in(&Z, &names[..32], &names[..32])
        .unwrap();
    assert_eq!(g.len(), 32);
    let p = (&g[0] * &g[31]).checked_mul(&g[5].pow_signed(-1).unwrap()).unwrap();
    assert_eq!(p.degree(), 1);
    assert!(g[0].pow(2).unwrap_err().is_invalid_operation());

    let d = Polynomial::<_, DPackedMonomial>::make_polynomials_in(&Z, &names[..], &names[..])
        .unwrap();
    assert_eq!(d[32].pow(2).unwrap().degree(), 2);
}

#[test]
fn large_parallel_product() {
    let g = Polynomial::<_, DPackedMonomial>::make_polynomials(&Z, ["x", "y", "z"]).unwrap();
    let p = (&g[0] + &g[1] + &g[2]).add_scalar(&s(1)).unwrap().pow(8).unwrap();

    let seq = p.checked_mul_parallel(&p, 0).unwrap();
    let par = p.checked_mul_parallel(&p, 3).unwrap();
    assert_eq!(seq, par);
    assert_eq!(par.nterms(), 969);
    assert_eq!(
        par.coefficient(&[0, 0, 0]),
        Some(&Integer::from(1))
    );
    assert!(par.table_stats().contains("Table segments  : 8"));

    let wide = p.checked_mul_parallel(&p, 6).unwrap();
    assert_eq!(wide, seq);
    assert_eq!(wide, p.checked_mul(&p).unwrap());
    assert_eq!(wide.table().nsegments(), 64);

    // products that cancel across chunks of the left operand
    let (x, y) = (&g[0], &g[1]);
    let a = (x - y).pow(40).unwrap();
    let b = (x + y).pow(40).unwrap();
    let diff = (&(x * x) - &(y * y)).pow(40).unwrap();
    assert_eq!(a.checked_mul_parallel(&b, 4).unwrap(), diff);
    assert_eq!(a.checked_mul_parallel(&b, 4).unwrap().nterms(), 41);

    let names: Vec<String> = (0..16).map(|i| format!("x{:02}", i)).collect();
    let h = Polynomial::<_, PackedMonomial>::make_polynomials_in(&Z, &names[..], &names[..2]).unwrap();
    let q = (&h[0] + &h[1]).pow(4).unwrap();
    assert!(q.checked_mul_parallel(&q, 5).unwrap_err().is_invalid_operation());

    let settings = Settings::get();
    assert!(settings.segment_bits <= polyseries::settings::MAX_SEGMENT_BITS);
}

fn small_poly() -> impl Strategy<Value = Polynomial<IntegerRing, PackedMonomial>> {
    prop::collection::vec((-3i64..=3, -2i64..=3, -20i64..=20), 0..6).prop_map(|terms| {
        let mut p = Polynomial::with_symbols(&Z, ["x", "y"]).unwrap();
        for (ex, ey, c) in terms {
            let t = Polynomial::monomial(&Z, Integer::from(c), &[ex, ey], ["x", "y"]).unwrap();
            p += &t;
        }
        p
    })
}

proptest! {
    #[test]
    fn ring_laws(a in small_poly(), b in small_poly(), c in small_poly()) {
        prop_assert_eq!(&a + &b, &b + &a);
        prop_assert_eq!(&a * &b, &b * &a);
        prop_assert_eq!((&a + &b) + &c, &a + &(&b + &c));
        prop_assert_eq!(&a * &(&b + &c), &a * &b + &a * &c);
        prop_assert!((&a - &a).is_zero());
    }

    #[test]
    fn power_is_repeated_product(a in small_poly(), n in 0u64..4) {
        let mut r = Polynomial::constant_in(&Z, Integer::from(1), ["x", "y"]).unwrap();
        for _ in 0..n {
            r *= &a;
        }
        prop_assert_eq!(a.pow(n).unwrap(), r);
    }

    #[test]
    fn binary_round_trip(a in small_poly()) {
        let mut buf = vec![];
        a.write(&mut buf).unwrap();
        let b = Polynomial::<_, PackedMonomial>::read(&Z, Cursor::new(&buf)).unwrap();
        prop_assert_eq!(a, b);
    }
}
