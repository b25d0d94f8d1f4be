use std::collections::HashMap;

use rug::{Integer, Rational};

use polyseries::{
    coefficient::Scalar,
    domains::{
        float::{F64, RR64},
        integer::Z,
        rational::Q,
        CoefficientRing,
    },
    poly::{
        monomial::{DPackedMonomial, PackedMonomial},
        series::{PowerSeries, Truncation},
        MonomialKey,
    },
    symbols::SymbolSet,
};

fn check_series<R: CoefficientRing, K: MonomialKey>(ring: &R) {
    let empty = PowerSeries::<R, K>::new(ring);
    assert_eq!(empty.nterms(), 0);
    assert!(empty.symbol_set().is_empty());
    assert_eq!(empty.truncation(), &Truncation::None);

    let g = PowerSeries::<R, K>::make_series(ring, ["x", "y"], Truncation::Total(4)).unwrap();
    let (x, y) = (&g[0], &g[1]);

    let one = PowerSeries::constant_in(
        ring,
        ring.element_from_scalar(&Scalar::from(1)).unwrap(),
        ["x", "y"],
        Truncation::Total(4),
    )
    .unwrap();

    // 1/(1-x) to order 4
    let inv = (&one + x) + &(x * x) + (x * x * x) + (x * x * x * x);
    let prod = &inv * &(&one - x);
    assert_eq!(prod, one);

    // terms are dropped after every product
    let p = (x + y).pow(6).unwrap();
    assert!(p.is_zero());
    let p = (&(x + y) * &(x + y)) * (x * y);
    assert_eq!(p.degree(), 4);
    assert_eq!(p.nterms(), 3);
}

#[test]
fn every_ring_and_key() {
    check_series::<_, PackedMonomial>(&Z);
    check_series::<_, DPackedMonomial>(&Z);
    check_series::<_, PackedMonomial>(&Q);
    check_series::<_, DPackedMonomial>(&RR64);
    #[cfg(feature = "real")]
    check_series::<_, PackedMonomial>(&polyseries::domains::float::FloatField::real128());
}

#[test]
fn partial_truncation_in_products() {
    let t = Truncation::Partial(2, SymbolSet::new(["x"]));
    let g = PowerSeries::<_, DPackedMonomial>::make_series(&Q, ["x", "y"], t.clone()).unwrap();
    let (x, y) = (&g[0], &g[1]);

    let p = (x + y).pow(4).unwrap();
    assert_eq!(p.p_degree("x"), 2);
    assert_eq!(p.degree(), 4);
    // y^4, 4*x*y^3, 6*x^2*y^2
    assert_eq!(p.nterms(), 3);
    assert_eq!(
        p.polynomial().coefficient(&[2, 2]),
        Some(&Rational::from(6))
    );

    let mut q = p.clone();
    q.set_truncation(Truncation::Partial(0, SymbolSet::new(["x"])));
    assert_eq!(q.nterms(), 1);
    assert_eq!(q.to_string(), "y^4+O(0, {'x'})");
    assert_eq!(p.nterms(), 3);

    let total = PowerSeries::make_series(&Q, ["x"], Truncation::Total(2)).unwrap();
    assert!(p.checked_mul(&total[0]).unwrap_err().is_invalid_operation());
    assert!(p
        .checked_add(&PowerSeries::from_polynomial(
            total[0].polynomial().clone(),
            Truncation::Partial(3, SymbolSet::new(["y"]))
        ))
        .unwrap_err()
        .is_invalid_operation());
}

#[test]
fn substitution_and_evaluation() {
    let g = PowerSeries::<_, PackedMonomial>::make_series(&Z, ["x", "y"], Truncation::Total(3))
        .unwrap();
    let (x, y) = (&g[0], &g[1]);
    let p = (x + y).pow(2).unwrap().add_scalar(&Scalar::from(1)).unwrap();

    let map = HashMap::from([("x".to_owned(), Rational::from((1, 2)))]);
    let r = p.subs_with(&map, &Q).unwrap();
    assert_eq!(r.symbol_set().to_vec(), vec!["y"]);
    assert_eq!(r.truncation(), &Truncation::Total(3));
    assert_eq!(r.polynomial().coefficient(&[0]), Some(&Rational::from((5, 4))));

    let map = HashMap::from([
        ("x".to_owned(), Integer::from(1)),
        ("y".to_owned(), Integer::from(2)),
    ]);
    assert_eq!(p.evaluate(&map).unwrap(), 10);

    let map = HashMap::from([("x".to_owned(), F64::from(0.5))]);
    assert!(p.subs_with(&map, &RR64).is_ok());
}

#[test]
fn scalar_arithmetic_and_output() {
    let g = PowerSeries::<_, DPackedMonomial>::make_series(&Q, ["x"], Truncation::Total(1))
        .unwrap();
    let x = &g[0];

    let p = x.mul_scalar(&Scalar::from(3)).unwrap().div_scalar(&Scalar::from(2)).unwrap();
    assert_eq!(p.to_string(), "3/2*x+O(1)");
    assert_eq!(p.sub_scalar(&Scalar::from(1)).unwrap().to_string(), "3/2*x-1+O(1)");
    assert_eq!((x * x).to_string(), "O(1)");

    let d = p.diff("x").unwrap();
    assert_eq!(d.to_string(), "3/2+O(1)");
    assert_eq!(d.integrate("x").unwrap(), p);

    assert!(p.byte_size() > 0);
    assert!(p.table_stats().contains("Number of terms : 1"));
    assert!(x.div_scalar(&Scalar::from(0)).unwrap_err().is_invalid_operation());
}
