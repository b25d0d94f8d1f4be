//! Polyseries is a library for sparse multivariate Laurent polynomials and
//! truncated power series.
//!
//! Polynomials are generic over their coefficient ring and over the packed
//! encoding of their monomials. Terms are stored in segmented hash tables,
//! and large products are computed in parallel.
//!
//! For example:
//!
//! ```
//! use polyseries::{
//!     coefficient::Scalar,
//!     domains::integer::Z,
//!     poly::{monomial::PackedMonomial, polynomial::Polynomial},
//! };
//!
//! let g = Polynomial::<_, PackedMonomial>::make_polynomials_in(&Z, ["x", "y"], ["x", "y"])
//!     .unwrap();
//! let p = (&g[0] + &g[1]).add_scalar(&Scalar::from(1)).unwrap();
//! let q = p.pow(2).unwrap();
//!
//! assert_eq!(q.to_string(), "x^2+2*x*y+2*x+y^2+2*y+1");
//! ```
//!
//! Power series drop the terms above their truncation level after every
//! operation:
//!
//! ```
//! use polyseries::{
//!     domains::rational::Q,
//!     poly::{
//!         monomial::DPackedMonomial,
//!         series::{PowerSeries, Truncation},
//!     },
//! };
//!
//! let g = PowerSeries::<_, DPackedMonomial>::make_series(&Q, ["x"], Truncation::Total(3))
//!     .unwrap();
//! let s = (&g[0] + &g[0]).pow(5).unwrap();
//! assert!(s.is_zero());
//! ```
//!
//! When the coefficient kind is only known at runtime, use
//! [`dynamic::AnyPolynomial`].

pub mod coefficient;
pub mod domains;
pub mod dynamic;
pub mod error;
pub mod poly;
pub mod printer;
pub mod settings;
pub mod symbols;

pub use error::PolyError;
