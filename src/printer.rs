//! Text and LaTeX output of polynomials.

use std::fmt::{self, Write};

use crate::domains::Ring;
use crate::poly::polynomial::Polynomial;
use crate::poly::MonomialKey;

/// Options that control the output of polynomials and their coefficients.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PrintOptions {
    pub multiplication_operator: char,
    pub double_star_for_exponentiation: bool,
    pub latex: bool,
    /// The number of digits of floating point coefficients.
    pub precision: Option<usize>,
    pub terms_on_new_line: bool,
}

impl Default for PrintOptions {
    fn default() -> Self {
        PrintOptions {
            multiplication_operator: '*',
            double_star_for_exponentiation: false,
            latex: false,
            precision: None,
            terms_on_new_line: false,
        }
    }
}

impl PrintOptions {
    /// Options for LaTeX output.
    pub fn latex() -> PrintOptions {
        PrintOptions {
            multiplication_operator: ' ',
            latex: true,
            ..Default::default()
        }
    }

    /// Options for Python-like output, using `**` for powers.
    pub fn python() -> PrintOptions {
        PrintOptions {
            double_star_for_exponentiation: true,
            ..Default::default()
        }
    }

    /// Take the precision from a formatter, as in `format!("{:.3}", p)`.
    pub fn from_fmt(f: &fmt::Formatter) -> PrintOptions {
        PrintOptions {
            precision: f.precision(),
            ..Default::default()
        }
    }
}

/// A printer for polynomials with custom [`PrintOptions`].
pub struct PolynomialPrinter<'a, R: Ring, K: MonomialKey> {
    pub poly: &'a Polynomial<R, K>,
    pub opts: PrintOptions,
}

impl<'a, R: Ring, K: MonomialKey> PolynomialPrinter<'a, R, K> {
    pub fn new(poly: &'a Polynomial<R, K>) -> PolynomialPrinter<'a, R, K> {
        PolynomialPrinter {
            poly,
            opts: PrintOptions::default(),
        }
    }

    pub fn new_with_options(
        poly: &'a Polynomial<R, K>,
        opts: PrintOptions,
    ) -> PolynomialPrinter<'a, R, K> {
        PolynomialPrinter { poly, opts }
    }
}

impl<'a, R: Ring, K: MonomialKey> fmt::Display for PolynomialPrinter<'a, R, K> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut opts = self.opts;
        if f.precision().is_some() {
            opts.precision = f.precision();
        }
        self.poly.format(&opts, f)
    }
}

impl<R: Ring, K: MonomialKey> Polynomial<R, K> {
    /// Write the polynomial with its terms in descending key order.
    pub fn format<W: Write>(&self, opts: &PrintOptions, f: &mut W) -> fmt::Result {
        if self.is_zero() {
            return f.write_char('0');
        }

        let nvars = self.nvars();
        let mut first = true;
        for (k, c) in self.terms.sorted_desc() {
            if !first && opts.terms_on_new_line {
                f.write_char('\n')?;
            }

            let exps = k.exponents(nvars);
            if exps.iter().all(|e| *e == 0) {
                self.ring.format(c, opts, !first, f)?;
                first = false;
                continue;
            }

            if self.ring.is_one(c) {
                if !first {
                    f.write_char('+')?;
                }
            } else if self.ring.is_one(&self.ring.neg(c)) {
                f.write_char('-')?;
            } else {
                self.ring.format(c, opts, !first, f)?;
                f.write_char(opts.multiplication_operator)?;
            }

            let mut first_var = true;
            for (name, e) in self.symbols.iter().zip(&exps) {
                if *e == 0 {
                    continue;
                }
                if !first_var {
                    f.write_char(opts.multiplication_operator)?;
                }
                first_var = false;

                f.write_str(name)?;
                if *e != 1 {
                    if opts.latex {
                        write!(f, "^{{{}}}", e)?;
                    } else if opts.double_star_for_exponentiation {
                        write!(f, "**{}", e)?;
                    } else {
                        write!(f, "^{}", e)?;
                    }
                }
            }

            first = false;
        }

        Ok(())
    }

    /// Print the polynomial in LaTeX.
    pub fn to_latex(&self) -> String {
        let mut s = "$$".to_owned();
        // writing into a string cannot fail
        let _ = self.format(&PrintOptions::latex(), &mut s);
        s.push_str("$$");
        s
    }
}

impl<R: Ring, K: MonomialKey> fmt::Display for Polynomial<R, K> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.format(&PrintOptions::from_fmt(f), f)
    }
}

impl<R: Ring, K: MonomialKey> fmt::Debug for Polynomial<R, K> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Key type: {}", K::NAME)?;
        writeln!(f, "Coefficient ring: {}", self.ring)?;
        writeln!(f, "Rank: {}", self.nvars())?;
        writeln!(f, "Symbol set: {}", self.symbols)?;
        write!(f, "Terms: {}", self)
    }
}

#[cfg(test)]
mod test {
    use rug::Rational;

    use super::{PolynomialPrinter, PrintOptions};
    use crate::coefficient::Scalar;
    use crate::domains::float::RR64;
    use crate::domains::integer::Z;
    use crate::domains::rational::Q;
    use crate::poly::monomial::{DPackedMonomial, PackedMonomial};
    use crate::poly::polynomial::Polynomial;

    #[test]
    fn plain() {
        let g = Polynomial::<_, PackedMonomial>::make_polynomials_in(&Z, ["x", "y"], ["x", "y"])
            .unwrap();
        let (x, y) = (&g[0], &g[1]);

        let p = (x * x).mul_scalar(&Scalar::from(3)).unwrap() + y.mul_scalar(&Scalar::from(2)).unwrap();
        let p = p.sub_scalar(&Scalar::from(1)).unwrap();
        assert_eq!(p.to_string(), "3*x^2+2*y-1");

        let q = -(x * y) + x.pow_signed(-2).unwrap();
        assert_eq!(q.to_string(), "-x*y+x^-2");
        assert_eq!(
            PolynomialPrinter::new_with_options(&q, PrintOptions::python()).to_string(),
            "-x*y+x**-2"
        );

        assert_eq!(Polynomial::<_, PackedMonomial>::new(&Z).to_string(), "0");
    }

    #[test]
    fn latex() {
        let g = Polynomial::<_, DPackedMonomial>::make_polynomials(&Q, ["x"]).unwrap();
        let p = g[0]
            .pow(2)
            .unwrap()
            .mul_element(&Rational::from((-1, 2)));
        assert_eq!(p.to_latex(), "$$-\\frac{1}{2} x^{2}$$");
    }

    #[test]
    fn precision_and_debug() {
        let g = Polynomial::<_, PackedMonomial>::make_polynomials(&RR64, ["x"]).unwrap();
        let p = g[0].add_scalar(&Scalar::from(1. / 3.)).unwrap();
        assert_eq!(format!("{:.1}", p), "x+0.3");

        let d = format!("{:?}", p);
        assert!(d.starts_with("Key type: packed_monomial<i64>"));
        assert!(d.contains("Rank: 1"));
    }
}
