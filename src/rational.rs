//! Rational functions over [`IntPoly`]: a canonical `num/den` pair kept in
//! lowest terms with a non-negative-leading-coefficient denominator.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RationalError;
use crate::int::Int;
use crate::poly::IntPoly;
use crate::poly_div::exact_divrem;
use crate::poly_gcd::gcd_subresultant;
use crate::poly_mul::mul;
use crate::poly_series::pow_ui;

/// A ratio of two dense integer polynomials, always held canonical:
/// `gcd(num, den) == 1` and `den`'s leading coefficient is non-negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rational {
    num: IntPoly,
    den: IntPoly,
}

/// Horner evaluation of an integer-coefficient polynomial at a rational
/// point, entirely in `Rational` arithmetic.
fn horner_rational(p: &IntPoly, x: &Rational) -> Rational {
    let mut acc = Rational::from_poly(IntPoly::zero());
    for c in p.coeffs().iter().rev() {
        let c_rational = Rational::from_poly(IntPoly::from_coeffs(vec![c.clone()]));
        acc = acc.mul(x).add(&c_rational);
    }
    acc
}

fn divide_out(p: &IntPoly, g: &IntPoly) -> IntPoly {
    if g.is_zero() || *g == IntPoly::one() {
        p.clone()
    } else {
        exact_divrem(p, g).expect("gcd divides its operand exactly")
    }
}

fn normalize_sign(num: &mut IntPoly, den: &mut IntPoly) {
    if let Some(lc) = den.leading_coeff() {
        if lc.sgn() < 0 {
            *num = num.neg();
            *den = den.neg();
        }
    }
}

fn canonical_pair(num: IntPoly, den: IntPoly) -> Result<(IntPoly, IntPoly), RationalError> {
    if den.is_zero() {
        return Err(RationalError::ZeroDenominator);
    }
    if num.is_zero() {
        return Ok((IntPoly::zero(), IntPoly::one()));
    }
    let g = gcd_subresultant(&num, &den);
    let mut n = divide_out(&num, &g);
    let mut d = divide_out(&den, &g);
    normalize_sign(&mut n, &mut d);
    Ok((n, d))
}

impl Rational {
    /// Builds a canonical `num/den`. Errors on a zero denominator.
    pub fn new(num: IntPoly, den: IntPoly) -> Result<Self, RationalError> {
        let (num, den) = canonical_pair(num, den)?;
        Ok(Rational { num, den })
    }

    /// `p/1`, already canonical.
    pub fn from_poly(p: IntPoly) -> Self {
        if p.is_zero() {
            Rational { num: IntPoly::zero(), den: IntPoly::one() }
        } else {
            Rational { num: p, den: IntPoly::one() }
        }
    }

    pub fn num(&self) -> &IntPoly {
        &self.num
    }

    pub fn den(&self) -> &IntPoly {
        &self.den
    }

    pub fn is_zero(&self) -> bool {
        self.num.is_zero()
    }

    fn add_or_sub(&self, other: &Self, subtract: bool) -> Self {
        let g1 = gcd_subresultant(&self.den, &other.den);
        let r = divide_out(&self.den, &g1); // den1 / g1
        let s = divide_out(&other.den, &g1); // den2 / g1

        let term1 = mul(&self.num, &s);
        let term2 = mul(&other.num, &r);
        let t = if subtract { term1.sub(&term2) } else { term1.add(&term2) };
        let new_den = mul(&self.den, &s);

        let g2 = gcd_subresultant(&t, &g1);
        let mut num = divide_out(&t, &g2);
        let mut den = divide_out(&new_den, &g2);
        normalize_sign(&mut num, &mut den);
        Rational { num, den }
    }

    /// Henrici's algorithm: common denominator via `gcd(den1, den2)`, with a
    /// second cancellation of `gcd(num, that gcd)` before normalizing sign.
    pub fn add(&self, other: &Self) -> Self {
        self.add_or_sub(other, false)
    }

    pub fn sub(&self, other: &Self) -> Self {
        self.add_or_sub(other, true)
    }

    /// Cross-cancels `gcd(num1, den2)` and `gcd(num2, den1)` before
    /// multiplying, so the product never carries avoidable common factors.
    pub fn mul(&self, other: &Self) -> Self {
        let ga = gcd_subresultant(&self.num, &other.den);
        let n1 = divide_out(&self.num, &ga);
        let d2 = divide_out(&other.den, &ga);

        let gb = gcd_subresultant(&other.num, &self.den);
        let n2 = divide_out(&other.num, &gb);
        let d1 = divide_out(&self.den, &gb);

        let mut num = mul(&n1, &n2);
        let mut den = mul(&d1, &d2);
        normalize_sign(&mut num, &mut den);
        Rational { num, den }
    }

    /// Swaps numerator and denominator, re-normalizing sign. Fails if
    /// `self` is zero (no multiplicative inverse).
    pub fn inv(&self) -> Result<Self, RationalError> {
        if self.num.is_zero() {
            return Err(RationalError::NoInverse);
        }
        let mut num = self.den.clone();
        let mut den = self.num.clone();
        normalize_sign(&mut num, &mut den);
        Ok(Rational { num, den })
    }

    /// `self * (1/other)`, same cross-cancellation as [`Rational::mul`].
    pub fn div(&self, other: &Self) -> Result<Self, RationalError> {
        let inv_other = other.inv()?;
        Ok(self.mul(&inv_other))
    }

    /// `num^e / den^e`; `e == 0` yields `1/1` regardless of `self`.
    pub fn pow(&self, e: u64) -> Self {
        if e == 0 {
            return Rational::from_poly(IntPoly::one());
        }
        Rational { num: pow_ui(&self.num, e), den: pow_ui(&self.den, e) }
    }

    /// Quotient rule `(n/d)' = (n'd - nd')/d^2`, pre-cancelling the shared
    /// factor `g = gcd(d, d')` from both numerator and denominator before
    /// the general canonicalization pass: writing `d = g*q` and `d' = g*w`,
    /// `n'd - nd' = g*(n'q - nw)` and `d^2 = g*(d*q)`, so dividing through
    /// by `g` once is exact.
    pub fn derivative(&self) -> Self {
        let d_prime = self.den.derivative();
        let g = gcd_subresultant(&self.den, &d_prime);
        let q = divide_out(&self.den, &g);
        let w = divide_out(&d_prime, &g);
        let n_prime = self.num.derivative();

        let num = mul(&n_prime, &q).sub(&mul(&self.num, &w));
        let den = mul(&self.den, &q);
        let (num, den) = canonical_pair(num, den).expect("derivative's denominator is never zero");
        Rational { num, den }
    }

    /// Evaluates numerator and denominator at the integer point `x`, and
    /// returns their ratio canonicalized as a constant rational function.
    /// Errors with [`RationalError::Pole`] if `x` is a root of `den`.
    pub fn evaluate(&self, x: &Int) -> Result<Rational, RationalError> {
        let dv = self.den.evaluate(x);
        if dv.is_zero() {
            return Err(RationalError::Pole);
        }
        let nv = self.num.evaluate(x);
        Ok(Rational::new(IntPoly::from_coeffs(vec![nv]), IntPoly::from_coeffs(vec![dv]))
            .expect("denominator value already checked non-zero"))
    }

    /// Evaluates numerator and denominator at the rational point `x` (Horner
    /// over `Rational` arithmetic, treating each integer coefficient as a
    /// constant rational function), and returns their ratio. Errors with
    /// [`RationalError::Pole`] if `x` is a root of `den`.
    pub fn evaluate_rational(&self, x: &Rational) -> Result<Rational, RationalError> {
        let nv = horner_rational(&self.num, x);
        let dv = horner_rational(&self.den, x);
        if dv.is_zero() {
            return Err(RationalError::Pole);
        }
        let dv_inv = dv.inv().expect("denominator value already checked non-zero");
        Ok(nv.mul(&dv_inv))
    }

    /// Parses either a single polynomial (as `poly/1`) or `<num>/<den>`.
    /// Falls back to the canonical zero on any parse or canonicalization
    /// failure, per the string-I/O failure-atomicity contract.
    pub fn set_str(s: &str) -> Self {
        Self::parse_str(s).unwrap_or_else(|_| Rational::from_poly(IntPoly::zero()))
    }

    fn parse_str(s: &str) -> Result<Self, RationalError> {
        match s.find('/') {
            Some(pos) => {
                let num = IntPoly::from_str_repr(&s[..pos]).map_err(RationalError::Poly)?;
                let den = IntPoly::from_str_repr(&s[pos + 1..]).map_err(RationalError::Poly)?;
                Rational::new(num, den)
            }
            None => {
                let num = IntPoly::from_str_repr(s).map_err(RationalError::Poly)?;
                Rational::new(num, IntPoly::one())
            }
        }
    }

    /// `num` alone if `den == 1`, else `num/den`, using [`IntPoly`]'s own
    /// `<length>  <coeffs>` string format for each side.
    pub fn get_str(&self) -> String {
        if self.den == IntPoly::one() {
            self.num.to_string_repr()
        } else {
            format!("{}/{}", self.num.to_string_repr(), self.den.to_string_repr())
        }
    }

    /// Standard algebraic notation (`t^2+2*t+1`, `(t+1)/(t-1)`, `-2/(t+1)`):
    /// parentheses around a compound (multi-term) numerator or denominator,
    /// omitted around a single monomial or constant.
    pub fn get_str_pretty(&self, var: &str) -> String {
        let num_str = poly_pretty(&self.num, var);
        if self.den == IntPoly::one() {
            num_str
        } else {
            let den_str = poly_pretty(&self.den, var);
            format!("{}/{}", parenthesize_if_compound(&self.num, &num_str), parenthesize_if_compound(&self.den, &den_str))
        }
    }
}

fn term_count(p: &IntPoly) -> usize {
    p.coeffs().iter().filter(|c| !c.is_zero()).count()
}

fn parenthesize_if_compound(p: &IntPoly, rendered: &str) -> String {
    if term_count(p) > 1 {
        format!("({})", rendered)
    } else {
        rendered.to_string()
    }
}

fn poly_pretty(p: &IntPoly, var: &str) -> String {
    if p.is_zero() {
        return "0".to_string();
    }
    let mut rendered = String::new();
    for (i, c) in p.coeffs().iter().enumerate().rev() {
        if c.is_zero() {
            continue;
        }
        let negative = c.sgn() < 0;
        let abs_c = c.abs();
        let coeff_part = if i == 0 {
            format!("{}", abs_c)
        } else if abs_c == Int::one() {
            String::new()
        } else {
            format!("{}*", abs_c)
        };
        let var_part = match i {
            0 => String::new(),
            1 => var.to_string(),
            _ => format!("{}^{}", var, i),
        };
        if rendered.is_empty() {
            if negative {
                rendered.push('-');
            }
        } else {
            rendered.push(if negative { '-' } else { '+' });
        }
        rendered.push_str(&coeff_part);
        rendered.push_str(&var_part);
    }
    rendered
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(xs: &[i64]) -> IntPoly {
        IntPoly::from_ints(xs)
    }

    fn r(num: &[i64], den: &[i64]) -> Rational {
        Rational::new(p(num), p(den)).unwrap()
    }

    #[test]
    fn serde_round_trips_a_rational() {
        let a = r(&[1, 1], &[-1, 1]);
        let json = serde_json::to_string(&a).unwrap();
        let back: Rational = serde_json::from_str(&json).unwrap();
        assert_eq!(back, a);
    }

    #[test]
    fn construction_rejects_zero_denominator() {
        assert!(Rational::new(p(&[1]), p(&[])).is_err());
    }

    #[test]
    fn construction_cancels_common_factors() {
        // (x^2-1)/(x-1) reduces to (x+1)/1
        let a = Rational::new(p(&[-1, 0, 1]), p(&[-1, 1])).unwrap();
        assert_eq!(a, r(&[1, 1], &[1]));
    }

    #[test]
    fn add_matches_cross_multiplication() {
        let a = r(&[1], &[1, 1]); // 1/(x+1)
        let b = r(&[1], &[-1, 1]); // 1/(x-1)
        let sum = a.add(&b);
        // 1/(x+1) + 1/(x-1) = 2x / (x^2-1)
        assert_eq!(sum, r(&[0, 2], &[-1, 0, 1]));
    }

    #[test]
    fn sub_is_inverse_of_add() {
        let a = r(&[1, 2], &[1, 1]);
        let b = r(&[3], &[1, -1]);
        let recovered = a.add(&b).sub(&b);
        assert_eq!(recovered, a);
    }

    #[test]
    fn mul_and_div_round_trip() {
        let a = r(&[1, 1], &[1]);
        let b = r(&[1], &[1, -1]);
        let product = a.mul(&b);
        let recovered = product.div(&b).unwrap();
        assert_eq!(recovered, a);
    }

    #[test]
    fn inv_fails_on_zero() {
        let zero = Rational::from_poly(IntPoly::zero());
        assert!(zero.inv().is_err());
    }

    #[test]
    fn pow_zero_is_one() {
        let a = r(&[1, 1], &[1, -1]);
        assert_eq!(a.pow(0), Rational::from_poly(IntPoly::one()));
    }

    #[test]
    fn derivative_matches_quotient_rule_on_a_simple_case() {
        // d/dx (1/x) = -1/x^2
        let a = r(&[1], &[0, 1]);
        let d = a.derivative();
        assert_eq!(d, r(&[-1], &[0, 0, 1]));
    }

    #[test]
    fn evaluate_reports_pole_at_a_root_of_the_denominator() {
        let a = r(&[1], &[-1, 1]); // 1/(x-1)
        assert!(matches!(a.evaluate(&Int::from_i64(1)), Err(RationalError::Pole)));
    }

    #[test]
    fn evaluate_computes_the_reduced_ratio() {
        let a = r(&[1], &[2]); // 1/2, constant
        let v = a.evaluate(&Int::from_i64(5)).unwrap();
        assert_eq!(v, r(&[1], &[2]));
    }

    #[test]
    fn evaluate_rational_matches_evaluate_at_an_integer_point() {
        let a = r(&[1, 2], &[1, 1]); // (2x+1)/(x+1)
        let at_integer = a.evaluate(&Int::from_i64(3)).unwrap();
        let at_rational = a.evaluate_rational(&Rational::from_poly(IntPoly::from_ints(&[3]))).unwrap();
        assert_eq!(at_integer, at_rational);
    }

    #[test]
    fn evaluate_rational_handles_a_genuinely_fractional_point() {
        let a = r(&[0, 1], &[1]); // x
        let half = Rational::new(p(&[1]), p(&[2])).unwrap(); // 1/2
        let v = a.evaluate_rational(&half).unwrap();
        assert_eq!(v, half);
    }

    #[test]
    fn evaluate_rational_reports_pole_at_a_root_of_the_denominator() {
        let a = r(&[1], &[-1, 1]); // 1/(x-1)
        let one = Rational::from_poly(IntPoly::one());
        assert!(matches!(a.evaluate_rational(&one), Err(RationalError::Pole)));
    }

    #[test]
    fn set_str_round_trips_through_get_str() {
        let a = r(&[1, 1], &[1, -1]);
        let s = a.get_str();
        let parsed = Rational::set_str(&s);
        assert_eq!(parsed, a);
    }

    #[test]
    fn set_str_falls_back_to_zero_on_malformed_input() {
        let parsed = Rational::set_str("not a polynomial");
        assert_eq!(parsed, Rational::from_poly(IntPoly::zero()));
    }

    #[test]
    fn pretty_print_parenthesizes_compound_denominators() {
        let a = r(&[1, 1], &[-1, 1]); // (x+1)/(x-1)
        assert_eq!(a.get_str_pretty("t"), "(t+1)/(t-1)");
    }

    #[test]
    fn pretty_print_omits_parentheses_around_monomials() {
        let a = r(&[0, 2], &[1]); // 2*t
        assert_eq!(a.get_str_pretty("t"), "2*t");
    }
}
