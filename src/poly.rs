//! `IntPoly`: a dense, normalized polynomial over [`Int`].
//!
//! Coefficients live in a plain `Vec<Int>`, index `i` holding the
//! coefficient of `x^i`. The normalization invariant (leading coefficient
//! non-zero, or length zero) is maintained by every public constructor and
//! mutator; `fit_length`/`set_length` are the two primitives the rest of the
//! engine (`poly_mul`, `poly_div`, ...) builds its own invariants on top of,
//! the split between "grow storage" and "set the logical length" so
//! in-place algorithms can avoid reallocating on every step.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PolyError;
use crate::int::Int;

/// A dense integer polynomial, coefficients ordered from the constant term
/// upward. Always normalized: `coeffs.last()` is never zero.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct IntPoly {
    coeffs: Vec<Int>,
}

impl IntPoly {
    pub fn zero() -> Self {
        IntPoly { coeffs: Vec::new() }
    }

    pub fn one() -> Self {
        IntPoly {
            coeffs: vec![Int::one()],
        }
    }

    /// Build from raw coefficients (constant term first), normalizing.
    pub fn from_coeffs(mut coeffs: Vec<Int>) -> Self {
        let mut p = IntPoly { coeffs: Vec::new() };
        p.coeffs.append(&mut coeffs);
        p.normalize();
        p
    }

    pub fn from_ints(values: &[i64]) -> Self {
        Self::from_coeffs(values.iter().map(|&v| Int::from_i64(v)).collect())
    }

    pub fn monomial(coeff: Int, degree: usize) -> Self {
        if coeff.is_zero() {
            return IntPoly::zero();
        }
        let mut coeffs = vec![Int::zero(); degree + 1];
        coeffs[degree] = coeff;
        IntPoly { coeffs }
    }

    pub fn len(&self) -> usize {
        self.coeffs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coeffs.is_empty()
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.is_empty()
    }

    /// Degree of the polynomial, or `None` for the zero polynomial.
    pub fn degree(&self) -> Option<usize> {
        if self.coeffs.is_empty() {
            None
        } else {
            Some(self.coeffs.len() - 1)
        }
    }

    pub fn coeffs(&self) -> &[Int] {
        &self.coeffs
    }

    pub fn coeffs_mut(&mut self) -> &mut [Int] {
        &mut self.coeffs
    }

    pub fn get(&self, i: usize) -> Int {
        self.coeffs.get(i).cloned().unwrap_or_else(Int::zero)
    }

    /// Leading coefficient, or `None` for the zero polynomial.
    pub fn leading_coeff(&self) -> Option<&Int> {
        self.coeffs.last()
    }

    /// Grow storage to hold at least `k` coefficients, zero-filling the new
    /// slots. Never shrinks and never changes the logical (normalized)
    /// length on its own: callers that grow then fill slots must call
    /// [`IntPoly::normalize`] (or [`IntPoly::set_length`]) afterward.
    pub fn fit_length(&mut self, k: usize) {
        if self.coeffs.len() < k {
            self.coeffs.resize(k, Int::zero());
        }
    }

    /// Truncate or zero-extend to exactly `k` coefficients, without
    /// reallocating beyond what's already reserved. The caller is
    /// responsible for `[0, k)` being meaningfully initialized before
    /// relying on the result, and for calling [`IntPoly::normalize`]
    /// afterward if `k` may have left a zero leading coefficient.
    pub fn set_length(&mut self, k: usize) {
        if k < self.coeffs.len() {
            self.coeffs.truncate(k);
        } else {
            self.coeffs.resize(k, Int::zero());
        }
    }

    /// Drop trailing zero coefficients, restoring the normalization
    /// invariant.
    pub fn normalize(&mut self) {
        while matches!(self.coeffs.last(), Some(c) if c.is_zero()) {
            self.coeffs.pop();
        }
    }

    /// Field-wise swap; always O(1), no data copied.
    pub fn swap(a: &mut Self, b: &mut Self) {
        std::mem::swap(&mut a.coeffs, &mut b.coeffs);
    }

    // ------------------------------- arithmetic -------------------------------

    pub fn add(&self, other: &Self) -> Self {
        let n = self.len().max(other.len());
        let coeffs = (0..n).map(|i| self.get(i).add(&other.get(i))).collect();
        Self::from_coeffs(coeffs)
    }

    pub fn sub(&self, other: &Self) -> Self {
        let n = self.len().max(other.len());
        let coeffs = (0..n).map(|i| self.get(i).sub(&other.get(i))).collect();
        Self::from_coeffs(coeffs)
    }

    pub fn neg(&self) -> Self {
        IntPoly {
            coeffs: self.coeffs.iter().map(Int::neg).collect(),
        }
    }

    pub fn scalar_mul(&self, c: &Int) -> Self {
        if c.is_zero() {
            return IntPoly::zero();
        }
        Self::from_coeffs(self.coeffs.iter().map(|x| x.mul(c)).collect())
    }

    pub fn scalar_divexact(&self, c: &Int) -> Result<Self, PolyError> {
        let mut out = Vec::with_capacity(self.len());
        for x in &self.coeffs {
            out.push(x.divexact(c)?);
        }
        Ok(Self::from_coeffs(out))
    }

    /// Floor-divide every coefficient by the machine integer `c`.
    pub fn scalar_fdiv_si(&self, c: i64) -> Result<Self, PolyError> {
        let mut out = Vec::with_capacity(self.len());
        for x in &self.coeffs {
            out.push(x.fdiv_si(c)?);
        }
        Ok(Self::from_coeffs(out))
    }

    /// Truncated-toward-zero divide every coefficient by `2^bits`.
    pub fn scalar_tdiv_2exp(&self, bits: u64) -> Self {
        Self::from_coeffs(self.coeffs.iter().map(|x| x.tdiv_2exp(bits)).collect())
    }

    /// Shift coefficients up by `k` (multiply by `x^k`).
    pub fn shift_left(&self, k: usize) -> Self {
        if self.is_zero() || k == 0 {
            return self.clone();
        }
        let mut coeffs = vec![Int::zero(); k];
        coeffs.extend(self.coeffs.iter().cloned());
        IntPoly { coeffs }
    }

    /// Shift coefficients down by `k` (floor-divide by `x^k`, dropping the
    /// low-order terms).
    pub fn shift_right(&self, k: usize) -> Self {
        if k >= self.len() {
            return IntPoly::zero();
        }
        Self::from_coeffs(self.coeffs[k..].to_vec())
    }

    /// Truncate to the first `n` coefficients (`mod x^n`).
    pub fn truncate(&self, n: usize) -> Self {
        if self.len() <= n {
            return self.clone();
        }
        Self::from_coeffs(self.coeffs[..n].to_vec())
    }

    pub fn derivative(&self) -> Self {
        if self.len() <= 1 {
            return IntPoly::zero();
        }
        let coeffs = self.coeffs[1..]
            .iter()
            .enumerate()
            .map(|(i, c)| c.mul_ui((i + 1) as u64))
            .collect();
        Self::from_coeffs(coeffs)
    }

    /// Content: GCD of all coefficients (`0` for the zero polynomial).
    pub fn content(&self) -> Int {
        let mut g = Int::zero();
        for c in &self.coeffs {
            g = g.gcd(c);
        }
        g
    }

    /// Divide every coefficient by the content, leaving a primitive
    /// polynomial with the same sign of leading coefficient. No-op on the
    /// zero polynomial.
    pub fn primitive_part(&self) -> Self {
        if self.is_zero() {
            return IntPoly::zero();
        }
        let mut g = self.content();
        if self.leading_coeff().unwrap().sgn() < 0 {
            g = g.neg();
        }
        self.scalar_divexact(&g).expect("content divides exactly")
    }

    /// `max_i bits(c_i)`, signed per [`crate::int_vec::IntVec::max_bits`]'s
    /// convention.
    pub fn max_bits(&self) -> i64 {
        crate::int_vec::IntVec::from_vec(self.coeffs.clone()).max_bits()
    }

    /// Evaluate at an integer point via Horner's rule.
    pub fn evaluate(&self, x: &Int) -> Int {
        let mut acc = Int::zero();
        for c in self.coeffs.iter().rev() {
            acc = acc.mul(x).add(c);
        }
        acc
    }

    /// Horner evaluation organized as a binary tree with precomputed
    /// `x^{2^k}` powers, so the critical path is `O(log n)` multiplications
    /// deep rather than `O(n)`. Produces the same value as
    /// [`IntPoly::evaluate`].
    pub fn evaluate_divconquer(&self, x: &Int) -> Int {
        if self.is_zero() {
            return Int::zero();
        }
        evaluate_divconquer_rec(&self.coeffs, x)
    }

    pub fn to_string_repr(&self) -> String {
        let mut s = format!("{}  ", self.len());
        for (i, c) in self.coeffs.iter().enumerate() {
            if i > 0 {
                s.push(' ');
            }
            s.push_str(&c.to_string());
        }
        s
    }

    pub fn from_str_repr(s: &str) -> Result<Self, PolyError> {
        let s = s.trim();
        let mut parts = s.splitn(2, char::is_whitespace);
        let len_str = parts.next().ok_or_else(|| PolyError::Parse(s.to_string()))?;
        let n: usize = len_str.parse().map_err(|_| PolyError::Parse(s.to_string()))?;
        let rest = parts.next().unwrap_or("").trim();
        let coeffs: Vec<Int> = if rest.is_empty() {
            Vec::new()
        } else {
            rest.split_whitespace()
                .map(|tok| tok.parse::<Int>().map_err(|_| PolyError::Parse(s.to_string())))
                .collect::<Result<_, _>>()?
        };
        if coeffs.len() != n {
            return Err(PolyError::Parse(s.to_string()));
        }
        Ok(Self::from_coeffs(coeffs))
    }
}

fn evaluate_divconquer_rec(coeffs: &[Int], x: &Int) -> Int {
    if coeffs.len() <= 32 {
        let mut acc = Int::zero();
        for c in coeffs.iter().rev() {
            acc = acc.mul(x).add(c);
        }
        return acc;
    }
    let mid = coeffs.len() / 2;
    let lo = evaluate_divconquer_rec(&coeffs[..mid], x);
    let hi = evaluate_divconquer_rec(&coeffs[mid..], x);
    let x_mid = x.pow_ui(mid as u64);
    hi.mul(&x_mid).add(&lo)
}

impl PartialEq for IntPoly {
    fn eq(&self, other: &Self) -> bool {
        self.coeffs == other.coeffs
    }
}
impl Eq for IntPoly {}

impl fmt::Display for IntPoly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string_repr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_round_trips_a_polynomial() {
        let p = IntPoly::from_ints(&[-3, 0, 5, 7]);
        let json = serde_json::to_string(&p).unwrap();
        let back: IntPoly = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn scalar_fdiv_si_matches_per_coefficient_fdiv_q() {
        let p = IntPoly::from_ints(&[-7, 8, 9]);
        let expected = IntPoly::from_coeffs(
            p.coeffs().iter().map(|c| c.fdiv_q(&Int::from_i64(2)).unwrap()).collect(),
        );
        assert_eq!(p.scalar_fdiv_si(2).unwrap(), expected);
    }

    #[test]
    fn scalar_tdiv_2exp_matches_per_coefficient_tdiv_2exp() {
        let p = IntPoly::from_ints(&[-7, 8, 9]);
        let expected =
            IntPoly::from_coeffs(p.coeffs().iter().map(|c| c.tdiv_2exp(2)).collect());
        assert_eq!(p.scalar_tdiv_2exp(2), expected);
    }

    #[test]
    fn normalization_drops_trailing_zeros() {
        let p = IntPoly::from_ints(&[1, 2, 0, 0]);
        assert_eq!(p.len(), 2);
        assert_eq!(p.degree(), Some(1));
    }

    #[test]
    fn fit_length_never_shrinks() {
        let mut p = IntPoly::from_ints(&[1, 2, 3]);
        p.fit_length(2);
        assert_eq!(p.len(), 3);
        p.fit_length(5);
        assert_eq!(p.len(), 5);
    }

    #[test]
    fn add_sub_match_manual() {
        let a = IntPoly::from_ints(&[1, 2, 3]);
        let b = IntPoly::from_ints(&[3, 2, 1, 5]);
        assert_eq!(a.add(&b), IntPoly::from_ints(&[4, 4, 4, 5]));
        assert_eq!(b.sub(&a), IntPoly::from_ints(&[2, 0, -2, 5]));
    }

    #[test]
    fn derivative_of_cubic() {
        let p = IntPoly::from_ints(&[5, 0, 0, 2]); // 2x^3 + 5
        assert_eq!(p.derivative(), IntPoly::from_ints(&[0, 0, 6])); // 6x^2
    }

    #[test]
    fn content_and_primitive_part() {
        let p = IntPoly::from_ints(&[6, 12, -18]);
        assert_eq!(p.content(), Int::from_i64(6));
        assert_eq!(p.primitive_part(), IntPoly::from_ints(&[1, 2, -3]));
    }

    #[test]
    fn evaluate_matches_divconquer() {
        let coeffs: Vec<i64> = (1..=80).collect();
        let p = IntPoly::from_ints(&coeffs);
        let x = Int::from_i64(3);
        assert_eq!(p.evaluate(&x), p.evaluate_divconquer(&x));
    }

    #[test]
    fn string_round_trip() {
        let p = IntPoly::from_ints(&[1, -2, 3]);
        let s = p.to_string_repr();
        assert_eq!(s, "3  1 -2 3");
        assert_eq!(IntPoly::from_str_repr(&s).unwrap(), p);
    }

    #[test]
    fn swap_is_field_wise() {
        let mut a = IntPoly::from_ints(&[1, 2]);
        let mut b = IntPoly::from_ints(&[9]);
        IntPoly::swap(&mut a, &mut b);
        assert_eq!(a, IntPoly::from_ints(&[9]));
        assert_eq!(b, IntPoly::from_ints(&[1, 2]));
    }
}
