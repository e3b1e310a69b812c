//! Polynomial division: basecase and divide-and-conquer exact/remainder
//! division, power-series (Newton) division, and pseudo-division.

use crate::error::PolyError;
use crate::int::Int;
use crate::poly::IntPoly;
use crate::poly_mul::{mul, mullow_classical};
use crate::tuning::Tuning;

/// `A = B*Q + R` with `deg R < deg B`, via schoolbook floor-division of
/// leading terms. Errors on division by the zero polynomial.
pub fn divrem_basecase(a: &IntPoly, b: &IntPoly) -> Result<(IntPoly, IntPoly), PolyError> {
    if b.is_zero() {
        return Err(PolyError::DivByZero);
    }
    let lb = b.leading_coeff().unwrap().clone();
    let db = b.degree().unwrap();

    let mut rem = a.coeffs().to_vec();
    let mut quotient = vec![Int::zero(); rem.len().saturating_sub(db)];

    loop {
        while matches!(rem.last(), Some(c) if c.is_zero()) {
            rem.pop();
        }
        if rem.len() <= db {
            break;
        }
        let dr = rem.len() - 1;
        let q_deg = dr - db;
        let (q, rq) = rem[dr].tdiv_qr(&lb)?;
        if !rq.is_zero() {
            // Leading coefficient of `B` does not divide exactly; the
            // integer quotient is undefined here, signal as an error rather
            // than silently rounding.
            return Err(PolyError::Inexact);
        }
        quotient[q_deg] = q.clone();
        for (i, bc) in b.coeffs().iter().enumerate() {
            let idx = q_deg + i;
            rem[idx] = rem[idx].sub(&q.mul(bc));
        }
    }

    Ok((IntPoly::from_coeffs(quotient), IntPoly::from_coeffs(rem)))
}

/// Fast division for a monic (or `-1`-leading) divisor: reverse both
/// operands around their own top degree, recover the quotient as a
/// power-series product via [`series_inverse`] (the same Newton iteration
/// `div_series` uses), then reverse back. This is the divide-and-conquer
/// family's complexity class (`O(M(n))` instead of `O(n^2)`) reached through
/// power-series inversion rather than the literal split-the-dividend-in-half
/// recursion; falls back to [`divrem_basecase`] below the cutoff or when `B`
/// isn't monic, since reversing a non-monic divisor would require dividing
/// by a non-unit leading coefficient.
pub fn divrem_divconquer(a: &IntPoly, b: &IntPoly) -> Result<(IntPoly, IntPoly), PolyError> {
    divrem_divconquer_with_tuning(a, b, &Tuning::default())
}

/// Same algorithm as [`divrem_divconquer`], consulting `tuning.divconquer_cutoff`
/// instead of the crate-wide default.
pub fn divrem_divconquer_with_tuning(a: &IntPoly, b: &IntPoly, tuning: &Tuning) -> Result<(IntPoly, IntPoly), PolyError> {
    if b.is_zero() {
        return Err(PolyError::DivByZero);
    }
    let db = b.degree().unwrap();
    if db < tuning.divconquer_cutoff || a.len() <= b.len() {
        return divrem_basecase(a, b);
    }
    let lc = b.leading_coeff().unwrap();
    if *lc != Int::one() && *lc != Int::one().neg() {
        return divrem_basecase(a, b);
    }

    let da = a.degree().unwrap();
    let dq = da - db;

    let rev_b = reverse_full(b);
    let inv = series_inverse(&rev_b, dq + 1)?;
    let rev_a_top = reverse_top(a, da, dq + 1);
    let q_rev = mullow_classical(&rev_a_top, &inv, dq + 1);
    let q = reverse_fixed(&q_rev, dq + 1);

    let r = a.sub(&mul(b, &q));
    Ok((q, r))
}

/// Reverse a normalized polynomial's coefficients around its own degree:
/// `out[i] = p[deg(p) - i]`.
fn reverse_full(p: &IntPoly) -> IntPoly {
    IntPoly::from_coeffs(p.coeffs().iter().rev().cloned().collect())
}

/// The top `count` coefficients of `p` (degrees `deg-count+1 ..= deg`),
/// reversed so index `0` holds the former leading coefficient.
fn reverse_top(p: &IntPoly, deg: usize, count: usize) -> IntPoly {
    let coeffs = (0..count).map(|i| p.get(deg - i)).collect();
    IntPoly::from_coeffs(coeffs)
}

/// Reverse `p` around a fixed length `n`, zero-extending first if `p` has
/// fewer than `n` coefficients: `out[i] = p.get(n - 1 - i)`.
fn reverse_fixed(p: &IntPoly, n: usize) -> IntPoly {
    let coeffs = (0..n).map(|i| p.get(n - 1 - i)).collect();
    IntPoly::from_coeffs(coeffs)
}

/// Power-series division `A/B mod x^n`. Requires `B[0] == ±1`. Computes the
/// Newton-iteration inverse of `B` truncated to `n` terms, then multiplies
/// by `A`.
pub fn div_series(a: &IntPoly, b: &IntPoly, n: usize) -> Result<IntPoly, PolyError> {
    let b0 = b.get(0);
    if b0 != Int::one() && b0 != Int::one().neg() {
        return Err(PolyError::Inexact);
    }
    let inv = series_inverse(b, n)?;
    Ok(mullow_classical(a, &inv, n).truncate(n))
}

/// Newton iteration for the power-series inverse of `b` (`b[0] == ±1`)
/// truncated to `n` terms: `g_{k+1} = g_k * (2 - b*g_k) mod x^{2^{k+1}}`,
/// doubling the number of correct terms each step.
fn series_inverse(b: &IntPoly, n: usize) -> Result<IntPoly, PolyError> {
    if n == 0 {
        return Ok(IntPoly::zero());
    }
    let b0 = b.get(0);
    let mut g = IntPoly::from_coeffs(vec![if b0 == Int::one() { Int::one() } else { Int::one().neg() }]);
    let mut precision = 1usize;
    while precision < n {
        let next_precision = (precision * 2).min(n);
        let bt = b.truncate(next_precision);
        let correction = mullow_classical(&bt, &g, next_precision);
        let two_minus = IntPoly::monomial(Int::from_i64(2), 0).sub(&correction);
        g = mullow_classical(&g, &two_minus, next_precision);
        precision = next_precision;
    }
    Ok(g.truncate(n))
}

/// Pseudo-division: `d*A = B*Q + R` with `d = lc(B)^{la - lb + 1}`, keeping
/// every intermediate coefficient an integer even when `lc(B)` doesn't
/// divide evenly. Returns `(Q, R, d)`.
pub fn pseudo_divrem(a: &IntPoly, b: &IntPoly) -> Result<(IntPoly, IntPoly, Int), PolyError> {
    if b.is_zero() {
        return Err(PolyError::DivByZero);
    }
    let lb = b.leading_coeff().unwrap().clone();
    let db = b.degree().unwrap();
    let da = match a.degree() {
        Some(d) => d,
        None => return Ok((IntPoly::zero(), IntPoly::zero(), Int::one())),
    };
    if da < db {
        return Ok((IntPoly::zero(), a.clone(), Int::one()));
    }

    let scale_exp = (da - db + 1) as u64;
    let d = lb.pow_ui(scale_exp);
    let scaled_a = a.scalar_mul(&d);
    let (q, r) = divrem_basecase(&scaled_a, b).or_else(|_| {
        // `divrem_basecase` rejects non-exact leading-coefficient division;
        // pseudo-division pre-scales precisely so it always divides evenly,
        // but guard anyway and fall back to an explicit scaled loop.
        pseudo_divrem_loop(a, b, &lb)
    })?;
    Ok((q, r, d))
}

fn pseudo_divrem_loop(a: &IntPoly, b: &IntPoly, lb: &Int) -> Result<(IntPoly, IntPoly), PolyError> {
    let db = b.degree().unwrap();
    let mut rem = a.coeffs().to_vec();
    let mut quotient = vec![Int::zero(); rem.len().saturating_sub(db)];
    loop {
        while matches!(rem.last(), Some(c) if c.is_zero()) {
            rem.pop();
        }
        if rem.len() <= db {
            break;
        }
        let dr = rem.len() - 1;
        let q_deg = dr - db;
        let lead = rem[dr].clone();
        for q in quotient.iter_mut() {
            *q = q.mul(lb);
        }
        for c in rem.iter_mut() {
            *c = c.mul(lb);
        }
        quotient[q_deg] = quotient[q_deg].add(&lead);
        for (i, bc) in b.coeffs().iter().enumerate() {
            let idx = q_deg + i;
            rem[idx] = rem[idx].sub(&lead.mul(bc));
        }
    }
    Ok((IntPoly::from_coeffs(quotient), IntPoly::from_coeffs(rem)))
}

/// Exact division: `A = B*Q` with no remainder. An error (not a panic)
/// because divisibility is data-dependent, unlike [`Int::divexact`]'s
/// programmer-error contract for a single value.
pub fn exact_divrem(a: &IntPoly, b: &IntPoly) -> Result<IntPoly, PolyError> {
    let (q, r) = divrem_basecase(a, b)?;
    if !r.is_zero() {
        return Err(PolyError::Inexact);
    }
    Ok(q)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(xs: &[i64]) -> IntPoly {
        IntPoly::from_ints(xs)
    }

    #[test]
    fn basecase_matches_manual_division() {
        // (x^2 - 1) / (x - 1) = x + 1
        let a = p(&[-1, 0, 1]);
        let b = p(&[-1, 1]);
        let (q, r) = divrem_basecase(&a, &b).unwrap();
        assert_eq!(q, p(&[1, 1]));
        assert!(r.is_zero());
    }

    #[test]
    fn basecase_reports_nonzero_remainder() {
        let a = p(&[1, 0, 1]); // x^2 + 1
        let b = p(&[1, 1]); // x + 1
        let (q, r) = divrem_basecase(&a, &b).unwrap();
        assert_eq!(q, p(&[-1, 1]));
        assert_eq!(r, p(&[2]));
    }

    #[test]
    fn divconquer_matches_basecase_on_short_divisor() {
        let coeffs_a: Vec<i64> = (1..=50).collect();
        let coeffs_b: Vec<i64> = vec![1, 1]; // monic
        let a = IntPoly::from_ints(&coeffs_a);
        let b = IntPoly::from_ints(&coeffs_b);
        let (q1, r1) = divrem_basecase(&a, &b).unwrap();
        let (q2, r2) = divrem_divconquer(&a, &b).unwrap();
        assert_eq!(q1, q2);
        assert_eq!(r1, r2);
    }

    #[test]
    fn divconquer_matches_basecase_past_cutoff_with_monic_divisor() {
        let coeffs_a: Vec<i64> = (1..=100).collect();
        let mut b_coeffs = vec![1i64; 20];
        b_coeffs[19] = 1; // monic, degree 19 >= Tuning::default().divconquer_cutoff
        let a = IntPoly::from_ints(&coeffs_a);
        let b = IntPoly::from_ints(&b_coeffs);
        let (q1, r1) = divrem_basecase(&a, &b).unwrap();
        let (q2, r2) = divrem_divconquer(&a, &b).unwrap();
        assert_eq!(q1, q2);
        assert_eq!(r1, r2);
    }

    #[test]
    fn divconquer_with_tuning_matches_basecase_under_a_lowered_cutoff() {
        let coeffs_a: Vec<i64> = (1..=20).collect();
        let b = IntPoly::from_ints(&[1, 1, 1, 1]); // monic, degree 3
        let tight = Tuning { divconquer_cutoff: 2, ..Tuning::default() };
        let (q1, r1) = divrem_basecase(&IntPoly::from_ints(&coeffs_a), &b).unwrap();
        let (q2, r2) = divrem_divconquer_with_tuning(&IntPoly::from_ints(&coeffs_a), &b, &tight).unwrap();
        assert_eq!(q1, q2);
        assert_eq!(r1, r2);
    }

    #[test]
    fn div_series_matches_known_geometric_inverse() {
        // 1 / (1 - x) = 1 + x + x^2 + ... mod x^n
        let one = p(&[1]);
        let b = p(&[1, -1]);
        let q = div_series(&one, &b, 6).unwrap();
        assert_eq!(q, p(&[1, 1, 1, 1, 1, 1]));
    }

    #[test]
    fn pseudo_divrem_satisfies_identity() {
        let a = p(&[1, 2, 3]);
        let b = p(&[1, 2]);
        let (q, r, d) = pseudo_divrem(&a, &b).unwrap();
        let lhs = a.scalar_mul(&d);
        let rhs = mul(&b, &q).add(&r);
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn exact_divrem_divides_a_known_product() {
        let b = p(&[1, 1]);
        let c = p(&[1, 0, 1]);
        let a = mul(&b, &c);
        let q = exact_divrem(&a, &b).unwrap();
        assert_eq!(q, c);
    }
}
