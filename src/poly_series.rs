//! Power series arithmetic on dense integer polynomials: binary
//! exponentiation (plain and truncated), a closed-form recurrence for
//! powering when that is cheaper than repeated squaring, truncated
//! multiplication dispatch, composition, and compositional (Lagrange)
//! reversion.

use crate::error::PolyError;
use crate::int::Int;
use crate::poly::IntPoly;
use crate::poly_div::div_series;
use crate::poly_mul::{mul, mullow_classical, square};

/// Above this operand length, [`mullow`] gives up on the dedicated
/// truncated-classical loop and just takes the full product and truncates -
/// correct but without the truncated algorithm's constant-factor win, since
/// no truncated Karatsuba/KS path is implemented here.
const MULLOW_CLASSICAL_CUTOFF: usize = 64;

/// Truncated product `a*b mod x^n`, dispatching to the dedicated
/// schoolbook truncation for moderate sizes and to a full multiply +
/// truncate otherwise.
pub fn mullow(a: &IntPoly, b: &IntPoly, n: usize) -> IntPoly {
    if n == 0 {
        return IntPoly::zero();
    }
    let full_len = a.len() + b.len();
    if full_len == 0 || n >= full_len.saturating_sub(1) {
        return mul(a, b).truncate(n);
    }
    if a.len().max(b.len()) <= MULLOW_CLASSICAL_CUTOFF {
        mullow_classical(a, b, n)
    } else {
        mul(a, b).truncate(n)
    }
}

/// Truncated square `a*a mod x^n`.
pub fn sqrlow(a: &IntPoly, n: usize) -> IntPoly {
    mullow(a, a, n)
}

/// `f^e` by right-to-left binary exponentiation, squaring at every step and
/// multiplying in the accumulator on set bits of `e`. Plain value semantics
/// already avoid the in-place aliasing `res`/`base`/`scratch` buffer-juggling
/// a mutate-in-place implementation needs to dodge copies; the three-buffer
/// parity trick has no analogue once every intermediate is an owned `Vec`.
pub fn pow_ui(f: &IntPoly, e: u64) -> IntPoly {
    if e == 0 {
        return IntPoly::one();
    }
    if e == 1 {
        return f.clone();
    }
    let mut result = IntPoly::one();
    let mut base = f.clone();
    let mut exp = e;
    while exp > 0 {
        if exp & 1 == 1 {
            result = mul(&result, &base);
        }
        exp >>= 1;
        if exp > 0 {
            base = square(&base);
        }
    }
    result
}

/// `f^e mod x^n`: identical binary exponentiation to [`pow_ui`], but every
/// multiply is a [`mullow`] truncated to `n` terms so intermediate results
/// never grow past the order actually needed.
pub fn pow_trunc(f: &IntPoly, e: u64, n: usize) -> IntPoly {
    if n == 0 {
        return IntPoly::zero();
    }
    if e == 0 {
        return IntPoly::one().truncate(n);
    }
    let mut result = IntPoly::one();
    let mut base = f.truncate(n);
    let mut exp = e;
    while exp > 0 {
        if exp & 1 == 1 {
            result = mullow(&result, &base, n);
        }
        exp >>= 1;
        if exp > 0 {
            base = sqrlow(&base, n);
        }
    }
    result.truncate(n)
}

/// `f^e` via the logarithmic-derivative recurrence `f*P' = e*f'*P`: equating
/// coefficients of `x^{n-1}` on both sides and isolating the `p_n` term
/// gives `p_n = (1/(n*a0)) * sum_{k=1}^{n} (e*k - (n-k)) * a_k * p_{n-k}`,
/// a single linear pass per output coefficient instead of `log e`
/// multiplications of the whole series. Requires `f[0] != 0`; returns
/// `None` otherwise (callers fall back to [`pow_ui`]/[`pow_trunc`]). The
/// division by `n*a0` is always exact because `f^e` has integer
/// coefficients whenever `f` does.
pub fn pow_multinomial(f: &IntPoly, e: u64) -> Option<IntPoly> {
    if f.is_zero() {
        return Some(if e == 0 { IntPoly::one() } else { IntPoly::zero() });
    }
    let a0 = f.get(0);
    if a0.is_zero() {
        return None;
    }
    if e == 0 {
        return Some(IntPoly::one());
    }
    let deg_f = f.degree().unwrap();
    let out_len = deg_f
        .checked_mul(e as usize)
        .and_then(|d| d.checked_add(1))?;

    let mut p = vec![Int::zero(); out_len];
    p[0] = a0.pow_ui(e);
    let e_int = Int::from_u64(e);

    for n in 1..out_len {
        let mut acc = Int::zero();
        let top_k = n.min(deg_f);
        for k in 1..=top_k {
            let ak = f.get(k);
            if ak.is_zero() {
                continue;
            }
            let factor = e_int
                .mul(&Int::from_i64(k as i64))
                .sub(&Int::from_i64((n - k) as i64));
            acc = acc.add(&factor.mul(&ak).mul(&p[n - k]));
        }
        let denom = Int::from_i64(n as i64).mul(&a0);
        p[n] = acc.divexact(&denom).ok()?;
    }

    Some(IntPoly::from_coeffs(p))
}

/// Plain Horner evaluation of `poly1` at `poly2`, truncated to `n` terms at
/// every step. Requires `poly2[0] == 0`.
pub fn compose_series_horner(poly1: &IntPoly, poly2: &IntPoly, n: usize) -> Result<IntPoly, PolyError> {
    if poly2.get(0) != Int::zero() {
        return Err(PolyError::ComposeNonzeroConstant);
    }
    if n == 0 {
        return Ok(IntPoly::zero());
    }
    let poly2_t = poly2.truncate(n);
    let mut result = IntPoly::zero();
    for c in poly1.coeffs().iter().rev() {
        result = mullow(&result, &poly2_t, n);
        result = result.add(&IntPoly::monomial(c.clone(), 0)).truncate(n);
    }
    Ok(result)
}

/// Block-Horner (Brent-Kung) composition: split `poly1` into blocks of
/// `m ~= sqrt(len(poly1))` coefficients, precompute `poly2^0 .. poly2^{m-1}`
/// once, evaluate each block as a cheap linear combination of those
/// precomputed powers, then Horner-combine the `O(sqrt(len))` block values
/// using `poly2^m` as the step multiplier. Trades `len(poly1)` series
/// multiplications (Horner) for about `2*sqrt(len(poly1))`. Requires
/// `poly2[0] == 0`.
pub fn compose_series_brent_kung(poly1: &IntPoly, poly2: &IntPoly, n: usize) -> Result<IntPoly, PolyError> {
    if poly2.get(0) != Int::zero() {
        return Err(PolyError::ComposeNonzeroConstant);
    }
    if n == 0 || poly1.is_zero() {
        return Ok(IntPoly::zero());
    }
    let h = poly2.truncate(n);
    let len1 = poly1.len();
    let m = (len1 as f64).sqrt().ceil() as usize;
    let m = m.max(1);

    let mut powers = Vec::with_capacity(m);
    powers.push(IntPoly::one().truncate(n));
    for i in 1..m {
        powers.push(mullow(&powers[i - 1], &h, n));
    }
    let h_m = mullow(powers.last().unwrap(), &h, n);

    let num_blocks = (len1 + m - 1) / m;
    let mut blocks = Vec::with_capacity(num_blocks);
    for j in 0..num_blocks {
        let mut block_val = IntPoly::zero();
        for (i, power) in powers.iter().enumerate() {
            let idx = j * m + i;
            if idx >= len1 {
                break;
            }
            let c = poly1.get(idx);
            if c.is_zero() {
                continue;
            }
            block_val = block_val.add(&power.scalar_mul(&c));
        }
        blocks.push(block_val.truncate(n));
    }

    let mut result = IntPoly::zero();
    for block in blocks.into_iter().rev() {
        result = mullow(&result, &h_m, n);
        result = result.add(&block).truncate(n);
    }
    Ok(result)
}

/// Compositional (Lagrange) inversion: find `g` with `g[0] == 0` and
/// `f(g(x)) = x mod x^n`. Requires `f[0] == 0` and `f[1] == +-1`. Newton
/// iteration doubling the number of correct terms each round -
/// `g_{k+1} = g_k - (f(g_k) - x) / f'(g_k)` - reaches the same `O(M(n))`
/// complexity class as the block-Lagrange sqrt-decomposition without a
/// separate `m = ceil(sqrt(n))` block assembly pass.
pub fn revert_series_lagrange_fast(f: &IntPoly, n: usize) -> Result<IntPoly, PolyError> {
    if n == 0 {
        return Ok(IntPoly::zero());
    }
    if f.get(0) != Int::zero() {
        return Err(PolyError::Inexact);
    }
    let f1 = f.get(1);
    if f1 != Int::one() && f1 != Int::one().neg() {
        return Err(PolyError::Inexact);
    }

    let fprime = f.derivative();
    let mut g = IntPoly::from_coeffs(vec![Int::zero(), f1]);
    let mut precision = 2usize.min(n);
    if precision < 1 {
        precision = 1;
    }

    while precision < n {
        let next_precision = (precision * 2).min(n);
        let g_trunc = g.truncate(next_precision);
        let composed = compose_series_horner(f, &g_trunc, next_precision)?;
        let diff = composed.sub(&IntPoly::monomial(Int::one(), 1)).truncate(next_precision);
        let fprime_at_g = compose_series_horner(&fprime, &g_trunc, next_precision)?;
        let correction = div_series(&diff, &fprime_at_g, next_precision)?;
        g = g_trunc.sub(&correction).truncate(next_precision);
        precision = next_precision;
    }

    Ok(g.truncate(n))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(xs: &[i64]) -> IntPoly {
        IntPoly::from_ints(xs)
    }

    #[test]
    fn pow_ui_matches_iterated_multiplication() {
        let f = p(&[1, 1]); // 1+x
        let mut expected = IntPoly::one();
        for _ in 0..5 {
            expected = mul(&expected, &f);
        }
        assert_eq!(pow_ui(&f, 5), expected);
    }

    #[test]
    fn pow_ui_zero_exponent_is_one() {
        let f = p(&[3, 1]);
        assert_eq!(pow_ui(&f, 0), IntPoly::one());
    }

    #[test]
    fn pow_trunc_matches_full_power_truncated() {
        let f = p(&[1, 1]);
        let full = pow_ui(&f, 8);
        let truncated = pow_trunc(&f, 8, 4);
        assert_eq!(truncated, full.truncate(4));
    }

    #[test]
    fn pow_multinomial_matches_pow_ui() {
        let f = p(&[1, 1]); // 1+x, a0 = 1 != 0
        let direct = pow_ui(&f, 6);
        let via_recurrence = pow_multinomial(&f, 6).unwrap();
        assert_eq!(via_recurrence, direct);
    }

    #[test]
    fn pow_multinomial_rejects_zero_constant_term() {
        let f = p(&[0, 1]); // x, a0 == 0
        assert!(pow_multinomial(&f, 3).is_none());
    }

    #[test]
    fn compose_horner_matches_direct_substitution() {
        // poly1 = 1 + x^2, poly2 = 2x  =>  1 + 4x^2 (mod x^4)
        let poly1 = p(&[1, 0, 1]);
        let poly2 = p(&[0, 2]);
        let composed = compose_series_horner(&poly1, &poly2, 4).unwrap();
        assert_eq!(composed, p(&[1, 0, 4]));
    }

    #[test]
    fn compose_horner_rejects_nonzero_constant_term() {
        let poly1 = p(&[1, 1]);
        let poly2 = p(&[1, 1]); // poly2[0] == 1, not 0
        assert!(matches!(
            compose_series_horner(&poly1, &poly2, 4),
            Err(PolyError::ComposeNonzeroConstant)
        ));
    }

    #[test]
    fn compose_brent_kung_matches_horner() {
        let coeffs_a: Vec<i64> = (1..=25).collect();
        let poly1 = IntPoly::from_ints(&coeffs_a);
        let poly2 = p(&[0, 1, 1]); // x + x^2
        let n = 30;
        let via_horner = compose_series_horner(&poly1, &poly2, n).unwrap();
        let via_brent_kung = compose_series_brent_kung(&poly1, &poly2, n).unwrap();
        assert_eq!(via_horner, via_brent_kung);
    }

    #[test]
    fn revert_series_is_a_left_inverse_under_composition() {
        let f = p(&[0, 1, 1]); // x + x^2
        let n = 10;
        let g = revert_series_lagrange_fast(&f, n).unwrap();
        let identity = compose_series_horner(&f, &g, n).unwrap();
        assert_eq!(identity.truncate(n), p(&[0, 1]).truncate(n));
    }

    #[test]
    fn revert_series_rejects_nonzero_constant_term() {
        let f = p(&[1, 1]);
        assert!(revert_series_lagrange_fast(&f, 5).is_err());
    }
}
