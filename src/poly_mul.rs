//! Polynomial multiplication: the classical/Karatsuba/Kronecker-substitution
//! dispatch ladder, plus the truncated (`mullow`) and high-half (`mulhigh`)
//! variants that division and power-series operations build on.
//!
//! `Int::bit_count`/`IntPoly::max_bits` drive the dispatch decision tree:
//! small inputs get a schoolbook loop over
//! [`crate::int_vec::IntVec::dot_general`], short-high-bitcount inputs get
//! Karatsuba, everything else is packed through Kronecker substitution into
//! one big-integer multiply via the pooled backend in `bigint.rs`. The
//! small-prime FFT backend (`fft_small_prime.rs`) is tried first when large
//! enough and available; a `None` result from it is not an error, just a
//! "try the next strategy" signal, the same capability pattern
//! `fft_small_prime`'s own doc comment describes.

use crate::fft_small_prime;
use crate::int::Int;
use crate::int_vec::IntVec;
use crate::poly::IntPoly;
use crate::tuning::Tuning;

fn abs_bits(p: &IntPoly) -> u64 {
    p.max_bits().unsigned_abs()
}

/// Full product `a * b`, dispatching with [`Tuning::default`].
pub fn mul(a: &IntPoly, b: &IntPoly) -> IntPoly {
    mul_with_tuning(a, b, &Tuning::default())
}

/// Full product `a * b`, consulting `tuning` for every dispatch cutoff
/// instead of the crate-wide defaults.
pub fn mul_with_tuning(a: &IntPoly, b: &IntPoly, tuning: &Tuning) -> IntPoly {
    if a.is_zero() || b.is_zero() {
        return IntPoly::zero();
    }
    if b.len() == 1 {
        return a.scalar_mul(&b.get(0));
    }
    if a.len() == 1 {
        return b.scalar_mul(&a.get(0));
    }
    if std::ptr::eq(a, b) || a == b {
        return square_with_tuning(a, tuning);
    }

    let la = a.len();
    let lb = b.len();
    let ba = abs_bits(a);
    let bb = abs_bits(b);

    if lb.max(la) >= tuning.small_fft_cutoff {
        if let Some(coeffs) = fft_small_prime::try_multiply(a.coeffs(), b.coeffs()) {
            return IntPoly::from_coeffs(coeffs);
        }
    }

    if lb.max(la) >= tuning.ss_cutoff {
        // The FFT backend declined (too wide, or the transform length
        // outran its prime list): skip the Karatsuba middle tier rather
        // than recursing through it at this size, and go straight through
        // the big-integer backend.
        return mul_kronecker(a, b);
    }

    if ba.max(bb) <= tuning.tiny_bitcount_cutoff
        && (lb < 40 + (ba + bb) as usize / 2 || la < 70 + (ba + bb) as usize / 2)
    {
        return mul_classical(a, b);
    }

    if la.min(lb) < tuning.karatsuba_cutoff {
        return mul_classical(a, b);
    }

    if la.min(lb) < tuning.ks_cutoff && ba.max(bb) >= 256 {
        return mul_karatsuba_with_tuning(a, b, tuning);
    }

    mul_kronecker(a, b)
}

/// Square `a`, dispatching with [`Tuning::default`].
pub fn square(a: &IntPoly) -> IntPoly {
    square_with_tuning(a, &Tuning::default())
}

/// Square `a`, consulting `tuning` for every dispatch cutoff.
pub fn square_with_tuning(a: &IntPoly, tuning: &Tuning) -> IntPoly {
    if a.is_zero() {
        return IntPoly::zero();
    }
    if a.len() == 1 {
        let c = a.get(0);
        return IntPoly::from_coeffs(vec![c.mul(&c)]);
    }
    let b = abs_bits(a);
    if a.len() >= tuning.ss_cutoff {
        return mul_kronecker(a, a);
    }
    if b <= tuning.tiny_bitcount_cutoff && a.len() < 48 {
        return mul_classical(a, a);
    }
    if a.len() < tuning.karatsuba_cutoff {
        return mul_classical(a, a);
    }
    if a.len() < tuning.ks_cutoff && b >= 256 {
        return mul_karatsuba_with_tuning(a, a, tuning);
    }
    mul_kronecker(a, a)
}

/// Coefficient `k` of the convolution of `a` and `b`: `sum_{i} a[i] * b[k-i]`
/// over the `i` range where both indices land in bounds. Expressed as one
/// [`IntVec::dot_general`] call per output slot, `a`'s window walked forward
/// and `b`'s walked backward across the same triangular span, the evolving
/// triangular window the classical loops share.
fn convolution_coeff(a: &[Int], b: &[Int], k: usize) -> Int {
    let la = a.len();
    let lb = b.len();
    if la == 0 || lb == 0 {
        return Int::zero();
    }
    let lo = k.saturating_sub(lb - 1);
    let hi = k.min(la - 1);
    if lo > hi {
        return Int::zero();
    }
    let len = hi - lo + 1;
    IntVec::dot_general(None, false, &a[lo..=hi], &b[k - hi..=k - lo], true, len)
}

pub fn mul_classical(a: &IntPoly, b: &IntPoly) -> IntPoly {
    let la = a.len();
    let lb = b.len();
    if la == 0 || lb == 0 {
        return IntPoly::zero();
    }
    let n = la + lb - 1;
    let out = (0..n).map(|k| convolution_coeff(a.coeffs(), b.coeffs(), k)).collect();
    IntPoly::from_coeffs(out)
}

/// Product truncated to the first `n` coefficients (`mod x^n`); the same
/// triangular loops as [`mul_classical`], just windowed to skip terms that
/// can't contribute below degree `n`.
pub fn mullow_classical(a: &IntPoly, b: &IntPoly, n: usize) -> IntPoly {
    if a.is_zero() || b.is_zero() || n == 0 {
        return IntPoly::zero();
    }
    let out_len = n.min(a.len() + b.len() - 1);
    let out = (0..out_len)
        .map(|k| convolution_coeff(a.coeffs(), b.coeffs(), k))
        .collect();
    IntPoly::from_coeffs(out)
}

/// The high `len(a)+len(b)-1-n` coefficients of the product, i.e. the
/// complement of [`mullow_classical`]: coefficients of degree `>= n`. Used by
/// Newton-iteration division to recover the correction term without forming
/// the full product (`mulhigh_n.c` in the reference C source).
pub fn mulhigh_n(a: &IntPoly, b: &IntPoly, n: usize) -> IntPoly {
    if a.is_zero() || b.is_zero() {
        return IntPoly::zero();
    }
    let total = a.len() + b.len() - 1;
    if n >= total {
        return IntPoly::zero();
    }
    let out = (n..total)
        .map(|k| convolution_coeff(a.coeffs(), b.coeffs(), k))
        .collect();
    IntPoly::from_coeffs(out)
}

/// Single-level Karatsuba: split each operand into high/low halves at
/// `m = min(la, lb) / 2`, recurse on three half-size products instead of
/// four, combine with shifts and adds. Dispatches recursion with
/// [`Tuning::default`]; see [`mul_karatsuba_with_tuning`] for the
/// configurable form.
pub fn mul_karatsuba(a: &IntPoly, b: &IntPoly) -> IntPoly {
    mul_karatsuba_with_tuning(a, b, &Tuning::default())
}

/// Same recursion as [`mul_karatsuba`], propagating `tuning` into the
/// recursive half-size products instead of the crate-wide defaults.
pub fn mul_karatsuba_with_tuning(a: &IntPoly, b: &IntPoly, tuning: &Tuning) -> IntPoly {
    let m = a.len().min(b.len()) / 2;
    if m == 0 {
        return mul_classical(a, b);
    }
    let (a_lo, a_hi) = split_at(a, m);
    let (b_lo, b_hi) = split_at(b, m);

    let z0 = mul_with_tuning(&a_lo, &b_lo, tuning);
    let z2 = mul_with_tuning(&a_hi, &b_hi, tuning);
    let a_sum = a_lo.add(&a_hi);
    let b_sum = b_lo.add(&b_hi);
    let z1_full = mul_with_tuning(&a_sum, &b_sum, tuning);
    let z1 = z1_full.sub(&z0).sub(&z2);

    z0.add(&z1.shift_left(m)).add(&z2.shift_left(2 * m))
}

fn split_at(p: &IntPoly, m: usize) -> (IntPoly, IntPoly) {
    let lo = p.truncate(m);
    let hi = p.shift_right(m);
    (lo, hi)
}

/// Kronecker substitution: pack both operands into single large integers at
/// a bit width wide enough that no carry from one coefficient's product can
/// reach into its neighbor's field, multiply with the big-integer backend,
/// unpack.
pub fn mul_kronecker(a: &IntPoly, b: &IntPoly) -> IntPoly {
    let la = a.len();
    let lb = b.len();
    let ba = abs_bits(a);
    let bb = abs_bits(b);
    let sign_margin = 2u32;
    let pack_bits = (ba + bb) as u32 + crate::limb::ceil_log2(lb) + sign_margin;
    let pack_bits = pack_bits.max(8);

    let packed_a = pack_polynomial(a, pack_bits);
    let packed_b = pack_polynomial(b, pack_bits);
    let product = packed_a.mul(&packed_b);

    let out_len = la + lb - 1;
    unpack_polynomial(&product, pack_bits, out_len)
}

pub(crate) fn pack_polynomial(p: &IntPoly, bits: u32) -> Int {
    let mut acc = Int::zero();
    for c in p.coeffs().iter().rev() {
        acc = acc.mul_2exp(bits as u64).add(c);
    }
    acc
}

/// Inverse of [`pack_polynomial`]: `value` is `sum_i d_i * 2^{bits*i}` for
/// signed digits `d_i` bounded by `pack_bits`'s sign margin, so each digit is
/// just the symmetric residue of the running remainder modulo `2^bits`,
/// peeled off one place at a time (the centered residue already carries the
/// right sign, so no separate borrow bookkeeping is needed between digits).
pub(crate) fn unpack_polynomial(value: &Int, bits: u32, n: usize) -> IntPoly {
    let modulus = Int::one().mul_2exp(bits as u64);
    let mut coeffs = Vec::with_capacity(n);
    let mut rem = value.clone();
    for _ in 0..n {
        let d = rem.smod(&modulus).expect("power-of-two modulus");
        rem = rem.sub(&d).tdiv_q(&modulus).expect("exact by construction");
        coeffs.push(d);
    }
    IntPoly::from_coeffs(coeffs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(xs: &[i64]) -> IntPoly {
        IntPoly::from_ints(xs)
    }

    fn naive_mul(a: &IntPoly, b: &IntPoly) -> IntPoly {
        if a.is_zero() || b.is_zero() {
            return IntPoly::zero();
        }
        let mut out = vec![Int::zero(); a.len() + b.len() - 1];
        for (i, x) in a.coeffs().iter().enumerate() {
            for (j, y) in b.coeffs().iter().enumerate() {
                out[i + j] = out[i + j].add(&x.mul(y));
            }
        }
        IntPoly::from_coeffs(out)
    }

    #[test]
    fn classical_matches_naive() {
        let a = p(&[1, 2, 3]);
        let b = p(&[4, 5, 6, 7]);
        assert_eq!(mul_classical(&a, &b), naive_mul(&a, &b));
    }

    #[test]
    fn karatsuba_matches_naive_on_longer_inputs() {
        let a = IntPoly::from_ints(&(1..=30).collect::<Vec<_>>());
        let b = IntPoly::from_ints(&(1..=25).collect::<Vec<_>>());
        assert_eq!(mul_karatsuba(&a, &b), naive_mul(&a, &b));
    }

    #[test]
    fn kronecker_matches_naive_with_negative_coefficients() {
        let a = p(&[-3, 5, -7, 11, -2]);
        let b = p(&[2, -4, 6, -8]);
        assert_eq!(mul_kronecker(&a, &b), naive_mul(&a, &b));
    }

    #[test]
    fn dispatch_matches_naive_across_sizes() {
        for (la, lb) in [(1, 1), (1, 5), (5, 1), (5, 5), (30, 2), (2, 30)] {
            let a = IntPoly::from_ints(&(1..=la as i64).collect::<Vec<_>>());
            let b = IntPoly::from_ints(&(1..=lb as i64).collect::<Vec<_>>());
            assert_eq!(mul(&a, &b), naive_mul(&a, &b));
        }
    }

    #[test]
    fn mullow_matches_truncated_full_product() {
        let a = p(&[1, 2, 3, 4, 5]);
        let b = p(&[5, 4, 3, 2, 1]);
        let full = naive_mul(&a, &b);
        let low = mullow_classical(&a, &b, 4);
        assert_eq!(low, full.truncate(4));
    }

    #[test]
    fn mulhigh_matches_high_half_of_full_product() {
        let a = p(&[1, 2, 3, 4, 5]);
        let b = p(&[5, 4, 3, 2, 1]);
        let full = naive_mul(&a, &b);
        let high = mulhigh_n(&a, &b, 4);
        assert_eq!(high, full.shift_right(4));
    }

    #[test]
    fn custom_tuning_still_matches_naive() {
        let tight = Tuning { karatsuba_cutoff: 2, ks_cutoff: 4, ..Tuning::default() };
        let a = IntPoly::from_ints(&(1..=20i64).collect::<Vec<_>>());
        let b = IntPoly::from_ints(&(1..=15i64).collect::<Vec<_>>());
        assert_eq!(mul_with_tuning(&a, &b, &tight), naive_mul(&a, &b));
    }

    #[test]
    fn square_matches_self_multiply() {
        let a = p(&[1, -2, 3, -4, 5, -6, 7, 8, 9]);
        assert_eq!(square(&a), mul(&a, &a));
    }
}
