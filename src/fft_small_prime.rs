//! Optional small-prime multi-modular FFT multiplication backend.
//!
//! Projects both operands to residues modulo a fixed list of NTT-friendly
//! primes (each admitting a long enough root of unity), multiplies in the
//! transform domain, inverse-transforms, and recombines via [`crate::crt`].
//! This backend degrades cleanly: when the transform length or bit width
//! falls outside what the prime list supports, [`try_multiply`] returns
//! `None` rather than erroring, and the outer dispatch in `poly_mul` falls
//! through to another algorithm.
//!
//! Gated behind the `small-fft` feature (on by default): this is an optional
//! capability, not a mandatory path.

#[cfg(feature = "small-fft")]
mod enabled {
    use crate::crt::Comb;
    use crate::int::Int;

    /// NTT-friendly primes of the form `k * 2^20 + 1`, comfortably under
    /// 50 bits so three of them cover a product well beyond any transform
    /// length this crate will ever see, while keeping pointwise products
    /// inside a single machine word's accumulator headroom.
    const NTT_PRIMES: [u64; 3] = [
        2_013_265_921, // 15 * 2^27 + 1
        2_281_701_377, // 17 * 2^27 + 1
        3_221_225_473, // 3 * 2^30 + 1
    ];

    /// Order-`2^27` primitive roots of unity for each prime above: each is
    /// `g^((p-1)/2^27)` for a primitive root `g` of the full multiplicative
    /// group mod `p` (31, 3, 5 respectively), not `g` itself.
    const NTT_ROOTS: [u64; 3] = [440_564_289, 129_140_163, 229_807_484];
    const NTT_ROOT_ORDER: u32 = 27;

    fn mod_pow(mut base: u64, mut exp: u64, m: u64) -> u64 {
        let mut acc = 1u128;
        base %= m;
        let mut b = base as u128;
        let modulus = m as u128;
        while exp > 0 {
            if exp & 1 == 1 {
                acc = acc * b % modulus;
            }
            b = b * b % modulus;
            exp >>= 1;
        }
        acc as u64
    }

    fn mod_inv(a: u64, m: u64) -> u64 {
        mod_pow(a, m - 2, m)
    }

    /// In-place iterative NTT (Cooley-Tukey, bit-reversal permutation
    /// first), `invert` selecting forward or inverse transform.
    fn ntt(a: &mut [u64], modulus: u64, root: u64, root_order: u32, invert: bool) {
        let n = a.len();
        debug_assert!(n.is_power_of_two());

        let mut j = 0usize;
        for i in 1..n {
            let mut bit = n >> 1;
            while j & bit != 0 {
                j ^= bit;
                bit >>= 1;
            }
            j ^= bit;
            if i < j {
                a.swap(i, j);
            }
        }

        let log_n = n.trailing_zeros();
        for len_log in 1..=log_n {
            let len = 1usize << len_log;
            let exp = 1u64 << (root_order - len_log);
            let mut w_len = mod_pow(root, exp, modulus);
            if invert {
                w_len = mod_inv(w_len, modulus);
            }
            let mut i = 0;
            while i < n {
                let mut w = 1u64;
                for k in 0..len / 2 {
                    let u = a[i + k];
                    let v = (a[i + k + len / 2] as u128 * w as u128 % modulus as u128) as u64;
                    a[i + k] = (u as u128 + v as u128).rem_euclid(modulus as u128) as u64;
                    a[i + k + len / 2] =
                        ((u as i128 - v as i128).rem_euclid(modulus as i128)) as u64;
                    w = (w as u128 * w_len as u128 % modulus as u128) as u64;
                }
                i += len;
            }
        }

        if invert {
            let n_inv = mod_inv(n as u64, modulus);
            for x in a.iter_mut() {
                *x = (*x as u128 * n_inv as u128 % modulus as u128) as u64;
            }
        }
    }

    fn convolve_mod(a: &[u64], b: &[u64], out_len: usize, prime_idx: usize) -> Vec<u64> {
        let modulus = NTT_PRIMES[prime_idx];
        let root = NTT_ROOTS[prime_idx];
        let n = out_len.next_power_of_two();
        let mut fa = vec![0u64; n];
        let mut fb = vec![0u64; n];
        fa[..a.len()].copy_from_slice(a);
        fb[..b.len()].copy_from_slice(b);
        ntt(&mut fa, modulus, root, NTT_ROOT_ORDER, false);
        ntt(&mut fb, modulus, root, NTT_ROOT_ORDER, false);
        for i in 0..n {
            fa[i] = (fa[i] as u128 * fb[i] as u128 % modulus as u128) as u64;
        }
        ntt(&mut fa, modulus, root, NTT_ROOT_ORDER, true);
        fa.truncate(out_len);
        fa
    }

    /// Attempt the multi-modular FFT product of `a` and `b` (coefficient
    /// vectors, low-order first). Returns `None` if the required transform
    /// length exceeds what the fixed prime list's root order supports; the
    /// caller falls back to another multiplication strategy.
    pub fn try_multiply(a: &[Int], b: &[Int]) -> Option<Vec<Int>> {
        if a.is_empty() || b.is_empty() {
            return Some(Vec::new());
        }
        let out_len = a.len() + b.len() - 1;
        let transform_len = out_len.next_power_of_two();
        if transform_len > (1usize << NTT_ROOT_ORDER) {
            tracing::debug!(transform_len, "small-prime FFT backend unavailable: transform too long");
            return None;
        }

        // Bound on the magnitude of each output coefficient, to know how
        // many primes we need to CRT-recombine without ambiguity.
        let ba = a.iter().map(|x| x.bit_count()).max().unwrap_or(0);
        let bb = b.iter().map(|x| x.bit_count()).max().unwrap_or(0);
        let min_len = a.len().min(b.len()) as u64;
        let bound_bits = ba + bb + 64 - min_len.leading_zeros() as u64 + 1;
        let primes_needed = ((bound_bits as f64) / 30.5).ceil() as usize + 1;
        if primes_needed > NTT_PRIMES.len() {
            tracing::debug!(primes_needed, available = NTT_PRIMES.len(), "small-prime FFT backend unavailable: coefficients too wide");
            return None;
        }

        let residues_a: Vec<Vec<u64>> = (0..primes_needed)
            .map(|p| a.iter().map(|x| x.to_big().mod_by_limb(NTT_PRIMES[p])).collect())
            .collect();
        let residues_b: Vec<Vec<u64>> = (0..primes_needed)
            .map(|p| b.iter().map(|x| x.to_big().mod_by_limb(NTT_PRIMES[p])).collect())
            .collect();

        let per_prime_results = compute_per_prime(&residues_a, &residues_b, out_len, primes_needed);

        let comb = Comb::new(NTT_PRIMES[..primes_needed].to_vec()).ok()?;
        recombine_all(&comb, &per_prime_results, out_len)
    }

    /// Per-prime transforms are independent (disjoint inputs, disjoint
    /// output rows), so the `parallel` feature fans them out across a
    /// worker pool rather than running them one after another: no worker
    /// mutates a shared data structure, each writes to a disjoint output row.
    #[cfg(feature = "parallel")]
    fn compute_per_prime(residues_a: &[Vec<u64>], residues_b: &[Vec<u64>], out_len: usize, primes_needed: usize) -> Vec<Vec<u64>> {
        use rayon::prelude::*;
        (0..primes_needed)
            .into_par_iter()
            .map(|p| convolve_mod(&residues_a[p], &residues_b[p], out_len, p))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn compute_per_prime(residues_a: &[Vec<u64>], residues_b: &[Vec<u64>], out_len: usize, primes_needed: usize) -> Vec<Vec<u64>> {
        (0..primes_needed)
            .map(|p| convolve_mod(&residues_a[p], &residues_b[p], out_len, p))
            .collect()
    }

    /// CRT recombination is per-coefficient independent; same fan-out
    /// rationale as [`compute_per_prime`].
    #[cfg(feature = "parallel")]
    fn recombine_all(comb: &Comb, per_prime_results: &[Vec<u64>], out_len: usize) -> Option<Vec<Int>> {
        use rayon::prelude::*;
        (0..out_len)
            .into_par_iter()
            .map(|i| {
                let residues: Vec<u64> = per_prime_results.iter().map(|r| r[i]).collect();
                comb.recombine(&residues, true).ok()
            })
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn recombine_all(comb: &Comb, per_prime_results: &[Vec<u64>], out_len: usize) -> Option<Vec<Int>> {
        (0..out_len)
            .map(|i| {
                let residues: Vec<u64> = per_prime_results.iter().map(|r| r[i]).collect();
                comb.recombine(&residues, true).ok()
            })
            .collect()
    }
}

#[cfg(feature = "small-fft")]
pub use enabled::try_multiply;

/// Without the `small-fft` feature, the backend is always unavailable.
#[cfg(not(feature = "small-fft"))]
pub fn try_multiply(_a: &[crate::int::Int], _b: &[crate::int::Int]) -> Option<Vec<crate::int::Int>> {
    None
}

#[cfg(all(test, feature = "small-fft"))]
mod tests {
    use super::*;
    use crate::int::Int;

    #[test]
    fn small_prime_fft_matches_classical_convolution() {
        let a: Vec<Int> = (1..=20i64).map(Int::from_i64).collect();
        let b: Vec<Int> = (1..=20i64).map(Int::from_i64).collect();
        let out = try_multiply(&a, &b).expect("transform length supported");

        let mut expected = vec![Int::zero(); a.len() + b.len() - 1];
        for (i, x) in a.iter().enumerate() {
            for (j, y) in b.iter().enumerate() {
                expected[i + j] = expected[i + j].add(&x.mul(y));
            }
        }
        assert_eq!(out, expected);
    }

    #[test]
    fn empty_input_is_empty_product() {
        let a: Vec<Int> = Vec::new();
        let b: Vec<Int> = vec![Int::one()];
        assert_eq!(try_multiply(&a, &b), Some(Vec::new()));
    }
}
