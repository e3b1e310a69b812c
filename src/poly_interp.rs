//! Multi-modular polynomial interpolation.
//!
//! Recovers the unique degree-`<n` integer polynomial through `n` given
//! points by interpolating modulo a growing sequence of single-limb primes
//! and CRT-recombining, rather than doing the divided-difference arithmetic
//! directly over arbitrary-precision integers (whose coefficients can grow
//! far larger than any individual evaluation actually needs).
//!
//! `evaluate_divconquer_fmpz`-style binary-tree Horner evaluation lives on
//! [`IntPoly::evaluate_divconquer`] directly; there is no separate free
//! function for it here.

use crate::crt::Comb;
use crate::error::PolyError;
use crate::int::Int;
use crate::poly::IntPoly;
use crate::poly_gcd::prime_stream;

/// Hard cap on the number of candidate primes tried before giving up.
/// Bounds the loop for pathological inputs instead of running forever.
const MAX_PRIME_ATTEMPTS: usize = 1000;

/// Recover the unique polynomial of degree `< xs.len()` with `poly(xs[i]) ==
/// ys[i]` for every `i`. Errors with [`PolyError::NoSolution`] if the `xs`
/// are not pairwise distinct, or if the prime budget above is exhausted
/// before a verified candidate is found.
pub fn interpolate_multi_mod(xs: &[Int], ys: &[Int]) -> Result<IntPoly, PolyError> {
    let n = xs.len();
    if n == 0 {
        return Ok(IntPoly::zero());
    }
    for i in 0..n {
        for j in (i + 1)..n {
            if xs[i] == xs[j] {
                return Err(PolyError::NoSolution("interpolation points are not pairwise distinct".to_string()));
            }
        }
    }
    if n == 1 {
        return Ok(IntPoly::from_coeffs(vec![ys[0].clone()]));
    }
    if ys.iter().all(|y| y.is_zero()) {
        return Ok(IntPoly::zero());
    }

    let x_inf = xs.iter().map(|x| x.abs()).fold(Int::zero(), |acc, x| if x > acc { x } else { acc });
    let y_inf = ys.iter().map(|y| y.abs()).fold(Int::one(), |acc, y| {
        let ay = y.abs();
        if ay > acc { ay } else { acc }
    });
    let log2n = (usize::BITS - (n - 1).leading_zeros()) as u64;
    let bound = x_inf
        .add(&Int::one())
        .pow_ui((n - 1) as u64)
        .mul(&Int::from_u64(log2n.max(1)))
        .mul(&y_inf);
    let bound_with_margin = bound.mul(&Int::from_u64(2));

    let mut primes: Vec<u64> = Vec::new();
    let mut residue_rows: Vec<Vec<u64>> = Vec::new();

    for p in prime_stream().take(MAX_PRIME_ATTEMPTS) {
        let residues_x: Vec<u64> = xs.iter().map(|x| x.to_big().mod_by_limb(p)).collect();
        let residues_y: Vec<u64> = ys.iter().map(|y| y.to_big().mod_by_limb(p)).collect();

        let mut row = match interpolate_mod_prime(&residues_x, &residues_y, p) {
            Some(row) => row,
            None => continue, // xs collide mod this prime; discard it
        };
        row.resize(n, 0);
        primes.push(p);
        residue_rows.push(row);

        if let Some(candidate) = try_recombine(&primes, &residue_rows, n) {
            let verified = xs.iter().zip(ys.iter()).all(|(x, y)| &candidate.evaluate(x) == y);
            if verified {
                return Ok(candidate);
            }
        }

        let modulus_product = primes.iter().fold(Int::one(), |acc, &q| acc.mul(&Int::from_u64(q)));
        if modulus_product > bound_with_margin {
            return Err(PolyError::NoSolution(
                "accumulated prime modulus exceeded the coefficient height bound".to_string(),
            ));
        }
    }

    Err(PolyError::NoSolution(
        "exhausted the prime search budget without a verified interpolant".to_string(),
    ))
}

/// Modular Lagrange interpolation via Newton divided differences, converted
/// to monomial form by repeated synthetic multiplication by `(x - x_k)`.
/// Returns `None` if any two `xs` coincide modulo `p` (the divided
/// difference's denominator vanishes).
fn interpolate_mod_prime(xs: &[u64], ys: &[u64], p: u64) -> Option<Vec<u64>> {
    let n = xs.len();
    let modulus = Int::from_u64(p);
    let xs_i: Vec<Int> = xs.iter().map(|&x| Int::from_u64(x % p)).collect();
    let mut coef: Vec<Int> = ys.iter().map(|&y| Int::from_u64(y % p)).collect();

    for j in 1..n {
        for i in (j..n).rev() {
            let diff = coef[i].sub(&coef[i - 1]).modulo(&modulus).ok()?;
            let denom = xs_i[i].sub(&xs_i[i - j]).modulo(&modulus).ok()?;
            if denom.is_zero() {
                return None;
            }
            let inv = denom.invmod(&modulus).ok()?;
            coef[i] = diff.mul(&inv).modulo(&modulus).ok()?;
        }
    }

    let mut result = vec![coef[n - 1].clone()];
    for k in (0..n - 1).rev() {
        let mut shifted = vec![Int::zero(); result.len() + 1];
        for (idx, c) in result.iter().enumerate() {
            shifted[idx + 1] = shifted[idx + 1].add(c).modulo(&modulus).ok()?;
            shifted[idx] = shifted[idx].sub(&c.mul(&xs_i[k])).modulo(&modulus).ok()?;
        }
        shifted[0] = shifted[0].add(&coef[k]).modulo(&modulus).ok()?;
        result = shifted;
    }

    Some(result.iter().map(|c| c.to_i64().unwrap_or(0) as u64).collect())
}

fn try_recombine(primes: &[u64], rows: &[Vec<u64>], n: usize) -> Option<IntPoly> {
    let comb = Comb::new(primes.to_vec()).ok()?;
    let mut coeffs = Vec::with_capacity(n);
    for i in 0..n {
        let residues: Vec<u64> = rows.iter().map(|r| r[i]).collect();
        coeffs.push(comb.recombine(&residues, true).ok()?);
    }
    Some(IntPoly::from_coeffs(coeffs))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(xs: &[i64]) -> Vec<Int> {
        xs.iter().map(|&v| Int::from_i64(v)).collect()
    }

    #[test]
    fn interpolates_a_known_quadratic() {
        // f(x) = x^2 + 2x + 3
        let xs = ints(&[0, 1, 2, 3]);
        let ys: Vec<Int> = xs.iter().map(|x| x.mul(x).add(&x.mul_ui(2)).add(&Int::from_i64(3))).collect();
        let poly = interpolate_multi_mod(&xs, &ys).unwrap();
        for (x, y) in xs.iter().zip(ys.iter()) {
            assert_eq!(&poly.evaluate(x), y);
        }
    }

    #[test]
    fn interpolates_with_negative_points_and_values() {
        let xs = ints(&[-2, -1, 0, 1, 2]);
        let ys: Vec<Int> = xs.iter().map(|x| x.mul(x).mul(x).sub(&x)).collect(); // x^3 - x
        let poly = interpolate_multi_mod(&xs, &ys).unwrap();
        for (x, y) in xs.iter().zip(ys.iter()) {
            assert_eq!(&poly.evaluate(x), y);
        }
    }

    #[test]
    fn single_point_returns_constant_polynomial() {
        let xs = ints(&[7]);
        let ys = ints(&[42]);
        let poly = interpolate_multi_mod(&xs, &ys).unwrap();
        assert_eq!(poly, IntPoly::from_coeffs(ints(&[42])));
    }

    #[test]
    fn duplicate_points_are_rejected() {
        let xs = ints(&[1, 1, 2]);
        let ys = ints(&[1, 1, 4]);
        assert!(interpolate_multi_mod(&xs, &ys).is_err());
    }

    #[test]
    fn all_zero_values_give_the_zero_polynomial() {
        let xs = ints(&[1, 2, 3]);
        let ys = ints(&[0, 0, 0]);
        let poly = interpolate_multi_mod(&xs, &ys).unwrap();
        assert!(poly.is_zero());
    }
}
