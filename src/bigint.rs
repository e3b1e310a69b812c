//! Big-integer backend.
//!
//! Classical multi-precision unsigned/signed integer operations over limb
//! arrays, consumed by the rest of the kernel through a small interface:
//! add, sub, mul, div, gcd, shift, compare, bit-count, mod-by-limb. This
//! layer is supplied by `malachite` rather than hand-rolled, the same way
//! other Rust polynomial crates build their coefficient type directly on
//! `malachite::Integer` instead of reimplementing limb arithmetic.
//!
//! `BigInt` is an opaque newtype; nothing above this module reaches into
//! `malachite` directly, so the backend stays swappable.

use malachite_base::num::arithmetic::traits::{Gcd, UnsignedAbs};
use malachite_base::num::logic::traits::SignificantBits;
use malachite_nz::integer::Integer;
use malachite_nz::natural::Natural;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::IntError;

/// An arbitrary-precision signed integer, as supplied by the big-integer
/// backend.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BigInt(pub(crate) Integer);

impl BigInt {
    pub fn zero() -> Self {
        BigInt(Integer::from(0i64))
    }

    pub fn from_i64(v: i64) -> Self {
        BigInt(Integer::from(v))
    }

    pub fn from_u64(v: u64) -> Self {
        BigInt(Integer::from(v))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == Integer::from(0i64)
    }

    pub fn sign(&self) -> i32 {
        match self.0.cmp(&Integer::from(0i64)) {
            Ordering::Less => -1,
            Ordering::Equal => 0,
            Ordering::Greater => 1,
        }
    }

    pub fn neg(&self) -> Self {
        BigInt(-self.0.clone())
    }

    pub fn abs(&self) -> Self {
        if self.sign() < 0 {
            self.neg()
        } else {
            self.clone()
        }
    }

    pub fn add(&self, other: &Self) -> Self {
        BigInt(self.0.clone() + other.0.clone())
    }

    pub fn sub(&self, other: &Self) -> Self {
        BigInt(self.0.clone() - other.0.clone())
    }

    pub fn mul(&self, other: &Self) -> Self {
        BigInt(self.0.clone() * other.0.clone())
    }

    /// Truncated (toward zero) division and remainder, matching Rust's
    /// native integer `/`/`%` semantics.
    pub fn tdiv_rem(&self, other: &Self) -> Option<(Self, Self)> {
        if other.is_zero() {
            return None;
        }
        let q = self.0.clone() / other.0.clone();
        let r = self.0.clone() - (q.clone() * other.0.clone());
        Some((BigInt(q), BigInt(r)))
    }

    /// Floor division and remainder (remainder has the sign of `other`).
    pub fn fdiv_rem(&self, other: &Self) -> Option<(Self, Self)> {
        let (q, r) = self.tdiv_rem(other)?;
        if r.is_zero() || r.sign() == other.sign() {
            Some((q, r))
        } else {
            let q = BigInt(q.0 - Integer::from(1i64));
            let r = BigInt(r.0 + other.0.clone());
            Some((q, r))
        }
    }

    /// Non-negative remainder in `[0, |m|)`.
    pub fn mod_nonneg(&self, modulus: &Self) -> Option<Self> {
        let m = modulus.abs();
        if m.is_zero() {
            return None;
        }
        let (_, r) = self.tdiv_rem(&m)?;
        Some(if r.sign() < 0 { BigInt(r.0 + m.0) } else { r })
    }

    /// Reduce against a single-limb modulus, returning the non-negative
    /// residue as a machine word.
    pub fn mod_by_limb(&self, modulus: u64) -> u64 {
        if modulus == 0 {
            return 0;
        }
        let r = self.mod_nonneg(&BigInt::from_u64(modulus)).unwrap();
        u64::try_from(&r.0).unwrap_or(0)
    }

    pub fn shl(&self, bits: u64) -> Self {
        BigInt(self.0.clone() << bits)
    }

    /// Arithmetic (sign-preserving) right shift, truncating toward zero on
    /// the magnitude (used for `tdiv_2exp`).
    pub fn shr_trunc(&self, bits: u64) -> Self {
        let (q, _) = self.tdiv_rem(&BigInt(Integer::from(1i64) << bits)).expect("nonzero divisor");
        q
    }

    pub fn cmp_big(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }

    /// Number of bits in the magnitude (0 for zero).
    pub fn bit_count(&self) -> u64 {
        self.0.unsigned_abs().significant_bits()
    }

    pub fn gcd(&self, other: &Self) -> Self {
        let a = self.0.clone().unsigned_abs();
        let b = other.0.clone().unsigned_abs();
        BigInt(Integer::from(a.gcd(b)))
    }

    /// Attempt to narrow to a host `i64`.
    pub fn to_i64(&self) -> Option<i64> {
        i64::try_from(&self.0).ok()
    }

    pub fn to_decimal_string(&self) -> String {
        self.0.to_string()
    }

    pub fn from_decimal_str(s: &str) -> Result<Self, IntError> {
        Integer::from_str(s)
            .map(BigInt)
            .map_err(|_| IntError::Parse(s.to_string()))
    }

    /// Build from a little-endian signed-magnitude limb array (the
    /// `fmpz/set_ui_array.c`-style constructor from `original_source/`).
    pub fn from_signed_limbs(limbs: &[u64], negative: bool) -> Self {
        let nat = Natural::from_limbs_asc(limbs);
        let mut v = Integer::from(nat);
        if negative {
            v = -v;
        }
        BigInt(v)
    }

    /// Decompose into `(magnitude limbs ascending, is_negative)`, the dual
    /// of [`BigInt::from_signed_limbs`] (`fmpz/get_signed_ui_array.c`).
    pub fn to_signed_limbs(&self) -> (Vec<u64>, bool) {
        let negative = self.sign() < 0;
        let nat = self.0.clone().unsigned_abs();
        (nat.to_limbs_asc(), negative)
    }
}

impl fmt::Debug for BigInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BigInt({})", self.0)
    }
}

impl fmt::Display for BigInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tdiv_and_fdiv_match_signs() {
        let a = BigInt::from_i64(-7);
        let b = BigInt::from_i64(2);
        let (tq, tr) = a.tdiv_rem(&b).unwrap();
        assert_eq!(tq.to_i64(), Some(-3));
        assert_eq!(tr.to_i64(), Some(-1));

        let (fq, fr) = a.fdiv_rem(&b).unwrap();
        assert_eq!(fq.to_i64(), Some(-4));
        assert_eq!(fr.to_i64(), Some(1));
    }

    #[test]
    fn gcd_is_nonnegative() {
        let a = BigInt::from_i64(-48);
        let b = BigInt::from_i64(18);
        assert_eq!(a.gcd(&b).to_i64(), Some(6));
    }

    #[test]
    fn limb_roundtrip() {
        let v = BigInt::from_u64(u64::MAX).mul(&BigInt::from_u64(3));
        let (limbs, neg) = v.to_signed_limbs();
        let back = BigInt::from_signed_limbs(&limbs, neg);
        assert_eq!(v, back);
    }

    #[test]
    fn mod_by_limb_is_nonnegative() {
        let v = BigInt::from_i64(-23);
        assert_eq!(v.mod_by_limb(7), 5);
    }
}
