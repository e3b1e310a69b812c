//! The compact signed arbitrary-precision integer `Int`.
//!
//! Small magnitudes are stored inline; anything outside `[COEFF_MIN,
//! COEFF_MAX]` is promoted into the process-wide pool (`pool.rs`) of
//! `BigInt`-backed entries (`bigint.rs`). A "top two bits stolen from a
//! machine word" discriminator is replaced here by an explicit tagged enum,
//! the natural choice for a systems-language port that doesn't need
//! bit-identical layout with a reference C structure.
//!
//! Every arithmetic entry point is a free function or method returning a
//! fresh `Int`. In Rust this already handles output-aliases-input safely:
//! there is no output parameter that exists before the computation
//! completes, so there is nothing for a computation to corrupt mid-flight.
//! `*_assign` variants and `impl Add/Sub/...` are thin wrappers that replace
//! `self` with the freshly computed value: compute into a temporary, then
//! swap, just expressed through ownership instead of a manual swap.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Rem, Sub};
use std::str::FromStr;

use rand_core::RngCore;

use crate::bigint::BigInt;
use crate::error::{CrtError, IntError};
use crate::pool::{self, PoolIndex};

/// Word width assumed by the small/large split.
pub const WORD_BITS: u32 = 64;

/// Largest value representable in the small form.
pub const COEFF_MAX: i64 = (1i64 << (WORD_BITS - 2)) - 1;

/// Smallest value representable in the small form.
pub const COEFF_MIN: i64 = -COEFF_MAX;

/// An arbitrary-precision signed integer.
pub enum Int {
    Small(i64),
    Large(PoolIndex),
}

impl Drop for Int {
    fn drop(&mut self) {
        if let Int::Large(idx) = self {
            pool::free(*idx);
        }
    }
}

impl Clone for Int {
    fn clone(&self) -> Self {
        match self {
            Int::Small(v) => Int::Small(*v),
            Int::Large(idx) => Int::Large(pool::promote(pool::with(*idx, |b| b.clone()))),
        }
    }
}

impl Int {
    pub fn zero() -> Self {
        Int::Small(0)
    }

    pub fn one() -> Self {
        Int::Small(1)
    }

    pub fn from_i64(v: i64) -> Self {
        Self::from_big(BigInt::from_i64(v))
    }

    pub fn from_u64(v: u64) -> Self {
        Self::from_big(BigInt::from_u64(v))
    }

    /// Read out the large-form pool entry's value (allocating a new entry is
    /// never needed for a read).
    pub(crate) fn to_big(&self) -> BigInt {
        match self {
            Int::Small(v) => BigInt::from_i64(*v),
            Int::Large(idx) => pool::with(*idx, |b| b.clone()),
        }
    }

    /// Construct a canonical `Int` from a `BigInt`, demoting to the small
    /// form whenever the magnitude allows it (`demote_if_possible`). Every
    /// constructor funnels through here, so demote-on-shrink is a structural
    /// property rather than something each op has to remember.
    pub(crate) fn from_big(b: BigInt) -> Self {
        if let Some(v) = b.to_i64() {
            if (COEFF_MIN..=COEFF_MAX).contains(&v) {
                return Int::Small(v);
            }
        }
        Int::Large(pool::promote(b))
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Int::Small(v) => *v == 0,
            Int::Large(idx) => pool::with(*idx, |b| b.is_zero()),
        }
    }

    /// `-1`, `0`, or `1`.
    pub fn sgn(&self) -> i32 {
        match self {
            Int::Small(v) => v.signum() as i32,
            Int::Large(idx) => pool::with(*idx, |b| b.sign()),
        }
    }

    pub fn to_i64(&self) -> Option<i64> {
        match self {
            Int::Small(v) => Some(*v),
            Int::Large(idx) => pool::with(*idx, |b| b.to_i64()),
        }
    }

    pub fn bit_count(&self) -> u64 {
        self.to_big().bit_count()
    }

    // --------------------------- basic arithmetic ---------------------------

    pub fn neg(&self) -> Self {
        match self {
            Int::Small(v) if *v != i64::MIN => Int::Small(-v),
            _ => Self::from_big(self.to_big().neg()),
        }
    }

    pub fn abs(&self) -> Self {
        if self.sgn() < 0 {
            self.neg()
        } else {
            self.clone()
        }
    }

    pub fn add(&self, other: &Self) -> Self {
        if let (Int::Small(a), Int::Small(b)) = (self, other) {
            if let Some(s) = a.checked_add(*b) {
                if (COEFF_MIN..=COEFF_MAX).contains(&s) {
                    return Int::Small(s);
                }
            }
        }
        Self::from_big(self.to_big().add(&other.to_big()))
    }

    pub fn sub(&self, other: &Self) -> Self {
        if let (Int::Small(a), Int::Small(b)) = (self, other) {
            if let Some(s) = a.checked_sub(*b) {
                if (COEFF_MIN..=COEFF_MAX).contains(&s) {
                    return Int::Small(s);
                }
            }
        }
        Self::from_big(self.to_big().sub(&other.to_big()))
    }

    pub fn mul(&self, other: &Self) -> Self {
        Self::from_big(self.to_big().mul(&other.to_big()))
    }

    pub fn mul_ui(&self, other: u64) -> Self {
        self.mul(&Int::from_u64(other))
    }

    pub fn mul_si(&self, other: i64) -> Self {
        self.mul(&Int::from_i64(other))
    }

    /// `self * 2^bits` (left shift).
    pub fn mul_2exp(&self, bits: u64) -> Self {
        Self::from_big(self.to_big().shl(bits))
    }

    /// Floor-divide by a machine integer directly, without the caller first
    /// promoting it to an `Int`.
    pub fn fdiv_si(&self, other: i64) -> Result<Self, IntError> {
        self.fdiv_q(&Int::from_i64(other))
    }

    /// `self / 2^bits`, truncated toward zero (the magnitude is shifted
    /// right, independent of sign).
    pub fn tdiv_2exp(&self, bits: u64) -> Self {
        Self::from_big(self.to_big().shr_trunc(bits))
    }

    /// `self + a*b`.
    pub fn addmul(&self, a: &Self, b: &Self) -> Self {
        self.add(&a.mul(b))
    }

    /// `self - a*b`.
    pub fn submul(&self, a: &Self, b: &Self) -> Self {
        self.sub(&a.mul(b))
    }

    /// Fused multiply-multiply-add: `a*b + c*d`.
    pub fn fmma(a: &Self, b: &Self, c: &Self, d: &Self) -> Self {
        a.mul(b).add(&c.mul(d))
    }

    pub fn pow_ui(&self, mut exp: u64) -> Self {
        let mut base = self.clone();
        let mut acc = Int::one();
        while exp > 0 {
            if exp & 1 == 1 {
                acc = acc.mul(&base);
            }
            exp >>= 1;
            if exp > 0 {
                base = base.mul(&base);
            }
        }
        acc
    }

    /// `self^exp` for an arbitrary-precision, possibly-negative exponent.
    /// Fails unless `exp >= 0`, or `self` is a unit (`±1`).
    pub fn pow_fmpz(&self, exp: &Self) -> Result<Self, IntError> {
        if exp.sgn() >= 0 {
            let e = exp.to_i64().ok_or(IntError::Overflow)? as u64;
            return Ok(self.pow_ui(e));
        }
        match self.to_i64() {
            Some(1) => Ok(Int::one()),
            Some(-1) => {
                let e = exp.to_i64().ok_or(IntError::Overflow)?;
                Ok(if e % 2 == 0 { Int::one() } else { Int::from_i64(-1) })
            }
            _ => Err(IntError::NegativeExponent),
        }
    }

    // ------------------------------ division ------------------------------

    /// Truncated-toward-zero quotient and remainder.
    pub fn tdiv_qr(&self, other: &Self) -> Result<(Self, Self), IntError> {
        let (q, r) = self
            .to_big()
            .tdiv_rem(&other.to_big())
            .ok_or(IntError::DivByZero)?;
        Ok((Self::from_big(q), Self::from_big(r)))
    }

    pub fn tdiv_q(&self, other: &Self) -> Result<Self, IntError> {
        Ok(self.tdiv_qr(other)?.0)
    }

    pub fn tdiv_r(&self, other: &Self) -> Result<Self, IntError> {
        Ok(self.tdiv_qr(other)?.1)
    }

    /// Floor quotient and remainder (remainder has the sign of `other`).
    pub fn fdiv_qr(&self, other: &Self) -> Result<(Self, Self), IntError> {
        let (q, r) = self
            .to_big()
            .fdiv_rem(&other.to_big())
            .ok_or(IntError::DivByZero)?;
        Ok((Self::from_big(q), Self::from_big(r)))
    }

    pub fn fdiv_q(&self, other: &Self) -> Result<Self, IntError> {
        Ok(self.fdiv_qr(other)?.0)
    }

    pub fn fdiv_r(&self, other: &Self) -> Result<Self, IntError> {
        Ok(self.fdiv_qr(other)?.1)
    }

    /// Ceiling quotient and remainder.
    pub fn cdiv_qr(&self, other: &Self) -> Result<(Self, Self), IntError> {
        let (tq, tr) = self.tdiv_qr(other)?;
        if tr.is_zero() || tr.sgn() != other.sgn() {
            Ok((tq, tr))
        } else {
            let q = tq.add(&Int::one());
            let r = tr.sub(other);
            Ok((q, r))
        }
    }

    pub fn cdiv_q(&self, other: &Self) -> Result<Self, IntError> {
        Ok(self.cdiv_qr(other)?.0)
    }

    /// Exact division; fails if `other` does not divide `self` evenly.
    pub fn divexact(&self, other: &Self) -> Result<Self, IntError> {
        let (q, r) = self.tdiv_qr(other)?;
        if !r.is_zero() {
            return Err(IntError::Inexact);
        }
        Ok(q)
    }

    /// Non-negative remainder in `[0, |m|)`.
    pub fn modulo(&self, m: &Self) -> Result<Self, IntError> {
        self.to_big()
            .mod_nonneg(&m.to_big())
            .map(Self::from_big)
            .ok_or(IntError::DivByZero)
    }

    /// Symmetric remainder in `(-|m|/2, |m|/2]`.
    pub fn smod(&self, m: &Self) -> Result<Self, IntError> {
        let m_abs = m.abs();
        if m_abs.is_zero() {
            return Err(IntError::DivByZero);
        }
        let r = self.modulo(m)?;
        let half = m_abs.fdiv_q(&Int::from_i64(2))?;
        if r.cmp_int(&half) == Ordering::Greater {
            Ok(r.sub(&m_abs))
        } else {
            Ok(r)
        }
    }

    // -------------------------------- gcd -----------------------------------

    pub fn gcd(&self, other: &Self) -> Self {
        Self::from_big(self.to_big().gcd(&other.to_big()))
    }

    pub fn lcm(&self, other: &Self) -> Self {
        if self.is_zero() || other.is_zero() {
            return Int::zero();
        }
        let g = self.gcd(other);
        self.divexact(&g)
            .expect("gcd divides self exactly")
            .mul(other)
            .abs()
    }

    /// Extended Euclid: returns `(g, s, t)` with `s*a + t*b == g == gcd(a,b)`.
    pub fn xgcd(&self, other: &Self) -> (Self, Self, Self) {
        let (mut old_r, mut r) = (self.clone(), other.clone());
        let (mut old_s, mut s) = (Int::one(), Int::zero());
        let (mut old_t, mut t) = (Int::zero(), Int::one());
        while !r.is_zero() {
            let q = old_r.fdiv_q(&r).expect("r != 0 in loop guard");
            let new_r = old_r.sub(&q.mul(&r));
            old_r = std::mem::replace(&mut r, new_r);
            let new_s = old_s.sub(&q.mul(&s));
            old_s = std::mem::replace(&mut s, new_s);
            let new_t = old_t.sub(&q.mul(&t));
            old_t = std::mem::replace(&mut t, new_t);
        }
        if old_r.sgn() < 0 {
            (old_r.neg(), old_s.neg(), old_t.neg())
        } else {
            (old_r, old_s, old_t)
        }
    }

    /// Modular inverse of `self` mod `m`. `Ok(false)` (via `NotInvertible`)
    /// when `gcd(self, m) != 1`.
    pub fn invmod(&self, m: &Self) -> Result<Self, IntError> {
        let (g, s, _t) = self.xgcd(m);
        if g.to_i64() != Some(1) {
            return Err(IntError::NotInvertible);
        }
        s.modulo(m)
    }

    // --------------------------- number theory ------------------------------

    /// Jacobi symbol `(self / n)`. Requires `n` odd and positive.
    pub fn jacobi(&self, n: &Self) -> i32 {
        assert!(n.sgn() > 0 && n.tstbit(0) == Some(true), "jacobi: n must be odd and positive");
        let mut a = self.modulo(n).expect("n > 0");
        let mut n = n.clone();
        let mut result = 1i32;
        while !a.is_zero() {
            while a.tstbit(0) == Some(false) {
                a = a.tdiv_q(&Int::from_i64(2)).expect("divides evenly");
                let n_mod8 = n.modulo(&Int::from_i64(8)).expect("n>0").to_i64().unwrap();
                if n_mod8 == 3 || n_mod8 == 5 {
                    result = -result;
                }
            }
            std::mem::swap(&mut a, &mut n);
            let a_mod4 = a.modulo(&Int::from_i64(4)).expect("n>0").to_i64().unwrap();
            let n_mod4 = n.modulo(&Int::from_i64(4)).expect("n>0").to_i64().unwrap();
            if a_mod4 == 3 && n_mod4 == 3 {
                result = -result;
            }
            a = a.modulo(&n).expect("n > 0");
        }
        if n.to_i64() == Some(1) {
            result
        } else {
            0
        }
    }

    /// Evaluate the Chebyshev polynomial `T_n(self)` via the standard
    /// three-term recurrence.
    pub fn chebyshev_t(n: u64, x: &Self) -> Self {
        let (mut t_prev, mut t_cur) = (Int::one(), x.clone());
        if n == 0 {
            return t_prev;
        }
        for _ in 1..n {
            let next = x.mul(&t_cur).mul_ui(2).sub(&t_prev);
            t_prev = t_cur;
            t_cur = next;
        }
        t_cur
    }

    /// Evaluate the Chebyshev polynomial `U_n(self)`.
    pub fn chebyshev_u(n: u64, x: &Self) -> Self {
        let (mut u_prev, mut u_cur) = (Int::one(), x.mul_ui(2));
        if n == 0 {
            return u_prev;
        }
        for _ in 1..n {
            let next = x.mul(&u_cur).mul_ui(2).sub(&u_prev);
            u_prev = u_cur;
            u_cur = next;
        }
        u_cur
    }

    pub fn factorial(n: u64) -> Self {
        let mut acc = Int::one();
        for k in 2..=n {
            acc = acc.mul_ui(k);
        }
        acc
    }

    pub fn fibonacci(n: u64) -> Self {
        let (mut a, mut b) = (Int::zero(), Int::one());
        for _ in 0..n {
            let next = a.add(&b);
            a = std::mem::replace(&mut b, next);
        }
        a
    }

    pub fn binomial(n: u64, k: u64) -> Self {
        if k > n {
            return Int::zero();
        }
        let k = k.min(n - k);
        let mut acc = Int::one();
        for i in 0..k {
            acc = acc.mul_ui(n - i).tdiv_q(&Int::from_u64(i + 1)).expect("exact");
        }
        acc
    }

    /// The Mobius function `mu(n)`: `0` if `n` has a squared prime factor,
    /// else `(-1)^k` where `k` is the number of distinct prime factors of
    /// `n`. Defined for `n >= 1`.
    pub fn moebius_mu(n: u64) -> i32 {
        if n == 0 {
            return 0;
        }
        if n == 1 {
            return 1;
        }
        let mut n = n;
        let mut distinct_primes = 0u32;
        let mut p = 2u64;
        while p.saturating_mul(p) <= n {
            if n % p == 0 {
                n /= p;
                if n % p == 0 {
                    return 0;
                }
                distinct_primes += 1;
            }
            p += 1;
        }
        if n > 1 {
            distinct_primes += 1;
        }
        if distinct_primes % 2 == 0 {
            1
        } else {
            -1
        }
    }

    /// Integer (floor) base-2 logarithm of a positive value.
    pub fn log2_floor(&self) -> Result<u64, IntError> {
        if self.sgn() <= 0 {
            return Err(IntError::LogDomain);
        }
        Ok(self.bit_count() - 1)
    }

    /// Floor square root. Fails (`SqrtDomain`) on negative input.
    pub fn sqrt(&self) -> Result<Self, IntError> {
        Ok(self.sqrtrem()?.0)
    }

    /// `(floor(sqrt(self)), self - floor(sqrt(self))^2)`.
    pub fn sqrtrem(&self) -> Result<(Self, Self), IntError> {
        if self.sgn() < 0 {
            return Err(IntError::SqrtDomain);
        }
        if self.is_zero() {
            return Ok((Int::zero(), Int::zero()));
        }
        // Newton's method on integers, starting from a bit-length estimate.
        let bits = self.bit_count();
        let mut x = Int::one().mul_2exp((bits / 2) + 1);
        loop {
            let x2 = x.mul(&x);
            let quotient = if x.is_zero() {
                Int::zero()
            } else {
                self.fdiv_q(&x).expect("x != 0")
            };
            let next = x.add(&quotient).fdiv_q(&Int::from_i64(2)).expect("2 != 0");
            if next.cmp_int(&x) != Ordering::Less {
                let _ = x2;
                break;
            }
            x = next;
        }
        while x.mul(&x).cmp_int(self) == Ordering::Greater {
            x = x.sub(&Int::one());
        }
        while x.add(&Int::one()).mul(&x.add(&Int::one())).cmp_int(self) != Ordering::Greater {
            x = x.add(&Int::one());
        }
        let rem = self.sub(&x.mul(&x));
        Ok((x, rem))
    }

    /// Floor `n`-th root of a non-negative value (`n >= 1`).
    pub fn root(&self, n: u64) -> Result<Self, IntError> {
        if n == 0 {
            return Err(IntError::NegativeExponent);
        }
        if self.sgn() < 0 {
            return Err(IntError::SqrtDomain);
        }
        if self.is_zero() || n == 1 {
            return Ok(self.clone());
        }
        let bits = self.bit_count();
        let mut x = Int::one().mul_2exp(bits / n + 1);
        loop {
            let xn1 = x.pow_ui(n - 1);
            if xn1.is_zero() {
                break;
            }
            let quotient = self.fdiv_q(&xn1).expect("xn1 != 0");
            let next = x
                .mul_ui(n - 1)
                .add(&quotient)
                .fdiv_q(&Int::from_u64(n))
                .expect("n != 0");
            if next.cmp_int(&x) != Ordering::Less {
                break;
            }
            x = next;
        }
        while x.pow_ui(n).cmp_int(self) == Ordering::Greater {
            x = x.sub(&Int::one());
        }
        while x.add(&Int::one()).pow_ui(n).cmp_int(self) != Ordering::Greater {
            x = x.add(&Int::one());
        }
        Ok(x)
    }

    /// `Some(root)` iff `self` is an exact `n`-th power.
    pub fn root_exact(&self, n: u64) -> Result<Option<Self>, IntError> {
        let r = self.root(n)?;
        Ok(if r.pow_ui(n).cmp_int(self) == Ordering::Equal {
            Some(r)
        } else {
            None
        })
    }

    // ------------------------------- bit ops --------------------------------

    /// Bit `b` of the infinite two's-complement representation of `self`.
    pub fn tstbit(&self, bit: u64) -> Option<bool> {
        let modulus = Int::one().mul_2exp(bit + 1);
        let r = self.modulo(&modulus).ok()?; // in [0, 2^(bit+1))
        let half = Int::one().mul_2exp(bit);
        Some(r.fdiv_q(&half).ok()?.to_i64()? % 2 == 1)
    }

    pub fn setbit(&self, bit: u64) -> Self {
        if self.tstbit(bit) == Some(true) {
            self.clone()
        } else {
            self.add(&Int::one().mul_2exp(bit))
        }
    }

    pub fn clrbit(&self, bit: u64) -> Self {
        if self.tstbit(bit) == Some(true) {
            self.sub(&Int::one().mul_2exp(bit))
        } else {
            self.clone()
        }
    }

    pub fn combit(&self, bit: u64) -> Self {
        if self.tstbit(bit) == Some(true) {
            self.clrbit(bit)
        } else {
            self.setbit(bit)
        }
    }

    /// Bitwise complement: `-(self + 1)`.
    pub fn complement(&self) -> Self {
        self.add(&Int::one()).neg()
    }

    /// Population count. Defined for non-negative values only (the infinite
    /// two's-complement expansion of a negative value has infinitely many
    /// set bits, so there's no finite count to return).
    pub fn popcount(&self) -> u64 {
        assert!(self.sgn() >= 0, "popcount is undefined for negative Int");
        let (limbs, _) = self.to_big().to_signed_limbs();
        limbs.iter().map(|l| l.count_ones() as u64).sum()
    }

    fn twos_complement_limbs(&self, len: usize) -> Vec<u64> {
        let (mag, neg) = self.to_big().to_signed_limbs();
        let mut limbs = mag;
        limbs.resize(len, 0);
        if neg {
            for l in limbs.iter_mut() {
                *l = !*l;
            }
            let mut carry = 1u64;
            for l in limbs.iter_mut() {
                let (s, c) = l.overflowing_add(carry);
                *l = s;
                carry = c as u64;
                if carry == 0 {
                    break;
                }
            }
        }
        limbs
    }

    fn from_twos_complement_limbs(limbs: &[u64]) -> Self {
        let negative = limbs.last().map(|l| (l >> 63) & 1 == 1).unwrap_or(false);
        if !negative {
            return Self::from_big(BigInt::from_signed_limbs(limbs, false));
        }
        let mut mag: Vec<u64> = limbs.iter().map(|l| !l).collect();
        let mut carry = 1u64;
        for l in mag.iter_mut() {
            let (s, c) = l.overflowing_add(carry);
            *l = s;
            carry = c as u64;
            if carry == 0 {
                break;
            }
        }
        Self::from_big(BigInt::from_signed_limbs(&mag, true))
    }

    fn bitwise(&self, other: &Self, f: impl Fn(u64, u64) -> u64) -> Self {
        let len = (self.bit_count().max(other.bit_count()) / 64 + 2) as usize;
        let a = self.twos_complement_limbs(len);
        let b = other.twos_complement_limbs(len);
        let out: Vec<u64> = a.iter().zip(b.iter()).map(|(x, y)| f(*x, *y)).collect();
        Self::from_twos_complement_limbs(&out)
    }

    pub fn and(&self, other: &Self) -> Self {
        self.bitwise(other, |a, b| a & b)
    }

    pub fn or(&self, other: &Self) -> Self {
        self.bitwise(other, |a, b| a | b)
    }

    pub fn xor(&self, other: &Self) -> Self {
        self.bitwise(other, |a, b| a ^ b)
    }

    // ---------------------------------- CRT ----------------------------------

    /// `CRT_ui`: given `(r1, m1)` and a single-limb prime pair `(r2, m2)`,
    /// compute `out` with `out ≡ r1 (mod m1)`, `out ≡ r2 (mod m2)`. With
    /// `sign`, the result is the symmetric representative around zero;
    /// otherwise it lies in `[0, m1*m2)`.
    pub fn crt_ui(r1: &Self, m1: &Self, r2: u64, m2: u64, sign: bool) -> Result<Self, CrtError> {
        if m2 == 0 || !is_prime_u64(m2) {
            return Err(CrtError::BadPrime(m2));
        }
        let m1_mod_m2 = m1.to_big().mod_by_limb(m2);
        let inv = mod_inverse_u64(m1_mod_m2, m2).ok_or(CrtError::NotCoprime)?;
        Self::crt_ui_precomp(r1, m1, r2, m2, inv, sign)
    }

    /// `CRT_ui` with a precomputed `m1^{-1} mod m2`, avoiding recomputing the
    /// single-limb modular inverse on every call (used by `Comb`/`MultiCRT`
    /// when the modulus set is fixed across many evaluations).
    pub fn crt_ui_precomp(
        r1: &Self,
        m1: &Self,
        r2: u64,
        m2: u64,
        m1_inv_mod_m2: u64,
        sign: bool,
    ) -> Result<Self, CrtError> {
        let r1_mod_m2 = r1.to_big().mod_by_limb(m2);
        let diff = (r2 as i128 - r1_mod_m2 as i128).rem_euclid(m2 as i128) as u64;
        let k = ((diff as u128 * m1_inv_mod_m2 as u128) % m2 as u128) as u64;
        let m1m2 = m1.mul_ui(m2);
        let out = r1.add(&m1.mul_ui(k));
        let out = out.modulo(&m1m2).map_err(|_| CrtError::BadPrime(m2))?;
        if sign {
            Ok(out.smod(&m1m2).map_err(|_| CrtError::BadPrime(m2))?)
        } else {
            Ok(out)
        }
    }

    fn cmp_int(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Int::Small(a), Int::Small(b)) => a.cmp(b),
            _ => self.to_big().cmp_big(&other.to_big()),
        }
    }

    /// Draw a uniformly-random value in `[0, bound)` from the supplied
    /// random source. The core never constructs its own generator (spec:
    /// "the core consumes an opaque random source capability").
    pub fn random_below(bound: &Self, rng: &mut impl RngCore) -> Self {
        assert!(bound.sgn() > 0, "random_below requires a positive bound");
        let bits = bound.bit_count() + 1;
        let n_limbs = ((bits + 63) / 64) as usize;
        loop {
            let limbs: Vec<u64> = (0..n_limbs).map(|_| rng.next_u64()).collect();
            let candidate = Self::from_big(BigInt::from_signed_limbs(&limbs, false));
            if candidate.cmp_int(bound) == Ordering::Less {
                return candidate;
            }
        }
    }
}

pub(crate) fn is_prime_u64(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    if n % 2 == 0 {
        return n == 2;
    }
    let mut d = 3u64;
    while d.saturating_mul(d) <= n {
        if n % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}

/// `a^{-1} mod m` via the extended Euclidean algorithm on machine words.
fn mod_inverse_u64(a: u64, m: u64) -> Option<u64> {
    let (mut old_r, mut r) = (a as i128, m as i128);
    let (mut old_s, mut s) = (1i128, 0i128);
    while r != 0 {
        let q = old_r / r;
        let new_r = old_r - q * r;
        old_r = std::mem::replace(&mut r, new_r);
        let new_s = old_s - q * s;
        old_s = std::mem::replace(&mut s, new_s);
    }
    if old_r != 1 {
        return None;
    }
    Some(old_s.rem_euclid(m as i128) as u64)
}

// ----------------------------- primality testing -----------------------------

impl Int {
    /// Miller-Rabin probabilistic primality test with `rounds` independent
    /// witnesses drawn from `rng`. Deterministic `false` for `n < 2` or even
    /// `n > 2`.
    pub fn is_probably_prime(&self, rounds: u32, rng: &mut impl RngCore) -> bool {
        if self.sgn() <= 0 {
            return false;
        }
        let small_primes = [2u64, 3, 5, 7, 11, 13, 17, 19, 23, 29];
        for p in small_primes {
            let p_int = Int::from_u64(p);
            if self.cmp_int(&p_int) == Ordering::Equal {
                return true;
            }
            if self.modulo(&p_int).map(|r| r.is_zero()).unwrap_or(false) {
                return false;
            }
        }
        let one = Int::one();
        let n_minus_1 = self.sub(&one);
        let mut d = n_minus_1.clone();
        let mut r = 0u64;
        while d.tstbit(0) == Some(false) {
            d = d.tdiv_q(&Int::from_i64(2)).expect("2 != 0");
            r += 1;
        }
        'witness: for _ in 0..rounds {
            let a = {
                let bound = n_minus_1.sub(&Int::from_i64(2));
                if bound.sgn() <= 0 {
                    continue;
                }
                Int::random_below(&bound, rng).add(&Int::from_i64(2))
            };
            let mut x = mod_pow(&a, &d, self);
            if x.cmp_int(&one) == Ordering::Equal || x.cmp_int(&n_minus_1) == Ordering::Equal {
                continue 'witness;
            }
            for _ in 0..r.saturating_sub(1) {
                x = mod_pow(&x, &Int::from_i64(2), self);
                if x.cmp_int(&n_minus_1) == Ordering::Equal {
                    continue 'witness;
                }
            }
            return false;
        }
        true
    }
}

fn mod_pow(base: &Int, exp: &Int, modulus: &Int) -> Int {
    let mut result = Int::one();
    let mut base = base.modulo(modulus).expect("modulus > 0");
    let mut exp = exp.clone();
    while exp.sgn() > 0 {
        if exp.tstbit(0) == Some(true) {
            result = result.mul(&base).modulo(modulus).expect("modulus > 0");
        }
        base = base.mul(&base).modulo(modulus).expect("modulus > 0");
        exp = exp.tdiv_q(&Int::from_i64(2)).expect("2 != 0");
    }
    result
}

// ------------------------------ std trait impls ------------------------------

impl PartialEq for Int {
    fn eq(&self, other: &Self) -> bool {
        self.cmp_int(other) == Ordering::Equal
    }
}
impl Eq for Int {}

impl PartialOrd for Int {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp_int(other))
    }
}
impl Ord for Int {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_int(other)
    }
}

impl std::hash::Hash for Int {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.to_big().to_decimal_string().hash(state);
    }
}

impl fmt::Debug for Int {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_big())
    }
}

impl fmt::Display for Int {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_big())
    }
}

impl FromStr for Int {
    type Err = IntError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BigInt::from_decimal_str(s).map(Self::from_big)
    }
}

impl Add for &Int {
    type Output = Int;
    fn add(self, rhs: &Int) -> Int {
        Int::add(self, rhs)
    }
}
impl Sub for &Int {
    type Output = Int;
    fn sub(self, rhs: &Int) -> Int {
        Int::sub(self, rhs)
    }
}
impl Mul for &Int {
    type Output = Int;
    fn mul(self, rhs: &Int) -> Int {
        Int::mul(self, rhs)
    }
}
impl Div for &Int {
    type Output = Int;
    fn div(self, rhs: &Int) -> Int {
        Int::tdiv_q(self, rhs).expect("division by zero")
    }
}
impl Rem for &Int {
    type Output = Int;
    fn rem(self, rhs: &Int) -> Int {
        Int::tdiv_r(self, rhs).expect("division by zero")
    }
}
impl Neg for &Int {
    type Output = Int;
    fn neg(self) -> Int {
        Int::neg(self)
    }
}

// Manual serde impl rather than a derive: the tagged `Small`/`Large`
// representation includes a process-local pool handle that means nothing to
// a deserializer in another process. Round-tripping through the decimal
// string instead gives a stable, representation-independent wire form.
impl serde::Serialize for Int {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_big().to_decimal_string())
    }
}

impl<'de> serde::Deserialize<'de> for Int {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        BigInt::from_decimal_str(&s).map(Int::from_big).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rng() -> rand::rngs::StdRng {
        use rand::SeedableRng;
        rand::rngs::StdRng::seed_from_u64(42)
    }

    #[test]
    fn round_trip_str() {
        for s in ["0", "-1", "123456789012345678901234567890", "-99"] {
            let x: Int = s.parse().unwrap();
            assert_eq!(x.to_string(), s);
        }
    }

    #[test]
    fn serde_round_trips_through_decimal_string() {
        for s in ["0", "-1", "123456789012345678901234567890", "-99"] {
            let x: Int = s.parse().unwrap();
            let json = serde_json::to_string(&x).unwrap();
            assert_eq!(json, format!("\"{}\"", s));
            let back: Int = serde_json::from_str(&json).unwrap();
            assert_eq!(back, x);
        }
    }

    #[test]
    fn fdiv_si_matches_fdiv_q_with_a_promoted_divisor() {
        for (a, d) in [(-7i64, 2i64), (7, -2), (7, 2), (-7, -2)] {
            let x = Int::from_i64(a);
            assert_eq!(x.fdiv_si(d).unwrap(), x.fdiv_q(&Int::from_i64(d)).unwrap());
        }
    }

    #[test]
    fn tdiv_2exp_matches_division_by_the_power_of_two() {
        for (a, bits) in [(100i64, 3u64), (-100, 3), (7, 0), (-1, 4)] {
            let x = Int::from_i64(a);
            let expected = x.tdiv_q(&Int::from_i64(1 << bits)).unwrap();
            assert_eq!(x.tdiv_2exp(bits), expected);
        }
    }

    #[test]
    fn demotion_is_canonical() {
        let big = Int::from_i64(COEFF_MAX).add(&Int::one());
        assert!(matches!(big, Int::Large(_)));
        let back = big.sub(&Int::one());
        assert!(matches!(back, Int::Small(_)));
        assert_eq!(back, Int::from_i64(COEFF_MAX));
    }

    #[test]
    fn smod_in_range() {
        for (a, m) in [(7i64, 3i64), (-7, 3), (7, -3), (10, 4)] {
            let x = Int::from_i64(a).smod(&Int::from_i64(m)).unwrap();
            let half = Int::from_i64(m.abs()) .fdiv_q(&Int::from_i64(2)).unwrap();
            assert!(x.cmp_int(&half.neg()) == Ordering::Greater || x == half.neg());
            assert!(x.cmp_int(&half) != Ordering::Greater);
            let diff = Int::from_i64(a).sub(&x);
            assert!(diff.tdiv_r(&Int::from_i64(m)).unwrap().is_zero());
        }
    }

    #[test]
    fn gcd_lcm_xgcd_consistency() {
        let a = Int::from_i64(48);
        let b = Int::from_i64(18);
        let g = a.gcd(&b);
        assert_eq!(g, Int::from_i64(6));
        assert_eq!(a.lcm(&b), Int::from_i64(144));
        let (g2, s, t) = a.xgcd(&b);
        assert_eq!(g2, g);
        assert_eq!(s.mul(&a).add(&t.mul(&b)), g);
    }

    #[test]
    fn invmod_roundtrip() {
        let a = Int::from_i64(7);
        let m = Int::from_i64(40);
        let inv = a.invmod(&m).unwrap();
        assert_eq!(a.mul(&inv).modulo(&m).unwrap(), Int::one());
        assert!(Int::from_i64(4).invmod(&Int::from_i64(8)).is_err());
    }

    #[test]
    fn bit_ops_roundtrip() {
        for v in [0i64, 1, -1, 5, -5, 1024, -1024] {
            let x = Int::from_i64(v);
            for b in 0..8u64 {
                let bit = x.tstbit(b).unwrap();
                let flipped = x.combit(b);
                assert_eq!(flipped.tstbit(b).unwrap(), !bit);
                assert_eq!(flipped.combit(b), x);
            }
        }
        assert_eq!(Int::from_i64(0).complement(), Int::from_i64(-1));
        assert_eq!(Int::from_i64(-1).complement(), Int::from_i64(0));
    }

    #[test]
    fn bitwise_and_or_xor_match_native_i64() {
        for a in [-13i64, -1, 0, 1, 13, 255] {
            for b in [-7i64, -1, 0, 3, 255] {
                let ia = Int::from_i64(a);
                let ib = Int::from_i64(b);
                assert_eq!(ia.and(&ib).to_i64(), Some(a & b));
                assert_eq!(ia.or(&ib).to_i64(), Some(a | b));
                assert_eq!(ia.xor(&ib).to_i64(), Some(a ^ b));
            }
        }
    }

    #[test]
    fn popcount_matches_native() {
        assert_eq!(Int::from_i64(255).popcount(), 8);
        assert_eq!(Int::from_i64(0).popcount(), 0);
    }

    #[test]
    fn sqrt_and_root() {
        let x = Int::from_i64(99);
        let (s, r) = x.sqrtrem().unwrap();
        assert_eq!(s, Int::from_i64(9));
        assert_eq!(r, Int::from_i64(18));
        assert_eq!(Int::from_i64(27).root(3).unwrap(), Int::from_i64(3));
        assert_eq!(Int::from_i64(27).root_exact(3).unwrap(), Some(Int::from_i64(3)));
        assert_eq!(Int::from_i64(28).root_exact(3).unwrap(), None);
        assert!(Int::from_i64(-4).sqrt().is_err());
    }

    #[test]
    fn factorial_fibonacci_binomial() {
        assert_eq!(Int::factorial(5), Int::from_i64(120));
        assert_eq!(Int::fibonacci(10), Int::from_i64(55));
        assert_eq!(Int::binomial(5, 2), Int::from_i64(10));
    }

    #[test]
    fn chebyshev_matches_known_values() {
        let x = Int::from_i64(2);
        assert_eq!(Int::chebyshev_t(0, &x), Int::one());
        assert_eq!(Int::chebyshev_t(1, &x), x);
        assert_eq!(Int::chebyshev_t(2, &x), Int::from_i64(7)); // 2x^2-1
        assert_eq!(Int::chebyshev_u(2, &x), Int::from_i64(15)); // 4x^2-1
    }

    #[test]
    fn jacobi_known_values() {
        assert_eq!(Int::from_i64(1001).jacobi(&Int::from_i64(9907)), -1);
        assert_eq!(Int::from_i64(19).jacobi(&Int::from_i64(45)), 1);
    }

    #[test]
    fn moebius_mu_known_values() {
        assert_eq!(Int::moebius_mu(1), 1);
        assert_eq!(Int::moebius_mu(2), -1);
        assert_eq!(Int::moebius_mu(4), 0);
        assert_eq!(Int::moebius_mu(6), 1);
        assert_eq!(Int::moebius_mu(30), -1);
        assert_eq!(Int::moebius_mu(12), 0);
    }

    #[test]
    fn crt_ui_round_trip() {
        let r1 = Int::from_i64(2);
        let m1 = Int::from_i64(3);
        let out = Int::crt_ui(&r1, &m1, 3, 7, false).unwrap();
        assert_eq!(out, Int::from_i64(17));
        assert_eq!(out.modulo(&Int::from_i64(3)).unwrap(), Int::from_i64(2));
        assert_eq!(out.modulo(&Int::from_i64(7)).unwrap(), Int::from_i64(3));
    }

    #[test]
    fn primality_small_values() {
        let mut r = rng();
        for p in [2u64, 3, 5, 7, 97, 104729] {
            assert!(Int::from_u64(p).is_probably_prime(20, &mut r), "{p} should be prime");
        }
        for c in [1u64, 4, 9, 100, 104730] {
            assert!(!Int::from_u64(c).is_probably_prime(20, &mut r), "{c} should be composite");
        }
    }
}
