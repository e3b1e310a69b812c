//! `IntVec`: a contiguous sequence of [`Int`] with vector-level arithmetic.
//!
//! Backed by a plain `Vec<Int>`; there is no implicit sharing between
//! vectors (each slot owns its `Int`) and Rust's `Vec` already forbids
//! out-of-range reads.

use std::cmp::Ordering;

use crate::bigint::BigInt;
use crate::int::Int;

/// A dense sequence of arbitrary-precision integers.
#[derive(Clone, Debug, Default)]
pub struct IntVec(Vec<Int>);

impl IntVec {
    pub fn new() -> Self {
        IntVec(Vec::new())
    }

    pub fn from_vec(v: Vec<Int>) -> Self {
        IntVec(v)
    }

    pub fn zeros(len: usize) -> Self {
        IntVec((0..len).map(|_| Int::zero()).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Int] {
        &self.0
    }

    pub fn as_mut_slice(&mut self) -> &mut [Int] {
        &mut self.0
    }

    pub fn push(&mut self, v: Int) {
        self.0.push(v);
    }

    pub fn get(&self, i: usize) -> Option<&Int> {
        self.0.get(i)
    }

    // ---------------------------- element-wise ops ---------------------------

    fn zip_with(&self, other: &Self, f: impl Fn(&Int, &Int) -> Int) -> Self {
        assert_eq!(self.len(), other.len(), "IntVec length mismatch");
        IntVec(
            self.0
                .iter()
                .zip(other.0.iter())
                .map(|(a, b)| f(a, b))
                .collect(),
        )
    }

    pub fn add(&self, other: &Self) -> Self {
        self.zip_with(other, Int::add)
    }

    pub fn sub(&self, other: &Self) -> Self {
        self.zip_with(other, Int::sub)
    }

    pub fn neg(&self) -> Self {
        IntVec(self.0.iter().map(Int::neg).collect())
    }

    pub fn scalar_mul(&self, c: &Int) -> Self {
        IntVec(self.0.iter().map(|x| x.mul(c)).collect())
    }

    pub fn scalar_fdiv(&self, c: &Int) -> Self {
        IntVec(self.0.iter().map(|x| x.fdiv_q(c).expect("c != 0")).collect())
    }

    pub fn scalar_mod(&self, c: &Int) -> Self {
        IntVec(self.0.iter().map(|x| x.modulo(c).expect("c != 0")).collect())
    }

    /// `max_i bits(c_i)`, signed: negative iff any element is negative
    /// (magnitude is the bit count of the largest-magnitude element).
    pub fn max_bits(&self) -> i64 {
        let mut max_bits = 0u64;
        let mut any_negative = false;
        for x in &self.0 {
            max_bits = max_bits.max(x.bit_count());
            if x.sgn() < 0 {
                any_negative = true;
            }
        }
        if any_negative {
            -(max_bits as i64)
        } else {
            max_bits as i64
        }
    }

    /// Content: GCD of all elements; `0` for an empty or all-zero vector.
    pub fn content(&self) -> Int {
        let mut g = Int::zero();
        for x in &self.0 {
            g = g.gcd(x);
        }
        g
    }

    /// `dst = ±initial + sum_{i<len} a[i] * b[±i]`.
    ///
    /// `initial` may be `None` (start from zero). If `reverse`, `b` is
    /// indexed from the end. Aliasing `initial` with the eventual result is
    /// safe because this returns a fresh value rather than writing through
    /// a pointer (see the module-level note in `int.rs` on how this port
    /// realizes the aliasing contract).
    pub fn dot_general(
        initial: Option<&Int>,
        negate_initial: bool,
        a: &[Int],
        b: &[Int],
        reverse: bool,
        len: usize,
    ) -> Int {
        let mut acc = match initial {
            Some(v) if negate_initial => v.neg(),
            Some(v) => v.clone(),
            None => Int::zero(),
        };
        for i in 0..len {
            let bi = if reverse { &b[b.len() - 1 - i] } else { &b[i] };
            acc = acc.addmul(&a[i], bi);
        }
        acc
    }

    /// Plain dot product with no initial accumulator and forward indexing.
    pub fn dot(a: &[Int], b: &[Int]) -> Int {
        let len = a.len().min(b.len());
        Self::dot_general(None, false, a, b, false, len)
    }

    // ------------------------------ bit packing -------------------------------

    /// Pack each coefficient into a contiguous `bits`-wide field of a raw
    /// little-endian limb stream, low-order-first. With `sign_flag`, a
    /// borrow is carried between adjacent fields: each field holds the
    /// non-negative residue of `(coefficient - borrow_in)` modulo `2^bits`,
    /// and a new borrow of `1` is propagated into the next slot whenever
    /// that difference was negative. Every field's own magnitude is written
    /// out through its native limbs rather than narrowed to a machine word,
    /// so coefficients of any size are supported. The caller is responsible
    /// for choosing `bits` wide enough to hold the signed range of every
    /// coefficient plus the one-unit borrow, exactly as Kronecker
    /// substitution's `pack_bits` computation does before calling this.
    pub fn bit_pack(&self, bits: u32, sign_flag: bool) -> Vec<u64> {
        let total_bits = bits as u128 * self.0.len() as u128;
        let n_limbs = ((total_bits + 63) / 64) as usize;
        let mut out = vec![0u64; n_limbs.max(1)];
        let mut bit_pos: u128 = 0;
        let modulus = Int::one().mul_2exp(bits as u64);
        let mut borrow = Int::zero();
        for x in &self.0 {
            let field = if sign_flag {
                let diff = x.sub(&borrow);
                borrow = if diff.sgn() < 0 { Int::one() } else { Int::zero() };
                diff.modulo(&modulus).expect("2^bits modulus is never zero")
            } else {
                assert!(x.sgn() >= 0, "bit_pack: negative coefficient with sign_flag unset");
                x.clone()
            };
            let (field_limbs, negative) = field.to_big().to_signed_limbs();
            debug_assert!(!negative, "bit_pack: field value must be non-negative");
            copy_bits(&mut out, bit_pos, &field_limbs, 0, bits);
            bit_pos += bits as u128;
        }
        out
    }

    /// Inverse of [`IntVec::bit_pack`].
    pub fn bit_unpack(limbs: &[u64], n: usize, bits: u32, sign_flag: bool) -> Self {
        let mut out = Vec::with_capacity(n);
        let mut bit_pos: u128 = 0;
        let modulus = Int::one().mul_2exp(bits as u64);
        let half = Int::one().mul_2exp(bits as u64 - 1);
        let mut borrow = Int::zero();
        for _ in 0..n {
            let field_len = ((bits + 63) / 64) as usize;
            let mut field_limbs = vec![0u64; field_len.max(1)];
            copy_bits(&mut field_limbs, 0, limbs, bit_pos, bits);
            bit_pos += bits as u128;
            let raw = Int::from_big(BigInt::from_signed_limbs(&field_limbs, false));
            let x = if sign_flag {
                let signed = if raw.cmp(&half) != Ordering::Less { raw.sub(&modulus) } else { raw };
                let value = signed.add(&borrow);
                borrow = if signed.sgn() < 0 { Int::one() } else { Int::zero() };
                value
            } else {
                raw
            };
            out.push(x);
        }
        IntVec(out)
    }
}

/// Copies `bits` bits from `src` (starting at `src_pos`) into `dst`
/// (starting at `dst_pos`), aligning each chunk to whichever side's limb
/// boundary comes first so a single chunk never has to span a limb on
/// either side.
fn copy_bits(dst: &mut [u64], dst_pos: u128, src: &[u64], src_pos: u128, bits: u32) {
    let mut remaining = bits;
    let mut dpos = dst_pos;
    let mut spos = src_pos;
    while remaining > 0 {
        let dst_off = (dpos % 64) as u32;
        let src_off = (spos % 64) as u32;
        let take = remaining.min(64 - dst_off).min(64 - src_off);
        let dst_idx = (dpos / 64) as usize;
        let src_idx = (spos / 64) as usize;
        let chunk = (src.get(src_idx).copied().unwrap_or(0) >> src_off) & mask_for(take);
        dst[dst_idx] |= chunk << dst_off;
        dpos += take as u128;
        spos += take as u128;
        remaining -= take;
    }
}

fn mask_for(bits: u32) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(xs: &[i64]) -> IntVec {
        IntVec(xs.iter().map(|x| Int::from_i64(*x)).collect())
    }

    #[test]
    fn element_wise_add_sub() {
        let a = v(&[1, 2, 3]);
        let b = v(&[10, 20, 30]);
        assert_eq!(a.add(&b).as_slice(), v(&[11, 22, 33]).as_slice());
        assert_eq!(b.sub(&a).as_slice(), v(&[9, 18, 27]).as_slice());
    }

    #[test]
    fn content_and_max_bits() {
        let a = v(&[12, 18, -30]);
        assert_eq!(a.content(), Int::from_i64(6));
        assert!(a.max_bits() < 0);
        assert_eq!(IntVec::zeros(0).content(), Int::zero());
    }

    #[test]
    fn dot_general_matches_manual_sum() {
        let a = v(&[1, 2, 3]);
        let b = v(&[4, 5, 6]);
        let d = IntVec::dot(a.as_slice(), b.as_slice());
        assert_eq!(d, Int::from_i64(1 * 4 + 2 * 5 + 3 * 6));

        let init = Int::from_i64(100);
        let d2 = IntVec::dot_general(Some(&init), false, a.as_slice(), b.as_slice(), false, 3);
        assert_eq!(d2, Int::from_i64(100 + 1 * 4 + 2 * 5 + 3 * 6));

        let d3 = IntVec::dot_general(None, false, a.as_slice(), b.as_slice(), true, 3);
        assert_eq!(d3, Int::from_i64(1 * 6 + 2 * 5 + 3 * 4));
    }

    #[test]
    fn bit_pack_unpack_round_trip_unsigned() {
        let a = v(&[1, 2, 3, 255]);
        let packed = a.bit_pack(9, false);
        let back = IntVec::bit_unpack(&packed, 4, 9, false);
        assert_eq!(a.as_slice(), back.as_slice());
    }

    #[test]
    fn bit_pack_unpack_round_trip_signed() {
        let a = v(&[1, -2, 3, -4]);
        let packed = a.bit_pack(16, true);
        let back = IntVec::bit_unpack(&packed, 4, 16, true);
        assert_eq!(a.as_slice(), back.as_slice());
    }

    #[test]
    fn bit_pack_unpack_round_trip_beyond_machine_word_range() {
        let huge: Int = "123456789012345678901234567890".parse().unwrap();
        let a = IntVec(vec![huge.clone(), huge.neg(), Int::from_i64(0)]);
        let packed = a.bit_pack(128, true);
        let back = IntVec::bit_unpack(&packed, 3, 128, true);
        assert_eq!(a.as_slice(), back.as_slice());
    }
}
