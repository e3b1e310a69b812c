//! CRT support data: [`Comb`] (a precomputed prime comb for fast
//! single-`Int`-to-residues conversion and back) and [`MultiCRT`] (a
//! compiled three-address "CRT program" over an arbitrary vector of `Int`
//! moduli).
//!
//! Both types are built once and reused across many evaluations: pay the
//! tree-construction cost once, then interpret it cheaply per call.

use crate::error::CrtError;
use crate::int::{self, Int};

/// A precomputed comb of small single-limb primes, supporting fast
/// simultaneous reduction (`Int` -> residues) and recombination (residues ->
/// `Int`) via a balanced product/inverse tree.
pub struct Comb {
    primes: Vec<u64>,
    height: u32,
    /// `products[level][i]` is the product of a contiguous block of primes
    /// at that level; level 0 holds the primes themselves (as `Int`), and
    /// each level above halves the block count, doubling block width, until
    /// level `height` holds a single entry: the full product.
    products: Vec<Vec<Int>>,
    /// `inverses[level][i]` is the modular inverse needed to recombine the
    /// two children of `products[level+1][i/2]` back into their parent,
    /// mirrored against `products` one level down.
    inverses: Vec<Vec<Int>>,
}

impl Comb {
    /// Build a comb over `primes`. Every entry must be a positive single-limb
    /// prime and the list must be pairwise distinct (distinct primes are
    /// automatically pairwise coprime).
    pub fn new(primes: Vec<u64>) -> Result<Self, CrtError> {
        if primes.is_empty() {
            return Err(CrtError::EmptyModuli);
        }
        for &p in &primes {
            if p == 0 || !int::is_prime_u64(p) {
                return Err(CrtError::BadPrime(p));
            }
        }
        for i in 0..primes.len() {
            for j in (i + 1)..primes.len() {
                if primes[i] == primes[j] {
                    return Err(CrtError::NotCoprime);
                }
            }
        }

        let height = crate::limb::ceil_log2(primes.len());
        let mut level: Vec<Int> = primes.iter().map(|&p| Int::from_u64(p)).collect();
        let mut products = vec![level.clone()];
        let mut inverses = Vec::new();

        while level.len() > 1 {
            let mut next = Vec::with_capacity((level.len() + 1) / 2);
            let mut inv_level = Vec::with_capacity(level.len() / 2);
            let mut it = level.chunks(2);
            while let Some(chunk) = it.next() {
                if chunk.len() == 2 {
                    let (a, b) = (&chunk[0], &chunk[1]);
                    let prod = a.mul(b);
                    // Inverse of `a` modulo `b`, used when recombining this
                    // pair's residues back up into `prod`.
                    let inv = a
                        .invmod(b)
                        .map_err(|_| CrtError::NotCoprime)?;
                    inv_level.push(inv);
                    next.push(prod);
                } else {
                    next.push(chunk[0].clone());
                }
            }
            products.push(next.clone());
            inverses.push(inv_level);
            level = next;
        }

        Ok(Comb {
            primes,
            height,
            products,
            inverses,
        })
    }

    pub fn len(&self) -> usize {
        self.primes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primes.is_empty()
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn primes(&self) -> &[u64] {
        &self.primes
    }

    /// Total product `M = prod p_i`.
    pub fn modulus(&self) -> &Int {
        &self.products.last().expect("comb always has a top level")[0]
    }

    /// Reduce `value` against every prime in the comb, returning the
    /// residues `value mod p_i` in comb order (`multi_mod_ui`).
    pub fn reduce(&self, value: &Int) -> Vec<u64> {
        self.primes
            .iter()
            .map(|&p| value.to_big().mod_by_limb(p))
            .collect()
    }

    /// Recombine a vector of residues (one per prime, in comb order) into
    /// the unique `Int` in `[0, M)` congruent to each (`multi_CRT`), or the
    /// symmetric representative in `(-M/2, M/2]` if `sign` is set.
    pub fn recombine(&self, residues: &[u64], sign: bool) -> Result<Int, CrtError> {
        if residues.len() != self.primes.len() {
            return Err(CrtError::EmptyModuli);
        }
        let mut level: Vec<Int> = residues.iter().map(|&r| Int::from_u64(r)).collect();
        let mut moduli: Vec<Int> = self.products[0].clone();

        for lvl in 0..self.inverses.len() {
            let inv_level = &self.inverses[lvl];
            let next_moduli = &self.products[lvl + 1];
            let mut next = Vec::with_capacity(next_moduli.len());
            let mut pair_idx = 0;
            let mut i = 0;
            while i < level.len() {
                if i + 1 < level.len() {
                    let (r1, m1) = (&level[i], &moduli[i]);
                    let (r2, m2) = (&level[i + 1], &moduli[i + 1]);
                    let inv = &inv_level[pair_idx];
                    // r = r1 + m1 * ((r2 - r1) * inv mod m2)
                    let diff = r2.sub(r1).modulo(m2).map_err(|_| CrtError::NotCoprime)?;
                    let k = diff.mul(inv).modulo(m2).map_err(|_| CrtError::NotCoprime)?;
                    let combined = r1.add(&m1.mul(&k));
                    next.push(combined);
                    pair_idx += 1;
                    i += 2;
                } else {
                    next.push(level[i].clone());
                    i += 1;
                }
            }
            level = next;
            moduli = next_moduli.clone();
        }

        let m = self.modulus();
        let out = level.into_iter().next().expect("non-empty residue vector");
        let out = out.modulo(m).map_err(|_| CrtError::NotCoprime)?;
        if sign {
            out.smod(m).map_err(|_| CrtError::NotCoprime)
        } else {
            Ok(out)
        }
    }
}

/// A single three-address CRT instruction: combine the residues at `a_idx`
/// and `b_idx` (negative values index the original input vector, read via
/// [`Slot::Input`]; non-negative values index a prior instruction's output
/// slot) modulo `modulus`, writing the result to slot `c_idx`. `idem` is the
/// precomputed idempotent coefficient (`a_modulus^{-1} mod b_modulus`) needed
/// to combine the pair without recomputing it at evaluation time.
#[derive(Clone, Copy, Debug)]
pub enum Slot {
    Input(usize),
    Temp(usize),
}

#[derive(Clone, Debug)]
struct Instruction {
    a: Slot,
    b: Slot,
    a_modulus: Int,
    out_modulus: Int,
    idem: Int,
}

/// A compiled recursive CRT tree over a user-supplied vector of arbitrary
/// `Int` moduli: a compact three-address program, built once and interpreted
/// for every evaluation against a fresh residue vector.
pub struct MultiCRT {
    moduli: Vec<Int>,
    program: Vec<Instruction>,
    /// Number of temporary slots the program needs (its "local size").
    local_size: usize,
    total_modulus: Int,
    valid: bool,
}

impl MultiCRT {
    /// Compile a CRT program for `moduli`. The moduli need not be prime, only
    /// pairwise coprime; `valid()` reports whether that check succeeded.
    pub fn compile(moduli: Vec<Int>) -> Self {
        if moduli.is_empty() {
            return MultiCRT {
                moduli,
                program: Vec::new(),
                local_size: 0,
                total_modulus: Int::one(),
                valid: false,
            };
        }

        let mut valid = true;
        let mut current: Vec<(Slot, Int)> = moduli
            .iter()
            .enumerate()
            .map(|(i, m)| (Slot::Input(i), m.clone()))
            .collect();
        let mut program = Vec::new();
        let mut next_temp = 0usize;

        while current.len() > 1 {
            let mut next = Vec::with_capacity((current.len() + 1) / 2);
            let mut it = current.chunks(2);
            while let Some(chunk) = it.next() {
                if chunk.len() == 2 {
                    let (a_slot, a_mod) = &chunk[0];
                    let (b_slot, b_mod) = &chunk[1];
                    let idem = match a_mod.invmod(b_mod) {
                        Ok(v) => v,
                        Err(_) => {
                            valid = false;
                            Int::zero()
                        }
                    };
                    let combined_mod = a_mod.mul(b_mod);
                    let out_slot = Slot::Temp(next_temp);
                    next_temp += 1;
                    program.push(Instruction {
                        a: *a_slot,
                        b: *b_slot,
                        a_modulus: a_mod.clone(),
                        out_modulus: combined_mod.clone(),
                        idem,
                    });
                    next.push((out_slot, combined_mod));
                } else {
                    next.push(chunk[0].clone());
                }
            }
            current = next;
        }

        let total_modulus = current.into_iter().next().map(|(_, m)| m).unwrap_or_else(Int::one);

        MultiCRT {
            moduli,
            program,
            local_size: next_temp,
            total_modulus,
            valid,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn local_size(&self) -> usize {
        self.local_size
    }

    pub fn moduli(&self) -> &[Int] {
        &self.moduli
    }

    pub fn modulus(&self) -> &Int {
        &self.total_modulus
    }

    /// Interpret the compiled program against `residues` (one per modulus,
    /// same order as [`MultiCRT::moduli`]), returning the unique combined
    /// value in `[0, M)` (or the symmetric representative if `sign`).
    pub fn evaluate(&self, residues: &[Int], sign: bool) -> Result<Int, CrtError> {
        if !self.valid {
            return Err(CrtError::NotCoprime);
        }
        if residues.len() != self.moduli.len() {
            return Err(CrtError::EmptyModuli);
        }
        if self.program.is_empty() {
            let out = residues.first().cloned().unwrap_or_else(Int::zero);
            return Ok(if sign {
                out.smod(&self.total_modulus).map_err(|_| CrtError::NotCoprime)?
            } else {
                out
            });
        }

        let mut temps: Vec<Int> = Vec::with_capacity(self.local_size);
        let read = |slot: Slot, temps: &[Int]| -> Int {
            match slot {
                Slot::Input(i) => residues[i].clone(),
                Slot::Temp(i) => temps[i].clone(),
            }
        };

        for instr in &self.program {
            let r1 = read(instr.a, &temps);
            let r2 = read(instr.b, &temps);
            let diff = r2
                .sub(&r1)
                .modulo(&instr.out_modulus)
                .map_err(|_| CrtError::NotCoprime)?;
            let k = diff
                .mul(&instr.idem)
                .modulo(&instr.out_modulus)
                .map_err(|_| CrtError::NotCoprime)?;
            let combined = r1
                .add(&instr.a_modulus.mul(&k))
                .modulo(&instr.out_modulus)
                .map_err(|_| CrtError::NotCoprime)?;
            temps.push(combined);
        }

        let out = temps.last().expect("program produced an output").clone();
        if sign {
            out.smod(&self.total_modulus).map_err(|_| CrtError::NotCoprime)
        } else {
            Ok(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comb_round_trips_small_primes() {
        let comb = Comb::new(vec![3, 5, 7]).unwrap();
        let value = Int::from_i64(23);
        let residues = comb.reduce(&value);
        assert_eq!(residues, vec![2, 3, 2]);
        let back = comb.recombine(&residues, false).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn comb_rejects_duplicate_or_composite_primes() {
        assert!(matches!(Comb::new(vec![4, 5]), Err(CrtError::BadPrime(4))));
        assert!(matches!(Comb::new(vec![3, 3]), Err(CrtError::NotCoprime)));
        assert!(matches!(Comb::new(vec![]), Err(CrtError::EmptyModuli)));
    }

    #[test]
    fn comb_recombine_matches_single_limb_crt() {
        let comb = Comb::new(vec![11, 13, 17, 19]).unwrap();
        let value = Int::from_i64(123_456);
        let residues = comb.reduce(&value);
        let back = comb.recombine(&residues, false).unwrap();
        let m = comb.modulus();
        assert_eq!(back, value.modulo(m).unwrap());
    }

    #[test]
    fn multicrt_round_trips_arbitrary_moduli() {
        let moduli = vec![Int::from_i64(9), Int::from_i64(25), Int::from_i64(49)];
        let program = MultiCRT::compile(moduli.clone());
        assert!(program.is_valid());
        let value = Int::from_i64(5000);
        let residues: Vec<Int> = moduli
            .iter()
            .map(|m| value.modulo(m).unwrap())
            .collect();
        let out = program.evaluate(&residues, false).unwrap();
        assert_eq!(out, value.modulo(program.modulus()).unwrap());
    }

    #[test]
    fn multicrt_detects_non_coprime_moduli() {
        let moduli = vec![Int::from_i64(6), Int::from_i64(4)];
        let program = MultiCRT::compile(moduli);
        assert!(!program.is_valid());
        let residues = vec![Int::from_i64(1), Int::from_i64(1)];
        assert!(program.evaluate(&residues, false).is_err());
    }

    #[test]
    fn multicrt_single_modulus_is_identity() {
        let program = MultiCRT::compile(vec![Int::from_i64(97)]);
        assert!(program.is_valid());
        let residues = vec![Int::from_i64(42)];
        assert_eq!(program.evaluate(&residues, false).unwrap(), Int::from_i64(42));
    }
}
