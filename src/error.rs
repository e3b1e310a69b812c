//! Shared error taxonomy.
//!
//! One enum per subsystem, in the style of a small `thiserror`-derived enum
//! per module rather than one crate-wide catch-all. Every error-returning
//! entry point returns one of these through a `Result`; operations that hit
//! a programmer-error contract (an out-of-range argument, a stale handle
//! used after `free`) panic instead, since those are not input-dependent
//! failures.

use thiserror::Error;

/// Errors from the compact-integer layer (`Int`, the pool, and scalar ops).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IntError {
    #[error("division by zero")]
    DivByZero,
    #[error("negative exponent on a non-unit base")]
    NegativeExponent,
    #[error("logarithm of a non-positive value")]
    LogDomain,
    #[error("square root of a negative value")]
    SqrtDomain,
    #[error("value is not a perfect {0}th power")]
    NotExactRoot(u64),
    #[error("exact division with non-zero remainder")]
    Inexact,
    #[error("malformed integer literal: {0:?}")]
    Parse(String),
    #[error("bit count would overflow the host word size")]
    Overflow,
    #[error("modulus is not coprime with the base; no inverse exists")]
    NotInvertible,
    #[error("CRT inputs are not usable: {0}")]
    Crt(#[from] CrtError),
}

/// Errors from the pool allocator backing the large-integer representation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("pool handle {0:?} refers to a freed or foreign slot")]
    StaleHandle(crate::pool::PoolIndex),
    #[error("pool is exhausted (more than u32::MAX live entries)")]
    Exhausted,
}

/// Errors from CRT construction and evaluation (`Comb`, `MultiCRT`).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CrtError {
    #[error("modulus must be a positive single-limb prime, got {0}")]
    BadPrime(u64),
    #[error("moduli are not pairwise coprime")]
    NotCoprime,
    #[error("no usable combination of the supplied moduli/residues exists")]
    NoSolution,
    #[error("empty modulus list")]
    EmptyModuli,
}

/// Errors from the dense integer-polynomial engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolyError {
    #[error("division by the zero polynomial")]
    DivByZero,
    #[error("exact division left a non-zero remainder")]
    Inexact,
    #[error("optional backend unavailable for this input shape")]
    Unavailable,
    #[error("malformed polynomial literal: {0:?}")]
    Parse(String),
    #[error("composition requires poly2[0] == 0")]
    ComposeNonzeroConstant,
    #[error("no solution: {0}")]
    NoSolution(String),
    #[error(transparent)]
    Int(#[from] IntError),
    #[error(transparent)]
    Crt(#[from] CrtError),
}

/// Errors from the rational-function layer (`Rational`).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RationalError {
    #[error("zero denominator")]
    ZeroDenominator,
    #[error("numerator is zero; no multiplicative inverse exists")]
    NoInverse,
    #[error("evaluation point is a pole of the denominator")]
    Pole,
    #[error("malformed rational-function literal: {0:?}")]
    Parse(String),
    #[error(transparent)]
    Poly(#[from] PolyError),
}
