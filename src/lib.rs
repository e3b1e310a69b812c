//! Crate root: public surface and module layout for the arbitrary-precision
//! integer and polynomial arithmetic kernel.
//!
//! This module is the single canonical entry point for downstream users of
//! the library. It re-exports the value types most callers need
//! (`Int`, `IntPoly`, `Rational`, the CRT types) and the shared error
//! taxonomy, and declares the submodules that implement them.
//!
//! ## Invariants
//!
//! - **No hidden I/O.** The library never writes to stdout/stderr and never
//!   touches the filesystem or network. Diagnostics go through `tracing`
//!   events, opt-in via whatever subscriber the caller installs.
//! - **No panics on input-dependent failure.** Every operation whose outcome
//!   depends on the caller's data (division by zero, a GCD that fails to
//!   verify, CRT moduli that aren't coprime) returns a `Result` with one of
//!   the error enums in [`error`]. A panic anywhere in this crate indicates
//!   either a documented programmer-error contract (e.g. [`int::Int::divexact`]
//!   on operands that don't divide evenly) or an environment failure (pool
//!   exhaustion), never a surprising data-dependent crash.
//! - **Dense representations throughout.** `IntPoly` stores every coefficient
//!   from degree `0` up to its own degree, mirroring the reference big-integer
//!   library this crate's arithmetic kernel is modeled on; sparse and
//!   multivariate representations are out of scope.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

/// Shared error taxonomy: one `thiserror`-derived enum per subsystem.
pub mod error;

/// Fixed-precision limb helpers the rest of the crate assumes.
pub mod limb;
/// Thin interface over the `malachite` arbitrary-precision backend.
pub mod bigint;
/// Process-wide arena pool backing the large-integer representation.
pub mod pool;
/// The compact `Int` value type and its scalar operations.
pub mod int;
/// `IntVec`: contiguous vectors of `Int` with shared dot-product helpers.
pub mod int_vec;
/// Chinese Remainder Theorem subsystem (`Comb`, `MultiCRT`).
pub mod crt;
/// The dense `IntPoly` representation, lifecycle, and basic arithmetic.
pub mod poly;
/// Polynomial multiplication dispatch ladder and all its backends.
pub mod poly_mul;
/// Optional small-prime multi-modular FFT multiplication backend.
pub mod fft_small_prime;
/// Polynomial division family (basecase, divide-and-conquer, series, pseudo).
pub mod poly_div;
/// Polynomial GCD family (subresultant, heuristic, modular) and its dispatch.
pub mod poly_gcd;
/// Power series arithmetic: powering, truncated products, composition, reversion.
pub mod poly_series;
/// Multi-modular polynomial interpolation.
pub mod poly_interp;
/// Rational functions over `IntPoly`.
pub mod rational;
/// Per-thread scratch-buffer stack backing leaf algorithms.
pub mod scratch;
/// Re-tunable dispatch cutoffs for the multiplication and division ladders.
pub mod tuning;

pub use crate::crt::{Comb, MultiCRT};
pub use crate::error::{CrtError, IntError, PolyError, PoolError, RationalError};
pub use crate::int::Int;
pub use crate::int_vec::IntVec;
pub use crate::poly::IntPoly;
pub use crate::rational::Rational;
pub use crate::tuning::Tuning;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_root_reexports_resolve() {
        let a = Int::from_i64(6);
        let b = Int::from_i64(4);
        assert_eq!(a.gcd(&b), Int::from_i64(2));

        let p = IntPoly::from_ints(&[1, 1]);
        let q = IntPoly::from_ints(&[1, -1]);
        let r = Rational::new(p, q).unwrap();
        assert_eq!(r.num(), &IntPoly::from_ints(&[1, 1]));

        let _ = Tuning::default();
    }
}
