//! Re-tunable dispatch cutoffs for the multiplication and division ladders.
//!
//! Threaded through as an explicit config struct rather than hard-wiring
//! block sizes as module-level constants: every cutoff a caller might
//! reasonably want to override for a particular coefficient size or
//! architecture lives on one `serde`-serializable struct instead of scattered
//! `const`s, while [`Tuning::default`] reproduces the measured defaults this
//! crate ships with.

use serde::{Deserialize, Serialize};

/// Dispatch cutoffs consulted by [`crate::poly_mul`] and [`crate::poly_div`].
/// The `_with_tuning` entry points on those modules accept a `&Tuning`
/// explicitly; the plain (no-suffix) entry points used internally elsewhere
/// in the crate call those with [`Tuning::default`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tuning {
    /// Coefficient-count threshold below which classical multiplication
    /// beats single-level Karatsuba.
    pub karatsuba_cutoff: usize,
    /// Coefficient-count threshold above which Karatsuba gives way to
    /// Kronecker substitution through the pooled big-integer backend.
    pub ks_cutoff: usize,
    /// Coefficient-count threshold above which the Karatsuba middle tier is
    /// skipped entirely in favor of Kronecker substitution, regardless of
    /// bit width. This crate's small-prime FFT backend already handles the
    /// asymptotically-fast regime for the sizes it supports (see
    /// `small_fft_cutoff`), so this threshold instead bounds how large an
    /// input is allowed to get before the recursive Karatsuba tier is
    /// abandoned even when the FFT backend declines (e.g. because the
    /// coefficients are too wide for its prime list).
    pub ss_cutoff: usize,
    /// Coefficient-count threshold above which [`crate::fft_small_prime::try_multiply`]
    /// is attempted before the rest of the ladder runs at all.
    pub small_fft_cutoff: usize,
    /// Bit width at or below which the classical triangular loops run
    /// without per-multiply overflow risk, widening the size range in which
    /// classical multiplication is still the fastest choice.
    pub tiny_bitcount_cutoff: u64,
    /// Divisor-degree threshold below which divide-and-conquer division
    /// falls back to the basecase schoolbook loop.
    pub divconquer_cutoff: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Tuning {
            karatsuba_cutoff: 8,
            ks_cutoff: 64,
            ss_cutoff: 80,
            small_fft_cutoff: 80,
            tiny_bitcount_cutoff: 30,
            divconquer_cutoff: 16,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_the_crate_wide_measured_cutoffs() {
        let t = Tuning::default();
        assert_eq!(t.karatsuba_cutoff, 8);
        assert_eq!(t.divconquer_cutoff, 16);
        assert_eq!(t.small_fft_cutoff, 80);
    }
}
