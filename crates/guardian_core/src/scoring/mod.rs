//! Pure scoring functions: raw behavioral readings to bounded indices, and
//! indices to an ordinal burnout phase.
//!
//! # Invariants
//! - Every index is within `[0, 100]` for every `f64` input.
//! - Coefficients are fixed; phase thresholds are calibrated against them.
//! - Classification is memoryless: no hysteresis across calls.

pub mod index;
pub mod phase;

pub use index::{
    adaptive_capacity, compute_indices, fragmentation, latent_stress, neural_load,
};
pub use phase::{classify, classify_phase};
