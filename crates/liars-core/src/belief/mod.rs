//! Probability model each seat builds over the dice it cannot see.
//!
//! - `distribution`: binomial tail table over the unknown pool, shifted by the dice in hand.
//! - `confidence`: Wilson lower bound and the claim plausibility check built on it.

mod confidence;
mod distribution;

pub use confidence::{NEUTRAL_BOUND, should_challenge_claim, wilson_lower_bound};
pub use distribution::{DistributionError, DistributionTable, NATURAL_MATCH, WILD_MATCH};
