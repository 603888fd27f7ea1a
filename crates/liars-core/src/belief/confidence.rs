use crate::belief::distribution::DistributionTable;
use crate::model::bid::Bid;
use crate::model::hand::Hand;
use statrs::distribution::{ContinuousCDF, Normal};
use std::sync::OnceLock;

/// Quantile used for the one-sided 90% interval.
const INTERVAL_QUANTILE: f64 = 0.8;
/// Φ⁻¹(0.8), used if the normal quantile cannot be evaluated.
const FALLBACK_Z: f64 = 0.841_621_233_572_914_3;
/// Bound returned when nothing has been observed.
pub const NEUTRAL_BOUND: f64 = 0.5;

fn z_score() -> f64 {
    static Z: OnceLock<f64> = OnceLock::new();
    *Z.get_or_init(|| {
        Normal::new(0.0, 1.0)
            .map(|normal| normal.inverse_cdf(INTERVAL_QUANTILE))
            .ok()
            .filter(|z| z.is_finite())
            .unwrap_or(FALLBACK_Z)
    })
}

/// Lower end of the Wilson score interval for `successes` out of
/// `successes + failures` trials.
pub fn wilson_lower_bound(successes: u32, failures: u32) -> f64 {
    let n = f64::from(successes) + f64::from(failures);
    if n == 0.0 {
        return NEUTRAL_BOUND;
    }
    let n_s = f64::from(successes);
    let n_f = f64::from(failures);
    let z = z_score();
    let z2 = z * z;

    let center = (n_s + z2 / 2.0) / (n + z2);
    let half_width = (z / (n + z2)) * (n_s * n_f / n + z2 / 4.0).sqrt();
    (center - half_width).clamp(0.0, 1.0)
}

/// Whether `bid` asks for an implausibly high share of the unknown dice.
///
/// The dice the claim still needs beyond `hand` are treated as successes drawn
/// from the unknown pool. When even the pessimistic estimate of that rate sits at
/// or above the per-die match probability, the claim is not credible.
pub fn should_challenge_claim(bid: Bid, hand: &Hand, table: &DistributionTable) -> bool {
    let own = hand.matching(bid.face, table.wild());
    let Some(needed) = bid.quantity.checked_sub(own).filter(|n| *n > 0) else {
        return false;
    };
    let unknown = table.unknown_dice();
    if needed > unknown {
        return true;
    }
    let bound = wilson_lower_bound(u32::from(needed), u32::from(unknown - needed));
    bound >= table.match_probability(bid.face)
}
