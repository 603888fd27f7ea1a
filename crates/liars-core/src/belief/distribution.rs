use crate::model::bid::Bid;
use crate::model::face::Face;
use crate::model::hand::Hand;
use statrs::StatsError;
use statrs::distribution::{Binomial, DiscreteCDF};
use thiserror::Error;

/// Per-die chance of matching a natural face.
pub const NATURAL_MATCH: f64 = 1.0 / 6.0;
/// Per-die chance of matching a natural face when ones are wild.
pub const WILD_MATCH: f64 = 1.0 / 3.0;

#[derive(Debug, Error)]
pub enum DistributionError {
    #[error("hand holds {hand_size} dice but only {total_dice} are in play")]
    InvalidHandSize { hand_size: usize, total_dice: u8 },
    #[error("binomial model rejected its parameters: {0}")]
    Model(#[from] StatsError),
}

/// Belief snapshot for one seat and one round.
///
/// `at_least(face, j)` is the probability that at least `j` dice across the whole
/// table match `face`, given the seat's own hand. Dice already held are certain;
/// the rest come from a binomial over the unknown pool. Rows are never mutated
/// after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionTable {
    rows: [Vec<f64>; 6],
    known: [u8; 6],
    total_dice: u8,
    unknown: u8,
    wild: bool,
}

impl DistributionTable {
    pub fn new(hand: &Hand, total_dice: u8, wild: bool) -> Result<Self, DistributionError> {
        let hand_size = hand.len();
        if hand_size > total_dice as usize {
            return Err(DistributionError::InvalidHandSize {
                hand_size,
                total_dice,
            });
        }
        let unknown = total_dice - hand_size as u8;

        let natural = survival(unknown, NATURAL_MATCH)?;
        let boosted = if wild {
            Some(survival(unknown, WILD_MATCH)?)
        } else {
            None
        };

        let mut known = [0u8; 6];
        let rows = std::array::from_fn(|index| {
            let face = Face::ALL[index];
            known[index] = hand.matching(face, wild);
            let tail = match (&boosted, face.is_wild()) {
                (Some(boosted), false) => boosted,
                _ => &natural,
            };
            shifted_row(known[index], tail, total_dice)
        });

        Ok(Self {
            rows,
            known,
            total_dice,
            unknown,
            wild,
        })
    }

    pub fn total_dice(&self) -> u8 {
        self.total_dice
    }

    /// Dice outside the owner's hand.
    pub fn unknown_dice(&self) -> u8 {
        self.unknown
    }

    pub fn wild(&self) -> bool {
        self.wild
    }

    /// Dice in the owner's hand that count toward `face`.
    pub fn known(&self, face: Face) -> u8 {
        self.known[face.index()]
    }

    pub fn match_probability(&self, face: Face) -> f64 {
        if self.wild && !face.is_wild() {
            WILD_MATCH
        } else {
            NATURAL_MATCH
        }
    }

    pub fn row(&self, face: Face) -> &[f64] {
        &self.rows[face.index()]
    }

    pub fn at_least(&self, face: Face, count: u8) -> f64 {
        self.rows[face.index()]
            .get(count as usize)
            .copied()
            .unwrap_or(0.0)
    }

    pub fn probability(&self, bid: Bid) -> f64 {
        self.at_least(bid.face, bid.quantity)
    }

    pub fn expected_count(&self, face: Face) -> f64 {
        f64::from(self.known(face)) + f64::from(self.unknown) * self.match_probability(face)
    }
}

/// `S(j) = 1 - CDF(j - 1; n, p)` for `j` in `0..=n`.
fn survival(n: u8, p: f64) -> Result<Vec<f64>, StatsError> {
    let binomial = Binomial::new(p, u64::from(n))?;
    let mut values = Vec::with_capacity(n as usize + 1);
    let mut floor = 1.0f64;
    values.push(1.0);
    for j in 1..=u64::from(n) {
        let s = (1.0 - binomial.cdf(j - 1)).clamp(0.0, 1.0);
        floor = floor.min(s);
        values.push(floor);
    }
    Ok(values)
}

fn shifted_row(known: u8, tail: &[f64], total_dice: u8) -> Vec<f64> {
    let len = total_dice as usize + 1;
    let known = known as usize;
    (0..len)
        .map(|j| {
            if j <= known {
                1.0
            } else {
                tail.get(j - known).copied().unwrap_or(0.0)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand::rngs::StdRng;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-7,
            "expected {expected}, got {actual}"
        );
    }

    fn scenario_hand() -> Hand {
        Hand::with_faces(&[Face::One, Face::Two, Face::Three, Face::Four, Face::Five])
    }

    #[test]
    fn known_dice_are_certain_and_tail_is_binomial() {
        let table = DistributionTable::new(&scenario_hand(), 15, false).unwrap();
        assert_eq!(table.unknown_dice(), 10);
        assert_close(table.at_least(Face::Two, 1), 1.0);
        let expected = 1.0 - (5.0f64 / 6.0).powi(10);
        assert_close(table.at_least(Face::Two, 2), expected);
        assert!((table.at_least(Face::Two, 2) - 0.838).abs() < 1e-3);
        assert_close(table.at_least(Face::Six, 1), expected);
    }

    #[test]
    fn entries_past_the_pool_are_zero() {
        let table = DistributionTable::new(&scenario_hand(), 15, false).unwrap();
        assert_close(table.at_least(Face::Two, 11), (1.0f64 / 6.0).powi(10));
        assert_close(table.at_least(Face::Two, 12), 0.0);
        assert_close(table.at_least(Face::Six, 11), 0.0);
        assert_close(table.at_least(Face::Two, 15), 0.0);
        assert_close(table.at_least(Face::Two, 40), 0.0);
        assert_eq!(table.row(Face::Three).len(), 16);
    }

    #[test]
    fn rows_start_at_one_and_never_increase() {
        let mut rng = StdRng::seed_from_u64(2024);
        for total in [2u8, 5, 9, 15, 30, 60] {
            for wild in [false, true] {
                for _ in 0..10 {
                    let size = rng.gen_range(1..=total.min(5));
                    let hand = Hand::roll(size, &mut rng);
                    let table = DistributionTable::new(&hand, total, wild).unwrap();
                    for face in Face::ALL {
                        let row = table.row(face);
                        assert_eq!(row[0], 1.0);
                        assert!(row.iter().all(|p| (0.0..=1.0).contains(p)));
                        assert!(row.windows(2).all(|w| w[1] <= w[0]), "{face} {row:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn wild_rounds_boost_natural_faces_only() {
        let hand = Hand::with_faces(&[Face::One, Face::Four]);
        let table = DistributionTable::new(&hand, 8, true).unwrap();
        assert_eq!(table.known(Face::Four), 2);
        assert_eq!(table.known(Face::One), 1);
        assert_close(table.at_least(Face::Four, 2), 1.0);
        assert_close(table.at_least(Face::Four, 3), 1.0 - (2.0f64 / 3.0).powi(6));
        assert_close(table.at_least(Face::One, 2), 1.0 - (5.0f64 / 6.0).powi(6));
        assert_close(table.match_probability(Face::Four), WILD_MATCH);
        assert_close(table.match_probability(Face::One), NATURAL_MATCH);
    }

    #[test]
    fn oversized_hand_is_rejected() {
        let hand = Hand::with_faces(&[Face::Two, Face::Two, Face::Two]);
        let err = DistributionTable::new(&hand, 2, false).unwrap_err();
        assert!(matches!(
            err,
            DistributionError::InvalidHandSize {
                hand_size: 3,
                total_dice: 2
            }
        ));
    }

    #[test]
    fn whole_table_in_hand_leaves_no_unknowns() {
        let hand = Hand::with_faces(&[Face::Three, Face::Three]);
        let table = DistributionTable::new(&hand, 2, false).unwrap();
        assert_eq!(table.unknown_dice(), 0);
        assert_close(table.at_least(Face::Three, 2), 1.0);
        assert_close(table.at_least(Face::Five, 1), 0.0);
        assert_close(table.expected_count(Face::Three), 2.0);
    }

    #[test]
    fn probability_reads_bid_cell() {
        let table = DistributionTable::new(&scenario_hand(), 15, false).unwrap();
        assert_close(
            table.probability(Bid::new(Face::Two, 2)),
            table.at_least(Face::Two, 2),
        );
    }
}
