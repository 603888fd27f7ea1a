use crate::model::bid::Bid;
use crate::model::face::Face;
use crate::model::hand::Hand;
use crate::model::seat::SeatId;
use thiserror::Error;

/// Bid legality and challenge resolution for one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BidRules {
    total_dice: u8,
    wild: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("face {value} is outside 1..=6")]
    InvalidFace { value: u8 },
    #[error("bid {bid} is illegal: {reason}")]
    IllegalBid { bid: Bid, reason: IllegalBidReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IllegalBidReason {
    #[error("quantity must be at least 1")]
    ZeroQuantity,
    #[error("only {total} dice are in play")]
    ExceedsDiceInPlay { total: u8 },
    #[error("does not raise the standing bid {standing}")]
    NotARaise { standing: Bid },
}

/// Result of a challenge once every hand is revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub actual: u8,
    pub loser: SeatId,
    pub bid_held: bool,
}

impl BidRules {
    pub const fn new(total_dice: u8, wild: bool) -> Self {
        Self { total_dice, wild }
    }

    pub const fn total_dice(&self) -> u8 {
        self.total_dice
    }

    pub const fn wild(&self) -> bool {
        self.wild
    }

    /// Parses raw user-supplied values into a bid on this table.
    pub fn parse(&self, face: u8, quantity: u8) -> Result<Bid, RuleError> {
        let face = Face::from_value(face).ok_or(RuleError::InvalidFace { value: face })?;
        let bid = Bid::new(face, quantity);
        self.check_bounds(bid)?;
        Ok(bid)
    }

    pub fn check(&self, standing: Option<Bid>, candidate: Bid) -> Result<(), RuleError> {
        self.check_bounds(candidate)?;
        if let Some(standing) = standing
            && !candidate.outranks(standing)
        {
            return Err(RuleError::IllegalBid {
                bid: candidate,
                reason: IllegalBidReason::NotARaise { standing },
            });
        }
        Ok(())
    }

    pub fn is_legal(&self, standing: Option<Bid>, candidate: Bid) -> bool {
        self.check(standing, candidate).is_ok()
    }

    /// Every legal bid after `standing`, ascending by quantity then face.
    pub fn legal_bids(&self, standing: Option<Bid>) -> impl Iterator<Item = Bid> + '_ {
        (1..=self.total_dice)
            .flat_map(|quantity| Face::ALL.iter().map(move |face| Bid::new(*face, quantity)))
            .filter(move |bid| standing.is_none_or(|s| bid.outranks(s)))
    }

    /// Dice across `hands` that satisfy a claim on `face`.
    pub fn count_matching<'a>(&self, hands: impl IntoIterator<Item = &'a Hand>, face: Face) -> u8 {
        hands
            .into_iter()
            .map(|hand| hand.matching(face, self.wild))
            .sum()
    }

    /// The bidder loses when fewer dice than claimed exist; otherwise the challenger does.
    pub fn resolve<'a>(
        &self,
        hands: impl IntoIterator<Item = &'a Hand>,
        bid: Bid,
        bidder: SeatId,
        challenger: SeatId,
    ) -> Resolution {
        let actual = self.count_matching(hands, bid.face);
        let bid_held = actual >= bid.quantity;
        Resolution {
            actual,
            loser: if bid_held { challenger } else { bidder },
            bid_held,
        }
    }

    fn check_bounds(&self, bid: Bid) -> Result<(), RuleError> {
        if bid.quantity == 0 {
            return Err(RuleError::IllegalBid {
                bid,
                reason: IllegalBidReason::ZeroQuantity,
            });
        }
        if bid.quantity > self.total_dice {
            return Err(RuleError::IllegalBid {
                bid,
                reason: IllegalBidReason::ExceedsDiceInPlay {
                    total: self.total_dice,
                },
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seat(i: usize) -> SeatId {
        SeatId::from_index(i).unwrap()
    }

    #[test]
    fn raise_must_strictly_increase() {
        let rules = BidRules::new(15, false);
        let standing = Some(Bid::new(Face::Three, 4));
        assert!(!rules.is_legal(standing, Bid::new(Face::Three, 4)));
        assert!(rules.is_legal(standing, Bid::new(Face::Two, 5)));
        assert!(!rules.is_legal(standing, Bid::new(Face::Two, 4)));
        assert!(rules.is_legal(standing, Bid::new(Face::Four, 4)));
    }

    #[test]
    fn opening_bids_bounded_by_dice_in_play() {
        let rules = BidRules::new(6, false);
        assert!(rules.is_legal(None, Bid::new(Face::One, 1)));
        assert!(rules.is_legal(None, Bid::new(Face::Six, 6)));
        assert!(matches!(
            rules.check(None, Bid::new(Face::Six, 7)),
            Err(RuleError::IllegalBid {
                reason: IllegalBidReason::ExceedsDiceInPlay { total: 6 },
                ..
            })
        ));
        assert!(matches!(
            rules.check(None, Bid::new(Face::Six, 0)),
            Err(RuleError::IllegalBid {
                reason: IllegalBidReason::ZeroQuantity,
                ..
            })
        ));
    }

    #[test]
    fn parse_rejects_out_of_range_face() {
        let rules = BidRules::new(10, false);
        assert_eq!(rules.parse(7, 2), Err(RuleError::InvalidFace { value: 7 }));
        assert_eq!(rules.parse(0, 2), Err(RuleError::InvalidFace { value: 0 }));
        assert_eq!(rules.parse(4, 2), Ok(Bid::new(Face::Four, 2)));
    }

    #[test]
    fn legal_bids_are_ascending_and_above_standing() {
        let rules = BidRules::new(3, false);
        let standing = Bid::new(Face::Five, 2);
        let bids: Vec<Bid> = rules.legal_bids(Some(standing)).collect();
        assert_eq!(bids.first(), Some(&Bid::new(Face::Six, 2)));
        assert_eq!(bids.last(), Some(&Bid::new(Face::Six, 3)));
        assert_eq!(bids.len(), 7);
        assert!(bids.windows(2).all(|w| w[1].outranks(w[0])));
        assert_eq!(rules.legal_bids(None).count(), 18);
        assert_eq!(rules.legal_bids(Some(Bid::new(Face::Six, 3))).count(), 0);
    }

    #[test]
    fn caught_bluff_costs_the_bidder() {
        let rules = BidRules::new(15, false);
        let hands = [
            Hand::with_faces(&[Face::Five, Face::Two, Face::Three, Face::Four, Face::Six]),
            Hand::with_faces(&[Face::Five, Face::Five, Face::Two, Face::Three, Face::Four]),
            Hand::with_faces(&[Face::Five, Face::Five, Face::One, Face::Two, Face::Six]),
        ];
        let bid = Bid::new(Face::Five, 6);
        let resolution = rules.resolve(hands.iter(), bid, seat(0), seat(1));
        assert_eq!(resolution.actual, 5);
        assert!(!resolution.bid_held);
        assert_eq!(resolution.loser, seat(0));

        for _ in 0..5 {
            assert_eq!(rules.resolve(hands.iter(), bid, seat(0), seat(1)), resolution);
        }
    }

    #[test]
    fn exact_count_costs_the_challenger() {
        let rules = BidRules::new(4, false);
        let hands = [
            Hand::with_faces(&[Face::Two, Face::Two]),
            Hand::with_faces(&[Face::Three, Face::Two]),
        ];
        let resolution = rules.resolve(hands.iter(), Bid::new(Face::Two, 3), seat(1), seat(0));
        assert!(resolution.bid_held);
        assert_eq!(resolution.loser, seat(0));
    }

    #[test]
    fn wild_ones_count_toward_other_faces_only() {
        let wild = BidRules::new(6, true);
        let plain = BidRules::new(6, false);
        let hands = [
            Hand::with_faces(&[Face::One, Face::Four, Face::Six]),
            Hand::with_faces(&[Face::One, Face::Four, Face::Two]),
        ];
        assert_eq!(wild.count_matching(hands.iter(), Face::Four), 4);
        assert_eq!(plain.count_matching(hands.iter(), Face::Four), 2);
        assert_eq!(wild.count_matching(hands.iter(), Face::One), 2);
    }
}
