use crate::model::bid::{Action, Bid};
use crate::model::hand::Hand;
use crate::model::rules::{BidRules, RuleError};
use crate::model::seat::SeatId;
use rand::Rng;
use std::vec::Vec;
use thiserror::Error;

/// One round of bidding, from the deal to the challenge that ends it.
#[derive(Debug, Clone)]
pub struct RoundState {
    seats: Vec<SeatHand>,
    rules: BidRules,
    leader: SeatId,
    turn: usize,
    phase: RoundPhase,
    history: Vec<BidRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SeatHand {
    seat: SeatId,
    hand: Hand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    AwaitingFirstBid,
    ActiveBidding {
        standing: Bid,
        bidder: SeatId,
    },
    Challenged {
        standing: Bid,
        bidder: SeatId,
        challenger: SeatId,
    },
    Resolved(RoundOutcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BidRecord {
    pub seat: SeatId,
    pub bid: Bid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundOutcome {
    pub bid: Bid,
    pub bidder: SeatId,
    pub challenger: SeatId,
    pub loser: SeatId,
    pub actual: u8,
    pub bid_held: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    BidPlaced { next: SeatId },
    Resolved(RoundOutcome),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoundError {
    #[error("a round needs at least two seats holding dice")]
    NotEnoughSeats,
    #[error("{0} is not seated in this round")]
    UnknownSeat(SeatId),
    #[error("expected {expected} to act but got {actual}")]
    OutOfTurn { expected: SeatId, actual: SeatId },
    #[error("there is no bid to challenge")]
    NoStandingBid,
    #[error("the round is already resolved")]
    AlreadyResolved,
    #[error(transparent)]
    Rule(#[from] RuleError),
}

impl RoundState {
    /// Deals fresh hands of the given sizes, in table order, with `leader` opening.
    pub fn deal<R: Rng + ?Sized>(
        sizes: &[(SeatId, u8)],
        leader: SeatId,
        wild: bool,
        rng: &mut R,
    ) -> Result<Self, RoundError> {
        let hands = sizes
            .iter()
            .map(|(seat, size)| (*seat, Hand::roll(*size, rng)))
            .collect();
        Self::from_hands(hands, leader, wild)
    }

    pub fn from_hands(
        hands: Vec<(SeatId, Hand)>,
        leader: SeatId,
        wild: bool,
    ) -> Result<Self, RoundError> {
        let seats: Vec<SeatHand> = hands
            .into_iter()
            .filter(|(_, hand)| !hand.is_empty())
            .map(|(seat, hand)| SeatHand { seat, hand })
            .collect();
        if seats.len() < 2 {
            return Err(RoundError::NotEnoughSeats);
        }
        let turn = seats
            .iter()
            .position(|s| s.seat == leader)
            .ok_or(RoundError::UnknownSeat(leader))?;
        let total: usize = seats.iter().map(|s| s.hand.len()).sum();
        let total = u8::try_from(total).unwrap_or(u8::MAX);

        Ok(Self {
            seats,
            rules: BidRules::new(total, wild),
            leader,
            turn,
            phase: RoundPhase::AwaitingFirstBid,
            history: Vec::new(),
        })
    }

    pub fn phase(&self) -> &RoundPhase {
        &self.phase
    }

    pub fn rules(&self) -> &BidRules {
        &self.rules
    }

    pub fn total_dice(&self) -> u8 {
        self.rules.total_dice()
    }

    pub fn wild(&self) -> bool {
        self.rules.wild()
    }

    pub fn leader(&self) -> SeatId {
        self.leader
    }

    pub fn expected_seat(&self) -> SeatId {
        self.seats[self.turn].seat
    }

    pub fn seats(&self) -> impl Iterator<Item = SeatId> + '_ {
        self.seats.iter().map(|s| s.seat)
    }

    pub fn hand(&self, seat: SeatId) -> Option<&Hand> {
        self.seats.iter().find(|s| s.seat == seat).map(|s| &s.hand)
    }

    pub fn hands(&self) -> impl Iterator<Item = &Hand> + '_ {
        self.seats.iter().map(|s| &s.hand)
    }

    /// Die counts of everyone else, starting with the seat after `seat`.
    pub fn opponent_sizes(&self, seat: SeatId) -> Vec<u8> {
        let Some(start) = self.seats.iter().position(|s| s.seat == seat) else {
            return Vec::new();
        };
        (1..self.seats.len())
            .map(|offset| {
                let hand = &self.seats[(start + offset) % self.seats.len()].hand;
                hand.len() as u8
            })
            .collect()
    }

    pub fn standing_bid(&self) -> Option<Bid> {
        match self.phase {
            RoundPhase::ActiveBidding { standing, .. } | RoundPhase::Challenged { standing, .. } => {
                Some(standing)
            }
            RoundPhase::Resolved(outcome) => Some(outcome.bid),
            RoundPhase::AwaitingFirstBid => None,
        }
    }

    pub fn history(&self) -> &[BidRecord] {
        &self.history
    }

    pub fn outcome(&self) -> Option<RoundOutcome> {
        match self.phase {
            RoundPhase::Resolved(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.phase, RoundPhase::Resolved(_))
    }

    pub fn apply(&mut self, seat: SeatId, action: Action) -> Result<TurnOutcome, RoundError> {
        match action {
            Action::Bid(bid) => self.place_bid(seat, bid),
            Action::Challenge => self.challenge(seat).map(TurnOutcome::Resolved),
        }
    }

    pub fn place_bid(&mut self, seat: SeatId, bid: Bid) -> Result<TurnOutcome, RoundError> {
        self.ensure_turn(seat)?;
        let standing = match self.phase {
            RoundPhase::AwaitingFirstBid => None,
            RoundPhase::ActiveBidding { standing, .. } => Some(standing),
            RoundPhase::Challenged { .. } | RoundPhase::Resolved(_) => {
                return Err(RoundError::AlreadyResolved);
            }
        };
        self.rules.check(standing, bid)?;

        self.history.push(BidRecord { seat, bid });
        self.phase = RoundPhase::ActiveBidding {
            standing: bid,
            bidder: seat,
        };
        self.turn = (self.turn + 1) % self.seats.len();
        Ok(TurnOutcome::BidPlaced {
            next: self.expected_seat(),
        })
    }

    pub fn challenge(&mut self, seat: SeatId) -> Result<RoundOutcome, RoundError> {
        self.ensure_turn(seat)?;
        let (standing, bidder) = match self.phase {
            RoundPhase::ActiveBidding { standing, bidder } => (standing, bidder),
            RoundPhase::AwaitingFirstBid => return Err(RoundError::NoStandingBid),
            RoundPhase::Challenged { .. } | RoundPhase::Resolved(_) => {
                return Err(RoundError::AlreadyResolved);
            }
        };
        self.phase = RoundPhase::Challenged {
            standing,
            bidder,
            challenger: seat,
        };
        Ok(self.resolve(standing, bidder, seat))
    }

    fn resolve(&mut self, standing: Bid, bidder: SeatId, challenger: SeatId) -> RoundOutcome {
        let resolution = self.rules.resolve(self.hands(), standing, bidder, challenger);
        let outcome = RoundOutcome {
            bid: standing,
            bidder,
            challenger,
            loser: resolution.loser,
            actual: resolution.actual,
            bid_held: resolution.bid_held,
        };
        self.phase = RoundPhase::Resolved(outcome);
        outcome
    }

    fn ensure_turn(&self, seat: SeatId) -> Result<(), RoundError> {
        if self.is_resolved() {
            return Err(RoundError::AlreadyResolved);
        }
        if self.hand(seat).is_none() {
            return Err(RoundError::UnknownSeat(seat));
        }
        let expected = self.expected_seat();
        if expected != seat {
            return Err(RoundError::OutOfTurn {
                expected,
                actual: seat,
            });
        }
        Ok(())
    }
}
