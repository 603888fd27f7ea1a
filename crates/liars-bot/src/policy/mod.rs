mod probabilistic;

pub use probabilistic::ProbabilisticPolicy;

use liars_core::belief::DistributionError;
use liars_core::game::table::Table;
use liars_core::model::bid::Action;
use liars_core::model::face::Face;
use liars_core::model::hand::Hand;
use liars_core::model::round::{RoundOutcome, RoundState};
use liars_core::model::seat::SeatId;
use std::error::Error as StdError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("{0} was asked to act before its round began")]
    RoundNotStarted(SeatId),
}

/// Context provided to policies for decision-making
pub struct PolicyContext<'a> {
    pub seat: SeatId,
    pub hand: &'a Hand,
    pub round: &'a RoundState,
    pub table: &'a Table,
}

impl PolicyContext<'_> {
    pub fn total_dice(&self) -> u8 {
        self.round.total_dice()
    }

    pub fn wild(&self) -> bool {
        self.round.wild()
    }

    pub fn opponent_sizes(&self) -> Vec<u8> {
        self.round.opponent_sizes(self.seat)
    }
}

/// One participant at the table, computer or human.
pub trait Policy: Send {
    /// Called once per seat after the deal, before any action is requested.
    fn begin_round(&mut self, _ctx: &PolicyContext) -> Result<(), DistributionError> {
        Ok(())
    }

    /// Bid or challenge for the seat expected to act.
    fn choose_action(&mut self, ctx: &PolicyContext) -> Result<Action, PolicyError>;

    /// Sudden-death guess of both dice summed. `previous` is the opponent's guess, if made.
    fn guess_sum(&mut self, own: Face, previous: Option<u8>) -> u8;

    /// Interactive policies get rejected moves reported back and are asked again.
    fn is_interactive(&self) -> bool {
        false
    }

    fn reject(&mut self, _error: &dyn StdError) {}

    fn observe_round(&mut self, _outcome: &RoundOutcome) {}
}
