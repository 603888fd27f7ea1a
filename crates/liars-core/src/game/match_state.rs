use crate::game::sudden_death::{SuddenDeath, SuddenDeathOutcome};
use crate::game::table::{DieLoss, Table, TableSeat};
use crate::model::round::{RoundError, RoundOutcome, RoundState};
use crate::model::seat::{MAX_SEATS, SeatId};
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use thiserror::Error;

pub const DEFAULT_DICE_PER_SEAT: u8 = 5;
pub const MAX_DICE_PER_SEAT: u8 = 5;

/// A whole game: rounds repeat until one seat keeps dice or a sudden death is due.
#[derive(Debug, Clone)]
pub struct MatchState {
    table: Table,
    wild: bool,
    leader: SeatId,
    round_number: u32,
    current_round: Option<RoundState>,
    rng: StdRng,
    seed: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStatus {
    InProgress,
    /// Exactly two seats remain, one die each. `first` guesses first.
    SuddenDeath { first: SeatId, second: SeatId },
    Winner(SeatId),
}

/// What changed when a round was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundSettlement {
    pub round_number: u32,
    pub outcome: RoundOutcome,
    pub loss: DieLoss,
    pub next_leader: SeatId,
    pub total_dice: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("a game needs between 2 and {MAX_SEATS} seats, got {found}")]
    SeatCount { found: usize },
    #[error("each seat starts with 1..={MAX_DICE_PER_SEAT} dice, got {found}")]
    DiceCount { found: u8 },
    #[error("{0} has no dice left to lose")]
    EliminationInconsistency(SeatId),
    #[error("no round is in progress")]
    NoRound,
    #[error("the current round has not been resolved")]
    RoundUnresolved,
    #[error("a round is already in progress")]
    RoundInProgress,
    #[error("the game is not in the {expected} phase")]
    WrongPhase { expected: &'static str },
    #[error(transparent)]
    Round(#[from] RoundError),
}

impl MatchState {
    pub fn new(names: &[String], dice_per_seat: u8, wild: bool) -> Result<Self, MatchError> {
        let seed: u64 = rand::random();
        Self::with_seed(names, dice_per_seat, wild, seed)
    }

    pub fn with_seed(
        names: &[String],
        dice_per_seat: u8,
        wild: bool,
        seed: u64,
    ) -> Result<Self, MatchError> {
        if !(2..=MAX_SEATS).contains(&names.len()) {
            return Err(MatchError::SeatCount { found: names.len() });
        }
        if !(1..=MAX_DICE_PER_SEAT).contains(&dice_per_seat) {
            return Err(MatchError::DiceCount {
                found: dice_per_seat,
            });
        }
        let table = Table::seat_all(names, dice_per_seat);
        let mut rng = StdRng::seed_from_u64(seed);
        let leader = SeatId::from_index(rng.gen_range(0..table.len()))
            .ok_or(MatchError::SeatCount { found: names.len() })?;
        Ok(Self {
            table,
            wild,
            leader,
            round_number: 0,
            current_round: None,
            rng,
            seed,
        })
    }

    /// Rebuilds a game at a known table position. The dealer stream restarts from `seed`.
    pub fn from_parts(
        seats: Vec<TableSeat>,
        leader: SeatId,
        wild: bool,
        round_number: u32,
        seed: u64,
    ) -> Result<Self, MatchError> {
        let table = Table::from_seats(seats);
        if !(2..=MAX_SEATS).contains(&table.len()) {
            return Err(MatchError::SeatCount { found: table.len() });
        }
        let leader = if table.is_active(leader) {
            leader
        } else {
            table
                .next_active(leader)
                .ok_or(MatchError::EliminationInconsistency(leader))?
        };
        let stream = seed ^ u64::from(round_number).rotate_left(32);
        Ok(Self {
            table,
            wild,
            leader,
            round_number,
            current_round: None,
            rng: StdRng::seed_from_u64(stream),
            seed,
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn wild(&self) -> bool {
        self.wild
    }

    pub fn leader(&self) -> SeatId {
        self.leader
    }

    pub fn round_number(&self) -> u32 {
        self.round_number
    }

    pub fn total_dice(&self) -> u8 {
        self.table.total_dice()
    }

    pub fn round(&self) -> Option<&RoundState> {
        self.current_round.as_ref()
    }

    pub fn round_mut(&mut self) -> Option<&mut RoundState> {
        self.current_round.as_mut()
    }

    pub fn status(&self) -> MatchStatus {
        let active: Vec<&TableSeat> = self.table.active().collect();
        match active.as_slice() {
            [only] => MatchStatus::Winner(only.seat),
            [a, b] if a.dice == 1 && b.dice == 1 => {
                let (first, second) = if b.seat == self.leader {
                    (b.seat, a.seat)
                } else {
                    (a.seat, b.seat)
                };
                MatchStatus::SuddenDeath { first, second }
            }
            _ => MatchStatus::InProgress,
        }
    }

    /// Deals a new round to every seat still holding dice, led by the current leader.
    pub fn start_round(&mut self) -> Result<&RoundState, MatchError> {
        if !matches!(self.status(), MatchStatus::InProgress) {
            return Err(MatchError::WrongPhase {
                expected: "bidding",
            });
        }
        if self.current_round.as_ref().is_some_and(|r| !r.is_resolved()) {
            return Err(MatchError::RoundInProgress);
        }
        let sizes = self.table.sizes();
        let round = RoundState::deal(&sizes, self.leader, self.wild, &mut self.rng)?;
        self.round_number += 1;
        let round = self.current_round.insert(round);
        Ok(&*round)
    }

    /// Applies the resolved round: the loser gives up one die and leads next.
    pub fn finish_round(&mut self) -> Result<RoundSettlement, MatchError> {
        let round = self.current_round.as_ref().ok_or(MatchError::NoRound)?;
        let outcome = round.outcome().ok_or(MatchError::RoundUnresolved)?;
        let before = self.table.total_dice();

        let loss = self.lose_die(outcome.loser)?;
        debug_assert_eq!(self.table.total_dice() + 1, before);
        self.current_round = None;

        Ok(RoundSettlement {
            round_number: self.round_number,
            outcome,
            loss,
            next_leader: self.leader,
            total_dice: self.table.total_dice(),
        })
    }

    /// Rolls the single dice for a due sudden death.
    pub fn begin_sudden_death(&mut self) -> Result<SuddenDeath, MatchError> {
        match self.status() {
            MatchStatus::SuddenDeath { first, second } => {
                Ok(SuddenDeath::roll(first, second, &mut self.rng))
            }
            _ => Err(MatchError::WrongPhase {
                expected: "sudden death",
            }),
        }
    }

    /// Takes the last die from the sudden-death loser. Ties leave the table untouched.
    pub fn finish_sudden_death(
        &mut self,
        outcome: SuddenDeathOutcome,
    ) -> Result<Option<DieLoss>, MatchError> {
        if !matches!(self.status(), MatchStatus::SuddenDeath { .. }) {
            return Err(MatchError::WrongPhase {
                expected: "sudden death",
            });
        }
        match outcome {
            SuddenDeathOutcome::Decided { loser, .. } => self.lose_die(loser).map(Some),
            SuddenDeathOutcome::Tied { .. } => Ok(None),
        }
    }

    fn lose_die(&mut self, seat: SeatId) -> Result<DieLoss, MatchError> {
        let loss = self
            .table
            .remove_die(seat)
            .ok_or(MatchError::EliminationInconsistency(seat))?;
        self.leader = if loss.eliminated {
            self.table
                .next_active(seat)
                .ok_or(MatchError::EliminationInconsistency(seat))?
        } else {
            seat
        };
        Ok(loss)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::bid::Bid;
    use crate::model::face::Face;
    use crate::model::hand::Hand;

    fn names(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("p{i}")).collect()
    }

    fn seat(i: usize) -> SeatId {
        SeatId::from_index(i).unwrap()
    }

    fn seats(sizes: &[u8]) -> Vec<TableSeat> {
        sizes
            .iter()
            .enumerate()
            .map(|(i, dice)| TableSeat {
                seat: seat(i),
                name: format!("p{i}"),
                dice: *dice,
            })
            .collect()
    }

    fn resolve_current(game: &mut MatchState) -> RoundOutcome {
        let round = game.round_mut().unwrap();
        let opener = round.expected_seat();
        round.place_bid(opener, Bid::new(Face::Six, round.total_dice())).unwrap();
        let challenger = round.expected_seat();
        round.challenge(challenger).unwrap()
    }

    #[test]
    fn rejects_bad_table_shapes() {
        assert_eq!(
            MatchState::with_seed(&names(1), 5, false, 0).unwrap_err(),
            MatchError::SeatCount { found: 1 }
        );
        assert_eq!(
            MatchState::with_seed(&names(13), 5, false, 0).unwrap_err(),
            MatchError::SeatCount { found: 13 }
        );
        assert_eq!(
            MatchState::with_seed(&names(3), 6, false, 0).unwrap_err(),
            MatchError::DiceCount { found: 6 }
        );
    }

    #[test]
    fn seeded_games_deal_identically() {
        let mut a = MatchState::with_seed(&names(4), 5, false, 77).unwrap();
        let mut b = MatchState::with_seed(&names(4), 5, false, 77).unwrap();
        let hands_a: Vec<Hand> = a.start_round().unwrap().hands().copied().collect();
        let hands_b: Vec<Hand> = b.start_round().unwrap().hands().copied().collect();
        assert_eq!(hands_a, hands_b);
        assert_eq!(a.leader(), b.leader());
    }

    #[test]
    fn each_round_removes_exactly_one_die() {
        let mut game = MatchState::with_seed(&names(3), 5, false, 9).unwrap();
        let mut total = game.total_dice();
        assert_eq!(total, 15);
        while matches!(game.status(), MatchStatus::InProgress) {
            game.start_round().unwrap();
            let outcome = resolve_current(&mut game);
            let settlement = game.finish_round().unwrap();
            assert_eq!(settlement.outcome, outcome);
            assert_eq!(settlement.total_dice + 1, total);
            total = settlement.total_dice;
        }
        assert!(game.total_dice() >= 1);
    }

    #[test]
    fn loser_leads_next_round() {
        let mut game = MatchState::with_seed(&names(3), 5, false, 3).unwrap();
        game.start_round().unwrap();
        let outcome = resolve_current(&mut game);
        let settlement = game.finish_round().unwrap();
        assert_eq!(settlement.next_leader, outcome.loser);
        assert_eq!(game.start_round().unwrap().expected_seat(), outcome.loser);
    }

    #[test]
    fn eliminated_loser_passes_lead_to_next_active_seat() {
        let mut game =
            MatchState::from_parts(seats(&[1, 0, 3, 2]), seat(0), false, 4, 11).unwrap();
        let hands = vec![
            (seat(0), Hand::with_faces(&[Face::Two])),
            (seat(2), Hand::with_faces(&[Face::Three, Face::Three, Face::Four])),
            (seat(3), Hand::with_faces(&[Face::Five, Face::Six])),
        ];
        game.current_round = Some(RoundState::from_hands(hands, seat(0), false).unwrap());
        let round = game.round_mut().unwrap();
        round.place_bid(seat(0), Bid::new(Face::Two, 4)).unwrap();
        round.challenge(seat(2)).unwrap();

        let settlement = game.finish_round().unwrap();
        assert_eq!(settlement.loss.seat, seat(0));
        assert!(settlement.loss.eliminated);
        assert_eq!(settlement.next_leader, seat(2));
        assert!(!game.table().is_active(seat(0)));
    }

    #[test]
    fn finishing_requires_a_resolved_round() {
        let mut game = MatchState::with_seed(&names(2), 2, false, 1).unwrap();
        assert_eq!(game.finish_round().unwrap_err(), MatchError::NoRound);
        game.start_round().unwrap();
        assert_eq!(game.finish_round().unwrap_err(), MatchError::RoundUnresolved);
        assert_eq!(game.start_round().unwrap_err(), MatchError::RoundInProgress);
    }

    #[test]
    fn losing_a_die_twice_from_an_empty_seat_is_inconsistent() {
        let mut game =
            MatchState::from_parts(seats(&[0, 2, 2]), seat(1), false, 1, 5).unwrap();
        assert_eq!(
            game.lose_die(seat(0)).unwrap_err(),
            MatchError::EliminationInconsistency(seat(0))
        );
    }

    #[test]
    fn status_reports_winner_and_sudden_death() {
        let game = MatchState::from_parts(seats(&[0, 3, 0]), seat(1), false, 9, 1).unwrap();
        assert_eq!(game.status(), MatchStatus::Winner(seat(1)));

        let game = MatchState::from_parts(seats(&[1, 0, 1]), seat(2), false, 9, 1).unwrap();
        assert_eq!(
            game.status(),
            MatchStatus::SuddenDeath {
                first: seat(2),
                second: seat(0)
            }
        );

        let game = MatchState::from_parts(seats(&[2, 0, 1]), seat(2), false, 9, 1).unwrap();
        assert_eq!(game.status(), MatchStatus::InProgress);
    }

    #[test]
    fn sudden_death_ends_the_game() {
        let mut game = MatchState::from_parts(seats(&[1, 1]), seat(1), false, 8, 2).unwrap();
        assert_eq!(
            game.start_round().unwrap_err(),
            MatchError::WrongPhase {
                expected: "bidding"
            }
        );
        let duel = game.begin_sudden_death().unwrap();
        assert_eq!(duel.first(), seat(1));
        let tie = game
            .finish_sudden_death(SuddenDeathOutcome::Tied { sum: 7 })
            .unwrap();
        assert!(tie.is_none());
        let loss = game
            .finish_sudden_death(SuddenDeathOutcome::Decided {
                winner: seat(1),
                loser: seat(0),
                sum: 7,
            })
            .unwrap()
            .unwrap();
        assert!(loss.eliminated);
        assert_eq!(game.status(), MatchStatus::Winner(seat(1)));
    }
}
