use crate::policy::{Policy, PolicyContext, PolicyError};
use liars_core::belief::DistributionError;
use liars_core::game::match_state::{MatchError, MatchState, MatchStatus, RoundSettlement};
use liars_core::game::sudden_death::{SuddenDeath, SuddenDeathError, SuddenDeathOutcome};
use liars_core::model::bid::Action;
use liars_core::model::round::{RoundError, TurnOutcome};
use liars_core::model::seat::SeatId;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{Level, event};

/// Drives a whole game, asking one policy per seat for every move.
pub struct TableRunner {
    game: MatchState,
    seats: Vec<SeatRecord>,
    eliminations: Vec<SeatId>,
    rounds_played: u32,
    duels: Vec<DuelReport>,
}

struct SeatRecord {
    seat: SeatId,
    policy: Box<dyn Policy>,
    stats: SeatStats,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeatStats {
    pub bids: u32,
    pub challenges: u32,
    /// Challenges this seat made that caught a bluff.
    pub challenges_won: u32,
    /// Bids of this seat that were challenged and fell short.
    pub bluffs_caught: u32,
    pub dice_lost: u32,
    pub rejected: u32,
    pub decision_time: Duration,
    pub decisions: u32,
}

impl SeatStats {
    pub fn avg_ms_per_decision(&self) -> f64 {
        if self.decisions == 0 {
            0.0
        } else {
            self.decision_time.as_secs_f64() * 1000.0 / f64::from(self.decisions)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundReport {
    pub settlement: RoundSettlement,
    pub bids: usize,
    pub wild: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuelReport {
    pub duel: SuddenDeath,
    pub first_guess: u8,
    pub second_guess: u8,
    pub outcome: SuddenDeathOutcome,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameReport {
    pub winner: SeatId,
    pub rounds: u32,
    /// Seats in the order they lost their last die.
    pub eliminations: Vec<SeatId>,
    pub duels: Vec<DuelReport>,
    pub stats: Vec<(SeatId, SeatStats)>,
}

impl GameReport {
    /// 1 for the winner, counting up to the first seat knocked out.
    pub fn placement(&self, seat: SeatId) -> Option<usize> {
        if seat == self.winner {
            return Some(1);
        }
        let seats = self.stats.len();
        self.eliminations
            .iter()
            .position(|s| *s == seat)
            .map(|index| seats - index)
    }
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("table has {seats} seats but {policies} policies were supplied")]
    PolicyCount { seats: usize, policies: usize },
    #[error("{0} has no policy")]
    MissingPolicy(SeatId),
    #[error("{seat} made an illegal move: {source}")]
    IllegalAction {
        seat: SeatId,
        #[source]
        source: RoundError,
    },
    #[error("{seat} made an invalid guess: {source}")]
    InvalidGuess {
        seat: SeatId,
        #[source]
        source: SuddenDeathError,
    },
    #[error("{seat} could not build its belief: {source}")]
    Belief {
        seat: SeatId,
        #[source]
        source: DistributionError,
    },
    #[error(transparent)]
    Policy(#[from] PolicyError),
    #[error(transparent)]
    Match(#[from] MatchError),
    #[error(transparent)]
    Round(#[from] RoundError),
    #[error(transparent)]
    SuddenDeath(#[from] SuddenDeathError),
}

impl TableRunner {
    /// `policies` follow the table's seat order.
    pub fn new(game: MatchState, policies: Vec<Box<dyn Policy>>) -> Result<Self, RunnerError> {
        let table_seats = game.table().seats();
        if table_seats.len() != policies.len() {
            return Err(RunnerError::PolicyCount {
                seats: table_seats.len(),
                policies: policies.len(),
            });
        }
        let seats = table_seats
            .iter()
            .zip(policies)
            .map(|(entry, policy)| SeatRecord {
                seat: entry.seat,
                policy,
                stats: SeatStats::default(),
            })
            .collect();
        Ok(Self {
            game,
            seats,
            eliminations: Vec::new(),
            rounds_played: 0,
            duels: Vec::new(),
        })
    }

    pub fn game(&self) -> &MatchState {
        &self.game
    }

    pub fn stats(&self, seat: SeatId) -> Option<&SeatStats> {
        self.seats.iter().find(|r| r.seat == seat).map(|r| &r.stats)
    }

    /// Plays rounds and sudden deaths until one seat is left.
    pub fn play(&mut self) -> Result<GameReport, RunnerError> {
        loop {
            match self.game.status() {
                MatchStatus::InProgress => {
                    self.play_round()?;
                }
                MatchStatus::SuddenDeath { .. } => {
                    self.play_sudden_death()?;
                }
                MatchStatus::Winner(winner) => {
                    log_game_over(&self.game, winner, self.rounds_played);
                    return Ok(self.build_report(winner));
                }
            }
        }
    }

    pub fn play_round(&mut self) -> Result<RoundReport, RunnerError> {
        self.game.start_round()?;
        self.begin_round()?;

        loop {
            let (seat, action) = self.request_action()?;
            let round = self.game.round_mut().ok_or(MatchError::NoRound)?;
            let result = round.apply(seat, action);
            let record = record_mut(&mut self.seats, seat)?;
            match result {
                Ok(TurnOutcome::BidPlaced { .. }) => record.stats.bids += 1,
                Ok(TurnOutcome::Resolved(_)) => {
                    record.stats.challenges += 1;
                    break;
                }
                Err(err) if record.policy.is_interactive() => {
                    record.stats.rejected += 1;
                    record.policy.reject(&err);
                }
                Err(source) => return Err(RunnerError::IllegalAction { seat, source }),
            }
        }

        let round = self.game.round().ok_or(MatchError::NoRound)?;
        let bids = round.history().len();
        let wild = round.wild();
        let settlement = self.game.finish_round()?;
        self.rounds_played += 1;
        self.record_settlement(&settlement)?;

        let report = RoundReport {
            settlement,
            bids,
            wild,
        };
        log_round(&report);
        Ok(report)
    }

    /// One sudden-death duel. A tie leaves the table unchanged for a replay.
    pub fn play_sudden_death(&mut self) -> Result<DuelReport, RunnerError> {
        let duel = self.game.begin_sudden_death()?;
        let first_guess = self.request_guess(&duel, duel.first(), None)?;
        let second_guess = self.request_guess(&duel, duel.second(), Some(first_guess))?;
        let outcome = duel.resolve(first_guess, second_guess)?;
        if let Some(loss) = self.game.finish_sudden_death(outcome)? {
            record_mut(&mut self.seats, loss.seat)?.stats.dice_lost += 1;
            if loss.eliminated {
                self.eliminations.push(loss.seat);
            }
        }

        let report = DuelReport {
            duel,
            first_guess,
            second_guess,
            outcome,
        };
        log_duel(&report);
        self.duels.push(report);
        Ok(report)
    }

    fn begin_round(&mut self) -> Result<(), RunnerError> {
        let round = self.game.round().ok_or(MatchError::NoRound)?;
        let table = self.game.table();
        for record in &mut self.seats {
            let Some(hand) = round.hand(record.seat) else {
                continue;
            };
            let ctx = PolicyContext {
                seat: record.seat,
                hand,
                round,
                table,
            };
            record
                .policy
                .begin_round(&ctx)
                .map_err(|source| RunnerError::Belief {
                    seat: record.seat,
                    source,
                })?;
        }
        Ok(())
    }

    fn request_action(&mut self) -> Result<(SeatId, Action), RunnerError> {
        let round = self.game.round().ok_or(MatchError::NoRound)?;
        let seat = round.expected_seat();
        let hand = round.hand(seat).ok_or(RoundError::UnknownSeat(seat))?;
        let ctx = PolicyContext {
            seat,
            hand,
            round,
            table: self.game.table(),
        };
        let record = record_mut(&mut self.seats, seat)?;
        let start = Instant::now();
        let action = record.policy.choose_action(&ctx)?;
        record.stats.decision_time += start.elapsed();
        record.stats.decisions += 1;
        Ok((seat, action))
    }

    fn request_guess(
        &mut self,
        duel: &SuddenDeath,
        seat: SeatId,
        previous: Option<u8>,
    ) -> Result<u8, RunnerError> {
        let own = duel.die(seat).ok_or(RoundError::UnknownSeat(seat))?;
        let record = record_mut(&mut self.seats, seat)?;
        loop {
            let guess = record.policy.guess_sum(own, previous);
            match SuddenDeath::check_guess(guess, previous) {
                Ok(()) => return Ok(guess),
                Err(err) if record.policy.is_interactive() => {
                    record.stats.rejected += 1;
                    record.policy.reject(&err);
                }
                Err(source) => return Err(RunnerError::InvalidGuess { seat, source }),
            }
        }
    }

    fn record_settlement(&mut self, settlement: &RoundSettlement) -> Result<(), RunnerError> {
        let outcome = settlement.outcome;
        if !outcome.bid_held {
            record_mut(&mut self.seats, outcome.challenger)?.stats.challenges_won += 1;
            record_mut(&mut self.seats, outcome.bidder)?.stats.bluffs_caught += 1;
        }
        record_mut(&mut self.seats, settlement.loss.seat)?.stats.dice_lost += 1;
        if settlement.loss.eliminated {
            self.eliminations.push(settlement.loss.seat);
        }
        for record in &mut self.seats {
            record.policy.observe_round(&outcome);
        }
        Ok(())
    }

    /// Final report once a single seat is left.
    pub fn report(&self) -> Option<GameReport> {
        match self.game.status() {
            MatchStatus::Winner(winner) => Some(self.build_report(winner)),
            _ => None,
        }
    }

    fn build_report(&self, winner: SeatId) -> GameReport {
        GameReport {
            winner,
            rounds: self.rounds_played,
            eliminations: self.eliminations.clone(),
            duels: self.duels.clone(),
            stats: self
                .seats
                .iter()
                .map(|r| (r.seat, r.stats.clone()))
                .collect(),
        }
    }
}

fn record_mut(seats: &mut [SeatRecord], seat: SeatId) -> Result<&mut SeatRecord, RunnerError> {
    seats
        .iter_mut()
        .find(|r| r.seat == seat)
        .ok_or(RunnerError::MissingPolicy(seat))
}

fn log_round(report: &RoundReport) {
    if !tracing::enabled!(Level::INFO) {
        return;
    }

    let outcome = report.settlement.outcome;
    event!(
        target: "liars_bot::table",
        Level::INFO,
        round = report.settlement.round_number,
        bids = report.bids,
        wild = report.wild,
        bid = %outcome.bid,
        bidder = %outcome.bidder,
        challenger = %outcome.challenger,
        actual = outcome.actual,
        bid_held = outcome.bid_held,
        loser = %outcome.loser,
        eliminated = report.settlement.loss.eliminated,
        next_leader = %report.settlement.next_leader,
        total_dice = report.settlement.total_dice,
    );
}

fn log_duel(report: &DuelReport) {
    if !tracing::enabled!(Level::INFO) {
        return;
    }

    let (winner, tied) = match report.outcome {
        SuddenDeathOutcome::Decided { winner, .. } => (winner.to_string(), false),
        SuddenDeathOutcome::Tied { .. } => ("-".to_string(), true),
    };
    event!(
        target: "liars_bot::table",
        Level::INFO,
        first = %report.duel.first(),
        second = %report.duel.second(),
        first_guess = report.first_guess,
        second_guess = report.second_guess,
        sum = report.duel.sum(),
        winner = %winner,
        tied,
        reason = "sudden_death",
    );
}

fn log_game_over(game: &MatchState, winner: SeatId, rounds: u32) {
    if !tracing::enabled!(Level::INFO) {
        return;
    }

    event!(
        target: "liars_bot::table",
        Level::INFO,
        winner = %winner,
        name = game.table().name(winner).unwrap_or("?"),
        rounds,
        dice_left = game.total_dice(),
        reason = "game_over",
    );
}
