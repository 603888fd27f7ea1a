use liars_bot::bot::Personality;
use liars_bot::policy::{Policy, PolicyContext, PolicyError, ProbabilisticPolicy};
use liars_bot::runner::{RunnerError, TableRunner};
use liars_core::game::match_state::{MatchState, MatchStatus};
use liars_core::game::table::TableSeat;
use liars_core::model::bid::{Action, Bid};
use liars_core::model::face::Face;
use liars_core::model::round::{RoundError, RoundOutcome};
use liars_core::model::seat::SeatId;
use std::error::Error;

fn seat(i: usize) -> SeatId {
    SeatId::from_index(i).unwrap()
}

fn names(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("bot{i}")).collect()
}

fn computer_table(count: usize, base_seed: u64) -> Vec<Box<dyn Policy>> {
    (0..count)
        .map(|i| Box::new(ProbabilisticPolicy::sampled(base_seed + i as u64)) as Box<dyn Policy>)
        .collect()
}

/// Interactive seat that fumbles its first move of each kind.
#[derive(Default)]
struct Fumbler {
    fumbled_action: bool,
    fumbled_guess: bool,
    rejections: Vec<String>,
    rounds_seen: usize,
}

impl Policy for Fumbler {
    fn choose_action(&mut self, ctx: &PolicyContext) -> Result<Action, PolicyError> {
        if ctx.round.standing_bid().is_some() {
            return Ok(Action::Challenge);
        }
        if !self.fumbled_action {
            self.fumbled_action = true;
            return Ok(Action::Challenge);
        }
        Ok(Action::Bid(Bid::new(Face::Six, ctx.total_dice())))
    }

    fn guess_sum(&mut self, _own: Face, previous: Option<u8>) -> u8 {
        if !self.fumbled_guess {
            self.fumbled_guess = true;
            return 1;
        }
        if previous == Some(7) { 8 } else { 7 }
    }

    fn is_interactive(&self) -> bool {
        true
    }

    fn reject(&mut self, error: &dyn Error) {
        self.rejections.push(error.to_string());
    }

    fn observe_round(&mut self, _outcome: &RoundOutcome) {
        self.rounds_seen += 1;
    }
}

/// Computer seat that only ever challenges.
struct Doubter;

impl Policy for Doubter {
    fn choose_action(&mut self, _ctx: &PolicyContext) -> Result<Action, PolicyError> {
        Ok(Action::Challenge)
    }

    fn guess_sum(&mut self, _own: Face, previous: Option<u8>) -> u8 {
        if previous == Some(7) { 6 } else { 7 }
    }
}

/// Computer seat that never got its belief built.
struct Unprepared;

impl Policy for Unprepared {
    fn choose_action(&mut self, ctx: &PolicyContext) -> Result<Action, PolicyError> {
        Err(PolicyError::RoundNotStarted(ctx.seat))
    }

    fn guess_sum(&mut self, _own: Face, _previous: Option<u8>) -> u8 {
        7
    }
}

#[test]
fn computer_game_runs_to_a_single_winner() {
    let game = MatchState::with_seed(&names(4), 5, false, 2026).unwrap();
    let mut runner = TableRunner::new(game, computer_table(4, 10)).unwrap();
    let report = runner.play().unwrap();

    assert_eq!(runner.game().status(), MatchStatus::Winner(report.winner));
    assert_eq!(report.eliminations.len(), 3);
    assert!(!report.eliminations.contains(&report.winner));
    assert_eq!(report.placement(report.winner), Some(1));
    assert_eq!(report.placement(report.eliminations[0]), Some(4));

    let lost: u32 = report.stats.iter().map(|(_, s)| s.dice_lost).sum();
    let left = runner.game().total_dice();
    assert_eq!(lost + u32::from(left), 20);
    assert!(report.rounds as usize <= 19);
}

#[test]
fn seeded_games_replay_identically() {
    let play = |seed: u64| {
        let game = MatchState::with_seed(&names(3), 4, true, seed).unwrap();
        let mut runner = TableRunner::new(game, computer_table(3, seed)).unwrap();
        let report = runner.play().unwrap();
        (report.winner, report.rounds, report.eliminations, report.duels)
    };
    assert_eq!(play(99), play(99));
}

#[test]
fn policy_count_must_match_the_table() {
    let game = MatchState::with_seed(&names(3), 5, false, 1).unwrap();
    let err = TableRunner::new(game, computer_table(2, 0)).err().unwrap();
    assert!(matches!(
        err,
        RunnerError::PolicyCount {
            seats: 3,
            policies: 2
        }
    ));
}

#[test]
fn interactive_seats_are_asked_again_after_a_rejected_move() {
    let game = MatchState::with_seed(&names(2), 3, false, 5).unwrap();
    let leader = game.leader();
    let policies: Vec<Box<dyn Policy>> = vec![
        Box::new(Fumbler::default()),
        Box::new(ProbabilisticPolicy::seeded(Personality::new(0.0, 0.0), 3)),
    ];
    let mut runner = TableRunner::new(game, policies).unwrap();
    let report = runner.play_round().unwrap();

    let rejected = runner.stats(seat(0)).unwrap().rejected;
    if leader == seat(0) {
        assert_eq!(rejected, 1);
        assert_eq!(report.settlement.outcome.bidder, seat(0));
    } else {
        assert_eq!(rejected, 0);
        assert_eq!(report.settlement.outcome.challenger, seat(0));
    }
    assert_eq!(runner.game().total_dice(), 5);
}

#[test]
fn illegal_computer_moves_abort_the_game() {
    let game = MatchState::with_seed(&names(2), 2, false, 8).unwrap();
    let leader = game.leader();
    let policies: Vec<Box<dyn Policy>> = vec![Box::new(Doubter), Box::new(Doubter)];
    let mut runner = TableRunner::new(game, policies).unwrap();
    match runner.play() {
        Err(RunnerError::IllegalAction { seat, source }) => {
            assert_eq!(seat, leader);
            assert_eq!(source, RoundError::NoStandingBid);
        }
        other => panic!("expected an illegal action, got {other:?}"),
    }
}

#[test]
fn sudden_death_rejects_bad_guesses_from_interactive_seats() {
    let seats = vec![
        TableSeat {
            seat: seat(0),
            name: "human".into(),
            dice: 1,
        },
        TableSeat {
            seat: seat(1),
            name: "bot".into(),
            dice: 1,
        },
    ];
    let game = MatchState::from_parts(seats, seat(0), false, 6, 42).unwrap();
    let policies: Vec<Box<dyn Policy>> = vec![Box::new(Fumbler::default()), Box::new(Doubter)];
    let mut runner = TableRunner::new(game, policies).unwrap();

    let duel = runner.play_sudden_death().unwrap();
    assert_eq!(duel.duel.first(), seat(0));
    assert_eq!(duel.first_guess, 7);
    assert_eq!(duel.second_guess, 6);
    assert_eq!(runner.stats(seat(0)).unwrap().rejected, 1);

    let report = runner.play().unwrap();
    assert_eq!(report.eliminations.len(), 1);
}

#[test]
fn policy_failures_stop_the_game() {
    let game = MatchState::with_seed(&names(2), 3, false, 4).unwrap();
    let leader = game.leader();
    let policies: Vec<Box<dyn Policy>> = vec![Box::new(Unprepared), Box::new(Unprepared)];
    let mut runner = TableRunner::new(game, policies).unwrap();
    match runner.play_round() {
        Err(RunnerError::Policy(PolicyError::RoundNotStarted(seat))) => assert_eq!(seat, leader),
        other => panic!("expected a policy error, got {other:?}"),
    }
    assert_eq!(runner.stats(leader).unwrap().bids, 0);
}
