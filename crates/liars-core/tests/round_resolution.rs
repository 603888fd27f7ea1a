use liars_core::belief::{DistributionTable, should_challenge_claim};
use liars_core::game::match_state::{MatchState, MatchStatus};
use liars_core::model::bid::{Action, Bid};
use liars_core::model::face::Face;
use liars_core::model::hand::Hand;
use liars_core::model::round::{RoundError, RoundState, TurnOutcome};
use liars_core::model::rules::RuleError;
use liars_core::model::seat::SeatId;

fn seat(i: usize) -> SeatId {
    SeatId::from_index(i).unwrap()
}

fn three_seat_round(wild: bool) -> RoundState {
    RoundState::from_hands(
        vec![
            (seat(0), Hand::with_faces(&[Face::Two, Face::Two, Face::One])),
            (seat(1), Hand::with_faces(&[Face::Two, Face::Five, Face::Six])),
            (seat(2), Hand::with_faces(&[Face::Three, Face::One, Face::Four])),
        ],
        seat(0),
        wild,
    )
    .unwrap()
}

#[test]
fn bidding_goes_around_the_table_until_a_challenge() {
    let mut round = three_seat_round(false);
    assert_eq!(
        round.apply(seat(0), Action::Bid(Bid::new(Face::Two, 2))).unwrap(),
        TurnOutcome::BidPlaced { next: seat(1) }
    );
    assert_eq!(
        round.apply(seat(1), Action::Bid(Bid::new(Face::Two, 3))).unwrap(),
        TurnOutcome::BidPlaced { next: seat(2) }
    );
    let TurnOutcome::Resolved(outcome) = round.apply(seat(2), Action::Challenge).unwrap() else {
        panic!("challenge should resolve the round");
    };
    assert_eq!(outcome.actual, 3);
    assert!(outcome.bid_held);
    assert_eq!(outcome.loser, seat(2));
    assert_eq!(round.history().len(), 2);
}

#[test]
fn wild_ones_decide_a_close_call() {
    let mut round = three_seat_round(true);
    round.place_bid(seat(0), Bid::new(Face::Two, 5)).unwrap();
    let outcome = round.challenge(seat(1)).unwrap();
    assert_eq!(outcome.actual, 5);
    assert_eq!(outcome.loser, seat(1));
}

#[test]
fn illegal_moves_leave_the_round_untouched() {
    let mut round = three_seat_round(false);
    assert_eq!(
        round.challenge(seat(0)).unwrap_err(),
        RoundError::NoStandingBid
    );
    round.place_bid(seat(0), Bid::new(Face::Four, 2)).unwrap();
    assert!(matches!(
        round.place_bid(seat(1), Bid::new(Face::Three, 2)).unwrap_err(),
        RoundError::Rule(RuleError::IllegalBid { .. })
    ));
    assert!(matches!(
        round.place_bid(seat(2), Bid::new(Face::Five, 2)).unwrap_err(),
        RoundError::OutOfTurn { .. }
    ));
    assert_eq!(round.standing_bid(), Some(Bid::new(Face::Four, 2)));
    assert_eq!(round.expected_seat(), seat(1));
}

#[test]
fn belief_agrees_with_a_certain_claim() {
    let hand = Hand::with_faces(&[Face::Five, Face::Five, Face::Five]);
    let table = DistributionTable::new(&hand, 9, false).unwrap();
    assert_eq!(table.probability(Bid::new(Face::Five, 3)), 1.0);
    assert!(!should_challenge_claim(Bid::new(Face::Five, 3), &hand, &table));
}

#[test]
fn a_seeded_game_always_reaches_an_end_state() {
    let names: Vec<String> = (0..4).map(|i| format!("p{i}")).collect();
    let mut game = MatchState::with_seed(&names, 3, true, 20261017).unwrap();
    let mut rounds = 0;
    while game.status() == MatchStatus::InProgress {
        let opener = game.start_round().unwrap().expected_seat();
        let round = game.round_mut().unwrap();
        round.place_bid(opener, Bid::new(Face::Three, 1)).unwrap();
        let next = round.expected_seat();
        round.challenge(next).unwrap();
        game.finish_round().unwrap();
        rounds += 1;
    }
    assert!(rounds <= 11);
    assert!(matches!(
        game.status(),
        MatchStatus::Winner(_) | MatchStatus::SuddenDeath { .. }
    ));
}
