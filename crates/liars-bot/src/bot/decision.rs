use super::params::Personality;
use liars_core::belief::{DistributionTable, should_challenge_claim};
use liars_core::game::sudden_death::{MAX_SUM, MIN_SUM};
use liars_core::model::bid::{Action, Bid};
use liars_core::model::face::Face;
use liars_core::model::hand::Hand;
use liars_core::model::rules::BidRules;
use rand::Rng;
use rand::seq::SliceRandom;

/// Largest drop in truth probability a raise may carry before the seat challenges instead.
pub const MAX_PROBABILITY_DROP: f64 = 0.15;

/// Everything the bidding policy looks at for one turn.
#[derive(Debug, Clone, Copy)]
pub struct DecisionInput<'a> {
    pub hand: &'a Hand,
    pub personality: Personality,
    pub standing: Option<Bid>,
    pub table: &'a DistributionTable,
    /// Die counts of the other seats, starting with the next one to act.
    pub opponent_sizes: &'a [u8],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecisionReason {
    HeadsUpOpening,
    RandomOpening,
    StrongestFace,
    WildOpening,
    DistrustedBid,
    ContrarianChallenge,
    ContrarianRaise,
    NoRaise,
    ProbabilityDrop,
    ImplausibleRaise,
    BestRaise,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub action: Action,
    pub reason: DecisionReason,
    /// Model probability of the standing bid, when there is one.
    pub truth: Option<f64>,
    /// Model probability of the best raise considered.
    pub best: Option<f64>,
}

impl DecisionReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            DecisionReason::HeadsUpOpening => "heads_up_opening",
            DecisionReason::RandomOpening => "random_opening",
            DecisionReason::StrongestFace => "strongest_face",
            DecisionReason::WildOpening => "wild_opening",
            DecisionReason::DistrustedBid => "distrusted_bid",
            DecisionReason::ContrarianChallenge => "contrarian_challenge",
            DecisionReason::ContrarianRaise => "contrarian_raise",
            DecisionReason::NoRaise => "no_raise",
            DecisionReason::ProbabilityDrop => "probability_drop",
            DecisionReason::ImplausibleRaise => "implausible_raise",
            DecisionReason::BestRaise => "best_raise",
        }
    }

    pub const fn is_challenge(self) -> bool {
        matches!(
            self,
            DecisionReason::DistrustedBid
                | DecisionReason::ContrarianChallenge
                | DecisionReason::NoRaise
                | DecisionReason::ProbabilityDrop
                | DecisionReason::ImplausibleRaise
        )
    }
}

impl Decision {
    fn opening(bid: Bid, reason: DecisionReason) -> Self {
        Self {
            action: Action::Bid(bid),
            reason,
            truth: None,
            best: None,
        }
    }

    fn challenge(reason: DecisionReason, truth: f64, best: Option<f64>) -> Self {
        Self {
            action: Action::Challenge,
            reason,
            truth: Some(truth),
            best,
        }
    }
}

/// A standing bid is distrusted when its truth probability sits strictly below
/// the seat's aggressiveness. An aggressiveness of zero never distrusts.
pub fn leans_to_challenge(truth: f64, aggressiveness: f64) -> bool {
    truth < aggressiveness
}

pub fn rolls_crazy<R: Rng + ?Sized>(craziness: f64, rng: &mut R) -> bool {
    let roll: f64 = rng.gen_range(0.0..1.0);
    roll < craziness
}

/// Picks the next action for one seat. All randomness comes from `rng`.
pub fn decide<R: Rng + ?Sized>(input: &DecisionInput<'_>, rng: &mut R) -> Decision {
    let crazy = rolls_crazy(input.personality.craziness(), rng);
    match input.standing {
        None => open(input, crazy, rng),
        Some(standing) => respond(input, standing, crazy),
    }
}

fn rules_for(table: &DistributionTable) -> BidRules {
    BidRules::new(table.total_dice(), table.wild())
}

fn open<R: Rng + ?Sized>(input: &DecisionInput<'_>, crazy: bool, rng: &mut R) -> Decision {
    if let Some(bid) = heads_up_opening(input.hand, input.opponent_sizes) {
        return Decision::opening(bid, DecisionReason::HeadsUpOpening);
    }
    if crazy {
        let openings: Vec<Bid> = rules_for(input.table).legal_bids(None).collect();
        if let Some(bid) = openings.choose(rng) {
            return Decision::opening(*bid, DecisionReason::RandomOpening);
        }
    }
    let bid = model_opening(input.hand);
    let reason = if bid.face.is_wild() {
        DecisionReason::WildOpening
    } else {
        DecisionReason::StrongestFace
    };
    Decision::opening(bid, reason)
}

/// Down to a single die against one opponent, the seat claims exactly the die it holds.
pub fn heads_up_opening(hand: &Hand, opponent_sizes: &[u8]) -> Option<Bid> {
    if opponent_sizes.len() != 1 || hand.len() != 1 {
        return None;
    }
    hand.faces().next().map(|face| Bid::new(face, 1))
}

/// Opening bid straight from the hand: the ones when they are at least as numerous
/// as the strongest natural face, otherwise that face counted together with the ones.
pub fn model_opening(hand: &Hand) -> Bid {
    let ones = hand.count(Face::WILD);
    let (best, count) = hand.best_natural();
    if ones >= count {
        Bid::new(Face::WILD, ones.max(1))
    } else {
        Bid::new(best, count + ones)
    }
}

fn respond(input: &DecisionInput<'_>, standing: Bid, crazy: bool) -> Decision {
    let truth = input.table.probability(standing);
    let lean = leans_to_challenge(truth, input.personality.aggressiveness());
    if lean != crazy {
        let reason = if lean {
            DecisionReason::DistrustedBid
        } else {
            DecisionReason::ContrarianChallenge
        };
        return Decision::challenge(reason, truth, None);
    }

    let Some((raise, best)) = best_raise(input.table, standing) else {
        return Decision::challenge(DecisionReason::NoRaise, truth, None);
    };
    if truth - best > MAX_PROBABILITY_DROP {
        return Decision::challenge(DecisionReason::ProbabilityDrop, truth, Some(best));
    }
    if should_challenge_claim(raise, input.hand, input.table) {
        return Decision::challenge(DecisionReason::ImplausibleRaise, truth, Some(best));
    }
    Decision {
        action: Action::Bid(raise),
        reason: if lean {
            DecisionReason::ContrarianRaise
        } else {
            DecisionReason::BestRaise
        },
        truth: Some(truth),
        best: Some(best),
    }
}

/// Most probable legal raise over `standing`. Ties keep the lowest quantity, then the lowest face.
pub fn best_raise(table: &DistributionTable, standing: Bid) -> Option<(Bid, f64)> {
    let mut best: Option<(Bid, f64)> = None;
    for bid in rules_for(table).legal_bids(Some(standing)) {
        let probability = table.probability(bid);
        if best.is_none_or(|(_, p)| probability > p) {
            best = Some((bid, probability));
        }
    }
    best
}

/// Sudden-death guess of the two-dice sum: the own face plus a random die, kept
/// clear of the opponent's guess.
pub fn guess_sum<R: Rng + ?Sized>(own: Face, previous: Option<u8>, rng: &mut R) -> u8 {
    let mine = own.value();
    let guess = match previous {
        None => mine + rng.gen_range(1..=6),
        Some(last) if last <= mine => mine + 1,
        Some(last) if last <= mine + 2 => last + 1,
        Some(last) if last > mine + 6 => mine + rng.gen_range(1..=6),
        Some(last) => {
            let guess = mine + rng.gen_range(1..=5);
            if guess >= last { guess + 1 } else { guess }
        }
    };
    guess.clamp(MIN_SUM, MAX_SUM)
}
