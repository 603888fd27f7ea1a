use super::{Policy, PolicyContext, PolicyError};
use crate::bot::{Decision, DecisionInput, Personality, decide, guess_sum};
use liars_core::belief::{DistributionError, DistributionTable};
use liars_core::model::bid::Action;
use liars_core::model::face::Face;
use liars_core::model::round::RoundOutcome;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{Level, event};

/// Computer seat driven by the dice distribution model and a fixed personality.
pub struct ProbabilisticPolicy {
    personality: Personality,
    rng: StdRng,
    belief: Option<DistributionTable>,
    last_decision: Option<Decision>,
}

impl ProbabilisticPolicy {
    pub fn new(personality: Personality, rng: StdRng) -> Self {
        Self {
            personality,
            rng,
            belief: None,
            last_decision: None,
        }
    }

    pub fn seeded(personality: Personality, seed: u64) -> Self {
        Self::new(personality, StdRng::seed_from_u64(seed))
    }

    /// Personality drawn from the policy's own stream.
    pub fn sampled(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let personality = Personality::sample(&mut rng);
        Self::new(personality, rng)
    }

    pub fn personality(&self) -> Personality {
        self.personality
    }

    /// Belief built at the start of the current round.
    pub fn belief(&self) -> Option<&DistributionTable> {
        self.belief.as_ref()
    }

    pub fn last_decision(&self) -> Option<Decision> {
        self.last_decision
    }
}

impl Policy for ProbabilisticPolicy {
    fn begin_round(&mut self, ctx: &PolicyContext) -> Result<(), DistributionError> {
        self.belief = Some(DistributionTable::new(ctx.hand, ctx.total_dice(), ctx.wild())?);
        self.last_decision = None;
        Ok(())
    }

    fn choose_action(&mut self, ctx: &PolicyContext) -> Result<Action, PolicyError> {
        let table = self
            .belief
            .as_ref()
            .ok_or(PolicyError::RoundNotStarted(ctx.seat))?;

        let opponents = ctx.opponent_sizes();
        let input = DecisionInput {
            hand: ctx.hand,
            personality: self.personality,
            standing: ctx.round.standing_bid(),
            table,
            opponent_sizes: &opponents,
        };
        let decision = decide(&input, &mut self.rng);
        log_decision(ctx, self.personality, &decision, opponents.len());
        self.last_decision = Some(decision);
        Ok(decision.action)
    }

    fn guess_sum(&mut self, own: Face, previous: Option<u8>) -> u8 {
        let guess = guess_sum(own, previous, &mut self.rng);
        if tracing::enabled!(Level::DEBUG) {
            event!(
                target: "liars_bot::decision",
                Level::DEBUG,
                own = own.value(),
                previous = ?previous,
                guess,
                reason = "sudden_death_guess",
            );
        }
        guess
    }

    fn observe_round(&mut self, _outcome: &RoundOutcome) {
        self.belief = None;
    }
}

fn log_decision(ctx: &PolicyContext, personality: Personality, decision: &Decision, opponents: usize) {
    if !tracing::enabled!(Level::INFO) {
        return;
    }

    let standing = ctx
        .round
        .standing_bid()
        .map(|bid| bid.to_string())
        .unwrap_or_else(|| "-".to_string());

    event!(
        target: "liars_bot::decision",
        Level::INFO,
        seat = %ctx.seat,
        style = personality.style().as_str(),
        craziness = personality.craziness(),
        aggressiveness = personality.aggressiveness(),
        hand_size = ctx.hand.len(),
        total_dice = ctx.total_dice(),
        opponents,
        standing = %standing,
        truth = decision.truth,
        best = decision.best,
        chosen = %decision.action,
        reason = decision.reason.as_str(),
    );
}
