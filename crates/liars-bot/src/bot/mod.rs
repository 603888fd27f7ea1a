mod decision;
mod params;

pub use decision::{
    Decision, DecisionInput, DecisionReason, MAX_PROBABILITY_DROP, best_raise, decide, guess_sum,
    heads_up_opening, leans_to_challenge, model_opening, rolls_crazy,
};
pub use params::{MAX_AGGRESSIVENESS, MAX_CRAZINESS, Personality, PersonalityStyle};
