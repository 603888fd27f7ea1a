pub mod bot;
pub mod policy;
pub mod runner;

pub use bot::{Decision, DecisionInput, DecisionReason, Personality, PersonalityStyle};
pub use policy::{Policy, PolicyContext, PolicyError, ProbabilisticPolicy};
pub use runner::{GameReport, RoundReport, RunnerError, SeatStats, TableRunner};
