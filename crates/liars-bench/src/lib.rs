//! Seeded Liar's Dice tournaments between computer personalities.

pub mod analytics;
pub mod config;
pub mod logging;
pub mod telemetry;
pub mod tournament;
