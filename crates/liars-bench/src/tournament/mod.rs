mod rotations;

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::analytics::{AnalyticsCollector, AnalyticsError};
use liars_bot::bot::{MAX_AGGRESSIVENESS, MAX_CRAZINESS, Personality};
use liars_bot::policy::{Policy, ProbabilisticPolicy};
use liars_bot::runner::{DuelReport, RoundReport, RunnerError as TableError, SeatStats, TableRunner};
use liars_core::game::match_state::{MatchError, MatchState, MatchStatus};
use liars_core::game::serialization::MatchSnapshot;
use liars_core::game::sudden_death::SuddenDeathOutcome;
use liars_core::model::seat::SeatId;
use rand::{RngCore, SeedableRng, rngs::StdRng};
use serde::Serialize;
use thiserror::Error;
use tracing::{Level, event};

use crate::config::{AgentConfig, AgentKind, BenchmarkConfig, ResolvedOutputs};
use crate::telemetry::{
    TelemetryError, TelemetryOutputs, append_highlights_to_markdown, write_summary_outputs,
};

use rotations::SeatRotations;

const POLICY_SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// Single-line JSON of the finished table for the game event.
fn final_snapshot(game: &MatchState) -> Result<String, RunnerError> {
    Ok(serde_json::to_string(&MatchSnapshot::capture(game))?)
}

/// Primary entry point for orchestrating tournaments.
pub struct TournamentRunner {
    config: BenchmarkConfig,
    outputs: ResolvedOutputs,
    agents: Vec<AgentBlueprint>,
    seat_rotations: SeatRotations,
    logging_enabled: bool,
}

/// Summary details returned after a run.
pub struct RunSummary {
    pub games_played: usize,
    pub rotations: usize,
    pub rows_written: usize,
    pub jsonl_path: PathBuf,
    pub summary_path: PathBuf,
    pub plot_path: Option<PathBuf>,
    pub telemetry_path: Option<PathBuf>,
    pub telemetry_outputs: Option<TelemetryOutputs>,
}

impl TournamentRunner {
    /// Build a runner from a validated configuration.
    pub fn new(config: BenchmarkConfig, outputs: ResolvedOutputs) -> Result<Self, RunnerError> {
        let agents = AgentBlueprint::from_configs(&config.agents)?;

        if agents.len() < 2 || agents.len() > liars_core::model::seat::MAX_SEATS {
            return Err(RunnerError::SeatCount {
                found: agents.len(),
            });
        }

        if config.games.rotations > agents.len() {
            return Err(RunnerError::RotationLimit {
                requested: config.games.rotations,
                max: agents.len(),
            });
        }

        let seat_rotations = SeatRotations::new(agents.len(), config.games.rotations);

        Ok(Self {
            logging_enabled: config.logging.enable_structured,
            config,
            outputs,
            agents,
            seat_rotations,
        })
    }

    /// Execute the tournament, streaming JSONL rows to disk.
    pub fn run(&self) -> Result<RunSummary, RunnerError> {
        ensure_parent(self.outputs.jsonl.parent())?;
        ensure_parent(self.outputs.summary_md.parent())?;
        if !self.outputs.plots_dir.as_os_str().is_empty() {
            fs::create_dir_all(&self.outputs.plots_dir)?;
        }

        let mut writer = BufWriter::new(File::create(&self.outputs.jsonl)?);
        let rotations = self.seat_rotations.as_slice();
        let mut rng = StdRng::seed_from_u64(self.config.games.seed.unwrap_or(0));
        let mut rows_written = 0usize;
        let mut analytics = AnalyticsCollector::new(&self.config)?;

        for game_index in 0..self.config.games.count {
            let game_seed = rng.next_u64();

            for (rotation_index, rotation) in rotations.iter().enumerate() {
                let outcome = self.play_game(game_index, rotation_index, game_seed, rotation)?;
                analytics.record_game(game_index, rotation_index, &outcome)?;
                rows_written += write_game_rows(
                    &mut writer,
                    &self.config,
                    game_index,
                    rotation_index,
                    game_seed,
                    &outcome,
                )?;
            }
        }

        writer.flush()?;

        let summary = analytics.finalize()?;
        summary.write_markdown(&self.outputs.summary_md)?;
        let plot_path = match summary.render_plot(&self.outputs.plots_dir) {
            Ok(path) => Some(path),
            Err(err) => {
                eprintln!("WARN: {}", err);
                None
            }
        };

        let telemetry_dir = self
            .outputs
            .summary_md
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let telemetry_path = if self.logging_enabled {
            Some(telemetry_dir.join("telemetry.jsonl"))
        } else {
            None
        };

        let telemetry_outputs = if let Some(path) = telemetry_path.as_ref() {
            write_summary_outputs(path, &telemetry_dir)?
        } else {
            None
        };

        if let Some(outputs) = telemetry_outputs.as_ref() {
            append_highlights_to_markdown(&self.outputs.summary_md, outputs)?;
        }

        Ok(RunSummary {
            games_played: self.config.games.count,
            rotations: rotations.len(),
            rows_written,
            jsonl_path: self.outputs.jsonl.clone(),
            summary_path: self.outputs.summary_md.clone(),
            plot_path,
            telemetry_path,
            telemetry_outputs,
        })
    }

    fn play_game(
        &self,
        game_index: usize,
        rotation_index: usize,
        game_seed: u64,
        rotation: &[usize],
    ) -> Result<GameOutcome, RunnerError> {
        let mut names = Vec::with_capacity(rotation.len());
        let mut policies: Vec<Box<dyn Policy>> = Vec::with_capacity(rotation.len());
        for (seat_index, agent_index) in rotation.iter().enumerate() {
            let agent = self
                .agents
                .get(*agent_index)
                .ok_or(RunnerError::InvalidRotation {
                    index: seat_index,
                    agent_index: *agent_index,
                })?;
            names.push(agent.name.clone());
            policies.push(agent.spawn_policy(policy_seed(game_seed, *agent_index)));
        }

        let game = MatchState::with_seed(
            &names,
            self.config.games.dice_per_seat,
            self.config.games.wild,
            game_seed,
        )?;
        let mut table = TableRunner::new(game, policies)?;

        loop {
            match table.game().status() {
                MatchStatus::InProgress => {
                    let report = table.play_round()?;
                    if self.logging_enabled {
                        self.log_round(game_index, rotation_index, &names, &report);
                    }
                }
                MatchStatus::SuddenDeath { .. } => {
                    let duel = table.play_sudden_death()?;
                    if self.logging_enabled {
                        self.log_duel(game_index, rotation_index, &names, &duel);
                    }
                }
                MatchStatus::Winner(_) => break,
            }
        }

        let report = table.report().ok_or(RunnerError::Unfinished { game_index })?;

        let seating = names
            .iter()
            .enumerate()
            .filter_map(|(index, name)| {
                SeatId::from_index(index).map(|seat| SeatSnapshot {
                    seat: seat.to_string(),
                    bot: name.clone(),
                })
            })
            .collect();

        let mut seat_results = Vec::with_capacity(report.stats.len());
        for (seat, stats) in &report.stats {
            let placement = report
                .placement(*seat)
                .ok_or(RunnerError::Unfinished { game_index })?;
            seat_results.push(SeatResult {
                agent_name: names[seat.index()].clone(),
                seat: *seat,
                placement,
                stats: stats.clone(),
            });
        }

        let outcome = GameOutcome {
            seating,
            seat_results,
            winner: report.winner,
            rounds: report.rounds,
            duels: report.duels.len(),
        };

        if self.logging_enabled && tracing::enabled!(Level::INFO) {
            let snapshot = final_snapshot(table.game())?;
            event!(
                target: "liars_bench::game",
                Level::INFO,
                run_id = %self.config.run_id,
                game_index = game_index as u32,
                rotation_index = rotation_index as u32,
                game_seed,
                winner = %outcome.winner,
                bot = names[outcome.winner.index()].as_str(),
                rounds = outcome.rounds,
                duels = outcome.duels as u32,
                snapshot = %snapshot,
            );
        }

        Ok(outcome)
    }

    fn log_round(
        &self,
        game_index: usize,
        rotation_index: usize,
        names: &[String],
        report: &RoundReport,
    ) {
        if !tracing::enabled!(Level::INFO) {
            return;
        }

        let outcome = report.settlement.outcome;
        event!(
            target: "liars_bench::round",
            Level::INFO,
            run_id = %self.config.run_id,
            game_index = game_index as u32,
            rotation_index = rotation_index as u32,
            round = report.settlement.round_number,
            bids = report.bids as u32,
            bid = %outcome.bid,
            actual = outcome.actual,
            bid_held = outcome.bid_held,
            loser = names[outcome.loser.index()].as_str(),
            eliminated = report.settlement.loss.eliminated,
            total_dice = report.settlement.total_dice,
        );
    }

    fn log_duel(&self, game_index: usize, rotation_index: usize, names: &[String], duel: &DuelReport) {
        if !tracing::enabled!(Level::INFO) {
            return;
        }

        let loser = match duel.outcome {
            SuddenDeathOutcome::Decided { loser, .. } => names[loser.index()].as_str(),
            SuddenDeathOutcome::Tied { .. } => "-",
        };
        event!(
            target: "liars_bench::round",
            Level::INFO,
            run_id = %self.config.run_id,
            game_index = game_index as u32,
            rotation_index = rotation_index as u32,
            sum = duel.duel.sum(),
            first_guess = duel.first_guess,
            second_guess = duel.second_guess,
            loser,
            reason = "sudden_death",
        );
    }
}

/// Per-agent stream, stable across rotations of the same game.
fn policy_seed(game_seed: u64, agent_index: usize) -> u64 {
    game_seed ^ (agent_index as u64 + 1).wrapping_mul(POLICY_SEED_STRIDE)
}

fn ensure_parent(path: Option<&Path>) -> Result<(), RunnerError> {
    if let Some(dir) = path.filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn write_game_rows(
    writer: &mut BufWriter<File>,
    config: &BenchmarkConfig,
    game_index: usize,
    rotation_index: usize,
    game_seed: u64,
    outcome: &GameOutcome,
) -> Result<usize, RunnerError> {
    let game_id = format!("G{game_index:05}_R{rotation_index:02}");

    let mut rows_written = 0usize;
    for seat_result in &outcome.seat_results {
        let stats = &seat_result.stats;
        let row = GameLogRow {
            run_id: config.run_id.clone(),
            game_id: game_id.clone(),
            game_index,
            rotation_index,
            game_seed,
            seat: seat_result.seat.to_string(),
            bot: seat_result.agent_name.clone(),
            seating: outcome.seating.clone(),
            placement: seat_result.placement,
            won: seat_result.seat == outcome.winner,
            rounds: outcome.rounds,
            dice_lost: stats.dice_lost,
            bids: stats.bids,
            challenges: stats.challenges,
            challenges_won: stats.challenges_won,
            bluffs_caught: stats.bluffs_caught,
            speed_ms_turn: stats.avg_ms_per_decision(),
            decisions: stats.decisions,
        };

        serde_json::to_writer(&mut *writer, &row)?;
        writer.write_all(b"\n")?;
        rows_written += 1;
    }

    Ok(rows_written)
}

pub struct GameOutcome {
    pub seating: Vec<SeatSnapshot>,
    pub seat_results: Vec<SeatResult>,
    pub winner: SeatId,
    pub rounds: u32,
    pub duels: usize,
}

#[derive(Clone, Serialize)]
pub struct SeatSnapshot {
    pub seat: String,
    pub bot: String,
}

pub struct SeatResult {
    pub agent_name: String,
    pub seat: SeatId,
    /// 1 for the winner.
    pub placement: usize,
    pub stats: SeatStats,
}

#[derive(Serialize)]
struct GameLogRow {
    run_id: String,
    game_id: String,
    game_index: usize,
    rotation_index: usize,
    game_seed: u64,
    seat: String,
    bot: String,
    seating: Vec<SeatSnapshot>,
    placement: usize,
    won: bool,
    rounds: u32,
    dice_lost: u32,
    bids: u32,
    challenges: u32,
    challenges_won: u32,
    bluffs_caught: u32,
    speed_ms_turn: f64,
    decisions: u32,
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("{0}")]
    Agent(#[from] AgentError),
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to serialize log row: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
    #[error("game setup failed: {0}")]
    Match(#[from] MatchError),
    #[error("game execution failed: {0}")]
    Table(#[from] TableError),
    #[error("game {game_index} stopped before a single seat was left")]
    Unfinished { game_index: usize },
    #[error("configuration requires 2 to 12 agents but found {found}")]
    SeatCount { found: usize },
    #[error("requested {requested} seat rotations exceeds maximum of {max}")]
    RotationLimit { requested: usize, max: usize },
    #[error("rotation index {index} references invalid agent index {agent_index}")]
    InvalidRotation { index: usize, agent_index: usize },
    #[error("analytics error: {0}")]
    Analytics(#[from] AnalyticsError),
    #[error("telemetry summarisation failed: {0}")]
    Telemetry(#[from] TelemetryError),
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("invalid personality parameter for agent '{name}': {message}")]
    InvalidPersonalityParam { name: String, message: String },
}

struct AgentBlueprint {
    name: String,
    implementation: AgentImplementation,
}

enum AgentImplementation {
    Probabilistic(PersonalityOptions),
}

impl AgentBlueprint {
    fn from_configs(configs: &[AgentConfig]) -> Result<Vec<Self>, AgentError> {
        configs.iter().map(Self::from_config).collect()
    }

    fn from_config(config: &AgentConfig) -> Result<Self, AgentError> {
        let implementation = match config.kind {
            AgentKind::Probabilistic => {
                let options = PersonalityOptions::from_params(&config.name, &config.params)?;
                AgentImplementation::Probabilistic(options)
            }
        };

        Ok(Self {
            name: config.name.clone(),
            implementation,
        })
    }

    fn spawn_policy(&self, seed: u64) -> Box<dyn Policy> {
        match &self.implementation {
            AgentImplementation::Probabilistic(PersonalityOptions::Fixed(personality)) => {
                Box::new(ProbabilisticPolicy::seeded(*personality, seed))
            }
            AgentImplementation::Probabilistic(PersonalityOptions::Random) => {
                Box::new(ProbabilisticPolicy::sampled(seed))
            }
        }
    }
}

/// Personality of a probabilistic agent: fixed, or drawn afresh every game.
#[derive(Debug, Clone, Copy, PartialEq)]
enum PersonalityOptions {
    Fixed(Personality),
    Random,
}

impl PersonalityOptions {
    fn from_params(name: &str, params: &serde_yaml::Value) -> Result<Self, AgentError> {
        if params.is_null() {
            return Ok(Self::Random);
        }

        let invalid = |message: String| AgentError::InvalidPersonalityParam {
            name: name.to_string(),
            message,
        };

        let mapping = params
            .as_mapping()
            .ok_or_else(|| invalid("expected mapping for personality params".to_string()))?;

        let mut random = false;
        let mut craziness = None;
        let mut aggressiveness = None;
        for (key, value) in mapping {
            match key.as_str() {
                Some("personality") => match value.as_str().map(str::to_ascii_lowercase) {
                    Some(text) if text == "random" => random = true,
                    Some(other) => return Err(invalid(format!("unknown personality '{other}'"))),
                    None => return Err(invalid("personality must be a string".to_string())),
                },
                Some("craziness") => {
                    craziness = Some(bounded(value, MAX_CRAZINESS).ok_or_else(|| {
                        invalid(format!("craziness must be a number in [0, {MAX_CRAZINESS}]"))
                    })?);
                }
                Some("aggressiveness") => {
                    aggressiveness = Some(bounded(value, MAX_AGGRESSIVENESS).ok_or_else(|| {
                        invalid(format!(
                            "aggressiveness must be a number in [0, {MAX_AGGRESSIVENESS}]"
                        ))
                    })?);
                }
                _ => {}
            }
        }

        match (random, craziness, aggressiveness) {
            (true, None, None) | (false, None, None) => Ok(Self::Random),
            (true, _, _) => Err(invalid(
                "a random personality cannot also fix craziness or aggressiveness".to_string(),
            )),
            (false, craziness, aggressiveness) => Ok(Self::Fixed(Personality::new(
                craziness.unwrap_or(0.0),
                aggressiveness.unwrap_or(0.0),
            ))),
        }
    }
}

fn bounded(value: &serde_yaml::Value, max: f64) -> Option<f64> {
    value
        .as_f64()
        .filter(|v| v.is_finite() && (0.0..=max).contains(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::iter::FromIterator;

    fn params(entries: &[(&str, serde_yaml::Value)]) -> serde_yaml::Value {
        serde_yaml::Value::Mapping(serde_yaml::Mapping::from_iter(entries.iter().map(
            |(key, value)| (serde_yaml::Value::String((*key).into()), value.clone()),
        )))
    }

    #[test]
    fn final_snapshot_records_the_finished_table() {
        let names: Vec<String> = vec!["a".into(), "b".into(), "c".into()];
        let game = MatchState::with_seed(&names, 2, false, 31).unwrap();
        let policies: Vec<Box<dyn Policy>> = (0..3)
            .map(|i| Box::new(ProbabilisticPolicy::sampled(i)) as Box<dyn Policy>)
            .collect();
        let mut table = TableRunner::new(game, policies).unwrap();
        let report = table.play().unwrap();

        let json = final_snapshot(table.game()).unwrap();
        assert!(!json.contains('\n'));
        let snapshot = MatchSnapshot::from_json(&json).unwrap();
        assert_eq!(snapshot.seed, 31);
        assert_eq!(snapshot.round_number, table.game().round_number());
        let standing: Vec<_> = snapshot.seats.iter().filter(|s| s.dice > 0).collect();
        assert_eq!(standing.len(), 1);
        assert_eq!(standing[0].seat, report.winner);
        assert_eq!(snapshot.seats.len(), 3);
    }

    #[test]
    fn rotations_enumerate_unique_orders() {
        let rotations = SeatRotations::new(5, 5);
        let mut seen = rotations.as_slice().to_vec();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 5);
    }

    #[test]
    fn personality_params_default_to_random() {
        let empty = serde_yaml::Value::Mapping(Default::default());
        let options = PersonalityOptions::from_params("bot", &empty).unwrap();
        assert_eq!(options, PersonalityOptions::Random);

        let explicit = params(&[("personality", "Random".into())]);
        let options = PersonalityOptions::from_params("bot", &explicit).unwrap();
        assert_eq!(options, PersonalityOptions::Random);
    }

    #[test]
    fn personality_params_parse_fixed_values() {
        let value = params(&[("craziness", 0.1_f64.into()), ("aggressiveness", 0.25_f64.into())]);
        let options = PersonalityOptions::from_params("bot", &value).unwrap();
        assert_eq!(
            options,
            PersonalityOptions::Fixed(Personality::new(0.1, 0.25))
        );

        let partial = params(&[("aggressiveness", 0.3_f64.into())]);
        let options = PersonalityOptions::from_params("bot", &partial).unwrap();
        assert_eq!(options, PersonalityOptions::Fixed(Personality::new(0.0, 0.3)));
    }

    #[test]
    fn personality_params_reject_out_of_range_or_mixed() {
        let value = params(&[("craziness", 0.9_f64.into())]);
        assert!(PersonalityOptions::from_params("bot", &value).is_err());

        let value = params(&[("aggressiveness", "high".into())]);
        assert!(PersonalityOptions::from_params("bot", &value).is_err());

        let value = params(&[("personality", "random".into()), ("craziness", 0.1_f64.into())]);
        assert!(PersonalityOptions::from_params("bot", &value).is_err());
    }

    #[test]
    fn policy_seeds_differ_per_agent() {
        let seeds: Vec<u64> = (0..6).map(|agent| policy_seed(42, agent)).collect();
        let mut unique = seeds.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), seeds.len());
        assert_eq!(policy_seed(42, 3), policy_seed(42, 3));
    }
}
