use std::path::PathBuf;

use clap::Parser;

use liars_bench::config::{BenchmarkConfig, ResolvedOutputs};
use liars_bench::logging::init_logging;
use liars_bench::tournament::TournamentRunner;
use liars_core::AppInfo;

/// Tournament benchmarking harness for Liar's Dice bots.
#[derive(Debug, Parser)]
#[command(
    name = "liars-bench",
    author,
    version,
    about = "Deterministic Liar's Dice tournament harness"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "bench/bench.yaml")]
    config: PathBuf,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Override the number of games to play.
    #[arg(long, value_name = "GAMES")]
    games: Option<usize>,

    /// Override the RNG seed for game generation.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Override the dice each seat starts with.
    #[arg(long, value_name = "DICE")]
    dice: Option<u8>,

    /// Override the number of seat rotations per game.
    #[arg(long, value_name = "COUNT")]
    rotations: Option<usize>,

    /// Play with ones wild regardless of config.
    #[arg(long)]
    wild: bool,

    /// Exit after validating the configuration (no tournament is run).
    #[arg(long)]
    validate_only: bool,

    /// Drop per-decision bot events from the telemetry log.
    #[arg(long)]
    quiet_decisions: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = BenchmarkConfig::from_path(&cli.config)?;

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    if let Some(games) = cli.games {
        config.games.count = games;
    }

    if let Some(seed) = cli.seed {
        config.games.seed = Some(seed);
    }

    if let Some(dice) = cli.dice {
        config.games.dice_per_seat = dice;
    }

    if let Some(rotations) = cli.rotations {
        config.games.rotations = rotations;
    }

    if cli.wild {
        config.games.wild = true;
    }

    if cli.quiet_decisions {
        config.logging.decision_details = false;
    }

    config.validate()?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let agent_count = config.agents.len();
    let run_id = config.run_id.clone();
    let games = config.games.count;
    let rotations = config.games.rotations;

    println!(
        "{} {} ({})",
        AppInfo::name(),
        AppInfo::version(),
        AppInfo::codename()
    );
    println!(
        "Loaded configuration '{run_id}' with {agent_count} agents ({games} games, {rotations} rotation{}, {} dice each{})",
        if rotations == 1 { "" } else { "s" },
        config.games.dice_per_seat,
        if config.games.wild { ", ones wild" } else { "" }
    );

    let _logging_guard = init_logging(&config.logging, &outputs)?;
    let runner = TournamentRunner::new(config, outputs)?;

    if cli.validate_only {
        println!("Validation-only mode: tournament execution skipped.");
        return Ok(());
    }

    let summary = runner.run()?;
    println!(
        "Tournament complete for '{run_id}': {} games × {} rotations → {} rows at {}",
        summary.games_played,
        summary.rotations,
        summary.rows_written,
        summary.jsonl_path.display()
    );
    println!("Summary table: {}", summary.summary_path.display());
    if let Some(plot_path) = summary.plot_path.as_ref() {
        println!("Placement delta plot: {}", plot_path.display());
    }
    if let Some(telemetry_path) = summary.telemetry_path.as_ref() {
        println!("Telemetry log: {}", telemetry_path.display());
    }
    if let Some(outputs) = summary.telemetry_outputs.as_ref() {
        println!("Telemetry summary (JSON): {}", outputs.json_path.display());
        println!(
            "Telemetry summary (Markdown): {}",
            outputs.markdown_path.display()
        );
        let decisions = &outputs.summary.decisions;
        println!(
            "  Decisions: {} events, {} challenges",
            decisions.count, decisions.challenges
        );
        if !outputs.summary.games.win_counts.is_empty() {
            println!("  Wins: {:?}", outputs.summary.games.win_counts);
        }
    }

    Ok(())
}
