use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use thiserror::Error;

use crate::config::{AgentConfig, AgentKind, BenchmarkConfig};
use crate::tournament::{GameOutcome, SeatResult};

const CONFIDENCE_Z: f64 = 1.96; // 95% CI

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("baseline agent '{0}' not present in tournament results")]
    MissingBaseline(String),
    #[error("agent '{0}' defined in results but missing from configuration")]
    UnknownAgent(String),
    #[error("baseline '{0}' missing for game {1}")]
    MissingBaselineGame(String, String),
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to render plot: {0}")]
    Plot(String),
}

pub struct AnalyticsCollector {
    baseline: String,
    agents: HashMap<String, AgentAccumulator>,
    comparisons: HashMap<String, ComparisonAccumulator>,
    agent_order: Vec<String>,
    latency_budget_ms: u64,
}

impl AnalyticsCollector {
    pub fn new(config: &BenchmarkConfig) -> Result<Self, AnalyticsError> {
        let baseline = config
            .metrics
            .baseline
            .clone()
            .ok_or_else(|| AnalyticsError::MissingBaseline("<unset>".into()))?;

        let mut agents = HashMap::new();
        let mut order = Vec::new();
        for agent in &config.agents {
            agents.insert(
                agent.name.clone(),
                AgentAccumulator::new(agent.clone(), config.metrics.latency_budget_ms),
            );
            order.push(agent.name.clone());
        }

        if !agents.contains_key(&baseline) {
            return Err(AnalyticsError::MissingBaseline(baseline));
        }

        Ok(Self {
            baseline,
            agents,
            comparisons: HashMap::new(),
            agent_order: order,
            latency_budget_ms: config.metrics.latency_budget_ms,
        })
    }

    pub fn record_game(
        &mut self,
        game_index: usize,
        rotation_index: usize,
        outcome: &GameOutcome,
    ) -> Result<(), AnalyticsError> {
        let game_id = format!("G{game_index:05}_R{rotation_index:02}");
        let table_size = outcome.seat_results.len();

        let baseline_placement = outcome
            .seat_results
            .iter()
            .find(|seat| seat.agent_name == self.baseline)
            .map(|seat| seat.placement as f64)
            .ok_or_else(|| {
                AnalyticsError::MissingBaselineGame(self.baseline.clone(), game_id.clone())
            })?;

        for seat in &outcome.seat_results {
            let acc = self
                .agents
                .get_mut(&seat.agent_name)
                .ok_or_else(|| AnalyticsError::UnknownAgent(seat.agent_name.clone()))?;
            acc.record_game(seat, seat.seat == outcome.winner, table_size);
        }

        for seat in &outcome.seat_results {
            if seat.agent_name == self.baseline {
                continue;
            }
            let diff = seat.placement as f64 - baseline_placement;
            self.comparisons
                .entry(seat.agent_name.clone())
                .or_insert_with(ComparisonAccumulator::new)
                .record(diff);
        }

        Ok(())
    }

    pub fn finalize(mut self) -> Result<AnalyticsSummary, AnalyticsError> {
        let mut reports = Vec::new();
        for name in &self.agent_order {
            if let Some(acc) = self.agents.remove(name) {
                reports.push(acc.into_report());
            }
        }

        let mut comparisons = Vec::new();
        for report in &reports {
            if report.name == self.baseline {
                comparisons.push(ComparisonReport {
                    agent: report.name.clone(),
                    p_value: 1.0,
                    sample_size: report.games,
                });
                continue;
            }
            if let Some(comp) = self.comparisons.remove(&report.name) {
                let (p_value, sample_size) = comp.wilcoxon_signed_rank();
                comparisons.push(ComparisonReport {
                    agent: report.name.clone(),
                    p_value,
                    sample_size,
                });
            } else {
                comparisons.push(ComparisonReport {
                    agent: report.name.clone(),
                    p_value: 1.0,
                    sample_size: 0,
                });
            }
        }

        Ok(AnalyticsSummary {
            baseline: self.baseline,
            agents: reports,
            comparisons,
            latency_budget_ms: self.latency_budget_ms,
        }
        .enrich())
    }
}

struct AgentAccumulator {
    config: AgentConfig,
    games: u32,
    wins: u32,
    placements: Vec<f64>,
    win_flags: Vec<f64>,
    /// Placement scaled to [0, 1] so tables of different sizes compare.
    relative_finish: f64,
    dice_lost: u64,
    bids: u64,
    challenges: u64,
    challenges_won: u64,
    bluffs_caught: u64,
    total_latency_ms: f64,
    total_decisions: u64,
    latency_budget_ms: u64,
}

impl AgentAccumulator {
    fn new(config: AgentConfig, latency_budget_ms: u64) -> Self {
        Self {
            config,
            games: 0,
            wins: 0,
            placements: Vec::new(),
            win_flags: Vec::new(),
            relative_finish: 0.0,
            dice_lost: 0,
            bids: 0,
            challenges: 0,
            challenges_won: 0,
            bluffs_caught: 0,
            total_latency_ms: 0.0,
            total_decisions: 0,
            latency_budget_ms,
        }
    }

    fn record_game(&mut self, seat: &SeatResult, is_winner: bool, table_size: usize) {
        let stats = &seat.stats;
        self.games += 1;
        self.placements.push(seat.placement as f64);
        self.win_flags.push(if is_winner { 1.0 } else { 0.0 });
        if is_winner {
            self.wins += 1;
        }
        if table_size > 1 {
            self.relative_finish += (seat.placement - 1) as f64 / (table_size - 1) as f64;
        }
        self.dice_lost += u64::from(stats.dice_lost);
        self.bids += u64::from(stats.bids);
        self.challenges += u64::from(stats.challenges);
        self.challenges_won += u64::from(stats.challenges_won);
        self.bluffs_caught += u64::from(stats.bluffs_caught);
        self.total_latency_ms += stats.decision_time.as_secs_f64() * 1000.0;
        self.total_decisions += u64::from(stats.decisions);
    }

    fn into_report(self) -> AgentReport {
        let games = self.games as usize;
        let avg_placement = mean(&self.placements);
        let avg_latency = ratio(self.total_latency_ms, self.total_decisions as f64);

        AgentReport {
            name: self.config.name.clone(),
            kind: self.config.kind,
            params: self.config.params.clone(),
            games,
            avg_placement,
            ci95: confidence_interval(&self.placements),
            wins: self.wins as usize,
            win_rate: mean(&self.win_flags),
            win_ci95: clamp_unit(confidence_interval(&self.win_flags)),
            relative_finish: ratio(self.relative_finish, games as f64),
            avg_dice_lost: ratio(self.dice_lost as f64, games as f64),
            challenge_success: ratio(self.challenges_won as f64, self.challenges as f64),
            bluff_caught_rate: ratio(self.bluffs_caught as f64, self.bids as f64),
            average_ms_per_decision: avg_latency,
            delta_vs_baseline: 0.0,
            over_budget: avg_latency > self.latency_budget_ms as f64,
        }
    }
}

#[derive(Clone)]
struct ComparisonAccumulator {
    diffs: Vec<f64>,
}

impl ComparisonAccumulator {
    fn new() -> Self {
        Self { diffs: Vec::new() }
    }

    fn record(&mut self, diff: f64) {
        self.diffs.push(diff);
    }

    fn wilcoxon_signed_rank(self) -> (f64, usize) {
        let diffs: Vec<f64> = self
            .diffs
            .into_iter()
            .filter(|d| d.abs() > f64::EPSILON)
            .collect();
        let n = diffs.len();
        if n == 0 {
            return (1.0, 0);
        }

        let mut paired: Vec<(f64, f64)> =
            diffs.into_iter().map(|d| (d.abs(), d.signum())).collect();
        paired.sort_by(|a, b| a.0.total_cmp(&b.0));

        // Tied magnitudes share their average rank.
        let mut ranks = Vec::with_capacity(n);
        let mut tie_sizes = Vec::new();
        let mut i = 0;
        while i < paired.len() {
            let mut j = i;
            while j + 1 < paired.len() && (paired[j + 1].0 - paired[i].0).abs() < 1e-12 {
                j += 1;
            }
            let rank = (i + j + 2) as f64 / 2.0;
            ranks.extend(paired[i..=j].iter().map(|(_, sign)| (rank, *sign)));
            if j > i {
                tie_sizes.push(j - i + 1);
            }
            i = j + 1;
        }

        let w_plus: f64 = ranks
            .iter()
            .filter(|(_, sign)| *sign > 0.0)
            .map(|(rank, _)| *rank)
            .sum();
        let w_minus: f64 = ranks
            .iter()
            .filter(|(_, sign)| *sign < 0.0)
            .map(|(rank, _)| *rank)
            .sum();

        let w = w_plus.min(w_minus);
        let n_f = n as f64;
        let mean_w = n_f * (n_f + 1.0) / 4.0;

        let tie_adjustment: f64 = tie_sizes
            .into_iter()
            .map(|count| {
                let c = count as f64;
                (c.powi(3) - c) / 48.0
            })
            .sum();
        let variance_w = n_f * (n_f + 1.0) * (2.0 * n_f + 1.0) / 24.0 - tie_adjustment;
        if variance_w <= 0.0 {
            return (1.0, n);
        }

        let z = ((w - mean_w).abs() - 0.5) / variance_w.sqrt();
        let p = match Normal::new(0.0, 1.0) {
            Ok(normal) => 2.0 * (1.0 - normal.cdf(z)),
            Err(_) => 1.0,
        };
        (p.clamp(0.0, 1.0), n)
    }
}

#[derive(Debug, Serialize)]
pub struct AnalyticsSummary {
    pub baseline: String,
    pub agents: Vec<AgentReport>,
    pub comparisons: Vec<ComparisonReport>,
    pub latency_budget_ms: u64,
}

impl AnalyticsSummary {
    pub fn enrich(mut self) -> Self {
        let baseline_avg = self
            .agents
            .iter()
            .find(|agent| agent.name == self.baseline)
            .map(|agent| agent.avg_placement)
            .unwrap_or(0.0);

        for agent in &mut self.agents {
            agent.delta_vs_baseline = agent.avg_placement - baseline_avg;
        }

        self
    }

    pub fn agent(&self, name: &str) -> Option<&AgentReport> {
        self.agents.iter().find(|agent| agent.name == name)
    }

    pub fn write_markdown(&self, path: impl AsRef<Path>) -> Result<(), AnalyticsError> {
        let mut rows = String::new();
        rows.push_str("# Tournament Summary\n\n");
        rows.push_str(&format!(
            "Baseline: {}. Latency budget: {} ms average per decision\n\n",
            self.baseline, self.latency_budget_ms
        ));
        rows.push_str("| Agent | Kind | Games | Avg place | Δ vs baseline | 95% CI | Win % | Win 95% CI | Dice lost/game | Challenge hit % | Bluffs caught % | Avg ms/decision | Over Budget | p-value |\n");
        rows.push_str("|-------|------|-------|-----------|----------------|--------|-------|------------|----------------|-----------------|-----------------|------------------|-------------|---------|\n");

        for agent in &self.agents {
            let comparison = self
                .comparisons
                .iter()
                .find(|c| c.agent == agent.name)
                .map(|c| c.p_value)
                .unwrap_or(1.0);

            rows.push_str(&format!(
                "| {name} | {kind} | {games} | {avg:.3} | {delta:+.3} | [{ci_low:.3}, {ci_high:.3}] | {win:.1}% | [{win_low:.1}%, {win_high:.1}%] | {dice:.2} | {hit:.1}% | {caught:.1}% | {latency:.3} | {over_budget} | {pval:.3} |\n",
                name = agent.name,
                kind = agent.kind.as_str(),
                games = agent.games,
                avg = agent.avg_placement,
                delta = agent.delta_vs_baseline,
                ci_low = agent.ci95.0,
                ci_high = agent.ci95.1,
                win = agent.win_rate * 100.0,
                win_low = agent.win_ci95.0 * 100.0,
                win_high = agent.win_ci95.1 * 100.0,
                dice = agent.avg_dice_lost,
                hit = agent.challenge_success * 100.0,
                caught = agent.bluff_caught_rate * 100.0,
                latency = agent.average_ms_per_decision,
                over_budget = if agent.over_budget { "Yes" } else { "No" },
                pval = comparison,
            ));
        }

        fs::write(path.as_ref(), rows).map_err(|e| AnalyticsError::Io {
            context: "writing summary markdown",
            source: e,
        })?;
        Ok(())
    }

    pub fn render_plot(&self, dir: impl AsRef<Path>) -> Result<PathBuf, AnalyticsError> {
        let dir = dir.as_ref();
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir).map_err(|e| AnalyticsError::Io {
                context: "creating plots directory",
                source: e,
            })?;
        }

        let output_path = dir.join("delta_placement.png");
        let baseline = self.baseline.clone();
        let agents_snapshot = self.agents.clone();

        // Text rendering panics without font support; keep it out of stderr.
        let prev_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(|_| {}));

        let plot_attempt = std::panic::catch_unwind(move || {
            let root = BitMapBackend::new(&output_path, (800, 480)).into_drawing_area();
            root.fill(&WHITE)
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            let mut agents = agents_snapshot;
            agents.sort_by(|a, b| a.delta_vs_baseline.total_cmp(&b.delta_vs_baseline));

            let y_range_min = agents
                .iter()
                .map(|a| a.delta_vs_baseline)
                .fold(0.0f64, |acc, v| acc.min(v));
            let y_range_max = agents
                .iter()
                .map(|a| a.delta_vs_baseline)
                .fold(0.0f64, |acc, v| acc.max(v));
            let margin = ((y_range_max - y_range_min).abs() * 0.1).max(0.2);

            let mut chart = ChartBuilder::on(&root)
                .margin(20)
                .caption(
                    "Placement delta vs baseline (lower is better)",
                    ("sans-serif", 22),
                )
                .set_label_area_size(LabelAreaPosition::Left, 50)
                .set_label_area_size(LabelAreaPosition::Bottom, 60)
                .build_cartesian_2d(
                    0..agents.len(),
                    (y_range_min - margin)..(y_range_max + margin),
                )
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            chart
                .configure_mesh()
                .disable_mesh()
                .y_desc("Δ avg placement vs baseline")
                .x_desc("Agent")
                .x_label_formatter(&|idx| {
                    agents
                        .get(*idx)
                        .map(|agent| agent.name.clone())
                        .unwrap_or_default()
                })
                .draw()
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            chart
                .draw_series(agents.iter().enumerate().map(|(idx, agent)| {
                    let color = if agent.name == baseline {
                        &BLUE
                    } else if agent.delta_vs_baseline <= 0.0 {
                        &GREEN
                    } else {
                        &RED
                    };
                    Rectangle::new(
                        [(idx, 0.0), (idx + 1, agent.delta_vs_baseline)],
                        color.filled(),
                    )
                }))
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            drop(chart);

            root.present()
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            drop(root);

            Ok(output_path)
        });

        std::panic::set_hook(prev_hook);

        match plot_attempt {
            Ok(result) => result,
            Err(_) => Err(AnalyticsError::Plot(
                "plotters panicked while rendering (missing font support?)".into(),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentReport {
    pub name: String,
    pub kind: AgentKind,
    pub params: serde_yaml::Value,
    pub games: usize,
    pub avg_placement: f64,
    pub ci95: (f64, f64),
    pub wins: usize,
    pub win_rate: f64,
    pub win_ci95: (f64, f64),
    /// 0 for always winning, 1 for always going out first.
    pub relative_finish: f64,
    pub avg_dice_lost: f64,
    pub challenge_success: f64,
    pub bluff_caught_rate: f64,
    pub average_ms_per_decision: f64,
    #[serde(skip)]
    pub delta_vs_baseline: f64,
    #[serde(skip)]
    pub over_budget: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub agent: String,
    pub p_value: f64,
    pub sample_size: usize,
}

fn mean(values: &[f64]) -> f64 {
    ratio(values.iter().sum(), values.len() as f64)
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

fn clamp_unit((low, high): (f64, f64)) -> (f64, f64) {
    (low.clamp(0.0, 1.0), high.clamp(0.0, 1.0))
}

fn confidence_interval(points: &[f64]) -> (f64, f64) {
    if points.is_empty() {
        return (0.0, 0.0);
    }
    let mean = mean(points);
    if points.len() == 1 {
        return (mean, mean);
    }
    let variance = points
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / (points.len() as f64 - 1.0);
    let std_error = (variance / points.len() as f64).sqrt();
    let margin = CONFIDENCE_Z * std_error;
    (mean - margin, mean + margin)
}
