use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse telemetry JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Default, Serialize)]
pub struct TelemetrySummary {
    pub decisions: DecisionTelemetrySummary,
    pub rounds: RoundTelemetrySummary,
    pub games: GameTelemetrySummary,
}

#[derive(Debug, Default, Serialize)]
pub struct DecisionTelemetrySummary {
    pub count: usize,
    pub challenges: usize,
    /// Mean model probability of the standing bid when one was judged.
    pub avg_truth: Option<f64>,
    pub avg_best: Option<f64>,
    /// Mean of `best - truth` where both were recorded.
    pub avg_raise_margin: Option<f64>,
    pub reason_counts: BTreeMap<String, usize>,
    pub style_counts: BTreeMap<String, usize>,
}

#[derive(Debug, Default, Serialize)]
pub struct RoundTelemetrySummary {
    pub count: usize,
    pub bids_held: usize,
    pub avg_bids: Option<f64>,
    pub eliminations: usize,
    pub sudden_deaths: usize,
    pub sudden_death_ties: usize,
}

#[derive(Debug, Default, Serialize)]
pub struct GameTelemetrySummary {
    pub count: usize,
    pub avg_rounds: Option<f64>,
    pub win_counts: BTreeMap<String, usize>,
}

#[derive(Debug)]
struct Average {
    sum: f64,
    count: usize,
}

impl Average {
    fn new() -> Self {
        Self { sum: 0.0, count: 0 }
    }

    fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }
}

/// Aggregate decision, round and game events from a JSON telemetry log.
pub fn summarise_telemetry(path: &Path) -> Result<TelemetrySummary, TelemetryError> {
    if !path.exists() {
        return Ok(TelemetrySummary::default());
    }

    let file = File::open(path).map_err(|source| TelemetryError::Io {
        context: "opening telemetry log",
        source,
    })?;
    let reader = BufReader::new(file);

    let mut decisions = DecisionTelemetrySummary::default();
    let mut truth_avg = Average::new();
    let mut best_avg = Average::new();
    let mut margin_avg = Average::new();

    let mut rounds = RoundTelemetrySummary::default();
    let mut bids_avg = Average::new();

    let mut games = GameTelemetrySummary::default();
    let mut game_rounds_avg = Average::new();

    for line in reader.lines() {
        let line = line.map_err(|source| TelemetryError::Io {
            context: "reading telemetry line",
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }

        let payload: Value = serde_json::from_str(&line)?;
        let target = payload
            .get("target")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let fields = payload
            .get("fields")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        let reason = label(&fields, "reason");

        match target {
            "liars_bot::decision" if reason != "sudden_death_guess" => {
                decisions.count += 1;
                if fields.get("chosen").and_then(Value::as_str) == Some("challenge") {
                    decisions.challenges += 1;
                }

                let truth = fields.get("truth").and_then(Value::as_f64);
                let best = fields.get("best").and_then(Value::as_f64);
                if let Some(truth) = truth {
                    truth_avg.add(truth);
                }
                if let Some(best) = best {
                    best_avg.add(best);
                }
                if let (Some(truth), Some(best)) = (truth, best) {
                    margin_avg.add(best - truth);
                }

                *decisions.reason_counts.entry(reason.to_string()).or_insert(0) += 1;
                let style = label(&fields, "style");
                *decisions.style_counts.entry(style.to_string()).or_insert(0) += 1;
            }
            "liars_bench::round" if reason == "sudden_death" => {
                rounds.sudden_deaths += 1;
                if label(&fields, "loser") == "-" {
                    rounds.sudden_death_ties += 1;
                }
            }
            "liars_bench::round" => {
                rounds.count += 1;
                if fields.get("bid_held").and_then(Value::as_bool) == Some(true) {
                    rounds.bids_held += 1;
                }
                if fields.get("eliminated").and_then(Value::as_bool) == Some(true) {
                    rounds.eliminations += 1;
                }
                if let Some(bids) = fields.get("bids").and_then(Value::as_u64) {
                    bids_avg.add(bids as f64);
                }
            }
            "liars_bench::game" => {
                games.count += 1;
                if let Some(played) = fields.get("rounds").and_then(Value::as_u64) {
                    game_rounds_avg.add(played as f64);
                }
                let bot = label(&fields, "bot");
                *games.win_counts.entry(bot.to_string()).or_insert(0) += 1;
            }
            _ => {}
        }
    }

    decisions.avg_truth = truth_avg.mean();
    decisions.avg_best = best_avg.mean();
    decisions.avg_raise_margin = margin_avg.mean();
    rounds.avg_bids = bids_avg.mean();
    games.avg_rounds = game_rounds_avg.mean();

    Ok(TelemetrySummary {
        decisions,
        rounds,
        games,
    })
}

fn label<'a>(fields: &'a Map<String, Value>, key: &str) -> &'a str {
    fields
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("<unset>")
}

pub fn write_summary_outputs(
    telemetry_path: &Path,
    output_dir: &Path,
) -> Result<Option<TelemetryOutputs>, TelemetryError> {
    if !telemetry_path.exists() {
        return Ok(None);
    }

    let summary = summarise_telemetry(telemetry_path)?;
    let json_path = output_dir.join("telemetry_summary.json");
    let md_path = output_dir.join("telemetry_summary.md");

    std::fs::write(
        &json_path,
        serde_json::to_vec_pretty(&summary).map_err(TelemetryError::from)?,
    )
    .map_err(|source| TelemetryError::Io {
        context: "writing telemetry summary json",
        source,
    })?;

    let markdown = render_markdown(&summary, telemetry_path);
    std::fs::write(&md_path, markdown).map_err(|source| TelemetryError::Io {
        context: "writing telemetry summary markdown",
        source,
    })?;

    Ok(Some(TelemetryOutputs {
        summary,
        json_path,
        markdown_path: md_path,
    }))
}

pub fn append_highlights_to_markdown(
    summary_path: &Path,
    outputs: &TelemetryOutputs,
) -> Result<(), TelemetryError> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(summary_path)
        .map_err(|source| TelemetryError::Io {
            context: "opening summary markdown for telemetry append",
            source,
        })?;

    let mut section = String::new();
    section.push_str("\n## Telemetry Highlights\n");
    let decisions = &outputs.summary.decisions;
    section.push_str(&format!(
        "- Decisions captured: {} ({} challenges)\n",
        decisions.count, decisions.challenges
    ));
    if let Some(value) = decisions.avg_truth {
        section.push_str(&format!("- Avg standing bid probability: {:.3}\n", value));
    }
    if let Some(value) = decisions.avg_raise_margin {
        section.push_str(&format!("- Avg best raise vs standing bid: {:+.3}\n", value));
    }
    let rounds = &outputs.summary.rounds;
    if rounds.count > 0 {
        section.push_str(&format!(
            "- Rounds: {}, bids held: {:.1}%\n",
            rounds.count,
            rounds.bids_held as f64 * 100.0 / rounds.count as f64
        ));
    }
    if rounds.sudden_deaths > 0 {
        section.push_str(&format!(
            "- Sudden deaths: {} ({} tied)\n",
            rounds.sudden_deaths, rounds.sudden_death_ties
        ));
    }

    section.push_str("\n### Decision Reasons\n");
    if decisions.reason_counts.is_empty() {
        section.push_str("- <none>\n");
    } else {
        for (label, count) in &decisions.reason_counts {
            section.push_str(&format!("- {}: {}\n", label, count));
        }
    }

    write!(file, "{section}").map_err(|source| TelemetryError::Io {
        context: "writing telemetry highlights",
        source,
    })?;

    Ok(())
}

fn render_markdown(summary: &TelemetrySummary, telemetry_path: &Path) -> String {
    let mut output = String::new();
    output.push_str("# Telemetry Summary\n\n");
    output.push_str(&format!("- Source: `{}`\n", telemetry_path.display()));
    output.push('\n');

    let decisions = &summary.decisions;
    output.push_str("## Decisions\n");
    output.push_str(&format!("- Events: {}\n", decisions.count));
    output.push_str(&format!("- Challenges: {}\n", decisions.challenges));
    if let Some(value) = decisions.avg_truth {
        output.push_str(&format!("- Avg standing bid probability: {:.3}\n", value));
    }
    if let Some(value) = decisions.avg_best {
        output.push_str(&format!("- Avg best raise probability: {:.3}\n", value));
    }
    if let Some(value) = decisions.avg_raise_margin {
        output.push_str(&format!("- Avg raise margin: {:+.3}\n", value));
    }
    push_counts(&mut output, "Reasons", &decisions.reason_counts);
    push_counts(&mut output, "Styles", &decisions.style_counts);
    output.push('\n');

    let rounds = &summary.rounds;
    output.push_str("## Rounds\n");
    output.push_str(&format!("- Events: {}\n", rounds.count));
    output.push_str(&format!("- Bids held: {}\n", rounds.bids_held));
    if let Some(value) = rounds.avg_bids {
        output.push_str(&format!("- Avg bids per round: {:.2}\n", value));
    }
    output.push_str(&format!("- Eliminations: {}\n", rounds.eliminations));
    output.push_str(&format!(
        "- Sudden deaths: {} ({} tied)\n",
        rounds.sudden_deaths, rounds.sudden_death_ties
    ));
    output.push('\n');

    let games = &summary.games;
    output.push_str("## Games\n");
    output.push_str(&format!("- Events: {}\n", games.count));
    if let Some(value) = games.avg_rounds {
        output.push_str(&format!("- Avg rounds per game: {:.2}\n", value));
    }
    push_counts(&mut output, "Wins", &games.win_counts);
    output
}

fn push_counts(output: &mut String, title: &str, counts: &BTreeMap<String, usize>) {
    if counts.is_empty() {
        return;
    }
    output.push_str(&format!("- {title}:\n"));
    for (label, count) in counts {
        output.push_str(&format!("  - {}: {}\n", label, count));
    }
}

#[derive(Debug)]
pub struct TelemetryOutputs {
    pub summary: TelemetrySummary,
    pub json_path: PathBuf,
    pub markdown_path: PathBuf,
}
