use clap::Parser;
use pac_duel::actor::{Actor, DamageOutcome};
use pac_duel::board::{parse_layout, BoardLayout, TileBoard, Walkable, DEFAULT_LAYOUT};
use pac_duel::config::MatchConfig;
use pac_duel::constants::get_time_limit_secs;
use pac_duel::control::InputState;
use pac_duel::engine::MatchEngine;
use pac_duel::error::{BoardError, ConfigError};
use pac_duel::events::EventKind;
use pac_duel::types::{Direction, GameEvent, GameOverReason, PickupKind, ScoreEntry, Snapshot};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

const DEFAULT_MINUTES: u32 = 3;
const DEFAULT_SCENARIOS: usize = 2;
const DEFAULT_HAZARD_RATE: f64 = 0.002;
/// Chance a bot keeps its heading at a junction when that heading is still open.
const KEEP_HEADING_CHANCE: f64 = 0.75;

#[derive(Parser, Debug)]
#[command(author, version, about = "Run seeded bot-vs-bot duels and report anomalies")]
struct Cli {
    /// JSON match config; unset fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    /// ASCII board layout file.
    #[arg(long)]
    layout: Option<PathBuf>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    minutes: Option<u32>,
    #[arg(long)]
    scenarios: Option<usize>,
    /// Probability per actor per tick of a hazard hit.
    #[arg(long)]
    hazard_rate: Option<f64>,
    #[arg(long)]
    match_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Debug, Error)]
enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to read layout {}: {source}", path.display())]
    LayoutIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid layout: {0}")]
    Layout(#[from] BoardError),
}

#[derive(Clone, Debug, Serialize)]
struct Scenario {
    name: String,
    seed: u64,
    #[serde(rename = "hazardRate")]
    hazard_rate: f64,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioResultLine {
    scenario: String,
    seed: u64,
    reason: Option<GameOverReason>,
    #[serde(rename = "durationSecs")]
    duration_secs: f32,
    ticks: u64,
    winner: Option<u8>,
    #[serde(rename = "pelletsClaimed")]
    pellets_claimed: u32,
    #[serde(rename = "powerPelletsClaimed")]
    power_pellets_claimed: u32,
    #[serde(rename = "hazardHits")]
    hazard_hits: u32,
    #[serde(rename = "ignoredHits")]
    ignored_hits: u32,
    eliminations: u32,
    ranking: Vec<ScoreEntry>,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug)]
struct ScenarioRunResult {
    result: ScenarioResultLine,
    anomaly_records: Vec<AnomalyRecord>,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(rename = "generatedAt")]
    generated_at: String,
    #[serde(rename = "startedAtMs")]
    started_at_ms: u64,
    #[serde(rename = "finishedAtMs")]
    finished_at_ms: u64,
    #[serde(rename = "scenarioCount")]
    scenario_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageDurationSecs")]
    average_duration_secs: f32,
    #[serde(rename = "reasonCounts")]
    reason_counts: BTreeMap<String, usize>,
    scenarios: Vec<ScenarioResultLine>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    timestamp_ms: u64,
    level: String,
    event: String,
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    scenario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tick: Option<u64>,
    details: Value,
}

/// Random walker: holds a heading down corridors and rerolls at junctions or walls.
#[derive(Clone, Debug, Default)]
struct Bot {
    heading: Option<Direction>,
}

impl Bot {
    fn choose<W: Walkable>(
        &mut self,
        actor: &Actor,
        board: &W,
        rng: &mut StdRng,
    ) -> Option<Direction> {
        if !actor.is_at_rest() {
            return self.heading;
        }
        let here = actor.target_cell();
        let open: Vec<Direction> = Direction::PRIORITY
            .into_iter()
            .filter(|dir| board.is_walkable(here.offset(*dir)))
            .collect();
        if open.is_empty() {
            self.heading = None;
            return None;
        }
        let keep = self
            .heading
            .filter(|dir| open.contains(dir))
            .filter(|_| rng.random_bool(KEEP_HEADING_CHANCE));
        let next = keep.unwrap_or_else(|| open[rng.random_range(0..open.len())]);
        self.heading = Some(next);
        Some(next)
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let run_started_at_ms = now_ms();
    let scenarios = resolve_scenarios(&cli);
    let seed_hint = scenarios.first().map(|scenario| scenario.seed).unwrap_or(0);
    let match_id = cli
        .match_id
        .clone()
        .unwrap_or_else(|| default_match_id(seed_hint, run_started_at_ms));

    let (config, layout) = match load_setup(&cli) {
        Ok(setup) => setup,
        Err(error) => {
            emit_log(
                "error",
                "setup_failed",
                &match_id,
                None,
                None,
                None,
                json!({ "error": error.to_string() }),
            );
            std::process::exit(2);
        }
    };

    let mut has_anomaly = false;
    let mut scenario_results = Vec::new();
    let mut reason_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_duration_secs = 0.0f32;
    let mut total_anomalies = 0usize;

    for scenario in scenarios {
        emit_log(
            "info",
            "scenario_started",
            &match_id,
            Some(&scenario.name),
            Some(scenario.seed),
            None,
            json!({
                "hazardRate": scenario.hazard_rate,
                "timeLimitSecs": config.time_limit_secs,
                "pickups": layout.pickups.len(),
            }),
        );
        let scenario_run = match run_scenario(&scenario, &config, &layout) {
            Ok(run) => run,
            Err(error) => {
                emit_log(
                    "error",
                    "scenario_failed",
                    &match_id,
                    Some(&scenario.name),
                    Some(scenario.seed),
                    None,
                    json!({ "error": error.to_string() }),
                );
                std::process::exit(2);
            }
        };

        for anomaly in &scenario_run.anomaly_records {
            emit_log(
                "warn",
                "anomaly_detected",
                &match_id,
                Some(&scenario.name),
                Some(scenario.seed),
                Some(anomaly.tick),
                json!({ "message": anomaly.message }),
            );
        }

        let result = scenario_run.result;
        if !result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += scenario_run.anomaly_records.len();
        total_duration_secs += result.duration_secs;
        *reason_counts.entry(reason_key(result.reason)).or_insert(0) += 1;

        emit_log(
            "info",
            "scenario_finished",
            &match_id,
            Some(&scenario.name),
            Some(scenario.seed),
            Some(result.ticks),
            json!({
                "reason": result.reason,
                "winner": result.winner,
                "durationSecs": result.duration_secs,
                "anomalyCount": scenario_run.anomaly_records.len(),
            }),
        );

        println!(
            "{}",
            serde_json::to_string(&result).expect("scenario result should serialize")
        );
        scenario_results.push(result);
    }

    let summary = build_run_summary(
        match_id.clone(),
        run_started_at_ms,
        now_ms(),
        scenario_results,
        reason_counts,
        total_anomalies,
        total_duration_secs,
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &match_id,
                None,
                None,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    emit_log(
        "info",
        "run_finished",
        &match_id,
        None,
        None,
        None,
        json!({
            "scenarioCount": summary.scenario_count,
            "anomalyCount": summary.anomaly_count,
            "averageDurationSecs": summary.average_duration_secs,
            "reasonCounts": summary.reason_counts,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn load_setup(cli: &Cli) -> Result<(MatchConfig, BoardLayout), SetupError> {
    let mut config = match cli.config.as_deref() {
        Some(path) => MatchConfig::load(path)?,
        None => MatchConfig::default(),
    };
    if let Some(minutes) = cli.minutes {
        config.time_limit_secs = Some(get_time_limit_secs(minutes));
    } else if config.time_limit_secs.is_none() {
        config.time_limit_secs = Some(get_time_limit_secs(DEFAULT_MINUTES));
    }
    config.validate()?;

    let raw = match cli.layout.as_deref() {
        Some(path) => std::fs::read_to_string(path).map_err(|source| SetupError::LayoutIo {
            path: path.to_path_buf(),
            source,
        })?,
        None => DEFAULT_LAYOUT.to_string(),
    };
    Ok((config, parse_layout(&raw)?))
}

fn run_scenario(
    scenario: &Scenario,
    config: &MatchConfig,
    layout: &BoardLayout,
) -> Result<ScenarioRunResult, BoardError> {
    let mut engine = MatchEngine::from_layout(config.clone(), layout.clone())?;
    let mut rng = StdRng::seed_from_u64(scenario.seed);
    let mut bots = vec![Bot::default(); engine.actors().len()];
    let dt = config.tick_secs();

    let claims_per_pickup: Rc<RefCell<BTreeMap<u32, u32>>> = Rc::default();
    {
        let claims = Rc::clone(&claims_per_pickup);
        engine.bus_mut().subscribe(EventKind::PickupClaimed, move |event| {
            if let GameEvent::PickupClaimed { pickup_id, .. } = event {
                *claims.borrow_mut().entry(*pickup_id).or_insert(0) += 1;
            }
        });
    }

    let mut pellets_claimed = 0;
    let mut power_pellets_claimed = 0;
    let mut hazard_hits = 0;
    let mut ignored_hits = 0;
    let mut eliminations = 0;
    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();
    let tick_limit = tick_safety_limit(config);
    let hazard_rate = scenario.hazard_rate.max(0.0).min(1.0);

    while !engine.is_ended() {
        let mut input = InputState::new();
        for (actor, bot) in engine.actors().iter().zip(bots.iter_mut()) {
            if let Some(dir) = bot.choose(actor, engine.board(), &mut rng) {
                input.press(actor.schema().binding(dir).clone());
            }
        }
        engine.step(dt, &input);

        for idx in 0..engine.actors().len() {
            if !rng.random_bool(hazard_rate) {
                continue;
            }
            match engine.damage_actor(idx) {
                Some(DamageOutcome::Ignored) => ignored_hits += 1,
                Some(DamageOutcome::LifeLost { .. } | DamageOutcome::Eliminated) => {
                    hazard_hits += 1
                }
                None => {}
            }
        }

        let snapshot = engine.build_snapshot(true);
        for event in &snapshot.events {
            match event {
                GameEvent::PickupClaimed {
                    kind: PickupKind::Pellet,
                    ..
                } => pellets_claimed += 1,
                GameEvent::PickupClaimed {
                    kind: PickupKind::PowerPellet,
                    ..
                } => power_pellets_claimed += 1,
                GameEvent::PlayerLost { .. } => eliminations += 1,
            }
        }

        let mut messages = collect_snapshot_anomalies(&snapshot, config, engine.board());
        messages.extend(
            claims_per_pickup
                .borrow()
                .iter()
                .filter(|(_, count)| **count > 1)
                .map(|(id, count)| format!("pickup {id} claimed {count} times")),
        );
        for message in messages {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.tick,
                message,
            );
        }

        if snapshot.tick > tick_limit {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.tick,
                "tick safety limit exceeded".to_string(),
            );
            break;
        }
    }

    let summary = engine.build_summary();
    Ok(ScenarioRunResult {
        result: ScenarioResultLine {
            scenario: scenario.name.clone(),
            seed: scenario.seed,
            reason: summary.reason,
            duration_secs: summary.duration_secs,
            ticks: summary.ticks,
            winner: summary.winner,
            pellets_claimed,
            power_pellets_claimed,
            hazard_hits,
            ignored_hits,
            eliminations,
            ranking: summary.ranking,
            anomalies,
        },
        anomaly_records,
    })
}

fn tick_safety_limit(config: &MatchConfig) -> u64 {
    let limit_secs = config
        .time_limit_secs
        .unwrap_or_else(|| get_time_limit_secs(DEFAULT_MINUTES));
    (limit_secs * config.tick_rate as f32).ceil() as u64 + config.tick_rate as u64
}

fn collect_snapshot_anomalies(
    snapshot: &Snapshot,
    config: &MatchConfig,
    board: &TileBoard,
) -> Vec<String> {
    let mut anomalies = Vec::new();
    let max_lives = config.starting_lives + 1;

    for actor in &snapshot.actors {
        if !actor.x.is_finite() || !actor.y.is_finite() {
            anomalies.push(format!("player {} position is not finite", actor.player));
        }
        if !actor.moving && !board.is_walkable(actor.cell) {
            anomalies.push(format!(
                "player {} at rest on blocked cell ({}, {})",
                actor.player, actor.cell.x, actor.cell.y
            ));
        }
        if !board.is_walkable(actor.target) {
            anomalies.push(format!(
                "player {} heading into blocked cell ({}, {})",
                actor.player, actor.target.x, actor.target.y
            ));
        }
        if actor.lives > max_lives {
            anomalies.push(format!(
                "player {} lives out of range: {}/{}",
                actor.player, actor.lives, max_lives
            ));
        }
        if actor.invincible_secs < 0.0 || actor.invincible_secs > config.invincibility_secs {
            anomalies.push(format!(
                "player {} invincibility out of range: {}",
                actor.player, actor.invincible_secs
            ));
        }
    }

    if let Some(left) = snapshot.time_left_secs {
        if !left.is_finite() || left < 0.0 {
            anomalies.push(format!("invalid time left: {left}"));
        }
    }
    anomalies
}

fn resolve_scenarios(cli: &Cli) -> Vec<Scenario> {
    let seed = cli.seed.unwrap_or_else(now_ms);
    let hazard_rate = cli.hazard_rate.unwrap_or(DEFAULT_HAZARD_RATE);
    let count = cli.scenarios.unwrap_or(DEFAULT_SCENARIOS).clamp(1, 100);

    (0..count)
        .map(|idx| Scenario {
            name: format!("duel-{}", idx + 1),
            seed: seed.wrapping_add(idx as u64),
            hazard_rate,
        })
        .collect()
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_match_id(seed: u64, timestamp_ms: u64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn build_run_summary(
    match_id: String,
    started_at_ms: u64,
    finished_at_ms: u64,
    scenarios: Vec<ScenarioResultLine>,
    reason_counts: BTreeMap<String, usize>,
    anomaly_count: usize,
    total_duration_secs: f32,
) -> RunSummary {
    let scenario_count = scenarios.len();
    let average_duration_secs = if scenario_count == 0 {
        0.0
    } else {
        total_duration_secs / scenario_count as f32
    };
    RunSummary {
        match_id,
        generated_at: chrono::Utc::now().to_rfc3339(),
        started_at_ms,
        finished_at_ms,
        scenario_count,
        anomaly_count,
        average_duration_secs,
        reason_counts,
        scenarios,
    }
}

fn emit_log(
    level: &str,
    event: &str,
    match_id: &str,
    scenario: Option<&str>,
    seed: Option<u64>,
    tick: Option<u64>,
    details: Value,
) {
    let log_line = StructuredLogLine {
        timestamp_ms: now_ms(),
        level: level.to_string(),
        event: event.to_string(),
        match_id: match_id.to_string(),
        scenario: scenario.map(|value| value.to_string()),
        seed,
        tick,
        details,
    };
    eprintln!(
        "{}",
        serde_json::to_string(&log_line).expect("structured log should serialize")
    );
}

fn reason_key(reason: Option<GameOverReason>) -> String {
    match reason {
        Some(GameOverReason::BoardCleared) => "board_cleared",
        Some(GameOverReason::Elimination) => "elimination",
        Some(GameOverReason::Timeout) => "timeout",
        None => "unfinished",
    }
    .to_string()
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    std::fs::write(path, summary_text)
}
