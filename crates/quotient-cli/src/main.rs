//! `quotient` – multilevel motion planning from the command line.
//!
//! ```text
//! quotient solve demos/narrow_passage.toml --seed 7 --timeout 5
//! quotient settings --init
//! ```
//!
//! `solve` loads a scenario, builds one roadmap level per listed space and
//! runs the level sequence until the finest level is solved, the timeout
//! expires or **Ctrl-C** is pressed. The exit code reports the outcome:
//!
//! | Code | Outcome |
//! |---|---|
//! | 0 | exact solution |
//! | 1 | error (bad scenario, bad settings, I/O) |
//! | 2 | timeout, cancellation or stop level reached |
//! | 3 | infeasible |

mod config;
mod scenario;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use colored::Colorize;
use quotient_bundle::ComponentFactory;
use quotient_graph::{PlannerData, SolutionPath};
use quotient_planner::{
    AnyOf, BundleLevel, CancellationFlag, GraphLevel, LevelSequence, Timeout, telemetry,
};
use quotient_section::SectionStats;
use quotient_types::PlannerStatus;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::Settings;
use crate::scenario::Scenario;

#[derive(Parser)]
#[command(
    name = "quotient",
    about = "Multilevel motion planning over sequences of quotient spaces",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan a path for a scenario file
    Solve {
        /// Path to the scenario TOML
        scenario: PathBuf,

        /// Wall-clock budget in seconds (overrides settings)
        #[arg(long)]
        timeout: Option<f64>,

        /// Seed for the level generators (overrides settings)
        #[arg(long)]
        seed: Option<u64>,

        /// Solve only the first N levels
        #[arg(long)]
        stop_level: Option<usize>,

        /// Settings file instead of ~/.quotient/config.toml
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the exported roadmaps as JSON to this path
        #[arg(long)]
        planner_data: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the effective planner settings
    Settings {
        /// Write the settings to ~/.quotient/config.toml
        #[arg(long)]
        init: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    let guard = telemetry::init_tracing("quotient");

    let code = match cli.command {
        Commands::Solve {
            scenario,
            timeout,
            seed,
            stop_level,
            config,
            planner_data,
            json,
        } => {
            let overrides = Overrides {
                timeout,
                seed,
                stop_level,
            };
            match run_solve(&scenario, config.as_deref(), overrides, planner_data.as_deref(), json) {
                Ok(status) => exit_code(status),
                Err(e) => {
                    eprintln!("{}: {}", "Error".red().bold(), e);
                    1
                }
            }
        }
        Commands::Settings { init } => match run_settings(init) {
            Ok(()) => 0,
            Err(e) => {
                eprintln!("{}: {}", "Config error".red().bold(), e);
                1
            }
        },
    };

    // `process::exit` skips destructors; flush spans first.
    drop(guard);
    std::process::exit(code);
}

fn exit_code(status: PlannerStatus) -> i32 {
    match status {
        PlannerStatus::ExactSolution => 0,
        PlannerStatus::ApproximateSolution | PlannerStatus::Timeout => 2,
        PlannerStatus::Infeasible => 3,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// solve
// ─────────────────────────────────────────────────────────────────────────────

/// Command-line values that win over the settings file.
struct Overrides {
    timeout: Option<f64>,
    seed: Option<u64>,
    stop_level: Option<usize>,
}

impl Overrides {
    fn apply(&self, settings: &mut Settings) {
        if let Some(t) = self.timeout {
            settings.timeout_secs = t.max(0.0);
        }
        if let Some(s) = self.seed {
            settings.level.seed = Some(s);
        }
        if let Some(k) = self.stop_level {
            settings.sequence.stop_level = Some(k);
        }
    }
}

fn run_solve(
    scenario_path: &Path,
    config_path: Option<&Path>,
    overrides: Overrides,
    planner_data_path: Option<&Path>,
    json: bool,
) -> Result<PlannerStatus, String> {
    let mut settings = config::resolve(config_path)?;
    overrides.apply(&mut settings);

    let scenario = Scenario::load(scenario_path)?;
    let spaces = scenario.build_spaces().map_err(|e| e.to_string())?;
    let mut planner = LevelSequence::from_spaces(
        spaces,
        &ComponentFactory::new(),
        &settings.level,
        settings.sequence.clone(),
    )
    .map_err(|e| e.to_string())?;
    planner
        .set_problem(scenario.start_state(), scenario.goal_state(), scenario.goal_threshold)
        .map_err(|e| e.to_string())?;

    let cancel = CancellationFlag::new();
    let cancel_handle = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        eprintln!();
        eprintln!("{}", "⚠  Ctrl-C received – stopping the planner …".yellow().bold());
        cancel_handle.cancel();
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; the planner can only stop on timeout");
    }
    let ptc = AnyOf::new()
        .with(Timeout::from_secs_f64(settings.timeout_secs))
        .with(cancel.clone());

    if !json {
        print_header(&scenario, &planner, &settings);
    }

    let started = Instant::now();
    let status = planner.solve(&ptc).map_err(|e| e.to_string())?;
    let elapsed = started.elapsed();
    info!(?status, elapsed_ms = elapsed.as_millis() as u64, "solve finished");

    let report = Report::new(&scenario, &planner, status, elapsed, cancel.is_cancelled());
    if json {
        let out = serde_json::to_string_pretty(&report)
            .map_err(|e| format!("Failed to serialize report: {}", e))?;
        println!("{out}");
    } else {
        print_report(&report);
    }

    if let Some(path) = planner_data_path {
        write_planner_data(&planner, path)?;
        if !json {
            println!("  Roadmaps written to {}", path.display().to_string().bold());
        }
    }
    Ok(status)
}

fn write_planner_data(planner: &LevelSequence<GraphLevel>, path: &Path) -> Result<(), String> {
    let mut data = PlannerData::new();
    planner.planner_data(&mut data).map_err(|e| e.to_string())?;
    let raw = serde_json::to_string_pretty(&data)
        .map_err(|e| format!("Failed to serialize planner data: {}", e))?;
    std::fs::write(path, raw).map_err(|e| format!("Failed to write {}: {}", path.display(), e))
}

// ─────────────────────────────────────────────────────────────────────────────
// Reports
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct Report {
    scenario: String,
    status: PlannerStatus,
    cancelled: bool,
    elapsed_ms: u128,
    levels: Vec<LevelReport>,
    solution: Option<SolutionPath>,
}

#[derive(Debug, Serialize)]
struct LevelReport {
    index: usize,
    space: String,
    vertices: usize,
    edges: usize,
    growth_steps: usize,
    solved: bool,
    infeasible: bool,
    solution_length: Option<f64>,
    section: Option<SectionStats>,
}

impl Report {
    fn new(
        scenario: &Scenario,
        planner: &LevelSequence<GraphLevel>,
        status: PlannerStatus,
        elapsed: Duration,
        cancelled: bool,
    ) -> Self {
        let levels = planner
            .levels()
            .iter()
            .enumerate()
            .map(|(i, level)| LevelReport {
                index: i,
                space: level.bundle_space().to_string(),
                vertices: level.roadmap().len(),
                edges: level.roadmap().edge_count(),
                growth_steps: planner.growth_counts()[i],
                solved: level.has_solution(),
                infeasible: level.is_infeasible(),
                solution_length: level
                    .problem()
                    .and_then(|p| p.best_solution())
                    .map(|s| s.length),
                section: level.section_stats().cloned(),
            })
            .collect();
        Self {
            scenario: scenario.display_name().to_string(),
            status,
            cancelled,
            elapsed_ms: elapsed.as_millis(),
            levels,
            solution: planner.problem().and_then(|p| p.best_solution()).cloned(),
        }
    }
}

fn print_header(scenario: &Scenario, planner: &LevelSequence<GraphLevel>, settings: &Settings) {
    println!();
    println!("  {} {}", "quotient".bold().cyan(), scenario.display_name().bold());
    println!(
        "  {} level(s), timeout {:.1}s, seed {}",
        planner.len(),
        settings.timeout_secs,
        settings
            .level
            .seed
            .map_or_else(|| "random".to_string(), |s| s.to_string())
    );
    println!();
}

fn print_report(report: &Report) {
    for level in &report.levels {
        let mark = if level.solved {
            "✓".green().bold()
        } else if level.infeasible {
            "✗".red().bold()
        } else {
            "·".dimmed()
        };
        let length = level
            .solution_length
            .map_or_else(|| "-".to_string(), |l| format!("{l:.3}"));
        println!(
            "  {} L{} {:<32} {:>6} vertices {:>6} edges {:>6} steps  length {}",
            mark, level.index, level.space, level.vertices, level.edges, level.growth_steps, length
        );
        if let Some(stats) = &level.section {
            println!(
                "        section: {} attempt(s), {} repair call(s), depth {}",
                stats.attempts,
                stats.repair_calls(),
                stats
                    .success_depth
                    .map_or_else(|| "-".to_string(), |d| d.to_string())
            );
        }
    }
    println!();

    let status = match report.status {
        PlannerStatus::ExactSolution => "exact solution".green().bold(),
        PlannerStatus::ApproximateSolution => "approximate solution".yellow().bold(),
        PlannerStatus::Timeout if report.cancelled => "cancelled".yellow().bold(),
        PlannerStatus::Timeout => "timeout".yellow().bold(),
        PlannerStatus::Infeasible => "infeasible".red().bold(),
    };
    println!("  Status: {} after {} ms", status, report.elapsed_ms);
    if let Some(solution) = &report.solution {
        println!(
            "  Path: {} waypoint(s), length {:.3} ({})",
            solution.states.len(),
            solution.length,
            solution.planner_name.dimmed()
        );
    }
    println!();
}

// ─────────────────────────────────────────────────────────────────────────────
// settings
// ─────────────────────────────────────────────────────────────────────────────

fn run_settings(init: bool) -> Result<(), String> {
    let settings = config::resolve(None)?;
    let raw = toml::to_string_pretty(&settings)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;
    println!("{raw}");
    if init {
        config::save(&settings)?;
        println!(
            "  {} Settings saved to {}",
            "✓".green().bold(),
            config::config_path().display().to_string().bold()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    const SCENARIO: &str = r#"
        name = "open square"
        start = [0.1, 0.1]
        goal = [0.9, 0.9]

        [[levels]]
        space = { kind = "real_vector", low = [0.0], high = [1.0] }

        [[levels]]
        space = { kind = "real_vector", low = [0.0, 0.0], high = [1.0, 1.0] }
    "#;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn solve_arguments_parse() {
        let cli = Cli::try_parse_from([
            "quotient", "solve", "s.toml", "--timeout", "2.5", "--seed", "7", "--stop-level", "1", "--json",
        ])
        .unwrap();
        match cli.command {
            Commands::Solve {
                scenario,
                timeout,
                seed,
                stop_level,
                json,
                ..
            } => {
                assert_eq!(scenario, PathBuf::from("s.toml"));
                assert_eq!(timeout, Some(2.5));
                assert_eq!(seed, Some(7));
                assert_eq!(stop_level, Some(1));
                assert!(json);
            }
            Commands::Settings { .. } => panic!("expected solve"),
        }
    }

    #[test]
    fn exit_codes_follow_status() {
        assert_eq!(exit_code(PlannerStatus::ExactSolution), 0);
        assert_eq!(exit_code(PlannerStatus::Timeout), 2);
        assert_eq!(exit_code(PlannerStatus::Infeasible), 3);
    }

    #[test]
    fn overrides_win_over_settings() {
        let mut settings = Settings::default();
        Overrides {
            timeout: Some(-1.0),
            seed: Some(3),
            stop_level: None,
        }
        .apply(&mut settings);
        assert_eq!(settings.timeout_secs, 0.0);
        assert_eq!(settings.level.seed, Some(3));
        assert_eq!(settings.sequence.stop_level, None);
    }

    #[test]
    fn report_covers_every_level() {
        let scenario = Scenario::parse(SCENARIO).unwrap();
        let mut settings = Settings::default();
        settings.level.seed = Some(5);
        let mut planner = LevelSequence::from_spaces(
            scenario.build_spaces().unwrap(),
            &ComponentFactory::new(),
            &settings.level,
            settings.sequence.clone(),
        )
        .unwrap();
        planner
            .set_problem(scenario.start_state(), scenario.goal_state(), scenario.goal_threshold)
            .unwrap();
        let status = planner.solve(&Timeout::from_secs_f64(5.0)).unwrap();

        let report = Report::new(&scenario, &planner, status, Duration::from_millis(3), false);
        assert_eq!(report.status, PlannerStatus::ExactSolution);
        assert_eq!(report.levels.len(), 2);
        assert!(report.levels.iter().all(|l| l.solved));
        assert!(report.solution.is_some());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "exact_solution");
        assert_eq!(json["scenario"], "open square");
    }

    #[test]
    fn planner_data_is_written_as_json() {
        let scenario = Scenario::parse(SCENARIO).unwrap();
        let mut settings = Settings::default();
        settings.level.seed = Some(5);
        let mut planner = LevelSequence::from_spaces(
            scenario.build_spaces().unwrap(),
            &ComponentFactory::new(),
            &settings.level,
            settings.sequence.clone(),
        )
        .unwrap();
        planner
            .set_problem(scenario.start_state(), scenario.goal_state(), scenario.goal_threshold)
            .unwrap();
        planner.solve(&Timeout::from_secs_f64(5.0)).unwrap();

        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("roadmaps.json");
        write_planner_data(&planner, &path).unwrap();
        let data: PlannerData = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(data.vertex_count() >= 4);
    }
}
