//! Territory Simulator CLI
//!
//! Run deterministic walking scenarios against the territory engine.

use clap::Parser;
use std::process::ExitCode;
use territory_core::{SessionState, TrackingConfig};
use territory_sim::scenarios::ScenarioId;
use territory_sim::{ScenarioResult, ScenarioRunner, SimError};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Territory Deterministic Simulation CLI
#[derive(Parser, Debug)]
#[command(name = "territory-sim")]
#[command(about = "Run deterministic walking scenarios for the territory engine", long_about = None)]
struct Args {
    /// Master seed for determinism (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Scenario to run (square_walk, noisy_square, figure_eight, narrow_loop,
    /// vehicle, jogging_spike, stationary_drift, short_walk, all)
    #[arg(short = 'S', long, default_value = "all")]
    scenario: String,

    /// Number of consecutive seeds to test (for CI mode)
    #[arg(long, default_value = "1")]
    seeds: usize,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output for CI parsing
    #[arg(long)]
    json: bool,

    /// Export ticks, fixes and the final snapshot to a JSON file
    #[arg(long)]
    export: Option<String>,

    /// Tracking config JSON (missing fields use defaults)
    #[arg(long)]
    config: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging (RUST_LOG overrides --verbose)
    let level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {e}");
    }

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{e}");
            ExitCode::from(2)
        }
    }
}

/// Returns whether every scenario run passed.
fn run(args: &Args) -> Result<bool, SimError> {
    if !args.json {
        info!("Territory Simulator v{}", env!("CARGO_PKG_VERSION"));
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    let config = load_config(args.config.as_deref())?;
    let scenarios = parse_scenarios(&args.scenario)?;

    // Determine base seed
    let base_seed = if args.seed == 0 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(42)
    } else {
        args.seed
    };

    // Handle --export mode: a single scenario, a single seed
    if let Some(export_path) = &args.export {
        if scenarios.len() > 1 {
            return Err(SimError::Usage(
                "--export only supports a single scenario, not 'all'".to_string(),
            ));
        }
        let runner = ScenarioRunner::new(base_seed).with_config(config);
        let (result, export) = runner.run_with_export(scenarios[0]);

        export
            .write_to_file(export_path)
            .map_err(|source| SimError::Io {
                path: export_path.clone(),
                source,
            })?;
        info!("Exported {} frames to {}", export.frames.len(), export_path);

        report(&result, args.json);
        return Ok(result.passed);
    }

    // Run simulations
    let mut all_results: Vec<ScenarioResult> = Vec::new();
    for seed_offset in 0..args.seeds {
        let seed = base_seed.wrapping_add(seed_offset as u64);
        let runner = ScenarioRunner::new(seed).with_config(config.clone());

        for scenario in &scenarios {
            let result = runner.run(*scenario);
            if !args.json {
                report(&result, false);
            }
            all_results.push(result);
        }
    }

    // Summary
    let total = all_results.len();
    let failed: Vec<&ScenarioResult> = all_results.iter().filter(|r| !r.passed).collect();

    if args.json {
        let summary = serde_json::json!({
            "total": total,
            "passed": total - failed.len(),
            "failed": failed.len(),
            "results": all_results.iter().map(result_json).collect::<Vec<_>>(),
        });
        match serde_json::to_string_pretty(&summary) {
            Ok(text) => println!("{text}"),
            Err(e) => error!("Failed to render summary: {e}"),
        }
    } else {
        info!("");
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        if failed.is_empty() {
            info!("✅ All {} scenario runs passed!", total);
        } else {
            error!("❌ {}/{} scenario runs failed!", failed.len(), total);
            for result in &failed {
                error!(
                    "  - {} seed={}: {}",
                    result.scenario.name(),
                    result.seed,
                    result.failure_reason.as_deref().unwrap_or("unknown")
                );
            }
        }
    }

    Ok(failed.is_empty())
}

fn load_config(path: Option<&str>) -> Result<TrackingConfig, SimError> {
    let Some(path) = path else {
        return Ok(TrackingConfig::default());
    };
    let text = std::fs::read_to_string(path).map_err(|source| SimError::Io {
        path: path.to_string(),
        source,
    })?;
    Ok(TrackingConfig::from_json_str(&text)?)
}

fn parse_scenarios(name: &str) -> Result<Vec<ScenarioId>, SimError> {
    if name == "all" {
        return Ok(ScenarioId::all());
    }
    name.parse::<ScenarioId>()
        .map(|scenario| vec![scenario])
        .map_err(SimError::UnknownScenario)
}

fn report(result: &ScenarioResult, json: bool) {
    if json {
        match serde_json::to_string_pretty(&result_json(result)) {
            Ok(text) => println!("{text}"),
            Err(e) => error!("Failed to render result: {e}"),
        }
        return;
    }
    if result.passed {
        info!("✓ {} (seed={}) PASSED", result.scenario.name(), result.seed);
    } else {
        error!(
            "✗ {} (seed={}) FAILED: {}",
            result.scenario.name(),
            result.seed,
            result.failure_reason.as_deref().unwrap_or("unknown")
        );
    }
}

fn result_json(r: &ScenarioResult) -> serde_json::Value {
    let verdict = match &r.final_state {
        SessionState::Closed(verdict) => Some(verdict.describe()),
        _ => None,
    };
    serde_json::json!({
        "scenario": r.scenario.name(),
        "seed": r.seed,
        "passed": r.passed,
        "ticks": r.total_ticks,
        "time_secs": r.final_time_secs,
        "points": r.final_points,
        "state": r.final_state,
        "verdict": verdict,
        "speed_warnings": r.metrics.speed_warnings,
        "failure_reason": r.failure_reason,
    })
}
