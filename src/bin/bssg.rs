//! `bssg` CLI: one subcommand per engine, sharing
//! `--big-m`/`--eps`/`--time-limit-ms`/`--json` flags and the
//! `solver::GoodLpSolver` backend.

use std::fs;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::error;

use bssg_solver::input;
use bssg_solver::orchestrator;
use bssg_solver::report;
use bssg_solver::solver::{Config, GoodLpSolver};

#[derive(Parser)]
#[command(name = "bssg", about = "Bayesian Stackelberg Security Game solver")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Override the derived Big-M bound.
    #[arg(long, global = true)]
    big_m: Option<f64>,

    /// Numerical tolerance for decomposition/validation checks.
    #[arg(long, global = true, default_value_t = 1e-6)]
    eps: f64,

    /// Solver time limit in milliseconds (not yet honored by the
    /// `microlp` backend).
    #[arg(long, global = true)]
    time_limit_ms: Option<u64>,

    /// Emit a `serde_json`-serialized report instead of the raw block.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// B-MILP: solve the base DOBSS mixed strategy.
    Milp { input: String },
    /// B-COST: solve the switching-cost-augmented variant.
    Cost { input: String, alpha: f64 },
    /// B-SCHED/O-SCHED: solve the homogeneous-resource schedule game.
    Sched {
        input: String,
        /// Persist the winning marginal matrix as a `best_marg_prob`
        /// JSON artifact, for consumers that run decomposition as a
        /// separate step.
        #[arg(long)]
        save_artifact: Option<String>,
    },
    /// B-WTF/O-WTF: rank attack-exclusion combinations by best response.
    Wtf {
        input: String,
        /// Max number of attacks to exclude together.
        #[arg(long, default_value_t = 1)]
        k: usize,
    },
    /// B-UR: the uniform-randomization baseline.
    Ur { input: String },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    let config = Config { time_limit_ms: cli.time_limit_ms };
    let solver = GoodLpSolver;

    let result = run(&cli, &config, &solver);
    match result {
        Ok(output) => {
            print!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, config: &Config, solver: &GoodLpSolver) -> Result<String, bssg_solver::error::Error> {
    match &cli.command {
        Command::Milp { input: path } => {
            let text = read(path)?;
            let game = input::parse_game(&text)?;
            let result = orchestrator::run_mix(&game, solver, config)?;
            Ok(render_mix(&result, cli.json))
        }
        Command::Cost { input: path, alpha } => {
            let text = read(path)?;
            let game = input::parse_cost_game(&text)?;
            let result = orchestrator::run_cost(&game, *alpha, solver, config)?;
            Ok(render_mix(&result, cli.json))
        }
        Command::Sched { input: path, save_artifact } => {
            let text = read(path)?;
            let game = input::parse_schedule_game(&text)?;
            let result = orchestrator::run_sched(&game, solver, config)?;
            if let Some(artifact_path) = save_artifact {
                let artifact: report::BestMargProb = (&result).into();
                let json = serde_json::to_string_pretty(&artifact).unwrap();
                fs::write(artifact_path, json).map_err(|e| bssg_solver::error::Error::InputMalformed {
                    line: 0,
                    reason: format!("cannot write {artifact_path}: {e}"),
                })?;
            }
            if cli.json {
                let out: report::SchedReport = (&result).into();
                Ok(serde_json::to_string_pretty(&out).unwrap())
            } else {
                Ok(format!(
                    "attacked target: {}\nobjective: {:.6}\ncomponents: {}\n",
                    result.attacked_target,
                    result.objective,
                    result.decomposition.components.len()
                ))
            }
        }
        Command::Wtf { input: path, k } => {
            let text = read(path)?;
            let game = input::parse_game(&text)?;
            let attacks = game.unique_attack_names();
            let combos = combinations(&attacks, *k);
            let result = orchestrator::run_wtf(&game, &combos, solver, config)?;
            if cli.json {
                let out: report::WtfReport = (&result).into();
                Ok(serde_json::to_string_pretty(&out).unwrap())
            } else {
                Ok(report::print_wtf_table(&result).unwrap())
            }
        }
        Command::Ur { input: path } => {
            let text = read(path)?;
            let game = input::parse_game(&text)?;
            let objective = orchestrator::run_ur(&game, solver, config)?;
            Ok(report::print_raw(&[], objective))
        }
    }
}

fn render_mix(result: &orchestrator::MixResult, json: bool) -> String {
    if json {
        let out: report::MixReport = result.into();
        serde_json::to_string_pretty(&out).unwrap()
    } else {
        report::print_mix_table(result).unwrap()
    }
}

fn read(path: &str) -> Result<String, bssg_solver::error::Error> {
    fs::read_to_string(path).map_err(|e| bssg_solver::error::Error::InputMalformed {
        line: 0,
        reason: format!("cannot read {path}: {e}"),
    })
}

/// All size-`k` subsets of `items`, in input order — the original's
/// `itertools.combinations(attack_list, k)` enumeration order.
fn combinations(items: &[String], k: usize) -> Vec<Vec<String>> {
    let mut out = Vec::new();
    combinations_of_size(items, k, 0, &mut Vec::new(), &mut out);
    out
}

fn combinations_of_size(items: &[String], size: usize, start: usize, current: &mut Vec<String>, out: &mut Vec<Vec<String>>) {
    if current.len() == size {
        out.push(current.clone());
        return;
    }
    for i in start..items.len() {
        current.push(items[i].clone());
        combinations_of_size(items, size, i + 1, current, out);
        current.pop();
    }
}
