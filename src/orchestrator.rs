//! Orchestrator: turns one or more MIP Builder/Solver Adapter
//! calls, plus a Marginal Decomposer pass where the scenario calls for
//! one, into the three top-level analyses the CLI exposes.
//!
//! O-SCHED and O-WTF fan out across independent hypotheses. The
//! original shelled out to Gurobi once per hypothesis sequentially;
//! this crate keeps the same "one MIP per hypothesis" shape but runs
//! the fan-out across `std::thread` scoped threads rather than serial
//! subprocess calls, since each hypothesis's builder/solve
//! pair touches no shared state.

use ndarray::Array2;
use ordered_float::OrderedFloat;

use crate::builders::{milp, sched, ur, wtf};
use crate::decompose::{self, ConstraintStructure, Decomposition};
use crate::error::Error;
use crate::game::{GameModel, ScheduleGame};
use crate::mip::VarHandle;
use crate::solver::{Config, MipSolver, SolveOutcome};

/// Result of O-MIX: a direct B-MILP/B-COST solve, no decomposition
/// step (the defender's strategy is already a marginal over pure
/// actions, not a marginal over schedules).
pub struct MixResult {
    pub objective: f64,
    pub defender_strategy: Vec<f64>,
}

/// Result of O-SCHED: the best per-target hypothesis, its marginal
/// coverage probabilities, and the decomposition into pure schedules.
pub struct SchedResult {
    pub attacked_target: usize,
    pub objective: f64,
    pub marginal: Array2<f64>,
    pub decomposition: Decomposition,
}

/// Result of O-WTF: every excluded-attack combination tried, ranked
/// by objective value, ties preserved in input order.
pub struct WtfResult {
    pub ranked: Vec<(Vec<String>, f64)>,
}

/// O-MIX: solve the base or cost-augmented MILP directly with
/// `solver` and report the defender's mixed strategy.
pub fn run_mix(game: &GameModel, solver: &dyn MipSolver, config: &Config) -> Result<MixResult, Error> {
    let (program, handles) = milp::build(game);
    match solver.solve(&program, config) {
        SolveOutcome::Optimal { objective, values } => Ok(MixResult {
            objective,
            defender_strategy: extract(&handles.x, &values),
        }),
        SolveOutcome::Infeasible => Err(Error::SolverInfeasible { detail: "B-MILP has no feasible mixed strategy".into() }),
        SolveOutcome::Unbounded => Err(Error::SolverUnbounded),
        SolveOutcome::Limit => Err(Error::SolverLimit { incomplete: true }),
    }
}

/// O-MIX for the switching-cost variant.
pub fn run_cost(game: &GameModel, alpha: f64, solver: &dyn MipSolver, config: &Config) -> Result<MixResult, Error> {
    let (program, handles) = crate::builders::cost::build(game, alpha);
    match solver.solve(&program, config) {
        SolveOutcome::Optimal { objective, values } => Ok(MixResult {
            objective,
            defender_strategy: extract(&handles.base.x, &values),
        }),
        SolveOutcome::Infeasible => Err(Error::SolverInfeasible { detail: "B-COST has no feasible mixed strategy".into() }),
        SolveOutcome::Unbounded => Err(Error::SolverUnbounded),
        SolveOutcome::Limit => Err(Error::SolverLimit { incomplete: true }),
    }
}

/// O-UR: the uniform-randomization baseline, for comparison against
/// O-MIX's optimized defender strategy.
pub fn run_ur(game: &GameModel, solver: &dyn MipSolver, config: &Config) -> Result<f64, Error> {
    let (program, _handles) = ur::build(game);
    match solver.solve(&program, config) {
        SolveOutcome::Optimal { objective, .. } => Ok(objective),
        SolveOutcome::Infeasible => Err(Error::SolverInfeasible { detail: "B-UR has no feasible attacker response".into() }),
        SolveOutcome::Unbounded => Err(Error::SolverUnbounded),
        SolveOutcome::Limit => Err(Error::SolverLimit { incomplete: true }),
    }
}

/// O-SCHED: solve B-SCHED once per hypothesized attacked target (in
/// parallel), keep the hypothesis with the best defender objective,
/// then decompose its marginal coverage matrix into pure schedules.
pub fn run_sched(game: &ScheduleGame, solver: &dyn MipSolver, config: &Config) -> Result<SchedResult, Error> {
    let outcomes: Vec<Result<(f64, Array2<f64>), Error>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..game.targets)
            .map(|t| {
                scope.spawn(move || {
                    let (program, handles) = sched::build(game, t);
                    match solver.solve(&program, config) {
                        SolveOutcome::Optimal { objective, values } => {
                            let mp = marginal_matrix(&handles.mp, &values, game.resources, game.targets);
                            Ok((objective, mp))
                        }
                        SolveOutcome::Infeasible => Err(Error::SolverInfeasible {
                            detail: format!("B-SCHED infeasible for target {t}"),
                        }),
                        SolveOutcome::Unbounded => Err(Error::SolverUnbounded),
                        SolveOutcome::Limit => Err(Error::SolverLimit { incomplete: true }),
                    }
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().expect("sched worker panicked")).collect()
    });

    let mut best: Option<(usize, f64, Array2<f64>)> = None;
    for (t, outcome) in outcomes.into_iter().enumerate() {
        let (objective, mp) = outcome?;
        let better = match &best {
            None => true,
            Some((_, best_obj, _)) => OrderedFloat(objective) > OrderedFloat(*best_obj),
        };
        if better {
            best = Some((t, objective, mp));
        }
    }
    let (attacked_target, objective, marginal) = best.ok_or(Error::SolverInfeasible {
        detail: "no target hypothesis produced a feasible schedule".into(),
    })?;

    let mut structure = ConstraintStructure::default();
    for r in 0..game.resources {
        let row: std::collections::BTreeSet<(usize, usize)> = (0..game.targets).map(|t| (r, t)).collect();
        structure.push(row, 1.0, 1.0);
    }
    for t in 0..game.targets {
        let col: std::collections::BTreeSet<(usize, usize)> = (0..game.resources).map(|r| (r, t)).collect();
        structure.push(col, 0.0, 1.0);
    }
    let decomposition = decompose::decompose(&marginal, &structure)?;

    Ok(SchedResult { attacked_target, objective, marginal, decomposition })
}

/// O-WTF: solve B-WTF once per candidate excluded-attack combination
/// (in parallel), rank by objective descending, ties kept in the
/// order `combinations` lists them.
pub fn run_wtf(
    game: &GameModel,
    combinations: &[Vec<String>],
    solver: &dyn MipSolver,
    config: &Config,
) -> Result<WtfResult, Error> {
    // An infeasible exclusion combination is recorded as -inf rather
    // than aborting the whole run: excluding enough attacks
    // can legitimately leave an attacker type with no pure response.
    let objectives: Vec<f64> = std::thread::scope(|scope| {
        let handles: Vec<_> = combinations
            .iter()
            .map(|patched| {
                scope.spawn(move || {
                    let (program, _handles) = wtf::build(game, patched);
                    match solver.solve(&program, config) {
                        SolveOutcome::Optimal { objective, .. } => objective,
                        SolveOutcome::Infeasible => f64::NEG_INFINITY,
                        SolveOutcome::Unbounded => f64::INFINITY,
                        SolveOutcome::Limit => f64::NEG_INFINITY,
                    }
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().expect("wtf worker panicked")).collect()
    });

    let mut ranked: Vec<(Vec<String>, f64)> = combinations.iter().cloned().zip(objectives).collect();
    ranked.sort_by_key(|(_, obj)| std::cmp::Reverse(OrderedFloat(*obj)));

    Ok(WtfResult { ranked })
}

fn extract(vars: &[VarHandle], values: &std::collections::HashMap<VarHandle, f64>) -> Vec<f64> {
    vars.iter().map(|h| values.get(h).copied().unwrap_or(0.0)).collect()
}

fn marginal_matrix(
    mp: &[Vec<VarHandle>],
    values: &std::collections::HashMap<VarHandle, f64>,
    resources: usize,
    targets: usize,
) -> Array2<f64> {
    Array2::from_shape_fn((resources, targets), |(r, t)| values.get(&mp[r][t]).copied().unwrap_or(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::AttackerType;
    use crate::solver::GoodLpSolver;
    use ndarray::Array2 as A2;

    fn s1_game() -> GameModel {
        GameModel {
            defender_actions: 2,
            attacker_types: vec![
                AttackerType {
                    prior: 0.5,
                    attack_names: vec!["a1".into(), "a2".into()],
                    rewards: A2::from_shape_vec((2, 2), vec![8.0, 6.0, 7.0, 2.0]).unwrap(),
                    attacker_rewards: A2::from_shape_vec((2, 2), vec![2.0, 0.0, 0.0, 6.0]).unwrap(),
                },
                AttackerType {
                    prior: 0.5,
                    attack_names: vec!["b1".into(), "b2".into()],
                    rewards: A2::from_shape_vec((2, 2), vec![5.0, 4.0, 4.0, 5.0]).unwrap(),
                    attacker_rewards: A2::from_shape_vec((2, 2), vec![0.0, 2.0, 2.0, 0.0]).unwrap(),
                },
            ],
            switching_cost: None,
        }
    }

    #[test]
    fn run_mix_returns_a_valid_mixed_strategy() {
        let game = s1_game();
        let result = run_mix(&game, &GoodLpSolver, &Config::default()).expect("should solve");
        let sum: f64 = result.defender_strategy.iter().sum();
        assert!((sum - 1.0).abs() < 1e-4);
    }

    #[test]
    fn run_wtf_ranks_by_objective() {
        let game = s1_game();
        let combos = vec![vec![], vec!["a1".to_string()]];
        let result = run_wtf(&game, &combos, &GoodLpSolver, &Config::default()).expect("should solve");
        assert_eq!(result.ranked.len(), 2);
    }
}
