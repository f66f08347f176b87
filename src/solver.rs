//! Solver Adapter: a uniform interface from the
//! solver-agnostic `mip::Program` IR to a concrete MILP backend.
//!
//! `GoodLpSolver` is the concrete adapter, built on `good_lp`'s
//! pure-Rust `microlp` backend with `good_lp`'s own branch-and-bound
//! for the integer/binary variables every B-* builder introduces.
//! Unlike the original's shelled-out Gurobi/SCIP process, the call
//! here is in-process.

use std::collections::HashMap;

use good_lp::{variable, Expression, ProblemVariables, ResolutionError, Solution as GlpSolutionTrait, SolverModel};
use log::{info, warn};

use crate::mip::{Program, Sense, VarHandle, VarKind};

/// Tunables for a solve call. `time_limit_ms` is part of the adapter
/// contract, but the current `microlp` backend has no deadline hook to
/// honor it against. A future backend swap (e.g. a `coin_cbc` feature)
/// would wire it through here.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    pub time_limit_ms: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config { time_limit_ms: None }
    }
}

/// Outcome of a solve call: optimal with assignment,
/// infeasible, unbounded, or limit-truncated.
#[derive(Debug, Clone)]
pub enum SolveOutcome {
    Optimal {
        objective: f64,
        values: HashMap<VarHandle, f64>,
    },
    Infeasible,
    Unbounded,
    /// Time/iteration limit reached before a proof of optimality
    /// Never produced by `GoodLpSolver`
    /// today; reachable once a backend with a deadline is plugged in.
    Limit,
}

impl SolveOutcome {
    pub fn value(&self, var: VarHandle) -> Option<f64> {
        match self {
            SolveOutcome::Optimal { values, .. } => values.get(&var).copied(),
            _ => None,
        }
    }
}

/// Uniform interface to any MILP backend. `Send + Sync` so the
/// Orchestrator can share one solver across the scoped-thread
/// fan-out in O-SCHED/O-WTF.
pub trait MipSolver: Send + Sync {
    fn solve(&self, program: &Program, config: &Config) -> SolveOutcome;
}

/// The default in-process adapter, backed by `good_lp` + `microlp`.
#[derive(Debug, Default, Clone, Copy)]
pub struct GoodLpSolver;

impl MipSolver for GoodLpSolver {
    fn solve(&self, program: &Program, _config: &Config) -> SolveOutcome {
        let mut vars = ProblemVariables::new();
        let mut handles = Vec::with_capacity(program.variables.len());
        for v in &program.variables {
            let mut def = variable().min(v.lb).max(v.ub);
            if matches!(v.kind, VarKind::Integer | VarKind::Binary) {
                def = def.integer();
            }
            handles.push(vars.add(def));
        }

        let objective: Expression = program
            .objective
            .iter()
            .map(|(h, coef)| handles[h.0] * *coef)
            .sum();

        let unsolved = match program.sense {
            Sense::Maximize => vars.maximise(objective),
            Sense::Minimize => vars.minimise(objective),
        };
        let mut model = unsolved.using(good_lp::microlp);

        for c in &program.constraints {
            let lhs: Expression = c.terms.iter().map(|(h, coef)| handles[h.0] * *coef).sum();
            if (c.lo - c.hi).abs() < f64::EPSILON {
                model = model.with(lhs.eq(c.hi));
            } else {
                if c.lo > f64::NEG_INFINITY {
                    model = model.with(lhs.clone().geq(c.lo));
                }
                if c.hi < f64::INFINITY {
                    model = model.with(lhs.leq(c.hi));
                }
            }
        }

        info!(
            "solving MIP: {} vars, {} constraints",
            program.num_vars(),
            program.constraints.len()
        );

        match model.solve() {
            Ok(solution) => {
                let values: HashMap<VarHandle, f64> = program
                    .variables
                    .iter()
                    .enumerate()
                    .map(|(i, _)| (VarHandle(i), solution.value(handles[i])))
                    .collect();
                let objective_value: f64 = program
                    .objective
                    .iter()
                    .map(|(h, coef)| coef * values[h])
                    .sum();
                SolveOutcome::Optimal {
                    objective: objective_value,
                    values,
                }
            }
            Err(ResolutionError::Infeasible) => SolveOutcome::Infeasible,
            Err(ResolutionError::Unbounded) => SolveOutcome::Unbounded,
            Err(ResolutionError::Other(msg)) => {
                warn!("solver error: {msg}");
                SolveOutcome::Infeasible
            }
            #[allow(unreachable_patterns)]
            Err(e) => {
                warn!("solver error: {:?}", e);
                SolveOutcome::Infeasible
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mip::Program;

    #[test]
    fn solves_trivial_lp() {
        let mut p = Program::new(Sense::Maximize);
        let x = p.add_continuous("x", 0.0, 1.0);
        p.add_objective_term(x, 1.0);
        p.add_le("cap", vec![(x, 1.0)], 1.0);

        let outcome = GoodLpSolver.solve(&p, &Config::default());
        match outcome {
            SolveOutcome::Optimal { objective, .. } => {
                assert!((objective - 1.0).abs() < 1e-6);
            }
            _ => panic!("expected optimal"),
        }
    }

    #[test]
    fn detects_infeasible() {
        let mut p = Program::new(Sense::Maximize);
        let x = p.add_continuous("x", 0.0, 1.0);
        p.add_objective_term(x, 1.0);
        p.add_ge("lo", vec![(x, 1.0)], 2.0);
        p.add_le("hi", vec![(x, 1.0)], 1.0);

        let outcome = GoodLpSolver.solve(&p, &Config::default());
        assert!(matches!(outcome, SolveOutcome::Infeasible));
    }
}
