//! Typed error kinds for the solver pipeline.
//!
//! Every engine returns `Result<_, Error>` rather than panicking or
//! retrying internally; the Orchestrator decides whether a given
//! error aborts the run or is recorded and skipped.

use thiserror::Error;

/// The error kinds an engine in this crate can raise.
#[derive(Debug, Error)]
pub enum Error {
    /// Input file structurally inconsistent with its own declared
    /// counts (§7 `INPUT_MALFORMED`). Always fatal, always raised
    /// before any solve is attempted.
    #[error("malformed input at line {line}: {reason}")]
    InputMalformed { line: usize, reason: String },

    /// The underlying MIP has no feasible solution (§7
    /// `SOLVER_INFEASIBLE`).
    #[error("solver reported infeasible: {detail}")]
    SolverInfeasible { detail: String },

    /// The underlying MIP solve hit a time/iteration limit before
    /// proving optimality (§7 `SOLVER_LIMIT`). `incomplete` mirrors
    /// spec's requirement to propagate a partial result flag.
    #[error("solver hit its limit before proving optimality")]
    SolverLimit { incomplete: bool },

    /// The MIP was reported unbounded by the backend.
    #[error("solver reported the program unbounded")]
    SolverUnbounded,

    /// The decomposer's constraint family does not admit a
    /// partition into two laminar families (§7 `NOT_BIHIERARCHY`).
    #[error("constraint structure is not a bihierarchy")]
    NotBihierarchy,

    /// The input matrix violates a constrained cell-set's capacity
    /// interval before any decomposition work starts (§7
    /// `CAPACITY_VIOLATION`).
    #[error("matrix violates capacity [{lo}, {hi}] on cell set (sum = {sum})")]
    CapacityViolation { lo: f64, hi: f64, sum: f64 },

    /// The decomposition's reconstructed sum diverges from the input
    /// matrix by more than `10 * eps` (§7 `NUMERICAL_DRIFT`, fatal
    /// tier; the warning tier is logged, not returned).
    #[error("decomposition drift {drift} exceeds 10x tolerance {eps}")]
    NumericalDrift { drift: f64, eps: f64 },
}

pub type Result<T> = std::result::Result<T, Error>;
