//! A Bayesian Stackelberg Security Game (BSSG) solver: given a
//! defender's set of pure configurations (or a pool of homogeneous
//! resources to assign across targets) and a prior over attacker
//! types that each best-respond to the defender's committed mixed
//! strategy, compute the defender's optimal randomization.
//!
//! Five builders reduce a [`game::GameModel`] (or [`game::ScheduleGame`])
//! to a solver-agnostic [`mip::Program`]:
//!
//! - [`builders::milp`] — the base DOBSS formulation
//! - [`builders::cost`] — DOBSS plus a configuration-switching cost
//! - [`builders::sched`] — the homogeneous-resource singleton-schedule
//!   variant, one program per attacked-target hypothesis
//! - [`builders::wtf`] — DOBSS with a set of attacks excluded, for
//!   "what should I patch" counterfactual analysis
//! - [`builders::ur`] — the uniform-randomization baseline
//!
//! [`solver::MipSolver`] hands a `Program` to a concrete backend
//! ([`solver::GoodLpSolver`], built on `good_lp`'s `microlp`).
//! [`decompose`] turns a fractional marginal-coverage matrix into a
//! sampleable distribution over integral basis matrices via
//! constrained Birkhoff-von Neumann decomposition.
//! [`orchestrator`] ties builders, solver, and decomposer together
//! into the three top-level analyses (O-MIX, O-SCHED, O-WTF) the
//! [`bssg` CLI](../bin/bssg.rs) exposes.

pub mod builders;
pub mod decompose;
pub mod error;
pub mod game;
pub mod input;
pub mod mip;
pub mod orchestrator;
pub mod report;
pub mod solver;
