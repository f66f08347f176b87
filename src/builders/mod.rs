//! MIP Builder: five variants sharing one `mip::Program` IR and one
//! `solver::MipSolver` seam. Each submodule is grounded on one
//! script from the original `DOBSS`/`switch_cost_DOBSS`/
//! `ResourcesHomogeneousScheduleSingleton` sources (see DESIGN.md).

pub mod cost;
pub mod milp;
pub mod sched;
pub mod ur;
pub mod wtf;
