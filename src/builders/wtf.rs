//! B-WTF: the "what to fix" variant, grounded on the
//! original's `whatToFix.py`. Identical to B-MILP except a supplied
//! set of patched attacks is excluded from every attacker type's
//! `q`/`z` variables before the program is built.

use crate::builders::milp::{build_core, MilpHandles};
use crate::game::GameModel;
use crate::mip::Program;

/// Build the MILP with every attack whose name contains one of
/// `patched` (a substring match, matching the original's
/// `isAttackValid`) excluded from the attacker's pure-strategy space.
pub fn build(game: &GameModel, patched: &[String]) -> (Program, MilpHandles) {
    build_core(game, |_l, name| !patched.iter().any(|p| name.contains(p.as_str())))
}
