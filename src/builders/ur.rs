//! B-UR: the uniform-randomization baseline, grounded on
//! the original's `BSG_vs_UR.py`. The defender's mixed strategy is
//! pinned to `x[i] = 1/X`; with `x` fixed, the attacker's best
//! response is a plain (no McCormick needed) linear program over the
//! `q`/`a` variables.

use std::collections::BTreeMap;

use crate::game::GameModel;
use crate::mip::{Program, Sense, VarHandle};

/// Handles for a B-UR program: one pure-strategy indicator per
/// attack, per attacker type.
pub struct UrHandles {
    pub q: Vec<Vec<VarHandle>>,
    pub a: Vec<VarHandle>,
}

pub fn build(game: &GameModel) -> (Program, UrHandles) {
    let mut p = Program::new(Sense::Maximize);
    let big_m = game.big_m();
    let n = game.defender_actions;
    let xr = 1.0 / n as f64;

    let mut q = Vec::with_capacity(game.attacker_types.len());
    let mut a = Vec::with_capacity(game.attacker_types.len());

    for (l, ty) in game.attacker_types.iter().enumerate() {
        let q_l: Vec<VarHandle> = ty
            .attack_names
            .iter()
            .enumerate()
            .map(|(j, name)| p.add_binary(format!("{l}-{name}-{j}")))
            .collect();
        p.add_eq(format!("pure-response-{l}"), q_l.iter().map(|&h| (h, 1.0)), 1.0);

        let a_l = p.add_free(format!("a-{l}"));

        for (j, &qj) in q_l.iter().enumerate() {
            // Defender strategy is a constant here, so there's no
            // McCormick term: the reward contribution is linear in
            // q[j] directly.
            let expected_reward: f64 = (0..n).map(|i| xr * ty.rewards[(i, j)]).sum();
            p.add_objective_term(qj, ty.prior * expected_reward);

            let expected_attacker_reward: f64 = (0..n).map(|i| xr * ty.attacker_rewards[(i, j)]).sum();
            p.add_ge(format!("dominance-lb-{l}-{j}"), [(a_l, 1.0)], expected_attacker_reward);

            let mut terms: BTreeMap<VarHandle, f64> = BTreeMap::new();
            terms.insert(a_l, 1.0);
            terms.insert(qj, big_m);
            p.add_le(format!("dominance-ub-{l}-{j}"), terms, expected_attacker_reward + big_m);
        }

        q.push(q_l);
        a.push(a_l);
    }

    (p, UrHandles { q, a })
}
