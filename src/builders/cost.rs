//! B-COST: the switching-cost-augmented DOBSS formulation (spec
//! §4.2), grounded on the original's `cost_BSG_miqp.py`. The original
//! solves this as a genuine MIQP (`x[i] * q[j]` and `x[i] * x[j]` in
//! the objective/constraints); this builder linearizes both bilinear
//! products with McCormick envelopes so the whole program stays
//! inside the `mip::Program` IR.

use std::collections::BTreeMap;

use crate::builders::milp::MilpHandles;
use crate::game::GameModel;
use crate::mip::{Program, Sense, VarHandle};

/// Handles for a B-COST program: the base DOBSS variables plus the
/// `w[i][j]` transition-cost variables (`w[i][j] = x[i] * x[j]`).
pub struct CostHandles {
    pub base: MilpHandles,
    pub w: Vec<Vec<VarHandle>>,
}

/// Build the switching-cost MILP for a given weight `alpha` on the
/// expected transition cost.
pub fn build(game: &GameModel, alpha: f64) -> (Program, CostHandles) {
    let mut p = Program::new(Sense::Maximize);
    let big_m = game.big_m();
    let cost = game
        .switching_cost
        .as_ref()
        .expect("B-COST requires a switching-cost matrix");
    let n = game.defender_actions;

    let x: Vec<VarHandle> = (0..n).map(|i| p.add_continuous(format!("x-{i}"), 0.0, 1.0)).collect();
    p.add_eq("defender-simplex", x.iter().map(|&h| (h, 1.0)), 1.0);

    // Transition variables w[i][j] = x[i] * x[j], McCormick-linearized
    // (original: "from_config_constr"/"to_config_constr" rows).
    let mut w: Vec<Vec<VarHandle>> = Vec::with_capacity(n);
    let mut row_terms: Vec<Vec<(VarHandle, f64)>> = vec![Vec::new(); n];
    let mut col_terms: Vec<Vec<(VarHandle, f64)>> = vec![Vec::new(); n];
    let mut total_terms: Vec<(VarHandle, f64)> = Vec::new();

    for i in 0..n {
        let mut w_i = Vec::with_capacity(n);
        for j in 0..n {
            let wij = p.add_continuous(format!("w-{i}-{j}"), 0.0, 1.0);
            if i == j {
                p.add_eq(format!("w-diag-{i}"), vec![(wij, 1.0)], 0.0);
            } else {
                p.add_ge(format!("w-lb-{i}-{j}"), vec![(wij, 1.0), (x[i], -1.0), (x[j], -1.0)], -1.0);
                p.add_le(format!("w-ub1-{i}-{j}"), vec![(wij, 1.0), (x[i], -1.0)], 0.0);
                p.add_le(format!("w-ub2-{i}-{j}"), vec![(wij, 1.0), (x[j], -1.0)], 0.0);
            }
            row_terms[i].push((wij, 1.0));
            col_terms[j].push((wij, 1.0));
            total_terms.push((wij, 1.0));
            p.add_objective_term(wij, -alpha * cost[(i, j)]);
            w_i.push(wij);
        }
        w.push(w_i);
    }
    for i in 0..n {
        let mut row = row_terms[i].clone();
        row.push((x[i], -1.0));
        p.add_eq(format!("w-row-{i}"), row, 0.0);
        let mut col = col_terms[i].clone();
        col.push((x[i], -1.0));
        p.add_eq(format!("w-col-{i}"), col, 0.0);
    }
    p.add_eq("w-total", total_terms, 1.0);

    let mut q = Vec::with_capacity(game.attacker_types.len());
    let mut z = Vec::with_capacity(game.attacker_types.len());
    let mut a = Vec::with_capacity(game.attacker_types.len());

    for (l, ty) in game.attacker_types.iter().enumerate() {
        let q_l: Vec<Option<VarHandle>> = ty
            .attack_names
            .iter()
            .enumerate()
            .map(|(j, name)| Some(p.add_binary(format!("{l}-{name}-{j}"))))
            .collect();
        p.add_eq(
            format!("pure-response-{l}"),
            q_l.iter().map(|h| (h.unwrap(), 1.0)).collect::<Vec<_>>(),
            1.0,
        );

        let z_l: Vec<Vec<Option<VarHandle>>> = (0..n)
            .map(|i| {
                q_l.iter()
                    .map(|qj| {
                        let qj = qj.unwrap();
                        let zij = p.add_continuous(format!("z-{l}-{i}"), 0.0, 1.0);
                        p.add_le(format!("mccormick-z-ub1-{l}-{i}"), vec![(zij, 1.0), (x[i], -1.0)], 0.0);
                        p.add_le(format!("mccormick-z-ub2-{l}-{i}"), vec![(zij, 1.0), (qj, -1.0)], 0.0);
                        p.add_ge(
                            format!("mccormick-z-lb-{l}-{i}"),
                            vec![(zij, 1.0), (x[i], -1.0), (qj, -1.0)],
                            -1.0,
                        );
                        Some(zij)
                    })
                    .collect()
            })
            .collect();

        let a_l = p.add_free(format!("a-{l}"));

        for i in 0..n {
            for (j, zij) in z_l[i].iter().enumerate() {
                let zij = zij.unwrap();
                p.add_objective_term(zij, ty.prior * ty.rewards[(i, j)]);
            }
        }

        for (j, qj) in q_l.iter().enumerate() {
            let qj = qj.unwrap();
            let mut terms: BTreeMap<VarHandle, f64> = BTreeMap::new();
            terms.insert(a_l, 1.0);
            for i in 0..n {
                *terms.entry(x[i]).or_insert(0.0) -= ty.attacker_rewards[(i, j)];
            }
            p.add_ge(format!("dominance-lb-{l}-{j}"), terms.clone(), 0.0);
            terms.insert(qj, big_m);
            p.add_le(format!("dominance-ub-{l}-{j}"), terms, big_m);
        }

        q.push(q_l);
        z.push(z_l);
        a.push(a_l);
    }

    (
        p,
        CostHandles {
            base: MilpHandles { x, q, z, a },
            w,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::AttackerType;
    use ndarray::Array2;

    #[test]
    fn builds_with_switching_cost() {
        let game = GameModel {
            defender_actions: 2,
            attacker_types: vec![AttackerType {
                prior: 1.0,
                attack_names: vec!["a1".into(), "a2".into()],
                rewards: Array2::from_shape_vec((2, 2), vec![8.0, 6.0, 7.0, 2.0]).unwrap(),
                attacker_rewards: Array2::from_shape_vec((2, 2), vec![2.0, 0.0, 0.0, 6.0]).unwrap(),
            }],
            switching_cost: Some(Array2::from_shape_vec((2, 2), vec![0.0, 3.0, 3.0, 0.0]).unwrap()),
        };
        let (p, handles) = build(&game, 0.85);
        assert_eq!(handles.w.len(), 2);
        assert_eq!(handles.base.x.len(), 2);
        assert!(p.objective.values().any(|&c| c < 0.0));
    }
}
