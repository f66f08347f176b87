//! B-MILP: the base DOBSS formulation, plus the shared core that
//! B-WTF reuses with an attack-validity predicate.

use std::collections::BTreeMap;

use crate::game::GameModel;
use crate::mip::{Program, Sense, VarHandle};

/// Typed handles into a B-MILP/B-WTF program, replacing the
/// original's string-keyed variable lookup. `q`/`z` use
/// `Option` so B-WTF can mark an excluded attack's slot as absent
/// without renumbering every other attack.
pub struct MilpHandles {
    /// `x[i]`.
    pub x: Vec<VarHandle>,
    /// `q[l][j]`.
    pub q: Vec<Vec<Option<VarHandle>>>,
    /// `z[l][i][j]`.
    pub z: Vec<Vec<Vec<Option<VarHandle>>>>,
    /// `a[l]`.
    pub a: Vec<VarHandle>,
}

/// Build the DOBSS MILP, keeping only attacks for which `is_valid(l,
/// attack_name)` holds. B-MILP calls this with an always-true
/// predicate; B-WTF calls it with its substring-exclusion rule.
pub fn build_core(game: &GameModel, is_valid: impl Fn(usize, &str) -> bool) -> (Program, MilpHandles) {
    let mut p = Program::new(Sense::Maximize);
    let big_m = game.big_m();

    let x: Vec<VarHandle> = (0..game.defender_actions)
        .map(|i| p.add_continuous(format!("x-{i}"), 0.0, 1.0))
        .collect();
    p.add_eq("defender-simplex", x.iter().map(|&h| (h, 1.0)), 1.0);

    let mut q = Vec::with_capacity(game.attacker_types.len());
    let mut z = Vec::with_capacity(game.attacker_types.len());
    let mut a = Vec::with_capacity(game.attacker_types.len());

    for (l, ty) in game.attacker_types.iter().enumerate() {
        let q_l: Vec<Option<VarHandle>> = ty
            .attack_names
            .iter()
            .enumerate()
            .map(|(j, name)| {
                if is_valid(l, name) {
                    Some(p.add_binary(format!("{l}-{name}")))
                } else {
                    None
                }
            })
            .collect();

        let pure_response_terms: Vec<(VarHandle, f64)> =
            q_l.iter().filter_map(|h| h.map(|h| (h, 1.0))).collect();
        p.add_eq(format!("pure-response-{l}"), pure_response_terms, 1.0);

        let z_l: Vec<Vec<Option<VarHandle>>> = (0..game.defender_actions)
            .map(|i| {
                q_l.iter()
                    .enumerate()
                    .map(|(j, qj)| {
                        qj.map(|qj| {
                            let zij = p.add_continuous(format!("z-{l}-{i}-{j}"), 0.0, 1.0);
                            // McCormick envelope for z = x_i * q_j.
                            p.add_le(format!("mccormick-z-ub1-{l}-{i}-{j}"), vec![(zij, 1.0), (x[i], -1.0)], 0.0);
                            p.add_le(format!("mccormick-z-ub2-{l}-{i}-{j}"), vec![(zij, 1.0), (qj, -1.0)], 0.0);
                            p.add_ge(
                                format!("mccormick-z-lb-{l}-{i}-{j}"),
                                vec![(zij, 1.0), (x[i], -1.0), (qj, -1.0)],
                                -1.0,
                            );
                            zij
                        })
                    })
                    .collect()
            })
            .collect();

        let a_l = p.add_free(format!("a-{l}"));

        // Objective: sum_i sum_j p_l * R_l[i][j] * z[l][i][j].
        for i in 0..game.defender_actions {
            for (j, zij) in z_l[i].iter().enumerate() {
                if let Some(zij) = zij {
                    let coef = ty.prior * ty.rewards[(i, j)];
                    p.add_objective_term(*zij, coef);
                }
            }
        }

        // Attacker dominance (big-M), one pair of constraints per
        // surviving attack j: a_l - U_l(j) >= 0, a_l - U_l(j) <= (1-q_j)*M.
        for (j, qj) in q_l.iter().enumerate() {
            let qj = match qj {
                Some(h) => *h,
                None => continue,
            };
            let mut terms: BTreeMap<VarHandle, f64> = BTreeMap::new();
            terms.insert(a_l, 1.0);
            for i in 0..game.defender_actions {
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

    (p, MilpHandles { x, q, z, a })
}

/// Build the base DOBSS MILP: no attack exclusions.
pub fn build(game: &GameModel) -> (Program, MilpHandles) {
    build_core(game, |_, _| true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::AttackerType;
    use ndarray::Array2;

    fn s1_game() -> GameModel {
        GameModel {
            defender_actions: 2,
            attacker_types: vec![
                AttackerType {
                    prior: 0.5,
                    attack_names: vec!["a1".into(), "a2".into()],
                    rewards: Array2::from_shape_vec((2, 2), vec![8.0, 6.0, 7.0, 2.0]).unwrap(),
                    attacker_rewards: Array2::from_shape_vec((2, 2), vec![2.0, 0.0, 0.0, 6.0]).unwrap(),
                },
                AttackerType {
                    prior: 0.5,
                    attack_names: vec!["b1".into(), "b2".into()],
                    rewards: Array2::from_shape_vec((2, 2), vec![5.0, 4.0, 4.0, 5.0]).unwrap(),
                    attacker_rewards: Array2::from_shape_vec((2, 2), vec![0.0, 2.0, 2.0, 0.0]).unwrap(),
                },
            ],
            switching_cost: None,
        }
    }

    #[test]
    fn builds_expected_variable_shape() {
        let game = s1_game();
        let (p, handles) = build(&game);
        assert_eq!(handles.x.len(), 2);
        assert_eq!(handles.q.len(), 2);
        assert!(handles.q.iter().all(|q_l| q_l.iter().all(|h| h.is_some())));
        // defender-simplex + 2*(pure-response + 2 dominance pairs*2 + 4 mccormick triples)
        assert!(p.constraints.len() >= 1 + 2 * (1 + 4));
    }
}
