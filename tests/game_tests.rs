use bssg_solver::game::{AttackerType, GameModel};
use ndarray::Array2;

mod common;
use common::approx_eq;

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
fn s1_game_validates() {
    assert!(s1_game().validate().is_ok());
}

#[test]
fn big_m_is_derived_and_clamped() {
    let game = s1_game();
    let m = game.big_m();
    assert!(m >= 1.0e6 && m <= 1.0e8);
}

#[test]
fn unique_attack_names_merges_across_types() {
    let game = s1_game();
    assert_eq!(game.unique_attack_names(), vec!["a1", "a2", "b1", "b2"]);
}

#[test]
fn prior_must_sum_to_one_within_tolerance() {
    let mut game = s1_game();
    assert!(game.validate().is_ok());
    game.attacker_types[0].prior = 0.6;
    assert!(game.validate().is_err());
    game.attacker_types[0].prior = 0.5 + 1e-9;
    assert!(approx_eq(
        game.attacker_types.iter().map(|t| t.prior).sum::<f64>(),
        1.0,
        1e-6
    ));
}
