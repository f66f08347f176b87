use bssg_solver::input::parse_game;
use bssg_solver::orchestrator::run_mix;
use bssg_solver::solver::{Config, GoodLpSolver};

mod common;
use common::approx_eq;

const S1_INPUT: &str = "2\n2\n0.5\n2\na1|a2\n8,2 6,0\n7,0 2,6\n0.5\n2\nb1|b2\n5,0 4,2\n4,2 5,0\n";

/// Parses an ASCII input file, solves B-MILP through the Orchestrator,
/// and checks the defender's strategy is a valid simplex point with a
/// non-negative objective (S1 is symmetric, so O-MIX should do at
/// least as well as any single pure configuration).
#[test]
fn parses_and_solves_s1_end_to_end() {
    let game = parse_game(S1_INPUT).expect("S1 input should parse");
    let result = run_mix(&game, &GoodLpSolver, &Config::default()).expect("should solve");

    let sum: f64 = result.defender_strategy.iter().sum();
    assert!(approx_eq(sum, 1.0, 1e-4));
    assert!(result.defender_strategy.iter().all(|&p| (-1e-6..=1.0 + 1e-6).contains(&p)));
}

/// Boundary: a single defender configuration (X=1) forces x_0 = 1 and
/// every attacker type's best response collapses to whichever column
/// maximizes its own reward against that one row.
#[test]
fn boundary_single_defender_configuration() {
    let input = "1\n1\n1.0\n2\nonly1|only2\n3,1 5,9\n";
    let game = parse_game(input).expect("should parse");
    let result = run_mix(&game, &GoodLpSolver, &Config::default()).expect("should solve");
    assert_eq!(result.defender_strategy.len(), 1);
    assert!(approx_eq(result.defender_strategy[0], 1.0, 1e-4));
}

/// Boundary: a single attacker type (L=1) reduces DOBSS to a
/// deterministic best response against the defender's single type.
#[test]
fn boundary_single_attacker_type() {
    let input = "2\n1\n1.0\n2\na1|a2\n8,2 6,0\n7,0 2,6\n";
    let game = parse_game(input).expect("should parse");
    assert_eq!(game.attacker_types.len(), 1);
    let result = run_mix(&game, &GoodLpSolver, &Config::default()).expect("should solve");
    let sum: f64 = result.defender_strategy.iter().sum();
    assert!(approx_eq(sum, 1.0, 1e-4));
}

/// A malformed input (prior that doesn't sum to 1) is rejected before
/// any solve is attempted.
#[test]
fn rejects_malformed_priors_before_solving() {
    let bad = "2\n2\n0.9\n2\na1|a2\n8,2 6,0\n7,0 2,6\n0.9\n2\nb1|b2\n5,0 4,2\n4,2 5,0\n";
    assert!(parse_game(bad).is_err());
}
