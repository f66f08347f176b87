//! ASCII input-file parsing for the BSG and schedule game formats,
//! grounded on the original's line-by-line `f.readline()` reads in
//! `BSG_milp.py`/`cost_BSG_miqp.py`/
//! `ResourcesHomogeneousScheduleSingleton`'s `read_data`. Unlike the
//! original, a malformed line produces a typed `Error::InputMalformed`
//! with a line number rather than a Python traceback, and every parsed
//! game runs through `GameModel::validate` before any solve.

use ndarray::Array2;

use crate::error::Error;
use crate::game::{AttackerType, GameModel, ScheduleGame, TargetRewards};

struct Lines<'a> {
    lines: std::str::Lines<'a>,
    n: usize,
}

impl<'a> Lines<'a> {
    fn new(text: &'a str) -> Self {
        Lines { lines: text.lines(), n: 0 }
    }

    fn next(&mut self) -> Result<&'a str, Error> {
        self.n += 1;
        self.lines.next().map(str::trim).ok_or(Error::InputMalformed {
            line: self.n,
            reason: "unexpected end of input".into(),
        })
    }

    fn next_usize(&mut self) -> Result<usize, Error> {
        let line = self.n + 1;
        self.next()?.parse().map_err(|_| Error::InputMalformed {
            line,
            reason: "expected an integer".into(),
        })
    }

    fn next_f64(&mut self) -> Result<f64, Error> {
        let line = self.n + 1;
        self.next()?.parse().map_err(|_| Error::InputMalformed {
            line,
            reason: "expected a number".into(),
        })
    }

    fn next_row(&mut self) -> Result<Vec<f64>, Error> {
        let line = self.n + 1;
        self.next()?
            .split_whitespace()
            .map(|tok| tok.parse().map_err(|_| Error::InputMalformed { line, reason: format!("bad numeric token {tok:?}") }))
            .collect()
    }
}

fn parse_reward_row(line_no: usize, text: &str, q: usize) -> Result<(Vec<f64>, Vec<f64>), Error> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() != q {
        return Err(Error::InputMalformed {
            line: line_no,
            reason: format!("expected {q} reward pairs, got {}", tokens.len()),
        });
    }
    let mut r = Vec::with_capacity(q);
    let mut c = Vec::with_capacity(q);
    for tok in tokens {
        let (rs, cs) = tok.split_once(',').ok_or_else(|| Error::InputMalformed {
            line: line_no,
            reason: format!("expected r,c pair, got {tok:?}"),
        })?;
        r.push(rs.parse().map_err(|_| Error::InputMalformed { line: line_no, reason: format!("bad reward {rs:?}") })?);
        c.push(cs.parse().map_err(|_| Error::InputMalformed { line: line_no, reason: format!("bad reward {cs:?}") })?);
    }
    Ok((r, c))
}

/// Parse a B-MILP/B-WTF/B-UR input file:
/// ```text
/// X
/// L
/// p_0
/// Q_0
/// name|name|...
/// r,c r,c ...   (X rows)
/// ... (repeated per attacker type)
/// ```
pub fn parse_game(text: &str) -> Result<GameModel, Error> {
    let mut lines = Lines::new(text);
    let x = lines.next_usize()?;
    let l = lines.next_usize()?;

    let mut attacker_types = Vec::with_capacity(l);
    for _ in 0..l {
        let prior = lines.next_f64()?;
        let q = lines.next_usize()?;
        let names_line = lines.next()?;
        let names: Vec<String> = names_line.split('|').map(String::from).collect();
        if names.len() != q {
            return Err(Error::InputMalformed {
                line: lines.n,
                reason: format!("expected {q} attack names, got {}", names.len()),
            });
        }

        let mut rewards = Array2::<f64>::zeros((x, q));
        let mut attacker_rewards = Array2::<f64>::zeros((x, q));
        for i in 0..x {
            let line_no = lines.n + 1;
            let row_text = lines.next()?;
            let (r, c) = parse_reward_row(line_no, row_text, q)?;
            for j in 0..q {
                rewards[(i, j)] = r[j];
                attacker_rewards[(i, j)] = c[j];
            }
        }

        attacker_types.push(AttackerType { prior, attack_names: names, rewards, attacker_rewards });
    }

    let game = GameModel { defender_actions: x, attacker_types, switching_cost: None };
    game.validate()?;
    Ok(game)
}

/// Parse a B-COST input file: the base game format, prefixed by an
/// `X * X` switching-cost matrix (grounded on `cost_BSG_miqp.py`).
pub fn parse_cost_game(text: &str) -> Result<GameModel, Error> {
    let mut lines = Lines::new(text);
    let x = lines.next_usize()?;

    let mut cost = Array2::<f64>::zeros((x, x));
    for i in 0..x {
        let row = lines.next_row()?;
        if row.len() != x {
            return Err(Error::InputMalformed { line: lines.n, reason: format!("expected {x} cost columns, got {}", row.len()) });
        }
        for (j, v) in row.into_iter().enumerate() {
            cost[(i, j)] = v;
        }
    }

    let l = lines.next_usize()?;
    let mut attacker_types = Vec::with_capacity(l);
    for _ in 0..l {
        let prior = lines.next_f64()?;
        let q = lines.next_usize()?;
        let names_line = lines.next()?;
        let names: Vec<String> = names_line.split('|').map(String::from).collect();

        let mut rewards = Array2::<f64>::zeros((x, q));
        let mut attacker_rewards = Array2::<f64>::zeros((x, q));
        for i in 0..x {
            let line_no = lines.n + 1;
            let row_text = lines.next()?;
            let (r, c) = parse_reward_row(line_no, row_text, q)?;
            for j in 0..q {
                rewards[(i, j)] = r[j];
                attacker_rewards[(i, j)] = c[j];
            }
        }
        attacker_types.push(AttackerType { prior, attack_names: names, rewards, attacker_rewards });
    }

    let game = GameModel { defender_actions: x, attacker_types, switching_cost: Some(cost) };
    game.validate()?;
    Ok(game)
}

/// Parse a B-SCHED input file (grounded on
/// `ResourcesHomogeneousScheduleSingleton::read_data`):
/// ```text
/// n
/// rd
/// R^c_0 R^u_0   (n rows)
/// ...
/// C^c_0 C^u_0   (n rows)
/// ...
/// ```
pub fn parse_schedule_game(text: &str) -> Result<ScheduleGame, Error> {
    let mut lines = Lines::new(text);
    let n = lines.next_usize()?;
    let rd = lines.next_usize()?;

    let mut defender = Vec::with_capacity(n);
    for _ in 0..n {
        let row = lines.next_row()?;
        if row.len() != 2 {
            return Err(Error::InputMalformed { line: lines.n, reason: "expected R^c R^u".into() });
        }
        defender.push((row[0], row[1]));
    }
    let mut attacker = Vec::with_capacity(n);
    for _ in 0..n {
        let row = lines.next_row()?;
        if row.len() != 2 {
            return Err(Error::InputMalformed { line: lines.n, reason: "expected C^c C^u".into() });
        }
        attacker.push((row[0], row[1]));
    }

    let rewards = defender
        .into_iter()
        .zip(attacker)
        .map(|((rc, ru), (cc, cu))| TargetRewards {
            defender_covered: rc,
            defender_uncovered: ru,
            attacker_covered: cc,
            attacker_uncovered: cu,
        })
        .collect();

    let game = ScheduleGame { targets: n, resources: rd, rewards };
    game.validate()?;
    Ok(game)
}

#[cfg(test)]
mod tests {
    use super::*;

    const S1: &str = "2\n2\n0.5\n2\na1|a2\n8,2 6,0\n7,0 2,6\n0.5\n2\nb1|b2\n5,0 4,2\n4,2 5,0\n";

    #[test]
    fn parses_s1() {
        let game = parse_game(S1).expect("should parse");
        assert_eq!(game.defender_actions, 2);
        assert_eq!(game.attacker_types.len(), 2);
        assert_eq!(game.attacker_types[0].attack_names, vec!["a1", "a2"]);
        assert_eq!(game.attacker_types[0].rewards[(0, 0)], 8.0);
        assert_eq!(game.attacker_types[0].attacker_rewards[(1, 1)], 6.0);
    }

    #[test]
    fn rejects_wrong_reward_count() {
        let bad = "2\n1\n1.0\n2\na1|a2\n8,2\n7,0 2,6\n";
        assert!(parse_game(bad).is_err());
    }

    const SCHED: &str = "4\n2\n0 -15\n0 -10\n0 -13\n0 -15\n-5 15\n-5 10\n-4 13\n-6 15\n";

    #[test]
    fn parses_schedule() {
        let game = parse_schedule_game(SCHED).expect("should parse");
        assert_eq!(game.targets, 4);
        assert_eq!(game.resources, 2);
        assert_eq!(game.rewards[0].attacker_uncovered, 15.0);
    }
}
