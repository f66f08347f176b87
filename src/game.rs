//! Game Model: the immutable inputs of one Bayesian Stackelberg
//! Security Game instance.

use ndarray::Array2;

use crate::error::Error;

/// One attacker type: a prior, a set of named attacks, and the
/// defender/attacker reward matrices for playing against it.
///
/// `rewards` and `attacker_rewards` are both `X * Q_l`: row `i` is
/// defender configuration `i`, column `j` is attack `j`.
#[derive(Debug, Clone)]
pub struct AttackerType {
    pub prior: f64,
    pub attack_names: Vec<String>,
    pub rewards: Array2<f64>,
    pub attacker_rewards: Array2<f64>,
}

impl AttackerType {
    pub fn attack_count(&self) -> usize {
        self.attack_names.len()
    }
}

/// The immutable Game Model for the DOBSS family of builders
/// (B-MILP, B-COST, B-WTF, B-UR).
#[derive(Debug, Clone)]
pub struct GameModel {
    pub defender_actions: usize,
    pub attacker_types: Vec<AttackerType>,
    /// Optional `X * X` switching-cost matrix for B-COST.
    pub switching_cost: Option<Array2<f64>>,
}

impl GameModel {
    /// Check priors, reward-matrix shapes, and switching-cost matrix
    /// consistency the original source never validated.
    pub fn validate(&self) -> Result<(), Error> {
        if self.defender_actions == 0 {
            return Err(Error::InputMalformed {
                line: 1,
                reason: "defender action count X must be positive".into(),
            });
        }
        if self.attacker_types.is_empty() {
            return Err(Error::InputMalformed {
                line: 2,
                reason: "attacker type count L must be positive".into(),
            });
        }

        let prior_sum: f64 = self.attacker_types.iter().map(|t| t.prior).sum();
        if (prior_sum - 1.0).abs() > 1e-6 {
            return Err(Error::InputMalformed {
                line: 0,
                reason: format!("attacker priors must sum to 1, got {}", prior_sum),
            });
        }

        for (l, t) in self.attacker_types.iter().enumerate() {
            if t.prior < 0.0 {
                return Err(Error::InputMalformed {
                    line: 0,
                    reason: format!("attacker {} has negative prior {}", l, t.prior),
                });
            }
            let q = t.attack_count();
            if q == 0 {
                return Err(Error::InputMalformed {
                    line: 0,
                    reason: format!("attacker {} has zero attacks", l),
                });
            }
            let (rr, rc) = t.rewards.dim();
            let (cr, cc) = t.attacker_rewards.dim();
            if rr != self.defender_actions || rc != q {
                return Err(Error::InputMalformed {
                    line: 0,
                    reason: format!(
                        "attacker {} defender-reward matrix is {}x{}, expected {}x{}",
                        l, rr, rc, self.defender_actions, q
                    ),
                });
            }
            if cr != self.defender_actions || cc != q {
                return Err(Error::InputMalformed {
                    line: 0,
                    reason: format!(
                        "attacker {} attacker-reward matrix is {}x{}, expected {}x{}",
                        l, cr, cc, self.defender_actions, q
                    ),
                });
            }
        }

        if let Some(cost) = &self.switching_cost {
            let (r, c) = cost.dim();
            if r != self.defender_actions || c != self.defender_actions {
                return Err(Error::InputMalformed {
                    line: 0,
                    reason: format!(
                        "switching-cost matrix is {}x{}, expected {}x{}",
                        r, c, self.defender_actions, self.defender_actions
                    ),
                });
            }
            for i in 0..self.defender_actions {
                if cost[(i, i)] != 0.0 {
                    return Err(Error::InputMalformed {
                        line: 0,
                        reason: format!("switching-cost diagonal [{i}][{i}] must be 0"),
                    });
                }
                for j in 0..self.defender_actions {
                    if cost[(i, j)] < 0.0 {
                        return Err(Error::InputMalformed {
                            line: 0,
                            reason: format!("switching-cost [{i}][{j}] must be non-negative"),
                        });
                    }
                }
            }
        }

        Ok(())
    }

    /// Deduplicated, lexicographically sorted union of attack names
    /// across all attacker types, used as O-WTF's enumeration order.
    pub fn unique_attack_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .attacker_types
            .iter()
            .flat_map(|t| t.attack_names.iter().cloned())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// A safe Big-M bound, derived from the payoff range rather than
    /// hard-coded: `2 * max|C|`, clamped to the solver's
    /// documented-stable `[1e6, 1e8]` band.
    pub fn big_m(&self) -> f64 {
        let max_c = self
            .attacker_types
            .iter()
            .flat_map(|t| t.attacker_rewards.iter())
            .fold(0.0_f64, |acc, &v| acc.max(v.abs()));
        (2.0 * max_c).clamp(1.0e6, 1.0e8)
    }
}

/// One target's defender/attacker reward pair for a given coverage
/// state: `(covered, uncovered)`.
#[derive(Debug, Clone, Copy)]
pub struct TargetRewards {
    pub defender_covered: f64,
    pub defender_uncovered: f64,
    pub attacker_covered: f64,
    pub attacker_uncovered: f64,
}

/// The immutable Game Model for the homogeneous-resource singleton
/// schedule family (B-SCHED).
#[derive(Debug, Clone)]
pub struct ScheduleGame {
    pub targets: usize,
    pub resources: usize,
    pub rewards: Vec<TargetRewards>,
}

impl ScheduleGame {
    pub fn validate(&self) -> Result<(), Error> {
        if self.targets == 0 {
            return Err(Error::InputMalformed {
                line: 1,
                reason: "target count n must be positive".into(),
            });
        }
        if self.resources == 0 || self.resources > self.targets {
            return Err(Error::InputMalformed {
                line: 2,
                reason: format!(
                    "resource count rd={} must satisfy 0 < rd <= n={}",
                    self.resources, self.targets
                ),
            });
        }
        if self.rewards.len() != self.targets {
            return Err(Error::InputMalformed {
                line: 0,
                reason: format!(
                    "expected {} target reward rows, got {}",
                    self.targets,
                    self.rewards.len()
                ),
            });
        }
        Ok(())
    }
}
