//! Context decision rules: mapping cell accumulators to an anomaly context.
//!
//! Three rules are supported behind one interface. The retirement-based
//! rules (dDCA k-sign and classic mature-vs-semi) judge the cell evicted
//! this tick; the majority-live rule discards the evictee and reads the
//! live population instead. Before the first eviction the retirement-based
//! rules emit the pre-warm-up default of 0.0.

use crate::config::{Config, DecisionRule, MaturationWeights};
use crate::population::{Accumulators, Cell, CellPopulation};
use crate::signals::FusedSignals;

/// The configured decision strategy, fixed for a pipeline's whole life.
#[derive(Debug, Clone)]
pub struct ContextDecider {
    rule: DecisionRule,
    weights: MaturationWeights,
}

impl ContextDecider {
    pub fn new(config: &Config) -> Self {
        Self {
            rule: config.decision_rule,
            weights: config.maturation.clone(),
        }
    }

    pub fn rule(&self) -> DecisionRule {
        self.rule
    }

    /// Whether retiring cells cast the vote (as opposed to reading the live
    /// population).
    pub fn votes_on_retirement(&self) -> bool {
        !matches!(self.rule, DecisionRule::MajorityLive)
    }

    /// The per-tick contribution this record adds to every live cell (and
    /// seeds the record's own cell with).
    pub fn contribution(&self, signals: &FusedSignals) -> Accumulators {
        let pamp = signals.pamp.unwrap_or(0.0);
        match self.rule {
            DecisionRule::MajorityLive => Accumulators {
                context: signals.danger - signals.safe,
                ..Accumulators::default()
            },
            DecisionRule::KSignRetire => Accumulators {
                csm: signals.safe + signals.danger + 2.0 * pamp,
                k: signals.danger + self.weights.pamp_k_weight * pamp - 2.0 * signals.safe,
                ..Accumulators::default()
            },
            DecisionRule::MatureVsSemiRetire => {
                let combine = |w: &[f64; 3]| {
                    let norm: f64 = w.iter().map(|x| x.abs()).sum();
                    if norm == 0.0 {
                        0.0
                    } else {
                        (w[0] * pamp + w[1] * signals.danger + w[2] * signals.safe) / norm
                    }
                };
                Accumulators {
                    csm: combine(&self.weights.csm),
                    semi: combine(&self.weights.semi),
                    mature: combine(&self.weights.mature),
                    ..Accumulators::default()
                }
            }
        }
    }

    /// Judge a retiring cell (retirement-based rules only).
    pub fn decide_retiring(&self, cell: &Cell) -> f64 {
        match self.rule {
            DecisionRule::MajorityLive => 0.0,
            DecisionRule::KSignRetire => {
                if cell.acc.k > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            DecisionRule::MatureVsSemiRetire => {
                if cell.acc.mature > cell.acc.semi {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Fraction of live cells currently judged anomalous (majority-live).
    pub fn decide_live(&self, population: &CellPopulation) -> f64 {
        if population.is_empty() {
            return 0.0;
        }
        let anomalous = population
            .cells()
            .filter(|cell| cell.acc.context >= 0.0)
            .count();
        anomalous as f64 / population.len() as f64
    }
}
