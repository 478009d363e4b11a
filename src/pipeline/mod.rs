//! Per-node DCA pipeline and the multi-node analysis engine.
//!
//! All mutable algorithm state (sliding windows, previous-record memory,
//! cell population) lives in one [`NodePipeline`] owned by the caller; there
//! are no process-wide singletons. Distinct nodes are independent, so the
//! engine fans a multi-node batch out across nodes with rayon while each
//! node's own stream is folded strictly in arrival order.

use crate::config::Config;
use crate::decision::ContextDecider;
use crate::population::CellPopulation;
use crate::signals::SignalFuser;
use crate::telemetry::{OutputRow, Record};
use rayon::prelude::*;
use std::collections::BTreeMap;

/// The full pipeline state for one node's stream.
#[derive(Debug)]
pub struct NodePipeline {
    node_id: String,
    fuser: SignalFuser,
    population: CellPopulation,
    decider: ContextDecider,
}

impl NodePipeline {
    pub fn new(node_id: &str, config: &Config) -> Self {
        Self {
            node_id: node_id.to_string(),
            fuser: SignalFuser::new(config),
            population: CellPopulation::new(config.population_capacity),
            decider: ContextDecider::new(config),
        }
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Process the next record of this node's stream, producing its output
    /// row. Records must be fed in arrival order; every tick mutates the
    /// windows and every live cell's accumulators.
    pub fn process(&mut self, record: &Record) -> OutputRow {
        let signals = self.fuser.fuse(record);
        let contribution = self.decider.contribution(&signals);
        let retired = self.population.tick(&signals.antigen, contribution);

        let context = if self.decider.votes_on_retirement() {
            // Pre-warm-up default of 0.0 until the first cell retires
            retired
                .map(|cell| self.decider.decide_retiring(&cell))
                .unwrap_or(0.0)
        } else {
            self.decider.decide_live(&self.population)
        };

        OutputRow {
            node_id: record.node_id.clone(),
            timestamp: record.unix_timestamp(),
            readings: record.readings,
            indicators: record.indicators,
            antigen: signals.antigen,
            pamp: signals.pamp,
            danger: signals.danger,
            safe: signals.safe,
            context,
        }
    }
}

/// Runs the per-node pipelines over a telemetry batch.
#[derive(Debug, Clone)]
pub struct AnalysisEngine {
    config: Config,
}

impl AnalysisEngine {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Fold one node's ordered records through a fresh pipeline.
    pub fn run_node(&self, node_id: &str, records: &[Record]) -> Vec<OutputRow> {
        let mut pipeline = NodePipeline::new(node_id, &self.config);
        records.iter().map(|r| pipeline.process(r)).collect()
    }

    /// Analyze a mixed batch: group records by node (preserving each node's
    /// arrival order) and run the node streams in parallel. Results are
    /// keyed by node id in deterministic order.
    pub fn run(&self, records: &[Record]) -> BTreeMap<String, Vec<OutputRow>> {
        let mut grouped: BTreeMap<String, Vec<&Record>> = BTreeMap::new();
        for record in records {
            grouped.entry(record.node_id.clone()).or_default().push(record);
        }

        grouped
            .into_par_iter()
            .map(|(node_id, node_records)| {
                let mut pipeline = NodePipeline::new(&node_id, &self.config);
                let rows = node_records
                    .into_iter()
                    .map(|r| pipeline.process(r))
                    .collect();
                (node_id, rows)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DecisionRule, SafeMode};
    use chrono::NaiveDate;

    fn record(node: &str, seq: u32, readings: [f64; 4], indicators: [f64; 8]) -> Record {
        Record {
            node_id: node.to_string(),
            sequence_number: seq,
            timestamp: NaiveDate::from_ymd_opt(2021, 11, 15)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap()
                + chrono::Duration::seconds(i64::from(seq) * 60),
            readings,
            indicators,
        }
    }

    #[test]
    fn retirement_rule_emits_zero_before_first_eviction() {
        let config = Config {
            population_capacity: 4,
            ..Config::default()
        };
        let mut pipeline = NodePipeline::new("SN1", &config);
        for seq in 1..=4 {
            let row = pipeline.process(&record("SN1", seq, [21.5, 18.0, 45.0, 60.0], [1.0; 8]));
            assert_eq!(row.context, 0.0, "tick {seq} is before the first retirement");
        }
    }

    #[test]
    fn multi_node_batch_matches_per_node_runs() {
        let engine = AnalysisEngine::new(Config::default());
        let mut batch = Vec::new();
        let mut sn1 = Vec::new();
        let mut sn2 = Vec::new();
        for seq in 1..=12 {
            let a = record("SN1", seq, [20.0 + seq as f64, 18.0, 45.0, 60.0], [0.0; 8]);
            let b = record("SN2", seq, [25.0, 19.0, 50.0, 55.0], [0.1; 8]);
            batch.push(a.clone());
            batch.push(b.clone());
            sn1.push(a);
            sn2.push(b);
        }
        let results = engine.run(&batch);
        assert_eq!(results.len(), 2);
        assert_eq!(results["SN1"], engine.run_node("SN1", &sn1));
        assert_eq!(results["SN2"], engine.run_node("SN2", &sn2));
    }

    #[test]
    fn interleaving_nodes_does_not_leak_state() {
        // SN2's noisy stream must not disturb SN1's perfectly stable one.
        let engine = AnalysisEngine::new(Config {
            decision_rule: DecisionRule::MajorityLive,
            safe_mode: SafeMode::CoefficientOfVariation,
            ..Config::default()
        });
        let mut batch = Vec::new();
        for seq in 1..=8 {
            batch.push(record("SN1", seq, [0.0; 4], [0.0; 8]));
            batch.push(record(
                "SN2",
                seq,
                [seq as f64 * 3.0, 1.0, 2.0, 4.0],
                [1.0; 8],
            ));
        }
        let results = engine.run(&batch);
        let solo = engine.run_node(
            "SN1",
            &(1..=8)
                .map(|seq| record("SN1", seq, [0.0; 4], [0.0; 8]))
                .collect::<Vec<_>>(),
        );
        assert_eq!(results["SN1"], solo);
    }
}
