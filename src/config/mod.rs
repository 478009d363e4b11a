//! Configuration for the DCA analysis pipeline.
//!
//! One configuration value picks one consistent strategy set for an entire
//! run: fusion variants and the decision rule are enums selected here, not
//! branching scattered through the pipeline.

use crate::utils::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How the danger signal aggregates the eight fault indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DangerMode {
    /// Weighted sum, clamped to at most 1
    #[default]
    CappedSum,
    /// Uncapped weighted sum
    RawSum,
    /// Saturating product `min(1, prod(1 + x*w) - 1)`; grows faster than the
    /// additive form as more indicators fire simultaneously
    Product,
}

/// How the safe signal measures reading stability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SafeMode {
    /// `exp(-max(sigma) * sensitivity)` over the four reading windows
    #[default]
    WindowStddev,
    /// `1 - normalized weighted sum` of per-reading deltas from the previous
    /// record, clamped to [0,1]; forced to 0 on the first record of a stream
    RelativeDelta,
    /// Per-reading `sigma/mu` summed and clamped, as used by the testbed
    /// variant (preserved verbatim, quirks included; see the signals module)
    CoefficientOfVariation,
}

/// How antigens are derived from a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AntigenMode {
    /// The node id itself; does not allow spatial correlation across nodes
    #[default]
    NodeId,
    /// The four readings packed as 16-bit fixed-point hex, so nodes with
    /// similar readings share antigens
    FixedPointHash,
}

/// Which decision rule turns cell accumulators into a context value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DecisionRule {
    /// Fraction of live cells whose context sum is non-negative
    MajorityLive,
    /// Binary verdict from the sign of the retiring cell's k accumulator (dDCA)
    #[default]
    KSignRetire,
    /// Binary verdict from mature vs. semi-mature sums (classic DCA)
    MatureVsSemiRetire,
}

/// Weight triples for the maturation accumulators, ordered (pamp, danger, safe).
/// Each combination is normalized by the sum of absolute weights in its triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaturationWeights {
    #[serde(default = "default_csm_weights")]
    pub csm: [f64; 3],
    #[serde(default = "default_semi_weights")]
    pub semi: [f64; 3],
    #[serde(default = "default_mature_weights")]
    pub mature: [f64; 3],
    /// Weight of the PAMP term inside the dDCA k accumulator
    #[serde(default = "default_weight")]
    pub pamp_k_weight: f64,
}

impl Default for MaturationWeights {
    fn default() -> Self {
        Self {
            csm: default_csm_weights(),
            semi: default_semi_weights(),
            mature: default_mature_weights(),
            pamp_k_weight: default_weight(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Number of values per sliding window (N)
    #[serde(default = "default_window_size")]
    pub window_size: usize,

    /// Cell population capacity (DC_N)
    #[serde(default = "default_population_capacity")]
    pub population_capacity: usize,

    /// Sensitivity of the window-stddev safe signal
    #[serde(default = "default_safe_sensitivity")]
    pub safe_sensitivity: f64,

    /// Model the PAMP signal (reset signature + sequence gaps) and emit its
    /// column in the output
    #[serde(default)]
    pub enable_pamp: bool,

    /// Per-indicator danger weights, in record order
    #[serde(default = "default_danger_weights")]
    pub danger_weights: [f64; 8],

    /// Per-reading weights for the relative-delta safe signal
    #[serde(default = "default_safe_weights")]
    pub safe_weights: [f64; 4],

    /// Weight of the reset-signature component of PAMP
    #[serde(default = "default_weight")]
    pub pamp1_weight: f64,

    /// Weight of the missed-message component of PAMP
    #[serde(default = "default_weight")]
    pub pamp2_weight: f64,

    #[serde(default)]
    pub danger_mode: DangerMode,

    #[serde(default)]
    pub safe_mode: SafeMode,

    #[serde(default)]
    pub antigen_mode: AntigenMode,

    #[serde(default)]
    pub decision_rule: DecisionRule,

    #[serde(default)]
    pub maturation: MaturationWeights,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            population_capacity: default_population_capacity(),
            safe_sensitivity: default_safe_sensitivity(),
            enable_pamp: false,
            danger_weights: default_danger_weights(),
            safe_weights: default_safe_weights(),
            pamp1_weight: default_weight(),
            pamp2_weight: default_weight(),
            danger_mode: DangerMode::default(),
            safe_mode: SafeMode::default(),
            antigen_mode: AntigenMode::default(),
            decision_rule: DecisionRule::default(),
            maturation: MaturationWeights::default(),
        }
    }
}

impl Config {
    /// Load a configuration from a TOML file. Missing fields fall back to
    /// their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check parameter sanity before a run.
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(Error::ConfigError("window_size must be at least 1".into()));
        }
        if self.population_capacity == 0 {
            return Err(Error::ConfigError(
                "population_capacity must be at least 1".into(),
            ));
        }
        if !(self.safe_sensitivity > 0.0) {
            return Err(Error::ConfigError(
                "safe_sensitivity must be positive".into(),
            ));
        }
        Ok(())
    }
}

fn default_window_size() -> usize {
    10
}

fn default_population_capacity() -> usize {
    5
}

fn default_safe_sensitivity() -> f64 {
    0.35
}

fn default_weight() -> f64 {
    1.0
}

fn default_danger_weights() -> [f64; 8] {
    [1.0; 8]
}

fn default_safe_weights() -> [f64; 4] {
    [1.0; 4]
}

// Classic Greensmith weightings for the maturation triples
fn default_csm_weights() -> [f64; 3] {
    [2.0, 1.0, 2.0]
}

fn default_semi_weights() -> [f64; 3] {
    [0.0, 0.0, 1.0]
}

fn default_mature_weights() -> [f64; 3] {
    [2.0, 1.0, -1.5]
}
