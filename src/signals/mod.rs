//! Per-record DCA signal computation: antigen, PAMP, danger and safe.
//!
//! The fuser owns the per-node sliding windows and the previous-record
//! memory (last readings, last sequence number). Feeding it one record
//! produces one [`FusedSignals`] tuple; feeding records out of order would
//! change every subsequent value, so a fuser must only ever see one node's
//! stream, in arrival order.

use crate::config::{AntigenMode, Config, DangerMode, SafeMode};
use crate::stats::{relative_delta, SlidingWindow};
use crate::telemetry::{Record, RESET_INDICATOR};

/// Fused signal tuple for one record.
#[derive(Debug, Clone, PartialEq)]
pub struct FusedSignals {
    /// Identity key the record's cell is tagged with
    pub antigen: String,
    /// Known-bad-pattern evidence; `None` when PAMP is not modeled
    pub pamp: Option<f64>,
    /// Aggregated evidence of abnormal conditions
    pub danger: f64,
    /// Aggregated evidence of normal, stable conditions
    pub safe: f64,
}

/// Stateful per-node signal fuser.
#[derive(Debug)]
pub struct SignalFuser {
    danger_mode: DangerMode,
    safe_mode: SafeMode,
    antigen_mode: AntigenMode,
    enable_pamp: bool,
    danger_weights: [f64; 8],
    safe_weights: [f64; 4],
    pamp1_weight: f64,
    pamp2_weight: f64,
    safe_sensitivity: f64,
    /// One window per use-case reading, in record order
    windows: [SlidingWindow; 4],
    prev_readings: Option<[f64; 4]>,
    prev_sequence: Option<u32>,
}

impl SignalFuser {
    pub fn new(config: &Config) -> Self {
        Self {
            danger_mode: config.danger_mode,
            safe_mode: config.safe_mode,
            antigen_mode: config.antigen_mode,
            enable_pamp: config.enable_pamp,
            danger_weights: config.danger_weights,
            safe_weights: config.safe_weights,
            pamp1_weight: config.pamp1_weight,
            pamp2_weight: config.pamp2_weight,
            safe_sensitivity: config.safe_sensitivity,
            windows: std::array::from_fn(|_| SlidingWindow::new(config.window_size)),
            prev_readings: None,
            prev_sequence: None,
        }
    }

    /// Compute the fused signals for the next record of this node's stream.
    pub fn fuse(&mut self, record: &Record) -> FusedSignals {
        // Gap detection must look at the previous record before it is
        // overwritten below. The very first record never flags a gap.
        let gap = match self.prev_sequence {
            Some(prev) => {
                if prev.wrapping_add(1) != record.sequence_number {
                    1.0
                } else {
                    0.0
                }
            }
            None => 0.0,
        };

        for (window, value) in self.windows.iter_mut().zip(record.readings) {
            window.push(value);
        }

        let pamp = if self.enable_pamp {
            Some(self.pamp1_weight * record.indicators[RESET_INDICATOR] + self.pamp2_weight * gap)
        } else {
            None
        };
        let danger = self.danger(&record.indicators);
        let safe = self.safe(&record.readings);
        let antigen = self.antigen(record);

        self.prev_readings = Some(record.readings);
        self.prev_sequence = Some(record.sequence_number);

        FusedSignals {
            antigen,
            pamp,
            danger,
            safe,
        }
    }

    fn antigen(&self, record: &Record) -> String {
        match self.antigen_mode {
            AntigenMode::NodeId => record.node_id.clone(),
            AntigenMode::FixedPointHash => {
                let [t_air, t_soil, h_air, h_soil] = record.readings;
                format!(
                    "{:04X}{:04X}{:04X}{:04X}",
                    float_to_fixed16(t_air, 6),
                    float_to_fixed16(t_soil, 6),
                    float_to_fixed16(h_air, 6),
                    float_to_fixed16(h_soil, 6)
                )
            }
        }
    }

    fn danger(&self, indicators: &[f64; 8]) -> f64 {
        match self.danger_mode {
            DangerMode::CappedSum => {
                let sum: f64 = indicators
                    .iter()
                    .zip(self.danger_weights)
                    .map(|(x, w)| x * w)
                    .sum();
                sum.min(1.0)
            }
            DangerMode::RawSum => indicators
                .iter()
                .zip(self.danger_weights)
                .map(|(x, w)| x * w)
                .sum(),
            DangerMode::Product => {
                let product: f64 = indicators
                    .iter()
                    .zip(self.danger_weights)
                    .map(|(x, w)| 1.0 + x * w)
                    .product();
                (product - 1.0).min(1.0)
            }
        }
    }

    fn safe(&self, readings: &[f64; 4]) -> f64 {
        match self.safe_mode {
            SafeMode::WindowStddev => {
                let max_sigma = self
                    .windows
                    .iter()
                    .map(SlidingWindow::population_stddev)
                    .fold(0.0_f64, f64::max);
                (-max_sigma * self.safe_sensitivity).exp()
            }
            SafeMode::RelativeDelta => {
                // No previous record, nothing to compare against
                let Some(prev) = self.prev_readings else {
                    return 0.0;
                };
                let weight_norm: f64 = self.safe_weights.iter().map(|w| w.abs()).sum();
                if weight_norm == 0.0 {
                    return 0.0;
                }
                let weighted: f64 = readings
                    .iter()
                    .zip(prev)
                    .zip(self.safe_weights)
                    .map(|((cur, old), w)| w * relative_delta(*cur, old))
                    .sum();
                (1.0 - weighted / weight_norm).clamp(0.0, 1.0)
            }
            SafeMode::CoefficientOfVariation => {
                // Preserved verbatim from the testbed variant, quirks
                // included: the H_air spread is measured about the T_air
                // window's mean, and the T_air ratio divides by the window
                // sum instead of the mean. Likely copy-paste drift in the
                // testbed scripts; kept selectable rather than corrected so
                // recorded runs stay reproducible.
                let [w1, w2, w3, w4] = &self.windows;
                let sigma1 = w1.population_stddev();
                let sum1 = w1.sum();
                let mu2 = w2.mean();
                let sigma2 = w2.population_stddev();
                let mu3 = w1.mean();
                let sigma3 = w3.deviation_about(mu3);
                let mu4 = w4.mean();
                let sigma4 = w4.population_stddev();
                let ratio = |sigma: f64, mu: f64| if mu > 0.0 { sigma / mu } else { 0.0 };
                (ratio(sigma1, sum1) + ratio(sigma2, mu2) + ratio(sigma3, mu3) + ratio(sigma4, mu4))
                    .clamp(0.0, 1.0)
            }
        }
    }
}

/// Pack a float into 16-bit sign-magnitude fixed point: top bit is the sign,
/// low 15 bits are the magnitude scaled by `2^f_bits`.
pub fn float_to_fixed16(value: f64, f_bits: u32) -> u16 {
    let mut fixed: u16 = 0;
    let mut magnitude = value;
    if magnitude < 0.0 {
        magnitude = -magnitude;
        fixed |= 0x8000;
    }
    let scaled = (magnitude * f64::from(1u32 << f_bits)) as u32;
    fixed | (scaled & 0x7FFF) as u16
}

/// Inverse of [`float_to_fixed16`].
pub fn fixed16_to_float(value: u16, f_bits: u32) -> f64 {
    let magnitude = f64::from(value & 0x7FFF) / f64::from(1u32 << f_bits);
    if value & 0x8000 != 0 {
        -magnitude
    } else {
        magnitude
    }
}
