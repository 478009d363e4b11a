//! Telemetry record model shared by the record source and the DCA pipeline.

use chrono::NaiveDateTime;

/// Display names of the four use-case readings, in record order.
pub const READING_NAMES: [&str; 4] = ["T_air", "T_soil", "H_air", "H_soil"];

/// Display names of the eight fault indicators, in record order.
pub const INDICATOR_NAMES: [&str; 8] = [
    "x_nt", "x_vs", "x_bat", "x_art", "x_rst", "x_ic", "x_adc", "x_usart",
];

/// Index of the reset-cause indicator within [`Record::indicators`].
/// The PAMP signal treats a reset as a known-bad signature.
pub const RESET_INDICATOR: usize = 4;

/// One accepted telemetry sample from a sensor node.
///
/// Within one node's stream, timestamps are non-decreasing and
/// `sequence_number` is expected to increment by 1 between consecutive
/// accepted records; a gap is itself evidence, consumed by the PAMP signal.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Node identity (lower 32 bit of the node MAC in the testbed data)
    pub node_id: String,
    /// Monotonic per-node message counter
    pub sequence_number: u32,
    /// Sample time as reported by the sink
    pub timestamp: NaiveDateTime,
    /// Use-case readings: T_air, T_soil, H_air, H_soil
    pub readings: [f64; 4],
    /// Fault indicators, each normalized to [0,1]
    pub indicators: [f64; 8],
}

impl Record {
    /// UNIX-epoch form of the timestamp, as written to the result sink.
    pub fn unix_timestamp(&self) -> i64 {
        self.timestamp.and_utc().timestamp()
    }
}

/// One output row per accepted input record, in input order.
///
/// Column order follows the result sink contract: identity and readings
/// first, then the fused DCA signals, with `context` always last. The
/// `pamp` column is only present when the PAMP signal is modeled.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRow {
    pub node_id: String,
    pub timestamp: i64,
    pub readings: [f64; 4],
    pub indicators: [f64; 8],
    pub antigen: String,
    pub pamp: Option<f64>,
    pub danger: f64,
    pub safe: f64,
    pub context: f64,
}
