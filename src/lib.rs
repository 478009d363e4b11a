//! # wsn_dca
//! Centralized dendritic cell algorithm (DCA) analysis for wireless sensor
//! network telemetry.
//!
//! Per-node telemetry records (use-case readings plus hardware fault
//! indicators) are folded, one record at a time, into an anomaly context
//! between 0 and 1, where 0 means a normal context and 1 refers to
//! circumstances that facilitate node faults. The engine fuses weak danger
//! and safe evidence per record and accumulates it in a bounded population
//! of short-lived dendritic cells whose maturation yields the verdict.
//!
//! The algorithmic core lives in [`stats`], [`signals`], [`population`] and
//! [`decision`], wired together per node by [`pipeline`]. CSV input/output
//! ([`io`]) and chart rendering ([`plot`]) are collaborators around that
//! core.

pub use crate::utils::error::{Error, Result};

pub mod config;
pub mod decision;
pub mod io;
pub mod pipeline;
pub mod plot;
pub mod population;
pub mod signals;
pub mod stats;
pub mod telemetry;
pub mod utils;

pub use config::Config;
pub use pipeline::{AnalysisEngine, NodePipeline};
pub use telemetry::{OutputRow, Record};
