//! CLI entrypoint: reads a telemetry CSV, runs the per-node DCA pipelines
//! and writes one result CSV (and optionally one chart) per node.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use wsn_dca::config::Config;
use wsn_dca::io::{CsvRecordSource, CsvResultSink, RecordSource, ResultSink};
use wsn_dca::pipeline::AnalysisEngine;
use wsn_dca::plot::render_node_chart;
use wsn_dca::utils::init_logging;

#[derive(Debug, Parser)]
#[command(name = "dca-analyze", author, version, about = "Centralized DCA analysis of WSN telemetry", long_about = None)]
struct Args {
    /// Input telemetry CSV file
    #[arg(short, long, required_unless_present = "print_default_config")]
    input: Option<PathBuf>,

    /// Directory for per-node output files
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Path to the configuration file (TOML); defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Only analyze these node ids (repeatable); all nodes when omitted
    #[arg(long = "node", value_name = "ID")]
    nodes: Vec<String>,

    /// Render a chart PNG per node next to its CSV
    #[arg(long)]
    plot: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", env = "DCA_LOG")]
    log_level: String,

    /// Print the default configuration to stdout and exit
    #[arg(long)]
    print_default_config: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    if args.print_default_config {
        print!("{}", toml::to_string_pretty(&Config::default())?);
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => Config::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => Config::default(),
    };

    let Some(input) = args.input.as_ref() else {
        anyhow::bail!("--input is required");
    };
    let mut records = CsvRecordSource
        .load(input)
        .with_context(|| format!("reading telemetry from {}", input.display()))?;
    if !args.nodes.is_empty() {
        records.retain(|r| args.nodes.iter().any(|n| n == &r.node_id));
    }
    if records.is_empty() {
        log::warn!("No records to analyze");
        return Ok(());
    }
    log::info!("Loaded {} records from {}", records.len(), input.display());

    let engine = AnalysisEngine::new(config.clone());
    let results = engine.run(&records);

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating {}", args.out_dir.display()))?;
    let sink = CsvResultSink::new(config.enable_pamp);
    for (node_id, rows) in &results {
        let csv_path = args
            .out_dir
            .join(format!("centralized_dca-{}-output.csv", node_id));
        sink.write(&csv_path, rows)
            .with_context(|| format!("writing {}", csv_path.display()))?;
        log::info!("{}: {} rows -> {}", node_id, rows.len(), csv_path.display());

        if args.plot {
            let png_path = args
                .out_dir
                .join(format!("centralized_dca-{}-output.png", node_id));
            render_node_chart(&png_path, node_id, rows)
                .with_context(|| format!("rendering {}", png_path.display()))?;
            log::info!("{}: chart -> {}", node_id, png_path.display());
        }
    }

    Ok(())
}
