//! Three-panel chart of one node's analysis output.
//!
//! Panel 1: the four use-case readings (temperatures on a 0-40 scale,
//! humidities rescaled from 0-100). Panel 2: the eight fault indicators.
//! Panel 3: danger, safe and the anomaly context. Rendering is deterministic
//! for a fixed input; the renderer draws series only and leaves typography
//! to downstream tooling, so no font backend is required.

use crate::telemetry::OutputRow;
use crate::utils::error::{Error, Result};
use plotters::prelude::*;
use std::path::Path;

const WIDTH: u32 = 1500;
const HEIGHT: u32 = 900;

// Series colors, loosely matching the testbed palettes
const T_AIR: RGBColor = RGBColor(0, 100, 0);
const T_SOIL: RGBColor = RGBColor(50, 205, 50);
const H_AIR: RGBColor = RGBColor(0, 0, 139);
const H_SOIL: RGBColor = RGBColor(30, 144, 255);
const DANGER: RGBColor = RGBColor(255, 0, 0);
const SAFE: RGBColor = RGBColor(0, 128, 0);
const CONTEXT: RGBColor = RGBColor(0, 0, 255);

fn plot_err<E: std::fmt::Display>(e: E) -> Error {
    Error::PlotError(e.to_string())
}

/// Render the chart for one node's ordered output rows to a bitmap file.
pub fn render_node_chart(path: &Path, node_id: &str, rows: &[OutputRow]) -> Result<()> {
    if rows.is_empty() {
        return Err(Error::DataError(format!(
            "no rows to plot for node {}",
            node_id
        )));
    }

    let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;
    let panels = root.split_evenly((3, 1));

    let t_first = rows[0].timestamp;
    let t_last = rows[rows.len() - 1].timestamp;
    // A single-sample stream still needs a non-empty x range
    let x_range = t_first..t_last.max(t_first + 1);

    // Panel 1: readings. Humidity [%RH] is rescaled onto the temperature
    // axis (0..40) in place of a twin axis.
    {
        let mut chart = ChartBuilder::on(&panels[0])
            .margin(10)
            .build_cartesian_2d(x_range.clone(), 0.0..40.0_f64)
            .map_err(plot_err)?;
        for (index, color) in [T_AIR, T_SOIL, H_AIR, H_SOIL].into_iter().enumerate() {
            let scale = if index < 2 { 1.0 } else { 0.4 };
            chart
                .draw_series(LineSeries::new(
                    rows.iter().map(|r| (r.timestamp, r.readings[index] * scale)),
                    &color,
                ))
                .map_err(plot_err)?;
        }
    }

    // Panel 2: fault indicators
    {
        let mut chart = ChartBuilder::on(&panels[1])
            .margin(10)
            .build_cartesian_2d(x_range.clone(), 0.0..1.1_f64)
            .map_err(plot_err)?;
        for index in 0..8 {
            let color = Palette99::pick(index);
            chart
                .draw_series(LineSeries::new(
                    rows.iter().map(|r| (r.timestamp, r.indicators[index])),
                    &color,
                ))
                .map_err(plot_err)?;
        }
    }

    // Panel 3: DCA signals and the anomaly context. The raw-sum danger
    // variant can exceed 1, so the axis stretches to fit.
    {
        let y_max = rows
            .iter()
            .flat_map(|r| [r.danger, r.safe, r.context])
            .fold(1.1_f64, f64::max);
        let mut chart = ChartBuilder::on(&panels[2])
            .margin(10)
            .build_cartesian_2d(x_range, 0.0..y_max)
            .map_err(plot_err)?;
        chart
            .draw_series(LineSeries::new(
                rows.iter().map(|r| (r.timestamp, r.danger)),
                &DANGER,
            ))
            .map_err(plot_err)?;
        chart
            .draw_series(LineSeries::new(
                rows.iter().map(|r| (r.timestamp, r.safe)),
                &SAFE,
            ))
            .map_err(plot_err)?;
        chart
            .draw_series(LineSeries::new(
                rows.iter().map(|r| (r.timestamp, r.context)),
                &CONTEXT,
            ))
            .map_err(plot_err)?;
    }

    root.present().map_err(plot_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(timestamp: i64, context: f64) -> OutputRow {
        OutputRow {
            node_id: "41B9F864".to_string(),
            timestamp,
            readings: [21.5, 18.0, 45.0, 60.0],
            indicators: [0.0; 8],
            antigen: "41B9F864".to_string(),
            pamp: None,
            danger: 0.2,
            safe: 0.8,
            context,
        }
    }

    #[test]
    fn renders_png_for_ordered_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.png");
        let rows: Vec<OutputRow> = (0..50).map(|i| row(1636963200 + i * 60, 0.0)).collect();
        render_node_chart(&path, "41B9F864", &rows).unwrap();
        assert!(path.exists());
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn empty_rows_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.png");
        assert!(render_node_chart(&path, "41B9F864", &[]).is_err());
    }

    #[test]
    fn single_row_does_not_panic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.png");
        render_node_chart(&path, "41B9F864", &[row(1636963200, 1.0)]).unwrap();
        assert!(path.exists());
    }
}
