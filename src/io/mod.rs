//! CSV collaborators around the core: record source and result sink.
//!
//! The core only sees ordered [`Record`]s and emits ordered [`OutputRow`]s;
//! everything about file formats lives here. Both seams are traits so a
//! different backing store (the testbed originally used a relational DB)
//! can be slotted in without touching the pipeline.

use crate::telemetry::{OutputRow, Record};
use crate::utils::error::{Error, Result};
use chrono::NaiveDateTime;
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::path::Path;

/// Timestamp layout of the testbed CSV exports; the fractional part is
/// optional.
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Column index of the transmission-success flag, when present. Rows whose
/// transmission failed never reach the core.
const SUCCESS_COLUMN: usize = 15;

/// Supplies an ordered sequence of per-node records.
pub trait RecordSource {
    fn load(&self, path: &Path) -> Result<Vec<Record>>;
}

/// Receives per-record output rows for persistence.
pub trait ResultSink {
    fn write(&self, path: &Path, rows: &[OutputRow]) -> Result<()>;
}

/// Reads the testbed telemetry CSV layout:
/// `snid, sntime, time, t_air, t_soil, h_air, h_soil, x_nt, x_vs, x_bat,
/// x_art, x_rst, x_ic, x_adc, x_usart[, success, aux...]`.
///
/// Malformed rows are skipped with a warning and contribute nothing
/// downstream; trailing auxiliary columns are tolerated and ignored.
pub struct CsvRecordSource;

impl RecordSource for CsvRecordSource {
    fn load(&self, path: &Path) -> Result<Vec<Record>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)?;

        let mut records = Vec::new();
        for (index, raw) in reader.records().enumerate() {
            // Line 1 is the header
            let line = index + 2;
            let raw = match raw {
                Ok(raw) => raw,
                Err(e) => {
                    log::warn!("Skipping unreadable row at line {}: {}", line, e);
                    continue;
                }
            };
            match parse_row(&raw) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {
                    log::debug!("Dropping failed transmission at line {}", line);
                }
                Err(e) => {
                    log::warn!("Skipping malformed record at line {}: {}", line, e);
                }
            }
        }
        Ok(records)
    }
}

fn parse_row(raw: &StringRecord) -> Result<Option<Record>> {
    if let Some(success) = raw.get(SUCCESS_COLUMN) {
        if success.trim() == "0" {
            return Ok(None);
        }
    }

    let field = |index: usize| -> Result<&str> {
        raw.get(index)
            .ok_or_else(|| Error::DataError(format!("missing column {}", index)))
    };
    let float = |index: usize| -> Result<f64> {
        field(index)?
            .trim()
            .parse::<f64>()
            .map_err(|e| Error::DataError(format!("column {}: {}", index, e)))
    };

    let node_id = field(0)?.trim().to_string();
    if node_id.is_empty() {
        return Err(Error::DataError("empty node id".into()));
    }
    let sequence_number = field(1)?
        .trim()
        .parse::<u32>()
        .map_err(|e| Error::DataError(format!("column 1: {}", e)))?;
    let timestamp = NaiveDateTime::parse_from_str(field(2)?.trim(), TIME_FORMAT)
        .map_err(|e| Error::DataError(format!("column 2: {}", e)))?;

    let mut readings = [0.0; 4];
    for (offset, slot) in readings.iter_mut().enumerate() {
        *slot = float(3 + offset)?;
    }
    let mut indicators = [0.0; 8];
    for (offset, slot) in indicators.iter_mut().enumerate() {
        *slot = float(7 + offset)?;
    }

    Ok(Some(Record {
        node_id,
        sequence_number,
        timestamp,
        readings,
        indicators,
    }))
}

/// Writes one CSV file of analysis output, headers matching the testbed
/// result layout. The `pamp` column appears only when the PAMP signal is
/// modeled; `context` is always last.
pub struct CsvResultSink {
    include_pamp: bool,
}

impl CsvResultSink {
    pub fn new(include_pamp: bool) -> Self {
        Self { include_pamp }
    }
}

impl ResultSink for CsvResultSink {
    fn write(&self, path: &Path, rows: &[OutputRow]) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut writer = WriterBuilder::new().has_headers(false).from_path(path)?;

        let mut header: Vec<&str> = vec![
            "snid [lower 32-bit of MAC]",
            "time [UNIX]",
            "T_air [°C]",
            "T_soil [°C]",
            "H_air [%RH]",
            "H_soil [%RH]",
            "x_nt",
            "x_vs",
            "x_bat",
            "x_art",
            "x_rst",
            "x_ic",
            "x_adc",
            "x_usart",
            "antigen",
        ];
        if self.include_pamp {
            header.push("pamp");
        }
        header.extend(["danger", "safe", "context [0..1]"]);
        writer.write_record(&header)?;

        for row in rows {
            let mut fields: Vec<String> = Vec::with_capacity(header.len());
            fields.push(row.node_id.clone());
            fields.push(row.timestamp.to_string());
            fields.extend(row.readings.iter().map(|v| v.to_string()));
            fields.extend(row.indicators.iter().map(|v| v.to_string()));
            fields.push(row.antigen.clone());
            if self.include_pamp {
                fields.push(row.pamp.unwrap_or(0.0).to_string());
            }
            fields.push(row.danger.to_string());
            fields.push(row.safe.to_string());
            fields.push(row.context.to_string());
            writer.write_record(&fields)?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "snid,sntime,time,t_air,t_soil,h_air,h_soil,x_nt,x_vs,x_bat,x_art,x_rst,x_ic,x_adc,x_usart,success,supply";

    fn write_csv(lines: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", HEADER).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file
    }

    #[test]
    fn loads_well_formed_rows() {
        let file = write_csv(&[
            "41B9F864,1,2021-11-15 08:00:00.000,21.5,18.0,45.0,60.0,0,0,0,0,0,0,0,0,1,3.3",
            "41B9F864,2,2021-11-15 08:01:00,21.6,18.0,45.1,60.0,0,0,0.1,0,0,0,0,0,1,3.3",
        ]);
        let records = CsvRecordSource.load(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].node_id, "41B9F864");
        assert_eq!(records[0].sequence_number, 1);
        assert_eq!(records[0].readings, [21.5, 18.0, 45.0, 60.0]);
        assert_eq!(records[1].indicators[2], 0.1);
    }

    #[test]
    fn drops_failed_transmissions() {
        let file = write_csv(&[
            "41B9F864,1,2021-11-15 08:00:00,21.5,18.0,45.0,60.0,0,0,0,0,0,0,0,0,1,3.3",
            "41B9F864,2,2021-11-15 08:01:00,21.5,18.0,45.0,60.0,0,0,0,0,0,0,0,0,0,3.3",
            "41B9F864,3,2021-11-15 08:02:00,21.5,18.0,45.0,60.0,0,0,0,0,0,0,0,0,1,3.3",
        ]);
        let records = CsvRecordSource.load(file.path()).unwrap();
        let sequences: Vec<u32> = records.iter().map(|r| r.sequence_number).collect();
        assert_eq!(sequences, vec![1, 3]);
    }

    #[test]
    fn skips_malformed_rows_and_continues() {
        let file = write_csv(&[
            "41B9F864,1,2021-11-15 08:00:00,21.5,18.0,45.0,60.0,0,0,0,0,0,0,0,0,1,3.3",
            "41B9F864,not-a-number,2021-11-15 08:01:00,21.5,18.0,45.0,60.0,0,0,0,0,0,0,0,0,1,3.3",
            "41B9F864,3,2021-11-15 08:02:00,garbage,18.0,45.0,60.0,0,0,0,0,0,0,0,0,1,3.3",
            "41B9F864,4,2021-11-15 08:03:00,21.5,18.0,45.0,60.0,0,0,0,0,0,0,0,0,1,3.3",
        ]);
        let records = CsvRecordSource.load(file.path()).unwrap();
        let sequences: Vec<u32> = records.iter().map(|r| r.sequence_number).collect();
        assert_eq!(sequences, vec![1, 4]);
    }

    #[test]
    fn rows_without_success_column_are_accepted() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "snid,sntime,time,t_air,t_soil,h_air,h_soil,x_nt,x_vs,x_bat,x_art,x_rst,x_ic,x_adc,x_usart"
        )
        .unwrap();
        writeln!(
            file,
            "41B9F864,1,2021-11-15 08:00:00,21.5,18.0,45.0,60.0,0,0,0,0,0,0,0,0"
        )
        .unwrap();
        let records = CsvRecordSource.load(file.path()).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn sink_writes_context_last_and_pamp_when_enabled() {
        let row = OutputRow {
            node_id: "41B9F864".to_string(),
            timestamp: 1636963200,
            readings: [21.5, 18.0, 45.0, 60.0],
            indicators: [0.0; 8],
            antigen: "41B9F864".to_string(),
            pamp: Some(1.0),
            danger: 0.25,
            safe: 0.75,
            context: 0.0,
        };
        let file = NamedTempFile::new().unwrap();
        CsvResultSink::new(true).write(file.path(), &[row]).unwrap();

        let contents = std::fs::read_to_string(file.path()).unwrap();
        let mut lines = contents.lines();
        let header = lines.next().unwrap();
        assert!(header.ends_with("antigen,pamp,danger,safe,context [0..1]"));
        let data = lines.next().unwrap();
        assert!(data.ends_with("41B9F864,1,0.25,0.75,0"));
    }

    #[test]
    fn sink_omits_pamp_column_when_disabled() {
        let row = OutputRow {
            node_id: "41B9F864".to_string(),
            timestamp: 1636963200,
            readings: [21.5, 18.0, 45.0, 60.0],
            indicators: [0.0; 8],
            antigen: "41B9F864".to_string(),
            pamp: None,
            danger: 0.25,
            safe: 0.75,
            context: 1.0,
        };
        let file = NamedTempFile::new().unwrap();
        CsvResultSink::new(false).write(file.path(), &[row]).unwrap();

        let contents = std::fs::read_to_string(file.path()).unwrap();
        let header = contents.lines().next().unwrap();
        assert!(!header.contains("pamp"));
        assert!(header.ends_with("antigen,danger,safe,context [0..1]"));
    }
}
