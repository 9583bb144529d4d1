//! CSV persistence for trial results
//!
//! One append-only file per session, six columns, no header row (the file
//! may already hold rows from earlier sessions).

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use crate::core::orchestrator::TrialSink;
use crate::types::{Condition, TrialResult};
use crate::{Error, Result};

/// Appends each trial as one CSV row, flushing per row
#[derive(Debug)]
pub struct CsvSink {
    path: PathBuf,
    file: File,
    rows_written: u64,
}

impl CsvSink {
    /// Open `path` for appending, creating it and its directory if needed
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file,
            rows_written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }
}

impl TrialSink for CsvSink {
    fn record(&mut self, result: &TrialResult) -> Result<()> {
        writeln!(self.file, "{}", result.to_csv_row())?;
        self.file.flush()?;
        self.rows_written += 1;
        Ok(())
    }
}

/// Read back every row of a results file
pub fn load_results(path: impl AsRef<Path>) -> Result<Vec<TrialResult>> {
    let reader = BufReader::new(File::open(path)?);
    let mut results = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        results.push(parse_row(&line).map_err(|msg| {
            Error::ResultsParse { line: line_no + 1, message: msg }
        })?);
    }

    Ok(results)
}

fn parse_row(line: &str) -> std::result::Result<TrialResult, String> {
    let fields: Vec<&str> = line.trim().split(',').collect();
    if fields.len() != TrialResult::COLUMNS.len() {
        return Err(format!("expected {} columns, got {}", TrialResult::COLUMNS.len(), fields.len()));
    }

    let condition: Condition = fields[0].parse().map_err(|e: Error| e.to_string())?;
    let trial = fields[1].parse::<u32>().map_err(|e| format!("trial: {}", e))?;
    let num = |i: usize| {
        fields[i]
            .parse::<f64>()
            .map_err(|e| format!("{}: {}", TrialResult::COLUMNS[i], e))
    };

    Ok(TrialResult {
        condition,
        trial,
        influence_ratio: num(2)?,
        participant_initial_angle: num(3)?,
        participant_final_angle: num(4)?,
        partner_angle: num(5)?,
    })
}
