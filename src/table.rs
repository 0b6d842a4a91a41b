//! Reader for tabular instrument exports.
//!
//! The export starts with a block of free-form metadata lines followed by a
//! header row. Full-grid columns are defined on every row; the peak-fit
//! columns are blank outside the fit window.

use ndarray::Array1;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::error::{Result, XpsFitError};
use crate::spectrum::RawTable;

/// Full energy grid.
pub const ENERGY_COLUMN: &str = "B. E.";
/// Total counts on the full grid.
pub const COUNTS_COLUMN: &str = "Counts";
/// Energies of the fit window.
pub const WINDOW_ENERGY_COLUMN: &str = "PkGrp1_BE";
/// Background trace over the fit window.
pub const BACKGROUND_COLUMN: &str = "PkGrp1_Count";
/// The instrument's own fit envelope.
pub const ENVELOPE_COLUMN: &str = "PkFitEnv1";
/// Most per-peak curves an export carries (`Pk01` .. `Pk09`).
pub const MAX_PEAK_COLUMNS: usize = 9;

/// Read an instrument export from a file.
pub fn read_csv<P: AsRef<Path>>(path: P, skip_rows: usize) -> Result<RawTable> {
    let path = path.as_ref();
    log::debug!("Reading instrument export {}", path.display());
    let file = File::open(path)?;
    parse_csv(file, skip_rows)
}

/// Parse an instrument export, skipping `skip_rows` lines before the header.
pub fn parse_csv<R: Read>(reader: R, skip_rows: usize) -> Result<RawTable> {
    let mut reader = BufReader::new(reader);
    let mut line = String::new();
    for skipped in 0..skip_rows {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Err(XpsFitError::Table(format!(
                "Export ended after {} of {} preamble lines",
                skipped, skip_rows
            )));
        }
    }

    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();

    let column = |name: &str| headers.iter().position(|h| h == name);
    let required = |name: &str| {
        column(name).ok_or_else(|| XpsFitError::Table(format!("Missing '{}' column", name)))
    };
    let energy_idx = required(ENERGY_COLUMN)?;
    let counts_idx = required(COUNTS_COLUMN)?;
    let window_idx = required(WINDOW_ENERGY_COLUMN)?;
    let background_idx = required(BACKGROUND_COLUMN)?;
    let envelope_idx = column(ENVELOPE_COLUMN);
    let peak_idx: Vec<usize> = (1..=MAX_PEAK_COLUMNS)
        .map_while(|n| column(&format!("Pk{:02}", n)))
        .collect();

    let mut energy = Vec::new();
    let mut counts = Vec::new();
    let mut window = Vec::new();
    let mut background = Vec::new();
    let mut envelope = Vec::new();
    let mut peaks = vec![Vec::new(); peak_idx.len()];

    for (row, record) in csv_reader.records().enumerate() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let cell = |idx: usize| parse_cell(record.get(idx), row, &headers[idx]);

        let defined = |idx: usize| -> Result<f64> {
            cell(idx)?.ok_or_else(|| {
                XpsFitError::Table(format!("Row {}: '{}' is blank", row, headers[idx]))
            })
        };
        energy.push(defined(energy_idx)?);
        counts.push(defined(counts_idx)?);
        window.push(cell(window_idx)?);
        background.push(cell(background_idx)?);
        if let Some(idx) = envelope_idx {
            envelope.push(cell(idx)?);
        }
        for (peak, &idx) in peaks.iter_mut().zip(&peak_idx) {
            peak.push(cell(idx)?);
        }
    }

    log::debug!(
        "Parsed {} rows with {} peak columns",
        energy.len(),
        peak_idx.len()
    );
    Ok(RawTable::new(Array1::from(energy), Array1::from(counts), window, background)?
        .with_envelope(envelope)
        .with_peaks(peaks))
}

fn parse_cell(cell: Option<&str>, row: usize, column: &str) -> Result<Option<f64>> {
    match cell {
        None | Some("") => Ok(None),
        Some(text) => text.parse::<f64>().map(Some).map_err(|_| {
            XpsFitError::Table(format!(
                "Row {}: '{}' is not a number in column '{}'",
                row, text, column
            ))
        }),
    }
}
