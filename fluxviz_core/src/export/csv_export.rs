//! CSV export of flux tables

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::flux_analysis::table::ReactionFlux;

/// Column names of the flux CSV, in order
pub const CSV_HEADER: [&str; 3] = ["reaction_id", "flux_value", "reaction_name"];

/// Written first so spreadsheet software detects UTF-8
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Record of the flux CSV
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FluxRecord {
    pub reaction_id: String,
    pub flux_value: f64,
    #[serde(default)]
    pub reaction_name: String,
}

impl From<&ReactionFlux> for FluxRecord {
    fn from(row: &ReactionFlux) -> Self {
        Self {
            reaction_id: row.reaction_id.clone(),
            flux_value: row.flux_value,
            reaction_name: row.reaction_name.clone(),
        }
    }
}

impl From<FluxRecord> for ReactionFlux {
    fn from(record: FluxRecord) -> Self {
        ReactionFlux {
            reaction_id: record.reaction_id,
            reaction_name: record.reaction_name,
            flux_value: record.flux_value,
        }
    }
}

/// Write flux rows to a CSV file, in the given order
///
/// The file starts with a UTF-8 byte order mark and a header row, which is written even when
/// there are no rows. Missing parent directories are created.
pub fn write_flux_csv<P: AsRef<Path>>(
    rows: &[ReactionFlux],
    path: P,
) -> Result<PathBuf, ExportError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut file = File::create(path)?;
    file.write_all(UTF8_BOM)?;
    // Header written by hand so an empty table still gets one
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    writer.write_record(CSV_HEADER)?;
    for row in rows {
        writer.serialize(FluxRecord::from(row))?;
    }
    writer.flush()?;

    log::info!("Wrote {} flux rows to {}", rows.len(), path.display());
    Ok(path.to_path_buf())
}

/// Read a flux CSV written by [`write_flux_csv`]
///
/// A leading byte order mark is accepted but not required.
pub fn read_flux_csv<P: AsRef<Path>>(path: P) -> Result<Vec<FluxRecord>, ExportError> {
    let data = fs::read_to_string(path)?;
    let data = data.strip_prefix('\u{feff}').unwrap_or(&data);
    let mut reader = csv::Reader::from_reader(data.as_bytes());
    let records = reader
        .deserialize()
        .collect::<Result<Vec<FluxRecord>, csv::Error>>()?;
    Ok(records)
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Unable to access file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid CSV data: {0}")]
    Csv(#[from] csv::Error),
}
