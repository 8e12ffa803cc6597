//! Export of flux results to flat files
mod csv_export;

pub use csv_export::{read_flux_csv, write_flux_csv, ExportError, FluxRecord, CSV_HEADER};
