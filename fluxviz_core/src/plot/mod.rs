//! Rendering of flux results to PNG charts with `plotters`
//!
//! # Organization
//!
//! - **config**: Shared plot configuration ([`PlotConfig`])
//! - **distribution**: Histograms of absolute flux values, linear and log scale
//! - **top_reactions**: Bar chart of the reactions carrying the most flux
//! - **pathway**: Static glycolysis network diagram, laid out with a spring layout
//! - **comparison**: Scatter plot of the fluxes of two conditions
//!
//! The charts which show flux values read them from the exported CSV table, see
//! [`crate::export`].
//!
//! | Chart | Function | Default file |
//! |-------|----------|--------------|
//! | Flux histograms | `plot_flux_distribution` | `flux_distribution.png` |
//! | Top reactions | `plot_top_reactions_bar` | `top_reactions_bar.png` |
//! | Glycolysis network | `plot_core_metabolic_pathway` | `glycolysis_network.png` |
//! | Two-condition comparison | `plot_flux_comparison` | `flux_comparison.png` |

pub mod comparison;
pub mod config;
pub mod distribution;
pub mod pathway;
pub mod top_reactions;

use std::fs;
use std::path::Path;

use plotters::drawing::DrawingAreaErrorKind;
use thiserror::Error;

use crate::export::ExportError;

pub use comparison::plot_flux_comparison;
pub use config::PlotConfig;
pub use distribution::plot_flux_distribution;
pub use pathway::plot_core_metabolic_pathway;
pub use top_reactions::plot_top_reactions_bar;

/// Create the directory an image will be written to
fn prepare_output(path: &Path) -> Result<(), PlotError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[derive(Error, Debug)]
pub enum PlotError {
    #[error("Unable to read flux data: {0}")]
    Read(#[from] ExportError),
    #[error("No flux data to plot")]
    EmptyData,
    #[error("The two flux tables share no reactions")]
    NoSharedReactions,
    #[error("Unable to create output directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unable to draw chart: {0}")]
    Drawing(String),
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for PlotError {
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        PlotError::Drawing(err.to_string())
    }
}
