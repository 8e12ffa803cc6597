//! Shared plot configuration

use plotters::style::{RGBColor, TextStyle};

/// Positive fluxes, bars and edges
pub const PRIMARY_COLOR: RGBColor = RGBColor(0x2E, 0x86, 0xAB);
/// Negative fluxes, log panel and nodes
pub const SECONDARY_COLOR: RGBColor = RGBColor(0xA2, 0x3B, 0x72);

/// Appearance of a rendered chart
///
/// Each chart has its own constructor with sensible sizes and titles, fields can be changed
/// afterwards:
///
/// ```rust
/// use fluxviz_core::plot::PlotConfig;
/// let mut config = PlotConfig::top_reactions(15);
/// config.title = "Largest fluxes".to_string();
/// config.width = 1600;
/// ```
#[derive(Debug, Clone)]
pub struct PlotConfig {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub primary_color: RGBColor,
    pub secondary_color: RGBColor,
    pub font_family: String,
    pub title_font_size: u32,
    pub label_font_size: u32,
    /// Space around each chart in pixels
    pub margin: u32,
}

impl Default for PlotConfig {
    fn default() -> Self {
        PlotConfig {
            width: 1000,
            height: 800,
            title: String::new(),
            x_label: String::new(),
            y_label: String::new(),
            primary_color: PRIMARY_COLOR,
            secondary_color: SECONDARY_COLOR,
            font_family: "sans-serif".to_string(),
            title_font_size: 28,
            label_font_size: 16,
            margin: 20,
        }
    }
}

impl PlotConfig {
    /// Side by side histograms of absolute flux values
    pub fn flux_distribution() -> Self {
        PlotConfig {
            width: 1600,
            height: 600,
            title: "Metabolic flux distribution (E. coli iJO1366)".to_string(),
            x_label: "Absolute flux".to_string(),
            y_label: "Number of reactions".to_string(),
            ..Default::default()
        }
    }

    /// Horizontal bar chart of the `top_n` largest fluxes
    pub fn top_reactions(top_n: usize) -> Self {
        PlotConfig {
            width: 1200,
            height: 800,
            title: format!(
                "Top {} reactions by absolute flux (blue: positive, red: negative)",
                top_n
            ),
            x_label: "Flux value".to_string(),
            label_font_size: 14,
            ..Default::default()
        }
    }

    /// Static glycolysis network diagram
    pub fn pathway() -> Self {
        PlotConfig {
            width: 1000,
            height: 800,
            title: "Core metabolic pathway network (glycolysis)".to_string(),
            ..Default::default()
        }
    }

    /// Scatter plot of the fluxes of two conditions
    pub fn comparison(label1: &str, label2: &str) -> Self {
        PlotConfig {
            width: 1000,
            height: 1000,
            title: format!("Flux comparison: {} vs {}", label1, label2),
            x_label: format!("{} flux", label1),
            y_label: format!("{} flux", label2),
            ..Default::default()
        }
    }

    pub(crate) fn title_style(&self) -> TextStyle<'_> {
        TextStyle::from((self.font_family.as_str(), self.title_font_size))
    }

    pub(crate) fn label_style(&self) -> TextStyle<'_> {
        TextStyle::from((self.font_family.as_str(), self.label_font_size))
    }
}
