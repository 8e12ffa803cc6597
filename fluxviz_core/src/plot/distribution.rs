//! Histograms of absolute flux values
use std::path::{Path, PathBuf};

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::export::read_flux_csv;
use crate::plot::{prepare_output, PlotConfig, PlotError};

/// One histogram bin, `[start, end)`
#[derive(Debug, Clone, PartialEq)]
pub struct Bin {
    pub start: f64,
    pub end: f64,
    pub count: u32,
}

/// Histogram with `bins` equal width bins between the smallest and largest value
///
/// The last bin includes the largest value. When every value is the same the bins span one
/// unit around it.
pub fn linear_bins(values: &[f64], bins: usize) -> Vec<Bin> {
    let Some((min, max)) = value_range(values) else {
        return Vec::new();
    };
    let (min, max) = if min == max {
        (min - 0.5, max + 0.5)
    } else {
        (min, max)
    };
    let width = (max - min) / bins as f64;
    let edges: Vec<f64> = (0..=bins).map(|i| min + width * i as f64).collect();
    histogram(values, &edges)
}

/// Histogram with `bins` bins of equal width on a log scale, for positive values
///
/// Values which are not strictly positive are left out.
pub fn log_bins(values: &[f64], bins: usize) -> Vec<Bin> {
    let positive: Vec<f64> = values.iter().copied().filter(|v| *v > 0.).collect();
    let Some((min, max)) = value_range(&positive) else {
        return Vec::new();
    };
    let (log_min, log_max) = if min == max {
        (min.log10() - 0.5, max.log10() + 0.5)
    } else {
        (min.log10(), max.log10())
    };
    let width = (log_max - log_min) / bins as f64;
    let mut edges: Vec<f64> = (0..=bins)
        .map(|i| 10f64.powf(log_min + width * i as f64))
        .collect();
    // Keep the extremes exact so rounding in powf can't drop them
    if min != max {
        edges[0] = min;
        edges[bins] = max;
    }
    histogram(&positive, &edges)
}

fn value_range(values: &[f64]) -> Option<(f64, f64)> {
    let finite = values.iter().copied().filter(|v| v.is_finite());
    finite.fold(None, |range, v| match range {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Count values into the bins delimited by `edges`, the last bin is closed
fn histogram(values: &[f64], edges: &[f64]) -> Vec<Bin> {
    if edges.len() < 2 {
        return Vec::new();
    }
    let last = edges.len() - 2;
    let mut bins: Vec<Bin> = edges
        .windows(2)
        .map(|edge| Bin {
            start: edge[0],
            end: edge[1],
            count: 0,
        })
        .collect();
    for value in values.iter().filter(|v| v.is_finite()) {
        if *value < edges[0] || *value > edges[last + 1] {
            continue;
        }
        let index = edges.partition_point(|edge| edge <= value).saturating_sub(1);
        bins[index.min(last)].count += 1;
    }
    bins
}

/// Draw side by side histograms of the absolute flux values of a flux CSV
///
/// The left panel uses `bins` linear bins, the right panel `bins` log spaced bins on a log
/// x axis.
pub fn plot_flux_distribution<P: AsRef<Path>, Q: AsRef<Path>>(
    flux_csv: P,
    output: Q,
    bins: usize,
    config: &PlotConfig,
) -> Result<PathBuf, PlotError> {
    let records = read_flux_csv(flux_csv)?;
    if records.is_empty() {
        return Err(PlotError::EmptyData);
    }
    let flux_abs: Vec<f64> = records.iter().map(|r| r.flux_value.abs()).collect();
    let bins = bins.max(1);
    let linear = linear_bins(&flux_abs, bins);
    let log = log_bins(&flux_abs, bins);

    let output = output.as_ref();
    prepare_output(output)?;
    let root = BitMapBackend::new(output, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled(&config.title, config.title_style())?;
    let (left, right) = root.split_horizontally(config.width / 2);

    draw_linear_panel(&left, &linear, config)?;
    if log.is_empty() {
        log::warn!("No positive flux values, the log scale histogram is left empty");
    } else {
        draw_log_panel(&right, &log, config)?;
    }

    root.present()?;
    log::info!("Flux distribution saved to {}", output.display());
    Ok(output.to_path_buf())
}

fn max_count(bins: &[Bin]) -> u32 {
    bins.iter().map(|bin| bin.count).max().unwrap_or(0)
}

fn draw_linear_panel(
    area: &DrawingArea<BitMapBackend, Shift>,
    bins: &[Bin],
    config: &PlotConfig,
) -> Result<(), PlotError> {
    let (Some(first), Some(last)) = (bins.first(), bins.last()) else {
        return Ok(());
    };
    let mut chart = ChartBuilder::on(area)
        .caption("Linear scale", config.label_style())
        .margin(config.margin)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(first.start..last.end, 0u32..max_count(bins) + 1)?;
    chart
        .configure_mesh()
        .x_desc(config.x_label.as_str())
        .y_desc(config.y_label.as_str())
        .label_style(config.label_style())
        .light_line_style(WHITE)
        .draw()?;
    let fill = config.primary_color.mix(0.7).filled();
    chart.draw_series(
        bins.iter()
            .map(|bin| Rectangle::new([(bin.start, 0), (bin.end, bin.count)], fill)),
    )?;
    chart.draw_series(bins.iter().filter(|bin| bin.count > 0).map(|bin| {
        Rectangle::new([(bin.start, 0), (bin.end, bin.count)], BLACK.stroke_width(1))
    }))?;
    Ok(())
}

fn draw_log_panel(
    area: &DrawingArea<BitMapBackend, Shift>,
    bins: &[Bin],
    config: &PlotConfig,
) -> Result<(), PlotError> {
    let (Some(first), Some(last)) = (bins.first(), bins.last()) else {
        return Ok(());
    };
    let mut chart = ChartBuilder::on(area)
        .caption("Log scale", config.label_style())
        .margin(config.margin)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(
            (first.start..last.end).log_scale(),
            0u32..max_count(bins) + 1,
        )?;
    chart
        .configure_mesh()
        .x_desc(format!("{} (log scale)", config.x_label))
        .y_desc(config.y_label.as_str())
        .x_label_formatter(&|x: &f64| format!("{:.0e}", x))
        .label_style(config.label_style())
        .light_line_style(WHITE)
        .draw()?;
    let fill = config.secondary_color.mix(0.7).filled();
    chart.draw_series(
        bins.iter()
            .map(|bin| Rectangle::new([(bin.start, 0), (bin.end, bin.count)], fill)),
    )?;
    chart.draw_series(bins.iter().filter(|bin| bin.count > 0).map(|bin| {
        Rectangle::new([(bin.start, 0), (bin.end, bin.count)], BLACK.stroke_width(1))
    }))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total(bins: &[Bin]) -> u32 {
        bins.iter().map(|bin| bin.count).sum()
    }

    #[test]
    fn linear_binning() {
        let values = [0.0, 1.0, 2.5, 5.0, 9.99, 10.0];
        let bins = linear_bins(&values, 10);
        assert_eq!(bins.len(), 10);
        assert!(bins[0].start.abs() < 1e-25);
        assert!((bins[9].end - 10.0).abs() < 1e-12);
        assert_eq!(total(&bins), 6);
        assert_eq!(bins[0].count, 1);
        assert_eq!(bins[1].count, 1);
        assert_eq!(bins[2].count, 1);
        assert_eq!(bins[5].count, 1);
        // 9.99 and the maximum share the closed last bin
        assert_eq!(bins[9].count, 2);
    }

    #[test]
    fn single_value() {
        let bins = linear_bins(&[3.0, 3.0], 4);
        assert_eq!(bins.len(), 4);
        assert_eq!(total(&bins), 2);
        assert!((bins[0].start - 2.5).abs() < 1e-12);
        assert!((bins[3].end - 3.5).abs() < 1e-12);

        let bins = log_bins(&[3.0], 4);
        assert_eq!(total(&bins), 1);
        assert!(bins[0].start < 3.0 && bins[3].end > 3.0);
    }

    #[test]
    fn log_binning() {
        let values = [1e-3, 1e-2, 1e-1, 1.0, 10.0, 100.0];
        let bins = log_bins(&values, 5);
        assert_eq!(bins.len(), 5);
        assert_eq!(total(&bins), 6);
        // Edges are evenly spaced in log space
        for bin in &bins {
            let decades = bin.end.log10() - bin.start.log10();
            assert!((decades - 1.0).abs() < 1e-9);
        }
        assert!((bins[0].start - 1e-3).abs() < 1e-15);
        assert!((bins[4].end - 100.0).abs() < 1e-12);
        assert!(bins[4].count >= 1);
    }

    #[test]
    fn log_binning_skips_non_positive() {
        let bins = log_bins(&[0.0, -1.0, 2.0, 4.0], 2);
        assert_eq!(total(&bins), 2);
        assert!(log_bins(&[0.0, -1.0], 2).is_empty());
    }

    #[test]
    fn empty_values() {
        assert!(linear_bins(&[], 50).is_empty());
        assert!(log_bins(&[], 50).is_empty());
    }

    #[test]
    fn empty_csv_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("empty.csv");
        crate::export::write_flux_csv(&[], &csv).unwrap();
        let result = plot_flux_distribution(
            &csv,
            dir.path().join("out.png"),
            50,
            &PlotConfig::flux_distribution(),
        );
        assert!(matches!(result, Err(PlotError::EmptyData)));
        assert!(!dir.path().join("out.png").exists());
    }
}
