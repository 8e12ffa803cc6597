//! Horizontal bar chart of the reactions carrying the most flux
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::export::read_flux_csv;
use crate::flux_analysis::table::{FluxTable, ReactionFlux, TopReaction};
use crate::plot::{prepare_output, PlotConfig, PlotError};

/// Share of the value span added on each side of the bars, room for the value labels
const VALUE_PADDING: f64 = 0.15;
/// Gap between the end of a bar and its value label, as a share of the value span
const LABEL_OFFSET: f64 = 0.01;

/// Draw the `top_n` reactions of a flux CSV with the largest absolute flux
///
/// Bars are signed, positive fluxes use the primary color and negative fluxes the secondary
/// one. The largest flux is drawn at the top and every bar is labeled with its value.
pub fn plot_top_reactions_bar<P: AsRef<Path>, Q: AsRef<Path>>(
    flux_csv: P,
    top_n: usize,
    output: Q,
    config: &PlotConfig,
) -> Result<PathBuf, PlotError> {
    let rows: Vec<ReactionFlux> = read_flux_csv(flux_csv)?
        .into_iter()
        .map(ReactionFlux::from)
        .collect();
    let top = FluxTable::from(rows).filter_and_rank(0.).top_n(top_n);
    if top.is_empty() {
        return Err(PlotError::EmptyData);
    }
    let rows = top.rows();
    let n = rows.len();
    let values: Vec<f64> = rows.iter().map(|row| row.flux_value).collect();
    let (x_min, x_max) = value_axis_range(&values);
    let offset = (x_max - x_min) * LABEL_OFFSET;

    let output = output.as_ref();
    prepare_output(output)?;
    let root = BitMapBackend::new(output, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(&config.title, config.title_style())
        .margin(config.margin)
        .x_label_area_size(50)
        .y_label_area_size(label_area_width(rows, config.label_font_size))
        .build_cartesian_2d(x_min..x_max, (0i32..n as i32 - 1).into_segmented())?;

    let label_for = |value: &SegmentValue<i32>| match value {
        SegmentValue::CenterOf(position) | SegmentValue::Exact(position) => {
            rank_at(*position, n)
                .map(|rank| rows[rank].reaction_id.clone())
                .unwrap_or_default()
        }
        SegmentValue::Last => String::new(),
    };
    chart
        .configure_mesh()
        .disable_y_mesh()
        .x_desc(config.x_label.as_str())
        .y_labels(n)
        .y_label_formatter(&label_for)
        .label_style(config.label_style())
        .light_line_style(WHITE)
        .draw()?;

    chart.draw_series(rows.iter().enumerate().map(|(rank, row)| {
        let position = bar_position(rank, n);
        let top = if position + 1 < n as i32 {
            SegmentValue::Exact(position + 1)
        } else {
            SegmentValue::Last
        };
        let color = if row.flux_value >= 0. {
            config.primary_color
        } else {
            config.secondary_color
        };
        let mut bar = Rectangle::new(
            [(0., SegmentValue::Exact(position)), (row.flux_value, top)],
            color.mix(0.8).filled(),
        );
        bar.set_margin(4, 4, 0, 0);
        bar
    }))?;

    chart.draw_series(rows.iter().enumerate().map(|(rank, row)| {
        let (x, anchor) = if row.flux_value >= 0. {
            (row.flux_value + offset, HPos::Left)
        } else {
            (row.flux_value - offset, HPos::Right)
        };
        let style = config
            .label_style()
            .pos(Pos::new(anchor, VPos::Center));
        Text::new(
            format!("{:.3}", row.flux_value),
            (x, SegmentValue::CenterOf(bar_position(rank, n))),
            style,
        )
    }))?;

    // Zero line
    chart.draw_series(std::iter::once(PathElement::new(
        vec![
            (0., SegmentValue::Exact(0)),
            (0., SegmentValue::Last),
        ],
        BLACK.stroke_width(1),
    )))?;

    root.present()?;
    log::info!("Top reactions chart saved to {}", output.display());
    Ok(output.to_path_buf())
}

/// Value axis bounds, always including zero and padded for the value labels
fn value_axis_range(values: &[f64]) -> (f64, f64) {
    let min = values.iter().copied().fold(0f64, f64::min);
    let max = values.iter().copied().fold(0f64, f64::max);
    let span = max - min;
    if span <= 0. {
        return (-1., 1.);
    }
    (min - span * VALUE_PADDING, max + span * VALUE_PADDING)
}

/// Segment of the bar with the given rank, rank 0 ends up at the top
fn bar_position(rank: usize, n: usize) -> i32 {
    (n - 1 - rank) as i32
}

/// Inverse of [`bar_position`]
fn rank_at(position: i32, n: usize) -> Option<usize> {
    if position < 0 || position as usize >= n {
        return None;
    }
    Some(n - 1 - position as usize)
}

/// Room for the longest reaction id on the y axis
fn label_area_width(rows: &[TopReaction], font_size: u32) -> u32 {
    let longest = rows
        .iter()
        .map(|row| row.reaction_id.chars().count())
        .max()
        .unwrap_or(0) as u32;
    (longest * font_size * 6 / 10 + 20).max(60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::write_flux_csv;

    #[test]
    fn value_range_includes_zero() {
        let (min, max) = value_axis_range(&[2.0, 10.0]);
        assert!((min + 1.5).abs() < 1e-12);
        assert!((max - 11.5).abs() < 1e-12);

        let (min, max) = value_axis_range(&[-4.0, 6.0]);
        assert!((min + 5.5).abs() < 1e-12);
        assert!((max - 7.5).abs() < 1e-12);

        assert_eq!(value_axis_range(&[0.0]), (-1., 1.));
    }

    #[test]
    fn largest_bar_on_top() {
        assert_eq!(bar_position(0, 5), 4);
        assert_eq!(bar_position(4, 5), 0);
        for rank in 0..5 {
            assert_eq!(rank_at(bar_position(rank, 5), 5), Some(rank));
        }
        assert_eq!(rank_at(5, 5), None);
        assert_eq!(rank_at(-1, 5), None);
    }

    #[test]
    fn empty_csv_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("empty.csv");
        write_flux_csv(&[], &csv).unwrap();
        let result = plot_top_reactions_bar(
            &csv,
            15,
            dir.path().join("bars.png"),
            &PlotConfig::top_reactions(15),
        );
        assert!(matches!(result, Err(PlotError::EmptyData)));
    }

    #[test]
    fn zero_rows_requested() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("flux.csv");
        write_flux_csv(&[ReactionFlux::new("PGI", "", 4.0)], &csv).unwrap();
        let result = plot_top_reactions_bar(
            &csv,
            0,
            dir.path().join("bars.png"),
            &PlotConfig::top_reactions(0),
        );
        assert!(matches!(result, Err(PlotError::EmptyData)));
    }
}
