//! Scatter plot comparing the fluxes of two conditions
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use plotters::prelude::*;

use crate::export::{read_flux_csv, FluxRecord};
use crate::plot::{prepare_output, PlotConfig, PlotError};

/// Flux of one reaction under both conditions
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedFlux {
    pub reaction_id: String,
    pub flux_1: f64,
    pub flux_2: f64,
}

/// Inner join of two flux tables on the reaction id
///
/// Rows follow the order of `first`. Reactions present in only one table are dropped, a
/// reaction repeated in `second` takes its first value.
pub fn join_fluxes(first: &[FluxRecord], second: &[FluxRecord]) -> Vec<JoinedFlux> {
    let mut lookup: HashMap<&str, f64> = HashMap::with_capacity(second.len());
    for record in second {
        lookup
            .entry(record.reaction_id.as_str())
            .or_insert(record.flux_value);
    }
    first
        .iter()
        .filter_map(|record| {
            lookup
                .get(record.reaction_id.as_str())
                .map(|flux_2| JoinedFlux {
                    reaction_id: record.reaction_id.clone(),
                    flux_1: record.flux_value,
                    flux_2: *flux_2,
                })
        })
        .collect()
}

/// Draw the fluxes of the reactions shared by two flux CSVs against each other
///
/// Each shared reaction is a point, `label1` on the x axis and `label2` on the y axis. A
/// dashed `y = x` diagonal marks equal flux.
pub fn plot_flux_comparison<P: AsRef<Path>, Q: AsRef<Path>, R: AsRef<Path>>(
    flux_csv1: P,
    flux_csv2: Q,
    label1: &str,
    label2: &str,
    output: R,
    config: &PlotConfig,
) -> Result<PathBuf, PlotError> {
    let first = read_flux_csv(flux_csv1)?;
    let second = read_flux_csv(flux_csv2)?;
    let joined = join_fluxes(&first, &second);
    if joined.is_empty() {
        return Err(PlotError::NoSharedReactions);
    }
    log::debug!(
        "{} reactions shared between {} and {}",
        joined.len(),
        label1,
        label2
    );
    let limit = diagonal_limit(&joined);

    let output = output.as_ref();
    prepare_output(output)?;
    let root = BitMapBackend::new(output, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(&config.title, config.title_style())
        .margin(config.margin)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(-limit..limit, -limit..limit)?;
    chart
        .configure_mesh()
        .x_desc(config.x_label.as_str())
        .y_desc(config.y_label.as_str())
        .label_style(config.label_style())
        .light_line_style(WHITE)
        .draw()?;

    let point_style = config.primary_color.mix(0.6).filled();
    chart.draw_series(
        joined
            .iter()
            .map(|flux| Circle::new((flux.flux_1, flux.flux_2), 4, point_style)),
    )?;

    let diagonal_style = RED.mix(0.5).stroke_width(2);
    chart
        .draw_series(DashedLineSeries::new(
            vec![(-limit, -limit), (limit, limit)],
            10,
            6,
            diagonal_style,
        ))?
        .label("y=x")
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], diagonal_style));

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .label_font(config.label_style())
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    log::info!("Flux comparison saved to {}", output.display());
    Ok(output.to_path_buf())
}

/// Half width of the square plotting area, the largest flux magnitude of either condition
fn diagonal_limit(joined: &[JoinedFlux]) -> f64 {
    let largest = joined
        .iter()
        .map(|flux| flux.flux_1.abs().max(flux.flux_2.abs()))
        .filter(|value| value.is_finite())
        .fold(0f64, f64::max);
    if largest > 0. {
        largest * 1.05
    } else {
        1.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::write_flux_csv;
    use crate::flux_analysis::table::ReactionFlux;

    fn record(id: &str, flux: f64) -> FluxRecord {
        FluxRecord {
            reaction_id: id.to_string(),
            flux_value: flux,
            reaction_name: String::new(),
        }
    }

    #[test]
    fn join_keeps_shared_reactions_in_first_order() {
        let first = vec![record("PGI", 4.0), record("HEX1", 10.0), record("ATPM", 1.0)];
        let second = vec![record("ATPM", 2.0), record("PFK", 3.0), record("PGI", -1.0)];
        let joined = join_fluxes(&first, &second);
        assert_eq!(
            joined,
            vec![
                JoinedFlux {
                    reaction_id: "PGI".to_string(),
                    flux_1: 4.0,
                    flux_2: -1.0,
                },
                JoinedFlux {
                    reaction_id: "ATPM".to_string(),
                    flux_1: 1.0,
                    flux_2: 2.0,
                },
            ]
        );
    }

    #[test]
    fn join_without_overlap_is_empty() {
        let joined = join_fluxes(&[record("A", 1.0)], &[record("B", 1.0)]);
        assert!(joined.is_empty());
        assert!(join_fluxes(&[], &[record("B", 1.0)]).is_empty());
    }

    #[test]
    fn duplicate_ids_use_first_value() {
        let joined = join_fluxes(&[record("A", 1.0)], &[record("A", 5.0), record("A", 7.0)]);
        assert_eq!(joined.len(), 1);
        assert!((joined[0].flux_2 - 5.0).abs() < 1e-25);
    }

    #[test]
    fn limit_covers_both_axes() {
        let joined = join_fluxes(
            &[record("A", -8.0), record("B", 1.0)],
            &[record("A", 2.0), record("B", 4.0)],
        );
        assert!((diagonal_limit(&joined) - 8.4).abs() < 1e-12);
        assert!((diagonal_limit(&[]) - 1.).abs() < 1e-25);
    }

    #[test]
    fn no_shared_reactions_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.csv");
        let second = dir.path().join("second.csv");
        write_flux_csv(&[ReactionFlux::new("A", "", 1.0)], &first).unwrap();
        write_flux_csv(&[ReactionFlux::new("B", "", 1.0)], &second).unwrap();
        let result = plot_flux_comparison(
            &first,
            &second,
            "glucose",
            "acetate",
            dir.path().join("comparison.png"),
            &PlotConfig::comparison("glucose", "acetate"),
        );
        assert!(matches!(result, Err(PlotError::NoSharedReactions)));
    }
}
