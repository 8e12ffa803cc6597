//! Tabular views of an FBA flux distribution
use std::cmp::Ordering;

use crate::flux_analysis::FbaSolution;
use crate::metabolic_model::model::Model;

/// Flux of a single reaction in a solved model
#[derive(Debug, Clone, PartialEq)]
pub struct ReactionFlux {
    pub reaction_id: String,
    /// Display name of the reaction, empty when the model gives none
    pub reaction_name: String,
    pub flux_value: f64,
}

impl ReactionFlux {
    pub fn new(reaction_id: &str, reaction_name: &str, flux_value: f64) -> Self {
        ReactionFlux {
            reaction_id: reaction_id.to_string(),
            reaction_name: reaction_name.to_string(),
            flux_value,
        }
    }

    pub fn flux_abs(&self) -> f64 {
        self.flux_value.abs()
    }
}

/// Flux of every reaction of a model, in model order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FluxTable {
    rows: Vec<ReactionFlux>,
}

impl FluxTable {
    /// Build the table from a model and the solution of optimizing it
    ///
    /// One row is produced for every reaction of the model, in model order, whatever its
    /// flux value.
    ///
    /// # Panics
    /// If the solution carries no flux map, or the flux map is missing a reaction of the
    /// model. Callers must check [`FbaSolution::fluxes`] before building the table.
    pub fn build(model: &Model, solution: &FbaSolution) -> FluxTable {
        let fluxes = solution
            .fluxes
            .as_ref()
            .expect("FBA solution has no flux values, check the solution status before building a flux table");
        let rows = model
            .reactions
            .values()
            .map(|reaction| {
                let flux = fluxes.get(&reaction.id).unwrap_or_else(|| {
                    panic!("FBA solution has no flux for reaction {}", reaction.id)
                });
                ReactionFlux::new(&reaction.id, reaction.display_name(), *flux)
            })
            .collect();
        FluxTable { rows }
    }

    pub fn rows(&self) -> &[ReactionFlux] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Keep the rows whose flux magnitude is strictly greater than `epsilon`, ordered by
    /// decreasing magnitude
    ///
    /// Rows of equal magnitude keep their relative order.
    ///
    /// # Examples
    /// ```rust
    /// use fluxviz_core::flux_analysis::table::{FluxTable, ReactionFlux};
    /// let table = FluxTable::from(vec![
    ///     ReactionFlux::new("A", "", 1.0),
    ///     ReactionFlux::new("B", "", 0.0),
    ///     ReactionFlux::new("C", "", -2.0),
    /// ]);
    /// let ranked = table.filter_and_rank(1e-6);
    /// let ids: Vec<&str> = ranked.rows().iter().map(|r| r.reaction_id.as_str()).collect();
    /// assert_eq!(ids, vec!["C", "A"]);
    /// ```
    pub fn filter_and_rank(&self, epsilon: f64) -> FilteredFluxTable {
        filter_and_rank_rows(&self.rows, epsilon)
    }
}

impl From<Vec<ReactionFlux>> for FluxTable {
    fn from(rows: Vec<ReactionFlux>) -> Self {
        FluxTable { rows }
    }
}

/// Rows of a [`FluxTable`] above a magnitude threshold, largest magnitude first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredFluxTable {
    rows: Vec<ReactionFlux>,
}

impl FilteredFluxTable {
    pub fn rows(&self) -> &[ReactionFlux] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Filter and rank again, ranking an already ranked table leaves it unchanged
    pub fn filter_and_rank(&self, epsilon: f64) -> FilteredFluxTable {
        filter_and_rank_rows(&self.rows, epsilon)
    }

    /// The `n` reactions with the largest flux magnitude
    ///
    /// Returns every row when the table has fewer than `n` rows.
    pub fn top_n(&self, n: usize) -> TopReactions {
        TopReactions {
            rows: self
                .rows
                .iter()
                .take(n)
                .map(|row| TopReaction {
                    reaction_id: row.reaction_id.clone(),
                    reaction_name: row.reaction_name.clone(),
                    flux_value: row.flux_value,
                    flux_abs: row.flux_abs(),
                })
                .collect(),
        }
    }
}

fn filter_and_rank_rows(rows: &[ReactionFlux], epsilon: f64) -> FilteredFluxTable {
    let mut rows: Vec<ReactionFlux> = rows
        .iter()
        .filter(|row| row.flux_abs() > epsilon)
        .cloned()
        .collect();
    // sort_by is stable, so ties keep their order
    rows.sort_by(|a, b| {
        b.flux_abs()
            .partial_cmp(&a.flux_abs())
            .unwrap_or(Ordering::Equal)
    });
    FilteredFluxTable { rows }
}

/// Row of a [`TopReactions`] view
#[derive(Debug, Clone, PartialEq)]
pub struct TopReaction {
    pub reaction_id: String,
    pub reaction_name: String,
    pub flux_value: f64,
    /// Magnitude of `flux_value`
    pub flux_abs: f64,
}

/// The reactions carrying the most flux, largest magnitude first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopReactions {
    rows: Vec<TopReaction>,
}

impl TopReactions {
    pub fn rows(&self) -> &[TopReaction] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flux_analysis::tests::linear_pathway;
    use crate::metabolic_model::reaction::ReactionBuilder;
    use crate::optimize::solvers::MicroLpSolver;
    use crate::optimize::OptimizationStatus;
    use indexmap::IndexMap;

    fn scenario_table() -> FluxTable {
        FluxTable::from(vec![
            ReactionFlux::new("A", "", 1.0),
            ReactionFlux::new("B", "", 0.0),
            ReactionFlux::new("C", "", -2.0),
            ReactionFlux::new("D", "", 1e-7),
        ])
    }

    fn ids<'a>(rows: impl IntoIterator<Item = &'a ReactionFlux>) -> Vec<&'a str> {
        rows.into_iter().map(|r| r.reaction_id.as_str()).collect()
    }

    fn solution_with(fluxes: &[(&str, f64)]) -> FbaSolution {
        FbaSolution {
            status: OptimizationStatus::Optimal,
            objective_value: Some(0.),
            fluxes: Some(
                fluxes
                    .iter()
                    .map(|(id, flux)| (id.to_string(), *flux))
                    .collect::<IndexMap<String, f64>>(),
            ),
        }
    }

    fn model_with(reactions: &[(&str, Option<&str>)]) -> Model {
        let mut model = Model::new_empty();
        for (id, name) in reactions {
            model.add_reaction(
                ReactionBuilder::default()
                    .id(*id)
                    .name(name.map(|n| n.to_string()))
                    .build()
                    .unwrap(),
            );
        }
        model
    }

    #[test]
    fn build_keeps_model_order_and_every_reaction() {
        let model = model_with(&[("PGI", Some("Glucose-6-phosphate isomerase")), ("PFK", None), ("ZERO", None)]);
        // Solution order differs from model order
        let solution = solution_with(&[("ZERO", 0.), ("PFK", 7.5), ("PGI", -3.)]);
        let table = FluxTable::build(&model, &solution);
        assert_eq!(table.len(), 3);
        assert_eq!(ids(table.rows()), vec!["PGI", "PFK", "ZERO"]);
        assert_eq!(table.rows()[0].reaction_name, "Glucose-6-phosphate isomerase");
        assert_eq!(table.rows()[1].reaction_name, "");
        assert!((table.rows()[0].flux_value + 3.).abs() < 1e-25);
        assert!(table.rows()[2].flux_value.abs() < 1e-25);
    }

    #[test]
    fn build_from_solved_model() {
        let model = linear_pathway();
        let solution = model.optimize(&MicroLpSolver::default()).unwrap();
        let table = FluxTable::build(&model, &solution);
        assert_eq!(table.len(), model.reactions.len());
        assert_eq!(ids(table.rows()), vec!["EX_A", "R1", "R2", "EX_C", "BIOMASS"]);
        let ranked = table.filter_and_rank(1e-6);
        assert_eq!(ids(ranked.rows()), vec!["EX_A", "R1", "BIOMASS"]);
    }

    #[test]
    #[should_panic(expected = "no flux for reaction PFK")]
    fn build_panics_on_missing_flux() {
        let model = model_with(&[("PGI", None), ("PFK", None)]);
        let solution = solution_with(&[("PGI", 1.)]);
        FluxTable::build(&model, &solution);
    }

    #[test]
    #[should_panic(expected = "no flux values")]
    fn build_panics_without_flux_map() {
        let model = model_with(&[("PGI", None)]);
        let mut solution = solution_with(&[]);
        solution.fluxes = None;
        FluxTable::build(&model, &solution);
    }

    #[test]
    fn filter_and_rank_scenario() {
        let ranked = scenario_table().filter_and_rank(1e-6);
        assert_eq!(ids(ranked.rows()), vec!["C", "A"]);
        assert!((ranked.rows()[0].flux_value + 2.0).abs() < 1e-25);
        assert!((ranked.rows()[1].flux_value - 1.0).abs() < 1e-25);
    }

    #[test]
    fn filter_threshold_is_exclusive() {
        let table = FluxTable::from(vec![
            ReactionFlux::new("AT", "", 0.5),
            ReactionFlux::new("NEG_AT", "", -0.5),
            ReactionFlux::new("ABOVE", "", 0.6),
        ]);
        let ranked = table.filter_and_rank(0.5);
        assert_eq!(ids(ranked.rows()), vec!["ABOVE"]);
    }

    #[test]
    fn ranking_is_stable_on_ties() {
        let table = FluxTable::from(vec![
            ReactionFlux::new("first", "", -4.0),
            ReactionFlux::new("small", "", 1.0),
            ReactionFlux::new("second", "", 4.0),
            ReactionFlux::new("third", "", -4.0),
        ]);
        let ranked = table.filter_and_rank(1e-6);
        assert_eq!(ids(ranked.rows()), vec!["first", "second", "third", "small"]);
    }

    #[test]
    fn ranking_is_idempotent() {
        let ranked = scenario_table().filter_and_rank(1e-6);
        let reranked = ranked.filter_and_rank(1e-6);
        assert_eq!(ranked, reranked);
    }

    #[test]
    fn all_negligible_gives_empty_table() {
        let table = FluxTable::from(vec![
            ReactionFlux::new("A", "", 0.0),
            ReactionFlux::new("B", "", -1e-9),
        ]);
        let ranked = table.filter_and_rank(1e-6);
        assert!(ranked.is_empty());
        assert!(ranked.top_n(5).is_empty());
    }

    #[test]
    fn top_n_scenario() {
        let ranked = scenario_table().filter_and_rank(1e-6);
        let top = ranked.top_n(1);
        assert_eq!(top.len(), 1);
        let row = &top.rows()[0];
        assert_eq!(row.reaction_id, "C");
        assert!((row.flux_value + 2.0).abs() < 1e-25);
        assert!((row.flux_abs - 2.0).abs() < 1e-25);
    }

    #[test]
    fn top_n_bounds() {
        let ranked = scenario_table().filter_and_rank(1e-6);
        assert!(ranked.top_n(0).is_empty());
        assert_eq!(ranked.top_n(2).len(), 2);
        assert_eq!(ranked.top_n(10).len(), 2);
        assert!(FilteredFluxTable::default().top_n(3).is_empty());
    }
}
