//! One-shot FBA run: load a model, solve it, export the fluxes and chart them
//!
//! [`run`] executes the steps in order and stops at the first failing one, except for the
//! charts which are drawn one by one and only warn when they fail. Progress is reported
//! through a [`RunObserver`], [`LogObserver`] forwards it to the `log` facade.
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};

use derive_builder::Builder;
use thiserror::Error;

use crate::configuration::Configuration;
use crate::export::{write_flux_csv, ExportError};
use crate::flux_analysis::table::{FluxTable, TopReactions};
use crate::flux_analysis::OptimizeError;
use crate::io::{read_model, IoError};
use crate::metabolic_model::model::ModelError;
use crate::optimize::solvers::LinearSolver;
use crate::optimize::OptimizationStatus;
use crate::plot::{
    plot_core_metabolic_pathway, plot_flux_distribution, plot_top_reactions_bar, PlotConfig,
    PlotError,
};

pub const DEFAULT_MODEL_PATH: &str = "data/iJO1366.xml";
pub const DEFAULT_RESULTS_DIR: &str = "results";
/// Core biomass reaction of iJO1366
pub const DEFAULT_OBJECTIVE: &str = "BIOMASS_Ec_iJO1366_core_53p95M";

pub const FLUX_CSV: &str = "non_zero_flux_results.csv";
pub const DISTRIBUTION_PNG: &str = "flux_distribution.png";
pub const TOP_REACTIONS_PNG: &str = "top_reactions_bar.png";
pub const PATHWAY_PNG: &str = "glycolysis_network.png";

/// Settings of a run
///
/// Every field has a default, so the builder only needs the ones that differ:
///
/// ```rust
/// use fluxviz_core::pipeline::RunSettingsBuilder;
/// let settings = RunSettingsBuilder::default()
///     .model_path("models/e_coli_core.json")
///     .objective("BIOMASS_Ecoli_core_w_GAM")
///     .build()
///     .unwrap();
/// assert_eq!(settings.bar_top_n, 15);
/// ```
#[derive(Builder, Debug, Clone, PartialEq)]
#[builder(default)]
pub struct RunSettings {
    #[builder(setter(into))]
    pub model_path: PathBuf,
    #[builder(setter(into))]
    pub results_dir: PathBuf,
    /// Reaction maximized by the FBA
    #[builder(setter(into))]
    pub objective: String,
    /// Fluxes with a magnitude at or below this are left out of the exported table
    pub negligible_flux: f64,
    /// Number of bars in the top reactions chart
    pub bar_top_n: usize,
    /// Number of reactions listed in the summary
    pub summary_top_n: usize,
    /// Number of bins of each flux histogram
    pub histogram_bins: usize,
    /// Render the PNG charts after exporting the table
    pub charts: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        RunSettings {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            results_dir: PathBuf::from(DEFAULT_RESULTS_DIR),
            objective: DEFAULT_OBJECTIVE.to_string(),
            negligible_flux: Configuration::current().negligible_flux,
            bar_top_n: 15,
            summary_top_n: 10,
            histogram_bins: 50,
            charts: true,
        }
    }
}

/// Steps of a run, in execution order
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Step {
    Preflight,
    LoadModel,
    SetObjective,
    Solve,
    BuildTable,
    Export,
    Render,
}

impl Display for Step {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let description = match self {
            Step::Preflight => "Checking inputs",
            Step::LoadModel => "Loading model",
            Step::SetObjective => "Setting objective",
            Step::Solve => "Running flux balance analysis",
            Step::BuildTable => "Building flux table",
            Step::Export => "Exporting results",
            Step::Render => "Rendering charts",
        };
        write!(f, "{}", description)
    }
}

/// Receives the progress of a run
pub trait RunObserver {
    fn step_started(&mut self, step: Step);

    fn step_finished(&mut self, step: Step, detail: &str);

    /// Something unexpected which does not stop the run
    fn warning(&mut self, step: Step, message: &str);

    fn step_failed(&mut self, step: Step, error: &PipelineError);
}

/// Reports progress through the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl RunObserver for LogObserver {
    fn step_started(&mut self, step: Step) {
        log::info!("{}...", step);
    }

    fn step_finished(&mut self, step: Step, detail: &str) {
        log::info!("✓ {}: {}", step, detail);
    }

    fn warning(&mut self, step: Step, message: &str) {
        log::warn!("⚠ {}: {}", step, message);
    }

    fn step_failed(&mut self, step: Step, error: &PipelineError) {
        log::error!("✗ {} failed: {}", step, error);
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub model_id: String,
    pub reaction_count: usize,
    pub metabolite_count: usize,
    pub gene_count: usize,
    pub status: OptimizationStatus,
    pub objective_value: Option<f64>,
    /// Rows of the full flux table, one per reaction
    pub total_rows: usize,
    /// Rows above the negligible flux threshold
    pub retained_rows: usize,
    pub top_reactions: TopReactions,
    /// Written files, the CSV table first
    pub outputs: Vec<PathBuf>,
}

impl Display for RunSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Model {}: {} reactions, {} metabolites, {} genes",
            self.model_id, self.reaction_count, self.metabolite_count, self.gene_count
        )?;
        match self.objective_value {
            Some(value) => writeln!(f, "Status: {}, objective value: {:.6}", self.status, value)?,
            None => writeln!(f, "Status: {}, no objective value", self.status)?,
        }
        writeln!(
            f,
            "Reactions with non-negligible flux: {} of {}",
            self.retained_rows, self.total_rows
        )?;
        writeln!(f)?;
        writeln!(f, "Top {} reactions by absolute flux:", self.top_reactions.len())?;
        writeln!(f, "{:<32} {:>14}  Name", "Reaction", "Flux")?;
        for row in self.top_reactions.rows() {
            writeln!(
                f,
                "{:<32} {:>14.6}  {}",
                row.reaction_id, row.flux_value, row.reaction_name
            )?;
        }
        Ok(())
    }
}

/// Run every step with `settings`, solving with `solver`
///
/// A non-optimal solver status is reported as a warning and the run goes on with the
/// fluxes the solver returned. Charts are rendered independently, a chart which can't be
/// drawn is reported as a warning and left out of the summary outputs. Any other error
/// stops the run, the observer is told which step failed before the error is returned.
pub fn run<S: LinearSolver, O: RunObserver>(
    settings: &RunSettings,
    solver: &S,
    observer: &mut O,
) -> Result<RunSummary, PipelineError> {
    attempt(observer, Step::Preflight, || preflight(settings))?;
    observer.step_finished(
        Step::Preflight,
        &format!("results go to {}", settings.results_dir.display()),
    );

    let mut model = attempt(observer, Step::LoadModel, || {
        Ok(read_model(&settings.model_path)?)
    })?;
    observer.step_finished(Step::LoadModel, &model.to_string());

    attempt(observer, Step::SetObjective, || {
        Ok(model.set_objective(&settings.objective)?)
    })?;
    observer.step_finished(Step::SetObjective, &model.objective_expression());

    let solution = attempt(observer, Step::Solve, || Ok(model.optimize(solver)?))?;
    if !solution.is_optimal() {
        observer.warning(
            Step::Solve,
            &format!(
                "solver status is {}, continuing with the returned fluxes",
                solution.status
            ),
        );
    }
    if solution.fluxes.is_none() {
        let error = PipelineError::NoFluxes(solution.status);
        observer.step_failed(Step::Solve, &error);
        return Err(error);
    }
    match solution.objective_value {
        Some(value) => observer.step_finished(
            Step::Solve,
            &format!("{} with objective value {:.6}", solution.status, value),
        ),
        None => observer.step_finished(Step::Solve, &solution.status.to_string()),
    }

    observer.step_started(Step::BuildTable);
    let table = FluxTable::build(&model, &solution);
    let filtered = table.filter_and_rank(settings.negligible_flux);
    let top_reactions = filtered.top_n(settings.summary_top_n);
    observer.step_finished(
        Step::BuildTable,
        &format!(
            "{} of {} reactions carry flux above {:e}",
            filtered.len(),
            table.len(),
            settings.negligible_flux
        ),
    );

    let csv_path = settings.results_dir.join(FLUX_CSV);
    let csv_path = attempt(observer, Step::Export, || {
        Ok(write_flux_csv(filtered.rows(), &csv_path)?)
    })?;
    observer.step_finished(Step::Export, &csv_path.display().to_string());
    let mut outputs = vec![csv_path.clone()];

    if settings.charts {
        observer.step_started(Step::Render);
        let charts = render_charts(settings, &csv_path);
        let attempted = charts.len();
        let mut rendered = 0;
        for (chart, result) in charts {
            match result {
                Ok(path) => {
                    outputs.push(path);
                    rendered += 1;
                }
                Err(source) => {
                    let error = PipelineError::Render { chart, source };
                    observer.warning(Step::Render, &error.to_string());
                }
            }
        }
        observer.step_finished(
            Step::Render,
            &format!("{} of {} charts", rendered, attempted),
        );
    }

    Ok(RunSummary {
        model_id: model.id.clone().unwrap_or_default(),
        reaction_count: model.reactions.len(),
        metabolite_count: model.metabolites.len(),
        gene_count: model.genes.len(),
        status: solution.status,
        objective_value: solution.objective_value,
        total_rows: table.len(),
        retained_rows: filtered.len(),
        top_reactions,
        outputs,
    })
}

/// Start `step` and report it as failed if `action` errors
fn attempt<T, O: RunObserver>(
    observer: &mut O,
    step: Step,
    action: impl FnOnce() -> Result<T, PipelineError>,
) -> Result<T, PipelineError> {
    observer.step_started(step);
    action().inspect_err(|err| observer.step_failed(step, err))
}

fn preflight(settings: &RunSettings) -> Result<(), PipelineError> {
    if !settings.model_path.is_file() {
        return Err(PipelineError::ModelFileMissing(settings.model_path.clone()));
    }
    fs::create_dir_all(&settings.results_dir).map_err(ExportError::from)?;
    Ok(())
}

/// Draw every chart, each one independently of the others
fn render_charts(
    settings: &RunSettings,
    csv_path: &Path,
) -> Vec<(&'static str, Result<PathBuf, PlotError>)> {
    vec![
        (
            "flux distribution",
            plot_flux_distribution(
                csv_path,
                settings.results_dir.join(DISTRIBUTION_PNG),
                settings.histogram_bins,
                &PlotConfig::flux_distribution(),
            ),
        ),
        (
            "top reactions",
            plot_top_reactions_bar(
                csv_path,
                settings.bar_top_n,
                settings.results_dir.join(TOP_REACTIONS_PNG),
                &PlotConfig::top_reactions(settings.bar_top_n),
            ),
        ),
        (
            "glycolysis network",
            plot_core_metabolic_pathway(
                settings.results_dir.join(PATHWAY_PNG),
                &PlotConfig::pathway(),
            ),
        ),
    ]
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Model file {0} not found")]
    ModelFileMissing(PathBuf),
    #[error("Unable to load model: {0}")]
    Load(#[from] IoError),
    #[error("Unable to set objective: {0}")]
    Objective(#[from] ModelError),
    #[error("Unable to run FBA: {0}")]
    Solve(#[from] OptimizeError),
    #[error("Solver returned no fluxes (status {0})")]
    NoFluxes(OptimizationStatus),
    #[error("Unable to export results: {0}")]
    Export(#[from] ExportError),
    #[error("Unable to render {chart} chart: {source}")]
    Render {
        chart: &'static str,
        #[source]
        source: PlotError,
    },
}
