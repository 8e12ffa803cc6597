//! Core of fluxviz, flux balance analysis of genome scale metabolic models with CSV and
//! chart output.
//!
//! A typical run reads a model, maximizes a reaction and tabulates the result:
//!
//! ```rust,no_run
//! use fluxviz_core::flux_analysis::table::FluxTable;
//! use fluxviz_core::io::read_model;
//! use fluxviz_core::optimize::solvers::MicroLpSolver;
//!
//! let mut model = read_model("data/iJO1366.xml").unwrap();
//! model.set_objective("BIOMASS_Ec_iJO1366_core_53p95M").unwrap();
//! let solution = model.optimize(&MicroLpSolver::default()).unwrap();
//! let top = FluxTable::build(&model, &solution)
//!     .filter_and_rank(1e-6)
//!     .top_n(10);
//! ```
//!
//! [`pipeline::run`] strings the steps together and adds CSV export and charts.

pub mod configuration;
pub mod export;
pub mod flux_analysis;
pub mod io;
pub mod metabolic_model;
pub mod optimize;
pub mod pipeline;
pub mod plot;
