use std::sync::{LazyLock, RwLock};

/// Flux magnitude at or below which a reaction is considered inactive
pub const NEGLIGIBLE_FLUX: f64 = 1e-6;

pub static CONFIGURATION: LazyLock<RwLock<Configuration>> =
    LazyLock::new(|| RwLock::new(Configuration::default()));

/// Global defaults used when a model or run does not say otherwise
#[derive(Debug, Clone)]
pub struct Configuration {
    /// Lower flux bound for reactions without an explicit bound
    pub lower_bound: f64,
    /// Upper flux bound for reactions without an explicit bound
    pub upper_bound: f64,
    /// Solver values with a smaller magnitude are reported as exactly zero
    pub tolerance: f64,
    /// Threshold used when filtering flux tables
    pub negligible_flux: f64,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            lower_bound: -1000.,
            upper_bound: 1000.,
            tolerance: 1e-09,
            negligible_flux: NEGLIGIBLE_FLUX,
        }
    }
}

impl Configuration {
    /// Snapshot of the global configuration
    ///
    /// A poisoned lock still yields the stored values.
    pub fn current() -> Configuration {
        match CONFIGURATION.read() {
            Ok(config) => config.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}
