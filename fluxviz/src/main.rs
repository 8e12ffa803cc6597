use std::path::Path;

use fluxviz_core::optimize::solvers::MicroLpSolver;
use fluxviz_core::pipeline::{self, LogObserver, PipelineError, RunSettings, RunSummary};

const RULE: &str = "============================================================";

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    println!("{}", RULE);
    println!("E. coli metabolic flux balance analysis");
    println!("{}", RULE);

    let settings = RunSettings::default();
    let solver = MicroLpSolver::default();
    match pipeline::run(&settings, &solver, &mut LogObserver) {
        Ok(summary) => print_summary(&summary, &settings),
        Err(PipelineError::ModelFileMissing(path)) => {
            log::error!("✗ Model file {} not found", path.display());
            print_download_instructions(&path);
        }
        Err(err) => log::error!("✗ Analysis stopped: {}", err),
    }
}

fn print_download_instructions(path: &Path) {
    println!();
    println!("{}", RULE);
    println!("Getting the model");
    println!("{}", RULE);
    println!("1. Open the BiGG Models page: https://bigg.ucsd.edu/models/iJO1366");
    println!("2. Click 'Download SBML' to get iJO1366.xml");
    println!("3. Save the file as {}", path.display());
    println!("4. Run fluxviz again");
}

fn print_summary(summary: &RunSummary, settings: &RunSettings) {
    println!();
    println!("{}", RULE);
    println!("Analysis complete");
    println!("{}", RULE);
    print!("{}", summary);

    println!();
    println!("Files written:");
    for output in &summary.outputs {
        println!("  - {}", output.display());
    }

    println!();
    println!("Next steps:");
    println!(
        "  1. Look through the charts in {}",
        settings.results_dir.display()
    );
    println!("  2. Study the reactions with non-zero flux to find the active pathways");
    println!("  3. Change the objective reaction to explore other metabolic strategies");
    println!("  4. Replace the model file to analyse another organism");
    println!("{}", RULE);
}
