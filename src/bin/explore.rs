use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use serde::Deserialize;

use powertrain::integrated::{IntegratedConfig, IntegratedSolver, RankMetric, ResultAnalyzer};
use powertrain::motor::MotorCatalog;
use powertrain::prop::PropDatabase;
use powertrain::battery::CellDatabase;
use powertrain::EngineError;

/// Top-level batch file: database locations plus the analysis itself.
#[derive(Deserialize)]
struct BatchFile {
    /// JSON propeller performance database (required).
    prop_database: PathBuf,
    /// Optional motor preset JSON; built-in presets are used otherwise.
    #[serde(default)]
    motor_presets: Option<PathBuf>,
    /// Optional cell JSON; built-in cells are used otherwise.
    #[serde(default)]
    cell_database: Option<PathBuf>,
    analysis: IntegratedConfig,
}

fn main() -> ExitCode {
    let mut args = env::args().skip(1);
    let Some(config_path) = args.next() else {
        eprintln!("usage: explore <batch-config.yaml>");
        return ExitCode::from(2);
    };

    match run(&config_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(config_path: &str) -> Result<(), EngineError> {
    let text = std::fs::read_to_string(config_path)?;
    let batch: BatchFile = serde_yaml::from_str(&text)?;

    let props = Arc::new(PropDatabase::load(&batch.prop_database)?);
    let motors = Arc::new(match &batch.motor_presets {
        Some(path) => MotorCatalog::load(path)?,
        None => MotorCatalog::builtin(),
    });
    let cells = Arc::new(match &batch.cell_database {
        Some(path) => CellDatabase::load(path)?,
        None => CellDatabase::builtin(),
    });

    let solver = IntegratedSolver::new(batch.analysis, motors, props, cells)?;
    eprintln!(
        "Evaluating {} combinations ({} motors × {} props)...",
        solver.permutation_count(),
        solver.selected_motors().len(),
        solver.selected_props().len(),
    );

    let progress = |p: &powertrain::BatchProgress| {
        // Roughly one line per percent; the counters are cheap to read
        let stride = (p.total / 100).max(1);
        if p.current_index % stride == 0 || p.current_index == p.total {
            eprint!(
                "\r{:>6.1}%  {}/{} ({} valid)  best eff {:.1}%   ",
                p.percent,
                p.current_index,
                p.total,
                p.valid_count,
                p.best_efficiency * 100.0
            );
        }
    };

    let batch_result = solver.run_batch(Some(&progress), None);
    eprintln!();

    let analyzer = ResultAnalyzer::new(&batch_result);
    println!("{}", analyzer.summary_report());

    println!("\nTop 10 by system efficiency:");
    for (rank, result) in analyzer
        .top_by(RankMetric::SystemEfficiency, 10)
        .iter()
        .enumerate()
    {
        println!("{:>2}. {}", rank + 1, result.summary_line());
    }

    Ok(())
}
