use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use beam_sim::config::SimConfig;
use beam_sim::dataset::{Dataset, FEATURE_ORDER};
use beam_sim::executor::CalculixExecutor;
use beam_sim::extract::reduce;
use beam_sim::geometry::{BeamCase, BeamShape};
use beam_sim::runner::run_case;

#[derive(Parser, Debug)]
#[command(name = "beam-sim")]
#[command(about = "Pressure-loaded beam simulations with CalculiX")]
struct Cli {
    /// Parent directory for run directories (overrides BEAM_SIM_WORK_DIR)
    #[arg(long, global = true)]
    work_dir: Option<PathBuf>,

    /// Report file to append to (overrides BEAM_SIM_REPORT)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Solve in a temporary directory that is removed afterwards
    #[arg(long, global = true)]
    scratch: bool,

    /// Print the result as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rectangular bar fixed at x=0, pressure on the free end
    Rect {
        #[arg(long, default_value_t = 0.3)]
        length: f64,
        #[arg(long, default_value_t = 0.05)]
        width: f64,
        #[arg(long, default_value_t = 0.05)]
        height: f64,
        #[arg(short, long, default_value_t = 5e6)]
        pressure: f64,
    },
    /// Solid block around the origin, fixed at its bottom, pressure on every face
    Sphere {
        #[arg(long, default_value_t = 0.1)]
        radius: f64,
        #[arg(short, long, default_value_t = 1e6)]
        pressure: f64,
    },
    /// T-section beam fixed at x=0, pressure on the free end
    Tbeam {
        #[arg(long, default_value_t = 0.3)]
        length: f64,
        #[arg(long, alias = "web_thk", default_value_t = 0.02)]
        web_thk: f64,
        #[arg(long, alias = "flange_width", default_value_t = 0.08)]
        flange_width: f64,
        #[arg(long, alias = "flange_thk", default_value_t = 0.02)]
        flange_thk: f64,
        #[arg(short, long, default_value_t = 5e6)]
        pressure: f64,
    },
    /// Summarise a training dataset
    Dataset {
        #[arg(default_value = "ml_dataset.csv")]
        path: PathBuf,
    },
}

impl Command {
    fn case(&self) -> Option<BeamCase> {
        let case = match *self {
            Command::Rect {
                length,
                width,
                height,
                pressure,
            } => BeamCase::new(
                BeamShape::Rect {
                    length,
                    width,
                    height,
                },
                pressure,
            ),
            Command::Sphere { radius, pressure } => {
                BeamCase::new(BeamShape::Sphere { radius }, pressure)
            }
            Command::Tbeam {
                length,
                web_thk,
                flange_width,
                flange_thk,
                pressure,
            } => BeamCase::new(
                BeamShape::TBeam {
                    length,
                    web_thk,
                    flange_width,
                    flange_thk,
                },
                pressure,
            ),
            Command::Dataset { .. } => return None,
        };
        Some(case)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "beam_sim=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    if let Command::Dataset { path } = &cli.command {
        return summarise_dataset(path, cli.json);
    }

    let mut config = SimConfig::from_env();
    if let Some(work_dir) = cli.work_dir {
        config.work_root = work_dir;
    }
    if let Some(output) = cli.output {
        config.report_path = Some(output);
    }
    config.scratch = cli.scratch;

    tracing::info!("Using CalculiX command: {}", config.ccx_path);
    if !CalculixExecutor::new(&config).check_available() {
        tracing::warn!("CalculiX not found or not accessible: {}", config.ccx_path);
        tracing::warn!("Set CALCULIX_PATH environment variable to the correct path");
    }

    let Some(case) = cli.command.case() else {
        return Ok(());
    };

    let outcome = run_case(&config, &case)
        .with_context(|| format!("{} run failed", case.shape.name()))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!(
            "{}: peak total deformation {:.6e} m, report {}",
            outcome.row.shape,
            outcome.peak_deformation(),
            outcome.report_path.display()
        );
    }

    Ok(())
}

fn summarise_dataset(path: &Path, json: bool) -> Result<()> {
    let dataset = Dataset::load(path).with_context(|| format!("loading {}", path.display()))?;

    tracing::info!("Unique shape values: {:?}", dataset.unique_shapes());

    let mut columns = Vec::with_capacity(FEATURE_ORDER.len());
    for (idx, name) in FEATURE_ORDER.iter().enumerate() {
        let summary = reduce(&dataset.feature_column(idx))
            .with_context(|| format!("{} has no samples", path.display()))?;
        tracing::info!(
            "{}: min={:.6e}, max={:.6e}, avg={:.6e}",
            name,
            summary.min,
            summary.max,
            summary.mean
        );
        columns.push((*name, summary));
    }
    let target = reduce(&dataset.targets)?;
    let baseline = dataset.mean_baseline()?;
    tracing::info!(
        "Mean baseline: r2={:.4}, mse={:.6e}",
        baseline.r2,
        baseline.mse
    );

    if json {
        let value = serde_json::json!({
            "samples": dataset.len(),
            "shapes": dataset.unique_shapes(),
            "features": columns.into_iter().collect::<std::collections::BTreeMap<_, _>>(),
            "target": target,
            "mean_baseline": baseline,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!(
            "{} samples, peak deformation min={:.6e}, max={:.6e}, avg={:.6e}, mean baseline mse={:.6e}",
            dataset.len(),
            target.min,
            target.max,
            target.mean,
            baseline.mse
        );
    }

    Ok(())
}
