//! aerograd: command line driver for shape and flow-control optimization.

mod toolkit;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use ag_driver::{run, OptimizerKind, RunPlan};
use ag_optim::NumericBackend;
use ag_types::{Config, GradientMethod, RunOptions};

use crate::toolkit::ToolkitEvaluator;

#[derive(Parser)]
#[command(name = "aerograd")]
#[command(about = "Gradient-based shape and flow-control optimization driver")]
#[command(version)]
struct Cli {
    /// Configuration file (JSON)
    #[arg(short = 'f', long)]
    file: PathBuf,

    /// Project snapshot to resume from; the result is saved under this name
    #[arg(short = 'r', long)]
    name: Option<PathBuf>,

    /// Number of solver partitions
    #[arg(short = 'n', long, default_value = "1")]
    partitions: usize,

    /// Gradient method (CONTINUOUS_ADJOINT, DISCRETE_ADJOINT, FINDIFF, NONE)
    #[arg(short = 'g', long, default_value = "CONTINUOUS_ADJOINT")]
    gradient: String,

    /// Optimization technique (SLSQP, CG, BFGS, POWELL)
    #[arg(short = 'o', long, default_value = "SLSQP")]
    optimization: String,

    /// Reduce console output
    #[arg(short = 'q', long)]
    quiet: bool,

    /// Number of zones
    #[arg(short = 'z', long, default_value = "1")]
    zones: usize,

    /// Command invoked for each design evaluation
    #[arg(long)]
    toolkit: String,

    /// Directory receiving the project snapshot
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.quiet {
        tracing::Level::WARN
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).with_target(false).init();

    let gradient: GradientMethod = cli.gradient.parse()?;
    let optimizer: OptimizerKind = cli.optimization.parse()?;

    let raw = fs::read_to_string(&cli.file)
        .with_context(|| format!("failed to read configuration {}", cli.file.display()))?;
    let config: Config = serde_json::from_str(&raw)
        .with_context(|| format!("invalid configuration {}", cli.file.display()))?;

    info!("aerograd starting ({} optimization)", optimizer);

    let plan = RunPlan {
        config,
        options: RunOptions {
            partitions: cli.partitions,
            zones: cli.zones,
            quiet: cli.quiet,
            gradient,
        },
        optimizer,
        restart: cli.name,
        output_dir: cli.output_dir,
    };

    let backend = NumericBackend::new();
    let mut evaluator = ToolkitEvaluator::new(cli.toolkit, cli.quiet);
    let project = run(plan, &backend, &mut evaluator)?;

    info!("Completed {} evaluations", project.evaluation_count());
    if let Some(best) = project.best() {
        info!(
            "Best design at evaluation {} with objective {:.6e}",
            best.number, best.objective
        );
    }

    Ok(())
}
