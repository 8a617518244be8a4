//! fdfd command-line interface.

mod report;
mod scenario;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use fdfd_solver::{LogMonitor, SolveMode, SolveParams, physical_residual, solve};
use log::LevelFilter;

use crate::report::{Report, write_slice};
use crate::scenario::Scenario;

#[derive(Parser, Debug)]
#[command(name = "fdfd-solve")]
#[command(about = "Frequency-domain Maxwell solver for JSON scenarios", long_about = None)]
#[command(version)]
struct Cli {
    /// Scenario file (JSON)
    #[arg(value_name = "SCENARIO")]
    scenario: PathBuf,

    /// Relative residual tolerance (overrides the scenario)
    #[arg(long)]
    eps: Option<f64>,

    /// Iteration cap (overrides the scenario)
    #[arg(long)]
    max_iters: Option<usize>,

    /// Report progress every N iterations (overrides the scenario)
    #[arg(long, value_name = "N")]
    monitor_every: Option<usize>,

    /// Solve the transposed (adjoint) system
    #[arg(long)]
    adjoint: bool,

    /// Write the JSON report here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Write |E| on the central z plane as CSV
    #[arg(long, value_name = "FILE")]
    slice: Option<PathBuf>,

    /// Verbose output (-v progress, -vv solver setup)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    fn apply_overrides(&self, params: &mut SolveParams) {
        if let Some(eps) = self.eps {
            params.eps = eps;
        }
        if let Some(max_iters) = self.max_iters {
            params.max_iters = max_iters;
        }
        if let Some(n) = self.monitor_every {
            params.monitor_every_n = n;
        }
        if self.adjoint {
            params.mode = SolveMode::Adjoint;
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.level())
        .parse_default_env()
        .init();

    let report = run(&cli)?;

    match &cli.output {
        Some(path) => {
            report.write(path)?;
            println!(
                "{} after {} iterations (residual {:.3e}), report written to {}",
                if report.converged { "Converged" } else { "Did not converge" },
                report.iterations,
                report.physical_residual,
                path.display()
            );
        }
        None => println!("{}", report.to_json()?),
    }

    Ok(())
}

fn run(cli: &Cli) -> Result<Report> {
    let scenario = Scenario::from_path(&cli.scenario)?;
    let mut params = scenario.solve_params();
    cli.apply_overrides(&mut params);

    let shape = scenario.shape();
    log::info!(
        "{} grid, wavelength {} cells (omega {:.4}), {:?} mode",
        shape,
        scenario.wavelength,
        scenario.omega(),
        params.mode
    );

    let z = scenario.coefficients();
    let b = scenario.rhs();

    let start = Instant::now();
    let result = solve(&z, &b, &params, &mut LogMonitor).context("Solve failed")?;
    log::info!("Solve took {:.2?}", start.elapsed());

    let residual = physical_residual(&z, &b, &result.x, &params)?;

    if let Some(path) = &cli.slice {
        write_slice(&result.x, path)?;
    }

    Ok(Report::new(&result, &params, residual))
}
