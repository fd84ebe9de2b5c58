//! Command-line runner: one cratered surface, or an ensemble of seeds.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use crater_core::{CraterSimulator, PopulationMode, SimulationConfig, SurfaceSummary};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "crater-sim", version, about = "Impact-crater surface evolution")]
struct Args {
    /// JSON config; missing fields take their defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    seed: Option<u64>,

    /// Domain edge length (m).
    #[arg(long)]
    grid_length: Option<f64>,

    /// Node spacing (m).
    #[arg(long)]
    cell_size: Option<f64>,

    /// Excavate bowls without rims or ejecta.
    #[arg(long)]
    no_rim: bool,

    /// Diameter (km) of a crater at the domain centre.
    #[arg(long)]
    central_crater: Option<f64>,

    /// Oldest time of the impact interval (Ga). Switches to the CSFD population.
    #[arg(long)]
    start_ga: Option<f64>,

    /// Youngest time of the impact interval (Ga). Switches to the CSFD population.
    #[arg(long)]
    end_ga: Option<f64>,

    /// Run this many consecutive seeds in parallel and report each summary.
    #[arg(long)]
    ensemble: Option<usize>,

    /// Include the midline elevation profile in the report.
    #[arg(long)]
    profile: bool,

    /// Write the final grid as JSON.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log verbosity.
    #[arg(short, long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

#[derive(Serialize)]
struct RunReport<'a> {
    summary: &'a SurfaceSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    profile: Option<&'a [f64]>,
    warnings: Vec<String>,
}

fn load_config(args: &Args) -> Result<SimulationConfig> {
    let mut cfg = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            SimulationConfig::from_json_str(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None => SimulationConfig::default(),
    };

    if let Some(seed) = args.seed {
        cfg.seed = seed;
    }
    if let Some(length) = args.grid_length {
        cfg.grid_length_m = length;
    }
    if let Some(cell) = args.cell_size {
        cfg.cell_size_m = cell;
    }
    if args.no_rim {
        cfg.rim = false;
    }
    if args.central_crater.is_some() {
        cfg.central_crater_km = args.central_crater;
    }
    if args.start_ga.is_some() || args.end_ga.is_some() {
        let current = match cfg.population {
            PopulationMode::Csfd { .. } => cfg.population.clone(),
            _ => PopulationMode::default_csfd(),
        };
        if let PopulationMode::Csfd { start_ga, end_ga, size_interval_km, poisson, max_events } = current {
            cfg.population = PopulationMode::Csfd {
                start_ga: args.start_ga.unwrap_or(start_ga),
                end_ga: args.end_ga.unwrap_or(end_ga),
                size_interval_km,
                poisson,
                max_events,
            };
        }
    }

    cfg.validate().context("invalid simulation config")?;
    Ok(cfg)
}

fn run_ensemble(cfg: &SimulationConfig, members: usize) -> Result<Vec<SurfaceSummary>> {
    info!(members, first_seed = cfg.seed, "running ensemble");
    (0..members as u64)
        .into_par_iter()
        .map(|offset| {
            let member = SimulationConfig { seed: cfg.seed.wrapping_add(offset), ..cfg.clone() };
            CraterSimulator::new()
                .run(&member)
                .map(|result| result.summary)
                .with_context(|| format!("ensemble seed {}", member.seed))
        })
        .collect()
}

fn main() -> Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::from(args.log_level))
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cfg = load_config(&args)?;

    if let Some(members) = args.ensemble {
        let summaries = run_ensemble(&cfg, members)?;
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    let result = CraterSimulator::new().run(&cfg).context("simulation failed")?;

    if let Some(path) = &args.output {
        let json = serde_json::to_string(&result.grid)?;
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "grid written");
    }

    let mid_row = result.grid.rows / 2;
    let report = RunReport {
        summary: &result.summary,
        profile: args.profile.then(|| result.grid.row_profile(mid_row)),
        warnings: result.report.warnings.iter().map(ToString::to_string).collect(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_parses_known_names_only() {
        let args = Args::try_parse_from(["crater-sim", "--log-level", "debug"]).unwrap();
        assert_eq!(Level::from(args.log_level), Level::DEBUG);
        let args = Args::try_parse_from(["crater-sim"]).unwrap();
        assert_eq!(Level::from(args.log_level), Level::INFO);
        assert!(Args::try_parse_from(["crater-sim", "--log-level", "verbose"]).is_err());
    }

    #[test]
    fn time_flags_switch_to_csfd() {
        let args = Args::try_parse_from(["crater-sim", "--start-ga", "3.9"]).unwrap();
        let cfg = load_config(&args).unwrap();
        assert!(matches!(cfg.population, PopulationMode::Csfd { start_ga, end_ga, .. } if start_ga == 3.9 && end_ga == 3.0));
    }
}
