//! Run orchestrator: surface, optional central crater, then the population.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::info;

use crate::config::{PopulationMode, SimulationConfig};
use crate::error::Result;
use crate::grid::RasterGrid;
use crate::population::{add_craters_from_csfd, add_craters_power_law, central_crater, PlacedCrater, PopulationReport};
use crate::surface::make_noisy_surface;

/// Elevation statistics of the final surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurfaceSummary {
    pub seed: u64,
    pub min_elevation: f64,
    pub max_elevation: f64,
    pub mean_elevation: f64,
    pub craters: usize,
    pub largest_diameter_km: Option<f64>,
    pub warnings: usize,
}

impl SurfaceSummary {
    pub fn from_run(seed: u64, grid: &RasterGrid, report: &PopulationReport) -> Self {
        Self {
            seed,
            min_elevation: grid.min_elevation(),
            max_elevation: grid.max_elevation(),
            mean_elevation: grid.mean_elevation(),
            craters: report.craters.len(),
            largest_diameter_km: report.largest_diameter_km(),
            warnings: report.warnings.len(),
        }
    }
}

pub struct SimulationResult {
    pub grid: RasterGrid,
    /// Central crater first when one was requested, then the population.
    pub report: PopulationReport,
    pub summary: SurfaceSummary,
}

pub struct CraterSimulator;

impl CraterSimulator {
    pub fn new() -> Self {
        Self
    }

    /// Run one simulation. The whole run draws from a single generator
    /// seeded with `config.seed`, so equal configs give equal surfaces.
    ///
    /// Stages:
    ///   1. Initial surface
    ///   2. Central crater, if any
    ///   3. Crater population
    pub fn run(&self, config: &SimulationConfig) -> Result<SimulationResult> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(config.seed);

        // ── 1. Surface ──────────────────────────────────────────────────────
        let mut grid = make_noisy_surface(
            config.grid_length_m,
            config.cell_size_m,
            config.slope,
            config.roughness,
            config.surface,
            &mut rng,
        )?;
        info!(seed = config.seed, nodes = grid.node_count(), "initial surface ready");

        // ── 2. Central crater ───────────────────────────────────────────────
        let mut report = PopulationReport::default();
        if let Some(diameter_km) = config.central_crater_km {
            central_crater(&mut grid, diameter_km, config.rim, &mut rng)?;
            let half = (grid.grid_length() / 2.0).floor();
            report.craters.push(PlacedCrater { diameter_km, center: (half, half), time_ga: None });
        }

        // ── 3. Population ───────────────────────────────────────────────────
        let population = match &config.population {
            PopulationMode::None => PopulationReport::default(),
            PopulationMode::PowerLaw { count, min_km, max_km } => {
                add_craters_power_law(&mut grid, *count, *min_km, *max_km, config.rim, &mut rng)?
            }
            PopulationMode::Csfd { .. } => match config.csfd_params()? {
                Some(params) => add_craters_from_csfd(
                    &mut grid,
                    &config.production,
                    &config.chronology,
                    params,
                    config.rim,
                    &mut rng,
                )?,
                None => PopulationReport::default(),
            },
        };
        report.craters.extend(population.craters);
        report.warnings.extend(population.warnings);

        let summary = SurfaceSummary::from_run(config.seed, &grid, &report);
        info!(
            craters = summary.craters,
            min = summary.min_elevation,
            max = summary.max_elevation,
            "simulation finished"
        );
        Ok(SimulationResult { grid, report, summary })
    }
}

impl Default for CraterSimulator {
    fn default() -> Self {
        Self::new()
    }
}
