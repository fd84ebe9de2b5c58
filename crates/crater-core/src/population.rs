//! Drives the deposition kernel over a whole crater population.
//!
//! Craters are applied one at a time in generation order; later impacts
//! overprint earlier ones where they overlap.

use rand::Rng;
use serde::Serialize;
use tracing::{debug, info};

use crate::chronology::ChronologyFunction;
use crate::csfd::{generate, CsfdParams, PowerLawWeights};
use crate::error::{RangeExtrapolationWarning, Result};
use crate::grid::RasterGrid;
use crate::morphology::{apply_crater, CraterEvent, ShapeParams};
use crate::production::ProductionFunction;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlacedCrater {
    pub diameter_km: f64,
    pub center: (f64, f64),
    /// Formation age in Ga, when the crater came from the time process.
    pub time_ga: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PopulationReport {
    pub craters: Vec<PlacedCrater>,
    pub warnings: Vec<RangeExtrapolationWarning>,
}

impl PopulationReport {
    pub fn largest_diameter_km(&self) -> Option<f64> {
        self.craters.iter().map(|c| c.diameter_km).reduce(f64::max)
    }
}

/// Apply one crater event to the grid.
pub fn apply_event<R: Rng + ?Sized>(grid: &mut RasterGrid, event: &CraterEvent, rng: &mut R) -> Result<ShapeParams> {
    let distances = grid.distances_to_point(event.center);
    apply_crater(grid.field_mut(), &distances, event.diameter_km, event.rim, rng)
}

/// Uniform integer position in `[1, L]` along each axis, in grid units.
fn random_center<R: Rng + ?Sized>(grid: &RasterGrid, rng: &mut R) -> (f64, f64) {
    let extent = (grid.grid_length().floor() as i64).max(1);
    (rng.gen_range(1..=extent) as f64, rng.gen_range(1..=extent) as f64)
}

/// Place a single crater at the middle of the grid.
pub fn central_crater<R: Rng + ?Sized>(
    grid: &mut RasterGrid,
    diameter_km: f64,
    rim: bool,
    rng: &mut R,
) -> Result<ShapeParams> {
    let half = (grid.grid_length() / 2.0).floor();
    let event = CraterEvent { diameter_km, center: (half, half), rim };
    apply_event(grid, &event, rng)
}

/// Add `count` craters with integer diameters drawn from a `D^-2` power law
/// over `min_km..max_km`, at random positions.
pub fn add_craters_power_law<R: Rng + ?Sized>(
    grid: &mut RasterGrid,
    count: usize,
    min_km: u32,
    max_km: u32,
    rim: bool,
    rng: &mut R,
) -> Result<PopulationReport> {
    let weights = PowerLawWeights::new(min_km, max_km)?;
    ShapeParams::for_deposit(min_km as f64, rim)?;
    info!(count, "adding power-law craters");

    let mut report = PopulationReport::default();
    for _ in 0..count {
        let diameter_km = weights.sample(rng);
        let center = random_center(grid, rng);
        apply_event(grid, &CraterEvent { diameter_km, center, rim }, rng)?;
        report.craters.push(PlacedCrater { diameter_km, center, time_ga: None });
    }
    Ok(report)
}

/// Generate a crater population from the production and chronology
/// functions and deposit it on `grid`.
///
/// The domain area and cell size handed to the generator come from the grid
/// (grid units are metres). `params.domain_area_km2` and
/// `params.cell_size_km` are overwritten.
///
/// The smallest diameter the generator can produce is checked before any
/// crater is generated, so a size range that cannot be deposited leaves
/// `grid` unchanged.
pub fn add_craters_from_csfd<P, C, R>(
    grid: &mut RasterGrid,
    pf: &P,
    chronology: &C,
    params: CsfdParams,
    rim: bool,
    rng: &mut R,
) -> Result<PopulationReport>
where
    P: ProductionFunction + ?Sized,
    C: ChronologyFunction + ?Sized,
    R: Rng + ?Sized,
{
    let length_km = grid.grid_length() / 1000.0;
    let params = CsfdParams {
        domain_area_km2: length_km * length_km,
        cell_size_km: grid.cell_size() / 1000.0,
        ..params
    };

    let (d_min, _) = params.diameter_range(pf.range());
    ShapeParams::for_deposit(d_min, rim)?;

    info!(area_km2 = params.domain_area_km2, "generating crater size-frequency distribution");
    let run = generate(pf, chronology, &params, rng)?;
    info!(count = run.diameters.len(), "adding craters");

    let mut report = PopulationReport { craters: Vec::with_capacity(run.diameters.len()), warnings: run.warnings };
    for (i, (&diameter_km, &time_ga)) in run.diameters.iter().zip(&run.arrival_times).enumerate() {
        let center = random_center(grid, rng);
        apply_event(grid, &CraterEvent { diameter_km, center, rim }, rng)?;
        report.craters.push(PlacedCrater { diameter_km, center, time_ga: Some(time_ga) });
        if (i + 1) % 1000 == 0 {
            debug!(applied = i + 1, "crater deposition progress");
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chronology::HartmannNeukumMars;
    use crate::csfd::TimeInterval;
    use crate::error::CraterError;
    use crate::production::NeukumIvanovMars;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn central_crater_excavates_small_grid() {
        // 50×50 nodes at 10 m: the 5 km bowl covers the whole domain.
        let mut grid = RasterGrid::square(50, 10.0).unwrap();
        central_crater(&mut grid, 5.0, true, &mut StdRng::seed_from_u64(1)).unwrap();
        assert!(grid.min_elevation() < 0.0);
        assert!(grid.max_elevation() < 0.0);
    }

    #[test]
    fn central_crater_raises_a_rim() {
        // 50×50 nodes at 400 m: 20 km domain, rim at 2.5 km from the centre.
        let mut grid = RasterGrid::square(50, 400.0).unwrap();
        let shape = central_crater(&mut grid, 5.0, true, &mut StdRng::seed_from_u64(1)).unwrap();

        let d = grid.distances_to_point((10_000.0, 10_000.0));
        let (rim_idx, _) = d
            .iter()
            .enumerate()
            .min_by(|a, b| (a.1 - shape.radius_m()).abs().total_cmp(&(b.1 - shape.radius_m()).abs()))
            .unwrap();
        let rim = grid.field()[rim_idx];
        let far: Vec<f64> = grid
            .field()
            .iter()
            .zip(&d)
            .filter(|&(_, &dist)| dist > 4.0 * shape.radius_m())
            .map(|(&z, _)| z)
            .collect();
        let far_mean = far.iter().sum::<f64>() / far.len() as f64;

        assert!(grid.min_elevation() < 0.0);
        assert!(rim > grid.min_elevation());
        assert!(rim > far_mean, "rim {rim} vs far field {far_mean}");
    }

    #[test]
    fn power_law_population_is_reproducible() {
        let run = |seed| {
            let mut grid = RasterGrid::square(40, 250.0).unwrap();
            let report = add_craters_power_law(&mut grid, 12, 1, 5, true, &mut StdRng::seed_from_u64(seed)).unwrap();
            (grid, report)
        };
        let (a, ra) = run(21);
        let (b, rb) = run(21);
        assert_eq!(ra.craters.len(), 12);
        assert_eq!(ra.craters, rb.craters);
        assert_eq!(a.field(), b.field());
        for c in &ra.craters {
            assert!(c.center.0 >= 1.0 && c.center.0 <= 10_000.0);
            assert!(c.time_ga.is_none());
        }
    }

    #[test]
    fn undepositable_sizes_fail_without_touching_the_grid() {
        let pf = NeukumIvanovMars::default();
        let cf = HartmannNeukumMars::default();
        let mut grid = RasterGrid::square(60, 50.0).unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        let initial: Vec<f64> = (0..grid.node_count()).map(|_| rng.gen::<f64>()).collect();
        grid.set_field(initial.clone()).unwrap();

        let params = CsfdParams::new(TimeInterval::new(3.8, 3.5).unwrap(), Some((0.09, 2.0)), 0.0, 0.0);
        let result = add_craters_from_csfd(&mut grid, &pf, &cf, params, true, &mut rng);
        assert!(matches!(result, Err(CraterError::InvalidParameter(_))));
        assert_eq!(grid.field(), initial.as_slice());

        // Default range starts at one 50 m cell.
        let params = CsfdParams::new(TimeInterval::new(3.8, 3.5).unwrap(), None, 0.0, 0.0);
        assert!(add_craters_from_csfd(&mut grid, &pf, &cf, params, true, &mut rng).is_err());
        assert_eq!(grid.field(), initial.as_slice());
    }

    #[test]
    fn csfd_population_is_time_ordered() {
        let mut grid = RasterGrid::square(50, 200.0).unwrap();
        let pf = NeukumIvanovMars::default();
        let cf = HartmannNeukumMars::default();
        let params = CsfdParams::new(TimeInterval::new(4.0, 3.5).unwrap(), Some((0.5, 5.0)), 0.0, 0.0);
        let report = add_craters_from_csfd(&mut grid, &pf, &cf, params, true, &mut StdRng::seed_from_u64(8)).unwrap();

        assert!(!report.craters.is_empty());
        let times: Vec<f64> = report.craters.iter().filter_map(|c| c.time_ga).collect();
        assert!(times.windows(2).all(|w| w[1] >= w[0]));
        assert!(grid.min_elevation() < 0.0);
        assert!(report.largest_diameter_km().unwrap() <= 5.0 + 1e-9);
    }
}
