//! Initial surfaces the craters are deposited onto.
pub mod fbm;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{CraterError, Result};
use crate::grid::RasterGrid;
use fbm::Fbm;

/// Small-scale roughness added on top of the regional slope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SurfaceKind {
    /// No roughness: the slope alone.
    Flat,
    /// Independent U[0, 1) per node.
    #[default]
    Uniform,
    /// Perlin fBm, spatially correlated.
    Fbm { hurst: f64, octaves: u32 },
}

/// Build a square grid of side `grid_length` with nodes every `cell_size`
/// (both metres) and a rough, optionally tilted, surface.
///
/// `slope` is rise over run, applied so elevation falls toward +x.
/// `roughness` multiplies the whole field; the slope is pre-divided by it
/// so only the noise amplitude scales.
pub fn make_noisy_surface<R: Rng + ?Sized>(
    grid_length: f64,
    cell_size: f64,
    slope: f64,
    roughness: f64,
    kind: SurfaceKind,
    rng: &mut R,
) -> Result<RasterGrid> {
    if !(cell_size.is_finite() && cell_size > 0.0) || grid_length.is_nan() || grid_length < cell_size {
        return Err(CraterError::InvalidParameter(format!(
            "grid length {grid_length} must be at least one cell of size {cell_size}"
        )));
    }
    if !(roughness.is_finite() && roughness > 0.0) {
        return Err(CraterError::InvalidParameter(format!(
            "roughness factor must be positive, got {roughness}"
        )));
    }

    let n = (grid_length / cell_size) as usize;
    let mut grid = RasterGrid::square(n, cell_size)?;

    let fbm = match kind {
        SurfaceKind::Fbm { hurst, octaves } => Some(Fbm::new(rng.gen::<u32>(), hurst, octaves)),
        _ => None,
    };
    // 6 noise cycles across the domain.
    let base_freq = 6.0 / n as f64;

    let mut values = Vec::with_capacity(grid.node_count());
    for i in 0..grid.node_count() {
        let (x, _) = grid.node_xy(i);
        let mut z = -x * slope / roughness;
        z += match (kind, &fbm) {
            (SurfaceKind::Flat, _) => 0.0,
            (SurfaceKind::Fbm { .. }, Some(f)) => {
                let row = (i / n) as f64;
                let col = (i % n) as f64;
                f.sample(col * base_freq, row * base_freq)
            }
            _ => rng.gen::<f64>(),
        };
        values.push(z * roughness);
    }
    grid.set_field(values)?;
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn uniform_surface_is_bounded_by_roughness() {
        let mut rng = StdRng::seed_from_u64(3);
        let grid = make_noisy_surface(1000.0, 10.0, 0.0, 2.0, SurfaceKind::Uniform, &mut rng).unwrap();
        assert_eq!(grid.node_column_count(), 100);
        assert!(grid.min_elevation() >= 0.0);
        assert!(grid.max_elevation() < 2.0);
        assert!(grid.max_elevation() - grid.min_elevation() > 1.0);
    }

    #[test]
    fn flat_surface_carries_only_the_slope() {
        let mut rng = StdRng::seed_from_u64(3);
        let grid = make_noisy_surface(100.0, 10.0, 0.1, 1.0, SurfaceKind::Flat, &mut rng).unwrap();
        let row = grid.row_profile(3);
        assert_abs_diff_eq!(row[0], 0.0);
        assert_abs_diff_eq!(row[9], -9.0, epsilon = 1e-12);
    }

    #[test]
    fn fbm_surface_is_correlated_and_deterministic() {
        let kind = SurfaceKind::Fbm { hurst: 0.8, octaves: 5 };
        let a = make_noisy_surface(640.0, 10.0, 0.0, 1.0, kind, &mut StdRng::seed_from_u64(9)).unwrap();
        let b = make_noisy_surface(640.0, 10.0, 0.0, 1.0, kind, &mut StdRng::seed_from_u64(9)).unwrap();
        assert_eq!(a.field(), b.field());
        assert!(a.max_elevation() - a.min_elevation() > 0.01);
    }

    #[test]
    fn bad_dimensions_are_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(make_noisy_surface(5.0, 10.0, 0.0, 1.0, SurfaceKind::Flat, &mut rng).is_err());
        assert!(make_noisy_surface(100.0, 10.0, 0.0, 0.0, SurfaceKind::Flat, &mut rng).is_err());
    }
}
