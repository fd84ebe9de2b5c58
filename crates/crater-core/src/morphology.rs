//! Crater shape deposition: bowl, rim and ejecta blanket.
//!
//! Morphometry follows Howard (2007) and the MARSSIM model. Shape parameters
//! depend only on diameter, with separate power laws for simple and complex
//! craters either side of the 7 km Martian transition.
//!
//! Inside the rim the surface is replaced by the bowl profile
//! `H2 - H1 + H1 (2r/D)^m`; outside it an ejecta blanket decays as
//! `H2 (2r/D)^-n`. The exponent `n` is fixed by requiring the rim deposit
//! volume to equal the excavated bowl volume, giving roughly 3 at 7 km and
//! 3.5 at 250 km.

use rand::Rng;
use rand_distr::{Distribution, LogNormal};
use crate::error::{CraterError, Result};

/// Simple/complex transition diameter on Mars, metres.
pub const TRANSITION_DIAMETER_M: f64 = 7000.0;

/// Standard deviation of the ejecta noise before variance correction.
pub const EJECTA_NOISE: f64 = 0.05;

/// Inheritance of pre-impact topography (0.5-1.0). At 1 the crater floor
/// carries the new shape only.
pub const INHERITANCE: f64 = 1.0;

/// Fraction of the radius excavated when no rim is formed.
pub const RIMLESS_RADIUS_FRACTION: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CraterRegime {
    Simple,
    Complex,
}

/// Morphometric parameters derived from a crater diameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeParams {
    pub regime: CraterRegime,
    /// Diameter in metres.
    pub diameter_m: f64,
    /// Bowl depth below the rim crest, H1 (m).
    pub depth: f64,
    /// Rim height above the surroundings, H2 (m).
    pub rim_height: f64,
    /// Interior profile exponent, m.
    pub interior_exponent: f64,
    /// Exterior (ejecta) decay exponent, n.
    pub exterior_exponent: f64,
}

impl ShapeParams {
    pub fn from_diameter_km(diameter_km: f64) -> Result<Self> {
        if !(diameter_km.is_finite() && diameter_km > 0.0) {
            return Err(CraterError::InvalidParameter(format!(
                "crater diameter must be positive, got {diameter_km} km"
            )));
        }
        Ok(Self::from_diameter_m(diameter_km * 1000.0))
    }

    /// Shape of a crater that will actually be deposited. Rimmed craters
    /// below ~105 m have no positive ejecta exponent and are rejected.
    pub fn for_deposit(diameter_km: f64, rim: bool) -> Result<Self> {
        let shape = Self::from_diameter_km(diameter_km)?;
        let n = shape.exterior_exponent;
        if rim && !(n.is_finite() && n > 0.0) {
            return Err(CraterError::InvalidParameter(format!(
                "a {diameter_km} km crater has no volume-conserving ejecta exponent (n = {n})"
            )));
        }
        Ok(shape)
    }

    fn from_diameter_m(dm: f64) -> Self {
        let (regime, depth, rim_height, interior_exponent) = if dm <= TRANSITION_DIAMETER_M {
            (
                CraterRegime::Simple,
                2.54 * dm.powf(0.67),
                1.93 * dm.powf(0.52),
                0.73 * dm.powf(0.11),
            )
        } else {
            (
                CraterRegime::Complex,
                12.20 * dm.powf(0.49),
                0.79 * dm.powf(0.6),
                0.64 * dm.powf(0.13),
            )
        };
        let h2h1 = rim_height - depth;
        // Rim volume equals bowl volume.
        let exterior_exponent = 2.0 - rim_height / (h2h1 / 2.0 + depth / (interior_exponent + 2.0));

        Self {
            regime,
            diameter_m: dm,
            depth,
            rim_height,
            interior_exponent,
            exterior_exponent,
        }
    }

    /// `H2 - H1`: elevation change at the crater centre (negative).
    #[inline]
    pub fn floor_offset(&self) -> f64 {
        self.rim_height - self.depth
    }

    #[inline]
    pub fn radius_m(&self) -> f64 {
        self.diameter_m / 2.0
    }
}

/// One impact, consumed once by the deposition kernel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CraterEvent {
    pub diameter_km: f64,
    /// Centre in grid units (metres).
    pub center: (f64, f64),
    pub rim: bool,
}

/// Log-space sigma of the multiplicative bowl noise.
pub fn ejecta_noise_sigma() -> f64 {
    let e = std::f64::consts::E;
    let noise1 = EJECTA_NOISE / (e * e - 1.0).sqrt();
    (1.0 - 0.5 * noise1) * noise1
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

/// Add the elevation change of one crater to `elevation`.
///
/// `distances` holds the distance of every node to the crater centre in
/// metres, indexed like `elevation`. With `rim` the full bowl, rim and ejecta
/// blanket are deposited; without it only the inner 90% of the radius is
/// excavated and everything beyond is left untouched.
///
/// One lognormal noise factor is drawn per crater whichever branch runs.
/// Validation happens before any node is written.
pub fn apply_crater<R: Rng + ?Sized>(
    elevation: &mut [f64],
    distances: &[f64],
    diameter_km: f64,
    rim: bool,
    rng: &mut R,
) -> Result<ShapeParams> {
    if distances.len() != elevation.len() {
        return Err(CraterError::DimensionMismatch {
            expected: elevation.len(),
            actual: distances.len(),
        });
    }
    let shape = ShapeParams::for_deposit(diameter_km, rim)?;
    let n = shape.exterior_exponent;

    let lognormal = LogNormal::new(0.0, ejecta_noise_sigma())
        .map_err(|e| CraterError::InvalidParameter(e.to_string()))?;
    let z_noise = lognormal.sample(rng);

    let dm = shape.diameter_m;
    let radius = shape.radius_m();
    let h1 = shape.depth;
    let h2 = shape.rim_height;
    let m = shape.interior_exponent;
    let h2h1 = shape.floor_offset();

    // Pre-impact surface is the reference inside the crater.
    let inherited = |reference: f64, z: f64, d: f64| {
        (reference - z) * (1.0 - INHERITANCE * (d / radius).powi(2))
    };

    if rim {
        let nodes = || elevation.iter().zip(distances);
        let avg_in = mean(nodes().filter(|&(_, &d)| d <= radius).map(|(&z, _)| z));
        let avg_out = mean(nodes().filter(|&(_, &d)| d > radius).map(|(&z, _)| z));

        for (z, &d) in elevation.iter_mut().zip(distances) {
            let scaled = 2.0 * d / dm;
            if d <= radius {
                let dh = h2h1 + z_noise * h1 * scaled.powf(m);
                *z += dh + inherited(*z, *z, d);
            } else {
                let dh = h2 * scaled.powf(-n);
                let blend = (1.0 - INHERITANCE).min(dh / h2);
                let reference = avg_in + avg_out * (d / radius).powf(-n);
                *z += dh + blend * (reference - *z);
            }
        }
    } else {
        let inner = radius * RIMLESS_RADIUS_FRACTION;
        for (z, &d) in elevation.iter_mut().zip(distances) {
            if d <= inner {
                let dh = h2h1 + h1 * (2.0 * d / dm).powf(m);
                *z += dh + inherited(*z, *z, d);
            }
        }
    }

    Ok(shape)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::RasterGrid;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn shape_parameters_are_positive() {
        for d_km in [0.2, 1.0, 5.0, 7.0, 7.5, 40.0, 250.0] {
            let s = ShapeParams::from_diameter_km(d_km).unwrap();
            assert!(s.depth > 0.0 && s.rim_height > 0.0, "{d_km} km: {s:?}");
            assert!(s.floor_offset() < 0.0, "{d_km} km bowl must sit below the surface");
        }
    }

    #[test]
    fn exterior_exponent_matches_literature_range() {
        for d_km in [7.001, 10.0, 25.0, 50.0, 100.0, 180.0, 250.0] {
            let s = ShapeParams::from_diameter_km(d_km).unwrap();
            assert!(
                (2.9..=3.6).contains(&s.exterior_exponent),
                "{d_km} km: n = {:.3}", s.exterior_exponent
            );
        }
        let s250 = ShapeParams::from_diameter_km(250.0).unwrap();
        assert_relative_eq!(s250.exterior_exponent, 3.4, epsilon = 0.05);
    }

    #[test]
    fn regime_switch_has_no_order_of_magnitude_jump() {
        let simple = ShapeParams::from_diameter_m(6999.0);
        let complex = ShapeParams::from_diameter_m(7001.0);
        assert_eq!(simple.regime, CraterRegime::Simple);
        assert_eq!(complex.regime, CraterRegime::Complex);
        for (a, b) in [
            (simple.depth, complex.depth),
            (simple.rim_height, complex.rim_height),
            (simple.interior_exponent, complex.interior_exponent),
        ] {
            let ratio = a / b;
            assert!(ratio > 0.5 && ratio < 2.0, "jump across transition: {a} vs {b}");
        }
    }

    #[test]
    fn non_positive_diameter_is_rejected() {
        let mut z = vec![0.0; 4];
        let d = vec![1.0; 4];
        let mut rng = StdRng::seed_from_u64(0);
        for bad in [0.0, -1.0, f64::NAN] {
            assert!(matches!(
                apply_crater(&mut z, &d, bad, true, &mut rng),
                Err(CraterError::InvalidParameter(_))
            ));
        }
        assert_eq!(z, vec![0.0; 4]);
    }

    #[test]
    fn tiny_rimmed_crater_is_rejected_before_any_write() {
        let grid = RasterGrid::square(20, 5.0).unwrap();
        let d = grid.distances_to_point((50.0, 50.0));
        let mut z = vec![1.0; grid.node_count()];
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            apply_crater(&mut z, &d, 0.05, true, &mut rng),
            Err(CraterError::InvalidParameter(_))
        ));
        assert!(z.iter().all(|&v| v == 1.0));

        // Without a rim the ejecta exponent is never used.
        apply_crater(&mut z, &d, 0.05, false, &mut rng).unwrap();
        assert!(z.iter().any(|&v| v < 1.0));
        assert!(ShapeParams::for_deposit(0.2, true).is_ok());
    }

    #[test]
    fn distance_length_must_match_field() {
        let mut z = vec![0.0; 4];
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            apply_crater(&mut z, &[1.0; 3], 1.0, true, &mut rng),
            Err(CraterError::DimensionMismatch { expected: 4, actual: 3 })
        );
    }

    #[test]
    fn centre_node_drops_to_floor_offset() {
        let grid = RasterGrid::square(41, 50.0).unwrap();
        let d = grid.distances_to_point((1000.0, 1000.0));
        let mut z = grid.field().to_vec();
        let shape = apply_crater(&mut z, &d, 1.0, true, &mut StdRng::seed_from_u64(5)).unwrap();
        let centre = 20 * 41 + 20;
        assert_abs_diff_eq!(z[centre], shape.floor_offset(), epsilon = 1e-9);
    }

    #[test]
    fn rimless_crater_leaves_outer_nodes_untouched() {
        let mut grid = RasterGrid::square(60, 50.0).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let initial: Vec<f64> = (0..grid.node_count()).map(|_| rng.gen::<f64>()).collect();
        grid.set_field(initial.clone()).unwrap();

        let d = grid.distances_to_point((1500.0, 1500.0));
        let shape = apply_crater(grid.field_mut(), &d, 2.0, false, &mut rng).unwrap();
        let inner = shape.radius_m() * RIMLESS_RADIUS_FRACTION;

        let mut touched = 0;
        for ((&after, &before), &dist) in grid.field().iter().zip(&initial).zip(&d) {
            if dist > inner {
                assert_eq!(after, before, "node at {dist} m changed");
            } else {
                touched += 1;
            }
        }
        assert!(touched > 0);
        let centre = 30 * 60 + 30;
        assert!(grid.field()[centre] < initial[centre] + shape.floor_offset() + 1e-9);
    }

    #[test]
    fn fixed_seed_gives_identical_craters() {
        let grid = RasterGrid::square(30, 100.0).unwrap();
        let d = grid.distances_to_point((1234.0, 1777.0));
        let mut a = grid.field().to_vec();
        let mut b = grid.field().to_vec();
        apply_crater(&mut a, &d, 1.3, true, &mut StdRng::seed_from_u64(42)).unwrap();
        apply_crater(&mut b, &d, 1.3, true, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn ejecta_reaches_grid_from_off_grid_centre() {
        let grid = RasterGrid::square(20, 100.0).unwrap();
        let d = grid.distances_to_point((-3000.0, 1000.0));
        let mut z = grid.field().to_vec();
        apply_crater(&mut z, &d, 4.0, true, &mut StdRng::seed_from_u64(1)).unwrap();
        assert!(z.iter().all(|v| v.is_finite() && *v > 0.0));

        let mut untouched = grid.field().to_vec();
        apply_crater(&mut untouched, &d, 4.0, false, &mut StdRng::seed_from_u64(1)).unwrap();
        assert!(untouched.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn ejecta_thins_with_distance() {
        let d = [2600.0, 4000.0, 8000.0, 16000.0];
        let mut z = [0.0; 4];
        apply_crater(&mut z, &d, 5.0, true, &mut StdRng::seed_from_u64(2)).unwrap();
        assert!(z.windows(2).all(|w| w[0] > w[1]), "{z:?}");
    }

    #[test]
    fn noise_sigma_is_small() {
        let s = ejecta_noise_sigma();
        assert!(s > 0.019 && s < 0.020, "sigma = {s}");
    }
}
