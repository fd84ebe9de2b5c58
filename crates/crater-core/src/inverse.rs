//! Inverse of a cumulative production function.
//!
//! Works in log10-log10 space, where calibrated production functions are
//! close to power laws: sample the bracket at nine points, interpolate the
//! target linearly, then shrink the bracket to the pair of samples around
//! the target and repeat.

use tracing::debug;

use crate::error::{CraterError, Result};
use crate::production::ProductionFunction;

pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Samples per refinement pass.
const DIVISIONS: usize = 9;

/// The solver stops once this many passes have run.
pub const MAX_ITERATIONS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Inversion {
    pub diameter_km: f64,
    pub iterations: usize,
    /// False when the iteration cap was reached first; `diameter_km` is
    /// then the last estimate.
    pub converged: bool,
}

/// Linear interpolation of `x` on ascending `xp`, clamped at both ends.
fn interp(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    let last = xp.len() - 1;
    if x <= xp[0] {
        return fp[0];
    }
    if x >= xp[last] {
        return fp[last];
    }
    let i = xp.partition_point(|&v| v <= x) - 1;
    let span = xp[i + 1] - xp[i];
    if span <= 0.0 {
        return fp[i];
    }
    fp[i] + (fp[i + 1] - fp[i]) * (x - xp[i]) / span
}

/// Find the diameter in `diameter_range` (km) whose cumulative frequency is
/// `target`, to within `tol` in log10 N.
pub fn solve_cumulative<P: ProductionFunction + ?Sized>(
    pf: &P,
    diameter_range: (f64, f64),
    target: f64,
    tol: f64,
) -> Result<Inversion> {
    let (d_min, d_max) = diameter_range;
    if !(d_min.is_finite() && d_max.is_finite() && d_min > 0.0 && d_min < d_max) {
        return Err(CraterError::InvalidParameter(format!(
            "diameter range must satisfy 0 < min < max, got {d_min}-{d_max} km"
        )));
    }
    if !(target.is_finite() && target > 0.0) {
        return Err(CraterError::InvalidParameter(format!(
            "cumulative target must be positive, got {target}"
        )));
    }

    let log_y = target.log10();
    let log_n = |x: f64| pf.cumulative(10f64.powf(x)).log10();

    // Bracket in log10 D as (small, large).
    let (mut lo, mut hi) = (d_min.log10(), d_max.log10());
    let mut x0 = [0.0; DIVISIONS];
    let mut y0 = [0.0; DIVISIONS];
    let mut x: f64;
    let mut iterations = 0;

    loop {
        // Large to small diameter, so the cumulative values ascend.
        for i in 0..DIVISIONS {
            x0[i] = hi + (lo - hi) * i as f64 / (DIVISIONS - 1) as f64;
            y0[i] = log_n(x0[i]);
        }
        x = interp(log_y, &y0, &x0);
        let y1 = log_n(x);

        let q = y0.partition_point(|&v| v < log_y).clamp(1, DIVISIONS - 1);
        lo = x0[q];
        hi = x0[q - 1];

        iterations += 1;
        if (y1 - log_y).abs() < tol {
            return Ok(Inversion { diameter_km: 10f64.powf(x), iterations, converged: true });
        }
        if iterations >= MAX_ITERATIONS {
            break;
        }
    }

    debug!(cumulative = target, iterations, estimate_km = 10f64.powf(x), "production function inverse did not converge");
    Ok(Inversion { diameter_km: 10f64.powf(x), iterations, converged: false })
}

/// Diameter (km) whose cumulative frequency under `pf` equals `target`.
pub fn invert_cumulative<P: ProductionFunction + ?Sized>(
    pf: &P,
    diameter_range: (f64, f64),
    target: f64,
    tol: f64,
) -> Result<f64> {
    solve_cumulative(pf, diameter_range, target, tol).map(|inv| inv.diameter_km)
}
