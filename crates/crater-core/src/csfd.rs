//! Crater size-frequency distribution generator.
//!
//! Impacts arrive as a marked Poisson process. Each event draws a diameter
//! by inverting the production function at a uniformly chosen cumulative
//! frequency, then advances simulated time by an interarrival drawn from the
//! current flux (chronology φ(t) × N(Dmin)/N(1) × area).
//!
//! Time runs from `end_ga` up to `start_ga` (Ga before present, so the
//! start is the older bound).

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::chronology::ChronologyFunction;
use crate::error::{CraterError, RangeExtrapolationWarning, Result};
use crate::inverse::{invert_cumulative, DEFAULT_TOLERANCE};
use crate::production::ProductionFunction;

/// Upper bound on events per run before the generator gives up.
pub const DEFAULT_MAX_EVENTS: usize = 10_000_000;

/// Age bounds in Ga before present, `start_ga >= end_ga`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeInterval {
    pub start_ga: f64,
    pub end_ga: f64,
}

impl TimeInterval {
    pub fn new(start_ga: f64, end_ga: f64) -> Result<Self> {
        let interval = Self { start_ga, end_ga };
        interval.validate()?;
        Ok(interval)
    }

    /// Both bounds finite, `end_ga >= 0` and `start_ga >= end_ga`. Fields are
    /// public, so the generator re-checks intervals built without `new`.
    pub fn validate(&self) -> Result<()> {
        let (start_ga, end_ga) = (self.start_ga, self.end_ga);
        if !(start_ga.is_finite() && end_ga.is_finite()) || end_ga < 0.0 || start_ga < end_ga {
            return Err(CraterError::InvalidParameter(format!(
                "time interval must run from an older start to a younger end, got {start_ga}-{end_ga} Ga"
            )));
        }
        Ok(())
    }
}

/// Inputs to one generator run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CsfdParams {
    pub time: TimeInterval,
    /// Diameter bounds in km; `None` spans one cell up to the production
    /// function's largest calibrated diameter.
    pub size_interval: Option<(f64, f64)>,
    pub domain_area_km2: f64,
    pub cell_size_km: f64,
    /// Exponential interarrivals when true, mean interval otherwise.
    pub poisson: bool,
    pub max_events: usize,
}

impl CsfdParams {
    pub fn new(time: TimeInterval, size_interval: Option<(f64, f64)>, domain_area_km2: f64, cell_size_km: f64) -> Self {
        Self {
            time,
            size_interval,
            domain_area_km2,
            cell_size_km,
            poisson: true,
            max_events: DEFAULT_MAX_EVENTS,
        }
    }

    /// Diameter bounds in km the generator will sample, given the production
    /// function's calibrated range. Not validated.
    pub fn diameter_range(&self, calibrated: (f64, f64)) -> (f64, f64) {
        self.size_interval.unwrap_or((self.cell_size_km, calibrated.1))
    }
}

/// One generated impact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Arrival {
    pub time_ga: f64,
    pub diameter_km: f64,
}

/// Lazy crater sequence. Consumes the random source as it goes, so it cannot
/// be restarted; build a new one from an identically seeded generator instead.
pub struct CsfdGenerator<'a, P: ?Sized, C: ?Sized, R: ?Sized> {
    pf: &'a P,
    chronology: &'a C,
    rng: &'a mut R,
    diameter_range: (f64, f64),
    /// N(1 km), N(Dmin), N(Dmax).
    reference: [f64; 3],
    n1_ratio: f64,
    area: f64,
    poisson: bool,
    start_ga: f64,
    t: f64,
    events: usize,
    max_events: usize,
    warnings: Vec<RangeExtrapolationWarning>,
    done: bool,
}

impl<'a, P, C, R> CsfdGenerator<'a, P, C, R>
where
    P: ProductionFunction + ?Sized,
    C: ChronologyFunction + ?Sized,
    R: Rng + ?Sized,
{
    pub fn new(pf: &'a P, chronology: &'a C, params: &CsfdParams, rng: &'a mut R) -> Result<Self> {
        params.time.validate()?;
        if !(params.domain_area_km2.is_finite() && params.domain_area_km2 > 0.0) {
            return Err(CraterError::InvalidParameter(format!(
                "domain area must be positive, got {} km²",
                params.domain_area_km2
            )));
        }
        if !(params.cell_size_km.is_finite() && params.cell_size_km > 0.0) {
            return Err(CraterError::InvalidParameter(format!(
                "cell size must be positive, got {} km",
                params.cell_size_km
            )));
        }

        let calibrated = pf.range();
        let mut warnings = Vec::new();
        if let Some(requested) = params.size_interval {
            if requested.0 < calibrated.0 || requested.1 > calibrated.1 {
                let w = RangeExtrapolationWarning { requested, calibrated };
                warn!("{w}");
                warnings.push(w);
            }
        }
        let diameter_range = params.diameter_range(calibrated);
        let (d_min, d_max) = diameter_range;
        if !(d_min.is_finite() && d_max.is_finite() && d_min > 0.0 && d_min < d_max) {
            return Err(CraterError::InvalidParameter(format!(
                "diameter range must satisfy 0 < min < max, got {d_min}-{d_max} km"
            )));
        }

        let reference = [pf.cumulative(1.0), pf.cumulative(d_min), pf.cumulative(d_max)];
        let n1_ratio = reference[1] / reference[0];
        debug!(d_min, d_max, n1_ratio, "crater size range resolved");

        Ok(Self {
            pf,
            chronology,
            rng,
            diameter_range,
            reference,
            n1_ratio,
            area: params.domain_area_km2,
            poisson: params.poisson,
            start_ga: params.time.start_ga,
            t: params.time.end_ga,
            events: 0,
            max_events: params.max_events,
            warnings,
            done: false,
        })
    }

    pub fn diameter_range(&self) -> (f64, f64) {
        self.diameter_range
    }

    pub fn warnings(&self) -> &[RangeExtrapolationWarning] {
        &self.warnings
    }

    fn fail(&mut self, err: CraterError) -> Option<Result<Arrival>> {
        self.done = true;
        Some(Err(err))
    }
}

impl<P, C, R> Iterator for CsfdGenerator<'_, P, C, R>
where
    P: ProductionFunction + ?Sized,
    C: ChronologyFunction + ?Sized,
    R: Rng + ?Sized,
{
    type Item = Result<Arrival>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.t >= self.start_ga {
            self.done = true;
            return None;
        }
        self.events += 1;
        if self.events > self.max_events {
            let msg = format!(
                "{} events generated before reaching {} Ga (currently {} Ga)",
                self.max_events, self.start_ga, self.t
            );
            return self.fail(CraterError::NonTerminating(msg));
        }

        let [_, n_min, n_max] = self.reference;
        let u: f64 = self.rng.gen();
        let y = u * (n_min - n_max) + n_max;
        let diameter_km = match invert_cumulative(self.pf, self.diameter_range, y, DEFAULT_TOLERANCE) {
            Ok(d) => d,
            Err(e) => return self.fail(e),
        };

        let lambda = self.chronology.phi(self.t) * self.n1_ratio * self.area;
        if !(lambda.is_finite() && lambda > 0.0) {
            let msg = format!("impact rate is {lambda} at {} Ga", self.t);
            return self.fail(CraterError::NonTerminating(msg));
        }
        let dt = if self.poisson {
            // 1 - U lies in (0, 1], keeping the log finite.
            let u2: f64 = 1.0 - self.rng.gen::<f64>();
            -u2.ln() / lambda
        } else {
            1.0 / lambda
        };

        let arrival = Arrival { time_ga: self.t, diameter_km };
        self.t += dt;
        Some(Ok(arrival))
    }
}

impl<P, C, R> std::iter::FusedIterator for CsfdGenerator<'_, P, C, R>
where
    P: ProductionFunction + ?Sized,
    C: ChronologyFunction + ?Sized,
    R: Rng + ?Sized,
{
}

/// A completed generator run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CsfdRun {
    pub diameters: Vec<f64>,
    pub arrival_times: Vec<f64>,
    pub warnings: Vec<RangeExtrapolationWarning>,
}

/// Run the generator to completion.
pub fn generate<P, C, R>(pf: &P, chronology: &C, params: &CsfdParams, rng: &mut R) -> Result<CsfdRun>
where
    P: ProductionFunction + ?Sized,
    C: ChronologyFunction + ?Sized,
    R: Rng + ?Sized,
{
    let mut generator = CsfdGenerator::new(pf, chronology, params, rng)?;
    let mut run = CsfdRun::default();
    for arrival in generator.by_ref() {
        let arrival = arrival?;
        run.diameters.push(arrival.diameter_km);
        run.arrival_times.push(arrival.time_ga);
    }
    run.warnings = generator.warnings().to_vec();
    debug!(craters = run.diameters.len(), "crater size-frequency distribution generated");
    Ok(run)
}

// ── Legacy population ─────────────────────────────────────────────────────────

/// Scaling coefficient and exponent of the integer-diameter power law
/// (Howard, 2007).
const POWER_LAW_KX: f64 = 1.0;
const POWER_LAW_DELTA: f64 = 2.0;

/// Weighted draw over integer diameters `min_km..max_km` with weights
/// `Kx D^-delta`. Predates the production-function generator and ignores time.
#[derive(Debug, Clone)]
pub struct PowerLawWeights {
    min_km: u32,
    cumulative: Vec<f64>,
}

impl PowerLawWeights {
    pub fn new(min_km: u32, max_km: u32) -> Result<Self> {
        if min_km == 0 || min_km >= max_km {
            return Err(CraterError::InvalidParameter(format!(
                "power-law diameters must satisfy 1 <= min < max, got {min_km}-{max_km} km"
            )));
        }
        let cumulative = (min_km..max_km)
            .scan(0.0, |acc, d| {
                *acc += POWER_LAW_KX * (d as f64).powf(-POWER_LAW_DELTA);
                Some(*acc)
            })
            .collect();
        Ok(Self { min_km, cumulative })
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let total = self.cumulative[self.cumulative.len() - 1];
        let r = rng.gen::<f64>() * total;
        let index = self
            .cumulative
            .partition_point(|&c| c <= r)
            .min(self.cumulative.len() - 1);
        (self.min_km as usize + index) as f64
    }
}
