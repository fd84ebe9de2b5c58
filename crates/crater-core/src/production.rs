//! Crater production functions: cumulative crater frequency per km² at or
//! above a given diameter, for the reference epoch of the calibration.

use serde::{Deserialize, Serialize};

/// Which form of the size-frequency distribution to evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Representation {
    /// N(≥D), craters per km².
    Cumulative,
    /// -dN/dD, craters per km² per km.
    Differential,
    /// Relative (R-plot) form, D³ · dN/dD.
    RPlot,
}

pub trait ProductionFunction {
    /// Cumulative frequency N(≥`diameter_km`) per km².
    fn cumulative(&self, diameter_km: f64) -> f64;

    /// Calibrated diameter bounds in km.
    fn range(&self) -> (f64, f64);

    /// -dN/dD. The default is a central difference in log-diameter.
    fn differential(&self, diameter_km: f64) -> f64 {
        let step = 10f64.powf(1e-4);
        let lo = diameter_km / step;
        let hi = diameter_km * step;
        -(self.cumulative(hi) - self.cumulative(lo)) / (hi - lo)
    }

    fn evaluate(&self, repr: Representation, diameter_km: f64) -> f64 {
        match repr {
            Representation::Cumulative => self.cumulative(diameter_km),
            Representation::Differential => self.differential(diameter_km),
            Representation::RPlot => diameter_km.powi(3) * self.differential(diameter_km),
        }
    }

    fn evaluate_many(&self, repr: Representation, diameters_km: &[f64]) -> Vec<f64> {
        diameters_km.iter().map(|&d| self.evaluate(repr, d)).collect()
    }
}

/// Mars production function of Ivanov (2001): an 11th-order polynomial in
/// log10 D, anchored so that N(1 km) matches 1 Ga of Hartmann & Neukum flux.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeukumIvanovMars {
    pub coefficients: [f64; 12],
    pub range: (f64, f64),
}

impl Default for NeukumIvanovMars {
    fn default() -> Self {
        Self {
            coefficients: [
                -3.383677,
                -3.197,
                1.257,
                0.7915,
                -0.4861,
                -0.3630,
                0.1016,
                6.756e-2,
                -1.181e-2,
                -4.753e-3,
                6.233e-4,
                5.805e-5,
            ],
            range: (0.015, 362.0),
        }
    }
}

impl NeukumIvanovMars {
    /// log10 N at `x = log10 D`, and its derivative with respect to x.
    fn log_cumulative(&self, x: f64) -> (f64, f64) {
        let mut value = 0.0;
        let mut slope = 0.0;
        // Horner on the polynomial and its derivative together.
        for &a in self.coefficients.iter().rev() {
            slope = slope * x + value;
            value = value * x + a;
        }
        (value, slope)
    }
}

impl ProductionFunction for NeukumIvanovMars {
    fn cumulative(&self, diameter_km: f64) -> f64 {
        10f64.powf(self.log_cumulative(diameter_km.log10()).0)
    }

    fn range(&self) -> (f64, f64) {
        self.range
    }

    fn differential(&self, diameter_km: f64) -> f64 {
        let (log_n, slope) = self.log_cumulative(diameter_km.log10());
        // dN/dD = N · P'(x) / D
        -10f64.powf(log_n) * slope / diameter_km
    }
}

/// Pure power law `N(D) = k D^-b`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerLaw {
    pub coefficient: f64,
    pub exponent: f64,
    pub range: (f64, f64),
}

impl ProductionFunction for PowerLaw {
    fn cumulative(&self, diameter_km: f64) -> f64 {
        self.coefficient * diameter_km.powf(-self.exponent)
    }

    fn range(&self) -> (f64, f64) {
        self.range
    }

    fn differential(&self, diameter_km: f64) -> f64 {
        self.exponent * self.coefficient * diameter_km.powf(-self.exponent - 1.0)
    }
}
