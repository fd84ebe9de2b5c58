//! Chronology functions: crater flux as a function of absolute age.
use serde::{Deserialize, Serialize};

pub trait ChronologyFunction {
    /// Cumulative N(1 km) per km² accumulated since `t_ga` billion years ago.
    fn n1(&self, t_ga: f64) -> f64;

    /// Rate multiplier dN(1)/dt per km² per Ga at `t_ga`.
    fn phi(&self, t_ga: f64) -> f64;
}

/// Mars chronology of Hartmann & Neukum (2001):
/// `N(1) = a (e^{bt} - 1) + c t`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HartmannNeukumMars {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl Default for HartmannNeukumMars {
    fn default() -> Self {
        Self { a: 2.68e-14, b: 6.93, c: 4.13e-4 }
    }
}

impl ChronologyFunction for HartmannNeukumMars {
    fn n1(&self, t_ga: f64) -> f64 {
        self.a * ((self.b * t_ga).exp() - 1.0) + self.c * t_ga
    }

    fn phi(&self, t_ga: f64) -> f64 {
        self.a * self.b * (self.b * t_ga).exp() + self.c
    }
}

/// Time-invariant flux.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantFlux {
    pub rate: f64,
}

impl ChronologyFunction for ConstantFlux {
    fn n1(&self, t_ga: f64) -> f64 {
        self.rate * t_ga
    }

    fn phi(&self, _t_ga: f64) -> f64 {
        self.rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn phi_is_derivative_of_n1() {
        let cf = HartmannNeukumMars::default();
        for t in [0.5, 2.0, 3.5, 4.2] {
            let h = 1e-6;
            let numeric = (cf.n1(t + h) - cf.n1(t - h)) / (2.0 * h);
            assert_relative_eq!(cf.phi(t), numeric, max_relative = 1e-6);
        }
    }

    #[test]
    fn flux_is_nearly_constant_after_three_ga() {
        let cf = HartmannNeukumMars::default();
        assert_relative_eq!(cf.phi(1.0), 4.13e-4, max_relative = 1e-6);
        assert!(cf.phi(4.0) > 10.0 * cf.phi(2.0));
    }

    #[test]
    fn constant_flux_accumulates_linearly() {
        let cf = ConstantFlux { rate: 2.0 };
        assert_relative_eq!(cf.n1(1.5), 3.0);
        assert_relative_eq!(cf.phi(4.0), 2.0);
    }
}
