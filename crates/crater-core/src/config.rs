//! Serializable run configuration and its validation.

use serde::{Deserialize, Serialize};

use crate::chronology::HartmannNeukumMars;
use crate::csfd::{CsfdParams, TimeInterval, DEFAULT_MAX_EVENTS};
use crate::error::{CraterError, Result};
use crate::morphology::ShapeParams;
use crate::production::NeukumIvanovMars;
use crate::surface::SurfaceKind;

/// How the crater population is produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PopulationMode {
    /// Surface plus optional central crater only.
    None,
    /// Fixed number of craters, integer diameters from a `D^-2` law.
    PowerLaw { count: usize, min_km: u32, max_km: u32 },
    /// Marked Poisson process driven by production and chronology functions.
    Csfd {
        start_ga: f64,
        end_ga: f64,
        /// `None` spans one cell up to the production function's maximum.
        size_interval_km: Option<(f64, f64)>,
        poisson: bool,
        max_events: usize,
    },
}

impl PopulationMode {
    /// CSFD population over 3.6 to 3.0 Ga from one cell up, Poisson arrivals.
    pub fn default_csfd() -> Self {
        PopulationMode::Csfd {
            start_ga: 3.6,
            end_ga: 3.0,
            size_interval_km: None,
            poisson: true,
            max_events: DEFAULT_MAX_EVENTS,
        }
    }
}

/// Everything needed to reproduce one run.
/// Defaults: 20 km Martian domain at 200 m spacing, impacts from 3.6 to 3.0 Ga.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub seed: u64,
    /// Domain edge length in metres.
    pub grid_length_m: f64,
    pub cell_size_m: f64,
    /// Regional slope, rise over run.
    pub slope: f64,
    /// Multiplier on the initial surface roughness.
    pub roughness: f64,
    pub surface: SurfaceKind,
    /// Form rims and ejecta; when false craters are excavated only.
    pub rim: bool,
    /// Diameter (km) of a crater placed at the domain centre before the
    /// population.
    pub central_crater_km: Option<f64>,
    pub population: PopulationMode,
    pub production: NeukumIvanovMars,
    pub chronology: HartmannNeukumMars,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 3,
            grid_length_m: 20_000.0,
            cell_size_m: 200.0,
            slope: 0.0,
            roughness: 1.0,
            surface: SurfaceKind::Uniform,
            rim: true,
            central_crater_km: None,
            population: PopulationMode::default_csfd(),
            production: NeukumIvanovMars::default(),
            chronology: HartmannNeukumMars::default(),
        }
    }
}

impl SimulationConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| CraterError::InvalidParameter(format!("config: {e}")))
    }

    /// Generator inputs for `PopulationMode::Csfd`. Area and cell size are
    /// filled in from the grid when the population is deposited.
    pub fn csfd_params(&self) -> Result<Option<CsfdParams>> {
        match &self.population {
            PopulationMode::Csfd { start_ga, end_ga, size_interval_km, poisson, max_events } => {
                let length_km = self.grid_length_m / 1000.0;
                let mut params = CsfdParams::new(
                    TimeInterval::new(*start_ga, *end_ga)?,
                    *size_interval_km,
                    length_km * length_km,
                    self.cell_size_m / 1000.0,
                );
                params.poisson = *poisson;
                params.max_events = *max_events;
                Ok(Some(params))
            }
            _ => Ok(None),
        }
    }

    /// Reject configurations the kernel cannot run.
    pub fn validate(&self) -> Result<()> {
        if !(self.cell_size_m.is_finite() && self.cell_size_m > 0.0) {
            return Err(CraterError::InvalidParameter(format!(
                "cell size must be positive, got {} m",
                self.cell_size_m
            )));
        }
        if !(self.grid_length_m.is_finite() && self.grid_length_m >= self.cell_size_m) {
            return Err(CraterError::InvalidParameter(format!(
                "grid length {} m must cover at least one {} m cell",
                self.grid_length_m, self.cell_size_m
            )));
        }
        if !(self.roughness.is_finite() && self.roughness > 0.0) {
            return Err(CraterError::InvalidParameter(format!(
                "roughness must be positive, got {}",
                self.roughness
            )));
        }
        if let Some(d) = self.central_crater_km {
            self.check_diameter(d)?;
        }

        match &self.population {
            PopulationMode::None => {}
            PopulationMode::PowerLaw { min_km, max_km, .. } => {
                if *min_km == 0 || min_km >= max_km {
                    return Err(CraterError::InvalidParameter(format!(
                        "power-law diameters must satisfy 1 <= min < max, got {min_km}-{max_km} km"
                    )));
                }
                self.check_diameter(*min_km as f64)?;
            }
            PopulationMode::Csfd { size_interval_km, max_events, .. } => {
                self.csfd_params()?;
                let (min, max) = size_interval_km.unwrap_or((self.cell_size_m / 1000.0, self.production.range.1));
                if !(min > 0.0 && min < max) {
                    return Err(CraterError::InvalidParameter(format!(
                        "crater size interval must satisfy 0 < min < max, got {min}-{max} km"
                    )));
                }
                if *max_events == 0 {
                    return Err(CraterError::InvalidParameter("max_events must be at least 1".into()));
                }
                self.check_diameter(min)?;
            }
        }
        Ok(())
    }

    fn check_diameter(&self, diameter_km: f64) -> Result<()> {
        ShapeParams::for_deposit(diameter_km, self.rim).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        SimulationConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg = SimulationConfig::from_json_str(
            r#"{ "seed": 9, "population": { "mode": "power_law", "count": 5, "min_km": 1, "max_km": 4 } }"#,
        )
        .unwrap();
        assert_eq!(cfg.seed, 9);
        assert_eq!(cfg.cell_size_m, 200.0);
        assert_eq!(cfg.population, PopulationMode::PowerLaw { count: 5, min_km: 1, max_km: 4 });
        cfg.validate().unwrap();
    }

    #[test]
    fn json_round_trip_preserves_population() {
        let cfg = SimulationConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back = SimulationConfig::from_json_str(&json).unwrap();
        assert_eq!(back.population, cfg.population);
        assert_eq!(back.surface, cfg.surface);
    }

    #[test]
    fn malformed_json_is_invalid_parameter() {
        assert!(matches!(
            SimulationConfig::from_json_str("{ seed: }"),
            Err(CraterError::InvalidParameter(_))
        ));
    }

    #[test]
    fn reversed_time_interval_fails_validation() {
        let cfg = SimulationConfig {
            population: PopulationMode::Csfd {
                start_ga: 3.0,
                end_ga: 3.6,
                size_interval_km: None,
                poisson: true,
                max_events: 10,
            },
            ..SimulationConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(CraterError::InvalidParameter(_))));
    }

    #[test]
    fn tiny_rimmed_craters_fail_validation() {
        let cfg = SimulationConfig { cell_size_m: 50.0, ..SimulationConfig::default() };
        assert!(cfg.validate().is_err());
        let rimless = SimulationConfig { cell_size_m: 50.0, rim: false, ..SimulationConfig::default() };
        rimless.validate().unwrap();
    }

    #[test]
    fn central_crater_must_be_positive() {
        let cfg = SimulationConfig { central_crater_km: Some(0.0), ..SimulationConfig::default() };
        assert!(cfg.validate().is_err());
    }
}
