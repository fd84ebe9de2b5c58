//! Impact-crater evolution of a planetary elevation grid.
//!
//! A rough initial surface is built on a square raster, then craters are
//! excavated one at a time: either a single central crater, a fixed-count
//! power-law population, or a time-ordered population drawn from a crater
//! production function and a chronology function.

pub mod chronology;
pub mod config;
pub mod csfd;
pub mod error;
pub mod grid;
pub mod inverse;
pub mod morphology;
pub mod population;
pub mod production;
pub mod simulation;
pub mod surface;

pub use config::{PopulationMode, SimulationConfig};
pub use error::{CraterError, RangeExtrapolationWarning, Result};
pub use grid::RasterGrid;
pub use simulation::{CraterSimulator, SimulationResult, SurfaceSummary};
