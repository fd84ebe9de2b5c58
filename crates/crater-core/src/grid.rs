//! Uniform raster of elevation nodes.

use serde::{Deserialize, Serialize};

use crate::error::{CraterError, Result};

/// A uniform raster of nodes holding elevation in metres, row-major.
/// Node `(row, col)` sits at `(col * spacing, row * spacing)` in grid units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RasterGrid {
    /// Row-major elevation values in metres.
    elevation: Vec<f64>,
    pub columns: usize,
    pub rows: usize,
    /// Node spacing in grid units (metres for every grid built by this crate).
    pub spacing: f64,
}

impl RasterGrid {
    /// Create a grid with a flat, zero-elevation field.
    pub fn new(columns: usize, rows: usize, spacing: f64) -> Result<Self> {
        if columns == 0 || rows == 0 {
            return Err(CraterError::InvalidParameter(format!(
                "grid must have at least one node per axis, got {columns}x{rows}"
            )));
        }
        if !(spacing.is_finite() && spacing > 0.0) {
            return Err(CraterError::InvalidParameter(format!(
                "grid spacing must be positive, got {spacing}"
            )));
        }
        Ok(Self {
            elevation: vec![0.0; columns * rows],
            columns,
            rows,
            spacing,
        })
    }

    /// Create a square `n`×`n` grid.
    pub fn square(n: usize, spacing: f64) -> Result<Self> {
        Self::new(n, n, spacing)
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.columns * self.rows
    }

    #[inline]
    pub fn node_column_count(&self) -> usize {
        self.columns
    }

    #[inline]
    pub fn cell_size(&self) -> f64 {
        self.spacing
    }

    /// Edge length of the domain along x: `spacing * columns`.
    pub fn grid_length(&self) -> f64 {
        self.spacing * self.columns as f64
    }

    /// Planar position of node `index`.
    #[inline]
    pub fn node_xy(&self, index: usize) -> (f64, f64) {
        let row = index / self.columns;
        let col = index % self.columns;
        (col as f64 * self.spacing, row as f64 * self.spacing)
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.elevation[row * self.columns + col]
    }

    /// Euclidean distance from every node to `center`, in grid units.
    /// Centers outside the grid are fine.
    pub fn distances_to_point(&self, center: (f64, f64)) -> Vec<f64> {
        let (cx, cy) = center;
        (0..self.node_count())
            .map(|i| {
                let (x, y) = self.node_xy(i);
                (x - cx).hypot(y - cy)
            })
            .collect()
    }

    pub fn field(&self) -> &[f64] {
        &self.elevation
    }

    pub fn field_mut(&mut self) -> &mut [f64] {
        &mut self.elevation
    }

    /// Replace the whole elevation field. Only used at initialisation;
    /// craters accumulate into `field_mut` instead.
    pub fn set_field(&mut self, values: Vec<f64>) -> Result<()> {
        if values.len() != self.node_count() {
            return Err(CraterError::DimensionMismatch {
                expected: self.node_count(),
                actual: values.len(),
            });
        }
        self.elevation = values;
        Ok(())
    }

    /// Elevation values along one row, west to east.
    pub fn row_profile(&self, row: usize) -> &[f64] {
        let start = row * self.columns;
        &self.elevation[start..start + self.columns]
    }

    pub fn min_elevation(&self) -> f64 {
        self.elevation.iter().cloned().fold(f64::INFINITY, f64::min)
    }

    pub fn max_elevation(&self) -> f64 {
        self.elevation.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn mean_elevation(&self) -> f64 {
        self.elevation.iter().sum::<f64>() / self.elevation.len() as f64
    }
}
