use thiserror::Error;

/// Failures raised at the boundary of the cratering kernel.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CraterError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("dimension mismatch: expected {expected} values, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("crater generation did not terminate: {0}")]
    NonTerminating(String),
}

pub type Result<T> = std::result::Result<T, CraterError>;

/// Requested diameter range reaches outside the production function's
/// calibrated range. The run proceeds by extrapolation.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct RangeExtrapolationWarning {
    pub requested: (f64, f64),
    pub calibrated: (f64, f64),
}

impl std::fmt::Display for RangeExtrapolationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "crater range {:.3}-{:.3} km is outside the production function's range {:.3}-{:.3} km; extrapolating",
            self.requested.0, self.requested.1, self.calibrated.0, self.calibrated.1
        )
    }
}
