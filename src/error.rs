//! Errors raised when a board cannot be constructed.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BoardError {
    #[error("initial fill of {requested} rows exceeds grid height {max}")]
    FillTooTall { requested: usize, max: usize },
    #[error("speed-up factor must be in (0, 1], got {0}")]
    InvalidSpeedup(f64),
    #[error("rise interval must be non-zero")]
    ZeroRiseInterval,
}
