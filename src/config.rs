//! Engine constants and the validated per-session configuration.

use crate::error::BoardError;
use crate::grid::HEIGHT;
use std::time::Duration;

/// How long a matched tile stays lit before it breaks.
pub const LIGHT_DURATION: Duration = Duration::from_millis(500);
/// Lock armed on a cell when its lit tile breaks.
pub const BREAK_SETTLE: Duration = Duration::from_millis(250);
/// Lock armed on both cells of a swap above the bottom row.
pub const SWAP_SETTLE: Duration = Duration::from_millis(125);
/// Score gained by a match pass is `SCORE_FACTOR * lit * lit`.
pub const SCORE_FACTOR: u64 = 100;

pub const DEFAULT_INITIAL_ROWS: usize = 6;
pub const DEFAULT_RISE_INTERVAL: Duration = Duration::from_millis(10_000);
pub const DEFAULT_SPEEDUP: f64 = 0.95;

/// Options for one game session. Built by the frontend from CLI flags.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Bottom rows filled with random tiles on new game and replay.
    pub initial_rows: usize,
    /// First rise countdown and first reset value.
    pub rise_interval: Duration,
    /// Multiplier applied to the next rise interval after every timed rise.
    pub speedup: f64,
    /// Optional floor for the shrinking rise interval. `None` keeps speeding up forever.
    pub min_rise_interval: Option<Duration>,
    /// Seed for the tile generator.
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_rows: DEFAULT_INITIAL_ROWS,
            rise_interval: DEFAULT_RISE_INTERVAL,
            speedup: DEFAULT_SPEEDUP,
            min_rise_interval: None,
            seed: 0,
        }
    }
}

impl EngineConfig {
    /// Reject parameters that would produce an inconsistent board.
    pub fn validate(&self) -> Result<(), BoardError> {
        if self.initial_rows > HEIGHT {
            return Err(BoardError::FillTooTall {
                requested: self.initial_rows,
                max: HEIGHT,
            });
        }
        if !self.speedup.is_finite() || self.speedup <= 0.0 || self.speedup > 1.0 {
            return Err(BoardError::InvalidSpeedup(self.speedup));
        }
        if self.rise_interval.is_zero() {
            return Err(BoardError::ZeroRiseInterval);
        }
        Ok(())
    }

    /// Next value of the rise interval after one timed rise.
    pub fn shrink(&self, interval: Duration) -> Duration {
        let next = interval.mul_f64(self.speedup);
        match self.min_rise_interval {
            Some(floor) => next.max(floor),
            None => next,
        }
    }
}
