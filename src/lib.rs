//! Puzzattack board engine: a rising grid of coloured tiles where runs of
//! three or more break, tiles above fall, and the game ends when the stack
//! reaches the top.
//!
//! The engine is single-threaded and driven from outside: call
//! [`Board::think`] once per frame with the elapsed time, forward player
//! commands as they arrive, and drain [`BoardEvent`]s for sound.

pub mod board;
pub mod config;
pub mod error;
pub mod event;
pub mod grid;
pub mod matching;

pub use board::{Board, BoardState, CellView, Cursor, Direction, Snapshot};
pub use config::EngineConfig;
pub use error::BoardError;
pub use event::BoardEvent;
pub use grid::{Cell, Grid, HEIGHT, NUM_KINDS, TileKind, WIDTH};
