//! Grid model: tiles, per-cell timers, timer decay and gravity.
//!
//! Row 0 is the bottom row (new rows rise in there); row `HEIGHT - 1` is the
//! game-over line.

use crate::config::BREAK_SETTLE;
use rand::Rng;
use std::time::Duration;

pub const HEIGHT: usize = 12;
pub const WIDTH: usize = 6;
pub const NUM_KINDS: usize = 6;

/// Tile colours. Index order matches the theme's tile palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileKind {
    Green,
    Yellow,
    Red,
    Blue,
    Magenta,
    Cyan,
}

impl TileKind {
    pub const ALL: [Self; NUM_KINDS] = [
        Self::Green,
        Self::Yellow,
        Self::Red,
        Self::Blue,
        Self::Magenta,
        Self::Cyan,
    ];

    /// Palette index 0..NUM_KINDS.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Uniformly random kind.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..NUM_KINDS)]
    }
}

/// One grid slot.
///
/// `lit` counts down once a match marks the tile; `settle` locks the cell
/// against gravity and new matches. A lit cell always holds a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cell {
    pub tile: Option<TileKind>,
    pub lit: Duration,
    pub settle: Duration,
}

impl Cell {
    pub const EMPTY: Self = Self {
        tile: None,
        lit: Duration::ZERO,
        settle: Duration::ZERO,
    };

    pub fn with_tile(kind: TileKind) -> Self {
        Self {
            tile: Some(kind),
            ..Self::EMPTY
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tile.is_none()
    }

    #[inline]
    pub fn is_lit(&self) -> bool {
        !self.lit.is_zero()
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        !self.settle.is_zero()
    }
}

/// Fixed `HEIGHT` x `WIDTH` matrix of cells, indexed `[row][col]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    rows: [[Cell; WIDTH]; HEIGHT],
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}

impl Grid {
    pub fn new() -> Self {
        Self {
            rows: [[Cell::EMPTY; WIDTH]; HEIGHT],
        }
    }

    #[inline]
    pub(crate) fn cell(&self, row: usize, col: usize) -> &Cell {
        &self.rows[row][col]
    }

    #[inline]
    pub(crate) fn cell_mut(&mut self, row: usize, col: usize) -> &mut Cell {
        &mut self.rows[row][col]
    }

    /// Rows bottom to top.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell; WIDTH]> {
        self.rows.iter()
    }

    pub fn clear(&mut self) {
        self.rows = [[Cell::EMPTY; WIDTH]; HEIGHT];
    }

    /// Fill the bottom `height` rows with random tiles. Callers validate `height`.
    pub fn fill<R: Rng + ?Sized>(&mut self, height: usize, rng: &mut R) {
        for row in self.rows.iter_mut().take(height) {
            for cell in row.iter_mut() {
                *cell = Cell::with_tile(TileKind::random(rng));
            }
        }
    }

    /// True if any tile sits on the game-over line.
    pub fn top_row_occupied(&self) -> bool {
        self.rows[HEIGHT - 1].iter().any(|c| !c.is_empty())
    }

    /// Move every row (tiles and timers) up by one, dropping the top row,
    /// and put `bottom` into row 0.
    pub fn shift_up(&mut self, bottom: [Cell; WIDTH]) {
        self.rows.copy_within(0..HEIGHT - 1, 1);
        self.rows[0] = bottom;
    }

    /// Count lit timers down. A tile whose timer runs out breaks: the cell
    /// empties and locks for `BREAK_SETTLE`.
    pub fn decay_lights(&mut self, elapsed: Duration) {
        for cell in self.rows.iter_mut().flatten() {
            if cell.is_lit() {
                cell.lit = cell.lit.saturating_sub(elapsed);
                if cell.lit.is_zero() {
                    cell.tile = None;
                    cell.settle = BREAK_SETTLE;
                }
            }
        }
    }

    /// Count settle locks down.
    pub fn decay_settle(&mut self, elapsed: Duration) {
        for cell in self.rows.iter_mut().flatten() {
            if cell.is_locked() {
                cell.settle = cell.settle.saturating_sub(elapsed);
            }
        }
    }

    /// Drop unlit, unlocked tiles into empty, unlocked cells below until
    /// nothing moves. Returns true if any tile fell.
    pub fn resolve_gravity(&mut self) -> bool {
        let mut any = false;
        loop {
            let mut dropped = false;
            for row in 1..HEIGHT {
                for col in 0..WIDTH {
                    let upper = self.rows[row][col];
                    let lower = self.rows[row - 1][col];
                    if upper.tile.is_some()
                        && lower.is_empty()
                        && !upper.is_lit()
                        && !upper.is_locked()
                        && !lower.is_locked()
                    {
                        self.rows[row - 1][col].tile = upper.tile;
                        self.rows[row][col].tile = None;
                        dropped = true;
                    }
                }
            }
            if !dropped {
                return any;
            }
            any = true;
        }
    }

    /// Cells that violate the lit-implies-occupied rule. Empty on every reachable grid.
    pub fn lit_without_tile(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.rows.iter().enumerate().flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, c)| c.is_lit() && c.is_empty())
                .map(move |(c, _)| (r, c))
        })
    }

    /// Build a grid from a picture, top row first. `.` is empty; `G Y R B M C`
    /// are the tile kinds. Missing rows at the top stay empty.
    #[cfg(test)]
    pub(crate) fn from_picture(picture: &[&str]) -> Self {
        let mut grid = Self::new();
        for (i, line) in picture.iter().rev().enumerate() {
            for (col, ch) in line.chars().enumerate() {
                grid.rows[i][col].tile = match ch {
                    'G' => Some(TileKind::Green),
                    'Y' => Some(TileKind::Yellow),
                    'R' => Some(TileKind::Red),
                    'B' => Some(TileKind::Blue),
                    'M' => Some(TileKind::Magenta),
                    'C' => Some(TileKind::Cyan),
                    _ => None,
                };
            }
        }
        grid
    }

    /// Inverse of `from_picture` for the bottom `height` rows.
    #[cfg(test)]
    pub(crate) fn picture(&self, height: usize) -> Vec<String> {
        self.rows[..height]
            .iter()
            .rev()
            .map(|row| {
                row.iter()
                    .map(|c| match c.tile {
                        None => '.',
                        Some(TileKind::Green) => 'G',
                        Some(TileKind::Yellow) => 'Y',
                        Some(TileKind::Red) => 'R',
                        Some(TileKind::Blue) => 'B',
                        Some(TileKind::Magenta) => 'M',
                        Some(TileKind::Cyan) => 'C',
                    })
                    .collect()
            })
            .collect()
    }
}
