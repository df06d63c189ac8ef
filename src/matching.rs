//! Match detection: runs of three or more equal tiles along a row or column.

use crate::config::LIGHT_DURATION;
use crate::grid::{Grid, HEIGHT, WIDTH};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Vertical,
    Horizontal,
}

impl Axis {
    /// Cell `step` positions away from the anchor along this axis.
    fn offset(self, row: usize, col: usize, step: usize) -> (usize, usize) {
        match self {
            Self::Vertical => (row + step, col),
            Self::Horizontal => (row, col + step),
        }
    }

    /// Cells remaining after the anchor along this axis.
    fn room(self, row: usize, col: usize) -> usize {
        match self {
            Self::Vertical => HEIGHT - 1 - row,
            Self::Horizontal => WIDTH - 1 - col,
        }
    }
}

impl Grid {
    /// Light every run of three or more, anchored row by row from the bottom
    /// and column by column from the left, vertical before horizontal.
    ///
    /// Lit state is read live, so a run lit earlier in this pass stops those
    /// cells from anchoring and lets a later perpendicular run chain through
    /// them. Returns the number of cells newly lit by this call.
    pub fn find_matches(&mut self) -> u32 {
        let mut lit = 0;
        for row in 0..HEIGHT {
            for col in 0..WIDTH {
                let anchor = self.cell(row, col);
                if anchor.is_empty() || anchor.is_lit() || anchor.is_locked() {
                    continue;
                }
                lit += self.scan(row, col, Axis::Vertical);
                lit += self.scan(row, col, Axis::Horizontal);
            }
        }
        lit
    }

    fn scan(&mut self, row: usize, col: usize, axis: Axis) -> u32 {
        let room = axis.room(row, col);
        if room < 2 {
            return 0;
        }
        let kind = self.cell(row, col).tile;
        let mut lit = 0;
        let mut count = 0;
        for step in 1..=room {
            let (r, c) = axis.offset(row, col, step);
            let next = self.cell(r, c);
            let joins = next.tile == kind
                && !next.is_locked()
                && (!next.is_lit() || next.lit == LIGHT_DURATION);
            if !joins {
                break;
            }
            count += 1;
            if count == 2 {
                for back in 0..=2 {
                    let (r, c) = axis.offset(row, col, step - back);
                    lit += self.light(r, c);
                }
            } else if count > 2 {
                lit += self.light(r, c);
            }
        }
        lit
    }

    /// Mark a cell fully lit; 1 if it was unlit before.
    fn light(&mut self, row: usize, col: usize) -> u32 {
        let cell = self.cell_mut(row, col);
        let newly = u32::from(!cell.is_lit());
        cell.lit = LIGHT_DURATION;
        newly
    }
}
