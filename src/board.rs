//! Board: the grid plus cursor, score, rise timer and the per-tick state machine.

use crate::config::{EngineConfig, LIGHT_DURATION, SCORE_FACTOR, SWAP_SETTLE};
use crate::error::BoardError;
use crate::event::BoardEvent;
use crate::grid::{Cell, Grid, HEIGHT, TileKind, WIDTH};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::time::Duration;

/// Top-level board state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardState {
    /// A match is on show; the rise timer is frozen, everything else runs.
    Paused,
    /// Normal play; the rise timer counts down.
    Rising,
    /// Terminal. `think` returns true until the board is reset.
    GameOver,
    /// Frozen by the player; nothing decays until resumed.
    PausedByUser,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Cursor position: the left cell of the addressed pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    pub row: usize,
    pub col: usize,
}

/// What the renderer needs to know about one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CellView {
    pub tile: Option<TileKind>,
    pub lit: bool,
}

/// Copy of everything visible on the board, rows bottom to top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub cells: [[CellView; WIDTH]; HEIGHT],
    pub cursor: Cursor,
    pub score: u64,
    pub state: BoardState,
}

#[derive(Debug)]
pub struct Board {
    config: EngineConfig,
    rng: StdRng,
    grid: Grid,
    state: BoardState,
    pause_remaining: Duration,
    rise_remaining: Duration,
    next_rise_interval: Duration,
    cursor: Cursor,
    score: u64,
    events: Vec<BoardEvent>,
}

impl Board {
    /// Start a game: fill `initial_rows` bottom rows and begin rising.
    pub fn new(config: EngineConfig) -> Result<Self, BoardError> {
        config.validate()?;
        let rng = StdRng::seed_from_u64(config.seed);
        let mut board = Self {
            rise_remaining: config.rise_interval,
            next_rise_interval: config.rise_interval,
            config,
            rng,
            grid: Grid::new(),
            state: BoardState::Rising,
            pause_remaining: Duration::ZERO,
            cursor: Cursor::default(),
            score: 0,
            events: Vec::new(),
        };
        board.grid.fill(board.config.initial_rows, &mut board.rng);
        log::info!(
            "new game: {} rows filled, seed {}",
            board.config.initial_rows,
            board.config.seed
        );
        Ok(board)
    }

    /// Replay: back to the initial values with a freshly filled grid.
    /// The tile generator keeps its stream, so each replay differs.
    pub fn reset(&mut self) {
        self.grid.clear();
        self.grid.fill(self.config.initial_rows, &mut self.rng);
        self.state = BoardState::Rising;
        self.pause_remaining = Duration::ZERO;
        self.rise_remaining = self.config.rise_interval;
        self.next_rise_interval = self.config.rise_interval;
        self.cursor = Cursor::default();
        self.score = 0;
        self.events.clear();
        log::info!("replay");
    }

    /// Advance the simulation by `elapsed`. Returns true once the game is over.
    pub fn think(&mut self, elapsed: Duration) -> bool {
        match self.state {
            BoardState::Rising => {
                self.rise_remaining = self.rise_remaining.saturating_sub(elapsed);
                if self.rise_remaining.is_zero() {
                    self.scroll();
                    self.rise_remaining = self.next_rise_interval;
                    self.next_rise_interval = self.config.shrink(self.next_rise_interval);
                    if self.state == BoardState::GameOver {
                        return true;
                    }
                }
            }
            BoardState::Paused => {
                self.pause_remaining = self.pause_remaining.saturating_sub(elapsed);
                if self.pause_remaining.is_zero() {
                    self.state = BoardState::Rising;
                }
            }
            BoardState::GameOver => return true,
            BoardState::PausedByUser => return false,
        }
        self.grid.decay_lights(elapsed);
        self.grid.decay_settle(elapsed);
        self.grid.resolve_gravity();
        self.find_matches();
        false
    }

    /// Raise the grid one row and inject a random bottom row, or end the game
    /// if the top row is occupied (the grid is then left untouched).
    pub fn scroll(&mut self) {
        if self.grid.top_row_occupied() {
            if self.state != BoardState::GameOver {
                self.state = BoardState::GameOver;
                self.events.push(BoardEvent::GameOver);
                log::info!("game over with score {}", self.score);
            }
            return;
        }
        let mut bottom = [Cell::EMPTY; WIDTH];
        for cell in &mut bottom {
            *cell = Cell::with_tile(TileKind::random(&mut self.rng));
        }
        self.grid.shift_up(bottom);
        if self.cursor.row < HEIGHT - 1 {
            self.cursor.row += 1;
        }
        log::trace!("scroll; next rise in {:?}", self.next_rise_interval);
    }

    /// Run the match detector and apply its consequences. Returns the
    /// number of newly lit cells.
    pub fn find_matches(&mut self) -> u32 {
        let lit = self.grid.find_matches();
        if lit > 0 {
            let gained = SCORE_FACTOR * u64::from(lit) * u64::from(lit);
            self.state = BoardState::Paused;
            self.pause_remaining += LIGHT_DURATION * lit;
            self.score += gained;
            self.events.push(BoardEvent::Explosion { lit, gained });
            log::debug!("match: {lit} lit, +{gained}, score {}", self.score);
        }
        lit
    }

    fn accepts_commands(&self) -> bool {
        matches!(self.state, BoardState::Rising | BoardState::Paused)
    }

    /// Move the cursor one step, clamped to the board.
    pub fn move_cursor(&mut self, direction: Direction) {
        if !self.accepts_commands() {
            return;
        }
        let cursor = &mut self.cursor;
        match direction {
            Direction::Up if cursor.row < HEIGHT - 1 => cursor.row += 1,
            Direction::Down if cursor.row > 0 => cursor.row -= 1,
            Direction::Left if cursor.col > 0 => cursor.col -= 1,
            Direction::Right if cursor.col < WIDTH - 2 => cursor.col += 1,
            _ => {}
        }
        self.events.push(BoardEvent::CursorAction);
    }

    /// Exchange the two tiles under the cursor unless either is lit, then
    /// let anything left floating fall.
    pub fn swap(&mut self) {
        if !self.accepts_commands() {
            return;
        }
        self.events.push(BoardEvent::CursorAction);
        let Cursor { row, col } = self.cursor;
        if col + 1 >= WIDTH {
            return;
        }
        let left = *self.grid.cell(row, col);
        let right = *self.grid.cell(row, col + 1);
        if !left.is_lit() && !right.is_lit() {
            self.grid.cell_mut(row, col).tile = right.tile;
            self.grid.cell_mut(row, col + 1).tile = left.tile;
            if row > 0 {
                self.grid.cell_mut(row, col).settle = SWAP_SETTLE;
                self.grid.cell_mut(row, col + 1).settle = SWAP_SETTLE;
            }
            log::debug!("swap at ({row}, {col})");
        }
        self.grid.resolve_gravity();
    }

    /// Player-requested rise, independent of the rise timer.
    pub fn force_scroll(&mut self) {
        if self.accepts_commands() {
            self.scroll();
        }
    }

    /// Enter or leave the player pause.
    pub fn toggle_pause(&mut self) {
        match self.state {
            BoardState::Rising | BoardState::Paused => {
                self.state = BoardState::PausedByUser;
                log::debug!("paused by player");
            }
            BoardState::PausedByUser => {
                self.state = BoardState::Rising;
                self.pause_remaining = Duration::ZERO;
                log::debug!("resumed");
            }
            BoardState::GameOver => {}
        }
    }

    /// Notifications raised since the last drain, oldest first.
    pub fn drain_events(&mut self) -> std::vec::Drain<'_, BoardEvent> {
        self.events.drain(..)
    }

    pub fn snapshot(&self) -> Snapshot {
        let mut cells = [[CellView::default(); WIDTH]; HEIGHT];
        for (out, row) in cells.iter_mut().zip(self.grid.rows()) {
            for (view, cell) in out.iter_mut().zip(row) {
                *view = CellView {
                    tile: cell.tile,
                    lit: cell.is_lit(),
                };
            }
        }
        Snapshot {
            cells,
            cursor: self.cursor,
            score: self.score,
            state: self.state,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn state(&self) -> BoardState {
        self.state
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn pause_remaining(&self) -> Duration {
        self.pause_remaining
    }

    pub fn rise_remaining(&self) -> Duration {
        self.rise_remaining
    }

    pub fn next_rise_interval(&self) -> Duration {
        self.next_rise_interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BREAK_SETTLE;
    use proptest::prelude::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn board_with(picture: &[&str]) -> Board {
        let mut board = Board::new(EngineConfig {
            initial_rows: 0,
            ..EngineConfig::default()
        })
        .unwrap();
        board.grid = Grid::from_picture(picture);
        board
    }

    #[test]
    fn new_board_fills_requested_rows() {
        let board = Board::new(EngineConfig::default()).unwrap();
        for (r, row) in board.grid().rows().enumerate() {
            assert!(row.iter().all(|c| c.tile.is_some() == (r < 6)));
        }
        assert_eq!(board.state(), BoardState::Rising);
        assert_eq!(board.cursor(), Cursor { row: 0, col: 0 });
        assert_eq!(board.score(), 0);
    }

    #[test]
    fn oversize_fill_is_rejected() {
        let err = Board::new(EngineConfig {
            initial_rows: 13,
            ..EngineConfig::default()
        })
        .unwrap_err();
        assert_eq!(err, BoardError::FillTooTall { requested: 13, max: 12 });
    }

    #[test]
    fn same_seed_same_board() {
        let config = EngineConfig {
            seed: 42,
            ..EngineConfig::default()
        };
        let a = Board::new(config.clone()).unwrap();
        let b = Board::new(config).unwrap();
        assert_eq!(a.grid(), b.grid());
    }

    #[test]
    fn six_forced_scrolls_shift_the_fill_up() {
        let mut board = Board::new(EngineConfig {
            seed: 3,
            ..EngineConfig::default()
        })
        .unwrap();
        let original: Vec<[Cell; WIDTH]> = board.grid().rows().take(6).copied().collect();
        for _ in 0..6 {
            board.force_scroll();
        }
        assert_eq!(board.state(), BoardState::Rising);
        let rows: Vec<&[Cell; WIDTH]> = board.grid().rows().collect();
        for (i, row) in original.iter().enumerate() {
            assert_eq!(rows[i + 6], row);
        }
        for row in &rows[..6] {
            assert!(row.iter().all(|c| c.tile.is_some() && !c.is_lit() && !c.is_locked()));
        }
        assert_eq!(board.cursor().row, 6);
    }

    #[test]
    fn scroll_with_full_top_row_ends_game_without_touching_grid() {
        let mut picture = vec!["......"; HEIGHT];
        picture[0] = "RYRYRY";
        picture[HEIGHT - 1] = "G.....";
        let mut board = board_with(&picture);
        let before = board.grid().clone();
        board.scroll();
        assert_eq!(board.state(), BoardState::GameOver);
        assert_eq!(board.grid(), &before);
        assert_eq!(board.cursor().row, 0);
        assert_eq!(board.drain_events().collect::<Vec<_>>(), [BoardEvent::GameOver]);
        assert!(board.think(ms(16)));
    }

    #[test]
    fn cursor_is_clamped_at_edges() {
        let mut board = board_with(&[]);
        board.cursor = Cursor { row: 0, col: WIDTH - 2 };
        board.move_cursor(Direction::Right);
        assert_eq!(board.cursor(), Cursor { row: 0, col: WIDTH - 2 });
        board.move_cursor(Direction::Down);
        assert_eq!(board.cursor().row, 0);
        board.cursor = Cursor { row: HEIGHT - 1, col: 0 };
        board.move_cursor(Direction::Up);
        board.move_cursor(Direction::Left);
        assert_eq!(board.cursor(), Cursor { row: HEIGHT - 1, col: 0 });
        // Clamped moves are still audible.
        assert_eq!(board.drain_events().count(), 4);
    }

    #[test]
    fn swap_completing_a_run_scores_nine_hundred() {
        let mut board = board_with(&["GGBG.."]);
        board.cursor = Cursor { row: 0, col: 2 };
        board.swap();
        assert_eq!(board.grid().picture(1), ["GGGB.."]);
        assert_eq!(board.find_matches(), 3);
        assert_eq!(board.score(), 900);
        assert_eq!(board.state(), BoardState::Paused);
        assert_eq!(board.pause_remaining(), LIGHT_DURATION * 3);
        let events: Vec<_> = board.drain_events().collect();
        assert_eq!(
            events,
            [
                BoardEvent::CursorAction,
                BoardEvent::Explosion { lit: 3, gained: 900 }
            ]
        );
    }

    #[test]
    fn score_is_quadratic_in_cells_lit_per_pass() {
        let mut board = board_with(&["GGGRRR"]);
        assert_eq!(board.find_matches(), 6);
        assert_eq!(board.score(), 3_600);
        board.grid = Grid::from_picture(&["BBB...", "..Y...", "YYY..."]);
        assert_eq!(board.find_matches(), 6);
        assert_eq!(board.score(), 3_600 * 2);
    }

    #[test]
    fn swap_above_bottom_locks_both_cells() {
        let mut board = board_with(&["GY....", "RRBR.."]);
        board.cursor = Cursor { row: 1, col: 0 };
        board.swap();
        assert_eq!(board.grid().picture(2), ["YG....", "RRBR.."]);
        assert_eq!(board.grid().cell(1, 0).settle, SWAP_SETTLE);
        assert_eq!(board.grid().cell(1, 1).settle, SWAP_SETTLE);
    }

    #[test]
    fn swap_on_bottom_row_does_not_lock() {
        let mut board = board_with(&["GY...."]);
        board.swap();
        assert_eq!(board.grid().picture(1), ["YG...."]);
        assert!(!board.grid().cell(0, 0).is_locked());
    }

    #[test]
    fn swap_with_lit_tile_is_rejected() {
        let mut board = board_with(&["GY...."]);
        board.grid.cell_mut(0, 1).lit = LIGHT_DURATION;
        board.swap();
        assert_eq!(board.grid().picture(1), ["GY...."]);
        assert_eq!(board.drain_events().collect::<Vec<_>>(), [BoardEvent::CursorAction]);
    }

    #[test]
    fn tile_swapped_over_a_gap_falls_after_settling() {
        let mut board = board_with(&["G.....", "RB...."]);
        board.cursor = Cursor { row: 1, col: 0 };
        board.swap();
        assert_eq!(board.grid().picture(2), [".G....", "RB...."]);
        board.grid.cell_mut(0, 1).tile = None;
        board.think(SWAP_SETTLE / 2);
        assert_eq!(board.grid().cell(1, 1).tile, Some(TileKind::Green));
        board.think(SWAP_SETTLE);
        assert_eq!(board.grid().picture(2), ["......", "RG...."]);
    }

    #[test]
    fn rise_timer_scrolls_and_speeds_up() {
        let mut board = board_with(&["G....."]);
        assert!(!board.think(ms(9_999)));
        assert_eq!(board.cursor().row, 0);
        assert!(!board.think(ms(1)));
        assert_eq!(board.cursor().row, 1);
        assert_eq!(board.grid().cell(1, 0).tile, Some(TileKind::Green));
        assert_eq!(board.rise_remaining(), ms(10_000));
        assert_eq!(board.next_rise_interval(), ms(9_500));
    }

    #[test]
    fn pause_freezes_rise_until_it_runs_out() {
        let mut board = board_with(&["GGG..."]);
        assert!(!board.think(ms(100)));
        assert_eq!(board.state(), BoardState::Paused);
        assert_eq!(board.pause_remaining(), ms(1_500));
        let rise = board.rise_remaining();
        board.think(ms(1_000));
        assert_eq!(board.rise_remaining(), rise);
        assert_eq!(board.state(), BoardState::Paused);
        board.think(ms(600));
        assert_eq!(board.state(), BoardState::Rising);
        assert_eq!(board.pause_remaining(), Duration::ZERO);
    }

    #[test]
    fn matched_tiles_break_then_tiles_above_fall() {
        let mut board = board_with(&["Y.....", "GGGR.."]);
        board.think(Duration::ZERO);
        assert_eq!(board.state(), BoardState::Paused);
        board.think(LIGHT_DURATION - ms(1));
        assert_eq!(board.grid().picture(2), ["Y.....", "GGGR.."]);
        board.think(ms(1));
        assert_eq!(board.grid().picture(2), ["Y.....", "...R.."]);
        // Settle decays in the same tick that armed it.
        assert_eq!(board.grid().cell(0, 0).settle, BREAK_SETTLE - ms(1));
        board.think(BREAK_SETTLE - ms(2));
        assert_eq!(board.grid().picture(2), ["Y.....", "...R.."]);
        board.think(ms(1));
        assert_eq!(board.grid().picture(2), ["......", "Y..R.."]);
    }

    #[test]
    fn cascade_after_fall_matches_in_the_same_tick() {
        let mut board = board_with(&["R.....", "GGG...", "RYB...", "RBY..."]);
        board.think(Duration::ZERO);
        assert_eq!(board.score(), 900);
        board.think(LIGHT_DURATION - ms(1));
        board.think(ms(1));
        board.think(BREAK_SETTLE - ms(1));
        // The red tile fell onto the red pair and lit with it in this tick.
        assert_eq!(board.grid().picture(4), ["......", "R.....", "RYB...", "RBY..."]);
        assert!(board.grid().cell(0, 0).is_lit());
        assert!(board.grid().cell(2, 0).is_lit());
        assert_eq!(board.score(), 1_800);
    }

    #[test]
    fn user_pause_freezes_everything() {
        let mut board = board_with(&["GGG..."]);
        board.toggle_pause();
        assert_eq!(board.state(), BoardState::PausedByUser);
        let before = board.grid().clone();
        assert!(!board.think(ms(20_000)));
        assert_eq!(board.grid(), &before);
        assert_eq!(board.rise_remaining(), ms(10_000));
        board.move_cursor(Direction::Up);
        board.swap();
        board.force_scroll();
        assert_eq!(board.cursor(), Cursor::default());
        assert_eq!(board.grid(), &before);
        board.toggle_pause();
        assert_eq!(board.state(), BoardState::Rising);
        board.think(Duration::ZERO);
        assert_eq!(board.score(), 900);
    }

    #[test]
    fn game_over_is_terminal_until_reset() {
        let mut picture = vec!["......"; HEIGHT];
        picture[0] = "CMCMCM";
        let mut board = board_with(&picture);
        board.force_scroll();
        assert_eq!(board.state(), BoardState::GameOver);
        board.toggle_pause();
        assert_eq!(board.state(), BoardState::GameOver);
        assert!(board.think(ms(1)));
        board.reset();
        assert_eq!(board.state(), BoardState::Rising);
        assert_eq!(board.score(), 0);
        assert_eq!(board.rise_remaining(), ms(10_000));
        assert_eq!(board.drain_events().count(), 0);
    }

    #[test]
    fn timed_rise_into_game_over_returns_true_immediately() {
        let mut picture = vec!["......"; HEIGHT];
        picture[0] = "CMC...";
        picture[HEIGHT - 1] = "GGG...";
        let mut board = board_with(&picture);
        assert!(board.think(ms(10_000)));
        assert_eq!(board.state(), BoardState::GameOver);
        assert_eq!(board.score(), 0);
    }

    #[test]
    fn snapshot_reports_tiles_and_lights() {
        let mut board = board_with(&["GGG..."]);
        board.find_matches();
        let snap = board.snapshot();
        assert_eq!(
            snap.cells[0][0],
            CellView {
                tile: Some(TileKind::Green),
                lit: true
            }
        );
        assert_eq!(snap.cells[0][3], CellView::default());
        assert_eq!(snap.score, 900);
        assert_eq!(snap.state, BoardState::Paused);
    }

    #[derive(Debug, Clone, Copy)]
    enum Command {
        Think(u64),
        Move(Direction),
        Swap,
        Scroll,
        Pause,
    }

    fn arb_command() -> impl Strategy<Value = Command> {
        prop_oneof![
            4 => (0u64..700).prop_map(Command::Think),
            1 => Just(Command::Move(Direction::Up)),
            1 => Just(Command::Move(Direction::Down)),
            1 => Just(Command::Move(Direction::Left)),
            1 => Just(Command::Move(Direction::Right)),
            2 => Just(Command::Swap),
            1 => Just(Command::Scroll),
            1 => Just(Command::Pause),
        ]
    }

    proptest! {
        #[test]
        fn prop_invariants_hold_for_any_command_sequence(
            seed in any::<u64>(),
            rows in 0usize..=8,
            commands in proptest::collection::vec(arb_command(), 0..200),
        ) {
            let mut board = Board::new(EngineConfig {
                initial_rows: rows,
                seed,
                rise_interval: Duration::from_millis(2_000),
                ..EngineConfig::default()
            })
            .unwrap();
            for command in commands {
                match command {
                    Command::Think(n) => {
                        board.think(ms(n));
                    }
                    Command::Move(d) => board.move_cursor(d),
                    Command::Swap => board.swap(),
                    Command::Scroll => board.force_scroll(),
                    Command::Pause => board.toggle_pause(),
                }
                prop_assert_eq!(board.grid().lit_without_tile().count(), 0);
                prop_assert!(board.cursor().col <= WIDTH - 2);
                prop_assert!(board.cursor().row < HEIGHT);
            }
        }
    }
}
