//! Layout and drawing: board, cursor, sidebar, pause and game-over overlays.

use crate::theme::Theme;
use puzzattack::config::LIGHT_DURATION;
use puzzattack::{Board, BoardState, HEIGHT, Snapshot, TileKind, WIDTH};
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Widget};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

/// Terminal columns per tile.
const CELL_WIDTH: u16 = 4;
const SIDEBAR_WIDTH: u16 = 26;

/// Tall tiles (two rows) when the terminal has room, otherwise one row.
fn cell_height(area: Rect) -> u16 {
    if area.height >= HEIGHT as u16 * 2 + 2 { 2 } else { 1 }
}

/// Board outer size (with border) in terminal cells.
fn board_outer_size(cell_h: u16) -> (u16, u16) {
    (WIDTH as u16 * CELL_WIDTH + 2, HEIGHT as u16 * cell_h + 2)
}

/// Screen rect of grid cell (row, col); row 0 is drawn at the bottom.
fn cell_rect(inner: Rect, row: usize, col: usize, cell_h: u16) -> Rect {
    Rect {
        x: inner.x + col as u16 * CELL_WIDTH,
        y: inner.y + (HEIGHT - 1 - row) as u16 * cell_h,
        width: CELL_WIDTH,
        height: cell_h,
    }
}

/// Explosion animation: fades lit tiles into the background while they count down.
#[derive(Default)]
pub struct Explosion {
    pending: bool,
    effect: Option<Effect>,
    process_time: Option<Instant>,
}

impl Explosion {
    /// Start a new fade over whatever is lit on the next frame.
    pub fn trigger(&mut self) {
        self.pending = true;
        self.effect = None;
        self.process_time = None;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn apply(
        &mut self,
        frame: &mut Frame,
        snapshot: &Snapshot,
        theme: &Theme,
        inner: Rect,
        cell_h: u16,
        now: Instant,
    ) {
        let delta = self
            .process_time
            .map(|t| now.saturating_duration_since(t))
            .unwrap_or(std::time::Duration::ZERO);
        let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
        self.process_time = Some(now);

        if self.pending {
            self.pending = false;
            let lit = lit_buffer_positions(snapshot, inner, cell_h);
            let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
                lit.contains(&(pos.x, pos.y))
            }));
            let fade_ms = LIGHT_DURATION.as_millis() as u32;
            let effect = fx::fade_to(theme.bg, theme.bg, (fade_ms, Interpolation::Linear))
                .with_filter(filter)
                .with_area(inner);
            self.effect = Some(effect);
        }

        let done = match &mut self.effect {
            Some(effect) => {
                frame.render_effect(effect, inner, TfxDuration::from_millis(delta_ms));
                effect.done()
            }
            None => false,
        };
        if done {
            self.effect = None;
            self.process_time = None;
        }
    }
}

/// Buffer positions covered by lit tiles.
fn lit_buffer_positions(snapshot: &Snapshot, inner: Rect, cell_h: u16) -> HashSet<(u16, u16)> {
    let mut set = HashSet::new();
    for (row, cells) in snapshot.cells.iter().enumerate() {
        for (col, view) in cells.iter().enumerate() {
            if !view.lit {
                continue;
            }
            let r = cell_rect(inner, row, col, cell_h);
            for y in r.y..r.y + r.height {
                for x in r.x..r.x + r.width {
                    set.insert((x, y));
                }
            }
        }
    }
    set
}

/// Draw the whole screen for the current board.
pub fn draw(
    frame: &mut Frame,
    board: &Board,
    theme: &Theme,
    explosion: &mut Explosion,
    animate: bool,
    now: Instant,
) {
    let area = frame.area();
    let snapshot = board.snapshot();
    let cell_h = cell_height(area);
    let (bw, bh) = board_outer_size(cell_h);
    let total_w = bw + SIDEBAR_WIDTH;

    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(bh),
            Constraint::Fill(1),
        ])
        .split(horiz[1]);
    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(bw), Constraint::Length(SIDEBAR_WIDTH)])
        .split(vert[1]);
    let (board_area, sidebar_area) = (inner[0], inner[1]);

    let board_inner = draw_board(frame.buffer_mut(), &snapshot, theme, board_area, cell_h);
    if animate {
        explosion.apply(frame, &snapshot, theme, board_inner, cell_h, now);
    }
    draw_cursor(frame.buffer_mut(), &snapshot, board_inner, cell_h);
    draw_sidebar(frame, board, &snapshot, theme, sidebar_area);

    match snapshot.state {
        BoardState::PausedByUser => draw_pause_overlay(frame, theme, board_area),
        BoardState::GameOver => draw_game_over(frame, &snapshot, theme, board_area),
        BoardState::Rising | BoardState::Paused => {}
    }
}

/// Draw tiles; returns the inner (borderless) board rect.
fn draw_board(buf: &mut Buffer, snapshot: &Snapshot, theme: &Theme, area: Rect, cell_h: u16) -> Rect {
    let danger = snapshot.cells[HEIGHT - 1].iter().any(|c| c.tile.is_some());
    let title_style = if danger {
        Style::default().fg(Color::Red).bold()
    } else {
        Style::default().fg(theme.title)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(" Puzzattack ", title_style));
    let inner = block.inner(area);
    block.render(area, buf);

    for (row, cells) in snapshot.cells.iter().enumerate() {
        for (col, view) in cells.iter().enumerate() {
            let (symbol, style) = match view.tile {
                None => (" ", Style::default().bg(theme.bg)),
                Some(kind) if view.lit => (
                    "░",
                    Style::default().fg(Color::White).bg(theme.tile_color(kind)),
                ),
                Some(kind) => (" ", Style::default().bg(theme.tile_color(kind))),
            };
            let r = cell_rect(inner, row, col, cell_h).intersection(inner);
            for y in r.y..r.y + r.height {
                for x in r.x..r.x + r.width {
                    buf[(x, y)].set_symbol(symbol).set_style(style);
                }
            }
        }
    }
    inner
}

/// Brackets around the two cells under the cursor.
fn draw_cursor(buf: &mut Buffer, snapshot: &Snapshot, inner: Rect, cell_h: u16) {
    let cursor = snapshot.cursor;
    let left = cell_rect(inner, cursor.row, cursor.col, cell_h);
    let right = cell_rect(inner, cursor.row, cursor.col + 1, cell_h);
    let pair = left.union(right).intersection(inner);
    if pair.is_empty() {
        return;
    }
    let last_x = pair.x + pair.width - 1;
    for y in pair.y..pair.y + pair.height {
        buf[(pair.x, y)].set_symbol("[").set_fg(Color::White);
        buf[(last_x, y)].set_symbol("]").set_fg(Color::White);
    }
}

fn state_label(state: BoardState) -> &'static str {
    match state {
        BoardState::Rising => "Rising",
        BoardState::Paused => "Breaking",
        BoardState::PausedByUser => "Paused",
        BoardState::GameOver => "Game over",
    }
}

fn draw_sidebar(frame: &mut Frame, board: &Board, snapshot: &Snapshot, theme: &Theme, area: Rect) {
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let border_style = Style::default().fg(theme.div_line).bg(theme.bg);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Stats
            Constraint::Length(1), // gap
            Constraint::Length(4), // Colours
            Constraint::Length(1), // gap
            Constraint::Length(8), // Keys
        ])
        .split(area);

    let stats_block = Block::default().borders(Borders::ALL).border_style(border_style);
    let stats_inner = stats_block.inner(chunks[0]);
    stats_block.render(chunks[0], frame.buffer_mut());
    let rise = if snapshot.state == BoardState::Paused {
        format!(
            "{:.1}s +{:.1}s",
            board.rise_remaining().as_secs_f64(),
            board.pause_remaining().as_secs_f64()
        )
    } else {
        format!("{:.1}s", board.rise_remaining().as_secs_f64())
    };
    let stats_lines = vec![
        Line::from(vec![
            Span::styled("Score: ", title_style),
            Span::styled(snapshot.score.to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("State: ", title_style),
            Span::styled(state_label(snapshot.state), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Rise:  ", title_style),
            Span::styled(rise, fg_style),
        ]),
        Line::from(vec![
            Span::styled("Speed: ", title_style),
            Span::styled(
                format!("{:.2}s/row", board.next_rise_interval().as_secs_f64()),
                fg_style,
            ),
        ]),
    ];
    Paragraph::new(stats_lines).render(stats_inner, frame.buffer_mut());

    let colours_block = Block::default().borders(Borders::ALL).border_style(border_style);
    let colours_inner = colours_block.inner(chunks[2]);
    colours_block.render(chunks[2], frame.buffer_mut());
    let colours_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(colours_inner);
    Paragraph::new(Line::from(Span::styled("Tiles", title_style)))
        .render(colours_layout[0], frame.buffer_mut());
    draw_colour_strip(frame.buffer_mut(), theme, colours_layout[1]);

    let keys_block = Block::default().borders(Borders::ALL).border_style(border_style);
    let keys_inner = keys_block.inner(chunks[4]);
    keys_block.render(chunks[4], frame.buffer_mut());
    let help = Style::default().fg(theme.inactive_fg);
    let keys = [
        ("←↓↑→ hjkl", "move"),
        ("Space x", "swap"),
        ("Tab z", "raise"),
        ("p", "pause"),
        ("r Enter", "restart"),
        ("q Esc", "quit"),
    ];
    let lines: Vec<Line> = keys
        .iter()
        .map(|(k, what)| {
            Line::from(vec![
                Span::styled(format!("{k:<11}"), fg_style),
                Span::styled(*what, help),
            ])
        })
        .collect();
    Paragraph::new(lines).render(keys_inner, frame.buffer_mut());
}

fn draw_colour_strip(buf: &mut Buffer, theme: &Theme, area: Rect) {
    for (i, kind) in TileKind::ALL.iter().enumerate() {
        let x = area.x + i as u16 * 3;
        if x + 2 > area.x + area.width {
            break;
        }
        let style = Style::default().bg(theme.tile_color(*kind));
        buf.set_string(x, area.y, "  ", style);
    }
}

fn centered(area: Rect, w: u16, h: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(w) / 2,
        y: area.y + area.height.saturating_sub(h) / 2,
        width: w.min(area.width),
        height: h.min(area.height),
    }
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup = centered(area, 24, 5);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " P resume  Q quit ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
        )
        .render(popup, frame.buffer_mut());
}

fn draw_game_over(frame: &mut Frame, snapshot: &Snapshot, theme: &Theme, area: Rect) {
    let popup = centered(area, 24, 8);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Game Over ",
            Style::default().fg(Color::White).bg(Color::Red),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!(" Score: {} ", snapshot.score),
            Style::default().fg(theme.main_fg),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " R restart  Q quit ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
                .title(Span::styled(" Puzzattack ", theme.title)),
        )
        .render(popup, frame.buffer_mut());
}

#[cfg(test)]
mod tests {
    use super::*;
    use puzzattack::{CellView, Cursor};

    fn inner() -> Rect {
        Rect::new(1, 1, WIDTH as u16 * CELL_WIDTH, HEIGHT as u16 * 2)
    }

    #[test]
    fn bottom_row_is_drawn_last() {
        let r = cell_rect(inner(), 0, 0, 2);
        assert_eq!(r, Rect::new(1, 1 + 22, 4, 2));
        let top = cell_rect(inner(), HEIGHT - 1, WIDTH - 1, 2);
        assert_eq!(top, Rect::new(1 + 20, 1, 4, 2));
    }

    #[test]
    fn short_terminals_get_flat_tiles() {
        assert_eq!(cell_height(Rect::new(0, 0, 80, 24)), 1);
        assert_eq!(cell_height(Rect::new(0, 0, 80, 40)), 2);
    }

    #[test]
    fn lit_positions_cover_lit_tiles_only() {
        let mut snapshot = Snapshot {
            cells: [[CellView::default(); WIDTH]; HEIGHT],
            cursor: Cursor::default(),
            score: 0,
            state: BoardState::Paused,
        };
        snapshot.cells[0][1] = CellView {
            tile: Some(TileKind::Red),
            lit: true,
        };
        snapshot.cells[0][2] = CellView {
            tile: Some(TileKind::Red),
            lit: false,
        };
        let set = lit_buffer_positions(&snapshot, inner(), 2);
        assert_eq!(set.len(), 8);
        assert!(set.contains(&(5, 23)));
        assert!(!set.contains(&(9, 23)));
    }

    #[test]
    fn cursor_brackets_the_pair() {
        let mut buf = Buffer::empty(Rect::new(0, 0, 30, 30));
        let snapshot = Snapshot {
            cells: [[CellView::default(); WIDTH]; HEIGHT],
            cursor: Cursor { row: 0, col: 1 },
            score: 0,
            state: BoardState::Rising,
        };
        draw_cursor(&mut buf, &snapshot, inner(), 2);
        assert_eq!(buf[(5, 23)].symbol(), "[");
        assert_eq!(buf[(12, 24)].symbol(), "]");
    }
}
