//! App: terminal init, main loop, tick and key handling.

use crate::Args;
use crate::input::{Action, key_to_action};
use crate::sound::Speaker;
use crate::theme::Theme;
use crate::ui::{self, Explosion};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use puzzattack::{Board, BoardEvent, BoardState, EngineConfig};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};

pub struct App {
    args: Args,
    theme: Theme,
    board: Board,
    speaker: Speaker,
    /// When the board last advanced; the first tick measures from construction.
    last_tick: Instant,
    /// Set once `think` reports game over; the board is not advanced again until restart.
    over: bool,
    explosion: Explosion,
}

impl App {
    pub fn new(args: Args, config: EngineConfig, theme: Theme) -> Result<Self> {
        let board = Board::new(config)?;
        let speaker = Speaker::new(args.bell);
        Ok(Self {
            args,
            theme,
            board,
            speaker,
            last_tick: Instant::now(),
            over: false,
            explosion: Explosion::default(),
        })
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        // Restore
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let frame_duration = Duration::from_secs_f64(1.0 / self.args.frame_rate.max(1.0));
        loop {
            let now = Instant::now();
            let animate = !self.args.no_animation;
            terminal.draw(|f| {
                ui::draw(f, &self.board, &self.theme, &mut self.explosion, animate, now)
            })?;

            let timeout = frame_duration.saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    if let Event::Key(key) = event::read()? {
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }
                        if !self.apply_action(key_to_action(key)) {
                            return Ok(());
                        }
                    }
                }
            }

            let now = Instant::now();
            let elapsed = now.saturating_duration_since(self.last_tick);
            self.last_tick = now;
            self.advance(elapsed);
            self.dispatch_events()?;
        }
    }

    fn advance(&mut self, elapsed: Duration) {
        if self.over {
            return;
        }
        self.over = self.board.think(elapsed);
    }

    /// Apply one player action. Returns false when the player quits.
    fn apply_action(&mut self, action: Action) -> bool {
        match action {
            Action::Quit => return false,
            Action::Move(direction) => self.board.move_cursor(direction),
            Action::Swap => self.board.swap(),
            Action::Raise => self.board.force_scroll(),
            Action::Pause => self.board.toggle_pause(),
            Action::Restart => {
                if self.board.state() == BoardState::GameOver {
                    self.board.reset();
                    self.over = false;
                    self.explosion.clear();
                    self.last_tick = Instant::now();
                }
            }
            Action::None => {}
        }
        true
    }

    /// Hand queued board notifications to the speaker and the animation.
    fn dispatch_events(&mut self) -> Result<()> {
        let events: Vec<BoardEvent> = self.board.drain_events().collect();
        if events.is_empty() {
            return Ok(());
        }
        let mut stdout = std::io::stdout();
        for event in &events {
            self.speaker.play(event, &mut stdout)?;
            match event {
                BoardEvent::Explosion { .. } => self.explosion.trigger(),
                BoardEvent::GameOver => self.explosion.clear(),
                BoardEvent::CursorAction => {}
            }
        }
        Ok(())
    }
}
