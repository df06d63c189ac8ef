//! Puzzattack: rising tile-matching puzzle in the terminal.

mod app;
mod input;
mod logging;
mod sound;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use puzzattack::EngineConfig;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(path) = &args.log_file {
        logging::init(path, args.log_level.into())
            .with_context(|| format!("opening log file {}", path.display()))?;
    }
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_default();
    let config = args.engine_config();
    log::info!("starting with {config:?}");
    let mut app = App::new(args, config, theme)?;
    app.run()?;
    Ok(())
}

/// Rising tile-matching puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "puzzattack",
    version,
    about = "Rising tile-matching puzzle in the terminal. Swap neighbouring tiles to line up three or more of a colour before the stack reaches the top.",
    long_about = "Puzzattack is a terminal take on the panel-rising puzzle genre.\n\n\
        The stack rises one row at a time, faster after every rise. Swap the two tiles under \
        the cursor to make horizontal or vertical runs of three or more; matched tiles light \
        up, break, and the tiles above fall. The game ends when a rise would push tiles past \
        the top.\n\n\
        CONTROLS:\n  Arrows / hjkl   Move cursor    Space / x   Swap\n  Tab / z         Raise stack    p           Pause\n  r / Enter       Restart (after game over)   q / Esc   Quit"
)]
pub struct Args {
    /// Rows of tiles at the start of a game (0..=12).
    #[arg(long, default_value = "6", value_name = "N")]
    pub rows: usize,

    /// Time between rises at the start of a game.
    #[arg(long, default_value = "10000", value_name = "MS")]
    pub rise_ms: u64,

    /// Factor applied to the rise interval after every rise (0 < F <= 1).
    #[arg(long, default_value = "0.95", value_name = "F")]
    pub speedup: f64,

    /// Never let the rise interval drop below this. Unbounded if not set.
    #[arg(long, value_name = "MS")]
    pub min_rise_ms: Option<u64>,

    /// Seed for the tile generator. Taken from the clock if not set.
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Target render frames per second.
    #[arg(long, default_value = "30.0", value_name = "RATE")]
    pub frame_rate: f64,

    /// Disable the explosion animation.
    #[arg(long)]
    pub no_animation: bool,

    /// Ring the terminal bell on matches and cursor actions.
    #[arg(long)]
    pub bell: bool,

    /// Write log records to this file.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Most verbose level written to --log-file.
    #[arg(long, default_value = "info")]
    pub log_level: LogLevel,
}

impl Args {
    pub fn engine_config(&self) -> EngineConfig {
        let seed = self.seed.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or_default()
        });
        EngineConfig {
            initial_rows: self.rows,
            rise_interval: Duration::from_millis(self.rise_ms),
            speedup: self.speedup,
            min_rise_interval: self.min_rise_ms.map(Duration::from_millis),
            seed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Self::Error,
            LogLevel::Warn => Self::Warn,
            LogLevel::Info => Self::Info,
            LogLevel::Debug => Self::Debug,
            LogLevel::Trace => Self::Trace,
        }
    }
}
