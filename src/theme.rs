//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use puzzattack::{NUM_KINDS, TileKind};
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

const GREEN: Color = Color::Rgb(0x98, 0xC3, 0x79);
const YELLOW: Color = Color::Rgb(0xE5, 0xC0, 0x7B);
const RED: Color = Color::Rgb(0xE0, 0x6C, 0x75);
const BLUE: Color = Color::Rgb(0x61, 0xAF, 0xEF);
const MAGENTA: Color = Color::Rgb(0xC6, 0x78, 0xDD);
const CYAN: Color = Color::Rgb(0x56, 0xB6, 0xC2);
const METER_BG: Color = Color::Rgb(0x31, 0x35, 0x3F);
const DIV_LINE: Color = Color::Rgb(0x3F, 0x44, 0x4F);
const MAIN_FG: Color = Color::Rgb(0xAB, 0xB2, 0xBF);
const INACTIVE_FG: Color = Color::Rgb(0x5C, 0x63, 0x70);

/// Tile and UI colours loaded from a theme file.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Tile colours in `TileKind::ALL` order: green, yellow, red, blue, magenta, cyan.
    pub tiles: [Color; NUM_KINDS],
    /// Playfield background.
    pub bg: Color,
    /// Grid / border.
    pub div_line: Color,
    /// Text (score, state).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    /// Secondary text: key help, empty cells.
    pub inactive_fg: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::onedark_default()
    }
}

impl Theme {
    /// One Dark defaults.
    pub fn onedark_default() -> Self {
        Self {
            tiles: [GREEN, YELLOW, RED, BLUE, MAGENTA, CYAN],
            bg: METER_BG,
            div_line: DIV_LINE,
            main_fg: MAIN_FG,
            title: YELLOW,
            inactive_fg: INACTIVE_FG,
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to One Dark defaults if path is None or the file is missing.
    pub fn load(path: Option<&Path>, palette: crate::Palette) -> Result<Self, ThemeError> {
        let path = match path {
            Some(p) if p.exists() => p,
            _ => return Ok(Self::default_for_palette(palette)),
        };
        let s = std::fs::read_to_string(path)?;
        let map = parse_theme_file(&s);
        let mut theme = Self::from_map(&map);
        theme.apply_palette(palette);
        Ok(theme)
    }

    fn default_for_palette(palette: crate::Palette) -> Self {
        let mut t = Self::onedark_default();
        t.apply_palette(palette);
        t
    }

    /// Override tile colours for high-contrast or colorblind play.
    pub fn apply_palette(&mut self, palette: crate::Palette) {
        match palette {
            crate::Palette::Normal => {}
            crate::Palette::HighContrast => {
                self.tiles = [
                    Color::Rgb(0x00, 0xFF, 0x00),
                    Color::Rgb(0xFF, 0xFF, 0x00),
                    Color::Rgb(0xFF, 0x00, 0x00),
                    Color::Rgb(0x00, 0x88, 0xFF),
                    Color::Rgb(0xFF, 0x00, 0xFF),
                    Color::Rgb(0x00, 0xFF, 0xFF),
                ];
            }
            crate::Palette::Colorblind => {
                // Paul Tol's vibrant scheme
                self.tiles = [
                    Color::Rgb(0x00, 0x77, 0xBB),
                    Color::Rgb(0xEE, 0x77, 0x33),
                    Color::Rgb(0x00, 0x99, 0x88),
                    Color::Rgb(0xCC, 0x33, 0x11),
                    Color::Rgb(0xEE, 0x33, 0x77),
                    Color::Rgb(0xBB, 0xBB, 0x00),
                ];
            }
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| map.get(key).and_then(|v| parse_hex(v).ok());
        Self {
            tiles: [
                get("mem_box").or_else(|| get("cpu_start")).unwrap_or(GREEN),
                get("title").or_else(|| get("cpu_mid")).unwrap_or(YELLOW),
                get("cpu_end").or_else(|| get("temp_end")).unwrap_or(RED),
                get("cpu_box").unwrap_or(BLUE),
                get("net_box").unwrap_or(MAGENTA),
                get("hi_fg").or_else(|| get("proc_misc")).unwrap_or(CYAN),
            ],
            bg: get("meter_bg").unwrap_or(METER_BG),
            div_line: get("div_line").unwrap_or(DIV_LINE),
            main_fg: get("main_fg").unwrap_or(MAIN_FG),
            title: get("title").unwrap_or(YELLOW),
            inactive_fg: get("inactive_fg").unwrap_or(INACTIVE_FG),
        }
    }

    #[inline]
    pub fn tile_color(&self, kind: TileKind) -> Color {
        self.tiles[kind.index()]
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(stripped) = line.strip_prefix("theme[") else {
            continue;
        };
        let Some(end) = stripped.find(']') else {
            continue;
        };
        let key = stripped[..end].trim();
        let rest = stripped[end + 1..].trim();
        if let Some(value) = rest.strip_prefix('=') {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            if !value.is_empty() {
                map.insert(key.to_string(), value.to_string());
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.to_string());
    if !s.is_ascii() {
        return Err(invalid());
    }
    let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| invalid());
    let (r, g, b) = match s.len() {
        6 => (channel(&s[0..2])?, channel(&s[2..4])?, channel(&s[4..6])?),
        3 => (
            channel(&s[0..1])? * 17,
            channel(&s[1..2])? * 17,
            channel(&s[2..3])? * 17,
        ),
        _ => return Err(invalid()),
    };
    Ok(Color::Rgb(r, g, b))
}
