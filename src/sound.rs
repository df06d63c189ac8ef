//! Sound sink for board notifications: the terminal bell stands in for audio.

use puzzattack::BoardEvent;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy)]
pub struct Speaker {
    enabled: bool,
}

impl Speaker {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Whether this event makes a sound.
    pub fn audible(event: &BoardEvent) -> bool {
        matches!(
            event,
            BoardEvent::Explosion { .. } | BoardEvent::CursorAction
        )
    }

    pub fn play(&self, event: &BoardEvent, out: &mut impl Write) -> io::Result<()> {
        if self.enabled && Self::audible(event) {
            out.write_all(b"\x07")?;
            out.flush()?;
        }
        Ok(())
    }
}
