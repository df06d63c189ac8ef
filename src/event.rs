//! Fire-and-forget notifications for the audio collaborator.

/// Something audible happened on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardEvent {
    /// A match pass lit `lit` cells and added `gained` to the score.
    Explosion { lit: u32, gained: u64 },
    /// The player moved the cursor or pressed swap.
    CursorAction,
    /// Tiles reached the top row during a rise.
    GameOver,
}
