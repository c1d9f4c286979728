use thiserror::Error;

/// Fatal engine errors.
///
/// Terminal game states ([`Won`](crate::Status::Won) / [`Lost`](crate::Status::Lost))
/// are ordinary outcomes and never reported through this type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// The requested board has a zero dimension.
    #[error("board must have at least one row and one column, got {rows}x{cols}")]
    EmptyGrid { rows: usize, cols: usize },

    /// The rejection-sampling budget ran out before every skull was placed.
    ///
    /// The board is unusable; the caller should retry with fresh randomness
    /// or different dimensions rather than play a partially filled grid.
    #[error("skull placement budget exhausted: placed {placed} of {target}")]
    PlacementBudgetExhausted { placed: usize, target: usize },

    /// A cell was deduced to be both safe and a skull.
    ///
    /// This indicates a defect in a deduction rule, not a recoverable game
    /// state. Automatic play must halt rather than risk an unsound move.
    #[error("solver contradiction: cell ({row}, {col}) marked both safe and skull")]
    Contradiction { row: usize, col: usize },
}
