//! Error types for the checkers engine.
//!
//! Move generation itself never fails: malformed coordinates are simply not
//! legal. Errors only surface from configuration, state machine transitions
//! and snapshot loading.

use thiserror::Error;

/// Errors raised by rulesets, boards and the game state machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    /// Invalid ruleset or board dimensions.
    #[error("invalid configuration: {message}")]
    Configuration { message: String },

    /// The requested move is not among the legal moves of the side to act.
    #[error("illegal move from ({from_x}, {from_y}) to ({to_x}, {to_y})")]
    IllegalMove {
        from_x: i32,
        from_y: i32,
        to_x: i32,
        to_y: i32,
    },

    /// The action is not allowed in the current phase of the game.
    #[error("illegal state: {message}")]
    IllegalState { message: String },

    /// Draw protocol misuse.
    #[error("invalid draw state: {message}")]
    InvalidState { message: String },

    /// Square outside the board or not a playable (dark) square.
    #[error("square ({x}, {y}) is not a playable square")]
    OutOfBounds { x: i32, y: i32 },
}

impl GameError {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub(crate) fn illegal_state(message: impl Into<String>) -> Self {
        Self::IllegalState {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }
}

/// Result type alias for engine operations.
pub type CheckersResult<T> = Result<T, GameError>;

/// Errors raised while decoding or restoring a [`Snapshot`](crate::snapshot::Snapshot).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("snapshot data too short: expected at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },

    #[error("invalid snapshot magic (expected CKRS)")]
    BadMagic,

    #[error("unsupported snapshot version: expected {expected}, got {actual}")]
    UnsupportedVersion { expected: u32, actual: u32 },

    #[error("CRC32 mismatch: expected {expected:#010x}, got {actual:#010x}")]
    CrcMismatch { expected: u32, actual: u32 },

    #[error("unexpected EOF while reading {what}")]
    UnexpectedEof { what: &'static str },

    #[error("snapshot payload has trailing bytes")]
    TrailingBytes,

    #[error("invalid {what} tag: {tag}")]
    InvalidTag { what: &'static str, tag: u8 },

    #[error("cell ({x}, {y}) is not a playable square on a {width}x{height} board")]
    InvalidCell { x: u8, y: u8, width: u8, height: u8 },

    #[error("cell ({x}, {y}) appears more than once")]
    DuplicateCell { x: u8, y: u8 },

    #[error("inconsistent game phase: {message}")]
    InconsistentPhase { message: &'static str },

    #[error("invalid ruleset: {0}")]
    Ruleset(#[from] GameError),
}
