use thiserror::Error;

/// Errors surfaced by the engine.
///
/// Game over is not an error; see [`crate::game::GameStatus`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("unknown shape symbol {0:?}")]
    UnknownShape(char),

    #[error("invalid settings: {0}")]
    Configuration(String),

    #[error("field cell at row {row}, column {col} does not match its block")]
    InvariantViolation { row: i32, col: i32 },
}
