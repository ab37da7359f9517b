//! Falling-block puzzle engine.
//!
//! The library owns the play field, the active piece, collision, rotation,
//! row clearing and scoring. Rendering, audio and input polling live outside
//! of it; a driver feeds [`game::Intents`] into [`game::Game::update`] once per
//! frame and reads back a [`game::Snapshot`].

pub mod block;
pub mod error;
pub mod field;
pub mod game;
pub mod settings;
pub mod shape;
pub mod tetromino;
pub mod timer;

pub use block::{Block, Position};
pub use error::EngineError;
pub use field::{Cell, Field};
pub use game::{Game, GameEvent, GameStatus, Intents, ScoreState, Snapshot};
pub use settings::Settings;
pub use shape::{
    BlockColor, PreviewQueue, RandomShapeSource, SequenceShapeSource, ShapeKind, ShapeSource,
};
pub use tetromino::{MoveOutcome, Tetromino};
pub use timer::Timer;
