use std::fmt;
use std::time::Duration;

use crate::block::Position;
use crate::error::EngineError;
use crate::field::Field;
use crate::settings::Settings;
use crate::shape::{BlockColor, ShapeKind, ShapeSource};
use crate::tetromino::{MoveOutcome, Tetromino};
use crate::timer::Timer;

// ============================================================================
// Types
// ============================================================================

/// Player input for one frame, already decoded by the driver.
///
/// `soft_drop` is a held state, the other three are pressed-this-frame flags.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Intents {
    pub move_left: bool,
    pub move_right: bool,
    pub rotate: bool,
    pub soft_drop: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameStatus {
    Playing,
    GameOver,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ScoreState {
    pub score: u32,
    pub level: u32,
    pub lines: u32,
}

impl Default for ScoreState {
    fn default() -> Self {
        Self {
            score: 0,
            level: 1,
            lines: 0,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum GameEvent {
    PieceMoved,
    PieceRotated,
    PieceLocked,
    PieceSpawned(ShapeKind),
    LinesCleared(u32),
    LevelUp(u32),
    GameOver,
}

/// Read-only copy of everything a renderer needs.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Snapshot {
    /// Settled blocks only, indexed `[row][column]`.
    pub cells: Vec<Vec<Option<BlockColor>>>,
    pub active: [Position; 4],
    pub active_shape: ShapeKind,
    pub active_color: BlockColor,
    pub score: ScoreState,
    pub status: GameStatus,
}

type ScoreListener = Box<dyn FnMut(ScoreState)>;

// ============================================================================
// Game
// ============================================================================

pub struct Game<S> {
    settings: Settings,
    field: Field,
    tetromino: Tetromino,
    shapes: S,
    gravity: Timer,
    horizontal_move: Timer,
    rotation: Timer,
    /// Normal gravity interval for the current level.
    down_speed: Duration,
    soft_drop_held: bool,
    score: ScoreState,
    status: GameStatus,
    events: Vec<GameEvent>,
    score_listener: Option<ScoreListener>,
}

impl<S: ShapeSource> Game<S> {
    pub fn new(settings: Settings, mut shapes: S) -> Result<Self, EngineError> {
        settings.validate()?;
        let field = Field::new(&settings);
        let tetromino = Tetromino::new(shapes.next_shape(), &settings);
        Ok(Self::assemble(settings, shapes, field, tetromino))
    }

    /// Starts from a prepared field and piece, e.g. to script a position.
    pub fn with_field(
        settings: Settings,
        shapes: S,
        field: Field,
        tetromino: Tetromino,
    ) -> Result<Self, EngineError> {
        settings.validate()?;
        if field.columns() != settings.columns || field.rows() != settings.rows {
            return Err(EngineError::Configuration(format!(
                "field is {}x{} but settings expect {}x{}",
                field.columns(),
                field.rows(),
                settings.columns,
                settings.rows
            )));
        }
        field.validate()?;
        Ok(Self::assemble(settings, shapes, field, tetromino))
    }

    fn assemble(settings: Settings, shapes: S, field: Field, tetromino: Tetromino) -> Self {
        let mut gravity = Timer::repeating(settings.gravity_interval);
        gravity.activate();
        Self {
            horizontal_move: Timer::one_shot(settings.move_cooldown),
            rotation: Timer::one_shot(settings.rotate_cooldown),
            down_speed: settings.gravity_interval,
            gravity,
            soft_drop_held: false,
            score: ScoreState::default(),
            status: GameStatus::Playing,
            events: Vec::new(),
            score_listener: None,
            settings,
            field,
            tetromino,
            shapes,
        }
    }

    /// Registers the callback run once per score change.
    pub fn on_score_changed(&mut self, listener: impl FnMut(ScoreState) + 'static) {
        self.score_listener = Some(Box::new(listener));
    }

    /// Advances the game by one frame. Does nothing once the game is over.
    pub fn update(&mut self, intents: Intents, dt: Duration) -> Result<(), EngineError> {
        if self.is_game_over() {
            return Ok(());
        }

        self.apply_intents(intents);

        self.horizontal_move.update(dt);
        self.rotation.update(dt);
        if self.gravity.update(dt) {
            self.move_down()?;
        }
        Ok(())
    }

    fn apply_intents(&mut self, intents: Intents) {
        if !self.horizontal_move.is_active() {
            if intents.move_left {
                self.move_horizontal(-1);
                self.horizontal_move.activate();
            }
            if intents.move_right {
                self.move_horizontal(1);
                self.horizontal_move.activate();
            }
        }

        if !self.rotation.is_active() && intents.rotate {
            self.rotate();
            self.rotation.activate();
        }

        if intents.soft_drop != self.soft_drop_held {
            self.soft_drop_held = intents.soft_drop;
            self.sync_gravity();
        }
    }

    fn sync_gravity(&mut self) {
        let interval = if self.soft_drop_held {
            self.settings.fast_interval(self.down_speed)
        } else {
            self.down_speed
        };
        self.gravity.set_duration(interval);
    }

    pub fn move_horizontal(&mut self, delta: i32) -> bool {
        if self.is_game_over() {
            return false;
        }
        let moved = self.tetromino.move_horizontal(delta, &self.field);
        if moved {
            self.events.push(GameEvent::PieceMoved);
        }
        moved
    }

    pub fn rotate(&mut self) -> bool {
        if self.is_game_over() {
            return false;
        }
        let rotated = self.tetromino.rotate(&self.field);
        if rotated {
            self.events.push(GameEvent::PieceRotated);
        }
        rotated
    }

    /// One gravity step: drop the piece, or lock it, clear rows and spawn the next.
    pub fn move_down(&mut self) -> Result<(), EngineError> {
        if self.is_game_over() {
            return Ok(());
        }
        match self.tetromino.move_down(&mut self.field) {
            MoveOutcome::Moved => Ok(()),
            MoveOutcome::Locked { overflow } => self.on_lock(overflow),
        }
    }

    fn on_lock(&mut self, overflow: bool) -> Result<(), EngineError> {
        self.events.push(GameEvent::PieceLocked);

        if overflow {
            self.status = GameStatus::GameOver;
            self.gravity.deactivate();
            self.events.push(GameEvent::GameOver);
            return Ok(());
        }

        let full_rows = self.field.full_rows();
        if !full_rows.is_empty() {
            self.field.clear_and_collapse(&full_rows)?;
            self.add_score(full_rows.len());
        }

        self.spawn_next();
        Ok(())
    }

    fn add_score(&mut self, cleared: usize) {
        let table = &self.settings.score_table;
        let points = table[cleared.min(table.len() - 1)];
        let cleared = cleared as u32;

        self.score.lines += cleared;
        self.score.score += points * self.score.level;
        self.events.push(GameEvent::LinesCleared(cleared));

        if self.score.lines / self.settings.lines_per_level >= self.score.level {
            self.score.level += 1;
            self.down_speed = self.down_speed.mul_f64(self.settings.level_up_deceleration);
            self.sync_gravity();
            self.events.push(GameEvent::LevelUp(self.score.level));
        }

        if let Some(listener) = self.score_listener.as_mut() {
            listener(self.score);
        }
    }

    fn spawn_next(&mut self) {
        let shape = self.shapes.next_shape();
        self.tetromino = Tetromino::new(shape, &self.settings);
        self.events.push(GameEvent::PieceSpawned(shape));
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn tetromino(&self) -> &Tetromino {
        &self.tetromino
    }

    pub fn shapes(&self) -> &S {
        &self.shapes
    }

    pub fn score(&self) -> ScoreState {
        self.score
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_game_over(&self) -> bool {
        self.status == GameStatus::GameOver
    }

    pub fn gravity_interval(&self) -> Duration {
        self.gravity.duration()
    }

    /// Takes and clears all pending events
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Field colors with the active piece drawn on top
    pub fn render_grid(&self) -> Vec<Vec<Option<BlockColor>>> {
        let mut grid = self.field_colors();
        for pos in self.tetromino.positions() {
            if self.field.contains(pos.x, pos.y) {
                grid[pos.y as usize][pos.x as usize] = Some(self.tetromino.color());
            }
        }
        grid
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            cells: self.field_colors(),
            active: self.tetromino.positions(),
            active_shape: self.tetromino.shape(),
            active_color: self.tetromino.color(),
            score: self.score,
            status: self.status,
        }
    }

    fn field_colors(&self) -> Vec<Vec<Option<BlockColor>>> {
        self.field
            .cells()
            .iter()
            .map(|row| row.iter().map(|cell| cell.block().map(|b| b.color)).collect())
            .collect()
    }
}

impl<S> fmt::Debug for Game<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Game")
            .field("tetromino", &self.tetromino)
            .field("score", &self.score)
            .field("status", &self.status)
            .field("gravity", &self.gravity)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Test Helpers
// ============================================================================

pub mod test_helpers {
    use super::*;
    use crate::block::Block;
    use crate::field::Cell;

    pub fn empty_field() -> Field {
        Field::new(&Settings::default())
    }

    pub fn fill_row(field: &mut Field, y: i32) {
        for x in 0..field.columns() {
            field.settle(Block::new(Position::new(x, y), BlockColor::Purple));
        }
    }

    pub fn fill_row_with_gap(field: &mut Field, y: i32, gap_x: i32) {
        for x in 0..field.columns() {
            if x != gap_x {
                field.settle(Block::new(Position::new(x, y), BlockColor::Purple));
            }
        }
    }

    pub fn occupied(field: &Field, x: i32, y: i32) -> bool {
        matches!(field.get(x, y), Some(Cell::Occupied(_)))
    }
}
