use crate::block::{Block, Position};
use crate::field::Field;
use crate::settings::Settings;
use crate::shape::{BlockColor, ShapeKind};

/// Result of a downward step.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveOutcome {
    Moved,
    /// The piece could not move and was written into the field.
    /// `overflow` is set when any of its blocks was still above row 0.
    Locked { overflow: bool },
}

/// The falling piece: four blocks moved as one rigid unit.
#[derive(Clone, Debug, PartialEq)]
pub struct Tetromino {
    shape: ShapeKind,
    blocks: [Block; 4],
}

impl Tetromino {
    /// Spawns `shape` at the configured spawn offset.
    pub fn new(shape: ShapeKind, settings: &Settings) -> Self {
        let (x, y) = settings.spawn_offset;
        Self::new_at(shape, x, y)
    }

    /// Spawns `shape` with its catalog offsets added to `(x, y)`.
    pub fn new_at(shape: ShapeKind, x: i32, y: i32) -> Self {
        let origin = Position::new(x, y);
        let color = shape.color();
        let blocks = shape
            .offsets()
            .map(|(dx, dy)| Block::new(origin + Position::new(dx, dy), color));
        Self { shape, blocks }
    }

    pub fn shape(&self) -> ShapeKind {
        self.shape
    }

    pub fn color(&self) -> BlockColor {
        self.shape.color()
    }

    pub fn blocks(&self) -> &[Block; 4] {
        &self.blocks
    }

    pub fn positions(&self) -> [Position; 4] {
        self.blocks.map(|block| block.pos)
    }

    /// Shifts the piece one column left (`-1`) or right (`+1`).
    ///
    /// Nothing moves unless every block can.
    pub fn move_horizontal(&mut self, delta: i32, field: &Field) -> bool {
        let blocked = self
            .blocks
            .iter()
            .any(|block| block.horizontal_collide(block.pos.x + delta, field));
        if blocked {
            return false;
        }
        for block in &mut self.blocks {
            block.pos.x += delta;
        }
        true
    }

    /// Drops the piece one row, or locks it into `field` when it cannot drop.
    pub fn move_down(&mut self, field: &mut Field) -> MoveOutcome {
        let blocked = self
            .blocks
            .iter()
            .any(|block| block.vertical_collide(block.pos.y + 1, field));
        if !blocked {
            for block in &mut self.blocks {
                block.pos.y += 1;
            }
            return MoveOutcome::Moved;
        }

        let overflow = self.blocks.iter().any(|block| block.pos.y < 0);
        for block in self.blocks {
            field.settle(block);
        }
        MoveOutcome::Locked { overflow }
    }

    /// Quarter turn around the first block. The O piece never rotates.
    ///
    /// All four target cells are checked before any block moves. The floor
    /// check admits row `field.rows()` itself.
    pub fn rotate(&mut self, field: &Field) -> bool {
        if self.shape == ShapeKind::O {
            return false;
        }

        let pivot = self.blocks[0].pos;
        let candidates = self.blocks.map(|block| block.rotate_around(pivot));

        let fits = candidates.iter().all(|pos| {
            (0..field.columns()).contains(&pos.x)
                && !field.is_occupied(pos.x, pos.y)
                && pos.y >= 0
                && pos.y <= field.rows()
        });
        if !fits {
            return false;
        }

        for (block, pos) in self.blocks.iter_mut().zip(candidates) {
            block.pos = pos;
        }
        true
    }
}
