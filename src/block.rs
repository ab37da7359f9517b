use std::ops::{Add, Sub};

use crate::field::Field;
use crate::shape::BlockColor;

/// Grid coordinate: `x` is the column, `y` the row (row 0 at the top).
///
/// `y` goes negative while a piece is still above the visible field.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Quarter turn with screen axes (y down): `(x, y) -> (-y, x)`.
    pub fn rotated_quarter(self) -> Self {
        Self::new(-self.y, self.x)
    }
}

impl Add for Position {
    type Output = Position;

    fn add(self, rhs: Position) -> Position {
        Position::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Position {
    type Output = Position;

    fn sub(self, rhs: Position) -> Position {
        Position::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// One occupied cell, either part of the falling piece or settled in the field.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Block {
    pub pos: Position,
    pub color: BlockColor,
}

impl Block {
    pub fn new(pos: Position, color: BlockColor) -> Self {
        Self { pos, color }
    }

    /// Would this block collide if it moved to column `x` on its current row?
    pub fn horizontal_collide(&self, x: i32, field: &Field) -> bool {
        if x < 0 || x >= field.columns() {
            return true;
        }
        field.is_occupied(x, self.pos.y)
    }

    /// Would this block collide if it moved to row `y` in its current column?
    ///
    /// Rows above the field never collide so pieces can fall in from above.
    pub fn vertical_collide(&self, y: i32, field: &Field) -> bool {
        if y >= field.rows() {
            return true;
        }
        y >= 0 && field.is_occupied(self.pos.x, y)
    }

    /// Position after a quarter turn around `pivot`. Does not move the block.
    pub fn rotate_around(&self, pivot: Position) -> Position {
        pivot + (self.pos - pivot).rotated_quarter()
    }

    /// Top-left pixel of this block for a given cell size.
    pub fn pixel_origin(&self, cell_size: u32) -> (i64, i64) {
        let cell = i64::from(cell_size);
        (i64::from(self.pos.x) * cell, i64::from(self.pos.y) * cell)
    }
}
