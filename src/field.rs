use crate::block::{Block, Position};
use crate::error::EngineError;
use crate::settings::Settings;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Cell {
    #[default]
    Empty,
    Occupied(Block),
}

impl Cell {
    pub fn is_occupied(&self) -> bool {
        matches!(self, Cell::Occupied(_))
    }

    pub fn block(&self) -> Option<&Block> {
        match self {
            Cell::Occupied(block) => Some(block),
            Cell::Empty => None,
        }
    }
}

/// Fixed-size grid of settled blocks, indexed `[row][column]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    columns: i32,
    rows: i32,
    cells: Vec<Vec<Cell>>,
}

impl Field {
    pub fn new(settings: &Settings) -> Self {
        Self::with_size(settings.columns, settings.rows)
    }

    pub fn with_size(columns: i32, rows: i32) -> Self {
        Self {
            columns,
            rows,
            cells: Self::empty_cells(columns, rows),
        }
    }

    fn empty_cells(columns: i32, rows: i32) -> Vec<Vec<Cell>> {
        vec![vec![Cell::Empty; columns.max(0) as usize]; rows.max(0) as usize]
    }

    pub fn columns(&self) -> i32 {
        self.columns
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        (0..self.columns).contains(&x) && (0..self.rows).contains(&y)
    }

    pub fn get(&self, x: i32, y: i32) -> Option<&Cell> {
        if !self.contains(x, y) {
            return None;
        }
        Some(&self.cells[y as usize][x as usize])
    }

    /// Cells outside the grid are never occupied.
    pub fn is_occupied(&self, x: i32, y: i32) -> bool {
        self.get(x, y).is_some_and(Cell::is_occupied)
    }

    /// Writes a block into the cell matching its own position.
    ///
    /// Returns `false` and drops the block when that position is outside the grid.
    pub fn settle(&mut self, block: Block) -> bool {
        let Position { x, y } = block.pos;
        if !self.contains(x, y) {
            return false;
        }
        self.cells[y as usize][x as usize] = Cell::Occupied(block);
        true
    }

    pub fn is_row_full(&self, row: i32) -> bool {
        if !(0..self.rows).contains(&row) {
            return false;
        }
        self.cells[row as usize].iter().all(Cell::is_occupied)
    }

    /// Indexes of all full rows, top to bottom.
    pub fn full_rows(&self) -> Vec<i32> {
        (0..self.rows).filter(|&row| self.is_row_full(row)).collect()
    }

    /// Removes the given rows and drops everything above each of them by one.
    ///
    /// `rows` must be ascending, as returned by [`Field::full_rows`].
    pub fn clear_and_collapse(&mut self, rows: &[i32]) -> Result<(), EngineError> {
        let mut survivors: Vec<Block> = self.blocks().copied().collect();

        for &row in rows {
            survivors.retain(|block| block.pos.y != row);
            for block in survivors.iter_mut().filter(|block| block.pos.y < row) {
                block.pos.y += 1;
            }
        }

        self.rebuild(survivors)
    }

    /// Replaces the grid with one built from the blocks' own positions.
    fn rebuild(&mut self, blocks: Vec<Block>) -> Result<(), EngineError> {
        let mut cells = Self::empty_cells(self.columns, self.rows);
        for block in blocks {
            let Position { x, y } = block.pos;
            if !self.contains(x, y) || cells[y as usize][x as usize].is_occupied() {
                return Err(EngineError::InvariantViolation { row: y, col: x });
            }
            cells[y as usize][x as usize] = Cell::Occupied(block);
        }
        self.cells = cells;
        Ok(())
    }

    /// Checks that every settled block sits at the cell matching its position.
    pub fn validate(&self) -> Result<(), EngineError> {
        for (row, line) in self.cells.iter().enumerate() {
            for (col, cell) in line.iter().enumerate() {
                if let Cell::Occupied(block) = cell {
                    if block.pos != Position::new(col as i32, row as i32) {
                        return Err(EngineError::InvariantViolation {
                            row: row as i32,
                            col: col as i32,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> + '_ {
        self.cells.iter().flatten().filter_map(Cell::block)
    }

    pub fn occupied_count(&self) -> usize {
        self.blocks().count()
    }

    pub fn cells(&self) -> &[Vec<Cell>] {
        &self.cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::BlockColor;

    #[test]
    fn out_of_range_reads_are_empty() {
        let field = Field::with_size(10, 20);
        assert!(!field.is_occupied(-1, 0));
        assert!(!field.is_occupied(0, -1));
        assert!(!field.is_occupied(10, 0));
        assert!(!field.is_occupied(0, 20));
    }

    #[test]
    fn settle_outside_grid_is_dropped() {
        let mut field = Field::with_size(10, 20);
        assert!(!field.settle(Block::new(Position::new(3, 20), BlockColor::Cyan)));
        assert!(!field.settle(Block::new(Position::new(3, -1), BlockColor::Cyan)));
        assert_eq!(field.occupied_count(), 0);
    }

    #[test]
    fn validate_flags_misplaced_block() {
        let mut field = Field::with_size(10, 20);
        field.cells[4][2] = Cell::Occupied(Block::new(Position::new(2, 5), BlockColor::Red));
        assert_eq!(
            field.validate(),
            Err(EngineError::InvariantViolation { row: 4, col: 2 })
        );
    }
}
