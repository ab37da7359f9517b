use std::collections::VecDeque;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::EngineError;

// ============================================================================
// Catalog
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum ShapeKind {
    T,
    O,
    J,
    L,
    I,
    S,
    Z,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum BlockColor {
    Purple,
    Yellow,
    Blue,
    Orange,
    Cyan,
    Green,
    Red,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 7] = [
        ShapeKind::T,
        ShapeKind::O,
        ShapeKind::J,
        ShapeKind::L,
        ShapeKind::I,
        ShapeKind::S,
        ShapeKind::Z,
    ];

    /// Cell offsets relative to the spawn offset.
    ///
    /// The first entry is the rotation pivot, so the order matters.
    pub fn offsets(self) -> [(i32, i32); 4] {
        match self {
            ShapeKind::T => [(0, 0), (-1, 0), (1, 0), (0, -1)],
            ShapeKind::O => [(0, 0), (0, -1), (1, 0), (1, -1)],
            ShapeKind::J => [(0, 0), (0, -1), (0, 1), (-1, 1)],
            ShapeKind::L => [(0, 0), (0, -1), (0, 1), (1, 1)],
            ShapeKind::I => [(0, 0), (0, -1), (0, -2), (0, 1)],
            ShapeKind::S => [(0, 0), (-1, 0), (0, -1), (1, -1)],
            ShapeKind::Z => [(0, 0), (1, 0), (0, -1), (-1, -1)],
        }
    }

    pub fn color(self) -> BlockColor {
        match self {
            ShapeKind::T => BlockColor::Purple,
            ShapeKind::O => BlockColor::Yellow,
            ShapeKind::J => BlockColor::Blue,
            ShapeKind::L => BlockColor::Orange,
            ShapeKind::I => BlockColor::Cyan,
            ShapeKind::S => BlockColor::Green,
            ShapeKind::Z => BlockColor::Red,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            ShapeKind::T => 'T',
            ShapeKind::O => 'O',
            ShapeKind::J => 'J',
            ShapeKind::L => 'L',
            ShapeKind::I => 'I',
            ShapeKind::S => 'S',
            ShapeKind::Z => 'Z',
        }
    }
}

impl TryFrom<char> for ShapeKind {
    type Error = EngineError;

    fn try_from(symbol: char) -> Result<Self, Self::Error> {
        ShapeKind::ALL
            .into_iter()
            .find(|kind| kind.symbol() == symbol)
            .ok_or(EngineError::UnknownShape(symbol))
    }
}

impl FromStr for ShapeKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(symbol), None) => ShapeKind::try_from(symbol),
            (Some(symbol), Some(_)) => Err(EngineError::UnknownShape(symbol)),
            (None, _) => Err(EngineError::UnknownShape('\0')),
        }
    }
}

// ============================================================================
// Shape Sources
// ============================================================================

/// Supplies the shape of every piece the engine spawns.
pub trait ShapeSource {
    fn next_shape(&mut self) -> ShapeKind;
}

/// Uniform choice over the seven shapes.
pub struct RandomShapeSource {
    rng: StdRng,
}

impl RandomShapeSource {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomShapeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ShapeSource for RandomShapeSource {
    fn next_shape(&mut self) -> ShapeKind {
        ShapeKind::ALL[self.rng.gen_range(0..ShapeKind::ALL.len())]
    }
}

/// Cycles through a fixed list of shapes.
pub struct SequenceShapeSource {
    shapes: Vec<ShapeKind>,
    index: usize,
}

impl SequenceShapeSource {
    pub fn new(shapes: Vec<ShapeKind>) -> Result<Self, EngineError> {
        if shapes.is_empty() {
            return Err(EngineError::Configuration(
                "shape sequence must not be empty".to_string(),
            ));
        }
        Ok(Self { shapes, index: 0 })
    }

    /// Parses a symbol string such as `"IOTSZJL"`. Whitespace is ignored.
    pub fn from_symbols(symbols: &str) -> Result<Self, EngineError> {
        let shapes = symbols
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(ShapeKind::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(shapes)
    }
}

impl ShapeSource for SequenceShapeSource {
    fn next_shape(&mut self) -> ShapeKind {
        let shape = self.shapes[self.index % self.shapes.len()];
        self.index += 1;
        shape
    }
}

/// Keeps the next few shapes of an inner source visible for a preview panel.
pub struct PreviewQueue<S> {
    inner: S,
    queue: VecDeque<ShapeKind>,
}

impl<S: ShapeSource> PreviewQueue<S> {
    pub fn new(mut inner: S, len: usize) -> Self {
        let queue = (0..len).map(|_| inner.next_shape()).collect();
        Self { inner, queue }
    }

    pub fn upcoming(&self) -> impl Iterator<Item = ShapeKind> + '_ {
        self.queue.iter().copied()
    }
}

impl<S: ShapeSource> ShapeSource for PreviewQueue<S> {
    fn next_shape(&mut self) -> ShapeKind {
        let fresh = self.inner.next_shape();
        if self.queue.is_empty() {
            return fresh;
        }
        self.queue.push_back(fresh);
        self.queue.pop_front().unwrap_or(fresh)
    }
}
