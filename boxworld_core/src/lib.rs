use serde::{Deserialize, Serialize};

pub mod level;
pub mod map;
pub mod sampler;

/// Number of ordinary key/lock colors the generator can draw from.
pub const NUM_COLORS: u8 = 12;

// Wire codes for the special cells. Colors serialize as their own index,
// so these must sit directly above the color range.
const GOAL_CODE: u8 = NUM_COLORS;
const AGENT_CODE: u8 = NUM_COLORS + 1;
const EMPTY_CODE: u8 = NUM_COLORS + 2;

/// Represents a 2D coordinate. `x` is the column, `y` is the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

/// A single cell of a Box-World board.
///
/// A `Color` cell is either a key lying on the ground or, when it sits
/// directly right of another colored cell, the lock that key color opens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    Color(u8),
    Goal,
    Agent,
    #[default]
    Empty,
}

/// Errors raised while generating a level.
///
/// Each variant is a violated precondition: generation never retries or
/// substitutes a different level, the offending seed simply fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenError {
    #[error("map size {0} is too small; the sampler needs at least a 3x3 board")]
    MapTooSmall(usize),
    #[error("goal length {0} must be at least 2 (orphan key plus one lock)")]
    GoalTooShort(usize),
    #[error("distractor chains must contain at least one key/lock pair")]
    EmptyDistractorChain,
    #[error("not enough colors: {requested} distinct colors requested, {available} available")]
    NotEnoughColors { requested: usize, available: usize },
    #[error("position pool exhausted while placing {requested} pairs on a {n}x{n} board")]
    PositionsExhausted { requested: usize, n: usize },
}

impl Cell {
    /// The numeric code this cell serializes to.
    pub fn code(self) -> u8 {
        match self {
            Cell::Color(c) => c,
            Cell::Goal => GOAL_CODE,
            Cell::Agent => AGENT_CODE,
            Cell::Empty => EMPTY_CODE,
        }
    }

    /// Decodes a numeric cell code. Returns `None` for codes outside the
    /// element range.
    pub fn from_code(code: u8) -> Option<Cell> {
        match code {
            c if c < NUM_COLORS => Some(Cell::Color(c)),
            GOAL_CODE => Some(Cell::Goal),
            AGENT_CODE => Some(Cell::Agent),
            EMPTY_CODE => Some(Cell::Empty),
            _ => None,
        }
    }

    /// Single-character rendering of the cell: colors are `a`..`l`, the
    /// goal is `!`, the agent is `@`, empty cells are blank.
    pub fn glyph(self) -> char {
        match self {
            Cell::Color(c) => (b'a' + c) as char,
            Cell::Goal => '!',
            Cell::Agent => '@',
            Cell::Empty => ' ',
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_codes_round_trip() {
        for code in 0..=EMPTY_CODE {
            let cell = Cell::from_code(code).unwrap();
            assert_eq!(cell.code(), code);
        }
        assert_eq!(Cell::from_code(EMPTY_CODE + 1), None);
    }

    #[test]
    fn special_cells_sit_above_the_color_range() {
        assert_eq!(Cell::Goal.code(), 12);
        assert_eq!(Cell::Agent.code(), 13);
        assert_eq!(Cell::Empty.code(), 14);
    }

    #[test]
    fn glyphs_cover_the_palette() {
        assert_eq!(Cell::Color(0).glyph(), 'a');
        assert_eq!(Cell::Color(11).glyph(), 'l');
        assert_eq!(Cell::Goal.glyph(), '!');
        assert_eq!(Cell::Agent.glyph(), '@');
        assert_eq!(Cell::Empty.glyph(), ' ');
    }
}
