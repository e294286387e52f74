use std::fmt;

use rand::{Rng, SeedableRng, rngs::StdRng, seq::index};
use serde::{Deserialize, Serialize};

use crate::{
    Cell, GenError, NUM_COLORS, map::Grid,
    sampler::{self, SampledPositions},
};

/// Generation parameters for a single level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelConfig {
    /// Width and height of the square board.
    pub map_size: usize,
    /// Number of steps on the goal path, orphan key included.
    pub goal_length: usize,
    /// Number of decoy chains rooted on the goal path.
    pub num_distractor: usize,
    /// Key/lock pairs per decoy chain.
    pub distractor_length: usize,
}

impl Default for LevelConfig {
    fn default() -> Self {
        LevelConfig {
            map_size: 10,
            goal_length: 3,
            num_distractor: 2,
            distractor_length: 2,
        }
    }
}

impl LevelConfig {
    /// Checks the preconditions the sampler and the color draws rely on.
    fn validate(&self) -> Result<(), GenError> {
        if self.map_size < 3 {
            return Err(GenError::MapTooSmall(self.map_size));
        }
        if self.goal_length < 2 {
            return Err(GenError::GoalTooShort(self.goal_length));
        }
        if self.num_distractor > 0 && self.distractor_length == 0 {
            return Err(GenError::EmptyDistractorChain);
        }
        let goal_pairs = self.goal_length - 1;
        if goal_pairs > NUM_COLORS as usize {
            return Err(GenError::NotEnoughColors {
                requested: goal_pairs,
                available: NUM_COLORS as usize,
            });
        }
        let remaining = NUM_COLORS as usize - goal_pairs;
        if self.num_distractor > 0 && self.distractor_length > remaining {
            return Err(GenError::NotEnoughColors {
                requested: self.distractor_length,
                available: remaining,
            });
        }
        Ok(())
    }
}

/// Errors raised while parsing a serialized level record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("record has {0} tokens; expected at least rows, cols and one cell")]
    TooShort(usize),
    #[error("token '{0}' is not a two-digit value")]
    BadToken(String),
    #[error("cell code {0} is outside the element range")]
    UnknownCode(u8),
    #[error("{rows}x{cols} header does not match {cells} cell tokens")]
    DimensionMismatch {
        rows: usize,
        cols: usize,
        cells: usize,
    },
}

/// Everything a level is made of before painting: the goal-path colors,
/// each decoy chain's private palette, the goal-path step each decoy is
/// rooted at, and the sampled board positions.
#[derive(Debug, Clone)]
struct LevelPlan {
    goal_colors: Vec<u8>,
    distractor_colors: Vec<Vec<u8>>,
    roots: Vec<usize>,
    positions: SampledPositions,
}

/// A generated Box-World board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    grid: Grid<Cell>,
}

impl Level {
    /// Generates the level for `seed`. Identical configuration and seed
    /// always produce the identical level, which is what makes the
    /// train/test split by seed range reproducible.
    pub fn generate(config: &LevelConfig, seed: u64) -> Result<Level, GenError> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(seed);
        let plan = plan(config, &mut rng)?;
        Ok(Level {
            grid: paint(config, &plan),
        })
    }

    pub fn grid(&self) -> &Grid<Cell> {
        &self.grid
    }

    /// Serializes the level as `rows|cols|cell|cell|...`, every value
    /// zero-padded to two digits, cells in row-major order.
    ///
    /// The two-digit tokens cap representable values at 99; board
    /// dimensions must respect that, the format carries no bound check.
    pub fn to_record(&self) -> String {
        let grid = &self.grid;
        let mut tokens = Vec::with_capacity(2 + grid.width() * grid.height());
        tokens.push(grid.height());
        tokens.push(grid.width());
        tokens.extend(grid.iter().map(|cell| cell.code() as usize));
        tokens
            .iter()
            .map(|value| format!("{value:02}"))
            .collect::<Vec<_>>()
            .join("|")
    }

    /// Parses a record produced by [`Level::to_record`] back into a level.
    pub fn from_record(record: &str) -> Result<Level, RecordError> {
        let tokens: Vec<&str> = record.trim().split('|').collect();
        if tokens.len() < 3 {
            return Err(RecordError::TooShort(tokens.len()));
        }
        let mut values = Vec::with_capacity(tokens.len());
        for token in tokens {
            if token.len() != 2 || !token.bytes().all(|b| b.is_ascii_digit()) {
                return Err(RecordError::BadToken(token.to_string()));
            }
            let value: u8 = token
                .parse()
                .map_err(|_| RecordError::BadToken(token.to_string()))?;
            values.push(value);
        }
        let rows = values[0] as usize;
        let cols = values[1] as usize;
        let cell_codes = &values[2..];
        if rows * cols != cell_codes.len() {
            return Err(RecordError::DimensionMismatch {
                rows,
                cols,
                cells: cell_codes.len(),
            });
        }
        let mut cells = Vec::with_capacity(cell_codes.len());
        for &code in cell_codes {
            cells.push(Cell::from_code(code).ok_or(RecordError::UnknownCode(code))?);
        }
        Ok(Level {
            grid: Grid::from_generator(cols, rows, |x, y| cells[y * cols + x]),
        })
    }
}

/// Renders the board with one character per cell, rows top to bottom.
impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.grid.rows() {
            for cell in row {
                write!(f, "{}", cell.glyph())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Draws the colors, decoy roots and board positions for one level.
fn plan(config: &LevelConfig, rng: &mut impl Rng) -> Result<LevelPlan, GenError> {
    let goal_pairs = config.goal_length - 1;
    let goal_colors: Vec<u8> = index::sample(rng, NUM_COLORS as usize, goal_pairs)
        .into_iter()
        .map(|color| color as u8)
        .collect();

    // Decoy chains draw from the colors the goal path left unused, so no
    // decoy key can ever be mistaken for progress on the goal path.
    let palette: Vec<u8> = (0..NUM_COLORS)
        .filter(|color| !goal_colors.contains(color))
        .collect();
    let distractor_colors: Vec<Vec<u8>> = (0..config.num_distractor)
        .map(|_| {
            index::sample(rng, palette.len(), config.distractor_length)
                .into_iter()
                .map(|slot| palette[slot])
                .collect()
        })
        .collect();
    let roots: Vec<usize> = (0..config.num_distractor)
        .map(|_| rng.random_range(0..goal_pairs))
        .collect();

    let positions = sampler::sample_positions(
        goal_pairs + config.distractor_length * config.num_distractor,
        config.map_size,
        rng,
    )?;

    Ok(LevelPlan {
        goal_colors,
        distractor_colors,
        roots,
        positions,
    })
}

/// Paints a plan onto an empty board.
fn paint(config: &LevelConfig, plan: &LevelPlan) -> Grid<Cell> {
    let n = config.map_size;
    let mut grid = Grid::new(n, n);
    let goal_pairs = config.goal_length - 1;

    // Goal path: each lock wants the color collected one step earlier;
    // the final key is the goal itself.
    for i in 1..config.goal_length {
        grid[plan.positions.keys[i - 1]] = if i == config.goal_length - 1 {
            Cell::Goal
        } else {
            Cell::Color(plan.goal_colors[i])
        };
        grid[plan.positions.locks[i - 1]] = Cell::Color(plan.goal_colors[i - 1]);
    }
    // The orphan key starts the chain without a lock of its own.
    grid[plan.positions.first_key] = Cell::Color(plan.goal_colors[0]);

    for (chain, (colors, &root)) in plan
        .distractor_colors
        .iter()
        .zip(&plan.roots)
        .enumerate()
    {
        let base = goal_pairs + chain * config.distractor_length;
        // The first decoy lock is opened by a color from the goal path,
        // which is what makes the decoy look like a plausible detour.
        grid[plan.positions.locks[base]] = Cell::Color(plan.goal_colors[root]);
        grid[plan.positions.keys[base]] = Cell::Color(colors[0]);
        for j in 1..config.distractor_length {
            grid[plan.positions.locks[base + j]] = Cell::Color(colors[j - 1]);
            grid[plan.positions.keys[base + j]] = Cell::Color(colors[j]);
        }
    }

    grid[plan.positions.agent] = Cell::Agent;
    grid
}
