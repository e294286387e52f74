use rand::Rng;

use crate::{GenError, Position};

/// Everything the composer needs to place on the board: one key/lock pair
/// per chain step, the orphan first key, and the agent start cell.
///
/// `keys[i]` pairs with `locks[i]`; a lock always sits one column right of
/// its key, in the same row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampledPositions {
    pub keys: Vec<Position>,
    pub locks: Vec<Position>,
    pub first_key: Position,
    pub agent: Position,
}

/// Draws `num_pairs` non-overlapping key/lock pairs on an `n` x `n` board,
/// followed by the agent start position and the orphan first key.
///
/// Keys are drawn from a pool of flattened indices over the first `n - 1`
/// columns, so every key's lock cell (one column right) stays on the board.
/// After each draw, up to two pool cells on either side of the key in the
/// same row are discarded as well, which keeps chains from packing into
/// visually confusable runs. The widths (2 right clipped at the last pool
/// column, 2 left clipped at column 0) are the exact policy the existing
/// corpora were generated with.
///
/// Fails with [`GenError::PositionsExhausted`] when the pool runs dry
/// before every draw is served; callers must size `num_pairs` against `n`.
pub fn sample_positions(
    num_pairs: usize,
    n: usize,
    rng: &mut impl Rng,
) -> Result<SampledPositions, GenError> {
    debug_assert!(n >= 3, "board too small for neighborhood removal");
    let width = n - 1;
    let mut pool: Vec<usize> = (0..n * width).collect();
    let exhausted = GenError::PositionsExhausted {
        requested: num_pairs,
        n,
    };

    let mut keys = Vec::with_capacity(num_pairs);
    let mut locks = Vec::with_capacity(num_pairs);
    for _ in 0..num_pairs {
        let idx = draw(&mut pool, rng).ok_or_else(|| exhausted.clone())?;
        let (x, y) = (idx % width, idx / width);
        for i in 1..=(width - 1 - x).min(2) {
            discard(&mut pool, idx + i);
        }
        for i in 1..=x.min(2) {
            discard(&mut pool, idx - i);
        }
        keys.push(Position { x, y });
        locks.push(Position { x: x + 1, y });
    }

    let agent = draw(&mut pool, rng).ok_or_else(|| exhausted.clone())?;
    let first_key = draw(&mut pool, rng).ok_or(exhausted)?;

    Ok(SampledPositions {
        keys,
        locks,
        first_key: decode(first_key, width),
        agent: decode(agent, width),
    })
}

/// Removes and returns a uniformly drawn index from the pool.
fn draw(pool: &mut Vec<usize>, rng: &mut impl Rng) -> Option<usize> {
    if pool.is_empty() {
        return None;
    }
    let slot = rng.random_range(0..pool.len());
    Some(pool.remove(slot))
}

/// Removes `value` from the pool if it is still available. The pool stays
/// sorted, so membership is a binary search.
fn discard(pool: &mut Vec<usize>, value: usize) {
    if let Ok(slot) = pool.binary_search(&value) {
        pool.remove(slot);
    }
}

#[inline]
fn decode(idx: usize, width: usize) -> Position {
    Position {
        x: idx % width,
        y: idx / width,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};
    use std::collections::HashSet;

    #[test]
    fn identical_seeds_draw_identical_positions() {
        let a = sample_positions(6, 10, &mut StdRng::seed_from_u64(17)).unwrap();
        let b = sample_positions(6, 10, &mut StdRng::seed_from_u64(17)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn locks_sit_one_column_right_of_their_keys() {
        let sampled = sample_positions(8, 12, &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(sampled.keys.len(), 8);
        assert_eq!(sampled.locks.len(), 8);
        for (key, lock) in sampled.keys.iter().zip(&sampled.locks) {
            assert_eq!(lock.y, key.y);
            assert_eq!(lock.x, key.x + 1);
            assert!(lock.x < 12);
        }
    }

    #[test]
    fn no_two_elements_share_a_cell() {
        for seed in 0..50 {
            let sampled = sample_positions(7, 10, &mut StdRng::seed_from_u64(seed)).unwrap();
            let mut occupied = HashSet::new();
            for pos in sampled
                .keys
                .iter()
                .chain(&sampled.locks)
                .chain([&sampled.first_key, &sampled.agent])
            {
                assert!(occupied.insert(*pos), "seed {seed}: {pos:?} drawn twice");
            }
        }
    }

    #[test]
    fn same_row_neighbors_of_a_key_are_never_drawn_as_keys() {
        for seed in 0..50 {
            let sampled = sample_positions(7, 10, &mut StdRng::seed_from_u64(seed)).unwrap();
            for (i, a) in sampled.keys.iter().enumerate() {
                for b in &sampled.keys[i + 1..] {
                    if a.y == b.y {
                        assert!(a.x.abs_diff(b.x) > 2, "seed {seed}: {a:?} and {b:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn exhausting_the_pool_is_an_error() {
        // A 3x3 board has a 6-cell pool; three pairs eat all of it before
        // the agent can be placed.
        let err = sample_positions(3, 3, &mut StdRng::seed_from_u64(0)).unwrap_err();
        assert_eq!(err, GenError::PositionsExhausted { requested: 3, n: 3 });
    }
}
