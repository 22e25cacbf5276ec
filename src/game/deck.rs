use std::collections::HashSet;
use std::ops::RangeInclusive;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::state::CardFace;

/// RGB 颜色空间能提供的不同卡面数量。
pub const MAX_PAIRS: usize = 1 << 24;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum DeckError {
    #[error("pair count must not be negative, got {requested}")]
    NegativePairCount { requested: i64 },
    #[error("cannot generate {requested} distinct pairs, at most {limit} are available")]
    TooManyPairs { requested: usize, limit: usize },
}

/// 生成成对且乱序的卡面序列。
pub struct DeckGenerator {
    rng: SmallRng,
}

impl DeckGenerator {
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn from_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::with_seed(seed),
            None => Self::new(),
        }
    }

    /// 校验来自 JS 的有符号数量。
    pub fn checked_pair_count(requested: i64) -> Result<usize, DeckError> {
        if requested < 0 {
            return Err(DeckError::NegativePairCount { requested });
        }
        let count = usize::try_from(requested).unwrap_or(usize::MAX);
        if count > MAX_PAIRS {
            return Err(DeckError::TooManyPairs {
                requested: count,
                limit: MAX_PAIRS,
            });
        }
        Ok(count)
    }

    pub fn random_pair_count(&mut self, range: RangeInclusive<usize>) -> usize {
        if range.is_empty() {
            return *range.start();
        }
        self.rng.gen_range(range)
    }

    pub fn generate(&mut self, pair_count: usize) -> Result<Vec<CardFace>, DeckError> {
        if pair_count > MAX_PAIRS {
            return Err(DeckError::TooManyPairs {
                requested: pair_count,
                limit: MAX_PAIRS,
            });
        }

        let mut used = HashSet::with_capacity(pair_count);
        let mut faces = Vec::with_capacity(pair_count * 2);
        while used.len() < pair_count {
            let face = self.draw_face();
            // 撞色则重抽
            if used.insert(face) {
                faces.push(face);
                faces.push(face);
            }
        }

        shuffle(&mut faces, &mut self.rng);
        log::debug!("generated deck with {pair_count} pairs");
        Ok(faces)
    }

    fn draw_face(&mut self) -> CardFace {
        CardFace::new(self.rng.gen(), self.rng.gen(), self.rng.gen())
    }
}

impl Default for DeckGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Fisher–Yates：从末尾向前，每一步与 `[0, i]` 中均匀选取的位置交换。
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn multiplicities(faces: &[CardFace]) -> HashMap<CardFace, usize> {
        let mut counts = HashMap::new();
        for face in faces {
            *counts.entry(*face).or_insert(0) += 1;
        }
        counts
    }

    #[test]
    fn empty_deck_for_zero_pairs() {
        let mut deck = DeckGenerator::with_seed(1);
        assert!(deck.generate(0).expect("zero pairs is valid").is_empty());
    }

    #[test]
    fn single_pair_deck_holds_one_face_twice() {
        let mut deck = DeckGenerator::with_seed(2);
        let faces = deck.generate(1).expect("one pair is valid");
        assert_eq!(faces.len(), 2);
        assert_eq!(faces[0], faces[1]);
    }

    #[test]
    fn every_face_appears_exactly_twice() {
        let mut deck = DeckGenerator::with_seed(3);
        for pairs in [2, 5, 15, 200] {
            let faces = deck.generate(pairs).expect("deck should generate");
            assert_eq!(faces.len(), pairs * 2);
            let counts = multiplicities(&faces);
            assert_eq!(counts.len(), pairs);
            assert!(counts.values().all(|&count| count == 2));
        }
    }

    #[test]
    fn same_seed_same_deck() {
        let a = DeckGenerator::with_seed(99).generate(8).unwrap();
        let b = DeckGenerator::with_seed(99).generate(8).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn negative_pair_count_is_rejected() {
        assert_eq!(
            DeckGenerator::checked_pair_count(-1),
            Err(DeckError::NegativePairCount { requested: -1 })
        );
        assert_eq!(DeckGenerator::checked_pair_count(6), Ok(6));
    }

    #[test]
    fn oversized_pair_count_is_rejected() {
        let mut deck = DeckGenerator::with_seed(4);
        assert_eq!(
            deck.generate(MAX_PAIRS + 1),
            Err(DeckError::TooManyPairs {
                requested: MAX_PAIRS + 1,
                limit: MAX_PAIRS,
            })
        );
    }

    #[test]
    fn random_pair_count_stays_in_range() {
        let mut deck = DeckGenerator::with_seed(5);
        for _ in 0..200 {
            let count = deck.random_pair_count(1..=15);
            assert!((1..=15).contains(&count));
        }
        assert_eq!(deck.random_pair_count(4..=4), 4);
    }

    #[test]
    fn shuffle_is_uniform_per_position() {
        const TRIALS: usize = 40_000;
        const N: usize = 4;
        let mut rng = SmallRng::seed_from_u64(2024);
        let mut occupancy = [[0usize; N]; N];

        for _ in 0..TRIALS {
            let mut items = [0usize, 1, 2, 3];
            shuffle(&mut items, &mut rng);
            for (position, value) in items.iter().enumerate() {
                occupancy[position][*value] += 1;
            }
        }

        let expected = (TRIALS / N) as f64;
        for row in occupancy.iter() {
            for &count in row.iter() {
                let deviation = (count as f64 - expected).abs() / expected;
                assert!(deviation < 0.1, "occupancy {count} too far from {expected}");
            }
        }
    }

    #[test]
    fn shuffle_keeps_elements() {
        let mut rng = SmallRng::seed_from_u64(7);
        let mut data: Vec<u32> = (0..10).collect();
        shuffle(&mut data, &mut rng);
        data.sort_unstable();
        assert_eq!(data, (0..10).collect::<Vec<_>>());
    }
}
