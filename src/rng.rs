//! Seedable random source
//!
//! Every random draw in a match goes through [`MatchRng`], so a match played
//! twice from the same seed and the same initial state produces the same
//! result. The generator state is serialisable, which lets a suspended match
//! be stored and resumed mid-way.

use rand::distributions::uniform::SampleUniform;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRng {
    inner: ChaCha12Rng,
}

impl MatchRng {
    pub fn seed_from_u64(seed: u64) -> Self {
        MatchRng {
            inner: ChaCha12Rng::seed_from_u64(seed),
        }
    }

    /// Seed from OS entropy (non-reproducible)
    pub fn from_entropy() -> Self {
        MatchRng {
            inner: ChaCha12Rng::from_entropy(),
        }
    }

    /// Uniform integer in `low..=high`
    ///
    /// A degenerate range (`high <= low`) yields `low`.
    pub fn int<T>(&mut self, low: T, high: T) -> T
    where
        T: SampleUniform + PartialOrd + Copy,
    {
        if high <= low {
            return low;
        }
        self.inner.gen_range(low..=high)
    }

    /// True with `percent` % probability (values above 100 always succeed)
    pub fn chance(&mut self, percent: u8) -> bool {
        if percent == 0 {
            return false;
        }
        self.inner.gen_range(1..=100u8) <= percent
    }

    /// Uniform index into a collection of `len` elements
    pub fn index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            None
        } else {
            Some(self.inner.gen_range(0..len))
        }
    }

    pub fn pick<'s, T>(&mut self, items: &'s [T]) -> Option<&'s T> {
        self.index(items.len()).map(|i| &items[i])
    }

    /// Raw 64-bit draw, used to derive child seeds
    pub fn next_u64(&mut self) -> u64 {
        self.inner.gen()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = MatchRng::seed_from_u64(7);
        let mut b = MatchRng::seed_from_u64(7);
        let xs: Vec<u32> = (0..50).map(|_| a.int(1, 100)).collect();
        let ys: Vec<u32> = (0..50).map(|_| b.int(1, 100)).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn test_int_stays_in_range() {
        let mut rng = MatchRng::seed_from_u64(1);
        for _ in 0..1000 {
            let v = rng.int(6u16, 120u16);
            assert!((6..=120).contains(&v));
        }
    }

    #[test]
    fn test_degenerate_range_returns_low() {
        let mut rng = MatchRng::seed_from_u64(1);
        assert_eq!(rng.int(5u8, 5u8), 5);
        assert_eq!(rng.int(9i32, 3i32), 9);
    }

    #[test]
    fn test_chance_extremes() {
        let mut rng = MatchRng::seed_from_u64(3);
        assert!((0..100).all(|_| !rng.chance(0)));
        assert!((0..100).all(|_| rng.chance(100)));
    }

    #[test]
    fn test_pick_empty() {
        let mut rng = MatchRng::seed_from_u64(3);
        let empty: [u8; 0] = [];
        assert!(rng.pick(&empty).is_none());
        assert_eq!(rng.pick(&[4u8]), Some(&4));
    }
}
