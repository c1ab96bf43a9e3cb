//! Deterministic random streams for chunk generation.
//!
//! Each generation call derives its own seed from the world seed and the
//! chunk coordinate and owns its own [`SeededRng`]; no state is shared
//! between chunks.

use delve_common::{ChunkCoord, WorldSeed};

const FNV_OFFSET: u32 = 0x811C_9DC5;
const FNV_PRIME: u32 = 0x0100_0193;

/// 32-bit FNV-1a hash of a string key.
#[must_use]
pub fn hash_key(key: &str) -> u32 {
    key.bytes()
        .fold(FNV_OFFSET, |h, b| (h ^ u32::from(b)).wrapping_mul(FNV_PRIME))
}

/// Seed for the chunk at `coord`, derived from `"{seed}|{cx}|{cy}"`.
#[must_use]
pub fn chunk_seed(seed: WorldSeed, coord: ChunkCoord) -> u32 {
    hash_key(&format!("{seed}|{}|{}", coord.x, coord.y))
}

/// Mulberry32 generator.
#[derive(Debug, Clone)]
pub struct SeededRng {
    state: u32,
}

impl SeededRng {
    /// Create a new RNG with seed.
    #[must_use]
    pub const fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Create RNG for a specific chunk.
    #[must_use]
    pub fn for_chunk(seed: WorldSeed, coord: ChunkCoord) -> Self {
        Self::new(chunk_seed(seed, coord))
    }

    /// Get next random u32.
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6D2B_79F5);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }

    /// Get random f64 in [0, 1).
    pub fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u32()) / 4_294_967_296.0
    }

    /// Get random integer in [0, n). Returns 0 when `n` is 0.
    pub fn int(&mut self, n: u32) -> u32 {
        if n == 0 {
            return 0;
        }
        ((self.next_f64() * f64::from(n)) as u32).min(n - 1)
    }

    /// Get random integer in [min, max].
    pub fn between(&mut self, min: i32, max: i32) -> i32 {
        if min >= max {
            return min;
        }
        let span = (i64::from(max) - i64::from(min) + 1) as f64;
        min + (self.next_f64() * span) as i32
    }

    /// Choose random item from slice.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            None
        } else {
            items.get(self.int(items.len() as u32) as usize)
        }
    }

    /// True with probability `p`.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Uniform value in [-1, 1).
    pub fn signed_unit(&mut self) -> f64 {
        self.next_f64() * 2.0 - 1.0
    }

    /// `base` scaled by a uniform factor in `[1 - spread, 1 + spread)`.
    pub fn jitter(&mut self, base: f64, spread: f64) -> f64 {
        base * (1.0 + self.signed_unit() * spread)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_hash_is_stable() {
        assert_eq!(hash_key(""), FNV_OFFSET);
        assert_eq!(hash_key("a"), 0xE40C_292C);
        assert_ne!(hash_key("12345|0|0"), hash_key("12345|0|1"));
    }

    #[test]
    fn test_chunk_seed_matches_key_format() {
        let seed = WorldSeed::new(12345);
        assert_eq!(chunk_seed(seed, ChunkCoord::new(-1, 2)), hash_key("12345|-1|2"));
    }

    #[test]
    fn test_streams_are_independent_per_chunk() {
        let seed = WorldSeed::new(7);
        let mut a1 = SeededRng::for_chunk(seed, ChunkCoord::new(0, 0));
        let first: Vec<u32> = (0..8).map(|_| a1.next_u32()).collect();

        let mut b = SeededRng::for_chunk(seed, ChunkCoord::new(1, 0));
        for _ in 0..100 {
            b.next_u32();
        }

        let mut a2 = SeededRng::for_chunk(seed, ChunkCoord::new(0, 0));
        let second: Vec<u32> = (0..8).map(|_| a2.next_u32()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_pick_empty() {
        let mut rng = SeededRng::new(1);
        let empty: [u8; 0] = [];
        assert!(rng.pick(&empty).is_none());
        assert_eq!(rng.int(0), 0);
        assert_eq!(rng.between(5, 5), 5);
    }

    proptest! {
        #[test]
        fn next_f64_in_unit_interval(seed in any::<u32>()) {
            let mut rng = SeededRng::new(seed);
            for _ in 0..64 {
                let v = rng.next_f64();
                prop_assert!((0.0..1.0).contains(&v));
            }
        }

        #[test]
        fn between_is_inclusive(seed in any::<u32>(), min in -50i32..50, span in 0i32..20) {
            let mut rng = SeededRng::new(seed);
            let max = min + span;
            for _ in 0..32 {
                let v = rng.between(min, max);
                prop_assert!(v >= min && v <= max);
            }
        }

        #[test]
        fn jitter_stays_in_spread(seed in any::<u32>(), base in 1.0f64..500.0) {
            let mut rng = SeededRng::new(seed);
            let v = rng.jitter(base, 0.2);
            prop_assert!(v >= base * 0.8 - 1e-9 && v <= base * 1.2 + 1e-9);
        }

        #[test]
        fn int_below_bound(seed in any::<u32>(), n in 1u32..1000) {
            let mut rng = SeededRng::new(seed);
            prop_assert!(rng.int(n) < n);
        }
    }
}
