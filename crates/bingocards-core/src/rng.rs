// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

/// A source of random numbers for shuffling.
pub trait RandomSource {
    fn next_u32(&mut self) -> u32;

    /// Generate a uniformly distributed number in `[0, bound)`.
    ///
    /// Draws that fall into the incomplete final block of the `u32` range are
    /// rejected, so the result carries no modulo bias.
    fn below(&mut self, bound: u32) -> u32 {
        assert!(bound > 0, "bound must be positive");
        // 2^32 mod bound.
        let threshold = bound.wrapping_neg() % bound;
        loop {
            let r = self.next_u32();
            if r >= threshold {
                return r % bound;
            }
        }
    }
}

/// A minimal, zero-dependency, completely insecure PRNG to shuffle the terms.
pub struct TinyRng {
    state: u64,
}

const A: u64 = 6364136223846793005;
const C: u64 = 1442695040888963407;

impl TinyRng {
    /// Initialize the RNG from a seed.
    pub fn from_seed(seed: u64) -> Self {
        Self { state: seed }
    }
}

impl RandomSource for TinyRng {
    fn next_u32(&mut self) -> u32 {
        let new = self.state.wrapping_mul(A).wrapping_add(C);
        self.state = new;
        (new >> 32) as u32
    }
}

/// Fisher-Yates, in place: walk backwards and swap each slot with a uniformly
/// chosen slot at or before it.
pub fn shuffle_in_place<T>(v: &mut [T], rng: &mut impl RandomSource) {
    for i in (1..v.len()).rev() {
        let j = rng.below(i as u32 + 1) as usize;
        v.swap(i, j);
    }
}

/// Return a shuffled copy of `items`. The input is left untouched.
pub fn shuffle<T: Clone>(items: &[T], rng: &mut impl RandomSource) -> Vec<T> {
    let mut v = items.to_vec();
    shuffle_in_place(&mut v, rng);
    v
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    /// Replays a fixed list of draws.
    struct Scripted {
        draws: Vec<u32>,
        pos: usize,
    }

    impl RandomSource for Scripted {
        fn next_u32(&mut self) -> u32 {
            let r = self.draws[self.pos % self.draws.len()];
            self.pos += 1;
            r
        }
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = TinyRng::from_seed(42);
        let mut b = TinyRng::from_seed(42);
        for _ in 0..100 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn test_below_in_range() {
        let mut rng = TinyRng::from_seed(7);
        for bound in 1..50 {
            for _ in 0..20 {
                assert!(rng.below(bound) < bound);
            }
        }
    }

    #[test]
    fn test_below_rejects_biased_draws() {
        // For bound 3, 2^32 mod 3 == 1, so a draw of 0 must be rejected.
        let mut rng = Scripted {
            draws: vec![0, 5],
            pos: 0,
        };
        assert_eq!(rng.below(3), 2);
        assert_eq!(rng.pos, 2);
    }

    #[test]
    fn test_shuffle_is_permutation() {
        let items: Vec<u32> = (0..40).collect();
        let mut rng = TinyRng::from_seed(1234);
        let shuffled = shuffle(&items, &mut rng);
        assert_eq!(shuffled.len(), items.len());
        let mut sorted = shuffled.clone();
        sorted.sort();
        assert_eq!(sorted, items);
    }

    #[test]
    fn test_shuffle_does_not_mutate_input() {
        let items = vec!["a", "b", "c", "d", "e"];
        let before = items.clone();
        let mut rng = TinyRng::from_seed(99);
        let _ = shuffle(&items, &mut rng);
        assert_eq!(items, before);
    }

    #[test]
    fn test_shuffle_small_inputs() {
        let mut rng = TinyRng::from_seed(0);
        let empty: Vec<u8> = Vec::new();
        assert!(shuffle(&empty, &mut rng).is_empty());
        assert_eq!(shuffle(&["only"], &mut rng), vec!["only"]);
    }

    #[test]
    fn test_shuffle_swaps_backwards() {
        // Both draws pick j = 0: i = 2 swaps with 0, then i = 1 swaps with 0.
        let mut rng = Scripted {
            draws: vec![3, 4],
            pos: 0,
        };
        assert_eq!(shuffle(&[1, 2, 3], &mut rng), vec![2, 3, 1]);
    }

    #[test]
    fn test_shuffle_reaches_every_ordering() {
        let items = [1, 2, 3];
        let mut rng = TinyRng::from_seed(5);
        let mut seen = HashSet::new();
        for _ in 0..600 {
            seen.insert(shuffle(&items, &mut rng));
        }
        assert_eq!(seen.len(), 6);
    }
}
