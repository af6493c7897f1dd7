/*
 * Stride
 * Copyright (c) 2026  The Stride Developers
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <http://www.gnu.org/licenses/>.
 *
 */

//! Deterministic, splittable RNG service (component A).
//!
//! Each worker thread owns a private [`RandomWrapper`] seeded from
//! `(base_seed, num_threads, thread_index)`. Two runs with identical config,
//! seed and thread count reproduce identical trajectories bit-for-bit;
//! reproducibility is not guaranteed across different thread counts.

use rand::distributions::WeightedIndex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Mixes the run seed with the worker coordinates into a single stream seed.
/// A splitmix64-style finalizer keeps adjacent thread indices from producing
/// correlated streams.
fn mix_seed(base_seed: u64, num_threads: u32, thread_index: u32) -> u64 {
    let mut z = base_seed
        ^ (u64::from(num_threads) << 32)
        ^ u64::from(thread_index).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

pub struct RandomWrapper {
    rng: StdRng,
}

impl RandomWrapper {
    /// Constructs the private stream for one worker.
    pub fn new(base_seed: u64, num_threads: u32, thread_index: u32) -> RandomWrapper {
        let seed = mix_seed(base_seed, num_threads, thread_index);
        RandomWrapper { rng: StdRng::seed_from_u64(seed) }
    }

    /// Builds one [`RandomWrapper`] per worker for a fixed `(base_seed, num_threads)`.
    pub fn for_pool(base_seed: u64, num_threads: u32) -> Vec<RandomWrapper> {
        (0..num_threads).map(|i| RandomWrapper::new(base_seed, num_threads, i)).collect()
    }

    pub fn get(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Uniform integer in the inclusive range `[lo, hi]`.
    pub fn uniform_range(&mut self, lo: i64, hi: i64) -> i64 {
        self.rng.gen_range(lo, hi + 1)
    }

    /// Uniform real in `[0, 1)`.
    pub fn uniform_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// Bernoulli trial with success probability `p`.
    pub fn bernoulli(&mut self, p: f64) -> bool {
        self.rng.gen_bool(p.clamp(0.0, 1.0))
    }

    /// Draws an index from a weighted discrete distribution given as
    /// `(value, weight)` pairs, returning the chosen value.
    pub fn weighted<T: Copy>(&mut self, entries: &[(T, f64)]) -> T {
        let weights: Vec<f64> = entries.iter().map(|(_, w)| *w).collect();
        let dist = WeightedIndex::new(weights).expect("weighted histogram must have positive total weight");
        let idx = self.rng.sample(dist);
        entries[idx].0
    }
}

/// One [`RandomWrapper`] per pool worker, indexed by
/// `rayon::current_thread_index()`. Safe for the same reason [`crate::cell::PopulationCell`]
/// is: a fixed-size `rayon` pool assigns each worker a stable index for the
/// pool's lifetime, so two workers never address the same slot at once.
pub struct RngPool(Vec<std::cell::UnsafeCell<RandomWrapper>>);

// SAFETY: see the type doc comment; disjoint access is guaranteed by rayon's
// stable per-worker thread index within one pool, the same structural
// argument `PersonCell` relies on for cluster membership.
unsafe impl Sync for RngPool {}

impl RngPool {
    pub fn new(streams: Vec<RandomWrapper>) -> RngPool {
        RngPool(streams.into_iter().map(std::cell::UnsafeCell::new).collect())
    }

    /// Mutable access to the stream for the given pool worker index.
    #[allow(clippy::mut_from_ref)]
    pub fn get(&self, worker_index: usize) -> &mut RandomWrapper {
        unsafe { &mut *self.0[worker_index].get() }
    }
}
