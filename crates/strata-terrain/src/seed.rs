//! Deterministic per-chunk seed derivation.
//!
//! Scatter passes need a seed that depends only on the world seed, the chunk's
//! lattice coordinate and the scatter category, never on thread or timing.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Combine a world seed, a chunk coordinate and a category name into one seed.
///
/// Uses SipHash with fixed keys (std's `DefaultHasher::new`), so the result is
/// stable for a given build.
pub fn derive_chunk_seed(world_seed: u64, coord: (i32, i32), category: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    world_seed.hash(&mut hasher);
    coord.0.hash(&mut hasher);
    coord.1.hash(&mut hasher);
    category.hash(&mut hasher);
    hasher.finish()
}

/// A ChaCha RNG seeded from [`derive_chunk_seed`].
pub fn chunk_rng(world_seed: u64, coord: (i32, i32), category: &str) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(derive_chunk_seed(world_seed, coord, category))
}
