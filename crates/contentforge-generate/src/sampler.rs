use rand::Rng;

use contentforge_schema::{SamplePool, SampleSet, WeightMap};

/// Pick a key from a weight map proportional to its weight.
///
/// Draws uniformly in `[1, sum]` and scans the map's entries in order,
/// subtracting each weight until the remainder reaches zero. Returns `None`
/// on an empty (or all-zero) map; callers must guard.
pub fn pick_weighted<'a, R: Rng>(rng: &mut R, weights: &'a WeightMap) -> Option<&'a str> {
    let total: u64 = weights.values().sum();
    if total == 0 {
        return None;
    }

    let mut remainder = rng.random_range(1..=total);
    for (key, weight) in weights {
        if remainder <= *weight {
            return Some(key);
        }
        remainder -= weight;
    }

    // Unreachable while the sum covers the draw range; guard anyway.
    weights.keys().next_back().map(String::as_str)
}

/// Draw one value-set for a field type, uniformly over the pool's entries.
///
/// Unknown field types yield `None`; callers skip the field silently.
pub fn sample_from_pool<'a, R: Rng>(
    pool: &'a SamplePool,
    field_type: &str,
    rng: &mut R,
) -> Option<&'a SampleSet> {
    let sets = pool.sets(field_type);
    if sets.is_empty() {
        return None;
    }
    sets.get(rng.random_range(0..sets.len()))
}
