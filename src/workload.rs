//! A mixed insert/lookup/remove workload driver, cross-checked against
//! `hashbrown::HashMap` as a reference oracle. Used by the `driver` binary
//! and by the benchmark harness; also exercised directly in integration
//! tests.

use hashbrown::HashMap;

use crate::{CuckooConfig, CuckooMap, Key};

/// Parameters of a single workload run.
#[derive(Clone, Copy, Debug)]
pub struct WorkloadConfig {
    /// Total number of operations to perform.
    pub operations: usize,
    /// Number of keys pre-loaded before the weighted mix begins.
    pub initial_keys: u64,
    /// Upper bound (exclusive) on key values drawn during the run; bounds
    /// the working set so hits and misses both occur.
    pub key_space: u64,
    /// Weight given to insert operations, relative to `lookup_weight` and
    /// `remove_weight`.
    pub insert_weight: u32,
    /// Weight given to lookup operations.
    pub lookup_weight: u32,
    /// Weight given to remove operations.
    pub remove_weight: u32,
    /// PRNG seed, for reproducible runs.
    pub seed: u64,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        WorkloadConfig {
            operations: 100_000,
            initial_keys: 1_000,
            key_space: 4_000,
            insert_weight: 2,
            lookup_weight: 5,
            remove_weight: 1,
            seed: 42,
        }
    }
}

/// Tallies of operations actually performed, for reporting.
#[derive(Clone, Copy, Debug, Default)]
pub struct WorkloadStats {
    pub inserts: usize,
    pub lookups: usize,
    pub lookup_hits: usize,
    pub removes: usize,
    pub remove_hits: usize,
}

/// Runs a weighted mix of insert/lookup/remove operations against a
/// [`CuckooMap`] and an in-process `hashbrown::HashMap`, asserting after
/// every operation that the two agree. Returns the stats tallied and the
/// final key count, for the caller to print or assert on.
///
/// # Panics
///
/// Panics if the cuckoo map and the reference map ever disagree on whether a
/// key is present, or on its value.
pub fn run_workload(config: WorkloadConfig) -> WorkloadStats {
    let map: CuckooMap<Key, u64> = CuckooMap::with_config(
        (config.initial_keys as usize / 4).max(1),
        CuckooConfig::default(),
    );
    let mut reference: HashMap<u64, u64> = HashMap::new();
    let mut rng = fastrand::Rng::with_seed(config.seed);
    let mut stats = WorkloadStats::default();

    // Key `0` is the canonical empty sentinel (`Key::is_empty`) and is never
    // drawn as a live key; the working set is `1..=key_space` instead.
    for i in 0..config.initial_keys {
        let k = 1 + i % config.key_space;
        map.insert(Key(k), k)
            .expect("initial load should not overflow the cascade");
        reference.insert(k, k);
    }

    let total_weight = config.insert_weight + config.lookup_weight + config.remove_weight;
    for _ in 0..config.operations {
        let k = 1 + rng.u64(0..config.key_space);
        let pick = rng.u32(0..total_weight);

        if pick < config.insert_weight {
            let inserted = map.insert(Key(k), k).expect("insert should not overflow the cascade");
            let already_present = reference.insert(k, k).is_some();
            assert_eq!(inserted, !already_present, "insert result disagreed with reference for key {k}");
            stats.inserts += 1;
        } else if pick < config.insert_weight + config.lookup_weight {
            let finding = map.lookup(&Key(k));
            let expected = reference.get(&k).copied();
            assert_eq!(finding.value().copied(), expected, "lookup disagreed with reference for key {k}");
            stats.lookups += 1;
            if finding.found() {
                stats.lookup_hits += 1;
            }
        } else {
            let removed = map.remove(&Key(k));
            let was_present = reference.remove(&k).is_some();
            assert_eq!(removed, was_present, "remove disagreed with reference for key {k}");
            stats.removes += 1;
            if removed {
                stats.remove_hits += 1;
            }
        }
    }

    log::info!(
        "workload complete: {} ops, map holds {} keys, reference holds {} keys",
        config.operations,
        map.nr_used(),
        reference.len()
    );
    assert_eq!(map.nr_used(), reference.len(), "final key counts disagreed");
    stats
}
