//! `CuckooMap`: the cascade of subtables, its single mutex, and the
//! cascaded lookup/insert/remove operations with promotion and layer spill.

use std::sync::Mutex;

use crate::config::CuckooConfig;
use crate::error::Result;
use crate::finding::Finding;
use crate::hashing::Hashes;
use crate::key::CuckooKey;
use crate::subtable::{InsertOutcome, SlotPtrs, Subtable};

pub(crate) struct Inner<K: CuckooKey, V: Copy> {
    layers: Vec<Subtable<K, V>>,
    used: usize,
    rng: fastrand::Rng,
}

impl<K: CuckooKey, V: Copy> Inner<K, V> {
    pub(crate) fn remove_fingerprint(&mut self, fingerprint_ptr: *mut u32) {
        // Any live layer's storage may own this pointer; zeroing it doesn't
        // need to know which one.
        unsafe {
            *fingerprint_ptr = 0;
        }
        self.used -= 1;
    }
}

/// A concurrent, in-memory cuckoo hash map with a geometric cascade of
/// overflow subtables.
///
/// See the crate-level documentation for the design this implements.
pub struct CuckooMap<K: CuckooKey, V: Copy> {
    inner: Mutex<Inner<K, V>>,
    hashes: Hashes,
    config: CuckooConfig,
}

impl<K: CuckooKey, V: Copy> CuckooMap<K, V> {
    /// Creates a map whose layer-0 subtable has `initial_buckets` buckets,
    /// using [`CuckooConfig::default`].
    pub fn new(initial_buckets: usize) -> Self {
        Self::with_config(initial_buckets, CuckooConfig::default())
    }

    /// Creates a map with an explicit [`CuckooConfig`].
    pub fn with_config(initial_buckets: usize, config: CuckooConfig) -> Self {
        Self::with_seed(initial_buckets, config, fastrand::Rng::new().u64(..))
    }

    /// Creates a map whose hash seeds and eviction walk are both derived
    /// from `seed`, for reproducible runs (debugging, and tests that need a
    /// deterministic cascade shape).
    pub fn with_seed(initial_buckets: usize, config: CuckooConfig, seed: u64) -> Self {
        let mut rng = fastrand::Rng::with_seed(seed);
        let hashes = Hashes::new(&mut rng);
        let layer0 = Subtable::try_new(initial_buckets.max(1), config.kick_budget)
            .expect("initial layer allocation should not fail");
        CuckooMap {
            inner: Mutex::new(Inner {
                layers: vec![layer0],
                used: 0,
                rng,
            }),
            hashes,
            config,
        }
    }

    /// Looks up `key`, promoting it to layer 0 if it was found deeper in
    /// the cascade. Holds the map's lock until the returned [`Finding`] is
    /// dropped.
    pub fn lookup(&self, key: &K) -> Finding<'_, K, V> {
        let mut guard = self.inner.lock().unwrap();
        let slot = self.lookup_and_promote(&mut guard, key);
        Finding::new(guard, slot)
    }

    /// Inserts `(key, value)`. Returns `Ok(true)` if a new entry was
    /// created, `Ok(false)` if `key` already had an entry (left unchanged).
    pub fn insert(&self, key: K, value: V) -> Result<bool> {
        let mut guard = self.inner.lock().unwrap();
        let (inserted, _) = self.insert_locked(&mut guard, key, value)?;
        Ok(inserted)
    }

    /// As [`CuckooMap::insert`], but also returns a [`Finding`] pointing at
    /// the resting slot of `key` when the insert call can identify one —
    /// whether because `key` already existed or because it (or a pair
    /// displaced in its place) found a home in this call.
    pub fn insert_finding(&self, key: K, value: V) -> Result<(bool, Finding<'_, K, V>)> {
        let mut guard = self.inner.lock().unwrap();
        let (inserted, slot) = self.insert_locked(&mut guard, key, value)?;
        Ok((inserted, Finding::new(guard, slot)))
    }

    /// Removes `key`. Returns `true` iff an entry was present.
    pub fn remove(&self, key: &K) -> bool {
        let mut guard = self.inner.lock().unwrap();
        match self.lookup_and_promote(&mut guard, key) {
            Some((fingerprint_ptr, _, _)) => {
                guard.remove_fingerprint(fingerprint_ptr);
                true
            }
            None => false,
        }
    }

    /// Removes the entry a [`Finding`] points at, consuming it. Equivalent
    /// to `finding.remove()`, kept for API-shape parity with the abstract
    /// design's `remove(&Finding)` form.
    pub fn remove_finding(&self, finding: Finding<'_, K, V>) -> bool {
        finding.remove()
    }

    /// The number of distinct keys currently stored, summed across all
    /// layers.
    pub fn nr_used(&self) -> usize {
        self.inner.lock().unwrap().used
    }

    /// Number of layers currently in the cascade. A white-box introspection
    /// hook, mainly useful for tests asserting that overflow actually grew
    /// the cascade.
    pub fn layer_count(&self) -> usize {
        self.inner.lock().unwrap().layers.len()
    }

    /// Reports which layer currently holds `key`, without promoting it.
    /// Another white-box introspection hook, for tests that check
    /// promotion-on-lookup.
    pub fn layer_of(&self, key: &K) -> Option<usize> {
        let mut guard = self.inner.lock().unwrap();
        for (i, layer) in guard.layers.iter_mut().enumerate() {
            if layer.lookup(key, self.hashes).is_some() {
                return Some(i);
            }
        }
        None
    }

    /// Cascades across layers without promotion; used internally to locate
    /// a key for duplicate detection ahead of insertion.
    fn locate(&self, guard: &mut Inner<K, V>, key: &K) -> Option<SlotPtrs<K, V>> {
        for layer in guard.layers.iter_mut() {
            if let Some(slot) = layer.lookup(key, self.hashes) {
                return Some(slot);
            }
        }
        None
    }

    fn lookup_and_promote(&self, guard: &mut Inner<K, V>, key: &K) -> Option<SlotPtrs<K, V>> {
        let hit_layer = guard
            .layers
            .iter_mut()
            .position(|layer| layer.lookup(key, self.hashes).is_some())?;

        if hit_layer == 0 {
            return guard.layers[0].lookup(key, self.hashes);
        }

        // Promote: copy the pair out of its current layer, remove it there,
        // then re-insert starting at layer 0 via the same cascade path used
        // for fresh inserts.
        let (fingerprint_ptr, key_ptr, value_ptr) = guard.layers[hit_layer].lookup(key, self.hashes)?;
        let found_key = unsafe { *key_ptr };
        let found_value = unsafe { *value_ptr };
        guard.layers[hit_layer].remove_at(fingerprint_ptr);
        guard.used -= 1;

        log::trace!("promoting key from layer {hit_layer} to layer 0");
        let (_, slot) = self
            .insert_locked(guard, found_key, found_value)
            .expect("re-inserting a promoted entry must not grow past a fresh allocation fault");
        slot
    }

    /// Performs the cascaded insert: a global duplicate pre-check (so
    /// invariant L1 — at most one occupied slot per key across all layers —
    /// holds even when a stale copy of `key` sits in a layer this call never
    /// visits), then the three-retries-per-layer, spill-on-overflow walk
    /// described in the design.
    fn insert_locked(
        &self,
        guard: &mut Inner<K, V>,
        key: K,
        value: V,
    ) -> Result<(bool, Option<SlotPtrs<K, V>>)> {
        debug_assert!(!key.is_empty(), "inserting the canonical empty key is caller error");

        if let Some(slot) = self.locate(guard, &key) {
            return Ok((false, Some(slot)));
        }

        let mut cur_key = key;
        let mut cur_value = value;
        let mut layer_idx = 0usize;
        let mut resting: Option<(usize, SlotPtrs<K, V>)> = None;

        loop {
            if layer_idx >= guard.layers.len() {
                let requested = guard.layers[layer_idx - 1].bucket_count() * self.config.growth_factor;
                let new_layer = Subtable::try_new(requested, self.config.kick_budget)?;
                guard.layers.push(new_layer);
                log::debug!("cuckoo map: grew cascade to layer {layer_idx} with {requested} buckets");
            }

            // The pair entering this layer, fixed for all of this layer's
            // attempts: each attempt gives it an independent fresh random
            // walk within this one layer before the layer is conceded as
            // full and the cascade spills to the next one. All but the
            // last attempt roll back their own displacements on overflow,
            // so a failed retry never strands some other key that an
            // earlier attempt kicked loose — only the final, conceded
            // attempt's displacements are allowed to stick.
            let entering_key = cur_key;
            let entering_value = cur_value;
            let mut placed = false;
            let mut last_overflow: Option<(K, V)> = None;

            for attempt in 0..3 {
                let keep_overflow_mutations = attempt == 2;
                let (outcome, local_resting) = guard.layers[layer_idx].insert(
                    entering_key,
                    entering_value,
                    self.hashes,
                    &mut guard.rng,
                    &key,
                    keep_overflow_mutations,
                );
                if let Some(slot) = local_resting {
                    resting = Some((layer_idx, slot));
                }
                match outcome {
                    InsertOutcome::Duplicate => {
                        unreachable!("duplicate key surfaced mid-cascade despite pre-check")
                    }
                    InsertOutcome::Inserted => {
                        guard.used += 1;
                        placed = true;
                        break;
                    }
                    InsertOutcome::Overflow(k2, v2) => {
                        last_overflow = Some((k2, v2));
                    }
                }
            }

            if placed {
                break;
            }
            let (k2, v2) =
                last_overflow.expect("an attempt that did not place anything always reports an overflow pair");
            cur_key = k2;
            cur_value = v2;
            layer_idx += 1;
        }

        Ok((true, resting.map(|(_, slot)| slot)))
    }
}
