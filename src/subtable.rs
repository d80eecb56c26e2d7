//! A single cuckoo subtable: a flat array of fixed-size slots grouped into
//! buckets of `B` slots, with bounded random-walk eviction on insert. Holds
//! no locks of its own — that discipline lives one layer up, in
//! [`crate::map::CuckooMap`].

use std::mem::MaybeUninit;

use crate::config::SLOTS_PER_BUCKET;
use crate::error::{CuckooError, Result};
use crate::hashing::Hashes;
use crate::key::CuckooKey;

struct Slot<K, V> {
    // Zero means empty. Nonzero fingerprints are derived from H1(key).
    fingerprint: u32,
    key: K,
    value: MaybeUninit<V>,
}

/// Raw pointers into a single slot's storage: fingerprint, key, value.
pub(crate) type SlotPtrs<K, V> = (*mut u32, *mut K, *mut V);

/// Outcome of a single subtable insert attempt.
pub(crate) enum InsertOutcome<K, V> {
    /// A slot with an equal key already existed; the table was not mutated.
    Duplicate,
    /// The pair (or its final displaced descendant) found a home within the
    /// kick budget.
    Inserted,
    /// The kick budget was exhausted; this pair is homeless and must be
    /// carried to the next layer.
    Overflow(K, V),
}

/// A flat, bucketed cuckoo subtable. Bucket count `n` need not be a power of
/// two: candidate bucket indices are taken modulo `n` directly, matching the
/// abstract design's "a power of two is convenient but not required".
pub(crate) struct Subtable<K, V> {
    slots: Box<[Slot<K, V>]>,
    n: usize,
    kick_budget: usize,
}

impl<K: CuckooKey, V: Copy> Subtable<K, V> {
    pub(crate) fn try_new(n: usize, kick_budget: usize) -> Result<Self> {
        let total = n.checked_mul(SLOTS_PER_BUCKET).ok_or(CuckooError::LayerAllocation {
            requested_buckets: n,
        })?;
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(total)
            .map_err(|_| CuckooError::LayerAllocation { requested_buckets: n })?;
        slots.resize_with(total, || Slot {
            fingerprint: 0,
            key: K::empty(),
            value: MaybeUninit::uninit(),
        });
        Ok(Subtable {
            slots: slots.into_boxed_slice(),
            n,
            kick_budget,
        })
    }

    pub(crate) fn bucket_count(&self) -> usize {
        self.n
    }

    fn bucket_range(&self, bucket: usize) -> std::ops::Range<usize> {
        let start = bucket * SLOTS_PER_BUCKET;
        start..start + SLOTS_PER_BUCKET
    }

    /// Scans both of `key`'s candidate buckets for a matching, occupied
    /// slot. Returns raw pointers into the slot's storage on a hit:
    /// (fingerprint, key, value), the first needed only to support removal.
    pub(crate) fn lookup(&mut self, key: &K, hashes: Hashes) -> Option<SlotPtrs<K, V>> {
        let h1 = hashes.h1(key);
        let fp = Hashes::fingerprint(h1);
        let h2 = hashes.h2(key);
        let b1 = (h1 as usize) % self.n;
        let b2 = (h2 as usize) % self.n;

        for bucket in [b1, b2] {
            for idx in self.bucket_range(bucket) {
                if self.slots[idx].fingerprint == fp && &self.slots[idx].key == key {
                    return Some(self.pointers(idx));
                }
            }
        }
        None
    }

    fn find_empty(&self, bucket: usize) -> Option<usize> {
        self.bucket_range(bucket).find(|&idx| self.slots[idx].fingerprint == 0)
    }

    fn find_equal(&self, bucket: usize, fp: u32, key: &K) -> Option<usize> {
        self.bucket_range(bucket)
            .find(|&idx| self.slots[idx].fingerprint == fp && &self.slots[idx].key == key)
    }

    fn place(&mut self, idx: usize, fp: u32, key: K, value: V) {
        self.slots[idx] = Slot {
            fingerprint: fp,
            key,
            value: MaybeUninit::new(value),
        };
    }

    /// Swaps `(fp, key, value)` into `idx`, returning whatever occupied it
    /// before. `idx` must refer to an occupied, non-empty slot.
    fn swap_in(&mut self, idx: usize, fp: u32, key: K, value: V) -> (u32, K, V) {
        let slot = &mut self.slots[idx];
        let evicted_fp = slot.fingerprint;
        let evicted_key = slot.key;
        let evicted_value = unsafe { slot.value.assume_init() };
        slot.fingerprint = fp;
        slot.key = key;
        slot.value = MaybeUninit::new(value);
        (evicted_fp, evicted_key, evicted_value)
    }

    fn pointers(&mut self, idx: usize) -> SlotPtrs<K, V> {
        let slot = &mut self.slots[idx];
        (
            &mut slot.fingerprint as *mut u32,
            &mut slot.key as *mut K,
            slot.value.as_mut_ptr(),
        )
    }

    /// Inserts `(key, value)`, performing a bounded random-walk eviction
    /// when both of its candidate buckets are full. `original` is the key
    /// identity the caller ultimately asked for (it may differ from `key`
    /// when this call is carrying an overflow pair displaced from another
    /// layer); whenever the pair currently resting in a slot equals
    /// `original`, that slot's pointers are returned alongside the overall
    /// outcome, independent of whether this call itself ends in overflow —
    /// a pair unrelated to `original` can still be the one left homeless.
    ///
    /// When `keep_overflow_mutations` is `false`, an `Overflow` outcome
    /// undoes every eviction the walk performed before returning, so the
    /// layer is left exactly as it was found and the returned pair is
    /// always `(key, value)` itself — a true no-op retry. The caller is
    /// expected to pass `false` for all but the last of a bounded number of
    /// retries within one layer, so that only the final, conceded attempt's
    /// displacements actually stick.
    pub(crate) fn insert(
        &mut self,
        key: K,
        value: V,
        hashes: Hashes,
        rng: &mut fastrand::Rng,
        original: &K,
        keep_overflow_mutations: bool,
    ) -> (InsertOutcome<K, V>, Option<SlotPtrs<K, V>>) {
        let h1 = hashes.h1(&key);
        let fp = Hashes::fingerprint(h1);
        let h2 = hashes.h2(&key);
        let b1 = (h1 as usize) % self.n;
        let b2 = (h2 as usize) % self.n;

        if let Some(idx) = self.find_equal(b1, fp, &key).or_else(|| self.find_equal(b2, fp, &key)) {
            let resting = (&key == original).then(|| self.pointers(idx));
            return (InsertOutcome::Duplicate, resting);
        }

        if let Some(idx) = self.find_empty(b1).or_else(|| self.find_empty(b2)) {
            self.place(idx, fp, key, value);
            let resting = (&key == original).then(|| self.pointers(idx));
            return (InsertOutcome::Inserted, resting);
        }

        let mut cur_key = key;
        let mut cur_value = value;
        let mut cur_fp = fp;
        let mut resting_idx: Option<usize> = None;
        let mut trail: Vec<(usize, u32, K, V)> = Vec::new();

        for _ in 0..self.kick_budget {
            let h1c = hashes.h1(&cur_key);
            let h2c = hashes.h2(&cur_key);
            let cb1 = (h1c as usize) % self.n;
            let cb2 = (h2c as usize) % self.n;

            if let Some(idx) = self.find_empty(cb1).or_else(|| self.find_empty(cb2)) {
                self.place(idx, cur_fp, cur_key, cur_value);
                if cur_key == *original {
                    resting_idx = Some(idx);
                }
                let resting = resting_idx.map(|i| self.pointers(i));
                return (InsertOutcome::Inserted, resting);
            }

            let bucket = if rng.bool() { cb1 } else { cb2 };
            let slot_in_bucket = rng.usize(0..SLOTS_PER_BUCKET);
            let idx = bucket * SLOTS_PER_BUCKET + slot_in_bucket;

            if resting_idx == Some(idx) {
                resting_idx = None;
            }
            let (evicted_fp, evicted_key, evicted_value) = self.swap_in(idx, cur_fp, cur_key, cur_value);
            trail.push((idx, evicted_fp, evicted_key, evicted_value));
            if cur_key == *original {
                resting_idx = Some(idx);
            }
            cur_fp = evicted_fp;
            cur_key = evicted_key;
            cur_value = evicted_value;
        }

        if keep_overflow_mutations {
            let resting = resting_idx.map(|i| self.pointers(i));
            return (InsertOutcome::Overflow(cur_key, cur_value), resting);
        }

        // Undo every swap this walk performed, in reverse, so the layer is
        // left exactly as it was before this attempt and the original
        // (key, value) pair is the only thing reported homeless.
        for (idx, prev_fp, prev_key, prev_value) in trail.into_iter().rev() {
            self.place(idx, prev_fp, prev_key, prev_value);
        }
        (InsertOutcome::Overflow(key, value), None)
    }

    /// Zeros the fingerprint the given pointer refers to, marking its slot
    /// empty. `fingerprint_ptr` must have been obtained from a prior
    /// `lookup`/`insert` call on this same subtable while the owning map's
    /// lock was continuously held.
    pub(crate) fn remove_at(&mut self, fingerprint_ptr: *mut u32) {
        unsafe {
            *fingerprint_ptr = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Key;

    fn hashes() -> Hashes {
        let mut rng = fastrand::Rng::with_seed(7);
        Hashes::new(&mut rng)
    }

    #[test]
    fn insert_then_lookup_round_trips() {
        let mut table: Subtable<Key, u64> = Subtable::try_new(8, 32).unwrap();
        let hashes = hashes();
        let mut rng = fastrand::Rng::with_seed(1);
        let key = Key(42);
        let (outcome, resting) = table.insert(key, 100, hashes, &mut rng, &key, true);
        assert!(matches!(outcome, InsertOutcome::Inserted));
        assert!(resting.is_some());

        let (_, _, value_ptr) = table.lookup(&key, hashes).unwrap();
        assert_eq!(unsafe { *value_ptr }, 100);
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let mut table: Subtable<Key, u64> = Subtable::try_new(8, 32).unwrap();
        let hashes = hashes();
        let mut rng = fastrand::Rng::with_seed(1);
        let key = Key(9);
        table.insert(key, 1, hashes, &mut rng, &key, true);
        let (outcome, _) = table.insert(key, 2, hashes, &mut rng, &key, true);
        assert!(matches!(outcome, InsertOutcome::Duplicate));
    }

    #[test]
    fn remove_clears_fingerprint() {
        let mut table: Subtable<Key, u64> = Subtable::try_new(8, 32).unwrap();
        let hashes = hashes();
        let mut rng = fastrand::Rng::with_seed(1);
        let key = Key(5);
        table.insert(key, 77, hashes, &mut rng, &key, true);
        let (fingerprint_ptr, _, _) = table.lookup(&key, hashes).unwrap();
        table.remove_at(fingerprint_ptr);
        assert!(table.lookup(&key, hashes).is_none());
    }

    #[test]
    fn fills_a_small_table_via_eviction() {
        let mut table: Subtable<Key, u64> = Subtable::try_new(4, 500).unwrap();
        let hashes = hashes();
        let mut rng = fastrand::Rng::with_seed(2);
        let mut inserted = 0;
        for i in 1..=20u64 {
            let key = Key(i);
            let (outcome, _) = table.insert(key, i, hashes, &mut rng, &key, true);
            if matches!(outcome, InsertOutcome::Inserted) {
                inserted += 1;
            }
        }
        assert!(inserted > 0);
        for i in 1..=20u64 {
            let key = Key(i);
            if let Some((_, _, value_ptr)) = table.lookup(&key, hashes) {
                assert_eq!(unsafe { *value_ptr }, i);
            }
        }
    }
}
