//! The scoped, lock-holding handle returned by lookup and insert.

use std::sync::MutexGuard;

use crate::key::CuckooKey;
use crate::map::{CuckooMap, Inner};
use crate::subtable::SlotPtrs;

/// A handle that reports whether a key/value pair was located, exposes its
/// slot for reading/mutation, and holds the owning map's lock for as long as
/// it lives.
///
/// A `Finding` is move-only (it owns a [`MutexGuard`], which is not `Clone`).
/// Dropping it — whether by falling out of scope or via [`Finding::rebind`]
/// — releases the lock.
pub struct Finding<'a, K: CuckooKey, V: Copy> {
    // Kept alive purely for its `Drop` impl releasing the mutex; `used` is
    // reached through it on `remove`.
    guard: MutexGuard<'a, Inner<K, V>>,
    fingerprint_ptr: Option<*mut u32>,
    key_ptr: Option<*mut K>,
    value_ptr: Option<*mut V>,
}

impl<'a, K: CuckooKey, V: Copy> Finding<'a, K, V> {
    pub(crate) fn new(
        guard: MutexGuard<'a, Inner<K, V>>,
        slot: Option<SlotPtrs<K, V>>,
    ) -> Self {
        let (fingerprint_ptr, key_ptr, value_ptr) = match slot {
            Some((f, k, v)) => (Some(f), Some(k), Some(v)),
            None => (None, None, None),
        };
        Finding {
            guard,
            fingerprint_ptr,
            key_ptr,
            value_ptr,
        }
    }

    /// Reports whether this handle points at a live slot.
    pub fn found(&self) -> bool {
        self.key_ptr.is_some()
    }

    /// Borrows the located key, if any.
    pub fn key(&self) -> Option<&K> {
        // SAFETY: key_ptr, when set, points into storage owned by the
        // subtable this guard protects; it remains valid for as long as
        // self (and therefore the guard) is alive.
        self.key_ptr.map(|p| unsafe { &*p })
    }

    /// Borrows the located value, if any.
    pub fn value(&self) -> Option<&V> {
        self.value_ptr.map(|p| unsafe { &*p })
    }

    /// Mutably borrows the located value, if any. Callers may freely
    /// overwrite the bytes within `size_of::<V>()`.
    pub fn value_mut(&mut self) -> Option<&mut V> {
        self.value_ptr.map(|p| unsafe { &mut *p })
    }

    /// Raw escape hatch for in-place key mutation.
    ///
    /// # Safety
    ///
    /// The caller must not change the key's hash, fingerprint, or equality
    /// class — doing so corrupts the map's bucket invariants. Prefer
    /// removing and re-inserting unless you have verified this holds.
    pub unsafe fn key_ptr(&self) -> Option<*mut K> {
        self.key_ptr
    }

    /// Removes the located entry, consuming this handle. Returns `false`
    /// (without mutating anything) if this handle did not find an entry.
    pub fn remove(mut self) -> bool {
        match self.fingerprint_ptr.take() {
            Some(fp) => {
                self.guard.remove_fingerprint(fp);
                true
            }
            None => false,
        }
    }

    /// Drops this handle's lock on its current map and performs a fresh
    /// lookup of `key` on `map`, returning a new handle tied to `map`'s
    /// lifetime.
    pub fn rebind<'b>(self, map: &'b CuckooMap<K, V>, key: &K) -> Finding<'b, K, V> {
        drop(self);
        map.lookup(key)
    }

    /// Always `None`: API-shape parity with a sibling multi-valued
    /// container, not implemented here.
    pub fn next(&self) -> Option<()> {
        None
    }

    /// Always `false`: API-shape parity with a sibling multi-valued
    /// container, not implemented here.
    pub fn get(&self, _index: usize) -> bool {
        false
    }
}
