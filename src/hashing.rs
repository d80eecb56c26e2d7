//! Seeded hashing and fingerprint derivation.
//!
//! `FoldHasher` generalizes the multiply-xor-fold mixing the teacher
//! benchmark tables use for `u64` keys (`fold_hash_fast`) into a
//! `std::hash::Hasher` that folds an arbitrary byte stream, so it works for
//! any `CuckooKey` via its own `Hash` impl rather than requiring `u64` keys.

use std::hash::{Hash, Hasher};

const FOLD: u64 = 0x2d35_8dcc_aa6c_78a5;

/// A fast, non-cryptographic hasher built from the same fold-multiply mix as
/// the teacher benchmark's `fold_hash_fast`, generalized to consume bytes
/// incrementally instead of a single `u64`.
pub(crate) struct FoldHasher {
    state: u64,
}

impl FoldHasher {
    fn with_seed(seed: u64) -> Self {
        FoldHasher { state: seed }
    }

    #[inline(always)]
    fn fold(&mut self, word: u64) {
        let mixed = (self.state ^ word) as u128 * FOLD as u128;
        self.state = ((mixed >> 64) as u64) ^ (mixed as u64);
    }
}

impl Hasher for FoldHasher {
    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        let mut chunks = bytes.chunks_exact(8);
        for chunk in &mut chunks {
            self.fold(u64::from_ne_bytes(chunk.try_into().unwrap()));
        }
        let rem = chunks.remainder();
        if !rem.is_empty() {
            let mut buf = [0u8; 8];
            buf[..rem.len()].copy_from_slice(rem);
            self.fold(u64::from_ne_bytes(buf));
        }
    }

    #[inline]
    fn write_u64(&mut self, i: u64) {
        self.fold(i);
    }

    #[inline]
    fn finish(&self) -> u64 {
        self.state
    }
}

/// The two independent seeds a [`crate::CuckooMap`] draws once at
/// construction time; shared map-wide (not per-subtable) so a key's
/// candidate buckets are computed identically in every layer it may visit.
#[derive(Clone, Copy)]
pub(crate) struct Hashes {
    seed1: u64,
    seed2: u64,
}

impl Hashes {
    pub(crate) fn new(rng: &mut fastrand::Rng) -> Self {
        Hashes {
            seed1: rng.u64(..),
            seed2: rng.u64(..) | 1,
        }
    }

    #[inline]
    pub(crate) fn h1<K: Hash>(&self, key: &K) -> u64 {
        let mut hasher = FoldHasher::with_seed(self.seed1);
        key.hash(&mut hasher);
        hasher.finish()
    }

    #[inline]
    pub(crate) fn h2<K: Hash>(&self, key: &K) -> u64 {
        let mut hasher = FoldHasher::with_seed(self.seed2);
        key.hash(&mut hasher);
        hasher.finish()
    }

    /// Derives a nonzero fingerprint from an already-computed `H1(k)`. Zero
    /// is reserved to mean "slot empty", so bit 0 is forced on.
    #[inline]
    pub(crate) fn fingerprint(h1: u64) -> u32 {
        (h1 as u32) | 1
    }
}
