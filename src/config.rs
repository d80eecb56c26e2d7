//! Tunable constants for a [`crate::CuckooMap`].
//!
//! `B` (slots per bucket) is a true compile-time constant of the subtable
//! layout and is not exposed here; the kick budget and overflow growth
//! factor are the two knobs the design calls out as "compile-time/config
//! constants of the subtable" that are still worth varying per map.

/// Slots per bucket. Small and fixed, per the design (4-8 is typical).
pub(crate) const SLOTS_PER_BUCKET: usize = 8;

/// Default maximum number of evictions a single insert may perform in one
/// subtable before signalling overflow.
pub const DEFAULT_KICK_BUDGET: usize = 32;

/// Default capacity multiplier for each new overflow layer (Invariant L2:
/// |T_{i+1}| = 4 * |T_i|).
pub const DEFAULT_GROWTH_FACTOR: usize = 4;

/// Configuration for a [`crate::CuckooMap`].
#[derive(Clone, Copy, Debug)]
pub struct CuckooConfig {
    /// Maximum evictions per insert attempt in a single subtable before
    /// that attempt is abandoned as overflow.
    pub kick_budget: usize,
    /// How many times larger than the prior layer's bucket count a newly
    /// appended overflow layer is.
    pub growth_factor: usize,
}

impl Default for CuckooConfig {
    fn default() -> Self {
        CuckooConfig {
            kick_budget: DEFAULT_KICK_BUDGET,
            growth_factor: DEFAULT_GROWTH_FACTOR,
        }
    }
}
