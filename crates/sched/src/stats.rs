use serde::{Deserialize, Serialize};

/// Aggregate scheduler statistics, recomputed on demand from live state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickStats {
    /// Current frame counter value.
    pub frame: u64,
    /// Descriptors held across all batches, duplicates included.
    pub registered_entities: usize,
    /// Entities dispatched during the most recent frame.
    pub active_last_frame: usize,
    /// Occupied slots filtered out during the most recent frame.
    pub skipped_last_frame: usize,
    /// Monotonic count of filtered-out slot visits across all frames; a
    /// rising value is the signal that dead or inactive entities are being
    /// carried through the tick path.
    pub cache_misses: u64,
    pub batches: usize,
    pub parallel_batches: usize,
    pub spatial_batches: usize,
    /// Entities resident in the spatial grid.
    pub grid_residents: usize,
    /// Wall time accumulated across all `tick` calls so far.
    pub total_tick_time_ms: f64,
    pub optimizer_runs: u64,
}

/// Per-batch timing snapshot for introspection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchTiming {
    pub tag: String,
    pub entities: usize,
    pub active_last_tick: usize,
    pub avg_tick_ns: f64,
    pub parallel: bool,
    pub low_priority: bool,
}
