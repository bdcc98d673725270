use serde::{Deserialize, Serialize};
use tickforge_spatial::GridLayout;

/// Scheduler tuning knobs.
///
/// Defaults match a 60 Hz frame driver with populations in the low
/// thousands; every threshold the optimizer consults lives here so tests
/// can pin them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Spatial hash layout for the grid.
    pub grid: GridLayout,
    /// Frame counter wraps back to zero at this value.
    pub frame_counter_range: u64,
    /// Low-priority batches tick once every this many frames.
    pub low_priority_interval: u64,
    /// The optimizer runs every this many frames.
    pub optimize_interval: u64,
    /// Minimum active count before a parallel-eligible batch actually
    /// takes the sharded path.
    pub parallel_entity_threshold: usize,
    /// Average per-entity cost above which a batch is promoted to
    /// parallel-eligible.
    pub parallel_promote_avg_ns: f64,
    /// Active count a batch must exceed to be promoted to parallel.
    pub parallel_promote_min_entities: usize,
    /// Below this member count, locality sorting is not worth its cost.
    pub locality_min_entities: usize,
    /// Average per-entity cost below which a batch is demoted to
    /// low-priority cadence.
    pub low_priority_avg_ns: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            grid: GridLayout::default(),
            frame_counter_range: 1000,
            low_priority_interval: 3,
            optimize_interval: 300,
            parallel_entity_threshold: 10,
            parallel_promote_avg_ns: 1000.0,
            parallel_promote_min_entities: 10,
            locality_min_entities: 5,
            low_priority_avg_ns: 100.0,
        }
    }
}
