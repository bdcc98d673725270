use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a tickable entity. Supplied by the host object
/// model; the scheduler never mints ids on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

/// Stable classification key for batching. Entities sharing a tag are
/// ticked together in one batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeTag(Arc<str>);

impl TypeTag {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// A tag with no name cannot be resolved to a batch.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Coarse behavioral category of an entity, used for dispatch
/// specialization and the thread-safety denylist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityCategory {
    General,
    /// Updates that move the entity through the world (mutate shared
    /// transform state). Never ticked in parallel.
    Movement,
    /// Sense-the-surroundings updates; benefit from spatial grouping.
    Perception,
    /// Physics-coupled updates; spatial, and never ticked in parallel.
    Physics,
}

impl EntityCategory {
    /// Categories whose updates touch shared transform/movement state and
    /// must stay on the driving thread.
    pub fn is_thread_unsafe(self) -> bool {
        matches!(self, Self::Movement | Self::Physics)
    }

    /// Categories that are inherently location-bound.
    pub fn is_inherently_spatial(self) -> bool {
        matches!(self, Self::Perception | Self::Physics)
    }
}

/// Fixed per-frame execution phases, ticked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TickPhase {
    PrePhysics,
    StartPhysics,
    DuringPhysics,
    EndPhysics,
    PostPhysics,
    PostUpdate,
    EndOfFrame,
}

impl TickPhase {
    /// All phases in execution order.
    pub const ALL: [TickPhase; 7] = [
        TickPhase::PrePhysics,
        TickPhase::StartPhysics,
        TickPhase::DuringPhysics,
        TickPhase::EndPhysics,
        TickPhase::PostPhysics,
        TickPhase::PostUpdate,
        TickPhase::EndOfFrame,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

bitflags::bitflags! {
    /// Dispatch behavior flags carried by a batch.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct BatchFlags: u8 {
        /// Eligible for sharded parallel ticking.
        const PARALLEL = 1 << 0;
        /// Frequently accessed data; keep tick order cache-friendly.
        const CACHE_HOT = 1 << 1;
        /// Enablement re-derived from the host every frame.
        const CONDITIONAL = 1 << 2;
        /// Ticked before its phase peers.
        const HIGH_PRIORITY = 1 << 3;
        /// Ticked on throttle frames only.
        const LOW_PRIORITY = 1 << 4;
        /// Also a member of the spatial grid.
        const SPATIAL_AWARE = 1 << 5;
        /// Dispatch runs under the batch's structural lock.
        const STATE_DEPENDENT = 1 << 6;
    }
}

/// Index of a batch inside the scheduler context. Batches are never
/// removed, so ids stay valid for the scheduler's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BatchId(pub u32);

/// Stable address of a descriptor: batch id plus arena slot. Slots are
/// never reordered (tick order is a separate permutation), so a handle
/// stays valid until its descriptor is unregistered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorHandle {
    pub batch: BatchId,
    pub slot: usize,
}

/// Packed spatial cell key. The packing layout (per-axis bit widths) is
/// owned by the grid; the raw value is opaque outside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey(pub u32);

/// Per-entity update callable, bound at registration time.
pub type TickFn = Arc<dyn Fn(f32) + Send + Sync>;
