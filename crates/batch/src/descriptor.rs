use std::sync::Arc;

use glam::Vec3;
use tickforge_common::{CellKey, EntityId, TickFn, Tickable};

/// Per-entity record owned by a batch slot.
///
/// Holds a shared handle to the external tickable plus cached state: the
/// position is valid as of the last refresh, and the cell key as of the
/// last grid insertion. Neither is guaranteed current mid-frame.
#[derive(Clone)]
pub struct EntityDescriptor {
    pub id: EntityId,
    pub handle: Arc<dyn Tickable>,
    /// Bound update callable, built at registration flush.
    pub tick_fn: TickFn,
    /// Cached world position.
    pub position: Vec3,
    /// Spatial bucket the descriptor was last inserted under, if any.
    pub cell: Option<CellKey>,
    /// Tick priority, 0-255.
    pub priority: u8,
    /// Derived from host liveness + active state at the last refresh.
    pub enabled: bool,
}

impl EntityDescriptor {
    /// Whether this descriptor should be ticked right now.
    pub fn is_tickable(&self) -> bool {
        self.enabled && self.handle.is_valid()
    }

    /// Euclidean distance between two descriptors' cached positions.
    pub fn distance(&self, other: &EntityDescriptor) -> f32 {
        self.position.distance(other.position)
    }
}

impl std::fmt::Debug for EntityDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityDescriptor")
            .field("id", &self.id)
            .field("position", &self.position)
            .field("cell", &self.cell)
            .field("priority", &self.priority)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}
