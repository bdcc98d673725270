use glam::Vec3;

use crate::types::{EntityCategory, EntityId, TickPhase, TypeTag};

/// The capability the scheduler requires of every registered entity.
///
/// The scheduler holds entities as `Arc<dyn Tickable>` and never assumes
/// anything about them beyond this trait: liveness, an update call, and a
/// stable classification key, plus optional position and active state.
///
/// `tick` takes `&self`; entities that mutate themselves do so behind their
/// own interior mutability. Shards of a parallel batch tick disjoint
/// entities, so no cross-entity synchronization is imposed here.
pub trait Tickable: Send + Sync {
    /// Host-assigned identity, used to match unregistration requests.
    fn id(&self) -> EntityId;

    /// Stable classification key; entities with equal tags share a batch.
    fn type_tag(&self) -> TypeTag;

    /// Liveness check. Entities reporting `false` are skipped everywhere
    /// and dropped at registration flush.
    fn is_valid(&self) -> bool;

    /// The per-frame update.
    fn tick(&self, dt: f32);

    /// Current world position, if the entity has one.
    fn position(&self) -> Option<Vec3> {
        None
    }

    /// Domain-specific active state; combined with `is_valid` into the
    /// descriptor's enabled flag.
    fn is_active(&self) -> bool {
        true
    }

    /// Behavioral category, driving dispatch specialization.
    fn category(&self) -> EntityCategory {
        EntityCategory::General
    }

    /// Execution phase the entity's batch belongs to.
    fn phase(&self) -> TickPhase {
        TickPhase::PrePhysics
    }
}
