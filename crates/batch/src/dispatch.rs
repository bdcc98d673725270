//! Batch dispatch callables and the tag-to-dispatcher registry.
//!
//! Classification drives dispatch through a callback table instead of
//! inheritance: every batch is bound to a `BatchDispatchFn` when it is
//! created, and specializations are expressed by swapping that callable.

use std::collections::BTreeMap;
use std::sync::Arc;

use glam::Vec3;
use tickforge_common::{EntityCategory, EntityId, TickFn, TypeTag};

/// A snapshot entry handed to a dispatch callable: one enabled, valid
/// entity filtered out of a batch for this frame's tick.
#[derive(Clone)]
pub struct ActiveEntity {
    pub id: EntityId,
    pub position: Vec3,
    pub tick_fn: TickFn,
}

/// Callable that ticks a filtered batch snapshot.
pub type BatchDispatchFn = Arc<dyn Fn(&[ActiveEntity], f32) + Send + Sync>;

/// Errors from dispatcher binding.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("a dispatcher is already bound for tag `{0}`")]
    TagAlreadyBound(TypeTag),
}

/// Generic sequential dispatcher: invoke every entity's bound callable in
/// snapshot order.
pub fn sequential_dispatcher() -> BatchDispatchFn {
    Arc::new(|entities, dt| {
        for entity in entities {
            (entity.tick_fn)(dt);
        }
    })
}

/// Dispatcher for categories that mutate shared transform state. Runs
/// strictly sequentially on the driving thread; the batch additionally has
/// its parallel eligibility stripped wherever this is bound.
pub fn movement_dispatcher() -> BatchDispatchFn {
    Arc::new(|entities, dt| {
        for entity in entities {
            (entity.tick_fn)(dt);
        }
    })
}

/// Dispatcher for perception-style entities. Ticks sequentially; batches
/// bound to it are tagged spatial-aware so members also land in the grid,
/// where overlapping sense regions are processed bucket by bucket.
pub fn perception_dispatcher() -> BatchDispatchFn {
    Arc::new(|entities, dt| {
        for entity in entities {
            (entity.tick_fn)(dt);
        }
    })
}

/// Maps classification tags to bespoke dispatch callables, falling back to
/// the category specializations and then the generic sequential dispatcher.
#[derive(Default)]
pub struct DispatchRegistry {
    overrides: BTreeMap<TypeTag, BatchDispatchFn>,
}

impl DispatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a bespoke dispatcher for a tag. Rebinding is an error; swap
    /// semantics belong to the optimizer, not external callers.
    pub fn bind(&mut self, tag: TypeTag, dispatcher: BatchDispatchFn) -> Result<(), RegistryError> {
        if self.overrides.contains_key(&tag) {
            return Err(RegistryError::TagAlreadyBound(tag));
        }
        self.overrides.insert(tag, dispatcher);
        Ok(())
    }

    /// Resolve the dispatcher for a classification.
    pub fn dispatcher_for(&self, tag: &TypeTag, category: EntityCategory) -> BatchDispatchFn {
        if let Some(bound) = self.overrides.get(tag) {
            return bound.clone();
        }
        match category {
            EntityCategory::Movement | EntityCategory::Physics => movement_dispatcher(),
            EntityCategory::Perception => perception_dispatcher(),
            EntityCategory::General => sequential_dispatcher(),
        }
    }

    pub fn has_override(&self, tag: &TypeTag) -> bool {
        self.overrides.contains_key(tag)
    }
}
