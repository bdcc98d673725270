use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use rayon::prelude::*;
use tracing::trace;

use tickforge_common::{BatchFlags, EntityCategory, EntityId, TickPhase, TypeTag};

use crate::descriptor::EntityDescriptor;
use crate::dispatch::{ActiveEntity, BatchDispatchFn};

/// Result of ticking one batch for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// Entities actually dispatched this frame.
    pub active: usize,
    /// Occupied slots filtered out (disabled or invalid host).
    pub skipped: usize,
}

/// A group of same-classification entities ticked together.
///
/// Descriptors live in a slot arena: a slot index is stable for the
/// descriptor's lifetime, and the tick order is a separate permutation over
/// occupied slots so locality sorting never invalidates handles held
/// elsewhere. Batches are deliberately not `Clone`; each owns its dispatch
/// binding and (for state-dependent batches) a serialization lock, and
/// duplicating either would split the guarantees they carry.
pub struct TypeBatch {
    pub tag: TypeTag,
    pub category: EntityCategory,
    pub phase: TickPhase,
    pub flags: BatchFlags,
    /// Exponential rolling average of the per-entity tick cost.
    pub avg_tick_ns: f64,
    /// Active entity count from the most recent tick.
    pub last_tick_count: usize,
    /// When set, the tick order is re-sorted for spatial locality each frame.
    pub sort_by_locality: bool,
    slots: Vec<Option<EntityDescriptor>>,
    order: Vec<usize>,
    free: Vec<usize>,
    dispatch: Option<BatchDispatchFn>,
    // Present only for state-dependent batches: serializes their tick
    // against external mutation of the shared state they read.
    state_lock: Option<Mutex<()>>,
}

impl TypeBatch {
    pub fn new(tag: TypeTag, category: EntityCategory, phase: TickPhase, flags: BatchFlags) -> Self {
        let state_lock = flags
            .contains(BatchFlags::STATE_DEPENDENT)
            .then(|| Mutex::new(()));
        Self {
            tag,
            category,
            phase,
            flags,
            avg_tick_ns: 0.0,
            last_tick_count: 0,
            sort_by_locality: flags.contains(BatchFlags::CACHE_HOT),
            slots: Vec::new(),
            order: Vec::new(),
            free: Vec::new(),
            dispatch: None,
            state_lock,
        }
    }

    /// Bind or swap the dispatch callable.
    pub fn set_dispatch(&mut self, dispatch: BatchDispatchFn) {
        self.dispatch = Some(dispatch);
    }

    pub fn has_dispatch(&self) -> bool {
        self.dispatch.is_some()
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Insert a descriptor, reusing a freed slot when one exists. Returns
    /// the stable slot index.
    pub fn insert(&mut self, descriptor: EntityDescriptor) -> usize {
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(descriptor);
                slot
            }
            None => {
                self.slots.push(Some(descriptor));
                self.slots.len() - 1
            }
        };
        self.order.push(slot);
        slot
    }

    /// Remove the descriptor at `slot`, if occupied.
    pub fn remove_slot(&mut self, slot: usize) -> Option<EntityDescriptor> {
        let descriptor = self.slots.get_mut(slot)?.take()?;
        self.order.retain(|&s| s != slot);
        self.free.push(slot);
        Some(descriptor)
    }

    /// Slot index of the first descriptor with this id, in tick order.
    /// Duplicate registrations of one id are kept distinct, so removal by
    /// id takes them out one at a time.
    pub fn find_slot(&self, id: EntityId) -> Option<usize> {
        self.order
            .iter()
            .copied()
            .find(|&slot| self.slots[slot].as_ref().is_some_and(|d| d.id == id))
    }

    pub fn descriptor(&self, slot: usize) -> Option<&EntityDescriptor> {
        self.slots.get(slot)?.as_ref()
    }

    pub fn descriptor_mut(&mut self, slot: usize) -> Option<&mut EntityDescriptor> {
        self.slots.get_mut(slot)?.as_mut()
    }

    /// Occupied slots in tick order.
    pub fn slots_occupied(&self) -> impl Iterator<Item = (usize, &EntityDescriptor)> {
        self.order
            .iter()
            .filter_map(|&slot| self.slots[slot].as_ref().map(|d| (slot, d)))
    }

    /// Re-derive each descriptor's enabled state and cached position from
    /// its host. Returns how many descriptors came out enabled.
    pub fn refresh_enabled(&mut self) -> usize {
        let mut enabled = 0;
        for slot in &self.order {
            if let Some(descriptor) = self.slots[*slot].as_mut() {
                let alive = descriptor.handle.is_valid() && descriptor.handle.is_active();
                descriptor.enabled = alive;
                if alive {
                    enabled += 1;
                    if let Some(position) = descriptor.handle.position() {
                        descriptor.position = position;
                    }
                }
            }
        }
        enabled
    }

    /// Whether this batch is allowed to fan its snapshot out across threads.
    pub fn can_tick_parallel(&self) -> bool {
        self.flags.contains(BatchFlags::PARALLEL) && !self.category.is_thread_unsafe()
    }

    /// Tick every currently tickable descriptor sequentially through the
    /// bound dispatch callable. No callable means a no-op tick.
    pub fn tick(&mut self, dt: f32) -> TickOutcome {
        let snapshot = self.snapshot();
        let skipped = self.order.len() - snapshot.len();
        let Some(dispatch) = self.dispatch.clone() else {
            self.last_tick_count = 0;
            return TickOutcome {
                active: 0,
                skipped: self.order.len(),
            };
        };
        if snapshot.is_empty() {
            self.last_tick_count = 0;
            return TickOutcome { active: 0, skipped };
        }

        let started = Instant::now();
        {
            let _guard = self.state_guard();
            dispatch(&snapshot, dt);
        }
        self.record_timing(started, snapshot.len());

        TickOutcome {
            active: snapshot.len(),
            skipped,
        }
    }

    /// Tick the snapshot in parallel shards. Falls back to the sequential
    /// path when the batch is not parallel-eligible. The shard join is a
    /// hard barrier: every entity has ticked before this returns.
    pub fn tick_parallel(&mut self, dt: f32) -> TickOutcome {
        if !self.can_tick_parallel() {
            return self.tick(dt);
        }
        let snapshot = self.snapshot();
        let skipped = self.order.len() - snapshot.len();
        if snapshot.is_empty() {
            self.last_tick_count = 0;
            return TickOutcome { active: 0, skipped };
        }

        let threads = rayon::current_num_threads().max(1);
        let shard = snapshot.len().div_ceil(threads);
        trace!(tag = %self.tag, entities = snapshot.len(), shard, "parallel tick");

        let started = Instant::now();
        {
            let _guard = self.state_guard();
            snapshot.par_chunks(shard).for_each(|chunk| {
                for entity in chunk {
                    (entity.tick_fn)(dt);
                }
            });
        }
        self.record_timing(started, snapshot.len());

        TickOutcome {
            active: snapshot.len(),
            skipped,
        }
    }

    /// Reorder the tick permutation so spatial neighbors tick back to back.
    ///
    /// Greedy nearest-neighbor walk over the enabled descriptors, starting
    /// from the current head; disabled descriptors keep their relative
    /// order at the tail. Deterministic, so re-sorting an already sorted
    /// batch leaves it unchanged.
    pub fn sort_for_cache_locality(&mut self) {
        let mut enabled: Vec<usize> = Vec::new();
        let mut disabled: Vec<usize> = Vec::new();
        for &slot in &self.order {
            match self.slots[slot].as_ref() {
                Some(d) if d.is_tickable() => enabled.push(slot),
                _ => disabled.push(slot),
            }
        }
        if enabled.len() > 1 {
            let mut sorted = Vec::with_capacity(enabled.len());
            let mut remaining = enabled;
            sorted.push(remaining.remove(0));
            while !remaining.is_empty() {
                let here = self.slots[*sorted.last().unwrap_or(&0)]
                    .as_ref()
                    .map(|d| d.position)
                    .unwrap_or_default();
                let mut best = 0;
                let mut best_dist = f32::INFINITY;
                for (i, &slot) in remaining.iter().enumerate() {
                    if let Some(d) = self.slots[slot].as_ref() {
                        let dist = here.distance(d.position);
                        if dist < best_dist {
                            best_dist = dist;
                            best = i;
                        }
                    }
                }
                sorted.push(remaining.remove(best));
            }
            enabled = sorted;
        }
        enabled.extend(disabled);
        self.order = enabled;
    }

    fn snapshot(&self) -> Vec<ActiveEntity> {
        self.order
            .iter()
            .filter_map(|&slot| self.slots[slot].as_ref())
            .filter(|d| d.is_tickable())
            .map(|d| ActiveEntity {
                id: d.id,
                position: d.position,
                tick_fn: d.tick_fn.clone(),
            })
            .collect()
    }

    fn state_guard(&self) -> Option<std::sync::MutexGuard<'_, ()>> {
        // A poisoned lock only means a panicking tick elsewhere; the guard
        // protects ordering, not data, so recover and carry on.
        self.state_lock
            .as_ref()
            .map(|m| m.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn record_timing(&mut self, started: Instant, ticked: usize) {
        self.last_tick_count = ticked;
        if ticked == 0 {
            return;
        }
        let per_entity_ns = started.elapsed().as_nanos() as f64 / ticked as f64;
        if self.avg_tick_ns == 0.0 {
            self.avg_tick_ns = per_entity_ns;
        } else {
            self.avg_tick_ns = self.avg_tick_ns * 0.9 + per_entity_ns * 0.1;
        }
    }
}

impl std::fmt::Debug for TypeBatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeBatch")
            .field("tag", &self.tag)
            .field("category", &self.category)
            .field("phase", &self.phase)
            .field("flags", &self.flags)
            .field("len", &self.len())
            .field("avg_tick_ns", &self.avg_tick_ns)
            .finish_non_exhaustive()
    }
}
