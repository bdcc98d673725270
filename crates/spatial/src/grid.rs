use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, PoisonError, Weak};

use glam::Vec3;
use tracing::{debug, trace};

use tickforge_common::{CellKey, DescriptorHandle, EntityId, TickFn, Tickable};

use crate::cell::GridLayout;

/// One grid resident. The grid never owns the entity: `host` is weak, and
/// an entry whose host has dropped is pruned on the next refresh.
pub struct GridEntry {
    pub id: EntityId,
    pub handle: DescriptorHandle,
    pub host: Weak<dyn Tickable>,
    pub tick_fn: TickFn,
    pub position: Vec3,
}

#[derive(Default)]
struct GridInner {
    cells: HashMap<CellKey, Vec<GridEntry>>,
    members: BTreeMap<EntityId, CellKey>,
}

/// Cell-bucketed index of spatial-aware entities.
///
/// Interior mutability lets the scheduler hand out `&SpatialGrid` for
/// queries while ticking; all bucket state sits behind one mutex.
pub struct SpatialGrid {
    layout: GridLayout,
    inner: Mutex<GridInner>,
}

impl SpatialGrid {
    pub fn new(layout: GridLayout) -> Self {
        Self {
            layout,
            inner: Mutex::new(GridInner::default()),
        }
    }

    pub fn layout(&self) -> GridLayout {
        self.layout
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, GridInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert an entity under the cell its position hashes to. An entity
    /// already resident moves to the new cell instead of duplicating.
    pub fn add_entity(&self, entry: GridEntry) -> CellKey {
        let key = self.layout.cell_key(entry.position);
        let mut inner = self.lock();
        if let Some(old) = inner.members.insert(entry.id, key) {
            Self::take_from_bucket(&mut inner, old, entry.id);
        }
        trace!(id = %entry.id.0, cell = key.0, "grid insert");
        inner.cells.entry(key).or_default().push(entry);
        key
    }

    /// Remove an entity. Returns false when it was not resident.
    pub fn remove_entity(&self, id: EntityId) -> bool {
        let mut inner = self.lock();
        let Some(key) = inner.members.remove(&id) else {
            return false;
        };
        Self::take_from_bucket(&mut inner, key, id);
        true
    }

    fn take_from_bucket(inner: &mut GridInner, key: CellKey, id: EntityId) {
        if let Some(bucket) = inner.cells.get_mut(&key) {
            bucket.retain(|e| e.id != id);
            if bucket.is_empty() {
                inner.cells.remove(&key);
            }
        }
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.lock().members.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.lock().members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().members.is_empty()
    }

    /// Tick every live resident, bucket by bucket. The snapshot is taken
    /// under the lock but callables run outside it, so a tick may query the
    /// grid without deadlocking. Returns (ticked, skipped).
    pub fn tick_all(&self, dt: f32) -> (usize, usize) {
        let mut live: Vec<TickFn> = Vec::new();
        let mut skipped = 0;
        {
            let inner = self.lock();
            for bucket in inner.cells.values() {
                for entry in bucket {
                    match entry.host.upgrade() {
                        Some(host) if host.is_valid() && host.is_active() => {
                            live.push(entry.tick_fn.clone());
                        }
                        _ => skipped += 1,
                    }
                }
            }
        }
        for tick_fn in &live {
            tick_fn(dt);
        }
        (live.len(), skipped)
    }

    /// Ids of live residents within `radius` of `position`. Candidates come
    /// from a cell cube sized to cover the radius, then pass an exact
    /// distance check against the host's current position.
    pub fn get_nearby(&self, position: Vec3, radius: f32) -> Vec<EntityId> {
        let center = self.layout.cell_key(position);
        let half = (radius / self.layout.cell_size).ceil().max(1.0) as u32;
        let inner = self.lock();
        let mut found = Vec::new();
        for key in self.layout.cell_cube(center, half) {
            let Some(bucket) = inner.cells.get(&key) else {
                continue;
            };
            for entry in bucket {
                let Some(host) = entry.host.upgrade() else {
                    continue;
                };
                if !host.is_valid() {
                    continue;
                }
                let at = host.position().unwrap_or(entry.position);
                if at.distance(position) <= radius {
                    found.push(entry.id);
                }
            }
        }
        found
    }

    /// Re-derive every resident's cell from its host's current position,
    /// moving entries whose cell changed and pruning entries whose host is
    /// gone. Returns the batch handle and new cell of each moved entry so
    /// cached descriptor state can be updated.
    pub fn refresh_memberships(&self) -> Vec<(DescriptorHandle, CellKey)> {
        let mut inner = self.lock();
        let mut moves: Vec<(EntityId, CellKey, CellKey)> = Vec::new();
        let mut dead: Vec<(EntityId, CellKey)> = Vec::new();

        for (&id, &key) in &inner.members {
            let Some(bucket) = inner.cells.get(&key) else {
                continue;
            };
            let Some(entry) = bucket.iter().find(|e| e.id == id) else {
                continue;
            };
            match entry.host.upgrade() {
                Some(host) if host.is_valid() => {
                    let at = host.position().unwrap_or(entry.position);
                    let fresh = self.layout.cell_key(at);
                    if fresh != key {
                        moves.push((id, key, fresh));
                    }
                }
                _ => dead.push((id, key)),
            }
        }

        for (id, key) in dead {
            inner.members.remove(&id);
            Self::take_from_bucket(&mut inner, key, id);
        }

        let mut moved = Vec::with_capacity(moves.len());
        for (id, old, fresh) in moves {
            let Some(bucket) = inner.cells.get_mut(&old) else {
                continue;
            };
            let Some(at) = bucket.iter().position(|e| e.id == id) else {
                continue;
            };
            let mut entry = bucket.remove(at);
            if bucket.is_empty() {
                inner.cells.remove(&old);
            }
            if let Some(host) = entry.host.upgrade() {
                if let Some(position) = host.position() {
                    entry.position = position;
                }
            }
            let handle = entry.handle;
            inner.members.insert(id, fresh);
            inner.cells.entry(fresh).or_default().push(entry);
            moved.push((handle, fresh));
        }
        if !moved.is_empty() {
            debug!(moved = moved.len(), "grid memberships refreshed");
        }
        moved
    }
}
