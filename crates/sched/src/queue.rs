use std::sync::{Arc, Mutex, PoisonError};

use tracing::trace;

use tickforge_common::{BatchFlags, EntityId, Tickable};

/// A registration waiting to be materialized at the next flush.
#[derive(Clone)]
pub struct RegistrationRequest {
    pub entity: Arc<dyn Tickable>,
    pub flags: BatchFlags,
    pub priority: u8,
}

#[derive(Default)]
struct QueueInner {
    registrations: Vec<RegistrationRequest>,
    unregistrations: Vec<EntityId>,
}

/// Handle for queueing membership changes from any thread.
///
/// Cheap to clone; all clones feed the same buffers. Registrations and
/// unregistrations are held apart and flushed registrations-first, so
/// within one frame an unregister wins over a register of the same entity
/// no matter which was queued first.
#[derive(Clone, Default)]
pub struct SchedulerQueue {
    inner: Arc<Mutex<QueueInner>>,
}

impl SchedulerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, QueueInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn register(&self, entity: Arc<dyn Tickable>, flags: BatchFlags, priority: u8) {
        trace!(id = %entity.id().0, ?flags, "registration queued");
        self.lock().registrations.push(RegistrationRequest {
            entity,
            flags,
            priority,
        });
    }

    pub fn register_many<I>(&self, requests: I)
    where
        I: IntoIterator<Item = RegistrationRequest>,
    {
        self.lock().registrations.extend(requests);
    }

    pub fn unregister(&self, id: EntityId) {
        trace!(id = %id.0, "unregistration queued");
        self.lock().unregistrations.push(id);
    }

    /// Take every pending op, leaving the queue empty. Registrations come
    /// first; the flush applies them before any unregistration.
    pub fn drain(&self) -> (Vec<RegistrationRequest>, Vec<EntityId>) {
        let mut inner = self.lock();
        (
            std::mem::take(&mut inner.registrations),
            std::mem::take(&mut inner.unregistrations),
        )
    }

    pub fn pending(&self) -> usize {
        let inner = self.lock();
        inner.registrations.len() + inner.unregistrations.len()
    }
}
