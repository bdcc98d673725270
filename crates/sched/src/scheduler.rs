use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use glam::Vec3;
use tracing::{debug, info_span, trace, warn};

use tickforge_batch::{DispatchRegistry, EntityDescriptor, RegistryError, TypeBatch};
use tickforge_batch::dispatch::BatchDispatchFn;
use tickforge_common::{
    BatchFlags, BatchId, DescriptorHandle, EntityCategory, EntityId, TickFn, TickPhase, TypeTag,
    Tickable,
};
use tickforge_spatial::{GridEntry, SpatialGrid};

use crate::config::SchedulerConfig;
use crate::priority;
use crate::queue::{RegistrationRequest, SchedulerQueue};
use crate::stats::{BatchTiming, TickStats};

/// Default descriptor priority per flag set, for callers that do not pick
/// one explicitly.
fn default_priority(flags: BatchFlags) -> u8 {
    if flags.contains(BatchFlags::HIGH_PRIORITY) {
        200
    } else if flags.contains(BatchFlags::LOW_PRIORITY) {
        50
    } else {
        100
    }
}

/// The scheduler context: owns every batch, the spatial grid, the dispatch
/// registry and the deferred queue.
///
/// One thread drives [`tick`](Self::tick); other threads only ever touch
/// the cloneable [`SchedulerQueue`]. Batches are addressed by `BatchId`
/// (their index here) and are never removed, so ids stay valid for the
/// scheduler's lifetime.
pub struct TickScheduler {
    config: SchedulerConfig,
    queue: SchedulerQueue,
    registry: DispatchRegistry,
    pub(crate) batches: Vec<TypeBatch>,
    by_tag: BTreeMap<TypeTag, BatchId>,
    phases: [Vec<BatchId>; TickPhase::ALL.len()],
    pub(crate) grid: SpatialGrid,
    frame: u64,
    debug_mode: bool,
    total_tick_time_ms: f64,
    pub(crate) optimizer_runs: u64,
    active_last_frame: usize,
    skipped_last_frame: usize,
    cache_misses: u64,
}

impl TickScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        let grid = SpatialGrid::new(config.grid);
        Self {
            config,
            queue: SchedulerQueue::new(),
            registry: DispatchRegistry::new(),
            batches: Vec::new(),
            by_tag: BTreeMap::new(),
            phases: Default::default(),
            grid,
            frame: 0,
            debug_mode: false,
            total_tick_time_ms: 0.0,
            optimizer_runs: 0,
            active_last_frame: 0,
            skipped_last_frame: 0,
            cache_misses: 0,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Handle for queueing registrations from other threads.
    pub fn queue(&self) -> SchedulerQueue {
        self.queue.clone()
    }

    /// Queue an entity for registration at the next frame boundary.
    pub fn register(&self, entity: Arc<dyn Tickable>, flags: BatchFlags) {
        let priority = default_priority(flags);
        self.queue.register(entity, flags, priority);
    }

    pub fn register_with_priority(
        &self,
        entity: Arc<dyn Tickable>,
        flags: BatchFlags,
        priority: u8,
    ) {
        self.queue.register(entity, flags, priority);
    }

    /// Queue an entity for removal at the next frame boundary.
    pub fn unregister(&self, id: EntityId) {
        self.queue.unregister(id);
    }

    /// Bind a bespoke dispatch callable for a classification tag. Takes
    /// effect for batches created after the call.
    pub fn bind_dispatcher(
        &mut self,
        tag: TypeTag,
        dispatcher: BatchDispatchFn,
    ) -> Result<(), RegistryError> {
        self.registry.bind(tag, dispatcher)
    }

    pub fn set_debug_mode(&mut self, enabled: bool) {
        self.debug_mode = enabled;
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Drive one frame: flush deferred ops, refresh enablement, run every
    /// phase in order, tick the grid, and periodically optimize.
    pub fn tick(&mut self, dt: f32) {
        let _span = info_span!("tick", frame = self.frame).entered();
        let started = Instant::now();
        if self.debug_mode {
            debug!(
                dt,
                batches = self.batches.len(),
                pending = self.queue.pending(),
                "frame begin"
            );
        }

        self.flush_deferred();
        self.refresh_enablement();

        let mut active = 0;
        let mut skipped = 0;
        for phase in TickPhase::ALL {
            let mut order = self.phases[phase.index()].clone();
            order.sort_by_key(|id| priority::phase_order_key(&self.batches[id.0 as usize]));
            for id in order {
                let config = &self.config;
                let batch = &mut self.batches[id.0 as usize];
                if batch.is_empty() {
                    continue;
                }
                if priority::throttled_out(batch.flags, self.frame, config.low_priority_interval) {
                    continue;
                }
                if batch.sort_by_locality && batch.len() >= config.locality_min_entities {
                    batch.sort_for_cache_locality();
                }
                let outcome = if batch.can_tick_parallel()
                    && batch.len() > config.parallel_entity_threshold
                {
                    batch.tick_parallel(dt)
                } else {
                    batch.tick(dt)
                };
                active += outcome.active;
                skipped += outcome.skipped;
            }
        }

        for (handle, cell) in self.grid.refresh_memberships() {
            if let Some(descriptor) = self
                .batches
                .get_mut(handle.batch.0 as usize)
                .and_then(|b| b.descriptor_mut(handle.slot))
            {
                descriptor.cell = Some(cell);
            }
        }
        if !self.grid.is_empty() {
            let (grid_active, grid_skipped) = self.grid.tick_all(dt);
            active += grid_active;
            skipped += grid_skipped;
        }

        if self.frame != 0 && self.frame % self.config.optimize_interval == 0 {
            self.optimize();
        }

        self.active_last_frame = active;
        self.skipped_last_frame = skipped;
        self.cache_misses += skipped as u64;
        self.total_tick_time_ms += started.elapsed().as_secs_f64() * 1000.0;
        self.frame = (self.frame + 1) % self.config.frame_counter_range;
    }

    /// Materialize every queued registration, then every unregistration.
    /// The fixed order makes an unregister win over a same-frame register
    /// of the same entity regardless of queueing order.
    fn flush_deferred(&mut self) {
        let (registrations, unregistrations) = self.queue.drain();
        for request in registrations {
            self.apply_register(request);
        }
        for id in unregistrations {
            self.apply_unregister(id);
        }
    }

    fn apply_register(&mut self, request: RegistrationRequest) {
        let entity = request.entity;
        if !entity.is_valid() {
            debug!(id = %entity.id().0, "dropping registration of dead entity");
            return;
        }
        let tag = entity.type_tag();
        if tag.is_empty() {
            warn!(id = %entity.id().0, "dropping registration with empty tag");
            return;
        }
        let category = entity.category();
        let mut flags = request.flags;
        if flags.contains(BatchFlags::PARALLEL) && category.is_thread_unsafe() {
            flags.remove(BatchFlags::PARALLEL);
            debug!(tag = %tag, ?category, "parallel flag stripped, category is not thread-safe");
        }

        let batch_id = self.batch_for(&tag, category, entity.phase(), flags);
        let id = entity.id();
        let position = entity.position().unwrap_or(Vec3::ZERO);
        let weak = Arc::downgrade(&entity);
        let tick_fn: TickFn = Arc::new(move |dt| {
            if let Some(host) = weak.upgrade() {
                if host.is_valid() && host.is_active() {
                    host.tick(dt);
                }
            }
        });

        let descriptor = EntityDescriptor {
            id,
            handle: entity.clone(),
            tick_fn: tick_fn.clone(),
            position,
            cell: None,
            priority: request.priority,
            enabled: true,
        };
        let batch = &mut self.batches[batch_id.0 as usize];
        let slot = batch.insert(descriptor);
        // Join the grid when either side asks: the registration itself, or
        // a batch the optimizer has already made spatial.
        let spatial = flags.contains(BatchFlags::SPATIAL_AWARE)
            || batch.flags.contains(BatchFlags::SPATIAL_AWARE);

        if spatial {
            let key = self.grid.add_entity(GridEntry {
                id,
                handle: DescriptorHandle {
                    batch: batch_id,
                    slot,
                },
                host: Arc::downgrade(&entity),
                tick_fn,
                position,
            });
            if let Some(descriptor) = self.batches[batch_id.0 as usize].descriptor_mut(slot) {
                descriptor.cell = Some(key);
            }
        }
        trace!(id = %id.0, tag = %tag, slot, "entity registered");
    }

    /// Remove the first descriptor matching `id`. Duplicate registrations
    /// come out one unregister call at a time.
    fn apply_unregister(&mut self, id: EntityId) {
        for batch in &mut self.batches {
            if let Some(slot) = batch.find_slot(id) {
                self.grid.remove_entity(id);
                batch.remove_slot(slot);
                trace!(id = %id.0, tag = %batch.tag, "entity unregistered");
                return;
            }
        }
        debug!(id = %id.0, "unregister for unknown entity ignored");
    }

    /// Batch for a tag, created on first sight. A new batch takes its
    /// flags and phase from the first registration and is bound to the
    /// registry's dispatcher for the tag.
    fn batch_for(
        &mut self,
        tag: &TypeTag,
        category: EntityCategory,
        phase: TickPhase,
        flags: BatchFlags,
    ) -> BatchId {
        if let Some(&id) = self.by_tag.get(tag) {
            return id;
        }
        let id = BatchId(self.batches.len() as u32);
        let mut batch = TypeBatch::new(tag.clone(), category, phase, flags);
        batch.set_dispatch(self.registry.dispatcher_for(tag, category));
        self.batches.push(batch);
        self.by_tag.insert(tag.clone(), id);
        self.phases[phase.index()].push(id);
        debug!(tag = %tag, ?phase, ?flags, "batch created");
        id
    }

    /// Re-derive enablement (and cached positions) for batches that asked
    /// for it. Bounded to conditional and locality-sorted batches so the
    /// per-frame cost stays proportional to the batches that need it.
    fn refresh_enablement(&mut self) {
        for batch in &mut self.batches {
            if batch.flags.contains(BatchFlags::CONDITIONAL) || batch.sort_by_locality {
                batch.refresh_enabled();
            }
        }
    }

    pub(crate) fn registry_has_override(&self, tag: &TypeTag) -> bool {
        self.registry.has_override(tag)
    }

    /// Live entities within `radius` of a position.
    pub fn nearby(&self, position: Vec3, radius: f32) -> Vec<EntityId> {
        self.grid.get_nearby(position, radius)
    }

    /// Aggregate statistics, recomputed from live state.
    pub fn stats(&self) -> TickStats {
        TickStats {
            frame: self.frame,
            registered_entities: self.batches.iter().map(TypeBatch::len).sum(),
            active_last_frame: self.active_last_frame,
            skipped_last_frame: self.skipped_last_frame,
            cache_misses: self.cache_misses,
            batches: self.batches.len(),
            parallel_batches: self
                .batches
                .iter()
                .filter(|b| b.flags.contains(BatchFlags::PARALLEL))
                .count(),
            spatial_batches: self
                .batches
                .iter()
                .filter(|b| b.flags.contains(BatchFlags::SPATIAL_AWARE))
                .count(),
            grid_residents: self.grid.len(),
            total_tick_time_ms: self.total_tick_time_ms,
            optimizer_runs: self.optimizer_runs,
        }
    }

    /// Per-batch timing snapshot.
    pub fn batch_timings(&self) -> Vec<BatchTiming> {
        self.batches
            .iter()
            .map(|b| BatchTiming {
                tag: b.tag.name().to_owned(),
                entities: b.len(),
                active_last_tick: b.last_tick_count,
                avg_tick_ns: b.avg_tick_ns,
                parallel: b.flags.contains(BatchFlags::PARALLEL),
                low_priority: b.flags.contains(BatchFlags::LOW_PRIORITY),
            })
            .collect()
    }
}

impl Default for TickScheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tickforge_common::EntityCategory;

    struct Agent {
        id: EntityId,
        tag: TypeTag,
        category: EntityCategory,
        phase: TickPhase,
        position: std::sync::Mutex<Vec3>,
        valid: AtomicBool,
        active: AtomicBool,
        ticks: AtomicUsize,
    }

    impl Agent {
        fn build(tag: &str) -> AgentBuilder {
            AgentBuilder {
                tag: tag.to_owned(),
                category: EntityCategory::General,
                phase: TickPhase::PrePhysics,
                position: Vec3::ZERO,
            }
        }

        fn ticks(&self) -> usize {
            self.ticks.load(Ordering::Relaxed)
        }
    }

    struct AgentBuilder {
        tag: String,
        category: EntityCategory,
        phase: TickPhase,
        position: Vec3,
    }

    impl AgentBuilder {
        fn category(mut self, category: EntityCategory) -> Self {
            self.category = category;
            self
        }

        fn phase(mut self, phase: TickPhase) -> Self {
            self.phase = phase;
            self
        }

        fn at(mut self, position: Vec3) -> Self {
            self.position = position;
            self
        }

        fn spawn(self) -> Arc<Agent> {
            Arc::new(Agent {
                id: EntityId::new(),
                tag: TypeTag::new(&self.tag),
                category: self.category,
                phase: self.phase,
                position: std::sync::Mutex::new(self.position),
                valid: AtomicBool::new(true),
                active: AtomicBool::new(true),
                ticks: AtomicUsize::new(0),
            })
        }
    }

    impl Tickable for Agent {
        fn id(&self) -> EntityId {
            self.id
        }
        fn type_tag(&self) -> TypeTag {
            self.tag.clone()
        }
        fn is_valid(&self) -> bool {
            self.valid.load(Ordering::Relaxed)
        }
        fn tick(&self, _dt: f32) {
            self.ticks.fetch_add(1, Ordering::Relaxed);
        }
        fn position(&self) -> Option<Vec3> {
            Some(*self.position.lock().unwrap())
        }
        fn is_active(&self) -> bool {
            self.active.load(Ordering::Relaxed)
        }
        fn category(&self) -> EntityCategory {
            self.category
        }
        fn phase(&self) -> TickPhase {
            self.phase
        }
    }

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn registration_is_deferred_to_the_next_tick() {
        let mut sched = TickScheduler::default();
        let agent = Agent::build("turret").spawn();
        sched.register(agent.clone(), BatchFlags::empty());
        assert_eq!(sched.stats().registered_entities, 0);

        sched.tick(DT);
        assert_eq!(sched.stats().registered_entities, 1);
        assert_eq!(agent.ticks(), 1);
    }

    #[test]
    fn every_registered_entity_ticks_once_per_frame() {
        let mut sched = TickScheduler::default();
        let agents: Vec<_> = (0..25)
            .map(|i| {
                Agent::build(if i % 2 == 0 { "turret" } else { "drone" })
                    .at(Vec3::new(i as f32 * 50.0, 0.0, 0.0))
                    .spawn()
            })
            .collect();
        for agent in &agents {
            sched.register(agent.clone(), BatchFlags::empty());
        }

        for _ in 0..4 {
            sched.tick(DT);
        }
        for agent in &agents {
            assert_eq!(agent.ticks(), 4);
        }
        let stats = sched.stats();
        assert_eq!(stats.batches, 2);
        assert_eq!(stats.active_last_frame, 25);
    }

    #[test]
    fn low_priority_ticks_on_throttle_frames_only() {
        let mut sched = TickScheduler::default();
        let lazy = Agent::build("ambient").spawn();
        let eager = Agent::build("turret").spawn();
        sched.register(lazy.clone(), BatchFlags::LOW_PRIORITY);
        sched.register(eager.clone(), BatchFlags::empty());

        for _ in 0..9 {
            sched.tick(DT);
        }
        // Frames 0, 3 and 6 of the nine.
        assert_eq!(lazy.ticks(), 3);
        assert_eq!(eager.ticks(), 9);
    }

    #[test]
    fn register_then_unregister_before_flush_never_ticks() {
        let mut sched = TickScheduler::default();
        let agent = Agent::build("turret").spawn();
        sched.register(agent.clone(), BatchFlags::empty());
        sched.unregister(agent.id);

        for _ in 0..3 {
            sched.tick(DT);
        }
        assert_eq!(agent.ticks(), 0);
        assert_eq!(sched.stats().registered_entities, 0);
    }

    #[test]
    fn unregister_wins_even_when_queued_before_the_register() {
        let mut sched = TickScheduler::default();
        let agent = Agent::build("turret").spawn();
        sched.unregister(agent.id);
        sched.register(agent.clone(), BatchFlags::empty());

        sched.tick(DT);
        assert_eq!(agent.ticks(), 0);
        assert_eq!(sched.stats().registered_entities, 0);
    }

    #[test]
    fn register_many_materializes_the_whole_batch_of_requests() {
        let mut sched = TickScheduler::default();
        let agents: Vec<_> = (0..5).map(|_| Agent::build("turret").spawn()).collect();
        let requests: Vec<RegistrationRequest> = agents
            .iter()
            .map(|agent| {
                let entity: Arc<dyn Tickable> = agent.clone();
                RegistrationRequest {
                    entity,
                    flags: BatchFlags::empty(),
                    priority: 100,
                }
            })
            .collect();
        sched.queue().register_many(requests);
        assert_eq!(sched.stats().registered_entities, 0);

        sched.tick(DT);
        assert_eq!(sched.stats().registered_entities, 5);
        for agent in &agents {
            assert_eq!(agent.ticks(), 1);
        }
    }

    #[test]
    fn unregister_removes_from_grid_and_batch() {
        let mut sched = TickScheduler::default();
        let agent = Agent::build("sensor")
            .at(Vec3::new(100.0, 0.0, 0.0))
            .spawn();
        sched.register(agent.clone(), BatchFlags::SPATIAL_AWARE);
        sched.tick(DT);
        assert_eq!(sched.stats().grid_residents, 1);

        sched.unregister(agent.id);
        sched.tick(DT);
        let stats = sched.stats();
        assert_eq!(stats.grid_residents, 0);
        assert_eq!(stats.registered_entities, 0);
    }

    #[test]
    fn invalid_entities_are_skipped_not_ticked() {
        let mut sched = TickScheduler::default();
        let doomed = Agent::build("turret").spawn();
        let fine = Agent::build("turret").spawn();
        sched.register(doomed.clone(), BatchFlags::empty());
        sched.register(fine.clone(), BatchFlags::empty());
        sched.tick(DT);

        doomed.valid.store(false, Ordering::Relaxed);
        sched.tick(DT);
        sched.tick(DT);
        assert_eq!(doomed.ticks(), 1);
        assert_eq!(fine.ticks(), 3);
        assert_eq!(sched.stats().skipped_last_frame, 1);
        // The miss counter keeps rising while the dead entity is carried.
        assert_eq!(sched.stats().cache_misses, 2);
    }

    #[test]
    fn conditional_batch_tracks_active_state() {
        let mut sched = TickScheduler::default();
        let agent = Agent::build("door").spawn();
        sched.register(agent.clone(), BatchFlags::CONDITIONAL);
        sched.tick(DT);
        assert_eq!(agent.ticks(), 1);

        agent.active.store(false, Ordering::Relaxed);
        sched.tick(DT);
        sched.tick(DT);
        assert_eq!(agent.ticks(), 1);

        agent.active.store(true, Ordering::Relaxed);
        sched.tick(DT);
        assert_eq!(agent.ticks(), 2);
    }

    #[test]
    fn parallel_flag_is_stripped_for_thread_unsafe_categories() {
        let mut sched = TickScheduler::default();
        let mover = Agent::build("walker")
            .category(EntityCategory::Movement)
            .spawn();
        sched.register(mover.clone(), BatchFlags::PARALLEL);
        sched.tick(DT);

        assert_eq!(sched.stats().parallel_batches, 0);
        assert_eq!(mover.ticks(), 1);
    }

    #[test]
    fn parallel_and_sequential_tick_the_same_membership() {
        let mut parallel = TickScheduler::default();
        let mut sequential = TickScheduler::default();
        let par_agents: Vec<_> = (0..40).map(|_| Agent::build("swarm").spawn()).collect();
        let seq_agents: Vec<_> = (0..40).map(|_| Agent::build("swarm").spawn()).collect();
        for agent in &par_agents {
            parallel.register(agent.clone(), BatchFlags::PARALLEL);
        }
        for agent in &seq_agents {
            sequential.register(agent.clone(), BatchFlags::empty());
        }

        parallel.tick(DT);
        sequential.tick(DT);
        for (p, s) in par_agents.iter().zip(&seq_agents) {
            assert_eq!(p.ticks(), 1);
            assert_eq!(s.ticks(), 1);
        }
        assert_eq!(
            parallel.stats().active_last_frame,
            sequential.stats().active_last_frame
        );
    }

    #[test]
    fn phases_share_one_frame() {
        let mut sched = TickScheduler::default();
        let early = Agent::build("prep").phase(TickPhase::PrePhysics).spawn();
        let late = Agent::build("cleanup").phase(TickPhase::EndOfFrame).spawn();
        sched.register(early.clone(), BatchFlags::empty());
        sched.register(late.clone(), BatchFlags::empty());

        sched.tick(DT);
        assert_eq!(early.ticks(), 1);
        assert_eq!(late.ticks(), 1);
        assert_eq!(sched.stats().batches, 2);
    }

    #[test]
    fn spatial_agents_answer_nearby_queries() {
        let mut sched = TickScheduler::default();
        let here = Agent::build("sensor").at(Vec3::new(100.0, 0.0, 0.0)).spawn();
        let there = Agent::build("sensor")
            .at(Vec3::new(5000.0, 0.0, 0.0))
            .spawn();
        sched.register(here.clone(), BatchFlags::SPATIAL_AWARE);
        sched.register(there.clone(), BatchFlags::SPATIAL_AWARE);
        sched.tick(DT);

        let found = sched.nearby(Vec3::new(120.0, 0.0, 0.0), 200.0);
        assert_eq!(found, vec![here.id]);
    }

    #[test]
    fn grid_follows_moving_entities() {
        let mut sched = TickScheduler::default();
        let rover = Agent::build("rover").at(Vec3::new(100.0, 0.0, 0.0)).spawn();
        sched.register(rover.clone(), BatchFlags::SPATIAL_AWARE);
        sched.tick(DT);

        *rover.position.lock().unwrap() = Vec3::new(8100.0, 0.0, 0.0);
        sched.tick(DT);

        assert!(sched.nearby(Vec3::new(100.0, 0.0, 0.0), 300.0).is_empty());
        assert_eq!(
            sched.nearby(Vec3::new(8100.0, 0.0, 0.0), 300.0),
            vec![rover.id]
        );
    }

    #[test]
    fn spatial_entities_tick_through_batch_and_grid() {
        let mut sched = TickScheduler::default();
        let sensor = Agent::build("sensor").spawn();
        sched.register(sensor.clone(), BatchFlags::SPATIAL_AWARE);
        sched.tick(DT);
        // Once from its type batch, once from the grid sweep.
        assert_eq!(sensor.ticks(), 2);
    }

    #[test]
    fn bespoke_dispatcher_is_used_for_its_tag() {
        let mut sched = TickScheduler::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_in = calls.clone();
        sched
            .bind_dispatcher(
                TypeTag::new("scripted"),
                Arc::new(move |entities, dt| {
                    calls_in.fetch_add(1, Ordering::Relaxed);
                    for entity in entities {
                        (entity.tick_fn)(dt);
                    }
                }),
            )
            .unwrap();

        let agent = Agent::build("scripted").spawn();
        sched.register(agent.clone(), BatchFlags::empty());
        sched.tick(DT);
        assert_eq!(calls.load(Ordering::Relaxed), 1);
        assert_eq!(agent.ticks(), 1);
    }

    #[test]
    fn frame_counter_wraps() {
        let mut config = SchedulerConfig::default();
        config.frame_counter_range = 4;
        // Keep the optimizer quiet for this test.
        config.optimize_interval = 100;
        let mut sched = TickScheduler::new(config);
        for _ in 0..6 {
            sched.tick(DT);
        }
        assert_eq!(sched.frame(), 2);
    }

    #[test]
    fn duplicate_registrations_tick_twice_and_unwind_one_at_a_time() {
        let mut sched = TickScheduler::default();
        let agent = Agent::build("turret").spawn();
        sched.register(agent.clone(), BatchFlags::empty());
        sched.register(agent.clone(), BatchFlags::empty());
        sched.tick(DT);
        assert_eq!(agent.ticks(), 2);

        sched.unregister(agent.id);
        sched.tick(DT);
        assert_eq!(sched.stats().registered_entities, 1);
        sched.unregister(agent.id);
        sched.tick(DT);
        assert_eq!(sched.stats().registered_entities, 0);
    }
}
