//! Periodic feedback loop that reclassifies batches from measured cost.
//!
//! Three passes over the batch set, all between ticks: threshold-driven
//! flag changes, category dispatch specializations, then spatial
//! migration. Nothing here runs while a tick is in flight.

use std::sync::Arc;

use tracing::{debug, info_span};

use tickforge_batch::dispatch::{movement_dispatcher, perception_dispatcher};
use tickforge_common::{BatchFlags, BatchId, DescriptorHandle, EntityCategory};
use tickforge_spatial::GridEntry;

use crate::scheduler::TickScheduler;

/// Classification names that mark a batch as spatial even when its
/// category does not.
const SPATIAL_MARKERS: [&str; 3] = ["physics", "collision", "spatial"];

impl TickScheduler {
    /// Reclassify every batch from its accumulated statistics. Invoked by
    /// `tick` on its own cadence; callable directly for tests and tools.
    pub fn optimize(&mut self) {
        let _span = info_span!("optimize").entered();
        self.apply_thresholds();
        self.apply_specializations();
        self.migrate_spatial();
        self.optimizer_runs += 1;
    }

    /// Pass 1: promote expensive batches to parallel, drop locality
    /// sorting on undersized ones, demote trivially cheap ones to the
    /// low-priority cadence.
    fn apply_thresholds(&mut self) {
        let config = self.config().clone();
        for batch in &mut self.batches {
            if batch.avg_tick_ns > config.parallel_promote_avg_ns
                && batch.last_tick_count > config.parallel_promote_min_entities
                && !batch.category.is_thread_unsafe()
                && !batch.flags.contains(BatchFlags::PARALLEL)
            {
                batch.flags.insert(BatchFlags::PARALLEL);
                debug!(tag = %batch.tag, avg_ns = batch.avg_tick_ns, "batch promoted to parallel");
            }
            if batch.len() < config.locality_min_entities && batch.sort_by_locality {
                batch.sort_by_locality = false;
                debug!(tag = %batch.tag, entities = batch.len(), "locality sort disabled");
            }
            if batch.avg_tick_ns > 0.0
                && batch.avg_tick_ns < config.low_priority_avg_ns
                && !batch.flags.contains(BatchFlags::HIGH_PRIORITY)
                && !batch.flags.contains(BatchFlags::LOW_PRIORITY)
            {
                batch.flags.insert(BatchFlags::LOW_PRIORITY);
                debug!(tag = %batch.tag, avg_ns = batch.avg_tick_ns, "batch demoted to low priority");
            }
        }
    }

    /// Pass 3: tag inherently spatial batches and migrate the members of
    /// every spatial batch into the grid.
    fn migrate_spatial(&mut self) {
        for (index, batch) in self.batches.iter_mut().enumerate() {
            let spatial = batch.flags.contains(BatchFlags::SPATIAL_AWARE)
                || batch.category.is_inherently_spatial()
                || SPATIAL_MARKERS
                    .iter()
                    .any(|marker| batch.tag.name().to_ascii_lowercase().contains(marker));
            if !spatial {
                continue;
            }
            batch.flags.insert(BatchFlags::SPATIAL_AWARE);

            let batch_id = BatchId(index as u32);
            let mut migrated = 0;
            let mut cells = Vec::new();
            for (slot, descriptor) in batch.slots_occupied() {
                if self.grid.contains(descriptor.id) {
                    continue;
                }
                let key = self.grid.add_entity(GridEntry {
                    id: descriptor.id,
                    handle: DescriptorHandle {
                        batch: batch_id,
                        slot,
                    },
                    host: Arc::downgrade(&descriptor.handle),
                    tick_fn: descriptor.tick_fn.clone(),
                    position: descriptor.position,
                });
                cells.push((slot, key));
                migrated += 1;
            }
            for (slot, key) in cells {
                if let Some(descriptor) = batch.descriptor_mut(slot) {
                    descriptor.cell = Some(key);
                }
            }
            if migrated > 0 {
                debug!(tag = %batch.tag, migrated, "batch migrated into spatial grid");
            }
        }
    }

    /// Pass 2: rebind category dispatch specializations. Tags with a
    /// caller-bound dispatcher are left alone.
    fn apply_specializations(&mut self) {
        let mut rebinds: Vec<(usize, bool)> = Vec::new();
        for (index, batch) in self.batches.iter().enumerate() {
            if self.registry_has_override(&batch.tag) {
                continue;
            }
            if batch.category.is_thread_unsafe() {
                rebinds.push((index, true));
            } else if batch.category == EntityCategory::Perception {
                rebinds.push((index, false));
            }
        }
        for (index, movement) in rebinds {
            let batch = &mut self.batches[index];
            if movement {
                batch.set_dispatch(movement_dispatcher());
                batch.flags.insert(BatchFlags::SPATIAL_AWARE);
                if batch.flags.contains(BatchFlags::PARALLEL) {
                    batch.flags.remove(BatchFlags::PARALLEL);
                    debug!(tag = %batch.tag, "parallel revoked by movement specialization");
                }
            } else {
                batch.set_dispatch(perception_dispatcher());
                batch.flags.insert(BatchFlags::SPATIAL_AWARE);
            }
        }
    }
}
