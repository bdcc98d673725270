//! Intra-phase batch ordering and tick cadence.

use std::cmp::Reverse;

use tickforge_batch::TypeBatch;
use tickforge_common::BatchFlags;

/// Stable sort key for batches sharing a phase: high-priority first,
/// low-priority last, larger active populations ahead of smaller ones.
pub fn phase_order_key(batch: &TypeBatch) -> (bool, bool, Reverse<usize>) {
    (
        !batch.flags.contains(BatchFlags::HIGH_PRIORITY),
        batch.flags.contains(BatchFlags::LOW_PRIORITY),
        Reverse(batch.last_tick_count),
    )
}

/// Whether a batch sits this frame out. Only low-priority batches are
/// throttled; they tick when the frame counter is a multiple of the
/// interval, starting with frame zero.
pub fn throttled_out(flags: BatchFlags, frame: u64, interval: u64) -> bool {
    flags.contains(BatchFlags::LOW_PRIORITY) && interval > 0 && frame % interval != 0
}
