//! Type batches: groups of same-classification entities ticked together.
//!
//! # Invariants
//! - A descriptor lives in exactly one batch slot; slot indices are stable
//!   for the descriptor's lifetime (tick order is a separate permutation).
//! - Batch flags and the bound dispatch callable change only between ticks,
//!   never while a tick is in flight.
//! - A batch tick never fails: invalid entities are filtered out, a missing
//!   dispatch callable makes the tick a no-op.

pub mod batch;
pub mod descriptor;
pub mod dispatch;

pub use batch::{TickOutcome, TypeBatch};
pub use descriptor::EntityDescriptor;
pub use dispatch::{ActiveEntity, BatchDispatchFn, DispatchRegistry, RegistryError};

pub fn crate_info() -> &'static str {
    "tickforge-batch v0.1.0"
}
