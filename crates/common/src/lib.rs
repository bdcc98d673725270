//! Shared vocabulary for the tickforge scheduler.
//!
//! # Invariants
//! - `EntityId` is supplied by the host and is the only identity the
//!   scheduler ever matches on.
//! - `TypeTag` is a stable classification key: equal tags mean "batch
//!   together", and a tag is unique to one live batch.

pub mod tickable;
pub mod types;

pub use tickable::Tickable;
pub use types::{
    BatchFlags, BatchId, CellKey, DescriptorHandle, EntityCategory, EntityId, TickFn, TickPhase,
    TypeTag,
};

pub fn crate_info() -> &'static str {
    "tickforge-common v0.1.0"
}
