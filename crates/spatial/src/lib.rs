//! Spatial hash grid over packed cell keys.
//!
//! # Invariants
//! - An entity id maps to at most one cell at a time; re-adding moves it.
//! - The grid never owns entities: entries hold weak references, and a
//!   dropped host is skipped, not an error.
//! - Cell keys pack the three quantized coordinates into disjoint bit
//!   fields, so equal keys mean equal cells for one layout.

pub mod cell;
pub mod grid;

pub use cell::GridLayout;
pub use grid::{GridEntry, SpatialGrid};

pub fn crate_info() -> &'static str {
    "tickforge-spatial v0.1.0"
}
