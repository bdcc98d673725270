//! Per-frame scheduling engine.
//!
//! One `TickScheduler` owns every type batch, the spatial grid, and the
//! deferred operation queue; there is no ambient global state. A single
//! driving thread calls [`TickScheduler::tick`] once per frame, and
//! parallelism only ever happens inside one batch's tick as a blocking
//! fan-out/join.
//!
//! # Invariants
//! - Registration and unregistration are deferred: queued at any time from
//!   any thread, materialized exactly once per frame at the top of `tick`.
//! - Batch classification (flags, dispatch binding) changes only between
//!   ticks, by the orchestrator or the optimizer.
//! - The frame counter is read for throttle decisions first and advanced at
//!   the end of the frame, so counting starts at zero.

pub mod config;
pub mod optimizer;
pub mod priority;
pub mod queue;
pub mod scheduler;
pub mod stats;

pub use config::SchedulerConfig;
pub use queue::{RegistrationRequest, SchedulerQueue};
pub use scheduler::TickScheduler;
pub use stats::{BatchTiming, TickStats};

pub fn crate_info() -> &'static str {
    "tickforge-sched v0.1.0"
}
