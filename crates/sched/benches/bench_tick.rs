use std::hint::black_box;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use glam::Vec3;
use tickforge_common::{BatchFlags, EntityCategory, EntityId, TickPhase, Tickable, TypeTag};
use tickforge_sched::{SchedulerConfig, TickScheduler};

struct Synthetic {
    id: EntityId,
    tag: TypeTag,
    position: Vec3,
    work: u32,
    ticks: AtomicUsize,
}

impl Tickable for Synthetic {
    fn id(&self) -> EntityId {
        self.id
    }
    fn type_tag(&self) -> TypeTag {
        self.tag.clone()
    }
    fn is_valid(&self) -> bool {
        true
    }
    fn tick(&self, dt: f32) {
        // Spin a little so the batch has measurable cost.
        let mut acc = dt;
        for _ in 0..self.work {
            acc = black_box(acc * 1.000001 + 0.000001);
        }
        black_box(acc);
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }
    fn position(&self) -> Option<Vec3> {
        Some(self.position)
    }
    fn category(&self) -> EntityCategory {
        EntityCategory::General
    }
    fn phase(&self) -> TickPhase {
        TickPhase::PrePhysics
    }
}

fn populate(sched: &TickScheduler, tag: &str, count: usize, work: u32, flags: BatchFlags) {
    let side = (count as f32).sqrt().ceil() as usize;
    for i in 0..count {
        let x = (i % side) as f32 * 50.0;
        let z = (i / side) as f32 * 50.0;
        sched.register(
            Arc::new(Synthetic {
                id: EntityId::new(),
                tag: TypeTag::new(tag),
                position: Vec3::new(x, 0.0, z),
                work,
                ticks: AtomicUsize::new(0),
            }),
            flags,
        );
    }
}

fn bench_frames(label: &str, entity_count: usize, work: u32, flags: BatchFlags, frames: usize) {
    let mut sched = TickScheduler::new(SchedulerConfig::default());
    populate(&sched, "synthetic", entity_count, work, flags);
    sched.tick(1.0 / 60.0); // flush registrations outside the timed loop

    let start = Instant::now();
    for _ in 0..frames {
        sched.tick(black_box(1.0 / 60.0));
    }
    let elapsed = start.elapsed();
    let per_frame = elapsed / frames as u32;
    println!(
        "  {label} ({entity_count} entities, {frames} frames): {per_frame:?}/frame, total {elapsed:?}"
    );
}

fn bench_flush(entity_count: usize) {
    let mut sched = TickScheduler::new(SchedulerConfig::default());
    populate(&sched, "synthetic", entity_count, 0, BatchFlags::empty());

    let start = Instant::now();
    sched.tick(1.0 / 60.0);
    let elapsed = start.elapsed();
    println!("  flush ({entity_count} registrations): {elapsed:?}");
}

fn bench_nearby(entity_count: usize, iterations: usize) {
    let mut sched = TickScheduler::new(SchedulerConfig::default());
    populate(
        &sched,
        "synthetic",
        entity_count,
        0,
        BatchFlags::SPATIAL_AWARE,
    );
    sched.tick(1.0 / 60.0);

    let start = Instant::now();
    for _ in 0..iterations {
        let _ = black_box(sched.nearby(black_box(Vec3::new(500.0, 0.0, 500.0)), black_box(1000.0)));
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!(
        "  nearby query ({entity_count} entities, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}"
    );
}

fn main() {
    println!("=== Tick Scheduler Benchmarks ===\n");

    println!("Sequential frames:");
    bench_frames("sequential", 100, 50, BatchFlags::empty(), 1000);
    bench_frames("sequential", 1000, 50, BatchFlags::empty(), 100);
    bench_frames("sequential", 10000, 50, BatchFlags::empty(), 10);

    println!("\nParallel frames:");
    bench_frames("parallel", 1000, 50, BatchFlags::PARALLEL, 100);
    bench_frames("parallel", 10000, 50, BatchFlags::PARALLEL, 10);

    println!("\nDeferred flush:");
    bench_flush(1000);
    bench_flush(10000);

    println!("\nSpatial queries:");
    bench_nearby(1000, 10000);
    bench_nearby(10000, 1000);

    println!("\n=== Done ===");
}
