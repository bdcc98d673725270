use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use glam::Vec3;
use tracing_subscriber::EnvFilter;

use tickforge_common::{BatchFlags, EntityCategory, EntityId, TickPhase, Tickable, TypeTag};
use tickforge_sched::{SchedulerConfig, TickScheduler};

#[derive(Parser)]
#[command(name = "tickforge-cli", about = "CLI tool for the tickforge scheduler")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate versions
    Info,
    /// Run a synthetic population through the scheduler
    Run {
        /// Number of entities to register
        #[arg(short, long, default_value = "1000")]
        entities: usize,
        /// Number of frames to simulate
        #[arg(short, long, default_value = "600")]
        frames: u64,
        /// Fixed delta time per frame, seconds
        #[arg(short, long, default_value = "0.01666")]
        dt: f32,
        /// Emit final stats as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Synthetic entity for the demo run. Tags cycle through a few archetypes
/// so the scheduler ends up with a mixed batch population.
struct DemoEntity {
    id: EntityId,
    tag: TypeTag,
    category: EntityCategory,
    phase: TickPhase,
    position: Vec3,
    ticks: AtomicUsize,
}

impl Tickable for DemoEntity {
    fn id(&self) -> EntityId {
        self.id
    }
    fn type_tag(&self) -> TypeTag {
        self.tag.clone()
    }
    fn is_valid(&self) -> bool {
        true
    }
    fn tick(&self, _dt: f32) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }
    fn position(&self) -> Option<Vec3> {
        Some(self.position)
    }
    fn category(&self) -> EntityCategory {
        self.category
    }
    fn phase(&self) -> TickPhase {
        self.phase
    }
}

struct Archetype {
    tag: &'static str,
    category: EntityCategory,
    phase: TickPhase,
    flags: BatchFlags,
}

const ARCHETYPES: [Archetype; 4] = [
    Archetype {
        tag: "drone",
        category: EntityCategory::General,
        phase: TickPhase::PrePhysics,
        flags: BatchFlags::PARALLEL,
    },
    Archetype {
        tag: "walker",
        category: EntityCategory::Movement,
        phase: TickPhase::PrePhysics,
        flags: BatchFlags::empty(),
    },
    Archetype {
        tag: "lookout",
        category: EntityCategory::Perception,
        phase: TickPhase::PostPhysics,
        flags: BatchFlags::SPATIAL_AWARE,
    },
    Archetype {
        tag: "ambient",
        category: EntityCategory::General,
        phase: TickPhase::EndOfFrame,
        flags: BatchFlags::LOW_PRIORITY,
    },
];

fn run(entities: usize, frames: u64, dt: f32, json: bool) -> anyhow::Result<()> {
    let mut sched = TickScheduler::new(SchedulerConfig::default());
    let side = (entities as f32).sqrt().ceil() as usize;

    let mut population = Vec::with_capacity(entities);
    for i in 0..entities {
        let archetype = &ARCHETYPES[i % ARCHETYPES.len()];
        let entity = Arc::new(DemoEntity {
            id: EntityId::new(),
            tag: TypeTag::new(archetype.tag),
            category: archetype.category,
            phase: archetype.phase,
            position: Vec3::new(
                (i % side) as f32 * 100.0,
                0.0,
                (i / side) as f32 * 100.0,
            ),
            ticks: AtomicUsize::new(0),
        });
        sched.register(entity.clone(), archetype.flags);
        population.push(entity);
    }

    for _ in 0..frames {
        sched.tick(dt);
    }

    let stats = sched.stats();
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("Frames simulated: {frames}");
        println!(
            "Entities: {} registered, {} active last frame, {} skipped",
            stats.registered_entities, stats.active_last_frame, stats.skipped_last_frame
        );
        println!(
            "Batches: {} total, {} parallel, {} spatial",
            stats.batches, stats.parallel_batches, stats.spatial_batches
        );
        println!("Grid residents: {}", stats.grid_residents);
        println!("Cache misses: {}", stats.cache_misses);
        println!(
            "Tick time: {:.2} ms total, {:.3} ms/frame",
            stats.total_tick_time_ms,
            stats.total_tick_time_ms / frames as f64
        );
        println!("Optimizer runs: {}", stats.optimizer_runs);
        println!("\nPer-batch timings:");
        for timing in sched.batch_timings() {
            println!(
                "  {:<10} {:>6} entities, avg {:>10.1} ns, parallel={}, low_priority={}",
                timing.tag, timing.entities, timing.avg_tick_ns, timing.parallel,
                timing.low_priority
            );
        }
        let delivered: usize = population.iter().map(|e| e.ticks.load(Ordering::Relaxed)).sum();
        println!("\nTick calls delivered to entities: {delivered}");
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("tickforge-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common:  {}", tickforge_common::crate_info());
            println!("batch:   {}", tickforge_batch::crate_info());
            println!("spatial: {}", tickforge_spatial::crate_info());
            println!("sched:   {}", tickforge_sched::crate_info());
        }
        Commands::Run {
            entities,
            frames,
            dt,
            json,
        } => run(entities, frames, dt, json)?,
    }

    Ok(())
}
