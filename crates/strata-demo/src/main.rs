//! Headless terrain streaming run.
//!
//! Loads `terrain.ron`, moves an observer along a straight line, ticks the
//! streaming controller once per step, and reports what was generated.

mod dump;
mod placer;

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::{Duration, Instant};

use clap::Parser;
use strata_config::{CliArgs, TerrainConfig, default_config_dir};
use strata_stream::{ChunkCoord, ChunkEvent, StreamingController, StreamingStats};
use tracing::{error, info, warn};

use crate::placer::TallyPlacer;

fn log_stats(tick: u32, stats: &StreamingStats) {
    info!(
        tick,
        chunks = stats.chunks_created,
        height_maps = stats.height_map_requests,
        meshes = stats.mesh_requests,
        colliders = stats.colliders_installed,
        scattered = stats.objects_scattered,
        running = stats.running_jobs,
        pending = stats.pending_completions,
        failed = stats.failed_jobs,
        "streaming stats"
    );
}

fn main() {
    let args = CliArgs::parse();

    let config_dir = args.config.clone().unwrap_or_else(default_config_dir);

    let mut config = TerrainConfig::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        TerrainConfig::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    strata_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));
    info!(dir = %config_dir.display(), seed = config.streaming.world_seed, "starting terrain run");

    let placer = Rc::new(RefCell::new(TallyPlacer::default()));
    let mut controller =
        StreamingController::with_grid_mesher(config.streaming.clone(), Box::new(Rc::clone(&placer)));

    let visible_now = Rc::new(Cell::new(0_i64));
    {
        let visible_now = Rc::clone(&visible_now);
        controller.subscribe(move |event| match event {
            ChunkEvent::VisibilityChanged { visible: true, .. } => visible_now.set(visible_now.get() + 1),
            ChunkEvent::VisibilityChanged { visible: false, .. } => visible_now.set(visible_now.get() - 1),
            ChunkEvent::ColliderInstalled { coord } => info!(%coord, "collider ready"),
            _ => {}
        });
    }

    let observer = config.observer.clone();
    let interval = Duration::from_millis(observer.tick_interval_ms);
    let started = Instant::now();
    let mut position = observer.start;
    for tick in 0..observer.ticks {
        controller.tick(position);
        if config.debug.stats_interval > 0 && tick % config.debug.stats_interval == 0 {
            log_stats(tick, &controller.stats());
        }
        position += observer.velocity;
        std::thread::sleep(interval);
    }

    if !controller.wait_idle(Duration::from_secs(10)) {
        warn!("generation still running at shutdown");
    }
    controller.tick(position);

    let stats = controller.stats();
    log_stats(observer.ticks, &stats);
    let placer = placer.borrow();
    info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        visible = visible_now.get(),
        water_planes = controller.store().water().len(),
        scattered_chunks = placer.chunks(),
        "run finished"
    );
    for (category, count) in placer.totals() {
        info!(%category, count, "objects by category");
    }

    if let Some(dir) = &args.dump_heightmap {
        let origin = ChunkCoord::from_world(observer.start, config.streaming.chunk_world_size());
        match controller.chunk(origin) {
            Some(chunk) => match dump::dump_chunk(chunk, dir) {
                Ok(files) => info!(count = files.len(), dir = %dir.display(), "height maps written"),
                Err(e) => error!("failed to write height maps: {e}"),
            },
            None => warn!(%origin, "no chunk to dump"),
        }
    }
}
