//! Album production orchestration
//!
//! One cooperative sequence per album: plan, then produce tracks in
//! order. Context propagation makes the ordering load-bearing (track
//! *i+1*'s prompt cannot be built until track *i*'s append has happened),
//! so there is deliberately no concurrency here. Failures follow the
//! pipeline's standing policy: connectivity kills the run before any
//! track work, a failed track is skipped, and a partial album is a valid
//! outcome.

use std::fs;
use std::path::PathBuf;

use log::{error, info, warn};

use crate::arbiter::{GpuOccupant, ResourceArbiter};
use crate::blueprint::Blueprint;
use crate::chat::ChatService;
use crate::config::StudioConfig;
use crate::context::ContextPropagator;
use crate::error::Result;
use crate::naming::album_dir_name;
use crate::planner::{plan_album, AlbumPlan, TrackSpec};
use crate::producer::{ProducedTrack, TrackJob, TrackProducer};
use crate::synth::AudioModel;

/// Service handles for one production run.
///
/// The GPU-occupant views are passed separately from the functional views
/// so the arbiter stays the only component that touches occupancy.
pub struct ProductionServices<'a> {
    pub chat: &'a dyn ChatService,
    pub language_gpu: &'a dyn GpuOccupant,
    pub audio: &'a dyn AudioModel,
    pub audio_gpu: &'a dyn GpuOccupant,
}

/// Outcome of one album run.
#[derive(Debug)]
pub struct AlbumReport {
    pub album_dir: PathBuf,
    pub album_title: String,
    pub produced: usize,
    pub skipped: usize,
}

/// Execute a full album production run.
///
/// Fatal only when the chat service is unreachable at planning time or
/// the album directory cannot be created; everything after that degrades
/// per track.
pub fn execute_album(
    services: &ProductionServices,
    config: &StudioConfig,
    blueprint: &Blueprint,
    topic: &str,
    track_count: Option<usize>,
) -> Result<AlbumReport> {
    info!(
        "Active producer: {} (strategy: {})",
        blueprint.name, blueprint.propagation_logic.kind
    );

    // Connectivity is fatal here, before any track work begins.
    let model_id = services.chat.check_connection()?;
    info!("Chat service connected: {model_id}");

    let plan = plan_album(services.chat, blueprint, topic, track_count)?;
    info!(
        "Plan accepted: '{}' with {} tracks",
        plan.album_title,
        plan.tracklist.len()
    );

    let album_dir = config.output_dir.join(album_dir_name(&plan.album_title));
    fs::create_dir_all(&album_dir)?;

    let arbiter = ResourceArbiter::new(config.gpu_cooldown);
    let producer = TrackProducer::new(
        services.chat,
        services.language_gpu,
        services.audio,
        services.audio_gpu,
        &arbiter,
        config,
        &blueprint.propagation_logic.lyric_instruction_template,
    );

    let mut context = ContextPropagator::new();
    let total = plan.tracklist.len();
    let mut produced = 0usize;
    let mut skipped = 0usize;

    for (i, spec) in plan.tracklist.iter().enumerate() {
        let job = TrackJob {
            number: i + 1,
            total,
            spec,
            plan: &plan,
        };
        let title = job.title();

        match producer.produce(&job, &context, &album_dir) {
            Ok(track) => {
                // The reducer: context only ever reflects tracks that
                // actually produced lyrics and audio.
                context.append(track.context_entry());
                produced += 1;
            }
            Err(e) => {
                error!("Track {}/{total} '{title}' failed: {e}. Skipping.", i + 1);
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        warn!("Production finished with {skipped} of {total} tracks skipped");
    }
    info!(
        "Production complete using blueprint '{}': {produced} tracks in {}",
        blueprint.name,
        album_dir.display()
    );

    Ok(AlbumReport {
        album_dir,
        album_title: plan.album_title,
        produced,
        skipped,
    })
}

/// Produce one standalone track from a topic, without album planning.
pub fn produce_single_track(
    services: &ProductionServices,
    config: &StudioConfig,
    topic: &str,
) -> Result<ProducedTrack> {
    let model_id = services.chat.check_connection()?;
    info!("Chat service connected: {model_id}");

    fs::create_dir_all(&config.output_dir)?;

    let plan = AlbumPlan {
        album_title: topic.to_string(),
        album_theme: topic.to_string(),
        tracklist: vec![TrackSpec {
            title: topic.to_string(),
            description: String::new(),
            mood: String::new(),
        }],
    };
    let spec = plan.tracklist[0].clone();
    let job = TrackJob {
        number: 1,
        total: 1,
        spec: &spec,
        plan: &plan,
    };

    let arbiter = ResourceArbiter::new(config.gpu_cooldown);
    let producer = TrackProducer::new(
        services.chat,
        services.language_gpu,
        services.audio,
        services.audio_gpu,
        &arbiter,
        config,
        "Topic: {track_title}",
    );

    let context = ContextPropagator::new();
    producer.produce(&job, &context, &config.output_dir)
}
