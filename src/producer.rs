//! Per-track production
//!
//! Each track moves through a fixed stage sequence:
//! prompt built, lyrics drafted, tagged, rendered, persisted. An error at
//! any stage abandons only that track; the album loop carries on. Stage
//! computation is kept free of side effects until the final persist, so
//! the sequence is testable without touching the GPU or the disk.

use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{debug, info};

use crate::arbiter::{GpuOccupant, ResourceArbiter};
use crate::audio;
use crate::chat::ChatService;
use crate::config::{StudioConfig, PROMPT_TAGGER, PROMPT_WRITER};
use crate::context::{ContextEntry, ContextPropagator};
use crate::error::{MaestroError, Result};
use crate::ledger::Ledger;
use crate::naming::track_basename;
use crate::planner::{AlbumPlan, TrackSpec};
use crate::synth::{AudioModel, RenderRequest};
use crate::tags::{normalize_section_tags, TagSet};

/// Stages of the per-track state machine, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackStage {
    PromptBuilt,
    LyricsDrafted,
    Tagged,
    Rendered,
    Persisted,
    /// Absorbing failure state, reachable from any stage.
    Errored,
}

impl std::fmt::Display for TrackStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::PromptBuilt => "PROMPT_BUILT",
            Self::LyricsDrafted => "LYRICS_DRAFTED",
            Self::Tagged => "TAGGED",
            Self::Rendered => "RENDERED",
            Self::Persisted => "PERSISTED",
            Self::Errored => "ERRORED",
        };
        write!(f, "{name}")
    }
}

/// Record the transition into the absorbing error state.
fn errored(stage: TrackStage, e: MaestroError) -> MaestroError {
    log::error!("[{stage} -> {}] {e}", TrackStage::Errored);
    e
}

/// One track's slot in the album being produced.
pub struct TrackJob<'a> {
    /// 1-based track number.
    pub number: usize,
    pub total: usize,
    pub spec: &'a TrackSpec,
    pub plan: &'a AlbumPlan,
}

impl TrackJob<'_> {
    pub fn title(&self) -> String {
        if self.spec.title.is_empty() {
            format!("Track {}", self.number)
        } else {
            self.spec.title.clone()
        }
    }
}

/// A fully persisted track: artifact paths plus everything the context
/// reducer needs.
pub struct ProducedTrack {
    pub title: String,
    pub lyrics: String,
    pub tags: TagSet,
    pub mood: String,
    pub wav_path: PathBuf,
    pub ledger: Ledger,
}

impl ProducedTrack {
    /// Context contribution of this track.
    pub fn context_entry(&self) -> ContextEntry {
        ContextEntry::from_track(&self.title, &self.lyrics, &self.mood)
    }
}

/// Substitute named placeholders in a lyric instruction template.
///
/// Unresolved placeholders stay as literal text; templates are authored by
/// people and a typo should degrade the prompt, not kill the track.
pub fn instantiate_template(template: &str, job: &TrackJob, context: &ContextPropagator) -> String {
    let (prev_context, prev_mood) = context.previous();
    template
        .replace("{prev_context}", prev_context)
        .replace("{track_title}", &job.title())
        .replace("{track_description}", &job.spec.description)
        .replace("{scene_description}", &job.spec.description)
        .replace("{album_theme}", &job.plan.album_theme)
        .replace("{album_title}", &job.plan.album_title)
        .replace("{prev_mood}", prev_mood)
        .replace("{track_mood}", &job.spec.mood)
        .replace("{track_num}", &job.number.to_string())
        .replace("{total_tracks}", &job.total.to_string())
}

/// Drives one track through the production stages.
pub struct TrackProducer<'a> {
    chat: &'a dyn ChatService,
    language_gpu: &'a dyn GpuOccupant,
    audio_model: &'a dyn AudioModel,
    audio_gpu: &'a dyn GpuOccupant,
    arbiter: &'a ResourceArbiter,
    config: &'a StudioConfig,
    /// The blueprint's lyric instruction template.
    lyric_template: &'a str,
}

impl<'a> TrackProducer<'a> {
    pub fn new(
        chat: &'a dyn ChatService,
        language_gpu: &'a dyn GpuOccupant,
        audio_model: &'a dyn AudioModel,
        audio_gpu: &'a dyn GpuOccupant,
        arbiter: &'a ResourceArbiter,
        config: &'a StudioConfig,
        lyric_template: &'a str,
    ) -> Self {
        Self {
            chat,
            language_gpu,
            audio_model,
            audio_gpu,
            arbiter,
            config,
            lyric_template,
        }
    }

    /// Produce one track end to end, writing its artifacts into
    /// `album_dir`. Context is read here but never written; the caller
    /// appends on success.
    pub fn produce(
        &self,
        job: &TrackJob,
        context: &ContextPropagator,
        album_dir: &Path,
    ) -> Result<ProducedTrack> {
        let title = job.title();

        info!(
            "Track {}/{}: {} ({}s)",
            job.number, job.total, title, self.config.render.duration_sec
        );

        // PROMPT_BUILT
        let smart_prompt = instantiate_template(self.lyric_template, job, context);
        debug!("[{}] Prompt sent to lyricist:\n{smart_prompt}", TrackStage::PromptBuilt);

        // LYRICS_DRAFTED
        let raw_lyrics = self
            .chat
            .chat(PROMPT_WRITER, &smart_prompt, 0.7)
            .map_err(|e| errored(TrackStage::LyricsDrafted, e))?;
        let mut lyrics = normalize_section_tags(&raw_lyrics);
        debug!("[{}] {} chars of lyrics", TrackStage::LyricsDrafted, lyrics.len());

        // TAGGED (low temperature keeps the tagger terse)
        let raw_tags = self
            .chat
            .chat(PROMPT_TAGGER, &lyrics, 0.2)
            .map_err(|e| errored(TrackStage::Tagged, e))?;
        let tag_set = TagSet::curate(&raw_tags);
        info!("[{}] Tags: {tag_set}", TrackStage::Tagged);

        // Optional decoration pass, after tags exist to steer the style.
        if let Some(schema) = self.config.decorator {
            let user = format!("Style: {}\n\nLyrics:\n{lyrics}", tag_set.joined());
            let decorated = self
                .chat
                .chat(schema.system_prompt(), &user, 0.7)
                .map_err(|e| errored(TrackStage::Tagged, e))?;
            if !decorated.trim().is_empty() {
                lyrics = normalize_section_tags(&decorated);
            }
        }

        // RENDERED
        let render_start = Instant::now();
        let seed = rand::random::<u32>() as u64;
        let request = RenderRequest {
            lyrics: lyrics.clone(),
            tags: tag_set.joined(),
            max_audio_length_ms: self.config.render.duration_sec as u64 * 1000,
            cfg_scale: self.config.render.cfg_scale,
            temperature: self.config.render.temperature,
            seed,
            lazy_load: true,
        };

        let lease = self
            .arbiter
            .handoff_to_audio(self.language_gpu, self.audio_gpu);
        info!("[{}] Rendering (seed {seed})...", TrackStage::Rendered);
        let render_result = self.audio_model.render(&lease, &request);
        self.arbiter.release_audio(lease, self.audio_gpu);
        let mut waveform = render_result.map_err(|e| errored(TrackStage::Rendered, e))?;

        // PERSISTED
        waveform.normalize_peak(0.9);
        waveform.fade_out(self.config.fade_out);

        let basename = track_basename(job.number, &title);
        let wav_path = album_dir.join(format!("{basename}.wav"));
        let ledger_path = album_dir.join(format!("{basename}.json"));

        audio::write_wav(&wav_path, &waveform)
            .map_err(|e| errored(TrackStage::Persisted, e))?;
        let ledger = Ledger::create(
            &title,
            &lyrics,
            tag_set.clone(),
            seed,
            self.config.render.cfg_scale,
            self.config.render.temperature,
            self.config.render.duration_sec,
            render_start.elapsed().as_secs_f64(),
            &self.config.project_root,
        );
        ledger
            .save(&ledger_path)
            .map_err(|e| errored(TrackStage::Persisted, e))?;
        info!("[{}] {}", TrackStage::Persisted, wav_path.display());

        Ok(ProducedTrack {
            title,
            lyrics,
            tags: tag_set,
            mood: job.spec.mood.clone(),
            wav_path,
            ledger,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::TrackSpec;
    use pretty_assertions::assert_eq;

    fn plan() -> AlbumPlan {
        AlbumPlan {
            album_title: "Glass City".to_string(),
            album_theme: "urban isolation".to_string(),
            tracklist: vec![],
        }
    }

    fn spec() -> TrackSpec {
        TrackSpec {
            title: "Rooftops".to_string(),
            description: "a view from above".to_string(),
            mood: "calm".to_string(),
        }
    }

    #[test]
    fn test_template_substitution() {
        let plan = plan();
        let spec = spec();
        let job = TrackJob {
            number: 2,
            total: 5,
            spec: &spec,
            plan: &plan,
        };
        let ctx = ContextPropagator::new();

        let got = instantiate_template(
            "Write {track_title} ({track_num}/{total_tracks}) about {track_description}. \
             Previously: {prev_context}, mood {prev_mood}.",
            &job,
            &ctx,
        );
        assert_eq!(
            got,
            "Write Rooftops (2/5) about a view from above. \
             Previously: None (First Track), mood Neutral."
        );
    }

    #[test]
    fn test_unresolved_placeholder_stays_literal() {
        let plan = plan();
        let spec = spec();
        let job = TrackJob {
            number: 1,
            total: 1,
            spec: &spec,
            plan: &plan,
        };
        let ctx = ContextPropagator::new();

        let got = instantiate_template("{track_title} has {unknown_thing}", &job, &ctx);
        assert_eq!(got, "Rooftops has {unknown_thing}");
    }

    #[test]
    fn test_untitled_track_gets_numbered_name() {
        let plan = plan();
        let spec = TrackSpec {
            title: String::new(),
            description: String::new(),
            mood: String::new(),
        };
        let job = TrackJob {
            number: 3,
            total: 4,
            spec: &spec,
            plan: &plan,
        };
        assert_eq!(job.title(), "Track 3");
    }
}
