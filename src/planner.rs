//! Executive planning stage
//!
//! Turns (blueprint, topic, track count) into an ordered tracklist via a
//! single chat call. The language model is unreliable about both format
//! and count: malformed output falls back to a synthetic tracklist so the
//! pipeline can always proceed, while a count mismatch is only a warning.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::blueprint::Blueprint;
use crate::chat::ChatService;
use crate::error::Result;
use crate::extract::{extract_object, Extraction};

/// One planned track. Different producer personas name the fields
/// differently, so the free-text fields accept the known spellings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackSpec {
    #[serde(default)]
    pub title: String,
    #[serde(default, alias = "plot_point", alias = "hook_concept")]
    pub description: String,
    #[serde(default, alias = "energy_level", alias = "atmosphere")]
    pub mood: String,
}

/// The album-level plan produced once per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlbumPlan {
    #[serde(default = "untitled")]
    pub album_title: String,
    #[serde(default)]
    pub album_theme: String,
    #[serde(default)]
    pub tracklist: Vec<TrackSpec>,
}

fn untitled() -> String {
    "Untitled".to_string()
}

/// Plan an album's tracklist.
///
/// `requested_count` overrides the blueprint default when positive.
/// Connectivity failures propagate (fatal to the run, per policy);
/// malformed or empty plans degrade to a synthetic tracklist of exactly
/// the requested length.
pub fn plan_album(
    chat: &dyn ChatService,
    blueprint: &Blueprint,
    topic: &str,
    requested_count: Option<usize>,
) -> Result<AlbumPlan> {
    let default_count = blueprint.executive_strategy.track_count;
    let target_count = match requested_count {
        Some(n) if n > 0 => {
            if n != default_count {
                info!("Track count override: {n} (blueprint default was {default_count})");
            }
            n
        }
        _ => default_count,
    };

    let exec_prompt = format!(
        "{}\nUSER REQUEST: {}\n\
         MANDATORY REQUIREMENT: Generate a tracklist with exactly {} songs.\n\
         OUTPUT FORMAT: Return ONLY a valid JSON object with 'album_title', 'album_theme', and 'tracklist' (array).\n\
         Do not include conversational text.",
        blueprint.executive_strategy.system_prompt, topic, target_count
    );

    let raw = chat.chat(&exec_prompt, "Generate the plan.", 0.7)?;

    let plan = match extract_object(&raw) {
        Extraction::Parsed(value) => match serde_json::from_value::<AlbumPlan>(value) {
            Ok(plan) if !plan.tracklist.is_empty() => Some(plan),
            Ok(_) => {
                warn!("Executive plan parsed but carried an empty tracklist");
                None
            }
            Err(e) => {
                warn!("Executive plan JSON did not match the expected shape: {e}");
                None
            }
        },
        Extraction::Malformed(text) => {
            warn!("Executive producer failed to output valid JSON");
            log::debug!("Raw output:\n{text}");
            None
        }
    };

    let plan = match plan {
        Some(plan) => {
            let generated = plan.tracklist.len();
            if generated != target_count {
                warn!(
                    "Producer generated {generated} tracks instead of {target_count}. \
                     Proceeding with generated list."
                );
            }
            plan
        }
        None => synthetic_plan(topic, target_count),
    };

    Ok(plan)
}

/// Generic numbered tracklist guaranteeing forward progress.
fn synthetic_plan(topic: &str, count: usize) -> AlbumPlan {
    warn!("Falling back to a synthetic {count}-track plan");
    AlbumPlan {
        album_title: topic.to_string(),
        album_theme: topic.to_string(),
        tracklist: (1..=count)
            .map(|n| TrackSpec {
                title: format!("{topic} Pt. {n}"),
                description: format!("Part {n} of {count} exploring: {topic}"),
                mood: String::new(),
            })
            .collect(),
    }
}
