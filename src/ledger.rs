//! Per-track provenance ledger
//!
//! One JSON document per rendered track, co-located with its audio file
//! under the same base name. Created once at render time; the
//! `automated_metrics` and `human_evaluation` sections are placeholders
//! filled in later by external audit/review tools, which overwrite the
//! file in place. The pipeline itself never mutates a ledger after
//! writing it.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::Local;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ENGINE_UID;
use crate::error::Result;
use crate::tags::TagSet;

/// Identity of one rendered artifact: who made it, when, from where.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provenance {
    pub id: String,
    pub timestamp: String,
    pub engine_uid: String,
    pub project_root: String,
}

/// The exact inputs the render was invoked with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputPrompt {
    pub topic: String,
    pub lyrics: String,
    pub tags: TagSet,
}

/// Render parameters, kept for reproducibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Configuration {
    pub seed: u64,
    pub cfg_scale: f32,
    pub temperature: f32,
    pub duration_sec: u32,
    pub input_prompt: InputPrompt,
}

/// Machine-filled quality metrics. `audit_status` stays PENDING until an
/// external transcription auditor gets to the track.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomatedMetrics {
    pub generation_time_sec: f64,
    pub audit_status: String,
    pub lyric_accuracy_score: Option<f64>,
    pub raw_transcript: Option<String>,
}

impl AutomatedMetrics {
    fn pending(generation_time_sec: f64) -> Self {
        Self {
            generation_time_sec,
            audit_status: "PENDING".to_string(),
            lyric_accuracy_score: None,
            raw_transcript: None,
        }
    }
}

/// Human review section, mutated only by the external evaluation tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HumanEvaluation {
    pub overall_score: Option<i32>,
    #[serde(default)]
    pub prompt_adherence_scores: BTreeMap<String, i32>,
    #[serde(default)]
    pub perceived_tags: Vec<String>,
    #[serde(default)]
    pub technical_audit_scores: BTreeMap<String, i32>,
    pub qualitative_notes: Option<String>,
    #[serde(default = "not_evaluated")]
    pub status: String,
}

fn not_evaluated() -> String {
    "NOT_EVALUATED".to_string()
}

/// The full per-track record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ledger {
    pub provenance: Provenance,
    pub configuration: Configuration,
    pub automated_metrics: AutomatedMetrics,
    pub human_evaluation: HumanEvaluation,
    pub status: String,
}

impl Ledger {
    /// Create the record for a freshly rendered track.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        topic: &str,
        lyrics: &str,
        tags: TagSet,
        seed: u64,
        cfg_scale: f32,
        temperature: f32,
        duration_sec: u32,
        generation_time_sec: f64,
        project_root: &Path,
    ) -> Self {
        let now = Local::now();
        let id = format!(
            "MAESTRO_{}_{}",
            now.format("%Y%m%d_%H%M%S"),
            &Uuid::new_v4().simple().to_string()[..6]
        );

        Self {
            provenance: Provenance {
                id,
                timestamp: now.to_rfc3339(),
                engine_uid: ENGINE_UID.to_string(),
                project_root: project_root.display().to_string(),
            },
            configuration: Configuration {
                seed,
                cfg_scale,
                temperature,
                duration_sec,
                input_prompt: InputPrompt {
                    topic: topic.to_string(),
                    lyrics: lyrics.to_string(),
                    tags,
                },
            },
            automated_metrics: AutomatedMetrics::pending(generation_time_sec),
            human_evaluation: HumanEvaluation {
                status: not_evaluated(),
                ..HumanEvaluation::default()
            },
            status: "PRODUCED".to_string(),
        }
    }

    /// Persist alongside the audio artifact, pretty-printed.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load a ledger file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Ledger {
        Ledger::create(
            "Neon Rain",
            "[VERSE 1]\nwords",
            TagSet::curate("electronic, dark"),
            42,
            1.5,
            1.0,
            120,
            93.4,
            Path::new("/studio"),
        )
    }

    #[test]
    fn test_fresh_ledger_defaults() {
        let ledger = sample();
        assert!(ledger.provenance.id.starts_with("MAESTRO_"));
        assert_eq!(ledger.provenance.engine_uid, ENGINE_UID);
        assert_eq!(ledger.automated_metrics.audit_status, "PENDING");
        assert_eq!(ledger.human_evaluation.status, "NOT_EVALUATED");
        assert_eq!(ledger.status, "PRODUCED");
        assert_eq!(ledger.configuration.seed, 42);
    }

    #[test]
    fn test_ledger_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("track.json");
        let ledger = sample();
        ledger.save(&path).unwrap();

        let back = Ledger::load(&path).unwrap();
        assert_eq!(back.provenance.id, ledger.provenance.id);
        assert_eq!(
            back.configuration.input_prompt.tags,
            ledger.configuration.input_prompt.tags
        );
    }

    #[test]
    fn test_external_tool_fields_survive_round_trip() {
        // An auditor overwrites metrics; re-reading keeps them.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("track.json");
        let mut ledger = sample();
        ledger.automated_metrics.audit_status = "VERIFIED".to_string();
        ledger.automated_metrics.lyric_accuracy_score = Some(0.92);
        ledger.save(&path).unwrap();

        let back = Ledger::load(&path).unwrap();
        assert_eq!(back.automated_metrics.audit_status, "VERIFIED");
        assert_eq!(back.automated_metrics.lyric_accuracy_score, Some(0.92));
    }
}
