//! Producer strategy blueprints
//!
//! A blueprint is an immutable strategy descriptor loaded from JSON: the
//! executive planning prompt plus the per-track lyric instruction template.
//! A directory of blueprints is scanned leniently: an invalid file is
//! skipped with a warning, never fatal, so one bad strategy can't take the
//! whole library down.

use std::fs;
use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::error::{MaestroError, Result};

/// Planning-stage strategy: the executive prompt and default track count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutiveStrategy {
    pub system_prompt: String,
    #[serde(default = "default_track_count")]
    pub track_count: usize,
}

fn default_track_count() -> usize {
    3
}

/// Per-track lyric instruction template with named placeholders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropagationLogic {
    /// Strategy label shown in logs (e.g. "narrative-arc").
    #[serde(default, rename = "type")]
    pub kind: String,
    /// Template with `{prev_context}`, `{track_title}`, ... placeholders.
    pub lyric_instruction_template: String,
}

/// Immutable production strategy descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blueprint {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub executive_strategy: ExecutiveStrategy,
    pub propagation_logic: PropagationLogic,
}

impl Blueprint {
    /// Load a single blueprint file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| MaestroError::InvalidBlueprint {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Scan a directory for blueprint files, skipping invalid ones.
    ///
    /// Returns the valid blueprints paired with their source paths, sorted
    /// by file name for a stable listing.
    pub fn load_dir(dir: &Path) -> Result<Vec<(PathBuf, Blueprint)>> {
        let mut found = Vec::new();

        for entry in WalkDir::new(dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match Blueprint::load(path) {
                Ok(bp) => found.push((path.to_path_buf(), bp)),
                Err(e) => {
                    warn!("Skipped invalid strategy file {}: {e}", path.display());
                }
            }
        }

        found.sort_by(|a, b| a.0.cmp(&b.0));

        if found.is_empty() {
            return Err(MaestroError::NoBlueprints {
                dir: dir.to_path_buf(),
            });
        }
        Ok(found)
    }
}
