//! Album post-production
//!
//! Consumes an album directory of `(ledger, audio)` pairs, masters each
//! track to a consistent peak level, renames into the distribution
//! layout, and aggregates album-level analytics into one master release
//! record. A ledger missing its audio file is dropped from both the
//! distribution set and the analytics, never fatal to the batch.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::audio::{read_wav, write_wav};
use crate::error::{MaestroError, Result};
use crate::ledger::Ledger;
use crate::naming::track_basename;

/// Distribution subdirectory created inside the album directory.
pub const DIST_DIR: &str = "DISTRIBUTION_READY";

/// Master log filename.
pub const MASTER_LOG: &str = "MASTER_RELEASE_LOG.json";

/// Mastering target in dB below full scale.
const TARGET_DB: f32 = -1.0;

/// Album-level aggregates over all consumed ledgers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlbumAnalytics {
    pub total_runtime_seconds: u64,
    pub total_runtime_formatted: String,
    pub vocabulary_size: usize,
    /// Tag frequency, highest count first.
    pub genre_dominance: Vec<(String, usize)>,
    pub track_count: usize,
    pub processed_date: String,
}

/// The album-level aggregate record produced by post-processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasterRelease {
    pub album_name: String,
    pub analytics: AlbumAnalytics,
    pub tracks: Vec<Ledger>,
}

/// Post-production pass over one album directory.
pub struct PostProcessor {
    album_dir: PathBuf,
    dist_dir: PathBuf,
}

impl PostProcessor {
    pub fn new(album_dir: &Path) -> Self {
        Self {
            album_dir: album_dir.to_path_buf(),
            dist_dir: album_dir.join(DIST_DIR),
        }
    }

    pub fn dist_dir(&self) -> &Path {
        &self.dist_dir
    }

    /// Discover track ledgers in ascending name order, excluding manifest
    /// and master files by name and anything that doesn't expose a
    /// provenance section.
    fn discover_ledgers(&self) -> Vec<(PathBuf, Ledger)> {
        let mut found = Vec::new();

        for entry in WalkDir::new(&self.album_dir)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if name.contains("manifest") || name.contains("MASTER") {
                continue;
            }
            match Ledger::load(path) {
                Ok(ledger) => found.push((path.to_path_buf(), ledger)),
                Err(_) => {
                    // Not a song ledger; leave it alone.
                }
            }
        }

        found
    }

    /// Master the album: normalize every paired track into the
    /// distribution directory and emit the master release record.
    pub fn process_album(&self) -> Result<MasterRelease> {
        info!("Starting post-production: {}", self.album_dir.display());

        let ledgers = self.discover_ledgers();
        if ledgers.is_empty() {
            return Err(MaestroError::NoLedgers {
                dir: self.album_dir.clone(),
            });
        }
        info!("Found {} track ledgers. Mastering...", ledgers.len());

        fs::create_dir_all(&self.dist_dir)?;

        let mut consumed: Vec<Ledger> = Vec::new();
        let mut track_num = 0usize;

        for (ledger_path, ledger) in ledgers {
            track_num += 1;
            let wav_path = ledger_path.with_extension("wav");
            if !wav_path.exists() {
                warn!("Missing audio for {}; skipping", ledger_path.display());
                continue;
            }

            let title = if ledger.configuration.input_prompt.topic.is_empty() {
                format!("Untitled_{track_num}")
            } else {
                ledger.configuration.input_prompt.topic.clone()
            };
            info!("Mastering track {track_num}: {title}");

            match read_wav(&wav_path) {
                Ok(mut waveform) => {
                    waveform.normalize_peak_db(TARGET_DB);
                    let out_path = self
                        .dist_dir
                        .join(format!("{}.wav", track_basename(track_num, &title)));
                    if let Err(e) = write_wav(&out_path, &waveform) {
                        warn!("Error writing mastered audio for '{title}': {e}");
                        continue;
                    }
                }
                Err(e) => {
                    warn!("Error processing audio for '{title}': {e}");
                    continue;
                }
            }

            consumed.push(ledger);
        }

        let analytics = generate_analytics(&consumed);
        let release = MasterRelease {
            album_name: album_name_from_dir(&self.album_dir),
            analytics,
            tracks: consumed,
        };

        let log_path = self.dist_dir.join(MASTER_LOG);
        fs::write(&log_path, serde_json::to_string_pretty(&release)?)?;

        info!(
            "Album mastered: {} | {} unique words",
            release.analytics.total_runtime_formatted, release.analytics.vocabulary_size
        );
        Ok(release)
    }
}

/// Compile album analytics from the consumed ledgers.
fn generate_analytics(ledgers: &[Ledger]) -> AlbumAnalytics {
    let mut total_time: u64 = 0;
    let mut vocab: std::collections::HashSet<String> = std::collections::HashSet::new();
    let mut genre_counts: HashMap<String, usize> = HashMap::new();
    let mut first_seen: Vec<String> = Vec::new();

    for ledger in ledgers {
        total_time += ledger.configuration.duration_sec as u64;

        for word in ledger
            .configuration
            .input_prompt
            .lyrics
            .to_lowercase()
            .split_whitespace()
        {
            vocab.insert(word.to_string());
        }

        for tag in ledger.configuration.input_prompt.tags.as_slice() {
            if !genre_counts.contains_key(tag) {
                first_seen.push(tag.clone());
            }
            *genre_counts.entry(tag.clone()).or_insert(0) += 1;
        }
    }

    // Descending by count; first-seen order breaks ties deterministically.
    let mut dominance: Vec<(String, usize)> = first_seen
        .into_iter()
        .map(|tag| {
            let count = genre_counts[&tag];
            (tag, count)
        })
        .collect();
    dominance.sort_by(|a, b| b.1.cmp(&a.1));

    AlbumAnalytics {
        total_runtime_seconds: total_time,
        total_runtime_formatted: format!("{}m {}s", total_time / 60, total_time % 60),
        vocabulary_size: vocab.len(),
        genre_dominance: dominance,
        track_count: ledgers.len(),
        processed_date: Local::now().to_rfc3339(),
    }
}

/// Human-readable album name recovered from the directory convention.
fn album_name_from_dir(album_dir: &Path) -> String {
    let raw = album_dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let stripped = raw.strip_prefix("ALBUM_").unwrap_or(&raw);
    let name = stripped.replace('_', " ");
    if name.is_empty() {
        "Untitled".to_string()
    } else {
        name
    }
}

/// Find album directories under an output root, newest last.
pub fn find_albums(output_dir: &Path) -> Vec<PathBuf> {
    let mut albums: Vec<PathBuf> = WalkDir::new(output_dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
        .filter(|e| e.file_name().to_string_lossy().starts_with("ALBUM_"))
        .map(|e| e.path().to_path_buf())
        .collect();
    albums.sort();
    albums
}
