//! Audio model trait and request types

use serde::{Deserialize, Serialize};

use crate::arbiter::GpuLease;
use crate::audio::Waveform;
use crate::error::Result;

/// One render invocation's inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderRequest {
    /// Normalized lyric body with `[SECTION]` markers.
    pub lyrics: String,
    /// Comma-joined curated tag string.
    pub tags: String,
    /// Upper bound on the rendered audio length.
    pub max_audio_length_ms: u64,
    /// Classifier-free guidance scale.
    pub cfg_scale: f32,
    /// Sampling temperature.
    pub temperature: f32,
    /// RNG seed, recorded in the ledger for reproducibility.
    pub seed: u64,
    /// Defer weight materialization so sub-components can be swapped
    /// in and out when VRAM is constrained.
    pub lazy_load: bool,
}

/// Trait for generative audio backends.
///
/// `render` returns the raw waveform rather than writing a file; the
/// orchestrator owns final encoding. The lease parameter ties rendering to
/// the arbiter's occupancy protocol: no lease, no GPU.
pub trait AudioModel: Send + Sync {
    /// Backend identifier for logs and provenance.
    fn identity(&self) -> &str;

    /// Render one track and hand back the captured waveform.
    fn render(&self, lease: &GpuLease, request: &RenderRequest) -> Result<Waveform>;

    /// Check if the backend is ready to use.
    fn is_available(&self) -> bool {
        true
    }
}
