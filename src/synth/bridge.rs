//! HTTP bridge to the audio-model host
//!
//! The generative model runs in its own process (it owns the Python/CUDA
//! stack); this client speaks a small JSON protocol to it. The waveform
//! comes back as raw interleaved samples, an interception point rather
//! than a file write, so the orchestrator controls final encoding.

use std::time::Duration;

use log::debug;
use serde::Deserialize;

use crate::arbiter::{GpuLease, GpuOccupant};
use crate::audio::Waveform;
use crate::error::{MaestroError, Result};
use crate::synth::model::{AudioModel, RenderRequest};

/// Rendering a full track can take many minutes on modest hardware.
const RENDER_TIMEOUT: Duration = Duration::from_secs(1800);

/// Timeout for the small control endpoints (unload/cleanup).
const CONTROL_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct BridgeWaveform {
    samples: Vec<f32>,
    channels: usize,
    sample_rate: u32,
}

#[derive(Debug, Deserialize)]
struct BridgeError {
    error: Option<String>,
}

/// Client for the audio-model bridge process.
pub struct BridgeAudioModel {
    identity: String,
    base_url: String,
    http: reqwest::blocking::Client,
}

impl BridgeAudioModel {
    pub fn new(base_url: &str) -> Self {
        Self {
            identity: "audio-bridge".to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::blocking::Client::new(),
        }
    }

    fn control(&self, endpoint: &str) -> Result<()> {
        let url = format!("{}/{endpoint}", self.base_url);
        let response = self
            .http
            .post(&url)
            .timeout(CONTROL_TIMEOUT)
            .send()
            .map_err(|e| MaestroError::BridgeUnreachable {
                reason: e.to_string(),
            })?;
        if !response.status().is_success() {
            return Err(MaestroError::BridgeUnreachable {
                reason: format!("{endpoint} answered HTTP {}", response.status()),
            });
        }
        Ok(())
    }
}

impl AudioModel for BridgeAudioModel {
    fn identity(&self) -> &str {
        &self.identity
    }

    fn render(&self, _lease: &GpuLease, request: &RenderRequest) -> Result<Waveform> {
        let url = format!("{}/render", self.base_url);
        debug!(
            "Rendering via bridge: {}ms, cfg {}, seed {}",
            request.max_audio_length_ms, request.cfg_scale, request.seed
        );

        let response = self
            .http
            .post(&url)
            .timeout(RENDER_TIMEOUT)
            .json(request)
            .send()
            .map_err(|e| MaestroError::BridgeUnreachable {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<BridgeError>()
                .ok()
                .and_then(|b| b.error)
                .unwrap_or_else(|| format!("HTTP {status}"));
            return Err(MaestroError::RenderFailed { reason: detail });
        }

        let payload: BridgeWaveform =
            response.json().map_err(|e| MaestroError::RenderFailed {
                reason: format!("unreadable bridge response: {e}"),
            })?;

        if payload.samples.is_empty() {
            return Err(MaestroError::NoAudioCaptured);
        }

        Waveform::from_interleaved(payload.samples, payload.channels, payload.sample_rate)
    }

    fn is_available(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        self.http
            .get(&url)
            .timeout(Duration::from_secs(3))
            .send()
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }
}

impl GpuOccupant for BridgeAudioModel {
    fn occupant_name(&self) -> &str {
        &self.identity
    }

    fn offload(&self) -> Result<bool> {
        self.control("unload").map(|_| true)
    }

    fn reclaim(&self) -> Result<()> {
        self.control("cleanup")
    }
}
