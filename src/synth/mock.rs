//! Mock audio model for pipeline testing
//!
//! Produces a deterministic seeded tone instead of real inference, so
//! end-to-end tests can verify the whole production loop (normalization,
//! fade, persistence, post-processing) without a GPU.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::arbiter::{GpuLease, GpuOccupant};
use crate::audio::Waveform;
use crate::config::SAMPLE_RATE;
use crate::error::{MaestroError, Result};
use crate::synth::model::{AudioModel, RenderRequest};

/// Deterministic stand-in for the generative model.
pub struct MockAudioModel {
    identity: String,
    /// 1-based render indices that should fail, for failure-path tests.
    fail_on: Vec<usize>,
    renders: AtomicUsize,
}

impl MockAudioModel {
    pub fn new() -> Self {
        Self {
            identity: "mock-audio".to_string(),
            fail_on: Vec::new(),
            renders: AtomicUsize::new(0),
        }
    }

    /// Fail the given 1-based render invocations with a render error.
    pub fn failing_on(mut self, indices: &[usize]) -> Self {
        self.fail_on = indices.to_vec();
        self
    }

    /// Number of render calls observed so far.
    pub fn render_count(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }
}

impl Default for MockAudioModel {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioModel for MockAudioModel {
    fn identity(&self) -> &str {
        &self.identity
    }

    fn render(&self, _lease: &GpuLease, request: &RenderRequest) -> Result<Waveform> {
        let call = self.renders.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on.contains(&call) {
            return Err(MaestroError::RenderFailed {
                reason: format!("mock failure injected on render {call}"),
            });
        }

        let frames = (request.max_audio_length_ms as usize * SAMPLE_RATE as usize) / 1000;
        let freq = 110.0 + (request.seed % 880) as f32;
        let mut samples = Vec::with_capacity(frames * 2);
        for i in 0..frames {
            let t = i as f32 / SAMPLE_RATE as f32;
            let value = (2.0 * std::f32::consts::PI * freq * t).sin() * 0.8;
            samples.push(value); // left
            samples.push(value * 0.9); // right
        }

        Waveform::from_interleaved(samples, 2, SAMPLE_RATE)
    }
}

impl GpuOccupant for MockAudioModel {
    fn occupant_name(&self) -> &str {
        &self.identity
    }

    fn offload(&self) -> Result<bool> {
        Ok(true)
    }
}
