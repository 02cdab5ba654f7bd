//! Audio-generation model interfaces and implementations
//!
//! This module provides:
//! - `AudioModel` trait for generative audio backends
//! - HTTP bridge client for the real model host
//! - GPU/VRAM detection
//! - Mock implementation for testing

mod bridge;
mod gpu;
mod mock;
mod model;

pub use bridge::BridgeAudioModel;
pub use gpu::{can_run_audio_model, gpu_status_summary, GpuInfo, LoadStrategy};
pub use mock::MockAudioModel;
pub use model::{AudioModel, RenderRequest};
