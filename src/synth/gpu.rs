//! GPU detection and VRAM budgeting for the audio model
//!
//! Detects available GPU hardware and decides how the generative pipeline
//! should load its weights: fully resident, or with the language head and
//! the vocoder swapped in and out of VRAM.

use std::process::Command;

use serde::{Deserialize, Serialize};

/// How the audio model's weights should be materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadStrategy {
    /// Whole pipeline resident - requires 12GB+ free VRAM
    FullyResident,
    /// Lazy load, swapping the generator and the vocoder - requires 6GB+
    LazySwap,
    /// CPU inference - no GPU required, slow
    Cpu,
}

impl LoadStrategy {
    /// Minimum free VRAM in GB for this strategy
    pub fn min_vram_gb(&self) -> f32 {
        match self {
            Self::FullyResident => 12.0,
            Self::LazySwap => 6.0,
            Self::Cpu => 0.0,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::FullyResident => "Whole pipeline resident (fastest, requires 12GB+ VRAM)",
            Self::LazySwap => "Lazy load with component swapping (requires 6GB+ VRAM)",
            Self::Cpu => "CPU inference (slowest, no GPU required)",
        }
    }
}

/// Information about the detected GPU
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GpuInfo {
    /// GPU name/model
    pub name: String,
    /// Total VRAM in GB
    pub vram_total_gb: f32,
    /// Available/free VRAM in GB
    pub vram_available_gb: f32,
    /// Driver version
    pub driver_version: String,
    /// Whether the GPU can host the audio model at all
    pub suitable_for_render: bool,
    /// Recommended load strategy
    pub recommended_strategy: LoadStrategy,
}

impl GpuInfo {
    /// Detect GPU information from the system.
    ///
    /// Currently supports NVIDIA GPUs via nvidia-smi.
    /// Returns None if no compatible GPU is found.
    pub fn detect() -> Option<Self> {
        Self::detect_nvidia()
    }

    fn detect_nvidia() -> Option<Self> {
        let output = Command::new("nvidia-smi")
            .args([
                "--query-gpu=name,memory.total,memory.free,driver_version",
                "--format=csv,noheader,nounits",
            ])
            .output()
            .ok()?;

        if !output.status.success() {
            return None;
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let line = stdout.lines().next()?;
        let parts: Vec<&str> = line.split(',').map(|s| s.trim()).collect();

        if parts.len() < 4 {
            return None;
        }

        let name = parts[0].to_string();
        let vram_total_mb: f32 = parts[1].parse().ok()?;
        let vram_free_mb: f32 = parts[2].parse().ok()?;
        let driver_version = parts[3].to_string();

        let vram_total_gb = vram_total_mb / 1024.0;
        let vram_available_gb = vram_free_mb / 1024.0;

        let recommended_strategy = if vram_available_gb >= 12.0 {
            LoadStrategy::FullyResident
        } else if vram_available_gb >= 6.0 {
            LoadStrategy::LazySwap
        } else {
            LoadStrategy::Cpu
        };

        // The generator alone needs ~6GB even with the vocoder swapped out
        let suitable_for_render = vram_available_gb >= 6.0;

        Some(Self {
            name,
            vram_total_gb,
            vram_available_gb,
            driver_version,
            suitable_for_render,
            recommended_strategy,
        })
    }
}

/// Check whether the system can run the audio model.
///
/// Returns (can_run, recommended_strategy, reason). CPU fallback means
/// this always "can run", just possibly very slowly.
pub fn can_run_audio_model() -> (bool, LoadStrategy, String) {
    match GpuInfo::detect() {
        Some(gpu) => {
            if gpu.suitable_for_render {
                (
                    true,
                    gpu.recommended_strategy,
                    format!(
                        "GPU detected: {} with {:.1}GB available VRAM",
                        gpu.name, gpu.vram_available_gb
                    ),
                )
            } else {
                (
                    true,
                    LoadStrategy::Cpu,
                    format!(
                        "GPU {} has insufficient VRAM ({:.1}GB available, 6GB required). Using CPU fallback.",
                        gpu.name, gpu.vram_available_gb
                    ),
                )
            }
        }
        None => (
            true,
            LoadStrategy::Cpu,
            "No compatible GPU detected. The audio model will use CPU inference (slower)."
                .to_string(),
        ),
    }
}

/// Human-readable summary of GPU status for the CLI.
pub fn gpu_status_summary() -> String {
    match GpuInfo::detect() {
        Some(gpu) => {
            format!(
                "GPU: {}\n\
                 VRAM: {:.1}GB total, {:.1}GB available\n\
                 Driver: {}\n\
                 Audio model: {}\n\
                 Recommended: {}",
                gpu.name,
                gpu.vram_total_gb,
                gpu.vram_available_gb,
                gpu.driver_version,
                if gpu.suitable_for_render {
                    "Ready"
                } else {
                    "CPU fallback"
                },
                gpu.recommended_strategy.description()
            )
        }
        None => "No compatible GPU detected. The audio model will use CPU inference.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_vram_ordering() {
        assert!(LoadStrategy::FullyResident.min_vram_gb() > LoadStrategy::LazySwap.min_vram_gb());
        assert!(LoadStrategy::LazySwap.min_vram_gb() > LoadStrategy::Cpu.min_vram_gb());
        assert_eq!(LoadStrategy::Cpu.min_vram_gb(), 0.0);
    }

    #[test]
    fn test_can_run_always_returns_valid_result() {
        // Must not panic, with or without a GPU present.
        let (can_run, strategy, reason) = can_run_audio_model();
        assert!(can_run);
        assert!(!reason.is_empty());
        let _ = strategy.description();
    }

    #[test]
    fn test_status_summary_is_nonempty() {
        assert!(!gpu_status_summary().is_empty());
    }
}
