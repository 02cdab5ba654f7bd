//! Interleaved waveform buffer

use std::time::Duration;

use crate::error::{MaestroError, Result};

/// Interleaved audio buffer
///
/// Samples are stored in interleaved format: [L0, R0, L1, R1, ...]
/// This matches common audio file formats and simplifies I/O.
#[derive(Clone, Debug)]
pub struct Waveform {
    /// Interleaved sample data
    samples: Vec<f32>,
    /// Number of channels (1 = mono, 2 = stereo)
    num_channels: usize,
    /// Sample rate in Hz
    sample_rate: u32,
}

impl Waveform {
    /// Create a buffer from existing interleaved samples
    pub fn from_interleaved(
        samples: Vec<f32>,
        num_channels: usize,
        sample_rate: u32,
    ) -> Result<Self> {
        if num_channels == 0 {
            return Err(MaestroError::InvalidAudio {
                reason: "channel count is zero".to_string(),
            });
        }
        if samples.len() % num_channels != 0 {
            return Err(MaestroError::InvalidAudio {
                reason: format!(
                    "Sample count {} is not divisible by channel count {}",
                    samples.len(),
                    num_channels
                ),
            });
        }
        Ok(Self {
            samples,
            num_channels,
            sample_rate,
        })
    }

    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    /// Number of frames (samples per channel)
    pub fn num_frames(&self) -> usize {
        self.samples.len() / self.num_channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        self.num_frames() as f64 / self.sample_rate as f64
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Absolute peak amplitude across all channels
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
    }

    /// Scale so the peak lands at `target` linear full scale.
    ///
    /// A silent buffer is left unchanged.
    pub fn normalize_peak(&mut self, target: f32) {
        let peak = self.peak();
        if peak == 0.0 {
            return;
        }
        let scalar = target / peak;
        for s in &mut self.samples {
            *s *= scalar;
        }
    }

    /// Scale so the peak lands at `target_db` dB below full scale,
    /// e.g. -1.0 for distribution mastering.
    pub fn normalize_peak_db(&mut self, target_db: f32) {
        self.normalize_peak(10f32.powf(target_db / 20.0));
    }

    /// Linear fade-out over the tail of the buffer.
    ///
    /// The ramp runs 1.0 → 0.0 across the last `fade` worth of frames and
    /// applies uniformly to every channel of a frame. Buffers shorter than
    /// the fade window are left untouched.
    pub fn fade_out(&mut self, fade: Duration) {
        let fade_frames = (fade.as_secs_f64() * self.sample_rate as f64) as usize;
        let total = self.num_frames();
        if fade_frames == 0 || fade_frames >= total {
            return;
        }

        let start = total - fade_frames;
        for i in 0..fade_frames {
            let gain = if fade_frames == 1 {
                0.0
            } else {
                1.0 - i as f32 / (fade_frames - 1) as f32
            };
            let frame = start + i;
            for ch in 0..self.num_channels {
                self.samples[frame * self.num_channels + ch] *= gain;
            }
        }
    }

    /// Check the buffer contains no NaN/Inf samples
    pub fn is_valid(&self) -> bool {
        self.samples.iter().all(|s| s.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ramp_mono(n: usize) -> Waveform {
        let samples: Vec<f32> = (0..n).map(|i| i as f32 / n as f32).collect();
        Waveform::from_interleaved(samples, 1, 48_000).unwrap()
    }

    #[test]
    fn test_interleave_mismatch_rejected() {
        let err = Waveform::from_interleaved(vec![0.0; 3], 2, 48_000).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_AUDIO");
    }

    #[test]
    fn test_normalize_peak_db() {
        let mut wf = Waveform::from_interleaved(vec![0.0, 0.5, -0.25], 1, 48_000).unwrap();
        wf.normalize_peak_db(-1.0);
        let expected = 10f32.powf(-1.0 / 20.0);
        assert_relative_eq!(wf.peak(), expected, epsilon = 1e-6);
    }

    #[test]
    fn test_normalize_silence_unchanged() {
        let mut wf = Waveform::from_interleaved(vec![0.0; 8], 2, 48_000).unwrap();
        wf.normalize_peak_db(-1.0);
        assert_eq!(wf.peak(), 0.0);
    }

    #[test]
    fn test_fade_out_tail_reaches_zero() {
        let mut wf = Waveform::from_interleaved(vec![1.0; 48_000 * 4], 1, 48_000).unwrap();
        wf.fade_out(Duration::from_secs(1));
        let samples = wf.samples();
        assert_relative_eq!(*samples.last().unwrap(), 0.0, epsilon = 1e-6);
        // Start of the buffer untouched
        assert_relative_eq!(samples[0], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_fade_out_broadcasts_across_channels() {
        let mut wf = Waveform::from_interleaved(vec![1.0; 2 * 48_000 * 4], 2, 48_000).unwrap();
        wf.fade_out(Duration::from_secs(1));
        let samples = wf.samples();
        let n = samples.len();
        // Both channels of the final frame are silenced
        assert_relative_eq!(samples[n - 1], 0.0, epsilon = 1e-6);
        assert_relative_eq!(samples[n - 2], 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_fade_shorter_buffer_untouched() {
        let mut wf = ramp_mono(100);
        let before = wf.samples().to_vec();
        wf.fade_out(Duration::from_secs(1)); // 48000 frames > 100 frames
        assert_eq!(wf.samples(), before.as_slice());
    }

    #[test]
    fn test_duration() {
        let wf = Waveform::from_interleaved(vec![0.0; 96_000], 2, 48_000).unwrap();
        assert_relative_eq!(wf.duration_secs(), 1.0);
    }
}
