//! WAV encode/decode
//!
//! Disk format is 16-bit PCM WAV. Everything is converted to f32 on read;
//! float and 16/24/32-bit integer sources are accepted.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::audio::Waveform;
use crate::error::{MaestroError, Result};

/// Read a WAV file into a float waveform.
pub fn read_wav(path: &Path) -> Result<Waveform> {
    let reader = WavReader::open(path).map_err(|e| MaestroError::InvalidWav {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let spec = reader.spec();
    let channels = spec.channels as usize;
    let sample_rate = spec.sample_rate;

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| MaestroError::InvalidWav {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?,
        SampleFormat::Int => {
            let max = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max))
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| MaestroError::InvalidWav {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })?
        }
    };

    Waveform::from_interleaved(samples, channels, sample_rate)
}

/// Write a waveform to disk as 16-bit PCM WAV.
pub fn write_wav(path: &Path, waveform: &Waveform) -> Result<()> {
    let spec = WavSpec {
        channels: waveform.num_channels() as u16,
        sample_rate: waveform.sample_rate(),
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec).map_err(|e| MaestroError::InvalidWav {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    for &sample in waveform.samples() {
        let clamped = sample.clamp(-1.0, 1.0);
        writer
            .write_sample((clamped * 32767.0) as i16)
            .map_err(|e| MaestroError::InvalidWav {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
    }

    writer.finalize().map_err(|e| MaestroError::InvalidWav {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    Ok(())
}
