//! Speech synthesis backends.
//!
//! No neural model ships with the service; [`ToneSynthesizer`] produces a
//! deterministic test tone so the whole pipeline can run end to end.

use std::f64::consts::PI;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::generation::GenerationTask;

pub const SAMPLE_RATE: u32 = 22_050;
const TONE_HZ: f64 = 440.0;
const TONE_SECONDS: u32 = 2;

#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Produce audio for `task` and return where it was written.
    async fn synthesize(&self, task: &GenerationTask) -> Result<PathBuf, AppError>;
}

/// Writes `<output_dir>/<generation_id>.wav` containing a 440 Hz tone.
#[derive(Debug, Clone)]
pub struct ToneSynthesizer {
    output_dir: PathBuf,
}

impl ToneSynthesizer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

#[async_trait]
impl Synthesizer for ToneSynthesizer {
    async fn synthesize(&self, task: &GenerationTask) -> Result<PathBuf, AppError> {
        tokio::fs::create_dir_all(&self.output_dir).await?;

        let path = self.output_dir.join(format!("{}.wav", task.generation_id));
        let samples = tone(TONE_HZ, TONE_SECONDS, SAMPLE_RATE);
        tokio::fs::write(&path, encode_wav(&samples, SAMPLE_RATE)).await?;

        tracing::info!("Audio saved to {}", path.display());
        Ok(path)
    }
}

/// Half-amplitude sine wave as 16-bit samples.
pub fn tone(frequency: f64, seconds: u32, sample_rate: u32) -> Vec<i16> {
    let count = (seconds * sample_rate) as usize;
    (0..count)
        .map(|n| {
            let t = n as f64 / sample_rate as f64;
            (0.5 * (2.0 * PI * frequency * t).sin() * i16::MAX as f64) as i16
        })
        .collect()
}

/// Mono 16-bit PCM RIFF/WAVE encoding.
pub fn encode_wav(samples: &[i16], sample_rate: u32) -> Vec<u8> {
    let data_len = (samples.len() * 2) as u32;
    let mut out = Vec::with_capacity(44 + data_len as usize);

    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&1u16.to_le_bytes()); // mono
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&(sample_rate * 2).to_le_bytes()); // byte rate
    out.extend_from_slice(&2u16.to_le_bytes()); // block align
    out.extend_from_slice(&16u16.to_le_bytes()); // bits per sample

    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    for sample in samples {
        out.extend_from_slice(&sample.to_le_bytes());
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wav_header_describes_payload() {
        let bytes = encode_wav(&[0, 1, -1], 8_000);

        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(u32::from_le_bytes(bytes[4..8].try_into().unwrap()), 36 + 6);
        assert_eq!(u32::from_le_bytes(bytes[24..28].try_into().unwrap()), 8_000);
        assert_eq!(u32::from_le_bytes(bytes[40..44].try_into().unwrap()), 6);
        assert_eq!(bytes.len(), 44 + 6);
    }

    #[test]
    fn tone_length_and_amplitude() {
        let samples = tone(440.0, 2, SAMPLE_RATE);
        assert_eq!(samples.len(), 44_100);
        assert_eq!(samples[0], 0);
        assert!(samples.iter().all(|s| s.unsigned_abs() <= (i16::MAX / 2 + 1) as u16));
    }
}
