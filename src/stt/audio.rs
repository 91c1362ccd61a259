//! Loading media into the 16 kHz mono PCM buffer in-process engines consume.

use crate::defaults::SAMPLE_RATE;
use crate::error::{Result, ScribeError};
use std::io::Read;
use std::path::Path;
use std::process::Command;

/// Read a file as 16 kHz mono PCM.
///
/// 16-bit integer WAV files (including chunk artifacts) are parsed directly;
/// anything else, 24-bit and float WAV included, is decoded by `ffmpeg`.
pub fn load_pcm(path: &Path, ffmpeg: &str) -> Result<Vec<i16>> {
    let is_wav = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("wav"));

    if is_wav && is_pcm16_wav(path) {
        let file = std::fs::File::open(path)?;
        read_wav(Box::new(std::io::BufReader::new(file)), path)
    } else {
        decode_with_ffmpeg(path, ffmpeg)
    }
}

fn is_pcm16_wav(path: &Path) -> bool {
    hound::WavReader::open(path).is_ok_and(|reader| is_pcm16(reader.spec()))
}

fn is_pcm16(spec: hound::WavSpec) -> bool {
    spec.sample_format == hound::SampleFormat::Int && spec.bits_per_sample == 16
}

/// Parse 16-bit WAV data, downmixing stereo and resampling to 16 kHz.
pub fn read_wav(reader: Box<dyn Read + Send>, path: &Path) -> Result<Vec<i16>> {
    let wav_error = |message: String| ScribeError::Transcribe {
        source_path: path.display().to_string(),
        message,
    };

    let mut wav_reader = hound::WavReader::new(reader)
        .map_err(|e| wav_error(format!("failed to parse WAV file: {}", e)))?;

    let spec = wav_reader.spec();
    if !is_pcm16(spec) {
        return Err(wav_error(format!(
            "unsupported WAV encoding: {}-bit {:?}",
            spec.bits_per_sample, spec.sample_format
        )));
    }

    let raw_samples: Vec<i16> = wav_reader
        .samples::<i16>()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| wav_error(format!("failed to read WAV samples: {}", e)))?;

    let mono_samples = if spec.channels > 1 {
        let channels = spec.channels as usize;
        raw_samples
            .chunks_exact(channels)
            .map(|frame| {
                let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                (sum / channels as i32) as i16
            })
            .collect()
    } else {
        raw_samples
    };

    Ok(resample(&mono_samples, spec.sample_rate, SAMPLE_RATE))
}

fn decode_with_ffmpeg(path: &Path, ffmpeg: &str) -> Result<Vec<i16>> {
    let rate = SAMPLE_RATE.to_string();
    tracing::debug!(file = %path.display(), "decoding with {}", ffmpeg);

    let output = Command::new(ffmpeg)
        .args(["-nostdin", "-i"])
        .arg(path)
        .args(["-ac", "1", "-ar", rate.as_str(), "-f", "s16le", "-", "-loglevel", "error"])
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ScribeError::ToolNotFound {
                    tool: ffmpeg.to_string(),
                }
            } else {
                ScribeError::Io(e)
            }
        })?;

    if !output.status.success() {
        return Err(ScribeError::Transcribe {
            source_path: path.display().to_string(),
            message: format!(
                "{} could not decode audio: {}",
                ffmpeg,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }

    Ok(output
        .stdout
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
        .collect())
}

/// Simple linear interpolation resampling.
fn resample(samples: &[i16], from_rate: u32, to_rate: u32) -> Vec<i16> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let source_pos = i as f64 * ratio;
            let source_idx = (source_pos.floor() as usize).min(samples.len() - 1);
            let fraction = source_pos - source_idx as f64;

            if source_idx + 1 >= samples.len() {
                samples[source_idx]
            } else {
                let left = samples[source_idx] as f64;
                let right = samples[source_idx + 1] as f64;
                (left + (right - left) * fraction) as i16
            }
        })
        .collect()
}

/// Convert i16 audio samples to f32 normalized to [-1.0, 1.0]
pub fn to_f32(samples: &[i16]) -> Vec<f32> {
    samples
        .iter()
        .map(|&sample| sample as f32 / 32768.0)
        .collect()
}
