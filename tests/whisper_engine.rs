#![cfg(feature = "whisper")]

use batchscribe::defaults::{SAMPLE_RATE, gpu_backend};
use batchscribe::stt::models::{default_models_dir, list_local_models, resolve_model_path};
use batchscribe::stt::{LanguageHint, TranscribeOptions, TranscribeRequest, Transcriber};
use batchscribe::stt::{WhisperConfig, WhisperTranscriber};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn find_model() -> Option<PathBuf> {
    let dir = default_models_dir();
    let name = list_local_models(&dir).into_iter().next();
    match name.and_then(|n| resolve_model_path(&n, Some(&dir)).ok()) {
        Some(path) => Some(path),
        None => {
            eprintln!("\nNo Whisper model in {}, skipping engine tests.", dir.display());
            eprintln!("Place a ggml-<name>.bin file there to run them.\n");
            None
        }
    }
}

/// Two seconds of a 440Hz tone followed by two seconds of silence.
fn write_tone(path: &Path) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    let rate = SAMPLE_RATE as f32;
    for i in 0..(SAMPLE_RATE * 4) {
        let t = i as f32 / rate;
        let sample = if t < 2.0 {
            (t * 440.0 * std::f32::consts::TAU).sin() * 8000.0
        } else {
            0.0
        };
        writer.write_sample(sample as i16).unwrap();
    }
    writer.finalize().unwrap();
}

fn load(model_path: PathBuf, use_gpu: bool) -> Option<WhisperTranscriber> {
    match WhisperTranscriber::new(WhisperConfig {
        model_path,
        threads: Some(4),
        use_gpu,
        ffmpeg: "ffmpeg".to_string(),
    }) {
        Ok(t) => Some(t),
        Err(e) => {
            eprintln!("[{}] Failed to load model: {e}, skipping", gpu_backend());
            None
        }
    }
}

#[test]
fn test_segments_stay_within_the_file() {
    let Some(model_path) = find_model() else {
        return;
    };
    let Some(transcriber) = load(model_path, false) else {
        return;
    };
    assert!(transcriber.is_ready());

    let dir = TempDir::new().unwrap();
    let wav = dir.path().join("tone.wav");
    write_tone(&wav);

    let request = TranscribeRequest::new(&wav, LanguageHint::parse("en"))
        .with_options(TranscribeOptions::whole_file());
    let transcript = transcriber.transcribe(&request).unwrap();

    for pair in transcript.segments.windows(2) {
        assert!(pair[0].start_seconds <= pair[1].start_seconds);
    }
    for segment in &transcript.segments {
        assert!(segment.start_seconds >= 0.0);
        assert!(segment.end_seconds >= segment.start_seconds);
        assert!(segment.end_seconds <= 4.5, "segment past end: {:?}", segment);
    }
    eprintln!(
        "[{}] {} segments from {}",
        gpu_backend(),
        transcript.segments.len(),
        transcriber.model_name()
    );
}

#[test]
fn test_chunk_options_transcribe_without_context() {
    let Some(model_path) = find_model() else {
        return;
    };
    let Some(transcriber) = load(model_path, true) else {
        return;
    };

    let dir = TempDir::new().unwrap();
    let wav = dir.path().join("chunk.wav");
    write_tone(&wav);

    let request = TranscribeRequest::new(&wav, LanguageHint::Auto)
        .with_options(TranscribeOptions::chunk());
    assert!(transcriber.transcribe(&request).is_ok());
}

#[test]
fn test_missing_model_is_engine_load_error() {
    let result = WhisperTranscriber::new(WhisperConfig {
        model_path: PathBuf::from("/nonexistent/ggml-none.bin"),
        threads: None,
        use_gpu: false,
        ffmpeg: "ffmpeg".to_string(),
    });
    assert!(matches!(result, Err(ref e) if e.is_fatal()));
}
