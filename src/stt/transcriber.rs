use crate::defaults;
use crate::error::{Result, ScribeError};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// A timed unit of transcribed text. Times are in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    #[serde(rename = "start")]
    pub start_seconds: f64,
    #[serde(rename = "end")]
    pub end_seconds: f64,
    #[serde(default)]
    pub text: String,
}

impl Segment {
    pub fn new(start_seconds: f64, end_seconds: f64, text: impl Into<String>) -> Self {
        Self {
            start_seconds,
            end_seconds,
            text: text.into(),
        }
    }
}

/// Word-level timing reported by some engines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordTiming {
    #[serde(rename = "start")]
    pub start_seconds: f64,
    #[serde(rename = "end")]
    pub end_seconds: f64,
    pub word: String,
}

/// Everything an engine returns for one source.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Transcript {
    #[serde(default)]
    pub full_text: String,
    #[serde(default)]
    pub segments: Vec<Segment>,
    #[serde(default)]
    pub words: Option<Vec<WordTiming>>,
    #[serde(default)]
    pub language: Option<String>,
}

impl Transcript {
    /// Build a transcript whose full text is the segments' text joined.
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        let full_text = segments
            .iter()
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            full_text,
            segments,
            words: None,
            language: None,
        }
    }
}

/// Language to transcribe in; `Auto` lets the engine detect it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LanguageHint {
    #[default]
    Auto,
    Code(String),
}

impl LanguageHint {
    /// Parse a user-supplied value; `auto` and the empty string mean detection.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case(defaults::AUTO_LANGUAGE) {
            LanguageHint::Auto
        } else {
            LanguageHint::Code(value.to_ascii_lowercase())
        }
    }

    /// The engine-facing form: `None` means no hint.
    pub fn as_code(&self) -> Option<&str> {
        match self {
            LanguageHint::Auto => None,
            LanguageHint::Code(code) => Some(code),
        }
    }
}

impl fmt::Display for LanguageHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_code().unwrap_or(defaults::AUTO_LANGUAGE))
    }
}

/// Engine knobs that do not affect the pipeline's handling of the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TranscribeOptions {
    pub condition_on_previous: bool,
    pub word_timestamps: bool,
}

impl TranscribeOptions {
    /// Settings for a single call over a whole file.
    pub fn whole_file() -> Self {
        Self {
            condition_on_previous: false,
            word_timestamps: true,
        }
    }

    /// Settings for one call per chunk; segment timing only.
    pub fn chunk() -> Self {
        Self::default()
    }
}

/// One call into the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscribeRequest {
    pub source: PathBuf,
    pub language: LanguageHint,
    pub options: TranscribeOptions,
}

impl TranscribeRequest {
    pub fn new(source: impl Into<PathBuf>, language: LanguageHint) -> Self {
        Self {
            source: source.into(),
            language,
            options: TranscribeOptions::default(),
        }
    }

    pub fn with_options(mut self, options: TranscribeOptions) -> Self {
        self.options = options;
        self
    }
}

/// Trait for speech-to-text transcription.
///
/// This trait allows swapping implementations (Whisper, an external command, mock).
/// Timestamps in the returned transcript are relative to the start of `request.source`.
pub trait Transcriber: Send + Sync {
    /// Transcribe the media file named by the request.
    fn transcribe(&self, request: &TranscribeRequest) -> Result<Transcript>;

    /// Get the name of the loaded model
    fn model_name(&self) -> &str;

    /// Check if the transcriber is ready
    fn is_ready(&self) -> bool;
}

/// Implement Transcriber for Arc<T> to allow sharing across threads.
impl<T: Transcriber + ?Sized> Transcriber for Arc<T> {
    fn transcribe(&self, request: &TranscribeRequest) -> Result<Transcript> {
        (**self).transcribe(request)
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }

    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }
}

#[derive(Debug, Clone)]
enum MockResponse {
    Transcript(Transcript),
    Failure(String),
}

/// A call observed by [`MockTranscriber`].
#[derive(Debug, Clone, PartialEq)]
pub struct MockCall {
    pub request: TranscribeRequest,
    /// Whether the source file existed while the engine was running.
    pub source_existed: bool,
}

/// Mock transcriber for testing
///
/// Replays scripted responses in order, then falls back to its default.
#[derive(Debug)]
pub struct MockTranscriber {
    model_name: String,
    default_response: MockResponse,
    scripted: Mutex<VecDeque<MockResponse>>,
    calls: Mutex<Vec<MockCall>>,
}

impl MockTranscriber {
    /// Create a new mock transcriber with default settings
    pub fn new(model_name: &str) -> Self {
        Self {
            model_name: model_name.to_string(),
            default_response: MockResponse::Transcript(Transcript::from_segments(vec![
                Segment::new(0.0, 1.0, "mock transcription"),
            ])),
            scripted: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Configure the transcript returned once the script runs out
    pub fn with_response(mut self, transcript: Transcript) -> Self {
        self.default_response = MockResponse::Transcript(transcript);
        self
    }

    /// Configure the mock to fail on transcribe once the script runs out
    pub fn with_failure(mut self) -> Self {
        self.default_response = MockResponse::Failure("mock transcription failure".to_string());
        self
    }

    /// Queue a transcript for the next unscripted call
    pub fn then_respond(self, transcript: Transcript) -> Self {
        self.lock_scripted()
            .push_back(MockResponse::Transcript(transcript));
        self
    }

    /// Queue a failure for the next unscripted call
    pub fn then_fail(self, message: &str) -> Self {
        self.lock_scripted()
            .push_back(MockResponse::Failure(message.to_string()));
        self
    }

    /// Get all recorded calls.
    pub fn calls(&self) -> Vec<MockCall> {
        self.lock_calls().clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock_calls().len()
    }

    fn lock_scripted(&self) -> std::sync::MutexGuard<'_, VecDeque<MockResponse>> {
        self.scripted.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_calls(&self) -> std::sync::MutexGuard<'_, Vec<MockCall>> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Transcriber for MockTranscriber {
    fn transcribe(&self, request: &TranscribeRequest) -> Result<Transcript> {
        self.lock_calls().push(MockCall {
            request: request.clone(),
            source_existed: request.source.exists(),
        });

        let response = self
            .lock_scripted()
            .pop_front()
            .unwrap_or_else(|| self.default_response.clone());

        match response {
            MockResponse::Transcript(transcript) => Ok(transcript),
            MockResponse::Failure(message) => Err(ScribeError::Transcribe {
                source_path: request.source.display().to_string(),
                message,
            }),
        }
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn is_ready(&self) -> bool {
        !matches!(self.default_response, MockResponse::Failure(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(source: &str) -> TranscribeRequest {
        TranscribeRequest::new(source, LanguageHint::Auto)
    }

    #[test]
    fn test_mock_transcriber_returns_default_response() {
        let transcriber = MockTranscriber::new("test-model");
        let result = transcriber.transcribe(&request("a.wav")).unwrap();
        assert_eq!(result.full_text, "mock transcription");
        assert_eq!(result.segments.len(), 1);
    }

    #[test]
    fn test_mock_transcriber_replays_script_then_default() {
        let transcriber = MockTranscriber::new("test-model")
            .with_response(Transcript::from_segments(vec![Segment::new(0.0, 1.0, "default")]))
            .then_respond(Transcript::from_segments(vec![Segment::new(0.0, 5.0, "x")]))
            .then_fail("engine crashed");

        assert_eq!(transcriber.transcribe(&request("1")).unwrap().full_text, "x");
        match transcriber.transcribe(&request("2")) {
            Err(ScribeError::Transcribe {
                source_path,
                message,
            }) => {
                assert_eq!(source_path, "2");
                assert_eq!(message, "engine crashed");
            }
            _ => panic!("Expected Transcribe error"),
        }
        assert_eq!(
            transcriber.transcribe(&request("3")).unwrap().full_text,
            "default"
        );
        assert_eq!(transcriber.call_count(), 3);
    }

    #[test]
    fn test_mock_transcriber_returns_error_when_configured() {
        let transcriber = MockTranscriber::new("test-model").with_failure();
        assert!(!transcriber.is_ready());

        match transcriber.transcribe(&request("a.wav")) {
            Err(ScribeError::Transcribe { message, .. }) => {
                assert_eq!(message, "mock transcription failure");
            }
            _ => panic!("Expected Transcribe error"),
        }
    }

    #[test]
    fn test_mock_records_requests() {
        let transcriber = MockTranscriber::new("test-model");
        let req = TranscribeRequest::new("/no/such/file.wav", LanguageHint::parse("EN"))
            .with_options(TranscribeOptions::whole_file());
        transcriber.transcribe(&req).unwrap();

        let calls = transcriber.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].request, req);
        assert!(!calls[0].source_existed);
    }

    #[test]
    fn test_arc_transcriber_delegates() {
        let mock = Arc::new(MockTranscriber::new("whisper-base"));
        let shared: Arc<dyn Transcriber> = mock.clone();
        assert_eq!(shared.model_name(), "whisper-base");
        assert!(shared.is_ready());
        shared.transcribe(&request("a")).unwrap();
        assert_eq!(mock.call_count(), 1);
    }

    #[test]
    fn test_language_hint_parse() {
        assert_eq!(LanguageHint::parse("auto"), LanguageHint::Auto);
        assert_eq!(LanguageHint::parse("AUTO"), LanguageHint::Auto);
        assert_eq!(LanguageHint::parse("  "), LanguageHint::Auto);
        assert_eq!(LanguageHint::parse("ZH"), LanguageHint::Code("zh".to_string()));
        assert_eq!(LanguageHint::Auto.as_code(), None);
        assert_eq!(LanguageHint::parse("en").as_code(), Some("en"));
        assert_eq!(LanguageHint::Auto.to_string(), "auto");
    }

    #[test]
    fn test_whole_file_options() {
        let options = TranscribeOptions::whole_file();
        assert!(!options.condition_on_previous);
        assert!(options.word_timestamps);
        assert!(!TranscribeOptions::chunk().word_timestamps);
    }

    #[test]
    fn test_transcript_from_segments_joins_trimmed_text() {
        let transcript = Transcript::from_segments(vec![
            Segment::new(0.0, 1.0, " Hello "),
            Segment::new(1.0, 2.0, ""),
            Segment::new(2.0, 3.0, "world"),
        ]);
        assert_eq!(transcript.full_text, "Hello world");
    }

    #[test]
    fn test_transcript_deserializes_engine_contract() {
        let json = r#"{
            "full_text": "hi there",
            "segments": [{"start": 0.0, "end": 1.5, "text": "hi there"}]
        }"#;
        let transcript: Transcript = serde_json::from_str(json).unwrap();
        assert_eq!(transcript.segments, vec![Segment::new(0.0, 1.5, "hi there")]);
        assert!(transcript.words.is_none());
    }
}
