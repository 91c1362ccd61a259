//! Transcription through an external program.
//!
//! The program is invoked as `<program> [args...] [--language <code>] <source>`
//! and must print a JSON transcript on stdout:
//! `{"full_text": "...", "segments": [{"start": 0.0, "end": 1.5, "text": "..."}]}`.

use crate::error::{Result, ScribeError};
use crate::media::CommandExecutor;
use crate::stt::transcriber::{Transcriber, TranscribeRequest, Transcript};
use std::path::Path;
use std::sync::Arc;

pub struct CommandTranscriber {
    executor: Arc<dyn CommandExecutor>,
    program: String,
    args: Vec<String>,
    model_name: String,
}

impl std::fmt::Debug for CommandTranscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandTranscriber")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("model_name", &self.model_name)
            .finish()
    }
}

impl CommandTranscriber {
    /// Build from an argv list; the program must be resolvable now.
    pub fn new(executor: Arc<dyn CommandExecutor>, argv: &[String]) -> Result<Self> {
        let (program, args) = argv.split_first().ok_or_else(|| ScribeError::EngineLoad {
            message: "no transcription command configured".to_string(),
        })?;

        let resolved = which::which(program).map_err(|e| ScribeError::EngineLoad {
            message: format!("transcription command {} is not runnable: {}", program, e),
        })?;
        tracing::debug!(program = %resolved.display(), "resolved transcription command");

        let model_name = Path::new(program)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| program.clone());

        Ok(Self {
            executor,
            program: program.clone(),
            args: args.to_vec(),
            model_name,
        })
    }

    fn build_args<'a>(&'a self, request: &'a TranscribeRequest, source: &'a str) -> Vec<&'a str> {
        let mut args: Vec<&str> = self.args.iter().map(String::as_str).collect();
        if let Some(code) = request.language.as_code() {
            args.push("--language");
            args.push(code);
        }
        args.push(source);
        args
    }
}

impl Transcriber for CommandTranscriber {
    fn transcribe(&self, request: &TranscribeRequest) -> Result<Transcript> {
        let source = request.source.to_string_lossy();
        let args = self.build_args(request, &source);

        let transcribe_error = |message: String| ScribeError::Transcribe {
            source_path: request.source.display().to_string(),
            message,
        };

        let stdout = self
            .executor
            .execute(&self.program, &args)
            .map_err(|e| transcribe_error(e.to_string()))?;

        serde_json::from_str(&stdout)
            .map_err(|e| transcribe_error(format!("unexpected output from {}: {}", self.program, e)))
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn is_ready(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stt::transcriber::{LanguageHint, Segment};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct ScriptedExecutor {
        calls: Mutex<Vec<(String, Vec<String>)>>,
        responses: Mutex<VecDeque<Result<String>>>,
    }

    impl ScriptedExecutor {
        fn new(responses: Vec<Result<String>>) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                responses: Mutex::new(responses.into()),
            })
        }
    }

    impl CommandExecutor for ScriptedExecutor {
        fn execute(&self, command: &str, args: &[&str]) -> Result<String> {
            self.calls.lock().unwrap().push((
                command.to_string(),
                args.iter().map(|s| s.to_string()).collect(),
            ));
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(String::new()))
        }
    }

    fn shell_program() -> String {
        // `sh` exists on every unix test host.
        "sh".to_string()
    }

    #[cfg(unix)]
    #[test]
    fn test_parses_engine_json() {
        let executor = ScriptedExecutor::new(vec![Ok(
            r#"{"full_text":"hello","segments":[{"start":0.5,"end":1.25,"text":"hello"}]}"#
                .to_string(),
        )]);
        let engine = CommandTranscriber::new(
            executor.clone(),
            &[shell_program(), "asr.sh".to_string()],
        )
        .unwrap();

        let request = TranscribeRequest::new("/tmp/chunk.wav", LanguageHint::parse("de"));
        let transcript = engine.transcribe(&request).unwrap();
        assert_eq!(transcript.full_text, "hello");
        assert_eq!(transcript.segments, vec![Segment::new(0.5, 1.25, "hello")]);

        let calls = executor.calls.lock().unwrap().clone();
        assert_eq!(calls[0].0, "sh");
        assert_eq!(calls[0].1, vec!["asr.sh", "--language", "de", "/tmp/chunk.wav"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_auto_language_passes_no_flag() {
        let executor = ScriptedExecutor::new(vec![Ok(r#"{"full_text":"","segments":[]}"#.to_string())]);
        let engine = CommandTranscriber::new(executor.clone(), &[shell_program()]).unwrap();

        engine
            .transcribe(&TranscribeRequest::new("a.wav", LanguageHint::Auto))
            .unwrap();
        let calls = executor.calls.lock().unwrap().clone();
        assert_eq!(calls[0].1, vec!["a.wav"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_bad_output_is_transcribe_error() {
        let executor = ScriptedExecutor::new(vec![Ok("Segmentation fault".to_string())]);
        let engine = CommandTranscriber::new(executor, &[shell_program()]).unwrap();

        match engine.transcribe(&TranscribeRequest::new("a.wav", LanguageHint::Auto)) {
            Err(ScribeError::Transcribe { source_path, message }) => {
                assert_eq!(source_path, "a.wav");
                assert!(message.contains("unexpected output"));
            }
            other => panic!("Expected Transcribe error, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_tool_failure_is_transcribe_error() {
        let executor = ScriptedExecutor::new(vec![Err(ScribeError::ToolFailed {
            tool: "sh".to_string(),
            message: "exited with exit status: 2".to_string(),
        })]);
        let engine = CommandTranscriber::new(executor, &[shell_program()]).unwrap();

        let err = engine
            .transcribe(&TranscribeRequest::new("a.wav", LanguageHint::Auto))
            .unwrap_err();
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("exit status: 2"));
    }

    #[test]
    fn test_missing_program_fails_at_load() {
        let executor = ScriptedExecutor::new(vec![]);
        let err = CommandTranscriber::new(executor, &["batchscribe-no-such-asr".to_string()])
            .unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_empty_argv_fails_at_load() {
        let executor = ScriptedExecutor::new(vec![]);
        match CommandTranscriber::new(executor, &[]) {
            Err(ScribeError::EngineLoad { .. }) => {}
            _ => panic!("Expected EngineLoad error"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_non_executable_program_fails_at_load() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        let program = dir.path().join("fakeasr");
        std::fs::write(&program, "#!/bin/sh\necho '{}'\n").unwrap();
        std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o644)).unwrap();

        let argv = [program.to_string_lossy().to_string()];
        match CommandTranscriber::new(ScriptedExecutor::new(vec![]), &argv) {
            Err(e @ ScribeError::EngineLoad { .. }) => assert!(e.is_fatal()),
            other => panic!("Expected EngineLoad error, got {:?}", other),
        }

        std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o755)).unwrap();
        let engine = CommandTranscriber::new(ScriptedExecutor::new(vec![]), &argv).unwrap();
        assert_eq!(engine.model_name(), "fakeasr");
    }

    #[test]
    fn test_missing_explicit_path_fails_at_load() {
        let executor = ScriptedExecutor::new(vec![]);
        let err = CommandTranscriber::new(executor, &["/nonexistent/dir/tool".to_string()])
            .unwrap_err();
        assert!(err.is_fatal());
    }
}
