//! Plain-text transcript rendering.

use crate::stt::Segment;

/// Render the engine's full text when present, otherwise one trimmed line per segment.
pub fn render_text(full_text: Option<&str>, segments: &[Segment]) -> String {
    match full_text {
        Some(text) => text.to_string(),
        None => {
            let mut output = String::new();
            for segment in segments {
                output.push_str(segment.text.trim());
                output.push('\n');
            }
            output
        }
    }
}
