//! SRT rendering and parsing.
//!
//! SRT uses millisecond timing (HH:MM:SS,mmm). Seconds are truncated, not
//! rounded, to whole milliseconds; hours are not wrapped.

use crate::error::{Result, ScribeError};
use crate::stt::Segment;

/// Guards against `0.001 * 1000.0 == 0.99999...` truncating a whole millisecond away.
const TRUNCATION_EPSILON_MS: f64 = 1e-6;

/// Format seconds as an SRT timestamp (HH:MM:SS,mmm).
///
/// Negative and non-finite inputs clamp to zero.
pub fn format_srt_time(seconds: f64) -> String {
    let ms = if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0 + TRUNCATION_EPSILON_MS).floor() as u64
    } else {
        0
    };

    let millis = ms % 1000;
    let total_secs = ms / 1000;
    let secs = total_secs % 60;
    let total_mins = total_secs / 60;
    let mins = total_mins % 60;
    let hours = total_mins / 60;

    format!("{:02}:{:02}:{:02},{:03}", hours, mins, secs, millis)
}

/// Render segments as an SRT document.
///
/// Every cue ends with a blank line; an empty sequence renders as "".
pub fn render_srt(segments: &[Segment]) -> String {
    let mut output = String::new();

    for (i, segment) in segments.iter().enumerate() {
        output.push_str(&format!("{}\n", i + 1));
        output.push_str(&format!(
            "{} --> {}\n",
            format_srt_time(segment.start_seconds),
            format_srt_time(segment.end_seconds)
        ));
        output.push_str(segment.text.trim());
        output.push_str("\n\n");
    }

    output
}

/// Parse an SRT timestamp back into seconds.
pub fn parse_srt_time(value: &str) -> Option<f64> {
    let (hms, millis) = value.trim().split_once(',')?;
    let mut parts = hms.split(':');
    let hours: u64 = parts.next()?.parse().ok()?;
    let mins: u64 = parts.next()?.parse().ok()?;
    let secs: u64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || mins >= 60 || secs >= 60 || millis.len() != 3 {
        return None;
    }
    let millis: u64 = millis.parse().ok()?;

    let total_ms = ((hours * 60 + mins) * 60 + secs) * 1000 + millis;
    Some(total_ms as f64 / 1000.0)
}

/// Parse an SRT document into segments.
///
/// Cue indices are not validated; multi-line cue text is joined with `\n`.
pub fn parse_srt(input: &str) -> Result<Vec<Segment>> {
    let normalized = input.replace("\r\n", "\n");
    let mut segments = Vec::new();
    let mut lines = normalized.lines().peekable();

    loop {
        while lines.peek().is_some_and(|l| l.trim().is_empty()) {
            lines.next();
        }
        let Some(index_line) = lines.next() else {
            break;
        };

        let timing = lines.next().ok_or_else(|| parse_error(index_line, "missing timing line"))?;
        let (start, end) = timing
            .split_once("-->")
            .ok_or_else(|| parse_error(timing, "missing -->"))?;
        let start_seconds =
            parse_srt_time(start).ok_or_else(|| parse_error(timing, "bad start time"))?;
        let end_seconds = parse_srt_time(end).ok_or_else(|| parse_error(timing, "bad end time"))?;

        let mut text_lines = Vec::new();
        while let Some(line) = lines.peek() {
            if line.trim().is_empty() {
                break;
            }
            text_lines.push(*line);
            lines.next();
        }

        segments.push(Segment::new(start_seconds, end_seconds, text_lines.join("\n")));
    }

    Ok(segments)
}

fn parse_error(line: &str, reason: &str) -> ScribeError {
    ScribeError::Other(format!("invalid SRT near {:?}: {}", line, reason))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_srt_time() {
        assert_eq!(format_srt_time(0.0), "00:00:00,000");
        assert_eq!(format_srt_time(1.0), "00:00:01,000");
        assert_eq!(format_srt_time(1.5), "00:00:01,500");
        assert_eq!(format_srt_time(60.0), "00:01:00,000");
        assert_eq!(format_srt_time(3600.0), "01:00:00,000");
        assert_eq!(format_srt_time(3723.456), "01:02:03,456");
    }

    #[test]
    fn test_format_srt_time_truncates() {
        assert_eq!(format_srt_time(1.2349), "00:00:01,234");
        assert_eq!(format_srt_time(0.9999), "00:00:00,999");
        assert_eq!(format_srt_time(0.001), "00:00:00,001");
    }

    #[test]
    fn test_format_srt_time_hours_unbounded_and_clamped() {
        assert_eq!(format_srt_time(100.0 * 3600.0), "100:00:00,000");
        assert_eq!(format_srt_time(-3.0), "00:00:00,000");
        assert_eq!(format_srt_time(f64::NAN), "00:00:00,000");
    }

    #[test]
    fn test_render_basic_srt() {
        let segments = vec![
            Segment::new(1.0, 4.0, " Hello, world! "),
            Segment::new(60.0, 63.0, "y"),
        ];
        let expected = "1\n00:00:01,000 --> 00:00:04,000\nHello, world!\n\n\
                        2\n00:01:00,000 --> 00:01:03,000\ny\n\n";
        assert_eq!(render_srt(&segments), expected);
    }

    #[test]
    fn test_render_empty_sequence() {
        assert_eq!(render_srt(&[]), "");
    }

    #[test]
    fn test_render_keeps_empty_text_cue() {
        let output = render_srt(&[Segment::new(0.0, 1.0, "   ")]);
        assert_eq!(output, "1\n00:00:00,000 --> 00:00:01,000\n\n\n");
    }

    #[test]
    fn test_write_then_parse_recovers_segments() {
        let segments = vec![
            Segment::new(0.0, 5.0, "x"),
            Segment::new(60.1234, 63.9876, "second line"),
            Segment::new(3599.5, 3601.25, "across the hour"),
        ];

        let parsed = parse_srt(&render_srt(&segments)).unwrap();
        assert_eq!(parsed.len(), segments.len());
        for (original, back) in segments.iter().zip(&parsed) {
            assert!((original.start_seconds - back.start_seconds).abs() < 0.001);
            assert!((original.end_seconds - back.end_seconds).abs() < 0.001);
            assert!(back.start_seconds <= original.start_seconds);
            assert_eq!(back.text, original.text);
        }
    }

    #[test]
    fn test_parse_handles_crlf_and_multiline() {
        let input = "1\r\n00:00:01,000 --> 00:00:02,500\r\nline one\r\nline two\r\n\r\n";
        let parsed = parse_srt(input).unwrap();
        assert_eq!(parsed, vec![Segment::new(1.0, 2.5, "line one\nline two")]);
    }

    #[test]
    fn test_parse_rejects_malformed_timing() {
        assert!(parse_srt("1\n00:00:01 --> 00:00:02,000\nx\n").is_err());
        assert!(parse_srt("1\nno arrow here\nx\n").is_err());
        assert!(parse_srt("1\n").is_err());
    }

    #[test]
    fn test_parse_srt_time() {
        assert_eq!(parse_srt_time("01:02:03,456"), Some(3723.456));
        assert_eq!(parse_srt_time(" 00:00:00,000 "), Some(0.0));
        assert_eq!(parse_srt_time("00:61:00,000"), None);
        assert_eq!(parse_srt_time("00:00:00.000"), None);
    }
}
