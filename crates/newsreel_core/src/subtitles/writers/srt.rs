//! SRT subtitle writer.

use std::fmt::Write as _;

use crate::subtitles::types::SubtitleTrack;

/// Render a track as an SRT document (1-based cue numbering).
pub fn write_srt(track: &SubtitleTrack) -> String {
    let mut doc = String::new();
    for (i, segment) in track.segments.iter().enumerate() {
        let _ = writeln!(doc, "{}", i + 1);
        let _ = writeln!(
            doc,
            "{} --> {}",
            format_srt_time(segment.start_secs),
            format_srt_time(segment.end_secs)
        );
        let _ = writeln!(doc, "{}", segment.text);
        doc.push('\n');
    }
    doc
}

/// `HH:MM:SS,mmm` with millisecond precision.
pub fn format_srt_time(secs: f64) -> String {
    let secs = secs.max(0.0);
    let total_ms = (secs * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let total_s = total_ms / 1000;
    let s = total_s % 60;
    let m = (total_s / 60) % 60;
    let h = total_s / 3600;
    format!("{:02}:{:02}:{:02},{:03}", h, m, s, ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subtitles::types::{SubtitleSegment, TrackSource};

    #[test]
    fn formats_times() {
        assert_eq!(format_srt_time(0.0), "00:00:00,000");
        assert_eq!(format_srt_time(61.234), "00:01:01,234");
        assert_eq!(format_srt_time(3600.0), "01:00:00,000");
    }

    #[test]
    fn cues_are_numbered_from_one() {
        let track = SubtitleTrack {
            segments: vec![
                SubtitleSegment {
                    start_secs: 0.0,
                    end_secs: 1.5,
                    text: "first".to_string(),
                },
                SubtitleSegment {
                    start_secs: 1.5,
                    end_secs: 3.0,
                    text: "second".to_string(),
                },
            ],
            source: TrackSource::Transcribed,
        };
        let doc = write_srt(&track);
        assert!(doc.starts_with("1\n00:00:00,000 --> 00:00:01,500\nfirst\n\n"));
        assert!(doc.contains("2\n00:00:01,500 --> 00:00:03,000\nsecond\n"));
    }
}
