//! Narration transcription for time-aligned subtitles.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::io::CommandRunner;
use crate::subtitles::types::{SubtitleSegment, SubtitleTrack, TrackSource};

/// Produces a time-aligned track from a narration audio file.
///
/// Returns `None` on any failure; the caller falls back to even-split
/// timing, which is always available.
pub trait TranscriptionBackend: Send + Sync {
    fn transcribe(&self, audio: &Path, work_dir: &Path) -> Option<SubtitleTrack>;
}

/// Transcriber shelling out to the whisper CLI.
pub struct WhisperCliTranscriber {
    program: PathBuf,
    model: String,
    runner: CommandRunner,
}

impl WhisperCliTranscriber {
    pub fn new(program: PathBuf, model: String, runner: CommandRunner) -> Self {
        Self {
            program,
            model,
            runner,
        }
    }
}

impl TranscriptionBackend for WhisperCliTranscriber {
    fn transcribe(&self, audio: &Path, work_dir: &Path) -> Option<SubtitleTrack> {
        let result = self.runner.run(
            &self.program,
            [
                audio.as_os_str(),
                "--model".as_ref(),
                self.model.as_ref(),
                "--output_format".as_ref(),
                "json".as_ref(),
                "--output_dir".as_ref(),
                work_dir.as_os_str(),
            ],
        );

        match result {
            Ok(out) if out.success => {}
            Ok(out) => {
                tracing::warn!(exit_code = ?out.exit_code, "transcription exited with failure");
                return None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "transcription invocation failed");
                return None;
            }
        }

        // The CLI names its output after the input file's stem.
        let stem = audio.file_stem()?;
        let json_path = work_dir.join(stem).with_extension("json");
        let text = match fs::read_to_string(&json_path) {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(path = %json_path.display(), error = %e, "transcription output unreadable");
                return None;
            }
        };

        let track = parse_whisper_json(&text)?;
        if track.is_empty() {
            tracing::warn!("transcription produced no segments");
            return None;
        }
        Some(track)
    }
}

/// Parse the whisper JSON output (`{"segments": [{start, end, text}]}`).
pub fn parse_whisper_json(text: &str) -> Option<SubtitleTrack> {
    let json: Value = serde_json::from_str(text).ok()?;
    let raw_segments = json.get("segments")?.as_array()?;

    let mut segments = Vec::with_capacity(raw_segments.len());
    for raw in raw_segments {
        let start_secs = raw.get("start")?.as_f64()?;
        let end_secs = raw.get("end")?.as_f64()?;
        let text = raw.get("text")?.as_str()?.trim().to_string();
        if text.is_empty() {
            continue;
        }
        segments.push(SubtitleSegment {
            start_secs,
            end_secs,
            text,
        });
    }

    Some(SubtitleTrack {
        segments,
        source: TrackSource::Transcribed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_segments() {
        let json = r#"{
            "text": "hello there world",
            "segments": [
                {"start": 0.0, "end": 1.2, "text": " hello there "},
                {"start": 1.2, "end": 2.4, "text": "world"}
            ]
        }"#;
        let track = parse_whisper_json(json).unwrap();
        assert_eq!(track.source, TrackSource::Transcribed);
        assert_eq!(track.segments.len(), 2);
        assert_eq!(track.segments[0].text, "hello there");
        assert_eq!(track.segments[1].start_secs, 1.2);
    }

    #[test]
    fn skips_blank_segments() {
        let json = r#"{"segments": [{"start": 0.0, "end": 1.0, "text": "  "}]}"#;
        let track = parse_whisper_json(json).unwrap();
        assert!(track.is_empty());
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(parse_whisper_json("not json").is_none());
        assert!(parse_whisper_json(r#"{"no_segments": true}"#).is_none());
    }
}
