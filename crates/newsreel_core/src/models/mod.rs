//! Data model for the assembly pipeline.
//!
//! These types flow between pipeline stages: inputs arrive as `ClipSource`
//! values and narration text, intermediate artifacts are `NarrationTrack`
//! and `ProcessedClip`, and the single output handed back to callers is
//! `PipelineResult`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Synthesized narration audio, immutable once produced.
///
/// `duration_secs` is filled in by the media probe after synthesis; it is
/// always positive (the probe falls back to a fixed default rather than
/// reporting zero).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrationTrack {
    /// Path to the synthesized audio file.
    pub audio_path: PathBuf,
    /// Probed duration in seconds.
    pub duration_secs: f64,
    /// Name of the speech backend that produced the audio.
    pub engine: String,
}

/// A remote stock-footage source.
///
/// Upstream footage-search collaborators send either a bare URL string or a
/// structured record with a `url` field; both deserialize into this enum.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ClipSource {
    /// Bare URL.
    Url(String),
    /// Structured record with the search keyword that found the clip.
    Record {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        keyword: Option<String>,
    },
}

impl ClipSource {
    /// The download URL regardless of representation.
    pub fn url(&self) -> &str {
        match self {
            ClipSource::Url(url) => url,
            ClipSource::Record { url, .. } => url,
        }
    }

    /// The keyword that selected this clip, if known.
    pub fn keyword(&self) -> Option<&str> {
        match self {
            ClipSource::Url(_) => None,
            ClipSource::Record { keyword, .. } => keyword.as_deref(),
        }
    }
}

impl From<&str> for ClipSource {
    fn from(url: &str) -> Self {
        ClipSource::Url(url.to_string())
    }
}

/// A clip that has been downloaded and normalized to the canonical format.
///
/// Consumed by concatenation, then discarded with the run's temp directory.
#[derive(Debug, Clone)]
pub struct ProcessedClip {
    /// Normalized clip on local disk.
    pub local_path: PathBuf,
    /// Position in the final sequence (original request order).
    pub sequence_index: usize,
    /// Exact duration this clip was trimmed or frame-held to.
    pub allocated_secs: f64,
}

/// How the final subtitles ended up on the video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubtitleMethod {
    /// Styled ASS track burned with the subtitles filter.
    AssBurn,
    /// SRT conversion burned with the subtitles filter.
    SrtBurn,
    /// Video re-sliced into per-chunk segments with static captions.
    Segmented,
    /// One static caption over the whole video.
    FixedCaption,
}

impl SubtitleMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubtitleMethod::AssBurn => "ass",
            SubtitleMethod::SrtBurn => "srt",
            SubtitleMethod::Segmented => "segmented",
            SubtitleMethod::FixedCaption => "fixed",
        }
    }
}

impl std::fmt::Display for SubtitleMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The pipeline's sole output.
///
/// Callers always receive either this (referencing a playable file) or a
/// typed fatal error; degraded enhancements show up only in the flags and
/// `warnings`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    /// Final artifact under the configured output directory.
    pub final_video_path: PathBuf,
    /// Whether narration audio was muxed in (always true on success).
    pub narration_applied: bool,
    /// Whether any subtitle strategy succeeded.
    pub subtitles_applied: bool,
    /// Which burn strategy produced the captions, if any.
    pub subtitle_method: Option<SubtitleMethod>,
    /// Non-fatal degradations encountered along the way.
    pub warnings: Vec<String>,
}
