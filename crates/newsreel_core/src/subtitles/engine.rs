//! Subtitle engine: track generation plus the burn cascade.
//!
//! Subtitles are best-effort. If transcription fails, timing falls back to
//! an even split of the script. If every burn strategy fails, the video
//! ships without captions and the caller is told via a warning, never an
//! error.

use std::path::{Path, PathBuf};

use crate::acquire::verify_non_empty;
use crate::models::SubtitleMethod;
use crate::subtitles::burn::{
    AssOverlay, BurnContext, FixedCaption, SegmentedCaptions, SrtOverlay, SubtitleBurnStrategy,
};
use crate::subtitles::transcribe::TranscriptionBackend;
use crate::subtitles::types::{SubtitleTrack, TrackSource};
use crate::transcode::Transcode;

/// What the engine delivered.
#[derive(Debug)]
pub struct SubtitleOutcome {
    /// The video to carry forward; the input path when nothing was applied.
    pub video_path: PathBuf,
    pub applied: bool,
    pub method: Option<SubtitleMethod>,
    pub warnings: Vec<String>,
}

pub struct SubtitleEngine {
    transcriber: Option<Box<dyn TranscriptionBackend>>,
    strategies: Vec<Box<dyn SubtitleBurnStrategy>>,
    wrap_width: usize,
}

impl SubtitleEngine {
    /// The standard cascade, best rendering first.
    pub fn new(transcriber: Option<Box<dyn TranscriptionBackend>>, wrap_width: usize) -> Self {
        let strategies: Vec<Box<dyn SubtitleBurnStrategy>> = vec![
            Box::new(AssOverlay),
            Box::new(SrtOverlay),
            Box::new(SegmentedCaptions),
            Box::new(FixedCaption),
        ];
        Self {
            transcriber,
            strategies,
            wrap_width,
        }
    }

    /// Custom cascade (tests, embedders).
    pub fn with_strategies(
        transcriber: Option<Box<dyn TranscriptionBackend>>,
        strategies: Vec<Box<dyn SubtitleBurnStrategy>>,
        wrap_width: usize,
    ) -> Self {
        Self {
            transcriber,
            strategies,
            wrap_width,
        }
    }

    /// Generate a track for the narration and burn it onto `video`.
    pub fn apply(
        &self,
        video: &Path,
        script: &str,
        narration: &Path,
        duration_secs: f64,
        work_dir: &Path,
        transcoder: &dyn Transcode,
    ) -> SubtitleOutcome {
        let mut warnings = Vec::new();
        let track = self.generate_track(script, narration, duration_secs, work_dir, &mut warnings);

        let ctx = BurnContext {
            video,
            track: &track,
            script_text: script,
            work_dir,
            video_duration_secs: duration_secs,
            wrap_width: self.wrap_width,
            transcoder,
        };

        for strategy in &self.strategies {
            let output = work_dir.join(format!("subtitled_{}.mp4", strategy.name()));
            tracing::info!(strategy = strategy.name(), "attempting subtitle burn");

            match strategy.burn(&ctx, &output) {
                Ok(()) if verify_non_empty(&output) => {
                    tracing::info!(strategy = strategy.name(), "subtitles applied");
                    return SubtitleOutcome {
                        video_path: output,
                        applied: true,
                        method: Some(strategy.method()),
                        warnings,
                    };
                }
                Ok(()) => {
                    warnings.push(format!(
                        "subtitle strategy {} produced an empty file",
                        strategy.name()
                    ));
                }
                Err(e) => {
                    tracing::warn!(strategy = strategy.name(), error = %e, "subtitle burn failed");
                    warnings.push(format!("subtitle strategy {} failed: {}", strategy.name(), e));
                }
            }
        }

        warnings.push("all subtitle strategies failed, delivering without captions".to_string());
        tracing::warn!("subtitles skipped");
        SubtitleOutcome {
            video_path: video.to_path_buf(),
            applied: false,
            method: None,
            warnings,
        }
    }

    fn generate_track(
        &self,
        script: &str,
        narration: &Path,
        duration_secs: f64,
        work_dir: &Path,
        warnings: &mut Vec<String>,
    ) -> SubtitleTrack {
        if let Some(transcriber) = &self.transcriber {
            if let Some(track) = transcriber.transcribe(narration, work_dir) {
                tracing::info!(segments = track.segments.len(), "transcription succeeded");
                return track;
            }
            warnings.push("transcription failed, using even-split subtitle timing".to_string());
        }

        let track = SubtitleTrack::even_split(script, duration_secs, self.wrap_width);
        tracing::info!(segments = track.segments.len(), "using even-split subtitle timing");
        debug_assert_eq!(track.source, TrackSource::EvenSplit);
        track
    }
}
