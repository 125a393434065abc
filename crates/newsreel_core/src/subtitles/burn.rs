//! Subtitle burn-in strategies.
//!
//! Each strategy renders the track onto the video a different way; the
//! engine tries them in order of visual quality. All strategies share one
//! interface so adding or reordering them touches a single list.

use std::fs;
use std::path::Path;

use crate::models::SubtitleMethod;
use crate::orchestrator::errors::{StageError, StageResult};
use crate::subtitles::types::SubtitleTrack;
use crate::subtitles::writers::{write_ass, write_srt};
use crate::transcode::{escape_filter_path, Transcode};

/// Everything a burn strategy needs to do its work.
pub struct BurnContext<'a> {
    /// The assembled video to burn onto.
    pub video: &'a Path,
    /// The timed track to render.
    pub track: &'a SubtitleTrack,
    /// Raw narration script, for caption strategies that ignore timing.
    pub script_text: &'a str,
    /// Scratch directory for sidecar subtitle files.
    pub work_dir: &'a Path,
    /// Duration the captions must cover.
    pub video_duration_secs: f64,
    /// Wrap width for rendered caption lines.
    pub wrap_width: usize,
    pub transcoder: &'a dyn Transcode,
}

/// One way of rendering subtitles onto a video.
pub trait SubtitleBurnStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn method(&self) -> SubtitleMethod;
    fn burn(&self, ctx: &BurnContext<'_>, output: &Path) -> StageResult<()>;
}

/// Full ASS styling via the subtitles filter.
pub struct AssOverlay;

impl SubtitleBurnStrategy for AssOverlay {
    fn name(&self) -> &'static str {
        "ass_overlay"
    }

    fn method(&self) -> SubtitleMethod {
        SubtitleMethod::AssBurn
    }

    fn burn(&self, ctx: &BurnContext<'_>, output: &Path) -> StageResult<()> {
        require_segments(ctx)?;
        let path = ctx.work_dir.join("captions.ass");
        let doc = write_ass(ctx.track, ctx.wrap_width);
        fs::write(&path, doc)
            .map_err(|e| StageError::io_error(format!("writing {}", path.display()), e))?;

        let filter = format!("subtitles='{}'", escape_filter_path(&path));
        ctx.transcoder.apply_video_filter(ctx.video, &filter, output)
    }
}

/// Plain SRT via the subtitles filter; survives builds without libass
/// styling support.
pub struct SrtOverlay;

impl SubtitleBurnStrategy for SrtOverlay {
    fn name(&self) -> &'static str {
        "srt_overlay"
    }

    fn method(&self) -> SubtitleMethod {
        SubtitleMethod::SrtBurn
    }

    fn burn(&self, ctx: &BurnContext<'_>, output: &Path) -> StageResult<()> {
        require_segments(ctx)?;
        let path = ctx.work_dir.join("captions.srt");
        let doc = write_srt(ctx.track);
        fs::write(&path, doc)
            .map_err(|e| StageError::io_error(format!("writing {}", path.display()), e))?;

        let filter = format!("subtitles='{}'", escape_filter_path(&path));
        ctx.transcoder.apply_video_filter(ctx.video, &filter, output)
    }
}

/// Re-slice the video at segment boundaries, caption each piece with
/// drawtext, and join the pieces back with the concat demuxer. Needs no
/// subtitle demuxer at all.
pub struct SegmentedCaptions;

impl SubtitleBurnStrategy for SegmentedCaptions {
    fn name(&self) -> &'static str {
        "segmented_captions"
    }

    fn method(&self) -> SubtitleMethod {
        SubtitleMethod::Segmented
    }

    fn burn(&self, ctx: &BurnContext<'_>, output: &Path) -> StageResult<()> {
        require_segments(ctx)?;
        let windows = caption_windows(ctx.track, ctx.video_duration_secs);

        let mut parts = Vec::with_capacity(windows.len());
        for (i, (start, end, text)) in windows.iter().enumerate() {
            let part = ctx.work_dir.join(format!("caption_part_{}.mp4", i));
            let filter = format!(
                "drawtext=text='{}':fontsize=48:fontcolor=white:borderw=2:\
                 x=(w-text_w)/2:y=h-80",
                escape_drawtext(text)
            );
            ctx.transcoder
                .slice_with_filter(ctx.video, *start, end - start, &filter, &part)?;
            parts.push(part);
        }

        let list_path = ctx.work_dir.join("caption_parts.txt");
        ctx.transcoder.concat(&parts, &list_path, output)
    }
}

/// Slice windows covering the whole video, one per caption.
///
/// Window boundaries come from segment start times so a gappy transcribed
/// track still reconstructs the full duration; the first window starts at
/// zero and the last runs to the end of the video. Segments that do not
/// advance the clock are merged into their predecessor's caption, keeping
/// every window positive-width and the re-concat lossless.
fn caption_windows(track: &SubtitleTrack, duration_secs: f64) -> Vec<(f64, f64, String)> {
    let mut merged: Vec<(f64, f64, String)> = Vec::with_capacity(track.segments.len());
    for segment in &track.segments {
        match merged.last_mut() {
            Some(last) if segment.start_secs <= last.0 => {
                last.1 = last.1.max(segment.end_secs);
                last.2.push(' ');
                last.2.push_str(&segment.text);
            }
            _ => merged.push((segment.start_secs, segment.end_secs, segment.text.clone())),
        }
    }

    let mut windows = Vec::with_capacity(merged.len());
    let mut iter = merged.into_iter().peekable();
    let mut first = true;
    while let Some((start_secs, end_secs, text)) = iter.next() {
        let start = if first { 0.0 } else { start_secs };
        first = false;
        let end = iter
            .peek()
            .map(|next| next.0)
            .unwrap_or_else(|| duration_secs.max(end_secs));
        windows.push((start, end, text));
    }
    windows
}

/// Last resort: one static caption with the truncated script for the whole
/// duration.
pub struct FixedCaption;

/// Longest script prefix a single static caption will show.
const FIXED_CAPTION_MAX_CHARS: usize = 117;

impl SubtitleBurnStrategy for FixedCaption {
    fn name(&self) -> &'static str {
        "fixed_caption"
    }

    fn method(&self) -> SubtitleMethod {
        SubtitleMethod::FixedCaption
    }

    fn burn(&self, ctx: &BurnContext<'_>, output: &Path) -> StageResult<()> {
        let caption = truncate_caption(ctx.script_text, FIXED_CAPTION_MAX_CHARS);
        if caption.is_empty() {
            return Err(StageError::other("no script text to caption"));
        }
        let filter = format!(
            "drawtext=text='{}':fontsize=40:fontcolor=white:borderw=2:\
             x=(w-text_w)/2:y=h-60",
            escape_drawtext(&caption)
        );
        ctx.transcoder.apply_video_filter(ctx.video, &filter, output)
    }
}

fn require_segments(ctx: &BurnContext<'_>) -> StageResult<()> {
    if ctx.track.is_empty() {
        return Err(StageError::other("subtitle track has no segments"));
    }
    Ok(())
}

/// Escape text for embedding in a single-quoted drawtext value.
///
/// The filter parser claims `\`, `'`, `:` and `,`; `%` starts a text
/// expansion sequence.
pub fn escape_drawtext(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str(r"\\"),
            '\'' => escaped.push_str(r"\'"),
            ':' => escaped.push_str(r"\:"),
            ',' => escaped.push_str(r"\,"),
            '%' => escaped.push_str(r"\%"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Truncate to `max_chars`, marking the cut with an ellipsis.
pub fn truncate_caption(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_chars).collect();
    format!("{}...", truncated.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subtitles::types::{SubtitleSegment, TrackSource};

    #[test]
    fn caption_windows_cover_full_duration() {
        // Transcribed tracks can start late and leave gaps.
        let track = SubtitleTrack {
            segments: vec![
                SubtitleSegment {
                    start_secs: 0.8,
                    end_secs: 2.0,
                    text: "one".to_string(),
                },
                SubtitleSegment {
                    start_secs: 3.0,
                    end_secs: 4.0,
                    text: "two".to_string(),
                },
            ],
            source: TrackSource::Transcribed,
        };
        let windows = caption_windows(&track, 10.0);
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].0, 0.0);
        assert_eq!(windows[0].1, 3.0);
        assert_eq!(windows[1].0, 3.0);
        assert_eq!(windows[1].1, 10.0);
    }

    #[test]
    fn caption_windows_merge_segments_sharing_a_start() {
        let track = SubtitleTrack {
            segments: vec![
                SubtitleSegment {
                    start_secs: 1.0,
                    end_secs: 2.0,
                    text: "one".to_string(),
                },
                SubtitleSegment {
                    start_secs: 1.0,
                    end_secs: 3.0,
                    text: "two".to_string(),
                },
                SubtitleSegment {
                    start_secs: 4.0,
                    end_secs: 5.0,
                    text: "three".to_string(),
                },
            ],
            source: TrackSource::Transcribed,
        };
        let windows = caption_windows(&track, 10.0);
        assert_eq!(windows.len(), 2);
        // No footage is dropped: contiguous windows from 0 to the end.
        assert_eq!((windows[0].0, windows[0].1), (0.0, 4.0));
        assert_eq!((windows[1].0, windows[1].1), (4.0, 10.0));
        assert_eq!(windows[0].2, "one two");
    }

    #[test]
    fn escapes_filter_metacharacters() {
        assert_eq!(
            escape_drawtext(r"it's 50%: a, b\c"),
            r"it\'s 50\%\: a\, b\\c"
        );
    }

    #[test]
    fn short_caption_untouched() {
        assert_eq!(truncate_caption("brief update", 117), "brief update");
    }

    #[test]
    fn long_caption_truncated_with_ellipsis() {
        let long = "x".repeat(200);
        let caption = truncate_caption(&long, 117);
        assert_eq!(caption.chars().count(), 120);
        assert!(caption.ends_with("..."));
    }
}
