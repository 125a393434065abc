//! ffmpeg invocations for the assembly stages.
//!
//! Every clip is normalized to one canonical format so the concat demuxer
//! can stream-copy the sequence. Short clips are padded by holding their
//! last frame rather than going to black.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::VideoSettings;
use crate::io::CommandRunner;
use crate::media::tail_lines;
use crate::orchestrator::errors::{StageError, StageResult};

/// Operations the assembly and subtitle stages need from the transcoder.
///
/// The orchestrator and burn strategies hold this as a trait object, so
/// everything after acquisition can be exercised without an encoder binary.
pub trait Transcode: Send + Sync {
    /// Normalize one clip: scale with aspect preserved, pad to the canonical
    /// frame, constant fps, exact target duration, audio stripped.
    fn normalize_clip(&self, input: &Path, output: &Path, target_secs: f64) -> StageResult<()>;

    /// Concatenate normalized clips into one silent video (stream copy).
    fn concat(&self, clips: &[PathBuf], list_path: &Path, output: &Path) -> StageResult<()>;

    /// Mux the silent video track with the narration audio.
    fn mux(&self, video: &Path, audio: &Path, output: &Path) -> StageResult<()>;

    /// Re-encode the video through a filter expression, copying audio.
    fn apply_video_filter(&self, input: &Path, filter: &str, output: &Path) -> StageResult<()>;

    /// Cut `[start, start+duration)` out of the input and re-encode it
    /// through a filter expression.
    fn slice_with_filter(
        &self,
        input: &Path,
        start_secs: f64,
        duration_secs: f64,
        filter: &str,
        output: &Path,
    ) -> StageResult<()>;
}

/// Drives the external transcoder binary.
#[derive(Debug, Clone)]
pub struct Transcoder {
    ffmpeg: PathBuf,
    runner: CommandRunner,
    video: VideoSettings,
}

impl Transcoder {
    pub fn new(ffmpeg: PathBuf, runner: CommandRunner, video: VideoSettings) -> Self {
        Self {
            ffmpeg,
            runner,
            video,
        }
    }

    fn run_expect_success(&self, stage: &str, args: Vec<OsString>) -> StageResult<()> {
        tracing::debug!(stage, "running transcoder");
        let out = self.runner.run(&self.ffmpeg, args)?;
        if !out.success {
            return Err(StageError::command_failed(
                "ffmpeg",
                out.exit_code,
                tail_lines(&out.stderr, 3),
            ));
        }
        Ok(())
    }
}

impl Transcode for Transcoder {
    /// `tpad` clones the last frame slightly past the target so `-t` always
    /// has enough footage to cut; without it a short clip would end early
    /// and desync the sequence.
    fn normalize_clip(
        &self,
        input: &Path,
        output: &Path,
        target_secs: f64,
    ) -> StageResult<()> {
        let w = self.video.width;
        let h = self.video.height;
        let vf = format!(
            "scale={w}:{h}:force_original_aspect_ratio=decrease,\
             pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,\
             fps={fps},\
             tpad=stop_mode=clone:stop_duration={pad:.3}",
            fps = self.video.fps,
            pad = target_secs + 0.1,
        );

        let args: Vec<OsString> = vec![
            "-y".into(),
            "-i".into(),
            input.into(),
            "-vf".into(),
            vf.into(),
            "-t".into(),
            format!("{:.3}", target_secs).into(),
            "-an".into(),
            "-c:v".into(),
            "libx264".into(),
            "-preset".into(),
            "fast".into(),
            "-crf".into(),
            "23".into(),
            output.into(),
        ];
        self.run_expect_success("normalize", args)
    }

    /// Writes the list file itself; callers pass where it should live so it
    /// lands inside the run's temp directory.
    fn concat(&self, clips: &[PathBuf], list_path: &Path, output: &Path) -> StageResult<()> {
        let list = write_concat_list(clips);
        fs::write(list_path, list)
            .map_err(|e| StageError::io_error(format!("writing {}", list_path.display()), e))?;

        let args: Vec<OsString> = vec![
            "-y".into(),
            "-f".into(),
            "concat".into(),
            "-safe".into(),
            "0".into(),
            "-i".into(),
            list_path.into(),
            "-c".into(),
            "copy".into(),
            output.into(),
        ];
        self.run_expect_success("concat", args)
    }

    /// `-shortest` ends the output at whichever track runs out first, so a
    /// slightly long video tail never produces trailing silence.
    fn mux(&self, video: &Path, audio: &Path, output: &Path) -> StageResult<()> {
        let args: Vec<OsString> = vec![
            "-y".into(),
            "-i".into(),
            video.into(),
            "-i".into(),
            audio.into(),
            "-map".into(),
            "0:v:0".into(),
            "-map".into(),
            "1:a:0".into(),
            "-c:v".into(),
            "copy".into(),
            "-c:a".into(),
            "aac".into(),
            "-shortest".into(),
            output.into(),
        ];
        self.run_expect_success("mux", args)
    }

    /// Subtitle burn strategies build their filter (subtitles= or drawtext=)
    /// and hand it here.
    fn apply_video_filter(
        &self,
        input: &Path,
        filter: &str,
        output: &Path,
    ) -> StageResult<()> {
        let args: Vec<OsString> = vec![
            "-y".into(),
            "-i".into(),
            input.into(),
            "-vf".into(),
            filter.into(),
            "-c:v".into(),
            "libx264".into(),
            "-preset".into(),
            "fast".into(),
            "-crf".into(),
            "23".into(),
            "-c:a".into(),
            "copy".into(),
            output.into(),
        ];
        self.run_expect_success("filter", args)
    }

    fn slice_with_filter(
        &self,
        input: &Path,
        start_secs: f64,
        duration_secs: f64,
        filter: &str,
        output: &Path,
    ) -> StageResult<()> {
        let args: Vec<OsString> = vec![
            "-y".into(),
            "-ss".into(),
            format!("{:.3}", start_secs).into(),
            "-t".into(),
            format!("{:.3}", duration_secs).into(),
            "-i".into(),
            input.into(),
            "-vf".into(),
            filter.into(),
            "-c:v".into(),
            "libx264".into(),
            "-preset".into(),
            "fast".into(),
            "-crf".into(),
            "23".into(),
            "-c:a".into(),
            "aac".into(),
            output.into(),
        ];
        self.run_expect_success("slice", args)
    }
}

/// Render the concat demuxer list file for a clip sequence.
pub fn write_concat_list(clips: &[PathBuf]) -> String {
    let mut list = String::new();
    for clip in clips {
        list.push_str("file '");
        list.push_str(&escape_concat_path(clip));
        list.push_str("'\n");
    }
    list
}

/// Escape a path for a single-quoted concat list entry.
pub fn escape_concat_path(path: &Path) -> String {
    path.to_string_lossy().replace('\'', r"'\''")
}

/// Escape a path for embedding in a single-quoted filtergraph argument.
///
/// The filter parser treats `:` as an option separator and `'` as a quote
/// even inside the subtitles filename.
pub fn escape_filter_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', r"\\")
        .replace(':', r"\:")
        .replace('\'', r"\'")
}
