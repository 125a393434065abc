//! Duration probing with layered fallbacks.
//!
//! Primary: ffprobe structured JSON (`format.duration`). Secondary: run the
//! transcoder in inspection mode and regex-match the `Duration: HH:MM:SS.ff`
//! banner from its diagnostics. Tertiary: a fixed default. The tertiary path
//! is an intentional lossy degradation - `duration_secs` never fails, so a
//! narration track always has a positive duration to target.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::io::CommandRunner;
use crate::orchestrator::errors::{StageError, StageResult};

/// Returned when both probe strategies fail.
pub const DEFAULT_DURATION_SECS: f64 = 30.0;

/// Probes media files for their duration.
#[derive(Debug, Clone)]
pub struct MediaProbe {
    ffprobe: PathBuf,
    ffmpeg: PathBuf,
    runner: CommandRunner,
}

impl MediaProbe {
    pub fn new(ffprobe: PathBuf, ffmpeg: PathBuf, runner: CommandRunner) -> Self {
        Self {
            ffprobe,
            ffmpeg,
            runner,
        }
    }

    /// Duration of a media file in seconds. Never fails.
    pub fn duration_secs(&self, path: &Path) -> f64 {
        match self.probe_structured(path) {
            Ok(secs) => return secs,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "structured probe failed")
            }
        }

        match self.probe_banner(path) {
            Ok(secs) => return secs,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "banner probe failed")
            }
        }

        tracing::warn!(
            path = %path.display(),
            default = DEFAULT_DURATION_SECS,
            "could not determine duration, using default"
        );
        DEFAULT_DURATION_SECS
    }

    /// ffprobe with JSON output; parses `format.duration`.
    fn probe_structured(&self, path: &Path) -> StageResult<f64> {
        let out = self.runner.run(
            &self.ffprobe,
            [
                "-v".as_ref(),
                "quiet".as_ref(),
                "-print_format".as_ref(),
                "json".as_ref(),
                "-show_format".as_ref(),
                "-show_streams".as_ref(),
                path.as_os_str(),
            ],
        )?;
        if !out.success {
            return Err(StageError::command_failed(
                "ffprobe",
                out.exit_code,
                tail_lines(&out.stderr, 3),
            ));
        }
        parse_format_duration(&out.stdout)
            .ok_or_else(|| StageError::parse("ffprobe output", "no format.duration field"))
    }

    /// ffmpeg `-i` inspection; scrapes the human-readable duration banner.
    ///
    /// ffmpeg exits non-zero when given no output file, so the exit status
    /// is ignored here - only the diagnostics matter.
    fn probe_banner(&self, path: &Path) -> StageResult<f64> {
        let out = self
            .runner
            .run(&self.ffmpeg, ["-i".as_ref(), path.as_os_str()])?;
        parse_duration_banner(&out.stderr)
            .ok_or_else(|| StageError::parse("ffmpeg diagnostics", "no Duration line"))
    }
}

/// Parse `format.duration` (numeric-as-string) from ffprobe JSON.
pub fn parse_format_duration(json_text: &str) -> Option<f64> {
    let json: Value = serde_json::from_str(json_text).ok()?;
    let duration = json.get("format")?.get("duration")?.as_str()?;
    let secs: f64 = duration.parse().ok()?;
    (secs > 0.0).then_some(secs)
}

/// Match `Duration: HH:MM:SS.ff` in transcoder diagnostic output.
pub fn parse_duration_banner(diagnostics: &str) -> Option<f64> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE
        .get_or_init(|| Regex::new(r"Duration: (\d+):(\d+):(\d+\.\d+)").expect("valid regex"));
    let caps = re.captures(diagnostics)?;
    let hours: f64 = caps[1].parse().ok()?;
    let minutes: f64 = caps[2].parse().ok()?;
    let seconds: f64 = caps[3].parse().ok()?;
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

/// Last `n` lines of tool output, for error messages.
pub fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}
