//! Capability detection for optional backends.
//!
//! Detected once at process start and passed explicitly into the
//! orchestrator; nothing reads availability from globals at call sites.
//! Required tools (ffmpeg, ffprobe) are verified here too - a broken
//! transcoder path is a configuration error, not something to discover
//! halfway through a run.

use std::path::Path;
use std::time::Duration;

use crate::config::Settings;
use crate::io::CommandRunner;
use crate::orchestrator::errors::PipelineError;

/// Which optional backends are usable in this process.
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    /// ElevenLabs API key available.
    pub elevenlabs: bool,
    /// Offline TTS binary answers.
    pub espeak: bool,
    /// Keyless web TTS permitted by configuration.
    pub google_tts: bool,
    /// Transcription CLI answers.
    pub whisper: bool,
}

impl Capabilities {
    /// Probe configured tools and credentials.
    ///
    /// Fails only for the required transcoder/prober; optional backends that
    /// don't answer simply come back disabled.
    pub fn detect(settings: &Settings) -> Result<Self, PipelineError> {
        if settings.tools.ffmpeg.trim().is_empty() {
            return Err(PipelineError::configuration("tools.ffmpeg is not set"));
        }
        if settings.tools.ffprobe.trim().is_empty() {
            return Err(PipelineError::configuration("tools.ffprobe is not set"));
        }

        let runner = CommandRunner::new(Duration::from_secs(10));

        if !tool_answers(&runner, Path::new(&settings.tools.ffmpeg), "-version") {
            return Err(PipelineError::configuration(format!(
                "transcoder not runnable at '{}'",
                settings.tools.ffmpeg
            )));
        }
        if !tool_answers(&runner, Path::new(&settings.tools.ffprobe), "-version") {
            return Err(PipelineError::configuration(format!(
                "prober not runnable at '{}'",
                settings.tools.ffprobe
            )));
        }

        let elevenlabs = !effective_elevenlabs_key(settings).is_empty();
        let espeak = tool_answers(&runner, Path::new(&settings.tools.espeak), "--version");
        let whisper = tool_answers(&runner, Path::new(&settings.tools.whisper), "--help");

        let caps = Self {
            elevenlabs,
            espeak,
            google_tts: settings.speech.google_tts_enabled,
            whisper,
        };
        tracing::info!(
            elevenlabs = caps.elevenlabs,
            espeak = caps.espeak,
            google_tts = caps.google_tts,
            whisper = caps.whisper,
            "capability detection complete"
        );
        Ok(caps)
    }

    /// True if at least one speech backend can be tried.
    pub fn any_speech_backend(&self) -> bool {
        self.elevenlabs || self.espeak || self.google_tts
    }
}

/// The ElevenLabs key from settings, falling back to the environment.
pub fn effective_elevenlabs_key(settings: &Settings) -> String {
    if !settings.speech.elevenlabs_api_key.trim().is_empty() {
        return settings.speech.elevenlabs_api_key.trim().to_string();
    }
    std::env::var("ELEVENLABS_API_KEY").unwrap_or_default()
}

fn tool_answers(runner: &CommandRunner, program: &Path, flag: &str) -> bool {
    if program.as_os_str().is_empty() {
        return false;
    }
    match runner.run(program, [flag]) {
        Ok(out) => out.success,
        Err(e) => {
            tracing::debug!(program = %program.display(), error = %e, "tool probe failed");
            false
        }
    }
}
