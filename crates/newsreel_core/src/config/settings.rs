//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! External tool locations are explicit configuration: nothing in the
//! pipeline goes hunting for binaries on disk or prompts interactively.

use serde::{Deserialize, Serialize};

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Path-related settings.
    #[serde(default)]
    pub paths: PathSettings,

    /// External tool locations.
    #[serde(default)]
    pub tools: ToolSettings,

    /// Speech synthesis settings.
    #[serde(default)]
    pub speech: SpeechSettings,

    /// Canonical video format.
    #[serde(default)]
    pub video: VideoSettings,

    /// Subtitle generation settings.
    #[serde(default)]
    pub subtitles: SubtitleSettings,

    /// Per-run execution settings.
    #[serde(default)]
    pub run: RunSettings,
}

/// Output and temp directory configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Directory for final video artifacts.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Root under which each run creates its scoped temp directory.
    #[serde(default = "default_temp_root")]
    pub temp_root: String,
}

fn default_output_dir() -> String {
    "videos".to_string()
}

fn default_temp_root() -> String {
    ".newsreel_tmp".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            temp_root: default_temp_root(),
        }
    }
}

/// Locations of external executables.
///
/// `ffmpeg` and `ffprobe` are required; the rest enable optional backends
/// when present and runnable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSettings {
    /// Transcoder binary (required).
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,

    /// Prober binary (required).
    #[serde(default = "default_ffprobe")]
    pub ffprobe: String,

    /// Offline TTS binary (optional backend).
    #[serde(default = "default_espeak")]
    pub espeak: String,

    /// Transcription CLI (optional, enables time-aligned subtitles).
    #[serde(default = "default_whisper")]
    pub whisper: String,
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe() -> String {
    "ffprobe".to_string()
}

fn default_espeak() -> String {
    "espeak-ng".to_string()
}

fn default_whisper() -> String {
    "whisper".to_string()
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
            ffprobe: default_ffprobe(),
            espeak: default_espeak(),
            whisper: default_whisper(),
        }
    }
}

/// Speech backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechSettings {
    /// ElevenLabs API key. Empty means "use the ELEVENLABS_API_KEY env var,
    /// or disable the backend if that is unset too".
    #[serde(default)]
    pub elevenlabs_api_key: String,

    /// ElevenLabs voice to synthesize with.
    #[serde(default = "default_voice_id")]
    pub elevenlabs_voice_id: String,

    /// Whether the keyless Google web TTS fallback may be used.
    #[serde(default = "default_true")]
    pub google_tts_enabled: bool,

    /// Language code for web TTS.
    #[serde(default = "default_lang")]
    pub google_tts_lang: String,
}

fn default_voice_id() -> String {
    "DMyrgzQFny3JI1Y1paM5".to_string()
}

fn default_lang() -> String {
    "en".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            elevenlabs_api_key: String::new(),
            elevenlabs_voice_id: default_voice_id(),
            google_tts_enabled: true,
            google_tts_lang: default_lang(),
        }
    }
}

/// Canonical output format every clip is normalized to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoSettings {
    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,

    #[serde(default = "default_fps")]
    pub fps: u32,
}

fn default_width() -> u32 {
    1280
}

fn default_height() -> u32 {
    720
}

fn default_fps() -> u32 {
    30
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            fps: default_fps(),
        }
    }
}

/// Subtitle generation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtitleSettings {
    /// Character width subtitle text is wrapped/chunked at.
    #[serde(default = "default_wrap_width")]
    pub wrap_width: usize,

    /// Whisper model name passed to the transcription CLI.
    #[serde(default = "default_whisper_model")]
    pub whisper_model: String,
}

fn default_wrap_width() -> usize {
    40
}

fn default_whisper_model() -> String {
    "base".to_string()
}

impl Default for SubtitleSettings {
    fn default() -> Self {
        Self {
            wrap_width: default_wrap_width(),
            whisper_model: default_whisper_model(),
        }
    }
}

/// Execution limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSettings {
    /// Hard deadline for every external tool invocation, in seconds.
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,
}

fn default_command_timeout() -> u64 {
    300
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            command_timeout_secs: default_command_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let settings = Settings::default();
        assert_eq!(settings.video.width, 1280);
        assert_eq!(settings.video.height, 720);
        assert_eq!(settings.video.fps, 30);
        assert_eq!(settings.subtitles.wrap_width, 40);
        assert_eq!(settings.tools.ffmpeg, "ffmpeg");
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let toml_str = r#"
            [tools]
            ffmpeg = "/opt/ffmpeg/bin/ffmpeg"
        "#;
        let settings: Settings = toml::from_str(toml_str).unwrap();
        assert_eq!(settings.tools.ffmpeg, "/opt/ffmpeg/bin/ffmpeg");
        assert_eq!(settings.tools.ffprobe, "ffprobe");
        assert_eq!(settings.paths.output_dir, "videos");
    }

    #[test]
    fn roundtrips_through_toml() {
        let settings = Settings::default();
        let text = toml::to_string(&settings).unwrap();
        let back: Settings = toml::from_str(&text).unwrap();
        assert_eq!(back.speech.elevenlabs_voice_id, settings.speech.elevenlabs_voice_id);
    }
}
