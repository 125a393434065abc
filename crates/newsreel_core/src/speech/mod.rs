//! Narration synthesis via a prioritized cascade of speech backends.
//!
//! Backends are tried strictly in priority order. A backend reporting
//! success is not trusted on its own: the output file must exist and be
//! non-empty, otherwise the partial artifact is deleted and the cascade
//! advances. Exhaustion is fatal for the whole pipeline - without narration
//! there is no duration to target.

mod elevenlabs;
mod espeak;
mod gtts;

pub use elevenlabs::ElevenLabsBackend;
pub use espeak::EspeakBackend;
pub use gtts::GoogleWebTtsBackend;

use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::acquire::verify_non_empty;
use crate::config::{effective_elevenlabs_key, Capabilities, Settings};
use crate::io::CommandRunner;
use crate::orchestrator::errors::PipelineError;

/// A single speech synthesis engine behind a uniform interface.
///
/// `attempt` returns `true` only if it believes it wrote usable audio to
/// `out`; the synthesizer independently verifies the claim.
pub trait SpeechBackend: Send + Sync {
    fn name(&self) -> &'static str;
    fn attempt(&self, text: &str, out: &Path) -> bool;
}

/// Priority-ordered cascade over the configured backends.
pub struct NarrationSynthesizer {
    backends: Vec<Box<dyn SpeechBackend>>,
}

impl NarrationSynthesizer {
    /// Wire up backends from configuration, cloud-neural first, offline
    /// second, keyless web TTS last. Unavailable backends are not included.
    pub fn from_config(settings: &Settings, caps: &Capabilities) -> Self {
        let mut backends: Vec<Box<dyn SpeechBackend>> = Vec::new();

        if caps.elevenlabs {
            backends.push(Box::new(ElevenLabsBackend::new(
                effective_elevenlabs_key(settings),
                settings.speech.elevenlabs_voice_id.clone(),
            )));
        }
        if caps.espeak {
            backends.push(Box::new(EspeakBackend::new(
                settings.tools.espeak.clone().into(),
                CommandRunner::new(Duration::from_secs(settings.run.command_timeout_secs)),
            )));
        }
        if caps.google_tts {
            backends.push(Box::new(GoogleWebTtsBackend::new(
                settings.speech.google_tts_lang.clone(),
            )));
        }

        Self { backends }
    }

    /// Build a synthesizer over an explicit backend list (tests, embedders).
    pub fn with_backends(backends: Vec<Box<dyn SpeechBackend>>) -> Self {
        Self { backends }
    }

    pub fn backend_count(&self) -> usize {
        self.backends.len()
    }

    /// Synthesize `text` into `out`, returning the name of the engine that
    /// produced the verified audio.
    pub fn synthesize(&self, text: &str, out: &Path) -> Result<String, PipelineError> {
        if self.backends.is_empty() {
            tracing::error!("no speech backends available");
            return Err(PipelineError::NoNarration);
        }

        for backend in &self.backends {
            tracing::info!(engine = backend.name(), "attempting speech synthesis");
            let claimed = backend.attempt(text, out);

            if claimed && verify_non_empty(out) {
                tracing::info!(engine = backend.name(), "narration synthesized");
                return Ok(backend.name().to_string());
            }

            if claimed {
                tracing::warn!(
                    engine = backend.name(),
                    "backend reported success but output is missing or empty"
                );
            } else {
                tracing::warn!(engine = backend.name(), "backend failed");
            }
            // Drop any partial artifact before the next engine writes.
            let _ = fs::remove_file(out);
        }

        tracing::error!("all speech backends failed");
        Err(PipelineError::NoNarration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::tempdir;

    struct MockBackend {
        name: &'static str,
        succeed: bool,
        write_bytes: &'static [u8],
        attempts: Arc<AtomicUsize>,
    }

    impl MockBackend {
        fn new(name: &'static str, succeed: bool, write_bytes: &'static [u8]) -> (Self, Arc<AtomicUsize>) {
            let attempts = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    name,
                    succeed,
                    write_bytes,
                    attempts: attempts.clone(),
                },
                attempts,
            )
        }
    }

    impl SpeechBackend for MockBackend {
        fn name(&self) -> &'static str {
            self.name
        }

        fn attempt(&self, _text: &str, out: &Path) -> bool {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            if !self.write_bytes.is_empty() {
                fs::write(out, self.write_bytes).unwrap();
            }
            self.succeed
        }
    }

    #[test]
    fn first_verified_success_wins() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("narration.mp3");

        let (a, a_attempts) = MockBackend::new("engine_a", false, b"");
        let (b, b_attempts) = MockBackend::new("engine_b", true, b"audio");
        let (c, c_attempts) = MockBackend::new("engine_c", true, b"audio");

        let synth =
            NarrationSynthesizer::with_backends(vec![Box::new(a), Box::new(b), Box::new(c)]);
        let engine = synth.synthesize("hello", &out).unwrap();

        assert_eq!(engine, "engine_b");
        assert_eq!(a_attempts.load(Ordering::SeqCst), 1);
        assert_eq!(b_attempts.load(Ordering::SeqCst), 1);
        assert_eq!(c_attempts.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn zero_byte_output_counts_as_failure() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("narration.mp3");

        // Claims success but writes nothing.
        let (liar, _) = MockBackend::new("liar", true, b"");
        let (honest, _) = MockBackend::new("honest", true, b"audio");

        let synth = NarrationSynthesizer::with_backends(vec![Box::new(liar), Box::new(honest)]);
        let engine = synth.synthesize("hello", &out).unwrap();
        assert_eq!(engine, "honest");
        assert!(verify_non_empty(&out));
    }

    #[test]
    fn exhaustion_is_no_narration() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("narration.mp3");

        let (a, _) = MockBackend::new("a", false, b"partial");
        let (b, _) = MockBackend::new("b", false, b"");

        let synth = NarrationSynthesizer::with_backends(vec![Box::new(a), Box::new(b)]);
        let err = synth.synthesize("hello", &out).unwrap_err();
        assert!(matches!(err, PipelineError::NoNarration));
        // Partial artifact from the first backend was removed.
        assert!(!out.exists());
    }

    #[test]
    fn empty_backend_list_is_no_narration() {
        let dir = tempdir().unwrap();
        let synth = NarrationSynthesizer::with_backends(Vec::new());
        let err = synth
            .synthesize("hello", &dir.path().join("n.mp3"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::NoNarration));
    }
}
