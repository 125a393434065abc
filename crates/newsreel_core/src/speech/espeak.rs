//! Offline TTS backend driving the espeak-ng binary.

use std::path::{Path, PathBuf};

use super::SpeechBackend;
use crate::io::CommandRunner;

pub struct EspeakBackend {
    program: PathBuf,
    runner: CommandRunner,
}

impl EspeakBackend {
    pub fn new(program: PathBuf, runner: CommandRunner) -> Self {
        Self { program, runner }
    }
}

impl SpeechBackend for EspeakBackend {
    fn name(&self) -> &'static str {
        "espeak"
    }

    fn attempt(&self, text: &str, out: &Path) -> bool {
        let result = self.runner.run(
            &self.program,
            ["-w".as_ref(), out.as_os_str(), text.as_ref()],
        );
        match result {
            Ok(o) if o.success => true,
            Ok(o) => {
                tracing::warn!(exit_code = ?o.exit_code, "espeak exited with failure");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "espeak invocation failed");
                false
            }
        }
    }
}
