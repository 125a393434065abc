//! The end-to-end assembly pipeline.
//!
//! One call takes a narration script and clip sources and produces a final
//! video under the output directory, or one of four terminal failures. All
//! intermediate artifacts live in a per-run scoped temp directory that is
//! removed on every exit path, success or not.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Local;

use crate::acquire::{download_all, ClipFetcher, HttpClipFetcher};
use crate::config::{Capabilities, Settings};
use crate::io::CommandRunner;
use crate::media::MediaProbe;
use crate::models::{ClipSource, NarrationTrack, PipelineResult, ProcessedClip};
use crate::orchestrator::errors::PipelineError;
use crate::speech::NarrationSynthesizer;
use crate::subtitles::{SubtitleEngine, WhisperCliTranscriber};
use crate::transcode::{ClipTimeline, Transcode, Transcoder};

/// Tolerance before a narration/video duration mismatch is reported.
const DURATION_MISMATCH_TOLERANCE_SECS: f64 = 1.0;

/// Coordinates every stage of the assembly pipeline.
pub struct Orchestrator {
    settings: Settings,
    synthesizer: NarrationSynthesizer,
    fetcher: Box<dyn ClipFetcher>,
    probe: MediaProbe,
    transcoder: Box<dyn Transcode>,
    subtitles: SubtitleEngine,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator").finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Build a fully wired pipeline from settings and detected capabilities.
    ///
    /// Tool paths must already be validated by capability detection; this
    /// only rejects blatantly unusable configuration.
    pub fn new(settings: Settings, capabilities: Capabilities) -> Result<Self, PipelineError> {
        if settings.tools.ffmpeg.trim().is_empty() {
            return Err(PipelineError::configuration("tools.ffmpeg is not set"));
        }
        if settings.tools.ffprobe.trim().is_empty() {
            return Err(PipelineError::configuration("tools.ffprobe is not set"));
        }

        let runner = CommandRunner::new(Duration::from_secs(settings.run.command_timeout_secs));

        let synthesizer = NarrationSynthesizer::from_config(&settings, &capabilities);
        let probe = MediaProbe::new(
            PathBuf::from(&settings.tools.ffprobe),
            PathBuf::from(&settings.tools.ffmpeg),
            runner.clone(),
        );
        let transcoder = Transcoder::new(
            PathBuf::from(&settings.tools.ffmpeg),
            runner.clone(),
            settings.video.clone(),
        );

        let transcriber = capabilities.whisper.then(|| {
            Box::new(WhisperCliTranscriber::new(
                PathBuf::from(&settings.tools.whisper),
                settings.subtitles.whisper_model.clone(),
                runner,
            )) as Box<dyn crate::subtitles::TranscriptionBackend>
        });
        let subtitles = SubtitleEngine::new(transcriber, settings.subtitles.wrap_width);

        Ok(Self {
            settings,
            synthesizer,
            fetcher: Box::new(HttpClipFetcher::default()),
            probe,
            transcoder: Box::new(transcoder),
            subtitles,
        })
    }

    /// Replace the clip fetcher (tests, alternative transports).
    pub fn with_fetcher(mut self, fetcher: Box<dyn ClipFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Replace the narration synthesizer.
    pub fn with_synthesizer(mut self, synthesizer: NarrationSynthesizer) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    /// Replace the subtitle engine.
    pub fn with_subtitle_engine(mut self, subtitles: SubtitleEngine) -> Self {
        self.subtitles = subtitles;
        self
    }

    /// Replace the transcoder backend.
    pub fn with_transcoder(mut self, transcoder: Box<dyn Transcode>) -> Self {
        self.transcoder = transcoder;
        self
    }

    /// Run the whole pipeline: narrate, acquire, normalize, concatenate,
    /// mux, subtitle, deliver.
    pub fn run(
        &self,
        script: &str,
        sources: &[ClipSource],
    ) -> Result<PipelineResult, PipelineError> {
        let output_dir = PathBuf::from(&self.settings.paths.output_dir);
        fs::create_dir_all(&output_dir)
            .map_err(|e| PipelineError::io_error("creating output directory", e))?;

        let temp_root = PathBuf::from(&self.settings.paths.temp_root);
        fs::create_dir_all(&temp_root)
            .map_err(|e| PipelineError::io_error("creating temp root", e))?;
        // Dropped on every exit path, taking all intermediates with it.
        let work = tempfile::Builder::new()
            .prefix("run_")
            .tempdir_in(&temp_root)
            .map_err(|e| PipelineError::io_error("creating run temp directory", e))?;
        let job_id = job_id_from(work.path());

        let mut warnings = Vec::new();

        let narration = self.synthesize_narration(script, work.path())?;
        tracing::info!(
            engine = %narration.engine,
            duration = narration.duration_secs,
            "narration ready"
        );

        let clips = self.acquire_and_normalize(sources, &narration, work.path(), &mut warnings)?;

        let assembled = self.assemble(&clips, &narration, work.path())?;

        let assembled_secs = self.probe.duration_secs(&assembled);
        if (assembled_secs - narration.duration_secs).abs() > DURATION_MISMATCH_TOLERANCE_SECS {
            warnings.push(format!(
                "video duration {:.2}s differs from narration {:.2}s",
                assembled_secs, narration.duration_secs
            ));
        }

        let outcome = self.subtitles.apply(
            &assembled,
            script,
            &narration.audio_path,
            narration.duration_secs,
            work.path(),
            self.transcoder.as_ref(),
        );
        warnings.extend(outcome.warnings);

        let final_path = self.deliver(&outcome.video_path, script, &output_dir, &job_id)?;
        tracing::info!(path = %final_path.display(), "pipeline complete");

        Ok(PipelineResult {
            final_video_path: final_path,
            narration_applied: true,
            subtitles_applied: outcome.applied,
            subtitle_method: outcome.method,
            warnings,
        })
    }

    fn synthesize_narration(
        &self,
        script: &str,
        work_dir: &Path,
    ) -> Result<NarrationTrack, PipelineError> {
        let audio_path = work_dir.join("narration.mp3");
        let engine = self.synthesizer.synthesize(script, &audio_path)?;
        let duration_secs = self.probe.duration_secs(&audio_path);
        Ok(NarrationTrack {
            audio_path,
            duration_secs,
            engine,
        })
    }

    fn acquire_and_normalize(
        &self,
        sources: &[ClipSource],
        narration: &NarrationTrack,
        work_dir: &Path,
        warnings: &mut Vec<String>,
    ) -> Result<Vec<ProcessedClip>, PipelineError> {
        let downloaded = download_all(self.fetcher.as_ref(), sources, work_dir, warnings);
        if downloaded.is_empty() {
            return Err(PipelineError::no_clips(format!(
                "none of {} sources could be downloaded",
                sources.len()
            )));
        }

        let timeline = ClipTimeline::new(narration.duration_secs, downloaded.len());
        let per_clip = timeline.per_clip_secs();

        let mut clips = Vec::with_capacity(downloaded.len());
        for (i, input) in downloaded.iter().enumerate() {
            let output = work_dir.join(format!("clip_{}.mp4", i));
            match self.transcoder.normalize_clip(input, &output, per_clip) {
                Ok(()) => clips.push(ProcessedClip {
                    local_path: output,
                    sequence_index: i,
                    allocated_secs: per_clip,
                }),
                Err(e) => {
                    tracing::warn!(clip = i, error = %e, "clip dropped during normalization");
                    warnings.push(format!("clip {} dropped: normalization failed", i));
                }
            }
        }

        if clips.is_empty() {
            return Err(PipelineError::no_clips(
                "every downloaded clip failed normalization",
            ));
        }
        Ok(clips)
    }

    fn assemble(
        &self,
        clips: &[ProcessedClip],
        narration: &NarrationTrack,
        work_dir: &Path,
    ) -> Result<PathBuf, PipelineError> {
        let paths: Vec<PathBuf> = clips.iter().map(|c| c.local_path.clone()).collect();
        let list_path = work_dir.join("concat_list.txt");
        let silent = work_dir.join("silent.mp4");
        self.transcoder
            .concat(&paths, &list_path, &silent)
            .map_err(|e| PipelineError::assembly_failed("concatenation", e))?;

        let assembled = work_dir.join("assembled.mp4");
        self.transcoder
            .mux(&silent, &narration.audio_path, &assembled)
            .map_err(|e| PipelineError::assembly_failed("muxing", e))?;
        Ok(assembled)
    }

    /// Move the finished video into the output directory and write the
    /// script sidecar next to it.
    fn deliver(
        &self,
        video: &Path,
        script: &str,
        output_dir: &Path,
        job_id: &str,
    ) -> Result<PathBuf, PipelineError> {
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        // Job id keeps concurrent runs in the same second from colliding.
        let final_path = output_dir.join(format!("news_video_{}_{}.mp4", stamp, job_id));

        move_file(video, &final_path)
            .map_err(|e| PipelineError::io_error("moving final video", e))?;

        let sidecar = final_path.with_file_name(format!(
            "{}_script.txt",
            final_path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "news_video".to_string())
        ));
        if let Err(e) = fs::write(&sidecar, script) {
            tracing::warn!(path = %sidecar.display(), error = %e, "could not write script sidecar");
        }

        Ok(final_path)
    }
}

/// Unique per-run token, taken from the run temp directory's random name.
fn job_id_from(work_dir: &Path) -> String {
    work_dir
        .file_name()
        .map(|n| n.to_string_lossy().trim_start_matches("run_").to_string())
        .unwrap_or_else(|| std::process::id().to_string())
}

/// Rename, falling back to copy-and-remove for cross-device moves.
fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(from, to)?;
            fs::remove_file(from)?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquire::ClipFetcher;
    use crate::orchestrator::errors::{StageError, StageResult};
    use crate::speech::SpeechBackend;
    use tempfile::tempdir;

    struct FixedAudioBackend;

    impl SpeechBackend for FixedAudioBackend {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn attempt(&self, _text: &str, out: &Path) -> bool {
            fs::write(out, b"mp3-bytes").is_ok()
        }
    }

    struct NeverFetcher;

    impl ClipFetcher for NeverFetcher {
        fn fetch(&self, _source: &ClipSource, _dest: &Path) -> bool {
            false
        }
    }

    struct AlwaysFetcher;

    impl ClipFetcher for AlwaysFetcher {
        fn fetch(&self, _source: &ClipSource, dest: &Path) -> bool {
            fs::write(dest, b"clip-bytes").is_ok()
        }
    }

    // Scripted transcoder: each stage either writes its marker output or
    // declines, so failure at any point in assembly can be simulated.
    struct ScriptedTranscoder {
        normalize: bool,
        concat: bool,
        mux: bool,
        filter: bool,
    }

    impl ScriptedTranscoder {
        fn all_ok() -> Self {
            Self {
                normalize: true,
                concat: true,
                mux: true,
                filter: true,
            }
        }

        fn stage(ok: bool, marker: &[u8], output: &Path) -> StageResult<()> {
            if ok {
                fs::write(output, marker).unwrap();
                Ok(())
            } else {
                Err(StageError::other("declined"))
            }
        }
    }

    impl Transcode for ScriptedTranscoder {
        fn normalize_clip(
            &self,
            _input: &Path,
            output: &Path,
            _target_secs: f64,
        ) -> StageResult<()> {
            Self::stage(self.normalize, b"normalized", output)
        }

        fn concat(
            &self,
            _clips: &[PathBuf],
            _list_path: &Path,
            output: &Path,
        ) -> StageResult<()> {
            Self::stage(self.concat, b"concatenated", output)
        }

        fn mux(
            &self,
            _video: &Path,
            _audio: &Path,
            output: &Path,
        ) -> StageResult<()> {
            Self::stage(self.mux, b"muxed", output)
        }

        fn apply_video_filter(
            &self,
            _input: &Path,
            _filter: &str,
            output: &Path,
        ) -> StageResult<()> {
            Self::stage(self.filter, b"subtitled", output)
        }

        fn slice_with_filter(
            &self,
            _input: &Path,
            _start_secs: f64,
            _duration_secs: f64,
            _filter: &str,
            output: &Path,
        ) -> StageResult<()> {
            Self::stage(self.filter, b"sliced", output)
        }
    }

    fn test_settings(root: &Path) -> Settings {
        let mut settings = Settings::default();
        settings.paths.output_dir = root.join("videos").to_string_lossy().into_owned();
        settings.paths.temp_root = root.join("tmp").to_string_lossy().into_owned();
        settings.tools.ffmpeg = "/nonexistent/ffmpeg".to_string();
        settings.tools.ffprobe = "/nonexistent/ffprobe".to_string();
        settings.run.command_timeout_secs = 5;
        settings
    }

    fn dir_entry_count(path: &Path) -> usize {
        fs::read_dir(path).map(|d| d.count()).unwrap_or(0)
    }

    #[test]
    fn no_speech_backends_is_no_narration() {
        let root = tempdir().unwrap();
        let orchestrator = Orchestrator::new(test_settings(root.path()), Capabilities::default())
            .unwrap()
            .with_synthesizer(NarrationSynthesizer::with_backends(Vec::new()));

        let err = orchestrator
            .run("script", &["https://cdn.example.com/a.mp4".into()])
            .unwrap_err();
        assert!(matches!(err, PipelineError::NoNarration));

        // Temp dir removed, no output delivered.
        assert_eq!(dir_entry_count(&root.path().join("tmp")), 0);
        assert_eq!(dir_entry_count(&root.path().join("videos")), 0);
    }

    #[test]
    fn all_downloads_failing_is_no_clips() {
        let root = tempdir().unwrap();
        let orchestrator = Orchestrator::new(test_settings(root.path()), Capabilities::default())
            .unwrap()
            .with_synthesizer(NarrationSynthesizer::with_backends(vec![Box::new(
                FixedAudioBackend,
            )]))
            .with_fetcher(Box::new(NeverFetcher));

        let err = orchestrator
            .run("script", &["https://cdn.example.com/a.mp4".into()])
            .unwrap_err();
        assert!(matches!(err, PipelineError::NoClips(_)));

        assert_eq!(dir_entry_count(&root.path().join("tmp")), 0);
        assert_eq!(dir_entry_count(&root.path().join("videos")), 0);
    }

    #[test]
    fn empty_source_list_is_no_clips() {
        let root = tempdir().unwrap();
        let orchestrator = Orchestrator::new(test_settings(root.path()), Capabilities::default())
            .unwrap()
            .with_synthesizer(NarrationSynthesizer::with_backends(vec![Box::new(
                FixedAudioBackend,
            )]))
            .with_fetcher(Box::new(NeverFetcher));

        let err = orchestrator.run("script", &[]).unwrap_err();
        assert!(matches!(err, PipelineError::NoClips(_)));
    }

    fn assembly_orchestrator(root: &Path, transcoder: ScriptedTranscoder) -> Orchestrator {
        Orchestrator::new(test_settings(root), Capabilities::default())
            .unwrap()
            .with_synthesizer(NarrationSynthesizer::with_backends(vec![Box::new(
                FixedAudioBackend,
            )]))
            .with_fetcher(Box::new(AlwaysFetcher))
            .with_transcoder(Box::new(transcoder))
    }

    fn sources(n: usize) -> Vec<ClipSource> {
        (0..n)
            .map(|i| ClipSource::Url(format!("https://cdn.example.com/{}.mp4", i)))
            .collect()
    }

    #[test]
    fn every_normalization_failing_is_no_clips() {
        let root = tempdir().unwrap();
        let orchestrator = assembly_orchestrator(
            root.path(),
            ScriptedTranscoder {
                normalize: false,
                ..ScriptedTranscoder::all_ok()
            },
        );

        let err = orchestrator.run("script", &sources(2)).unwrap_err();
        assert!(matches!(err, PipelineError::NoClips(_)));
        assert_eq!(dir_entry_count(&root.path().join("tmp")), 0);
        assert_eq!(dir_entry_count(&root.path().join("videos")), 0);
    }

    #[test]
    fn concat_failure_is_assembly_failed() {
        let root = tempdir().unwrap();
        let orchestrator = assembly_orchestrator(
            root.path(),
            ScriptedTranscoder {
                concat: false,
                ..ScriptedTranscoder::all_ok()
            },
        );

        let err = orchestrator.run("script", &sources(2)).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::AssemblyFailed { ref stage, .. } if stage == "concatenation"
        ));
        assert_eq!(dir_entry_count(&root.path().join("tmp")), 0);
        assert_eq!(dir_entry_count(&root.path().join("videos")), 0);
    }

    #[test]
    fn mux_failure_is_assembly_failed() {
        let root = tempdir().unwrap();
        let orchestrator = assembly_orchestrator(
            root.path(),
            ScriptedTranscoder {
                mux: false,
                ..ScriptedTranscoder::all_ok()
            },
        );

        let err = orchestrator.run("script", &sources(2)).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::AssemblyFailed { ref stage, .. } if stage == "muxing"
        ));
        assert_eq!(dir_entry_count(&root.path().join("tmp")), 0);
        assert_eq!(dir_entry_count(&root.path().join("videos")), 0);
    }

    #[test]
    fn subtitle_give_up_still_succeeds_with_narrated_video() {
        let root = tempdir().unwrap();
        let orchestrator = assembly_orchestrator(
            root.path(),
            ScriptedTranscoder {
                filter: false,
                ..ScriptedTranscoder::all_ok()
            },
        );

        let result = orchestrator.run("script", &sources(2)).unwrap();
        assert!(result.narration_applied);
        assert!(!result.subtitles_applied);
        assert_eq!(result.subtitle_method, None);
        assert!(result
            .warnings
            .iter()
            .any(|w| w.contains("delivering without captions")));

        // The delivered file is the narrated video, untouched by any burn.
        assert_eq!(fs::read(&result.final_video_path).unwrap(), b"muxed");
        assert_eq!(dir_entry_count(&root.path().join("tmp")), 0);
    }

    #[test]
    fn successful_run_delivers_video_and_sidecar() {
        let root = tempdir().unwrap();
        let orchestrator = assembly_orchestrator(root.path(), ScriptedTranscoder::all_ok());

        let result = orchestrator.run("market rallies", &sources(3)).unwrap();
        assert!(result.subtitles_applied);
        assert!(result.final_video_path.exists());

        let name = result
            .final_video_path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .into_owned();
        assert!(name.starts_with("news_video_"));

        let sidecar = result
            .final_video_path
            .with_file_name(format!("{}_script.txt", name.trim_end_matches(".mp4")));
        assert_eq!(fs::read_to_string(&sidecar).unwrap(), "market rallies");

        assert_eq!(dir_entry_count(&root.path().join("tmp")), 0);
    }

    #[test]
    fn blank_tool_path_rejected_at_construction() {
        let root = tempdir().unwrap();
        let mut settings = test_settings(root.path());
        settings.tools.ffmpeg = "  ".to_string();
        let err = Orchestrator::new(settings, Capabilities::default()).unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));
    }

    #[test]
    fn move_file_falls_back_to_copy() {
        let dir = tempdir().unwrap();
        let from = dir.path().join("a.mp4");
        let to = dir.path().join("b.mp4");
        fs::write(&from, b"payload").unwrap();
        move_file(&from, &to).unwrap();
        assert!(!from.exists());
        assert_eq!(fs::read(&to).unwrap(), b"payload");
    }
}
