//! Subtitle generation and burn-in.

mod burn;
mod engine;
mod transcribe;
mod types;
pub mod writers;

pub use burn::{
    AssOverlay, BurnContext, FixedCaption, SegmentedCaptions, SrtOverlay, SubtitleBurnStrategy,
};
pub use engine::{SubtitleEngine, SubtitleOutcome};
pub use transcribe::{parse_whisper_json, TranscriptionBackend, WhisperCliTranscriber};
pub use types::{wrap_text, SubtitleSegment, SubtitleTrack, TrackSource};
