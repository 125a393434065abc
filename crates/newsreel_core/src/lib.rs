//! Newsreel Core - narrated video assembly
//!
//! This crate turns a block of narration text and a list of silent stock
//! footage sources into a single playable video: speech synthesis, per-clip
//! transcoding, concatenation, muxing, and best-effort subtitle burn-in.
//! It has no UI or HTTP-surface dependencies; callers (API servers, CLIs)
//! feed it a script and clip sources and receive a `PipelineResult`.

pub mod acquire;
pub mod config;
pub mod io;
pub mod logging;
pub mod media;
pub mod models;
pub mod orchestrator;
pub mod speech;
pub mod subtitles;
pub mod transcode;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_returns_value() {
        assert!(!version().is_empty());
    }
}
