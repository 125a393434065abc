//! Clip acquisition: fetching remote footage sources to local files.
//!
//! A single clip's failure is logged and skipped - it never aborts the
//! batch. Ordering of the returned paths follows the original request order
//! because it determines final clip sequencing.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::ClipSource;

/// Fetches one clip source to a local destination.
///
/// Implementations return `false` on any failure; the batch helper decides
/// what to do with it. The seam exists so the orchestrator can be exercised
/// without network access.
pub trait ClipFetcher: Send + Sync {
    fn fetch(&self, source: &ClipSource, dest: &Path) -> bool;
}

/// HTTP fetcher that streams response bodies to disk.
pub struct HttpClipFetcher {
    client: reqwest::blocking::Client,
}

impl HttpClipFetcher {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for HttpClipFetcher {
    fn default() -> Self {
        Self::new(Duration::from_secs(120))
    }
}

impl ClipFetcher for HttpClipFetcher {
    fn fetch(&self, source: &ClipSource, dest: &Path) -> bool {
        let url = source.url();
        tracing::info!(url = %url, "downloading clip");

        let mut response = match self.client.get(url).send().and_then(|r| r.error_for_status()) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "clip request failed");
                return false;
            }
        };

        let mut file = match File::create(dest) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(dest = %dest.display(), error = %e, "cannot create clip file");
                return false;
            }
        };

        if let Err(e) = io::copy(&mut response, &mut file) {
            tracing::warn!(url = %url, error = %e, "clip download interrupted");
            let _ = fs::remove_file(dest);
            return false;
        }

        if !verify_non_empty(dest) {
            tracing::warn!(dest = %dest.display(), "downloaded clip is empty");
            let _ = fs::remove_file(dest);
            return false;
        }

        true
    }
}

/// Download every source into `dir`, keeping request order.
///
/// Failed sources are skipped with a warning pushed to `warnings`.
pub fn download_all(
    fetcher: &dyn ClipFetcher,
    sources: &[ClipSource],
    dir: &Path,
    warnings: &mut Vec<String>,
) -> Vec<PathBuf> {
    let mut downloaded = Vec::new();
    for (i, source) in sources.iter().enumerate() {
        let dest = dir.join(format!("download_{}.mp4", i));
        if fetcher.fetch(source, &dest) {
            downloaded.push(dest);
        } else {
            warnings.push(format!("clip {} skipped: download failed ({})", i, source.url()));
        }
    }
    tracing::info!(
        requested = sources.len(),
        downloaded = downloaded.len(),
        "clip acquisition complete"
    );
    downloaded
}

/// A usable artifact must exist and be non-empty.
pub fn verify_non_empty(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false)
}
