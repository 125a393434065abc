//! Keyless web TTS fallback using the public translate endpoint.
//!
//! The endpoint caps input length per request, so long scripts are split on
//! word boundaries and the MP3 responses are appended in order. MP3 frames
//! concatenate cleanly enough for narration use.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use super::SpeechBackend;

const ENDPOINT: &str = "https://translate.google.com/translate_tts";
const MAX_CHUNK_CHARS: usize = 200;

pub struct GoogleWebTtsBackend {
    lang: String,
    client: reqwest::blocking::Client,
}

impl GoogleWebTtsBackend {
    pub fn new(lang: String) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_default();
        Self { lang, client }
    }
}

impl SpeechBackend for GoogleWebTtsBackend {
    fn name(&self) -> &'static str {
        "google_tts"
    }

    fn attempt(&self, text: &str, out: &Path) -> bool {
        let chunks = chunk_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            tracing::warn!("no text to synthesize");
            return false;
        }

        let mut file = match OpenOptions::new().create(true).truncate(true).write(true).open(out) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(path = %out.display(), error = %e, "cannot open narration file");
                return false;
            }
        };

        for (i, chunk) in chunks.iter().enumerate() {
            let response = self
                .client
                .get(ENDPOINT)
                .query(&[
                    ("ie", "UTF-8"),
                    ("client", "tw-ob"),
                    ("tl", self.lang.as_str()),
                    ("q", chunk.as_str()),
                ])
                .send()
                .and_then(|r| r.error_for_status());

            let bytes = match response.and_then(|r| r.bytes()) {
                Ok(b) => b,
                Err(e) => {
                    tracing::warn!(chunk = i, error = %e, "web tts chunk failed");
                    return false;
                }
            };

            if let Err(e) = file.write_all(&bytes) {
                tracing::warn!(path = %out.display(), error = %e, "cannot append narration audio");
                return false;
            }
        }
        true
    }
}

/// Split text into chunks no longer than `max_chars`, on word boundaries.
///
/// A single word longer than the limit becomes its own chunk rather than
/// being dropped or split mid-word.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
        } else if current.len() + 1 + word.len() <= max_chars {
            current.push(' ');
            current.push_str(word);
        } else {
            chunks.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(chunk_text("hello world", 200), vec!["hello world"]);
    }

    #[test]
    fn splits_on_word_boundaries() {
        let chunks = chunk_text("aaa bbb ccc ddd", 7);
        assert_eq!(chunks, vec!["aaa bbb", "ccc ddd"]);
    }

    #[test]
    fn oversized_word_gets_own_chunk() {
        let chunks = chunk_text("hi incomprehensibilities yo", 10);
        assert_eq!(chunks, vec!["hi", "incomprehensibilities", "yo"]);
    }

    #[test]
    fn empty_text_gives_no_chunks() {
        assert!(chunk_text("   ", 100).is_empty());
    }
}
