//! ElevenLabs HTTP speech backend.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde_json::json;

use super::SpeechBackend;

const API_BASE: &str = "https://api.elevenlabs.io/v1/text-to-speech";
const MODEL_ID: &str = "eleven_multilingual_v2";

pub struct ElevenLabsBackend {
    api_key: String,
    voice_id: String,
    client: reqwest::blocking::Client,
}

impl ElevenLabsBackend {
    pub fn new(api_key: String, voice_id: String) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_default();
        Self {
            api_key,
            voice_id,
            client,
        }
    }
}

impl SpeechBackend for ElevenLabsBackend {
    fn name(&self) -> &'static str {
        "elevenlabs"
    }

    fn attempt(&self, text: &str, out: &Path) -> bool {
        let url = format!("{}/{}", API_BASE, self.voice_id);
        let body = json!({
            "text": text,
            "model_id": MODEL_ID,
            "voice_settings": {
                "stability": 0.5,
                "similarity_boost": 0.75,
                "style": 0.0,
                "use_speaker_boost": true,
            },
        });

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .header("accept", "audio/mpeg")
            .json(&body)
            .send()
            .and_then(|r| r.error_for_status());

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "elevenlabs request failed");
                return false;
            }
        };

        let bytes = match response.bytes() {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(error = %e, "elevenlabs response read failed");
                return false;
            }
        };

        if let Err(e) = fs::write(out, &bytes) {
            tracing::warn!(path = %out.display(), error = %e, "cannot write narration audio");
            return false;
        }
        true
    }
}
