//! Subtitle track model shared by the writers and burn strategies.

/// One timed caption.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleSegment {
    pub start_secs: f64,
    pub end_secs: f64,
    pub text: String,
}

/// How the track's timings were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackSource {
    /// Time-aligned by a transcription backend.
    Transcribed,
    /// Script split evenly across the narration duration.
    EvenSplit,
}

/// An ordered sequence of segments covering the narration.
#[derive(Debug, Clone)]
pub struct SubtitleTrack {
    pub segments: Vec<SubtitleSegment>,
    pub source: TrackSource,
}

impl SubtitleTrack {
    /// Build a track by chunking `script` at `wrap_width` characters and
    /// spreading the chunks evenly over `duration_secs`.
    pub fn even_split(script: &str, duration_secs: f64, wrap_width: usize) -> Self {
        let lines = wrap_text(script, wrap_width);
        let count = lines.len();
        if count == 0 || duration_secs <= 0.0 {
            return Self {
                segments: Vec::new(),
                source: TrackSource::EvenSplit,
            };
        }

        let per_segment = duration_secs / count as f64;
        let segments = lines
            .into_iter()
            .enumerate()
            .map(|(i, text)| SubtitleSegment {
                start_secs: i as f64 * per_segment,
                end_secs: (i + 1) as f64 * per_segment,
                text,
            })
            .collect();

        Self {
            segments,
            source: TrackSource::EvenSplit,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Greedy word wrap: each output line holds as many whole words as fit in
/// `width` characters. A word longer than `width` gets its own line.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
        } else if current.len() + 1 + word.len() <= width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
