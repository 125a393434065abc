//! Time allocation across the clip sequence.

/// Divides the narration duration evenly across the surviving clips.
#[derive(Debug, Clone, Copy)]
pub struct ClipTimeline {
    total_secs: f64,
    clip_count: usize,
}

impl ClipTimeline {
    /// `total_secs` is the narration duration the video must cover.
    pub fn new(total_secs: f64, clip_count: usize) -> Self {
        Self {
            total_secs,
            clip_count,
        }
    }

    /// Seconds each clip is allotted. Zero clips allots zero.
    pub fn per_clip_secs(&self) -> f64 {
        if self.clip_count == 0 {
            return 0.0;
        }
        self.total_secs / self.clip_count as f64
    }

    /// Per-clip allocation for every position in sequence order.
    pub fn allocations(&self) -> Vec<f64> {
        vec![self.per_clip_secs(); self.clip_count]
    }

    pub fn total_secs(&self) -> f64 {
        self.total_secs
    }

    pub fn clip_count(&self) -> usize {
        self.clip_count
    }
}
