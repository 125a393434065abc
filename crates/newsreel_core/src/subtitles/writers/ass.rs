//! ASS subtitle writer.
//!
//! The style block matches the canonical 1280x720 frame: centered bottom
//! text with a dark outline so captions stay readable over bright footage.

use std::fmt::Write as _;

use crate::subtitles::types::{wrap_text, SubtitleTrack};

const HEADER: &str = "\
[Script Info]
Title: Narration
ScriptType: v4.00+
PlayResX: 1280
PlayResY: 720

[V4+ Styles]
Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding
Style: Default,Arial,48,&H00FFFFFF,&H000000FF,&H00000000,&H80000000,0,0,0,0,100,100,0,0,1,2.5,1.5,2,30,30,40,1

[Events]
Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text
";

/// Render a track as an ASS document. Long segment text is wrapped at
/// `wrap_width` with `\N` line breaks.
pub fn write_ass(track: &SubtitleTrack, wrap_width: usize) -> String {
    let mut doc = String::from(HEADER);
    for segment in &track.segments {
        let text = wrap_text(&segment.text, wrap_width).join("\\N");
        let _ = writeln!(
            doc,
            "Dialogue: 0,{},{},Default,,0,0,0,,{}",
            format_ass_time(segment.start_secs),
            format_ass_time(segment.end_secs),
            text
        );
    }
    doc
}

/// `h:mm:ss.cc` with centisecond precision.
pub fn format_ass_time(secs: f64) -> String {
    let secs = secs.max(0.0);
    let total_cs = (secs * 100.0).round() as u64;
    let cs = total_cs % 100;
    let total_s = total_cs / 100;
    let s = total_s % 60;
    let m = (total_s / 60) % 60;
    let h = total_s / 3600;
    format!("{}:{:02}:{:02}.{:02}", h, m, s, cs)
}
