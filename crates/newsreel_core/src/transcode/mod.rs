//! Clip normalization, concatenation, and muxing.

mod ffmpeg;
mod timeline;

pub use ffmpeg::{escape_concat_path, escape_filter_path, write_concat_list, Transcode, Transcoder};
pub use timeline::ClipTimeline;
