//! Subtitle file writers.

mod ass;
mod srt;

pub use ass::{format_ass_time, write_ass};
pub use srt::{format_srt_time, write_srt};
