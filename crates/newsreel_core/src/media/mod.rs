//! Media inspection.

mod probe;

pub use probe::{tail_lines, MediaProbe, DEFAULT_DURATION_SECS};
