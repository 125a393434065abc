//! Process execution helpers.

mod runner;

pub use runner::{CommandOutput, CommandRunner};
