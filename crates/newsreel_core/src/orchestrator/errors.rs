//! Error types for the assembly pipeline.
//!
//! Two layers: `StageError` describes a single failed operation (a tool
//! invocation, a parse, an I/O call); `PipelineError` is the fatal taxonomy
//! surfaced to callers. Transient failures inside a fallback cascade never
//! reach `PipelineError` - they are logged and the cascade advances.

use std::io;

use thiserror::Error;

/// Fatal, caller-visible pipeline failure.
///
/// When any of these is returned, no output file exists at the expected
/// output path.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Required tool path or credential missing; operator action needed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Every configured speech backend failed or none were available.
    #[error("no narration could be synthesized (all speech backends failed)")]
    NoNarration,

    /// No clip could be downloaded, or none survived normalization.
    #[error("no usable clips: {0}")]
    NoClips(String),

    /// Concatenation or muxing failed; there is no further fallback.
    #[error("assembly failed during {stage}: {source}")]
    AssemblyFailed {
        stage: String,
        #[source]
        source: StageError,
    },

    /// Filesystem failure outside any single stage (temp dir, final move).
    #[error("I/O error in {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },
}

impl PipelineError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn no_clips(message: impl Into<String>) -> Self {
        Self::NoClips(message.into())
    }

    pub fn assembly_failed(stage: impl Into<String>, source: StageError) -> Self {
        Self::AssemblyFailed {
            stage: stage.into(),
            source,
        }
    }

    pub fn io_error(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }
}

/// Error from a single pipeline operation.
#[derive(Error, Debug)]
pub enum StageError {
    /// An external command exited unsuccessfully.
    #[error("{tool} failed with exit code {exit_code}: {message}")]
    CommandFailed {
        tool: String,
        exit_code: i32,
        message: String,
    },

    /// An external command exceeded its deadline and was killed.
    #[error("{tool} timed out after {seconds}s")]
    Timeout { tool: String, seconds: u64 },

    /// File I/O error.
    #[error("I/O error in {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },

    /// A required file was not found.
    #[error("required file not found: {path}")]
    FileNotFound { path: String },

    /// Parsing error (tool JSON, timestamps, diagnostic output).
    #[error("failed to parse {what}: {message}")]
    Parse { what: String, message: String },

    /// Generic stage error with message.
    #[error("{0}")]
    Other(String),
}

impl StageError {
    pub fn command_failed(
        tool: impl Into<String>,
        exit_code: i32,
        message: impl Into<String>,
    ) -> Self {
        Self::CommandFailed {
            tool: tool.into(),
            exit_code,
            message: message.into(),
        }
    }

    pub fn timeout(tool: impl Into<String>, seconds: u64) -> Self {
        Self::Timeout {
            tool: tool.into(),
            seconds,
        }
    }

    pub fn io_error(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    pub fn parse(what: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            what: what.into(),
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

/// Result type for stage operations.
pub type StageResult<T> = Result<T, StageError>;

/// Result type for whole-pipeline operations.
pub type PipelineResultExt<T> = Result<T, PipelineError>;
