use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while recovering config bytes from a package.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed manifest {path}: {reason}")]
    ManifestMalformed { path: PathBuf, reason: String },

    #[error("{tool} command not found")]
    ToolUnavailable { tool: String },

    #[error("{tool} exited with status {status}: {stderr}")]
    ToolFailed { tool: String, status: String, stderr: String },

    #[error("Unable to find payload class under package {package}")]
    PayloadClassNotFound { package: String },

    #[error("No byte array literal found in {path}")]
    PayloadPatternNotFound { path: PathBuf },

    #[error("Decompiler produced no output for {path}")]
    DecompilationProducedNoOutput { path: PathBuf },

    #[error("Unable to read decompiled source {path}: {source}")]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Archive extraction failed: {message}")]
    ArchiveExtraction { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

pub type Result<T> = std::result::Result<T, ExtractError>;

impl ExtractError {
    pub fn manifest_malformed<P: Into<PathBuf>, S: Into<String>>(path: P, reason: S) -> Self {
        Self::ManifestMalformed { path: path.into(), reason: reason.into() }
    }

    pub fn tool_unavailable<S: Into<String>>(tool: S) -> Self {
        Self::ToolUnavailable { tool: tool.into() }
    }

    pub fn tool_failed<S1: Into<String>, S2: Into<String>, S3: Into<String>>(
        tool: S1,
        status: S2,
        stderr: S3,
    ) -> Self {
        Self::ToolFailed { tool: tool.into(), status: status.into(), stderr: stderr.into() }
    }

    pub fn payload_class_not_found<S: Into<String>>(package: S) -> Self {
        Self::PayloadClassNotFound { package: package.into() }
    }

    pub fn payload_pattern_not_found<P: Into<PathBuf>>(path: P) -> Self {
        Self::PayloadPatternNotFound { path: path.into() }
    }

    pub fn no_decompiler_output<P: Into<PathBuf>>(path: P) -> Self {
        Self::DecompilationProducedNoOutput { path: path.into() }
    }

    pub fn source_unreadable<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        Self::SourceUnreadable { path: path.into(), source }
    }

    pub fn archive_extraction<S: Into<String>>(message: S) -> Self {
        Self::ArchiveExtraction { message: message.into() }
    }

    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration { message: message.into() }
    }

    /// Returns true if the error only disqualifies a single class candidate
    /// and the search may continue with the next one.
    pub fn is_candidate_local(&self) -> bool {
        matches!(
            self,
            Self::PayloadPatternNotFound { .. }
                | Self::DecompilationProducedNoOutput { .. }
                | Self::SourceUnreadable { .. }
        )
    }

    /// Returns true if the error must abort the whole run
    pub fn is_fatal(&self) -> bool {
        !self.is_candidate_local() && !matches!(self, Self::PayloadClassNotFound { .. })
    }
}
