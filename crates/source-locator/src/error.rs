use std::path::PathBuf;
use thiserror::Error;

/// Result type for locator operations
pub type Result<T> = std::result::Result<T, LocatorError>;

/// Errors that can occur while locating source or documentation
#[derive(Error, Debug)]
pub enum LocatorError {
    /// No source or documentation could be discovered for the target
    #[error("Source not found: {0}")]
    NotFound(String),

    /// The file holding the target cannot be opened
    #[error("Cannot read {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A value that is not a valid module or method was passed in
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Requested candidate rank exceeds the discovered candidates
    #[error("Candidate index {requested} out of range ({available} candidates available)")]
    AmbiguousCandidateIndex { requested: usize, available: usize },

    /// Tree-sitter error
    #[error("Tree-sitter error: {0}")]
    TreeSitter(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl LocatorError {
    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an unreadable file error
    pub fn unreadable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Unreadable {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a tree-sitter error
    pub fn tree_sitter(msg: impl Into<String>) -> Self {
        Self::TreeSitter(msg.into())
    }

    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Whether the calling command can report this and carry on
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_)
                | Self::Unreadable { .. }
                | Self::AmbiguousCandidateIndex { .. }
                | Self::TreeSitter(_)
        )
    }
}
