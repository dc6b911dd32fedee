use thiserror::Error;

/// Result type for code window operations
pub type Result<T> = std::result::Result<T, WindowError>;

/// Errors that can occur while building a code buffer
///
/// Windowing and rendering never fail; only reading input and validating
/// formatting can.
#[derive(Error, Debug)]
pub enum WindowError {
    /// IO error occurred while reading the source
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid formatting configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl WindowError {
    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
