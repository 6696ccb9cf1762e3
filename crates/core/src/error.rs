use thiserror::Error;

/// Result type for ragbench operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for ragbench operations
#[derive(Error, Debug)]
pub enum Error {
    /// I/O related errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors (bad method name, mismatched file counts, ...)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required input file is missing or unusable
    #[error("Input error: {0}")]
    Input(String),

    /// Parse errors with file and line context
    #[error("Parse error in {file} (line {line}): {message}")]
    Parse {
        file: String,
        line: usize,
        message: String,
    },

    /// Search backend call failures
    #[error("Backend error: {0}")]
    Backend(String),

    /// Any other error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Creates a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an input error
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    /// Creates a parse error
    pub fn parse(file: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            file: file.into(),
            line,
            message: message.into(),
        }
    }

    /// Creates a backend error
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}
