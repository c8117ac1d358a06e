use thiserror::Error;

/// Result type for eagerlink operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the eagerlink patcher
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("class not found: {name}")]
    NotFound { name: String },

    #[error("malformed class file: {message}")]
    Format { message: String },

    #[error("unexpected initializer shape: {message}")]
    Shape { message: String },

    #[error("patch error: {message}")]
    Patch { message: String },
}

impl Error {
    /// Create a not-found error for a class name
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Create a malformed-class-file error
    pub fn format_error(message: impl Into<String>) -> Self {
        Self::Format { message: message.into() }
    }

    /// Create an initializer-shape error
    pub fn shape_error(message: impl Into<String>) -> Self {
        Self::Shape { message: message.into() }
    }

    /// Create a patch error
    pub fn patch_error(message: impl Into<String>) -> Self {
        Self::Patch { message: message.into() }
    }
}
