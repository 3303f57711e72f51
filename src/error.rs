//! Error taxonomy shared by the renderer, the allocator and the stores.

/// Errors raised while rendering a capture or persisting it.
///
/// Every variant aborts the operation that raised it; nothing partially
/// rendered or partially written is ever returned alongside an error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid sample: {channel} value {value} is outside 0-255")]
    InvalidSample {
        /// Which plane the value came from ("luminance", "red", ...)
        channel: &'static str,
        /// The rejected value
        value: i64,
    },

    #[error("Dimension mismatch: expected {expected_width}x{expected_height}, got {actual_width}x{actual_height}")]
    DimensionMismatch {
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    #[error("Malformed frame: expected {expected} samples, got {actual}")]
    MalformedFrame { expected: usize, actual: usize },

    #[error("Could not allocate an unused identifier after {attempts} attempts")]
    AllocationExhausted {
        /// Number of candidates drawn before giving up
        attempts: u32,
    },

    #[error("Record '{id}' not found")]
    NotFound { id: String },

    #[error("Record '{id}' already exists")]
    AlreadyExists { id: String },

    #[error("Store unavailable: {message}")]
    StoreUnavailable { message: String },

    #[error("Malformed record '{id}': {message}")]
    Codec { id: String, message: String },
}

impl Error {
    /// Shorthand for wrapping any transport failure.
    pub fn unavailable(message: impl std::fmt::Display) -> Self {
        Error::StoreUnavailable {
            message: message.to_string(),
        }
    }

    pub fn not_found(id: &str) -> Self {
        Error::NotFound { id: id.to_string() }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::unavailable(e)
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::unavailable(e)
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
