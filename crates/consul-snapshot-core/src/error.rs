//! Error types for consul-snapshot

use thiserror::Error;

/// Result type alias using consul-snapshot-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// How a failure is treated by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad or missing configuration; reported before any network activity
    Configuration,
    /// A store or object-storage call failed; aborts the current run
    Transport,
    /// Corrupt archive, failed decryption, unparsable metadata
    Format,
    /// Individual items failed during a replay; counted, not fatal to the run
    PartialItem,
    /// The store has a feature switched off; treated as an empty result
    FeatureUnavailable,
}

/// Core error types for consul-snapshot
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid or incomplete configuration
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    /// Coordination store request failed
    #[error("Consul request failed: {message}")]
    Store { message: String },

    /// The store reported that ACL support is disabled
    #[error("ACL support disabled on the Consul cluster")]
    AclSupportDisabled,

    /// Object storage request failed
    #[error("{backend} request failed: {message}")]
    Remote {
        backend: &'static str,
        message: String,
    },

    /// The archive or one of its members is malformed
    #[error("Invalid snapshot archive: {message}")]
    Format { message: String },

    /// Authenticated decryption failed
    #[error("unable to decrypt archive: bad passphrase or corrupt data")]
    Decrypt,

    /// Encryption could not be performed
    #[error("unable to encrypt archive: {message}")]
    Encrypt { message: String },

    /// Some keys could not be written back during a restore
    #[error("restore completed with {failed} errors ({succeeded} keys restored)")]
    PartialRestore { failed: usize, succeeded: usize },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a store transport error
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Create an object storage transport error
    pub fn remote(backend: &'static str, message: impl Into<String>) -> Self {
        Self::Remote {
            backend,
            message: message.into(),
        }
    }

    /// Create an archive format error
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
        }
    }

    /// Create an encryption error
    pub fn encrypt(message: impl Into<String>) -> Self {
        Self::Encrypt {
            message: message.into(),
        }
    }

    /// Classify this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Config { .. } => ErrorCategory::Configuration,
            Self::Store { .. } | Self::Remote { .. } | Self::Io(_) => ErrorCategory::Transport,
            Self::Format { .. } | Self::Decrypt | Self::Encrypt { .. } | Self::Json(_) => {
                ErrorCategory::Format
            }
            Self::PartialRestore { .. } => ErrorCategory::PartialItem,
            Self::AclSupportDisabled => ErrorCategory::FeatureUnavailable,
        }
    }

    /// Whether this error must abort the current run
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self.category(),
            ErrorCategory::PartialItem | ErrorCategory::FeatureUnavailable
        )
    }
}
