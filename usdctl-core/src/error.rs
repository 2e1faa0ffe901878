/// Structured error types for the usdctl-core library.
///
/// Uses `thiserror` for better API surface and error composition.
/// The binary crate (usdctl-cli) layers `anyhow` context on top for
/// user-facing messages, but library consumers get structured errors.
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for usdctl-core operations
#[derive(Error, Debug)]
pub enum UsdError {
    /// I/O operation failed
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    /// Required runtime setting missing or invalid; fatal before any work starts
    #[error("configuration error: {reason}")]
    Config { reason: String },

    /// Scan root missing or unreadable; no tasks can be derived from it
    #[error("cannot enumerate {path:?}: {reason}")]
    Enumeration { path: PathBuf, reason: String },

    /// A path that is neither the binary nor the text representation
    #[error("{path:?} is not a USD file (expected .usdc or .usda)")]
    UnknownFormat { path: PathBuf },

    /// One external-tool invocation failed; isolated to its task in batch mode
    #[error("usdcat failed for {input:?}: {diagnostic}")]
    Conversion { input: PathBuf, diagnostic: String },

    /// The converter process could not be started at all
    #[error("failed to launch usdcat: {source}")]
    Spawn { source: io::Error },

    /// Batch stopped early by user request
    #[error("operation cancelled")]
    Cancelled,
}

/// Result type alias for usdctl-core operations
pub type Result<T> = std::result::Result<T, UsdError>;

impl UsdError {
    /// Create a configuration error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Create an enumeration error
    pub fn enumeration(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Enumeration {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an unknown-format error
    pub fn unknown_format(path: impl Into<PathBuf>) -> Self {
        Self::UnknownFormat { path: path.into() }
    }

    /// Create a conversion error carrying the tool's diagnostic text
    pub fn conversion(input: impl Into<PathBuf>, diagnostic: impl Into<String>) -> Self {
        Self::Conversion {
            input: input.into(),
            diagnostic: diagnostic.into(),
        }
    }
}
