//! Error types for tikzrender library.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for tikzrender operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while emitting or rendering pictures.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error reading or writing JSON descriptions.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A rewrite pattern failed to compile.
    #[error("Pattern error: {0}")]
    Regex(#[from] regex::Error),

    /// A document was saved without any pictures.
    #[error("Document contains no pictures")]
    EmptyDocument,

    /// Pictures and captions of a document are out of step.
    #[error("Document has {pictures} pictures but {captions} captions")]
    CaptionMismatch {
        /// Number of pictures
        pictures: usize,
        /// Number of captions
        captions: usize,
    },

    /// The save target cannot hold the given content.
    #[error("Unsupported target: {0}")]
    UnsupportedTarget(String),

    /// An external program could not be started.
    #[error("Failed to run '{program}' (is it installed and on PATH?): {source}")]
    ToolSpawn {
        /// Program name as configured
        program: String,
        /// Underlying spawn error
        #[source]
        source: io::Error,
    },

    /// The typesetting engine reported an error.
    #[error("{engine} failed:\n{message}")]
    Engine {
        /// Engine command
        engine: String,
        /// Error block taken from the engine log
        message: String,
    },

    /// A format converter failed.
    #[error("{tool} failed: {message}")]
    Converter {
        /// Converter command
        tool: String,
        /// Description of the failure
        message: String,
    },

    /// A tool reported success but its output file is missing.
    #[error("Expected output not found: {0}")]
    MissingOutput(PathBuf),

    /// Rendered SVG could not be read as text.
    #[error("Invalid SVG output: {0}")]
    InvalidSvg(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}
