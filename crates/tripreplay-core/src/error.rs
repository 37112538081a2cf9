//! Error types for trip loading and playback commands

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading trip data or driving playback
#[derive(Error, Debug)]
pub enum ReplayError {
    /// A file could not be read
    #[error("I/O error reading {}: {source}", .path.display())]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A file is not valid JSON
    #[error("JSON error in {}: {source}", .path.display())]
    Json {
        /// File being parsed
        path: PathBuf,
        /// Parser error
        #[source]
        source: serde_json::Error,
    },

    /// A trip log parsed but is not an event array
    #[error("Trip log {} is not a JSON array", .0.display())]
    NotAnArray(PathBuf),

    /// Configuration values are inconsistent
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Speed multiplier outside {1, 2, 5}
    #[error("Unsupported playback speed {0}x (allowed: 1, 2, 5)")]
    InvalidSpeed(u32),
}

/// Result alias for fallible replay operations
pub type Result<T> = std::result::Result<T, ReplayError>;
