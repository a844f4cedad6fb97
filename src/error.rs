//! Error types reported by network construction, model I/O and training.

use std::io;

/// The result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures that are reported to the caller.
///
/// Invalid configuration values (a non-positive slope, learning constant and
/// so on) are never errors: the setters ignore them and keep the previous
/// value.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The network cannot be wired as requested.
    #[error("invalid network structure: {0}")]
    Structure(String),

    /// Model text could not be parsed back into a network.
    #[error("malformed model at token {token}: {reason}")]
    Model { token: usize, reason: String },

    /// Reading or writing a file failed.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// A data table lookup or parse failed.
    #[error("data table error: {0}")]
    Table(String),

    /// A CSV record could not be read.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// The fit configuration could not be read.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// Training produced a non-finite network error.
    #[error("network error diverged to {error} after {epochs} epochs")]
    Diverged { epochs: usize, error: f64 },
}
