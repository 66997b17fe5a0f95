//! Error types shared by the pattern core, the store and the sequencer.

use std::path::PathBuf;

use thiserror::Error;

/// Everything the core can fail with.
///
/// Each variant is a distinct kind the caller is expected to react to
/// differently: initialization failures are fatal, I/O and format failures are
/// reported and the operation is abandoned, index failures are bugs.
#[derive(Debug, Error)]
pub enum Error {
    /// The sound-event player could not be acquired or opened.
    #[error("sound backend unavailable: {0}")]
    Initialization(String),

    /// A pattern file could not be read or written.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A loaded pattern is not exactly 256 booleans.
    #[error("invalid pattern data: {0}")]
    Format(String),

    /// A cell outside the 16x16 grid was addressed.
    #[error("cell ({instrument}, {step}) is outside the 16x16 grid")]
    Index { instrument: usize, step: usize },

    /// A message could not be delivered to the MIDI output.
    #[error("MIDI send failed: {0}")]
    Send(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
