//! Error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort cleaning a document. The transformation stages themselves never fail.
#[derive(Debug, Error)]
pub enum Error {
    /// Source could not be read or the result could not be written.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Markup the parser refuses to build a tree from.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The serializer failed to render the tree.
    #[error("Serialization error: {0}")]
    Serialize(#[source] io::Error),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
