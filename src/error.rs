use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CarveError {
    /// Invalid runtime configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Writing one carved font failed.
    #[error("failed to extract '{}': {source}", path.display())]
    Extract {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Propagated I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CarveError>;
