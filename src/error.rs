//! # Startup Errors
//! src/error.rs
//!
//! Everything that can stop the server from coming up. These are fatal and
//! surface at the process boundary; per-connection problems never do.

use crate::config::ConfigError;
use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("backlog must be at least 1 (got {0})")]
    InvalidBacklog(usize),

    #[error("cannot listen on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("cannot load resources from {}: {source}", dir.display())]
    Resources {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot spawn thread: {0}")]
    Spawn(#[source] io::Error),
}
