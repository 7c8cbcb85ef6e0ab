//! Startup error taxonomy shared by the copy tools
//!
//! Everything here is fatal before or while worker threads are being created.
//! Once a pipeline is running, worker I/O failures are propagated as plain
//! `anyhow` errors with context instead.

/// Fatal startup errors.
///
/// All variants map to process exit code 1 in the binaries. `Usage` and
/// `ResourceOpen` are raised before any thread exists; `ThreadCreation` is
/// raised after the orchestrator has already joined the threads it managed
/// to create.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Invalid command-line input (argument count or value range)
    #[error("{0}")]
    Usage(String),

    /// An input/output path could not be opened or created
    #[error("cannot open {path:?}: {source}")]
    ResourceOpen {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The OS refused to spawn a worker thread
    #[error("failed to spawn worker thread: {0}")]
    ThreadCreation(#[source] std::io::Error),
}

impl Error {
    pub fn resource_open(path: impl Into<std::path::PathBuf>, source: std::io::Error) -> Self {
        Error::ResourceOpen {
            path: path.into(),
            source,
        }
    }
}
