//! # Worker Error Types
//!
//! Failures on the caller side of the worker channel, and per-request
//! failures inside the worker that become `Error` responses.

use thiserror::Error;

use lithos_procedural::{ChunkCoord, ConfigError};

/// Errors from talking to, or running inside, the generation worker.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkerError {
    /// A generation request arrived before a successful `Init`.
    #[error("worker not initialized: send Init first")]
    NotInitialized,

    /// The worker thread has exited; nothing can be sent to it.
    #[error("worker thread is gone")]
    WorkerGone,

    /// The worker thread could not be started.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(String),

    /// A local voxel coordinate outside `0..16`.
    #[error("local coordinate ({x}, {y}, {z}) outside chunk")]
    LocalOutOfRange {
        /// Local x.
        x: usize,
        /// Local y.
        y: usize,
        /// Local z.
        z: usize,
    },

    /// A chunk coordinate whose blocks fall outside `i32` positions.
    #[error("chunk {0:?} is outside the addressable world")]
    ChunkOutOfRange(ChunkCoord),

    /// The supplied world config was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A request handler panicked; the worker survived it.
    #[error("request handler panicked: {0}")]
    Panicked(String),
}

/// Result type for worker operations.
pub type Result<T> = std::result::Result<T, WorkerError>;
