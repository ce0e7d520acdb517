//! # LITHOS Generation Worker
//!
//! Runs chunk generation on a dedicated background thread.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  Envelope   ┌──────────────────────┐
//! │ WorkerHandle │ ──────────► │ GenerationWorker     │
//! │              │ ◄────────── │  context, patterns,  │
//! │  block_at ─┐ │  Response   │  modifications       │
//! └────────────┼─┘             └──────────┬───────────┘
//!              │     RwLock<ChunkCache>   │
//!              └──────────────────────────┘
//! ```
//!
//! The caller never waits on generation. Every response carries the
//! [`RequestId`] of its request; responses for different chunks may be
//! consumed in any order, and a chunk arriving after the caller lost
//! interest can simply be dropped.
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use lithos_procedural::{BlockRegistry, ChunkCoord, WorldConfig};
//! use lithos_worker::{ResponseBody, WorkerHandle};
//!
//! let worker = WorkerHandle::spawn().unwrap();
//! worker.init(42, WorldConfig::default(), BlockRegistry::default()).unwrap();
//! worker.generate_chunk(ChunkCoord::new(0, 3, 0)).unwrap();
//!
//! let init = worker.recv_timeout(Duration::from_secs(30)).unwrap();
//! assert!(matches!(init.body, ResponseBody::Initialized));
//! let chunk = worker.recv_timeout(Duration::from_secs(30)).unwrap();
//! assert!(chunk.chunk().is_some());
//! ```

#![deny(unsafe_code)]

pub mod cache;
pub mod error;
pub mod handle;
pub mod protocol;
pub mod worker;

pub use cache::{ChunkCache, SharedChunkCache};
pub use error::{Result, WorkerError};
pub use handle::WorkerHandle;
pub use protocol::{Envelope, Request, RequestId, Response, ResponseBody, SchematicMetadata};
pub use worker::GenerationWorker;
