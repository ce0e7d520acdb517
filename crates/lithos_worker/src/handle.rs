//! # Worker Handle
//!
//! Caller side of the generation worker.
//!
//! `send` never blocks; responses are polled with `try_recv`, waited on
//! with `recv_timeout`, or selected on through [`WorkerHandle::responses`].
//! Single-block queries read the shared chunk cache directly.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender};

use lithos_procedural::{BlockId, BlockRegistry, ChunkCoord, ModificationRecord, WorldConfig};

use crate::cache::{ChunkCache, SharedChunkCache};
use crate::error::{Result, WorkerError};
use crate::protocol::{Envelope, Request, RequestId, Response, ResponseBody, SchematicMetadata};
use crate::worker::GenerationWorker;

/// Name of the background thread.
pub const THREAD_NAME: &str = "lithos-generation";

/// Owns the worker thread and both ends of its queues.
///
/// Dropping the handle shuts the worker down after it drains queued
/// requests, and joins the thread.
pub struct WorkerHandle {
    requests: Sender<Envelope>,
    responses: Receiver<Response>,
    cache: SharedChunkCache,
    next_id: AtomicU64,
    thread: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    /// Starts the worker thread.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Spawn`] if the OS refuses the thread.
    pub fn spawn() -> Result<Self> {
        let (request_tx, request_rx) = unbounded();
        let (response_tx, response_rx) = unbounded();
        let cache = ChunkCache::shared();
        let worker = GenerationWorker::new(Arc::clone(&cache));

        let thread = thread::Builder::new()
            .name(THREAD_NAME.to_owned())
            .spawn(move || run(worker, &request_rx, &response_tx))
            .map_err(|e| WorkerError::Spawn(e.to_string()))?;

        tracing::info!(thread = THREAD_NAME, "generation worker started");
        Ok(Self {
            requests: request_tx,
            responses: response_rx,
            cache,
            next_id: AtomicU64::new(1),
            thread: Some(thread),
        })
    }

    /// Queues a request. Returns the id its responses will carry.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::WorkerGone`] if the worker thread has exited.
    pub fn send(&self, request: Request) -> Result<RequestId> {
        let id = RequestId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.requests
            .send(Envelope { id, request })
            .map_err(|_| WorkerError::WorkerGone)?;
        Ok(id)
    }

    /// Sends `Init`.
    ///
    /// # Errors
    ///
    /// See [`WorkerHandle::send`].
    pub fn init(&self, seed: u64, config: WorldConfig, blocks: BlockRegistry) -> Result<RequestId> {
        self.send(Request::Init {
            seed,
            config: Box::new(config),
            blocks,
        })
    }

    /// Sends `GenerateChunk`.
    ///
    /// # Errors
    ///
    /// See [`WorkerHandle::send`].
    pub fn generate_chunk(&self, coord: ChunkCoord) -> Result<RequestId> {
        self.send(Request::GenerateChunk(coord))
    }

    /// Sends `UpdateBlock`.
    ///
    /// # Errors
    ///
    /// See [`WorkerHandle::send`].
    pub fn update_block(
        &self,
        coord: ChunkCoord,
        local: (usize, usize, usize),
        block: BlockId,
    ) -> Result<RequestId> {
        self.send(Request::UpdateBlock { coord, local, block })
    }

    /// Sends `ApplyModifications`.
    ///
    /// # Errors
    ///
    /// See [`WorkerHandle::send`].
    pub fn apply_modifications(&self, records: Vec<ModificationRecord>) -> Result<RequestId> {
        self.send(Request::ApplyModifications(records))
    }

    /// Sends `LoadSchematic`.
    ///
    /// # Errors
    ///
    /// See [`WorkerHandle::send`].
    pub fn load_schematic(
        &self,
        name: impl Into<String>,
        bytes: Vec<u8>,
        metadata: SchematicMetadata,
    ) -> Result<RequestId> {
        self.send(Request::LoadSchematic {
            name: name.into(),
            bytes,
            metadata,
        })
    }

    /// Sends `UnloadChunk`.
    ///
    /// # Errors
    ///
    /// See [`WorkerHandle::send`].
    pub fn unload_chunk(&self, coord: ChunkCoord) -> Result<RequestId> {
        self.send(Request::UnloadChunk(coord))
    }

    /// Sends `ExportModifications`.
    ///
    /// # Errors
    ///
    /// See [`WorkerHandle::send`].
    pub fn export_modifications(&self) -> Result<RequestId> {
        self.send(Request::ExportModifications)
    }

    /// Next response, if one is ready.
    #[must_use]
    pub fn try_recv(&self) -> Option<Response> {
        self.responses.try_recv().ok()
    }

    /// Waits up to `timeout` for the next response.
    #[must_use]
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Response> {
        self.responses.recv_timeout(timeout).ok()
    }

    /// Response queue, for use with `crossbeam_channel::select!`.
    #[must_use]
    pub fn responses(&self) -> &Receiver<Response> {
        &self.responses
    }

    /// Block at an absolute position; `0` if its chunk is not loaded.
    #[must_use]
    pub fn block_at(&self, x: i32, y: i32, z: i32) -> BlockId {
        self.cache.read().block_at(x, y, z)
    }

    /// Returns true if the chunk is in the cache.
    #[must_use]
    pub fn is_loaded(&self, coord: ChunkCoord) -> bool {
        self.cache.read().contains(coord)
    }

    /// Shared cache, for block queries from other threads.
    #[must_use]
    pub fn cache(&self) -> SharedChunkCache {
        Arc::clone(&self.cache)
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        let id = RequestId(self.next_id.fetch_add(1, Ordering::Relaxed));
        // Already gone if this fails; the join below still reaps it.
        let _ = self.requests.send(Envelope {
            id,
            request: Request::Shutdown,
        });
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::warn!("generation worker thread panicked");
            }
        }
    }
}

/// Worker thread body.
fn run(mut worker: GenerationWorker, requests: &Receiver<Envelope>, responses: &Sender<Response>) {
    for envelope in requests {
        if matches!(envelope.request, Request::Shutdown) {
            break;
        }

        let id = envelope.id;
        let out = panic::catch_unwind(AssertUnwindSafe(|| worker.handle(envelope))).unwrap_or_else(|payload| {
            let message = panic_message(payload.as_ref());
            tracing::error!(request = id.0, panic = %message, "request handler panicked");
            vec![Response::new(
                id,
                ResponseBody::Error(WorkerError::Panicked(message).to_string()),
            )]
        });

        for response in out {
            if responses.send(response).is_err() {
                tracing::debug!("response receiver dropped, worker exiting");
                return;
            }
        }
    }
    tracing::info!("generation worker stopped");
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_owned())
}
