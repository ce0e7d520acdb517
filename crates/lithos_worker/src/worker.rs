//! # Generation Worker
//!
//! Request handling for the background generation context.
//!
//! [`GenerationWorker`] owns everything a session accumulates: the
//! generation context, loaded patterns and the modification store. It is
//! synchronous; [`crate::WorkerHandle`] runs it on its own thread. A
//! failed request turns into an `Error` response and the worker carries on.

use std::sync::Arc;
use std::time::Instant;

use lithos_procedural::{
    BlockId, BlockPos, BlockRegistry, ChunkAssembler, ChunkCoord, GenerationContext, ModificationRecord,
    ModificationStore, PatternRegistry, SchematicPattern, WorldConfig, CHUNK_SIZE,
};

use crate::cache::SharedChunkCache;
use crate::error::{Result, WorkerError};
use crate::protocol::{Envelope, Request, Response, ResponseBody, SchematicMetadata};

/// State owned by the worker thread.
pub struct GenerationWorker {
    context: Option<GenerationContext>,
    patterns: PatternRegistry,
    modifications: ModificationStore,
    cache: SharedChunkCache,
}

impl GenerationWorker {
    /// Creates an uninitialized worker writing finished chunks into `cache`.
    #[must_use]
    pub fn new(cache: SharedChunkCache) -> Self {
        Self {
            context: None,
            patterns: PatternRegistry::new(),
            modifications: ModificationStore::new(),
            cache,
        }
    }

    /// Returns true once an `Init` has succeeded.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.context.is_some()
    }

    /// Stored edits.
    #[must_use]
    pub fn modifications(&self) -> &ModificationStore {
        &self.modifications
    }

    /// Loaded patterns.
    #[must_use]
    pub fn patterns(&self) -> &PatternRegistry {
        &self.patterns
    }

    /// Handles one request, returning zero or more responses tagged with its id.
    ///
    /// `Shutdown` is a no-op here; the thread loop acts on it.
    pub fn handle(&mut self, envelope: Envelope) -> Vec<Response> {
        let Envelope { id, request } = envelope;
        let kind = request.kind();

        let bodies = match request {
            Request::Init { seed, config, blocks } => self.init(seed, *config, blocks).map(|b| vec![b]),
            Request::GenerateChunk(coord) => self.generate(coord).map(|b| vec![b]),
            Request::UpdateBlock { coord, local, block } => {
                self.update_block(coord, local, block).map(|b| b.into_iter().collect())
            }
            Request::ApplyModifications(records) => Ok(self.apply_modifications(records)),
            Request::LoadSchematic { name, bytes, metadata } => {
                Ok(vec![self.load_schematic(name, &bytes, metadata)])
            }
            Request::UnloadChunk(coord) => {
                let removed = self.cache.write().remove(coord);
                tracing::debug!(x = coord.x, y = coord.y, z = coord.z, removed, "chunk unloaded");
                Ok(Vec::new())
            }
            Request::ExportModifications => Ok(vec![ResponseBody::Modifications(self.modifications.export())]),
            Request::Shutdown => Ok(Vec::new()),
        };

        let bodies = bodies.unwrap_or_else(|err| {
            tracing::warn!(request = id.0, kind, error = %err, "request failed");
            vec![ResponseBody::Error(err.to_string())]
        });
        bodies.into_iter().map(|body| Response::new(id, body)).collect()
    }

    fn init(&mut self, seed: u64, mut config: WorldConfig, blocks: BlockRegistry) -> Result<ResponseBody> {
        config.seed = seed;
        let context = GenerationContext::new(config, blocks)?;

        self.context = Some(context);
        self.patterns.clear();
        self.cache.write().clear();
        tracing::info!(seed, "generation context initialized");
        Ok(ResponseBody::Initialized)
    }

    fn generate(&mut self, coord: ChunkCoord) -> Result<ResponseBody> {
        let ctx = self.context.as_ref().ok_or(WorkerError::NotInitialized)?;
        let start = Instant::now();
        let chunk = Arc::new(ChunkAssembler::new(ctx, &self.patterns).assemble(coord, &self.modifications));
        self.cache.write().insert(Arc::clone(&chunk));

        tracing::debug!(
            x = coord.x,
            y = coord.y,
            z = coord.z,
            elapsed_us = start.elapsed().as_micros() as u64,
            "chunk generated"
        );
        Ok(ResponseBody::ChunkGenerated(chunk))
    }

    fn update_block(
        &mut self,
        coord: ChunkCoord,
        (x, y, z): (usize, usize, usize),
        block: BlockId,
    ) -> Result<Option<ResponseBody>> {
        if x >= CHUNK_SIZE || y >= CHUNK_SIZE || z >= CHUNK_SIZE {
            return Err(WorkerError::LocalOutOfRange { x, y, z });
        }
        if !coord.is_addressable() {
            return Err(WorkerError::ChunkOutOfRange(coord));
        }
        self.modifications.set(BlockPos::from_chunk_local(coord, x, y, z), block);

        let mut cache = self.cache.write();
        if let Some(chunk) = cache.get_mut(coord) {
            chunk.set(x, y, z, block);
        }
        let updated = cache.get(coord).map(|chunk| ResponseBody::ChunkUpdated(Arc::clone(chunk)));
        Ok(updated)
    }

    fn apply_modifications(&mut self, records: Vec<ModificationRecord>) -> Vec<ResponseBody> {
        let affected = self.modifications.import(records);

        let mut cache = self.cache.write();
        let mut updated = Vec::new();
        for coord in affected {
            let Some(chunk) = cache.get_mut(coord) else {
                continue;
            };
            self.modifications.apply_to(chunk);
            if let Some(chunk) = cache.get(coord) {
                updated.push(ResponseBody::ChunkUpdated(Arc::clone(chunk)));
            }
        }
        updated
    }

    fn load_schematic(&mut self, name: String, bytes: &[u8], metadata: SchematicMetadata) -> ResponseBody {
        let Some(ctx) = self.context.as_ref() else {
            return ResponseBody::SchematicError {
                name,
                message: WorkerError::NotInitialized.to_string(),
            };
        };

        match SchematicPattern::decode(bytes, ctx.registry(), metadata.y_offset) {
            Ok(pattern) => {
                tracing::info!(
                    name = %name,
                    width = pattern.width,
                    height = pattern.height,
                    length = pattern.length,
                    blocks = pattern.blocks.len(),
                    "schematic loaded"
                );
                self.patterns.insert(name.clone(), pattern);
                ResponseBody::SchematicLoaded {
                    success: true,
                    name,
                    metadata,
                }
            }
            Err(err) => {
                tracing::warn!(name = %name, kind = ?err.kind(), error = %err, "schematic rejected");
                ResponseBody::SchematicError {
                    name,
                    message: err.to_string(),
                }
            }
        }
    }
}
