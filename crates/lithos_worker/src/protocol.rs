//! # Worker Message Protocol
//!
//! Requests flow caller → worker, responses flow back.
//!
//! ```text
//! Caller                          Worker
//!   | -- Init ------------------->  |
//!   | <------------- Initialized -- |
//!   | -- GenerateChunk ---------->  |
//!   | <---------- ChunkGenerated -- |
//!   | -- UpdateBlock ------------>  |
//!   | <------------ ChunkUpdated -- |   (only if the chunk is cached)
//! ```
//!
//! Responses for different chunks can arrive in any order; match them to
//! requests by [`RequestId`], or by the coordinate inside the chunk.

use std::sync::Arc;

use lithos_procedural::{BlockId, BlockRegistry, Chunk, ChunkCoord, ModificationRecord, WorldConfig};

/// Identifies one request; echoed on every response it causes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub u64);

/// Caller-supplied data carried through a schematic load untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SchematicMetadata {
    /// Vertical shift applied to the pattern; `None` uses the file's own offset.
    pub y_offset: Option<i32>,
    /// Where the file was fetched from.
    pub source: Option<String>,
}

/// Messages accepted by the worker.
#[derive(Clone, Debug)]
pub enum Request {
    /// Build a fresh generation context. Drops cached chunks and loaded patterns.
    Init {
        /// World seed; overrides `config.seed`.
        seed: u64,
        /// World configuration.
        config: Box<WorldConfig>,
        /// Block name → code table.
        blocks: BlockRegistry,
    },

    /// Generate (or regenerate) one chunk.
    GenerateChunk(ChunkCoord),

    /// Record a single block edit.
    UpdateBlock {
        /// Chunk holding the voxel.
        coord: ChunkCoord,
        /// Local `(x, y, z)` inside the chunk.
        local: (usize, usize, usize),
        /// New block code.
        block: BlockId,
    },

    /// Record many edits at once, e.g. on session join.
    ApplyModifications(Vec<ModificationRecord>),

    /// Decode a structure file and register it under `name`.
    LoadSchematic {
        /// Pattern name referenced by biome config.
        name: String,
        /// Raw file contents, gzip or plain.
        bytes: Vec<u8>,
        /// Echoed back on success.
        metadata: SchematicMetadata,
    },

    /// Forget a cached chunk the caller no longer needs.
    UnloadChunk(ChunkCoord),

    /// Ask for every stored edit.
    ExportModifications,

    /// Stop the worker thread.
    Shutdown,
}

impl Request {
    /// Short name for logging.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Init { .. } => "init",
            Self::GenerateChunk(_) => "generate_chunk",
            Self::UpdateBlock { .. } => "update_block",
            Self::ApplyModifications(_) => "apply_modifications",
            Self::LoadSchematic { .. } => "load_schematic",
            Self::UnloadChunk(_) => "unload_chunk",
            Self::ExportModifications => "export_modifications",
            Self::Shutdown => "shutdown",
        }
    }
}

/// A request tagged with its id, as it travels over the channel.
#[derive(Clone, Debug)]
pub struct Envelope {
    /// Request id.
    pub id: RequestId,
    /// Payload.
    pub request: Request,
}

/// Response payloads.
#[derive(Clone, Debug)]
pub enum ResponseBody {
    /// `Init` succeeded.
    Initialized,

    /// The request failed; the worker is still running.
    Error(String),

    /// A requested chunk, modifications applied.
    ChunkGenerated(Arc<Chunk>),

    /// A cached chunk changed because of an edit.
    ChunkUpdated(Arc<Chunk>),

    /// A schematic was decoded and registered.
    SchematicLoaded {
        /// Always true; failures use [`ResponseBody::SchematicError`].
        success: bool,
        /// Pattern name.
        name: String,
        /// Metadata from the request.
        metadata: SchematicMetadata,
    },

    /// A schematic failed to decode; nothing was registered.
    SchematicError {
        /// Pattern name.
        name: String,
        /// Why decoding failed.
        message: String,
    },

    /// Every stored edit, sorted by position.
    Modifications(Vec<ModificationRecord>),
}

/// A response and the request that caused it.
#[derive(Clone, Debug)]
pub struct Response {
    /// Id of the originating request.
    pub request: RequestId,
    /// Payload.
    pub body: ResponseBody,
}

impl Response {
    /// Creates a response.
    #[must_use]
    pub fn new(request: RequestId, body: ResponseBody) -> Self {
        Self { request, body }
    }

    /// The chunk carried by a generated or updated response.
    #[must_use]
    pub fn chunk(&self) -> Option<&Arc<Chunk>> {
        match &self.body {
            ResponseBody::ChunkGenerated(chunk) | ResponseBody::ChunkUpdated(chunk) => Some(chunk),
            _ => None,
        }
    }
}
