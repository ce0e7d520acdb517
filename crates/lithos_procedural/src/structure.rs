//! # Structure Placement
//!
//! Two phases per chunk:
//!
//! 1. **Candidate scan** over the chunk footprint. A column qualifies when
//!    its trunk base lies in this chunk's vertical slab, its neighbourhood
//!    is flat, it stands clear of the shoreline, and the biome's density
//!    noise exceeds the biome threshold.
//! 2. **Selection**. Candidates are ordered by a position hash (ties by
//!    coordinate) and accepted greedily; a candidate closer than the
//!    minimum spacing to an accepted one inside the influence radius is
//!    rejected.
//!
//! Accepted placements are stamped with write-if-air semantics: either the
//! biome's builtin tree or an imported pattern.
//!
//! ## Known limitation
//!
//! Only columns of the chunk being generated are scanned, and a stamp is
//! clipped to that chunk. A tree whose trunk rises through the chunk's top
//! face, or whose canopy reaches across a side face, is cut off at the
//! seam: the neighbouring chunk never sees the placement. Fixing it means
//! planning over a border around the footprint, like the flatness window.

use crate::biome::Biome;
use crate::block::{BlockId, BlockRegistry};
use crate::chunk::{Chunk, ChunkCoord, CHUNK_SIZE_I32};
use crate::config::{ConfigError, StructureConfig, WorldConfig};
use crate::height::ColumnCache;
use crate::noise::{position_hash, SimplexNoise, WorldSeed};
use crate::schematic::{stamp_blocks, PatternRegistry};

/// Seed purpose for structure density and ordering.
const STRUCTURE_SEED_PURPOSE: u64 = 40;

/// Builtin tree shape with resolved blocks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TreeStyle {
    /// Density threshold.
    pub threshold: f64,
    /// Base trunk height.
    pub trunk_height: i32,
    /// Canopy radius.
    pub canopy_radius: i32,
    /// Trunk block.
    pub log: BlockId,
    /// Leaf block.
    pub leaves: BlockId,
}

#[derive(Clone, Debug, Default)]
struct StructureStyle {
    tree: Option<TreeStyle>,
    pattern: Option<String>,
}

/// An accepted (or candidate) structure position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    /// World X of the trunk.
    pub x: i32,
    /// World Y of the trunk base (one above the surface).
    pub y: i32,
    /// World Z of the trunk.
    pub z: i32,
    /// Biome of the column.
    pub biome: Biome,
    /// Ordering hash.
    pub hash: u64,
}

impl Placement {
    fn distance_sq(&self, other: &Self) -> f64 {
        let dx = f64::from(self.x - other.x);
        let dz = f64::from(self.z - other.z);
        dx * dx + dz * dz
    }
}

/// Deterministic structure planner.
pub struct StructurePlanner {
    seed: WorldSeed,
    density: SimplexNoise,
    config: StructureConfig,
    water_level: i32,
    styles: [StructureStyle; 5],
}

impl StructurePlanner {
    /// Resolves per-biome structure styles.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownBlock`] if a tree names an unknown
    /// block.
    pub fn new(
        seed: WorldSeed,
        config: &WorldConfig,
        registry: &BlockRegistry,
    ) -> Result<Self, ConfigError> {
        let mut styles: [StructureStyle; 5] = Default::default();
        for biome in Biome::ALL {
            let params = config.biomes.get(biome);
            let tree = match &params.tree {
                Some(tree) => Some(TreeStyle {
                    threshold: tree.threshold,
                    trunk_height: tree.trunk_height,
                    canopy_radius: tree.canopy_radius,
                    log: registry.require(&tree.log)?,
                    leaves: registry.require(&tree.leaves)?,
                }),
                None => None,
            };
            styles[biome as usize] = StructureStyle {
                tree,
                pattern: params.pattern.clone(),
            };
        }

        let seed = seed.derive(STRUCTURE_SEED_PURPOSE);
        Ok(Self {
            seed,
            density: SimplexNoise::new(seed),
            config: config.structures.clone(),
            water_level: config.terrain.water_level,
            styles,
        })
    }

    /// Neighbourhood radius the column cache must cover.
    #[must_use]
    pub fn flatness_radius(&self) -> i32 {
        self.config.flatness_radius
    }

    /// Tree style of a biome, if it grows trees.
    #[must_use]
    pub fn tree_style(&self, biome: Biome) -> Option<TreeStyle> {
        self.styles[biome as usize].tree
    }

    /// Every column within the flatness radius is within the allowed delta.
    fn is_flat<F>(&self, height_of: F, x: i32, z: i32, height: i32) -> bool
    where
        F: Fn(i32, i32) -> i32,
    {
        let r = self.config.flatness_radius;
        (-r..=r).all(|dz| {
            (-r..=r).all(|dx| (height_of(x + dx, z + dz) - height).abs() <= self.config.max_height_delta)
        })
    }

    /// Every column of the chunk footprint that qualifies for a structure.
    #[must_use]
    pub fn candidates(&self, coord: ChunkCoord, cache: &ColumnCache<'_>) -> Vec<Placement> {
        let slab = coord.world_y()..coord.world_y() + CHUNK_SIZE_I32;
        let min_height = self.water_level + self.config.beach_buffer;
        let scale = self.config.density_scale;
        let mut found = Vec::new();

        for z in coord.world_z()..coord.world_z() + CHUNK_SIZE_I32 {
            for x in coord.world_x()..coord.world_x() + CHUNK_SIZE_I32 {
                let height = cache.height(x, z);
                let base = height + 1;
                if !slab.contains(&base) || height <= min_height {
                    continue;
                }
                let Some(biome) = cache.biome(x, z) else {
                    continue;
                };
                let Some(tree) = self.tree_style(biome) else {
                    continue;
                };
                if self.density.sample(f64::from(x) * scale, f64::from(z) * scale) <= tree.threshold {
                    continue;
                }
                if !self.is_flat(|x, z| cache.height(x, z), x, z, height) {
                    continue;
                }
                found.push(Placement {
                    x,
                    y: base,
                    z,
                    biome,
                    hash: position_hash(self.seed, x, z),
                });
            }
        }
        found
    }

    /// Orders candidates by hash and accepts them greedily under the
    /// spacing rule.
    #[must_use]
    pub fn select(&self, mut candidates: Vec<Placement>) -> Vec<Placement> {
        candidates.sort_by_key(|p| (p.hash, p.x, p.z));

        let influence_sq = self.config.influence_radius * self.config.influence_radius;
        let spacing_sq = self.config.min_spacing * self.config.min_spacing;
        let mut accepted: Vec<Placement> = Vec::new();

        for candidate in candidates {
            let crowded = accepted.iter().any(|other| {
                let d = candidate.distance_sq(other);
                d <= influence_sq && d < spacing_sq
            });
            if !crowded {
                accepted.push(candidate);
            }
        }
        accepted
    }

    /// Candidate scan followed by selection.
    #[must_use]
    pub fn plan(&self, coord: ChunkCoord, cache: &ColumnCache<'_>) -> Vec<Placement> {
        self.select(self.candidates(coord, cache))
    }

    /// Stamps every placement into the chunk. Returns voxels written.
    pub fn stamp(&self, chunk: &mut Chunk, placements: &[Placement], patterns: &PatternRegistry) -> usize {
        let mut written = 0;
        for placement in placements {
            let style = &self.styles[placement.biome as usize];
            match &style.pattern {
                Some(name) => match patterns.get(name) {
                    Some(pattern) => {
                        written += pattern.stamp(chunk, (placement.x, placement.y, placement.z));
                    }
                    None => {
                        tracing::debug!(pattern = %name, x = placement.x, z = placement.z, "pattern not loaded, skipping placement");
                    }
                },
                None => {
                    if let Some(tree) = style.tree {
                        written += stamp_tree(chunk, placement, &tree);
                    }
                }
            }
        }
        written
    }
}

/// Trunk column plus a layered canopy, write-if-air.
fn stamp_tree(chunk: &mut Chunk, at: &Placement, tree: &TreeStyle) -> usize {
    let (x, base, z) = (i64::from(at.x), i64::from(at.y), i64::from(at.z));
    let trunk = i64::from(tree.trunk_height) + (at.hash % 3) as i64;
    let top = base + trunk - 1;
    let radius = i64::from(tree.canopy_radius);

    let mut blocks = Vec::new();
    for y in base..=top {
        blocks.push((x, y, z, tree.log));
    }
    for y in top - 2..=top + 1 {
        let r = if y >= top { (radius - 1).max(1) } else { radius };
        for dz in -r..=r {
            for dx in -r..=r {
                if dx * dx + dz * dz > r * r + 1 {
                    continue;
                }
                blocks.push((x + dx, y, z + dz, tree.leaves));
            }
        }
    }
    stamp_blocks(chunk, blocks)
}
