//! Structure palette identifiers to world block codes.
//!
//! Identifiers look like `minecraft:oak_log[axis=y]`. The namespace and
//! the bracketed state suffix are dropped, the remaining name is mapped
//! through a fixed alias table and then looked up in the block registry.
//! Anything unresolved is "no block".

use crate::block::{BlockId, BlockRegistry, AIR};

/// Structure identifiers whose world block has a different name.
const ALIASES: &[(&str, &str)] = &[
    ("grass_block", "grass"),
    ("short_grass", "air"),
    ("tall_grass", "air"),
    ("cave_air", "air"),
    ("void_air", "air"),
    ("coarse_dirt", "dirt"),
    ("rooted_dirt", "dirt"),
    ("podzol", "dirt"),
    ("snow_block", "snow"),
    ("powder_snow", "snow"),
    ("packed_ice", "ice"),
    ("blue_ice", "ice"),
    ("oak_log", "log"),
    ("oak_wood", "log"),
    ("dark_oak_log", "log"),
    ("jungle_log", "log"),
    ("acacia_log", "log"),
    ("oak_leaves", "leaves"),
    ("dark_oak_leaves", "leaves"),
    ("jungle_leaves", "leaves"),
    ("acacia_leaves", "leaves"),
    ("spruce_wood", "spruce_log"),
    ("birch_wood", "birch_log"),
    ("mossy_cobblestone", "cobblestone"),
    ("smooth_stone", "stone"),
    ("andesite", "stone"),
    ("diorite", "stone"),
    ("granite", "stone"),
    ("deepslate", "stone"),
    ("cut_sandstone", "sandstone"),
    ("smooth_sandstone", "sandstone"),
    ("chiseled_sandstone", "sandstone"),
    ("mossy_stone_bricks", "stone_bricks"),
    ("cracked_stone_bricks", "stone_bricks"),
    ("glass_pane", "glass"),
];

/// Suffix families collapsed onto one world block.
const FAMILIES: &[(&str, &str)] = &[
    ("_planks", "planks"),
    ("_wool", "wool"),
    ("_terracotta", "terracotta"),
    ("_stained_glass", "glass"),
];

/// Reduces an identifier to its bare block name.
#[must_use]
pub fn base_name(identifier: &str) -> &str {
    let name = identifier.split('[').next().unwrap_or(identifier);
    let name = name.rsplit(':').next().unwrap_or(name);
    name.trim()
}

/// Resolves a palette identifier. `None` means "no block".
#[must_use]
pub fn resolve(identifier: &str, registry: &BlockRegistry) -> Option<BlockId> {
    let name = base_name(identifier);
    let name = ALIASES
        .iter()
        .find(|(from, _)| *from == name)
        .map(|(_, to)| *to)
        .or_else(|| {
            FAMILIES
                .iter()
                .find(|(suffix, _)| name.ends_with(suffix))
                .map(|(_, to)| *to)
        })
        .unwrap_or(name);

    registry.get(name).filter(|&id| id != AIR)
}
