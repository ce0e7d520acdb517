//! # Block Registry
//!
//! Maps block names to the integer codes stored in chunk buffers.
//!
//! Code `0` is always `air`. Everything else is supplied by the host
//! application at init, or taken from the builtin table.

use std::collections::HashMap;

use crate::config::ConfigError;

/// Block-type code stored in every voxel.
pub type BlockId = u16;

/// The reserved empty block.
pub const AIR: BlockId = 0;

/// Name → code lookup for world block types.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockRegistry {
    by_name: HashMap<String, BlockId>,
}

impl BlockRegistry {
    /// Builtin block table.
    pub const BUILTIN: &'static [(&'static str, BlockId)] = &[
        ("air", AIR),
        ("stone", 1),
        ("dirt", 2),
        ("grass", 3),
        ("sand", 4),
        ("gravel", 5),
        ("water", 6),
        ("bedrock", 7),
        ("snow", 8),
        ("log", 9),
        ("leaves", 10),
        ("coal_ore", 11),
        ("iron_ore", 12),
        ("gold_ore", 13),
        ("diamond_ore", 14),
        ("planks", 15),
        ("cobblestone", 16),
        ("glass", 17),
        ("sandstone", 18),
        ("clay", 19),
        ("ice", 20),
        ("wool", 21),
        ("bricks", 22),
        ("stone_bricks", 23),
        ("spruce_log", 24),
        ("spruce_leaves", 25),
        ("birch_log", 26),
        ("birch_leaves", 27),
        ("cactus", 28),
        ("terracotta", 29),
    ];

    /// Builds a registry from an external `(name, code)` table.
    ///
    /// `air` is forced to code 0 regardless of what the table says.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, BlockId)>,
        S: Into<String>,
    {
        let mut by_name: HashMap<String, BlockId> = entries
            .into_iter()
            .map(|(name, id)| (name.into(), id))
            .filter(|(_, id)| *id != AIR)
            .collect();
        by_name.insert("air".to_owned(), AIR);
        Self { by_name }
    }

    /// Looks up a block code by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<BlockId> {
        self.by_name.get(name).copied()
    }

    /// Looks up a block code that the configuration depends on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownBlock`] if the name is not registered.
    pub fn require(&self, name: &str) -> Result<BlockId, ConfigError> {
        self.get(name)
            .ok_or_else(|| ConfigError::UnknownBlock(name.to_owned()))
    }

    /// Number of registered names, including `air`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Always false: `air` is always registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::from_entries(Self::BUILTIN.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        let registry = BlockRegistry::default();
        assert_eq!(registry.get("air"), Some(AIR));
        assert_eq!(registry.get("stone"), Some(1));
        assert_eq!(registry.get("diamond_ore"), Some(14));
        assert_eq!(registry.get("unobtainium"), None);
        assert_eq!(registry.len(), BlockRegistry::BUILTIN.len());
    }

    #[test]
    fn test_air_is_forced_to_zero() {
        let registry = BlockRegistry::from_entries([("air", 9), ("stone", 4)]);
        assert_eq!(registry.get("air"), Some(AIR));
        assert_eq!(registry.get("stone"), Some(4));
    }

    #[test]
    fn test_require_reports_name() {
        let registry = BlockRegistry::from_entries(Vec::<(String, BlockId)>::new());
        let err = registry.require("granite").unwrap_err();
        assert_eq!(err, ConfigError::UnknownBlock("granite".to_owned()));
    }
}
