//! # Density Carver
//!
//! Removes cave voxels using two independent 3D density functions.
//!
//! - **Tunnel**: wide, mostly horizontal passages clustered around a
//!   preferred height by a Gaussian bias.
//! - **Spaghetti**: thin winding caves that occasionally branch.
//!
//! A voxel is carved when either function exceeds its threshold. Neither
//! depends on the 2D height/biome fields.

use crate::config::{CaveConfig, SpaghettiConfig, TunnelConfig};
use crate::noise::{SimplexNoise, WorldSeed};

/// Seeded cave carver.
pub struct CaveCarver {
    min_height: i32,
    max_height: i32,
    tunnel: TunnelConfig,
    spaghetti: SpaghettiConfig,
    tunnel_primary: SimplexNoise,
    tunnel_variation: SimplexNoise,
    tunnel_connector: SimplexNoise,
    spaghetti_primary: SimplexNoise,
    spaghetti_winding: SimplexNoise,
    spaghetti_branch: SimplexNoise,
}

impl CaveCarver {
    /// Creates a carver from a world seed.
    #[must_use]
    pub fn new(seed: WorldSeed, config: &CaveConfig) -> Self {
        Self {
            min_height: config.min_height,
            max_height: config.max_height,
            tunnel: config.tunnel.clone(),
            spaghetti: config.spaghetti.clone(),
            tunnel_primary: SimplexNoise::new(seed.derive(10)),
            tunnel_variation: SimplexNoise::new(seed.derive(11)),
            tunnel_connector: SimplexNoise::new(seed.derive(12)),
            spaghetti_primary: SimplexNoise::new(seed.derive(20)),
            spaghetti_winding: SimplexNoise::new(seed.derive(21)),
            spaghetti_branch: SimplexNoise::new(seed.derive(22)),
        }
    }

    /// Tunnel density at a voxel, after the height bias.
    #[must_use]
    pub fn tunnel_density(&self, x: f64, y: f64, z: f64) -> f64 {
        let t = &self.tunnel;
        let primary = self
            .tunnel_primary
            .sample3(x * t.scale, y * t.scale * t.vertical_scale, z * t.scale);
        let variation = self.tunnel_variation.sample3(
            x * t.variation_scale,
            y * t.variation_scale,
            z * t.variation_scale,
        );
        let connector = self.tunnel_connector.sample3(
            x * t.connector_scale,
            y * t.connector_scale,
            z * t.connector_scale,
        );

        let offset = y - t.preferred_height;
        let bias = (-(offset * offset) / (2.0 * t.height_variation * t.height_variation)).exp();

        (primary + variation * t.variation_weight + connector * t.connector_weight) * bias
    }

    /// Spaghetti density at a voxel.
    #[must_use]
    pub fn spaghetti_density(&self, x: f64, y: f64, z: f64) -> f64 {
        let s = &self.spaghetti;
        let primary = self
            .spaghetti_primary
            .sample3(x * s.scale, y * s.scale * s.vertical_squeeze, z * s.scale);
        let winding = self.spaghetti_winding.sample3(
            x * s.winding_scale,
            y * s.winding_scale,
            z * s.winding_scale,
        );
        let branch = self.spaghetti_branch.sample3(
            x * s.branch_scale,
            y * s.branch_scale,
            z * s.branch_scale,
        );

        let mut density = primary + winding * s.winding_weight;
        if branch > s.branch_threshold {
            density += branch * s.branch_weight;
        }
        density
    }

    /// Returns true if the voxel at world coordinates is cave air.
    #[must_use]
    pub fn is_cave(&self, x: i32, y: i32, z: i32) -> bool {
        if y < self.min_height || y > self.max_height {
            return false;
        }
        let (fx, fy, fz) = (f64::from(x), f64::from(y), f64::from(z));
        self.tunnel_density(fx, fy, fz) > self.tunnel.threshold
            || self.spaghetti_density(fx, fy, fz) > self.spaghetti.threshold
    }
}
