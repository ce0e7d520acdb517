//! # Simplex Noise Implementation
//!
//! High-performance, deterministic 2D and 3D gradient noise.
//!
//! ## Why Simplex over Perlin?
//!
//! - Fewer directional artifacts
//! - Better gradient distribution
//! - Cheaper in 3D, where the carver and ore seeder spend most of their time
//!
//! ## Determinism Guarantee
//!
//! Given the same `WorldSeed`, this implementation will produce
//! **exactly** the same values on any platform, any time.

use std::hash::Hasher;

use siphasher::sip::SipHasher24;

/// World seed for deterministic generation.
///
/// All procedural generation derives from this seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WorldSeed(u64);

impl WorldSeed {
    /// Creates a new world seed.
    #[inline]
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Returns the raw seed value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Derives a sub-seed for a specific purpose (e.g., cave generation).
    ///
    /// Uses a hash function to create independent streams from one seed.
    #[inline]
    #[must_use]
    pub const fn derive(self, purpose: u64) -> Self {
        let mut hash = self.0;
        hash ^= purpose.wrapping_mul(0x9E37_79B9_7F4A_7C15);
        hash = hash.wrapping_mul(0x517c_c1b7_2722_0a95);
        hash ^= hash >> 32;
        Self(hash)
    }
}

impl Default for WorldSeed {
    fn default() -> Self {
        Self(0xDEAD_BEEF_CAFE_BABE)
    }
}

/// 12 gradient vectors for 2D simplex (vertices of a regular 12-gon, unnormalized).
const GRAD2: [[i8; 2]; 12] = [
    [1, 0], [1, 1], [0, 1], [-1, 1],
    [-1, 0], [-1, -1], [0, -1], [1, -1],
    [1, 0], [0, 1], [-1, 0], [0, -1],
];

/// 12 gradient vectors for 3D simplex (cube edge midpoints).
const GRAD3: [[i8; 3]; 12] = [
    [1, 1, 0], [-1, 1, 0], [1, -1, 0], [-1, -1, 0],
    [1, 0, 1], [-1, 0, 1], [1, 0, -1], [-1, 0, -1],
    [0, 1, 1], [0, -1, 1], [0, 1, -1], [0, -1, -1],
];

/// Pre-computed permutation table for noise.
///
/// This is computed once from the seed and reused.
struct PermutationTable {
    /// 512-entry permutation table (256 entries, doubled for overflow handling).
    perm: [u8; 512],
}

impl PermutationTable {
    /// Creates a new permutation table from a seed.
    fn new(seed: WorldSeed) -> Self {
        let mut perm = [0u8; 512];

        for (i, slot) in perm.iter_mut().take(256).enumerate() {
            *slot = i as u8;
        }

        // Fisher-Yates shuffle driven by xorshift64
        let mut rng_state = seed.value() | 1;
        for i in (1..256).rev() {
            rng_state ^= rng_state << 13;
            rng_state ^= rng_state >> 7;
            rng_state ^= rng_state << 17;

            let j = (rng_state % (i as u64 + 1)) as usize;
            perm.swap(i, j);
        }

        // Double the table to avoid index wrapping
        for i in 0..256 {
            perm[256 + i] = perm[i];
        }

        Self { perm }
    }

    /// Gets a permutation value (with automatic wrapping).
    #[inline]
    fn get(&self, index: usize) -> usize {
        usize::from(self.perm[index & 511])
    }
}

/// Seeded simplex noise generator.
///
/// Produces smooth, continuous noise values in the range [-1, 1].
///
/// # Example
///
/// ```rust
/// use lithos_procedural::{SimplexNoise, WorldSeed};
///
/// let noise = SimplexNoise::new(WorldSeed::new(42));
/// let value = noise.sample3(1.5, 2.25, -3.0);
/// assert!((-1.0..=1.0).contains(&value));
/// ```
pub struct SimplexNoise {
    perm_table: PermutationTable,
}

impl SimplexNoise {
    /// Skewing factor for 2D simplex grid.
    const F2: f64 = 0.366_025_403_784_439; // (sqrt(3) - 1) / 2
    /// Unskewing factor for 2D simplex grid.
    const G2: f64 = 0.211_324_865_405_187; // (3 - sqrt(3)) / 6
    /// Skewing factor for 3D simplex grid.
    const F3: f64 = 1.0 / 3.0;
    /// Unskewing factor for 3D simplex grid.
    const G3: f64 = 1.0 / 6.0;

    /// Creates a new simplex noise generator from a seed.
    #[must_use]
    pub fn new(seed: WorldSeed) -> Self {
        Self {
            perm_table: PermutationTable::new(seed),
        }
    }

    /// Samples 2D simplex noise at the given coordinates.
    ///
    /// # Returns
    ///
    /// A value in the range [-1, 1].
    #[must_use]
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        // Skew input coordinates to simplex grid
        let skew = (x + y) * Self::F2;
        let i = fast_floor(x + skew);
        let j = fast_floor(y + skew);

        // Unskew to get first corner in simplex
        let unskew = f64::from(i + j) * Self::G2;
        let x0 = x - (f64::from(i) - unskew);
        let y0 = y - (f64::from(j) - unskew);

        // Upper or lower triangle
        let (i1, j1) = if x0 > y0 { (1, 0) } else { (0, 1) };

        let x1 = x0 - i1 as f64 + Self::G2;
        let y1 = y0 - j1 as f64 + Self::G2;
        let x2 = x0 - 1.0 + 2.0 * Self::G2;
        let y2 = y0 - 1.0 + 2.0 * Self::G2;

        let ii = (i & 255) as usize;
        let jj = (j & 255) as usize;
        let p = &self.perm_table;

        let gi0 = p.get(ii + p.get(jj));
        let gi1 = p.get(ii + i1 as usize + p.get(jj + j1 as usize));
        let gi2 = p.get(ii + 1 + p.get(jj + 1));

        let n0 = Self::contribution2(x0, y0, gi0);
        let n1 = Self::contribution2(x1, y1, gi1);
        let n2 = Self::contribution2(x2, y2, gi2);

        // 70.0 normalizes the output to [-1, 1]
        (70.0 * (n0 + n1 + n2)).clamp(-1.0, 1.0)
    }

    /// Samples 3D simplex noise at the given coordinates.
    ///
    /// # Returns
    ///
    /// A value in the range [-1, 1].
    #[must_use]
    pub fn sample3(&self, x: f64, y: f64, z: f64) -> f64 {
        let skew = (x + y + z) * Self::F3;
        let i = fast_floor(x + skew);
        let j = fast_floor(y + skew);
        let k = fast_floor(z + skew);

        let unskew = f64::from(i + j + k) * Self::G3;
        let x0 = x - (f64::from(i) - unskew);
        let y0 = y - (f64::from(j) - unskew);
        let z0 = z - (f64::from(k) - unskew);

        // Which of the six tetrahedra we are in
        let (i1, j1, k1, i2, j2, k2) = if x0 >= y0 {
            if y0 >= z0 {
                (1, 0, 0, 1, 1, 0)
            } else if x0 >= z0 {
                (1, 0, 0, 1, 0, 1)
            } else {
                (0, 0, 1, 1, 0, 1)
            }
        } else if y0 < z0 {
            (0, 0, 1, 0, 1, 1)
        } else if x0 < z0 {
            (0, 1, 0, 0, 1, 1)
        } else {
            (0, 1, 0, 1, 1, 0)
        };

        let x1 = x0 - i1 as f64 + Self::G3;
        let y1 = y0 - j1 as f64 + Self::G3;
        let z1 = z0 - k1 as f64 + Self::G3;
        let x2 = x0 - i2 as f64 + 2.0 * Self::G3;
        let y2 = y0 - j2 as f64 + 2.0 * Self::G3;
        let z2 = z0 - k2 as f64 + 2.0 * Self::G3;
        let x3 = x0 - 1.0 + 3.0 * Self::G3;
        let y3 = y0 - 1.0 + 3.0 * Self::G3;
        let z3 = z0 - 1.0 + 3.0 * Self::G3;

        let ii = (i & 255) as usize;
        let jj = (j & 255) as usize;
        let kk = (k & 255) as usize;
        let p = &self.perm_table;

        let gi0 = p.get(ii + p.get(jj + p.get(kk)));
        let gi1 = p.get(ii + i1 + p.get(jj + j1 + p.get(kk + k1)));
        let gi2 = p.get(ii + i2 + p.get(jj + j2 + p.get(kk + k2)));
        let gi3 = p.get(ii + 1 + p.get(jj + 1 + p.get(kk + 1)));

        let n0 = Self::contribution3(x0, y0, z0, gi0);
        let n1 = Self::contribution3(x1, y1, z1, gi1);
        let n2 = Self::contribution3(x2, y2, z2, gi2);
        let n3 = Self::contribution3(x3, y3, z3, gi3);

        (32.0 * (n0 + n1 + n2 + n3)).clamp(-1.0, 1.0)
    }

    /// Contribution from one corner of a 2D simplex.
    #[inline]
    fn contribution2(x: f64, y: f64, hash: usize) -> f64 {
        let t = 0.5 - x * x - y * y;
        if t < 0.0 {
            0.0
        } else {
            let grad = GRAD2[hash % 12];
            let t2 = t * t;
            t2 * t2 * (x * f64::from(grad[0]) + y * f64::from(grad[1]))
        }
    }

    /// Contribution from one corner of a 3D simplex.
    #[inline]
    fn contribution3(x: f64, y: f64, z: f64, hash: usize) -> f64 {
        let t = 0.6 - x * x - y * y - z * z;
        if t < 0.0 {
            0.0
        } else {
            let grad = GRAD3[hash % 12];
            let t2 = t * t;
            t2 * t2 * (x * f64::from(grad[0]) + y * f64::from(grad[1]) + z * f64::from(grad[2]))
        }
    }

    /// Generates octaved (fractal) 2D noise.
    ///
    /// Combines multiple layers of noise at different frequencies
    /// to create more natural-looking terrain.
    ///
    /// # Arguments
    ///
    /// * `x`, `y` - Coordinates
    /// * `octaves` - Number of noise layers (typically 4-8)
    /// * `persistence` - Amplitude decay per octave (typically 0.5)
    /// * `lacunarity` - Frequency increase per octave (typically 2.0)
    ///
    /// # Returns
    ///
    /// The amplitude-normalized sum, in the range [-1, 1].
    #[must_use]
    pub fn octaved(
        &self,
        x: f64,
        y: f64,
        octaves: u32,
        persistence: f64,
        lacunarity: f64,
    ) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut max_amplitude = 0.0;

        for _ in 0..octaves {
            total += self.sample(x * frequency, y * frequency) * amplitude;
            max_amplitude += amplitude;
            amplitude *= persistence;
            frequency *= lacunarity;
        }

        if max_amplitude > 0.0 {
            total / max_amplitude
        } else {
            0.0
        }
    }
}

/// Hashes a world column into a stable 64-bit value.
///
/// Used to order structure candidates reproducibly; independent of
/// iteration order and of which chunk is being generated.
#[must_use]
pub fn position_hash(seed: WorldSeed, x: i32, z: i32) -> u64 {
    let mut hasher = SipHasher24::new_with_keys(seed.value(), seed.derive(0x5EED).value());
    hasher.write_i32(x);
    hasher.write_i32(z);
    hasher.finish()
}

/// Fast floor function.
///
/// Faster than `f64::floor()` for our use case.
#[inline]
fn fast_floor(x: f64) -> i32 {
    let xi = x as i32;
    if x < f64::from(xi) {
        xi - 1
    } else {
        xi
    }
}
