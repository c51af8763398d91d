//! Random point layouts for the backdrop structures
//!
//! Node clusters and the particle field draw from any `rand::Rng`, so a
//! seeded `StdRng` reproduces a layout exactly. The helix is deterministic.

use std::f32::consts::PI;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{HelixConfig, LayerSpec, NetworkConfig, Palette, ParticleConfig};
use crate::math::{Color, Point3};

/// Centred unit sample in [-0.5, 0.5)
fn centred<R: Rng>(rng: &mut R) -> f32 {
    rng.gen_range(0.0..1.0) - 0.5
}

/// Place `count` points per layer in vertical columns.
///
/// x sits within `center_x ± jitter/2`, y within `±spread/2`, and z within
/// `depth_offset ± depth_spread/2`. Layers are emitted in order, so node
/// indices of one layer are contiguous.
pub fn generate_layers<R: Rng>(
    layers: &[LayerSpec],
    network: &NetworkConfig,
    rng: &mut R,
) -> Vec<Point3> {
    let total = layers.iter().map(|l| l.count).sum();
    let mut points = Vec::with_capacity(total);

    for layer in layers {
        for _ in 0..layer.count {
            let y = centred(rng) * layer.spread;
            let z = centred(rng) * network.depth_spread + network.depth_offset;
            let x = layer.center_x + centred(rng) * network.jitter;
            points.push(Point3::new(x, y, z));
        }
    }

    points
}

/// Paired beads on the two strands at one height of the helix
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HelixStrandPoint {
    pub position_a: Point3,
    pub position_b: Point3,
}

/// Two interleaved strands, half a turn apart, rising along y
pub fn helix_points(config: &HelixConfig) -> Vec<HelixStrandPoint> {
    let total = config.points;
    (0..total)
        .map(|i| {
            let fraction = i as f32 / total as f32;
            let t = fraction * config.turns * 2.0 * PI;
            let y = (fraction - 0.5) * config.height;
            let strand = |angle: f32| {
                Point3::new(angle.cos() * config.radius, y, angle.sin() * config.radius)
            };
            HelixStrandPoint {
                position_a: strand(t),
                position_b: strand(t + PI),
            }
        })
        .collect()
}

/// Ambient particles as parallel arrays
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParticleField {
    pub positions: Vec<Point3>,
    pub colors: Vec<Color>,
    pub sizes: Vec<f32>,
}

impl ParticleField {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Scatter particles uniformly through the configured box
pub fn particle_field<R: Rng>(
    config: &ParticleConfig,
    palette: &Palette,
    rng: &mut R,
) -> ParticleField {
    let n = config.count;
    let mut field = ParticleField {
        positions: Vec::with_capacity(n),
        colors: Vec::with_capacity(n),
        sizes: Vec::with_capacity(n),
    };

    for _ in 0..n {
        let x = centred(rng) * config.extent.x + config.center.x;
        let y = centred(rng) * config.extent.y + config.center.y;
        let z = centred(rng) * config.extent.z + config.center.z;
        field.positions.push(Point3::new(x, y, z));

        let mix = rng.gen_range(0.0..1.0);
        field.colors.push(palette.accent.lerp(&palette.secondary, mix));
        field.sizes.push(config.size.sample(rng));
    }

    field
}
