//! Scene assembly
//!
//! Turns generated points and edges into the four top-level structures of the
//! backdrop. Assembly runs once at startup; afterwards the scene is read-only
//! and all motion is derived per frame by [`crate::frame::FrameUpdater`].

use std::f32::consts::PI;

use rand::Rng;
use serde::Serialize;
use tracing::debug;

use crate::config::{SceneConfig, SphereLayer};
use crate::geometry::Wireframe;
use crate::graph::ProximityGraph;
use crate::layout::{self, HelixStrandPoint, ParticleField};
use crate::math::{self, Color, Mat4, Point3};
use crate::signal::SignalAnimator;

/// Position, Euler rotation (XYZ order) and uniform scale of a structure
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Transform {
    pub position: Point3,
    pub rotation: Point3,
    pub scale: f32,
}

impl Transform {
    pub fn at(position: Point3) -> Self {
        Self {
            position,
            rotation: Point3::ORIGIN,
            scale: 1.0,
        }
    }

    pub fn matrix(&self) -> Mat4 {
        math::compose(self.position, self.rotation, self.scale)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::at(Point3::ORIGIN)
    }
}

/// A network node; position is fixed, opacity and scale are derived per frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Node {
    pub position: Point3,
    pub radius: f32,
    /// Mix factor between the accent and secondary colors
    pub color_mix: f32,
    pub color: Color,
    pub base_opacity: f32,
    /// Angular speed of the pulse, radians per second
    pub pulse_speed: f32,
    /// Phase offset of the pulse, radians
    pub pulse_offset: f32,
}

impl Node {
    /// Pulse value in [-1, 1] at `elapsed` seconds
    pub fn pulse(&self, elapsed: f32) -> f32 {
        (elapsed * self.pulse_speed + self.pulse_offset).sin()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Network {
    pub offset: Point3,
    pub nodes: Vec<Node>,
    /// Node positions, parallel to `nodes`
    pub positions: Vec<Point3>,
    pub graph: ProximityGraph,
    /// One color per edge, applied to both endpoints
    pub edge_colors: Vec<Color>,
    pub line_opacity: f32,
    pub pulse_scale: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Helix {
    pub offset: Point3,
    pub points: Vec<HelixStrandPoint>,
    /// Indices into `points` that carry a rung between the strands
    pub rungs: Vec<usize>,
    pub strand_colors: [Color; 2],
    pub bead_radius: f32,
    pub bead_opacity: f32,
    pub rung_color: Color,
    pub rung_opacity: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SphereShell {
    pub layer: SphereLayer,
    /// Unit-radius wireframe, scaled by `layer.radius` when drawn
    pub wireframe: Wireframe,
}

#[derive(Debug, Clone, Serialize)]
pub struct SphereCluster {
    pub offset: Point3,
    pub shells: Vec<SphereShell>,
    pub bob_amplitude: f32,
    pub bob_speed: f32,
    pub tilt_ratio: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParticleCloud {
    pub field: ParticleField,
    pub opacity: f32,
}

/// The assembled, immutable backdrop
#[derive(Debug, Clone, Serialize)]
pub struct Scene {
    pub network: Network,
    pub helix: Helix,
    pub sphere: SphereCluster,
    pub particles: ParticleCloud,
}

/// Element counts, for logs and CLI output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SceneSummary {
    pub nodes: usize,
    pub edges: usize,
    /// Nodes with no edge, drawn without connections
    pub isolated_nodes: usize,
    pub signals: usize,
    pub helix_points: usize,
    pub helix_rungs: usize,
    pub sphere_layers: usize,
    pub sphere_edges: usize,
    pub particles: usize,
}

impl Scene {
    pub fn summary(&self, signals: &SignalAnimator) -> SceneSummary {
        SceneSummary {
            nodes: self.network.nodes.len(),
            edges: self.network.graph.edges.len(),
            isolated_nodes: (0..self.network.nodes.len())
                .filter(|&i| self.network.graph.neighbours(i).next().is_none())
                .count(),
            signals: signals.len(),
            helix_points: self.helix.points.len(),
            helix_rungs: self.helix.rungs.len(),
            sphere_layers: self.sphere.shells.len(),
            sphere_edges: self.sphere.shells.iter().map(|s| s.wireframe.edges.len()).sum(),
            particles: self.particles.field.len(),
        }
    }
}

/// Builds the scene and the signal pool from a configuration
pub struct SceneAssembler;

impl SceneAssembler {
    pub fn assemble<R: Rng>(config: &SceneConfig, rng: &mut R) -> (Scene, SignalAnimator) {
        let network = Self::network(config, rng);
        let signals =
            SignalAnimator::spawn(&network.graph, &config.signals, &config.palette, rng);
        let scene = Scene {
            network,
            helix: Self::helix(config),
            sphere: Self::sphere(config),
            particles: ParticleCloud {
                field: layout::particle_field(&config.particles, &config.palette, rng),
                opacity: config.particles.opacity,
            },
        };

        debug!(summary = ?scene.summary(&signals), "assembled scene");
        (scene, signals)
    }

    fn network<R: Rng>(config: &SceneConfig, rng: &mut R) -> Network {
        let net = &config.network;
        let palette = &config.palette;
        let positions = layout::generate_layers(&net.layers, net, rng);

        let nodes: Vec<Node> = positions
            .iter()
            .map(|&position| {
                let radius = net.node_radius.sample(rng);
                let color_mix = rng.gen_range(0.0..1.0);
                Node {
                    position,
                    radius,
                    color_mix,
                    color: palette.accent.lerp(&palette.secondary, color_mix),
                    base_opacity: net.base_opacity.sample(rng),
                    pulse_speed: net.pulse_speed.sample(rng),
                    pulse_offset: rng.gen_range(0.0..1.0) * PI * 2.0,
                }
            })
            .collect();

        let graph = ProximityGraph::build(&positions, net.max_distance);
        let edge_colors = graph
            .edges
            .iter()
            .map(|_| {
                let mix = rng.gen_range(0.0..1.0) * net.line_color_mix;
                palette.accent.lerp(&palette.secondary, mix)
            })
            .collect();

        Network {
            offset: net.offset,
            nodes,
            positions,
            graph,
            edge_colors,
            line_opacity: net.line_opacity,
            pulse_scale: net.pulse_scale,
        }
    }

    fn helix(config: &SceneConfig) -> Helix {
        let helix = &config.helix;
        let points = layout::helix_points(helix);
        let rungs = if helix.rung_every == 0 {
            Vec::new()
        } else {
            (0..points.len()).step_by(helix.rung_every).collect()
        };

        Helix {
            offset: helix.offset,
            points,
            rungs,
            strand_colors: [config.palette.accent, config.palette.secondary],
            bead_radius: helix.bead_radius,
            bead_opacity: helix.bead_opacity,
            rung_color: config.palette.rung,
            rung_opacity: helix.rung_opacity,
        }
    }

    fn sphere(config: &SceneConfig) -> SphereCluster {
        let sphere = &config.sphere;
        SphereCluster {
            offset: sphere.offset,
            shells: sphere
                .layers
                .iter()
                .map(|layer| SphereShell {
                    layer: layer.clone(),
                    wireframe: Wireframe::icosphere(layer.subdivision),
                })
                .collect(),
            bob_amplitude: sphere.bob_amplitude,
            bob_speed: sphere.bob_speed,
            tilt_ratio: sphere.tilt_ratio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn assemble(seed: u64) -> (Scene, SignalAnimator) {
        let mut rng = StdRng::seed_from_u64(seed);
        SceneAssembler::assemble(&SceneConfig::default(), &mut rng)
    }

    #[test]
    fn default_scene_counts() {
        let (scene, signals) = assemble(1);
        let summary = scene.summary(&signals);
        assert_eq!(summary.nodes, 80);
        assert_eq!(summary.helix_points, 60);
        assert_eq!(summary.helix_rungs, 20);
        assert_eq!(summary.sphere_layers, 3);
        assert_eq!(summary.sphere_edges, 480 + 120 + 120);
        assert_eq!(summary.particles, 800);
        assert_eq!(scene.network.edge_colors.len(), summary.edges);
        assert!(summary.edges > 0);
        assert_eq!(summary.signals, 30);
        assert!(summary.isolated_nodes < summary.nodes);
    }

    #[test]
    fn summary_counts_isolated_nodes() {
        let (mut scene, signals) = assemble(4);
        scene.network.graph = ProximityGraph::build(&scene.network.positions, 0.0);
        assert_eq!(scene.summary(&signals).isolated_nodes, 80);
    }

    #[test]
    fn node_parameters_in_range() {
        let (scene, _) = assemble(2);
        for node in &scene.network.nodes {
            assert!(node.radius >= 0.15 && node.radius < 0.40);
            assert!(node.base_opacity >= 0.7 && node.base_opacity < 1.0);
            assert!(node.pulse_speed >= 1.0 && node.pulse_speed < 3.0);
            assert!(node.pulse_offset >= 0.0 && node.pulse_offset < 2.0 * PI);
            assert!((0.0..1.0).contains(&node.color_mix));
        }
    }

    #[test]
    fn positions_mirror_nodes() {
        let (scene, _) = assemble(3);
        let net = &scene.network;
        assert_eq!(net.positions.len(), net.nodes.len());
        assert!(
            net.nodes
                .iter()
                .zip(&net.positions)
                .all(|(n, p)| n.position == *p)
        );
    }

    #[test]
    fn edges_reference_valid_nodes() {
        let (scene, signals) = assemble(4);
        let n = scene.network.nodes.len();
        for e in &scene.network.graph.edges {
            assert!(e.from < e.to && e.to < n);
        }
        for s in &signals.signals {
            assert!(s.from < n && s.to < n);
        }
    }

    #[test]
    fn same_seed_same_scene() {
        let (a, _) = assemble(9);
        let (b, _) = assemble(9);
        assert_eq!(a.network.positions, b.network.positions);
        assert_eq!(a.particles.field.positions, b.particles.field.positions);
    }

    #[test]
    fn structures_are_spatially_separated() {
        let (scene, _) = assemble(5);
        let offsets = [
            scene.network.offset,
            scene.helix.offset,
            scene.sphere.offset,
        ];
        for (i, a) in offsets.iter().enumerate() {
            for b in &offsets[i + 1..] {
                assert!(a.distance(b) > 10.0);
            }
        }
    }

    #[test]
    fn rung_every_zero_disables_rungs() {
        let mut config = SceneConfig::default();
        config.helix.rung_every = 0;
        let mut rng = StdRng::seed_from_u64(0);
        let (scene, _) = SceneAssembler::assemble(&config, &mut rng);
        assert!(scene.helix.rungs.is_empty());
    }

    #[test]
    fn transform_matrix_translates_offset() {
        let t = Transform::at(Point3::new(-5.0, 0.0, 0.0));
        let p = math::transform_point(&t.matrix(), Point3::new(1.0, 2.0, 3.0));
        assert_eq!(p, Point3::new(-4.0, 2.0, 3.0));
    }
}
