//! World-space draw list
//!
//! Flattens a [`Scene`] and its current [`Frame`] into spheres, line segments
//! and point sprites with every structure transform already applied. Both the
//! Canvas 2D and the WebGPU backends consume this instead of walking the
//! scene themselves.

use serde::Serialize;

use crate::frame::Frame;
use crate::math::{self, Color, Mat4, Point3};
use crate::scene::Scene;
use crate::shading;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Blend {
    Normal,
    Additive,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DrawSphere {
    pub center: Point3,
    pub radius: f32,
    pub color: Color,
    pub opacity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DrawLine {
    pub a: Point3,
    pub b: Point3,
    pub color_a: Color,
    pub color_b: Color,
    pub opacity: f32,
    pub blend: Blend,
}

/// Soft additive sprite; `size` is in world units before perspective
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DrawPoint {
    pub position: Point3,
    pub size: f32,
    pub color: Color,
    pub opacity: f32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DrawList {
    pub spheres: Vec<DrawSphere>,
    pub lines: Vec<DrawLine>,
    pub points: Vec<DrawPoint>,
}

impl DrawList {
    pub fn build(scene: &Scene, frame: &Frame) -> Self {
        let mut list = Self::default();
        list.rebuild(scene, frame);
        list
    }

    /// Refill in place, reusing the allocations from the previous frame
    pub fn rebuild(&mut self, scene: &Scene, frame: &Frame) {
        self.spheres.clear();
        self.lines.clear();
        self.points.clear();

        self.push_network(scene, frame);
        self.push_helix(scene, frame);
        self.push_sphere(scene, frame);
        self.push_particles(scene, frame);
    }

    pub fn is_empty(&self) -> bool {
        self.spheres.is_empty() && self.lines.is_empty() && self.points.is_empty()
    }

    fn push_network(&mut self, scene: &Scene, frame: &Frame) {
        let network = &scene.network;
        let m = frame.network.matrix();

        for (node, visual) in network.nodes.iter().zip(&frame.nodes) {
            self.spheres.push(DrawSphere {
                center: math::transform_point(&m, node.position),
                radius: node.radius * visual.scale,
                color: node.color,
                opacity: visual.opacity,
            });
        }

        for (edge, color) in network.graph.edges.iter().zip(&network.edge_colors) {
            self.lines.push(DrawLine {
                a: math::transform_point(&m, network.positions[edge.from]),
                b: math::transform_point(&m, network.positions[edge.to]),
                color_a: *color,
                color_b: *color,
                opacity: network.line_opacity,
                blend: Blend::Additive,
            });
        }

        for signal in &frame.signals {
            self.spheres.push(DrawSphere {
                center: math::transform_point(&m, signal.position),
                radius: frame.signal_radius,
                color: signal.color,
                opacity: signal.opacity,
            });
        }
    }

    fn push_helix(&mut self, scene: &Scene, frame: &Frame) {
        let helix = &scene.helix;
        let m = frame.helix.matrix();
        let [color_a, color_b] = helix.strand_colors;

        for point in &helix.points {
            for (position, color) in [(point.position_a, color_a), (point.position_b, color_b)] {
                self.spheres.push(DrawSphere {
                    center: math::transform_point(&m, position),
                    radius: helix.bead_radius,
                    color,
                    opacity: helix.bead_opacity,
                });
            }
        }

        for &i in &helix.rungs {
            let point = &helix.points[i];
            self.lines.push(DrawLine {
                a: math::transform_point(&m, point.position_a),
                b: math::transform_point(&m, point.position_b),
                color_a: helix.rung_color,
                color_b: helix.rung_color,
                opacity: helix.rung_opacity,
                blend: Blend::Normal,
            });
        }
    }

    fn push_sphere(&mut self, scene: &Scene, frame: &Frame) {
        let group = frame.sphere.matrix();

        for (shell, rotation) in scene.sphere.shells.iter().zip(&frame.sphere_layers) {
            let local: Mat4 = math::compose(Point3::ORIGIN, *rotation, shell.layer.radius);
            let m = math::multiply(group, local);
            let vertices: Vec<Point3> = shell
                .wireframe
                .vertices
                .iter()
                .map(|v| math::transform_point(&m, *v))
                .collect();

            for &(a, b) in &shell.wireframe.edges {
                self.lines.push(DrawLine {
                    a: vertices[a as usize],
                    b: vertices[b as usize],
                    color_a: shell.layer.color,
                    color_b: shell.layer.color,
                    opacity: shell.layer.opacity,
                    blend: Blend::Normal,
                });
            }
        }
    }

    fn push_particles(&mut self, scene: &Scene, frame: &Frame) {
        let field = &scene.particles.field;
        let m = frame.particles.matrix();
        let time = frame.particle_uniforms.time;

        for ((position, color), size) in field.positions.iter().zip(&field.colors).zip(&field.sizes) {
            self.points.push(DrawPoint {
                position: math::transform_point(&m, shading::displace(*position, time)),
                size: *size,
                color: *color,
                opacity: scene.particles.opacity,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Viewport;
    use crate::config::SceneConfig;
    use crate::frame::{FrameUpdater, HeadlessRenderer};

    fn draw_list_at(seconds: f64) -> (DrawList, usize, usize) {
        let config = SceneConfig {
            seed: Some(7),
            ..SceneConfig::default()
        };
        let mut updater = FrameUpdater::new(&config, 0.0, Viewport::default());
        let mut renderer = HeadlessRenderer::default();
        updater.tick(seconds, &mut renderer);
        let edges = updater.scene().network.graph.edges.len();
        let signals = updater.signals().len();
        (DrawList::build(updater.scene(), updater.frame()), edges, signals)
    }

    #[test]
    fn counts_cover_every_structure() {
        let (list, edges, signals) = draw_list_at(1.0);
        assert_eq!(list.spheres.len(), 80 + signals + 120);
        assert_eq!(list.lines.len(), edges + 20 + 720);
        assert_eq!(list.points.len(), 800);
    }

    #[test]
    fn network_edges_are_additive() {
        let (list, edges, _) = draw_list_at(0.5);
        assert!(
            list.lines[..edges]
                .iter()
                .all(|l| l.blend == Blend::Additive && (l.opacity - 0.12).abs() < 1e-6)
        );
        assert!(list.lines[edges..].iter().all(|l| l.blend == Blend::Normal));
    }

    #[test]
    fn sphere_vertices_sit_on_shell_radius() {
        let config = SceneConfig {
            seed: Some(1),
            ..SceneConfig::default()
        };
        let mut updater = FrameUpdater::new(&config, 0.0, Viewport::default());
        let mut renderer = HeadlessRenderer::default();
        updater.tick(2.0, &mut renderer);
        let list = DrawList::build(updater.scene(), updater.frame());

        let centre = updater.frame().sphere.position;
        let outer = &list.lines[list.lines.len() - 720];
        assert!((outer.a.distance(&centre) - 6.0).abs() < 1e-3);
        let inner = list.lines.last().unwrap();
        assert!((inner.b.distance(&centre) - 3.0).abs() < 1e-3);
    }

    #[test]
    fn particles_drift_with_frame_time() {
        let config = SceneConfig {
            seed: Some(3),
            ..SceneConfig::default()
        };
        let mut updater = FrameUpdater::new(&config, 0.0, Viewport::default());
        let mut renderer = HeadlessRenderer::default();
        updater.tick(4.0, &mut renderer);
        let frame = updater.frame();
        let list = DrawList::build(updater.scene(), frame);

        let m = frame.particles.matrix();
        let time = frame.particle_uniforms.time;
        let source = updater.scene().particles.field.positions[0];
        let expected = math::transform_point(&m, shading::displace(source, time));
        assert!(list.points[0].position.distance(&expected) < 1e-4);

        let still = math::transform_point(&m, source);
        assert!(list.points[0].position.distance(&still) > 1e-4);
    }

    #[test]
    fn rebuild_reuses_list() {
        let (mut list, _, _) = draw_list_at(1.0);
        let config = SceneConfig {
            seed: Some(7),
            ..SceneConfig::default()
        };
        let updater = FrameUpdater::new(&config, 0.0, Viewport::default());
        list.rebuild(updater.scene(), updater.frame());
        assert_eq!(list.points.len(), 800);
        assert!(!list.is_empty());
    }
}
