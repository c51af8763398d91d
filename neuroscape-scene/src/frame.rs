//! Per-frame animation update
//!
//! [`FrameUpdater`] owns the assembled scene and every piece of mutable
//! animation state. Each tick reads the clock once, derives the visual state
//! into a reusable [`Frame`], and hands it to a [`Renderer`] in a single call.

use rand::rngs::StdRng;
use serde::Serialize;
use tracing::debug;

use crate::camera::{CameraState, ParallaxCamera, Viewport};
use crate::clock::{FrameClock, FrameTime};
use crate::config::{MotionConfig, SceneConfig};
use crate::math::Point3;
use crate::pointer::{self, PointerSmoother};
use crate::scene::{Scene, SceneAssembler, Transform};
use crate::signal::{SignalAnimator, SignalVisual};

/// Derived per-frame appearance of one network node
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NodeVisual {
    pub opacity: f32,
    pub scale: f32,
}

/// Inputs of the particle shading program
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParticleUniforms {
    pub time: f32,
    pub pixel_ratio: f32,
}

/// Everything a renderer needs beyond the static scene
#[derive(Debug, Clone, Serialize)]
pub struct Frame {
    pub time: FrameTime,
    /// Parallel to `scene.network.nodes`
    pub nodes: Vec<NodeVisual>,
    pub signals: Vec<SignalVisual>,
    pub signal_radius: f32,
    pub network: Transform,
    pub helix: Transform,
    pub sphere: Transform,
    /// Rotation of each sphere shell inside the sphere structure
    pub sphere_layers: Vec<Point3>,
    pub particles: Transform,
    pub particle_uniforms: ParticleUniforms,
    pub camera: CameraState,
    pub viewport: Viewport,
    /// Smoothed cursor glow position in client pixels
    pub cursor_glow: (f32, f32),
}

/// Compact per-frame figures, printed by the headless simulator
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameSummary {
    pub elapsed: f32,
    pub delta: f32,
    pub mean_node_opacity: f32,
    pub visible_signals: usize,
    pub camera_x: f32,
    pub camera_y: f32,
    pub sphere_y: f32,
}

impl Frame {
    pub fn summary(&self) -> FrameSummary {
        let mean_node_opacity = if self.nodes.is_empty() {
            0.0
        } else {
            self.nodes.iter().map(|n| n.opacity).sum::<f32>() / self.nodes.len() as f32
        };
        FrameSummary {
            elapsed: self.time.elapsed,
            delta: self.time.delta,
            mean_node_opacity,
            visible_signals: self.signals.iter().filter(|s| s.opacity > 0.01).count(),
            camera_x: self.camera.position.x,
            camera_y: self.camera.position.y,
            sphere_y: self.sphere.position.y,
        }
    }
}

/// Drawing backend driven by [`FrameUpdater`]
pub trait Renderer {
    /// Called when the drawable surface changes size
    fn resize(&mut self, viewport: Viewport);

    /// Draw one frame; called exactly once per tick
    fn render(&mut self, scene: &Scene, frame: &Frame);
}

/// Renderer that draws nothing and records what it was given
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    pub frames_rendered: usize,
    pub viewport: Option<Viewport>,
    pub last: Option<FrameSummary>,
}

impl Renderer for HeadlessRenderer {
    fn resize(&mut self, viewport: Viewport) {
        self.viewport = Some(viewport);
    }

    fn render(&mut self, _scene: &Scene, frame: &Frame) {
        self.frames_rendered += 1;
        self.last = Some(frame.summary());
    }
}

pub struct FrameUpdater {
    scene: Scene,
    signals: SignalAnimator,
    rng: StdRng,
    clock: FrameClock,
    camera: ParallaxCamera,
    glow: PointerSmoother,
    /// Latest pointer position normalized to [-1, 1]
    pointer: (f32, f32),
    viewport: Viewport,
    motion: MotionConfig,
    frame: Frame,
}

impl FrameUpdater {
    /// Assemble the scene from `config` and start the clock at `now` seconds
    pub fn new(config: &SceneConfig, now: f64, viewport: Viewport) -> Self {
        let mut rng = config.rng();
        let (scene, signals) = SceneAssembler::assemble(config, &mut rng);
        Self::from_parts(scene, signals, rng, config, now, viewport)
    }

    pub fn from_parts(
        scene: Scene,
        signals: SignalAnimator,
        rng: StdRng,
        config: &SceneConfig,
        now: f64,
        viewport: Viewport,
    ) -> Self {
        let camera = ParallaxCamera::new(&config.camera, &config.motion, viewport.aspect());
        let frame = Frame {
            time: FrameTime::default(),
            nodes: Vec::with_capacity(scene.network.nodes.len()),
            signals: Vec::with_capacity(signals.len()),
            signal_radius: signals.radius,
            network: Transform::at(scene.network.offset),
            helix: Transform::at(scene.helix.offset),
            sphere: Transform::at(scene.sphere.offset),
            sphere_layers: vec![Point3::ORIGIN; scene.sphere.shells.len()],
            particles: Transform::default(),
            particle_uniforms: ParticleUniforms {
                time: 0.0,
                pixel_ratio: viewport.pixel_ratio,
            },
            camera: camera.state(),
            viewport,
            cursor_glow: (0.0, 0.0),
        };

        Self {
            scene,
            signals,
            rng,
            clock: FrameClock::new(now),
            camera,
            glow: PointerSmoother::new(config.motion.glow_smoothing),
            pointer: (0.0, 0.0),
            viewport,
            motion: config.motion.clone(),
            frame,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn signals(&self) -> &SignalAnimator {
        &self.signals
    }

    /// Most recently computed frame
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Pointer-move handler; coordinates are client pixels
    pub fn set_pointer(&mut self, client_x: f32, client_y: f32) {
        self.glow.set_raw(client_x, client_y);
        self.pointer = pointer::normalize(
            client_x,
            client_y,
            self.viewport.width,
            self.viewport.height,
        );
    }

    pub fn resize<R: Renderer + ?Sized>(&mut self, viewport: Viewport, renderer: &mut R) {
        debug!(
            width = viewport.width,
            height = viewport.height,
            pixel_ratio = viewport.pixel_ratio,
            "resize"
        );
        self.viewport = viewport;
        self.camera.resize(&viewport);
        self.frame.viewport = viewport;
        self.frame.particle_uniforms.pixel_ratio = viewport.pixel_ratio;
        renderer.resize(viewport);
    }

    /// Advance the animation to `now` seconds and render once
    pub fn tick<R: Renderer + ?Sized>(&mut self, now: f64, renderer: &mut R) -> &Frame {
        let time = self.clock.tick(now);
        self.update(time);
        renderer.render(&self.scene, &self.frame);
        &self.frame
    }

    fn update(&mut self, time: FrameTime) {
        let elapsed = time.elapsed;
        let motion = &self.motion;
        let frame = &mut self.frame;
        frame.time = time;
        frame.particle_uniforms.time = elapsed;

        let network = &self.scene.network;
        frame.nodes.clear();
        frame.nodes.extend(network.nodes.iter().map(|node| {
            let pulse = node.pulse(elapsed);
            NodeVisual {
                opacity: node.base_opacity * (0.6 + 0.4 * pulse),
                scale: 1.0 + network.pulse_scale * pulse,
            }
        }));

        self.signals.advance(&network.graph, time.delta, &mut self.rng);
        self.signals
            .write_visuals(&network.positions, &mut frame.signals);

        frame.network.rotation.y =
            (elapsed * motion.network_sway_speed).sin() * motion.network_sway_amplitude;
        frame.helix.rotation.y = elapsed * motion.helix_spin;
        frame.particles.rotation.y = elapsed * motion.particle_spin;

        let sphere = &self.scene.sphere;
        frame.sphere.position.y =
            sphere.offset.y + (elapsed * sphere.bob_speed).sin() * sphere.bob_amplitude;
        for (rotation, shell) in frame.sphere_layers.iter_mut().zip(&sphere.shells) {
            let speed = shell.layer.rotation_speed;
            rotation.x = elapsed * speed;
            rotation.y = elapsed * speed * sphere.tilt_ratio;
        }

        frame.cursor_glow = self.glow.tick();
        self.camera.follow(self.pointer.0, self.pointer.1);
        frame.camera = self.camera.state();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_config() -> SceneConfig {
        SceneConfig {
            seed: Some(42),
            ..SceneConfig::default()
        }
    }

    fn updater() -> FrameUpdater {
        FrameUpdater::new(&seeded_config(), 100.0, Viewport::new(800.0, 600.0, 1.0, 2.0))
    }

    #[test]
    fn one_render_per_tick() {
        let mut updater = updater();
        let mut renderer = HeadlessRenderer::default();
        for i in 1..=5 {
            updater.tick(100.0 + i as f64 / 60.0, &mut renderer);
        }
        assert_eq!(renderer.frames_rendered, 5);
    }

    #[test]
    fn node_visuals_follow_pulse() {
        let mut updater = updater();
        let mut renderer = HeadlessRenderer::default();
        let frame = updater.tick(101.3, &mut renderer).clone();
        let scene = updater.scene();

        assert_eq!(frame.nodes.len(), scene.network.nodes.len());
        for (node, visual) in scene.network.nodes.iter().zip(&frame.nodes) {
            let pulse = node.pulse(frame.time.elapsed);
            assert!((visual.opacity - node.base_opacity * (0.6 + 0.4 * pulse)).abs() < 1e-5);
            assert!((visual.scale - (1.0 + 0.15 * pulse)).abs() < 1e-5);
            assert!(visual.opacity >= node.base_opacity * 0.2 - 1e-5);
            assert!(visual.opacity <= node.base_opacity + 1e-5);
        }
    }

    #[test]
    fn structure_motion_at_known_time() {
        let mut updater = updater();
        let mut renderer = HeadlessRenderer::default();
        let frame = updater.tick(110.0, &mut renderer);

        assert!((frame.network.rotation.y - (10.0f32 * 0.05).sin() * 0.1).abs() < 1e-6);
        assert!((frame.helix.rotation.y - 1.5).abs() < 1e-5);
        assert!((frame.particles.rotation.y - 0.15).abs() < 1e-5);
        assert!((frame.sphere.position.y - (-5.0 + (3.0f32).sin() * 2.0)).abs() < 1e-5);
        assert!((frame.sphere_layers[0].x - 0.8).abs() < 1e-5);
        assert!((frame.sphere_layers[2].y - 10.0 * 0.24 * 0.7).abs() < 1e-5);
        assert_eq!(frame.particle_uniforms.time, 10.0);
    }

    #[test]
    fn signals_stay_in_range_over_many_ticks() {
        let mut updater = updater();
        let mut renderer = HeadlessRenderer::default();
        for i in 0..600 {
            updater.tick(100.0 + i as f64 / 30.0, &mut renderer);
        }
        assert!(
            updater
                .signals()
                .signals
                .iter()
                .all(|s| (0.0..=1.0).contains(&s.progress))
        );
        assert_eq!(updater.frame().signals.len(), updater.signals().len());
    }

    #[test]
    fn pointer_drives_glow_and_camera() {
        let mut updater = updater();
        let mut renderer = HeadlessRenderer::default();
        updater.set_pointer(800.0, 0.0);
        let frame = updater.tick(100.016, &mut renderer);

        assert!((frame.cursor_glow.0 - 80.0).abs() < 1e-4);
        assert!((frame.cursor_glow.1 - 0.0).abs() < 1e-4);
        // normalized (1, -1): target (3, 3), 5 % of the way
        assert!((frame.camera.position.x - 0.15).abs() < 1e-5);
        assert!((frame.camera.position.y - 0.15).abs() < 1e-5);
    }

    #[test]
    fn resize_updates_pixel_ratio_and_renderer() {
        let mut updater = updater();
        let mut renderer = HeadlessRenderer::default();
        let viewport = Viewport::new(1920.0, 1080.0, 3.0, 2.0);
        updater.resize(viewport, &mut renderer);

        assert_eq!(renderer.viewport, Some(viewport));
        assert_eq!(updater.frame().particle_uniforms.pixel_ratio, 2.0);
        assert_eq!(updater.viewport().aspect(), 1920.0 / 1080.0);
    }

    #[test]
    fn summary_reports_camera_and_sphere() {
        let mut updater = updater();
        let mut renderer = HeadlessRenderer::default();
        updater.tick(100.5, &mut renderer);
        let summary = renderer.last.unwrap();
        assert_eq!(summary.elapsed, 0.5);
        assert!(summary.mean_node_opacity > 0.0);
        assert!(summary.sphere_y <= -3.0 && summary.sphere_y >= -7.0);
    }
}
