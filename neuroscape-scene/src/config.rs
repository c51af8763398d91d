//! Scene configuration
//!
//! Every section uses `#[serde(default)]`, so a configuration file only needs
//! to name the values it changes. Colors are written as `"#rrggbb"` strings.

use std::path::Path;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::error::{SceneError, SceneResult};
use crate::math::{Color, Point3};

/// A closed-open range `[min, max)` sampled uniformly
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span(pub f32, pub f32);

impl Span {
    pub fn min(&self) -> f32 {
        self.0
    }

    pub fn max(&self) -> f32 {
        self.1
    }

    /// Map a unit sample `u` in [0, 1) into the span
    pub fn at(&self, u: f32) -> f32 {
        self.0 + (self.1 - self.0) * u
    }

    pub fn sample<R: rand::Rng>(&self, rng: &mut R) -> f32 {
        self.at(rng.gen_range(0.0..1.0))
    }
}

/// Serde adapter writing colors as `#rrggbb`
pub mod hex_color {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    use crate::math::Color;

    pub fn serialize<S: Serializer>(color: &Color, serializer: S) -> Result<S::Ok, S::Error> {
        let hex = format!(
            "#{:02x}{:02x}{:02x}",
            (color.r * 255.0).round() as u8,
            (color.g * 255.0).round() as u8,
            (color.b * 255.0).round() as u8
        );
        serializer.serialize_str(&hex)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Color, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse(&text).ok_or_else(|| D::Error::custom(format!("invalid color: {text}")))
    }

    /// Parse `#rrggbb` (the leading `#` is optional)
    pub fn parse(text: &str) -> Option<Color> {
        let digits = text.trim().trim_start_matches('#');
        if digits.len() != 6 {
            return None;
        }
        u32::from_str_radix(digits, 16).ok().map(Color::from_hex)
    }
}

/// The four colors everything in the scene is mixed from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    #[serde(with = "hex_color")]
    pub accent: Color,
    #[serde(with = "hex_color")]
    pub secondary: Color,
    #[serde(with = "hex_color")]
    pub pulse: Color,
    #[serde(with = "hex_color")]
    pub rung: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            accent: Color::from_hex(0x6c63ff),
            secondary: Color::from_hex(0x00d4aa),
            pulse: Color::from_hex(0xff6b9d),
            rung: Color::from_hex(0x8b83ff),
        }
    }
}

/// One column of network nodes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    /// Number of nodes in this layer
    pub count: usize,
    /// X coordinate the layer is centred on
    pub center_x: f32,
    /// Vertical extent; y is drawn from `±spread / 2`
    pub spread: f32,
}

impl LayerSpec {
    pub const fn new(count: usize, center_x: f32, spread: f32) -> Self {
        Self {
            count,
            center_x,
            spread,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub layers: Vec<LayerSpec>,
    /// Total width of the x jitter around each layer centre
    pub jitter: f32,
    pub depth_spread: f32,
    pub depth_offset: f32,
    /// Nodes closer than this are connected
    pub max_distance: f32,
    pub node_radius: Span,
    pub base_opacity: Span,
    pub pulse_speed: Span,
    /// Scale amplitude of the node pulse
    pub pulse_scale: f32,
    pub line_opacity: f32,
    /// Upper bound of the accent→secondary mix for edge colors
    pub line_color_mix: f32,
    pub offset: Point3,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            layers: vec![
                LayerSpec::new(12, -20.0, 18.0),
                LayerSpec::new(16, -8.0, 20.0),
                LayerSpec::new(20, 4.0, 22.0),
                LayerSpec::new(16, 16.0, 20.0),
                LayerSpec::new(16, 28.0, 18.0),
            ],
            jitter: 6.0,
            depth_spread: 30.0,
            depth_offset: -10.0,
            max_distance: 12.0,
            node_radius: Span(0.15, 0.40),
            base_opacity: Span(0.7, 1.0),
            pulse_speed: Span(1.0, 3.0),
            pulse_scale: 0.15,
            line_opacity: 0.12,
            line_color_mix: 0.5,
            offset: Point3::new(-5.0, 0.0, 0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Size of the token pool
    pub count: usize,
    pub radius: f32,
    pub speed: Span,
    /// Progress gained per reference frame at speed 1
    pub rate: f32,
    pub peak_opacity: f32,
    /// Frame rate the per-frame rate is expressed against
    pub reference_fps: f32,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            count: 30,
            radius: 0.12,
            speed: Span(0.3, 1.0),
            rate: 0.008,
            peak_opacity: 0.9,
            reference_fps: 60.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HelixConfig {
    pub points: usize,
    /// Full turns over the helix height
    pub turns: f32,
    pub radius: f32,
    pub height: f32,
    pub bead_radius: f32,
    pub bead_opacity: f32,
    /// A rung joins the strands at every n-th point
    pub rung_every: usize,
    pub rung_opacity: f32,
    pub offset: Point3,
}

impl Default for HelixConfig {
    fn default() -> Self {
        Self {
            points: 60,
            turns: 2.0,
            radius: 3.0,
            height: 40.0,
            bead_radius: 0.1,
            bead_opacity: 0.4,
            rung_every: 3,
            rung_opacity: 0.15,
            offset: Point3::new(25.0, 0.0, -12.0),
        }
    }
}

/// One wireframe shell of the sphere structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SphereLayer {
    pub radius: f32,
    pub subdivision: u32,
    #[serde(with = "hex_color")]
    pub color: Color,
    pub opacity: f32,
    /// Radians per second about the x axis
    pub rotation_speed: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SphereConfig {
    pub layers: Vec<SphereLayer>,
    pub offset: Point3,
    pub bob_amplitude: f32,
    pub bob_speed: f32,
    /// Y rotation as a fraction of the x rotation
    pub tilt_ratio: f32,
}

impl Default for SphereConfig {
    fn default() -> Self {
        let radii = [6.0, 4.5, 3.0];
        let subdivisions = [2, 1, 1];
        let colors = [0x6c63ff, 0x00d4aa, 0x8b83ff];
        let opacities = [0.08, 0.12, 0.18];
        let layers = (0..3)
            .map(|idx| SphereLayer {
                radius: radii[idx],
                subdivision: subdivisions[idx],
                color: Color::from_hex(colors[idx]),
                opacity: opacities[idx],
                rotation_speed: (idx + 1) as f32 * 0.08,
            })
            .collect();

        Self {
            layers,
            offset: Point3::new(-22.0, -5.0, -15.0),
            bob_amplitude: 2.0,
            bob_speed: 0.3,
            tilt_ratio: 0.7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    pub count: usize,
    /// Full size of the bounding box
    pub extent: Point3,
    pub center: Point3,
    pub size: Span,
    pub opacity: f32,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            count: 800,
            extent: Point3::new(100.0, 100.0, 60.0),
            center: Point3::new(0.0, 0.0, -15.0),
            size: Span(0.3, 1.8),
            opacity: 0.35,
        }
    }
}

/// Rates for the continuous motion and the two pointer smoothers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    pub network_sway_speed: f32,
    pub network_sway_amplitude: f32,
    pub helix_spin: f32,
    pub particle_spin: f32,
    /// Fraction of the remaining distance the camera covers per tick
    pub camera_smoothing: f32,
    /// Fraction of the remaining distance the cursor glow covers per tick
    pub glow_smoothing: f32,
    /// Camera offset at the edge of the viewport
    pub parallax: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            network_sway_speed: 0.05,
            network_sway_amplitude: 0.1,
            helix_spin: 0.15,
            particle_spin: 0.015,
            camera_smoothing: 0.05,
            glow_smoothing: 0.1,
            parallax: 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub distance: f32,
    pub max_pixel_ratio: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
            distance: 30.0,
            max_pixel_ratio: 2.0,
        }
    }
}

/// Complete configuration of the backdrop scene
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Fixed seed for reproducible layouts; `None` seeds from entropy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub palette: Palette,
    pub network: NetworkConfig,
    pub signals: SignalConfig,
    pub helix: HelixConfig,
    pub sphere: SphereConfig,
    pub particles: ParticleConfig,
    pub motion: MotionConfig,
    pub camera: CameraConfig,
}

impl SceneConfig {
    pub fn from_json_str(text: &str) -> SceneResult<Self> {
        let config: SceneConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(text: &str) -> SceneResult<Self> {
        let config: SceneConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a `.json`, `.yaml` or `.yml` file
    pub fn load(path: &Path) -> SceneResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "json" => Self::from_json_str(&std::fs::read_to_string(path)?),
            "yaml" | "yml" => Self::from_yaml_str(&std::fs::read_to_string(path)?),
            _ => Err(SceneError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Random source for scene generation
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Check value ranges that would otherwise produce NaNs or a frozen scene
    pub fn validate(&self) -> SceneResult<()> {
        let invalid = |msg: String| Err(SceneError::InvalidConfig(msg));

        if !(self.network.max_distance > 0.0) {
            return invalid(format!(
                "network.max_distance must be positive, got {}",
                self.network.max_distance
            ));
        }
        for (name, rate) in [
            ("motion.camera_smoothing", self.motion.camera_smoothing),
            ("motion.glow_smoothing", self.motion.glow_smoothing),
        ] {
            if !(rate > 0.0 && rate <= 1.0) {
                return invalid(format!("{name} must be in (0, 1], got {rate}"));
            }
        }
        for (name, span) in [
            ("network.node_radius", self.network.node_radius),
            ("network.base_opacity", self.network.base_opacity),
            ("network.pulse_speed", self.network.pulse_speed),
            ("signals.speed", self.signals.speed),
            ("particles.size", self.particles.size),
        ] {
            if span.min() > span.max() {
                return invalid(format!("{name} has min {} above max {}", span.0, span.1));
            }
        }
        if self.signals.speed.min() < 0.0 || self.signals.rate < 0.0 {
            return invalid("signal speed and rate must not be negative".to_string());
        }
        if !(self.signals.reference_fps > 0.0) {
            return invalid("signals.reference_fps must be positive".to_string());
        }
        if let Some(layer) = self.sphere.layers.iter().find(|l| l.radius < 0.0) {
            return invalid(format!("sphere layer radius {} is negative", layer.radius));
        }
        if !self.sphere.layers.iter().any(|l| l.radius > 0.0) {
            return invalid("sphere needs at least one layer with a positive radius".to_string());
        }
        let cam = &self.camera;
        if !(cam.fov_degrees > 0.0 && cam.fov_degrees < 180.0) {
            return invalid(format!("camera.fov_degrees out of range: {}", cam.fov_degrees));
        }
        if !(cam.near > 0.0 && cam.far > cam.near) {
            return invalid("camera planes must satisfy 0 < near < far".to_string());
        }
        Ok(())
    }
}
