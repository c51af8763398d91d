//! 2D Canvas rendering for the backdrop
//!
//! Projects the frame's draw list through the scene camera and paints it on
//! a transparent HTML canvas. This is the fallback renderer for browsers
//! without WebGPU.

use neuroscape_scene::draw::{Blend, DrawLine, DrawList};
use neuroscape_scene::frame::{Frame, Renderer};
use neuroscape_scene::math::Color;
use neuroscape_scene::{Scene, SceneError, Viewport, shading};
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

/// Projected sphere waiting to be painted back to front
struct Disc {
    depth: f32,
    x: f32,
    y: f32,
    radius: f32,
    color: Color,
    opacity: f32,
}

/// 2D Canvas renderer
pub struct Canvas2DRenderer {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    viewport: Viewport,
    near: f32,
    draw: DrawList,
    discs: Vec<Disc>,
}

impl Canvas2DRenderer {
    /// Create renderer from canvas element
    pub fn new(canvas: HtmlCanvasElement, viewport: Viewport, near: f32) -> Result<Self, SceneError> {
        let ctx = canvas
            .get_context("2d")
            .map_err(|e| SceneError::MissingSurface(format!("2d context failed: {:?}", e)))?
            .ok_or_else(|| SceneError::MissingSurface("2d context not available".into()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| SceneError::MissingSurface("not a CanvasRenderingContext2d".into()))?;

        let mut renderer = Self {
            canvas,
            ctx,
            viewport,
            near,
            draw: DrawList::default(),
            discs: Vec::new(),
        };
        renderer.resize(viewport);
        Ok(renderer)
    }

    fn set_blend(&self, blend: Blend) {
        let op = match blend {
            Blend::Normal => "source-over",
            Blend::Additive => "lighter",
        };
        self.ctx.set_global_composite_operation(op).ok();
    }

    /// Draw every line with the given blend mode
    fn render_lines(&self, frame: &Frame, blend: Blend) {
        self.set_blend(blend);
        self.ctx.set_line_width(self.viewport.pixel_ratio as f64);

        for line in self.draw.lines.iter().filter(|l| l.blend == blend) {
            self.render_line(frame, line);
        }
    }

    fn render_line(&self, frame: &Frame, line: &DrawLine) {
        let camera = &frame.camera;
        let (Some(a), Some(b)) = (
            camera.project(line.a, &self.viewport, self.near),
            camera.project(line.b, &self.viewport, self.near),
        ) else {
            return;
        };

        // canvas strokes are single-colored; use the midpoint of the two ends
        let color = line.color_a.lerp(&line.color_b, 0.5);
        self.ctx.set_stroke_style_str(&color.to_css(line.opacity));
        self.ctx.begin_path();
        self.ctx.move_to(a.x as f64, a.y as f64);
        self.ctx.line_to(b.x as f64, b.y as f64);
        self.ctx.stroke();
    }

    /// Particles as soft additive sprites, approximated by two rings
    fn render_points(&self, frame: &Frame) {
        self.set_blend(Blend::Additive);
        let pixel_ratio = frame.particle_uniforms.pixel_ratio;

        for point in &self.draw.points {
            let Some(p) = frame.camera.project(point.position, &self.viewport, self.near) else {
                continue;
            };
            let size = shading::point_size(point.size, pixel_ratio, p.depth);
            if size < 0.5 {
                continue;
            }
            let outer = shading::sprite_alpha(0.375, point.opacity);
            let inner = shading::sprite_alpha(0.125, point.opacity) - outer;
            for (radius, alpha) in [(size * 0.5, outer), (size * 0.25, inner)] {
                self.ctx.set_fill_style_str(&point.color.to_css(alpha));
                self.ctx.begin_path();
                self.ctx
                    .arc(p.x as f64, p.y as f64, radius as f64, 0.0, std::f64::consts::TAU)
                    .ok();
                self.ctx.fill();
            }
        }
    }

    /// Spheres painted far to near
    fn render_spheres(&mut self, frame: &Frame) {
        self.discs.clear();
        for sphere in &self.draw.spheres {
            let Some(p) = frame.camera.project(sphere.center, &self.viewport, self.near) else {
                continue;
            };
            self.discs.push(Disc {
                depth: p.depth,
                x: p.x,
                y: p.y,
                radius: frame.camera.pixel_radius(sphere.radius, p.depth, &self.viewport),
                color: sphere.color,
                opacity: sphere.opacity,
            });
        }
        self.discs.sort_by(|a, b| b.depth.total_cmp(&a.depth));

        self.set_blend(Blend::Normal);
        for disc in &self.discs {
            self.ctx.set_fill_style_str(&disc.color.to_css(disc.opacity));
            self.ctx.begin_path();
            self.ctx
                .arc(
                    disc.x as f64,
                    disc.y as f64,
                    disc.radius.max(0.5) as f64,
                    0.0,
                    std::f64::consts::TAU,
                )
                .ok();
            self.ctx.fill();
        }
    }
}

impl Renderer for Canvas2DRenderer {
    fn resize(&mut self, viewport: Viewport) {
        let (width, height) = viewport.device_size();
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        self.viewport = viewport;
    }

    fn render(&mut self, scene: &Scene, frame: &Frame) {
        self.draw.rebuild(scene, frame);

        let (width, height) = self.viewport.device_size();
        self.ctx.clear_rect(0.0, 0.0, width as f64, height as f64);

        self.render_lines(frame, Blend::Normal);
        self.render_lines(frame, Blend::Additive);
        self.render_points(frame);
        self.render_spheres(frame);
    }
}
