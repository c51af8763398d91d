//! Perspective camera with pointer parallax
//!
//! The camera sits in front of the scene and drifts sideways toward a target
//! derived from the pointer, always looking back at the origin.

use serde::Serialize;

use crate::config::{CameraConfig, MotionConfig};
use crate::math::{self, Mat4, Point3};
use crate::pointer::ease;

/// Drawable surface size in CSS pixels plus the clamped device pixel ratio
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub pixel_ratio: f32,
}

impl Viewport {
    /// `device_pixel_ratio` is clamped to `max_pixel_ratio`
    pub fn new(width: f32, height: f32, device_pixel_ratio: f32, max_pixel_ratio: f32) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
            pixel_ratio: device_pixel_ratio.clamp(1.0, max_pixel_ratio.max(1.0)),
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }

    /// Backing-store size in device pixels
    pub fn device_size(&self) -> (u32, u32) {
        (
            (self.width * self.pixel_ratio).round() as u32,
            (self.height * self.pixel_ratio).round() as u32,
        )
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 720.0, 1.0, 2.0)
    }
}

/// Camera snapshot handed to renderers
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CameraState {
    pub position: Point3,
    pub view: Mat4,
    pub projection: Mat4,
    pub view_projection: Mat4,
}

#[derive(Debug, Clone)]
pub struct ParallaxCamera {
    pub position: Point3,
    /// Vertical field of view in radians
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    smoothing: f32,
    parallax: f32,
}

impl ParallaxCamera {
    pub fn new(camera: &CameraConfig, motion: &MotionConfig, aspect: f32) -> Self {
        Self {
            position: Point3::new(0.0, 0.0, camera.distance),
            fov: camera.fov_degrees.to_radians(),
            aspect,
            near: camera.near,
            far: camera.far,
            smoothing: motion.camera_smoothing,
            parallax: motion.parallax,
        }
    }

    /// Recompute projection parameters for a new surface size
    pub fn resize(&mut self, viewport: &Viewport) {
        self.aspect = viewport.aspect();
    }

    /// Ease toward the offset for a normalized pointer in [-1, 1].
    ///
    /// Screen y grows downward, so the camera's y target is inverted.
    pub fn follow(&mut self, pointer_x: f32, pointer_y: f32) {
        let target_x = pointer_x * self.parallax;
        let target_y = -pointer_y * self.parallax;
        self.position.x = ease(self.position.x, target_x, self.smoothing);
        self.position.y = ease(self.position.y, target_y, self.smoothing);
    }

    /// View matrix looking at the scene origin
    pub fn view_matrix(&self) -> Mat4 {
        math::look_at(self.position.to_array(), [0.0, 0.0, 0.0], [0.0, 1.0, 0.0])
    }

    pub fn projection_matrix(&self) -> Mat4 {
        math::perspective(self.fov, self.aspect, self.near, self.far)
    }

    pub fn state(&self) -> CameraState {
        let view = self.view_matrix();
        let projection = self.projection_matrix();
        CameraState {
            position: self.position,
            view,
            projection,
            view_projection: math::multiply(projection, view),
        }
    }
}

/// A world point projected onto the surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    /// Device-pixel x from the left edge
    pub x: f32,
    /// Device-pixel y from the top edge
    pub y: f32,
    /// Distance in front of the camera (`-z` in view space)
    pub depth: f32,
}

impl CameraState {
    /// Project a world point to device pixels; `None` behind the near plane
    pub fn project(&self, point: Point3, viewport: &Viewport, near: f32) -> Option<ScreenPoint> {
        let clip = math::transform(&self.view_projection, point);
        let w = clip[3];
        if w < near {
            return None;
        }
        let (width, height) = viewport.device_size();
        Some(ScreenPoint {
            x: (clip[0] / w * 0.5 + 0.5) * width as f32,
            y: (0.5 - clip[1] / w * 0.5) * height as f32,
            depth: w,
        })
    }

    /// Device-pixel radius of a world-space sphere at the given depth
    pub fn pixel_radius(&self, radius: f32, depth: f32, viewport: &Viewport) -> f32 {
        let (_, height) = viewport.device_size();
        radius * self.projection[5] * height as f32 * 0.5 / depth.max(1e-3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> ParallaxCamera {
        ParallaxCamera::new(&CameraConfig::default(), &MotionConfig::default(), 16.0 / 9.0)
    }

    #[test]
    fn starts_on_the_z_axis() {
        let cam = camera();
        assert_eq!(cam.position, Point3::new(0.0, 0.0, 30.0));
        assert!((cam.fov - 75f32.to_radians()).abs() < 1e-6);
    }

    #[test]
    fn follow_eases_five_percent() {
        let mut cam = camera();
        cam.follow(1.0, 1.0);
        assert!((cam.position.x - 0.15).abs() < 1e-6);
        assert!((cam.position.y + 0.15).abs() < 1e-6);
        assert_eq!(cam.position.z, 30.0);
    }

    #[test]
    fn follow_converges_to_parallax_limit() {
        let mut cam = camera();
        for _ in 0..1000 {
            cam.follow(-1.0, 0.0);
        }
        assert!((cam.position.x + 3.0).abs() < 1e-3);
        assert!(cam.position.y.abs() < 1e-6);
    }

    #[test]
    fn origin_projects_to_centre() {
        let cam = camera();
        let viewport = Viewport::new(800.0, 600.0, 1.0, 2.0);
        let p = cam.state().project(Point3::ORIGIN, &viewport, cam.near).unwrap();
        assert!((p.x - 400.0).abs() < 1e-3);
        assert!((p.y - 300.0).abs() < 1e-3);
        assert!((p.depth - 30.0).abs() < 1e-3);
    }

    #[test]
    fn points_behind_camera_are_culled() {
        let cam = camera();
        let viewport = Viewport::default();
        assert!(
            cam.state()
                .project(Point3::new(0.0, 0.0, 40.0), &viewport, cam.near)
                .is_none()
        );
    }

    #[test]
    fn viewport_clamps_pixel_ratio() {
        let vp = Viewport::new(1000.0, 500.0, 3.0, 2.0);
        assert_eq!(vp.pixel_ratio, 2.0);
        assert_eq!(vp.device_size(), (2000, 1000));
        assert_eq!(vp.aspect(), 2.0);
    }

    #[test]
    fn resize_updates_aspect() {
        let mut cam = camera();
        cam.resize(&Viewport::new(500.0, 500.0, 1.0, 2.0));
        assert_eq!(cam.aspect, 1.0);
    }
}
