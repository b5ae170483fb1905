//! Camera rig and the world ↔ pixel mapping. The camera always looks down
//! -Z at the origin from `distance` units away, so the shelf plane (z = 0)
//! has a uniform pixels-per-unit scale that the backdrop panel relies on.

use glam::{Mat4, Vec2, Vec3, Vec4Swizzles};
use serde::Serialize;

use crate::config::CameraTuning;

const NEAR_CLIP: f32 = 0.05;
const FAR_CLIP: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CameraRig {
    pub fov_degrees: f32,
    pub distance: f32,
}

impl CameraRig {
    /// Pull the camera back far enough that a grid of `grid_height` world
    /// units (plus margin) fills the vertical field of view.
    pub fn fit_height(tuning: &CameraTuning, grid_height: f32) -> Self {
        let half_fov = tuning.fov_degrees.to_radians() * 0.5;
        let framed = grid_height.max(0.0) * (1.0 + tuning.vertical_margin);
        let distance = (framed * 0.5 / half_fov.tan()).max(tuning.min_distance);
        Self {
            fov_degrees: tuning.fov_degrees,
            distance,
        }
    }

    pub fn eye(&self) -> Vec3 {
        Vec3::new(0.0, 0.0, self.distance)
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), Vec3::ZERO, Vec3::Y)
    }

    pub fn projection(&self, viewport: Viewport) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_degrees.to_radians(),
            viewport.aspect(),
            NEAR_CLIP,
            FAR_CLIP,
        )
    }

    pub fn view_projection(&self, viewport: Viewport) -> Mat4 {
        self.projection(viewport) * self.view()
    }

    /// Ray from the eye through the pixel `(px, py)` (origin top-left).
    pub fn pick_ray(&self, viewport: Viewport, px: f32, py: f32) -> Ray {
        let ndc_x = (px / viewport.width as f32) * 2.0 - 1.0;
        let ndc_y = 1.0 - (py / viewport.height as f32) * 2.0;
        let inverse = self.view_projection(viewport).inverse();
        let far = inverse * glam::Vec4::new(ndc_x, ndc_y, 1.0, 1.0);
        let far = far.xyz() / far.w;
        let origin = self.eye();
        Ray {
            origin,
            direction: (far - origin).normalize_or_zero(),
        }
    }
}

/// Uniform world-unit to pixel scale on the shelf plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoordinateMapper {
    pub pixels_per_unit: f32,
    pub viewport: Viewport,
}

impl CoordinateMapper {
    pub fn new(camera: &CameraRig, viewport: Viewport) -> Self {
        let half_fov = camera.fov_degrees.to_radians() * 0.5;
        let pixels_per_unit =
            viewport.height as f32 / (2.0 * camera.distance * half_fov.tan());
        Self {
            pixels_per_unit,
            viewport,
        }
    }

    pub fn to_pixels(&self, units: f32) -> f32 {
        units * self.pixels_per_unit
    }

    pub fn to_world(&self, pixels: f32) -> f32 {
        if self.pixels_per_unit <= f32::EPSILON {
            return 0.0;
        }
        pixels / self.pixels_per_unit
    }

    /// Screen position (pixels, origin top-left) of a point on the shelf plane.
    pub fn screen_point(&self, world: Vec2) -> Vec2 {
        Vec2::new(
            self.viewport.width as f32 * 0.5 + self.to_pixels(world.x),
            self.viewport.height as f32 * 0.5 - self.to_pixels(world.y),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Distance along the ray to the box `model * [-0.5, 0.5]^3`, if hit.
    pub fn intersect_unit_box(&self, model: Mat4) -> Option<f32> {
        let det = model.determinant();
        if !det.is_finite() || det.abs() <= f32::EPSILON {
            return None;
        }
        let inverse = model.inverse();
        let origin = inverse.transform_point3(self.origin);
        let direction = inverse.transform_vector3(self.direction);

        let mut t_min = f32::NEG_INFINITY;
        let mut t_max = f32::INFINITY;
        for axis in 0..3 {
            let o = origin[axis];
            let d = direction[axis];
            if d.abs() <= f32::EPSILON {
                if !(-0.5..=0.5).contains(&o) {
                    return None;
                }
                continue;
            }
            let t0 = (-0.5 - o) / d;
            let t1 = (0.5 - o) / d;
            t_min = t_min.max(t0.min(t1));
            t_max = t_max.min(t0.max(t1));
            if t_min > t_max {
                return None;
            }
        }
        if t_max < 0.0 {
            return None;
        }
        // Local-space parameters equal world-space ones because the direction
        // was transformed with the same affine map as the origin.
        Some(t_min.max(0.0))
    }
}
