use glam::{DMat4, DVec3, Mat4};

use crate::math::rotate_around;
use crate::model::Aabb;

/// Look-at camera driven by position, focal point and view-up
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: DVec3,
    pub focal_point: DVec3,
    pub view_up: DVec3,
    /// Vertical field of view in degrees
    pub view_angle: f64,
    pub orthographic: bool,
    /// Half the visible height in orthographic mode
    pub parallel_scale: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: DVec3::new(0.0, 0.0, 1.0),
            focal_point: DVec3::ZERO,
            view_up: DVec3::Y,
            view_angle: 30.0,
            orthographic: false,
            parallel_scale: 1.0,
        }
    }
}

impl Camera {
    /// Unit vector from the position towards the focal point
    pub fn direction(&self) -> DVec3 {
        (self.focal_point - self.position)
            .try_normalize()
            .unwrap_or(DVec3::NEG_Z)
    }

    pub fn distance(&self) -> f64 {
        (self.focal_point - self.position).length()
    }

    pub fn right(&self) -> DVec3 {
        let dir = self.direction();
        dir.cross(self.view_up)
            .try_normalize()
            .unwrap_or_else(|| dir.any_orthonormal_vector())
    }

    /// View-up made orthogonal to the view direction
    pub fn orthogonal_up(&self) -> DVec3 {
        self.right().cross(self.direction())
    }

    /// Move position and focal point together, in camera space
    pub fn pan(&mut self, right: f64, up: f64, forward: f64) {
        let offset = self.right() * right + self.orthogonal_up() * up + self.direction() * forward;
        self.position += offset;
        self.focal_point += offset;
    }

    /// Move towards the focal point, dividing the distance by `factor`
    pub fn dolly(&mut self, factor: f64) {
        if factor <= 0.0 || !factor.is_finite() {
            return;
        }
        let distance = self.distance() / factor;
        self.position = self.focal_point - self.direction() * distance;
    }

    /// Narrow the view angle (or the parallel scale) by `factor`
    pub fn zoom(&mut self, factor: f64) {
        if factor <= 0.0 || !factor.is_finite() {
            return;
        }
        if self.orthographic {
            self.parallel_scale /= factor;
        } else {
            self.view_angle = (self.view_angle / factor).clamp(1.0, 170.0);
        }
    }

    /// Rotate the position about the focal point around the right axis.
    /// Positive angles raise the camera.
    pub fn elevation(&mut self, degrees: f64) {
        let axis = self.right();
        let offset = self.position - self.focal_point;
        self.position = self.focal_point + rotate_around(offset, axis, -degrees.to_radians());
        self.view_up = axis.cross(self.direction());
    }

    /// Rotate the position about the focal point around the view-up axis
    pub fn azimuth(&mut self, degrees: f64) {
        let Some(axis) = self.view_up.try_normalize() else {
            return;
        };
        let offset = self.position - self.focal_point;
        self.position = self.focal_point + rotate_around(offset, axis, degrees.to_radians());
    }

    /// Keep the view direction and fit `bounds` in the view
    pub fn reset_to_bounds(&mut self, bounds: &Aabb) {
        let radius = if bounds.is_empty() || bounds.radius() == 0.0 {
            0.5
        } else {
            bounds.radius()
        };
        let dir = self.direction();
        let half_angle = (self.view_angle.to_radians() * 0.5).max(1e-3);
        let distance = radius / half_angle.sin();

        self.focal_point = bounds.center();
        self.position = self.focal_point - dir * distance;
        self.parallel_scale = radius;
        if self.view_up.cross(dir).length_squared() < 1e-12 {
            self.view_up = dir.any_orthonormal_vector();
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        DMat4::look_at_rh(self.position, self.focal_point, self.orthogonal_up()).as_mat4()
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        let distance = self.distance().max(1e-6);
        let near = (distance * 0.001) as f32;
        let far = (distance * 100.0) as f32;
        if self.orthographic {
            let h = self.parallel_scale as f32;
            let w = h * aspect;
            Mat4::orthographic_rh_gl(-w, w, -h, h, near, far)
        } else {
            Mat4::perspective_rh_gl((self.view_angle as f32).to_radians(), aspect, near, far)
        }
    }

    /// Combined view-projection matrix
    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: DVec3, b: DVec3) -> bool {
        (a - b).length() < 1e-9
    }

    #[test]
    fn test_pan_moves_both_points() {
        let mut cam = Camera::default();
        cam.pan(1.0, 2.0, 0.0);
        assert!(approx(cam.position, DVec3::new(1.0, 2.0, 1.0)));
        assert!(approx(cam.focal_point, DVec3::new(1.0, 2.0, 0.0)));
    }

    #[test]
    fn test_dolly_keeps_focal_point() {
        let mut cam = Camera {
            position: DVec3::new(0.0, 0.0, 10.0),
            ..Default::default()
        };
        cam.dolly(2.0);
        assert!(approx(cam.position, DVec3::new(0.0, 0.0, 5.0)));
        cam.dolly(0.0);
        assert!(approx(cam.position, DVec3::new(0.0, 0.0, 5.0)));
    }

    #[test]
    fn test_zoom() {
        let mut cam = Camera::default();
        cam.zoom(2.0);
        assert_eq!(cam.view_angle, 15.0);
        cam.orthographic = true;
        cam.zoom(2.0);
        assert_eq!(cam.parallel_scale, 0.5);
    }

    #[test]
    fn test_elevation_raises_camera() {
        let mut cam = Camera::default();
        cam.elevation(90.0);
        assert!(approx(cam.position, DVec3::Y));
        assert!((cam.distance() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_azimuth_keeps_height() {
        let mut cam = Camera::default();
        cam.azimuth(90.0);
        assert!(approx(cam.position, DVec3::X));
        assert!(approx(cam.focal_point, DVec3::ZERO));
    }

    #[test]
    fn test_reset_to_bounds() {
        let mut cam = Camera::default();
        let bounds = Aabb::new(DVec3::new(9.0, -1.0, -1.0), DVec3::new(11.0, 1.0, 1.0));
        cam.reset_to_bounds(&bounds);
        assert!(approx(cam.focal_point, DVec3::new(10.0, 0.0, 0.0)));
        assert!(approx(cam.direction(), DVec3::NEG_Z));
        assert!(cam.distance() > bounds.radius());
        assert_eq!(cam.parallel_scale, bounds.radius());
    }

    #[test]
    fn test_reset_to_empty_bounds() {
        let mut cam = Camera::default();
        cam.reset_to_bounds(&Aabb::EMPTY);
        assert!(approx(cam.focal_point, DVec3::ZERO));
        assert!(cam.distance().is_finite());
    }
}
