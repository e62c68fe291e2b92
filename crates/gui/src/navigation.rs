//! Keyboard, mouse and touch camera navigation.
//!
//! All motion is scaled by a cached camera distance so that navigation feels
//! the same regardless of model size. With "point up" enabled the camera's
//! view-up is forced back onto the configured up axis after every move, and
//! elevation is refused when it would carry the camera over the pole of that
//! axis (the gimbal limit).

use glam::DVec3;
use shared::UpDirection;

use crate::engine::Camera;
use crate::math::{
    planar_separation, point_distance, rotate_left, rotate_right, signed_height, vec3,
};
use crate::model::Aabb;

/// Distance the view presets place the camera from the focal point
const VIEW_PRESET_DISTANCE: f64 = 1000.0;
/// Degrees of rotation per dragged pixel
const DRAG_DEGREES_PER_PIXEL: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrbitDirection {
    Left,
    Right,
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragButton {
    Primary,
    Middle,
}

/// Point the navigation distance is measured from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistanceReference {
    #[default]
    FocalPoint,
    WorldOrigin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewPreset {
    Front,
    Right,
    Top,
    Isometric,
}

#[derive(Debug, Clone)]
pub struct CameraNavigator {
    distance: f64,
    pub reference: DistanceReference,
    pub point_up: bool,
    pub up: UpDirection,
    pinch_scale: f64,
}

impl Default for CameraNavigator {
    fn default() -> Self {
        Self {
            distance: 0.0,
            reference: DistanceReference::default(),
            point_up: true,
            up: UpDirection::default(),
            pinch_scale: 1.0,
        }
    }
}

impl CameraNavigator {
    pub fn new(up: UpDirection, point_up: bool) -> Self {
        Self {
            up,
            point_up,
            ..Default::default()
        }
    }

    /// Cached distance used to scale every motion
    pub fn distance(&self) -> f64 {
        self.distance
    }

    fn up_vector(&self) -> DVec3 {
        vec3(self.up.vector())
    }

    pub fn update_distance(&mut self, camera: &Camera) {
        let reference = match self.reference {
            DistanceReference::FocalPoint => camera.focal_point,
            DistanceReference::WorldOrigin => DVec3::ZERO,
        };
        self.distance = point_distance(camera.position, reference);
    }

    fn gimbal_limit(&self) -> f64 {
        self.distance / 10.0
    }

    /// Planar separation between camera and focal point, measured
    /// orthogonally to the up axis, and whether the camera is above (`1`)
    /// or below (`-1`) the focal point along that axis.
    pub fn camera_to_focal_distance(&self, camera: &Camera) -> (f64, i8) {
        let up = self.up_vector();
        let separation = planar_separation(camera.position, camera.focal_point, up);
        let sign = if signed_height(camera.position, camera.focal_point, up) < 0.0 {
            -1
        } else {
            1
        };
        (separation, sign)
    }

    /// Whether an elevation step is allowed. `raising` is an upward move in
    /// the camera frame.
    fn may_elevate(&self, camera: &Camera, raising: bool) -> bool {
        let (separation, sign) = self.camera_to_focal_distance(camera);
        let limit = self.gimbal_limit();
        if separation > limit {
            return true;
        }
        // Near the pole only moves heading away from it are allowed
        separation < limit && ((sign == 1 && !raising) || (sign == -1 && raising))
    }

    fn reassert_up(&self, camera: &mut Camera) {
        if self.point_up {
            camera.view_up = self.up_vector();
        }
    }

    /// Change the up axis and re-apply it to the camera
    pub fn set_up(&mut self, up: UpDirection, camera: &mut Camera) {
        self.up = up;
        self.reassert_up(camera);
    }

    pub fn set_point_up(&mut self, point_up: bool, camera: &mut Camera) {
        self.point_up = point_up;
        self.reassert_up(camera);
    }

    /// Translate the camera in its own frame by steps of `distance / 40`
    pub fn pan(&mut self, camera: &mut Camera, dx: f64, dy: f64, dz: f64) {
        let step = self.distance / 40.0;
        camera.pan(dx * step, dy * step, dz * step);
        self.reassert_up(camera);
        self.update_distance(camera);
    }

    /// Swing the camera around the focal point by one step
    pub fn orbit(&mut self, camera: &mut Camera, direction: OrbitDirection) {
        let step = self.distance / 40.0;
        let focal_point = camera.focal_point;

        let moved = match direction {
            OrbitDirection::Left => {
                camera.pan(-step, 0.0, 0.0);
                true
            }
            OrbitDirection::Right => {
                camera.pan(step, 0.0, 0.0);
                true
            }
            OrbitDirection::Up if self.may_elevate(camera, true) => {
                camera.pan(0.0, step, 0.0);
                true
            }
            OrbitDirection::Down if self.may_elevate(camera, false) => {
                camera.pan(0.0, -step, 0.0);
                true
            }
            _ => false,
        };
        if moved {
            camera.focal_point = focal_point;
        }

        self.reassert_up(camera);
        self.update_distance(camera);
    }

    /// Apply a drag delta in pixels
    pub fn drag(
        &mut self,
        camera: &mut Camera,
        button: DragButton,
        delta: [f64; 2],
        viewport: [f64; 2],
    ) {
        let [dx, dy] = delta;
        match button {
            DragButton::Primary => {
                let elevation = dy * DRAG_DEGREES_PER_PIXEL;
                let azimuth = -dx * DRAG_DEGREES_PER_PIXEL;
                if !self.point_up || self.may_elevate(camera, elevation > 0.0) {
                    camera.elevation(elevation);
                }
                camera.azimuth(azimuth);
            }
            DragButton::Middle => {
                let [width, height] = viewport;
                camera.pan(
                    -dx * (0.000_000_1 * width + 0.001 * self.distance),
                    dy * (0.000_000_1 * height + 0.001 * self.distance),
                    0.0,
                );
            }
        }
        self.reassert_up(camera);
        self.update_distance(camera);
    }

    /// Mouse wheel: dolly in perspective, zoom in orthographic
    pub fn scroll(&mut self, camera: &mut Camera, dy: f64) {
        let factor = 1.0 - 0.1 * dy;
        if camera.orthographic {
            camera.zoom(factor);
        } else {
            camera.dolly(factor);
        }
        self.update_distance(camera);
    }

    /// Touchpad pinch. `scale` is cumulative since the gesture started.
    pub fn pinch(&mut self, camera: &mut Camera, scale: f64) {
        camera.dolly(1.0 - self.pinch_scale + scale);
        self.pinch_scale = scale;
        self.update_distance(camera);
    }

    pub fn end_pinch(&mut self) {
        self.pinch_scale = 1.0;
    }

    /// Look at the model from a fixed direction derived from the up axis
    pub fn view(&mut self, camera: &mut Camera, bounds: &Aabb, preset: ViewPreset) {
        let up = self.up_vector();
        let (offset, view_up) = match preset {
            ViewPreset::Front => (rotate_right(up), up),
            ViewPreset::Right => (rotate_left(up), up),
            ViewPreset::Top => (up, rotate_left(up)),
            ViewPreset::Isometric => ((rotate_right(up) + rotate_left(up) + up).normalize(), up),
        };
        camera.position = camera.focal_point + offset * VIEW_PRESET_DISTANCE;
        camera.view_up = view_up;
        camera.reset_to_bounds(bounds);
        self.update_distance(camera);
    }

    pub fn reset_to_bounds(&mut self, camera: &mut Camera, bounds: &Aabb) {
        camera.reset_to_bounds(bounds);
        self.reassert_up(camera);
        self.update_distance(camera);
    }
}
