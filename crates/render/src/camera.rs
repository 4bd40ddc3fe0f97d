//! Game camera: fixed eye position, orientation eased from the pad axes.

use glam::{Mat4, Vec3};

/// Camera with a fixed base position whose look direction follows the pad.
///
/// Orientation is a pure function of the two pad axes, recomputed every tick;
/// no camera state persists between frames.
pub struct GameCamera {
    /// Eye position (world space).
    pub position: Vec3,
    /// Vertical FOV (rad).
    pub fov_y: f32,
    /// Near clipping plane.
    pub near: f32,
    /// Far clipping plane.
    pub far: f32,
}

impl GameCamera {
    pub fn new() -> Self {
        Self {
            position: Vec3::new(0.0, 2.0, -20.0),
            fov_y: 80.0f32.to_radians(),
            near: 0.1,
            far: 350.0,
        }
    }

    /// Horizontal look angle (rad): logistic curve over pad X, level at the
    /// pad-center position.
    pub fn look_rotation(pad_x: f32) -> f32 {
        -0.6 / (1.0 + (-5.0 * (pad_x - 0.5)).exp()) + 0.3
    }

    /// Vertical tilt (rad): quadratic falloff over pad Z.
    pub fn tilt(pad_z: f32) -> f32 {
        0.3 + 0.2 * -(pad_z * pad_z)
    }

    /// View matrix (world → camera) for the given pad axes.
    pub fn view_matrix(&self, pad_x: f32, pad_z: f32) -> Mat4 {
        Mat4::from_rotation_x(Self::tilt(pad_z))
            * Mat4::from_rotation_y(Self::look_rotation(pad_x))
            * Mat4::from_translation(-self.position)
    }

    /// Projection matrix.
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, aspect, self.near, self.far)
    }

    /// Combined view-projection matrix.
    pub fn view_projection(&self, aspect: f32, pad_x: f32, pad_z: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix(pad_x, pad_z)
    }
}

impl Default for GameCamera {
    fn default() -> Self {
        Self::new()
    }
}
