//! BeatBounce core types shared across crates.
//!
//! Provides coordinate conversion between nalgebra (simulation) and glam
//! (scene graph / render), plus the GPU-uploadable vertex type.

use nalgebra as na;

// Re-export key types so downstream crates don't repeat use-declarations
pub use na::{Point3, Vector3};

/// Convert nalgebra Vector3<f64> → glam Vec3.
pub fn vec3_to_glam(v: &Vector3<f64>) -> glam::Vec3 {
    glam::Vec3::new(v.x as f32, v.y as f32, v.z as f32)
}

/// Convert nalgebra Point3<f64> → glam Vec3.
pub fn point_to_glam(p: &Point3<f64>) -> glam::Vec3 {
    glam::Vec3::new(p.x as f32, p.y as f32, p.z as f32)
}

/// Convert glam Vec3 → nalgebra Vector3<f64>.
pub fn glam_to_vec3(v: glam::Vec3) -> Vector3<f64> {
    Vector3::new(v.x as f64, v.y as f64, v.z as f64)
}

/// Convert glam Vec3 → nalgebra Point3<f64>.
pub fn glam_to_point(v: glam::Vec3) -> Point3<f64> {
    Point3::new(v.x as f64, v.y as f64, v.z as f64)
}

/// GPU-uploadable vertex for mesh rendering.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_roundtrip() {
        let v = Vector3::new(1.0, -2.5, 3.25);
        let g = vec3_to_glam(&v);
        let back = glam_to_vec3(g);
        assert!((back - v).norm() < 1e-6);
    }

    #[test]
    fn test_point_to_glam() {
        let p = Point3::new(0.5, 1.5, -4.0);
        let g = point_to_glam(&p);
        assert_eq!(g, glam::Vec3::new(0.5, 1.5, -4.0));
    }
}
