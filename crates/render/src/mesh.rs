//! Procedural mesh generation and GPU buffer management.

use beatbounce_core::Vertex;
use glam::Vec3;
use wgpu::util::DeviceExt;

/// A vertex/index buffer pair on the GPU.
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_indices: u32,
}

/// Owns every uploaded mesh; the scene graph refers to them by index.
pub struct MeshRegistry {
    meshes: Vec<GpuMesh>,
}

impl MeshRegistry {
    pub fn new() -> Self {
        Self { meshes: Vec::new() }
    }

    /// Upload a mesh and return its registry index.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        label: &str,
        vertices: &[Vertex],
        indices: &[u32],
    ) -> u32 {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Vertices")),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Indices")),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        self.meshes.push(GpuMesh {
            vertex_buffer,
            index_buffer,
            num_indices: indices.len() as u32,
        });
        (self.meshes.len() - 1) as u32
    }

    pub fn get(&self, handle: u32) -> &GpuMesh {
        &self.meshes[handle as usize]
    }
}

impl Default for MeshRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Vertex buffer layout for [`Vertex`].
pub fn vertex_buffer_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            // normal
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
            // uv
            wgpu::VertexAttribute {
                offset: 24,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x2,
            },
        ],
    }
}

/// Generate a box mesh with the given full dimensions, centered at origin.
/// With `inward` set, normals and winding face the interior (for rooms).
pub fn generate_box(dimensions: Vec3, inward: bool) -> (Vec<Vertex>, Vec<u32>) {
    let hx = dimensions.x / 2.0;
    let hy = dimensions.y / 2.0;
    let hz = dimensions.z / 2.0;

    // (position, normal, uv) per face corner, counter-clockwise from outside.
    let faces: [([f32; 3], [f32; 3]); 24] = [
        // Front face (+Z)
        ([-hx, -hy, hz], [0.0, 0.0, 1.0]),
        ([hx, -hy, hz], [0.0, 0.0, 1.0]),
        ([hx, hy, hz], [0.0, 0.0, 1.0]),
        ([-hx, hy, hz], [0.0, 0.0, 1.0]),
        // Back face (-Z)
        ([hx, -hy, -hz], [0.0, 0.0, -1.0]),
        ([-hx, -hy, -hz], [0.0, 0.0, -1.0]),
        ([-hx, hy, -hz], [0.0, 0.0, -1.0]),
        ([hx, hy, -hz], [0.0, 0.0, -1.0]),
        // Top face (+Y)
        ([-hx, hy, hz], [0.0, 1.0, 0.0]),
        ([hx, hy, hz], [0.0, 1.0, 0.0]),
        ([hx, hy, -hz], [0.0, 1.0, 0.0]),
        ([-hx, hy, -hz], [0.0, 1.0, 0.0]),
        // Bottom face (-Y)
        ([-hx, -hy, -hz], [0.0, -1.0, 0.0]),
        ([hx, -hy, -hz], [0.0, -1.0, 0.0]),
        ([hx, -hy, hz], [0.0, -1.0, 0.0]),
        ([-hx, -hy, hz], [0.0, -1.0, 0.0]),
        // Right face (+X)
        ([hx, -hy, hz], [1.0, 0.0, 0.0]),
        ([hx, -hy, -hz], [1.0, 0.0, 0.0]),
        ([hx, hy, -hz], [1.0, 0.0, 0.0]),
        ([hx, hy, hz], [1.0, 0.0, 0.0]),
        // Left face (-X)
        ([-hx, -hy, -hz], [-1.0, 0.0, 0.0]),
        ([-hx, -hy, hz], [-1.0, 0.0, 0.0]),
        ([-hx, hy, hz], [-1.0, 0.0, 0.0]),
        ([-hx, hy, -hz], [-1.0, 0.0, 0.0]),
    ];

    let face_uvs = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];

    let sign = if inward { -1.0 } else { 1.0 };
    let vertices: Vec<Vertex> = faces
        .iter()
        .enumerate()
        .map(|(i, (p, n))| {
            Vertex::new(
                *p,
                [n[0] * sign, n[1] * sign, n[2] * sign],
                face_uvs[i % 4],
            )
        })
        .collect();

    let mut indices = Vec::with_capacity(36);
    for face in 0..6u32 {
        let base = face * 4;
        if inward {
            indices.extend_from_slice(&[base, base + 2, base + 1, base, base + 3, base + 2]);
        } else {
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
    }

    (vertices, indices)
}

/// Generate a UV sphere of the given radius, `slices` segments around the Y
/// axis and `layers` stacks from pole to pole.
pub fn generate_sphere(radius: f32, slices: u32, layers: u32) -> (Vec<Vertex>, Vec<u32>) {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for layer in 0..=layers {
        let v = layer as f32 / layers as f32;
        let phi = v * std::f32::consts::PI;
        let (sin_phi, cos_phi) = phi.sin_cos();

        for slice in 0..=slices {
            let u = slice as f32 / slices as f32;
            let theta = u * std::f32::consts::TAU;
            let (sin_theta, cos_theta) = theta.sin_cos();

            let dir = [sin_phi * cos_theta, cos_phi, sin_phi * sin_theta];
            vertices.push(Vertex::new(
                [dir[0] * radius, dir[1] * radius, dir[2] * radius],
                dir,
                [u, v],
            ));
        }
    }

    let stride = slices + 1;
    for layer in 0..layers {
        for slice in 0..slices {
            let a = layer * stride + slice;
            let b = a + stride;
            indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
        }
    }

    (vertices, indices)
}
