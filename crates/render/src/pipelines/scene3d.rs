//! Blinn-Phong pipeline for 3D geometry nodes.

use glam::{Mat3, Mat4, Vec3};

use crate::context::{RenderContext, DEPTH_FORMAT};
use crate::mesh::vertex_buffer_layout;

/// Number of point lights the shader consumes. Exceeding this when building
/// the scene is a caller error.
pub const MAX_LIGHTS: usize = 3;

/// One point light, world space.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    /// xyz = position, w unused.
    pub position: [f32; 4],
    /// rgb = color, w unused.
    pub color: [f32; 4],
}

/// Per-frame shader inputs (must match FrameUniform in scene3d.wgsl).
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniform {
    pub lights: [LightUniform; MAX_LIGHTS],
    /// xyz = eye position.
    pub camera_pos: [f32; 4],
    /// xyz = ball center, w = ball radius (for the shadow test).
    pub ball_position: [f32; 4],
}

/// Per-node shader inputs (must match NodeUniform in scene3d.wgsl).
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct NodeUniform {
    pub clip: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    /// Normal matrix padded to mat4 for uniform layout.
    pub normal: [[f32; 4]; 4],
    /// Base color (RGB) + alpha.
    pub color: [f32; 4],
}

impl NodeUniform {
    /// Pack a node's derived matrices and base color.
    pub fn new(clip: Mat4, model: Mat4, normal: Mat3, color: [f32; 4]) -> Self {
        Self {
            clip: clip.to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            normal: Mat4::from_mat3(normal).to_cols_array_2d(),
            color,
        }
    }
}

/// Uniform buffer + bind group for one geometry node.
pub struct NodeBind {
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl NodeBind {
    /// Upload this node's matrices and color for the current frame.
    pub fn update(&self, queue: &wgpu::Queue, uniform: &NodeUniform) {
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(uniform));
    }
}

/// The 3D scene pipeline and shared frame resources.
pub struct ScenePipeline {
    pub pipeline: wgpu::RenderPipeline,
    pub frame_buffer: wgpu::Buffer,
    pub frame_bind_group: wgpu::BindGroup,
    node_layout: wgpu::BindGroupLayout,
}

impl ScenePipeline {
    pub fn new(ctx: &RenderContext) -> Self {
        let shader = ctx
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Scene Shader"),
                source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/scene3d.wgsl").into()),
            });

        let frame_buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Frame Uniform"),
            size: std::mem::size_of::<FrameUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let frame_layout = ctx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Frame BGL"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let frame_bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame BG"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let node_layout = ctx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Node BGL"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let pipeline_layout = ctx
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Scene Pipeline Layout"),
                bind_group_layouts: &[&frame_layout, &node_layout],
                push_constant_ranges: &[],
            });

        let pipeline = ctx
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Scene Pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[vertex_buffer_layout()],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: ctx.format(),
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: Some(wgpu::Face::Back),
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });

        Self {
            pipeline,
            frame_buffer,
            frame_bind_group,
            node_layout,
        }
    }

    /// Allocate the uniform buffer + bind group for one node.
    pub fn create_node_bind(&self, device: &wgpu::Device) -> NodeBind {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Node Uniform"),
            size: std::mem::size_of::<NodeUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Node BG"),
            layout: &self.node_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        NodeBind { buffer, bind_group }
    }

    /// Upload this frame's lights, camera, and ball state.
    pub fn update_frame(&self, queue: &wgpu::Queue, uniform: &FrameUniform) {
        queue.write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(uniform));
    }
}

impl FrameUniform {
    pub fn new(camera_pos: Vec3, ball_center: Vec3, ball_radius: f32) -> Self {
        Self {
            lights: [LightUniform::default(); MAX_LIGHTS],
            camera_pos: [camera_pos.x, camera_pos.y, camera_pos.z, 1.0],
            ball_position: [ball_center.x, ball_center.y, ball_center.z, ball_radius],
        }
    }

    pub fn set_light(&mut self, index: usize, position: Vec3, color: Vec3) {
        self.lights[index] = LightUniform {
            position: [position.x, position.y, position.z, 1.0],
            color: [color.x, color.y, color.z, 1.0],
        };
    }
}
