//! Thin wgpu renderer for the BeatBounce scene graph.
//!
//! One pipeline per node class: a Blinn-Phong pass for 3D geometry and an
//! orthographic overlay pass for screen-space text. The renderer reads the
//! matrices the scene graph derives each frame and owns all GPU resources;
//! it writes nothing back into the graph.

pub mod camera;
pub mod context;
pub mod mesh;
pub mod pipelines;
pub mod text;
