//! Scene graph: an arena of transform nodes with per-frame matrix propagation.
//!
//! Nodes are stored in a flat arena and addressed by [`NodeId`]; the root is
//! always index 0 and parents hold their children as ordered id lists. Each
//! frame [`SceneGraph::update_transforms`] recomputes every node's model,
//! clip-space, and normal matrix from the root down. The renderer reads those
//! derived fields and writes nothing back.

use std::fmt;

use glam::{Mat3, Mat4, Vec3};

/// Stable handle to a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

/// Handle to a GPU vertex/index buffer pair owned by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u32);

/// Handle to a GPU texture owned by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// Node role. A closed set; each variant carries only the fields that are
/// meaningful for it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeKind {
    /// Opaque 3D geometry drawn with the scene shader.
    Geometry,
    /// Screen-space geometry drawn with the overlay shader.
    Geometry2d,
    PointLight {
        /// Sequential id assigned at creation, never reused.
        light_id: u32,
        color: Vec3,
        /// World-space position of the node origin, written by
        /// `update_transforms`.
        world_position: Vec3,
    },
    SpotLight {
        light_id: u32,
        color: Vec3,
        world_position: Vec3,
    },
}

/// A single scene-graph node.
///
/// `model`, `clip`, and `normal` are derived caches: recomputed every frame
/// by the traversal, never persisted or read back into the simulation.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub kind: NodeKind,
    pub position: Vec3,
    /// Per-axis angles (radians), applied in y→x→z order.
    pub rotation: Vec3,
    pub scale: Vec3,
    /// Rotation and scale are applied about this point.
    pub reference_point: Vec3,
    pub mesh: Option<MeshHandle>,
    pub index_count: u32,
    pub texture: Option<TextureHandle>,
    /// Local-to-world matrix.
    pub model: Mat4,
    /// View-projection × model.
    pub clip: Mat4,
    /// Inverse-transpose of the model matrix's 3×3 part.
    pub normal: Mat3,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl SceneNode {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            reference_point: Vec3::ZERO,
            mesh: None,
            index_count: 0,
            texture: None,
            model: Mat4::IDENTITY,
            clip: Mat4::IDENTITY,
            normal: Mat3::IDENTITY,
            children: Vec::new(),
            parent: None,
        }
    }

    /// Children in insertion order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Local transform: `T(position) · T(pivot) · Ry · Rx · Rz · S · T(−pivot)`.
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_translation(self.reference_point)
            * Mat4::from_rotation_y(self.rotation.y)
            * Mat4::from_rotation_x(self.rotation.x)
            * Mat4::from_rotation_z(self.rotation.z)
            * Mat4::from_scale(self.scale)
            * Mat4::from_translation(-self.reference_point)
    }
}

impl fmt::Display for SceneNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (light_id, light_pos) = match self.kind {
            NodeKind::PointLight {
                light_id,
                world_position,
                ..
            }
            | NodeKind::SpotLight {
                light_id,
                world_position,
                ..
            } => (light_id as i64, world_position),
            _ => (-1, Vec3::ZERO),
        };
        writeln!(f, "SceneNode {{")?;
        writeln!(f, "    Child count: {}", self.children.len())?;
        writeln!(
            f,
            "    Rotation: ({}, {}, {})",
            self.rotation.x, self.rotation.y, self.rotation.z
        )?;
        writeln!(
            f,
            "    Location: ({}, {}, {})",
            self.position.x, self.position.y, self.position.z
        )?;
        writeln!(
            f,
            "    Reference point: ({}, {}, {})",
            self.reference_point.x, self.reference_point.y, self.reference_point.z
        )?;
        writeln!(f, "    Mesh: {:?}", self.mesh)?;
        writeln!(f, "    Texture: {:?}", self.texture)?;
        writeln!(f, "    Light id: {}", light_id)?;
        writeln!(
            f,
            "    Light position: ({}, {}, {})",
            light_pos.x, light_pos.y, light_pos.z
        )?;
        write!(f, "}}")
    }
}

/// Error from [`SceneGraph::attach`]: the child already has a parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlreadyParented(pub NodeId);

impl fmt::Display for AlreadyParented {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node {:?} already has a parent", self.0)
    }
}

impl std::error::Error for AlreadyParented {}

/// The scene tree. Owns all nodes; the root is created with the graph and
/// lives at index 0.
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
    next_light_id: u32,
    lights: Vec<NodeId>,
}

impl SceneGraph {
    /// Create a graph with a bare geometry root.
    pub fn new() -> Self {
        Self {
            nodes: vec![SceneNode::new(NodeKind::Geometry)],
            next_light_id: 0,
            lights: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Total number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &SceneNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut SceneNode {
        &mut self.nodes[id.0]
    }

    /// Light nodes in creation (light-id) order.
    pub fn lights(&self) -> &[NodeId] {
        &self.lights
    }

    /// Insert an opaque 3D geometry node under `parent`.
    pub fn insert_geometry(&mut self, parent: NodeId) -> NodeId {
        self.insert(SceneNode::new(NodeKind::Geometry), parent)
    }

    /// Insert a screen-space geometry node under `parent`.
    pub fn insert_geometry_2d(&mut self, parent: NodeId) -> NodeId {
        self.insert(SceneNode::new(NodeKind::Geometry2d), parent)
    }

    /// Insert a point light under `parent`. The light id is assigned from a
    /// monotonic counter and never recycled.
    pub fn insert_point_light(&mut self, parent: NodeId, color: Vec3) -> NodeId {
        let kind = NodeKind::PointLight {
            light_id: self.take_light_id(),
            color,
            world_position: Vec3::ZERO,
        };
        let id = self.insert(SceneNode::new(kind), parent);
        self.lights.push(id);
        id
    }

    /// Insert a spot light under `parent`.
    pub fn insert_spot_light(&mut self, parent: NodeId, color: Vec3) -> NodeId {
        let kind = NodeKind::SpotLight {
            light_id: self.take_light_id(),
            color,
            world_position: Vec3::ZERO,
        };
        let id = self.insert(SceneNode::new(kind), parent);
        self.lights.push(id);
        id
    }

    fn take_light_id(&mut self) -> u32 {
        let id = self.next_light_id;
        self.next_light_id += 1;
        id
    }

    fn insert(&mut self, mut node: SceneNode, parent: NodeId) -> NodeId {
        let id = NodeId(self.nodes.len());
        node.parent = Some(parent);
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Append an existing node to `parent`'s child list. Rejected if the node
    /// already has a parent; the tree is strictly single-owner. No cycle
    /// check beyond that is performed.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) -> Result<(), AlreadyParented> {
        if self.nodes[child.0].parent.is_some() {
            return Err(AlreadyParented(child));
        }
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        Ok(())
    }

    /// Recursive subtree size, excluding `id` itself. Diagnostics only.
    pub fn descendant_count(&self, id: NodeId) -> usize {
        let mut count = 0;
        for &child in &self.nodes[id.0].children {
            count += 1 + self.descendant_count(child);
        }
        count
    }

    /// Recompute `model`, `clip`, and `normal` for every node, and the world
    /// position of every light, by a depth-first pre-order walk from the
    /// root. Children are visited in insertion order; each node's result
    /// depends only on its ancestors.
    pub fn update_transforms(&mut self, view_projection: Mat4) {
        let mut stack = vec![(self.root(), Mat4::IDENTITY)];
        while let Some((id, inherited)) = stack.pop() {
            let node = &mut self.nodes[id.0];
            node.model = inherited * node.local_matrix();
            node.clip = view_projection * node.model;
            node.normal = Mat3::from_mat4(node.model).inverse().transpose();

            let model = node.model;
            match &mut node.kind {
                NodeKind::Geometry | NodeKind::Geometry2d => {}
                NodeKind::PointLight { world_position, .. }
                | NodeKind::SpotLight { world_position, .. } => {
                    // A light's position is its local origin in world space.
                    *world_position = model.transform_point3(Vec3::ZERO);
                }
            }

            for &child in node.children.iter().rev() {
                stack.push((child, model));
            }
        }
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_mat4_eq(a: Mat4, b: Mat4) {
        for (x, y) in a
            .to_cols_array()
            .iter()
            .zip(b.to_cols_array().iter())
        {
            assert!((x - y).abs() < 1e-5, "{a:?} != {b:?}");
        }
    }

    #[test]
    fn test_clip_is_vp_times_model() {
        let mut graph = SceneGraph::new();
        let a = graph.insert_geometry(graph.root());
        let b = graph.insert_geometry(a);
        graph.node_mut(a).position = Vec3::new(1.5, -2.0, 3.0);
        graph.node_mut(a).rotation = Vec3::new(0.3, 1.1, -0.4);
        graph.node_mut(b).position = Vec3::new(-4.0, 0.5, 2.0);
        graph.node_mut(b).scale = Vec3::new(2.0, 0.5, 1.5);

        let vp = Mat4::perspective_rh(1.2, 1.6, 0.1, 100.0)
            * Mat4::from_rotation_y(0.7)
            * Mat4::from_translation(Vec3::new(0.0, -2.0, -20.0));
        graph.update_transforms(vp);

        for id in [graph.root(), a, b] {
            let node = graph.node(id);
            assert_mat4_eq(node.clip, vp * node.model);
        }
    }

    #[test]
    fn test_leaf_model_equals_local_under_identity_root() {
        let mut graph = SceneGraph::new();
        let leaf = graph.insert_geometry(graph.root());
        graph.node_mut(leaf).position = Vec3::new(3.0, 4.0, 5.0);
        graph.node_mut(leaf).rotation = Vec3::new(0.2, 0.9, 0.1);
        graph.node_mut(leaf).reference_point = Vec3::new(1.0, 0.0, -1.0);

        graph.update_transforms(Mat4::IDENTITY);

        let node = graph.node(leaf);
        assert_mat4_eq(node.model, node.local_matrix());
    }

    #[test]
    fn test_child_inherits_parent_translation() {
        let mut graph = SceneGraph::new();
        let parent = graph.insert_geometry(graph.root());
        let child = graph.insert_geometry(parent);
        graph.node_mut(parent).position = Vec3::new(10.0, 0.0, 0.0);
        graph.node_mut(child).position = Vec3::new(0.0, 5.0, 0.0);

        graph.update_transforms(Mat4::IDENTITY);

        let world = graph.node(child).model.transform_point3(Vec3::ZERO);
        assert!((world - Vec3::new(10.0, 5.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_light_world_position_is_transformed_origin() {
        let mut graph = SceneGraph::new();
        let pad = graph.insert_geometry(graph.root());
        graph.node_mut(pad).position = Vec3::new(-30.0, -5.0, -40.0);
        let light = graph.insert_point_light(pad, Vec3::new(1.0, 0.0, 0.0));
        graph.node_mut(light).position = Vec3::new(-5.0, 5.0, 20.0);

        graph.update_transforms(Mat4::IDENTITY);

        match graph.node(light).kind {
            NodeKind::PointLight { world_position, .. } => {
                assert!((world_position - Vec3::new(-35.0, 0.0, -20.0)).length() < 1e-5);
            }
            _ => panic!("expected point light"),
        }
    }

    #[test]
    fn test_light_ids_are_monotonic_across_kinds() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let a = graph.insert_point_light(root, Vec3::ONE);
        let b = graph.insert_spot_light(root, Vec3::ONE);
        let c = graph.insert_point_light(root, Vec3::ONE);
        let ids: Vec<u32> = [a, b, c]
            .iter()
            .map(|&id| match graph.node(id).kind {
                NodeKind::PointLight { light_id, .. } | NodeKind::SpotLight { light_id, .. } => {
                    light_id
                }
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(graph.lights(), &[a, b, c]);
    }

    #[test]
    fn test_node_pretty_printer() {
        let mut graph = SceneGraph::new();
        let light = graph.insert_point_light(graph.root(), Vec3::new(1.0, 0.0, 0.0));
        let printed = graph.node(light).to_string();
        assert!(printed.contains("Child count: 0"));
        assert!(printed.contains("Light id: 0"));

        let root = graph.node(graph.root()).to_string();
        assert!(root.contains("Child count: 1"));
        assert!(root.contains("Light id: -1"));
    }

    #[test]
    fn test_attach_rejects_second_parent() {
        let mut graph = SceneGraph::new();
        let a = graph.insert_geometry(graph.root());
        let b = graph.insert_geometry(graph.root());
        assert_eq!(graph.attach(a, b), Err(AlreadyParented(b)));
    }

    #[test]
    fn test_descendant_count() {
        let mut graph = SceneGraph::new();
        let a = graph.insert_geometry(graph.root());
        let _b = graph.insert_geometry(a);
        let _c = graph.insert_geometry(a);
        let _d = graph.insert_geometry(graph.root());
        assert_eq!(graph.descendant_count(graph.root()), 4);
        assert_eq!(graph.descendant_count(a), 2);
    }

    #[test]
    fn test_pivot_rotation_about_reference_point() {
        let mut graph = SceneGraph::new();
        let node = graph.insert_geometry(graph.root());
        {
            let n = graph.node_mut(node);
            n.reference_point = Vec3::new(1.0, 0.0, 0.0);
            n.rotation = Vec3::new(0.0, std::f32::consts::PI, 0.0);
        }
        graph.update_transforms(Mat4::IDENTITY);

        // The pivot itself is a fixed point of the rotation.
        let pivot = graph
            .node(node)
            .model
            .transform_point3(Vec3::new(1.0, 0.0, 0.0));
        assert!((pivot - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-5);
        // The local origin swings to the far side of the pivot.
        let origin = graph.node(node).model.transform_point3(Vec3::ZERO);
        assert!((origin - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-5);
    }
}
