//! Scene construction: the node tree the simulation drives every frame.

use beatbounce_scene::{NodeId, SceneGraph};
use glam::Vec3;

/// The nodes the simulation writes into each tick.
pub struct SceneHandles {
    pub box_node: NodeId,
    pub pad: NodeId,
    pub ball: NodeId,
    pub text: NodeId,
}

/// Offsets (pad-local) and colors of the three pad lights.
const PAD_LIGHTS: [([f32; 3], [f32; 3]); 3] = [
    ([-5.0, 5.0, 20.0], [1.0, 0.0, 0.0]),
    ([0.0, 5.0, 20.0], [0.0, 1.0, 0.0]),
    ([5.0, 5.0, 20.0], [0.0, 0.0, 1.0]),
];

/// Build the node tree: box, pad, and ball under the root, the 2D status
/// text, and three colored point lights riding on the pad. Mesh handles are
/// bound by the renderer after upload.
pub fn build_scene(graph: &mut SceneGraph) -> SceneHandles {
    let root = graph.root();

    let box_node = graph.insert_geometry(root);
    let pad = graph.insert_geometry(root);
    let ball = graph.insert_geometry(root);
    let text = graph.insert_geometry_2d(root);

    for (offset, color) in PAD_LIGHTS {
        let light = graph.insert_point_light(pad, Vec3::from_array(color));
        graph.node_mut(light).position = Vec3::from_array(offset);
    }

    SceneHandles {
        box_node,
        pad,
        ball,
        text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_has_expected_shape() {
        let mut graph = SceneGraph::new();
        let handles = build_scene(&mut graph);

        // Root + box + pad + ball + text + 3 lights.
        assert_eq!(graph.len(), 8);
        assert_eq!(graph.descendant_count(graph.root()), 7);
        assert_eq!(graph.lights().len(), 3);
        assert_eq!(graph.node(handles.pad).children().len(), 3);
        assert_eq!(graph.node(handles.ball).children().len(), 0);
    }

    #[test]
    fn test_lights_ride_on_the_pad() {
        let mut graph = SceneGraph::new();
        let handles = build_scene(&mut graph);
        for &light in graph.lights() {
            assert_eq!(graph.node(light).parent(), Some(handles.pad));
        }
    }
}
