//! Render traversal: depth-first pre-order walk emitting one draw per mesh
//! primitive, in declared child order.

use crate::asset::Asset;
use crate::backend::{DrawCall, DrawSink};

pub fn render(asset: &Asset, sink: &mut dyn DrawSink) {
    // reversed pushes keep declared order on pop
    let mut stack: Vec<usize> = asset.roots().iter().rev().copied().collect();

    while let Some(index) = stack.pop() {
        let Some(node) = asset.nodes().get(index) else {
            continue;
        };

        if let Some(mesh) = node.mesh.and_then(|m| asset.meshes().get(m)) {
            for primitive in &mesh.primitives {
                sink.draw_indexed(&DrawCall {
                    node: index,
                    skin: node.skin,
                    vertex_buffers: &primitive.vertex_buffers,
                    index_buffer: primitive.index_buffer,
                    index_format: primitive.index_format,
                    element_count: primitive.element_count,
                    mode: primitive.mode,
                    transform: node.world_transform,
                });
            }
        }

        stack.extend(node.children.iter().rev());
    }
}

#[cfg(test)]
mod tests {
    use glam::{Mat4, Vec3};

    use crate::accessor::{AccessorData, AccessorValues, ElementType};
    use crate::asset::{Asset, Placement};
    use crate::backend::RecordingBackend;
    use crate::config::AnimationConfig;
    use crate::document::PrimitiveMode;
    use crate::import::ImportedScene;
    use crate::mesh::{IndexStream, MeshData, PrimitiveData, Semantic, VertexStream};
    use crate::node::{Node, NodeTransform, Trs};

    fn triangle() -> PrimitiveData {
        let positions = AccessorValues {
            element_type: ElementType::Vec3,
            count: 3,
            normalized: false,
            data: AccessorData::F32(vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]),
        };
        PrimitiveData {
            mode: PrimitiveMode::Triangles,
            vertex_count: 3,
            streams: vec![VertexStream::new(Semantic::Position, &positions)],
            indices: IndexStream::sequential(3),
        }
    }

    fn mesh_node(mesh: usize, x: f32) -> Node {
        let mut node = Node::new(NodeTransform::Trs(Trs {
            translation: Some(Vec3::new(x, 0.0, 0.0)),
            ..Default::default()
        }));
        node.mesh = Some(mesh);
        node
    }

    #[test]
    fn test_render_depth_first_preorder() {
        // 0 -> [1 -> [3], 2], every node drawing the shared mesh
        let nodes = vec![
            mesh_node(0, 1.0).with_children(vec![1, 2]),
            mesh_node(0, 1.0).with_children(vec![3]),
            mesh_node(0, 5.0),
            mesh_node(0, 1.0),
        ];
        let scene = ImportedScene {
            roots: vec![0],
            nodes,
            meshes: vec![MeshData {
                name: None,
                primitives: vec![triangle(), triangle()],
            }],
            ..Default::default()
        };
        let mut backend = RecordingBackend::new();
        let asset = Asset::new(
            "render",
            scene,
            &mut backend,
            &AnimationConfig::default(),
            Placement::default(),
        );

        asset.render(&mut backend);
        let draws = backend.take_draws();

        let order: Vec<usize> = draws.iter().map(|d| d.node).collect();
        assert_eq!(order, vec![0, 0, 1, 1, 3, 3, 2, 2]);
        assert!(draws.iter().all(|d| d.element_count == 3));
        assert_eq!(draws[4].transform, Mat4::from_translation(Vec3::new(3.0, 0.0, 0.0)));
        assert_eq!(backend.vertex_buffers.len(), 2, "mesh uploaded once");
    }

    #[test]
    fn test_render_deep_chain() {
        const DEPTH: usize = 50_000;
        let mut nodes: Vec<Node> = (1..DEPTH).map(|i| Node::default().with_children(vec![i])).collect();
        nodes.push(mesh_node(0, 0.0));
        let scene = ImportedScene {
            roots: vec![0],
            nodes,
            meshes: vec![MeshData {
                name: None,
                primitives: vec![triangle()],
            }],
            ..Default::default()
        };
        let mut backend = RecordingBackend::new();
        let asset = Asset::new(
            "chain",
            scene,
            &mut backend,
            &AnimationConfig::default(),
            Placement::default(),
        );

        asset.render(&mut backend);

        let draws = backend.take_draws();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].node, DEPTH - 1);
    }

    #[test]
    fn test_render_skips_nodes_without_mesh() {
        let scene = ImportedScene {
            roots: vec![0],
            nodes: vec![Node::default()],
            ..Default::default()
        };
        let mut backend = RecordingBackend::new();
        let asset = Asset::new(
            "empty",
            scene,
            &mut backend,
            &AnimationConfig::default(),
            Placement::default(),
        );

        asset.render(&mut backend);
        assert!(backend.draws.is_empty());
    }
}
