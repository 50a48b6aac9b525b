//! glTF document model
//!
//! Serde model of the glTF 2.0 JSON subset the importer consumes, plus GLB
//! container splitting. Unknown fields (materials, cameras, extensions) are
//! ignored.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_repr::Deserialize_repr;

use crate::accessor::{ComponentType, ElementType};
use crate::animation::{Interpolation, Property};
use crate::error::{ImportError, ImportResult};

const GLB_MAGIC: &[u8; 4] = b"glTF";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub scene: Option<usize>,
    #[serde(default)]
    pub scenes: Vec<Scene>,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub meshes: Vec<Mesh>,
    #[serde(default)]
    pub accessors: Vec<Accessor>,
    #[serde(default)]
    pub buffer_views: Vec<BufferView>,
    #[serde(default)]
    pub buffers: Vec<Buffer>,
    #[serde(default)]
    pub skins: Vec<Skin>,
    #[serde(default)]
    pub animations: Vec<Animation>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub nodes: Vec<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Node {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub children: Vec<usize>,
    #[serde(default)]
    pub matrix: Option<[f32; 16]>,
    #[serde(default)]
    pub translation: Option<[f32; 3]>,
    /// Quaternion as [x, y, z, w]
    #[serde(default)]
    pub rotation: Option<[f32; 4]>,
    #[serde(default)]
    pub scale: Option<[f32; 3]>,
    #[serde(default)]
    pub mesh: Option<usize>,
    #[serde(default)]
    pub skin: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Mesh {
    #[serde(default)]
    pub name: Option<String>,
    pub primitives: Vec<Primitive>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Primitive {
    /// Semantic name (`POSITION`, `NORMAL`, ...) to accessor index
    pub attributes: BTreeMap<String, usize>,
    #[serde(default)]
    pub indices: Option<usize>,
    #[serde(default)]
    pub mode: PrimitiveMode,
}

/// Primitive topology (`primitive.mode`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize_repr)]
#[repr(u32)]
pub enum PrimitiveMode {
    Points = 0,
    Lines = 1,
    LineLoop = 2,
    LineStrip = 3,
    #[default]
    Triangles = 4,
    TriangleStrip = 5,
    TriangleFan = 6,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accessor {
    #[serde(default)]
    pub buffer_view: Option<usize>,
    #[serde(default)]
    pub byte_offset: usize,
    pub component_type: ComponentType,
    #[serde(default)]
    pub normalized: bool,
    pub count: usize,
    #[serde(rename = "type")]
    pub element_type: ElementType,
    #[serde(default)]
    pub min: Option<Vec<f32>>,
    #[serde(default)]
    pub max: Option<Vec<f32>>,
    #[serde(default)]
    pub sparse: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferView {
    pub buffer: usize,
    #[serde(default)]
    pub byte_offset: usize,
    pub byte_length: usize,
    #[serde(default)]
    pub byte_stride: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Buffer {
    #[serde(default)]
    pub uri: Option<String>,
    pub byte_length: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skin {
    #[serde(default)]
    pub name: Option<String>,
    pub joints: Vec<usize>,
    #[serde(default)]
    pub inverse_bind_matrices: Option<usize>,
    #[serde(default)]
    pub skeleton: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Animation {
    #[serde(default)]
    pub name: Option<String>,
    pub channels: Vec<Channel>,
    pub samplers: Vec<AnimationSampler>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Channel {
    pub sampler: usize,
    pub target: ChannelTarget,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelTarget {
    #[serde(default)]
    pub node: Option<usize>,
    pub path: Property,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnimationSampler {
    pub input: usize,
    pub output: usize,
    #[serde(default)]
    pub interpolation: Interpolation,
}

/// A parsed document and, for GLB input, its embedded binary chunk.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub document: Document,
    pub binary_chunk: Option<Vec<u8>>,
}

impl Document {
    pub fn from_json(json: &[u8]) -> ImportResult<Self> {
        Ok(serde_json::from_slice(json)?)
    }

    /// Parse either a GLB container or plain glTF JSON, decided by the
    /// leading magic bytes.
    pub fn from_slice(bytes: &[u8]) -> ImportResult<LoadedDocument> {
        if !bytes.starts_with(GLB_MAGIC) {
            return Ok(LoadedDocument {
                document: Self::from_json(bytes)?,
                binary_chunk: None,
            });
        }

        let glb = gltf::Glb::from_slice(bytes)
            .map_err(|err| ImportError::Decode(format!("invalid GLB container: {err}")))?;
        let document = Self::from_json(&glb.json)?;
        Ok(LoadedDocument {
            document,
            binary_chunk: glb.bin.map(|chunk| chunk.into_owned()),
        })
    }

    /// Root node indices of the default scene.
    ///
    /// Uses `scene`, then scene 0. Without scenes every node that is nobody's
    /// child is a root.
    pub fn root_nodes(&self) -> ImportResult<Vec<usize>> {
        if self.scenes.is_empty() {
            if let Some(scene) = self.scene {
                return Err(ImportError::Range(format!(
                    "default scene {scene} set but document has no scenes"
                )));
            }
            let mut has_parent = vec![false; self.nodes.len()];
            for node in &self.nodes {
                for &child in &node.children {
                    if let Some(flag) = has_parent.get_mut(child) {
                        *flag = true;
                    }
                }
            }
            return Ok((0..self.nodes.len()).filter(|&i| !has_parent[i]).collect());
        }

        let index = self.scene.unwrap_or(0);
        let scene = self.scenes.get(index).ok_or_else(|| {
            ImportError::Range(format!(
                "default scene {index} out of bounds ({} scenes)",
                self.scenes.len()
            ))
        })?;
        Ok(scene.nodes.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_minimal_document() {
        let doc = Document::from_json(br#"{"asset":{"version":"2.0"}}"#).unwrap();
        assert!(doc.nodes.is_empty());
        assert!(doc.scene.is_none());
    }

    #[test]
    fn test_parse_defaults() {
        let value = json!({
            "accessors": [{"componentType": 5126, "count": 2, "type": "VEC3"}],
            "meshes": [{"primitives": [{"attributes": {"POSITION": 0}}]}],
            "animations": [{
                "channels": [{"sampler": 0, "target": {"node": 0, "path": "rotation"}}],
                "samplers": [{"input": 0, "output": 0}]
            }]
        });
        let doc: Document = serde_json::from_value(value).unwrap();

        assert_eq!(doc.accessors[0].byte_offset, 0);
        assert!(!doc.accessors[0].normalized);
        assert_eq!(doc.meshes[0].primitives[0].mode, PrimitiveMode::Triangles);
        assert_eq!(
            doc.animations[0].samplers[0].interpolation,
            Interpolation::Linear
        );
        assert_eq!(doc.animations[0].channels[0].target.path, Property::Rotation);
    }

    #[test]
    fn test_unknown_component_type_is_decode_error() {
        let bytes = br#"{"accessors":[{"componentType":1,"count":1,"type":"SCALAR"}]}"#;
        assert!(matches!(
            Document::from_json(bytes),
            Err(ImportError::Decode(_))
        ));
    }

    #[test]
    fn test_truncated_glb_is_decode_error() {
        let result = Document::from_slice(b"glTF\x02\x00\x00\x00");
        assert!(matches!(result, Err(ImportError::Decode(_))));
    }

    #[test]
    fn test_root_nodes_prefers_default_scene() {
        let doc: Document = serde_json::from_value(json!({
            "scene": 1,
            "scenes": [{"nodes": [0]}, {"nodes": [1, 2]}],
            "nodes": [{}, {}, {}]
        }))
        .unwrap();
        assert_eq!(doc.root_nodes().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_root_nodes_without_scenes() {
        let doc: Document = serde_json::from_value(json!({
            "nodes": [{"children": [2]}, {}, {}]
        }))
        .unwrap();
        assert_eq!(doc.root_nodes().unwrap(), vec![0, 1]);
    }
}
