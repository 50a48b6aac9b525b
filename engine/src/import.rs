//! Scene graph builder
//!
//! Turns a parsed [`Document`] plus its resolved buffers into an
//! [`ImportedScene`]: node hierarchy, CPU mesh streams, skins and
//! animations. Node indices match the document's indices exactly.

use std::path::Path;

use glam::{Mat4, Quat, Vec3};
use hashbrown::HashMap;

use crate::accessor::{ElementType, read_accessor};
use crate::animation::{Animation, Channel, Interpolation, Sampler};
use crate::buffer::BufferResolver;
use crate::config::ImportConfig;
use crate::document::{self, Document};
use crate::error::{ImportError, ImportResult};
use crate::mesh::{IndexStream, MeshData, PrimitiveData, Semantic, VertexStream};
use crate::node::{Node, NodeTransform, Trs};
use crate::skin::Skin;

/// CPU-side result of an import, ready for [`crate::asset::Asset::new`].
#[derive(Debug, Clone, Default)]
pub struct ImportedScene {
    pub roots: Vec<usize>,
    pub nodes: Vec<Node>,
    pub meshes: Vec<MeshData>,
    pub skins: Vec<Skin>,
    pub animations: Vec<Animation>,
}

/// Reads glTF / GLB files into [`ImportedScene`]s.
#[derive(Debug, Clone, Default)]
pub struct Importer {
    config: ImportConfig,
}

impl Importer {
    pub fn new(config: ImportConfig) -> Self {
        Self { config }
    }

    /// Import a `.gltf` or `.glb` file. External buffers resolve against the
    /// configured resource root, or the file's directory.
    pub fn import_path(&self, path: &Path) -> ImportResult<ImportedScene> {
        let bytes = std::fs::read(path).map_err(|source| ImportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let root = match &self.config.resource_root {
            Some(root) => root.clone(),
            None => path.parent().map(Path::to_path_buf).unwrap_or_default(),
        };
        let scene = self.import_slice(&bytes, &root)?;

        tracing::info!(
            "Imported {:?}: {} nodes, {} meshes, {} skins, {} animations",
            path,
            scene.nodes.len(),
            scene.meshes.len(),
            scene.skins.len(),
            scene.animations.len()
        );
        Ok(scene)
    }

    /// Import glTF JSON or GLB bytes.
    pub fn import_slice(&self, bytes: &[u8], resource_root: &Path) -> ImportResult<ImportedScene> {
        let loaded = Document::from_slice(bytes)?;
        let buffers = BufferResolver::new(resource_root)
            .allow_external_paths(self.config.allow_external_paths)
            .with_binary_chunk(loaded.binary_chunk.as_deref())
            .resolve_all(&loaded.document.buffers)?;
        build(&loaded.document, &buffers)
    }
}

/// Build the scene from a document and its resolved buffers.
pub fn build(document: &Document, buffers: &[Vec<u8>]) -> ImportResult<ImportedScene> {
    validate_hierarchy(document)?;

    let roots = document.root_nodes()?;
    for &root in &roots {
        check_index("scene root node", root, document.nodes.len())?;
    }

    let nodes = document
        .nodes
        .iter()
        .enumerate()
        .map(|(i, node)| build_node(document, i, node))
        .collect::<ImportResult<Vec<_>>>()?;

    let meshes = document
        .meshes
        .iter()
        .enumerate()
        .map(|(i, mesh)| build_mesh(document, buffers, i, mesh))
        .collect::<ImportResult<Vec<_>>>()?;

    let skins = document
        .skins
        .iter()
        .enumerate()
        .map(|(i, skin)| build_skin(document, buffers, i, skin))
        .collect::<ImportResult<Vec<_>>>()?;

    let animations = document
        .animations
        .iter()
        .enumerate()
        .map(|(i, animation)| build_animation(document, buffers, i, animation))
        .collect::<ImportResult<Vec<_>>>()?;

    Ok(ImportedScene {
        roots,
        nodes,
        meshes,
        skins,
        animations,
    })
}

fn check_index(what: &str, index: usize, len: usize) -> ImportResult<()> {
    if index >= len {
        return Err(ImportError::Range(format!(
            "{what} {index} out of bounds ({len} available)"
        )));
    }
    Ok(())
}

/// Every child index is valid, no node has two parents, and the graph has
/// no cycles.
fn validate_hierarchy(document: &Document) -> ImportResult<()> {
    let count = document.nodes.len();
    let mut parents: HashMap<usize, usize> = HashMap::with_capacity(count);

    for (parent, node) in document.nodes.iter().enumerate() {
        for &child in &node.children {
            check_index("child node", child, count)?;
            if let Some(previous) = parents.insert(child, parent) {
                return Err(ImportError::Schema(format!(
                    "node {child} has two parents ({previous} and {parent})"
                )));
            }
        }
    }

    // With at most one parent each, any node unreachable from a parentless
    // node sits on a cycle.
    let mut reached = vec![false; count];
    let mut stack: Vec<usize> = (0..count).filter(|i| !parents.contains_key(i)).collect();
    while let Some(index) = stack.pop() {
        reached[index] = true;
        stack.extend(&document.nodes[index].children);
    }
    if let Some(index) = reached.iter().position(|&r| !r) {
        return Err(ImportError::Schema(format!(
            "node {index} is part of a cycle in the node hierarchy"
        )));
    }
    Ok(())
}

fn build_node(document: &Document, index: usize, node: &document::Node) -> ImportResult<Node> {
    if let Some(mesh) = node.mesh {
        check_index("mesh", mesh, document.meshes.len())
            .map_err(|e| context(e, &format!("node {index}")))?;
    }
    if let Some(skin) = node.skin {
        check_index("skin", skin, document.skins.len())
            .map_err(|e| context(e, &format!("node {index}")))?;
    }

    let transform = match node.matrix {
        Some(matrix) => NodeTransform::Matrix(Mat4::from_cols_array(&matrix)),
        None => NodeTransform::Trs(Trs {
            translation: node.translation.map(Vec3::from_array),
            rotation: node.rotation.map(Quat::from_array),
            scale: node.scale.map(Vec3::from_array),
        }),
    };

    let mut built = Node::new(transform).with_children(node.children.clone());
    built.name = node.name.clone();
    built.mesh = node.mesh;
    built.skin = node.skin;
    Ok(built)
}

fn context(err: ImportError, what: &str) -> ImportError {
    match err {
        ImportError::Range(msg) => ImportError::Range(format!("{what}: {msg}")),
        ImportError::Schema(msg) => ImportError::Schema(format!("{what}: {msg}")),
        other => other,
    }
}

fn build_mesh(
    document: &Document,
    buffers: &[Vec<u8>],
    index: usize,
    mesh: &document::Mesh,
) -> ImportResult<MeshData> {
    let primitives = mesh
        .primitives
        .iter()
        .enumerate()
        .map(|(p, primitive)| {
            build_primitive(document, buffers, primitive)
                .map_err(|e| context(e, &format!("mesh {index} primitive {p}")))
        })
        .collect::<ImportResult<Vec<_>>>()?;

    Ok(MeshData {
        name: mesh.name.clone(),
        primitives,
    })
}

fn build_primitive(
    document: &Document,
    buffers: &[Vec<u8>],
    primitive: &document::Primitive,
) -> ImportResult<PrimitiveData> {
    if !primitive.attributes.contains_key(Semantic::Position.attribute_name()) {
        return Err(ImportError::Schema("missing POSITION attribute".to_string()));
    }

    for name in primitive.attributes.keys() {
        if Semantic::from_attribute_name(name).is_none() {
            tracing::debug!("Ignoring vertex attribute {}", name);
        }
    }

    let mut streams = Vec::new();
    let mut vertex_count = 0;
    for semantic in Semantic::ALL {
        let Some(&accessor) = primitive.attributes.get(semantic.attribute_name()) else {
            continue;
        };
        let values = read_accessor(document, buffers, accessor)?;
        if semantic == Semantic::Position {
            vertex_count = values.count;
        } else if values.count != vertex_count {
            tracing::warn!(
                "{} has {} elements but POSITION has {}",
                semantic.attribute_name(),
                values.count,
                vertex_count
            );
        }
        streams.push(VertexStream::new(semantic, &values));
    }

    let has_joints = primitive.attributes.contains_key("JOINTS_0");
    let has_weights = primitive.attributes.contains_key("WEIGHTS_0");
    if has_joints != has_weights {
        tracing::warn!(
            "Primitive has partial skinning data (JOINTS_0 and WEIGHTS_0 must appear together)"
        );
    }

    let indices = match primitive.indices {
        Some(accessor) => {
            let values = read_accessor(document, buffers, accessor)?;
            if values.element_type != ElementType::Scalar {
                return Err(ImportError::Schema(format!(
                    "index accessor {accessor} must be SCALAR, found {:?}",
                    values.element_type
                )));
            }
            IndexStream::from_accessor(&values.data, vertex_count)?
        }
        None => IndexStream::sequential(vertex_count),
    };

    Ok(PrimitiveData {
        mode: primitive.mode,
        vertex_count,
        streams,
        indices,
    })
}

fn build_skin(
    document: &Document,
    buffers: &[Vec<u8>],
    index: usize,
    skin: &document::Skin,
) -> ImportResult<Skin> {
    let what = format!("skin {index}");
    for &joint in &skin.joints {
        check_index("joint node", joint, document.nodes.len()).map_err(|e| context(e, &what))?;
    }
    if let Some(skeleton) = skin.skeleton {
        check_index("skeleton node", skeleton, document.nodes.len())
            .map_err(|e| context(e, &what))?;
    }

    let inverse_bind_matrices = match skin.inverse_bind_matrices {
        Some(accessor) => {
            let values = read_accessor(document, buffers, accessor).map_err(|e| context(e, &what))?;
            if values.element_type != ElementType::Mat4 {
                return Err(ImportError::Schema(format!(
                    "{what}: inverse bind matrices must be MAT4, found {:?}",
                    values.element_type
                )));
            }
            let mut matrices = values.data.to_mat4s().map_err(|e| context(e, &what))?;
            if matrices.len() < skin.joints.len() {
                return Err(ImportError::Schema(format!(
                    "{what}: {} inverse bind matrices for {} joints",
                    matrices.len(),
                    skin.joints.len()
                )));
            }
            matrices.truncate(skin.joints.len());
            matrices
        }
        None => vec![Mat4::IDENTITY; skin.joints.len()],
    };

    Ok(Skin::new(
        skin.name.clone(),
        skin.joints.clone(),
        inverse_bind_matrices,
        skin.skeleton,
    ))
}

fn build_animation(
    document: &Document,
    buffers: &[Vec<u8>],
    index: usize,
    animation: &document::Animation,
) -> ImportResult<Animation> {
    let what = format!("animation {index}");

    let samplers = animation
        .samplers
        .iter()
        .enumerate()
        .map(|(s, sampler)| {
            build_sampler(document, buffers, sampler)
                .map_err(|e| context(e, &format!("{what} sampler {s}")))
        })
        .collect::<ImportResult<Vec<_>>>()?;

    let mut channels = Vec::with_capacity(animation.channels.len());
    for (c, channel) in animation.channels.iter().enumerate() {
        let Some(target) = channel.target.node else {
            tracing::warn!("{} channel {} has no target node, skipping", what, c);
            continue;
        };
        check_index("channel target node", target, document.nodes.len())
            .map_err(|e| context(e, &what))?;
        // a missing sampler or short output is reported when sampled
        if let (Some(sampler), Some(arity)) =
            (samplers.get(channel.sampler), channel.target.path.arity())
        {
            let per_key = match sampler.interpolation {
                Interpolation::CubicSpline => arity * 3,
                _ => arity,
            };
            let expected = sampler.input.len() * per_key;
            if sampler.output.len() != expected {
                tracing::warn!(
                    "{} channel {}: {} output values for {} keyframes (expected {})",
                    what,
                    c,
                    sampler.output.len(),
                    sampler.input.len(),
                    expected
                );
            }
        }
        channels.push(Channel {
            target,
            property: channel.target.path,
            sampler: channel.sampler,
        });
    }

    Ok(Animation {
        name: animation.name.clone(),
        channels,
        samplers,
    })
}

fn build_sampler(
    document: &Document,
    buffers: &[Vec<u8>],
    sampler: &document::AnimationSampler,
) -> ImportResult<Sampler> {
    let input = read_accessor(document, buffers, sampler.input)?;
    if input.element_type != ElementType::Scalar {
        return Err(ImportError::Schema(format!(
            "input accessor {} must be SCALAR, found {:?}",
            sampler.input, input.element_type
        )));
    }
    let output = read_accessor(document, buffers, sampler.output)?;

    let mut built = Sampler::new(input.to_f32(), output.to_f32(), sampler.interpolation);

    // accessor bounds win over the keyframe data when present
    let bounds = &document.accessors[sampler.input];
    if let Some(&min) = bounds.min.as_ref().and_then(|m| m.first()) {
        built.min_time = min;
    }
    if let Some(&max) = bounds.max.as_ref().and_then(|m| m.first()) {
        built.max_time = max;
    }
    Ok(built)
}
