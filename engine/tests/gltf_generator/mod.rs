//! Programmatic glTF generation for integration tests.
//!
//! Builds a small skinned arm:
//! - node 0 "Armature" with children Bone0 (1) and ArmMesh (3)
//! - Bone0 -> Bone1 (2), Bone1 one unit up the Y axis
//! - a 4-vertex quad skinned to both bones
//! - animation "bend": Bone0 slides along X and Bone1 turns about Z over 2 seconds
//!
//! The same document can be emitted with a data-URI buffer, an external
//! `.bin`, or as a GLB container.

#![allow(dead_code)]

mod binary_packing;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use glam::{Mat4, Quat, Vec3};
use serde_json::{Value, json};

use binary_packing::BufferBuilder;

pub const NODE_COUNT: usize = 4;
pub const VERTEX_COUNT: usize = 4;
pub const INDEX_COUNT: u32 = 6;
pub const ANIMATION_DURATION: f32 = 2.0;
pub const BONE1_OFFSET: Vec3 = Vec3::new(0.0, 1.0, 0.0);

/// Document JSON (buffer 0 without uri) and its binary payload.
pub fn skinned_arm() -> (Value, Vec<u8>) {
    let mut packer = BufferBuilder::default();

    let positions = packer.push_f32(
        &[
            -0.5, 0.0, 0.0, //
            0.5, 0.0, 0.0, //
            -0.5, 2.0, 0.0, //
            0.5, 2.0, 0.0,
        ],
        "VEC3",
        3,
    );
    let normals = packer.push_f32(&[0.0f32, 0.0, 1.0].repeat(VERTEX_COUNT), "VEC3", 3);
    let joints = packer.push_u8(
        &[
            0, 0, 0, 0, //
            0, 0, 0, 0, //
            1, 0, 0, 0, //
            1, 0, 0, 0,
        ],
        "VEC4",
        4,
    );
    let weights = packer.push_f32(&[1.0f32, 0.0, 0.0, 0.0].repeat(VERTEX_COUNT), "VEC4", 4);
    let indices = packer.push_u16(&[0, 1, 2, 2, 1, 3], "SCALAR", 1);

    let inverse_binds: Vec<f32> = [Mat4::IDENTITY, Mat4::from_translation(-BONE1_OFFSET)]
        .iter()
        .flat_map(|m| m.to_cols_array())
        .collect();
    let inverse_bind_matrices = packer.push_f32(&inverse_binds, "MAT4", 16);

    let times = packer.push_f32(&[0.0, 1.0, ANIMATION_DURATION], "SCALAR", 1);
    let slide = packer.push_f32(
        &[
            0.0, 0.0, 0.0, //
            1.0, 0.0, 0.0, //
            0.0, 0.0, 0.0,
        ],
        "VEC3",
        3,
    );
    let bend: Vec<f32> = [
        Quat::IDENTITY,
        Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
        Quat::IDENTITY,
    ]
    .iter()
    .flat_map(|q| q.to_array())
    .collect();
    let bend = packer.push_f32(&bend, "VEC4", 4);

    let document = json!({
        "asset": {"version": "2.0", "generator": "marionette test generator"},
        "scene": 0,
        "scenes": [{"name": "Arm", "nodes": [0]}],
        "nodes": [
            {"name": "Armature", "children": [1, 3]},
            {"name": "Bone0", "children": [2]},
            {"name": "Bone1", "translation": BONE1_OFFSET.to_array()},
            {"name": "ArmMesh", "mesh": 0, "skin": 0}
        ],
        "meshes": [{
            "name": "Arm",
            "primitives": [{
                "attributes": {
                    "POSITION": positions,
                    "NORMAL": normals,
                    "JOINTS_0": joints,
                    "WEIGHTS_0": weights
                },
                "indices": indices
            }]
        }],
        "skins": [{
            "name": "ArmSkin",
            "joints": [1, 2],
            "inverseBindMatrices": inverse_bind_matrices,
            "skeleton": 1
        }],
        "animations": [{
            "name": "bend",
            "channels": [
                {"sampler": 0, "target": {"node": 1, "path": "translation"}},
                {"sampler": 1, "target": {"node": 2, "path": "rotation"}}
            ],
            "samplers": [
                {"input": times, "output": slide, "interpolation": "LINEAR"},
                {"input": times, "output": bend, "interpolation": "LINEAR"}
            ]
        }],
        "accessors": packer.accessors,
        "bufferViews": packer.buffer_views,
        "buffers": [{"byteLength": packer.data.len()}]
    });

    (document, packer.data)
}

/// glTF JSON with the payload inlined as a base64 data URI.
pub fn with_data_uri(mut document: Value, data: &[u8]) -> Vec<u8> {
    document["buffers"][0]["uri"] = json!(format!(
        "data:application/octet-stream;base64,{}",
        BASE64.encode(data)
    ));
    serde_json::to_vec_pretty(&document).expect("Failed to serialize glTF")
}

/// glTF JSON referencing the payload as an external file.
pub fn with_external_buffer(mut document: Value, uri: &str) -> Vec<u8> {
    document["buffers"][0]["uri"] = json!(uri);
    serde_json::to_vec_pretty(&document).expect("Failed to serialize glTF")
}

pub fn generate_data_uri_gltf() -> Vec<u8> {
    let (document, data) = skinned_arm();
    with_data_uri(document, &data)
}

pub fn generate_glb() -> Vec<u8> {
    let (document, data) = skinned_arm();
    to_glb(&document, Some(&data))
}

const CHUNK_JSON: &[u8; 4] = b"JSON";
const CHUNK_BIN: &[u8; 4] = b"BIN\0";

/// GLB container holding `document`, plus a BIN chunk when `payload` is
/// given. Buffer 0 of the document must then have no uri.
pub fn to_glb(document: &Value, payload: Option<&[u8]>) -> Vec<u8> {
    let json = serde_json::to_vec(document).expect("Failed to serialize glTF");

    let mut chunks = Vec::new();
    push_chunk(&mut chunks, CHUNK_JSON, &json, b' ');
    if let Some(payload) = payload {
        push_chunk(&mut chunks, CHUNK_BIN, payload, 0);
    }

    let mut glb = Vec::with_capacity(12 + chunks.len());
    glb.extend_from_slice(b"glTF");
    glb.extend_from_slice(&2u32.to_le_bytes());
    glb.extend_from_slice(&((12 + chunks.len()) as u32).to_le_bytes());
    glb.append(&mut chunks);
    glb
}

/// Append a chunk header and body, padded to 4 bytes with `fill`.
fn push_chunk(out: &mut Vec<u8>, kind: &[u8; 4], body: &[u8], fill: u8) {
    let padded = body.len().next_multiple_of(4);
    out.extend_from_slice(&(padded as u32).to_le_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(body);
    out.resize(out.len() + padded - body.len(), fill);
}
