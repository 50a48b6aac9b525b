//! End-to-end tests for the `marionette` binary.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde_json::json;
use tempfile::tempdir;

/// Write a one-triangle glTF with an external buffer and a translation
/// animation on its only node.
fn write_triangle_gltf(dir: &Path) -> PathBuf {
    let mut data: Vec<u8> = Vec::new();
    let floats = |values: &[f32]| -> Vec<u8> { values.iter().flat_map(|v| v.to_le_bytes()).collect() };
    data.extend(floats(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0])); // 0..36
    data.extend(floats(&[0.0, 1.0])); // 36..44
    data.extend(floats(&[0.0, 0.0, 0.0, 0.0, 2.0, 0.0])); // 44..68

    let document = json!({
        "asset": {"version": "2.0"},
        "scenes": [{"nodes": [0]}],
        "nodes": [{"name": "Triangle", "mesh": 0}],
        "meshes": [{"primitives": [{"attributes": {"POSITION": 0}}]}],
        "animations": [{
            "name": "rise",
            "channels": [{"sampler": 0, "target": {"node": 0, "path": "translation"}}],
            "samplers": [{"input": 1, "output": 2}]
        }],
        "accessors": [
            {"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3"},
            {"bufferView": 1, "componentType": 5126, "count": 2, "type": "SCALAR", "min": [0.0], "max": [1.0]},
            {"bufferView": 2, "componentType": 5126, "count": 2, "type": "VEC3"}
        ],
        "bufferViews": [
            {"buffer": 0, "byteOffset": 0, "byteLength": 36},
            {"buffer": 0, "byteOffset": 36, "byteLength": 8},
            {"buffer": 0, "byteOffset": 44, "byteLength": 24}
        ],
        "buffers": [{"uri": "triangle.bin", "byteLength": data.len()}]
    });

    std::fs::write(dir.join("triangle.bin"), &data).expect("Failed to write buffer");
    let path = dir.join("triangle.gltf");
    std::fs::write(
        &path,
        serde_json::to_vec_pretty(&document).expect("Failed to serialize glTF"),
    )
    .expect("Failed to write glTF");
    path
}

fn marionette(args: &[&str]) -> std::process::ExitStatus {
    Command::new(env!("CARGO_BIN_EXE_marionette"))
        .args(args)
        .status()
        .expect("Failed to run marionette")
}

#[test]
fn test_cli_inspect() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = write_triangle_gltf(dir.path());

    let status = marionette(&["inspect", path.to_str().unwrap()]);
    assert!(status.success(), "marionette inspect failed");
}

#[test]
fn test_cli_play() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = write_triangle_gltf(dir.path());

    let status = marionette(&[
        "play",
        path.to_str().unwrap(),
        "--frames",
        "30",
        "--fps",
        "30",
        "--formula",
        "world-inverse-bind",
    ]);
    assert!(status.success(), "marionette play failed");
}

#[test]
fn test_cli_play_with_config() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = write_triangle_gltf(dir.path());
    let config_path = dir.path().join("marionette.toml");
    std::fs::write(
        &config_path,
        "[animation]\ntime_scale = 2.0\n\n[placement]\nlocation = [0.0, 0.0, -5.0]\n",
    )
    .expect("Failed to write config");

    let status = marionette(&[
        "play",
        path.to_str().unwrap(),
        "--config",
        config_path.to_str().unwrap(),
    ]);
    assert!(status.success(), "marionette play --config failed");
}

#[test]
fn test_cli_missing_file_fails() {
    let dir = tempdir().expect("Failed to create temp dir");
    let missing = dir.path().join("missing.glb");

    assert!(!marionette(&["inspect", missing.to_str().unwrap()]).success());
    assert!(!marionette(&["play", missing.to_str().unwrap(), "--frames", "1"]).success());
}

#[test]
fn test_cli_rejects_unknown_formula() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = write_triangle_gltf(dir.path());

    let status = marionette(&["play", path.to_str().unwrap(), "--formula", "sideways"]);
    assert!(!status.success());
}
