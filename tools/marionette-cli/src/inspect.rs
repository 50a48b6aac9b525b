//! `marionette inspect`

use anyhow::{Context, Result};
use marionette_engine::{Config, ImportedScene, Importer};
use std::path::Path;

pub fn run(input: &Path, config: &Config) -> Result<()> {
    let scene = Importer::new(config.import.clone())
        .import_path(input)
        .with_context(|| format!("Failed to import {:?}", input))?;

    tracing::info!("Scene in {:?}:", input);
    print_hierarchy(&scene);

    for (i, mesh) in scene.meshes.iter().enumerate() {
        tracing::info!(
            "Mesh [{}] '{}': {} primitives",
            i,
            mesh.name.as_deref().unwrap_or("unnamed"),
            mesh.primitives.len()
        );
        for primitive in &mesh.primitives {
            let semantics: Vec<_> = primitive
                .streams
                .iter()
                .map(|s| s.semantic.attribute_name())
                .collect();
            tracing::info!(
                "  {:?}: {} vertices, {} indices ({:?}), {}",
                primitive.mode,
                primitive.vertex_count,
                primitive.indices.count,
                primitive.indices.format,
                semantics.join(" ")
            );
        }
    }

    for (i, skin) in scene.skins.iter().enumerate() {
        tracing::info!(
            "Skin [{}] '{}': {} joints, bind offsets: {}",
            i,
            skin.display_name(),
            skin.joints.len(),
            skin.has_bind_offsets()
        );
    }

    for (i, animation) in scene.animations.iter().enumerate() {
        let (start, end) = animation.bounds();
        tracing::info!(
            "Animation [{}] '{}': {} channels, {:.3}s - {:.3}s",
            i,
            animation.display_name(),
            animation.channels.len(),
            start,
            end
        );
    }

    Ok(())
}

fn print_hierarchy(scene: &ImportedScene) {
    let mut stack: Vec<(usize, usize)> = scene.roots.iter().rev().map(|&root| (root, 1)).collect();

    while let Some((index, depth)) = stack.pop() {
        let Some(node) = scene.nodes.get(index) else {
            continue;
        };
        let mut extras = String::new();
        if let Some(mesh) = node.mesh {
            extras.push_str(&format!(" mesh={}", mesh));
        }
        if let Some(skin) = node.skin {
            extras.push_str(&format!(" skin={}", skin));
        }
        tracing::info!(
            "{}[{}] '{}'{}",
            "  ".repeat(depth),
            index,
            node.display_name(),
            extras
        );
        stack.extend(node.children.iter().rev().map(|&child| (child, depth + 1)));
    }
}
