//! `marionette play`

use anyhow::{Context, Result};
use marionette_engine::{AssetLoader, Config, RecordingBackend};
use std::path::Path;
use std::time::Duration;

pub fn run(input: &Path, config: Config, frames: u32, fps: f32) -> Result<()> {
    let loader = AssetLoader::new(config).context("Failed to start import runtime")?;
    let mut backend = RecordingBackend::new();

    let mut slot = loader.request(input);
    while !slot.poll(&mut backend) {
        if let Some(err) = slot.error() {
            anyhow::bail!("Failed to import {:?}: {}", input, err);
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    tracing::info!(
        "Loaded {:?}: {} vertex buffers, {} index buffers (joint formula: {})",
        input,
        backend.vertex_buffers.len(),
        backend.index_buffers.len(),
        loader.config().animation.joint_matrix_formula
    );

    let delta_ms = 1000.0 / fps;
    let mut total_draws = 0;
    for frame in 0..frames {
        slot.tick(delta_ms, &mut backend);
        let draws = backend.take_draws();
        tracing::debug!("Frame {}: {} draws", frame, draws.len());
        total_draws += draws.len();
    }

    let Some(asset) = slot.asset() else {
        anyhow::bail!("Asset {:?} is not ready", input);
    };
    tracing::info!(
        "Ticked {} frames ({} draws), clock at {:.3}s{}",
        frames,
        total_draws,
        asset.clock().time(),
        if asset.is_animating() { "" } else { " (stopped)" }
    );

    for (skin, matrices) in asset.skins().iter().zip(asset.joint_matrices()) {
        tracing::info!("Skin '{}':", skin.display_name());
        for (&joint, matrix) in skin.joints.iter().zip(matrices) {
            let name = asset
                .nodes()
                .get(joint)
                .map_or("unnamed", |node| node.display_name());
            let t = matrix.w_axis;
            tracing::info!("  '{}': ({:.3}, {:.3}, {:.3})", name, t.x, t.y, t.z);
        }
    }

    Ok(())
}
