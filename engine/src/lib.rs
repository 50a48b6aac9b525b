//! marionette-engine
//!
//! glTF 2.0 import, scene graph transform propagation and skeletal animation.
//! Rendering is left to a [`RenderBackend`] / [`DrawSink`] implementation.
//!
//! Per frame, for each ready asset:
//! 1. advance the clock and resample animation channels
//! 2. propagate transforms from the roots
//! 3. refresh joint matrices
//! 4. submit draws

pub mod accessor;
pub mod animation;
pub mod asset;
pub mod backend;
pub mod buffer;
pub mod config;
pub mod document;
pub mod error;
pub mod import;
pub mod loader;
pub mod mesh;
pub mod node;
pub mod render;
pub mod scene;
pub mod skin;

pub use asset::{Asset, Placement};
pub use backend::{
    DrawCall, DrawSink, IndexBufferHandle, IndexFormat, RecordedDraw, RecordingBackend,
    RenderBackend, VertexBufferHandle, VertexLayout,
};
pub use config::Config;
pub use error::{ConfigError, FrameError, ImportError, ImportResult};
pub use import::{ImportedScene, Importer};
pub use loader::{AssetLoader, AssetSlot, SlotState};
pub use scene::Scene;
pub use skin::JointMatrixFormula;
