//! Asynchronous asset loading
//!
//! Imports run on the blocking pool of a tokio runtime owned by
//! [`AssetLoader`]. Each request yields an [`AssetSlot`] that the tick loop
//! polls. Backend upload happens inside [`AssetSlot::poll`] on the calling
//! thread, since backends are not required to be `Send`.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

use crate::asset::{Asset, Placement};
use crate::backend::{DrawSink, RenderBackend};
use crate::config::{AnimationConfig, Config};
use crate::error::{ImportError, ImportResult};
use crate::import::{ImportedScene, Importer};

type PendingImport = oneshot::Receiver<ImportResult<ImportedScene>>;

/// Loading state of one requested asset.
#[derive(Debug)]
pub enum SlotState {
    /// Import still running
    Loading(PendingImport),
    /// Uploaded and ticking
    Ready(Box<Asset>),
    /// Import failed; the slot never becomes ready
    Failed(ImportError),
}

/// Tick-loop handle of a requested asset. Dropping it abandons the import.
#[derive(Debug)]
pub struct AssetSlot {
    label: String,
    state: SlotState,
    animation: AnimationConfig,
    placement: Placement,
}

impl AssetSlot {
    fn loading(
        label: String,
        receiver: PendingImport,
        animation: AnimationConfig,
        placement: Placement,
    ) -> Self {
        Self {
            label,
            state: SlotState::Loading(receiver),
            animation,
            placement,
        }
    }

    /// Wrap an already imported scene, uploading it immediately.
    pub fn from_scene(
        label: impl Into<String>,
        scene: ImportedScene,
        backend: &mut dyn RenderBackend,
        config: &Config,
    ) -> Self {
        let label = label.into();
        let placement = Placement::from(&config.placement);
        let asset = Asset::new(label.clone(), scene, backend, &config.animation, placement);
        Self {
            label,
            state: SlotState::Ready(Box::new(asset)),
            animation: config.animation.clone(),
            placement,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn state(&self) -> &SlotState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, SlotState::Ready(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.state, SlotState::Failed(_))
    }

    pub fn asset(&self) -> Option<&Asset> {
        match &self.state {
            SlotState::Ready(asset) => Some(&**asset),
            _ => None,
        }
    }

    pub fn asset_mut(&mut self) -> Option<&mut Asset> {
        match &mut self.state {
            SlotState::Ready(asset) => Some(&mut **asset),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ImportError> {
        match &self.state {
            SlotState::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Move a finished import into `Ready` (uploading through `backend`) or
    /// `Failed`. Returns whether the slot is ready.
    pub fn poll(&mut self, backend: &mut dyn RenderBackend) -> bool {
        let receiver = match &mut self.state {
            SlotState::Loading(receiver) => receiver,
            SlotState::Ready(_) => return true,
            SlotState::Failed(_) => return false,
        };

        let result = match receiver.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return false,
            Err(TryRecvError::Closed) => Err(ImportError::Io {
                path: PathBuf::from(&self.label),
                source: std::io::Error::other("import task ended without a result"),
            }),
        };

        self.state = match result {
            Ok(scene) => {
                let asset = Asset::new(
                    self.label.clone(),
                    scene,
                    backend,
                    &self.animation,
                    self.placement,
                );
                tracing::debug!("Asset '{}' ready", self.label);
                SlotState::Ready(Box::new(asset))
            }
            Err(err) => {
                tracing::error!("Failed to import '{}': {}", self.label, err);
                SlotState::Failed(err)
            }
        };
        self.is_ready()
    }

    /// Run one frame if the asset is ready; a no-op otherwise.
    pub fn tick(&mut self, delta_ms: f32, sink: &mut dyn DrawSink) {
        if let Some(asset) = self.asset_mut() {
            asset.tick(delta_ms, sink);
        }
    }
}

/// Runs imports off the tick thread.
pub struct AssetLoader {
    runtime: tokio::runtime::Runtime,
    importer: Arc<Importer>,
    config: Config,
}

impl AssetLoader {
    pub fn new(config: Config) -> std::io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("marionette-import")
            .enable_all()
            .build()?;
        Ok(Self {
            runtime,
            importer: Arc::new(Importer::new(config.import.clone())),
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Start importing `path`. The returned slot becomes ready once polled
    /// after the import finishes.
    pub fn request(&self, path: impl Into<PathBuf>) -> AssetSlot {
        let path = path.into();
        let label = path.display().to_string();
        let (sender, receiver) = oneshot::channel();
        let importer = Arc::clone(&self.importer);

        self.runtime.spawn_blocking(move || {
            let result = importer.import_path(&path);
            if sender.send(result).is_err() {
                tracing::debug!("Import of {:?} finished after its slot was dropped", path);
            }
        });

        AssetSlot::loading(
            label,
            receiver,
            self.config.animation.clone(),
            Placement::from(&self.config.placement),
        )
    }
}

impl std::fmt::Debug for AssetLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetLoader")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
