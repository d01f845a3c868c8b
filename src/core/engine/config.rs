//! Run configuration and builder.

use super::executor::Engine;
use crate::core::classifier::StructureModel;
use crate::core::hasher::{ContentHasher, Sha256Hasher};
use crate::core::progress::{InMemoryProgressStore, JsonProgressStore, ProgressStore};
use crate::core::scanner::ScanConfig;
use crate::core::transform::{ContentTransform, ImageRecompressor, NoTransform, RecompressConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How destination folders are derived
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    /// `destination/<category>/<file name>`
    #[default]
    Categorized,
    /// `destination/<path relative to its source>`
    Mirrored,
}

/// What happens to the source after a successful write
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationMode {
    /// Leave the source in place
    #[default]
    Copy,
    /// Remove the source once the destination is verified
    Move,
}

/// Everything a run needs, fixed when the engine is built
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    /// Source roots, visited in this order
    pub sources: Vec<PathBuf>,
    pub destination: PathBuf,
    /// Routes files by name instead of the built-in table
    pub structure: Option<StructureModel>,
    /// Continue from the saved progress record
    pub resume: bool,
    pub layout: LayoutMode,
    pub operation: OperationMode,
    pub scan: ScanConfig,
    /// Image recompression settings; `None` copies images verbatim
    pub recompress: Option<RecompressConfig>,
}

/// Builder for an [`Engine`]
pub struct EngineBuilder {
    config: RunConfig,
    hasher: Option<Box<dyn ContentHasher>>,
    transform: Option<Box<dyn ContentTransform>>,
    store: Option<Box<dyn ProgressStore>>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            config: RunConfig {
                recompress: Some(RecompressConfig::default()),
                ..RunConfig::default()
            },
            hasher: None,
            transform: None,
            store: None,
        }
    }

    /// Replace the source set
    pub fn sources(mut self, sources: Vec<PathBuf>) -> Self {
        self.config.sources = sources;
        self
    }

    /// Append one source root
    pub fn source(mut self, source: impl Into<PathBuf>) -> Self {
        self.config.sources.push(source.into());
        self
    }

    pub fn destination(mut self, destination: impl Into<PathBuf>) -> Self {
        self.config.destination = destination.into();
        self
    }

    pub fn structure(mut self, model: StructureModel) -> Self {
        self.config.structure = Some(model);
        self
    }

    pub fn resume(mut self, resume: bool) -> Self {
        self.config.resume = resume;
        self
    }

    pub fn layout(mut self, layout: LayoutMode) -> Self {
        self.config.layout = layout;
        self
    }

    pub fn operation(mut self, operation: OperationMode) -> Self {
        self.config.operation = operation;
        self
    }

    pub fn scan_config(mut self, scan: ScanConfig) -> Self {
        self.config.scan = scan;
        self
    }

    /// Include hidden files
    pub fn include_hidden(mut self, include: bool) -> Self {
        self.config.scan.include_hidden = include;
        self
    }

    pub fn max_depth(mut self, depth: Option<usize>) -> Self {
        self.config.scan.max_depth = depth;
        self
    }

    /// Recompress images with these settings
    pub fn recompress(mut self, settings: RecompressConfig) -> Self {
        self.config.recompress = Some(settings);
        self
    }

    /// Copy images byte for byte
    pub fn no_recompress(mut self) -> Self {
        self.config.recompress = None;
        self
    }

    /// Use a custom content transform instead of the recompressor
    pub fn transform(mut self, transform: Box<dyn ContentTransform>) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn hasher(mut self, hasher: Box<dyn ContentHasher>) -> Self {
        self.hasher = Some(hasher);
        self
    }

    /// Set the progress store backend
    pub fn progress_store(mut self, store: Box<dyn ProgressStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Persist progress as JSON at this path
    pub fn progress_file(self, path: impl Into<PathBuf>) -> Self {
        self.progress_store(Box::new(JsonProgressStore::open(path)))
    }

    /// Build the engine
    pub fn build(self) -> Engine {
        let transform: Box<dyn ContentTransform> = match (self.transform, self.config.recompress) {
            (Some(custom), _) => custom,
            (None, Some(settings)) => Box::new(ImageRecompressor::new(settings)),
            (None, None) => Box::new(NoTransform),
        };

        Engine::new(
            self.config,
            self.hasher.unwrap_or_else(|| Box::new(Sha256Hasher::new())),
            transform,
            self.store
                .unwrap_or_else(|| Box::new(InMemoryProgressStore::new())),
        )
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
