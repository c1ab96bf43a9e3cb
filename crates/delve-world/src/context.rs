//! World session context and settings.

use std::path::PathBuf;
use std::sync::Arc;

use delve_common::{GridSize, WorldSeed};
use delve_gameplay::FetchItemRegistry;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::biome::BiomeTable;
use crate::events::EventBus;
use crate::generation::{ChunkGenerator, GeneratorConfig};
use crate::ring::DEFAULT_RING_RADIUS;
use crate::store::{ChunkStore, FileBackend, MemoryBackend, StorageBackend, DEFAULT_NAMESPACE};

/// Smallest grid the generator supports.
pub const MIN_GRID: GridSize = GridSize::new(16, 8);

/// Largest grid accepted from configuration.
pub const MAX_GRID: GridSize = GridSize::new(512, 256);

/// World settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Chunk dimensions
    pub grid: GridSize,
    /// Storage key namespace
    pub namespace: String,
    /// Landing search radius
    pub ring_radius: u8,
    /// Event queue capacity
    pub event_capacity: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            grid: GridSize::default(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            ring_radius: DEFAULT_RING_RADIUS,
            event_capacity: 256,
        }
    }
}

impl WorldConfig {
    /// Clamps values into supported ranges.
    pub fn validate(&mut self) {
        let width = self.grid.width.clamp(MIN_GRID.width, MAX_GRID.width);
        let height = self.grid.height.clamp(MIN_GRID.height, MAX_GRID.height);
        if (width, height) != (self.grid.width, self.grid.height) {
            warn!(
                "Grid {}x{} out of range, using {width}x{height}",
                self.grid.width, self.grid.height
            );
            self.grid = GridSize::new(width, height);
        }
        if self.namespace.trim().is_empty() {
            warn!("Empty storage namespace, using {DEFAULT_NAMESPACE}");
            self.namespace = DEFAULT_NAMESPACE.to_string();
        }
        self.ring_radius = self.ring_radius.clamp(1, 16);
        self.event_capacity = self.event_capacity.clamp(16, 65_536);
    }
}

/// Everything a world session needs, built once and passed explicitly.
#[derive(Debug)]
pub struct WorldContext {
    seed: WorldSeed,
    config: WorldConfig,
    generator: ChunkGenerator,
    store: ChunkStore,
    registry: Arc<FetchItemRegistry>,
    events: EventBus,
}

impl WorldContext {
    /// Builds a context over a storage backend with the built-in tables.
    #[must_use]
    pub fn new(seed: WorldSeed, config: WorldConfig, backend: Arc<dyn StorageBackend>) -> Self {
        Self::with_registry(seed, config, backend, FetchItemRegistry::with_defaults())
    }

    /// Builds a context with a custom fetch registry.
    #[must_use]
    pub fn with_registry(
        seed: WorldSeed,
        mut config: WorldConfig,
        backend: Arc<dyn StorageBackend>,
        registry: FetchItemRegistry,
    ) -> Self {
        config.validate();
        let registry = Arc::new(registry);
        let generator = ChunkGenerator::new(
            GeneratorConfig::with_grid(config.grid),
            BiomeTable::default(),
            Arc::clone(&registry),
        );
        let store = ChunkStore::new(backend, config.namespace.clone()).with_grid(config.grid);
        let events = EventBus::new(config.event_capacity);
        Self {
            seed,
            config,
            generator,
            store,
            registry,
            events,
        }
    }

    /// Context backed by memory.
    #[must_use]
    pub fn in_memory(seed: WorldSeed, config: WorldConfig) -> Self {
        Self::new(seed, config, Arc::new(MemoryBackend::new()))
    }

    /// Context backed by a directory of JSON files.
    #[must_use]
    pub fn with_save_dir(seed: WorldSeed, config: WorldConfig, dir: impl Into<PathBuf>) -> Self {
        Self::new(seed, config, Arc::new(FileBackend::new(dir)))
    }

    /// World seed.
    #[must_use]
    pub const fn seed(&self) -> WorldSeed {
        self.seed
    }

    /// Validated settings.
    #[must_use]
    pub const fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Chunk generator.
    #[must_use]
    pub const fn generator(&self) -> &ChunkGenerator {
        &self.generator
    }

    /// Chunk store.
    #[must_use]
    pub const fn store(&self) -> &ChunkStore {
        &self.store
    }

    /// Fetch-item registry.
    #[must_use]
    pub fn registry(&self) -> &FetchItemRegistry {
        &self.registry
    }

    /// Event bus.
    #[must_use]
    pub const fn events(&self) -> &EventBus {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_clamps() {
        let mut config = WorldConfig {
            grid: GridSize::new(4, 1000),
            namespace: "  ".into(),
            ring_radius: 0,
            event_capacity: 1,
        };
        config.validate();
        assert_eq!(config.grid, GridSize::new(16, 256));
        assert_eq!(config.namespace, DEFAULT_NAMESPACE);
        assert_eq!(config.ring_radius, 1);
        assert_eq!(config.event_capacity, 16);
    }

    #[test]
    fn test_default_is_valid() {
        let mut config = WorldConfig::default();
        config.validate();
        assert_eq!(config, WorldConfig::default());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: WorldConfig =
            serde_json::from_str(r#"{"namespace":"mygame.chunk"}"#).expect("parse");
        assert_eq!(config.grid, GridSize::new(48, 22));
        assert_eq!(config.ring_radius, DEFAULT_RING_RADIUS);
    }

    #[test]
    fn test_contexts_are_independent() {
        let a = WorldContext::in_memory(WorldSeed::new(1), WorldConfig::default());
        let b = WorldContext::in_memory(WorldSeed::new(1), WorldConfig::default());
        let mut chunk = a.generator().generate(a.seed(), delve_common::ChunkCoord::ORIGIN);
        assert!(a.store().save(a.seed(), &mut chunk));
        assert!(b
            .store()
            .load(b.seed(), delve_common::ChunkCoord::ORIGIN)
            .is_none());
        assert_eq!(a.registry().len(), 6);
    }
}
