//! Chunk persistence.
//!
//! Chunks are stored as JSON [`PersistedChunkRecord`]s under the key
//! `"{namespace}:{seed}:{cx}:{cy}"`. Nothing is saved automatically; callers
//! save once they are done mutating a chunk.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use delve_common::{ChunkCoord, GridSize, StorageError, WorldError, WorldResult, WorldSeed};
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::chunk::{Chunk, PersistedChunkRecord};
use crate::generation::ChunkGenerator;

/// Namespace used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "delve.chunk";

/// A string key/value store.
pub trait StorageBackend: Debug + Send + Sync {
    /// Reads a value; `Ok(None)` when the key is absent.
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Writes a value, replacing any previous one.
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes every key starting with `prefix`, returning how many were removed.
    fn remove_prefix(&self, prefix: &str) -> Result<usize, StorageError>;
}

/// In-memory backend with an optional byte quota.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RwLock<BTreeMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryBackend {
    /// Creates an unbounded backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend that refuses writes past `limit` bytes of keys and values.
    #[must_use]
    pub fn with_quota(limit: usize) -> Self {
        Self {
            entries: RwLock::default(),
            quota: Some(limit),
        }
    }

    /// Bytes currently held.
    #[must_use]
    pub fn used_bytes(&self) -> usize {
        self.entries
            .read()
            .iter()
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the backend is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl StorageBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write();
        if let Some(limit) = self.quota {
            let used: usize = entries.iter().map(|(k, v)| k.len() + v.len()).sum();
            let replaced = entries.get(key).map_or(0, |v| key.len() + v.len());
            let needed = used - replaced + key.len() + value.len();
            if needed > limit {
                return Err(StorageError::QuotaExceeded { needed, limit });
            }
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_prefix(&self, prefix: &str) -> Result<usize, StorageError> {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|k, _| !k.starts_with(prefix));
        Ok(before - entries.len())
    }
}

/// One JSON file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Creates a backend rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Escapes every byte outside `[A-Za-z0-9.-]` as `_xx`. The mapping is
    /// injective and preserves prefixes.
    fn file_stem(key: &str) -> String {
        use std::fmt::Write;

        let mut stem = String::with_capacity(key.len());
        for byte in key.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'.' {
                stem.push(char::from(byte));
            } else {
                let _ = write!(stem, "_{byte:02x}");
            }
        }
        stem
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", Self::file_stem(key)))
    }
}

impl StorageBackend for FileBackend {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove_prefix(&self, prefix: &str) -> Result<usize, StorageError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        let stem_prefix = Self::file_stem(prefix);
        let mut removed = 0;
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with(&stem_prefix) && name.ends_with(".json") {
                std::fs::remove_file(entry.path())?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

/// Where a chunk handed out by [`ChunkStore::load_or_generate`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkSource {
    /// Restored from storage
    Loaded,
    /// Freshly generated
    Generated,
}

/// Persists chunks for any number of world seeds.
#[derive(Debug, Clone)]
pub struct ChunkStore {
    backend: Arc<dyn StorageBackend>,
    namespace: String,
    grid: Option<GridSize>,
}

impl ChunkStore {
    /// Creates a store over a backend.
    #[must_use]
    pub fn new(backend: Arc<dyn StorageBackend>, namespace: impl Into<String>) -> Self {
        Self {
            backend,
            namespace: namespace.into(),
            grid: None,
        }
    }

    /// Only accept stored chunks whose tile grid has this size.
    #[must_use]
    pub fn with_grid(mut self, grid: GridSize) -> Self {
        self.grid = Some(grid);
        self
    }

    /// Grid size stored chunks must have, if any.
    #[must_use]
    pub fn grid(&self) -> Option<GridSize> {
        self.grid
    }

    /// Store over a fresh [`MemoryBackend`] with the default namespace.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()), DEFAULT_NAMESPACE)
    }

    /// Key namespace.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Storage key of a chunk.
    #[must_use]
    pub fn key(&self, seed: WorldSeed, coord: ChunkCoord) -> String {
        format!("{}:{seed}:{}:{}", self.namespace, coord.x, coord.y)
    }

    fn seed_prefix(&self, seed: WorldSeed) -> String {
        format!("{}:{seed}:", self.namespace)
    }

    /// Saves a chunk and marks it clean.
    pub fn try_save(&self, seed: WorldSeed, chunk: &mut Chunk) -> WorldResult<()> {
        let key = self.key(seed, chunk.coord());
        let json = serde_json::to_string(&chunk.to_record())
            .map_err(|e| WorldError::Serialization(e.to_string()))?;
        self.backend.write(&key, &json)?;
        chunk.mark_clean();
        debug!("saved {key} ({} bytes)", json.len());
        Ok(())
    }

    /// Saves a chunk, returning false when the write failed.
    pub fn save(&self, seed: WorldSeed, chunk: &mut Chunk) -> bool {
        match self.try_save(seed, chunk) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to save chunk {}: {e}", chunk.coord());
                false
            },
        }
    }

    /// Loads a chunk; `Ok(None)` when nothing is stored.
    pub fn try_load(&self, seed: WorldSeed, coord: ChunkCoord) -> WorldResult<Option<Chunk>> {
        let key = self.key(seed, coord);
        let Some(json) = self.backend.read(&key)? else {
            return Ok(None);
        };
        let record: PersistedChunkRecord =
            serde_json::from_str(&json).map_err(|e| WorldError::Corrupt {
                key: key.clone(),
                reason: e.to_string(),
            })?;
        if record.coord != coord {
            return Err(WorldError::Corrupt {
                key,
                reason: format!("record is for chunk {}", record.coord),
            });
        }
        let chunk = Chunk::from_record(record, &key)?;
        if let Some(expected) = self.grid {
            let actual = chunk.grid().size();
            if actual != expected {
                return Err(WorldError::Corrupt {
                    key,
                    reason: format!(
                        "grid is {}x{}, expected {}x{}",
                        actual.width, actual.height, expected.width, expected.height
                    ),
                });
            }
        }
        Ok(Some(chunk))
    }

    /// Loads a chunk. Unreadable records count as absent.
    #[must_use]
    pub fn load(&self, seed: WorldSeed, coord: ChunkCoord) -> Option<Chunk> {
        match self.try_load(seed, coord) {
            Ok(chunk) => chunk,
            Err(e) => {
                warn!("Discarding stored chunk {coord}: {e}");
                None
            },
        }
    }

    /// Removes every chunk of a world.
    pub fn try_clear(&self, seed: WorldSeed) -> WorldResult<usize> {
        let removed = self.backend.remove_prefix(&self.seed_prefix(seed))?;
        info!("Cleared {removed} stored chunks for seed {seed}");
        Ok(removed)
    }

    /// Removes every chunk of a world, returning 0 on failure.
    pub fn clear(&self, seed: WorldSeed) -> usize {
        self.try_clear(seed).unwrap_or_else(|e| {
            warn!("Failed to clear world {seed}: {e}");
            0
        })
    }

    /// Loads the chunk at `coord`, generating it on a miss.
    pub fn load_or_generate(
        &self,
        seed: WorldSeed,
        coord: ChunkCoord,
        generator: &ChunkGenerator,
    ) -> (Chunk, ChunkSource) {
        match self.load(seed, coord) {
            Some(chunk) => (chunk, ChunkSource::Loaded),
            None => (generator.generate(seed, coord), ChunkSource::Generated),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use delve_common::{GridSize, SchemaVersion};

    const SEED: WorldSeed = WorldSeed::new(12345);

    fn generator() -> ChunkGenerator {
        ChunkGenerator::with_grid(GridSize::default())
    }

    #[test]
    fn test_key_shape() {
        let store = ChunkStore::in_memory();
        assert_eq!(store.key(SEED, ChunkCoord::new(-1, 4)), "delve.chunk:12345:-1:4");
    }

    #[test]
    fn test_save_load_roundtrip() {
        let store = ChunkStore::in_memory();
        let mut chunk = generator().generate(SEED, ChunkCoord::new(1, 0));
        chunk.mark_monster_dead(0);
        assert!(chunk.is_dirty());

        assert!(store.save(SEED, &mut chunk));
        assert!(!chunk.is_dirty());

        let loaded = store.load(SEED, ChunkCoord::new(1, 0)).expect("stored");
        assert_eq!(loaded, chunk);
        assert!(!loaded.monsters()[0].alive);
    }

    #[test]
    fn test_clear_world() {
        let store = ChunkStore::in_memory();
        let generator = generator();
        for coord in [ChunkCoord::new(0, 0), ChunkCoord::new(1, 0)] {
            let mut chunk = generator.generate(SEED, coord);
            assert!(store.save(SEED, &mut chunk));
        }
        let mut other = generator.generate(WorldSeed::new(1234), ChunkCoord::ORIGIN);
        assert!(store.save(WorldSeed::new(1234), &mut other));

        assert_eq!(store.clear(SEED), 2);
        assert!(store.load(SEED, ChunkCoord::new(0, 0)).is_none());
        assert!(store.load(SEED, ChunkCoord::new(1, 0)).is_none());
        assert!(store.load(WorldSeed::new(1234), ChunkCoord::ORIGIN).is_some());
    }

    #[test]
    fn test_quota_failure_keeps_chunk_dirty() {
        let store = ChunkStore::new(Arc::new(MemoryBackend::with_quota(64)), DEFAULT_NAMESPACE);
        let mut chunk = generator().generate(SEED, ChunkCoord::ORIGIN);
        chunk.mark_monster_dead(0);

        assert!(matches!(
            store.try_save(SEED, &mut chunk),
            Err(WorldError::Storage(StorageError::QuotaExceeded { limit: 64, .. }))
        ));
        assert!(!store.save(SEED, &mut chunk));
        assert!(chunk.is_dirty());
        assert!(store.load(SEED, ChunkCoord::ORIGIN).is_none());
    }

    #[test]
    fn test_quota_counts_replaced_value_once() {
        let backend = MemoryBackend::with_quota(20);
        backend.write("k", "0123456789").expect("fits");
        backend.write("k", "9876543210").expect("replacement fits");
        assert_eq!(backend.used_bytes(), 11);
        assert!(backend.write("j", "0123456789").is_err());
    }

    #[test]
    fn test_corrupt_record_is_a_miss() {
        let backend = Arc::new(MemoryBackend::new());
        let store = ChunkStore::new(backend.clone(), DEFAULT_NAMESPACE);
        let key = store.key(SEED, ChunkCoord::ORIGIN);
        backend.write(&key, "{not json").expect("write");

        assert!(matches!(
            store.try_load(SEED, ChunkCoord::ORIGIN),
            Err(WorldError::Corrupt { .. })
        ));
        assert!(store.load(SEED, ChunkCoord::ORIGIN).is_none());

        let (chunk, source) = store.load_or_generate(SEED, ChunkCoord::ORIGIN, &generator());
        assert_eq!(source, ChunkSource::Generated);
        assert_eq!(chunk, generator().generate(SEED, ChunkCoord::ORIGIN));
    }

    #[test]
    fn test_misplaced_record_is_corrupt() {
        let backend = Arc::new(MemoryBackend::new());
        let store = ChunkStore::new(backend.clone(), DEFAULT_NAMESPACE);
        let chunk = generator().generate(SEED, ChunkCoord::new(3, 3));
        let json = serde_json::to_string(&chunk.to_record()).expect("serialize");
        backend
            .write(&store.key(SEED, ChunkCoord::ORIGIN), &json)
            .expect("write");
        assert!(store.load(SEED, ChunkCoord::ORIGIN).is_none());
    }

    #[test]
    fn test_resized_grid_is_a_miss() {
        let backend = Arc::new(MemoryBackend::new());
        let small = ChunkStore::new(backend.clone(), DEFAULT_NAMESPACE);
        let mut chunk = generator().generate(SEED, ChunkCoord::ORIGIN);
        assert!(small.save(SEED, &mut chunk));

        let large_grid = GridSize::new(64, 32);
        let large = ChunkStore::new(backend, DEFAULT_NAMESPACE).with_grid(large_grid);
        assert!(matches!(
            large.try_load(SEED, ChunkCoord::ORIGIN),
            Err(WorldError::Corrupt { .. })
        ));

        let large_generator = ChunkGenerator::with_grid(large_grid);
        let (loaded, source) = large.load_or_generate(SEED, ChunkCoord::ORIGIN, &large_generator);
        assert_eq!(source, ChunkSource::Generated);
        assert_eq!(loaded.grid().size(), large_grid);

        let same = small.clone().with_grid(GridSize::default());
        assert!(same.load(SEED, ChunkCoord::ORIGIN).is_some());
    }

    #[test]
    fn test_future_version_is_a_miss() {
        let backend = Arc::new(MemoryBackend::new());
        let store = ChunkStore::new(backend.clone(), DEFAULT_NAMESPACE);
        let mut record = generator().generate(SEED, ChunkCoord::ORIGIN).to_record();
        record.version = SchemaVersion::new(2, 0, 0);
        let json = serde_json::to_string(&record).expect("serialize");
        backend
            .write(&store.key(SEED, ChunkCoord::ORIGIN), &json)
            .expect("write");
        assert!(matches!(
            store.try_load(SEED, ChunkCoord::ORIGIN),
            Err(WorldError::VersionMismatch { .. })
        ));
    }

    #[test]
    fn test_load_or_generate_prefers_stored() {
        let store = ChunkStore::in_memory();
        let generator = generator();
        let (mut chunk, source) = store.load_or_generate(SEED, ChunkCoord::ORIGIN, &generator);
        assert_eq!(source, ChunkSource::Generated);

        chunk.mark_monster_dead(1);
        assert!(store.save(SEED, &mut chunk));
        let (again, source) = store.load_or_generate(SEED, ChunkCoord::ORIGIN, &generator);
        assert_eq!(source, ChunkSource::Loaded);
        assert!(!again.monsters()[1].alive);
    }

    #[test]
    fn test_file_backend_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let backend = Arc::new(FileBackend::new(dir.path().join("world")));
        let store = ChunkStore::new(backend.clone(), DEFAULT_NAMESPACE);
        let generator = generator();

        assert!(store.load(SEED, ChunkCoord::new(-2, 5)).is_none());
        let mut chunk = generator.generate(SEED, ChunkCoord::new(-2, 5));
        assert!(store.save(SEED, &mut chunk));
        assert!(backend
            .dir()
            .join("delve.chunk_3a12345_3a-2_3a5.json")
            .exists());
        assert_eq!(store.load(SEED, ChunkCoord::new(-2, 5)), Some(chunk));
    }

    #[test]
    fn test_file_backend_clear_is_per_seed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ChunkStore::new(Arc::new(FileBackend::new(dir.path())), DEFAULT_NAMESPACE);
        let generator = generator();
        for seed in [WorldSeed::new(1), WorldSeed::new(12)] {
            let mut chunk = generator.generate(seed, ChunkCoord::ORIGIN);
            assert!(store.save(seed, &mut chunk));
        }
        assert_eq!(store.clear(WorldSeed::new(1)), 1);
        assert!(store.load(WorldSeed::new(1), ChunkCoord::ORIGIN).is_none());
        assert!(store.load(WorldSeed::new(12), ChunkCoord::ORIGIN).is_some());
    }

    #[test]
    fn test_file_backend_clear_keeps_lookalike_namespaces() {
        let dir = tempfile::tempdir().expect("tempdir");
        let backend = Arc::new(FileBackend::new(dir.path()));
        let short = ChunkStore::new(backend.clone(), "a");
        let long = ChunkStore::new(backend, "a_1");
        let generator = generator();

        let mut chunk = generator.generate(WorldSeed::new(1), ChunkCoord::ORIGIN);
        assert!(short.save(WorldSeed::new(1), &mut chunk));
        let mut other = generator.generate(WorldSeed::new(9), ChunkCoord::ORIGIN);
        assert!(long.save(WorldSeed::new(9), &mut other));

        assert_eq!(short.clear(WorldSeed::new(1)), 1);
        assert!(long.load(WorldSeed::new(9), ChunkCoord::ORIGIN).is_some());
    }

    #[test]
    fn test_file_stem_is_injective() {
        assert_ne!(FileBackend::file_stem("a:1"), FileBackend::file_stem("a_1"));
        assert_eq!(FileBackend::file_stem("delve.chunk:-3"), "delve.chunk_3a-3");
    }

    #[test]
    fn test_file_backend_clear_missing_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let backend = FileBackend::new(dir.path().join("absent"));
        assert_eq!(backend.remove_prefix("delve.chunk:1:").expect("clear"), 0);
    }
}
