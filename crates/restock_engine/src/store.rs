//! Durable storage of tracked state.
//!
//! The whole registry is written as one pretty-printed JSON object keyed by
//! the string form of each [`ResourceKey`](crate::ResourceKey). Dirty flags
//! are never written. Loading rebuilds keys from record fields, so a
//! hand-edited key string cannot disagree with its record.

use crate::clock::Timestamp;
use crate::error::StoreError;
use crate::key::{BlockPos, InstanceId, Locator, PartitionId, TemplateRef};
use crate::registry::Registry;
use crate::state::TrackedResource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the state file inside a save directory.
pub const STATE_FILE_NAME: &str = "restock_state.json";

/// Loads and saves the registry.
pub trait StateStore: Send + Sync + 'static {
    /// Loads the persisted registry. A missing store yields an empty registry.
    fn load(&self) -> Result<Registry, StoreError>;

    /// Replaces the persisted registry with `registry`.
    fn save(&self, registry: &Registry) -> Result<(), StoreError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Persisted format
// ─────────────────────────────────────────────────────────────────────────────

/// One record of the state file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedRecord {
    /// Partition id.
    pub partition_id: String,
    /// Block x, or last known x for entity records.
    pub x: i32,
    /// Block y, or last known y for entity records.
    pub y: i32,
    /// Block z, or last known z for entity records.
    pub z: i32,
    /// Entity id for mobile resources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    /// Bound template.
    pub template_ref: String,
    /// Bound seed.
    pub seed: i64,
    /// Epoch milliseconds of the last interaction or reset.
    pub last_interaction_time: i64,
    /// Emptiness at the last interaction or reset.
    pub observed_empty: bool,
}

impl From<&TrackedResource> for PersistedRecord {
    fn from(record: &TrackedResource) -> Self {
        let pos = record.locator.position();
        let entity_id = match &record.locator {
            Locator::Positional(_) => None,
            Locator::Instance { id, .. } => Some(id.as_str().to_owned()),
        };
        Self {
            partition_id: record.partition.as_str().to_owned(),
            x: pos.x,
            y: pos.y,
            z: pos.z,
            entity_id,
            template_ref: record.template.as_str().to_owned(),
            seed: record.seed,
            last_interaction_time: record.last_interaction.as_millis(),
            observed_empty: record.observed_empty,
        }
    }
}

impl PersistedRecord {
    fn into_tracked(self) -> Option<TrackedResource> {
        if self.partition_id.is_empty() || self.template_ref.is_empty() {
            return None;
        }
        let pos = BlockPos::new(self.x, self.y, self.z);
        let locator = match self.entity_id {
            Some(id) if id.is_empty() => return None,
            Some(id) => Locator::Instance {
                id: InstanceId::new(id),
                last_known: pos,
            },
            None => Locator::Positional(pos),
        };
        Some(TrackedResource::new(
            PartitionId::new(self.partition_id),
            locator,
            TemplateRef::new(self.template_ref),
            self.seed,
            Timestamp::from_millis(self.last_interaction_time),
            self.observed_empty,
        ))
    }
}

/// Builds the persisted form of `registry`, ordered by key.
#[must_use]
pub fn snapshot(registry: &Registry) -> BTreeMap<String, PersistedRecord> {
    registry
        .iter()
        .map(|(key, record)| (key.to_string(), PersistedRecord::from(record)))
        .collect()
}

/// Rebuilds a registry from its persisted form, skipping invalid records.
#[must_use]
pub fn restore(records: BTreeMap<String, PersistedRecord>) -> Registry {
    let mut registry = Registry::new();
    for (key, record) in records {
        match record.into_tracked() {
            Some(tracked) => registry.insert_loaded(tracked),
            None => tracing::warn!(key = %key, "skipping invalid tracked record"),
        }
    }
    registry
}

// ─────────────────────────────────────────────────────────────────────────────
// JsonFileStore
// ─────────────────────────────────────────────────────────────────────────────

/// Stores state in a JSON file.
///
/// Saves write a sibling temporary file and rename it over the target, so a
/// crash mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store backed by [`STATE_FILE_NAME`] inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(STATE_FILE_NAME))
    }

    /// Path of the state file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> Result<Registry, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Registry::new());
            }
            Err(err) => return Err(StoreError::io(&self.path, err)),
        };
        if contents.trim().is_empty() {
            return Ok(Registry::new());
        }
        let records: BTreeMap<String, PersistedRecord> = serde_json::from_str(&contents)
            .map_err(|err| StoreError::serialization(&self.path, err))?;
        Ok(restore(records))
    }

    fn save(&self, registry: &Registry) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|err| StoreError::io(parent, err))?;
        }
        let json = serde_json::to_string_pretty(&snapshot(registry))
            .map_err(|err| StoreError::serialization(&self.path, err))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|err| StoreError::io(&tmp, err))?;
        fs::rename(&tmp, &self.path).map_err(|err| StoreError::io(&self.path, err))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// MemoryStore for Testing
// ─────────────────────────────────────────────────────────────────────────────

/// In-memory store that counts saves and can be told to fail.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Default)]
pub struct MemoryStore {
    saved: parking_lot::Mutex<Option<BTreeMap<String, PersistedRecord>>>,
    saves: core::sync::atomic::AtomicUsize,
    fail_saves: core::sync::atomic::AtomicBool,
}

#[cfg(any(test, feature = "test-utils"))]
impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `registry`.
    #[must_use]
    pub fn with_registry(registry: &Registry) -> Self {
        let store = Self::default();
        *store.saved.lock() = Some(snapshot(registry));
        store
    }

    /// Number of successful saves.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.load(core::sync::atomic::Ordering::SeqCst)
    }

    /// Makes subsequent saves fail (or succeed again).
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves
            .store(fail, core::sync::atomic::Ordering::SeqCst);
    }

    /// The last saved snapshot.
    #[must_use]
    pub fn saved(&self) -> Option<BTreeMap<String, PersistedRecord>> {
        self.saved.lock().clone()
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl StateStore for MemoryStore {
    fn load(&self) -> Result<Registry, StoreError> {
        Ok(self.saved.lock().clone().map(restore).unwrap_or_default())
    }

    fn save(&self, registry: &Registry) -> Result<(), StoreError> {
        if self.fail_saves.load(core::sync::atomic::Ordering::SeqCst) {
            return Err(StoreError::Unavailable("saves disabled".to_owned()));
        }
        *self.saved.lock() = Some(snapshot(registry));
        self.saves
            .fetch_add(1, core::sync::atomic::Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::InteractionSnapshot;

    fn populated() -> Registry {
        let mut registry = Registry::new();
        registry.upsert_on_interaction(
            InteractionSnapshot {
                partition: "overworld".into(),
                locator: Locator::Positional(BlockPos::new(10, 64, -3)),
                template: Some("t1".into()),
                seed: 42,
                empty: false,
            },
            Timestamp::from_millis(1_000),
        );
        registry.upsert_on_interaction(
            InteractionSnapshot {
                partition: "overworld".into(),
                locator: Locator::Instance {
                    id: "cart-1".into(),
                    last_known: BlockPos::new(5, 60, 5),
                },
                template: Some("minecart".into()),
                seed: -9,
                empty: true,
            },
            Timestamp::from_millis(2_000),
        );
        registry
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileStore::in_dir(dir.path());
        assert!(store.load().expect("load").is_empty());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileStore::in_dir(dir.path());
        fs::write(store.path(), "{ not json").expect("write");
        assert!(matches!(
            store.load(),
            Err(StoreError::Serialization { .. })
        ));
    }

    #[test]
    fn save_creates_directory_and_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileStore::in_dir(dir.path().join("world").join("data"));
        let registry = populated();

        store.save(&registry).expect("save");
        let loaded = store.load().expect("load");

        assert_eq!(loaded.len(), 2);
        assert!(!loaded.needs_flush());
        for (key, record) in registry.iter() {
            let reloaded = loaded.get(key).expect("key survives");
            assert_eq!(reloaded.template, record.template);
            assert_eq!(reloaded.seed, record.seed);
            assert_eq!(reloaded.last_interaction, record.last_interaction);
            assert_eq!(reloaded.observed_empty, record.observed_empty);
            assert_eq!(reloaded.locator, record.locator);
        }
    }

    #[test]
    fn file_format_uses_camel_case_and_omits_dirty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileStore::in_dir(dir.path());
        store.save(&populated()).expect("save");

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).expect("read")).expect("json");
        let chest = &json["overworld:10,64,-3"];
        assert_eq!(chest["partitionId"], "overworld");
        assert_eq!(chest["templateRef"], "t1");
        assert_eq!(chest["seed"], 42);
        assert_eq!(chest["lastInteractionTime"], 1_000);
        assert_eq!(chest["observedEmpty"], false);
        assert!(chest.get("entityId").is_none());
        assert!(chest.get("dirty").is_none());

        let cart = &json["overworld:entity:cart-1"];
        assert_eq!(cart["entityId"], "cart-1");
        assert_eq!(cart["x"], 5);
    }

    #[test]
    fn keys_are_rebuilt_from_fields() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileStore::in_dir(dir.path());
        fs::write(
            store.path(),
            r#"{
                "stale-key": {
                    "partitionId": "overworld", "x": 1, "y": 2, "z": 3,
                    "templateRef": "t1", "seed": 5,
                    "lastInteractionTime": 10, "observedEmpty": true
                },
                "broken": {
                    "partitionId": "", "x": 0, "y": 0, "z": 0,
                    "templateRef": "t1", "seed": 0,
                    "lastInteractionTime": 0, "observedEmpty": false
                }
            }"#,
        )
        .expect("write");

        let loaded = store.load().expect("load");
        assert_eq!(loaded.len(), 1);
        let key = crate::key::ResourceKey::positional("overworld".into(), BlockPos::new(1, 2, 3));
        assert!(loaded.contains(&key));
    }

    #[test]
    fn memory_store_can_fail() {
        let store = MemoryStore::new();
        store.set_fail_saves(true);
        assert!(store.save(&populated()).is_err());
        assert_eq!(store.save_count(), 0);

        store.set_fail_saves(false);
        store.save(&populated()).expect("save");
        assert_eq!(store.save_count(), 1);
        assert_eq!(store.load().expect("load").len(), 2);
    }
}
