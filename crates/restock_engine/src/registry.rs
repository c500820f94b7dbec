//! In-memory registry of tracked resources.

use crate::clock::Timestamp;
use crate::key::ResourceKey;
use crate::state::{InteractionSnapshot, TrackedResource};
use hashbrown::HashMap;

/// Map from [`ResourceKey`] to [`TrackedResource`].
///
/// Besides per-record dirty flags the registry remembers whether anything was
/// removed since the last successful save, since a removal leaves no record
/// behind to carry the flag.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    entries: HashMap<ResourceKey, TrackedResource>,
    pending_removals: bool,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the record for `key`.
    #[must_use]
    pub fn get(&self, key: &ResourceKey) -> Option<&TrackedResource> {
        self.entries.get(key)
    }

    pub(crate) fn get_mut(&mut self, key: &ResourceKey) -> Option<&mut TrackedResource> {
        self.entries.get_mut(key)
    }

    /// Returns true if `key` is tracked.
    #[must_use]
    pub fn contains(&self, key: &ResourceKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Applies an interaction.
    ///
    /// Creates the record or overwrites its template, seed, emptiness and
    /// location. Either way `last_interaction` becomes `now` and the record
    /// is marked dirty. Snapshots without a template are ignored and return
    /// `None`.
    pub fn upsert_on_interaction(
        &mut self,
        snapshot: InteractionSnapshot,
        now: Timestamp,
    ) -> Option<&TrackedResource> {
        let key = snapshot.key();
        let InteractionSnapshot {
            partition,
            locator,
            template,
            seed,
            empty,
        } = snapshot;
        let template = template?;

        let record = self
            .entries
            .entry(key)
            .and_modify(|record| {
                record.locator = locator.clone();
                record.template = template.clone();
                record.seed = seed;
                record.observed_empty = empty;
                record.last_interaction = now;
                record.dirty = true;
            })
            .or_insert_with(|| {
                let mut record =
                    TrackedResource::new(partition, locator, template, seed, now, empty);
                record.dirty = true;
                record
            });
        Some(record)
    }

    /// Inserts a clean record, as loaded from storage.
    pub(crate) fn insert_loaded(&mut self, record: TrackedResource) {
        self.entries.insert(record.key(), record);
    }

    /// Removes the record for `key`.
    pub fn remove(&mut self, key: &ResourceKey) -> Option<TrackedResource> {
        let removed = self.entries.remove(key);
        if removed.is_some() {
            self.pending_removals = true;
        }
        removed
    }

    /// Snapshot of the current keys.
    ///
    /// Passes iterate over this copy so that records can be removed mid-pass.
    #[must_use]
    pub fn keys(&self) -> Vec<ResourceKey> {
        self.entries.keys().cloned().collect()
    }

    /// Iterates over all records.
    pub fn iter(&self) -> impl Iterator<Item = (&ResourceKey, &TrackedResource)> {
        self.entries.iter()
    }

    /// Number of tracked resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if the persisted snapshot is out of date.
    #[must_use]
    pub fn needs_flush(&self) -> bool {
        self.pending_removals || self.entries.values().any(TrackedResource::is_dirty)
    }

    /// Clears every dirty flag after a successful save.
    pub fn mark_clean(&mut self) {
        self.pending_removals = false;
        for record in self.entries.values_mut() {
            record.dirty = false;
        }
    }
}
