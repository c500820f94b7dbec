//! Per-resource tracked state.

use crate::clock::Timestamp;
use crate::key::{Locator, PartitionId, ResourceKey, TemplateRef};

/// What the host reported when a player opened a resource.
///
/// A snapshot without a template describes a container that does not
/// generate content, and is never tracked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionSnapshot {
    /// Partition the resource lives in.
    pub partition: PartitionId,
    /// Where the resource is.
    pub locator: Locator,
    /// Template bound at the time of the interaction.
    pub template: Option<TemplateRef>,
    /// Generation seed bound at the time of the interaction.
    pub seed: i64,
    /// Whether the resource held no items.
    pub empty: bool,
}

impl InteractionSnapshot {
    /// Registry key this snapshot updates.
    #[must_use]
    pub fn key(&self) -> ResourceKey {
        self.locator.key(&self.partition)
    }
}

/// Last known state of a tracked resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedResource {
    /// Partition the resource lives in.
    pub partition: PartitionId,
    /// Where to find the resource.
    pub locator: Locator,
    /// Template bound at the last interaction.
    pub template: TemplateRef,
    /// Seed bound at the last interaction. Resets never write this back.
    pub seed: i64,
    /// Time of the last interaction or successful reset.
    pub last_interaction: Timestamp,
    /// Emptiness seen at the last interaction or reset.
    pub observed_empty: bool,
    pub(crate) dirty: bool,
}

impl TrackedResource {
    /// Creates a clean record, as loaded from storage.
    #[must_use]
    pub fn new(
        partition: PartitionId,
        locator: Locator,
        template: TemplateRef,
        seed: i64,
        last_interaction: Timestamp,
        observed_empty: bool,
    ) -> Self {
        Self {
            partition,
            locator,
            template,
            seed,
            last_interaction,
            observed_empty,
            dirty: false,
        }
    }

    /// Registry key of this record.
    #[must_use]
    pub fn key(&self) -> ResourceKey {
        self.locator.key(&self.partition)
    }

    /// Whether the record changed since it was last persisted.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Records a successful reset at `now`.
    pub(crate) fn mark_reset(&mut self, now: Timestamp, empty_after: bool) {
        self.last_interaction = now;
        self.observed_empty = empty_after;
        self.dirty = true;
    }
}
