//! A single reconciliation pass over the registry.
//!
//! For each tracked resource, in registry order:
//!
//! 1. Partition gone: evict.
//! 2. Zone inactive: skip without resolving the resource.
//! 3. Resource unresolvable: evict. Mobile resources are looked up by
//!    instance id near their last known position.
//! 4. Not eligible under the [`ResetPolicy`]: leave as is.
//! 5. Otherwise reset with a fresh seed. On success the record's
//!    `last_interaction` becomes the pass time and it is marked dirty; on
//!    failure it is left untouched for the next pass.
//!
//! Entries are independent, so no failure on one entry affects another.
//! Persisting the outcome is left to the caller.

use crate::clock::Timestamp;
use crate::config::ResetPolicy;
use crate::error::ResetError;
use crate::host::{AvailabilityOracle, ResetInvoker};
use crate::key::{Locator, ResourceKey};
use crate::registry::Registry;
use core::fmt;
use rand::Rng;

/// Why an entry was dropped from the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionReason {
    /// The partition no longer exists.
    PartitionGone,
    /// The resource could not be found in its active zone.
    ResourceGone,
}

impl fmt::Display for EvictionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PartitionGone => "partition no longer exists",
            Self::ResourceGone => "resource no longer exists",
        })
    }
}

/// What happened to one entry during a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    /// Removed from the registry.
    Evicted(EvictionReason),
    /// Zone not loaded; left untouched.
    Inactive,
    /// Resolved but not eligible yet.
    Waiting,
    /// Reset successfully.
    Reset,
    /// The reset was attempted and failed.
    Failed(ResetError),
}

/// Counts from one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Resources reset.
    pub resets: usize,
    /// Entries removed.
    pub evicted: usize,
    /// Entries skipped because their zone was inactive.
    pub inactive: usize,
    /// Entries resolved but not yet eligible.
    pub waiting: usize,
    /// Reset attempts that failed.
    pub failed: usize,
    /// Whether the registry was written this pass.
    pub persisted: bool,
    /// Whether a write was attempted and failed.
    pub save_failed: bool,
}

impl PassReport {
    /// Adds one entry outcome to the counts.
    pub fn record(&mut self, outcome: &EntryOutcome) {
        match outcome {
            EntryOutcome::Evicted(_) => self.evicted += 1,
            EntryOutcome::Inactive => self.inactive += 1,
            EntryOutcome::Waiting => self.waiting += 1,
            EntryOutcome::Reset => self.resets += 1,
            EntryOutcome::Failed(_) => self.failed += 1,
        }
    }
}

/// Applies the reset policy to registry entries.
pub struct Reconciler<'a> {
    policy: ResetPolicy,
    search_radius: u32,
    oracle: &'a dyn AvailabilityOracle,
    invoker: &'a dyn ResetInvoker,
}

impl<'a> Reconciler<'a> {
    /// Creates a reconciler over the given host seams.
    #[must_use]
    pub fn new(
        policy: ResetPolicy,
        search_radius: u32,
        oracle: &'a dyn AvailabilityOracle,
        invoker: &'a dyn ResetInvoker,
    ) -> Self {
        Self {
            policy,
            search_radius,
            oracle,
            invoker,
        }
    }

    /// Runs one pass at `now` over every entry in `registry`.
    pub fn run(&self, registry: &mut Registry, now: Timestamp, rng: &mut impl Rng) -> PassReport {
        let mut report = PassReport::default();
        for key in registry.keys() {
            if let Some(outcome) = self.reconcile_entry(registry, &key, now, rng) {
                report.record(&outcome);
            }
        }
        report
    }

    /// Reconciles one entry. Returns `None` if `key` is not tracked.
    pub fn reconcile_entry(
        &self,
        registry: &mut Registry,
        key: &ResourceKey,
        now: Timestamp,
        rng: &mut impl Rng,
    ) -> Option<EntryOutcome> {
        let record = registry.get(key)?;
        let partition = record.partition.clone();
        let locator = record.locator.clone();
        let template = record.template.clone();
        let last_interaction = record.last_interaction;

        if !self.oracle.partition_exists(&partition) {
            return Some(evict(registry, key, EvictionReason::PartitionGone));
        }

        if !self.oracle.is_zone_active(&partition, locator.position()) {
            tracing::debug!(key = %key, "zone inactive, skipping");
            return Some(EntryOutcome::Inactive);
        }

        let resolved = match &locator {
            Locator::Positional(pos) => self.oracle.resolve_resource(&partition, *pos),
            Locator::Instance { id, last_known } => {
                self.oracle
                    .resolve_instance(&partition, id, *last_known, self.search_radius)
            }
        };
        let Some(mut resource) = resolved else {
            return Some(evict(registry, key, EvictionReason::ResourceGone));
        };

        if !self
            .policy
            .is_eligible(last_interaction, now, resource.is_empty())
        {
            tracing::debug!(key = %key, last_interaction = %last_interaction, "not eligible");
            return Some(EntryOutcome::Waiting);
        }

        let seed: i64 = rng.r#gen();
        if let Err(err) = self.invoker.reset(&mut *resource, &template, seed) {
            tracing::error!(key = %key, error = %err, "failed to reset container");
            return Some(EntryOutcome::Failed(err));
        }

        let empty_after = resource.is_empty();
        if let Some(record) = registry.get_mut(key) {
            record.mark_reset(now, empty_after);
        }
        tracing::info!(key = %key, template = %template, "reset container");
        Some(EntryOutcome::Reset)
    }
}

fn evict(registry: &mut Registry, key: &ResourceKey, reason: EvictionReason) -> EntryOutcome {
    registry.remove(key);
    tracing::info!(key = %key, reason = %reason, "stopped tracking container");
    EntryOutcome::Evicted(reason)
}
