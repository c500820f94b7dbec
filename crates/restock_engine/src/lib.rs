//! Tracked-resource reset engine.
//!
//! `restock_engine` remembers every loot container a player has opened and,
//! once a container has sat idle for the configured cooldown, clears it and
//! rebinds its loot template so it regenerates on next open.
//!
//! - [`key`] - Resource identity: partitions, positions, instance ids
//! - [`registry`] - In-memory tracked state
//! - [`reconcile`] - One pass of the reset policy over the registry
//! - [`store`] - JSON persistence of the registry
//! - [`host`] - Traits the host simulation implements
//! - [`engine`] - The engine tying these together
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use restock_engine::prelude::*;
//!
//! struct EmptyWorld;
//!
//! impl AvailabilityOracle for EmptyWorld {
//!     fn partition_exists(&self, _: &PartitionId) -> bool { false }
//!     fn is_zone_active(&self, _: &PartitionId, _: BlockPos) -> bool { false }
//!     fn resolve_resource(&self, _: &PartitionId, _: BlockPos)
//!         -> Option<Box<dyn ResettableResource + '_>> { None }
//!     fn resolve_instance(&self, _: &PartitionId, _: &InstanceId, _: BlockPos, _: u32)
//!         -> Option<Box<dyn ResettableResource + '_>> { None }
//! }
//!
//! let dir = tempfile::tempdir()?;
//! let mut engine = Engine::builder(
//!     EngineConfig::default(),
//!     Arc::new(EmptyWorld),
//!     Arc::new(JsonFileStore::in_dir(dir.path())),
//! )
//! .start();
//!
//! engine.record_container_interaction(
//!     ContainerInteraction::new("overworld", BlockPos::new(10, 64, -3)).with_template("t1", 42),
//! );
//!
//! // The partition is gone, so the entry is evicted on the next pass.
//! let report = engine.reconcile();
//! assert_eq!(report.evicted, 1);
//! assert!(engine.registry().is_empty());
//! # Ok::<(), std::io::Error>(())
//! ```

/// Cadence gating of passes.
pub mod cadence;

/// Wall-clock time.
pub mod clock;

/// Configuration and reset policy.
pub mod config;

/// The engine.
pub mod engine;

/// Error types.
pub mod error;

/// Host seams.
pub mod host;

/// Host interaction events.
pub mod interaction;

/// Resource identity.
pub mod key;

/// Reconciliation passes.
pub mod reconcile;

/// Tracked state registry.
pub mod registry;

/// Per-resource state.
pub mod state;

/// Persistence.
pub mod store;

/// Mock host for tests.
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use cadence::Cadence;
pub use clock::{ClockProvider, SystemClock, Timestamp};
pub use config::{EngineConfig, ResetPolicy, TimeUnit};
pub use engine::{Engine, EngineBuilder};
pub use error::{ConfigError, ResetError, StoreError};
pub use host::{AvailabilityOracle, RegenerateInvoker, ResetInvoker, ResettableResource};
pub use interaction::{ContainerClass, ContainerInteraction, EntityInteraction};
pub use key::{Anchor, BlockPos, InstanceId, Locator, PartitionId, ResourceKey, TemplateRef};
pub use reconcile::{EntryOutcome, EvictionReason, PassReport, Reconciler};
pub use registry::Registry;
pub use state::{InteractionSnapshot, TrackedResource};
pub use store::{JsonFileStore, PersistedRecord, STATE_FILE_NAME, StateStore};

#[cfg(any(test, feature = "test-utils"))]
pub use clock::MockClock;
#[cfg(any(test, feature = "test-utils"))]
pub use store::MemoryStore;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::clock::{ClockProvider, SystemClock, Timestamp};
    pub use crate::config::{EngineConfig, ResetPolicy, TimeUnit};
    pub use crate::engine::Engine;
    pub use crate::error::{ConfigError, ResetError, StoreError};
    pub use crate::host::{AvailabilityOracle, RegenerateInvoker, ResetInvoker, ResettableResource};
    pub use crate::interaction::{ContainerClass, ContainerInteraction, EntityInteraction};
    pub use crate::key::{BlockPos, InstanceId, PartitionId, ResourceKey, TemplateRef};
    pub use crate::reconcile::PassReport;
    pub use crate::store::{JsonFileStore, StateStore};
}
