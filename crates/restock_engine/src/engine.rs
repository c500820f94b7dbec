//! The reset engine.
//!
//! An [`Engine`] owns the registry together with everything a pass needs:
//! configuration, the host seams, the state store, a clock and a random
//! source for reset seeds. Hosts feed it interactions and call
//! [`Engine::tick`] every frame; the engine gates frames down to passes on
//! its own wall-clock cadence.
//!
//! # Example
//!
//! ```ignore
//! use restock_engine::prelude::*;
//!
//! let mut engine = Engine::builder(EngineConfig::default(), world, store).start();
//! engine.record_container_interaction(
//!     ContainerInteraction::new("overworld", BlockPos::new(10, 64, -3)).with_template("t1", 42),
//! );
//!
//! // Once per host frame.
//! if let Some(report) = engine.tick() {
//!     println!("{} resets", report.resets);
//! }
//!
//! engine.shutdown()?;
//! ```

use crate::cadence::Cadence;
use crate::clock::{ClockProvider, SystemClock, Timestamp};
use crate::config::EngineConfig;
use crate::error::StoreError;
use crate::host::{AvailabilityOracle, RegenerateInvoker, ResetInvoker};
use crate::interaction::{ContainerClass, ContainerInteraction, EntityInteraction};
use crate::reconcile::{PassReport, Reconciler};
use crate::registry::Registry;
use crate::state::InteractionSnapshot;
use crate::store::StateStore;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;

// ─────────────────────────────────────────────────────────────────────────────
// EngineBuilder
// ─────────────────────────────────────────────────────────────────────────────

/// Configures and starts an [`Engine`].
pub struct EngineBuilder {
    config: EngineConfig,
    oracle: Arc<dyn AvailabilityOracle>,
    store: Arc<dyn StateStore>,
    invoker: Arc<dyn ResetInvoker>,
    clock: Arc<dyn ClockProvider>,
    rng_seed: Option<u64>,
}

impl EngineBuilder {
    /// Uses `clock` instead of the system clock.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn ClockProvider>) -> Self {
        self.clock = clock;
        self
    }

    /// Uses `invoker` instead of [`RegenerateInvoker`].
    #[must_use]
    pub fn invoker(mut self, invoker: Arc<dyn ResetInvoker>) -> Self {
        self.invoker = invoker;
        self
    }

    /// Seeds the reset seed generator for reproducible runs.
    #[must_use]
    pub fn rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Loads persisted state and returns the running engine.
    ///
    /// A store that cannot be read yields an empty registry; the failure is
    /// logged and not returned.
    #[must_use]
    pub fn start(self) -> Engine {
        let registry = match self.store.load() {
            Ok(registry) => {
                tracing::info!(tracked = registry.len(), "loaded tracked containers");
                registry
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to load tracked containers, starting empty");
                Registry::new()
            }
        };
        let rng = match self.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Engine {
            registry,
            cadence: Cadence::new(self.config.reconcile_interval),
            config: self.config,
            oracle: self.oracle,
            invoker: self.invoker,
            store: self.store,
            clock: self.clock,
            rng,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Engine
// ─────────────────────────────────────────────────────────────────────────────

/// Tracks interacted resources and resets them once idle.
pub struct Engine {
    registry: Registry,
    config: EngineConfig,
    oracle: Arc<dyn AvailabilityOracle>,
    invoker: Arc<dyn ResetInvoker>,
    store: Arc<dyn StateStore>,
    clock: Arc<dyn ClockProvider>,
    rng: StdRng,
    cadence: Cadence,
}

impl Engine {
    /// Starts building an engine over `oracle`, persisting to `store`.
    pub fn builder(
        config: EngineConfig,
        oracle: Arc<dyn AvailabilityOracle>,
        store: Arc<dyn StateStore>,
    ) -> EngineBuilder {
        EngineBuilder {
            config,
            oracle,
            store,
            invoker: Arc::new(RegenerateInvoker),
            clock: Arc::new(SystemClock),
            rng_seed: None,
        }
    }

    /// Records a player opening a stationary container.
    ///
    /// Returns true if the container is now tracked. Containers without a
    /// template are ignored, as are secondary containers unless enabled.
    pub fn record_container_interaction(&mut self, event: ContainerInteraction) -> bool {
        if event.class == ContainerClass::Secondary && !self.config.include_secondary_containers {
            return false;
        }
        self.record(event.into())
    }

    /// Records a player opening an entity-carried container.
    ///
    /// Returns true if the container is now tracked.
    pub fn record_entity_interaction(&mut self, event: EntityInteraction) -> bool {
        self.record(event.into())
    }

    fn record(&mut self, snapshot: InteractionSnapshot) -> bool {
        let now = self.clock.now();
        match self.registry.upsert_on_interaction(snapshot, now) {
            Some(record) => {
                tracing::debug!(key = %record.key(), template = %record.template, "tracking container");
                true
            }
            None => false,
        }
    }

    /// Called every host frame. Runs a pass when the cadence is due.
    pub fn tick(&mut self) -> Option<PassReport> {
        let now = self.clock.now();
        if !self.cadence.is_due(now) {
            return None;
        }
        self.cadence.mark_run(now);
        Some(self.reconcile_at(now))
    }

    /// Runs a pass now, regardless of cadence.
    pub fn reconcile(&mut self) -> PassReport {
        let now = self.clock.now();
        self.reconcile_at(now)
    }

    /// Runs a pass as of `now`, then persists if anything changed.
    ///
    /// Dirty flags are cleared only after a successful save, so a failed save
    /// is retried by the next pass.
    pub fn reconcile_at(&mut self, now: Timestamp) -> PassReport {
        let reconciler = Reconciler::new(
            self.config.policy,
            self.config.instance_search_radius,
            self.oracle.as_ref(),
            self.invoker.as_ref(),
        );
        let mut report = reconciler.run(&mut self.registry, now, &mut self.rng);

        if self.registry.needs_flush() {
            match self.store.save(&self.registry) {
                Ok(()) => {
                    self.registry.mark_clean();
                    report.persisted = true;
                }
                Err(err) => {
                    tracing::error!(error = %err, "failed to save tracked containers");
                    report.save_failed = true;
                }
            }
        }

        if report.resets > 0 {
            tracing::info!(count = report.resets, "reset {} containers", report.resets);
        }
        report
    }

    /// Saves the registry unconditionally and consumes the engine.
    pub fn shutdown(mut self) -> Result<(), StoreError> {
        tracing::info!(
            tracked = self.registry.len(),
            "saving {} tracked containers",
            self.registry.len()
        );
        self.store.save(&self.registry)?;
        self.registry.mark_clean();
        Ok(())
    }

    /// Returns the registry.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the pass cadence.
    #[must_use]
    pub fn cadence(&self) -> &Cadence {
        &self.cadence
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;
    use crate::key::BlockPos;
    use crate::store::MemoryStore;
    use crate::testing::{MockContainer, MockWorld};
    use core::time::Duration;

    struct Harness {
        world: Arc<MockWorld>,
        store: Arc<MemoryStore>,
        clock: Arc<MockClock>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                world: Arc::new(MockWorld::new().with_partition("overworld")),
                store: Arc::new(MemoryStore::new()),
                clock: Arc::new(MockClock::new(Timestamp::EPOCH)),
            }
        }

        fn engine(&self, config: EngineConfig) -> Engine {
            Engine::builder(config, self.world.clone(), self.store.clone())
                .clock(self.clock.clone())
                .rng_seed(11)
                .start()
        }
    }

    #[test]
    fn secondary_containers_need_opt_in() {
        let harness = Harness::new();
        let event = ContainerInteraction::new("overworld", BlockPos::new(1, 1, 1))
            .with_class(ContainerClass::Secondary)
            .with_template("barrel", 5);

        let mut engine = harness.engine(EngineConfig::default());
        assert!(!engine.record_container_interaction(event.clone()));
        assert!(engine.registry().is_empty());

        let mut engine = harness.engine(EngineConfig::default().with_secondary_containers(true));
        assert!(engine.record_container_interaction(event));
        assert_eq!(engine.registry().len(), 1);
    }

    #[test]
    fn untemplated_interaction_is_ignored() {
        let harness = Harness::new();
        let mut engine = harness.engine(EngineConfig::default());
        assert!(!engine.record_container_interaction(ContainerInteraction::new(
            "overworld",
            BlockPos::new(0, 0, 0)
        )));
        assert!(engine.registry().is_empty());
    }

    #[test]
    fn tick_follows_cadence() {
        let harness = Harness::new();
        let config = EngineConfig::default().with_reconcile_interval(Duration::from_secs(1));
        let mut engine = harness.engine(config);

        assert!(engine.tick().is_some());
        harness.clock.advance(Duration::from_millis(500));
        assert!(engine.tick().is_none());
        harness.clock.advance(Duration::from_millis(500));
        assert!(engine.tick().is_some());
    }

    #[test]
    fn interaction_is_persisted_by_next_pass() {
        let harness = Harness::new();
        let pos = BlockPos::new(10, 64, -3);
        harness
            .world
            .add_container("overworld", pos, MockContainer::with_items(2));
        let mut engine = harness.engine(EngineConfig::default());

        engine.record_container_interaction(
            ContainerInteraction::new("overworld", pos).with_template("t1", 42),
        );
        let report = engine.reconcile();

        assert!(report.persisted);
        assert_eq!(report.resets, 0);
        assert_eq!(harness.store.save_count(), 1);
        assert!(!engine.registry().needs_flush());
    }

    #[test]
    fn shutdown_always_saves() {
        let harness = Harness::new();
        let engine = harness.engine(EngineConfig::default());
        engine.shutdown().expect("final save");
        assert_eq!(harness.store.save_count(), 1);
    }

    #[test]
    fn shutdown_reports_save_failure() {
        let harness = Harness::new();
        harness.store.set_fail_saves(true);
        let engine = harness.engine(EngineConfig::default());
        assert!(engine.shutdown().is_err());
    }
}
