//! The reset engine as a session plugin.

use crate::settings::{Settings, SettingsPlugin};
use crate::time::{Clock, TimePlugin};
use restock_engine::engine::Engine;
use restock_engine::host::{AvailabilityOracle, ResetInvoker};
use restock_engine::store::JsonFileStore;
use restock_system::plugin::{Plugin, PluginId, ScheduleId, ServerTick};
use restock_system::server::Server;
use std::path::PathBuf;
use std::sync::Arc;

/// Runs the reset engine for the lifetime of a session.
///
/// - **`ready()`** loads `restock_state.json` from the save directory and
///   inserts the [`Engine`] as a session resource.
/// - **`update()`** runs on every [`ServerTick`]; the engine itself decides
///   whether a pass is due.
/// - **`cleanup()`** removes the engine and saves its state.
///
/// Hosts report interactions through the resource:
///
/// ```ignore
/// if let Some(mut engine) = server.get_resource_mut::<Engine>() {
///     engine.record_container_interaction(event);
/// }
/// ```
///
/// # Dependencies
///
/// - [`TimePlugin`]
/// - [`SettingsPlugin`]
#[derive(Clone)]
pub struct RestockPlugin {
    oracle: Arc<dyn AvailabilityOracle>,
    save_dir: PathBuf,
    invoker: Option<Arc<dyn ResetInvoker>>,
    rng_seed: Option<u64>,
}

impl RestockPlugin {
    /// Tracks containers in the world behind `oracle`, persisting to
    /// `save_dir`.
    #[must_use]
    pub fn new(oracle: Arc<dyn AvailabilityOracle>, save_dir: impl Into<PathBuf>) -> Self {
        Self {
            oracle,
            save_dir: save_dir.into(),
            invoker: None,
            rng_seed: None,
        }
    }

    /// Uses a custom reset invoker.
    #[must_use]
    pub fn with_invoker(mut self, invoker: Arc<dyn ResetInvoker>) -> Self {
        self.invoker = Some(invoker);
        self
    }

    /// Seeds the reset seed generator.
    #[must_use]
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }
}

impl Plugin for RestockPlugin {
    fn build(&self, _server: &mut Server) {}

    fn ready(&self, server: &mut Server) {
        let clock = server
            .get_global::<Clock>()
            .map(|clock| clock.provider())
            .unwrap_or_else(|| Clock::system().provider());
        let config = server
            .get_global::<Settings>()
            .map(|settings| settings.config().clone())
            .unwrap_or_default();

        let store = Arc::new(JsonFileStore::in_dir(&self.save_dir));
        let mut builder = Engine::builder(config, Arc::clone(&self.oracle), store).clock(clock);
        if let Some(invoker) = &self.invoker {
            builder = builder.invoker(Arc::clone(invoker));
        }
        if let Some(seed) = self.rng_seed {
            builder = builder.rng_seed(seed);
        }
        server.insert_resource(builder.start());
    }

    fn update(&self, server: &mut Server, _schedule: ScheduleId) {
        if let Some(mut engine) = server.get_resource_mut::<Engine>() {
            engine.tick();
        }
    }

    fn cleanup(&self, server: &mut Server) {
        let Some(engine) = server.remove_resource::<Engine>() else {
            return;
        };
        if let Err(err) = engine.shutdown() {
            tracing::error!(error = %err, "failed to save tracked containers at shutdown");
        }
    }

    fn tick_schedules(&self) -> Vec<ScheduleId> {
        vec![ScheduleId::of::<ServerTick>()]
    }

    fn dependencies(&self) -> Vec<PluginId> {
        vec![
            PluginId::of::<TimePlugin>(),
            PluginId::of::<SettingsPlugin>(),
        ]
    }
}
