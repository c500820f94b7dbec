//! Session plugins for restock.
//!
//! | Plugin | Provides |
//! |--------|----------|
//! | [`TimePlugin`] | [`Clock`] global |
//! | [`TracingPlugin`] | Subscriber setup, [`TracingConfig`] global |
//! | [`SettingsPlugin`] | `restock.toml`, [`Settings`] global |
//! | [`RestockPlugin`] | The reset [`Engine`](restock_engine::engine::Engine) as a session resource |
//!
//! [`DefaultPlugins`] bundles all four.
//!
//! # Example
//!
//! ```ignore
//! use restock_plugins::DefaultPlugins;
//! use restock_system::plugin::{PluginGroup, ServerTick};
//! use restock_system::server::Server;
//!
//! let mut server = Server::new();
//! server.add_plugins(DefaultPlugins::new(world, "saves/world").build());
//! server.finish();
//!
//! loop {
//!     server.tick::<ServerTick>();
//! }
//! ```

mod restock;
mod settings;
mod time;
mod tracing_plugin;

pub use restock::RestockPlugin;
pub use settings::{SETTINGS_FILE_NAME, Settings, SettingsFile, SettingsPlugin};
pub use time::{Clock, TimePlugin};
pub use tracing_plugin::{TracingConfig, TracingFormat, TracingPlugin};

use restock_engine::host::AvailabilityOracle;
use restock_system::plugin::{PluginGroup, PluginGroupBuilder};
use std::path::PathBuf;
use std::sync::Arc;

/// Everything a host needs to run the reset engine.
///
/// Settings and state both live in the save directory.
///
/// # Included Plugins
///
/// - [`TimePlugin`]
/// - [`TracingPlugin`]
/// - [`SettingsPlugin`]
/// - [`RestockPlugin`]
pub struct DefaultPlugins {
    oracle: Arc<dyn AvailabilityOracle>,
    save_dir: PathBuf,
}

impl DefaultPlugins {
    /// Creates the group for the world behind `oracle`.
    #[must_use]
    pub fn new(oracle: Arc<dyn AvailabilityOracle>, save_dir: impl Into<PathBuf>) -> Self {
        Self {
            oracle,
            save_dir: save_dir.into(),
        }
    }
}

impl PluginGroup for DefaultPlugins {
    fn build(self) -> PluginGroupBuilder {
        PluginGroupBuilder::new()
            .add(TimePlugin::default())
            .add(TracingPlugin::default())
            .add(SettingsPlugin::new(self.save_dir.clone()))
            .add(RestockPlugin::new(self.oracle, self.save_dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use restock_engine::testing::MockWorld;

    #[test]
    fn default_plugins_contents() {
        let builder = DefaultPlugins::new(Arc::new(MockWorld::new()), "saves").build();
        assert_eq!(builder.len(), 4);
        assert!(builder.contains::<TimePlugin>());
        assert!(builder.contains::<TracingPlugin>());
        assert!(builder.contains::<SettingsPlugin>());
        assert!(builder.contains::<RestockPlugin>());
    }
}
