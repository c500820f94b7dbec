//! Tracked-container restocking for live simulation servers.
//!
//! The crate is split in three layers:
//!
//! - [`system`] - The host session: plugin lifecycle, resources and tick schedules
//! - [`engine`] - The reset engine: registry, reconciliation policy and persistence
//! - [`plugins`] - Clock, tracing, settings and the plugin wiring the engine into a session

pub use restock_engine as engine;
pub use restock_plugins as plugins;
pub use restock_system as system;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use restock_engine::prelude::*;
    pub use restock_plugins::{
        Clock, DefaultPlugins, RestockPlugin, Settings, SettingsPlugin, TimePlugin, TracingPlugin,
    };
    pub use restock_system::prelude::*;
}
