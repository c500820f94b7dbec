//! Plugins: units of functionality installed into a host session.
//!
//! Everything the session does beyond storing resources comes from plugins.
//! The clock, logging, settings and the reset engine are each a plugin, and
//! a host can swap any of them out.
//!
//! # Example
//!
//! ```
//! use restock_system::plugin::{Plugin, PluginId};
//! use restock_system::server::Server;
//!
//! struct SaveRoot(std::path::PathBuf);
//!
//! struct SaveRootPlugin;
//!
//! impl Plugin for SaveRootPlugin {
//!     fn build(&self, server: &mut Server) {
//!         server.insert_resource(SaveRoot("world".into()));
//!     }
//! }
//!
//! struct AutosavePlugin;
//!
//! impl Plugin for AutosavePlugin {
//!     fn build(&self, _server: &mut Server) {}
//!
//!     fn dependencies(&self) -> Vec<PluginId> {
//!         vec![PluginId::of::<SaveRootPlugin>()]
//!     }
//! }
//!
//! let mut server = Server::new();
//! server.add_plugins(AutosavePlugin).add_plugins(SaveRootPlugin);
//! server.finish();
//! assert!(server.contains_resource::<SaveRoot>());
//! ```

mod schedule;

pub use schedule::{Schedule, ScheduleId, ServerTick};

use core::any::TypeId;
use std::sync::Arc;

use crate::server::Server;

// ─────────────────────────────────────────────────────────────────────────────
// PluginId
// ─────────────────────────────────────────────────────────────────────────────

/// Identifies a plugin by its type.
///
/// Dependencies name plugins by id, and the server uses ids to reject
/// duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PluginId {
    type_id: TypeId,
    type_name: &'static str,
}

impl PluginId {
    /// The id of plugin type `P`.
    #[must_use]
    pub fn of<P: Plugin>() -> Self {
        Self {
            type_id: TypeId::of::<P>(),
            type_name: core::any::type_name::<P>(),
        }
    }

    /// The plugin's `TypeId`.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// The plugin's type name, for messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Plugin Trait
// ─────────────────────────────────────────────────────────────────────────────

/// A unit of session functionality.
///
/// Plugins follow a strict lifecycle managed by the [`Server`]:
///
/// 1. **Build** - `build()` in dependency order, while the session is assembled
/// 2. **Ready** - `ready()` in dependency order, once every plugin is built
/// 3. **Tick** - `update()` each time a schedule the plugin registered for fires
/// 4. **Cleanup** - `cleanup()` in reverse dependency order at session end
pub trait Plugin: Send + Sync + 'static {
    /// Registers resources. Called once, before any plugin is ready.
    fn build(&self, server: &mut Server);

    /// Called after every plugin has been built.
    ///
    /// Work that needs other plugins' resources, or that touches disk,
    /// belongs here rather than in `build()`.
    fn ready(&self, _server: &mut Server) {}

    /// Called when a schedule from [`tick_schedules()`](Self::tick_schedules)
    /// fires.
    fn update(&self, _server: &mut Server, _schedule: ScheduleId) {}

    /// Called when the session ends, in reverse dependency order.
    fn cleanup(&self, _server: &mut Server) {}

    /// Schedules this plugin receives updates on. Empty by default.
    fn tick_schedules(&self) -> Vec<ScheduleId> {
        Vec::new()
    }

    /// Name used in log and panic messages.
    fn name(&self) -> &str {
        core::any::type_name::<Self>()
    }

    /// Plugins that must be built before this one.
    ///
    /// [`Server::finish()`] panics if a dependency was never added.
    fn dependencies(&self) -> Vec<PluginId> {
        Vec::new()
    }

    /// Whether adding a second instance is an error. True by default.
    fn is_unique(&self) -> bool {
        true
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Plugins
// ─────────────────────────────────────────────────────────────────────────────

/// Types that can be passed to [`Server::add_plugins()`]: single plugins and
/// plugin groups.
pub trait Plugins {
    /// Queues every plugin on `server`.
    fn add_to_server(self, server: &mut Server);
}

impl<P: Plugin> Plugins for P {
    fn add_to_server(self, server: &mut Server) {
        server.add_plugin_shared(PluginId::of::<P>(), Arc::new(self));
    }
}

impl Plugins for PluginGroupBuilder {
    fn add_to_server(self, server: &mut Server) {
        for (id, plugin) in self.plugins {
            server.add_plugin_shared(id, plugin);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PluginGroup
// ─────────────────────────────────────────────────────────────────────────────

/// A bundle of plugins added together.
pub trait PluginGroup {
    /// Lists the group's plugins.
    fn build(self) -> PluginGroupBuilder;
}

/// Ordered plugin list produced by a [`PluginGroup`], editable before it is
/// added.
///
/// # Example
///
/// ```ignore
/// server.add_plugins(
///     DefaultPlugins::new(oracle, "world")
///         .build()
///         .disable::<TracingPlugin>()
///         .add(TracingPlugin::default().with_format(TracingFormat::Json)),
/// );
/// ```
#[derive(Default)]
pub struct PluginGroupBuilder {
    plugins: Vec<(PluginId, Arc<dyn Plugin>)>,
}

impl PluginGroupBuilder {
    /// An empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `plugin`.
    #[must_use]
    #[expect(
        clippy::should_implement_trait,
        reason = "builder method, not arithmetic"
    )]
    pub fn add<P: Plugin>(mut self, plugin: P) -> Self {
        let plugin: Arc<dyn Plugin> = Arc::new(plugin);
        self.plugins.push((PluginId::of::<P>(), plugin));
        self
    }

    /// Removes a plugin from the group by type. No-op if absent.
    #[must_use]
    pub fn disable<P: Plugin>(mut self) -> Self {
        let id = PluginId::of::<P>();
        self.plugins.retain(|(plugin_id, _)| *plugin_id != id);
        self
    }

    /// Returns true if the group contains a plugin of type `P`.
    #[must_use]
    pub fn contains<P: Plugin>(&self) -> bool {
        let id = PluginId::of::<P>();
        self.plugins.iter().any(|(plugin_id, _)| *plugin_id == id)
    }

    /// Number of plugins in the list.
    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Returns true if the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}
