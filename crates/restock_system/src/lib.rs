//! Host session runtime for restock.
//!
//! `restock_system` models a running session of the host simulation:
//!
//! - [`plugin`] - Plugin trait, plugin groups and tick schedules
//! - [`resource`] - Global and session resource storage
//! - [`server`] - The session itself: plugin lifecycle and ticking
//!
//! # Example
//!
//! ```
//! use restock_system::plugin::{Plugin, ScheduleId, ServerTick};
//! use restock_system::server::Server;
//!
//! #[derive(Default)]
//! struct Frames(u64);
//!
//! struct FrameCounterPlugin;
//!
//! impl Plugin for FrameCounterPlugin {
//!     fn build(&self, server: &mut Server) {
//!         server.insert_resource(Frames::default());
//!     }
//!
//!     fn tick_schedules(&self) -> Vec<ScheduleId> {
//!         vec![ScheduleId::of::<ServerTick>()]
//!     }
//!
//!     fn update(&self, server: &mut Server, _schedule: ScheduleId) {
//!         if let Some(mut frames) = server.get_resource_mut::<Frames>() {
//!             frames.0 += 1;
//!         }
//!     }
//! }
//!
//! let mut server = Server::new();
//! server.add_plugins(FrameCounterPlugin);
//! server.finish();
//! server.tick::<ServerTick>();
//! server.tick::<ServerTick>();
//! assert_eq!(server.get_resource::<Frames>().unwrap().0, 2);
//! server.cleanup();
//! ```

/// Plugin trait for extensible functionality.
pub mod plugin;

/// Resource container management.
pub mod resource;

/// Host session runtime.
pub mod server;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::plugin::*;
    pub use crate::resource::*;
    pub use crate::server::*;
}
