//! Tick schedules.
//!
//! A schedule is identified by a marker type wrapped in a [`ScheduleId`].
//! The host decides when each schedule fires by calling
//! [`Server::tick()`](crate::server::Server::tick); plugins opt in through
//! [`Plugin::tick_schedules()`](super::Plugin::tick_schedules).

use core::any::TypeId;

/// Identifies a schedule by its marker type.
///
/// # Example
///
/// ```
/// # use restock_system::plugin::{Plugin, ScheduleId, ServerTick};
/// # use restock_system::server::Server;
/// # struct AutosavePlugin;
/// impl Plugin for AutosavePlugin {
///     fn build(&self, _server: &mut Server) {}
///
///     fn tick_schedules(&self) -> Vec<ScheduleId> {
///         vec![ScheduleId::of::<ServerTick>()]
///     }
///
///     fn update(&self, _server: &mut Server, _schedule: ScheduleId) {
///         // called once per host frame
///     }
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScheduleId {
    type_id: TypeId,
    type_name: &'static str,
}

impl ScheduleId {
    /// The id of schedule marker `S`.
    #[must_use]
    pub fn of<S: 'static>() -> Self {
        Self {
            type_id: TypeId::of::<S>(),
            type_name: core::any::type_name::<S>(),
        }
    }

    /// The marker's `TypeId`.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// The marker's type name, for messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

/// Implemented by schedule marker types.
pub trait Schedule: 'static {}

/// Fired once per host frame.
///
/// Frames arrive many times a second; plugins that need a slower cadence
/// gate themselves on wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerTick;

impl Schedule for ServerTick {}
