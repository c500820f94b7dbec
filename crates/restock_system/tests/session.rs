//! Session lifecycle tests for `restock_system`.
//!
//! These exercise the server the way a host drives it: plugins are added,
//! the session is established, frames tick, and the session ends.

use core::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use restock_system::plugin::{
    Plugin, PluginGroup, PluginGroupBuilder, PluginId, Schedule, ScheduleId, ServerTick,
};
use restock_system::resource::GlobalResource;
use restock_system::server::Server;

struct Limits {
    max_tracked: usize,
}

impl GlobalResource for Limits {}

struct LimitsPlugin;

impl Plugin for LimitsPlugin {
    fn build(&self, server: &mut Server) {
        server.insert_global(Limits { max_tracked: 64 });
    }
}

#[derive(Default)]
struct Tracked(Vec<u32>);

struct TrackerPlugin {
    updates: Arc<AtomicUsize>,
}

impl Plugin for TrackerPlugin {
    fn build(&self, _server: &mut Server) {}

    fn ready(&self, server: &mut Server) {
        let capacity = server
            .get_global::<Limits>()
            .map(|limits| limits.max_tracked)
            .unwrap_or_default();
        server.insert_resource(Tracked(Vec::with_capacity(capacity)));
    }

    fn update(&self, server: &mut Server, _schedule: ScheduleId) {
        self.updates.fetch_add(1, Ordering::SeqCst);
        if let Some(mut tracked) = server.get_resource_mut::<Tracked>() {
            tracked.0.push(1);
        }
    }

    fn cleanup(&self, server: &mut Server) {
        server.remove_resource::<Tracked>();
    }

    fn tick_schedules(&self) -> Vec<ScheduleId> {
        vec![ScheduleId::of::<ServerTick>()]
    }

    fn dependencies(&self) -> Vec<PluginId> {
        vec![PluginId::of::<LimitsPlugin>()]
    }
}

struct SessionPlugins {
    updates: Arc<AtomicUsize>,
}

impl PluginGroup for SessionPlugins {
    fn build(self) -> PluginGroupBuilder {
        PluginGroupBuilder::new()
            .add(TrackerPlugin {
                updates: self.updates,
            })
            .add(LimitsPlugin)
    }
}

struct Autosave;
impl Schedule for Autosave {}

#[test]
fn group_plugins_follow_session_lifecycle() {
    let updates = Arc::new(AtomicUsize::new(0));
    let mut server = Server::new();
    server.add_plugins(
        SessionPlugins {
            updates: updates.clone(),
        }
        .build(),
    );
    assert!(server.has_plugin::<LimitsPlugin>());
    assert!(server.has_plugin::<TrackerPlugin>());

    server.finish();
    assert!(server.contains_resource::<Tracked>());

    for _ in 0..3 {
        server.tick::<ServerTick>();
    }
    server.tick::<Autosave>();
    assert_eq!(updates.load(Ordering::SeqCst), 3);
    assert_eq!(server.get_resource::<Tracked>().unwrap().0.len(), 3);

    server.cleanup();
    assert!(!server.contains_resource::<Tracked>());

    server.tick::<ServerTick>();
    assert_eq!(updates.load(Ordering::SeqCst), 3);
}

#[test]
fn disabled_group_member_is_not_added() {
    let updates = Arc::new(AtomicUsize::new(0));
    let mut server = Server::new();
    server.add_plugins(
        SessionPlugins { updates }
            .build()
            .disable::<TrackerPlugin>(),
    );
    server.finish();

    assert!(server.has_plugin::<LimitsPlugin>());
    assert!(!server.has_plugin::<TrackerPlugin>());
    assert!(server.contains_global::<Limits>());
}
