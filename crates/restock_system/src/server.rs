//! The host session.
//!
//! A [`Server`] stands for one running session of the host simulation. It
//! owns the session's resources and walks its plugins through their
//! lifecycle:
//!
//! 1. [`Server::finish()`] orders plugins so each comes after the plugins it
//!    depends on, builds them in that order, then readies them
//! 2. The host calls [`Server::tick()`] once per frame
//! 3. [`Server::cleanup()`] tears plugins down, dependents first
//!
//! Ticks before `finish()` or after `cleanup()` do nothing: a plugin only
//! sees updates while the session is established.
//!
//! ```ignore
//! let mut server = Server::new();
//! server.add_plugins(DefaultPlugins::new(world, "saves/world").build());
//! server.finish();
//!
//! while host.is_running() {
//!     host.step();
//!     server.tick::<ServerTick>();
//! }
//!
//! server.cleanup();
//! ```

use crate::plugin::{Plugin, PluginId, Plugins, Schedule, ScheduleId};
use crate::resource::{GlobalResource, Resource, ResourceRef, ResourceRefMut, Resources};
use hashbrown::{HashMap, HashSet};
use std::sync::Arc;

/// Where a session is in its lifecycle. Only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum SessionState {
    /// Plugins are being added.
    #[default]
    Assembling,
    /// `finish()` is building and readying plugins.
    Building,
    /// The session is established and accepts ticks.
    Running,
    /// `cleanup()` has run.
    Stopped,
}

struct Installed {
    id: PluginId,
    plugin: Arc<dyn Plugin>,
}

/// The host session: plugins plus the resources they share.
pub struct Server {
    /// Read-only, session-lifetime resources.
    global: Resources,
    /// Mutable session resources.
    resources: Resources,
    /// Added, waiting for `finish()`.
    queued: Vec<Installed>,
    /// Built, in dependency order.
    installed: Vec<Installed>,
    added: HashSet<PluginId>,
    /// Schedule -> indices into `installed`.
    subscribers: HashMap<ScheduleId, Vec<usize>>,
    state: SessionState,
}

impl Default for Server {
    fn default() -> Self {
        Self::new()
    }
}

impl Server {
    /// Creates a session with no plugins.
    #[must_use]
    pub fn new() -> Self {
        Self {
            global: Resources::new(),
            resources: Resources::new(),
            queued: Vec::new(),
            installed: Vec::new(),
            added: HashSet::new(),
            subscribers: HashMap::new(),
            state: SessionState::Assembling,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Plugins
    // ─────────────────────────────────────────────────────────────────────────

    /// Adds a plugin or a plugin group.
    ///
    /// # Panics
    ///
    /// Panics if a unique plugin is added twice.
    pub fn add_plugins<P: Plugins>(&mut self, plugins: P) -> &mut Self {
        plugins.add_to_server(self);
        self
    }

    pub(crate) fn add_plugin_shared(&mut self, id: PluginId, plugin: Arc<dyn Plugin>) {
        if !self.added.insert(id) && plugin.is_unique() {
            panic!(
                "plugin {} added twice; override is_unique() to allow several instances",
                plugin.name()
            );
        }

        let entry = Installed { id, plugin };
        // Added from another plugin's build(): build it on the spot.
        if self.state == SessionState::Building {
            entry.plugin.build(self);
            self.installed.push(entry);
        } else {
            self.queued.push(entry);
        }
    }

    /// Returns true if a plugin of type `P` was added.
    #[must_use]
    pub fn has_plugin<P: Plugin>(&self) -> bool {
        self.added.contains(&PluginId::of::<P>())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Resources
    // ─────────────────────────────────────────────────────────────────────────

    /// Inserts a mutable session resource, returning the one it replaced.
    pub fn insert_resource<R: Resource>(&mut self, resource: R) -> Option<R> {
        self.resources.insert(resource)
    }

    /// Returns true if the session holds a resource of type `R`.
    #[must_use]
    pub fn contains_resource<R: Resource>(&self) -> bool {
        self.resources.contains::<R>()
    }

    /// Borrows a session resource.
    ///
    /// `None` if it is absent or currently borrowed mutably.
    #[must_use]
    pub fn get_resource<R: Resource>(&self) -> Option<ResourceRef<'_, R>> {
        self.resources.get::<R>().ok()
    }

    /// Borrows a session resource mutably.
    ///
    /// `None` if it is absent or currently borrowed.
    #[must_use]
    pub fn get_resource_mut<R: Resource>(&self) -> Option<ResourceRefMut<'_, R>> {
        self.resources.get_mut::<R>().ok()
    }

    /// Takes a session resource out of the session.
    pub fn remove_resource<R: Resource>(&mut self) -> Option<R> {
        self.resources.remove::<R>()
    }

    /// Inserts a global resource, returning the one it replaced.
    pub fn insert_global<R: GlobalResource>(&mut self, resource: R) -> Option<R> {
        self.global.insert(resource)
    }

    /// Returns true if the session holds a global of type `R`.
    #[must_use]
    pub fn contains_global<R: GlobalResource>(&self) -> bool {
        self.global.contains::<R>()
    }

    /// Borrows a global resource.
    #[must_use]
    pub fn get_global<R: GlobalResource>(&self) -> Option<ResourceRef<'_, R>> {
        self.global.get::<R>().ok()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns true between [`finish()`](Self::finish) and
    /// [`cleanup()`](Self::cleanup).
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    /// Fires the schedule `S`.
    ///
    /// Plugins that registered for `S` have `update()` called, in dependency
    /// order. Does nothing unless the session is running.
    pub fn tick<S: Schedule>(&mut self) {
        self.tick_schedule(ScheduleId::of::<S>());
    }

    /// Fires the schedule with the given id.
    pub fn tick_schedule(&mut self, schedule: ScheduleId) {
        if self.state != SessionState::Running {
            return;
        }
        let Some(indices) = self.subscribers.get(&schedule) else {
            return;
        };
        let plugins: Vec<Arc<dyn Plugin>> = indices
            .iter()
            .map(|&idx| Arc::clone(&self.installed[idx].plugin))
            .collect();

        for plugin in plugins {
            plugin.update(self, schedule);
        }
    }

    /// Builds and readies every plugin, establishing the session.
    ///
    /// # Panics
    ///
    /// - If a plugin depends on one that was never added
    /// - If plugin dependencies form a cycle
    /// - If the session was already finished
    pub fn finish(&mut self) {
        if self.state != SessionState::Assembling {
            panic!("session already finished");
        }

        let ordered = self.dependency_order();

        self.state = SessionState::Building;
        for entry in ordered {
            entry.plugin.build(self);
            self.installed.push(entry);
        }

        for plugin in self.snapshot(false) {
            plugin.ready(self);
        }

        self.subscribers.clear();
        for (idx, entry) in self.installed.iter().enumerate() {
            for schedule in entry.plugin.tick_schedules() {
                self.subscribers.entry(schedule).or_default().push(idx);
            }
        }
        self.state = SessionState::Running;
    }

    /// Ends the session, cleaning up plugins in reverse dependency order.
    ///
    /// Only the first call after [`finish()`](Self::finish) has any effect.
    pub fn cleanup(&mut self) {
        if self.state != SessionState::Running {
            return;
        }
        for plugin in self.snapshot(true) {
            plugin.cleanup(self);
        }
        self.state = SessionState::Stopped;
    }

    fn snapshot(&self, reversed: bool) -> Vec<Arc<dyn Plugin>> {
        let plugins = self.installed.iter().map(|entry| Arc::clone(&entry.plugin));
        if reversed {
            plugins.rev().collect()
        } else {
            plugins.collect()
        }
    }

    /// Drains the queue into an order where every plugin follows its
    /// dependencies. Ties keep insertion order.
    fn dependency_order(&mut self) -> Vec<Installed> {
        let queued = core::mem::take(&mut self.queued);
        let n = queued.len();

        let mut waiting_on = vec![0usize; n];
        let mut unblocks: Vec<Vec<usize>> = vec![Vec::new(); n];
        {
            let position: HashMap<PluginId, usize> = queued
                .iter()
                .enumerate()
                .map(|(i, entry)| (entry.id, i))
                .collect();

            for (i, entry) in queued.iter().enumerate() {
                for dep in entry.plugin.dependencies() {
                    if let Some(&d) = position.get(&dep) {
                        unblocks[d].push(i);
                        waiting_on[i] += 1;
                    } else if !self.installed.iter().any(|built| built.id == dep) {
                        panic!(
                            "plugin {} depends on {}, which was not added",
                            entry.plugin.name(),
                            dep.type_name()
                        );
                    }
                }
            }
        }

        let mut ready: Vec<usize> = (0..n).rev().filter(|&i| waiting_on[i] == 0).collect();
        let mut order: Vec<usize> = Vec::with_capacity(n);
        while let Some(idx) = ready.pop() {
            order.push(idx);
            for &next in unblocks[idx].iter().rev() {
                waiting_on[next] -= 1;
                if waiting_on[next] == 0 {
                    ready.push(next);
                }
            }
        }

        if order.len() != n {
            let stuck: Vec<&str> = (0..n)
                .filter(|&i| waiting_on[i] > 0)
                .map(|i| queued[i].plugin.name())
                .collect();
            panic!("plugin dependency cycle between {stuck:?}");
        }

        let mut slots: Vec<Option<Installed>> = queued.into_iter().map(Some).collect();
        order
            .into_iter()
            .filter_map(|idx| slots[idx].take())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::ServerTick;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Journal(Mutex<Vec<String>>);

    impl Journal {
        fn push(&self, entry: impl Into<String>) {
            self.0.lock().push(entry.into());
        }

        fn entries(&self) -> Vec<String> {
            self.0.lock().clone()
        }
    }

    struct Recorder {
        label: &'static str,
        journal: Arc<Journal>,
        deps: Vec<PluginId>,
    }

    impl Plugin for Recorder {
        fn build(&self, _server: &mut Server) {
            self.journal.push(format!("build:{}", self.label));
        }

        fn ready(&self, _server: &mut Server) {
            self.journal.push(format!("ready:{}", self.label));
        }

        fn update(&self, _server: &mut Server, _schedule: ScheduleId) {
            self.journal.push(format!("update:{}", self.label));
        }

        fn cleanup(&self, _server: &mut Server) {
            self.journal.push(format!("cleanup:{}", self.label));
        }

        fn tick_schedules(&self) -> Vec<ScheduleId> {
            vec![ScheduleId::of::<ServerTick>()]
        }

        fn dependencies(&self) -> Vec<PluginId> {
            self.deps.clone()
        }

        fn is_unique(&self) -> bool {
            false
        }
    }

    #[test]
    fn lifecycle_order() {
        let journal = Arc::new(Journal::default());
        let mut server = Server::new();
        server.add_plugins(Recorder {
            label: "a",
            journal: journal.clone(),
            deps: Vec::new(),
        });
        server.add_plugins(Recorder {
            label: "b",
            journal: journal.clone(),
            deps: Vec::new(),
        });

        server.tick::<ServerTick>();
        server.finish();
        server.tick::<ServerTick>();
        server.cleanup();
        server.tick::<ServerTick>();
        server.cleanup();

        assert_eq!(
            journal.entries(),
            vec![
                "build:a", "build:b", "ready:a", "ready:b", "update:a", "update:b", "cleanup:b",
                "cleanup:a"
            ]
        );
    }

    #[test]
    fn running_state() {
        let mut server = Server::new();
        assert!(!server.is_running());
        server.finish();
        assert!(server.is_running());
        server.cleanup();
        assert!(!server.is_running());
    }

    struct Loaded;

    struct Settings;
    impl Plugin for Settings {
        fn build(&self, server: &mut Server) {
            server.insert_resource(Loaded);
        }
    }

    struct Engine;
    impl Plugin for Engine {
        fn build(&self, server: &mut Server) {
            assert!(server.contains_resource::<Loaded>());
        }
        fn dependencies(&self) -> Vec<PluginId> {
            vec![PluginId::of::<Settings>()]
        }
    }

    #[test]
    fn dependencies_build_first() {
        let mut server = Server::new();
        server.add_plugins(Engine).add_plugins(Settings);
        server.finish();
    }

    #[test]
    #[should_panic(expected = "which was not added")]
    fn missing_dependency_panics() {
        let mut server = Server::new();
        server.add_plugins(Engine);
        server.finish();
    }

    #[test]
    #[should_panic(expected = "added twice")]
    fn duplicate_unique_plugin_panics() {
        let mut server = Server::new();
        server.add_plugins(Settings).add_plugins(Settings);
    }

    #[test]
    #[should_panic(expected = "already finished")]
    fn finish_twice_panics() {
        let mut server = Server::new();
        server.finish();
        server.finish();
    }

    struct Cyclic<const N: u8>;
    impl<const N: u8> Plugin for Cyclic<N> {
        fn build(&self, _server: &mut Server) {}
        fn dependencies(&self) -> Vec<PluginId> {
            if N == 0 {
                vec![PluginId::of::<Cyclic<1>>()]
            } else {
                vec![PluginId::of::<Cyclic<0>>()]
            }
        }
    }

    #[test]
    #[should_panic(expected = "dependency cycle")]
    fn cycle_panics() {
        let mut server = Server::new();
        server.add_plugins(Cyclic::<0>).add_plugins(Cyclic::<1>);
        server.finish();
    }

    #[test]
    fn global_and_session_resources_are_separate() {
        struct Marker(u8);
        impl GlobalResource for Marker {}

        let mut server = Server::new();
        server.insert_global(Marker(1));
        assert!(server.contains_global::<Marker>());
        assert!(!server.contains_resource::<Marker>());

        server.insert_resource(5_u32);
        *server.get_resource_mut::<u32>().unwrap() += 1;
        assert_eq!(*server.get_resource::<u32>().unwrap(), 6);
        assert_eq!(server.remove_resource::<u32>(), Some(6));
        assert_eq!(server.get_global::<Marker>().unwrap().0, 1);
    }
}
