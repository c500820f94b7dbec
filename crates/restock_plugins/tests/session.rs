//! End-to-end session tests: plugins, settings file and state file together.

use core::time::Duration;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use restock_engine::testing::{MockContainer, MockWorld};
use restock_engine::{BlockPos, ContainerInteraction, Engine, MockClock, STATE_FILE_NAME, Timestamp};
use restock_plugins::{
    Clock, DefaultPlugins, RestockPlugin, SETTINGS_FILE_NAME, Settings, SettingsPlugin,
    TimePlugin, TracingPlugin,
};
use restock_system::plugin::{PluginGroup, ServerTick};
use restock_system::server::Server;

const START: Timestamp = Timestamp::from_millis(1_700_000_000_000);

fn write_settings(dir: &Path, content: &str) {
    fs::write(dir.join(SETTINGS_FILE_NAME), content).expect("write settings");
}

fn session(world: &Arc<MockWorld>, clock: &Arc<MockClock>, dir: &Path) -> Server {
    let mut server = Server::new();
    server
        .add_plugins(RestockPlugin::new(world.clone(), dir).with_rng_seed(3))
        .add_plugins(SettingsPlugin::new(dir))
        .add_plugins(TimePlugin::with_clock(clock.clone()));
    server.finish();
    server
}

fn tracked(server: &Server) -> usize {
    server
        .get_resource::<Engine>()
        .map(|engine| engine.registry().len())
        .unwrap_or_default()
}

#[test]
fn session_resets_idle_chest_and_saves_on_cleanup() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_settings(
        dir.path(),
        "reset_time_value = 5\nreset_time_unit = \"seconds\"\nonly_reset_when_empty = false\n",
    );
    let world = Arc::new(MockWorld::new().with_partition("overworld"));
    let clock = Arc::new(MockClock::new(START));
    let pos = BlockPos::new(10, 64, -3);
    world.add_container("overworld", pos, MockContainer::with_items(4));

    let mut server = session(&world, &clock, dir.path());
    assert!(server.is_running());
    {
        let engine = server.get_resource::<Engine>().expect("engine installed");
        assert_eq!(engine.config().policy.cooldown, Duration::from_secs(5));
        assert!(!engine.config().policy.empty_only);
    }

    let tracked_now = server
        .get_resource_mut::<Engine>()
        .expect("engine installed")
        .record_container_interaction(
            ContainerInteraction::new("overworld", pos).with_template("t1", 42),
        );
    assert!(tracked_now);

    server.tick::<ServerTick>();
    assert_eq!(world.container("overworld", pos).unwrap().resets, 0);

    clock.advance(Duration::from_secs(5));
    server.tick::<ServerTick>();
    let chest = world.container("overworld", pos).unwrap();
    assert_eq!(chest.resets, 1);
    assert!(chest.changed);

    // Several frames inside one cadence interval run a single pass.
    server.tick::<ServerTick>();
    server.tick::<ServerTick>();
    assert_eq!(world.container("overworld", pos).unwrap().resets, 1);

    server.cleanup();
    assert!(!server.contains_resource::<Engine>());

    let state = fs::read_to_string(dir.path().join(STATE_FILE_NAME)).expect("state saved");
    let state: serde_json::Value = serde_json::from_str(&state).expect("state is json");
    let entry = &state["overworld:10,64,-3"];
    assert_eq!(entry["templateRef"], "t1");
    assert_eq!(entry["lastInteractionTime"], START.as_millis() + 5_000);
}

#[test]
fn next_session_resumes_tracked_state() {
    let dir = tempfile::tempdir().expect("tempdir");
    let world = Arc::new(MockWorld::new().with_partition("overworld"));
    let clock = Arc::new(MockClock::new(START));
    let pos = BlockPos::new(0, 70, 0);
    world.add_container("overworld", pos, MockContainer::with_items(2));

    let mut first = session(&world, &clock, dir.path());
    if let Some(mut engine) = first.get_resource_mut::<Engine>() {
        engine.record_container_interaction(
            ContainerInteraction::new("overworld", pos).with_template("t2", 7),
        );
    }
    first.cleanup();

    let second = session(&world, &clock, dir.path());
    assert_eq!(tracked(&second), 1);
}

#[test]
fn ticks_before_finish_do_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let world = Arc::new(MockWorld::new().with_partition("overworld"));
    let clock = Arc::new(MockClock::new(START));

    let mut server = Server::new();
    server
        .add_plugins(TimePlugin::with_clock(clock.clone()))
        .add_plugins(SettingsPlugin::new(dir.path()))
        .add_plugins(RestockPlugin::new(world.clone(), dir.path()));
    server.tick::<ServerTick>();

    assert!(!server.contains_resource::<Engine>());
    assert_eq!(world.resolve_calls(), 0);
    assert!(!dir.path().join(STATE_FILE_NAME).exists());
}

#[test]
fn missing_settings_file_is_created_with_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let world = Arc::new(MockWorld::new());
    let clock = Arc::new(MockClock::new(START));

    let server = session(&world, &clock, dir.path());

    let written = fs::read_to_string(dir.path().join(SETTINGS_FILE_NAME)).expect("settings file");
    assert!(written.contains("reset_time_value = 7"));
    assert!(written.contains("reset_time_unit = \"days\""));

    let settings = server.get_global::<Settings>().expect("settings installed");
    assert_eq!(settings.config().policy.cooldown, Duration::from_secs(7 * 86_400));
    assert!(settings.config().policy.empty_only);
}

#[test]
fn invalid_settings_fall_back_to_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_settings(dir.path(), "reset_time_value = 0\nreset_time_unit = \"seconds\"\n");
    let world = Arc::new(MockWorld::new());
    let clock = Arc::new(MockClock::new(START));

    let server = session(&world, &clock, dir.path());

    let engine = server.get_resource::<Engine>().expect("engine installed");
    assert_eq!(engine.config().policy.cooldown, Duration::from_secs(7 * 86_400));
}

#[test]
fn malformed_settings_fall_back_to_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_settings(dir.path(), "reset_time_value = [not toml");
    let world = Arc::new(MockWorld::new());
    let clock = Arc::new(MockClock::new(START));

    let server = session(&world, &clock, dir.path());

    let settings = server.get_global::<Settings>().expect("settings installed");
    assert_eq!(settings.config(), &restock_engine::EngineConfig::default());
}

#[test]
fn default_plugins_install_everything() {
    let dir = tempfile::tempdir().expect("tempdir");
    let world = Arc::new(MockWorld::new());

    let mut server = Server::new();
    server.add_plugins(DefaultPlugins::new(world, dir.path()).build());
    assert!(server.has_plugin::<TracingPlugin>());
    server.finish();

    assert!(server.contains_global::<Clock>());
    assert!(server.contains_global::<Settings>());
    assert!(server.contains_resource::<Engine>());
    server.cleanup();
    assert!(dir.path().join(STATE_FILE_NAME).exists());
}
