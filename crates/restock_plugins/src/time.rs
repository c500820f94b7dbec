//! Time plugin and the session clock.
//!
//! [`TimePlugin`] installs a [`Clock`] global. Everything in the session that
//! needs wall-clock time reads it through the clock, so tests can swap in a
//! [`MockClock`](restock_engine::clock::MockClock) and step time by hand.

use restock_engine::clock::{ClockProvider, SystemClock, Timestamp};
use restock_system::plugin::Plugin;
use restock_system::resource::GlobalResource;
use restock_system::server::Server;
use std::sync::Arc;

// ─────────────────────────────────────────────────────────────────────────────
// Clock Resource
// ─────────────────────────────────────────────────────────────────────────────

/// Session clock.
///
/// Global resource wrapping a [`ClockProvider`].
#[derive(Clone)]
pub struct Clock {
    provider: Arc<dyn ClockProvider>,
}

impl GlobalResource for Clock {}

impl Default for Clock {
    fn default() -> Self {
        Self::system()
    }
}

impl Clock {
    /// Creates a clock backed by the system wall clock.
    #[must_use]
    pub fn system() -> Self {
        Self {
            provider: Arc::new(SystemClock),
        }
    }

    /// Creates a clock backed by a custom provider.
    #[must_use]
    pub fn with_provider(provider: Arc<dyn ClockProvider>) -> Self {
        Self { provider }
    }

    /// Returns the current wall-clock time.
    #[must_use]
    pub fn now(&self) -> Timestamp {
        self.provider.now()
    }

    /// Returns the underlying provider.
    #[must_use]
    pub fn provider(&self) -> Arc<dyn ClockProvider> {
        Arc::clone(&self.provider)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TimePlugin
// ─────────────────────────────────────────────────────────────────────────────

/// Installs the session [`Clock`].
///
/// # Resources Provided
///
/// | Resource | Scope | Description |
/// |----------|-------|-------------|
/// | [`Clock`] | Global | Wall-clock time source |
///
/// # Testing with Mock Clock
///
/// ```ignore
/// let mock = Arc::new(MockClock::new(Timestamp::EPOCH));
/// server.add_plugins(TimePlugin::with_clock(mock.clone()));
/// server.finish();
///
/// mock.advance(Duration::from_secs(60));
/// ```
#[derive(Clone, Default)]
pub struct TimePlugin {
    /// Custom clock provider (for testing).
    clock: Option<Arc<dyn ClockProvider>>,
}

impl TimePlugin {
    /// Creates a new `TimePlugin` with the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a `TimePlugin` with a custom clock provider.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn ClockProvider>) -> Self {
        Self { clock: Some(clock) }
    }
}

impl Plugin for TimePlugin {
    fn build(&self, server: &mut Server) {
        let clock = match &self.clock {
            Some(provider) => Clock::with_provider(Arc::clone(provider)),
            None => Clock::system(),
        };
        server.insert_global(clock);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::time::Duration;
    use restock_engine::clock::MockClock;

    #[test]
    fn time_plugin_registers_clock() {
        let mut server = Server::new();
        server.add_plugins(TimePlugin::default());
        server.finish();

        assert!(server.contains_global::<Clock>());
    }

    #[test]
    fn mock_clock_is_shared_with_the_session() {
        let mock = Arc::new(MockClock::new(Timestamp::from_millis(1_000)));
        let mut server = Server::new();
        server.add_plugins(TimePlugin::with_clock(mock.clone()));
        server.finish();

        mock.advance(Duration::from_secs(60));
        let clock = server.get_global::<Clock>().unwrap();
        assert_eq!(clock.now(), Timestamp::from_millis(61_000));
        assert_eq!(clock.provider().now(), Timestamp::from_millis(61_000));
    }
}
