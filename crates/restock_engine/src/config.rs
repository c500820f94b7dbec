//! Engine configuration and the reset policy.

use crate::clock::Timestamp;
use crate::error::ConfigError;
use core::fmt;
use core::str::FromStr;
use core::time::Duration;

/// Unit of the configured cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TimeUnit {
    /// Seconds.
    Seconds,
    /// Minutes.
    Minutes,
    /// Hours.
    Hours,
    /// Days.
    #[default]
    Days,
}

impl TimeUnit {
    /// Length of one unit.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        match self {
            Self::Seconds => Duration::from_secs(1),
            Self::Minutes => Duration::from_secs(60),
            Self::Hours => Duration::from_secs(60 * 60),
            Self::Days => Duration::from_secs(24 * 60 * 60),
        }
    }

    /// `value` units as a duration, saturating.
    #[must_use]
    pub fn times(&self, value: u64) -> Duration {
        Duration::from_secs(self.duration().as_secs().saturating_mul(value))
    }
}

impl FromStr for TimeUnit {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "seconds" => Ok(Self::Seconds),
            "minutes" => Ok(Self::Minutes),
            "hours" => Ok(Self::Hours),
            "days" => Ok(Self::Days),
            other => Err(ConfigError::invalid_value(
                "reset_time_unit",
                format!("unknown unit '{other}'"),
            )),
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Seconds => "seconds",
            Self::Minutes => "minutes",
            Self::Hours => "hours",
            Self::Days => "days",
        })
    }
}

/// Decides whether a tracked resource may be reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetPolicy {
    /// Minimum idle time since the last interaction.
    pub cooldown: Duration,
    /// Only reset resources that are currently empty.
    pub empty_only: bool,
}

impl ResetPolicy {
    /// Returns true if a resource last touched at `last` may be reset at `now`.
    ///
    /// The cooldown boundary is inclusive. `live_empty` is the emptiness of
    /// the resource as resolved this pass, never the recorded flag. A clock
    /// that stepped backwards never makes a resource eligible.
    #[must_use]
    pub fn is_eligible(&self, last: Timestamp, now: Timestamp, live_empty: bool) -> bool {
        let Some(elapsed) = now.elapsed_since(last) else {
            return false;
        };
        elapsed >= self.cooldown && (!self.empty_only || live_empty)
    }
}

impl Default for ResetPolicy {
    fn default() -> Self {
        Self {
            cooldown: TimeUnit::Days.times(7),
            empty_only: true,
        }
    }
}

/// Resolved engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Reset eligibility.
    pub policy: ResetPolicy,
    /// Track barrel-like containers as well as chest-like ones.
    pub include_secondary_containers: bool,
    /// Wall-clock interval between reconciliation passes.
    pub reconcile_interval: Duration,
    /// Search radius around a mobile resource's last known position.
    pub instance_search_radius: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            policy: ResetPolicy::default(),
            include_secondary_containers: false,
            reconcile_interval: Duration::from_secs(1),
            instance_search_radius: 2,
        }
    }
}

impl EngineConfig {
    /// Sets the cooldown.
    #[must_use]
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.policy.cooldown = cooldown;
        self
    }

    /// Sets whether only empty resources are reset.
    #[must_use]
    pub fn with_empty_only(mut self, empty_only: bool) -> Self {
        self.policy.empty_only = empty_only;
        self
    }

    /// Sets whether secondary containers are tracked.
    #[must_use]
    pub fn with_secondary_containers(mut self, include: bool) -> Self {
        self.include_secondary_containers = include;
        self
    }

    /// Sets the pass interval.
    #[must_use]
    pub fn with_reconcile_interval(mut self, interval: Duration) -> Self {
        self.reconcile_interval = interval;
        self
    }

    /// Sets the mobile resource search radius.
    #[must_use]
    pub fn with_instance_search_radius(mut self, radius: u32) -> Self {
        self.instance_search_radius = radius;
        self
    }
}
