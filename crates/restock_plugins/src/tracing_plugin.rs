//! Log output for the session.
//!
//! [`TracingPlugin`] installs a `tracing_subscriber` subscriber when the
//! session becomes ready and publishes what it installed as
//! [`TracingConfig`]. Installing late lets a host swap the plugin out of
//! [`DefaultPlugins`](crate::DefaultPlugins) first. If the process already has
//! a global subscriber (a host that sets up its own logging, or a test
//! harness), that subscriber stays.
//!
//! # Example
//!
//! ```
//! use restock_plugins::{TracingFormat, TracingPlugin};
//! use restock_system::server::Server;
//! use tracing::Level;
//!
//! let mut server = Server::new();
//! server.add_plugins(
//!     TracingPlugin::default()
//!         .with_level(Level::DEBUG)
//!         .with_format(TracingFormat::Compact),
//! );
//! server.finish();
//! ```

use restock_system::plugin::Plugin;
use restock_system::resource::GlobalResource;
use restock_system::server::Server;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingFormat {
    /// Multi-line, colored. For a terminal.
    #[default]
    Pretty,
    /// One line per event.
    Compact,
    /// One JSON object per event, for log shipping.
    Json,
}

/// What [`TracingPlugin`] was configured with.
#[derive(Debug, Clone, Copy)]
pub struct TracingConfig {
    /// Most verbose level emitted when no filter directive says otherwise.
    pub level: Level,
    /// Line format.
    pub format: TracingFormat,
}

impl GlobalResource for TracingConfig {}

/// Installs the log subscriber.
///
/// Filtering comes from, in order of preference: an explicit
/// [`with_env_filter`](Self::with_env_filter) directive string, the
/// `RUST_LOG` environment variable, then the plain level.
///
/// ```
/// use restock_plugins::{TracingFormat, TracingPlugin};
///
/// TracingPlugin::new()
///     .with_format(TracingFormat::Json)
///     .with_env_filter("restock_engine=debug,restock_system=warn")
/// # ;
/// ```
#[derive(Clone)]
pub struct TracingPlugin {
    config: TracingConfig,
    directives: Option<String>,
    span_events: bool,
}

impl Default for TracingPlugin {
    fn default() -> Self {
        Self {
            config: TracingConfig {
                level: Level::INFO,
                format: TracingFormat::Pretty,
            },
            directives: None,
            span_events: false,
        }
    }
}

impl TracingPlugin {
    /// Info level, pretty output.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default level.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.config.level = level;
        self
    }

    /// Sets the line format.
    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.config.format = format;
        self
    }

    /// Sets filter directives (`target=level,...`). Directives that fail to
    /// parse are ignored in favor of the plain level.
    #[must_use]
    pub fn with_env_filter(mut self, directives: impl Into<String>) -> Self {
        self.directives = Some(directives.into());
        self
    }

    /// Also log span enter and exit.
    #[must_use]
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    fn filter(&self) -> EnvFilter {
        let level = || EnvFilter::new(self.config.level.as_str());
        match &self.directives {
            Some(directives) => EnvFilter::try_new(directives).unwrap_or_else(|_| level()),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| level()),
        }
    }

    fn output(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let spans = if self.span_events {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        };
        let layer = tracing_subscriber::fmt::layer().with_span_events(spans);
        match self.config.format {
            TracingFormat::Pretty => layer.pretty().boxed(),
            TracingFormat::Compact => layer.compact().boxed(),
            TracingFormat::Json => layer.json().boxed(),
        }
    }
}

impl Plugin for TracingPlugin {
    fn build(&self, server: &mut Server) {
        server.insert_global(self.config);
    }

    fn ready(&self, _server: &mut Server) {
        let installed = tracing_subscriber::registry()
            .with(self.output())
            .with(self.filter())
            .try_init()
            .is_ok();

        tracing::debug!(
            level = %self.config.level,
            format = ?self.config.format,
            installed,
            "logging ready"
        );
    }
}
