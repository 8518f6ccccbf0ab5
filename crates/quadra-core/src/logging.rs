//! Logging system for Quadra
//!
//! All diagnostics go through `tracing`. Each subsystem logs under its own
//! target (`quadra::driver`, `quadra::shader`, ...) so they can be filtered
//! with ordinary `EnvFilter` directives such as `quadra::shader=debug`.

use crate::config::LoggingConfig;
use crate::error::{QuadraError, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log categories, one per subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogCategory {
    Core,
    Renderer,
    /// Error-harness reports from the graphics driver
    Driver,
    Shader,
    Platform,
}

impl LogCategory {
    /// The tracing target used for this category
    pub const fn as_str(&self) -> &'static str {
        match self {
            LogCategory::Core => "quadra::core",
            LogCategory::Renderer => "quadra::renderer",
            LogCategory::Driver => "quadra::driver",
            LogCategory::Shader => "quadra::shader",
            LogCategory::Platform => "quadra::platform",
        }
    }
}

impl std::fmt::Display for LogCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `config.filter`. Fails if a global
/// subscriber is already installed.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .map_err(|e| QuadraError::configuration(format!("Invalid log filter: {}", e)))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(config.with_target)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_file(config.with_file)
                .with_line_number(config.with_file)
                .compact(),
        )
        .try_init()
        .map_err(|e| QuadraError::initialization(format!("Failed to initialize logging: {}", e)))
}

#[macro_export]
macro_rules! quadra_trace {
    ($category:expr, $($arg:tt)*) => {
        $crate::tracing::trace!(target: $category.as_str(), $($arg)*)
    };
}

#[macro_export]
macro_rules! quadra_debug {
    ($category:expr, $($arg:tt)*) => {
        $crate::tracing::debug!(target: $category.as_str(), $($arg)*)
    };
}

#[macro_export]
macro_rules! quadra_info {
    ($category:expr, $($arg:tt)*) => {
        $crate::tracing::info!(target: $category.as_str(), $($arg)*)
    };
}

#[macro_export]
macro_rules! quadra_warn {
    ($category:expr, $($arg:tt)*) => {
        $crate::tracing::warn!(target: $category.as_str(), $($arg)*)
    };
}

#[macro_export]
macro_rules! quadra_error {
    ($category:expr, $($arg:tt)*) => {
        $crate::tracing::error!(target: $category.as_str(), $($arg)*)
    };
}

pub use quadra_debug;
pub use quadra_error;
pub use quadra_info;
pub use quadra_trace;
pub use quadra_warn;
