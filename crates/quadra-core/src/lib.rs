//! Core functionality for Quadra
//!
//! Error types, logging bootstrap and configuration shared by the renderer
//! and platform crates.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{
    DriverErrorPolicy, LoggingConfig, QuadraConfig, RendererConfig, StageFailurePolicy,
    WindowConfig,
};
pub use error::{ErrorContext, QuadraError, Result};
pub use logging::LogCategory;

#[doc(hidden)]
pub use tracing;

/// Framework version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize logging from the given configuration
pub fn init(config: &QuadraConfig) -> Result<()> {
    logging::init(&config.logging)?;
    quadra_info!(LogCategory::Core, "Quadra Core v{} initialized", VERSION);
    Ok(())
}
