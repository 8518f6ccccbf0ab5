//! Quadra - a single quad drawn through an explicit, error-checked OpenGL
//! pipeline
//!
//! The workspace is split the usual way: [`quadra_core`] holds errors,
//! logging and configuration, [`quadra_renderer`] the driver boundary and
//! shader pipeline, and [`quadra_platform`] the window and frame loop.

pub use quadra_core;
pub use quadra_platform;
pub use quadra_renderer;

pub use quadra_core::{QuadraConfig, QuadraError, Result};
pub use quadra_platform::{run, PlatformError};

/// Unified prelude module that exports all commonly used types
pub mod prelude {
    pub use quadra_core::{
        DriverErrorPolicy, LogCategory, QuadraConfig, QuadraError, RendererConfig,
        StageFailurePolicy, WindowConfig,
    };
    pub use quadra_renderer::{
        gl_call, gl_call_logged, Driver, ErrorCode, ErrorHarness, GlowDriver, HeadlessDriver,
        Program, ProgramLinker, QuadRenderer, RenderError, ShaderProgramSource, ShaderStage,
    };
}

/// Load the configuration at `path`, initialize logging and run until the
/// window is closed
pub fn launch(config_path: impl AsRef<std::path::Path>) -> Result<()> {
    let config = QuadraConfig::load(config_path)?;
    quadra_core::init(&config)?;
    quadra_platform::run(config).map_err(report_failure)
}

/// Log a failed run with its context before it leaves the program
fn report_failure(err: PlatformError) -> QuadraError {
    let err = QuadraError::from(err);
    quadra_core::quadra_error!(quadra_core::LogCategory::Core, "{}", err.format_for_log());
    err
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
