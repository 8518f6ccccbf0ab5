//! Platform layer for Quadra
//!
//! Opens a window with an OpenGL 3.3 core context and runs the frame loop
//! that draws the quad.

pub mod frame;
pub mod window;

pub use frame::FrameDriver;
pub use window::GlWindow;

use quadra_core::logging::LogCategory;
use quadra_core::{quadra_info, ErrorContext, QuadraConfig, QuadraError};
use quadra_renderer::RenderError;
use winit::event_loop::{ControlFlow, EventLoop};

/// Platform-specific error type
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("Window creation failed: {0}")]
    WindowCreation(String),

    #[error("OpenGL context error: {0}")]
    Context(String),

    #[error("Event loop error: {0}")]
    EventLoop(String),

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl From<PlatformError> for QuadraError {
    fn from(err: PlatformError) -> Self {
        match err {
            PlatformError::Render(err) => err.into(),
            other => {
                let operation = match &other {
                    PlatformError::WindowCreation(_) => "create window",
                    PlatformError::Context(_) => "create context",
                    _ => "run event loop",
                };
                QuadraError::platform_with_context(
                    other.to_string(),
                    ErrorContext::new(operation, "platform"),
                )
            }
        }
    }
}

/// Open the window and render until it is closed
pub fn run(config: QuadraConfig) -> Result<(), PlatformError> {
    let event_loop = EventLoop::new().map_err(|e| PlatformError::EventLoop(e.to_string()))?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = FrameDriver::new(config);
    event_loop
        .run_app(&mut app)
        .map_err(|e| PlatformError::EventLoop(e.to_string()))?;

    quadra_info!(LogCategory::Platform, "Event loop finished after {} frame(s)", app.frames());
    app.finish()
}
