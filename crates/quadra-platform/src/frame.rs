//! winit application handler driving the render loop

use crate::window::GlWindow;
use crate::PlatformError;
use quadra_core::logging::LogCategory;
use quadra_core::{quadra_debug, quadra_error, quadra_info, QuadraConfig};
use quadra_renderer::{GlowDriver, QuadRenderer};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::ActiveEventLoop;
use winit::window::WindowId;

/// Renderer plus the window it draws into. The renderer is declared first
/// so its resources are released while the context still exists.
struct RunningState {
    renderer: Option<QuadRenderer<GlowDriver>>,
    window: GlWindow,
}

/// Creates the window on resume, then clears, draws and presents one frame
/// per redraw until the window is closed.
///
/// Failures stop the event loop and are kept for [`FrameDriver::finish`].
pub struct FrameDriver {
    config: QuadraConfig,
    state: Option<RunningState>,
    frames: u64,
    error: Option<PlatformError>,
}

impl FrameDriver {
    pub fn new(config: QuadraConfig) -> Self {
        Self {
            config,
            state: None,
            frames: 0,
            error: None,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// The first error that stopped the loop, if any
    pub fn finish(self) -> Result<(), PlatformError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: PlatformError) {
        quadra_error!(LogCategory::Platform, "{}", err);
        if self.error.is_none() {
            self.error = Some(err);
        }
        event_loop.exit();
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<(), PlatformError> {
        let (window, driver) = GlWindow::create(event_loop, &self.config.window)?;
        let renderer = QuadRenderer::new(driver, &self.config.renderer)?;

        let size = window.window().inner_size();
        renderer.resize(size.width, size.height).map_err(quadra_renderer::RenderError::from)?;

        window.request_redraw();
        self.state = Some(RunningState {
            renderer: Some(renderer),
            window,
        });
        Ok(())
    }

    fn redraw(&mut self) -> Result<(), PlatformError> {
        let Some(state) = &self.state else {
            return Ok(());
        };
        if let Some(renderer) = &state.renderer {
            renderer.render_frame().map_err(quadra_renderer::RenderError::from)?;
        }
        state.window.swap_buffers()?;
        self.frames += 1;
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), PlatformError> {
        let Some(state) = &self.state else {
            return Ok(());
        };
        state.window.resize(width, height);
        if let Some(renderer) = &state.renderer {
            renderer.resize(width, height).map_err(quadra_renderer::RenderError::from)?;
        }
        Ok(())
    }

    /// Release GL objects while the context is still current
    fn teardown(&mut self) -> Result<(), PlatformError> {
        let Some(mut state) = self.state.take() else {
            return Ok(());
        };
        if let Some(renderer) = state.renderer.take() {
            renderer.destroy().map_err(quadra_renderer::RenderError::from)?;
        }
        quadra_info!(LogCategory::Platform, "Rendered {} frame(s)", self.frames);
        Ok(())
    }
}

impl ApplicationHandler for FrameDriver {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        if let Err(err) = self.start(event_loop) {
            self.fail(event_loop, err);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let result = match event {
            WindowEvent::CloseRequested => {
                quadra_debug!(LogCategory::Platform, "Close requested");
                event_loop.exit();
                Ok(())
            }
            WindowEvent::Resized(size) => self.resize(size.width, size.height),
            WindowEvent::RedrawRequested => self.redraw(),
            _ => Ok(()),
        };

        if let Err(err) = result {
            self.fail(event_loop, err);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }

    fn exiting(&mut self, event_loop: &ActiveEventLoop) {
        if let Err(err) = self.teardown() {
            self.fail(event_loop, err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_without_running() {
        let driver = FrameDriver::new(QuadraConfig::default());
        assert_eq!(driver.frames(), 0);
        assert!(driver.finish().is_ok());
    }
}
