//! Window and OpenGL context creation

use crate::PlatformError;
use glutin::config::{Config, ConfigTemplateBuilder, GlConfig};
use glutin::context::{
    ContextApi, ContextAttributesBuilder, GlProfile, NotCurrentGlContext, PossiblyCurrentContext,
    Version,
};
use glutin::display::{Display, DisplayApiPreference, GlDisplay};
use glutin::surface::{GlSurface, Surface, SwapInterval, WindowSurface};
use glutin_winit::GlWindow as _;
use quadra_core::logging::LogCategory;
use quadra_core::{quadra_debug, quadra_info, quadra_warn, WindowConfig};
use quadra_renderer::GlowDriver;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle, RawWindowHandle};
use std::num::NonZeroU32;
use winit::dpi::LogicalSize;
use winit::event_loop::ActiveEventLoop;
use winit::window::Window;

/// Requested context version. Core profile.
pub const GL_VERSION: (u8, u8) = (3, 3);

/// A window with a current GL context bound to its surface.
///
/// Field order matters for drop: the surface and context go before the
/// window they render to.
pub struct GlWindow {
    surface: Surface<WindowSurface>,
    context: PossiblyCurrentContext,
    window: Window,
}

impl GlWindow {
    /// Open the window, create a core context and make it current. Returns
    /// the window together with a driver loaded from that context.
    pub fn create(
        event_loop: &ActiveEventLoop,
        config: &WindowConfig,
    ) -> Result<(Self, GlowDriver), PlatformError> {
        let attributes = Window::default_attributes()
            .with_title(config.title.clone())
            .with_inner_size(LogicalSize::new(config.width, config.height));

        let window = event_loop
            .create_window(attributes)
            .map_err(|e| PlatformError::WindowCreation(e.to_string()))?;
        let raw_window_handle = window
            .window_handle()
            .map(|handle| handle.as_raw())
            .map_err(|e| PlatformError::WindowCreation(e.to_string()))?;
        let raw_display_handle = event_loop
            .display_handle()
            .map(|handle| handle.as_raw())
            .map_err(|e| PlatformError::WindowCreation(e.to_string()))?;

        let display = unsafe { Display::new(raw_display_handle, display_preference(raw_window_handle)) }
            .map_err(|e| PlatformError::Context(e.to_string()))?;
        let template = ConfigTemplateBuilder::new()
            .compatible_with_native_window(raw_window_handle)
            .build();
        let configs = unsafe { display.find_configs(template) }
            .map_err(|e| PlatformError::Context(e.to_string()))?;
        let gl_config = pick_config(configs)
            .ok_or_else(|| PlatformError::Context("display offered no GL configs".to_string()))?;

        quadra_debug!(
            LogCategory::Platform,
            "Picked GL config with {} samples",
            gl_config.num_samples()
        );

        let (major, minor) = GL_VERSION;
        let context_attributes = ContextAttributesBuilder::new()
            .with_profile(GlProfile::Core)
            .with_context_api(ContextApi::OpenGl(Some(Version::new(major, minor))))
            .build(Some(raw_window_handle));

        let not_current = unsafe { display.create_context(&gl_config, &context_attributes) }
            .map_err(|e| PlatformError::Context(e.to_string()))?;

        let surface_attributes = window
            .build_surface_attributes(Default::default())
            .map_err(|e| PlatformError::Context(e.to_string()))?;
        let surface = unsafe { display.create_window_surface(&gl_config, &surface_attributes) }
            .map_err(|e| PlatformError::Context(e.to_string()))?;

        let context = not_current
            .make_current(&surface)
            .map_err(|e| PlatformError::Context(e.to_string()))?;

        let interval = if config.vsync {
            SwapInterval::Wait(NonZeroU32::MIN)
        } else {
            SwapInterval::DontWait
        };
        if let Err(e) = surface.set_swap_interval(&context, interval) {
            quadra_warn!(LogCategory::Platform, "Failed to set swap interval: {}", e);
        }

        // SAFETY: the context was made current above and stays current on
        // this thread for the lifetime of the window.
        let driver = unsafe { GlowDriver::from_loader_function(|symbol| display.get_proc_address(symbol)) };

        quadra_info!(
            LogCategory::Platform,
            "Created window \"{}\" ({}x{})",
            config.title,
            config.width,
            config.height
        );

        Ok((
            Self {
                surface,
                context,
                window,
            },
            driver,
        ))
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }

    /// Resize the surface. Zero sizes (minimised windows) are ignored.
    pub fn resize(&self, width: u32, height: u32) {
        if let (Some(width), Some(height)) = (NonZeroU32::new(width), NonZeroU32::new(height)) {
            self.surface.resize(&self.context, width, height);
        }
    }

    pub fn swap_buffers(&self) -> Result<(), PlatformError> {
        self.surface
            .swap_buffers(&self.context)
            .map_err(|e| PlatformError::Context(e.to_string()))
    }
}

#[cfg(target_os = "windows")]
fn display_preference(window: RawWindowHandle) -> DisplayApiPreference {
    DisplayApiPreference::WglThenEgl(Some(window))
}

#[cfg(target_os = "macos")]
fn display_preference(_window: RawWindowHandle) -> DisplayApiPreference {
    DisplayApiPreference::Cgl
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn display_preference(_window: RawWindowHandle) -> DisplayApiPreference {
    DisplayApiPreference::Egl
}

/// Prefer the config with the most samples
fn pick_config(configs: impl Iterator<Item = Config>) -> Option<Config> {
    configs.reduce(|best, config| {
        if config.num_samples() > best.num_samples() {
            config
        } else {
            best
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_configs_picks_nothing() {
        assert!(pick_config(std::iter::empty()).is_none());
    }
}
