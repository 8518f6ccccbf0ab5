//! The indexed quad and the per-frame renderer that draws it

use crate::driver::{BufferHandle, Driver, VertexArrayHandle};
use crate::error::Result;
use crate::gl_call;
use crate::harness::{DriverCallError, ErrorHarness};
use crate::program::{Program, ProgramLinker};
use crate::shader::{parse_shader, ShaderProgramSource};
use quadra_core::logging::LogCategory;
use quadra_core::{quadra_debug, quadra_info, RendererConfig};

/// A single position-only vertex
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: [f32; 3],
}

unsafe impl bytemuck::Pod for Vertex {}
unsafe impl bytemuck::Zeroable for Vertex {}

/// Attribute location the vertex shader reads positions from
pub const POSITION_ATTRIBUTE: u32 = 0;

/// Corners of a quad centred on the origin, counter-clockwise from bottom left
pub const QUAD_VERTICES: [Vertex; 4] = [
    Vertex { position: [-0.5, -0.5, 0.0] },
    Vertex { position: [0.5, -0.5, 0.0] },
    Vertex { position: [0.5, 0.5, 0.0] },
    Vertex { position: [-0.5, 0.5, 0.0] },
];

/// Two counter-clockwise triangles sharing the 0-2 diagonal
pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 2, 3, 0];

/// GPU-side buffers for the quad
#[derive(Debug, PartialEq, Eq)]
pub struct QuadGeometry {
    vertex_array: VertexArrayHandle,
    vertex_buffer: BufferHandle,
    index_buffer: BufferHandle,
    index_count: i32,
}

impl QuadGeometry {
    /// Create the vertex array, fill both buffers and describe the position
    /// attribute. The vertex array is left bound.
    pub fn upload<D: Driver + ?Sized>(
        driver: &D,
        harness: &ErrorHarness,
    ) -> std::result::Result<Self, DriverCallError> {
        let vertex_array = gl_call!(harness, driver, create_vertex_array())?;
        gl_call!(harness, driver, bind_vertex_array(vertex_array))?;

        let vertex_buffer = gl_call!(harness, driver, create_buffer())?;
        gl_call!(harness, driver, bind_buffer(glow::ARRAY_BUFFER, vertex_buffer))?;
        gl_call!(
            harness,
            driver,
            buffer_data(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(&QUAD_VERTICES),
                glow::STATIC_DRAW
            )
        )?;

        let index_buffer = gl_call!(harness, driver, create_buffer())?;
        gl_call!(harness, driver, bind_buffer(glow::ELEMENT_ARRAY_BUFFER, index_buffer))?;
        gl_call!(
            harness,
            driver,
            buffer_data(
                glow::ELEMENT_ARRAY_BUFFER,
                bytemuck::cast_slice(&QUAD_INDICES),
                glow::STATIC_DRAW
            )
        )?;

        let stride = std::mem::size_of::<Vertex>() as i32;
        gl_call!(harness, driver, enable_vertex_attrib_array(POSITION_ATTRIBUTE))?;
        gl_call!(
            harness,
            driver,
            vertex_attrib_pointer_f32(POSITION_ATTRIBUTE, 3, glow::FLOAT, false, stride, 0)
        )?;

        quadra_debug!(
            LogCategory::Renderer,
            "Uploaded quad: {} vertices, {} indices",
            QUAD_VERTICES.len(),
            QUAD_INDICES.len()
        );

        Ok(Self {
            vertex_array,
            vertex_buffer,
            index_buffer,
            index_count: QUAD_INDICES.len() as i32,
        })
    }

    pub fn vertex_buffer(&self) -> BufferHandle {
        self.vertex_buffer
    }

    pub fn index_buffer(&self) -> BufferHandle {
        self.index_buffer
    }

    pub fn index_count(&self) -> i32 {
        self.index_count
    }

    pub fn destroy<D: Driver + ?Sized>(
        self,
        driver: &D,
        harness: &ErrorHarness,
    ) -> std::result::Result<(), DriverCallError> {
        gl_call!(harness, driver, bind_vertex_array(VertexArrayHandle::INVALID))?;
        gl_call!(harness, driver, delete_buffer(self.index_buffer))?;
        gl_call!(harness, driver, delete_buffer(self.vertex_buffer))?;
        gl_call!(harness, driver, delete_vertex_array(self.vertex_array))
    }
}

/// Owns the driver and draws the quad once per frame
#[derive(Debug)]
pub struct QuadRenderer<D: Driver> {
    driver: D,
    harness: ErrorHarness,
    program: Program,
    geometry: QuadGeometry,
}

impl<D: Driver> QuadRenderer<D> {
    /// Load the shader file named by `config` and set up the pipeline
    pub fn new(driver: D, config: &RendererConfig) -> Result<Self> {
        let source = parse_shader(&config.shader_path)?;
        Self::from_source(driver, &source, config)
    }

    pub fn from_source(driver: D, source: &ShaderProgramSource, config: &RendererConfig) -> Result<Self> {
        let harness = ErrorHarness::new(config.error_policy);

        let version = gl_call!(harness, &driver, version_string())?;
        quadra_info!(LogCategory::Renderer, "OpenGL version: {}", version);

        let geometry = QuadGeometry::upload(&driver, &harness)?;

        let linker = ProgramLinker::new(harness, config.stage_failure_policy);
        let program = linker
            .link(&driver, source)
            .and_then(|program| Self::activate(&driver, &harness, program, config.clear_color));
        let program = match program {
            Ok(program) => program,
            Err(err) => {
                geometry.destroy(&driver, &harness)?;
                return Err(err);
            }
        };

        Ok(Self {
            driver,
            harness,
            program,
            geometry,
        })
    }

    /// Bind `program` and set the clear colour. A program that cannot be
    /// bound, such as one that failed to link, is deleted before the error
    /// is returned.
    fn activate(driver: &D, harness: &ErrorHarness, program: Program, clear_color: [f32; 4]) -> Result<Program> {
        let [red, green, blue, alpha] = clear_color;
        let bound = program
            .bind(driver, harness)
            .and_then(|()| gl_call!(harness, driver, clear_color(red, green, blue, alpha)));

        match bound {
            Ok(()) => Ok(program),
            Err(err) => {
                program.destroy(driver, harness)?;
                Err(err.into())
            }
        }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn geometry(&self) -> &QuadGeometry {
        &self.geometry
    }

    /// Match the viewport to a new framebuffer size
    pub fn resize(&self, width: u32, height: u32) -> std::result::Result<(), DriverCallError> {
        let width = i32::try_from(width).unwrap_or(i32::MAX);
        let height = i32::try_from(height).unwrap_or(i32::MAX);
        gl_call!(self.harness, &self.driver, viewport(0, 0, width, height))
    }

    /// Clear the colour buffer and draw the quad
    pub fn render_frame(&self) -> std::result::Result<(), DriverCallError> {
        let count = self.geometry.index_count();
        gl_call!(self.harness, &self.driver, clear(glow::COLOR_BUFFER_BIT))?;
        gl_call!(
            self.harness,
            &self.driver,
            draw_elements(glow::TRIANGLES, count, glow::UNSIGNED_INT, 0)
        )
    }

    /// Delete the program and buffers and hand the driver back
    pub fn destroy(self) -> std::result::Result<D, DriverCallError> {
        let Self {
            driver,
            harness,
            program,
            geometry,
        } = self;

        gl_call!(harness, &driver, use_program(crate::driver::ProgramHandle::INVALID))?;
        program.destroy(&driver, &harness)?;
        geometry.destroy(&driver, &harness)?;
        quadra_debug!(LogCategory::Renderer, "Renderer resources released");
        Ok(driver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{ErrorCode, ProgramHandle};
    use crate::headless::HeadlessDriver;
    use crate::RenderError;
    use pretty_assertions::assert_eq;
    use quadra_core::{DriverErrorPolicy, StageFailurePolicy};

    const VERTEX: &str = "#version 330 core\n\
                          layout(location = 0) in vec4 position;\n\
                          void main()\n{\n    gl_Position = position;\n}\n";
    const FRAGMENT: &str = "#version 330 core\n\
                            layout(location = 0) out vec4 color;\n\
                            void main()\n{\n    color = vec4(0.2, 0.3, 0.8, 1.0);\n}\n";

    fn config() -> RendererConfig {
        RendererConfig {
            error_policy: DriverErrorPolicy::Report,
            clear_color: [0.1, 0.2, 0.3, 1.0],
            ..RendererConfig::default()
        }
    }

    fn renderer() -> QuadRenderer<HeadlessDriver> {
        let source = ShaderProgramSource::new(VERTEX, FRAGMENT);
        QuadRenderer::from_source(HeadlessDriver::new(), &source, &config()).unwrap()
    }

    #[test]
    fn test_vertex_layout() {
        assert_eq!(std::mem::size_of::<Vertex>(), 12);
        let bytes: &[u8] = bytemuck::cast_slice(&QUAD_VERTICES);
        assert_eq!(bytes.len(), 48);
    }

    #[test]
    fn test_upload_fills_buffers() {
        let renderer = renderer();
        let driver = renderer.driver();
        let geometry = renderer.geometry();

        let vertices = driver.buffer_contents(geometry.vertex_buffer()).unwrap();
        assert_eq!(vertices, bytemuck::cast_slice::<Vertex, u8>(&QUAD_VERTICES).to_vec());
        let indices = driver.buffer_contents(geometry.index_buffer()).unwrap();
        assert_eq!(indices, bytemuck::cast_slice::<u32, u8>(&QUAD_INDICES).to_vec());
        assert_eq!(geometry.index_count(), 6);
        assert!(driver.is_attrib_enabled(POSITION_ATTRIBUTE));
    }

    #[test]
    fn test_program_is_bound_and_validated() {
        let renderer = renderer();
        let handle = renderer.program().handle();
        assert_eq!(renderer.driver().current_program(), handle);
        assert!(renderer.driver().is_program_validated(handle));
        assert_eq!(renderer.driver().current_clear_color(), [0.1, 0.2, 0.3, 1.0]);
    }

    #[test]
    fn test_render_frame_clears_then_draws() {
        let renderer = renderer();
        renderer.render_frame().unwrap();
        renderer.render_frame().unwrap();

        assert_eq!(renderer.driver().clear_count(), 2);
        assert_eq!(renderer.driver().draw_count(), 2);
    }

    #[test]
    fn test_resize_sets_viewport() {
        let renderer = renderer();
        renderer.resize(800, 600).unwrap();
        assert_eq!(renderer.driver().viewport_rect(), [0, 0, 800, 600]);
    }

    #[test]
    fn test_destroy_releases_everything() {
        let driver = renderer().destroy().unwrap();
        assert_eq!(driver.live_program_count(), 0);
        assert_eq!(driver.live_shader_count(), 0);
        assert_eq!(driver.live_buffer_count(), 0);
        assert_eq!(driver.live_vertex_array_count(), 0);
    }

    #[test]
    fn test_unlinked_program_is_not_bound() {
        let source = ShaderProgramSource::new(VERTEX, "void main() {\n");
        let driver = HeadlessDriver::new();
        let err = QuadRenderer::from_source(driver.clone(), &source, &config()).unwrap_err();

        match err {
            RenderError::Driver(call) => {
                assert_eq!(call.codes, vec![ErrorCode::INVALID_OPERATION]);
                assert!(call.site.call.starts_with("use_program("));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(driver.current_program(), ProgramHandle::INVALID);
        assert_eq!(driver.live_program_count(), 0);
        assert_eq!(driver.live_shader_count(), 0);
        assert_eq!(driver.live_buffer_count(), 0);
        assert_eq!(driver.live_vertex_array_count(), 0);
    }

    #[test]
    fn test_failed_link_leaves_nothing_behind() {
        let source = ShaderProgramSource::new(VERTEX, "void main() {\n");
        let driver = HeadlessDriver::new();
        let config = RendererConfig {
            stage_failure_policy: StageFailurePolicy::FailFast,
            ..config()
        };
        let err = QuadRenderer::from_source(driver.clone(), &source, &config).unwrap_err();

        assert!(matches!(err, RenderError::StageCompilation { .. }));
        assert_eq!(driver.live_program_count(), 0);
        assert_eq!(driver.live_shader_count(), 0);
        assert_eq!(driver.live_buffer_count(), 0);
        assert_eq!(driver.live_vertex_array_count(), 0);
    }
}
