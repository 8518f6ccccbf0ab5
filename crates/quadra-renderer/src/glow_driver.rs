//! [`Driver`] backed by a live OpenGL context through `glow`

use crate::driver::{BufferHandle, Driver, ErrorCode, ProgramHandle, StageHandle, VertexArrayHandle};
use crate::shader::ShaderStage;
use glow::HasContext;
use parking_lot::Mutex;
use quadra_core::logging::LogCategory;
use quadra_core::quadra_warn;
use std::collections::VecDeque;
use std::ffi::{c_void, CStr};
use std::fmt;
use std::num::NonZeroU32;

type ValidateProgramFn = unsafe extern "system" fn(u32);

/// Forwards every [`Driver`] call to a current GL context.
///
/// `glow` handles cannot hold name 0, so a call made with an invalid handle
/// is not forwarded. It queues `GL_INVALID_VALUE` instead, which `get_error`
/// returns ahead of the context's own flags. Deleting name 0 is a silent no-op
/// as in GL.
pub struct GlowDriver {
    gl: glow::Context,
    validate_program: Option<ValidateProgramFn>,
    pending: Mutex<VecDeque<ErrorCode>>,
}

impl GlowDriver {
    /// Load GL entry points with `loader`.
    ///
    /// # Safety
    /// The context the loader belongs to must be current on this thread for
    /// as long as the driver is used.
    pub unsafe fn from_loader_function<F>(mut loader: F) -> Self
    where
        F: FnMut(&CStr) -> *const c_void,
    {
        let validate = loader(c"glValidateProgram");
        let validate_program = (!validate.is_null())
            .then(|| std::mem::transmute::<*const c_void, ValidateProgramFn>(validate));
        let gl = glow::Context::from_loader_function_cstr(&mut loader);
        Self {
            gl,
            validate_program,
            pending: Mutex::new(VecDeque::new()),
        }
    }

    fn reject(&self) {
        self.pending.lock().push_back(ErrorCode::INVALID_VALUE);
    }

    fn shader(&self, shader: StageHandle) -> Option<glow::NativeShader> {
        let native = NonZeroU32::new(shader.raw()).map(glow::NativeShader);
        if native.is_none() {
            self.reject();
        }
        native
    }

    fn program(&self, program: ProgramHandle) -> Option<glow::NativeProgram> {
        let native = NonZeroU32::new(program.raw()).map(glow::NativeProgram);
        if native.is_none() {
            self.reject();
        }
        native
    }

    fn created<T>(&self, what: &str, result: Result<T, String>, raw: impl FnOnce(T) -> u32) -> u32 {
        match result {
            Ok(object) => raw(object),
            Err(message) => {
                quadra_warn!(LogCategory::Driver, "Failed to create {}: {}", what, message);
                0
            }
        }
    }
}

impl fmt::Debug for GlowDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlowDriver")
            .field("pending", &self.pending.lock().len())
            .finish_non_exhaustive()
    }
}

// SAFETY (all blocks below): `from_loader_function` requires the context to
// stay current while the driver is alive, and every handle passed on is
// non-zero.
impl Driver for GlowDriver {
    fn get_error(&self) -> ErrorCode {
        if let Some(code) = self.pending.lock().pop_front() {
            return code;
        }
        ErrorCode::from_raw(unsafe { self.gl.get_error() })
    }

    fn version_string(&self) -> String {
        unsafe { self.gl.get_parameter_string(glow::VERSION) }
    }

    fn create_shader(&self, stage: ShaderStage) -> StageHandle {
        let result = unsafe { self.gl.create_shader(stage.gl_type()) };
        StageHandle::from_raw(self.created(stage.name(), result, |shader| shader.0.get()))
    }

    fn shader_source(&self, shader: StageHandle, source: &str) {
        if let Some(shader) = self.shader(shader) {
            unsafe { self.gl.shader_source(shader, source) }
        }
    }

    fn compile_shader(&self, shader: StageHandle) {
        if let Some(shader) = self.shader(shader) {
            unsafe { self.gl.compile_shader(shader) }
        }
    }

    fn get_shader_compile_status(&self, shader: StageHandle) -> bool {
        self.shader(shader)
            .is_some_and(|shader| unsafe { self.gl.get_shader_compile_status(shader) })
    }

    fn get_shader_info_log(&self, shader: StageHandle) -> String {
        self.shader(shader)
            .map(|shader| unsafe { self.gl.get_shader_info_log(shader) })
            .unwrap_or_default()
    }

    fn delete_shader(&self, shader: StageHandle) {
        if let Some(raw) = NonZeroU32::new(shader.raw()) {
            unsafe { self.gl.delete_shader(glow::NativeShader(raw)) }
        }
    }

    fn create_program(&self) -> ProgramHandle {
        let result = unsafe { self.gl.create_program() };
        ProgramHandle::from_raw(self.created("program", result, |program| program.0.get()))
    }

    fn attach_shader(&self, program: ProgramHandle, shader: StageHandle) {
        if let (Some(program), Some(shader)) = (self.program(program), self.shader(shader)) {
            unsafe { self.gl.attach_shader(program, shader) }
        }
    }

    fn detach_shader(&self, program: ProgramHandle, shader: StageHandle) {
        if let (Some(program), Some(shader)) = (self.program(program), self.shader(shader)) {
            unsafe { self.gl.detach_shader(program, shader) }
        }
    }

    fn link_program(&self, program: ProgramHandle) {
        if let Some(program) = self.program(program) {
            unsafe { self.gl.link_program(program) }
        }
    }

    fn validate_program(&self, program: ProgramHandle) {
        if self.program(program).is_none() {
            return;
        }
        match self.validate_program {
            Some(validate) => unsafe { validate(program.raw()) },
            None => quadra_warn!(LogCategory::Driver, "glValidateProgram is not available"),
        }
    }

    fn get_program_link_status(&self, program: ProgramHandle) -> bool {
        self.program(program)
            .is_some_and(|program| unsafe { self.gl.get_program_link_status(program) })
    }

    fn get_program_info_log(&self, program: ProgramHandle) -> String {
        self.program(program)
            .map(|program| unsafe { self.gl.get_program_info_log(program) })
            .unwrap_or_default()
    }

    fn use_program(&self, program: ProgramHandle) {
        let program = NonZeroU32::new(program.raw()).map(glow::NativeProgram);
        unsafe { self.gl.use_program(program) }
    }

    fn delete_program(&self, program: ProgramHandle) {
        if let Some(raw) = NonZeroU32::new(program.raw()) {
            unsafe { self.gl.delete_program(glow::NativeProgram(raw)) }
        }
    }

    fn create_vertex_array(&self) -> VertexArrayHandle {
        let result = unsafe { self.gl.create_vertex_array() };
        VertexArrayHandle::from_raw(self.created("vertex array", result, |vao| vao.0.get()))
    }

    fn bind_vertex_array(&self, vertex_array: VertexArrayHandle) {
        let vertex_array = NonZeroU32::new(vertex_array.raw()).map(glow::NativeVertexArray);
        unsafe { self.gl.bind_vertex_array(vertex_array) }
    }

    fn delete_vertex_array(&self, vertex_array: VertexArrayHandle) {
        if let Some(raw) = NonZeroU32::new(vertex_array.raw()) {
            unsafe { self.gl.delete_vertex_array(glow::NativeVertexArray(raw)) }
        }
    }

    fn create_buffer(&self) -> BufferHandle {
        let result = unsafe { self.gl.create_buffer() };
        BufferHandle::from_raw(self.created("buffer", result, |buffer| buffer.0.get()))
    }

    fn bind_buffer(&self, target: u32, buffer: BufferHandle) {
        let buffer = NonZeroU32::new(buffer.raw()).map(glow::NativeBuffer);
        unsafe { self.gl.bind_buffer(target, buffer) }
    }

    fn buffer_data(&self, target: u32, data: &[u8], usage: u32) {
        unsafe { self.gl.buffer_data_u8_slice(target, data, usage) }
    }

    fn delete_buffer(&self, buffer: BufferHandle) {
        if let Some(raw) = NonZeroU32::new(buffer.raw()) {
            unsafe { self.gl.delete_buffer(glow::NativeBuffer(raw)) }
        }
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(index) }
    }

    fn vertex_attrib_pointer_f32(
        &self,
        index: u32,
        size: i32,
        data_type: u32,
        normalized: bool,
        stride: i32,
        offset: i32,
    ) {
        unsafe {
            self.gl
                .vertex_attrib_pointer_f32(index, size, data_type, normalized, stride, offset)
        }
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { self.gl.viewport(x, y, width, height) }
    }

    fn clear_color(&self, red: f32, green: f32, blue: f32, alpha: f32) {
        unsafe { self.gl.clear_color(red, green, blue, alpha) }
    }

    fn clear(&self, mask: u32) {
        unsafe { self.gl.clear(mask) }
    }

    fn draw_elements(&self, mode: u32, count: i32, element_type: u32, offset: i32) {
        unsafe { self.gl.draw_elements(mode, count, element_type, offset) }
    }
}
