//! The graphics driver boundary
//!
//! [`Driver`] is the narrow slice of the OpenGL API that the pipeline
//! touches. Handles are plain GL names (`u32`); `0` is never a live object.
//! Enumerants such as `TRIANGLES` or `ARRAY_BUFFER` are the raw GL values
//! re-exported from `glow`, so an invalid enumerant reaches the driver the
//! same way it would through the C API.

use crate::shader::ShaderStage;
use std::fmt;

macro_rules! gl_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            /// The reserved name that denotes "no object"
            pub const INVALID: Self = Self(0);

            pub const fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            pub const fn raw(self) -> u32 {
                self.0
            }

            pub const fn is_valid(self) -> bool {
                self.0 != 0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

gl_handle!(
    /// A compiled shader stage. Only lives between compilation and linking.
    StageHandle
);
gl_handle!(
    /// A program object
    ProgramHandle
);
gl_handle!(BufferHandle);
gl_handle!(VertexArrayHandle);

/// A value returned by `glGetError`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ErrorCode(u32);

impl ErrorCode {
    pub const NO_ERROR: Self = Self(glow::NO_ERROR);
    pub const INVALID_ENUM: Self = Self(glow::INVALID_ENUM);
    pub const INVALID_VALUE: Self = Self(glow::INVALID_VALUE);
    pub const INVALID_OPERATION: Self = Self(glow::INVALID_OPERATION);
    pub const STACK_OVERFLOW: Self = Self(glow::STACK_OVERFLOW);
    pub const STACK_UNDERFLOW: Self = Self(glow::STACK_UNDERFLOW);
    pub const OUT_OF_MEMORY: Self = Self(glow::OUT_OF_MEMORY);
    pub const INVALID_FRAMEBUFFER_OPERATION: Self = Self(glow::INVALID_FRAMEBUFFER_OPERATION);
    pub const CONTEXT_LOST: Self = Self(glow::CONTEXT_LOST);

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn is_error(self) -> bool {
        self.0 != glow::NO_ERROR
    }

    /// Symbolic name of the code, if it is one GL defines
    pub fn name(self) -> Option<&'static str> {
        let name = match self {
            Self::NO_ERROR => "GL_NO_ERROR",
            Self::INVALID_ENUM => "GL_INVALID_ENUM",
            Self::INVALID_VALUE => "GL_INVALID_VALUE",
            Self::INVALID_OPERATION => "GL_INVALID_OPERATION",
            Self::STACK_OVERFLOW => "GL_STACK_OVERFLOW",
            Self::STACK_UNDERFLOW => "GL_STACK_UNDERFLOW",
            Self::OUT_OF_MEMORY => "GL_OUT_OF_MEMORY",
            Self::INVALID_FRAMEBUFFER_OPERATION => "GL_INVALID_FRAMEBUFFER_OPERATION",
            Self::CONTEXT_LOST => "GL_CONTEXT_LOST",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "0x{:04X}", self.0),
        }
    }
}

/// The OpenGL entry points used by the pipeline.
///
/// Implementations follow GL semantics: misuse never panics, it records an
/// error code that the next [`Driver::get_error`] calls return.
pub trait Driver {
    /// Pop the oldest recorded error, or [`ErrorCode::NO_ERROR`]
    fn get_error(&self) -> ErrorCode;
    fn version_string(&self) -> String;

    fn create_shader(&self, stage: ShaderStage) -> StageHandle;
    fn shader_source(&self, shader: StageHandle, source: &str);
    fn compile_shader(&self, shader: StageHandle);
    fn get_shader_compile_status(&self, shader: StageHandle) -> bool;
    fn get_shader_info_log(&self, shader: StageHandle) -> String;
    fn delete_shader(&self, shader: StageHandle);

    fn create_program(&self) -> ProgramHandle;
    fn attach_shader(&self, program: ProgramHandle, shader: StageHandle);
    fn detach_shader(&self, program: ProgramHandle, shader: StageHandle);
    fn link_program(&self, program: ProgramHandle);
    fn validate_program(&self, program: ProgramHandle);
    fn get_program_link_status(&self, program: ProgramHandle) -> bool;
    fn get_program_info_log(&self, program: ProgramHandle) -> String;
    /// Binds `program`; [`ProgramHandle::INVALID`] unbinds
    fn use_program(&self, program: ProgramHandle);
    fn delete_program(&self, program: ProgramHandle);

    fn create_vertex_array(&self) -> VertexArrayHandle;
    fn bind_vertex_array(&self, vertex_array: VertexArrayHandle);
    fn delete_vertex_array(&self, vertex_array: VertexArrayHandle);

    fn create_buffer(&self) -> BufferHandle;
    fn bind_buffer(&self, target: u32, buffer: BufferHandle);
    fn buffer_data(&self, target: u32, data: &[u8], usage: u32);
    fn delete_buffer(&self, buffer: BufferHandle);

    fn enable_vertex_attrib_array(&self, index: u32);
    fn vertex_attrib_pointer_f32(
        &self,
        index: u32,
        size: i32,
        data_type: u32,
        normalized: bool,
        stride: i32,
        offset: i32,
    );

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32);
    fn clear_color(&self, red: f32, green: f32, blue: f32, alpha: f32);
    fn clear(&self, mask: u32);
    fn draw_elements(&self, mode: u32, count: i32, element_type: u32, offset: i32);
}
