//! Error-checked OpenGL pipeline for Quadra
//!
//! All GL access goes through the [`Driver`] trait. [`GlowDriver`] talks to
//! a real context and [`HeadlessDriver`] simulates one for tests and tooling.
//! Every call is wrapped with [`gl_call!`] so errors the driver raises are
//! logged with the call text, file and line that caused them.
//!
//! The pipeline itself is small:
//! - [`shader`] splits a combined `#shader` file into stage sources
//! - [`compiler`] compiles one stage, logging failures instead of erroring
//! - [`program`] links two stages into a validated program
//! - [`quad`] uploads an indexed quad and draws it each frame

pub mod compiler;
pub mod driver;
pub mod error;
pub mod glow_driver;
pub mod harness;
pub mod headless;
pub mod program;
pub mod quad;
pub mod shader;

pub use compiler::compile_shader;
pub use driver::{BufferHandle, Driver, ErrorCode, ProgramHandle, StageHandle, VertexArrayHandle};
pub use error::{RenderError, Result};
pub use glow_driver::GlowDriver;
pub use harness::{CallSite, DriverCallError, ErrorHarness, MAX_DRAINED_ERRORS};
pub use headless::HeadlessDriver;
pub use program::{Program, ProgramLinker};
pub use quad::{QuadGeometry, QuadRenderer, Vertex, QUAD_INDICES, QUAD_VERTICES};
pub use shader::{
    parse_shader, parse_shader_reader, parse_shader_str, ParseWarning, ParsedShader,
    ShaderProgramSource, ShaderSourceParser, ShaderStage,
};

/// Renderer crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
