//! Program linking

use crate::compiler::compile_shader;
use crate::driver::{Driver, ProgramHandle, StageHandle};
use crate::error::{RenderError, Result};
use crate::{gl_call, gl_call_logged};
use crate::harness::{DriverCallError, ErrorHarness};
use crate::shader::{ShaderProgramSource, ShaderStage};
use quadra_core::logging::LogCategory;
use quadra_core::{quadra_error, quadra_info, StageFailurePolicy};

/// A program object built by [`ProgramLinker`]. Under
/// [`StageFailurePolicy::AttachAnyway`] it may have failed to link.
///
/// Not `Clone`: the owner deletes it exactly once through [`Program::destroy`].
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a program must be destroyed with Program::destroy"]
pub struct Program {
    handle: ProgramHandle,
}

impl Program {
    pub fn handle(&self) -> ProgramHandle {
        self.handle
    }

    /// Make this the active program for subsequent draws
    pub fn bind<D: Driver + ?Sized>(
        &self,
        driver: &D,
        harness: &ErrorHarness,
    ) -> std::result::Result<(), DriverCallError> {
        gl_call!(harness, driver, use_program(self.handle))
    }

    pub fn destroy<D: Driver + ?Sized>(
        self,
        driver: &D,
        harness: &ErrorHarness,
    ) -> std::result::Result<(), DriverCallError> {
        gl_call!(harness, driver, delete_program(self.handle))
    }
}

/// Compiles both stages and links them into a [`Program`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgramLinker {
    harness: ErrorHarness,
    stage_failure_policy: StageFailurePolicy,
}

impl ProgramLinker {
    pub fn new(harness: ErrorHarness, stage_failure_policy: StageFailurePolicy) -> Self {
        Self {
            harness,
            stage_failure_policy,
        }
    }

    pub fn link<D: Driver + ?Sized>(&self, driver: &D, source: &ShaderProgramSource) -> Result<Program> {
        self.create_program(driver, source.vertex_source(), source.fragment_source())
    }

    /// Compile the vertex stage, then the fragment stage, attach, link and
    /// validate. The stage objects are released before returning.
    ///
    /// Under [`StageFailurePolicy::AttachAnyway`] a failed stage does not stop
    /// the pipeline: the sentinel is attached, the driver's complaints are
    /// logged, and the returned program is simply not linked. Whenever an
    /// error is returned, everything created here has been deleted.
    pub fn create_program<D: Driver + ?Sized>(
        &self,
        driver: &D,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Program> {
        let harness = &self.harness;
        let program = gl_call!(harness, driver, create_program())?;

        let mut stages = Vec::with_capacity(2);
        if let Err(err) = self.assemble(driver, program, vertex_source, fragment_source, &mut stages) {
            self.discard(driver, program, &stages);
            return Err(err);
        }

        if let Err(err) = self.release_stages(driver, program, &stages) {
            self.discard(driver, program, &stages);
            return Err(err.into());
        }

        quadra_info!(LogCategory::Renderer, "Built program {}", program);
        Ok(Program { handle: program })
    }

    /// Compile both stages into `stages`, attach them to `program`, link and
    /// validate
    fn assemble<D: Driver + ?Sized>(
        &self,
        driver: &D,
        program: ProgramHandle,
        vertex_source: &str,
        fragment_source: &str,
        stages: &mut Vec<StageHandle>,
    ) -> Result<()> {
        let harness = &self.harness;

        let vertex = compile_shader(driver, harness, ShaderStage::Vertex, vertex_source)?;
        stages.push(vertex);
        self.check_stage(vertex, ShaderStage::Vertex)?;

        let fragment = compile_shader(driver, harness, ShaderStage::Fragment, fragment_source)?;
        stages.push(fragment);
        self.check_stage(fragment, ShaderStage::Fragment)?;

        match self.stage_failure_policy {
            StageFailurePolicy::AttachAnyway => {
                gl_call_logged!(harness, driver, attach_shader(program, vertex));
                gl_call_logged!(harness, driver, attach_shader(program, fragment));
                gl_call_logged!(harness, driver, link_program(program));
                gl_call_logged!(harness, driver, validate_program(program));
            }
            StageFailurePolicy::FailFast => {
                gl_call!(harness, driver, attach_shader(program, vertex))?;
                gl_call!(harness, driver, attach_shader(program, fragment))?;
                gl_call!(harness, driver, link_program(program))?;
                gl_call!(harness, driver, validate_program(program))?;

                let linked = gl_call!(harness, driver, get_program_link_status(program))?;
                if !linked {
                    let log = gl_call!(harness, driver, get_program_info_log(program))?;
                    quadra_error!(LogCategory::Shader, "Failed to link program\n{}", log.trim_end());
                    return Err(RenderError::Link { log });
                }
            }
        }
        Ok(())
    }

    /// Under `FailFast`, turn a sentinel stage into an error
    fn check_stage(&self, shader: StageHandle, stage: ShaderStage) -> Result<()> {
        if shader.is_valid() || self.stage_failure_policy != StageFailurePolicy::FailFast {
            return Ok(());
        }
        Err(RenderError::StageCompilation { stage })
    }

    /// Detach and delete the intermediate stage objects
    fn release_stages<D: Driver + ?Sized>(
        &self,
        driver: &D,
        program: ProgramHandle,
        stages: &[StageHandle],
    ) -> std::result::Result<(), DriverCallError> {
        let harness = &self.harness;
        for &shader in stages.iter().filter(|shader| shader.is_valid()) {
            gl_call!(harness, driver, detach_shader(program, shader))?;
            gl_call!(harness, driver, delete_shader(shader))?;
        }
        Ok(())
    }

    /// Delete the stages and the program after a failure. An attached stage
    /// is only flagged by `delete_shader` and goes away with the program.
    /// Errors here are logged only, so the caller sees the original failure.
    fn discard<D: Driver + ?Sized>(&self, driver: &D, program: ProgramHandle, stages: &[StageHandle]) {
        let harness = &self.harness;
        for &shader in stages.iter().filter(|shader| shader.is_valid()) {
            gl_call_logged!(harness, driver, delete_shader(shader));
        }
        gl_call_logged!(harness, driver, delete_program(program));
    }
}
