//! Single-stage shader compilation

use crate::driver::{Driver, StageHandle};
use crate::gl_call;
use crate::harness::{DriverCallError, ErrorHarness};
use crate::shader::ShaderStage;
use quadra_core::logging::LogCategory;
use quadra_core::{quadra_debug, quadra_error};

/// Compile `source` as one `stage`.
///
/// A compile failure is not an `Err`: the driver's info log is logged under
/// the stage name, the shader object is deleted and
/// [`StageHandle::INVALID`] is returned. `Err` only carries driver errors
/// caught by the harness.
pub fn compile_shader<D: Driver + ?Sized>(
    driver: &D,
    harness: &ErrorHarness,
    stage: ShaderStage,
    source: &str,
) -> Result<StageHandle, DriverCallError> {
    let shader = gl_call!(harness, driver, create_shader(stage))?;
    gl_call!(harness, driver, shader_source(shader, source))?;
    gl_call!(harness, driver, compile_shader(shader))?;

    let compiled = gl_call!(harness, driver, get_shader_compile_status(shader))?;
    if !compiled {
        let log = gl_call!(harness, driver, get_shader_info_log(shader))?;
        quadra_error!(
            LogCategory::Shader,
            "Failed to compile {}\n{}",
            stage,
            log.trim_end()
        );
        gl_call!(harness, driver, delete_shader(shader))?;
        return Ok(StageHandle::INVALID);
    }

    quadra_debug!(LogCategory::Shader, "Compiled {} as {}", stage, shader);
    Ok(shader)
}
