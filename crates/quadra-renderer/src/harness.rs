//! Driver error harness
//!
//! Every driver call goes through [`ErrorHarness::call`], normally via the
//! [`gl_call!`](crate::gl_call) macro which records the call text, file and
//! line. The harness drains stale errors, runs the call, then drains again.
//! Anything found in the second drain is logged one line per code and then
//! handled according to the [`DriverErrorPolicy`].
//!
//! [`ErrorHarness::call_logged`] (and [`gl_call_logged!`](crate::gl_call_logged))
//! logs the same lines but always returns, for calls whose failure the
//! caller has already decided to carry on through.

use crate::driver::{Driver, ErrorCode};
use quadra_core::logging::LogCategory;
use quadra_core::{quadra_error, quadra_trace, DriverErrorPolicy};
use std::fmt;

/// Upper bound on codes drained in one go. A lost context may keep
/// reporting `GL_CONTEXT_LOST` forever.
pub const MAX_DRAINED_ERRORS: usize = 64;

/// Where a wrapped driver call was written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallSite {
    /// The wrapped call as it appears in the source
    pub call: &'static str,
    pub file: &'static str,
    pub line: u32,
}

impl CallSite {
    pub const fn new(call: &'static str, file: &'static str, line: u32) -> Self {
        Self { call, file, line }
    }
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.call, self.file, self.line)
    }
}

/// Errors the driver queued while executing one wrapped call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{} driver error(s) [{}] at {site}", codes.len(), join_codes(codes))]
pub struct DriverCallError {
    pub site: CallSite,
    /// Codes in the order the driver returned them. Never empty.
    pub codes: Vec<ErrorCode>,
}

impl DriverCallError {
    /// The diagnostic lines that were logged for this failure
    pub fn diagnostics(&self) -> Vec<String> {
        self.codes
            .iter()
            .map(|code| diagnostic_line(*code, &self.site))
            .collect()
    }

    pub fn contains(&self, code: ErrorCode) -> bool {
        self.codes.contains(&code)
    }
}

fn join_codes(codes: &[ErrorCode]) -> String {
    codes
        .iter()
        .map(ErrorCode::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Format a single harness diagnostic:
/// `[OpenGL Error] (1281) GL_INVALID_VALUE draw_elements(..) src/quad.rs: 42`
pub fn diagnostic_line(code: ErrorCode, site: &CallSite) -> String {
    format!("[OpenGL Error] ({}) {} {}", code.raw(), code, site)
}

/// Pop every queued error code from the driver
pub fn drain_errors<D: Driver + ?Sized>(driver: &D) -> Vec<ErrorCode> {
    let mut codes = Vec::new();
    while codes.len() < MAX_DRAINED_ERRORS {
        let code = driver.get_error();
        if !code.is_error() {
            break;
        }
        codes.push(code);
    }
    codes
}

fn log_errors<D: Driver + ?Sized>(driver: &D, site: CallSite) -> Option<DriverCallError> {
    let codes = drain_errors(driver);
    if codes.is_empty() {
        return None;
    }

    let error = DriverCallError { site, codes };
    for line in error.diagnostics() {
        quadra_error!(LogCategory::Driver, "{}", line);
    }
    Some(error)
}

/// Clear-then-check wrapper around driver calls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorHarness {
    policy: DriverErrorPolicy,
}

impl ErrorHarness {
    pub const fn new(policy: DriverErrorPolicy) -> Self {
        Self { policy }
    }

    /// Discard whatever errors are queued. Returns how many were dropped.
    pub fn clear_errors<D: Driver + ?Sized>(&self, driver: &D) -> usize {
        let stale = drain_errors(driver);
        if !stale.is_empty() {
            quadra_trace!(
                LogCategory::Driver,
                "Discarded {} stale driver error(s): {}",
                stale.len(),
                join_codes(&stale)
            );
        }
        stale.len()
    }

    /// Run `call` against `driver` with errors cleared before and checked after.
    ///
    /// Under [`DriverErrorPolicy::Abort`] this does not return when the driver
    /// reported an error.
    pub fn call<D, T, F>(&self, driver: &D, site: CallSite, call: F) -> Result<T, DriverCallError>
    where
        D: Driver + ?Sized,
        F: FnOnce(&D) -> T,
    {
        self.clear_errors(driver);
        let value = call(driver);
        self.check(driver, site)?;
        Ok(value)
    }

    /// Like [`ErrorHarness::call`], but errors are only logged. The policy is
    /// not consulted and the call's value is always returned.
    pub fn call_logged<D, T, F>(
        &self,
        driver: &D,
        site: CallSite,
        call: F,
    ) -> (T, Option<DriverCallError>)
    where
        D: Driver + ?Sized,
        F: FnOnce(&D) -> T,
    {
        self.clear_errors(driver);
        let value = call(driver);
        (value, log_errors(driver, site))
    }

    /// Drain the queue and report everything in it against `site`
    pub fn check<D: Driver + ?Sized>(&self, driver: &D, site: CallSite) -> Result<(), DriverCallError> {
        let Some(error) = log_errors(driver, site) else {
            return Ok(());
        };

        match self.policy {
            DriverErrorPolicy::Abort => {
                quadra_error!(LogCategory::Driver, "Aborting: {}", error);
                std::process::abort()
            }
            DriverErrorPolicy::Report => Err(error),
        }
    }
}

/// Wrap a [`Driver`] method call in an [`ErrorHarness`], capturing the call
/// text, file and line:
///
/// ```ignore
/// gl_call!(harness, &driver, draw_elements(glow::TRIANGLES, 6, glow::UNSIGNED_INT, 0))?;
/// ```
#[macro_export]
macro_rules! gl_call {
    ($harness:expr, $driver:expr, $method:ident($($arg:expr),* $(,)?)) => {
        $harness.call(
            $driver,
            $crate::harness::CallSite::new(
                concat!(stringify!($method), "(", stringify!($($arg),*), ")"),
                file!(),
                line!(),
            ),
            |driver| $crate::driver::Driver::$method(driver, $($arg),*),
        )
    };
}

/// [`gl_call!`] for calls that must not halt: errors are logged and handed
/// back next to the value instead of going through the policy.
#[macro_export]
macro_rules! gl_call_logged {
    ($harness:expr, $driver:expr, $method:ident($($arg:expr),* $(,)?)) => {
        $harness.call_logged(
            $driver,
            $crate::harness::CallSite::new(
                concat!(stringify!($method), "(", stringify!($($arg),*), ")"),
                file!(),
                line!(),
            ),
            |driver| $crate::driver::Driver::$method(driver, $($arg),*),
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{ProgramHandle, StageHandle};
    use crate::headless::HeadlessDriver;
    use pretty_assertions::assert_eq;

    fn report() -> ErrorHarness {
        ErrorHarness::new(DriverErrorPolicy::Report)
    }

    #[test]
    fn test_successful_call_returns_value() {
        let driver = HeadlessDriver::new();
        let buffer = gl_call!(report(), &driver, create_buffer()).unwrap();
        assert!(buffer.is_valid());
    }

    #[test]
    fn test_stale_errors_are_cleared_before_the_call() {
        let driver = HeadlessDriver::new();
        driver.inject_error(ErrorCode::OUT_OF_MEMORY);

        let result = gl_call!(report(), &driver, clear(glow::COLOR_BUFFER_BIT));
        assert!(result.is_ok());
        assert_eq!(driver.get_error(), ErrorCode::NO_ERROR);
    }

    #[test]
    fn test_call_site_points_at_the_macro() {
        let driver = HeadlessDriver::new();
        let line = line!() + 1;
        let err = gl_call!(report(), &driver, draw_elements(glow::TRIANGLES, -1, glow::UNSIGNED_INT, 0))
            .unwrap_err();

        assert_eq!(err.codes, vec![ErrorCode::INVALID_VALUE]);
        assert_eq!(err.site.file, file!());
        assert_eq!(err.site.line, line);
        assert!(err.site.call.starts_with("draw_elements("));
        assert!(err.site.call.contains("TRIANGLES"));
    }

    #[test]
    fn test_every_queued_code_is_reported() {
        let driver = HeadlessDriver::new();
        let err = report()
            .call(&driver, CallSite::new("two errors", "here.rs", 7), |driver| {
                driver.inject_error(ErrorCode::INVALID_ENUM);
                driver.inject_error(ErrorCode::INVALID_OPERATION);
            })
            .unwrap_err();

        assert_eq!(
            err.diagnostics(),
            vec![
                "[OpenGL Error] (1280) GL_INVALID_ENUM two errors here.rs: 7".to_string(),
                "[OpenGL Error] (1282) GL_INVALID_OPERATION two errors here.rs: 7".to_string(),
            ]
        );
    }

    #[test]
    fn test_logged_call_keeps_going_under_abort() {
        let driver = HeadlessDriver::new();
        let harness = ErrorHarness::new(DriverErrorPolicy::Abort);

        let ((), error) = gl_call_logged!(
            harness,
            &driver,
            attach_shader(ProgramHandle::INVALID, StageHandle::INVALID)
        );
        let error = error.unwrap();
        assert_eq!(error.codes, vec![ErrorCode::INVALID_VALUE]);
        assert!(error.site.call.starts_with("attach_shader("));
        assert_eq!(driver.get_error(), ErrorCode::NO_ERROR);

        let (buffer, error) = gl_call_logged!(harness, &driver, create_buffer());
        assert!(buffer.is_valid());
        assert_eq!(error, None);
    }

    #[test]
    fn test_drain_is_bounded() {
        let driver = HeadlessDriver::new();
        driver.lose_context();
        assert_eq!(drain_errors(&driver).len(), MAX_DRAINED_ERRORS);
    }
}
