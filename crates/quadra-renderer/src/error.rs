//! Renderer error type

use crate::harness::DriverCallError;
use crate::shader::ShaderStage;
use quadra_core::{ErrorContext, QuadraError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    /// A wrapped driver call reported errors under the `Report` policy
    #[error(transparent)]
    Driver(#[from] DriverCallError),

    #[error("Failed to read shader source {}: {source}", path.display())]
    ShaderSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Only produced under `StageFailurePolicy::FailFast`
    #[error("Failed to compile {stage}")]
    StageCompilation { stage: ShaderStage },

    /// Only produced under `StageFailurePolicy::FailFast`
    #[error("Failed to link program: {log}")]
    Link { log: String },
}

impl RenderError {
    fn operation(&self) -> &'static str {
        match self {
            Self::Driver(_) => "driver call",
            Self::ShaderSource { .. } => "parse shader",
            Self::StageCompilation { .. } => "compile shader",
            Self::Link { .. } => "link program",
        }
    }
}

impl From<RenderError> for QuadraError {
    fn from(err: RenderError) -> Self {
        let mut context = ErrorContext::new(err.operation(), "renderer");
        match &err {
            RenderError::Driver(call) => {
                context = context
                    .with_metadata("file", call.site.file)
                    .with_metadata("line", call.site.line.to_string());
            }
            RenderError::ShaderSource { path, .. } => {
                context = context.with_metadata("path", path.display().to_string());
            }
            RenderError::StageCompilation { stage } => {
                context = context.with_metadata("stage", stage.to_string());
            }
            RenderError::Link { .. } => {}
        }
        QuadraError::renderer_with_context(err.to_string(), context)
    }
}

/// Result type alias for renderer operations
pub type Result<T> = std::result::Result<T, RenderError>;
