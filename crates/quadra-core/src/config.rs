//! Configuration system for Quadra
//!
//! The whole configuration lives in a single RON document. Every section has
//! defaults, so a missing file or a partial file is fine:
//!
//! ```ron
//! (
//!     window: (title: "Hello World", width: 640, height: 480),
//!     renderer: (error_policy: Report, stage_failure_policy: FailFast),
//! )
//! ```

use crate::error::{ErrorContext, QuadraError, Result};
use crate::logging::LogCategory;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global configuration for Quadra
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuadraConfig {
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Window and context settings
    pub window: WindowConfig,
    /// Renderer settings
    pub renderer: RendererConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives used when `RUST_LOG` is not set
    pub filter: String,
    /// Print the target (`quadra::driver`, ...) in front of each line
    pub with_target: bool,
    /// Print source file and line of the log statement
    pub with_file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            with_target: true,
            with_file: false,
        }
    }
}

/// Window configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Wait for vertical blank when presenting
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Hello World".to_string(),
            width: 640,
            height: 480,
            vsync: true,
        }
    }
}

/// What the error harness does once a wrapped driver call reported errors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DriverErrorPolicy {
    /// Log every queued error and abort the process
    #[default]
    Abort,
    /// Log every queued error and hand them back to the caller
    Report,
}

/// What the program linker does with a stage that failed to compile
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageFailurePolicy {
    /// Attach the sentinel handle and let the driver complain
    #[default]
    AttachAnyway,
    /// Stop at the first failed stage and return an error
    FailFast,
}

/// Renderer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Combined `#shader vertex` / `#shader fragment` source file
    pub shader_path: PathBuf,
    /// RGBA colour used to clear the frame
    pub clear_color: [f32; 4],
    pub error_policy: DriverErrorPolicy,
    pub stage_failure_policy: StageFailurePolicy,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            shader_path: PathBuf::from("res/shaders/Basic.shader"),
            clear_color: [0.0, 0.0, 0.0, 1.0],
            error_policy: DriverErrorPolicy::default(),
            stage_failure_policy: StageFailurePolicy::default(),
        }
    }
}

impl QuadraConfig {
    /// Parse a configuration from RON text
    pub fn from_ron_str(text: &str) -> Result<Self> {
        ron::from_str(text).map_err(|e| {
            QuadraError::configuration_with_context(
                e.to_string(),
                ErrorContext::new("parse", "config"),
            )
        })
    }

    /// Load a configuration file, falling back to defaults when it does not exist
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_ron_str(&text).map_err(|e| match e {
                QuadraError::Configuration { message, .. } => {
                    QuadraError::configuration_with_context(
                        message,
                        ErrorContext::new("load", "config")
                            .with_metadata("path", path.display().to_string()),
                    )
                }
                other => other,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                crate::quadra_debug!(
                    LogCategory::Core,
                    "No config at {}, using defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Serialize the configuration back into pretty RON
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| QuadraError::configuration(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = QuadraConfig::default();

        assert_eq!(config.window.width, 640);
        assert_eq!(config.window.height, 480);
        assert_eq!(config.window.title, "Hello World");
        assert_eq!(
            config.renderer.shader_path,
            PathBuf::from("res/shaders/Basic.shader")
        );
        assert_eq!(config.renderer.error_policy, DriverErrorPolicy::Abort);
        assert_eq!(
            config.renderer.stage_failure_policy,
            StageFailurePolicy::AttachAnyway
        );
    }

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config = QuadraConfig::from_ron_str(
            "(renderer: (error_policy: Report, stage_failure_policy: FailFast))",
        )
        .unwrap();

        assert_eq!(config.renderer.error_policy, DriverErrorPolicy::Report);
        assert_eq!(
            config.renderer.stage_failure_policy,
            StageFailurePolicy::FailFast
        );
        assert_eq!(config.window, WindowConfig::default());
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn test_round_trip_through_ron() {
        let mut config = QuadraConfig::default();
        config.window.title = "Quad".to_string();
        config.renderer.clear_color = [0.1, 0.2, 0.3, 1.0];

        let text = config.to_ron_string().unwrap();
        assert_eq!(QuadraConfig::from_ron_str(&text).unwrap(), config);
    }

    #[test]
    fn test_malformed_document_is_configuration_error() {
        let err = QuadraConfig::from_ron_str("(window: (width: \"wide\"))").unwrap_err();
        assert!(matches!(err, QuadraError::Configuration { .. }));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = QuadraConfig::load(dir.path().join("absent.ron")).unwrap();
        assert_eq!(config, QuadraConfig::default());
    }

    #[test]
    fn test_load_reports_path_on_parse_failure() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "(window: oops)").unwrap();

        let err = QuadraConfig::load(file.path()).unwrap_err();
        let context = err.context().unwrap();
        assert_eq!(context.operation, "load");
        assert_eq!(
            context.metadata.get("path"),
            Some(&file.path().display().to_string())
        );
    }
}
