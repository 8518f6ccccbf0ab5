//! End-to-end tests of the shader pipeline against the headless driver

mod common;

use common::{basic_shader_path, capture_logs, report_config};
use pretty_assertions::assert_eq;
use quadra_core::{DriverErrorPolicy, StageFailurePolicy};
use quadra_renderer::{
    compile_shader, gl_call, parse_shader, Driver, ErrorCode, ErrorHarness, HeadlessDriver,
    ProgramLinker, QuadRenderer, RenderError, ShaderProgramSource, ShaderStage, StageHandle,
};
use std::io::Write;

const VERTEX: &str = "#version 330 core\n\
                      layout(location = 0) in vec4 position;\n\
                      void main()\n{\n    gl_Position = position;\n}\n";

const FRAGMENT: &str = "#version 330 core\n\
                        layout(location = 0) out vec4 color;\n\
                        void main()\n{\n    color = vec4(0.2, 0.3, 0.8, 1.0);\n}\n";

fn report() -> ErrorHarness {
    ErrorHarness::new(DriverErrorPolicy::Report)
}

#[test]
fn test_basic_shader_renders_without_diagnostics() {
    let (driver, logs) = capture_logs(|| {
        let renderer = QuadRenderer::new(HeadlessDriver::new(), &report_config()).unwrap();
        renderer.resize(640, 480).unwrap();
        renderer.render_frame().unwrap();
        renderer.destroy().unwrap()
    });

    assert!(logs.lines_containing("[OpenGL Error]").is_empty());
    assert!(logs.lines_containing("Failed to compile").is_empty());
    assert!(logs.contents().contains("OpenGL version"));
    assert_eq!(driver.draw_count(), 1);
    assert_eq!(driver.live_program_count(), 0);
}

#[test]
fn test_basic_shader_file_splits_into_two_stages() {
    let source = parse_shader(basic_shader_path()).unwrap();

    assert!(source.vertex_source().starts_with("#version 330 core\n"));
    assert!(source.vertex_source().contains("gl_Position = position;"));
    assert!(!source.vertex_source().contains("#shader"));
    assert!(source
        .fragment_source()
        .contains("color = vec4(0.2, 0.3, 0.8, 1.0);"));
}

#[test]
fn test_bad_enum_is_logged_once_with_call_site() {
    let driver = HeadlessDriver::new();
    let line = line!() + 2;
    let (result, logs) = capture_logs(|| {
        gl_call!(report(), &driver, draw_elements(glow::TRIANGLES, 6, glow::INT, 0))
    });

    let err = result.unwrap_err();
    assert_eq!(err.codes, vec![ErrorCode::INVALID_ENUM]);

    let lines = logs.lines_containing("[OpenGL Error]");
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("[OpenGL Error] (1280) GL_INVALID_ENUM draw_elements("));
    assert!(lines[0].contains(file!()));
    assert!(lines[0].ends_with(&format!(": {}", line)));
}

#[test]
fn test_stale_errors_are_not_blamed_on_the_next_call() {
    let driver = HeadlessDriver::new();
    driver.inject_error(ErrorCode::INVALID_OPERATION);

    let (result, logs) = capture_logs(|| gl_call!(report(), &driver, clear(glow::COLOR_BUFFER_BIT)));

    assert!(result.is_ok());
    assert!(logs.lines_containing("[OpenGL Error]").is_empty());
}

#[test]
fn test_compile_failure_logs_stage_and_driver_log() {
    let driver = HeadlessDriver::new();
    let broken = "#version 330 core\nvoid main()\n{\n    color = vec4(1.0);\n";

    let (shader, logs) = capture_logs(|| {
        compile_shader(&driver, &report(), ShaderStage::Fragment, broken).unwrap()
    });

    assert_eq!(shader, StageHandle::INVALID);
    let output = logs.contents();
    assert!(output.contains("Failed to compile fragment shader"));
    assert!(output.contains("unexpected end of file"));
}

#[test]
fn test_valid_sources_compile_silently() {
    let driver = HeadlessDriver::new();
    let (program, logs) = capture_logs(|| {
        ProgramLinker::new(report(), StageFailurePolicy::AttachAnyway)
            .link(&driver, &ShaderProgramSource::new(VERTEX, FRAGMENT))
            .unwrap()
    });

    assert!(logs.lines_containing("Failed to compile").is_empty());
    assert!(logs.lines_containing("[OpenGL Error]").is_empty());
    assert!(driver.get_program_link_status(program.handle()));
    assert_eq!(driver.live_shader_count(), 0);

    program.destroy(&driver, &report()).unwrap();
}

#[test]
fn test_broken_vertex_stage_still_yields_a_program() {
    let driver = HeadlessDriver::new();
    let source = ShaderProgramSource::new("void main() {\n", FRAGMENT);
    let harness = ErrorHarness::new(DriverErrorPolicy::Abort);

    let (program, logs) = capture_logs(|| {
        ProgramLinker::new(harness, StageFailurePolicy::AttachAnyway)
            .link(&driver, &source)
            .unwrap()
    });

    assert!(!driver.get_program_link_status(program.handle()));
    assert!(logs.contents().contains("Failed to compile vertex shader"));
    assert!(logs.contents().contains("0:1: error:"));
    assert_eq!(logs.lines_containing("GL_INVALID_VALUE attach_shader(").len(), 1);
    assert_eq!(logs.lines_containing("[OpenGL Error]").len(), 1);
    assert_eq!(driver.live_shader_count(), 0);

    program.destroy(&driver, &harness).unwrap();
    assert_eq!(driver.live_program_count(), 0);
}

#[test]
fn test_shader_file_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        "// preamble\r\n#shader vertex\r\n{}#shader fragment\r\n{}",
        VERTEX, FRAGMENT
    )
    .unwrap();

    let source = parse_shader(file.path()).unwrap();
    assert_eq!(source.vertex_source(), VERTEX);
    assert_eq!(source.fragment_source(), FRAGMENT);
}

#[test]
fn test_missing_shader_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.shader");

    match parse_shader(&path) {
        Err(RenderError::ShaderSource { path: reported, source }) => {
            assert_eq!(reported, path);
            assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_unknown_section_is_warned_about() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "#shader vertex\nv\n#shader tessellation\nt\n").unwrap();

    let (source, logs) = capture_logs(|| parse_shader(file.path()).unwrap());

    assert_eq!(source.vertex_source(), "v\nt\n");
    assert_eq!(logs.lines_containing("unrecognized shader section").len(), 1);
}

#[test]
fn test_lost_context_drain_terminates() {
    let driver = HeadlessDriver::new();
    driver.lose_context();

    let err = gl_call!(report(), &driver, create_buffer()).unwrap_err();
    assert!(err.codes.iter().all(|code| *code == ErrorCode::CONTEXT_LOST));
    assert_eq!(err.codes.len(), quadra_renderer::MAX_DRAINED_ERRORS);
}
