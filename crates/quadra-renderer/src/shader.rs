//! Combined shader source files
//!
//! One file carries every stage. A line containing `#shader` starts a
//! section; `vertex` or `fragment` on that line picks which one:
//!
//! ```text
//! #shader vertex
//! #version 330 core
//! void main() { ... }
//!
//! #shader fragment
//! #version 330 core
//! void main() { ... }
//! ```
//!
//! Lines before the first header belong to no stage and are dropped.

use crate::error::{RenderError, Result};
use quadra_core::logging::LogCategory;
use quadra_core::{quadra_debug, quadra_warn};
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Token that marks a section header line
pub const SECTION_MARKER: &str = "#shader";

/// Shader stage type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    /// The GL shader type enumerant
    pub const fn gl_type(self) -> u32 {
        match self {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        }
    }

    /// Human readable name used in diagnostics
    pub const fn name(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex shader",
            ShaderStage::Fragment => "fragment shader",
        }
    }

    /// Token that selects this stage on a section header line
    pub const fn section_token(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-stage source text split out of one combined file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderProgramSource {
    vertex_source: String,
    fragment_source: String,
}

impl ShaderProgramSource {
    pub fn new(vertex_source: impl Into<String>, fragment_source: impl Into<String>) -> Self {
        Self {
            vertex_source: vertex_source.into(),
            fragment_source: fragment_source.into(),
        }
    }

    pub fn vertex_source(&self) -> &str {
        &self.vertex_source
    }

    pub fn fragment_source(&self) -> &str {
        &self.fragment_source
    }
}

/// A `#shader` line whose stage token was not recognised
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    /// 1-based line number
    pub line: usize,
    pub header: String,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}: unrecognized shader section `{}`, keeping the previous section",
            self.line, self.header
        )
    }
}

/// Output of a parse: the sources plus anything worth warning about
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedShader {
    pub source: ShaderProgramSource,
    pub warnings: Vec<ParseWarning>,
}

/// Section currently receiving lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Section {
    #[default]
    None,
    Vertex,
    Fragment,
}

/// Incremental line-by-line splitter
#[derive(Debug, Default)]
pub struct ShaderSourceParser {
    section: Section,
    vertex: String,
    fragment: String,
    line_number: usize,
    warnings: Vec<ParseWarning>,
}

impl ShaderSourceParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line, without its terminator
    pub fn push_line(&mut self, line: &str) {
        self.line_number += 1;

        if line.contains(SECTION_MARKER) {
            self.switch_section(line);
            return;
        }

        let buffer = match self.section {
            Section::None => return,
            Section::Vertex => &mut self.vertex,
            Section::Fragment => &mut self.fragment,
        };
        buffer.push_str(line);
        buffer.push('\n');
    }

    fn switch_section(&mut self, header: &str) {
        if header.contains(ShaderStage::Vertex.section_token()) {
            self.section = Section::Vertex;
        } else if header.contains(ShaderStage::Fragment.section_token()) {
            self.section = Section::Fragment;
        } else {
            let warning = ParseWarning {
                line: self.line_number,
                header: header.trim().to_string(),
            };
            quadra_warn!(LogCategory::Shader, "{}", warning);
            self.warnings.push(warning);
        }
    }

    pub fn finish(self) -> ParsedShader {
        ParsedShader {
            source: ShaderProgramSource {
                vertex_source: self.vertex,
                fragment_source: self.fragment,
            },
            warnings: self.warnings,
        }
    }
}

/// Split combined shader text read from `reader`
pub fn parse_shader_reader<R: BufRead>(reader: R) -> io::Result<ParsedShader> {
    let mut parser = ShaderSourceParser::new();
    for line in reader.lines() {
        parser.push_line(&line?);
    }
    Ok(parser.finish())
}

/// Split combined shader text held in memory
pub fn parse_shader_str(text: &str) -> ParsedShader {
    let mut parser = ShaderSourceParser::new();
    for line in text.lines() {
        parser.push_line(line);
    }
    parser.finish()
}

/// Read and split the shader file at `path`
pub fn parse_shader(path: impl AsRef<Path>) -> Result<ShaderProgramSource> {
    let path = path.as_ref();
    let io_error = |source| RenderError::ShaderSource {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(io_error)?;
    let parsed = parse_shader_reader(BufReader::new(file)).map_err(io_error)?;

    quadra_debug!(
        LogCategory::Shader,
        "Parsed {} ({} warning(s))\nVERTEX\n{}\nFRAGMENT\n{}",
        path.display(),
        parsed.warnings.len(),
        parsed.source.vertex_source(),
        parsed.source.fragment_source()
    );
    Ok(parsed.source)
}
