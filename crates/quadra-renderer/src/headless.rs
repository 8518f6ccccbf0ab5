//! In-process OpenGL simulation
//!
//! [`HeadlessDriver`] keeps the same object model and error flags as a GL
//! context: names come from one counter, misuse records `GL_INVALID_*` codes
//! instead of failing, and `get_error` hands them back oldest first. Shader
//! "compilation" is a light structural check that produces GLSL-style info
//! logs, and linking matches fragment inputs against vertex outputs.
//!
//! It exists so the pipeline can run without a window or GPU.

use crate::driver::{BufferHandle, Driver, ErrorCode, ProgramHandle, StageHandle, VertexArrayHandle};
use crate::shader::ShaderStage;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Number of generic vertex attributes the simulated context exposes
pub const MAX_VERTEX_ATTRIBS: u32 = 16;

const VERSION: &str = "3.3.0 Quadra Headless";

#[derive(Debug)]
struct ShaderObject {
    stage: ShaderStage,
    source: String,
    compiled: bool,
    info_log: String,
    delete_pending: bool,
}

#[derive(Debug, Default)]
struct ProgramObject {
    attached: Vec<u32>,
    linked: bool,
    validated: bool,
    info_log: String,
}

#[derive(Debug, Default)]
struct VertexArrayObject {
    element_buffer: u32,
    enabled: [bool; MAX_VERTEX_ATTRIBS as usize],
}

#[derive(Debug)]
struct State {
    next_name: u32,
    errors: Vec<ErrorCode>,
    context_lost: bool,

    shaders: HashMap<u32, ShaderObject>,
    programs: HashMap<u32, ProgramObject>,
    buffers: HashMap<u32, Vec<u8>>,
    /// Name 0 is the default vertex array and always exists
    vertex_arrays: HashMap<u32, VertexArrayObject>,

    array_buffer: u32,
    vertex_array: u32,
    current_program: u32,

    viewport: [i32; 4],
    clear_color: [f32; 4],
    clears: usize,
    draw_calls: usize,
}

impl Default for State {
    fn default() -> Self {
        let mut vertex_arrays = HashMap::new();
        vertex_arrays.insert(0, VertexArrayObject::default());
        Self {
            next_name: 1,
            errors: Vec::new(),
            context_lost: false,
            shaders: HashMap::new(),
            programs: HashMap::new(),
            buffers: HashMap::new(),
            vertex_arrays,
            array_buffer: 0,
            vertex_array: 0,
            current_program: 0,
            viewport: [0; 4],
            clear_color: [0.0; 4],
            clears: 0,
            draw_calls: 0,
        }
    }
}

impl State {
    fn gen_name(&mut self) -> u32 {
        let name = self.next_name;
        self.next_name += 1;
        name
    }

    /// GL keeps one flag per code until it is read
    fn record(&mut self, code: ErrorCode) {
        if !self.errors.contains(&code) {
            self.errors.push(code);
        }
    }

    /// Resolve a shader name the way shader entry points do: unknown names
    /// are `INVALID_VALUE`, program names `INVALID_OPERATION`.
    fn shader_mut(&mut self, shader: StageHandle) -> Option<&mut ShaderObject> {
        let name = shader.raw();
        if self.shaders.contains_key(&name) {
            return self.shaders.get_mut(&name);
        }
        let code = if self.programs.contains_key(&name) {
            ErrorCode::INVALID_OPERATION
        } else {
            ErrorCode::INVALID_VALUE
        };
        self.record(code);
        None
    }

    fn program_mut(&mut self, program: ProgramHandle) -> Option<&mut ProgramObject> {
        let name = program.raw();
        if self.programs.contains_key(&name) {
            return self.programs.get_mut(&name);
        }
        let code = if self.shaders.contains_key(&name) {
            ErrorCode::INVALID_OPERATION
        } else {
            ErrorCode::INVALID_VALUE
        };
        self.record(code);
        None
    }

    fn is_attached_anywhere(&self, shader: u32) -> bool {
        self.programs
            .values()
            .any(|program| program.attached.contains(&shader))
    }

    fn buffer_binding(&mut self, target: u32) -> Option<u32> {
        match target {
            glow::ARRAY_BUFFER => Some(self.array_buffer),
            glow::ELEMENT_ARRAY_BUFFER => self
                .vertex_arrays
                .get(&self.vertex_array)
                .map(|vao| vao.element_buffer),
            _ => {
                self.record(ErrorCode::INVALID_ENUM);
                None
            }
        }
    }

    fn link(&mut self, name: u32) {
        let attached = self
            .programs
            .get(&name)
            .map(|program| program.attached.clone())
            .unwrap_or_default();

        let shaders = &self.shaders;
        let find = |stage: ShaderStage| {
            attached
                .iter()
                .filter_map(|shader| shaders.get(shader))
                .find(|shader| shader.stage == stage)
        };

        let result = match (find(ShaderStage::Vertex), find(ShaderStage::Fragment)) {
            (None, _) => Err("error: no vertex shader attached".to_string()),
            (_, None) => Err("error: no fragment shader attached".to_string()),
            (Some(vertex), _) if !vertex.compiled => {
                Err("error: vertex shader is not compiled".to_string())
            }
            (_, Some(fragment)) if !fragment.compiled => {
                Err("error: fragment shader is not compiled".to_string())
            }
            (Some(vertex), Some(fragment)) => match_interfaces(&vertex.source, &fragment.source),
        };

        if let Some(program) = self.programs.get_mut(&name) {
            match result {
                Ok(()) => {
                    program.linked = true;
                    program.info_log.clear();
                }
                Err(log) => {
                    program.linked = false;
                    program.info_log = format!("{}\n", log);
                }
            }
            program.validated = false;
        }
    }
}

/// A software stand-in for a GL context.
///
/// Clones share the same objects and error queue, so a test can keep one
/// handle for inspection after moving another into a renderer.
#[derive(Debug, Default, Clone)]
pub struct HeadlessDriver {
    state: Arc<Mutex<State>>,
}

impl HeadlessDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an error as if the last command had raised it
    pub fn inject_error(&self, code: ErrorCode) {
        self.state.lock().record(code);
    }

    /// From now on every `get_error` reports `GL_CONTEXT_LOST`
    pub fn lose_context(&self) {
        self.state.lock().context_lost = true;
    }

    /// `glIsShader`: also true for shaders flagged for deletion but still attached
    pub fn is_shader(&self, shader: StageHandle) -> bool {
        self.state.lock().shaders.contains_key(&shader.raw())
    }

    pub fn is_program(&self, program: ProgramHandle) -> bool {
        self.state.lock().programs.contains_key(&program.raw())
    }

    pub fn live_shader_count(&self) -> usize {
        self.state.lock().shaders.len()
    }

    pub fn live_program_count(&self) -> usize {
        self.state.lock().programs.len()
    }

    pub fn live_buffer_count(&self) -> usize {
        self.state.lock().buffers.len()
    }

    /// Vertex arrays created by the caller, not counting the default one
    pub fn live_vertex_array_count(&self) -> usize {
        self.state.lock().vertex_arrays.len() - 1
    }

    pub fn buffer_contents(&self, buffer: BufferHandle) -> Option<Vec<u8>> {
        self.state.lock().buffers.get(&buffer.raw()).cloned()
    }

    pub fn current_program(&self) -> ProgramHandle {
        ProgramHandle::from_raw(self.state.lock().current_program)
    }

    pub fn is_program_validated(&self, program: ProgramHandle) -> bool {
        self.state
            .lock()
            .programs
            .get(&program.raw())
            .is_some_and(|program| program.validated)
    }

    pub fn is_attrib_enabled(&self, index: u32) -> bool {
        let state = self.state.lock();
        state
            .vertex_arrays
            .get(&state.vertex_array)
            .and_then(|vao| vao.enabled.get(index as usize).copied())
            .unwrap_or(false)
    }

    pub fn viewport_rect(&self) -> [i32; 4] {
        self.state.lock().viewport
    }

    pub fn current_clear_color(&self) -> [f32; 4] {
        self.state.lock().clear_color
    }

    pub fn clear_count(&self) -> usize {
        self.state.lock().clears
    }

    pub fn draw_count(&self) -> usize {
        self.state.lock().draw_calls
    }
}

impl Driver for HeadlessDriver {
    fn get_error(&self) -> ErrorCode {
        let mut state = self.state.lock();
        if state.context_lost {
            return ErrorCode::CONTEXT_LOST;
        }
        if state.errors.is_empty() {
            ErrorCode::NO_ERROR
        } else {
            state.errors.remove(0)
        }
    }

    fn version_string(&self) -> String {
        VERSION.to_string()
    }

    fn create_shader(&self, stage: ShaderStage) -> StageHandle {
        let mut state = self.state.lock();
        let name = state.gen_name();
        state.shaders.insert(
            name,
            ShaderObject {
                stage,
                source: String::new(),
                compiled: false,
                info_log: String::new(),
                delete_pending: false,
            },
        );
        StageHandle::from_raw(name)
    }

    fn shader_source(&self, shader: StageHandle, source: &str) {
        if let Some(object) = self.state.lock().shader_mut(shader) {
            object.source = source.to_string();
        }
    }

    fn compile_shader(&self, shader: StageHandle) {
        if let Some(object) = self.state.lock().shader_mut(shader) {
            match check_source(&object.source) {
                Ok(()) => {
                    object.compiled = true;
                    object.info_log.clear();
                }
                Err(log) => {
                    object.compiled = false;
                    object.info_log = log;
                }
            }
        }
    }

    fn get_shader_compile_status(&self, shader: StageHandle) -> bool {
        self.state
            .lock()
            .shader_mut(shader)
            .is_some_and(|object| object.compiled)
    }

    fn get_shader_info_log(&self, shader: StageHandle) -> String {
        self.state
            .lock()
            .shader_mut(shader)
            .map(|object| object.info_log.clone())
            .unwrap_or_default()
    }

    fn delete_shader(&self, shader: StageHandle) {
        if !shader.is_valid() {
            return;
        }
        let mut state = self.state.lock();
        if state.shader_mut(shader).is_none() {
            return;
        }
        if state.is_attached_anywhere(shader.raw()) {
            if let Some(object) = state.shaders.get_mut(&shader.raw()) {
                object.delete_pending = true;
            }
        } else {
            state.shaders.remove(&shader.raw());
        }
    }

    fn create_program(&self) -> ProgramHandle {
        let mut state = self.state.lock();
        let name = state.gen_name();
        state.programs.insert(name, ProgramObject::default());
        ProgramHandle::from_raw(name)
    }

    fn attach_shader(&self, program: ProgramHandle, shader: StageHandle) {
        let mut state = self.state.lock();
        if state.program_mut(program).is_none() || state.shader_mut(shader).is_none() {
            return;
        }
        let attached = state
            .programs
            .get(&program.raw())
            .is_some_and(|object| object.attached.contains(&shader.raw()));
        if attached {
            state.record(ErrorCode::INVALID_OPERATION);
        } else if let Some(object) = state.programs.get_mut(&program.raw()) {
            object.attached.push(shader.raw());
        }
    }

    fn detach_shader(&self, program: ProgramHandle, shader: StageHandle) {
        let mut state = self.state.lock();
        if state.program_mut(program).is_none() || state.shader_mut(shader).is_none() {
            return;
        }
        let position = state
            .programs
            .get(&program.raw())
            .and_then(|object| object.attached.iter().position(|&name| name == shader.raw()));
        let Some(position) = position else {
            state.record(ErrorCode::INVALID_OPERATION);
            return;
        };
        if let Some(object) = state.programs.get_mut(&program.raw()) {
            object.attached.remove(position);
        }

        let release = state
            .shaders
            .get(&shader.raw())
            .is_some_and(|object| object.delete_pending)
            && !state.is_attached_anywhere(shader.raw());
        if release {
            state.shaders.remove(&shader.raw());
        }
    }

    fn link_program(&self, program: ProgramHandle) {
        let mut state = self.state.lock();
        if state.program_mut(program).is_some() {
            state.link(program.raw());
        }
    }

    fn validate_program(&self, program: ProgramHandle) {
        if let Some(object) = self.state.lock().program_mut(program) {
            object.validated = object.linked;
            if !object.linked {
                object
                    .info_log
                    .push_str("Validation failed: program is not successfully linked\n");
            }
        }
    }

    fn get_program_link_status(&self, program: ProgramHandle) -> bool {
        self.state
            .lock()
            .program_mut(program)
            .is_some_and(|object| object.linked)
    }

    fn get_program_info_log(&self, program: ProgramHandle) -> String {
        self.state
            .lock()
            .program_mut(program)
            .map(|object| object.info_log.clone())
            .unwrap_or_default()
    }

    fn use_program(&self, program: ProgramHandle) {
        let mut state = self.state.lock();
        if !program.is_valid() {
            state.current_program = 0;
            return;
        }
        match state.program_mut(program).map(|object| object.linked) {
            Some(true) => state.current_program = program.raw(),
            Some(false) => state.record(ErrorCode::INVALID_OPERATION),
            None => {}
        }
    }

    fn delete_program(&self, program: ProgramHandle) {
        if !program.is_valid() {
            return;
        }
        let mut state = self.state.lock();
        if state.program_mut(program).is_none() {
            return;
        }
        if let Some(object) = state.programs.remove(&program.raw()) {
            for shader in object.attached {
                let release = state
                    .shaders
                    .get(&shader)
                    .is_some_and(|object| object.delete_pending)
                    && !state.is_attached_anywhere(shader);
                if release {
                    state.shaders.remove(&shader);
                }
            }
        }
        if state.current_program == program.raw() {
            state.current_program = 0;
        }
    }

    fn create_vertex_array(&self) -> VertexArrayHandle {
        let mut state = self.state.lock();
        let name = state.gen_name();
        state.vertex_arrays.insert(name, VertexArrayObject::default());
        VertexArrayHandle::from_raw(name)
    }

    fn bind_vertex_array(&self, vertex_array: VertexArrayHandle) {
        let mut state = self.state.lock();
        if state.vertex_arrays.contains_key(&vertex_array.raw()) {
            state.vertex_array = vertex_array.raw();
        } else {
            state.record(ErrorCode::INVALID_OPERATION);
        }
    }

    fn delete_vertex_array(&self, vertex_array: VertexArrayHandle) {
        if !vertex_array.is_valid() {
            return;
        }
        let mut state = self.state.lock();
        if state.vertex_arrays.remove(&vertex_array.raw()).is_some()
            && state.vertex_array == vertex_array.raw()
        {
            state.vertex_array = 0;
        }
    }

    fn create_buffer(&self) -> BufferHandle {
        let mut state = self.state.lock();
        let name = state.gen_name();
        state.buffers.insert(name, Vec::new());
        BufferHandle::from_raw(name)
    }

    fn bind_buffer(&self, target: u32, buffer: BufferHandle) {
        let mut state = self.state.lock();
        if buffer.is_valid() && !state.buffers.contains_key(&buffer.raw()) {
            state.record(ErrorCode::INVALID_OPERATION);
            return;
        }
        match target {
            glow::ARRAY_BUFFER => state.array_buffer = buffer.raw(),
            glow::ELEMENT_ARRAY_BUFFER => {
                let current = state.vertex_array;
                if let Some(vao) = state.vertex_arrays.get_mut(&current) {
                    vao.element_buffer = buffer.raw();
                }
            }
            _ => state.record(ErrorCode::INVALID_ENUM),
        }
    }

    fn buffer_data(&self, target: u32, data: &[u8], usage: u32) {
        let mut state = self.state.lock();
        let Some(bound) = state.buffer_binding(target) else {
            return;
        };
        if !matches!(
            usage,
            glow::STATIC_DRAW | glow::DYNAMIC_DRAW | glow::STREAM_DRAW
        ) {
            state.record(ErrorCode::INVALID_ENUM);
            return;
        }
        match state.buffers.get_mut(&bound) {
            Some(storage) if bound != 0 => *storage = data.to_vec(),
            _ => state.record(ErrorCode::INVALID_OPERATION),
        }
    }

    fn delete_buffer(&self, buffer: BufferHandle) {
        let mut state = self.state.lock();
        if state.buffers.remove(&buffer.raw()).is_none() {
            return;
        }
        if state.array_buffer == buffer.raw() {
            state.array_buffer = 0;
        }
        for vao in state.vertex_arrays.values_mut() {
            if vao.element_buffer == buffer.raw() {
                vao.element_buffer = 0;
            }
        }
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        let mut state = self.state.lock();
        if index >= MAX_VERTEX_ATTRIBS {
            state.record(ErrorCode::INVALID_VALUE);
            return;
        }
        let current = state.vertex_array;
        if let Some(vao) = state.vertex_arrays.get_mut(&current) {
            vao.enabled[index as usize] = true;
        }
    }

    fn vertex_attrib_pointer_f32(
        &self,
        index: u32,
        size: i32,
        data_type: u32,
        _normalized: bool,
        stride: i32,
        offset: i32,
    ) {
        let mut state = self.state.lock();
        if index >= MAX_VERTEX_ATTRIBS || !(1..=4).contains(&size) || stride < 0 {
            state.record(ErrorCode::INVALID_VALUE);
        } else if !matches!(
            data_type,
            glow::FLOAT | glow::HALF_FLOAT | glow::DOUBLE
        ) {
            state.record(ErrorCode::INVALID_ENUM);
        } else if state.array_buffer == 0 && offset != 0 {
            state.record(ErrorCode::INVALID_OPERATION);
        }
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        let mut state = self.state.lock();
        if width < 0 || height < 0 {
            state.record(ErrorCode::INVALID_VALUE);
        } else {
            state.viewport = [x, y, width, height];
        }
    }

    fn clear_color(&self, red: f32, green: f32, blue: f32, alpha: f32) {
        let clamp = |value: f32| value.clamp(0.0, 1.0);
        self.state.lock().clear_color = [clamp(red), clamp(green), clamp(blue), clamp(alpha)];
    }

    fn clear(&self, mask: u32) {
        let mut state = self.state.lock();
        let known = glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT | glow::STENCIL_BUFFER_BIT;
        if mask & !known != 0 {
            state.record(ErrorCode::INVALID_VALUE);
        } else {
            state.clears += 1;
        }
    }

    fn draw_elements(&self, mode: u32, count: i32, element_type: u32, _offset: i32) {
        let mut state = self.state.lock();
        let valid_mode = matches!(
            mode,
            glow::POINTS
                | glow::LINES
                | glow::LINE_LOOP
                | glow::LINE_STRIP
                | glow::TRIANGLES
                | glow::TRIANGLE_STRIP
                | glow::TRIANGLE_FAN
        );
        let valid_type = matches!(
            element_type,
            glow::UNSIGNED_BYTE | glow::UNSIGNED_SHORT | glow::UNSIGNED_INT
        );
        let element_buffer = state
            .vertex_arrays
            .get(&state.vertex_array)
            .map_or(0, |vao| vao.element_buffer);

        if !valid_mode || !valid_type {
            state.record(ErrorCode::INVALID_ENUM);
        } else if count < 0 {
            state.record(ErrorCode::INVALID_VALUE);
        } else if element_buffer == 0 {
            state.record(ErrorCode::INVALID_OPERATION);
        } else {
            state.draw_calls += 1;
        }
    }
}

/// Structural check standing in for a GLSL compiler.
///
/// Errors use the `0:<line>: error: ...` shape most drivers print.
fn check_source(source: &str) -> Result<(), String> {
    let mut errors = Vec::new();
    let mut braces = 0i32;
    let mut parens = 0i32;
    let mut seen_statement = false;
    let mut last_line = 1;

    for (index, raw) in source.lines().enumerate() {
        let number = index + 1;
        last_line = number;
        let line = strip_comment(raw).trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with("#version") {
            if seen_statement {
                errors.push(format!(
                    "0:{}: error: #version must occur before any other statement",
                    number
                ));
            }
            continue;
        }
        seen_statement = true;

        for ch in line.chars() {
            match ch {
                '{' => braces += 1,
                '}' => braces -= 1,
                '(' => parens += 1,
                ')' => parens -= 1,
                _ => {}
            }
            if braces < 0 || parens < 0 {
                errors.push(format!("0:{}: error: syntax error, unexpected '{}'", number, ch));
                braces = braces.max(0);
                parens = parens.max(0);
            }
        }
    }

    if braces > 0 || parens > 0 {
        errors.push(format!(
            "0:{}: error: syntax error, unexpected end of file",
            last_line
        ));
    }

    let defines_main = source
        .lines()
        .map(|line| strip_comment(line).split_whitespace().collect::<String>())
        .any(|compact| compact.contains("voidmain("));
    if !defines_main {
        errors.push("0:0: error: function 'main' is not defined".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.join("\n") + "\n")
    }
}

fn strip_comment(line: &str) -> &str {
    line.split("//").next().unwrap_or(line)
}

/// `(type, name)` pairs declared with `qualifier` at global scope
fn interface_variables(source: &str, qualifier: &str) -> BTreeMap<String, String> {
    source
        .lines()
        .filter_map(|line| {
            let line = strip_comment(line).trim().trim_end_matches(';');
            let line = match line.find(')') {
                Some(end) if line.starts_with("layout") => line[end + 1..].trim(),
                _ => line,
            };
            let mut words = line.split_whitespace();
            if words.next()? != qualifier {
                return None;
            }
            let ty = words.next()?;
            let name = words.next()?;
            Some((name.to_string(), ty.to_string()))
        })
        .collect()
}

/// Every non-`layout` fragment input needs a vertex output of the same name and type
fn match_interfaces(vertex: &str, fragment: &str) -> Result<(), String> {
    let outputs = interface_variables(vertex, "out");
    let errors: Vec<String> = fragment
        .lines()
        .filter(|line| !line.trim_start().starts_with("layout"))
        .flat_map(|line| interface_variables(line, "in"))
        .filter_map(|(name, ty)| match outputs.get(&name) {
            None => Some(format!(
                "error: fragment shader input `{}` has no matching output in the vertex shader",
                name
            )),
            Some(out_ty) if *out_ty != ty => Some(format!(
                "error: `{}` declared as {} in the vertex shader but {} in the fragment shader",
                name, out_ty, ty
            )),
            Some(_) => None,
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_error_flags_are_not_duplicated() {
        let driver = HeadlessDriver::new();
        driver.draw_elements(glow::TRIANGLES, -1, glow::UNSIGNED_INT, 0);
        driver.draw_elements(glow::TRIANGLES, -1, glow::UNSIGNED_INT, 0);
        driver.clear(0xFFFF_FFFF);

        assert_eq!(driver.get_error(), ErrorCode::INVALID_VALUE);
        assert_eq!(driver.get_error(), ErrorCode::NO_ERROR);
    }

    #[test]
    fn test_compile_reports_unbalanced_braces() {
        let log = check_source("#version 330 core\nvoid main()\n{\n").unwrap_err();
        assert_eq!(log, "0:3: error: syntax error, unexpected end of file\n");
    }

    #[test]
    fn test_compile_requires_main() {
        let log = check_source("#version 330 core\nvoid helper() {}\n").unwrap_err();
        assert!(log.contains("'main' is not defined"));
    }

    #[test]
    fn test_version_must_come_first() {
        let log = check_source("float x;\n#version 330 core\nvoid main() {}\n").unwrap_err();
        assert!(log.starts_with("0:2: error: #version"));
    }

    #[test]
    fn test_compile_accepts_comments_and_layout() {
        let source = "#version 330 core\n\
                      // entry point ( unbalanced in comment\n\
                      layout(location = 0) in vec4 position;\n\
                      void main()\n{\n    gl_Position = position;\n}\n";
        assert_eq!(check_source(source), Ok(()));
    }

    #[test]
    fn test_interface_matching() {
        let vertex = "out vec3 v_color;\nvoid main() {}\n";
        assert_eq!(match_interfaces(vertex, "in vec3 v_color;\n"), Ok(()));
        assert!(match_interfaces(vertex, "in vec4 v_color;\n")
            .unwrap_err()
            .contains("vec3"));
        assert!(match_interfaces(vertex, "layout(location = 0) in vec4 extra;\n").is_ok());
        assert!(match_interfaces("void main() {}\n", "in vec2 v_uv;\n").is_err());
    }

    #[test]
    fn test_shader_deleted_while_attached_lives_until_detached() {
        let driver = HeadlessDriver::new();
        let program = driver.create_program();
        let shader = driver.create_shader(ShaderStage::Vertex);
        driver.attach_shader(program, shader);

        driver.delete_shader(shader);
        assert!(driver.is_shader(shader));

        driver.detach_shader(program, shader);
        assert!(!driver.is_shader(shader));
        assert_eq!(driver.get_error(), ErrorCode::NO_ERROR);
    }

    #[test]
    fn test_clones_share_one_context() {
        let driver = HeadlessDriver::new();
        let inspector = driver.clone();

        let program = driver.create_program();
        assert!(inspector.is_program(program));

        inspector.delete_program(program);
        assert!(!driver.is_program(program));
        assert_eq!(driver.live_program_count(), 0);
    }

    #[test]
    fn test_unlinked_program_cannot_be_used() {
        let driver = HeadlessDriver::new();
        let program = driver.create_program();
        driver.use_program(program);

        assert_eq!(driver.get_error(), ErrorCode::INVALID_OPERATION);
        assert_eq!(driver.current_program(), ProgramHandle::INVALID);
    }

    #[test]
    fn test_shader_calls_reject_program_names() {
        let driver = HeadlessDriver::new();
        let program = driver.create_program();
        driver.compile_shader(StageHandle::from_raw(program.raw()));
        assert_eq!(driver.get_error(), ErrorCode::INVALID_OPERATION);

        driver.compile_shader(StageHandle::INVALID);
        assert_eq!(driver.get_error(), ErrorCode::INVALID_VALUE);
    }

    #[test]
    fn test_draw_requires_element_buffer() {
        let driver = HeadlessDriver::new();
        driver.draw_elements(glow::TRIANGLES, 6, glow::UNSIGNED_INT, 0);
        assert_eq!(driver.get_error(), ErrorCode::INVALID_OPERATION);

        driver.draw_elements(glow::TRIANGLES, 6, glow::INT, 0);
        assert_eq!(driver.get_error(), ErrorCode::INVALID_ENUM);
        assert_eq!(driver.draw_count(), 0);
    }

    #[test]
    fn test_element_binding_belongs_to_vertex_array() {
        let driver = HeadlessDriver::new();
        let vao = driver.create_vertex_array();
        let ibo = driver.create_buffer();

        driver.bind_vertex_array(vao);
        driver.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, ibo);
        driver.buffer_data(glow::ELEMENT_ARRAY_BUFFER, &[0, 0, 0, 0], glow::STATIC_DRAW);
        driver.draw_elements(glow::TRIANGLES, 1, glow::UNSIGNED_INT, 0);
        assert_eq!(driver.draw_count(), 1);

        driver.bind_vertex_array(VertexArrayHandle::INVALID);
        driver.draw_elements(glow::TRIANGLES, 1, glow::UNSIGNED_INT, 0);
        assert_eq!(driver.get_error(), ErrorCode::INVALID_OPERATION);
    }

    #[test]
    fn test_buffer_data_needs_a_binding() {
        let driver = HeadlessDriver::new();
        driver.buffer_data(glow::ARRAY_BUFFER, &[1, 2, 3], glow::STATIC_DRAW);
        assert_eq!(driver.get_error(), ErrorCode::INVALID_OPERATION);

        let buffer = driver.create_buffer();
        driver.bind_buffer(glow::ARRAY_BUFFER, buffer);
        driver.buffer_data(glow::ARRAY_BUFFER, &[1, 2, 3], glow::STATIC_DRAW);
        assert_eq!(driver.buffer_contents(buffer), Some(vec![1, 2, 3]));
        assert_eq!(driver.get_error(), ErrorCode::NO_ERROR);
    }
}
