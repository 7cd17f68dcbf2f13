//! Recording `GlBackend` used by the unit tests.
//!
//! Sources compile unless they contain `#error` or lack a `main` entry point.
//! Every call is recorded and live objects are tracked so tests can check
//! for leaks and double deletes.

use crate::render::backend::GlBackend;
use crate::render::shaders::ShaderStage;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateShader(ShaderStage, u32),
    ShaderSource(u32, String),
    CompileShader(u32),
    DeleteShader(u32),
    CreateProgram(u32),
    AttachShader(u32, u32),
    LinkProgram(u32),
    UseProgram(Option<u32>),
    DeleteProgram(u32),
    CreateBuffer(u32),
    BindArrayBuffer(Option<u32>),
    BufferData {
        target: Option<u32>,
        data: Vec<u8>,
    },
    DeleteBuffer(u32),
    CreateVertexArray(u32),
    BindVertexArray(Option<u32>),
    DeleteVertexArray(u32),
    EnableVertexAttribArray(u32),
    VertexAttribPointer {
        index: u32,
        size: i32,
        stride: i32,
        offset: i32,
    },
    ClearColor([f32; 4]),
    Clear,
    DrawTriangles {
        first: i32,
        count: i32,
    },
}

#[derive(Debug)]
struct FakeShader {
    source: String,
    compiled: bool,
}

#[derive(Debug, Default)]
struct FakeProgram {
    attached: Vec<u32>,
    linked: bool,
}

#[derive(Debug, Default)]
pub(crate) struct State {
    next_id: u32,
    array_buffer: Option<u32>,
    shaders: BTreeMap<u32, FakeShader>,
    programs: BTreeMap<u32, FakeProgram>,
    buffers: BTreeSet<u32>,
    vertex_arrays: BTreeSet<u32>,
    calls: Vec<Call>,
    double_deletes: usize,
}

impl State {
    fn allocate(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug, Default)]
pub struct RecordingGl {
    pub embedded: bool,
    pub fail_shader_creation: Option<ShaderStage>,
    pub fail_program_creation: bool,
    pub fail_link: bool,
    pub fail_buffer: bool,
    pub fail_vertex_array: bool,
    /// Report failures with an empty info log.
    pub silent_logs: bool,
    pub(crate) state: RefCell<State>,
}

impl RecordingGl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn embedded() -> Self {
        Self {
            embedded: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    pub fn live_shaders(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    pub fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.state.borrow().buffers.len()
    }

    pub fn live_vertex_arrays(&self) -> usize {
        self.state.borrow().vertex_arrays.len()
    }

    pub fn double_deletes(&self) -> usize {
        self.state.borrow().double_deletes
    }

    pub fn is_program_live(&self, program: u32) -> bool {
        self.state.borrow().programs.contains_key(&program)
    }

    pub fn draw_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::DrawTriangles { .. }))
            .count()
    }

    pub fn last_upload(&self) -> Option<Vec<u8>> {
        self.calls().into_iter().rev().find_map(|call| match call {
            Call::BufferData { data, .. } => Some(data),
            _ => None,
        })
    }

    /// Buffer bound to `ARRAY_BUFFER` at each upload, oldest first.
    pub fn upload_targets(&self) -> Vec<Option<u32>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::BufferData { target, .. } => Some(target),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.state.borrow_mut().calls.push(call);
    }

    fn compiles(source: &str) -> bool {
        !source.contains("#error") && source.contains("void main")
    }
}

impl GlBackend for RecordingGl {
    type Shader = u32;
    type Program = u32;
    type Buffer = u32;
    type VertexArray = u32;

    fn is_embedded(&self) -> bool {
        self.embedded
    }

    fn create_shader(&self, stage: ShaderStage) -> Result<u32, String> {
        if self.fail_shader_creation == Some(stage) {
            return Err(format!("cannot allocate {stage} shader"));
        }
        let mut state = self.state.borrow_mut();
        let id = state.allocate();
        state.shaders.insert(
            id,
            FakeShader {
                source: String::new(),
                compiled: false,
            },
        );
        state.calls.push(Call::CreateShader(stage, id));
        Ok(id)
    }

    fn shader_source(&self, shader: u32, source: &str) {
        let mut state = self.state.borrow_mut();
        if let Some(entry) = state.shaders.get_mut(&shader) {
            entry.source = source.to_string();
        }
        state.calls.push(Call::ShaderSource(shader, source.to_string()));
    }

    fn compile_shader(&self, shader: u32) {
        let mut state = self.state.borrow_mut();
        if let Some(entry) = state.shaders.get_mut(&shader) {
            entry.compiled = Self::compiles(&entry.source);
        }
        state.calls.push(Call::CompileShader(shader));
    }

    fn shader_compile_status(&self, shader: u32) -> bool {
        self.state
            .borrow()
            .shaders
            .get(&shader)
            .is_some_and(|entry| entry.compiled)
    }

    fn shader_info_log(&self, shader: u32) -> String {
        if self.silent_logs || self.shader_compile_status(shader) {
            return String::new();
        }
        "0:1: error: syntax error, unexpected token".to_string()
    }

    fn delete_shader(&self, shader: u32) {
        let mut state = self.state.borrow_mut();
        if state.shaders.remove(&shader).is_none() {
            state.double_deletes += 1;
        }
        state.calls.push(Call::DeleteShader(shader));
    }

    fn create_program(&self) -> Result<u32, String> {
        if self.fail_program_creation {
            return Err("out of program objects".to_string());
        }
        let mut state = self.state.borrow_mut();
        let id = state.allocate();
        state.programs.insert(id, FakeProgram::default());
        state.calls.push(Call::CreateProgram(id));
        Ok(id)
    }

    fn attach_shader(&self, program: u32, shader: u32) {
        let mut state = self.state.borrow_mut();
        if let Some(entry) = state.programs.get_mut(&program) {
            entry.attached.push(shader);
        }
        state.calls.push(Call::AttachShader(program, shader));
    }

    fn link_program(&self, program: u32) {
        let mut state = self.state.borrow_mut();
        let linked = !self.fail_link
            && state.programs.get(&program).is_some_and(|entry| {
                entry.attached.len() == 2
                    && entry
                        .attached
                        .iter()
                        .all(|id| state.shaders.get(id).is_some_and(|s| s.compiled))
            });
        if let Some(entry) = state.programs.get_mut(&program) {
            entry.linked = linked;
        }
        state.calls.push(Call::LinkProgram(program));
    }

    fn program_link_status(&self, program: u32) -> bool {
        self.state
            .borrow()
            .programs
            .get(&program)
            .is_some_and(|entry| entry.linked)
    }

    fn program_info_log(&self, program: u32) -> String {
        if self.silent_logs || self.program_link_status(program) {
            return String::new();
        }
        "error: vertex output does not match fragment input".to_string()
    }

    fn use_program(&self, program: Option<u32>) {
        self.record(Call::UseProgram(program));
    }

    fn delete_program(&self, program: u32) {
        let mut state = self.state.borrow_mut();
        if state.programs.remove(&program).is_none() {
            state.double_deletes += 1;
        }
        state.calls.push(Call::DeleteProgram(program));
    }

    fn create_buffer(&self) -> Result<u32, String> {
        if self.fail_buffer {
            return Err("out of buffer objects".to_string());
        }
        let mut state = self.state.borrow_mut();
        let id = state.allocate();
        state.buffers.insert(id);
        state.calls.push(Call::CreateBuffer(id));
        Ok(id)
    }

    fn bind_array_buffer(&self, buffer: Option<u32>) {
        let mut state = self.state.borrow_mut();
        state.array_buffer = buffer;
        state.calls.push(Call::BindArrayBuffer(buffer));
    }

    fn array_buffer_data(&self, data: &[u8]) {
        let mut state = self.state.borrow_mut();
        let target = state.array_buffer;
        state.calls.push(Call::BufferData {
            target,
            data: data.to_vec(),
        });
    }

    fn delete_buffer(&self, buffer: u32) {
        let mut state = self.state.borrow_mut();
        if !state.buffers.remove(&buffer) {
            state.double_deletes += 1;
        }
        // Deleting the bound buffer reverts the binding to zero.
        if state.array_buffer == Some(buffer) {
            state.array_buffer = None;
        }
        state.calls.push(Call::DeleteBuffer(buffer));
    }

    fn create_vertex_array(&self) -> Result<u32, String> {
        if self.fail_vertex_array {
            return Err("out of vertex array objects".to_string());
        }
        let mut state = self.state.borrow_mut();
        let id = state.allocate();
        state.vertex_arrays.insert(id);
        state.calls.push(Call::CreateVertexArray(id));
        Ok(id)
    }

    fn bind_vertex_array(&self, vertex_array: Option<u32>) {
        self.record(Call::BindVertexArray(vertex_array));
    }

    fn delete_vertex_array(&self, vertex_array: u32) {
        let mut state = self.state.borrow_mut();
        if !state.vertex_arrays.remove(&vertex_array) {
            state.double_deletes += 1;
        }
        state.calls.push(Call::DeleteVertexArray(vertex_array));
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        self.record(Call::EnableVertexAttribArray(index));
    }

    fn vertex_attrib_pointer_f32(&self, index: u32, size: i32, stride: i32, offset: i32) {
        self.record(Call::VertexAttribPointer {
            index,
            size,
            stride,
            offset,
        });
    }

    fn clear_color(&self, color: [f32; 4]) {
        self.record(Call::ClearColor(color));
    }

    fn clear_color_and_depth(&self) {
        self.record(Call::Clear);
    }

    fn draw_triangles(&self, first: i32, count: i32) {
        self.record(Call::DrawTriangles { first, count });
    }
}
