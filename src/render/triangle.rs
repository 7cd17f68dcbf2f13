use crate::render::backend::GlBackend;
use crate::utils::error::SetupError;
use bytemuck::{Pod, Zeroable};
use log::debug;
use std::mem::{offset_of, size_of};

pub const POSITION_LOCATION: u32 = 0;
pub const COLOR_LOCATION: u32 = 1;

pub const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
pub const RED: [f32; 4] = [1.0, 0.0, 0.0, 1.0];

/// Corners of the triangle in clip space.
pub const TRIANGLE_POSITIONS: [[f32; 3]; 3] = [[-1.0, -1.0, 0.0], [1.0, -1.0, 0.0], [0.0, 1.0, 0.0]];

/// Layout matches attribute 0 (position) and 1 (color) of the default shaders.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub col: [f32; 4],
}

impl Vertex {
    pub const STRIDE: i32 = size_of::<Vertex>() as i32;
    pub const POSITION_OFFSET: i32 = offset_of!(Vertex, pos) as i32;
    pub const COLOR_OFFSET: i32 = offset_of!(Vertex, col) as i32;
}

/// The three vertices drawn each frame, all sharing one color.
pub fn triangle_vertices(red: bool) -> [Vertex; 3] {
    let col = if red { RED } else { WHITE };
    TRIANGLE_POSITIONS.map(|pos| Vertex { pos, col })
}

/// Vertex buffer and vertex array used to stage the triangle.
pub struct TriangleState<G: GlBackend> {
    buffer: Option<G::Buffer>,
    vertex_array: Option<G::VertexArray>,
}

impl<G: GlBackend> Default for TriangleState<G> {
    fn default() -> Self {
        Self {
            buffer: None,
            vertex_array: None,
        }
    }
}

impl<G: GlBackend> TriangleState<G> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer(&self) -> Option<G::Buffer> {
        self.buffer
    }

    pub fn vertex_array(&self) -> Option<G::VertexArray> {
        self.vertex_array
    }

    pub fn is_allocated(&self) -> bool {
        self.buffer.is_some() && self.vertex_array.is_some()
    }

    /// Allocates the buffer and vertex array and records the attribute
    /// bindings in the vertex array. Nothing stays allocated on error.
    pub fn setup(&mut self, gl: &G) -> Result<(), SetupError> {
        self.teardown(gl);

        let buffer = gl.create_buffer().map_err(|message| SetupError::Allocation {
            resource: "vertex buffer",
            message,
        })?;
        let vertex_array = match gl.create_vertex_array() {
            Ok(vertex_array) => vertex_array,
            Err(message) => {
                gl.delete_buffer(buffer);
                return Err(SetupError::Allocation {
                    resource: "vertex array",
                    message,
                });
            }
        };
        self.buffer = Some(buffer);
        self.vertex_array = Some(vertex_array);

        // Some drivers (macOS core profile) reject attribute setup without a bound VAO.
        gl.bind_vertex_array(Some(vertex_array));
        gl.bind_array_buffer(Some(buffer));

        gl.enable_vertex_attrib_array(POSITION_LOCATION);
        gl.vertex_attrib_pointer_f32(POSITION_LOCATION, 3, Vertex::STRIDE, Vertex::POSITION_OFFSET);

        gl.enable_vertex_attrib_array(COLOR_LOCATION);
        gl.vertex_attrib_pointer_f32(COLOR_LOCATION, 4, Vertex::STRIDE, Vertex::COLOR_OFFSET);

        gl.bind_vertex_array(None);
        debug!("Allocated triangle buffer {:?} and vertex array {:?}", buffer, vertex_array);
        Ok(())
    }

    /// Idempotent; safe before `setup` too.
    pub fn teardown(&mut self, gl: &G) {
        gl.bind_vertex_array(None);
        if let Some(buffer) = self.buffer.take() {
            gl.delete_buffer(buffer);
        }
        if let Some(vertex_array) = self.vertex_array.take() {
            gl.delete_vertex_array(vertex_array);
        }
    }

    /// Uploads a fresh triangle and draws it with `program`.
    /// Does nothing without a program.
    pub fn draw(&self, gl: &G, program: Option<G::Program>, red: bool) {
        let Some(program) = program else {
            return;
        };

        let vertices = triangle_vertices(red);

        gl.use_program(Some(program));
        gl.bind_vertex_array(self.vertex_array);

        // ARRAY_BUFFER is context state, not vertex array state.
        gl.bind_array_buffer(self.buffer);
        gl.array_buffer_data(bytemuck::cast_slice(&vertices));
        gl.draw_triangles(0, vertices.len() as i32);
    }
}
