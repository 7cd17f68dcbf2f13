// shaders.rs - GLSL source assembly and program building

use crate::render::backend::GlBackend;
use crate::utils::error::BuildError;
use log::{debug, warn};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// GLSL dialect required by the current context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderProfile {
    Desktop,
    Embedded,
}

impl ShaderProfile {
    pub fn of<G: GlBackend>(gl: &G) -> Self {
        if gl.is_embedded() {
            ShaderProfile::Embedded
        } else {
            ShaderProfile::Desktop
        }
    }

    pub fn version_directive(self) -> &'static str {
        match self {
            ShaderProfile::Desktop => "#version 330\n",
            ShaderProfile::Embedded => "#version 300 es\n",
        }
    }
}

/// Default GLES precisions. A shader can still override them per variable.
pub const EMBEDDED_FRAGMENT_PRECISION: &str = "precision mediump float;\nprecision mediump int;\n";

/// Default vertex shader body
pub mod default_shaders {
    /// Position in location 0, color in location 1, no lighting.
    pub const VERTEX_BODY: &str = "layout(location = 0) in vec3 position;\n\
layout(location = 1) in vec4 vertexColor;\n\
out vec4 fragmentColor;\n\
void main()\n\
{\n\
   gl_Position = vec4(position,1);\n\
   fragmentColor = vertexColor;\n\
}\n";

    /// Passes through the color produced by `VERTEX_BODY`.
    pub const FRAGMENT_BODY: &str = "in vec4 fragmentColor;\n\
layout(location = 0) out vec4 color;\n\
void main()\n\
{\n\
    color = fragmentColor;\n\
}\n";
}

/// Prepends the version header for `profile` to a vertex shader body.
///
/// The body should be GLES 3.0 compatible. An empty body selects
/// [`default_shaders::VERTEX_BODY`].
pub fn make_vertex_shader(profile: ShaderProfile, body: &str) -> String {
    let body = if body.is_empty() {
        default_shaders::VERTEX_BODY
    } else {
        body
    };

    let mut source = String::with_capacity(32 + body.len());
    source.push_str(profile.version_directive());
    source.push_str(body);
    source
}

/// Prepends the version header for `profile` to a fragment shader body.
///
/// On GLES the header also declares `mediump` default precisions for float
/// and int. An empty body selects [`default_shaders::FRAGMENT_BODY`].
pub fn make_fragment_shader(profile: ShaderProfile, body: &str) -> String {
    let body = if body.is_empty() {
        default_shaders::FRAGMENT_BODY
    } else {
        body
    };

    let mut source = String::with_capacity(96 + body.len());
    source.push_str(profile.version_directive());
    if profile == ShaderProfile::Embedded {
        source.push_str(EMBEDDED_FRAGMENT_PRECISION);
    }
    source.push_str(body);
    source
}

/// `Err` carries the info log, which may be empty.
pub fn check_shader<G: GlBackend>(gl: &G, shader: G::Shader) -> Result<(), String> {
    if gl.shader_compile_status(shader) {
        Ok(())
    } else {
        Err(gl.shader_info_log(shader))
    }
}

pub fn check_program<G: GlBackend>(gl: &G, program: G::Program) -> Result<(), String> {
    if gl.program_link_status(program) {
        Ok(())
    } else {
        Err(gl.program_info_log(program))
    }
}

/// A linked GLSL program and the shader objects of its current build.
///
/// All handles are `None` until a build succeeds and again after any failed
/// build. The shader objects are released as soon as the program links.
pub struct ProgramHandle<G: GlBackend> {
    vertex_shader: Option<G::Shader>,
    fragment_shader: Option<G::Shader>,
    program: Option<G::Program>,
}

impl<G: GlBackend> Default for ProgramHandle<G> {
    fn default() -> Self {
        Self {
            vertex_shader: None,
            fragment_shader: None,
            program: None,
        }
    }
}

impl<G: GlBackend> ProgramHandle<G> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn program(&self) -> Option<G::Program> {
        self.program
    }

    pub fn vertex_shader(&self) -> Option<G::Shader> {
        self.vertex_shader
    }

    pub fn fragment_shader(&self) -> Option<G::Shader> {
        self.fragment_shader
    }

    pub fn is_built(&self) -> bool {
        self.program.is_some()
    }

    /// Compiles both sources and links them, replacing any previous program.
    ///
    /// Sources should come from [`make_vertex_shader`] and
    /// [`make_fragment_shader`].
    pub fn build(&mut self, gl: &G, vertex_source: &str, fragment_source: &str) -> Result<(), BuildError> {
        self.release(gl);

        let result = self.compile_and_link(gl, vertex_source, fragment_source);
        match &result {
            Ok(()) => {
                // Attached shaders stay alive in the driver until the program goes.
                if let Some(shader) = self.vertex_shader.take() {
                    gl.delete_shader(shader);
                }
                if let Some(shader) = self.fragment_shader.take() {
                    gl.delete_shader(shader);
                }
                debug!("Linked GLSL program {:?}", self.program);
            }
            Err(err) => {
                self.release(gl);
                debug!("Program build failed: {}", err);
            }
        }
        result
    }

    fn compile_and_link(&mut self, gl: &G, vertex_source: &str, fragment_source: &str) -> Result<(), BuildError> {
        let vertex = Self::compile_stage(gl, ShaderStage::Vertex, vertex_source, &mut self.vertex_shader)?;
        let fragment = Self::compile_stage(gl, ShaderStage::Fragment, fragment_source, &mut self.fragment_shader)?;

        let program = gl
            .create_program()
            .map_err(|message| BuildError::ProgramCreation { message })?;
        self.program = Some(program);

        gl.attach_shader(program, vertex);
        gl.attach_shader(program, fragment);
        gl.link_program(program);
        check_program(gl, program).map_err(|message| BuildError::Link { message })
    }

    fn compile_stage(
        gl: &G,
        stage: ShaderStage,
        source: &str,
        slot: &mut Option<G::Shader>,
    ) -> Result<G::Shader, BuildError> {
        let shader = gl
            .create_shader(stage)
            .map_err(|message| BuildError::ShaderCreation { stage, message })?;
        *slot = Some(shader);

        gl.shader_source(shader, source);
        gl.compile_shader(shader);
        check_shader(gl, shader).map_err(|message| BuildError::Compile { stage, message })?;
        Ok(shader)
    }

    /// Deletes every object held, unbinding the program first if one is live.
    /// Safe to call repeatedly.
    pub fn release(&mut self, gl: &G) {
        if let Some(shader) = self.vertex_shader.take() {
            gl.delete_shader(shader);
        }
        if let Some(shader) = self.fragment_shader.take() {
            gl.delete_shader(shader);
        }
        if let Some(program) = self.program.take() {
            gl.use_program(None);
            gl.delete_program(program);
        }
    }
}

impl<G: GlBackend> Drop for ProgramHandle<G> {
    fn drop(&mut self) {
        if self.program.is_some() || self.vertex_shader.is_some() || self.fragment_shader.is_some() {
            warn!("ProgramHandle dropped without release; GPU objects leak until the context is destroyed");
        }
    }
}
