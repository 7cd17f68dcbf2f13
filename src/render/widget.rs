use crate::config::rendering::RenderConfig;
use crate::render::backend::GlBackend;
use crate::render::shaders::{make_fragment_shader, make_vertex_shader, ProgramHandle, ShaderProfile};
use crate::render::triangle::TriangleState;
use crate::utils::error::SetupError;
use log::{info, trace};

/// Services the embedding window provides to the widget.
pub trait Host {
    /// Schedule a repaint of the surface.
    fn request_redraw(&mut self);

    /// Show `message` to the user. The demo host uses a blocking dialog.
    fn report_error(&mut self, message: String);
}

/// Lifecycle callbacks invoked by the host with its context current.
pub trait GlSurface<G: GlBackend> {
    fn initialize(&mut self, gl: &G, host: &mut dyn Host);
    fn resize(&mut self, gl: &G, width: u32, height: u32);
    fn paint(&mut self, gl: &G);
    /// Called once before the context is destroyed.
    fn teardown(&mut self, gl: &G);
}

pub struct GlWidget<G: GlBackend> {
    config: RenderConfig,
    program: ProgramHandle<G>,
    triangle: TriangleState<G>,
    red: bool,
}

impl<G: GlBackend> GlWidget<G> {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            program: ProgramHandle::new(),
            triangle: TriangleState::new(),
            red: false,
        }
    }

    pub fn program(&self) -> &ProgramHandle<G> {
        &self.program
    }

    pub fn triangle(&self) -> &TriangleState<G> {
        &self.triangle
    }

    pub fn is_red(&self) -> bool {
        self.red
    }

    /// Selects the triangle color and asks the host to repaint.
    pub fn set_red(&mut self, red: bool, host: &mut dyn Host) {
        self.red = red;
        host.request_redraw();
    }

    /// Vertex source for the current context's profile.
    pub fn make_vertex_shader(&self, gl: &G, body: &str) -> String {
        make_vertex_shader(ShaderProfile::of(gl), body)
    }

    /// Fragment source for the current context's profile.
    pub fn make_fragment_shader(&self, gl: &G, body: &str) -> String {
        make_fragment_shader(ShaderProfile::of(gl), body)
    }

    /// Sets the clear color, builds the default program and allocates the
    /// triangle's buffer and vertex array. On error nothing is allocated
    /// and painting draws only the clear color.
    pub fn setup(&mut self, gl: &G) -> Result<(), SetupError> {
        gl.clear_color(self.config.clear_color);

        let vertex = self.make_vertex_shader(gl, "");
        let fragment = self.make_fragment_shader(gl, "");
        self.program.build(gl, &vertex, &fragment)?;

        if let Err(err) = self.triangle.setup(gl) {
            self.program.release(gl);
            return Err(err);
        }
        Ok(())
    }
}

impl<G: GlBackend> GlSurface<G> for GlWidget<G> {
    fn initialize(&mut self, gl: &G, host: &mut dyn Host) {
        match self.setup(gl) {
            Ok(()) => info!("Widget initialized ({:?} profile)", ShaderProfile::of(gl)),
            Err(err) => host.report_error(err.to_string()),
        }
    }

    fn resize(&mut self, _gl: &G, width: u32, height: u32) {
        // The host applies the viewport; the triangle stretches with the window.
        trace!("Resize to {}x{} ignored", width, height);
    }

    fn paint(&mut self, gl: &G) {
        gl.clear_color_and_depth();
        self.triangle.draw(gl, self.program.program(), self.red);
    }

    fn teardown(&mut self, gl: &G) {
        self.triangle.teardown(gl);
        self.program.release(gl);
    }
}
