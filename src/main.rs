use anyhow::{anyhow, Context, Result};
use glutin::{
    config::{Config, ConfigTemplateBuilder},
    context::{ContextApi, ContextAttributesBuilder, GlProfile, PossiblyCurrentContext, Version},
    display::{GetGlDisplay, GlDisplay},
    prelude::*,
    surface::{Surface, SwapInterval, WindowSurface},
};
use glutin_winit::{DisplayBuilder, GlWindow};
use log::{error, info};
use raw_window_handle::HasRawWindowHandle;
use simple_logger::SimpleLogger;
use std::{collections::VecDeque, ffi::CString, num::NonZeroU32, sync::Arc};
use winit::{
    dpi::LogicalSize,
    event::{ElementState, Event, KeyEvent, WindowEvent},
    event_loop::{EventLoop, EventLoopBuilder},
    keyboard::{Key, NamedKey},
    window::{Window, WindowBuilder},
};

use glwidget::{
    config::{core::AppConfig, window::WindowConfig},
    render::widget::{GlSurface as _, GlWidget, Host},
};

/// Error dialogs waiting to be acknowledged. While one is showing, the rest
/// of the window ignores input.
#[derive(Debug, Default)]
struct ErrorQueue {
    pending: VecDeque<String>,
}

impl ErrorQueue {
    fn push(&mut self, message: String) {
        self.pending.push_back(message);
    }

    fn current(&self) -> Option<&str> {
        self.pending.front().map(String::as_str)
    }

    fn dismiss(&mut self) {
        self.pending.pop_front();
    }

    fn is_blocking(&self) -> bool {
        !self.pending.is_empty()
    }
}

/// The window side of the widget: redraw requests and the error dialog queue.
struct Shell<'a> {
    window: &'a Window,
    errors: &'a mut ErrorQueue,
}

impl Host for Shell<'_> {
    fn request_redraw(&mut self) {
        self.window.request_redraw();
    }

    fn report_error(&mut self, message: String) {
        error!("{}", message);
        self.errors.push(message);
        self.window.request_redraw();
    }
}

struct App {
    window: Window,
    gl_context: PossiblyCurrentContext,
    gl_surface: Surface<WindowSurface>,
    gl: Arc<glow::Context>,
    widget: GlWidget<glow::Context>,
    egui_ctx: egui::Context,
    egui_winit: egui_winit::State,
    painter: egui_glow::Painter,
    errors: ErrorQueue,
    closed: bool,
}

impl App {
    fn new(config: AppConfig) -> Result<(Self, EventLoop<()>)> {
        let event_loop = EventLoopBuilder::new().build()?;
        let window_builder = WindowBuilder::new()
            .with_title(config.window.title.as_str())
            .with_inner_size(LogicalSize::new(config.window.width, config.window.height));

        let template = ConfigTemplateBuilder::new()
            .with_alpha_size(8)
            .with_depth_size(24);

        let display_builder = DisplayBuilder::new().with_window_builder(Some(window_builder));
        let (window, gl_config) = display_builder
            .build(&event_loop, template, pick_config)
            .map_err(|e| anyhow!("Failed to create window: {e}"))?;
        let window = window.context("Display builder returned no window")?;
        let raw_window_handle = window.raw_window_handle();

        let gl_display = gl_config.display();
        let context_attributes = context_attributes(&config.window, raw_window_handle);
        let not_current = unsafe { gl_display.create_context(&gl_config, &context_attributes) }
            .context("Failed to create OpenGL context")?;

        let attrs = window.build_surface_attributes(<_>::default());
        let gl_surface = unsafe { gl_display.create_window_surface(&gl_config, &attrs) }
            .context("Failed to create GL surface")?;
        let gl_context = not_current
            .make_current(&gl_surface)
            .context("Failed to make context current")?;

        let interval = if config.window.vsync {
            SwapInterval::Wait(NonZeroU32::MIN)
        } else {
            SwapInterval::DontWait
        };
        if let Err(e) = gl_surface.set_swap_interval(&gl_context, interval) {
            log::warn!("Could not set swap interval: {}", e);
        }

        let gl = Arc::new(unsafe {
            glow::Context::from_loader_function(|symbol| match CString::new(symbol) {
                Ok(symbol) => gl_display.get_proc_address(&symbol),
                Err(_) => std::ptr::null(),
            })
        });

        let egui_ctx = egui::Context::default();
        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &event_loop,
            None,
            None,
        );
        let painter = egui_glow::Painter::new(gl.clone(), "", None)
            .map_err(|e| anyhow!("Failed to create egui painter: {e}"))?;

        let mut app = Self {
            window,
            gl_context,
            gl_surface,
            gl,
            widget: GlWidget::new(config.render),
            egui_ctx,
            egui_winit,
            painter,
            errors: ErrorQueue::default(),
            closed: false,
        };

        let mut shell = Shell {
            window: &app.window,
            errors: &mut app.errors,
        };
        app.widget.initialize(app.gl.as_ref(), &mut shell);

        Ok((app, event_loop))
    }

    /// Returns true when the application should exit.
    fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        let response = self.egui_winit.on_window_event(&self.window, event);
        if response.repaint {
            self.window.request_redraw();
        }
        if response.consumed {
            return false;
        }

        match event {
            WindowEvent::CloseRequested => true,
            WindowEvent::Resized(size) => {
                if let (Some(width), Some(height)) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height)) {
                    self.gl_surface.resize(&self.gl_context, width, height);
                    unsafe {
                        glow::HasContext::viewport(self.gl.as_ref(), 0, 0, size.width as i32, size.height as i32);
                    }
                    self.widget.resize(self.gl.as_ref(), size.width, size.height);
                }
                false
            }
            WindowEvent::KeyboardInput {
                event: KeyEvent {
                    logical_key,
                    state: ElementState::Pressed,
                    ..
                },
                ..
            } => match logical_key {
                Key::Named(NamedKey::Escape) => true,
                Key::Character(c) if c.as_str().eq_ignore_ascii_case("r") && !self.errors.is_blocking() => {
                    let red = !self.widget.is_red();
                    self.set_red(red);
                    false
                }
                _ => false,
            },
            WindowEvent::RedrawRequested => {
                self.redraw();
                false
            }
            _ => false,
        }
    }

    fn set_red(&mut self, red: bool) {
        let mut shell = Shell {
            window: &self.window,
            errors: &mut self.errors,
        };
        self.widget.set_red(red, &mut shell);
    }

    fn redraw(&mut self) {
        self.widget.paint(self.gl.as_ref());

        let mut red = self.widget.is_red();
        let errors = &mut self.errors;
        let blocked = errors.is_blocking();
        let raw_input = self.egui_winit.take_egui_input(&self.window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            egui::Area::new(egui::Id::new("controls"))
                .anchor(egui::Align2::LEFT_TOP, egui::vec2(8.0, 8.0))
                .show(ctx, |ui| {
                    ui.add_enabled_ui(!blocked, |ui| ui.checkbox(&mut red, "Red"));
                });

            if let Some(message) = errors.current().map(str::to_owned) {
                egui::Window::new("Error")
                    .collapsible(false)
                    .resizable(false)
                    .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
                    .show(ctx, |ui| {
                        ui.label(message);
                        if ui.button("OK").clicked() {
                            errors.dismiss();
                        }
                    });
            }
        });
        self.egui_winit
            .handle_platform_output(&self.window, full_output.platform_output);

        let clipped_primitives = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let size = self.window.inner_size();
        self.painter.paint_and_update_textures(
            [size.width, size.height],
            full_output.pixels_per_point,
            &clipped_primitives,
            &full_output.textures_delta,
        );

        if let Err(e) = self.gl_surface.swap_buffers(&self.gl_context) {
            error!("Failed to swap buffers: {}", e);
        }

        if red != self.widget.is_red() {
            self.set_red(red);
        }
    }

    fn cleanup(&mut self) {
        self.closed = true;
        if let Err(e) = self.gl_context.make_current(&self.gl_surface) {
            error!("Failed to make context current for teardown: {}", e);
        }
        self.widget.teardown(self.gl.as_ref());
        self.painter.destroy();
    }
}

/// The picker must yield a `Config`, so an empty list cannot be reported as an error here.
fn pick_config(configs: Box<dyn Iterator<Item = Config> + '_>) -> Config {
    configs
        .reduce(|accum, config| {
            if config.num_samples() > accum.num_samples() {
                config
            } else {
                accum
            }
        })
        .expect("display offered no GL configs")
}

fn context_attributes(
    window: &WindowConfig,
    raw_window_handle: raw_window_handle::RawWindowHandle,
) -> glutin::context::ContextAttributes {
    let builder = ContextAttributesBuilder::new();
    let builder = if window.gles {
        builder.with_context_api(ContextApi::Gles(Some(Version::new(3, 0))))
    } else {
        builder
            .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
            .with_profile(GlProfile::Core)
    };
    builder.build(Some(raw_window_handle))
}

fn main() -> Result<()> {
    let config = AppConfig::load_or_default()?;
    SimpleLogger::new().with_level(config.log_level_filter()).init()?;
    info!("Starting {}", config.window.title);

    let (mut app, event_loop) = App::new(config)?;

    event_loop.run(move |event, elwt| {
        if let Event::WindowEvent { event, .. } = event {
            if !app.closed && app.handle_window_event(&event) {
                app.cleanup();
                elwt.exit();
            }
        }
    })?;

    Ok(())
}
