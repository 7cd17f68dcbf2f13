pub mod config;
pub mod render;
pub mod utils;

// Re-export commonly used types
pub use config::core::AppConfig;
pub use config::rendering::RenderConfig;
pub use config::window::WindowConfig;
pub use render::backend::GlBackend;
pub use render::shaders::{ProgramHandle, ShaderProfile, ShaderStage};
pub use render::triangle::{TriangleState, Vertex};
pub use render::widget::{GlSurface, GlWidget, Host};
pub use utils::error::{BuildError, ConfigError, SetupError};
