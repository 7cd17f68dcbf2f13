pub mod backend;
#[cfg(test)]
pub(crate) mod fake;
pub mod shaders;
pub mod triangle;
pub mod widget;

pub use backend::GlBackend;
pub use shaders::{ProgramHandle, ShaderProfile, ShaderStage};
pub use triangle::{TriangleState, Vertex};
pub use widget::{GlSurface, GlWidget, Host};
