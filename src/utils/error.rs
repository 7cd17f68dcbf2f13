use crate::render::shaders::ShaderStage;
use thiserror::Error;

/// Failure while compiling or linking a GLSL program.
///
/// Every variant is returned only after the builder has released the GPU
/// objects it created, so the caller never sees a partially built program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("Error creating {stage} shader: {message}")]
    ShaderCreation { stage: ShaderStage, message: String },

    #[error("Error compiling {stage} shader: {message}")]
    Compile { stage: ShaderStage, message: String },

    #[error("Error creating program.")]
    ProgramCreation { message: String },

    #[error("Error Linking GLSL program: {message}")]
    Link { message: String },
}

impl BuildError {
    /// Stage that failed, if the failure belongs to a single shader.
    pub fn stage(&self) -> Option<ShaderStage> {
        match self {
            BuildError::ShaderCreation { stage, .. } | BuildError::Compile { stage, .. } => {
                Some(*stage)
            }
            BuildError::ProgramCreation { .. } | BuildError::Link { .. } => None,
        }
    }

    /// Driver diagnostic text carried by the error.
    pub fn message(&self) -> &str {
        match self {
            BuildError::ShaderCreation { message, .. }
            | BuildError::Compile { message, .. }
            | BuildError::ProgramCreation { message }
            | BuildError::Link { message } => message,
        }
    }
}

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Failed to build program: {0}")]
    Program(#[from] BuildError),

    #[error("Failed to allocate {resource}: {message}")]
    Allocation {
        resource: &'static str,
        message: String,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}
