pub mod error;

pub use error::{BuildError, ConfigError, SetupError};
