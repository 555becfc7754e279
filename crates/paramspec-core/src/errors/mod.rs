//! Error handling for paramspec.
//! One error enum per subsystem, `thiserror` only, zero `anyhow`.

pub mod builder_error;
pub mod compile_error;
pub mod config_error;
pub mod dimension_error;
pub mod error_code;
pub mod load_error;
pub mod type_resolution_error;
pub mod validation_error;

pub use builder_error::BuilderError;
pub use compile_error::{CompilationCause, CompileError, ParameterCompilationError};
pub use config_error::ConfigError;
pub use dimension_error::DimensionDefinitionError;
pub use error_code::ParamSpecErrorCode;
pub use load_error::LoadError;
pub use type_resolution_error::TypeResolutionError;
pub use validation_error::{ValidationError, ValidationStage, Violation, ViolationKind};
