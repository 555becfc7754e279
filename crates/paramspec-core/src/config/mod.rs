//! Configuration system for paramspec.
//! TOML-based, layered resolution: overrides > env > project > user > defaults.

pub mod logging_config;
pub mod paramspec_config;
pub mod validation_config;

pub use logging_config::LoggingConfig;
pub use paramspec_config::{ConfigOverrides, ParamSpecConfig};
pub use validation_config::ValidationConfig;
