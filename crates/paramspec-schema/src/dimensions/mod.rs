//! Dimension validators: one per declared dimension, built once from the
//! schema definition and immutable afterwards.

pub mod registry;
pub mod validator;

pub use registry::DimensionRegistry;
pub use validator::DimensionValidator;
