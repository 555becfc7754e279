//! # paramspec-schema
//!
//! Per-parameter schema compilation and context-aware validation of
//! labeled parameter revisions.
//!
//! ```text
//! schema definition + baseline spec
//!     -> type resolver + dimension registry
//!     -> per-parameter fragments
//!     -> baseline schema / revision schema
//!     -> cleaned baseline -> (context) -> cleaned revision
//! ```

pub mod aggregate;
pub mod builder;
pub mod cleaned;
pub mod compiler;
pub mod context;
pub mod definition;
pub mod dimensions;
pub mod engine;
pub mod loader;
pub mod resolver;
pub mod rules;
pub mod types;

mod violations;

pub use builder::SchemaBuilder;
pub use cleaned::{CleanedBaseline, CleanedParam, CleanedRevision, ParamMeta};
pub use compiler::{CompileOptions, FragmentRegistry, ParameterSchemaFragment};
pub use definition::SchemaDefinition;
pub use dimensions::{DimensionRegistry, DimensionValidator};
pub use engine::{compile, compile_definition, CompiledSchemas};
pub use loader::{read_json, ParamsInput};
pub use resolver::{resolve_type, ResolvedType, Shape};
pub use types::{Entry, FieldType, LabelAssignment, ParamValue, Scalar, TypeAliases};
