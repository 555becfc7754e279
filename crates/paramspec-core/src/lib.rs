//! # paramspec-core
//!
//! Shared plumbing for the paramspec workspace: one error enum per
//! subsystem, the layered TOML configuration, and tracing setup.

pub mod config;
pub mod errors;
pub mod tracing;
