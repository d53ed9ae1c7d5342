//! Core traits, types, and error handling for trackbridge.
//!
//! This crate provides the foundational abstractions shared by the server and
//! by every tool implementation: the [`Tool`] contract, [`ToolResult`], the
//! error type and the configuration file.

pub mod config;
pub mod error;
pub mod tool;

pub use config::Config;
pub use error::{Error, Result};
pub use tool::{ParamKind, ParamSpec, Tool, ToolResult};
