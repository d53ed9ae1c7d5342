//! MCP (Model Context Protocol) server for trackbridge.
//!
//! This crate implements the stdio server that exposes registered tools
//! to editor and agent clients.

pub mod protocol;
pub mod registry;
pub mod server;
pub mod tools;
pub mod transport;

pub use registry::ToolRegistry;
pub use server::McpServer;
pub use transport::{Framing, StdioTransport};
