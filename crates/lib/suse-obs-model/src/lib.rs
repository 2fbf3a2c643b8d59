//! Wire models and schema constants for suse-obs-mcp.
//!
//! This crate defines the records exchanged with the observability backend
//! and the normalized shapes shared by the query engine and the MCP tools.

pub mod models;
pub mod schema;

pub use models::*;
