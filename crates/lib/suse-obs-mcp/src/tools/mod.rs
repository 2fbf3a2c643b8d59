//! MCP tool modules.
//!
//! Tools are grouped by backend area: topology search, monitor health,
//! metric discovery and range queries, and trace lookup.

pub mod metrics;
pub mod monitors;
pub mod topology;
pub mod traces;

#[cfg(test)]
pub(crate) mod fake;
