//! MCP server implementation for suse-obs-mcp.
//!
//! This crate wires the query engine into rmcp tool handlers and exposes the
//! MCP-facing tool surface for topology, monitors, metrics and traces.

mod helpers;
mod tools;
pub mod server;

use std::sync::Arc;

use rmcp::{
    ErrorData,
    ServerHandler,
    handler::server::tool::ToolRouter,
    tool,
    tool_handler,
    tool_router,
};
use rmcp::model::{CallToolResult, Content, ServerCapabilities, ServerInfo};
use suse_obs_core::backend::Backend;
use suse_obs_core::control::ObservabilityControl;

pub use tools::metrics::{GetMetricsParams, ListMetricsParams};
pub use tools::monitors::GetMonitorsParams;
pub use tools::topology::{GetComponentsParams, NeighborLevelsParam, QueryTopologyParams};
pub use tools::traces::ListTracesParams;

const SERVER_INSTRUCTIONS: &str = r"suse-obs-mcp exposes SUSE Observability topology, health, metrics and traces as compact Markdown.

Workflow:
1. Find components with `getComponents`, using simple filters (`name_pattern`, `type`, `layer`,
   `domain`, `healthstate`) or a raw STQL `query`. Set `with_neighbors` to also pull in connected
   components (`with_neighbors_levels` 1-14 or 'all', `with_neighbors_direction` up/down/both).
2. Check health with `getMonitors` (state CRITICAL, DEVIATING or UNKNOWN).
3. Discover metrics with `listMetrics` (regex `search_pattern`), then query them with `getMetrics`
   using PromQL, `start`/`end` as 'now' or a duration ago such as '1h', and an optional `step`.
4. For OpenTelemetry services, `listTraces` returns the last hour of spans for a component id.

Notes:
- Results are truncated: at most 5 affected components per monitor, label keys for the first 50
  matching metrics, and 2 identifiers per component.
- `queryTopology` returns the raw snapshot as JSON for cases the table view does not cover.
- `health` returns `ok`.";

/// MCP server wrapper around the query engine and tool routers.
pub struct ObservabilityMcp<B: Backend> {
    tool_router: ToolRouter<Self>,
    control: ObservabilityControl<B>,
}

impl<B: Backend> Clone for ObservabilityMcp<B> {
    fn clone(&self) -> Self {
        Self {
            tool_router: self.tool_router.clone(),
            control: self.control.clone(),
        }
    }
}

impl<B: Backend> ObservabilityMcp<B> {
    /// Creates a new server owning the backend.
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self::with_backend(Arc::new(backend))
    }

    /// Creates a new server using a shared backend handle.
    #[must_use]
    pub fn with_backend(backend: Arc<B>) -> Self {
        let tool_router = Self::tool_router_core()
            + Self::tool_router_topology()
            + Self::tool_router_monitors()
            + Self::tool_router_metrics()
            + Self::tool_router_traces();
        Self {
            tool_router,
            control: ObservabilityControl::from_arc(backend),
        }
    }

    pub(crate) const fn control(&self) -> &ObservabilityControl<B> {
        &self.control
    }
}

#[tool_router(router = tool_router_core, vis = "pub")]
impl<B: Backend> ObservabilityMcp<B> {
    #[tool(description = "Health check. Returns 'ok'.")]
    async fn health(&self) -> Result<CallToolResult, ErrorData> {
        Ok(CallToolResult::success(vec![Content::text("ok")]))
    }
}

#[tool_handler]
impl<B: Backend> ServerHandler for ObservabilityMcp<B> {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(SERVER_INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}
