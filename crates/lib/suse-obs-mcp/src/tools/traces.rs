use rmcp::{
    ErrorData,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content},
    schemars,
    tool,
    tool_router,
};
use serde::{Deserialize, Serialize};
use suse_obs_core::backend::Backend;

use crate::{ObservabilityMcp, helpers};

/// Parameters for listing traces of a service component.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ListTracesParams {
    /// ID of the OpenTelemetry service component.
    pub component_id: i64,
}

#[tool_router(router = tool_router_traces, vis = "pub")]
impl<B: Backend> ObservabilityMcp<B> {
    #[tool(
        name = "listTraces",
        description = "List the last hour of traces for an OpenTelemetry service component, as JSON."
    )]
    async fn list_traces(
        &self,
        Parameters(params): Parameters<ListTracesParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let traces = self
            .control()
            .list_traces(params.component_id)
            .await
            .map_err(helpers::map_err)?;
        Ok(CallToolResult::success(vec![Content::json(traces)?]))
    }
}
