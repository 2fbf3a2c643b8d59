use rmcp::{
    ErrorData,
    handler::server::wrapper::Parameters,
    model::CallToolResult,
    schemars,
    tool,
    tool_router,
};
use serde::{Deserialize, Serialize};
use suse_obs_core::backend::Backend;
use suse_obs_core::params::monitor_state;

use crate::{ObservabilityMcp, helpers};

/// Parameters for listing monitors by health state.
#[derive(Debug, Clone, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct GetMonitorsParams {
    /// 'CRITICAL', 'DEVIATING' or 'UNKNOWN' (default CRITICAL).
    pub state: Option<String>,
}

#[tool_router(router = tool_router_monitors, vis = "pub")]
impl<B: Backend> ObservabilityMcp<B> {
    #[tool(
        name = "getMonitors",
        description = "List active monitors in a health state with the affected components. Returns a Markdown table of monitors with component names and IDs or URNs."
    )]
    async fn get_monitors(
        &self,
        Parameters(params): Parameters<GetMonitorsParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let state = monitor_state(params.state.as_deref())
            .map_err(|err| helpers::map_param_err(&err))?;
        let report = self
            .control()
            .get_monitors(state)
            .await
            .map_err(helpers::map_err)?;
        Ok(helpers::text(report.render()))
    }
}
