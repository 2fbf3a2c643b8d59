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
use suse_obs_core::params::query_time;
use suse_obs_core::query::{FieldFilters, FilterSpec, NeighborSpec};

use crate::{ObservabilityMcp, helpers};

/// Neighbor depth given either as a number or as text such as `"all"`.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(untagged)]
pub enum NeighborLevelsParam {
    Count(u64),
    Text(String),
}

impl NeighborLevelsParam {
    fn as_text(&self) -> String {
        match self {
            Self::Count(count) => count.to_string(),
            Self::Text(text) => text.clone(),
        }
    }
}

/// Parameters for searching topology components.
#[derive(Debug, Clone, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct GetComponentsParams {
    /// Raw STQL query; overrides every other filter when set.
    pub query: Option<String>,
    /// Component name, wildcards allowed (e.g. 'checkout*').
    pub name_pattern: Option<String>,
    /// Component type (e.g. 'pod', 'service').
    #[serde(rename = "type")]
    pub component_type: Option<String>,
    /// Layer (e.g. 'Containers', 'Services').
    pub layer: Option<String>,
    /// Domain (e.g. 'cluster.example.com').
    pub domain: Option<String>,
    /// Health state (e.g. 'CRITICAL', 'DEVIATING', 'CLEAR').
    pub healthstate: Option<String>,
    /// Also return components connected to the matches.
    pub with_neighbors: Option<bool>,
    /// Neighbor depth, 1-14 or 'all' (default 1).
    pub with_neighbors_levels: Option<NeighborLevelsParam>,
    /// 'up', 'down' or 'both' (default both).
    pub with_neighbors_direction: Option<String>,
}

/// Parameters for a raw topology query.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct QueryTopologyParams {
    /// STQL query to execute.
    pub query: String,
    /// Optional point in time, RFC 3339 or epoch milliseconds.
    pub time: Option<String>,
}

#[tool_router(router = tool_router_topology, vis = "pub")]
impl<B: Backend> ObservabilityMcp<B> {
    #[tool(
        name = "getComponents",
        description = "Search topology components with STQL filters. Either 'query' or at least one simple filter is required. Returns a Markdown table of matching components with their IDs and identifiers."
    )]
    async fn get_components(
        &self,
        Parameters(params): Parameters<GetComponentsParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let filter = FilterSpec::new(
            params.query,
            FieldFilters {
                name: params.name_pattern,
                component_type: params.component_type,
                layer: params.layer,
                domain: params.domain,
                health_state: params.healthstate,
            },
        );
        let neighbors = if params.with_neighbors.unwrap_or(false) {
            let levels = params.with_neighbors_levels.as_ref().map(NeighborLevelsParam::as_text);
            let spec = NeighborSpec::parse(
                levels.as_deref(),
                params.with_neighbors_direction.as_deref(),
            )
            .map_err(|err| helpers::map_param_err(&err))?;
            Some(spec)
        } else {
            None
        };

        let listing = self
            .control()
            .get_components(&filter, neighbors.as_ref())
            .await
            .map_err(helpers::map_err)?;
        Ok(helpers::text(listing.render()))
    }

    #[tool(
        name = "queryTopology",
        description = "Run a raw STQL query and return the matching components as JSON, optionally at a point in time."
    )]
    async fn query_topology(
        &self,
        Parameters(params): Parameters<QueryTopologyParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let at = params
            .time
            .as_deref()
            .filter(|time| !time.trim().is_empty())
            .map(query_time)
            .transpose()
            .map_err(|err| helpers::map_param_err(&err))?;
        let components = self
            .control()
            .query_topology(&params.query, at)
            .await
            .map_err(helpers::map_err)?;
        Ok(CallToolResult::success(vec![Content::json(components)?]))
    }
}
