use chrono::Utc;
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
use suse_obs_core::params::{non_blank, relative_time};
use suse_obs_model::schema::{DEFAULT_METRIC_STEP, DEFAULT_METRIC_TIMEOUT};
use suse_obs_model::{RangeQuery, TimeRange};

use crate::{ObservabilityMcp, helpers};

/// Parameters for searching metric names.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ListMetricsParams {
    /// Regex matched against metric names (e.g. 'cpu', 'redis.*').
    pub search_pattern: String,
}

/// Parameters for a `PromQL` range query.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct GetMetricsParams {
    /// `PromQL` query to execute.
    pub query: String,
    /// Start time: 'now' or a duration ago (e.g. '1h').
    pub start: String,
    /// End time: 'now' or a duration ago (e.g. '1h').
    pub end: String,
    /// Resolution step (e.g. '15s', '1m', '5m'). Default '1m'.
    pub step: Option<String>,
}

#[tool_router(router = tool_router_metrics, vis = "pub")]
impl<B: Backend> ObservabilityMcp<B> {
    #[tool(
        name = "listMetrics",
        description = "Search metrics by regex pattern and show their label keys. Returns a Markdown table of metric names and label keys."
    )]
    async fn list_metrics(
        &self,
        Parameters(params): Parameters<ListMetricsParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let listing = self
            .control()
            .list_metrics(&params.search_pattern)
            .await
            .map_err(helpers::map_err)?;
        Ok(helpers::text(listing.render()))
    }

    #[tool(
        name = "getMetrics",
        description = "Query metrics over a time range with PromQL. Returns a Markdown table of timestamps, values and labels."
    )]
    async fn get_metrics(
        &self,
        Parameters(params): Parameters<GetMetricsParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let now = Utc::now();
        let start = relative_time("start", &params.start, now)
            .map_err(|err| helpers::map_param_err(&err))?;
        let end = relative_time("end", &params.end, now)
            .map_err(|err| helpers::map_param_err(&err))?;
        let step = non_blank(params.step.as_deref()).unwrap_or(DEFAULT_METRIC_STEP);

        let table = self
            .control()
            .get_metrics(RangeQuery {
                query: params.query,
                range: TimeRange::new(start, end),
                step: step.to_string(),
                timeout: DEFAULT_METRIC_TIMEOUT.to_string(),
            })
            .await
            .map_err(helpers::map_err)?;
        Ok(helpers::text(table.render()))
    }
}

#[cfg(test)]
mod tests {
    use rmcp::model::ErrorCode;

    use super::*;
    use crate::tools::fake::EmptyBackend;

    #[tokio::test]
    async fn unparsable_pattern_is_invalid_params() {
        let service = ObservabilityMcp::new(EmptyBackend);
        let params = ListMetricsParams {
            search_pattern: "[cpu".to_string(),
        };

        let err = service.list_metrics(Parameters(params)).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
        assert!(err.message.starts_with("invalid search pattern '[cpu'"));
    }

    #[tokio::test]
    async fn bad_time_is_rejected_before_querying() {
        let service = ObservabilityMcp::new(EmptyBackend);
        let params = GetMetricsParams {
            query: "up".to_string(),
            start: "yesterday".to_string(),
            end: "now".to_string(),
            step: None,
        };

        let err = service.get_metrics(Parameters(params)).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
        assert!(err.message.starts_with("invalid start time format: yesterday"));
    }

    #[tokio::test]
    async fn empty_range_result_is_successful() {
        let service = ObservabilityMcp::new(EmptyBackend);
        let params = GetMetricsParams {
            query: "up".to_string(),
            start: "1h".to_string(),
            end: "now".to_string(),
            step: Some("5m".to_string()),
        };

        assert!(service.get_metrics(Parameters(params)).await.is_ok());
    }
}
