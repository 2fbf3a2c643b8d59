use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use suse_obs_core::backend::{
    BackendError,
    BackendResult,
    MetricSource,
    MonitorSource,
    Page,
    TopologySource,
    TraceSource,
};
use suse_obs_model::{
    CheckState,
    HealthState,
    MetricSeries,
    MonitorOverview,
    RangeQuery,
    RawEntity,
    TimeRange,
    TraceQuery,
};

/// Backend with an empty topology whose other calls all fail.
pub struct EmptyBackend;

fn unreachable_backend() -> BackendError {
    BackendError::Api("connection refused".to_string())
}

#[async_trait]
impl TopologySource for EmptyBackend {
    async fn topology_query(
        &self,
        _query: &str,
        _at: Option<DateTime<Utc>>,
    ) -> BackendResult<Vec<RawEntity>> {
        Ok(Vec::new())
    }
}

#[async_trait]
impl MonitorSource for EmptyBackend {
    async fn monitors_overview(&self) -> BackendResult<Vec<MonitorOverview>> {
        Err(unreachable_backend())
    }

    async fn monitor_check_states(
        &self,
        _monitor_id: i64,
        _state: HealthState,
        _page: Page,
    ) -> BackendResult<Vec<CheckState>> {
        Err(unreachable_backend())
    }
}

#[async_trait]
impl MetricSource for EmptyBackend {
    async fn metric_names(&self, _range: TimeRange) -> BackendResult<Vec<String>> {
        Err(unreachable_backend())
    }

    async fn metric_label_keys(
        &self,
        _metric: &str,
        _range: TimeRange,
    ) -> BackendResult<Vec<String>> {
        Err(unreachable_backend())
    }

    async fn query_range(&self, _query: &RangeQuery) -> BackendResult<Vec<MetricSeries>> {
        Ok(Vec::new())
    }
}

#[async_trait]
impl TraceSource for EmptyBackend {
    async fn query_traces(&self, _query: &TraceQuery) -> BackendResult<Value> {
        Err(unreachable_backend())
    }
}
