use chrono::Duration;
use serde_json::Value;
use suse_obs_model::schema::{
    OTEL_SERVICE_QUERY,
    TAG_SERVICE_NAME,
    TAG_SERVICE_NAMESPACE,
    TRACE_PAGE_SIZE,
};
use suse_obs_model::{TimeRange, TraceQuery};

use super::{ControlError, ObservabilityControl};
use crate::backend::{TopologySource, TraceSource};
use crate::normalize::simplify;
use crate::params::ParamError;

impl<B: TopologySource + TraceSource> ObservabilityControl<B> {
    /// Returns the last hour of spans for an OpenTelemetry service component.
    ///
    /// # Errors
    /// Returns `ControlError::Param` when the component is unknown or lacks
    /// service tags, and `ControlError::Backend` for failed backend calls.
    pub async fn list_traces(&self, component_id: i64) -> Result<Value, ControlError> {
        let services = self
            .backend
            .topology_query(OTEL_SERVICE_QUERY, None)
            .await
            .map_err(ControlError::backend("list OpenTelemetry services"))?;
        let service = services
            .iter()
            .find(|raw| raw.id == component_id)
            .map(simplify)
            .ok_or(ParamError::ComponentNotFound(component_id))?;

        let (Some(name), Some(namespace)) = (
            service.tag_value(TAG_SERVICE_NAME).filter(|value| !value.is_empty()),
            service.tag_value(TAG_SERVICE_NAMESPACE).filter(|value| !value.is_empty()),
        ) else {
            return Err(ParamError::MissingServiceTags(component_id).into());
        };

        let query = TraceQuery {
            range: TimeRange::last(Duration::hours(1)),
            page: 0,
            page_size: TRACE_PAGE_SIZE,
            service_name: name.to_string(),
            service_namespace: namespace.to_string(),
        };
        self.backend
            .query_traces(&query)
            .await
            .map_err(ControlError::backend(format!(
                "query traces for service {name} in namespace {namespace}"
            )))
    }
}
