use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use suse_obs_model::schema::TAG_SERVICE_NAME;
use suse_obs_model::schema::TAG_SERVICE_NAMESPACE;
use suse_obs_model::{
    CheckState,
    HealthState,
    MetricSeries,
    MonitorOverview,
    RangeQuery,
    RawEntity,
    Sample,
    TimeRange,
    TraceQuery,
};
use tracing::debug;

use super::{
    BackendError,
    BackendResult,
    MetricSource,
    MonitorSource,
    Page,
    TopologySource,
    TraceSource,
};

pub use reqwest::Url;

const SNAPSHOT_QUERY_VERSION: &str = "0.0.1";
const MAX_ERROR_BODY_CHARS: usize = 512;

/// How the backend should interpret the configured token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Api,
    Service,
}

/// Connection settings for the HTTP backend.
#[derive(Debug, Clone)]
pub struct HttpBackendConfig {
    pub base_url: Url,
    pub token: String,
    pub token_kind: TokenKind,
    pub timeout: Duration,
}

impl HttpBackendConfig {
    #[must_use]
    pub fn new(base_url: Url, token: impl Into<String>) -> Self {
        Self {
            base_url,
            token: token.into(),
            token_kind: TokenKind::Service,
            timeout: Duration::from_secs(30),
        }
    }

    #[must_use]
    pub const fn with_token_kind(mut self, token_kind: TokenKind) -> Self {
        self.token_kind = token_kind;
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// `reqwest` client for the SUSE Observability REST API.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
    auth_header: (&'static str, String),
}

impl HttpBackend {
    /// Builds the client.
    ///
    /// # Errors
    /// Returns `BackendError` if the HTTP client cannot be constructed.
    pub fn new(config: HttpBackendConfig) -> BackendResult<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        let mut base_url = config.base_url;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let auth_header = match config.token_kind {
            TokenKind::Api => ("Authorization", format!("ApiToken {}", config.token)),
            TokenKind::Service => ("X-API-Key", config.token),
        };
        Ok(Self {
            client,
            base_url,
            auth_header,
        })
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> BackendResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|err| BackendError::InvalidUrl(format!("{path}: {err}")))
    }

    fn get(&self, path: &str) -> BackendResult<RequestBuilder> {
        let url = self.endpoint(path)?;
        debug!(%url, "GET");
        Ok(self.authorize(self.client.get(url)))
    }

    fn post(&self, path: &str) -> BackendResult<RequestBuilder> {
        let url = self.endpoint(path)?;
        debug!(%url, "POST");
        Ok(self.authorize(self.client.post(url)))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let (name, value) = &self.auth_header;
        request.header(*name, value)
    }

    async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> BackendResult<T> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }
        serde_json::from_str(&body).map_err(|err| BackendError::Decode(err.to_string()))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotRequest<'a> {
    #[serde(rename = "_type")]
    kind: &'static str,
    query: &'a str,
    query_version: &'static str,
    metadata: SnapshotMetadata,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
struct SnapshotMetadata {
    #[serde(rename = "_type")]
    kind: &'static str,
    grouping_enabled: bool,
    show_indirect_relations: bool,
    min_group_size: u32,
    grouped_by_layer: bool,
    grouped_by_domain: bool,
    grouped_by_relation: bool,
    auto_grouping: bool,
    connected_components: bool,
    neighboring_components: bool,
    show_full_component: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    query_time: Option<i64>,
}

impl SnapshotMetadata {
    const fn plain(query_time: Option<i64>) -> Self {
        Self {
            kind: "QueryMetadata",
            grouping_enabled: false,
            show_indirect_relations: false,
            min_group_size: 0,
            grouped_by_layer: false,
            grouped_by_domain: false,
            grouped_by_relation: false,
            auto_grouping: false,
            connected_components: false,
            neighboring_components: false,
            show_full_component: false,
            query_time,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotEnvelope {
    view_snapshot_response: SnapshotBody,
}

#[derive(Debug, Deserialize)]
struct SnapshotBody {
    #[serde(default, rename = "_type")]
    kind: Option<String>,
    #[serde(default)]
    components: Vec<RawEntity>,
}

impl SnapshotEnvelope {
    fn into_components(self) -> BackendResult<Vec<RawEntity>> {
        match self.view_snapshot_response.kind.as_deref() {
            None | Some("ViewSnapshot") => Ok(self.view_snapshot_response.components),
            Some(kind) => Err(BackendError::Api(format!("snapshot query failed: {kind}"))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MonitorsOverviewEnvelope {
    #[serde(default)]
    monitors: Vec<MonitorOverview>,
}

#[derive(Debug, Deserialize)]
struct CheckStatesEnvelope {
    #[serde(default)]
    states: Vec<CheckState>,
}

/// Prometheus-style response envelope.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromEnvelope<T> {
    status: String,
    #[serde(default = "Option::default")]
    data: Option<T>,
    #[serde(default)]
    error_type: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl<T> PromEnvelope<T> {
    fn into_data(self) -> BackendResult<T> {
        if self.status != "success" {
            let kind = self.error_type.unwrap_or_else(|| self.status.clone());
            let message = self.error.unwrap_or_default();
            return Err(BackendError::Api(format!("{kind}: {message}")));
        }
        self.data
            .ok_or_else(|| BackendError::Decode("response has no data".to_string()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromMatrix {
    result_type: String,
    #[serde(default)]
    result: Vec<PromSeries>,
}

#[derive(Debug, Deserialize)]
struct PromSeries {
    #[serde(default)]
    metric: BTreeMap<String, String>,
    #[serde(default)]
    values: Vec<(f64, String)>,
}

impl TryFrom<PromSeries> for MetricSeries {
    type Error = BackendError;

    fn try_from(series: PromSeries) -> Result<Self, Self::Error> {
        let samples = series
            .values
            .into_iter()
            .map(|(timestamp, value)| decode_sample(timestamp, &value))
            .collect::<BackendResult<Vec<_>>>()?;
        Ok(Self {
            labels: series.metric,
            samples,
        })
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn decode_sample(timestamp: f64, value: &str) -> BackendResult<Sample> {
    let secs = timestamp.trunc() as i64;
    let nanos = (timestamp.fract() * 1e9).round().clamp(0.0, 999_999_999.0) as u32;
    let timestamp = DateTime::from_timestamp(secs, nanos)
        .ok_or_else(|| BackendError::Decode(format!("sample timestamp out of range: {timestamp}")))?;
    let value = value
        .parse::<f64>()
        .map_err(|_| BackendError::Decode(format!("sample value is not a number: {value}")))?;
    Ok(Sample { timestamp, value })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TracesRequestBody {
    primary_span_filter: PrimarySpanFilter,
}

#[derive(Debug, Serialize)]
struct PrimarySpanFilter {
    attributes: BTreeMap<&'static str, Vec<String>>,
}

fn rfc3339(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[async_trait]
impl TopologySource for HttpBackend {
    async fn topology_query(
        &self,
        query: &str,
        at: Option<DateTime<Utc>>,
    ) -> BackendResult<Vec<RawEntity>> {
        let body = SnapshotRequest {
            kind: "ViewSnapshotRequest",
            query,
            query_version: SNAPSHOT_QUERY_VERSION,
            metadata: SnapshotMetadata::plain(at.map(|time| time.timestamp_millis())),
        };
        let request = self.post("api/snapshot")?.json(&body);
        let envelope: SnapshotEnvelope = Self::send_json(request).await?;
        envelope.into_components()
    }
}

#[async_trait]
impl MonitorSource for HttpBackend {
    async fn monitors_overview(&self) -> BackendResult<Vec<MonitorOverview>> {
        let request = self.get("api/monitors/overview")?;
        let envelope: MonitorsOverviewEnvelope = Self::send_json(request).await?;
        Ok(envelope.monitors)
    }

    async fn monitor_check_states(
        &self,
        monitor_id: i64,
        state: HealthState,
        page: Page,
    ) -> BackendResult<Vec<CheckState>> {
        let request = self
            .get(&format!("api/monitors/{monitor_id}/checkStates"))?
            .query(&[
                ("healthState", state.as_str().to_string()),
                ("limit", page.size.to_string()),
                ("offset", page.offset.to_string()),
            ]);
        let envelope: CheckStatesEnvelope = Self::send_json(request).await?;
        Ok(envelope.states)
    }
}

#[async_trait]
impl MetricSource for HttpBackend {
    async fn metric_names(&self, range: TimeRange) -> BackendResult<Vec<String>> {
        let request = self.get("api/metrics/label/__name__/values")?.query(&[
            ("start", range.start.timestamp().to_string()),
            ("end", range.end.timestamp().to_string()),
        ]);
        let envelope: PromEnvelope<Vec<String>> = Self::send_json(request).await?;
        envelope.into_data()
    }

    async fn metric_label_keys(
        &self,
        metric: &str,
        range: TimeRange,
    ) -> BackendResult<Vec<String>> {
        let request = self.get("api/metrics/labels")?.query(&[
            ("match[]", metric.to_string()),
            ("start", range.start.timestamp().to_string()),
            ("end", range.end.timestamp().to_string()),
        ]);
        let envelope: PromEnvelope<Vec<String>> = Self::send_json(request).await?;
        envelope.into_data()
    }

    async fn query_range(&self, query: &RangeQuery) -> BackendResult<Vec<MetricSeries>> {
        let request = self.get("api/metrics/query_range")?.query(&[
            ("query", query.query.clone()),
            ("start", query.range.start.timestamp().to_string()),
            ("end", query.range.end.timestamp().to_string()),
            ("step", query.step.clone()),
            ("timeout", query.timeout.clone()),
        ]);
        let envelope: PromEnvelope<PromMatrix> = Self::send_json(request).await?;
        let matrix = envelope.into_data()?;
        if matrix.result_type != "matrix" {
            return Err(BackendError::Decode(format!(
                "expected matrix result, got {}",
                matrix.result_type
            )));
        }
        matrix.result.into_iter().map(MetricSeries::try_from).collect()
    }
}

#[async_trait]
impl TraceSource for HttpBackend {
    async fn query_traces(&self, query: &TraceQuery) -> BackendResult<Value> {
        let body = TracesRequestBody {
            primary_span_filter: PrimarySpanFilter {
                attributes: BTreeMap::from([
                    (TAG_SERVICE_NAME, vec![query.service_name.clone()]),
                    (TAG_SERVICE_NAMESPACE, vec![query.service_namespace.clone()]),
                ]),
            },
        };
        let request = self
            .post("api/traces/spans")?
            .query(&[
                ("start", rfc3339(query.range.start)),
                ("end", rfc3339(query.range.end)),
                ("page", query.page.to_string()),
                ("pageSize", query.page_size.to_string()),
            ])
            .json(&body);
        Self::send_json(request).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn backend(url: &str) -> HttpBackend {
        let url = Url::parse(url).expect("valid url");
        HttpBackend::new(HttpBackendConfig::new(url, "secret")).expect("client should build")
    }

    #[test]
    fn endpoints_resolve_below_base_path() {
        let backend = backend("https://observability.example.com/tenant");
        assert_eq!(
            backend.endpoint("api/monitors/overview").unwrap().as_str(),
            "https://observability.example.com/tenant/api/monitors/overview"
        );
    }

    #[test]
    fn token_kind_selects_auth_header() {
        let url = Url::parse("https://observability.example.com").expect("valid url");
        let api = HttpBackend::new(
            HttpBackendConfig::new(url.clone(), "t0k").with_token_kind(TokenKind::Api),
        )
        .expect("client should build");
        assert_eq!(api.auth_header, ("Authorization", "ApiToken t0k".to_string()));

        let service = HttpBackend::new(HttpBackendConfig::new(url, "t0k")).expect("client");
        assert_eq!(service.auth_header, ("X-API-Key", "t0k".to_string()));
    }

    #[test]
    fn snapshot_errors_surface_as_api_errors() {
        let ok: SnapshotEnvelope = serde_json::from_value(json!({
            "viewSnapshotResponse": {
                "_type": "ViewSnapshot",
                "components": [{ "id": 1, "name": "checkout" }]
            }
        }))
        .expect("envelope should decode");
        assert_eq!(ok.into_components().unwrap().len(), 1);

        let timeout: SnapshotEnvelope = serde_json::from_value(json!({
            "viewSnapshotResponse": { "_type": "ViewSnapshotFetchTimeout" }
        }))
        .expect("envelope should decode");
        assert!(matches!(timeout.into_components(), Err(BackendError::Api(_))));
    }

    #[test]
    fn matrix_series_decode_string_samples() {
        let envelope: PromEnvelope<PromMatrix> = serde_json::from_value(json!({
            "status": "success",
            "data": {
                "resultType": "matrix",
                "result": [{
                    "metric": { "__name__": "up", "pod": "checkout-1" },
                    "values": [[1700000000, "1"], [1700000060.5, "NaN"]]
                }]
            }
        }))
        .expect("envelope should decode");

        let matrix = envelope.into_data().unwrap();
        let series: Vec<MetricSeries> = matrix
            .result
            .into_iter()
            .map(MetricSeries::try_from)
            .collect::<BackendResult<_>>()
            .unwrap();

        assert_eq!(series[0].labels["pod"], "checkout-1");
        assert_eq!(series[0].samples[0].value, 1.0);
        assert_eq!(series[0].samples[1].timestamp.timestamp_millis(), 1_700_000_060_500);
        assert!(series[0].samples[1].value.is_nan());
    }

    #[test]
    fn prometheus_errors_carry_type_and_message() {
        let envelope: PromEnvelope<Vec<String>> = serde_json::from_value(json!({
            "status": "error",
            "errorType": "bad_data",
            "error": "invalid parameter \"query\""
        }))
        .expect("envelope should decode");

        let err = envelope.into_data().unwrap_err();
        assert_eq!(
            err.to_string(),
            "backend error: bad_data: invalid parameter \"query\""
        );
    }
}
