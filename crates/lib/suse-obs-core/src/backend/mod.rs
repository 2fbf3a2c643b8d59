//! Backend ports and the HTTP implementation.
//!
//! The control plane only talks to these traits, so the query engine can be
//! driven by any source that speaks the same records.

pub mod http;

use std::error::Error;
use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
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

pub use http::{HttpBackend, HttpBackendConfig, TokenKind, Url};

#[derive(Debug)]
pub enum BackendError {
    Http(Box<reqwest::Error>),
    InvalidUrl(String),
    Status { status: u16, body: String },
    Decode(String),
    Api(String),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(err) => write!(f, "HTTP error: {err}"),
            Self::InvalidUrl(message) => write!(f, "invalid URL: {message}"),
            Self::Status { status, body } => write!(f, "backend returned {status}: {body}"),
            Self::Decode(message) => write!(f, "unexpected response: {message}"),
            Self::Api(message) => write!(f, "backend error: {message}"),
        }
    }
}

impl Error for BackendError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Http(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(Box::new(err))
    }
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Page window of a paginated lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub size: u32,
    pub offset: u32,
}

impl Page {
    #[must_use]
    pub const fn first(size: u32) -> Self {
        Self { size, offset: 0 }
    }
}

#[async_trait]
pub trait TopologySource: Send + Sync {
    /// Runs an STQL snapshot query, optionally at a point in time.
    async fn topology_query(
        &self,
        query: &str,
        at: Option<DateTime<Utc>>,
    ) -> BackendResult<Vec<RawEntity>>;
}

#[async_trait]
pub trait MonitorSource: Send + Sync {
    async fn monitors_overview(&self) -> BackendResult<Vec<MonitorOverview>>;

    async fn monitor_check_states(
        &self,
        monitor_id: i64,
        state: HealthState,
        page: Page,
    ) -> BackendResult<Vec<CheckState>>;
}

#[async_trait]
pub trait MetricSource: Send + Sync {
    async fn metric_names(&self, range: TimeRange) -> BackendResult<Vec<String>>;

    async fn metric_label_keys(&self, metric: &str, range: TimeRange)
    -> BackendResult<Vec<String>>;

    async fn query_range(&self, query: &RangeQuery) -> BackendResult<Vec<MetricSeries>>;
}

#[async_trait]
pub trait TraceSource: Send + Sync {
    async fn query_traces(&self, query: &TraceQuery) -> BackendResult<Value>;
}

/// Everything the MCP tools need from a backend.
pub trait Backend: TopologySource + MonitorSource + MetricSource + TraceSource + 'static {}

impl<T> Backend for T where T: TopologySource + MonitorSource + MetricSource + TraceSource + 'static {}
