use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::schema::ELEMENT_ID_TYPE_IDENTIFIER;

/// Health classification attached to components and monitors.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthState {
    Critical,
    Deviating,
    Unknown,
    Clear,
}

impl HealthState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL",
            Self::Deviating => "DEVIATING",
            Self::Unknown => "UNKNOWN",
            Self::Clear => "CLEAR",
        }
    }
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownHealthState(pub String);

impl fmt::Display for UnknownHealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown health state: {}", self.0)
    }
}

impl Error for UnknownHealthState {}

impl FromStr for HealthState {
    type Err = UnknownHealthState;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "CRITICAL" => Ok(Self::Critical),
            "DEVIATING" => Ok(Self::Deviating),
            "UNKNOWN" => Ok(Self::Unknown),
            "CLEAR" => Ok(Self::Clear),
            other => Err(UnknownHealthState(other.to_string())),
        }
    }
}

/// Component type as reported by the backend, either resolved or as a type id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum TypeRef {
    Name(String),
    Id(i64),
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Id(id) => write!(f, "{id}"),
        }
    }
}

/// Topology component exactly as returned by a snapshot query.
///
/// Fields the engine does not read are kept in `extra` so pass-through
/// callers can serialize the full record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawEntity {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_ref: Option<TypeRef>,
    #[serde(default)]
    pub identifiers: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub outgoing_relations: Vec<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Normalized topology component.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Entity {
    pub id: i64,
    pub name: String,
    pub type_name: String,
    pub identifiers: Vec<String>,
    pub tags: Vec<String>,
    pub outgoing_relations: Vec<i64>,
}

impl Entity {
    /// Iterates the tags split into key and value.
    pub fn tags(&self) -> impl Iterator<Item = Tag<'_>> {
        self.tags.iter().map(|tag| Tag::parse(tag))
    }

    /// Returns the value of the first tag with the given key.
    #[must_use]
    pub fn tag_value(&self, key: &str) -> Option<&str> {
        self.tags().find(|tag| tag.key == key).map(|tag| tag.value)
    }
}

/// A `key:value` tag; the key ends at the first `:`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag<'a> {
    pub key: &'a str,
    pub value: &'a str,
}

impl<'a> Tag<'a> {
    #[must_use]
    pub fn parse(raw: &'a str) -> Self {
        match raw.split_once(':') {
            Some((key, value)) => Self { key, value },
            None => Self { key: raw, value: "" },
        }
    }
}

/// Monitor definition from the monitor overview.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MonitorDefinition {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
}

/// Runtime counters of a monitor, one per health state.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeMetrics {
    #[serde(default)]
    pub critical_count: u64,
    #[serde(default)]
    pub deviating_count: u64,
    #[serde(default)]
    pub unknown_count: u64,
    #[serde(default)]
    pub clear_count: u64,
}

impl RuntimeMetrics {
    #[must_use]
    pub const fn count_for(&self, state: HealthState) -> u64 {
        match state {
            HealthState::Critical => self.critical_count,
            HealthState::Deviating => self.deviating_count,
            HealthState::Unknown => self.unknown_count,
            HealthState::Clear => self.clear_count,
        }
    }
}

/// One entry of the monitor overview.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MonitorOverview {
    pub monitor: MonitorDefinition,
    #[serde(default)]
    pub runtime_metrics: RuntimeMetrics,
}

/// Per-component evaluation record of a monitor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CheckState {
    #[serde(default)]
    pub name: String,
    pub topology_element_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topology_element_id_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_state: Option<HealthState>,
}

impl CheckState {
    #[must_use]
    pub fn element_ref(&self) -> ElementRef {
        if self.topology_element_id_type.as_deref() == Some(ELEMENT_ID_TYPE_IDENTIFIER) {
            ElementRef::Urn(self.topology_element_id)
        } else {
            ElementRef::Id(self.topology_element_id)
        }
    }
}

/// Reference to the component a check state is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementRef {
    Id(i64),
    Urn(i64),
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "ID:{id}"),
            Self::Urn(id) => write!(f, "URN:{id}"),
        }
    }
}

/// Component contributing to a monitor's counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AffectedEntity {
    pub name: String,
    pub reference: ElementRef,
}

impl From<&CheckState> for AffectedEntity {
    fn from(state: &CheckState) -> Self {
        Self {
            name: state.name.clone(),
            reference: state.element_ref(),
        }
    }
}

impl fmt::Display for AffectedEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.reference)
    }
}

/// A single metric sample.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// One time series of a range query.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MetricSeries {
    pub labels: BTreeMap<String, String>,
    pub samples: Vec<Sample>,
}

/// Closed time window used by metric and trace lookups.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    #[must_use]
    pub const fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Window ending now and reaching `span` into the past.
    #[must_use]
    pub fn last(span: Duration) -> Self {
        let end = Utc::now();
        Self { start: end - span, end }
    }
}

/// Parameters of a range query against the metric store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RangeQuery {
    pub query: String,
    pub range: TimeRange,
    pub step: String,
    pub timeout: String,
}

/// Span search scoped to one service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TraceQuery {
    pub range: TimeRange,
    pub page: u32,
    pub page_size: u32,
    pub service_name: String,
    pub service_namespace: String,
}
