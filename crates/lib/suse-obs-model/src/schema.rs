pub const FIELD_NAME: &str = "name";
pub const FIELD_TYPE: &str = "type";
pub const FIELD_LAYER: &str = "layer";
pub const FIELD_DOMAIN: &str = "domain";
pub const FIELD_HEALTH_STATE: &str = "healthstate";

/// Label key that repeats the metric name on every series.
pub const RESERVED_METRIC_NAME_LABEL: &str = "__name__";

pub const ELEMENT_ID_TYPE_IDENTIFIER: &str = "identifier";

pub const CHECK_STATE_PAGE_SIZE: u32 = 10;
pub const MAX_AFFECTED_COMPONENTS: usize = 5;
pub const MAX_LABELED_METRICS: usize = 50;
pub const MAX_IDENTIFIERS_SHOWN: usize = 2;
pub const MAX_DESCRIPTION_CHARS: usize = 50;

pub const MAX_NEIGHBOR_LEVELS: u8 = 14;

pub const DEFAULT_METRIC_STEP: &str = "1m";
pub const DEFAULT_METRIC_TIMEOUT: &str = "30s";

pub const OTEL_SERVICE_QUERY: &str =
    r#"(label IN ("stackpack:open-telemetry") AND type IN ("otel service"))"#;
pub const TAG_SERVICE_NAME: &str = "service.name";
pub const TAG_SERVICE_NAMESPACE: &str = "service.namespace";
pub const TRACE_PAGE_SIZE: u32 = 100;

/// Placeholder rendered for missing or degraded cells.
pub const PLACEHOLDER: &str = "-";
