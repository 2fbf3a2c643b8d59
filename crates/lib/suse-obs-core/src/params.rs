//! Validation of user-facing tool parameters.
//!
//! Every failure here is reported before any backend call is made.

use std::error::Error;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use suse_obs_model::HealthState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamError {
    NoFilter,
    NeighborsWithoutFilter,
    InvalidDirection(String),
    InvalidLevels(String),
    InvalidState(String),
    InvalidPattern { pattern: String, message: String },
    InvalidTime { name: &'static str, value: String },
    InvalidTimestamp(String),
    MissingParameter(&'static str),
    ComponentNotFound(i64),
    MissingServiceTags(i64),
}

impl fmt::Display for ParamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoFilter => write!(
                f,
                "no filter provided: set `query` or at least one of name_pattern, type, layer, domain, healthstate"
            ),
            Self::NeighborsWithoutFilter => {
                write!(f, "with_neighbors requires at least one filter")
            }
            Self::InvalidDirection(value) => write!(
                f,
                "invalid with_neighbors_direction '{value}'. Allowed values: up, down, both"
            ),
            Self::InvalidLevels(value) => write!(
                f,
                "invalid with_neighbors_levels '{value}'. Allowed values: 1-14 or 'all'"
            ),
            Self::InvalidState(value) => write!(
                f,
                "invalid state '{value}'. Allowed values: CRITICAL, DEVIATING, UNKNOWN"
            ),
            Self::InvalidPattern { pattern, message } => {
                write!(f, "invalid search pattern '{pattern}': {message}")
            }
            Self::InvalidTime { name, value } => write!(
                f,
                "invalid {name} time format: {value} (expected 'now' or duration like '1h')"
            ),
            Self::InvalidTimestamp(value) => write!(
                f,
                "invalid time '{value}' (expected RFC 3339 or epoch milliseconds)"
            ),
            Self::MissingParameter(name) => write!(f, "{name} is required"),
            Self::ComponentNotFound(id) => {
                write!(f, "component {id} not found among OpenTelemetry services")
            }
            Self::MissingServiceTags(id) => write!(
                f,
                "component {id} has no service name and namespace defined"
            ),
        }
    }
}

impl Error for ParamError {}

/// Returns the trimmed value when it carries any content.
#[must_use]
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Resolves the health state a monitor listing targets.
///
/// Defaults to `CRITICAL`. `CLEAR` is a valid health state but not a
/// listing target.
///
/// # Errors
/// Returns `ParamError::InvalidState` for anything but CRITICAL, DEVIATING or UNKNOWN.
pub fn monitor_state(value: Option<&str>) -> Result<HealthState, ParamError> {
    let Some(value) = non_blank(value) else {
        return Ok(HealthState::Critical);
    };
    match value.parse::<HealthState>() {
        Ok(state @ (HealthState::Critical | HealthState::Deviating | HealthState::Unknown)) => {
            Ok(state)
        }
        _ => Err(ParamError::InvalidState(value.to_string())),
    }
}

/// Compiles a metric search pattern.
///
/// # Errors
/// Returns `ParamError` when the pattern is blank or does not compile.
pub fn search_pattern(pattern: &str) -> Result<Regex, ParamError> {
    if pattern.trim().is_empty() {
        return Err(ParamError::MissingParameter("search_pattern"));
    }
    Regex::new(pattern).map_err(|err| ParamError::InvalidPattern {
        pattern: pattern.to_string(),
        message: err.to_string(),
    })
}

/// Resolves `now` or a duration such as `1h` into an instant that far in the past.
///
/// # Errors
/// Returns `ParamError::InvalidTime` for any other input.
pub fn relative_time(
    name: &'static str,
    value: &str,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, ParamError> {
    let trimmed = value.trim();
    if trimmed == "now" {
        return Ok(now);
    }
    parse_duration(trimmed)
        .map(|ago| now - ago)
        .ok_or_else(|| ParamError::InvalidTime {
            name,
            value: value.to_string(),
        })
}

/// Parses an absolute query time given as RFC 3339 or epoch milliseconds.
///
/// # Errors
/// Returns `ParamError::InvalidTimestamp` when neither form matches.
pub fn query_time(value: &str) -> Result<DateTime<Utc>, ParamError> {
    let trimmed = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }
    trimmed
        .parse::<i64>()
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .ok_or_else(|| ParamError::InvalidTimestamp(value.to_string()))
}

/// Parses durations written as a sequence of decimal numbers with units,
/// e.g. `300ms`, `1.5h` or `1h30m`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn parse_duration(input: &str) -> Option<Duration> {
    let mut rest = input.trim();
    if rest == "0" {
        return Some(Duration::zero());
    }
    if rest.is_empty() {
        return None;
    }

    let mut total_nanos = 0.0_f64;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if number_len == 0 {
            return None;
        }
        let (number, tail) = rest.split_at(number_len);
        let number: f64 = number.parse().ok()?;

        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);
        let scale = match unit {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            _ => return None,
        };
        total_nanos += number * scale;
        rest = tail;
    }

    if !total_nanos.is_finite() || total_nanos >= i64::MAX as f64 {
        return None;
    }
    Some(Duration::nanoseconds(total_nanos as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monitor_state_defaults_to_critical() {
        assert_eq!(monitor_state(None), Ok(HealthState::Critical));
        assert_eq!(monitor_state(Some("")), Ok(HealthState::Critical));
        assert_eq!(monitor_state(Some("DEVIATING")), Ok(HealthState::Deviating));
    }

    #[test]
    fn monitor_state_rejects_clear_and_lowercase() {
        assert_eq!(
            monitor_state(Some("CLEAR")),
            Err(ParamError::InvalidState("CLEAR".to_string()))
        );
        let err = monitor_state(Some("critical")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid state 'critical'. Allowed values: CRITICAL, DEVIATING, UNKNOWN"
        );
    }

    #[test]
    fn durations_follow_unit_suffixes() {
        assert_eq!(parse_duration("1h"), Some(Duration::hours(1)));
        assert_eq!(parse_duration("1h30m"), Some(Duration::minutes(90)));
        assert_eq!(parse_duration("1.5h"), Some(Duration::minutes(90)));
        assert_eq!(parse_duration("250ms"), Some(Duration::milliseconds(250)));
        assert_eq!(parse_duration("0"), Some(Duration::zero()));
        assert_eq!(parse_duration("15"), None);
        assert_eq!(parse_duration("1d"), None);
        assert_eq!(parse_duration("h"), None);
    }

    #[test]
    fn relative_time_resolves_now_and_durations() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).expect("valid timestamp");
        assert_eq!(relative_time("start", "now", now), Ok(now));
        assert_eq!(
            relative_time("start", "2h", now),
            Ok(now - Duration::hours(2))
        );
        let err = relative_time("end", "yesterday", now).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid end time format: yesterday (expected 'now' or duration like '1h')"
        );
    }

    #[test]
    fn query_time_accepts_rfc3339_and_millis() {
        let expected = DateTime::from_timestamp(1_700_000_000, 0).expect("valid timestamp");
        assert_eq!(query_time("2023-11-14T22:13:20Z"), Ok(expected));
        assert_eq!(query_time("1700000000000"), Ok(expected));
        assert!(query_time("last tuesday").is_err());
    }

    #[test]
    fn search_pattern_reports_compile_errors() {
        assert!(search_pattern("redis.*").is_ok());
        assert_eq!(
            search_pattern("  ").unwrap_err(),
            ParamError::MissingParameter("search_pattern")
        );
        assert!(matches!(
            search_pattern("cpu(").unwrap_err(),
            ParamError::InvalidPattern { .. }
        ));
    }
}
