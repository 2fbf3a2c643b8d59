//! STQL construction for component searches.
//!
//! A search is either a raw expression passed through untouched or a set of
//! named equality filters. Neighbor expansion wraps whichever base expression
//! results so the matched components are always part of the answer.

use std::fmt;
use std::str::FromStr;

use suse_obs_model::schema::{
    FIELD_DOMAIN,
    FIELD_HEALTH_STATE,
    FIELD_LAYER,
    FIELD_NAME,
    FIELD_TYPE,
    MAX_NEIGHBOR_LEVELS,
};

use crate::params::{ParamError, non_blank};

/// Named equality filters. Values may carry backend wildcards such as `redis*`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldFilters {
    pub name: Option<String>,
    pub component_type: Option<String>,
    pub layer: Option<String>,
    pub domain: Option<String>,
    pub health_state: Option<String>,
}

impl FieldFilters {
    /// Fields in clause order.
    fn fields(&self) -> [(&'static str, Option<&str>); 5] {
        [
            (FIELD_NAME, self.name.as_deref()),
            (FIELD_TYPE, self.component_type.as_deref()),
            (FIELD_LAYER, self.layer.as_deref()),
            (FIELD_DOMAIN, self.domain.as_deref()),
            (FIELD_HEALTH_STATE, self.health_state.as_deref()),
        ]
    }

    /// AND-joins one clause per non-empty filter, or `None` when all are empty.
    #[must_use]
    pub fn expression(&self) -> Option<String> {
        let clauses: Vec<String> = self
            .fields()
            .into_iter()
            .filter_map(|(field, value)| {
                let value = value?;
                (!value.trim().is_empty()).then(|| equality_clause(field, value))
            })
            .collect();
        if clauses.is_empty() {
            None
        } else {
            Some(clauses.join(" AND "))
        }
    }
}

/// Where the base expression of a component search comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterSpec {
    RawQuery(String),
    FilterSet(FieldFilters),
}

impl FilterSpec {
    /// Picks the raw query when it has content; the named filters are then ignored.
    #[must_use]
    pub fn new(raw: Option<String>, filters: FieldFilters) -> Self {
        match raw {
            Some(raw) if !raw.trim().is_empty() => Self::RawQuery(raw),
            _ => Self::FilterSet(filters),
        }
    }

    #[must_use]
    pub fn base_expression(&self) -> Option<String> {
        match self {
            Self::RawQuery(raw) => Some(raw.clone()),
            Self::FilterSet(filters) => filters.expression(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    #[default]
    Both,
}

impl Direction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Both => "both",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = ParamError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            "both" => Ok(Self::Both),
            other => Err(ParamError::InvalidDirection(other.to_string())),
        }
    }
}

/// Hop count of a neighbor expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeighborLevels {
    Depth(u8),
    All,
}

impl Default for NeighborLevels {
    fn default() -> Self {
        Self::Depth(1)
    }
}

impl fmt::Display for NeighborLevels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Depth(depth) => write!(f, "{depth}"),
            Self::All => f.write_str("all"),
        }
    }
}

impl FromStr for NeighborLevels {
    type Err = ParamError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value == "all" {
            return Ok(Self::All);
        }
        match value.parse::<u8>() {
            Ok(depth) if (1..=MAX_NEIGHBOR_LEVELS).contains(&depth) => Ok(Self::Depth(depth)),
            _ => Err(ParamError::InvalidLevels(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NeighborSpec {
    pub levels: NeighborLevels,
    pub direction: Direction,
}

impl NeighborSpec {
    /// Parses optional levels and direction, applying the defaults `1` and `both`.
    ///
    /// # Errors
    /// Returns `ParamError` naming the offending value.
    pub fn parse(levels: Option<&str>, direction: Option<&str>) -> Result<Self, ParamError> {
        let levels = non_blank(levels)
            .map(str::parse)
            .transpose()?
            .unwrap_or_default();
        let direction = non_blank(direction)
            .map(str::parse)
            .transpose()?
            .unwrap_or_default();
        Ok(Self { levels, direction })
    }

    /// Unions `base` with its neighborhood.
    #[must_use]
    pub fn rewrite(&self, base: &str) -> String {
        format!(
            "{base} OR withNeighborsOf(components = ({base}), levels = \"{}\", direction = \"{}\")",
            self.levels, self.direction
        )
    }
}

/// Builds the final STQL for a component search.
///
/// # Errors
/// Returns `ParamError::NoFilter` when no base expression results, or
/// `ParamError::NeighborsWithoutFilter` when expansion was asked for without one.
pub fn component_query(
    filter: &FilterSpec,
    neighbors: Option<&NeighborSpec>,
) -> Result<String, ParamError> {
    let Some(base) = filter.base_expression() else {
        return Err(if neighbors.is_some() {
            ParamError::NeighborsWithoutFilter
        } else {
            ParamError::NoFilter
        });
    };
    Ok(match neighbors {
        Some(spec) => spec.rewrite(&base),
        None => base,
    })
}

fn equality_clause(field: &str, value: &str) -> String {
    format!("{field} = \"{}\"", escape_literal(value))
}

/// Escapes a value for use inside a double-quoted STQL literal.
#[must_use]
pub fn escape_literal(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '"' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filters() -> FieldFilters {
        FieldFilters {
            name: Some("checkout*".to_string()),
            component_type: Some("pod".to_string()),
            layer: Some("Containers".to_string()),
            domain: Some("cluster.example.com".to_string()),
            health_state: Some("CRITICAL".to_string()),
        }
    }

    #[test]
    fn raw_query_overrides_named_filters() {
        let raw = r#"layer = "Containers" AND (healthstate = "CRITICAL" OR healthstate = "DEVIATING")"#;
        let spec = FilterSpec::new(Some(raw.to_string()), filters());

        assert_eq!(spec, FilterSpec::RawQuery(raw.to_string()));
        assert_eq!(component_query(&spec, None).unwrap(), raw);
    }

    #[test]
    fn blank_raw_query_falls_back_to_filters() {
        let spec = FilterSpec::new(Some("   ".to_string()), filters());
        assert!(matches!(spec, FilterSpec::FilterSet(_)));
    }

    #[test]
    fn named_filters_join_in_fixed_order() {
        let spec = FilterSpec::new(None, filters());
        assert_eq!(
            component_query(&spec, None).unwrap(),
            r#"name = "checkout*" AND type = "pod" AND layer = "Containers" AND domain = "cluster.example.com" AND healthstate = "CRITICAL""#
        );
    }

    #[test]
    fn empty_fields_are_omitted() {
        let spec = FilterSpec::new(
            None,
            FieldFilters {
                layer: Some("Services".to_string()),
                domain: Some(String::new()),
                health_state: Some("DEVIATING".to_string()),
                ..FieldFilters::default()
            },
        );
        assert_eq!(
            component_query(&spec, None).unwrap(),
            r#"layer = "Services" AND healthstate = "DEVIATING""#
        );
    }

    #[test]
    fn no_filters_is_rejected() {
        let spec = FilterSpec::new(None, FieldFilters::default());
        assert_eq!(component_query(&spec, None), Err(ParamError::NoFilter));
        assert_eq!(
            component_query(&spec, Some(&NeighborSpec::default())),
            Err(ParamError::NeighborsWithoutFilter)
        );
    }

    #[test]
    fn neighbor_expansion_unions_base_with_neighbors() {
        let spec = FilterSpec::new(
            None,
            FieldFilters {
                name: Some("redis*".to_string()),
                ..FieldFilters::default()
            },
        );
        let neighbors = NeighborSpec::parse(None, Some("down")).unwrap();

        assert_eq!(
            component_query(&spec, Some(&neighbors)).unwrap(),
            r#"name = "redis*" OR withNeighborsOf(components = (name = "redis*"), levels = "1", direction = "down")"#
        );
    }

    #[test]
    fn neighbor_expansion_applies_to_raw_queries() {
        let spec = FilterSpec::new(Some(r#"type = "service""#.to_string()), FieldFilters::default());
        let neighbors = NeighborSpec::parse(Some("all"), None).unwrap();

        assert_eq!(
            component_query(&spec, Some(&neighbors)).unwrap(),
            r#"type = "service" OR withNeighborsOf(components = (type = "service"), levels = "all", direction = "both")"#
        );
    }

    #[test]
    fn neighbor_parameters_are_validated() {
        assert_eq!(
            NeighborSpec::parse(None, Some("sideways")),
            Err(ParamError::InvalidDirection("sideways".to_string()))
        );
        assert_eq!(
            NeighborSpec::parse(Some("15"), None),
            Err(ParamError::InvalidLevels("15".to_string()))
        );
        assert_eq!(
            NeighborSpec::parse(Some("0"), None),
            Err(ParamError::InvalidLevels("0".to_string()))
        );
        assert_eq!(
            NeighborSpec::parse(Some("14"), Some("up")).unwrap(),
            NeighborSpec {
                levels: NeighborLevels::Depth(14),
                direction: Direction::Up,
            }
        );
    }

    #[test]
    fn quotes_in_values_stay_inside_the_literal() {
        let spec = FilterSpec::new(
            None,
            FieldFilters {
                name: Some(r#"a" OR name = "*"#.to_string()),
                ..FieldFilters::default()
            },
        );
        assert_eq!(
            component_query(&spec, None).unwrap(),
            r#"name = "a\" OR name = \"*""#
        );
        assert_eq!(escape_literal(r"C:\tmp"), r"C:\\tmp");
    }
}
