use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use suse_obs_model::schema::MAX_IDENTIFIERS_SHOWN;
use suse_obs_model::{Entity, RawEntity};
use tracing::debug;

use super::{ControlError, ObservabilityControl};
use crate::backend::TopologySource;
use crate::normalize::simplify_all;
use crate::params::ParamError;
use crate::query::{FilterSpec, NeighborSpec, component_query};
use crate::render::{MarkdownTable, join_bounded, or_placeholder};

/// Components matched by a search, in backend order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentListing {
    pub query: String,
    pub components: Vec<Entity>,
}

impl ComponentListing {
    #[must_use]
    pub fn render(&self) -> String {
        if self.components.is_empty() {
            return format!("no components found for query: {}", self.query);
        }

        let mut table = MarkdownTable::new(["ID", "Name", "Type", "Identifiers", "Outgoing Relations"]);
        for entity in &self.components {
            table.push_row(vec![
                entity.id.to_string(),
                entity.name.clone(),
                or_placeholder(&entity.type_name).to_string(),
                join_bounded(&entity.identifiers, MAX_IDENTIFIERS_SHOWN),
                entity.outgoing_relations.len().to_string(),
            ]);
        }

        let mut out = String::new();
        let _ = writeln!(
            out,
            "Found {} component(s) for query: {}\n",
            self.components.len(),
            self.query
        );
        table.write_to(&mut out);
        out
    }
}

impl<B: TopologySource> ObservabilityControl<B> {
    /// Builds the STQL for a search, runs it and normalizes the snapshot.
    ///
    /// # Errors
    /// Returns `ControlError::Param` when no filter is usable and
    /// `ControlError::Backend` when the snapshot query fails.
    pub async fn get_components(
        &self,
        filter: &FilterSpec,
        neighbors: Option<&NeighborSpec>,
    ) -> Result<ComponentListing, ControlError> {
        let query = component_query(filter, neighbors)?;
        debug!(%query, "component search");
        let raw = self
            .backend
            .topology_query(&query, None)
            .await
            .map_err(ControlError::backend(format!("query topology with `{query}`")))?;
        Ok(ComponentListing {
            components: simplify_all(&raw),
            query,
        })
    }

    /// Runs a raw STQL query and returns the snapshot untouched.
    ///
    /// # Errors
    /// Returns `ControlError` if the query is blank or the backend call fails.
    pub async fn query_topology(
        &self,
        query: &str,
        at: Option<DateTime<Utc>>,
    ) -> Result<Vec<RawEntity>, ControlError> {
        if query.trim().is_empty() {
            return Err(ParamError::MissingParameter("query").into());
        }
        self.backend
            .topology_query(query, at)
            .await
            .map_err(ControlError::backend(format!("query topology with `{query}`")))
    }
}
