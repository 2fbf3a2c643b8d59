//! Mapping of raw backend records onto the normalized model.

use suse_obs_model::{Entity, RawEntity};

/// Normalizes one snapshot component.
#[must_use]
pub fn simplify(raw: &RawEntity) -> Entity {
    Entity {
        id: raw.id,
        name: raw.name.clone(),
        type_name: raw
            .type_ref
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default(),
        identifiers: raw.identifiers.clone(),
        tags: raw.tags.clone(),
        outgoing_relations: raw.outgoing_relations.clone(),
    }
}

/// Normalizes a snapshot, keeping the backend order.
#[must_use]
pub fn simplify_all(raw: &[RawEntity]) -> Vec<Entity> {
    raw.iter().map(simplify).collect()
}
