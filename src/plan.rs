//! Entity classification and command request planning.
//!
//! Aggregated entities (those with a `subtypes` feature) only support the
//! Read service on the commands endpoint, so their request is narrowed
//! instead of being left out.
use serde::Deserialize;

const SUBTYPES_FEATURE: &str = "subtypes";

/// Body of the `metadata/entities` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct EntitiesMetadata {
    pub data: Vec<EntityMetadata>,
}

/// One entity type as described by the metadata endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct EntityMetadata {
    pub name: String,
    #[serde(default)]
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Feature {
    pub name: String,
}

impl EntityMetadata {
    /// True when the entity is a union of subtypes.
    pub fn is_aggregated(&self) -> bool {
        self.features
            .iter()
            .any(|feature| feature.name == SUBTYPES_FEATURE)
    }
}

/// Command categories exposed per entity by the commands endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Create,
    Update,
    Delete,
    Read,
}

impl Service {
    pub const ALL: [Service; 4] = [
        Service::Create,
        Service::Update,
        Service::Delete,
        Service::Read,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Service::Create => "Create",
            Service::Update => "Update",
            Service::Delete => "Delete",
            Service::Read => "Read",
        }
    }
}

/// Commands request for one entity, fixed once the plan is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequestPlanEntry {
    pub name: String,
    pub is_aggregated: bool,
    pub service_filter: Vec<Service>,
}

/// Build one request per entity, in input order.
pub fn build_plan(entities: &[EntityMetadata]) -> Vec<CommandRequestPlanEntry> {
    entities
        .iter()
        .map(|entity| {
            let is_aggregated = entity.is_aggregated();
            let service_filter = if is_aggregated {
                tracing::info!(
                    entity = %entity.name,
                    "aggregated entity does not support create/update/delete commands; requesting Read only"
                );
                vec![Service::Read]
            } else {
                Service::ALL.to_vec()
            };
            CommandRequestPlanEntry {
                name: entity.name.clone(),
                is_aggregated,
                service_filter,
            }
        })
        .collect()
}
