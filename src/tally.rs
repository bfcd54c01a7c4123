//! Duplicate-command tally: entity -> service -> command name -> count.
//!
//! Counting is a plain streaming histogram keyed on exact command names. Maps
//! are `BTreeMap`s, so reports serialize with keys in lexicographic order;
//! nothing downstream relies on that order.
use crate::gather::GatheredCommands;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type CommandCounts = BTreeMap<String, u64>;
pub type ServiceCounts = BTreeMap<String, CommandCounts>;

/// Serializes as the bare nested map, which is the report file format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tally {
    entities: BTreeMap<String, ServiceCounts>,
}

/// A command name seen more than once within one entity's service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateCommand {
    pub entity: String,
    pub service: String,
    pub command: String,
    pub count: u64,
}

impl Tally {
    /// Count command names for every gathered entity.
    ///
    /// Entities and services with nothing to count still get an (empty)
    /// entry; entities missing from `gathered` stay absent. A service name
    /// listed twice for one entity accumulates into the same inner map.
    pub fn from_gathered(gathered: &GatheredCommands) -> Self {
        let mut entities: BTreeMap<String, ServiceCounts> = BTreeMap::new();
        for (entity, services) in gathered {
            let service_counts = entities.entry(entity.clone()).or_default();
            for service in services {
                let counts = service_counts.entry(service.service.clone()).or_default();
                for command in &service.commands {
                    *counts.entry(command.name.clone()).or_insert(0) += 1;
                }
            }
        }
        Self { entities }
    }

    pub fn entities(&self) -> &BTreeMap<String, ServiceCounts> {
        &self.entities
    }

    pub fn duplicates(&self) -> Vec<DuplicateCommand> {
        let mut duplicates = Vec::new();
        for (entity, services) in &self.entities {
            for (service, commands) in services {
                for (command, count) in commands {
                    if *count > 1 {
                        duplicates.push(DuplicateCommand {
                            entity: entity.clone(),
                            service: service.clone(),
                            command: command.clone(),
                            count: *count,
                        });
                    }
                }
            }
        }
        duplicates
    }
}
