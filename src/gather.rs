//! Sequential command retrieval over a request plan.
use crate::client::{commands_path, MetadataApi};
use crate::plan::CommandRequestPlanEntry;
use crate::util::{truncate_string, MAX_LOGGED_BODY_BYTES};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Commands listed under one service in a commands response.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceCommands {
    pub service: String,
    #[serde(default)]
    pub commands: Vec<CommandInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommandInfo {
    pub name: String,
}

/// Per-service command lists for one entity, in response order.
pub type CommandsResponse = Vec<ServiceCommands>;

/// Successfully fetched entities only; failures leave no entry behind.
pub type GatheredCommands = BTreeMap<String, CommandsResponse>;

/// The endpoint answers either with a bare list or a `data` envelope.
#[derive(Deserialize)]
#[serde(untagged)]
enum CommandsBody {
    Bare(CommandsResponse),
    Envelope { data: CommandsResponse },
}

impl CommandsBody {
    fn into_response(self) -> CommandsResponse {
        match self {
            CommandsBody::Bare(services) | CommandsBody::Envelope { data: services } => services,
        }
    }
}

/// Fetch commands for every plan entry, one request at a time.
///
/// A failed entity is logged with its status and body and skipped; it never
/// aborts the batch.
pub fn gather_commands<A>(api: &A, plan: &[CommandRequestPlanEntry]) -> GatheredCommands
where
    A: MetadataApi + ?Sized,
{
    let mut gathered = GatheredCommands::new();
    for entry in plan {
        let path = commands_path(&entry.name, &entry.service_filter);
        tracing::debug!(
            entity = %entry.name,
            aggregated = entry.is_aggregated,
            path = %path,
            "requesting commands"
        );

        let value = match api.get_json(&path) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(
                    entity = %entry.name,
                    status = ?err.status(),
                    body = %truncate_string(err.body().unwrap_or_default().trim(), MAX_LOGGED_BODY_BYTES),
                    error = %err,
                    "could not retrieve commands"
                );
                continue;
            }
        };

        match serde_json::from_value::<CommandsBody>(value) {
            Ok(body) => {
                gathered.insert(entry.name.clone(), body.into_response());
            }
            Err(err) => {
                tracing::warn!(
                    entity = %entry.name,
                    error = %err,
                    "commands response has an unexpected shape"
                );
            }
        }
    }
    tracing::info!(
        requested = plan.len(),
        retrieved = gathered.len(),
        "command retrieval complete"
    );
    gathered
}

#[cfg(test)]
#[path = "gather_tests.rs"]
mod tests;
